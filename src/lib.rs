//! 2D structure depiction for molecular graphs.
//!
//! Given atoms and bonds in parse order, `crabdraw` perceives rings,
//! consolidates bridged ring systems, places rings as regular polygons and
//! chains as zig-zags, lays out bridged systems with a Kamada-Kawai spring
//! model, and then removes overlaps in several passes.
//!
//! ```
//! let depiction = crabdraw::depict_smiles("CC(=O)Oc1ccccc1C(=O)O").unwrap();
//! assert_eq!(depiction.positions().len(), 13);
//! assert!(depiction.positions().iter().all(|p| p.is_finite()));
//! ```
//!
//! The library logs through `tracing` and never installs a subscriber.

pub mod atom;
pub mod bond;
pub mod cycles;
pub mod depict;
pub mod error;
pub mod graph;
pub mod graph_ops;
pub mod input;
pub mod kamada_kawai;
pub mod math;
pub mod options;
pub mod overlap;
pub mod placement;
pub mod rings;
pub mod smiles;
pub mod stereo;
pub mod vector;

pub use atom::Atom;
pub use bond::{BondDirection, BondOrder, CisTrans, CisTransTable, Edge, Wedge};
pub use depict::{depict_smiles, Depiction, Depictor};
pub use error::LayoutError;
pub use graph::{Graph, Vertex};
pub use input::{AtomRecord, BondRecord, MoleculeInput};
pub use options::Options;
pub use overlap::{FinetuneReport, OverlapScore};
pub use rings::{Ring, RingConnection, RingId, RingSet};
pub use smiles::{parse_smiles, SmilesError};
pub use vector::Vector2;
