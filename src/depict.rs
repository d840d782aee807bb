//! The full layout pipeline.
//!
//! ```
//! use crabdraw::Depictor;
//!
//! let depiction = Depictor::default().depict_smiles("c1ccccc1O").unwrap();
//! assert_eq!(depiction.positions().len(), 7);
//! assert_eq!(depiction.aromatic_rings().len(), 1);
//! ```

use petgraph::graph::NodeIndex;
use tracing::debug;

use crate::cycles;
use crate::error::{LayoutError, Result};
use crate::graph::Graph;
use crate::graph_ops;
use crate::input::MoleculeInput;
use crate::options::Options;
use crate::overlap::{self, FinetuneReport};
use crate::placement;
use crate::rings::{Ring, RingSet};
use crate::smiles::parse_smiles;
use crate::stereo;
use crate::vector::Vector2;

/// Runs the layout pipeline with a fixed set of options.
#[derive(Debug, Clone, Default)]
pub struct Depictor {
    options: Options,
}

impl Depictor {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Lay out one molecule.
    ///
    /// Fails only when the records are inconsistent (bond endpoints out of
    /// range, self or duplicate bonds). The layout itself always produces
    /// finite coordinates.
    pub fn depict(&self, input: &MoleculeInput) -> Result<Depiction> {
        let options = &self.options;
        let mut graph = Graph::from_input(input)?;
        let mut rings = RingSet::perceive(&mut graph);
        debug!(
            atoms = graph.vertex_count(),
            bonds = graph.edge_count(),
            rings = rings.active_count(),
            "perceived rings"
        );

        placement::position(&mut graph, &mut rings, options);
        stereo::enforce_cis_trans(&mut graph);

        overlap::resolve_primary_overlaps(&mut graph, &rings, options);
        overlap::resolve_backbone_overlaps(&mut graph, options);
        overlap::resolve_secondary_overlaps(&mut graph, options);
        let finetune = overlap::resolve_finetune_overlaps(&mut graph, options);
        stereo::enforce_cis_trans(&mut graph);

        let replaced = sanitize_positions(&mut graph);
        if replaced > 0 {
            debug!(replaced, "replaced non-finite coordinates");
        }
        rings.update_centers(&graph);

        let overlap_score = overlap::overlap_score(&graph, options.bond_length).total;
        debug!(overlap_score, "depiction done");
        Ok(Depiction {
            graph,
            rings,
            overlap_score,
            finetune,
            weights: None,
            options: options.clone(),
        })
    }

    pub fn depict_smiles(&self, smiles: &str) -> Result<Depiction> {
        let input = parse_smiles(smiles)?;
        self.depict(&input)
    }
}

/// Lay out a SMILES string with default options.
pub fn depict_smiles(smiles: &str) -> Result<Depiction> {
    Depictor::default().depict_smiles(smiles)
}

/// Move any non-finite coordinate to the centroid of the finite ones in
/// its fragment, or to the origin. Returns the number of vertices moved.
fn sanitize_positions(graph: &mut Graph) -> usize {
    let mut replaced = 0;
    for fragment in graph_ops::fragments(graph) {
        let anchor = Vector2::centroid(
            fragment
                .iter()
                .map(|&id| graph.position(id))
                .filter(|p| p.is_finite()),
        )
        .unwrap_or(Vector2::ZERO);
        for id in fragment {
            let vertex = &mut graph[id];
            if !vertex.position.is_finite() {
                vertex.position = anchor;
                replaced += 1;
            }
            if !vertex.previous_position.is_finite() {
                vertex.previous_position = vertex.position;
            }
        }
    }
    replaced
}

/// A laid-out molecule.
#[derive(Debug, Clone)]
pub struct Depiction {
    graph: Graph,
    rings: RingSet,
    overlap_score: f64,
    finetune: FinetuneReport,
    weights: Option<Vec<f64>>,
    options: Options,
}

impl Depiction {
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn rings(&self) -> &RingSet {
        &self.rings
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Coordinates indexed by atom.
    pub fn positions(&self) -> Vec<Vector2> {
        self.graph.positions()
    }

    /// Total overlap score of the final drawing.
    pub fn overlap_score(&self) -> f64 {
        self.overlap_score
    }

    pub fn finetune_report(&self) -> &FinetuneReport {
        &self.finetune
    }

    /// Attach one weight per atom, e.g. for a heat-map overlay.
    pub fn set_weights(&mut self, weights: Vec<f64>) -> Result<()> {
        let expected = self.graph.vertex_count();
        if weights.len() != expected {
            return Err(LayoutError::WeightCount {
                expected,
                got: weights.len(),
            });
        }
        self.weights = Some(weights);
        Ok(())
    }

    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    /// All simple cycles of the bond graph, bounded by
    /// `Options::max_cycle_length`.
    pub fn cycles(&self) -> Vec<Vec<NodeIndex>> {
        cycles::all_simple_cycles(&self.graph.adjacency_list(), self.options.max_cycle_length)
            .into_iter()
            .map(|cycle| cycle.into_iter().map(NodeIndex::new).collect())
            .collect()
    }

    /// Drawn rings whose atoms were all written aromatic.
    pub fn aromatic_rings(&self) -> Vec<&Ring> {
        self.rings
            .active()
            .filter(|r| !r.is_bridged && r.members.iter().all(|&m| self.graph[m].value.is_aromatic))
            .collect()
    }

    pub fn max_bond_length(&self) -> f64 {
        self.graph
            .edges()
            .map(|e| self.graph.position(e.source).distance(self.graph.position(e.target)))
            .fold(0.0, f64::max)
    }
}
