use thiserror::Error;

use crate::smiles::SmilesError;

/// Errors raised at the boundary of the layout engine.
///
/// Layout itself never fails; these cover malformed input records and
/// caller-supplied auxiliary data with the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// A bond record refers to an atom that does not exist.
    #[error("bond {bond} refers to atom {atom}, but only {atom_count} atoms exist")]
    InvalidAtomIndex {
        bond: usize,
        atom: usize,
        atom_count: usize,
    },
    /// A bond record connects an atom to itself.
    #[error("bond {bond} connects atom {atom} to itself")]
    SelfBond { bond: usize, atom: usize },
    /// Two bond records connect the same pair of atoms.
    #[error("atoms {a} and {b} are bonded more than once")]
    DuplicateBond { a: usize, b: usize },
    /// A per-atom data array does not match the number of atoms.
    #[error("expected {expected} per-atom weights, got {got}")]
    WeightCount { expected: usize, got: usize },
    /// The line-notation reader rejected its input.
    #[error(transparent)]
    Smiles(#[from] SmilesError),
}

pub type Result<T> = std::result::Result<T, LayoutError>;
