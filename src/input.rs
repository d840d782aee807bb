//! Records handed over by a line-notation parser.
//!
//! Atoms and bonds are listed in parse order. A bond that is not a ring
//! closure always joins an atom to one written earlier, which is how the
//! spanning tree used by the layout heuristics is recovered.

use crate::bond::{BondDirection, BondOrder};

#[derive(Debug, Clone, PartialEq)]
pub struct AtomRecord {
    pub element: String,
    pub charge: i8,
    pub isotope: u16,
    pub hydrogen_count: Option<u8>,
    pub is_aromatic: bool,
}

impl AtomRecord {
    pub fn new(element: &str) -> Self {
        Self {
            element: element.to_string(),
            charge: 0,
            isotope: 0,
            hydrogen_count: None,
            is_aromatic: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BondRecord {
    /// The atom written first.
    pub source: usize,
    /// The atom written second.
    pub target: usize,
    pub order: BondOrder,
    pub direction: Option<BondDirection>,
    pub is_ring_closure: bool,
}

impl BondRecord {
    pub fn new(source: usize, target: usize, order: BondOrder) -> Self {
        Self {
            source,
            target,
            order,
            direction: None,
            is_ring_closure: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoleculeInput {
    pub atoms: Vec<AtomRecord>,
    pub bonds: Vec<BondRecord>,
}

impl MoleculeInput {
    /// A chain or ring of plain carbons, handy for building test graphs.
    ///
    /// `edges` are `(source, target)` pairs; pairs whose target precedes the
    /// source are treated as ring closures.
    pub fn carbon_skeleton(atom_count: usize, edges: &[(usize, usize)]) -> Self {
        let atoms = (0..atom_count).map(|_| AtomRecord::new("C")).collect();
        let mut seen_parent = vec![false; atom_count];
        let bonds = edges
            .iter()
            .map(|&(s, t)| {
                let mut bond = BondRecord::new(s, t, BondOrder::Single);
                if t <= s || seen_parent.get(t).copied().unwrap_or(true) {
                    bond.is_ring_closure = true;
                } else {
                    seen_parent[t] = true;
                }
                bond
            })
            .collect();
        Self { atoms, bonds }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skeleton_marks_back_edges_as_closures() {
        let input = MoleculeInput::carbon_skeleton(3, &[(0, 1), (1, 2), (2, 0)]);
        assert_eq!(input.atoms.len(), 3);
        assert!(!input.bonds[0].is_ring_closure);
        assert!(!input.bonds[1].is_ring_closure);
        assert!(input.bonds[2].is_ring_closure);
    }

    #[test]
    fn skeleton_marks_second_parent_as_closure() {
        let input = MoleculeInput::carbon_skeleton(3, &[(0, 2), (1, 2)]);
        assert!(!input.bonds[0].is_ring_closure);
        assert!(input.bonds[1].is_ring_closure);
    }
}
