//! A small SMILES reader producing [`MoleculeInput`] records.
//!
//! Only connectivity, bond orders, directional markers and bracket atom
//! properties are read. Valence, implicit hydrogens and tetrahedral parity
//! are not needed for layout and are not computed.

pub mod error;
mod reader;
mod tokenizer;

use crate::input::MoleculeInput;
pub use error::SmilesError;

pub fn parse_smiles(s: &str) -> Result<MoleculeInput, SmilesError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(SmilesError::EmptyInput);
    }
    let tokens = tokenizer::tokenize(trimmed)?;
    if tokens.is_empty() {
        return Err(SmilesError::EmptyInput);
    }
    reader::read(&tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bond::{BondDirection, BondOrder};
    use crate::input::BondRecord;

    fn bond(input: &MoleculeInput, a: usize, b: usize) -> &BondRecord {
        input
            .bonds
            .iter()
            .find(|r| (r.source, r.target) == (a, b) || (r.source, r.target) == (b, a))
            .unwrap()
    }

    // ---- Simple molecules ----

    #[test]
    fn methane() {
        let input = parse_smiles("C").unwrap();
        assert_eq!(input.atoms.len(), 1);
        assert!(input.bonds.is_empty());
        assert_eq!(input.atoms[0].element, "C");
        assert_eq!(input.atoms[0].hydrogen_count, None);
    }

    #[test]
    fn ethene() {
        let input = parse_smiles("C=C").unwrap();
        assert_eq!(input.bonds.len(), 1);
        assert_eq!(bond(&input, 0, 1).order, BondOrder::Double);
    }

    #[test]
    fn ethyne() {
        let input = parse_smiles("C#C").unwrap();
        assert_eq!(bond(&input, 0, 1).order, BondOrder::Triple);
    }

    #[test]
    fn acetic_acid() {
        let input = parse_smiles("CC(=O)O").unwrap();
        assert_eq!(input.atoms.len(), 4);
        assert_eq!(bond(&input, 1, 2).order, BondOrder::Double);
        assert_eq!(bond(&input, 1, 3).order, BondOrder::Single);
    }

    // ---- Branches ----

    #[test]
    fn neopentane() {
        let input = parse_smiles("CC(C)(C)C").unwrap();
        assert_eq!(input.atoms.len(), 5);
        assert_eq!(input.bonds.len(), 4);
        assert_eq!(input.bonds.iter().filter(|b| b.source == 1 || b.target == 1).count(), 4);
        assert_eq!(input.bonds.iter().filter(|b| b.source == 1).count(), 3);
    }

    // ---- Ring closures ----

    #[test]
    fn cyclohexane() {
        let input = parse_smiles("C1CCCCC1").unwrap();
        assert_eq!(input.atoms.len(), 6);
        assert_eq!(input.bonds.len(), 6);
        assert_eq!(input.bonds.iter().filter(|b| b.is_ring_closure).count(), 1);
    }

    #[test]
    fn multi_digit_ring() {
        let input = parse_smiles("C%10CC%10").unwrap();
        assert_eq!(input.bonds.len(), 3);
    }

    #[test]
    fn bicyclo() {
        let input = parse_smiles("C1CC2C1CC2").unwrap();
        assert_eq!(input.atoms.len(), 6);
        assert_eq!(input.bonds.len(), 7);
        assert_eq!(input.bonds.iter().filter(|b| b.is_ring_closure).count(), 2);
    }

    #[test]
    fn ring_closure_with_bond_order() {
        let input = parse_smiles("C=1CCCCC1").unwrap();
        assert_eq!(bond(&input, 0, 5).order, BondOrder::Double);
    }

    // ---- Bracket atoms ----

    #[test]
    fn ammonium() {
        let input = parse_smiles("[NH4+]").unwrap();
        let atom = &input.atoms[0];
        assert_eq!(atom.element, "N");
        assert_eq!(atom.charge, 1);
        assert_eq!(atom.hydrogen_count, Some(4));
    }

    #[test]
    fn isotopes() {
        assert_eq!(parse_smiles("[13C]").unwrap().atoms[0].isotope, 13);
        let deuterium = parse_smiles("[2H]").unwrap();
        assert_eq!(deuterium.atoms[0].element, "H");
        assert_eq!(deuterium.atoms[0].isotope, 2);
    }

    #[test]
    fn bracket_without_h_has_zero_hydrogens() {
        assert_eq!(parse_smiles("[Fe]").unwrap().atoms[0].hydrogen_count, Some(0));
    }

    // ---- Aromatic atoms ----

    #[test]
    fn benzene() {
        let input = parse_smiles("c1ccccc1").unwrap();
        assert!(input.atoms.iter().all(|a| a.is_aromatic));
        assert!(input.bonds.iter().all(|b| b.order == BondOrder::Aromatic));
    }

    #[test]
    fn phenol_link_is_single() {
        let input = parse_smiles("Oc1ccccc1").unwrap();
        assert_eq!(bond(&input, 0, 1).order, BondOrder::Single);
    }

    #[test]
    fn biphenyl_explicit_single() {
        let input = parse_smiles("c1ccccc1-c1ccccc1").unwrap();
        assert_eq!(bond(&input, 5, 6).order, BondOrder::Single);
    }

    // ---- Stereo markers ----

    #[test]
    fn directional_markers_are_recorded() {
        let input = parse_smiles(r"F/C=C\F").unwrap();
        let first = bond(&input, 0, 1);
        assert_eq!((first.source, first.target), (0, 1));
        assert_eq!(first.direction, Some(BondDirection::Up));
        assert_eq!(bond(&input, 2, 3).direction, Some(BondDirection::Down));
        assert_eq!(bond(&input, 1, 2).direction, None);
    }

    #[test]
    fn chirality_marks_are_accepted() {
        let input = parse_smiles("[C@@H](F)(Cl)Br").unwrap();
        assert_eq!(input.atoms.len(), 4);
        assert_eq!(input.atoms[0].hydrogen_count, Some(1));
    }

    // ---- Disconnected ----

    #[test]
    fn sodium_chloride() {
        let input = parse_smiles("[Na+].[Cl-]").unwrap();
        assert_eq!(input.atoms.len(), 2);
        assert!(input.bonds.is_empty());
        assert_eq!(input.atoms[0].charge, 1);
        assert_eq!(input.atoms[1].charge, -1);
    }

    // ---- Complex molecules ----

    #[test]
    fn caffeine_atom_count() {
        let input = parse_smiles("Cn1cnc2c1c(=O)n(c(=O)n2C)C").unwrap();
        assert_eq!(input.atoms.len(), 14);
        assert_eq!(input.bonds.len(), 15);
    }

    // ---- Error cases ----

    #[test]
    fn empty_string() {
        assert_eq!(parse_smiles("").unwrap_err(), SmilesError::EmptyInput);
        assert_eq!(parse_smiles("   ").unwrap_err(), SmilesError::EmptyInput);
    }

    #[test]
    fn malformed_input() {
        for smiles in ["C(C", "C)C", "C1CC", "X", "[C", "C%1"] {
            assert!(parse_smiles(smiles).is_err(), "{smiles}");
        }
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            parse_smiles("C1CC").unwrap_err().to_string(),
            "unclosed ring 1"
        );
    }
}
