use std::collections::BTreeSet;

use crabdraw::stereo::{drawn_relation, violations};
use crabdraw::{depict_smiles, CisTrans, Depiction, Depictor, LayoutError, Options, Vector2};
use petgraph::graph::NodeIndex;

fn depict(smiles: &str) -> Depiction {
    depict_smiles(smiles).unwrap_or_else(|e| panic!("{smiles}: {e}"))
}

fn bond_lengths(d: &Depiction) -> Vec<f64> {
    let g = d.graph();
    g.edges()
        .map(|e| g.position(e.source).distance(g.position(e.target)))
        .collect()
}

fn all_finite(d: &Depiction) -> bool {
    d.positions().iter().all(|p| p.is_finite())
}

fn n(i: usize) -> NodeIndex {
    NodeIndex::new(i)
}

// Bond lengths

#[test]
fn polygons_and_chains_keep_exact_bond_length() {
    for smiles in [
        "CCCCCCCC",
        "C1CCCCC1",
        "c1ccc2ccccc2c1",
        "c1ccc2cc3ccccc3cc2c1",
        "CC(=O)Oc1ccccc1C(=O)O",
        "CC(C)Cc1ccc(cc1)C(C)C(=O)O",
        "Cn1cnc2c1c(=O)n(c(=O)n2C)C",
        "C1CCC2(CC1)CCC2",
    ] {
        let d = depict(smiles);
        for len in bond_lengths(&d) {
            assert!((len - 30.0).abs() < 1e-6, "{smiles}: bond length {len}");
        }
    }
}

#[test]
fn bridged_systems_have_bounded_bonds() {
    for smiles in [
        "C1CC2CCC1C2",
        "C1CC2CCC1CC2",
        "C1C2CC3CC1CC(C2)C3",
        "C12C3C4C1C5C3C4C25",
    ] {
        let d = depict(smiles);
        assert!(all_finite(&d), "{smiles}");
        let longest = d.max_bond_length();
        assert!(longest < 4.0 * 30.0, "{smiles}: longest bond {longest}");
        assert!(bond_lengths(&d).iter().all(|&l| l > 1.0), "{smiles}");
    }
}

#[test]
fn nitrogen_cage_is_one_compact_bridged_system() {
    let d = depict("N12CCNCCNCCN(CCNCCNCC1)CCNCCNCCNCC2");
    assert!(all_finite(&d));
    let longest = d.max_bond_length();
    assert!(longest < 4.0 * 30.0, "longest bond {longest}");

    let g = d.graph();
    let systems: BTreeSet<_> = g
        .vertices()
        .filter(|v| v.value.element == "N")
        .map(|v| v.value.bridged_ring)
        .collect();
    assert_eq!(systems.len(), 1, "{systems:?}");
    assert!(systems.iter().all(Option::is_some));
}

#[test]
fn bridged_ring_with_substituent() {
    let d = depict("CC1(C)C2CCC1(C)C(=O)C2");
    assert!(all_finite(&d));
    assert!(d.max_bond_length() < 4.0 * 30.0);
    assert_eq!(d.rings().active().filter(|r| r.is_bridged).count(), 1);
}

// Overlap passes

#[test]
fn zig_zag_chain_has_no_overlap() {
    let d = depict("CCCCCCCCCCCC");
    assert_eq!(d.overlap_score(), 0.0);
    assert_eq!(d.finetune_report().clashes_before, 0);
}

#[test]
fn gem_substituents_are_separated() {
    let d = depict("C1CCCCC1(C)C");
    let a = d.graph().position(n(6));
    let b = d.graph().position(n(7));
    assert!(a.distance(b) > 20.0, "gem substituents {a:?} {b:?}");
}

#[test]
fn finetune_never_makes_things_worse() {
    for smiles in [
        "CCCCCCCCCC(C)(C)CCCCCC",
        "CC(C)(C)c1cc(C(C)(C)C)cc(C(C)(C)C)c1",
        "OCC(O)C(O)C(O)C(O)CO",
    ] {
        let d = depict(smiles);
        let report = d.finetune_report();
        assert!(report.score_after <= report.score_before + 1e-9, "{smiles}: {report:?}");
        assert!(report.steps <= d.options().finetune_max_steps, "{smiles}");
    }
}

#[test]
fn finetune_can_be_switched_off() {
    for options in [
        Options {
            finetune: false,
            ..Options::default()
        },
        Options {
            finetune_max_steps: 0,
            ..Options::default()
        },
    ] {
        let d = Depictor::new(options).depict_smiles("CCCCCCCCCC(C)(C)CCCCCC").unwrap();
        assert_eq!(d.finetune_report().steps, 0);
        assert_eq!(d.finetune_report().score_before, d.finetune_report().score_after);
    }
}

// Double bond geometry

#[test]
fn cis_trans_is_drawn_as_written() {
    for (smiles, expected) in [
        ("F/C=C/F", CisTrans::Trans),
        (r"F/C=C\F", CisTrans::Cis),
        ("CC/C=C/CC", CisTrans::Trans),
        (r"CC/C=C\CC", CisTrans::Cis),
    ] {
        let d = depict(smiles);
        assert!(violations(d.graph()).is_empty(), "{smiles}");
        let (a, b, x, y) = if smiles.starts_with('F') {
            (n(1), n(2), n(0), n(3))
        } else {
            (n(2), n(3), n(1), n(4))
        };
        assert_eq!(drawn_relation(d.graph(), a, b, x, y), Some(expected), "{smiles}");
    }
}

#[test]
fn trans_double_bond_inside_a_ring() {
    // [x, a, b, y] around the ring double bond
    for (smiles, atoms, expected) in [
        ("C1CCCC/C=C/CCCC1", [4, 5, 6, 7], CisTrans::Trans),
        (r"C1CCCC/C=C\CCCC1", [4, 5, 6, 7], CisTrans::Cis),
        ("C1CCCCCC/C=C/CCCCCC1", [6, 7, 8, 9], CisTrans::Trans),
        ("C1CC/C=C/CC1", [2, 3, 4, 5], CisTrans::Trans),
    ] {
        let d = depict(smiles);
        assert!(all_finite(&d), "{smiles}");
        assert!(violations(d.graph()).is_empty(), "{smiles}");
        let [x, a, b, y] = atoms.map(n);
        assert_eq!(drawn_relation(d.graph(), a, b, x, y), Some(expected), "{smiles}");
        let longest = d.max_bond_length();
        assert!(longest < 4.0 * 30.0, "{smiles}: longest bond {longest}");
        assert!(bond_lengths(&d).iter().all(|&l| l > 1.0), "{smiles}");
    }
}

#[test]
fn stilbene_keeps_its_geometry() {
    for smiles in [r"c1ccccc1/C=C/c1ccccc1", r"c1ccccc1/C=C\c1ccccc1"] {
        let d = depict(smiles);
        assert!(violations(d.graph()).is_empty(), "{smiles}");
    }
}

// Fragments and degenerate input

#[test]
fn fragments_do_not_overlap() {
    let d = depict("CCO.c1ccccc1");
    let positions = d.positions();
    let left = positions[..3].iter().map(|p| p.x).fold(f64::MIN, f64::max);
    let right = positions[3..].iter().map(|p| p.x).fold(f64::MAX, f64::min);
    assert!(left < right, "{left} >= {right}");
}

#[test]
fn ions_and_single_atoms() {
    let d = depict("[Na+].[Cl-]");
    assert!(all_finite(&d));
    assert_ne!(d.positions()[0], d.positions()[1]);

    let d = depict("C");
    assert_eq!(d.positions().len(), 1);
    assert!(all_finite(&d));
    assert_eq!(d.overlap_score(), 0.0);
}

// Options and caller data

#[test]
fn options_from_json() {
    let options: Options = serde_json::from_str(r#"{ "bond_length": 20.0, "finetune": false }"#).unwrap();
    let d = Depictor::new(options).depict_smiles("c1ccccc1CC").unwrap();
    for len in bond_lengths(&d) {
        assert!((len - 20.0).abs() < 1e-6);
    }
    let text = serde_json::to_string(d.options()).unwrap();
    let back: Options = serde_json::from_str(&text).unwrap();
    assert_eq!(&back, d.options());
}

#[test]
fn weights_are_checked() {
    let mut d = depict("c1ccccc1O");
    assert_eq!(
        d.set_weights(vec![0.0; 3]).unwrap_err(),
        LayoutError::WeightCount { expected: 7, got: 3 }
    );
    d.set_weights(vec![1.0; 7]).unwrap();
    assert_eq!(d.weights().map(<[f64]>::len), Some(7));
}

#[test]
fn ring_centers_follow_the_drawing() {
    let d = depict("c1ccc2ccccc2c1");
    for ring in d.rings().active() {
        let centroid = Vector2::centroid(ring.members.iter().map(|&m| d.graph().position(m))).unwrap();
        assert!(ring.center.distance(centroid) < 1e-9);
    }
}
