use serde::Deserialize;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn try_depict(smiles: &str) -> Option<crabdraw::Depiction> {
    match crabdraw::depict_smiles(smiles) {
        Ok(d) => Some(d),
        Err(e) => {
            eprintln!("FAIL (layout error): {smiles:?}: {e}");
            None
        }
    }
}

#[derive(Deserialize)]
struct RingEntry {
    name: String,
    smiles: String,
    atoms: usize,
    ring_sizes: Vec<usize>,
    bridged: usize,
    aromatic: usize,
    fused: bool,
    spiro: bool,
}

fn load() -> Vec<RingEntry> {
    serde_json::from_str(include_str!("approval_data/rings.json")).unwrap()
}

// ---------------------------------------------------------------------------
// 1. Ring perception
// ---------------------------------------------------------------------------

#[test]
fn approval_rings() {
    let data = load();

    let mut failures = Vec::new();
    for entry in &data {
        let Some(d) = try_depict(&entry.smiles) else {
            failures.push(format!("[parse] {}: could not depict {:?}", entry.name, entry.smiles));
            continue;
        };

        if d.positions().len() != entry.atoms {
            failures.push(format!(
                "[atoms] {}: expected {}, got {}",
                entry.name,
                entry.atoms,
                d.positions().len()
            ));
        }

        let mut sizes: Vec<usize> = d.rings().active().map(|r| r.len()).collect();
        sizes.sort_unstable();
        if sizes != entry.ring_sizes {
            failures.push(format!(
                "[rings] {}: expected {:?}, got {:?}",
                entry.name, entry.ring_sizes, sizes
            ));
        }

        let bridged = d.rings().active().filter(|r| r.is_bridged).count();
        if bridged != entry.bridged {
            failures.push(format!(
                "[bridged] {}: expected {}, got {}",
                entry.name, entry.bridged, bridged
            ));
        }

        let aromatic = d.aromatic_rings().len();
        if aromatic != entry.aromatic {
            failures.push(format!(
                "[aromatic] {}: expected {}, got {}",
                entry.name, entry.aromatic, aromatic
            ));
        }

        let fused = d.rings().active().any(|r| r.is_fused);
        let spiro = d.rings().active().any(|r| r.is_spiro);
        if (fused, spiro) != (entry.fused, entry.spiro) {
            failures.push(format!(
                "[connections] {}: expected fused={} spiro={}, got fused={} spiro={}",
                entry.name, entry.fused, entry.spiro, fused, spiro
            ));
        }
    }

    if !failures.is_empty() {
        panic!("{} ring approval failures:\n{}", failures.len(), failures.join("\n"));
    }
}

// ---------------------------------------------------------------------------
// 2. Drawing sanity over the same set
// ---------------------------------------------------------------------------

#[test]
fn approval_coordinates() {
    let data = load();

    let mut failures = Vec::new();
    for entry in &data {
        let Some(d) = try_depict(&entry.smiles) else {
            continue;
        };
        let bl = d.options().bond_length;

        if let Some(p) = d.positions().iter().find(|p| !p.is_finite()) {
            failures.push(format!("[finite] {}: {:?}", entry.name, p));
        }

        // regular polygons and zig-zags keep every bond exact
        let longest = d.max_bond_length();
        if entry.bridged == 0 && (longest - bl).abs() > 1e-6 && entry.atoms > 1 {
            failures.push(format!("[bond] {}: longest bond {longest}", entry.name));
        }
        if longest > 4.0 * bl {
            failures.push(format!("[bond] {}: longest bond {longest}", entry.name));
        }

        for ring in d.rings().active() {
            let members: Vec<_> = ring.members.iter().map(|&m| d.graph().position(m)).collect();
            let distinct = members
                .iter()
                .enumerate()
                .all(|(i, a)| members[i + 1..].iter().all(|b| a.distance(*b) > 1.0));
            if !distinct {
                failures.push(format!("[ring] {}: ring {} has coinciding atoms", entry.name, ring.id));
            }
        }
    }

    if !failures.is_empty() {
        panic!("{} coordinate approval failures:\n{}", failures.len(), failures.join("\n"));
    }
}
