//! Cis/trans bookkeeping for double bonds.
//!
//! Directional single-bond markers are turned into per-pair cis/trans
//! tables when the graph is built. After placement the tables are checked
//! against the drawing with a signed side test; a violated double bond
//! that is not part of a ring is repaired by mirroring one side of the
//! molecule across the bond axis. Trans double bonds inside rings are
//! handled while the ring is placed, using [`trans_ring_bond`].

use std::collections::BTreeSet;

use petgraph::graph::{EdgeIndex, NodeIndex};
use tracing::{debug, trace, warn};

use crate::bond::{BondDirection, BondOrder, CisTrans};
use crate::graph::Graph;
use crate::graph_ops;
use crate::vector::Vector2;

const SIDE_EPSILON: f64 = 1e-9;

/// Signed area test: positive when `p` lies to the left of `a -> b`,
/// negative to the right, zero on the line.
pub fn side(a: Vector2, b: Vector2, p: Vector2) -> f64 {
    (b - a).cross(p - a)
}

/// A substituent pair drawn on the wrong sides of its double bond.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CisTransViolation {
    pub edge: EdgeIndex,
    pub source_anchor: NodeIndex,
    pub target_anchor: NodeIndex,
    pub expected: CisTrans,
}

/// Fill the cis/trans table of every double bond that has a directional
/// single bond on both ends.
pub fn assign_cis_trans(graph: &mut Graph) {
    let doubles: Vec<EdgeIndex> = graph
        .edge_ids()
        .filter(|&e| graph[e].order == BondOrder::Double)
        .collect();

    for e in doubles {
        let (a, b) = (graph[e].source, graph[e].target);
        let subs_a = graph[a].neighbours_except(b);
        let subs_b = graph[b].neighbours_except(a);
        let (Some((ref_a, dir_a)), Some((ref_b, dir_b))) = (
            reference_substituent(graph, a, &subs_a),
            reference_substituent(graph, b, &subs_b),
        ) else {
            continue;
        };

        let base = if dir_a == dir_b {
            CisTrans::Cis
        } else {
            CisTrans::Trans
        };
        trace!(?a, ?b, ?ref_a, ?ref_b, ?base, "cis/trans reference");

        for &x in &subs_a {
            for &y in &subs_b {
                let mut rel = base;
                if x != ref_a {
                    rel = rel.flipped();
                }
                if y != ref_b {
                    rel = rel.flipped();
                }
                graph[e].cis_trans.insert(x, y, rel);
            }
        }
    }
}

/// First substituent of `atom` joined by a directional bond, with the
/// direction as read from `atom` outwards.
fn reference_substituent(
    graph: &Graph,
    atom: NodeIndex,
    substituents: &[NodeIndex],
) -> Option<(NodeIndex, BondDirection)> {
    substituents.iter().find_map(|&s| {
        let edge = &graph[graph.edge_between(atom, s)?];
        let direction = edge.direction?;
        let effective = if edge.source == atom {
            direction
        } else {
            direction.flipped()
        };
        Some((s, effective))
    })
}

/// The relation actually drawn for a substituent pair, or `None` when one
/// of them sits on the bond axis.
pub fn drawn_relation(graph: &Graph, a: NodeIndex, b: NodeIndex, x: NodeIndex, y: NodeIndex) -> Option<CisTrans> {
    let (pa, pb) = (graph.position(a), graph.position(b));
    let sx = side(pa, pb, graph.position(x));
    let sy = side(pa, pb, graph.position(y));
    if sx.abs() < SIDE_EPSILON || sy.abs() < SIDE_EPSILON {
        return None;
    }
    Some(if sx.signum() == sy.signum() {
        CisTrans::Cis
    } else {
        CisTrans::Trans
    })
}

/// A double bond inside the cyclic `members` whose ring neighbours are
/// marked trans, as `[x, a, b, y]` with `a=b` the double bond and `x`, `y`
/// the ring atoms bonded to `a` and `b`.
pub fn trans_ring_bond(graph: &Graph, members: &[NodeIndex]) -> Option<[NodeIndex; 4]> {
    let len = members.len();
    if len < 4 {
        return None;
    }
    (0..len).find_map(|i| {
        let (x, a, b, y) = (
            members[(i + len - 1) % len],
            members[i],
            members[(i + 1) % len],
            members[(i + 2) % len],
        );
        let edge = &graph[graph.edge_between(a, b)?];
        (edge.order == BondOrder::Double && edge.cis_trans.get(x, y) == Some(CisTrans::Trans))
            .then_some([x, a, b, y])
    })
}

pub fn violations(graph: &Graph) -> Vec<CisTransViolation> {
    let mut out = Vec::new();
    for e in graph.edge_ids() {
        let edge = &graph[e];
        if !edge.has_cis_trans() {
            continue;
        }
        for (x, y, expected) in edge.cis_trans.iter() {
            if drawn_relation(graph, edge.source, edge.target, x, y).is_some_and(|drawn| drawn != expected) {
                out.push(CisTransViolation {
                    edge: e,
                    source_anchor: x,
                    target_anchor: y,
                    expected,
                });
            }
        }
    }
    out
}

/// Mirror one side of every violated, acyclic double bond across the
/// bond axis. Returns the number of bonds repaired.
pub fn enforce_cis_trans(graph: &mut Graph) -> usize {
    let found = violations(graph);
    if found.is_empty() {
        return 0;
    }

    let bridge_set: BTreeSet<(NodeIndex, NodeIndex)> = graph_ops::bridges(graph)
        .into_iter()
        .map(|(a, b)| (a.min(b), a.max(b)))
        .collect();

    let mut handled: BTreeSet<EdgeIndex> = BTreeSet::new();
    let mut fixed = 0;
    for violation in found {
        if !handled.insert(violation.edge) {
            continue;
        }
        let (a, b) = (graph[violation.edge].source, graph[violation.edge].target);
        // an earlier reflection may already have repaired this bond
        let still_wrong = drawn_relation(graph, a, b, violation.source_anchor, violation.target_anchor)
            .is_some_and(|drawn| drawn != violation.expected);
        if !still_wrong {
            continue;
        }
        if !bridge_set.contains(&(a.min(b), a.max(b))) {
            warn!(?a, ?b, "cis/trans violation inside a ring left as drawn");
            continue;
        }

        let side_a = graph_ops::subtree(graph, a, Some(b));
        let side_b = graph_ops::subtree(graph, b, Some(a));
        let moving = if side_b.len() <= side_a.len() { side_b } else { side_a };
        let (pa, pb) = (graph.position(a), graph.position(b));
        for id in moving {
            let vertex = &mut graph[id];
            vertex.position = vertex.position.reflect_across(pa, pb);
            vertex.previous_position = vertex.previous_position.reflect_across(pa, pb);
        }
        debug!(?a, ?b, "mirrored substituents to restore cis/trans");
        fixed += 1;
    }
    fixed
}
