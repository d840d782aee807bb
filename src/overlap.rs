//! Overlap scoring and the passes that reduce it.
//!
//! Every pass follows the same pattern: rotate a subtree hanging off a
//! pivot, re-score the whole drawing, and keep the move only when the
//! global score does not get worse.

use std::collections::BTreeSet;
use std::f64::consts::PI;
use std::time::{Duration, Instant};

use petgraph::graph::{EdgeIndex, NodeIndex};
use tracing::{debug, trace, warn};

use crate::bond::BondOrder;
use crate::graph::{Graph, Vertex};
use crate::graph_ops;
use crate::math;
use crate::options::Options;
use crate::rings::RingSet;
use crate::vector::Vector2;

/// Pairs closer than this fraction of the squared bond length clash.
const CLASH_FACTOR: f64 = 0.8;

#[derive(Debug, Clone, PartialEq)]
pub struct OverlapScore {
    pub total: f64,
    /// Per-vertex sums, indexed by vertex id.
    pub vertex_scores: Vec<f64>,
}

impl OverlapScore {
    /// Vertex ids with their scores, worst first. Ties keep id order.
    pub fn sorted_scores(&self) -> Vec<(NodeIndex, f64)> {
        let mut sorted: Vec<(NodeIndex, f64)> = self
            .vertex_scores
            .iter()
            .enumerate()
            .map(|(i, &s)| (NodeIndex::new(i), s))
            .collect();
        sorted.sort_by(|a, b| b.1.total_cmp(&a.1));
        sorted
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinetuneReport {
    /// Edge sweeps performed.
    pub steps: usize,
    pub clashes_before: usize,
    pub clashes_after: usize,
    pub score_before: f64,
    pub score_after: f64,
    pub timed_out: bool,
}

/// Sum of `(bl - d) / bl` over drawn, non-bonded pairs closer than one
/// bond length.
pub fn overlap_score(graph: &Graph, bond_length: f64) -> OverlapScore {
    let n = graph.vertex_count();
    let mut vertex_scores = vec![0.0; n];
    let mut total = 0.0;
    let bl_sq = bond_length * bond_length;
    for i in 0..n {
        let a = &graph[NodeIndex::new(i)];
        if !a.value.is_drawn {
            continue;
        }
        for j in (i + 1)..n {
            let b = &graph[NodeIndex::new(j)];
            if !b.value.is_drawn || graph.are_bonded(a.id, b.id) {
                continue;
            }
            let dist_sq = a.position.distance_sq(b.position);
            if dist_sq < bl_sq {
                let weighted = (bond_length - dist_sq.sqrt()) / bond_length;
                total += weighted;
                vertex_scores[i] += weighted;
                vertex_scores[j] += weighted;
            }
        }
    }
    OverlapScore {
        total,
        vertex_scores,
    }
}

/// Mean score of the crowded vertices in the subtree at `root`, looking
/// away from `parent`. Zero when none of them is crowded.
pub fn subtree_overlap_score(
    graph: &Graph,
    root: NodeIndex,
    parent: Option<NodeIndex>,
    vertex_scores: &[f64],
    sensitivity: f64,
) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    graph_ops::traverse_tree(graph, root, parent, None, false, |id| {
        if !graph[id].value.is_drawn {
            return;
        }
        let s = vertex_scores[id.index()];
        if s > sensitivity {
            sum += s;
            count += 1;
        }
    });
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Rotate the subtree at `root` (away from `parent`) about `center`.
pub fn rotate_subtree(graph: &mut Graph, root: NodeIndex, parent: Option<NodeIndex>, angle: f64, center: Vector2) {
    let ids = graph_ops::subtree(graph, root, parent);
    rotate_ids(graph, &ids, angle, center);
}

fn rotate_ids(graph: &mut Graph, ids: &[NodeIndex], angle: f64, center: Vector2) {
    for &id in ids {
        let vertex = &mut graph[id];
        vertex.position = vertex.position.rotate_around(angle, center);
        vertex.previous_position = vertex.previous_position.rotate_around(angle, center);
    }
}

/// Saved positions for a set of vertices.
struct Snapshot(Vec<(NodeIndex, Vector2, Vector2)>);

impl Snapshot {
    fn take(graph: &Graph, ids: &[NodeIndex]) -> Self {
        Snapshot(
            ids.iter()
                .map(|&id| (id, graph[id].position, graph[id].previous_position))
                .collect(),
        )
    }

    fn restore(&self, graph: &mut Graph) {
        for &(id, position, previous) in &self.0 {
            graph[id].position = position;
            graph[id].previous_position = previous;
        }
    }
}

fn bridge_set(graph: &Graph) -> BTreeSet<(NodeIndex, NodeIndex)> {
    graph_ops::bridges(graph)
        .into_iter()
        .map(|(a, b)| (a.min(b), a.max(b)))
        .collect()
}

fn touches_stereo_double(graph: &Graph, id: NodeIndex) -> bool {
    graph.edges_of(id).any(|e| graph[e].has_cis_trans())
}

/// A single bond that is a bridge between two non-terminal atoms and does
/// not carry a cis/trans double bond on either end.
pub fn is_rotatable(graph: &Graph, edge: EdgeIndex, bridges: &BTreeSet<(NodeIndex, NodeIndex)>) -> bool {
    let e = &graph[edge];
    let (a, b) = (e.source, e.target);
    e.order == BondOrder::Single
        && !graph[a].is_terminal()
        && !graph[b].is_terminal()
        && bridges.contains(&(a.min(b), a.max(b)))
        && !touches_stereo_double(graph, a)
        && !touches_stereo_double(graph, b)
}

/// Neighbours of a ring atom that share no ring with it.
fn outward_neighbours(graph: &Graph, id: NodeIndex) -> Vec<NodeIndex> {
    let rings = &graph[id].value.rings;
    graph
        .neighbours(id)
        .iter()
        .copied()
        .filter(|&n| !graph[n].value.rings.iter().any(|r| rings.contains(r)))
        .collect()
}

/// Try each set of `(subtree root, angle)` rotations about `pivot` and keep
/// the one with the lowest total, if it beats the current drawing.
fn pick_best_rotation(graph: &mut Graph, pivot: NodeIndex, candidates: &[Vec<(NodeIndex, f64)>], bond_length: f64) -> bool {
    let center = graph.position(pivot);
    let mut roots: Vec<NodeIndex> = candidates.iter().flatten().map(|&(r, _)| r).collect();
    roots.sort();
    roots.dedup();
    let subtrees: Vec<(NodeIndex, Vec<NodeIndex>)> = roots
        .iter()
        .map(|&r| (r, graph_ops::subtree(graph, r, Some(pivot))))
        .collect();
    let members_of = |root: NodeIndex| {
        subtrees
            .iter()
            .find(|(r, _)| *r == root)
            .map(|(_, ids)| ids.as_slice())
            .unwrap_or_default()
    };
    let all: Vec<NodeIndex> = subtrees.iter().flat_map(|(_, ids)| ids.iter().copied()).collect();
    let snapshot = Snapshot::take(graph, &all);

    let mut best_total = overlap_score(graph, bond_length).total;
    let mut best = None;
    for (i, candidate) in candidates.iter().enumerate() {
        for &(root, angle) in candidate {
            rotate_ids(graph, members_of(root), angle, center);
        }
        let total = overlap_score(graph, bond_length).total;
        trace!(?pivot, candidate = i, total, "rotation candidate");
        if total < best_total {
            best_total = total;
            best = Some(i);
        }
        snapshot.restore(graph);
    }

    let Some(i) = best else {
        return false;
    };
    for &(root, angle) in &candidates[i] {
        rotate_ids(graph, members_of(root), angle, center);
    }
    true
}

/// Separate substituents that leave a ring atom in the same direction.
///
/// Ring atoms with two or more outward branches get their first two
/// branches fanned out, and a single branch leaving a two-ring junction is
/// tried on both sides. Returns the number of atoms adjusted.
pub fn resolve_primary_overlaps(graph: &mut Graph, rings: &RingSet, options: &Options) -> usize {
    let mut done = vec![false; graph.vertex_count()];
    let mut groups = Vec::new();
    for ring in rings.active() {
        for &m in &ring.members {
            if std::mem::replace(&mut done[m.index()], true) {
                continue;
            }
            let vertex_rings = &graph[m].value.rings;
            let Some(&first_ring) = vertex_rings.first() else {
                continue;
            };
            let outward = outward_neighbours(graph, m);
            if outward.len() > 1 || (outward.len() == 1 && vertex_rings.len() == 2) {
                groups.push((m, first_ring, outward));
            }
        }
    }

    let mut adjusted = 0;
    for (common, ring, outward) in groups {
        let angle = (2.0 * PI - rings.ring(ring).interior_angle()) / 6.0;
        let candidates = match *outward.as_slice() {
            [a] => vec![vec![(a, angle)], vec![(a, -angle)]],
            [a, b, ..] => {
                if !graph[a].value.is_drawn || !graph[b].value.is_drawn {
                    continue;
                }
                vec![vec![(a, angle), (b, -angle)], vec![(a, -angle), (b, angle)]]
            }
            [] => continue,
        };
        if pick_best_rotation(graph, common, &candidates, options.bond_length) {
            adjusted += 1;
        }
    }
    debug!(groups = adjusted, "primary overlap pass");
    adjusted
}

/// `angle` or `-angle`, whichever rotates `point` about `center` farther
/// from `away`.
fn rotate_away_angle(point: Vector2, away: Vector2, center: Vector2, angle: f64) -> f64 {
    let positive = point.rotate_around(angle, center).distance_sq(away);
    let negative = point.rotate_around(-angle, center).distance_sq(away);
    if negative < positive {
        angle
    } else {
        -angle
    }
}

/// Branches beyond `b` (seen from `a`) that a backbone flip turns: a lone
/// neighbour, or two neighbours unless the bond joins two ring atoms.
fn flip_roots(graph: &Graph, a: NodeIndex, b: NodeIndex) -> Option<Vec<NodeIndex>> {
    let ring_bond_ends = graph[a].value.is_in_ring() && graph[b].value.is_in_ring();
    match *graph[b].neighbours_except(a).as_slice() {
        [x] => Some(vec![x]),
        [x, y] if !ring_bond_ends => Some(vec![x, y]),
        _ => None,
    }
}

/// Flip crowded branches on the shallow side of rotatable bonds by 120°.
/// Returns the number of flips kept.
pub fn resolve_backbone_overlaps(graph: &mut Graph, options: &Options) -> usize {
    let bl = options.bond_length;
    let sensitivity = options.overlap_sensitivity;
    let bridges = bridge_set(graph);
    let edges: Vec<EdgeIndex> = graph.edge_ids().collect();
    let flip = math::to_rad(120.0);

    let mut score = overlap_score(graph, bl);
    let mut total = score.total;
    let mut flips = 0;
    for _ in 0..options.overlap_resolution_iterations {
        for &e in &edges {
            if !is_rotatable(graph, e, &bridges) {
                continue;
            }
            let (s, t) = (graph[e].source, graph[e].target);
            let depth_s = graph_ops::tree_depth(graph, Some(s), Some(t));
            let depth_t = graph_ops::tree_depth(graph, Some(t), Some(s));
            let (a, b) = if depth_s > depth_t { (s, t) } else { (t, s) };
            if subtree_overlap_score(graph, b, Some(a), &score.vertex_scores, sensitivity) <= sensitivity {
                continue;
            }

            let Some(roots) = flip_roots(graph, a, b) else {
                continue;
            };
            let (pa, pb) = (graph.position(a), graph.position(b));
            let mut moved = Vec::new();
            let mut rotations = Vec::new();
            for &r in &roots {
                let ids = graph_ops::subtree(graph, r, Some(b));
                rotations.push((ids.clone(), rotate_away_angle(graph.position(r), pa, pb, flip)));
                moved.extend(ids);
            }
            let snapshot = Snapshot::take(graph, &moved);
            for (ids, angle) in &rotations {
                rotate_ids(graph, ids, *angle, pb);
            }

            let new_total = overlap_score(graph, bl).total;
            if new_total > total {
                snapshot.restore(graph);
            } else {
                trace!(?a, ?b, before = total, after = new_total, "backbone flip kept");
                total = new_total;
                flips += 1;
            }
            score = overlap_score(graph, bl);
        }
    }
    debug!(flips, total, "backbone overlap pass");
    flips
}

fn closest_non_bonded(graph: &Graph, id: NodeIndex) -> Option<NodeIndex> {
    let p = graph.position(id);
    graph
        .vertices()
        .filter(|v| v.id != id && v.value.is_drawn && !graph.are_bonded(id, v.id))
        .min_by(|a, b| a.position.distance_sq(p).total_cmp(&b.position.distance_sq(p)))
        .map(|v| v.id)
}

/// Push crowded terminal atoms away from their nearest non-bonded vertex.
/// Returns the number of atoms moved.
pub fn resolve_secondary_overlaps(graph: &mut Graph, options: &Options) -> usize {
    let bl = options.bond_length;
    let push = math::to_rad(options.terminal_push_angle);
    let score = overlap_score(graph, bl);
    let mut total = score.total;
    let mut moved = 0;

    for (id, s) in score.sorted_scores() {
        if s <= options.overlap_sensitivity {
            break;
        }
        let vertex = &graph[id];
        if !vertex.is_terminal() || !vertex.value.is_drawn {
            continue;
        }
        let Some(&pivot) = vertex.neighbours.first() else {
            continue;
        };
        let Some(closest) = closest_non_bonded(graph, id) else {
            continue;
        };
        // a terminal neighbour is judged by where its bond starts
        let away = match graph[closest].neighbours.as_slice() {
            [only] => graph.position(*only),
            _ => graph.position(closest),
        };

        let before = graph.position(id);
        graph[id].position = before.rotate_away_from(away, graph.position(pivot), push);
        let new_total = overlap_score(graph, bl).total;
        if new_total > total {
            graph[id].position = before;
        } else {
            total = new_total;
            moved += 1;
        }
    }
    debug!(moved, total, "secondary overlap pass");
    moved
}

fn clashes(graph: &Graph, bond_length: f64) -> Vec<(NodeIndex, NodeIndex)> {
    let limit = CLASH_FACTOR * bond_length * bond_length;
    let drawn: Vec<&Vertex> = graph.vertices().filter(|v| v.value.is_drawn).collect();
    let mut out = Vec::new();
    for (i, a) in drawn.iter().enumerate() {
        for b in &drawn[i + 1..] {
            if !graph.are_bonded(a.id, b.id) && a.position.distance_sq(b.position) < limit {
                out.push((a.id, b.id));
            }
        }
    }
    out
}

/// For each clash, the rotatable bond closest to the middle of the path
/// between the two atoms.
fn candidate_edges(
    graph: &Graph,
    found: &[(NodeIndex, NodeIndex)],
    bridges: &BTreeSet<(NodeIndex, NodeIndex)>,
) -> Vec<EdgeIndex> {
    let mut out = Vec::new();
    for &(a, b) in found {
        let Some(path) = graph_ops::shortest_path(graph, a, b) else {
            continue;
        };
        let middle = (path.len() as f64 - 1.0) / 2.0;
        let nearest = path
            .windows(2)
            .enumerate()
            .filter_map(|(i, w)| {
                let e = graph.edge_between(w[0], w[1])?;
                is_rotatable(graph, e, bridges).then_some((i, e))
            })
            .min_by(|x, y| {
                let dx = (x.0 as f64 + 0.5 - middle).abs();
                let dy = (y.0 as f64 + 0.5 - middle).abs();
                dx.total_cmp(&dy)
            });
        if let Some((_, e)) = nearest {
            if !out.contains(&e) {
                out.push(e);
            }
        }
    }
    out
}

/// Sweep the smaller side of `edge` through a full turn and keep the best
/// orientation. Returns whether anything moved.
fn sweep_edge(graph: &mut Graph, edge: EdgeIndex, options: &Options, steps: usize, snap: f64) -> bool {
    let bl = options.bond_length;
    let (u, v) = (graph[edge].source, graph[edge].target);
    let side_u = graph_ops::subtree(graph, u, Some(v));
    let side_v = graph_ops::subtree(graph, v, Some(u));
    let (moving, pivot) = if side_v.len() <= side_u.len() {
        (side_v, u)
    } else {
        (side_u, v)
    };
    let center = graph.position(pivot);
    let snapshot = Snapshot::take(graph, &moving);
    let original = overlap_score(graph, bl).total;

    let mut best: Option<(f64, f64)> = None;
    for k in 1..steps {
        let angle = k as f64 * snap;
        rotate_ids(graph, &moving, angle, center);
        let total = overlap_score(graph, bl).total;
        if total < best.map_or(original, |(_, t)| t) {
            best = Some((angle, total));
        }
        snapshot.restore(graph);
    }

    let Some((angle, total)) = best else {
        return false;
    };
    rotate_ids(graph, &moving, angle + math::to_rad(options.finetune_rotation_offset), center);
    let with_offset = overlap_score(graph, bl).total;
    if with_offset < original {
        trace!(?u, ?v, angle, original, with_offset, "finetune rotation with offset");
        return true;
    }
    snapshot.restore(graph);
    rotate_ids(graph, &moving, angle, center);
    trace!(?u, ?v, angle, original, total, "finetune rotation");
    true
}

/// Rotate bonds on the paths between clashing atoms while the total score
/// stays above the sensitivity threshold, until the clashes are gone or the
/// step or time budget runs out.
pub fn resolve_finetune_overlaps(graph: &mut Graph, options: &Options) -> FinetuneReport {
    let bl = options.bond_length;
    let score_before = overlap_score(graph, bl).total;
    let clashes_before = clashes(graph, bl).len();
    let mut report = FinetuneReport {
        steps: 0,
        clashes_before,
        clashes_after: clashes_before,
        score_before,
        score_after: score_before,
        timed_out: false,
    };
    if !options.finetune
        || options.finetune_max_steps == 0
        || clashes_before == 0
        || score_before <= options.overlap_sensitivity
    {
        return report;
    }

    let snap_degrees = if options.rotation_snap_increment > 0.0 {
        options.rotation_snap_increment
    } else {
        30.0
    };
    let steps = ((360.0 / snap_degrees).round() as usize).max(1);
    let snap = math::to_rad(snap_degrees);
    let bridges = bridge_set(graph);
    let started = Instant::now();
    let budget = Duration::from_millis(options.finetune_max_duration_ms);

    'outer: while report.steps < options.finetune_max_steps {
        if overlap_score(graph, bl).total <= options.overlap_sensitivity {
            break;
        }
        let found = clashes(graph, bl);
        if found.is_empty() {
            break;
        }
        let edges = candidate_edges(graph, &found, &bridges);
        if edges.is_empty() {
            break;
        }
        let mut improved = false;
        for e in edges {
            if report.steps >= options.finetune_max_steps {
                break 'outer;
            }
            if started.elapsed() >= budget {
                report.timed_out = true;
                break 'outer;
            }
            report.steps += 1;
            improved |= sweep_edge(graph, e, options, steps, snap);
        }
        if !improved {
            break;
        }
    }

    report.score_after = overlap_score(graph, bl).total;
    report.clashes_after = clashes(graph, bl).len();
    if report.timed_out || (report.clashes_after > 0 && report.steps >= options.finetune_max_steps) {
        warn!(
            steps = report.steps,
            clashes = report.clashes_after,
            "finetune budget exhausted"
        );
    }
    debug!(
        steps = report.steps,
        before = report.score_before,
        after = report.score_after,
        "finetune pass"
    );
    report
}
