//! Initial 2D placement.
//!
//! Rings become regular polygons and their fused or spiro neighbours are
//! attached across the shared atoms. Bridged systems go through the spring
//! solver. Chains grow outwards in a zig-zag with a few branch heuristics.
//! Work is driven by an explicit task stack, so the visit order is the
//! depth-first order a recursive walk would produce.

use std::f64::consts::PI;

use petgraph::graph::NodeIndex;
use tracing::{debug, trace, warn};

use crate::bond::{BondOrder, CisTrans};
use crate::graph::Graph;
use crate::graph_ops;
use crate::kamada_kawai;
use crate::math;
use crate::options::Options;
use crate::rings::{RingId, RingSet};
use crate::stereo;
use crate::vector::Vector2;

const SIXTY: f64 = PI / 3.0;

#[derive(Debug, Clone, Copy)]
enum Task {
    /// Place `vertex` coming from `previous`. `angle` is the absolute
    /// direction used when the previous vertex is a chain atom.
    Bond {
        vertex: NodeIndex,
        previous: Option<NodeIndex>,
        angle: f64,
        origin_shortest: bool,
    },
    Ring {
        ring: RingId,
        center: Vector2,
        start: Option<NodeIndex>,
        previous: Option<NodeIndex>,
    },
}

#[derive(Debug, Clone, Copy)]
struct Bounds {
    min: Vector2,
    max: Vector2,
}

impl Bounds {
    fn of(graph: &Graph, ids: &[NodeIndex]) -> Option<Self> {
        let mut points = ids.iter().map(|&id| graph.position(id)).filter(|p| p.is_finite());
        let first = points.next()?;
        let mut bounds = Bounds {
            min: first,
            max: first,
        };
        for p in points {
            bounds.min = Vector2::new(bounds.min.x.min(p.x), bounds.min.y.min(p.y));
            bounds.max = Vector2::new(bounds.max.x.max(p.x), bounds.max.y.max(p.y));
        }
        Some(bounds)
    }

    fn union(self, other: Bounds) -> Bounds {
        Bounds {
            min: Vector2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Vector2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    fn mid_y(&self) -> f64 {
        (self.min.y + self.max.y) / 2.0
    }
}

/// Give every vertex an initial position.
///
/// Each fragment is grown from its first bridged-ring atom, else the first
/// atom of its first ring, else its lowest id. Fragments after the first
/// are moved to the right of everything placed so far.
pub fn position(graph: &mut Graph, rings: &mut RingSet, options: &Options) {
    let fragments = graph_ops::fragments(graph);
    let mut placer = Placer {
        graph,
        rings,
        options,
        stack: Vec::new(),
    };

    let mut placed: Option<Bounds> = None;
    for fragment in &fragments {
        let Some(start) = placer.start_vertex(fragment) else {
            continue;
        };
        trace!(?start, size = fragment.len(), "placing fragment");
        placer.run(Task::Bond {
            vertex: start,
            previous: None,
            angle: 0.0,
            origin_shortest: false,
        });

        let Some(bounds) = Bounds::of(placer.graph, fragment) else {
            continue;
        };
        let bounds = match placed {
            Some(before) => {
                let offset = Vector2::new(
                    before.max.x + options.fragment_spacing * options.bond_length - bounds.min.x,
                    before.mid_y() - bounds.mid_y(),
                );
                placer.shift(fragment, offset);
                before.union(Bounds {
                    min: bounds.min + offset,
                    max: bounds.max + offset,
                })
            }
            None => bounds,
        };
        placed = Some(bounds);
    }
    debug!(
        fragments = fragments.len(),
        rings = placer.rings.active_count(),
        "initial placement done"
    );
}

struct Placer<'a> {
    graph: &'a mut Graph,
    rings: &'a mut RingSet,
    options: &'a Options,
    stack: Vec<Task>,
}

impl Placer<'_> {
    fn start_vertex(&self, fragment: &[NodeIndex]) -> Option<NodeIndex> {
        if let Some(&v) = fragment
            .iter()
            .find(|&&v| self.graph[v].value.bridged_ring.is_some())
        {
            return Some(v);
        }
        self.rings
            .active()
            .filter_map(|r| r.members.first().copied())
            .find(|m| fragment.contains(m))
            .or_else(|| fragment.iter().copied().min())
    }

    fn run(&mut self, task: Task) {
        self.stack.push(task);
        while let Some(task) = self.stack.pop() {
            match task {
                Task::Bond {
                    vertex,
                    previous,
                    angle,
                    origin_shortest,
                } => self.place_bond(vertex, previous, angle, origin_shortest),
                Task::Ring {
                    ring,
                    center,
                    start,
                    previous,
                } => self.place_ring(ring, center, start, previous),
            }
        }
    }

    fn shift(&mut self, fragment: &[NodeIndex], offset: Vector2) {
        for &id in fragment {
            let vertex = &mut self.graph[id];
            vertex.position += offset;
            vertex.previous_position += offset;
        }
        let ids: Vec<RingId> = self
            .rings
            .rings()
            .iter()
            .filter(|r| r.members.first().is_some_and(|m| fragment.contains(m)))
            .map(|r| r.id)
            .collect();
        for id in ids {
            self.rings.ring_mut(id).center += offset;
        }
    }

    fn bond_length(&self) -> f64 {
        self.options.bond_length
    }

    fn place_bond(&mut self, vertex: NodeIndex, previous: Option<NodeIndex>, angle: f64, origin_shortest: bool) {
        if self.graph[vertex].positioned {
            return;
        }
        let bl = self.bond_length();
        match previous {
            None => {
                let position = Vector2::new(bl, 0.0);
                let v = &mut self.graph[vertex];
                v.previous_position = position.rotate(-SIXTY);
                v.position = position;
                v.angle = Some(-SIXTY);
                // bridged ring atoms are left free for the spring solver
                v.positioned = v.value.bridged_ring.is_none();
            }
            Some(p) if self.graph[p].value.is_in_ring() => {
                let position = self.away_from_ring(p);
                let origin = self.graph.position(p);
                let v = &mut self.graph[vertex];
                v.previous_position = origin;
                v.position = position;
                v.positioned = true;
            }
            Some(p) => {
                let origin = self.graph.position(p);
                let v = &mut self.graph[vertex];
                v.previous_position = origin;
                v.position = origin + Vector2::new(bl, 0.0).rotate(angle);
                v.positioned = true;
            }
        }
        self.grow(vertex, previous, origin_shortest);
    }

    /// Position for a substituent of ring atom `p`: straight through a
    /// two-ring junction, else opposite its placed ring neighbours.
    fn away_from_ring(&self, p: NodeIndex) -> Vector2 {
        let origin = self.graph.position(p);
        let atom = &self.graph[p].value;
        if atom.bridged_ring.is_none() && atom.rings.len() > 1 {
            let joined = self.graph.neighbours(p).iter().copied().find(|&n| {
                let rings = &self.graph[n].value.rings;
                atom.rings.iter().all(|r| rings.contains(r))
            });
            if let Some(j) = joined {
                return self.graph.position(j).rotate_around(PI, origin);
            }
        }

        let mut sum = Vector2::ZERO;
        for &n in self.graph.neighbours(p) {
            if self.graph[n].positioned && self.graph.are_in_same_ring(n, p) {
                sum += self.graph.position(n) - origin;
            }
        }
        let mut direction = (-sum).normalized();
        if direction == Vector2::ZERO {
            direction = Vector2::new(1.0, 0.0);
        }
        origin + direction * self.bond_length()
    }

    fn grow(&mut self, vertex: NodeIndex, previous: Option<NodeIndex>, origin_shortest: bool) {
        let value = &self.graph[vertex].value;
        if let Some(ring) = value.bridged_ring.or(value.rings.first().copied()) {
            if !self.rings.ring(ring).positioned {
                let v = &self.graph[vertex];
                let radius = math::poly_circumradius(self.bond_length(), self.rings.ring(ring).len());
                let center = v.position + (v.position - v.previous_position).normalized() * radius;
                self.stack.push(Task::Ring {
                    ring,
                    center,
                    start: Some(vertex),
                    previous: None,
                });
            }
            return;
        }

        let neighbours: Vec<NodeIndex> = match previous {
            Some(p) => self.graph[vertex].neighbours_except(p),
            None => self.graph.neighbours(vertex).to_vec(),
        };
        let previous_angle = self.graph[vertex].incoming_angle();
        let turns: Vec<(NodeIndex, f64, bool)> = match neighbours.as_slice() {
            [] => Vec::new(),
            &[next] => vec![(
                next,
                self.single_turn(vertex, previous, next, previous_angle, origin_shortest),
                false,
            )],
            &[l, r] => self.two_turns(vertex, previous, l, r),
            &[a, b, c] => self.three_turns(vertex, previous, [a, b, c]),
            &[a, b, c, d] => self.four_turns(vertex, [a, b, c, d]),
            many => {
                let slots = (many.len() + 1) as f64;
                many.iter()
                    .enumerate()
                    .map(|(i, &n)| (n, PI - (i + 1) as f64 * 2.0 * PI / slots, false))
                    .collect()
            }
        };

        for &(next, turn, _) in &turns {
            if !self.graph[next].positioned {
                self.graph[next].angle = Some(turn);
            }
        }
        for (next, turn, shortest) in turns.into_iter().rev() {
            self.stack.push(Task::Bond {
                vertex: next,
                previous: Some(vertex),
                angle: previous_angle + turn,
                origin_shortest: shortest,
            });
        }
    }

    fn single_turn(
        &self,
        vertex: NodeIndex,
        previous: Option<NodeIndex>,
        next: NodeIndex,
        previous_angle: f64,
        origin_shortest: bool,
    ) -> f64 {
        let incoming = previous.and_then(|p| self.graph.bond_order(p, vertex));
        let outgoing = self.graph.bond_order(vertex, next);
        let previous_in_ring = previous.is_some_and(|p| self.graph[p].value.is_in_ring());

        let straight = incoming == Some(BondOrder::Triple)
            || outgoing == Some(BondOrder::Triple)
            || (incoming == Some(BondOrder::Double)
                && outgoing == Some(BondOrder::Double)
                && !previous_in_ring);
        if straight {
            return 0.0;
        }

        if previous_in_ring {
            let bl = self.bond_length();
            let position = self.graph.position(vertex);
            let com = self.center_of_mass(position);
            let left = position + Vector2::new(bl, 0.0).rotate(previous_angle + SIXTY);
            let right = position + Vector2::new(bl, 0.0).rotate(previous_angle - SIXTY);
            return if left.distance_sq(com) < right.distance_sq(com) {
                -SIXTY
            } else {
                SIXTY
            };
        }

        let mut a = self.graph[vertex].angle.unwrap_or(0.0);
        if previous.is_some_and(|p| self.graph.neighbours(p).len() > 3) {
            a = if a > 0.0 {
                a.min(SIXTY)
            } else if a < 0.0 {
                a.max(-SIXTY)
            } else {
                SIXTY
            };
        } else if a == 0.0 {
            a = self.last_angle(vertex).unwrap_or(SIXTY);
        }
        if origin_shortest {
            a
        } else {
            -a
        }
    }

    /// The deeper branch, or a carbon chain next to a heteroatom, goes cis.
    fn two_turns(&self, vertex: NodeIndex, previous: Option<NodeIndex>, l: NodeIndex, r: NodeIndex) -> Vec<(NodeIndex, f64, bool)> {
        let a = self.graph[vertex].angle.filter(|a| *a != 0.0).unwrap_or(SIXTY);
        let depth_l = graph_ops::tree_depth(self.graph, Some(l), Some(vertex));
        let depth_r = graph_ops::tree_depth(self.graph, Some(r), Some(vertex));
        let depth_origin = graph_ops::tree_depth(self.graph, previous, Some(vertex));
        let carbon = |id: NodeIndex| self.graph[id].value.is_carbon();

        let r_is_cis = if carbon(r) && !carbon(l) && depth_r > 1 && depth_l < 5 {
            true
        } else if !carbon(r) && carbon(l) && depth_l > 1 && depth_r < 5 {
            false
        } else {
            depth_r > depth_l
        };
        let (cis, trans) = if r_is_cis { (r, l) } else { (l, r) };
        let origin_shortest = depth_origin < depth_l && depth_origin < depth_r;
        trace!(?vertex, ?cis, ?trans, origin_shortest, "two-way branch");
        vec![(trans, a, origin_shortest), (cis, -a, origin_shortest)]
    }

    /// The deepest branch continues straight; two short branches next to it
    /// fan out to one side.
    fn three_turns(&self, vertex: NodeIndex, previous: Option<NodeIndex>, n: [NodeIndex; 3]) -> Vec<(NodeIndex, f64, bool)> {
        let depth = |id: NodeIndex| graph_ops::tree_depth(self.graph, Some(id), Some(vertex));
        let d = n.map(depth);
        let (s, l, r) = if d[1] > d[0] && d[1] > d[2] {
            (n[1], n[0], n[2])
        } else if d[2] > d[0] && d[2] > d[1] {
            (n[2], n[0], n[1])
        } else {
            (n[0], n[1], n[2])
        };

        let in_ring = |id: NodeIndex| self.graph[id].value.is_in_ring();
        let acyclic = previous.is_some_and(|p| !in_ring(p)) && !in_ring(s) && !in_ring(l) && !in_ring(r);
        if acyclic && depth(l) == 1 && depth(r) == 1 && depth(s) > 1 {
            let va = self.graph[vertex].angle.unwrap_or(0.0);
            let (tl, tr) = if va >= 0.0 {
                (math::to_rad(30.0), math::to_rad(90.0))
            } else {
                (-math::to_rad(30.0), -math::to_rad(90.0))
            };
            vec![(s, -va, false), (l, tl, false), (r, tr, false)]
        } else {
            let right = math::to_rad(90.0);
            vec![(s, 0.0, false), (l, right, false), (r, -right, false)]
        }
    }

    fn four_turns(&self, vertex: NodeIndex, n: [NodeIndex; 4]) -> Vec<(NodeIndex, f64, bool)> {
        let d = n.map(|id| graph_ops::tree_depth(self.graph, Some(id), Some(vertex)));
        let deepest = (1..4).find(|&i| (0..4).all(|j| j == i || d[i] > d[j])).unwrap_or(0);
        let mut order = vec![n[deepest]];
        order.extend((0..4).filter(|&j| j != deepest).map(|j| n[j]));
        let turns = [-36.0, 36.0, -108.0, 108.0].map(math::to_rad);
        order
            .into_iter()
            .zip(turns)
            .map(|(id, t)| (id, t, false))
            .collect()
    }

    /// Walk up the spanning tree for the latest non-zero turn.
    fn last_angle(&self, vertex: NodeIndex) -> Option<f64> {
        let mut current = Some(vertex);
        while let Some(id) = current {
            if let Some(a) = self.graph[id].angle.filter(|a| *a != 0.0) {
                return Some(a);
            }
            current = self.graph[id].parent;
        }
        None
    }

    fn center_of_mass(&self, around: Vector2) -> Vector2 {
        let radius = self.options.center_of_mass_radius_factor * self.bond_length();
        let radius_sq = radius * radius;
        Vector2::centroid(
            self.graph
                .vertices()
                .filter(|v| v.positioned && v.position.distance_sq(around) < radius_sq)
                .map(|v| v.position),
        )
        .unwrap_or(around)
    }

    /// Redraw polygon ring `id` so the ring bonds leaving the trans double
    /// bond `a=b` end up on opposite sides of it. One arc is mirrored across
    /// the bond axis and the ring is relaxed with `x`, `a`, `b` and `y` held
    /// in place. Returns whether the ring was redrawn.
    fn twist_ring(&mut self, id: RingId, [x, a, b, y]: [NodeIndex; 4], anchored: &[NodeIndex]) -> bool {
        if stereo::drawn_relation(self.graph, a, b, x, y) != Some(CisTrans::Cis) {
            return false;
        }
        let members = self.rings.ring(id).members.clone();
        // b, y, ..., x, a
        let walk = self.rings.ring(id).walk(b, Some(a));
        let half = (walk.len() - 2) / 2;
        let y_arc = &walk[1..=half];
        let x_arc = &walk[walk.len() - 1 - half..walk.len() - 1];
        let free = |arc: &[NodeIndex]| arc.iter().all(|m| !anchored.contains(m));
        let arc = if free(y_arc) {
            y_arc.to_vec()
        } else if free(x_arc) {
            x_arc.to_vec()
        } else {
            warn!(ring = id, ?a, ?b, "trans ring bond between placed atoms left as drawn");
            return false;
        };

        let (pa, pb) = (self.graph.position(a), self.graph.position(b));
        for &m in &arc {
            let vertex = &mut self.graph[m];
            vertex.position = vertex.position.reflect_across(pa, pb);
        }
        let seed: Vec<Vector2> = members.iter().map(|&m| self.graph.position(m)).collect();
        let fixed: Vec<bool> = members
            .iter()
            .map(|m| [x, a, b, y].contains(m) || anchored.contains(m))
            .collect();
        let bl = self.bond_length();
        let params = self.options.kk_params();
        let report = kamada_kawai::relax(self.graph, &members, &seed, &fixed, bl, &params);
        debug!(
            ring = id,
            ?a,
            ?b,
            iterations = report.iterations,
            residual = report.residual_energy,
            "ring drawn around trans double bond"
        );
        true
    }

    fn place_ring(&mut self, id: RingId, center: Vector2, start: Option<NodeIndex>, previous: Option<NodeIndex>) {
        if self.rings.ring(id).positioned {
            return;
        }
        let bl = self.bond_length();
        let mut center = center;

        if self.rings.ring(id).is_bridged {
            let members = self.rings.ring(id).members.clone();
            let report = kamada_kawai::layout(self.graph, &members, center, bl, &self.options.kk_params());
            debug!(
                ring = id,
                size = members.len(),
                iterations = report.iterations,
                residual = report.residual_energy,
                "bridged ring laid out"
            );
            center = self.rings.ring(id).centroid(self.graph);
            for sub in self.rings.ring(id).sub_rings.clone() {
                let c = self.rings.ring(sub).centroid(self.graph);
                self.rings.ring_mut(sub).center = c;
            }
        } else {
            let ring = self.rings.ring(id);
            let size = ring.len();
            let radius = math::poly_circumradius(bl, size);
            let mut step = math::central_angle(size);
            let start = start.filter(|&s| ring.contains(s));
            let Some(first) = start.or(ring.members.first().copied()) else {
                return;
            };
            let mut a = start.map_or(0.0, |s| (self.graph.position(s) - center).angle());
            if let (Some(s), Some(p)) = (start, previous) {
                let cross = (self.graph.position(s) - center).cross(self.graph.position(p) - center);
                if cross > 0.0 {
                    step = -step;
                }
            }
            let anchored: Vec<NodeIndex> = ring
                .members
                .iter()
                .copied()
                .filter(|&m| self.graph[m].positioned)
                .collect();
            for v in ring.walk(first, previous) {
                let vertex = &mut self.graph[v];
                if !vertex.positioned {
                    vertex.position = center + Vector2::new(a.cos(), a.sin()) * radius;
                    vertex.positioned = true;
                }
                a += step;
            }
            if let Some(bond) = stereo::trans_ring_bond(self.graph, &self.rings.ring(id).members) {
                if self.twist_ring(id, bond, &anchored) {
                    center = self.rings.ring(id).centroid(self.graph);
                }
            }
        }

        let ring = self.rings.ring_mut(id);
        ring.positioned = true;
        ring.center = center;
        let members = ring.members.clone();

        let mut ring_tasks = Vec::new();
        for neighbour in self.rings.ordered_neighbours(id) {
            if self.rings.ring(neighbour).positioned {
                continue;
            }
            let size = self.rings.ring(neighbour).len();
            let radius = math::poly_circumradius(bl, size);
            match *self.rings.connection_vertices(id, neighbour).as_slice() {
                [a, b] => {
                    let (pa, pb) = (self.graph.position(a), self.graph.position(b));
                    let mid = Vector2::midpoint(pa, pb);
                    let apothem = math::apothem(radius, size);
                    let [n0, n1] = Vector2::normals(pa, pb);
                    let c0 = mid + n0.normalized() * apothem;
                    let c1 = mid + n1.normalized() * apothem;
                    let next_center = if center.distance_sq(c1) > center.distance_sq(c0) {
                        c1
                    } else {
                        c0
                    };
                    // start at the atom whose partner lies clockwise of it
                    let (s, p) = if (pa - next_center).cross(pb - next_center) < 0.0 {
                        (a, b)
                    } else {
                        (b, a)
                    };
                    ring_tasks.push(Task::Ring {
                        ring: neighbour,
                        center: next_center,
                        start: Some(s),
                        previous: Some(p),
                    });
                }
                [a] => {
                    let pa = self.graph.position(a);
                    let next_center = pa + (pa - center).normalized() * radius;
                    ring_tasks.push(Task::Ring {
                        ring: neighbour,
                        center: next_center,
                        start: Some(a),
                        previous: None,
                    });
                }
                _ => trace!(ring = id, neighbour, "neighbour shares more than two atoms"),
            }
        }

        let mut bond_tasks = Vec::new();
        for &m in &members {
            for &n in self.graph.neighbours(m) {
                if !self.graph[n].positioned {
                    bond_tasks.push(Task::Bond {
                        vertex: n,
                        previous: Some(m),
                        angle: 0.0,
                        origin_shortest: false,
                    });
                }
            }
        }

        self.stack.extend(bond_tasks.into_iter().rev());
        self.stack.extend(ring_tasks.into_iter().rev());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse_smiles;

    fn n(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    fn place(smiles: &str) -> (Graph, RingSet) {
        let mut graph = Graph::from_input(&parse_smiles(smiles).unwrap()).unwrap();
        let mut rings = RingSet::perceive(&mut graph);
        position(&mut graph, &mut rings, &Options::default());
        (graph, rings)
    }

    fn assert_bond_lengths(graph: &Graph, expected: f64, tolerance: f64) {
        for e in graph.edges() {
            let d = graph.position(e.source).distance(graph.position(e.target));
            assert!(
                (d - expected).abs() < tolerance,
                "bond {:?}-{:?} has length {d}",
                e.source,
                e.target
            );
        }
    }

    fn angle_at(graph: &Graph, a: usize, b: usize, c: usize) -> f64 {
        let u = graph.position(n(a)) - graph.position(n(b));
        let v = graph.position(n(c)) - graph.position(n(b));
        let cos = (u.dot(v) / (u.length() * v.length())).clamp(-1.0, 1.0);
        math::to_deg(cos.acos())
    }

    #[test]
    fn cyclohexane_is_a_regular_hexagon() {
        let (g, rings) = place("C1CCCCC1");
        assert!(g.vertices().all(|v| v.positioned));
        assert_bond_lengths(&g, 30.0, 1e-6);
        let ring = rings.ring(0);
        assert!(ring.positioned);
        assert!(ring.center.distance(ring.centroid(&g)) < 1e-6);
        for &m in &ring.members {
            assert!((g.position(m).distance(ring.center) - 30.0).abs() < 1e-6);
        }
    }

    #[test]
    fn chain_zig_zags() {
        let (g, _) = place("CCCCC");
        assert_bond_lengths(&g, 30.0, 1e-6);
        for i in 1..4 {
            assert!((angle_at(&g, i - 1, i, i + 1) - 120.0).abs() < 1e-6);
        }
        // a zig-zag keeps moving away instead of curling back
        let d02 = g.position(n(0)).distance(g.position(n(2)));
        let d04 = g.position(n(0)).distance(g.position(n(4)));
        assert!(d04 > d02);
    }

    #[test]
    fn trans_ring_bond_twists_the_ring() {
        let (g, rings) = place("C1CCCC/C=C/CCCC1");
        let relation = stereo::drawn_relation(&g, n(5), n(6), n(4), n(7));
        assert_eq!(relation, Some(CisTrans::Trans));
        let ring = rings.active().next().unwrap();
        assert!(!ring.is_bridged);
        assert!(ring.members.iter().all(|&m| g[m].force_positioned));
        // the double bond and its ring neighbours keep polygon bond lengths
        for (p, q) in [(4, 5), (5, 6), (6, 7)] {
            assert!((g.position(n(p)).distance(g.position(n(q))) - 30.0).abs() < 1e-6);
        }
    }

    #[test]
    fn cis_ring_bond_stays_a_polygon() {
        let (g, _) = place(r"C1CCCC/C=C\CCCC1");
        assert_eq!(stereo::drawn_relation(&g, n(5), n(6), n(4), n(7)), Some(CisTrans::Cis));
        assert!(g.vertices().all(|v| !v.force_positioned));
        assert_bond_lengths(&g, 30.0, 1e-6);
    }

    #[test]
    fn triple_bond_is_straight() {
        let (g, _) = place("CC#CC");
        assert!((angle_at(&g, 0, 1, 2) - 180.0).abs() < 1e-4);
        assert!((angle_at(&g, 1, 2, 3) - 180.0).abs() < 1e-4);
    }

    #[test]
    fn fused_rings_share_an_edge() {
        let (g, rings) = place("c1ccc2ccccc2c1");
        assert_bond_lengths(&g, 30.0, 1e-6);
        let centers: Vec<Vector2> = rings.active().map(|r| r.center).collect();
        assert_eq!(centers.len(), 2);
        let expected = 30.0 * 3f64.sqrt();
        assert!((centers[0].distance(centers[1]) - expected).abs() < 1e-6);
    }

    #[test]
    fn spiro_rings_meet_at_one_atom() {
        let (g, rings) = place("C1CCC12CCCC2");
        assert_bond_lengths(&g, 30.0, 1e-6);
        assert!(rings.active().all(|r| r.positioned));
        let spiro = n(3);
        let centers: Vec<Vector2> = rings.active().map(|r| r.center).collect();
        // both centers sit on opposite sides of the shared atom
        let a = centers[0] - g.position(spiro);
        let b = centers[1] - g.position(spiro);
        assert!(a.dot(b) < 0.0);
    }

    #[test]
    fn substituent_points_out_of_the_ring() {
        let (g, rings) = place("c1ccccc1C");
        assert_bond_lengths(&g, 30.0, 1e-6);
        let center = rings.ring(0).center;
        let methyl = g.position(n(6));
        let anchor = g.position(n(5));
        assert!(methyl.distance(center) > anchor.distance(center));
    }

    #[test]
    fn bridged_ring_goes_through_the_solver() {
        let (g, rings) = place("C1CC2CCC1C2");
        let bridged = rings.active().find(|r| r.is_bridged).unwrap();
        assert!(bridged.positioned);
        for &m in &bridged.members {
            assert!(g[m].positioned && g[m].force_positioned);
            assert!(g.position(m).is_finite());
        }
    }

    #[test]
    fn fragments_are_side_by_side() {
        let (g, _) = place("C.C");
        let (a, b) = (g.position(n(0)), g.position(n(1)));
        assert!(b.x - a.x >= 2.0 * 30.0 - 1e-9);
        assert!((a.y - b.y).abs() < 1e-9);
    }

    #[test]
    fn single_atom() {
        let (g, _) = place("[Na+]");
        assert!(g[n(0)].positioned);
        assert!(g.position(n(0)).is_finite());
    }

    #[test]
    fn branches_do_not_coincide() {
        for smiles in ["CC(C)C", "CC(C)(C)C", "CC(C)(C)CC", "C(C)(C)(C)(C)CC", "c1ccccc1-c1ccccc1"] {
            let (g, _) = place(smiles);
            let ids: Vec<_> = g.vertex_ids().collect();
            for (i, &a) in ids.iter().enumerate() {
                for &b in &ids[i + 1..] {
                    let d = g.position(a).distance(g.position(b));
                    assert!(d > 5.0, "{smiles}: {a:?} and {b:?} are {d} apart");
                }
            }
        }
    }
}
