//! Ring perception and bridged-ring consolidation.
//!
//! Rings come from a minimum cycle basis computed per ring system (the
//! components left after removing every bridge bond). Rings that share
//! more than an edge, or that meet at an atom sitting in three or more
//! rings, are merged into a synthetic bridged ring which the placement
//! code lays out with the force-directed solver instead of as polygons.

use std::collections::{BTreeMap, VecDeque};

use petgraph::graph::NodeIndex;
use tracing::{debug, trace};

use crate::graph::Graph;
use crate::graph_ops;
use crate::math;
use crate::vector::Vector2;

/// Index of a ring inside its [`RingSet`].
pub type RingId = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    pub id: RingId,
    /// Vertex ids. For a perceived ring they read cyclically as a simple
    /// cycle; for a bridged ring they are the union of its constituents.
    pub members: Vec<NodeIndex>,
    /// Active rings sharing at least one atom with this one.
    pub neighbours: Vec<RingId>,
    pub is_bridged: bool,
    /// Absorbed into a bridged ring. Such rings are kept for reference but
    /// are not drawn or placed on their own.
    pub is_part_of_bridged: bool,
    pub is_fused: bool,
    pub is_spiro: bool,
    pub positioned: bool,
    pub center: Vector2,
    /// Constituent rings of a bridged ring.
    pub sub_rings: Vec<RingId>,
}

impl Ring {
    fn new(id: RingId, members: Vec<NodeIndex>) -> Self {
        Self {
            id,
            members,
            neighbours: Vec::new(),
            is_bridged: false,
            is_part_of_bridged: false,
            is_fused: false,
            is_spiro: false,
            positioned: false,
            center: Vector2::ZERO,
            sub_rings: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: NodeIndex) -> bool {
        self.members.contains(&id)
    }

    pub fn is_active(&self) -> bool {
        !self.is_part_of_bridged
    }

    /// Mean position of the members.
    pub fn centroid(&self, graph: &Graph) -> Vector2 {
        Vector2::centroid(self.members.iter().map(|&m| graph.position(m))).unwrap_or(self.center)
    }

    pub fn interior_angle(&self) -> f64 {
        math::interior_angle(self.len())
    }

    /// Members in cyclic order beginning at `start` and moving away from
    /// `previous`. Falls back to stored order when `start` is not a member.
    pub fn walk(&self, start: NodeIndex, previous: Option<NodeIndex>) -> Vec<NodeIndex> {
        let len = self.members.len();
        let Some(pos) = self.members.iter().position(|&m| m == start) else {
            return self.members.clone();
        };
        let backwards = previous.is_some_and(|p| self.members[(pos + 1) % len] == p);
        (0..len)
            .map(|i| {
                if backwards {
                    self.members[(pos + len - i) % len]
                } else {
                    self.members[(pos + i) % len]
                }
            })
            .collect()
    }
}

/// Two active rings that share at least one atom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingConnection {
    pub first: RingId,
    pub second: RingId,
    /// Shared vertex ids, ascending.
    pub vertices: Vec<NodeIndex>,
}

impl RingConnection {
    pub fn involves(&self, ring: RingId) -> bool {
        self.first == ring || self.second == ring
    }

    pub fn other(&self, ring: RingId) -> Option<RingId> {
        if ring == self.first {
            Some(self.second)
        } else if ring == self.second {
            Some(self.first)
        } else {
            None
        }
    }

    /// True when the rings share more than two atoms, or when a shared atom
    /// sits in more than two active rings.
    pub fn is_bridge(&self, graph: &Graph) -> bool {
        self.vertices.len() > 2
            || self
                .vertices
                .iter()
                .any(|&v| graph[v].value.rings.len() > 2)
    }
}

/// All rings of one molecule, with their connections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RingSet {
    rings: Vec<Ring>,
    connections: Vec<RingConnection>,
}

impl RingSet {
    /// Perceive rings, write memberships onto the vertices and consolidate
    /// bridged systems.
    pub fn perceive(graph: &mut Graph) -> Self {
        for id in graph.vertex_ids().collect::<Vec<_>>() {
            graph[id].value.clear_rings();
        }

        let mut set = RingSet::default();
        for members in sssr(graph) {
            set.add_ring(graph, members);
        }
        set.recompute_connections();
        debug!(
            rings = set.rings.len(),
            connections = set.connections.len(),
            "perceived rings"
        );

        set.consolidate(graph);
        debug_assert!(set.orphaned_members(graph).is_empty());
        set
    }

    fn add_ring(&mut self, graph: &mut Graph, members: Vec<NodeIndex>) -> RingId {
        let id = self.rings.len();
        for &m in &members {
            graph[m].value.rings.push(id);
        }
        self.rings.push(Ring::new(id, members));
        id
    }

    /// Merge bridge-connected rings until no bridge connection remains.
    fn consolidate(&mut self, graph: &mut Graph) {
        loop {
            let plan = self.merge_plan(graph);
            if plan.is_empty() {
                break;
            }

            let mut rings = self.rings.clone();
            for group in plan {
                let id = rings.len();
                let mut members: Vec<NodeIndex> = Vec::new();
                let mut sub_rings = Vec::new();
                for &rid in &group {
                    for &m in &rings[rid].members {
                        if !members.contains(&m) {
                            members.push(m);
                        }
                    }
                    if rings[rid].is_bridged {
                        sub_rings.extend(rings[rid].sub_rings.iter().copied());
                    } else {
                        sub_rings.push(rid);
                    }
                    rings[rid].is_part_of_bridged = true;
                }

                for &m in &members {
                    let atom = &mut graph[m].value;
                    atom.rings.retain(|r| !group.contains(r));
                    atom.rings.push(id);
                    atom.bridged_ring = Some(id);
                }

                debug!(
                    bridged = id,
                    merged = ?group,
                    members = members.len(),
                    "consolidated bridged ring"
                );
                let mut ring = Ring::new(id, members);
                ring.is_bridged = true;
                ring.sub_rings = sub_rings;
                rings.push(ring);
            }

            self.rings = rings;
            self.recompute_connections();
        }
    }

    /// Groups of active rings joined through bridge connections, each group
    /// sorted and the groups ordered by their smallest ring.
    fn merge_plan(&self, graph: &Graph) -> Vec<Vec<RingId>> {
        let mut parent: Vec<RingId> = (0..self.rings.len()).collect();
        fn find(parent: &mut [RingId], mut x: RingId) -> RingId {
            while parent[x] != x {
                parent[x] = parent[parent[x]];
                x = parent[x];
            }
            x
        }

        let mut any = false;
        for connection in &self.connections {
            if connection.is_bridge(graph) {
                trace!(
                    first = connection.first,
                    second = connection.second,
                    shared = connection.vertices.len(),
                    "bridge connection"
                );
                let a = find(&mut parent, connection.first);
                let b = find(&mut parent, connection.second);
                if a != b {
                    parent[a.max(b)] = a.min(b);
                }
                any = true;
            }
        }
        if !any {
            return Vec::new();
        }

        let mut groups: BTreeMap<RingId, Vec<RingId>> = BTreeMap::new();
        for ring in self.rings.iter().filter(|r| r.is_active()) {
            let root = find(&mut parent, ring.id);
            groups.entry(root).or_default().push(ring.id);
        }
        groups.into_values().filter(|g| g.len() > 1).collect()
    }

    fn recompute_connections(&mut self) {
        self.connections.clear();
        let active: Vec<RingId> = self.active_ids();
        for (i, &a) in active.iter().enumerate() {
            for &b in &active[i + 1..] {
                let mut shared: Vec<NodeIndex> = self.rings[a]
                    .members
                    .iter()
                    .copied()
                    .filter(|m| self.rings[b].members.contains(m))
                    .collect();
                if shared.is_empty() {
                    continue;
                }
                shared.sort();
                self.connections.push(RingConnection {
                    first: a,
                    second: b,
                    vertices: shared,
                });
            }
        }

        for ring in &mut self.rings {
            ring.neighbours.clear();
            ring.is_fused = false;
            ring.is_spiro = false;
        }
        for connection in &self.connections {
            let spiro = connection.vertices.len() == 1;
            for (this, other) in [
                (connection.first, connection.second),
                (connection.second, connection.first),
            ] {
                let ring = &mut self.rings[this];
                ring.neighbours.push(other);
                if spiro {
                    ring.is_spiro = true;
                } else {
                    ring.is_fused = true;
                }
            }
        }
    }

    /// Every ring ever created, absorbed ones included.
    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    /// Rings that are drawn: perceived rings not absorbed into a bridged
    /// ring, plus the bridged rings themselves.
    pub fn active(&self) -> impl Iterator<Item = &Ring> + '_ {
        self.rings.iter().filter(|r| r.is_active())
    }

    pub fn active_ids(&self) -> Vec<RingId> {
        self.active().map(|r| r.id).collect()
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    pub fn ring(&self, id: RingId) -> &Ring {
        &self.rings[id]
    }

    pub fn ring_mut(&mut self, id: RingId) -> &mut Ring {
        &mut self.rings[id]
    }

    pub fn connections(&self) -> &[RingConnection] {
        &self.connections
    }

    pub fn len(&self) -> usize {
        self.rings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    /// Vertices shared by two rings, ascending. Empty when unconnected.
    pub fn connection_vertices(&self, a: RingId, b: RingId) -> Vec<NodeIndex> {
        self.connections
            .iter()
            .find(|c| c.involves(a) && c.other(a) == Some(b))
            .map(|c| c.vertices.clone())
            .unwrap_or_default()
    }

    /// Neighbouring rings, those sharing the most atoms first.
    pub fn ordered_neighbours(&self, id: RingId) -> Vec<RingId> {
        let mut neighbours: Vec<(usize, RingId)> = self.rings[id]
            .neighbours
            .iter()
            .map(|&n| (self.connection_vertices(id, n).len(), n))
            .collect();
        neighbours.sort_by(|a, b| b.0.cmp(&a.0));
        neighbours.into_iter().map(|(_, n)| n).collect()
    }

    /// Recompute the center of every active ring from member positions.
    pub fn update_centers(&mut self, graph: &Graph) {
        for ring in self.rings.iter_mut().filter(|r| r.is_active()) {
            ring.center = ring.centroid(graph);
        }
    }

    /// Vertices whose `bridged_ring` does not list them as a member, or
    /// that lost all ring membership. Empty for a consistent ring set.
    pub fn orphaned_members(&self, graph: &Graph) -> Vec<NodeIndex> {
        graph
            .vertices()
            .filter(|v| match v.value.bridged_ring {
                Some(r) => {
                    v.value.rings.is_empty()
                        || self.rings.get(r).map_or(true, |ring| !ring.contains(v.id))
                }
                None => false,
            })
            .map(|v| v.id)
            .collect()
    }
}

/// Smallest set of smallest rings, ring system by ring system.
fn sssr(graph: &Graph) -> Vec<Vec<NodeIndex>> {
    let components = graph_ops::connected_components(&graph.components_adjacency_matrix());
    let mut rings = Vec::new();

    for component in components {
        let ids: Vec<NodeIndex> = component.into_iter().map(NodeIndex::new).collect();
        let system = RingSystem::new(graph, ids);
        let expected = system.cyclomatic_number();
        if expected == 0 {
            continue;
        }
        let local = if expected == 1 {
            system.single_cycle().into_iter().collect()
        } else {
            let candidates = system.horton_candidates();
            system.select_independent(&candidates, expected)
        };
        trace!(atoms = system.ids.len(), rings = local.len(), "ring system");
        rings.extend(
            local
                .into_iter()
                .map(|ring| ring.into_iter().map(|i| system.ids[i]).collect::<Vec<_>>()),
        );
    }

    rings
}

/// A bridge-free component, renumbered `0..n`.
struct RingSystem {
    ids: Vec<NodeIndex>,
    adjacency: Vec<Vec<usize>>,
    edge_index: BTreeMap<(usize, usize), usize>,
}

impl RingSystem {
    fn new(graph: &Graph, ids: Vec<NodeIndex>) -> Self {
        let adjacency = graph.subgraph_adjacency_list(&ids);
        let mut edge_index = BTreeMap::new();
        for (u, ns) in adjacency.iter().enumerate() {
            for &v in ns {
                if u < v {
                    let next = edge_index.len();
                    edge_index.insert((u, v), next);
                }
            }
        }
        Self {
            ids,
            adjacency,
            edge_index,
        }
    }

    fn edge_count(&self) -> usize {
        self.edge_index.len()
    }

    fn edge_between(&self, a: usize, b: usize) -> Option<usize> {
        self.edge_index.get(&(a.min(b), a.max(b))).copied()
    }

    fn cyclomatic_number(&self) -> usize {
        (self.edge_count() + 1).saturating_sub(self.ids.len())
    }

    /// The whole system when it is a single cycle, walked from vertex 0.
    fn single_cycle(&self) -> Option<Vec<usize>> {
        let n = self.ids.len();
        let mut ring = vec![0];
        let mut prev = 0;
        let mut cur = *self.adjacency[0].first()?;
        while cur != 0 {
            if ring.len() > n {
                return None;
            }
            ring.push(cur);
            let next = *self.adjacency[cur].iter().find(|&&nb| nb != prev)?;
            prev = cur;
            cur = next;
        }
        Some(ring)
    }

    /// Candidate cycles from shortest paths between every vertex and both
    /// ends of every edge, sorted by size.
    fn horton_candidates(&self) -> Vec<Vec<usize>> {
        let n = self.ids.len();
        let dist = self.all_pairs_bfs();
        let pred = self.all_pairs_predecessors(&dist);

        let mut candidates: Vec<Vec<usize>> = Vec::new();
        for &(u, v) in self.edge_index.keys() {
            for w in 0..n {
                let du = dist[w][u];
                let dv = dist[w][v];
                if du == u32::MAX || dv == u32::MAX {
                    continue;
                }
                if du as usize + dv as usize + 1 < 3 {
                    continue;
                }
                let path_u = reconstruct_path(&pred, w, u);
                let path_v = reconstruct_path(&pred, w, v);
                if path_u.is_empty() || path_v.is_empty() {
                    continue;
                }
                if paths_share_internal_node(&path_u, &path_v) {
                    continue;
                }
                let mut ring = path_u;
                ring.extend(path_v[1..].iter().rev());
                candidates.push(normalize_ring(&ring));
            }
        }

        candidates.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        candidates.dedup();
        candidates
    }

    fn select_independent(&self, candidates: &[Vec<usize>], needed: usize) -> Vec<Vec<usize>> {
        let mut result = Vec::with_capacity(needed);
        let mut basis: Vec<Vec<u64>> = Vec::with_capacity(needed);

        for ring in candidates {
            if result.len() >= needed {
                break;
            }
            let bv = self.edge_bitvector(ring);
            if bv.iter().all(|&w| w == 0) {
                continue;
            }
            if try_add_to_basis(&mut basis, bv) {
                result.push(ring.clone());
            }
        }
        result
    }

    fn edge_bitvector(&self, ring: &[usize]) -> Vec<u64> {
        let mut bv = vec![0u64; self.edge_count().div_ceil(64)];
        let len = ring.len();
        for i in 0..len {
            if let Some(idx) = self.edge_between(ring[i], ring[(i + 1) % len]) {
                bv[idx / 64] |= 1u64 << (idx % 64);
            }
        }
        bv
    }

    fn all_pairs_bfs(&self) -> Vec<Vec<u32>> {
        let n = self.ids.len();
        let mut dist = vec![vec![u32::MAX; n]; n];
        for (src, row) in dist.iter_mut().enumerate() {
            row[src] = 0;
            let mut queue = VecDeque::from([src]);
            while let Some(cur) = queue.pop_front() {
                let d = row[cur];
                for &nb in &self.adjacency[cur] {
                    if row[nb] == u32::MAX {
                        row[nb] = d + 1;
                        queue.push_back(nb);
                    }
                }
            }
        }
        dist
    }

    fn all_pairs_predecessors(&self, dist: &[Vec<u32>]) -> Vec<Vec<Option<usize>>> {
        let n = self.ids.len();
        let mut pred = vec![vec![None; n]; n];
        for src in 0..n {
            let mut visited = vec![false; n];
            visited[src] = true;
            let mut queue = VecDeque::from([src]);
            while let Some(cur) = queue.pop_front() {
                for &nb in &self.adjacency[cur] {
                    if !visited[nb] && dist[src][nb] == dist[src][cur] + 1 {
                        visited[nb] = true;
                        pred[src][nb] = Some(cur);
                        queue.push_back(nb);
                    }
                }
            }
        }
        pred
    }
}

fn reconstruct_path(pred: &[Vec<Option<usize>>], src: usize, dst: usize) -> Vec<usize> {
    let mut path = vec![dst];
    let mut cur = dst;
    while cur != src {
        match pred[src][cur] {
            Some(p) => {
                path.push(p);
                cur = p;
            }
            None => return vec![],
        }
    }
    path.reverse();
    path
}

fn paths_share_internal_node(path_u: &[usize], path_v: &[usize]) -> bool {
    if path_u.len() < 2 || path_v.len() < 2 {
        return false;
    }
    path_u[1..].iter().any(|node| path_v[1..].contains(node))
}

fn try_add_to_basis(basis: &mut Vec<Vec<u64>>, candidate: Vec<u64>) -> bool {
    let mut v = candidate;
    for row in basis.iter() {
        if let Some(p) = leading_bit(row) {
            if v[p / 64] & (1u64 << (p % 64)) != 0 {
                xor_into(&mut v, row);
            }
        }
    }
    if v.iter().all(|&w| w == 0) {
        return false;
    }
    basis.push(v);
    true
}

fn leading_bit(bv: &[u64]) -> Option<usize> {
    bv.iter()
        .enumerate()
        .find(|(_, &word)| word != 0)
        .map(|(i, &word)| i * 64 + word.trailing_zeros() as usize)
}

fn xor_into(a: &mut [u64], b: &[u64]) {
    for (aw, bw) in a.iter_mut().zip(b.iter()) {
        *aw ^= *bw;
    }
}

/// Rotate to the smallest index and orient so the second entry is the
/// smaller neighbour.
fn normalize_ring(ring: &[usize]) -> Vec<usize> {
    let Some(min_pos) = ring
        .iter()
        .enumerate()
        .min_by_key(|&(_, idx)| idx)
        .map(|(i, _)| i)
    else {
        return vec![];
    };

    let len = ring.len();
    let mut normalized: Vec<usize> = (0..len).map(|i| ring[(min_pos + i) % len]).collect();
    if len > 2 && normalized[1] > normalized[len - 1] {
        normalized[1..].reverse();
    }
    normalized
}
