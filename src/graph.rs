//! The molecular graph the layout engine works on.
//!
//! [`Graph`] wraps a petgraph `UnGraph<Vertex, Edge>` and adds the pieces a
//! depiction needs on top of connectivity: per-vertex positions and
//! placement flags, the parse-order spanning tree, and on-demand
//! adjacency/distance matrices.

use std::ops::{Index, IndexMut};

use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use crate::atom::Atom;
use crate::bond::{BondOrder, Edge};
use crate::error::{LayoutError, Result};
use crate::graph_ops;
use crate::input::MoleculeInput;
use crate::stereo;
use crate::vector::Vector2;

#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub id: NodeIndex,
    pub value: Atom,
    pub position: Vector2,
    /// Position of the vertex this one was grown from during placement.
    pub previous_position: Vector2,
    /// Set once the vertex has a final-ish position. Never cleared.
    pub positioned: bool,
    /// Set when a layout algorithm (rather than default placement) fixed it.
    pub force_positioned: bool,
    /// Turn relative to the incoming bond chosen when this vertex was placed.
    pub angle: Option<f64>,
    /// Spanning-tree parent (the atom this one was written after).
    pub parent: Option<NodeIndex>,
    pub children: Vec<NodeIndex>,
    /// All bonded neighbours, in bond insertion order.
    pub neighbours: Vec<NodeIndex>,
}

impl Vertex {
    fn new(id: NodeIndex, value: Atom) -> Self {
        Self {
            id,
            value,
            position: Vector2::ZERO,
            previous_position: Vector2::ZERO,
            positioned: false,
            force_positioned: false,
            angle: None,
            parent: None,
            children: Vec::new(),
            neighbours: Vec::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.neighbours.len() <= 1
    }

    pub fn neighbours_except(&self, exclude: NodeIndex) -> Vec<NodeIndex> {
        self.neighbours
            .iter()
            .copied()
            .filter(|&n| n != exclude)
            .collect()
    }

    /// Children followed by the parent, minus `exclude`.
    pub fn spanning_tree_neighbours(&self, exclude: Option<NodeIndex>) -> Vec<NodeIndex> {
        self.children
            .iter()
            .copied()
            .chain(self.parent)
            .filter(|&n| Some(n) != exclude)
            .collect()
    }

    /// Direction of the bond that led to this vertex during placement.
    pub fn incoming_angle(&self) -> f64 {
        (self.position - self.previous_position).angle()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Graph {
    inner: UnGraph<Vertex, Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self {
            inner: UnGraph::default(),
        }
    }

    /// Build a graph from parser records.
    ///
    /// Non-ring-closure bonds define the spanning tree (the later atom is the
    /// child). Directional markers around double bonds are turned into
    /// cis/trans tables.
    pub fn from_input(input: &MoleculeInput) -> Result<Self> {
        let mut graph = Graph::new();
        for record in &input.atoms {
            graph.add_vertex(Atom {
                element: record.element.clone(),
                charge: record.charge,
                isotope: record.isotope,
                hydrogen_count: record.hydrogen_count,
                is_aromatic: record.is_aromatic,
                ..Atom::default()
            });
        }

        let atom_count = input.atoms.len();
        for (i, bond) in input.bonds.iter().enumerate() {
            for atom in [bond.source, bond.target] {
                if atom >= atom_count {
                    return Err(LayoutError::InvalidAtomIndex {
                        bond: i,
                        atom,
                        atom_count,
                    });
                }
            }
            if bond.source == bond.target {
                return Err(LayoutError::SelfBond {
                    bond: i,
                    atom: bond.source,
                });
            }
            let s = NodeIndex::new(bond.source);
            let t = NodeIndex::new(bond.target);
            if graph.edge_between(s, t).is_some() {
                return Err(LayoutError::DuplicateBond {
                    a: bond.source,
                    b: bond.target,
                });
            }
            let e = graph.add_edge(s, t, bond.order);
            graph[e].direction = bond.direction;

            if !bond.is_ring_closure {
                let (parent, child) = if s < t { (s, t) } else { (t, s) };
                if graph[child].parent.is_none() {
                    graph.set_parent(child, parent);
                }
            }
        }

        stereo::assign_cis_trans(&mut graph);
        Ok(graph)
    }

    pub fn add_vertex(&mut self, atom: Atom) -> NodeIndex {
        let id = NodeIndex::new(self.inner.node_count());
        let idx = self.inner.add_node(Vertex::new(id, atom));
        debug_assert_eq!(id, idx);
        idx
    }

    pub fn add_edge(&mut self, source: NodeIndex, target: NodeIndex, order: BondOrder) -> EdgeIndex {
        let e = self
            .inner
            .add_edge(source, target, Edge::new(source, target, order));
        self.inner[source].neighbours.push(target);
        self.inner[target].neighbours.push(source);
        e
    }

    pub fn set_parent(&mut self, child: NodeIndex, parent: NodeIndex) {
        self.inner[child].parent = Some(parent);
        self.inner[parent].children.push(child);
    }

    pub fn vertex_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.inner.node_indices()
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.inner.edge_indices()
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> + '_ {
        self.inner.node_weights()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.inner.edge_weights()
    }

    pub fn edge_between(&self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        self.inner.find_edge(a, b)
    }

    pub fn are_bonded(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.inner.find_edge(a, b).is_some()
    }

    pub fn edges_of(&self, id: NodeIndex) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.inner.edges(id).map(|e| e.id())
    }

    pub fn neighbours(&self, id: NodeIndex) -> &[NodeIndex] {
        &self.inner[id].neighbours
    }

    pub fn position(&self, id: NodeIndex) -> Vector2 {
        self.inner[id].position
    }

    pub fn positions(&self) -> Vec<Vector2> {
        self.inner.node_weights().map(|v| v.position).collect()
    }

    /// Whether both vertices belong to at least one common active ring.
    pub fn are_in_same_ring(&self, a: NodeIndex, b: NodeIndex) -> bool {
        let rings_b = &self.inner[b].value.rings;
        self.inner[a]
            .value
            .rings
            .iter()
            .any(|r| rings_b.contains(r))
    }

    /// Bond order between two vertices, if they are bonded.
    pub fn bond_order(&self, a: NodeIndex, b: NodeIndex) -> Option<BondOrder> {
        self.edge_between(a, b).map(|e| self.inner[e].order)
    }

    pub fn adjacency_matrix(&self) -> Vec<Vec<bool>> {
        let n = self.vertex_count();
        let mut matrix = vec![vec![false; n]; n];
        for edge in self.inner.edge_weights() {
            matrix[edge.source.index()][edge.target.index()] = true;
            matrix[edge.target.index()][edge.source.index()] = true;
        }
        matrix
    }

    /// Adjacency matrix with every bridge removed, so that each connected
    /// component left with more than one vertex is a ring system.
    pub fn components_adjacency_matrix(&self) -> Vec<Vec<bool>> {
        let mut matrix = self.adjacency_matrix();
        for (a, b) in graph_ops::bridges(self) {
            matrix[a.index()][b.index()] = false;
            matrix[b.index()][a.index()] = false;
        }
        matrix
    }

    /// Adjacency matrix restricted to `ids`, indexed by position in `ids`.
    pub fn subgraph_adjacency_matrix(&self, ids: &[NodeIndex]) -> Vec<Vec<bool>> {
        let n = ids.len();
        let mut matrix = vec![vec![false; n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                if self.are_bonded(ids[i], ids[j]) {
                    matrix[i][j] = true;
                    matrix[j][i] = true;
                }
            }
        }
        matrix
    }

    pub fn adjacency_list(&self) -> Vec<Vec<usize>> {
        self.inner
            .node_weights()
            .map(|v| v.neighbours.iter().map(|n| n.index()).collect())
            .collect()
    }

    /// Adjacency list restricted to `ids`, indexed by position in `ids`.
    pub fn subgraph_adjacency_list(&self, ids: &[NodeIndex]) -> Vec<Vec<usize>> {
        let matrix = self.subgraph_adjacency_matrix(ids);
        matrix
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|(_, &bonded)| bonded)
                    .map(|(j, _)| j)
                    .collect()
            })
            .collect()
    }

    /// All-pairs hop distances. Unreachable pairs are `f64::INFINITY`.
    pub fn distance_matrix(&self) -> Vec<Vec<f64>> {
        floyd_warshall(&self.adjacency_matrix())
    }

    pub fn subgraph_distance_matrix(&self, ids: &[NodeIndex]) -> Vec<Vec<f64>> {
        floyd_warshall(&self.subgraph_adjacency_matrix(ids))
    }
}

impl Index<NodeIndex> for Graph {
    type Output = Vertex;
    fn index(&self, id: NodeIndex) -> &Vertex {
        &self.inner[id]
    }
}

impl IndexMut<NodeIndex> for Graph {
    fn index_mut(&mut self, id: NodeIndex) -> &mut Vertex {
        &mut self.inner[id]
    }
}

impl Index<EdgeIndex> for Graph {
    type Output = Edge;
    fn index(&self, id: EdgeIndex) -> &Edge {
        &self.inner[id]
    }
}

impl IndexMut<EdgeIndex> for Graph {
    fn index_mut(&mut self, id: EdgeIndex) -> &mut Edge {
        &mut self.inner[id]
    }
}

fn floyd_warshall(adjacency: &[Vec<bool>]) -> Vec<Vec<f64>> {
    let n = adjacency.len();
    let mut dist = vec![vec![f64::INFINITY; n]; n];
    for i in 0..n {
        dist[i][i] = 0.0;
        for j in 0..n {
            if adjacency[i][j] {
                dist[i][j] = 1.0;
            }
        }
    }
    for k in 0..n {
        for i in 0..n {
            let dik = dist[i][k];
            if dik.is_infinite() {
                continue;
            }
            for j in 0..n {
                let through = dik + dist[k][j];
                if through < dist[i][j] {
                    dist[i][j] = through;
                }
            }
        }
    }
    dist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bond::BondDirection;
    use crate::input::{AtomRecord, BondRecord};

    fn n(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    fn hexagon() -> Graph {
        let edges: Vec<(usize, usize)> = (0..6).map(|i| (i, (i + 1) % 6)).collect();
        Graph::from_input(&MoleculeInput::carbon_skeleton(6, &edges)).unwrap()
    }

    #[test]
    fn from_input_builds_spanning_tree() {
        let g = hexagon();
        assert_eq!(g.vertex_count(), 6);
        assert_eq!(g.edge_count(), 6);
        assert_eq!(g[n(0)].parent, None);
        assert_eq!(g[n(3)].parent, Some(n(2)));
        assert_eq!(g[n(0)].children, vec![n(1)]);
        // ring closure 5-0 is not a tree edge
        assert!(g[n(5)].children.is_empty());
        assert_eq!(g[n(0)].neighbours, vec![n(1), n(5)]);
    }

    #[test]
    fn distance_matrix_on_ring() {
        let g = hexagon();
        let d = g.distance_matrix();
        assert_eq!(d[0][3], 3.0);
        assert_eq!(d[0][5], 1.0);
        assert_eq!(d[2][2], 0.0);
    }

    #[test]
    fn distance_matrix_disconnected_is_infinite() {
        let input = MoleculeInput {
            atoms: vec![AtomRecord::new("Na"), AtomRecord::new("Cl")],
            bonds: vec![],
        };
        let g = Graph::from_input(&input).unwrap();
        let d = g.distance_matrix();
        assert!(d[0][1].is_infinite());
    }

    #[test]
    fn subgraph_matrices_use_local_indices() {
        let g = hexagon();
        let ids = [n(1), n(2), n(4)];
        let adj = g.subgraph_adjacency_matrix(&ids);
        assert!(adj[0][1]);
        assert!(!adj[0][2]);
        let list = g.subgraph_adjacency_list(&ids);
        assert_eq!(list[0], vec![1]);
        assert!(list[2].is_empty());
        let d = g.subgraph_distance_matrix(&ids);
        assert!(d[0][2].is_infinite());
    }

    #[test]
    fn components_matrix_drops_bridges() {
        // cyclopropane with a methyl: C1CC1C
        let input = MoleculeInput::carbon_skeleton(4, &[(0, 1), (1, 2), (2, 0), (2, 3)]);
        let g = Graph::from_input(&input).unwrap();
        let m = g.components_adjacency_matrix();
        assert!(m[0][1] && m[1][2] && m[2][0]);
        assert!(!m[2][3]);
    }

    #[test]
    fn rejects_out_of_range_bond() {
        let input = MoleculeInput {
            atoms: vec![AtomRecord::new("C")],
            bonds: vec![BondRecord::new(0, 3, BondOrder::Single)],
        };
        assert_eq!(
            Graph::from_input(&input).unwrap_err(),
            LayoutError::InvalidAtomIndex {
                bond: 0,
                atom: 3,
                atom_count: 1
            }
        );
    }

    #[test]
    fn rejects_self_and_duplicate_bonds() {
        let mut input = MoleculeInput::carbon_skeleton(2, &[(0, 1)]);
        input.bonds.push(BondRecord::new(1, 0, BondOrder::Single));
        assert!(matches!(
            Graph::from_input(&input),
            Err(LayoutError::DuplicateBond { .. })
        ));

        let input = MoleculeInput {
            atoms: vec![AtomRecord::new("C")],
            bonds: vec![BondRecord::new(0, 0, BondOrder::Single)],
        };
        assert!(matches!(
            Graph::from_input(&input),
            Err(LayoutError::SelfBond { .. })
        ));
    }

    #[test]
    fn directions_are_kept_on_edges() {
        let mut input = MoleculeInput::carbon_skeleton(2, &[(0, 1)]);
        input.bonds[0].direction = Some(BondDirection::Up);
        let g = Graph::from_input(&input).unwrap();
        let e = g.edge_between(n(0), n(1)).unwrap();
        assert_eq!(g[e].direction, Some(BondDirection::Up));
    }

    #[test]
    fn spanning_tree_neighbours_exclude() {
        let g = hexagon();
        assert_eq!(g[n(1)].spanning_tree_neighbours(None), vec![n(2), n(0)]);
        assert_eq!(g[n(1)].spanning_tree_neighbours(Some(n(0))), vec![n(2)]);
    }
}
