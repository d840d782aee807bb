//! Traversals and structural queries over a [`Graph`].
//!
//! All traversals are iterative with explicit stacks; visit orders match
//! the recursive formulations (neighbours in insertion order).

use std::collections::VecDeque;

use petgraph::graph::NodeIndex;

use crate::graph::Graph;

const UNVISITED: usize = usize::MAX;

/// Edges whose removal disconnects the graph, as `(discovered first,
/// discovered second)` pairs.
///
/// An edge `(u, v)` in the DFS tree is a bridge iff `low[v] > disc[u]`.
pub fn bridges(graph: &Graph) -> Vec<(NodeIndex, NodeIndex)> {
    let n = graph.vertex_count();
    let adjacency = graph.adjacency_list();
    let mut disc = vec![UNVISITED; n];
    let mut low = vec![0usize; n];
    let mut time = 0usize;
    let mut result = Vec::new();

    for root in 0..n {
        if disc[root] != UNVISITED {
            continue;
        }
        disc[root] = time;
        low[root] = time;
        time += 1;
        // (vertex, dfs parent, index of next neighbour to look at)
        let mut stack: Vec<(usize, Option<usize>, usize)> = vec![(root, None, 0)];

        while let Some(frame) = stack.last_mut() {
            let (u, parent, next) = *frame;
            if let Some(&v) = adjacency[u].get(next) {
                frame.2 += 1;
                if disc[v] == UNVISITED {
                    disc[v] = time;
                    low[v] = time;
                    time += 1;
                    stack.push((v, Some(u), 0));
                } else if Some(v) != parent {
                    low[u] = low[u].min(disc[v]);
                }
            } else {
                stack.pop();
                if let Some(p) = parent {
                    low[p] = low[p].min(low[u]);
                    if low[u] > disc[p] {
                        result.push((NodeIndex::new(p), NodeIndex::new(u)));
                    }
                }
            }
        }
    }

    result
}

/// Depth-first, pre-order walk starting at `start` and moving away from
/// `parent`.
///
/// Every bonded neighbour is followed, not only spanning-tree edges; a
/// visited bitmap keeps ring bonds from looping. `start` has depth 1 and
/// vertices deeper than `max_depth + 1` are skipped. With `ignore_first`
/// the callback is not invoked for `start`.
pub fn traverse_tree<F>(
    graph: &Graph,
    start: NodeIndex,
    parent: Option<NodeIndex>,
    max_depth: Option<usize>,
    ignore_first: bool,
    mut callback: F,
) where
    F: FnMut(NodeIndex),
{
    let mut visited = vec![false; graph.vertex_count()];
    let mut stack = vec![(start, parent, 1usize)];

    while let Some((id, from, depth)) = stack.pop() {
        if max_depth.is_some_and(|max| depth > max + 1) || visited[id.index()] {
            continue;
        }
        visited[id.index()] = true;
        if !ignore_first || depth > 1 {
            callback(id);
        }
        for &next in graph.neighbours(id).iter().rev() {
            if Some(next) != from {
                stack.push((next, Some(id), depth + 1));
            }
        }
    }
}

/// Ids reached by [`traverse_tree`] from `start` away from `parent`,
/// including `start`.
pub fn subtree(graph: &Graph, start: NodeIndex, parent: Option<NodeIndex>) -> Vec<NodeIndex> {
    let mut ids = Vec::new();
    traverse_tree(graph, start, parent, None, false, |id| ids.push(id));
    ids
}

/// Depth of the spanning tree hanging off `vertex` away from `parent`.
///
/// A lone vertex has depth 1. Returns 0 when either argument is absent.
pub fn tree_depth(graph: &Graph, vertex: Option<NodeIndex>, parent: Option<NodeIndex>) -> usize {
    let (Some(vertex), Some(parent)) = (vertex, parent) else {
        return 0;
    };
    let mut max = 0;
    let mut stack = vec![(vertex, parent, 1usize)];
    while let Some((id, from, depth)) = stack.pop() {
        max = max.max(depth);
        for next in graph[id].spanning_tree_neighbours(Some(from)) {
            stack.push((next, id, depth + 1));
        }
    }
    max
}

/// Connected components of a raw adjacency matrix, each sorted ascending.
/// Isolated vertices are left out.
pub fn connected_components(adjacency: &[Vec<bool>]) -> Vec<Vec<usize>> {
    let n = adjacency.len();
    let mut visited = vec![false; n];
    let mut components = Vec::new();

    for root in 0..n {
        if visited[root] {
            continue;
        }
        let mut component = Vec::new();
        let mut stack = vec![root];
        visited[root] = true;
        while let Some(u) = stack.pop() {
            component.push(u);
            for (v, &bonded) in adjacency[u].iter().enumerate() {
                if bonded && !visited[v] {
                    visited[v] = true;
                    stack.push(v);
                }
            }
        }
        if component.len() > 1 {
            component.sort_unstable();
            components.push(component);
        }
    }

    components
}

/// Number of connected components of a raw adjacency matrix, isolated
/// vertices included.
pub fn connected_component_count(adjacency: &[Vec<bool>]) -> usize {
    let n = adjacency.len();
    let mut visited = vec![false; n];
    let mut count = 0;
    for root in 0..n {
        if visited[root] {
            continue;
        }
        count += 1;
        let mut stack = vec![root];
        visited[root] = true;
        while let Some(u) = stack.pop() {
            for (v, &bonded) in adjacency[u].iter().enumerate() {
                if bonded && !visited[v] {
                    visited[v] = true;
                    stack.push(v);
                }
            }
        }
    }
    count
}

/// Every connected component of the molecule, single atoms included,
/// ordered by lowest member id.
pub fn fragments(graph: &Graph) -> Vec<Vec<NodeIndex>> {
    let n = graph.vertex_count();
    let mut visited = vec![false; n];
    let mut fragments = Vec::new();
    for node in graph.vertex_ids() {
        if visited[node.index()] {
            continue;
        }
        let mut fragment = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if visited[current.index()] {
                continue;
            }
            visited[current.index()] = true;
            fragment.push(current);
            for &neighbour in graph.neighbours(current) {
                if !visited[neighbour.index()] {
                    stack.push(neighbour);
                }
            }
        }
        fragment.sort();
        fragments.push(fragment);
    }
    fragments
}

/// Breadth-first shortest path, endpoints included.
pub fn shortest_path(graph: &Graph, from: NodeIndex, to: NodeIndex) -> Option<Vec<NodeIndex>> {
    if from == to {
        return Some(vec![from]);
    }
    let n = graph.vertex_count();
    let mut pred = vec![None; n];
    let mut visited = vec![false; n];
    visited[from.index()] = true;
    let mut queue = VecDeque::new();
    queue.push_back(from);
    while let Some(current) = queue.pop_front() {
        for &neighbour in graph.neighbours(current) {
            if visited[neighbour.index()] {
                continue;
            }
            visited[neighbour.index()] = true;
            pred[neighbour.index()] = Some(current);
            if neighbour == to {
                let mut path = vec![to];
                let mut node = to;
                while let Some(p) = pred[node.index()] {
                    path.push(p);
                    node = p;
                }
                path.reverse();
                return Some(path);
            }
            queue.push_back(neighbour);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MoleculeInput;

    fn n(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    fn skeleton(count: usize, edges: &[(usize, usize)]) -> Graph {
        Graph::from_input(&MoleculeInput::carbon_skeleton(count, edges)).unwrap()
    }

    fn chain(count: usize) -> Graph {
        let edges: Vec<_> = (1..count).map(|i| (i - 1, i)).collect();
        skeleton(count, &edges)
    }

    fn ring(count: usize) -> Graph {
        let edges: Vec<_> = (0..count).map(|i| (i, (i + 1) % count)).collect();
        skeleton(count, &edges)
    }

    fn normalized(mut pairs: Vec<(NodeIndex, NodeIndex)>) -> Vec<(usize, usize)> {
        let mut out: Vec<_> = pairs
            .drain(..)
            .map(|(a, b)| (a.index().min(b.index()), a.index().max(b.index())))
            .collect();
        out.sort();
        out
    }

    #[test]
    fn every_chain_bond_is_a_bridge() {
        let g = chain(5);
        assert_eq!(
            normalized(bridges(&g)),
            vec![(0, 1), (1, 2), (2, 3), (3, 4)]
        );
    }

    #[test]
    fn ring_has_no_bridges() {
        assert!(bridges(&ring(6)).is_empty());
    }

    #[test]
    fn ring_with_tail() {
        // C1CCCC1CC
        let g = skeleton(7, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0), (4, 5), (5, 6)]);
        assert_eq!(normalized(bridges(&g)), vec![(4, 5), (5, 6)]);
    }

    #[test]
    fn bridges_across_fragments() {
        let g = skeleton(4, &[(0, 1), (2, 3)]);
        assert_eq!(normalized(bridges(&g)), vec![(0, 1), (2, 3)]);
    }

    #[test]
    fn traverse_respects_max_depth() {
        let g = chain(6);
        let mut seen = Vec::new();
        traverse_tree(&g, n(0), None, Some(2), false, |id| seen.push(id.index()));
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn traverse_ignore_first() {
        let g = chain(4);
        let mut seen = Vec::new();
        traverse_tree(&g, n(1), Some(n(0)), None, true, |id| seen.push(id.index()));
        assert_eq!(seen, vec![2, 3]);
    }

    #[test]
    fn traverse_visits_ring_once_in_preorder() {
        let g = ring(6);
        let mut seen = Vec::new();
        traverse_tree(&g, n(0), None, None, false, |id| seen.push(id.index()));
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn subtree_away_from_parent() {
        // C(C)(CC)C : 0 bonded to 1, 2, 4; 2 bonded to 3
        let g = skeleton(5, &[(0, 1), (0, 2), (2, 3), (0, 4)]);
        assert_eq!(subtree(&g, n(2), Some(n(0))), vec![n(2), n(3)]);
        assert_eq!(subtree(&g, n(0), Some(n(2))), vec![n(0), n(1), n(4)]);
    }

    #[test]
    fn tree_depth_of_branches() {
        let g = skeleton(5, &[(0, 1), (0, 2), (2, 3), (0, 4)]);
        assert_eq!(tree_depth(&g, Some(n(2)), Some(n(0))), 2);
        assert_eq!(tree_depth(&g, Some(n(1)), Some(n(0))), 1);
        assert_eq!(tree_depth(&g, Some(n(0)), Some(n(1))), 3);
        assert_eq!(tree_depth(&g, Some(n(0)), None), 0);
        assert_eq!(tree_depth(&g, None, Some(n(0))), 0);
    }

    #[test]
    fn components_drop_singletons() {
        let matrix = vec![
            vec![false, true, false, false],
            vec![true, false, false, false],
            vec![false, false, false, false],
            vec![false, false, false, false],
        ];
        assert_eq!(connected_components(&matrix), vec![vec![0, 1]]);
        assert_eq!(connected_component_count(&matrix), 3);
    }

    #[test]
    fn fragments_include_single_atoms() {
        let g = skeleton(4, &[(0, 2)]);
        assert_eq!(
            fragments(&g),
            vec![vec![n(0), n(2)], vec![n(1)], vec![n(3)]]
        );
    }

    #[test]
    fn shortest_path_around_ring() {
        let g = ring(6);
        assert_eq!(
            shortest_path(&g, n(0), n(2)),
            Some(vec![n(0), n(1), n(2)])
        );
        assert_eq!(shortest_path(&g, n(0), n(4)).map(|p| p.len()), Some(3));
        assert_eq!(shortest_path(&g, n(3), n(3)), Some(vec![n(3)]));
    }

    #[test]
    fn shortest_path_disconnected() {
        let g = skeleton(3, &[(0, 1)]);
        assert_eq!(shortest_path(&g, n(0), n(2)), None);
    }
}
