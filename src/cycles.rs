//! Enumeration of every simple cycle of a molecule graph.
//!
//! This is Johnson's algorithm run on the symmetric directed view of an
//! undirected adjacency list. It is independent of ring perception and
//! meant for diagnostics (aromatic ring inventories and the like), so it
//! can be expensive on dense cages; `max_cycle_length` bounds the search.

use std::collections::BTreeSet;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

/// All simple cycles of length ≥ 3.
///
/// Each cycle starts at its smallest vertex and runs in whichever
/// direction is lexicographically smaller. The list is sorted by length
/// and then lexicographically. Neighbour indices outside the list are
/// ignored.
///
/// ```
/// use crabdraw::cycles::all_simple_cycles;
///
/// let square = vec![vec![1, 3], vec![0, 2], vec![1, 3], vec![2, 0]];
/// assert_eq!(all_simple_cycles(&square, None), vec![vec![0, 1, 2, 3]]);
/// ```
pub fn all_simple_cycles(adjacency: &[Vec<usize>], max_cycle_length: Option<usize>) -> Vec<Vec<usize>> {
    let n = adjacency.len();
    let successors: Vec<Vec<usize>> = adjacency
        .iter()
        .enumerate()
        .map(|(u, ns)| {
            let set: BTreeSet<usize> = ns.iter().copied().filter(|&v| v < n && v != u).collect();
            set.into_iter().collect()
        })
        .collect();

    if max_cycle_length.is_some_and(|max| max < 3) {
        return Vec::new();
    }
    let mut found: BTreeSet<Vec<usize>> = BTreeSet::new();

    let everything: Vec<usize> = (0..n).collect();
    let mut work = strongly_connected(&successors, &everything);

    while let Some(component) = work.pop() {
        let Some(&start) = component.iter().min() else {
            continue;
        };
        let mut member = vec![false; n];
        for &v in &component {
            member[v] = true;
        }
        search_from(&successors, &member, start, max_cycle_length, &mut found);

        let rest: Vec<usize> = component.into_iter().filter(|&v| v != start).collect();
        work.extend(strongly_connected(&successors, &rest));
    }

    let mut cycles: Vec<Vec<usize>> = found.into_iter().collect();
    cycles.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    cycles
}

/// Circuits through `start` inside one strongly connected component.
fn search_from(
    successors: &[Vec<usize>],
    member: &[bool],
    start: usize,
    max_cycle_length: Option<usize>,
    found: &mut BTreeSet<Vec<usize>>,
) {
    let n = successors.len();
    let mut blocked = vec![false; n];
    let mut block_lists: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
    let mut path = vec![start];
    let mut closed = vec![false];
    // (vertex, index of next successor to try)
    let mut stack = vec![(start, 0usize)];
    blocked[start] = true;

    while let Some(frame) = stack.last_mut() {
        let (this, next) = *frame;
        let candidate = successors[this][next..]
            .iter()
            .position(|&w| member[w])
            .map(|offset| next + offset);

        if let Some(i) = candidate {
            frame.1 = i + 1;
            let w = successors[this][i];
            if w == start {
                if path.len() > 2 {
                    found.insert(canonical(&path));
                }
                if let Some(last) = closed.last_mut() {
                    *last = true;
                }
            } else if !blocked[w] {
                if max_cycle_length.is_some_and(|max| path.len() >= max) {
                    // Cut by the length bound, not by reachability; must not
                    // stay blocked.
                    if let Some(last) = closed.last_mut() {
                        *last = true;
                    }
                    continue;
                }
                path.push(w);
                closed.push(false);
                stack.push((w, 0));
                blocked[w] = true;
            }
            continue;
        }

        stack.pop();
        let Some(v) = path.pop() else {
            break;
        };
        if closed.pop().unwrap_or(false) {
            if let Some(last) = closed.last_mut() {
                *last = true;
            }
            let mut unblock = vec![v];
            while let Some(u) = unblock.pop() {
                if blocked[u] {
                    blocked[u] = false;
                    unblock.extend(std::mem::take(&mut block_lists[u]));
                }
            }
        } else {
            for &w in &successors[v] {
                if member[w] {
                    block_lists[w].insert(v);
                }
            }
        }
    }
}

/// Strongly connected components of the subgraph induced by `vertices`,
/// keeping only those that can hold a cycle.
fn strongly_connected(successors: &[Vec<usize>], vertices: &[usize]) -> Vec<Vec<usize>> {
    let mut local = vec![usize::MAX; successors.len()];
    let mut digraph = DiGraph::<usize, ()>::with_capacity(vertices.len(), 0);
    for &v in vertices {
        local[v] = digraph.add_node(v).index();
    }
    for &u in vertices {
        for &w in &successors[u] {
            if local[w] != usize::MAX {
                digraph.add_edge(NodeIndex::new(local[u]), NodeIndex::new(local[w]), ());
            }
        }
    }

    tarjan_scc(&digraph)
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .map(|scc| {
            let mut ids: Vec<usize> = scc.into_iter().map(|ix| digraph[ix]).collect();
            ids.sort_unstable();
            ids
        })
        .collect()
}

/// Rotate to the smallest vertex, then keep the smaller of the two
/// reading directions.
fn canonical(cycle: &[usize]) -> Vec<usize> {
    let len = cycle.len();
    let min_pos = cycle
        .iter()
        .enumerate()
        .min_by_key(|&(_, v)| v)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let forward: Vec<usize> = (0..len).map(|i| cycle[(min_pos + i) % len]).collect();
    let backward: Vec<usize> = (0..len).map(|i| cycle[(min_pos + len - i) % len]).collect();
    forward.min(backward)
}
