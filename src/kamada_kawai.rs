//! Kamada-Kawai spring layout for vertex subsets.
//!
//! Used for bridged ring systems, where regular polygons cannot represent
//! the geometry. Every pair of vertices is joined by a spring whose rest
//! length is the hop distance times the bond length. The solver
//! repeatedly picks the free vertex with the largest energy gradient and
//! moves it with Newton steps while the others stay fixed.

use petgraph::graph::NodeIndex;
use tracing::{debug, warn};

use crate::graph::Graph;
use crate::math;
use crate::vector::Vector2;

/// Closest two vertices may get before distances are clamped.
const MIN_DISTANCE: f64 = 1e-6;
/// Stand-in for a vanishing second derivative.
const HESSIAN_FALLBACK: f64 = 0.1;
/// Side length of the polygon the free vertices start on.
const INITIAL_SIDE: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KkParams {
    /// Outer loop stops once the largest gradient energy falls below this.
    pub threshold: f64,
    /// Newton iterations on one vertex stop below this energy.
    pub inner_threshold: f64,
    pub max_iteration: usize,
    pub max_inner_iteration: usize,
    /// Starting value for the outer loop's energy bound.
    pub max_energy: f64,
}

impl Default for KkParams {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            inner_threshold: 0.1,
            max_iteration: 20000,
            max_inner_iteration: 50,
            max_energy: 1e9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KkReport {
    pub iterations: usize,
    /// Largest remaining gradient energy among the free vertices.
    pub residual_energy: f64,
    pub converged: bool,
}

struct Springs {
    /// Rest lengths.
    length: Vec<Vec<f64>>,
    /// Spring constants.
    strength: Vec<Vec<f64>>,
}

impl Springs {
    fn new(distances: &[Vec<f64>], bond_length: f64) -> Self {
        let n = distances.len();
        let longest = distances
            .iter()
            .flatten()
            .copied()
            .filter(|d| d.is_finite())
            .fold(0.0, f64::max);
        let mut length = vec![vec![0.0; n]; n];
        let mut strength = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let mut d = distances[i][j];
                if !d.is_finite() {
                    d = longest + 1.0;
                }
                length[i][j] = bond_length * d;
                strength[i][j] = bond_length / (d * d);
            }
        }
        Self { length, strength }
    }

    /// Gradient contribution on `u` from the spring to `v`.
    fn force(&self, i: usize, j: usize, u: Vector2, v: Vector2) -> Vector2 {
        let delta = u - v;
        let dist = delta.length().max(MIN_DISTANCE);
        (delta - delta * (self.length[i][j] / dist)) * self.strength[i][j]
    }
}

struct Solver {
    springs: Springs,
    positions: Vec<Vector2>,
    fixed: Vec<bool>,
    /// `pair[i][j]`: gradient on `i` from `j`. Antisymmetric.
    pair: Vec<Vec<Vector2>>,
    gradient: Vec<Vector2>,
}

impl Solver {
    fn new(springs: Springs, positions: Vec<Vector2>, fixed: Vec<bool>) -> Self {
        let n = positions.len();
        let mut pair = vec![vec![Vector2::ZERO; n]; n];
        let mut gradient = vec![Vector2::ZERO; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let f = springs.force(i, j, positions[i], positions[j]);
                pair[i][j] = f;
                pair[j][i] = -f;
                gradient[i] += f;
                gradient[j] -= f;
            }
        }
        Self {
            springs,
            positions,
            fixed,
            pair,
            gradient,
        }
    }

    fn energy(&self, i: usize) -> f64 {
        self.gradient[i].length_sq()
    }

    /// Free vertex with the largest energy. Ties keep the one seen first
    /// when scanning from the last index down.
    fn highest_energy(&self) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for i in (0..self.positions.len()).rev() {
            if self.fixed[i] {
                continue;
            }
            let e = self.energy(i);
            if e > best.map_or(0.0, |(_, b)| b) {
                best = Some((i, e));
            }
        }
        best
    }

    /// One Newton step for vertex `m`. Returns false when the step is not
    /// finite and was discarded.
    fn step(&mut self, m: usize) -> bool {
        let u = self.positions[m];
        let (mut dxx, mut dyy, mut dxy) = (0.0, 0.0, 0.0);
        for (i, &v) in self.positions.iter().enumerate() {
            if i == m {
                continue;
            }
            let l = self.springs.length[m][i];
            let k = self.springs.strength[m][i];
            let dx = u.x - v.x;
            let dy = u.y - v.y;
            let d2 = (dx * dx + dy * dy).max(MIN_DISTANCE * MIN_DISTANCE);
            let denom = 1.0 / d2.powf(1.5);
            dxx += k * (1.0 - l * dy * dy * denom);
            dyy += k * (1.0 - l * dx * dx * denom);
            dxy += k * (l * dx * dy * denom);
        }
        for h in [&mut dxx, &mut dyy, &mut dxy] {
            if h.abs() < f64::EPSILON {
                *h = HESSIAN_FALLBACK;
            }
        }

        let g = self.gradient[m];
        let det = dxx * dyy - dxy * dxy;
        let step = Vector2::new((dxy * g.y - dyy * g.x) / det, (dxy * g.x - dxx * g.y) / det);
        if !step.is_finite() {
            return false;
        }

        let u = u + step;
        self.positions[m] = u;
        let mut total = Vector2::ZERO;
        for i in 0..self.positions.len() {
            if i == m {
                continue;
            }
            let f = self.springs.force(m, i, u, self.positions[i]);
            let previous = self.pair[m][i];
            self.pair[m][i] = f;
            self.pair[i][m] = -f;
            // the other vertex feels the opposite force
            self.gradient[i] -= f - previous;
            total += f;
        }
        self.gradient[m] = total;
        true
    }
}

/// Lay out `vertex_ids` around `center`.
///
/// Already positioned vertices act as fixed anchors. Free vertices start
/// on a large circle and are relaxed. Afterwards every vertex in the
/// subset is marked positioned and force-positioned.
pub fn layout(
    graph: &mut Graph,
    vertex_ids: &[NodeIndex],
    center: Vector2,
    bond_length: f64,
    params: &KkParams,
) -> KkReport {
    let n = vertex_ids.len();
    let radius = math::poly_circumradius(INITIAL_SIDE, n.max(3));
    let angle = math::central_angle(n.max(1));
    let mut initial = vec![Vector2::ZERO; n];
    let mut a: f64 = 0.0;
    for i in (0..n).rev() {
        initial[i] = center + Vector2::new(a.cos(), a.sin()) * radius;
        a += angle;
    }

    let fixed: Vec<bool> = vertex_ids.iter().map(|&id| graph[id].positioned).collect();
    let seed: Vec<Vector2> = vertex_ids
        .iter()
        .enumerate()
        .map(|(i, &id)| if fixed[i] { graph.position(id) } else { initial[i] })
        .collect();
    relax(graph, vertex_ids, &seed, &fixed, bond_length, params)
}

/// Relax `vertex_ids` starting from `seed`. Vertices flagged in `fixed`
/// keep their seed position.
pub fn relax(
    graph: &mut Graph,
    vertex_ids: &[NodeIndex],
    seed: &[Vector2],
    fixed: &[bool],
    bond_length: f64,
    params: &KkParams,
) -> KkReport {
    let n = vertex_ids.len();
    if n == 0 {
        return KkReport {
            iterations: 0,
            residual_energy: 0.0,
            converged: true,
        };
    }

    let distances = graph.subgraph_distance_matrix(vertex_ids);
    let springs = Springs::new(&distances, bond_length);
    let mut solver = Solver::new(springs, seed.to_vec(), fixed.to_vec());
    let mut max_energy = params.max_energy;
    let mut iteration = 0;
    while max_energy > params.threshold && iteration < params.max_iteration {
        iteration += 1;
        let Some((m, energy)) = solver.highest_energy() else {
            max_energy = 0.0;
            break;
        };
        max_energy = energy;
        let mut delta = energy;
        let mut inner = 0;
        while delta > params.inner_threshold && inner < params.max_inner_iteration {
            inner += 1;
            if !solver.step(m) {
                break;
            }
            delta = solver.energy(m);
        }
    }

    let residual = solver.highest_energy().map_or(0.0, |(_, e)| e);
    let converged = max_energy <= params.threshold;
    if converged {
        debug!(vertices = n, iterations = iteration, residual, "kamada-kawai converged");
    } else {
        warn!(vertices = n, iterations = iteration, residual, "kamada-kawai hit its iteration cap");
    }

    for (i, &id) in vertex_ids.iter().enumerate() {
        let p = solver.positions[i];
        let vertex = &mut graph[id];
        vertex.position = if p.is_finite() { p } else { seed[i] };
        vertex.positioned = true;
        vertex.force_positioned = true;
    }

    KkReport {
        iterations: iteration,
        residual_energy: residual,
        converged,
    }
}
