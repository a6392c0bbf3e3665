//! Default dense panel point-solver
//!
//! Doublet (vortex-ring) lattice on the mean surface with a flat rigid
//! wake. Assembly fills one influence row per collocation point, in
//! parallel; the matrix is factored once per mesh and the factorization is
//! reused for every operating point of the task.
//!
//! The no-penetration condition at panel centroids gives
//! `sum_j A_ij mu_j = -V_inf . n_i`; trailing-edge panels shed their ring
//! into a downstream wake ring of equal strength, which is the steady
//! Kutta condition.

use crate::error::{EngineError, Result};
use crate::polar::{FluidProperties, OperatingPoint, ReferenceDims};
use crate::traits::{PointSolution, PointSolver, PreparedSolver};
use aeroflow_geom::{Panel, PanelMesh, Vector3};
use aeroflow_singularity::{ring_velocity, PanelInfluence, VortexCoreParams};
use aeroflow_solvers::{lu_factorize, LuFactorization};
use ndarray::{Array1, Array2};
use rayon::prelude::*;

/// Wake length in spans.
const WAKE_LENGTH_SPANS: f64 = 50.0;

/// Tolerance factor for grouping panels into spanwise strips and finding
/// chordwise neighbors, relative to the shortest mesh edge.
const ADJACENCY_FACTOR: f64 = 0.5;

/// Shortest edge length in the mesh; the scale for adjacency tolerances.
fn min_edge_length(panels: &[Panel]) -> f64 {
    panels
        .iter()
        .flat_map(|p| {
            let corners = p.corners();
            let m = corners.len();
            (0..m).map(move |i| (corners[(i + 1) % m] - corners[i]).norm())
        })
        .fold(f64::INFINITY, f64::min)
}

/// Dense doublet-lattice solver.
#[derive(Debug, Clone, Copy)]
pub struct DensePanelSolver {
    influence: PanelInfluence,
}

impl DensePanelSolver {
    /// Build a solver from the shared configuration.
    pub fn new(config: &crate::config::SolverConfig) -> Self {
        Self {
            influence: config.influence(),
        }
    }
}

impl PointSolver for DensePanelSolver {
    fn assemble(&self, mesh: &PanelMesh) -> Result<Box<dyn PreparedSolver>> {
        let n = mesh.n_panels();
        if n == 0 {
            return Err(EngineError::Mesh {
                geometry: String::new(),
                reason: "cannot assemble an empty mesh".into(),
            });
        }
        let core = self.influence.core();
        if mesh.min_panel_size() <= core.core_radius {
            return Err(EngineError::Mesh {
                geometry: String::new(),
                reason: format!(
                    "smallest panel ({:.3e}) is below the vortex core radius ({:.3e})",
                    mesh.min_panel_size(),
                    core.core_radius
                ),
            });
        }

        let wakes = wake_rings(mesh);
        let influence = self.influence;

        log::debug!("assembling {n}x{n} influence matrix, {} wake rings", wakes.len());

        let rows: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|i| {
                let colloc = mesh.panels[i].collocation;
                let normal = mesh.panels[i].normal;
                (0..n)
                    .map(|j| {
                        let is_self = i == j;
                        let mut v = if is_self {
                            // ring self-induction at the centroid
                            ring_velocity(mesh.panels[j].corners(), &colloc, &core)
                        } else {
                            influence.doublet_velocity(&mesh.panels[j], &colloc)
                        };
                        if let Some(wake) = &wakes[j] {
                            v += ring_velocity(wake, &colloc, &core);
                        }
                        v.dot(&normal)
                    })
                    .collect()
            })
            .collect();

        let mut matrix = Array2::zeros((n, n));
        for (i, row) in rows.into_iter().enumerate() {
            for (j, a) in row.into_iter().enumerate() {
                matrix[[i, j]] = a;
            }
        }

        let lu = lu_factorize(&matrix).map_err(|e| EngineError::Mesh {
            geometry: String::new(),
            reason: format!("influence matrix factorization: {e}"),
        })?;

        Ok(Box::new(PreparedDense {
            panels: mesh.panels.clone(),
            wakes,
            upstream: upstream_indices(mesh),
            lu,
            core,
        }))
    }
}

/// Mesh-derived state reused across the operating points of a task.
struct PreparedDense {
    panels: Vec<Panel>,
    wakes: Vec<Option<[Vector3; 4]>>,
    upstream: Vec<Option<usize>>,
    lu: LuFactorization,
    core: VortexCoreParams,
}

impl PreparedSolver for PreparedDense {
    fn solve_point(
        &self,
        point: &OperatingPoint,
        fluid: &FluidProperties,
        reference: &ReferenceDims,
    ) -> Result<PointSolution> {
        if point.v_inf <= 0.0 {
            return Err(EngineError::Solve {
                alpha: point.alpha,
                v_inf: point.v_inf,
                reason: "freestream speed must be positive".into(),
            });
        }
        let n = self.panels.len();
        let wind = Vector3::wind_direction(point.alpha, point.beta) * point.v_inf;

        let rhs = Array1::from_iter(self.panels.iter().map(|p| -wind.dot(&p.normal)));
        let mu = self.lu.solve(rhs.view()).map_err(|e| EngineError::Solve {
            alpha: point.alpha,
            v_inf: point.v_inf,
            reason: format!("linear solve: {e}"),
        })?;

        // Kutta-Joukowski on each panel's bound (leading) edge; the net
        // circulation there is the jump against the upstream ring
        let q = 0.5 * fluid.density * point.v_inf * point.v_inf;
        let mut force = Vector3::ZERO;
        let mut moment = Vector3::ZERO;
        let mut cp = Vec::with_capacity(n);
        let panel_forces: Vec<Vector3> = (0..n)
            .into_par_iter()
            .map(|k| {
                let (edge_a, edge_b) = bound_edge(&self.panels[k]);
                let mid = (edge_a + edge_b) * 0.5;
                let dl = edge_b - edge_a;
                let gamma = match self.upstream[k] {
                    Some(u) => mu[k] - mu[u],
                    None => mu[k],
                };

                let mut v_local = wind;
                for j in 0..n {
                    v_local += ring_velocity(self.panels[j].corners(), &mid, &self.core) * mu[j];
                    if let Some(wake) = &self.wakes[j] {
                        v_local += ring_velocity(wake, &mid, &self.core) * mu[j];
                    }
                }
                v_local.cross(&dl) * (fluid.density * gamma)
            })
            .collect();

        for (k, f) in panel_forces.iter().enumerate() {
            force += *f;
            let (edge_a, edge_b) = bound_edge(&self.panels[k]);
            moment += ((edge_a + edge_b) * 0.5).cross(f);
            cp.push(f.dot(&self.panels[k].normal) / (q * self.panels[k].area));
        }

        let alpha_rad = point.alpha.to_radians();
        let lift_dir = Vector3::new(-alpha_rad.sin(), 0.0, alpha_rad.cos());
        let wind_dir = wind.normalized();
        let q_s = q * reference.area;

        Ok(PointSolution {
            force,
            moment,
            cl: force.dot(&lift_dir) / q_s,
            cd: force.dot(&wind_dir) / q_s,
            cp,
            strip_cl: strip_lift(&self.panels, &panel_forces, &lift_dir, q),
        })
    }
}

/// Bound edge of a panel: the edge whose midpoint is farthest upstream,
/// traversed in the panel's ring direction.
fn bound_edge(panel: &Panel) -> (Vector3, Vector3) {
    let corners = panel.corners();
    let m = corners.len();
    let mut best = 0;
    let mut best_x = f64::INFINITY;
    for i in 0..m {
        let mid_x = 0.5 * (corners[i].x + corners[(i + 1) % m].x);
        if mid_x < best_x {
            best_x = mid_x;
            best = i;
        }
    }
    (corners[best], corners[(best + 1) % m])
}

/// Chordwise upstream neighbor of each panel: the nearest panel at the
/// same spanwise position with a smaller chordwise coordinate.
fn upstream_indices(mesh: &PanelMesh) -> Vec<Option<usize>> {
    let tol = min_edge_length(&mesh.panels) * ADJACENCY_FACTOR;
    mesh.panels
        .iter()
        .map(|p| {
            let mut best: Option<(usize, f64)> = None;
            for (j, other) in mesh.panels.iter().enumerate() {
                if (other.collocation.y - p.collocation.y).abs() > tol {
                    continue;
                }
                let dx = p.collocation.x - other.collocation.x;
                if dx <= tol {
                    continue;
                }
                match best {
                    Some((_, dist)) if dx >= dist => {}
                    _ => best = Some((j, dx)),
                }
            }
            best.map(|(j, _)| j)
        })
        .collect()
}

/// Wake ring behind each trailing-edge panel, `None` elsewhere. The ring
/// shares the trailing edge (traversed in reverse, so the shed vorticity
/// cancels there) and extends far downstream.
fn wake_rings(mesh: &PanelMesh) -> Vec<Option<[Vector3; 4]>> {
    let tol = min_edge_length(&mesh.panels) * ADJACENCY_FACTOR;
    let max_x = mesh
        .panels
        .iter()
        .flat_map(|p| p.corners().iter().map(|v| v.x))
        .fold(f64::NEG_INFINITY, f64::max);
    let span = mesh
        .panels
        .iter()
        .flat_map(|p| p.corners().iter().map(|v| v.y))
        .fold(0.0_f64, |acc, y| acc.max(y.abs()))
        * 2.0;
    let downstream = Vector3::new(WAKE_LENGTH_SPANS * span.max(1.0), 0.0, 0.0);

    mesh.panels
        .iter()
        .map(|p| {
            let corners = panel_trailing_edge(p, max_x, tol)?;
            let (te_a, te_b) = corners;
            // traversed trailing-edge-reversed, then downstream and back
            Some([te_b, te_a, te_a + downstream, te_b + downstream])
        })
        .collect()
}

/// The trailing edge of a panel when it lies on the mesh trailing edge.
fn panel_trailing_edge(panel: &Panel, max_x: f64, tol: f64) -> Option<(Vector3, Vector3)> {
    let corners = panel.corners();
    let m = corners.len();
    for i in 0..m {
        let a = corners[i];
        let b = corners[(i + 1) % m];
        if (a.x - max_x).abs() < tol && (b.x - max_x).abs() < tol {
            return Some((a, b));
        }
    }
    None
}

/// Strip lift coefficients, grouped by spanwise position, inboard order by
/// ascending y.
fn strip_lift(
    panels: &[Panel],
    forces: &[Vector3],
    lift_dir: &Vector3,
    q: f64,
) -> Vec<f64> {
    let tol = min_edge_length(panels) * ADJACENCY_FACTOR;

    let mut strips: Vec<(f64, f64, f64)> = Vec::new(); // (y, lift, area)
    for (p, f) in panels.iter().zip(forces) {
        let y = p.collocation.y;
        let lift = f.dot(lift_dir);
        match strips.iter_mut().find(|(sy, _, _)| (sy - y).abs() < tol) {
            Some((_, l, a)) => {
                *l += lift;
                *a += p.area;
            }
            None => strips.push((y, lift, p.area)),
        }
    }
    strips.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    strips.iter().map(|(_, l, a)| l / (q * a)).collect()
}
