//! Boundary traits
//!
//! The engine talks to meshing, point solving, the viscous closure and
//! message sinks through these traits only, so each can be replaced without
//! touching the task loop. Default implementations cover the flat-plate
//! demo path: a structured mesher, a thin-airfoil section and a sink
//! forwarding to the `log` facade.

use crate::channel::Severity;
use crate::error::{EngineError, Result};
use crate::polar::{FluidProperties, OperatingPoint, ReferenceDims};
use aeroflow_geom::{FlatPlateParams, PanelMesh, Vector3};
use serde::{Deserialize, Serialize};

/// A named geometry handle.
///
/// Tasks share geometries read-only behind an `Arc`; the mesh itself is
/// produced on demand through the `MeshProvider` boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geometry {
    /// Display name; polars target geometries by this name
    pub name: String,
    /// Reference dimensions for coefficient normalization
    pub reference: ReferenceDims,
    /// Parameters for the structured mesh generator
    pub plate: FlatPlateParams,
}

impl Geometry {
    /// A flat-plate geometry with reference dimensions derived from the
    /// plate parameters.
    pub fn flat_plate(name: impl Into<String>, plate: FlatPlateParams) -> Self {
        Self {
            name: name.into(),
            reference: ReferenceDims {
                area: plate.chord * plate.span,
                span: plate.span,
                chord: plate.chord,
            },
            plate,
        }
    }
}

/// Produces the panel mesh of a geometry.
pub trait MeshProvider: Send + Sync {
    /// Discretize the geometry surface into panels.
    fn triangulate(&self, geometry: &Geometry) -> Result<PanelMesh>;
}

/// Structured flat-plate mesher.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatPlateMesher;

impl MeshProvider for FlatPlateMesher {
    fn triangulate(&self, geometry: &Geometry) -> Result<PanelMesh> {
        if geometry.plate.chord <= 0.0 || geometry.plate.span <= 0.0 {
            return Err(EngineError::Mesh {
                geometry: geometry.name.clone(),
                reason: format!(
                    "non-positive planform: chord={}, span={}",
                    geometry.plate.chord, geometry.plate.span
                ),
            });
        }
        let mesh = PanelMesh::flat_plate(&geometry.plate);
        if mesh.is_empty() {
            return Err(EngineError::Mesh {
                geometry: geometry.name.clone(),
                reason: "generator produced an empty mesh".into(),
            });
        }
        Ok(mesh)
    }
}

/// Solution of a single operating point.
#[derive(Debug, Clone)]
pub struct PointSolution {
    /// Aerodynamic force in body axes
    pub force: Vector3,
    /// Aerodynamic moment about the origin
    pub moment: Vector3,
    /// Lift coefficient
    pub cl: f64,
    /// Drag coefficient (induced only; viscous additions come later)
    pub cd: f64,
    /// Pressure-coefficient field, one value per panel
    pub cp: Vec<f64>,
    /// Spanwise strip lift coefficients, inboard to outboard
    pub strip_cl: Vec<f64>,
}

/// A point solver holding the state derived from one mesh: influence
/// matrix, factorization, strip bookkeeping.
pub trait PreparedSolver: Send {
    /// Solve one operating point against the prepared mesh state.
    fn solve_point(
        &self,
        point: &OperatingPoint,
        fluid: &FluidProperties,
        reference: &ReferenceDims,
    ) -> Result<PointSolution>;
}

/// Assembles and solves the flow problem on a mesh.
///
/// The solver is opaque to the engine and may parallelize internally; the
/// task loop itself never spawns per-point threads.
pub trait PointSolver: Send + Sync {
    /// Assemble mesh-dependent state once, ahead of the point loop.
    fn assemble(&self, mesh: &PanelMesh) -> Result<Box<dyn PreparedSolver>>;

    /// Convenience one-off: assemble for the mesh and solve a single point.
    fn assemble_and_solve(
        &self,
        mesh: &PanelMesh,
        point: &OperatingPoint,
        fluid: &FluidProperties,
        reference: &ReferenceDims,
    ) -> Result<PointSolution> {
        self.assemble(mesh)?.solve_point(point, fluid, reference)
    }
}

/// The viscous closure: 2-D section characteristics as a function of the
/// local effective angle of attack.
pub trait SectionPolar: Send + Sync {
    /// Section lift coefficient at the given angle of attack, degrees.
    fn lift_coefficient(&self, alpha_deg: f64) -> f64;

    /// Section profile-drag coefficient at the given angle of attack,
    /// degrees.
    fn drag_coefficient(&self, alpha_deg: f64) -> f64;
}

/// Thin-airfoil section: linear lift clamped at stall, parabolic drag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThinAirfoilSection {
    /// Stall clamp on the lift coefficient
    pub cl_max: f64,
    /// Zero-lift drag coefficient
    pub cd0: f64,
    /// Quadratic drag coefficient on CL
    pub k: f64,
}

impl Default for ThinAirfoilSection {
    fn default() -> Self {
        Self {
            cl_max: 1.2,
            cd0: 0.01,
            k: 0.02,
        }
    }
}

impl SectionPolar for ThinAirfoilSection {
    fn lift_coefficient(&self, alpha_deg: f64) -> f64 {
        let cl = 2.0 * std::f64::consts::PI * alpha_deg.to_radians();
        cl.clamp(-self.cl_max, self.cl_max)
    }

    fn drag_coefficient(&self, alpha_deg: f64) -> f64 {
        let cl = self.lift_coefficient(alpha_deg);
        self.cd0 + self.k * cl * cl
    }
}

/// Consumes the progress messages drained from a task's channel.
pub trait LogSink: Send {
    /// Called once per forwarded progress message, in channel order.
    fn on_message(&mut self, severity: Severity, text: &str);
}

/// Forwards progress messages to the `log` facade at the matching level.
#[derive(Debug, Clone, Copy, Default)]
pub struct FacadeLogSink;

impl LogSink for FacadeLogSink {
    fn on_message(&mut self, severity: Severity, text: &str) {
        match severity {
            Severity::Info => log::info!("{text}"),
            Severity::Warn => log::warn!("{text}"),
            Severity::Error => log::error!("{text}"),
        }
    }
}

/// Collects messages in memory; used by tests and scripted runs.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    /// (severity, text) pairs in arrival order
    pub messages: Vec<(Severity, String)>,
}

impl LogSink for CollectingSink {
    fn on_message(&mut self, severity: Severity, text: &str) {
        self.messages.push((severity, text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_flat_plate_mesher() {
        let geom = Geometry::flat_plate("plate", FlatPlateParams::default());
        let mesh = FlatPlateMesher.triangulate(&geom).unwrap();
        assert_eq!(mesh.n_panels(), 25);
        assert_relative_eq!(geom.reference.area, 5.0);
    }

    #[test]
    fn test_mesher_rejects_degenerate_planform() {
        let geom = Geometry::flat_plate(
            "null",
            FlatPlateParams {
                chord: 0.0,
                ..FlatPlateParams::default()
            },
        );
        let err = FlatPlateMesher.triangulate(&geom).unwrap_err();
        assert!(err.is_task_fatal());
    }

    #[test]
    fn test_thin_airfoil_section() {
        let section = ThinAirfoilSection::default();
        assert_relative_eq!(section.lift_coefficient(0.0), 0.0);
        // linear range: cl = 2 pi alpha
        assert_relative_eq!(
            section.lift_coefficient(2.0),
            2.0 * std::f64::consts::PI * 2.0_f64.to_radians(),
            epsilon = 1e-12
        );
        // stall clamp
        assert_relative_eq!(section.lift_coefficient(45.0), 1.2);
        assert_relative_eq!(section.lift_coefficient(-45.0), -1.2);
        // drag is even in alpha
        assert_relative_eq!(
            section.drag_coefficient(3.0),
            section.drag_coefficient(-3.0),
            epsilon = 1e-12
        );
    }
}
