//! Polar definitions and operating-point normalization
//!
//! A polar describes one analysis sweep. Scalar sweep shapes (alpha, speed,
//! sideslip or control sweeps) are normalized into an explicit list of
//! (alpha, beta, v_inf, ctrl) operating points before the task loop runs,
//! so the loop body never branches on the polar type.

use crate::range::{resolve_ranges, Range};
use serde::{Deserialize, Serialize};

const GRAVITY: f64 = 9.81;

/// Solver family requested by a polar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SolverFamily {
    /// Classical lifting-line along the span
    LiftingLine,
    /// Vortex lattice on the mean surface
    VortexLattice,
    /// First-order panel method
    #[default]
    LinearPanel,
}

/// Wake representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WakeModel {
    /// Flat rigid wake panels
    #[default]
    FlatPanel,
    /// Free vortex particles
    VortexParticle,
}

/// Sweep shape of a polar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PolarType {
    /// Alpha sweep at fixed freestream speed
    #[default]
    FixedSpeed,
    /// Alpha sweep, speed recomputed from the lift balance at each point
    FixedLift,
    /// Alpha sweep at the glide equilibrium speed
    Glide,
    /// Speed sweep at fixed alpha
    FixedAoa,
    /// Sideslip sweep at fixed alpha and speed
    BetaSweep,
    /// Control-parameter sweep interpolating alpha, beta and speed between
    /// declared endpoints
    ControlSweep,
    /// Control sweep for stability derivatives
    StabilityControl,
    /// Explicit list of (alpha, beta, v_inf) tuples
    MultiAxis,
}

impl PolarType {
    /// True for the shapes that reduce to a plain alpha sweep.
    pub fn is_alpha_sweep(&self) -> bool {
        matches!(self, Self::FixedSpeed | Self::FixedLift | Self::Glide)
    }
}

/// A resolved analysis point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OperatingPoint {
    /// Angle of attack, degrees
    pub alpha: f64,
    /// Sideslip angle, degrees
    pub beta: f64,
    /// Freestream speed
    pub v_inf: f64,
    /// Control parameter
    pub ctrl: f64,
}

/// Reference dimensions for coefficient normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDims {
    /// Reference area
    pub area: f64,
    /// Reference span
    pub span: f64,
    /// Reference chord
    pub chord: f64,
}

impl Default for ReferenceDims {
    fn default() -> Self {
        Self {
            area: 5.0,
            span: 5.0,
            chord: 1.0,
        }
    }
}

/// Fluid properties.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FluidProperties {
    /// Density
    pub density: f64,
    /// Kinematic viscosity
    pub viscosity: f64,
}

impl Default for FluidProperties {
    fn default() -> Self {
        // sea-level air
        Self {
            density: 1.225,
            viscosity: 1.5e-5,
        }
    }
}

/// Endpoints interpolated by control sweeps: at `ctrl = 0` the `min` values
/// apply, at `ctrl = 1` the `max` values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlEndpoints {
    /// Alpha at the sweep endpoints, degrees
    pub alpha: (f64, f64),
    /// Sideslip at the sweep endpoints, degrees
    pub beta: (f64, f64),
    /// Speed at the sweep endpoints
    pub v_inf: (f64, f64),
}

impl Default for ControlEndpoints {
    fn default() -> Self {
        Self {
            alpha: (0.0, 0.0),
            beta: (0.0, 0.0),
            v_inf: (10.0, 10.0),
        }
    }
}

/// Parabolic profile-drag fit applied on top of the inviscid solution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParabolicDragFit {
    /// Zero-lift drag coefficient
    pub cd0: f64,
    /// Quadratic coefficient on CL
    pub k: f64,
}

impl ParabolicDragFit {
    /// Minimum number of operating points needed to fit a parabola.
    pub const MIN_POINTS: usize = 3;

    /// Profile drag at the given lift coefficient.
    pub fn drag(&self, cl: f64) -> f64 {
        self.cd0 + self.k * cl * cl
    }
}

/// Immutable definition of one analysis sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolarSpec {
    /// Display name
    pub name: String,
    /// Solver family
    pub family: SolverFamily,
    /// Sweep shape
    pub polar_type: PolarType,
    /// Reference dimensions; recomputed per geometry for untargeted polars
    pub reference: ReferenceDims,
    /// Fluid properties
    pub fluid: FluidProperties,
    /// Wake representation
    pub wake: WakeModel,
    /// Run the viscous coupling loop at each point
    pub viscous: bool,
    /// Optional profile-drag fit
    pub drag_fit: Option<ParabolicDragFit>,
    /// Bind to this geometry only; `None` pairs with every loaded geometry
    pub target_geometry: Option<String>,
    /// Fixed freestream speed for alpha and sideslip sweeps
    pub v_inf: f64,
    /// Fixed alpha for speed and sideslip sweeps, degrees
    pub alpha: f64,
    /// Fixed sideslip for alpha and speed sweeps, degrees
    pub beta: f64,
    /// Mass for the lift-balance speed, fixed-lift and glide shapes
    pub mass: f64,
    /// Control sweep endpoints
    pub ctrl_endpoints: ControlEndpoints,
    /// Sweep value ranges
    pub ranges: Vec<Range>,
    /// Explicit points for the multi-axis shape
    pub points: Vec<OperatingPoint>,
}

impl Default for PolarSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            family: SolverFamily::default(),
            polar_type: PolarType::default(),
            reference: ReferenceDims::default(),
            fluid: FluidProperties::default(),
            wake: WakeModel::default(),
            viscous: false,
            drag_fit: None,
            target_geometry: None,
            v_inf: 10.0,
            alpha: 0.0,
            beta: 0.0,
            mass: 1.0,
            ctrl_endpoints: ControlEndpoints::default(),
            ranges: Vec::new(),
            points: Vec::new(),
        }
    }
}

impl PolarSpec {
    /// A fixed-speed alpha sweep over the given alpha values.
    pub fn fixed_speed(name: impl Into<String>, v_inf: f64, alphas: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            polar_type: PolarType::FixedSpeed,
            v_inf,
            ranges: vec![Range::new(alphas)],
            ..Self::default()
        }
    }

    /// Resolve this polar into its explicit operating-point list.
    ///
    /// Scalar sweeps are sorted ascending and deduplicated; the multi-axis
    /// shape keeps its declared order.
    pub fn operating_points(&self) -> Vec<OperatingPoint> {
        if self.polar_type == PolarType::MultiAxis {
            return self.points.clone();
        }
        let values = resolve_ranges(&self.ranges);
        values
            .iter()
            .map(|&v| self.point_for(v))
            .collect()
    }

    fn point_for(&self, value: f64) -> OperatingPoint {
        match self.polar_type {
            PolarType::FixedSpeed => OperatingPoint {
                alpha: value,
                beta: self.beta,
                v_inf: self.v_inf,
                ctrl: 0.0,
            },
            PolarType::FixedLift | PolarType::Glide => OperatingPoint {
                alpha: value,
                beta: self.beta,
                v_inf: self.lift_balance_speed(value),
                ctrl: 0.0,
            },
            PolarType::FixedAoa => OperatingPoint {
                alpha: self.alpha,
                beta: self.beta,
                v_inf: value,
                ctrl: 0.0,
            },
            PolarType::BetaSweep => OperatingPoint {
                alpha: self.alpha,
                beta: value,
                v_inf: self.v_inf,
                ctrl: 0.0,
            },
            PolarType::ControlSweep | PolarType::StabilityControl => {
                let e = &self.ctrl_endpoints;
                let lerp = |(lo, hi): (f64, f64)| lo + (hi - lo) * value;
                OperatingPoint {
                    alpha: lerp(e.alpha),
                    beta: lerp(e.beta),
                    v_inf: lerp(e.v_inf),
                    ctrl: value,
                }
            }
            PolarType::MultiAxis => unreachable!("multi-axis points are explicit"),
        }
    }

    /// Speed balancing weight against lift at the given alpha, using a thin
    /// airfoil estimate of CL with a floor to keep the speed finite near
    /// zero lift.
    fn lift_balance_speed(&self, alpha_deg: f64) -> f64 {
        let cl = (2.0 * std::f64::consts::PI * alpha_deg.to_radians()).max(0.05);
        (2.0 * self.mass * GRAVITY / (self.fluid.density * self.reference.area * cl)).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fixed_speed_normalization() {
        let polar = PolarSpec::fixed_speed("T1", 12.0, vec![2.0, -2.0, 0.0]);
        let points = polar.operating_points();
        assert_eq!(points.len(), 3);
        assert_relative_eq!(points[0].alpha, -2.0);
        assert_relative_eq!(points[2].alpha, 2.0);
        for p in &points {
            assert_relative_eq!(p.v_inf, 12.0);
            assert_relative_eq!(p.beta, 0.0);
        }
    }

    #[test]
    fn test_fixed_lift_speed_decreases_with_alpha() {
        let polar = PolarSpec {
            polar_type: PolarType::FixedLift,
            mass: 20.0,
            ranges: vec![Range::new(vec![2.0, 8.0])],
            ..PolarSpec::default()
        };
        let points = polar.operating_points();
        assert!(points[0].v_inf > points[1].v_inf);
        assert!(points.iter().all(|p| p.v_inf.is_finite() && p.v_inf > 0.0));
    }

    #[test]
    fn test_control_sweep_interpolates_endpoints() {
        let polar = PolarSpec {
            polar_type: PolarType::ControlSweep,
            ctrl_endpoints: ControlEndpoints {
                alpha: (0.0, 4.0),
                beta: (-2.0, 2.0),
                v_inf: (10.0, 30.0),
            },
            ranges: vec![Range::new(vec![0.0, 0.5, 1.0])],
            ..PolarSpec::default()
        };
        let points = polar.operating_points();
        assert_eq!(points.len(), 3);
        assert_relative_eq!(points[1].alpha, 2.0);
        assert_relative_eq!(points[1].beta, 0.0);
        assert_relative_eq!(points[1].v_inf, 20.0);
        assert_relative_eq!(points[2].alpha, 4.0);
    }

    #[test]
    fn test_multi_axis_keeps_declared_order() {
        let pts = vec![
            OperatingPoint {
                alpha: 4.0,
                beta: 0.0,
                v_inf: 10.0,
                ctrl: 0.0,
            },
            OperatingPoint {
                alpha: -2.0,
                beta: 1.0,
                v_inf: 20.0,
                ctrl: 0.0,
            },
        ];
        let polar = PolarSpec {
            polar_type: PolarType::MultiAxis,
            points: pts.clone(),
            ..PolarSpec::default()
        };
        assert_eq!(polar.operating_points(), pts);
    }

    #[test]
    fn test_empty_ranges_resolve_empty() {
        let polar = PolarSpec {
            polar_type: PolarType::FixedSpeed,
            ..PolarSpec::default()
        };
        assert!(polar.operating_points().is_empty());
    }
}
