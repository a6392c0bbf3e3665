//! Lifting-line kernel
//!
//! Classical lifting line on a rectangular planform. The circulation is
//! expanded in a sine series over cosine-spaced stations and the monoplane
//! equation is solved directly for the series coefficients, relinearizing
//! the section polar about the current effective incidence on each pass.
//! The relinearization passes are driven by `ViscousLoop`, so relaxation,
//! threshold and cap come from the shared configuration. For a linear
//! section the first pass is exact and the loop merely contracts onto it.

use crate::error::{EngineError, Result};
use crate::polar::{FluidProperties, OperatingPoint, ReferenceDims};
use crate::traits::SectionPolar;
use crate::viscous::ViscousLoop;
use aeroflow_geom::Vector3;
use aeroflow_solvers::lu_solve;
use ndarray::{Array1, Array2};
use std::f64::consts::PI;

/// Slope floor for the section linearization; keeps the monoplane system
/// well conditioned inside the stall clamp where the true slope is zero.
const MIN_LIFT_SLOPE: f64 = 0.5;

/// Finite-difference step for the local section slope, degrees.
const SLOPE_STEP_DEG: f64 = 0.05;

/// Converged spanwise solution of one operating point.
#[derive(Debug, Clone)]
pub struct LltSolution {
    /// Lift coefficient
    pub cl: f64,
    /// Drag coefficient, induced plus profile drag when requested
    pub cd: f64,
    /// Force in body axes
    pub force: Vector3,
    /// Moment about the origin
    pub moment: Vector3,
    /// Circulation per station
    pub gamma: Vec<f64>,
    /// Local lift coefficient per station
    pub strip_cl: Vec<f64>,
    /// False when the relinearization loop hit its cap
    pub converged: bool,
    /// Passes used by the relinearization loop
    pub iterations: usize,
}

/// Lifting-line solver for one geometry.
#[derive(Debug, Clone, Copy)]
pub struct LiftingLine {
    /// Number of spanwise stations
    pub n_stations: usize,
}

impl Default for LiftingLine {
    fn default() -> Self {
        Self { n_stations: 20 }
    }
}

impl LiftingLine {
    /// Solve one operating point.
    ///
    /// `include_profile_drag` adds the section drag at the effective
    /// incidence of each station to the induced drag.
    pub fn solve(
        &self,
        reference: &ReferenceDims,
        point: &OperatingPoint,
        section: &dyn SectionPolar,
        fluid: &FluidProperties,
        coupling: &ViscousLoop,
        include_profile_drag: bool,
    ) -> Result<LltSolution> {
        let v_inf = point.v_inf;
        if v_inf <= 0.0 {
            return Err(EngineError::Solve {
                alpha: point.alpha,
                v_inf,
                reason: "freestream speed must be positive".into(),
            });
        }
        let n = self.n_stations.max(4);
        let span = reference.span;
        let chord = reference.chord;

        // station angles at interval midpoints; the tips theta = 0, pi are
        // never stations
        let theta: Vec<f64> = (0..n).map(|i| PI * (i as f64 + 0.5) / n as f64).collect();
        let stations: Vec<f64> = theta.iter().map(|t| -0.5 * span * t.cos()).collect();

        let induced_angles = |gamma: &[f64]| -> Vec<f64> {
            let coeffs = sine_coefficients(gamma, &theta, span, v_inf);
            theta
                .iter()
                .map(|&t| {
                    coeffs
                        .iter()
                        .enumerate()
                        .map(|(k, a)| (k + 1) as f64 * a * ((k + 1) as f64 * t).sin())
                        .sum::<f64>()
                        / t.sin()
                })
                .collect()
        };

        let outcome = coupling.run(vec![0.0; n], |gamma| {
            // relinearize the section about the current effective incidence
            // and solve the monoplane equation for the proposed circulation
            let alpha_ind = induced_angles(gamma);
            let mut matrix = Array2::zeros((n, n));
            let mut rhs = Array1::zeros(n);
            for i in 0..n {
                let alpha_eff = point.alpha - alpha_ind[i].to_degrees();
                let slope = ((section.lift_coefficient(alpha_eff + SLOPE_STEP_DEG)
                    - section.lift_coefficient(alpha_eff - SLOPE_STEP_DEG))
                    / (2.0 * SLOPE_STEP_DEG.to_radians()))
                .max(MIN_LIFT_SLOPE);
                let cl0 = section.lift_coefficient(alpha_eff) - slope * alpha_eff.to_radians();
                let mu = chord * slope / (4.0 * span);
                let alpha_absolute = point.alpha.to_radians() + cl0 / slope;

                let st = theta[i].sin();
                for m in 1..=n {
                    let mf = m as f64;
                    matrix[[i, m - 1]] = (mf * theta[i]).sin() * (1.0 + mu * mf / st);
                }
                rhs[i] = mu * alpha_absolute;
            }
            let coeffs = lu_solve(&matrix, &rhs).map_err(|e| EngineError::Solve {
                alpha: point.alpha,
                v_inf,
                reason: format!("monoplane system: {e}"),
            })?;

            let proposed = theta
                .iter()
                .map(|&t| {
                    2.0 * span
                        * v_inf
                        * coeffs
                            .iter()
                            .enumerate()
                            .map(|(k, a)| a * (((k + 1) as f64) * t).sin())
                            .sum::<f64>()
                })
                .collect();
            Ok(proposed)
        })?;

        let gamma = outcome.values;
        let alpha_ind = induced_angles(&gamma);
        let q = 0.5 * fluid.density * v_inf * v_inf;

        // integrate strip loads
        let mut lift = 0.0;
        let mut drag_induced = 0.0;
        let mut drag_profile = 0.0;
        let mut moment = Vector3::ZERO;
        let mut strip_cl = Vec::with_capacity(n);

        let alpha_rad = point.alpha.to_radians();
        let lift_dir = Vector3::new(-alpha_rad.sin(), 0.0, alpha_rad.cos());
        let drag_dir = Vector3::new(alpha_rad.cos(), 0.0, alpha_rad.sin());

        for i in 0..n {
            let dy = 0.5 * span * (PI / n as f64) * theta[i].sin();
            let dl = fluid.density * v_inf * gamma[i] * dy;
            let di = fluid.density * v_inf * gamma[i] * alpha_ind[i] * dy;
            lift += dl;
            drag_induced += di;
            if include_profile_drag {
                let alpha_eff = point.alpha - alpha_ind[i].to_degrees();
                drag_profile += section.drag_coefficient(alpha_eff) * q * chord * dy;
            }
            strip_cl.push(gamma[i] / (0.5 * v_inf * chord));

            let f_strip = lift_dir * dl + drag_dir * di;
            moment += Vector3::new(0.0, stations[i], 0.0).cross(&f_strip);
        }

        let drag = drag_induced + drag_profile;
        let force = lift_dir * lift + drag_dir * drag;
        let q_s = q * reference.area;

        Ok(LltSolution {
            cl: lift / q_s,
            cd: drag / q_s,
            force,
            moment,
            gamma,
            strip_cl,
            converged: outcome.converged,
            iterations: outcome.iterations,
        })
    }
}

/// Sine-series coefficients of a circulation distribution sampled at the
/// midpoint stations, using discrete orthogonality of the sine basis.
fn sine_coefficients(gamma: &[f64], theta: &[f64], span: f64, v_inf: f64) -> Vec<f64> {
    let n = gamma.len();
    let scale = 2.0 / (n as f64 * 2.0 * span * v_inf);
    (1..n)
        .map(|m| {
            scale
                * gamma
                    .iter()
                    .zip(theta)
                    .map(|(g, &t)| g * (m as f64 * t).sin())
                    .sum::<f64>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ThinAirfoilSection;
    use approx::assert_relative_eq;

    fn solve(alpha: f64) -> LltSolution {
        let llt = LiftingLine::default();
        let coupling = ViscousLoop::new(0.5, 1e-6, 100).unwrap();
        llt.solve(
            &ReferenceDims::default(),
            &OperatingPoint {
                alpha,
                beta: 0.0,
                v_inf: 10.0,
                ctrl: 0.0,
            },
            &ThinAirfoilSection::default(),
            &FluidProperties::default(),
            &coupling,
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_zero_alpha_is_liftless() {
        let sol = solve(0.0);
        assert!(sol.converged);
        assert_relative_eq!(sol.cl, 0.0, epsilon = 1e-9);
        assert_relative_eq!(sol.cd, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_finite_span_reduces_lift_slope() {
        let alpha = 2.0_f64;
        let sol = solve(alpha);
        assert!(sol.converged);
        let cl_2d = 2.0 * PI * alpha.to_radians();
        // aspect ratio 5: the 3-D slope sits well below 2 pi but above the
        // crude elliptic estimate halved
        assert!(sol.cl < cl_2d, "cl={}", sol.cl);
        assert!(sol.cl > 0.5 * cl_2d, "cl={}", sol.cl);
        assert!(sol.cd > 0.0);
        // induced drag stays near the elliptic ideal CL^2 / (pi AR)
        let ar = 5.0;
        let ideal = sol.cl * sol.cl / (PI * ar);
        assert!(sol.cd > 0.8 * ideal, "cd={} ideal={}", sol.cd, ideal);
        assert!(sol.cd < 1.5 * ideal, "cd={} ideal={}", sol.cd, ideal);
    }

    #[test]
    fn test_lift_is_odd_in_alpha() {
        let up = solve(3.0);
        let down = solve(-3.0);
        assert_relative_eq!(up.cl, -down.cl, max_relative = 1e-5);
        assert_relative_eq!(up.cd, down.cd, max_relative = 1e-5);
    }

    #[test]
    fn test_circulation_vanishes_toward_tips() {
        let sol = solve(4.0);
        let mid = sol.gamma[sol.gamma.len() / 2];
        assert!(sol.gamma[0] < mid);
        assert!(*sol.gamma.last().unwrap() < mid);
    }

    #[test]
    fn test_profile_drag_adds_section_drag() {
        let llt = LiftingLine::default();
        let coupling = ViscousLoop::new(0.5, 1e-6, 100).unwrap();
        let point = OperatingPoint {
            alpha: 2.0,
            beta: 0.0,
            v_inf: 10.0,
            ctrl: 0.0,
        };
        let section = ThinAirfoilSection::default();
        let inviscid = llt
            .solve(
                &ReferenceDims::default(),
                &point,
                &section,
                &FluidProperties::default(),
                &coupling,
                false,
            )
            .unwrap();
        let viscous = llt
            .solve(
                &ReferenceDims::default(),
                &point,
                &section,
                &FluidProperties::default(),
                &coupling,
                true,
            )
            .unwrap();
        assert!(viscous.cd > inviscid.cd + 0.5 * section.cd0);
        assert_relative_eq!(viscous.cl, inviscid.cl, max_relative = 1e-9);
    }

    #[test]
    fn test_rejects_zero_speed() {
        let llt = LiftingLine::default();
        let coupling = ViscousLoop::new(0.5, 1e-6, 10).unwrap();
        let result = llt.solve(
            &ReferenceDims::default(),
            &OperatingPoint::default(),
            &ThinAirfoilSection::default(),
            &FluidProperties::default(),
            &coupling,
            false,
        );
        assert!(result.is_err());
    }
}
