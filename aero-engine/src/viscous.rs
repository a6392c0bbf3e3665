//! Viscous coupling loop
//!
//! Relaxed fixed-point iteration between an inviscid solution and a viscous
//! closure. The loop owns no physics: the caller supplies a residual
//! function proposing new values from the current ones; the loop applies
//! under-relaxation and watches the unrelaxed update for convergence.

use crate::config::SolverConfig;
use crate::error::{EngineError, Result};

/// Outcome of a coupling run.
#[derive(Debug, Clone)]
pub struct ViscousOutcome {
    /// Final values, relaxed
    pub values: Vec<f64>,
    /// False when the iteration cap was exhausted first
    pub converged: bool,
    /// Iterations performed
    pub iterations: usize,
    /// Last unrelaxed maximum update magnitude
    pub error: f64,
}

/// Relaxed fixed-point driver.
#[derive(Debug, Clone, Copy)]
pub struct ViscousLoop {
    relax: f64,
    max_error: f64,
    max_iter: usize,
}

impl ViscousLoop {
    /// Create a loop, rejecting relaxation factors outside (0, 1].
    pub fn new(relax: f64, max_error: f64, max_iter: usize) -> Result<Self> {
        if !(relax > 0.0 && relax <= 1.0) {
            return Err(EngineError::config(format!(
                "relaxation factor must be in (0, 1], got {relax}"
            )));
        }
        Ok(Self {
            relax,
            max_error,
            max_iter,
        })
    }

    /// Build from the shared solver configuration.
    pub fn from_config(config: &SolverConfig) -> Result<Self> {
        Self::new(config.relax, config.max_visc_error, config.max_visc_iter)
    }

    /// Iterate until the unrelaxed update drops below the threshold or the
    /// cap is reached.
    ///
    /// Each iteration calls `residual` exactly once with the current values
    /// and receives the proposed replacement; the update applied is
    /// `relax * (proposed - current)`. An exhausted cap is not an error:
    /// the caller decides what an unconverged point means.
    pub fn run<F>(&self, initial: Vec<f64>, mut residual: F) -> Result<ViscousOutcome>
    where
        F: FnMut(&[f64]) -> Result<Vec<f64>>,
    {
        let mut values = initial;
        if self.max_iter == 0 {
            return Ok(ViscousOutcome {
                values,
                converged: false,
                iterations: 0,
                error: f64::INFINITY,
            });
        }

        let mut error = f64::INFINITY;
        for iteration in 1..=self.max_iter {
            let proposed = residual(&values)?;
            debug_assert_eq!(proposed.len(), values.len());

            error = 0.0;
            for (v, p) in values.iter_mut().zip(&proposed) {
                let delta = p - *v;
                error = error.max(delta.abs());
                *v += self.relax * delta;
            }

            if error < self.max_error {
                return Ok(ViscousOutcome {
                    values,
                    converged: true,
                    iterations: iteration,
                    error,
                });
            }
        }

        log::debug!(
            "viscous loop hit the {}-iteration cap, residual {:.3e}",
            self.max_iter,
            error
        );
        Ok(ViscousOutcome {
            values,
            converged: false,
            iterations: self.max_iter,
            error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rejects_bad_relaxation() {
        assert!(ViscousLoop::new(0.0, 0.01, 10).is_err());
        assert!(ViscousLoop::new(1.2, 0.01, 10).is_err());
        assert!(ViscousLoop::new(1.0, 0.01, 10).is_ok());
    }

    #[test]
    fn test_converges_to_fixed_point() {
        // x -> (x + 2) / 2 has the fixed point x = 2
        let vl = ViscousLoop::new(0.5, 1e-6, 200).unwrap();
        let outcome = vl
            .run(vec![0.0], |v| Ok(vec![(v[0] + 2.0) / 2.0]))
            .unwrap();
        assert!(outcome.converged);
        assert_relative_eq!(outcome.values[0], 2.0, epsilon = 1e-4);
        assert!(outcome.iterations < 200);
    }

    #[test]
    fn test_update_magnitude_decreases_monotonically() {
        // contraction map under partial relaxation: the unrelaxed update
        // magnitude shrinks on every pass after the loop settles
        let vl = ViscousLoop::new(0.7, 1e-9, 50).unwrap();
        let mut deltas = Vec::new();
        let outcome = vl
            .run(vec![0.0], |v| {
                let proposed = 0.2 * v[0] + 4.0;
                deltas.push((proposed - v[0]).abs());
                Ok(vec![proposed])
            })
            .unwrap();
        assert!(outcome.converged);
        assert!(deltas.len() >= 3);
        assert!(
            deltas.windows(2).skip(1).all(|w| w[1] <= w[0]),
            "update magnitudes not monotone: {deltas:?}"
        );
    }

    #[test]
    fn test_cap_exhaustion_is_not_an_error() {
        // divergent proposal never converges
        let vl = ViscousLoop::new(0.5, 1e-6, 7).unwrap();
        let outcome = vl.run(vec![1.0], |v| Ok(vec![v[0] * 2.0 + 1.0])).unwrap();
        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, 7);
        assert!(outcome.error > 1e-6);
    }

    #[test]
    fn test_zero_iteration_cap_returns_immediately() {
        let vl = ViscousLoop::new(0.5, 1e-6, 0).unwrap();
        let mut calls = 0;
        let outcome = vl
            .run(vec![3.0, 4.0], |v| {
                calls += 1;
                Ok(v.to_vec())
            })
            .unwrap();
        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.values, vec![3.0, 4.0]);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_residual_errors_propagate() {
        let vl = ViscousLoop::new(0.5, 1e-6, 10).unwrap();
        let result = vl.run(vec![0.0], |_| {
            Err(EngineError::Solve {
                alpha: 0.0,
                v_inf: 1.0,
                reason: "no section data".into(),
            })
        });
        assert!(result.is_err());
    }
}
