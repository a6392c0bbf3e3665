//! Solver configuration
//!
//! One immutable `SolverConfig` is built by the caller, validated before any
//! run, and passed by reference through the engine. There is no global
//! mutable state.

use crate::error::{EngineError, Result};
use aeroflow_singularity::{IntegrationMethod, PanelInfluence, VortexCoreModel, VortexCoreParams};
use serde::{Deserialize, Serialize};

/// Numerical settings shared by every task of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Panel integration method
    pub method: IntegrationMethod,
    /// Vortex core regularization
    pub core: VortexCoreParams,
    /// Far-field factor: panels farther than `rff` times their size are
    /// collapsed to point singularities
    pub rff: f64,
    /// Maximum number of right-hand sides solved against one factorization;
    /// polars resolving to more operating points are rejected up front
    pub max_nrhs: usize,
    /// Viscous coupling relaxation factor, in (0, 1]
    pub relax: f64,
    /// Viscous coupling iteration cap
    pub max_visc_iter: usize,
    /// Viscous coupling convergence threshold on the unrelaxed update
    pub max_visc_error: f64,
    /// Gauss quadrature order for the `Basis` integration method, 1 to 8
    pub quadrature_order: usize,
    /// Keep per-point result records after a batch run
    pub keep_operating_points: bool,
    /// Result channel capacity before the oldest entry is dropped
    pub channel_capacity: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            method: IntegrationMethod::Nasa4023,
            core: VortexCoreParams {
                model: VortexCoreModel::LambOseen,
                core_radius: 1e-4,
            },
            rff: 10.0,
            max_nrhs: 100,
            relax: 0.5,
            max_visc_iter: 35,
            max_visc_error: 0.01,
            quadrature_order: 5,
            keep_operating_points: false,
            channel_capacity: 256,
        }
    }
}

impl SolverConfig {
    /// Set the panel integration method.
    pub fn with_method(mut self, method: IntegrationMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the vortex core regularization.
    pub fn with_core(mut self, core: VortexCoreParams) -> Self {
        self.core = core;
        self
    }

    /// Set the far-field factor.
    pub fn with_far_field_factor(mut self, rff: f64) -> Self {
        self.rff = rff;
        self
    }

    /// Set the viscous relaxation factor.
    pub fn with_relaxation(mut self, relax: f64) -> Self {
        self.relax = relax;
        self
    }

    /// Keep per-point records after the batch run.
    pub fn with_keep_operating_points(mut self, keep: bool) -> Self {
        self.keep_operating_points = keep;
        self
    }

    /// Check every tunable before a run.
    pub fn validate(&self) -> Result<()> {
        if !(self.relax > 0.0 && self.relax <= 1.0) {
            return Err(EngineError::config(format!(
                "relaxation factor must be in (0, 1], got {}",
                self.relax
            )));
        }
        self.core
            .validate()
            .map_err(|e| EngineError::config(e.to_string()))?;
        if !(1..=8).contains(&self.quadrature_order) {
            return Err(EngineError::config(format!(
                "quadrature order must be 1 to 8, got {}",
                self.quadrature_order
            )));
        }
        if self.rff <= 0.0 {
            return Err(EngineError::config(format!(
                "far-field factor must be positive, got {}",
                self.rff
            )));
        }
        if self.max_nrhs == 0 {
            return Err(EngineError::config("max_nrhs must be at least 1"));
        }
        if self.channel_capacity == 0 {
            return Err(EngineError::config("channel capacity must be at least 1"));
        }
        Ok(())
    }

    /// Build the influence evaluation context for this configuration.
    pub fn influence(&self) -> PanelInfluence {
        PanelInfluence::new(self.method, self.core)
            .with_quadrature_order(self.quadrature_order)
            .with_far_field_factor(self.rff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SolverConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_relaxation() {
        for relax in [0.0, -0.5, 1.5] {
            let cfg = SolverConfig::default().with_relaxation(relax);
            assert!(cfg.validate().is_err(), "relax={relax}");
        }
        assert!(SolverConfig::default().with_relaxation(1.0).validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_core() {
        let cfg = SolverConfig::default().with_core(VortexCoreParams {
            model: VortexCoreModel::Scully,
            core_radius: 0.0,
        });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_quadrature_order() {
        let mut cfg = SolverConfig::default();
        cfg.quadrature_order = 0;
        assert!(cfg.validate().is_err());
        cfg.quadrature_order = 9;
        assert!(cfg.validate().is_err());
    }
}
