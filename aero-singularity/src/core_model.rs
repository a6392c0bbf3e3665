//! Vortex core regularization models
//!
//! A raw vortex filament induces a velocity that diverges as 1/r near its
//! centerline. Each core model defines a damping factor applied to the
//! potential-flow solution: zero on the centerline, one far from the core.
//! The `Potential` model applies no damping and is singular by design.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lamb-Oseen constant: the factor placing the peak tangential velocity at
/// r = core_radius.
const LAMB_OSEEN_ALPHA: f64 = 1.25643;

/// Available core regularization models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VortexCoreModel {
    /// Unmollified 1/r potential solution; singular on the filament
    Potential,
    /// Hard cutoff: no induction inside the core radius
    CutOff,
    /// Lamb-Oseen viscous core, `1 - exp(-1.25643 (d/rc)^2)`
    #[default]
    LambOseen,
    /// Rankine solid-body core, `(d/rc)^2` inside the core
    Rankine,
    /// Scully algebraic core, `d^2 / (rc^2 + d^2)`
    Scully,
    /// Vatistas n=2 core, `d^2 / sqrt(rc^4 + d^4)`
    Vatistas,
}

/// Invalid core parameter combinations.
#[derive(Debug, Error, PartialEq)]
pub enum CoreParamError {
    /// All regularized models require a strictly positive core radius.
    #[error("core radius must be > 0 for the {model:?} model, got {radius}")]
    NonPositiveRadius {
        /// The offending model
        model: VortexCoreModel,
        /// The offending radius
        radius: f64,
    },
}

/// Core model plus radius; immutable for the duration of an analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VortexCoreParams {
    /// Regularization model
    pub model: VortexCoreModel,
    /// Core radius in mesh length units
    pub core_radius: f64,
}

impl Default for VortexCoreParams {
    fn default() -> Self {
        Self {
            model: VortexCoreModel::default(),
            core_radius: 1e-4,
        }
    }
}

impl VortexCoreParams {
    /// Create parameters, validating that regularized models carry a
    /// positive core radius.
    pub fn new(model: VortexCoreModel, core_radius: f64) -> Result<Self, CoreParamError> {
        let params = Self { model, core_radius };
        params.validate()?;
        Ok(params)
    }

    /// Check the radius/model invariant.
    pub fn validate(&self) -> Result<(), CoreParamError> {
        if self.model != VortexCoreModel::Potential && self.core_radius <= 0.0 {
            return Err(CoreParamError::NonPositiveRadius {
                model: self.model,
                radius: self.core_radius,
            });
        }
        Ok(())
    }

    /// Damping factor for a point at distance `d` from the filament axis.
    ///
    /// Returns a value in `[0, 1]`; exactly 1 for the `Potential` model.
    pub fn damping_factor(&self, d: f64) -> f64 {
        let rc = self.core_radius;
        match self.model {
            VortexCoreModel::Potential => 1.0,
            VortexCoreModel::CutOff => {
                if d < rc {
                    0.0
                } else {
                    1.0
                }
            }
            VortexCoreModel::LambOseen => {
                let x = d / rc;
                1.0 - (-LAMB_OSEEN_ALPHA * x * x).exp()
            }
            VortexCoreModel::Rankine => {
                if d < rc {
                    (d / rc).powi(2)
                } else {
                    1.0
                }
            }
            VortexCoreModel::Scully => d * d / (rc * rc + d * d),
            VortexCoreModel::Vatistas => d * d / (rc.powi(4) + d.powi(4)).sqrt(),
        }
    }
}
