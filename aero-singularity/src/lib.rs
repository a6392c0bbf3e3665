//! # Singularity evaluation for panel-method aerodynamics
//!
//! Evaluates the potential and velocity induced by source, doublet and vortex
//! elements at arbitrary field points:
//!
//! - straight vortex filaments with a configurable core-regularization model,
//! - flat tri/quad panels carrying uniform source/doublet distributions,
//!   integrated by Gauss quadrature, closed-form edge sums, or an equivalent
//!   vortex ring,
//! - a far-field gate that collapses distant panels to point singularities.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)] // Scientific code often has many parameters

pub mod core_model;
pub mod filament;
pub mod gauss;
pub mod influence;

pub use core_model::{CoreParamError, VortexCoreModel, VortexCoreParams};
pub use filament::{filament_velocity, ring_velocity};
pub use influence::{InfluenceError, IntegrationMethod, PanelInfluence};
