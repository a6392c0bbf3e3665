//! Error taxonomy
//!
//! Errors are layered by blast radius: a configuration error aborts a batch
//! before any work begins, a mesh error fails one task, a solve error skips
//! one operating point. Convergence shortfalls and cancellations are states,
//! not errors, and never travel through this type.

use crate::task::TaskState;
use thiserror::Error;

/// Engine-wide result alias.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised by the analysis engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid settings, rejected before any analysis work starts.
    #[error("configuration: {reason}")]
    Config {
        /// What was rejected and why
        reason: String,
    },

    /// Surface discretization failed; the owning task fails, the batch
    /// moves on to the next task.
    #[error("meshing '{geometry}' failed: {reason}")]
    Mesh {
        /// Geometry being meshed
        geometry: String,
        /// What went wrong
        reason: String,
    },

    /// A single operating point could not be solved; the point is skipped
    /// and the task continues.
    #[error("solve failed at alpha={alpha:.3}, v_inf={v_inf:.3}: {reason}")]
    Solve {
        /// Angle of attack of the failed point, degrees
        alpha: f64,
        /// Freestream speed of the failed point
        v_inf: f64,
        /// What went wrong
        reason: String,
    },

    /// An operation was attempted in a state that does not allow it.
    #[error("operation not allowed in state {state:?}")]
    InvalidState {
        /// The task state at the time of the call
        state: TaskState,
    },
}

impl EngineError {
    /// Shorthand for a configuration error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// True when the error must abort the whole batch.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// True when the error fails the owning task but not the batch.
    pub fn is_task_fatal(&self) -> bool {
        matches!(self, Self::Mesh { .. } | Self::InvalidState { .. })
    }

    /// True when the error skips one operating point only.
    pub fn is_point_fatal(&self) -> bool {
        matches!(self, Self::Solve { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blast_radius_predicates() {
        let config = EngineError::config("bad relaxation");
        assert!(config.is_batch_fatal());
        assert!(!config.is_task_fatal());

        let mesh = EngineError::Mesh {
            geometry: "wing".into(),
            reason: "empty mesh".into(),
        };
        assert!(mesh.is_task_fatal());
        assert!(!mesh.is_batch_fatal());

        let solve = EngineError::Solve {
            alpha: 2.0,
            v_inf: 10.0,
            reason: "singular matrix".into(),
        };
        assert!(solve.is_point_fatal());
        assert!(!solve.is_task_fatal());
    }
}
