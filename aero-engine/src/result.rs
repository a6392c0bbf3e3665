//! Per-point analysis results

use crate::polar::OperatingPoint;
use aeroflow_geom::Vector3;
use serde::{Deserialize, Serialize};

/// The outputs of one solved operating point.
///
/// Ownership transfers through the result channel to the batch executor,
/// which keeps or discards the record per the harvest policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    /// The operating point that was solved
    pub point: OperatingPoint,
    /// Aerodynamic force in body axes
    pub force: Vector3,
    /// Aerodynamic moment about the origin
    pub moment: Vector3,
    /// Lift coefficient
    pub cl: f64,
    /// Drag coefficient, induced plus viscous when coupled
    pub cd: f64,
    /// False when the viscous loop exhausted its iteration cap
    pub converged: bool,
    /// Surface pressure-coefficient field, one value per panel or station
    pub cp: Vec<f64>,
}
