//! Straight vortex filament induction
//!
//! Biot-Savart velocity of a finite straight filament of unit circulation,
//! with the singular 1/r behavior near the filament axis mollified by the
//! configured core model.

use crate::core_model::VortexCoreParams;
use aeroflow_geom::Vector3;

const FOUR_PI: f64 = 4.0 * std::f64::consts::PI;

/// Perpendicular distance below which the induction is taken as exactly
/// zero regardless of the core model. Guards the cross-product norm in the
/// denominator against catastrophic cancellation for points on the axis.
const AXIS_TOLERANCE: f64 = 1e-12;

/// Velocity induced at `p` by a straight filament of unit circulation
/// running from `a` to `b`.
///
/// The raw Biot-Savart result is scaled by the core damping factor at the
/// perpendicular distance from `p` to the filament axis. Points on the axis
/// (including the endpoints) see zero induced velocity.
pub fn filament_velocity(
    a: &Vector3,
    b: &Vector3,
    p: &Vector3,
    core: &VortexCoreParams,
) -> Vector3 {
    let r0 = *b - *a;
    let r1 = *p - *a;
    let r2 = *p - *b;

    let r1_norm = r1.norm();
    let r2_norm = r2.norm();
    let cross = r1.cross(&r2);
    let cross_sqr = cross.norm_sqr();

    let r0_norm = r0.norm();
    if r0_norm < AXIS_TOLERANCE || r1_norm < AXIS_TOLERANCE || r2_norm < AXIS_TOLERANCE {
        return Vector3::ZERO;
    }

    // perpendicular distance from p to the filament line
    let d = cross_sqr.sqrt() / r0_norm;
    if d < AXIS_TOLERANCE {
        return Vector3::ZERO;
    }

    let k = r0.dot(&r1) / r1_norm - r0.dot(&r2) / r2_norm;
    let raw = cross * (k / (FOUR_PI * cross_sqr));

    raw * core.damping_factor(d)
}

/// Velocity induced at `p` by a closed vortex ring of unit circulation
/// through the given corner loop.
pub fn ring_velocity(corners: &[Vector3], p: &Vector3, core: &VortexCoreParams) -> Vector3 {
    let mut v = Vector3::ZERO;
    for i in 0..corners.len() {
        let j = (i + 1) % corners.len();
        v += filament_velocity(&corners[i], &corners[j], p, core);
    }
    v
}
