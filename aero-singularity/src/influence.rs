//! Panel influence coefficients
//!
//! Potential and velocity induced at a field point by a flat panel carrying
//! a uniform source or doublet distribution of unit strength. Three
//! integration methods are supported:
//!
//! - `Basis`: Gauss quadrature of the point-singularity kernels,
//! - `Nasa4023`: closed-form edge sums (NASA CR 4023 eq. 40),
//! - `Vortex`: the equivalent vortex ring; doublet-only.
//!
//! All results carry the 1/(4 pi) normalization. Beyond the configured
//! far-field radius a panel is collapsed to a point source or point dipole
//! of equal total strength.

use crate::core_model::VortexCoreParams;
use crate::filament::ring_velocity;
use crate::gauss::{quad_quadrature, triangle_quadrature};
use aeroflow_geom::{Panel, PanelShape, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use thiserror::Error;

const FOUR_PI_INV: f64 = 1.0 / (4.0 * PI);

/// Below this normal offset the field point is treated as lying in the
/// panel's plane and the edge arctangents take their limit values.
const IN_PLANE_TOLERANCE: f64 = 1e-9;

/// Panel integration method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IntegrationMethod {
    /// Numerical Gauss quadrature of the singularity kernels
    Basis,
    /// Closed-form edge sums
    #[default]
    Nasa4023,
    /// Equivalent vortex ring; cannot represent source distributions
    Vortex,
}

/// Influence evaluation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InfluenceError {
    /// A vortex ring is the curl-equivalent of a doublet sheet only; there
    /// is no ring equivalent for a source sheet.
    #[error("vortex-ring integration cannot represent a source distribution")]
    VortexSourceIncompatible,
}

/// Influence evaluation context.
///
/// Holds the integration method and the numerical parameters shared by all
/// panel evaluations of an analysis. Immutable once the analysis starts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PanelInfluence {
    method: IntegrationMethod,
    core: VortexCoreParams,
    quadrature_order: usize,
    rff: f64,
}

impl Default for PanelInfluence {
    fn default() -> Self {
        Self {
            method: IntegrationMethod::default(),
            core: VortexCoreParams::default(),
            quadrature_order: 5,
            rff: 10.0,
        }
    }
}

impl PanelInfluence {
    /// Create a context for the given method and core regularization.
    pub fn new(method: IntegrationMethod, core: VortexCoreParams) -> Self {
        Self {
            method,
            core,
            ..Self::default()
        }
    }

    /// Set the Gauss quadrature order used by the `Basis` method.
    pub fn with_quadrature_order(mut self, order: usize) -> Self {
        self.quadrature_order = order;
        self
    }

    /// Set the far-field factor: panels farther than `rff` times their
    /// characteristic size are collapsed to point singularities.
    pub fn with_far_field_factor(mut self, rff: f64) -> Self {
        self.rff = rff;
        self
    }

    /// The integration method in use.
    pub fn method(&self) -> IntegrationMethod {
        self.method
    }

    /// The core regularization in use.
    pub fn core(&self) -> VortexCoreParams {
        self.core
    }

    fn is_far(&self, panel: &Panel, pjk: f64) -> bool {
        pjk > self.rff * panel.max_size
    }

    /// Potential of a unit-strength source distribution on `panel` at `p`.
    pub fn source_potential(&self, panel: &Panel, p: &Vector3) -> Result<f64, InfluenceError> {
        if self.method == IntegrationMethod::Vortex {
            return Err(InfluenceError::VortexSourceIncompatible);
        }
        let pjk_v = *p - panel.collocation;
        let pjk = pjk_v.norm();
        if self.is_far(panel, pjk) {
            return Ok(-panel.area * FOUR_PI_INV / pjk);
        }
        match self.method {
            IntegrationMethod::Basis => {
                let mut phi = 0.0;
                for_each_quadrature_point(panel, self.quadrature_order, |q, w| {
                    let r = (*p - q).norm();
                    phi -= w / r;
                });
                Ok(phi * FOUR_PI_INV)
            }
            _ => Ok(edge_sums(panel, p, self.core.core_radius).source_potential),
        }
    }

    /// Velocity of a unit-strength source distribution on `panel` at `p`.
    ///
    /// `self_point` marks `p` as the panel's own collocation point, where
    /// the exterior limit `n/2` applies.
    pub fn source_velocity(
        &self,
        panel: &Panel,
        p: &Vector3,
        self_point: bool,
    ) -> Result<Vector3, InfluenceError> {
        if self.method == IntegrationMethod::Vortex {
            return Err(InfluenceError::VortexSourceIncompatible);
        }
        if self_point {
            return Ok(panel.normal * 0.5);
        }
        let pjk_v = *p - panel.collocation;
        let pjk = pjk_v.norm();
        if self.is_far(panel, pjk) {
            return Ok(pjk_v * (panel.area * FOUR_PI_INV / (pjk * pjk * pjk)));
        }
        match self.method {
            IntegrationMethod::Basis => {
                let mut v = Vector3::ZERO;
                for_each_quadrature_point(panel, self.quadrature_order, |q, w| {
                    let r_v = *p - q;
                    let r = r_v.norm();
                    v += r_v * (w / (r * r * r));
                });
                Ok(v * FOUR_PI_INV)
            }
            _ => Ok(edge_sums(panel, p, self.core.core_radius).source_velocity),
        }
    }

    /// Potential of a unit-strength doublet distribution on `panel` at `p`.
    ///
    /// `self_point` marks the panel's own collocation point; the on-surface
    /// principal value is 1/2.
    pub fn doublet_potential(&self, panel: &Panel, p: &Vector3, self_point: bool) -> f64 {
        if self_point {
            return 0.5;
        }
        let pjk_v = *p - panel.collocation;
        let pjk = pjk_v.norm();
        let pn = pjk_v.dot(&panel.normal);
        if self.is_far(panel, pjk) {
            return -pn * panel.area * FOUR_PI_INV / (pjk * pjk * pjk);
        }
        match self.method {
            IntegrationMethod::Basis => {
                let mut phi = 0.0;
                for_each_quadrature_point(panel, self.quadrature_order, |q, w| {
                    let r_v = *p - q;
                    let r = r_v.norm();
                    phi -= w * r_v.dot(&panel.normal) / (r * r * r);
                });
                phi * FOUR_PI_INV
            }
            _ => edge_sums(panel, p, self.core.core_radius).doublet_potential,
        }
    }

    /// Velocity of a unit-strength doublet distribution on `panel` at `p`.
    pub fn doublet_velocity(&self, panel: &Panel, p: &Vector3) -> Vector3 {
        let pjk_v = *p - panel.collocation;
        let pjk = pjk_v.norm();
        if self.is_far(panel, pjk) {
            // point dipole aligned with the panel normal
            let pn = pjk_v.dot(&panel.normal);
            let pjk5 = pjk.powi(5);
            return (pjk_v * (3.0 * pn) - panel.normal * (pjk * pjk))
                * (panel.area * FOUR_PI_INV / pjk5);
        }
        match self.method {
            IntegrationMethod::Basis => {
                let mut v = Vector3::ZERO;
                let n = panel.normal;
                for_each_quadrature_point(panel, self.quadrature_order, |q, w| {
                    let r_v = *p - q;
                    let r = r_v.norm();
                    let rn = r_v.dot(&n);
                    v += (r_v * (3.0 * rn) - n * (r * r)) * (w / r.powi(5));
                });
                v * FOUR_PI_INV
            }
            IntegrationMethod::Nasa4023 => {
                // the closed form drops edge contributions inside the core
                // radius, which is the cutoff regularization
                let cutoff = VortexCoreParams {
                    model: crate::core_model::VortexCoreModel::CutOff,
                    core_radius: self.core.core_radius,
                };
                ring_velocity(panel.corners(), p, &cutoff)
            }
            IntegrationMethod::Vortex => ring_velocity(panel.corners(), p, &self.core),
        }
    }
}

/// Closed-form edge sums for a uniform source/doublet panel (NASA CR 4023).
struct EdgeSums {
    source_potential: f64,
    source_velocity: Vector3,
    doublet_potential: f64,
}

fn edge_sums(panel: &Panel, p: &Vector3, core_radius: f64) -> EdgeSums {
    let pjk_v = *p - panel.collocation;
    let pn = pjk_v.dot(&panel.normal);

    let mut phi_source = 0.0;
    let mut vel_source = Vector3::ZERO;
    let mut phi_doublet = 0.0;

    let corners = panel.corners();
    let n_edges = corners.len();
    for i in 0..n_edges {
        let node_a = corners[i];
        let node_b = corners[(i + 1) % n_edges];

        let a = *p - node_a;
        let b = *p - node_b;
        let s = node_b - node_a;

        let na = a.norm();
        let nb = b.norm();
        let ns = s.norm();
        if ns < 1e-12 {
            // degenerate edge
            continue;
        }
        if na < core_radius || nb < core_radius {
            // field point on a vertex
            continue;
        }
        let h = a.cross(&s);
        if h.norm() / ns < core_radius && a.dot(&s) >= 0.0 && b.dot(&s) <= 0.0 {
            // field point on the edge segment
            continue;
        }

        let sm = s.dot(&panel.m_unit);
        let sl = s.dot(&panel.l_unit);
        let am = a.dot(&panel.m_unit);
        let al = a.dot(&panel.l_unit);
        let a_cross = am * sl - al * sm;
        let pa = pn * pn * sl + a_cross * am;
        let pb = pa - a_cross * sm;

        let gl = if (na + nb - ns).abs() > 0.0 {
            ((na + nb + ns) / (na + nb - ns)).abs().ln() / ns
        } else {
            0.0
        };

        let rnum = sm * pn * (nb * pa - na * pb);
        let dnom = pa * pb + pn * pn * na * nb * sm * sm;

        let cjk = if pn.abs() < IN_PLANE_TOLERANCE {
            // in-plane limits of the arctangent
            let sign = if panel.normal.dot(&h) >= 0.0 { 1.0 } else { -1.0 };
            if dnom < 0.0 {
                if pn > 0.0 {
                    PI * sign
                } else {
                    -PI * sign
                }
            } else if dnom == 0.0 {
                if pn > 0.0 {
                    PI / 2.0 * sign
                } else {
                    -PI / 2.0 * sign
                }
            } else {
                0.0
            }
        } else {
            rnum.atan2(dnom)
        };

        phi_source += a_cross * gl - pn * cjk;
        vel_source += panel.normal * cjk + panel.l_unit * (sm * gl) - panel.m_unit * (sl * gl);
        phi_doublet += cjk;
    }

    EdgeSums {
        source_potential: -phi_source * FOUR_PI_INV,
        source_velocity: vel_source * FOUR_PI_INV,
        doublet_potential: -phi_doublet * FOUR_PI_INV,
    }
}

/// Visit the Gauss points of a panel; the callback receives the global
/// position and the weight already scaled by the surface Jacobian.
fn for_each_quadrature_point(panel: &Panel, order: usize, mut f: impl FnMut(Vector3, f64)) {
    match panel.shape {
        PanelShape::Quad => {
            let [v0, v1, v2, v3] = panel.vertices;
            for (xi, eta, w) in quad_quadrature(order) {
                let n0 = 0.25 * (1.0 - xi) * (1.0 - eta);
                let n1 = 0.25 * (1.0 + xi) * (1.0 - eta);
                let n2 = 0.25 * (1.0 + xi) * (1.0 + eta);
                let n3 = 0.25 * (1.0 - xi) * (1.0 + eta);
                let q = v0 * n0 + v1 * n1 + v2 * n2 + v3 * n3;

                let d_xi = (v1 - v0) * (0.25 * (1.0 - eta))
                    + (v2 - v3) * (0.25 * (1.0 + eta));
                let d_eta = (v3 - v0) * (0.25 * (1.0 - xi))
                    + (v2 - v1) * (0.25 * (1.0 + xi));
                let jac = d_xi.cross(&d_eta).norm();
                f(q, w * jac);
            }
        }
        PanelShape::Triangle => {
            let v0 = panel.vertices[0];
            let v1 = panel.vertices[1];
            let v2 = panel.vertices[2];
            // reference-triangle weights sum to 1/2, the Jacobian is 2 A
            let jac = (v1 - v0).cross(&(v2 - v0)).norm();
            for (xi, eta, w) in triangle_quadrature(order.min(4)) {
                let q = v0 + (v1 - v0) * xi + (v2 - v0) * eta;
                f(q, w * jac);
            }
        }
    }
}
