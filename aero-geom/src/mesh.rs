//! Panel mesh container and generators
//!
//! `PanelMesh` is the surface discretization consumed by the influence and
//! solver layers. The flat-plate generator produces the structured wing
//! meshes used throughout the test suite.

use crate::panel::Panel;
use crate::vector::Vector3;
use serde::{Deserialize, Serialize};

/// Parameters for the structured flat-plate generator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FlatPlateParams {
    /// Panels along the chord (x)
    pub nx: usize,
    /// Panels along the span (y)
    pub ny: usize,
    /// Chord length
    pub chord: f64,
    /// Full span
    pub span: f64,
}

impl Default for FlatPlateParams {
    fn default() -> Self {
        Self {
            nx: 5,
            ny: 5,
            chord: 1.0,
            span: 5.0,
        }
    }
}

/// A surface mesh of flat panels.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PanelMesh {
    /// The panels, in row-major order for structured meshes
    pub panels: Vec<Panel>,
}

impl PanelMesh {
    /// Build a mesh from a panel list.
    pub fn new(panels: Vec<Panel>) -> Self {
        Self { panels }
    }

    /// Number of panels.
    #[inline]
    pub fn n_panels(&self) -> usize {
        self.panels.len()
    }

    /// True when the mesh holds no panels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    /// Total surface area.
    pub fn total_area(&self) -> f64 {
        self.panels.iter().map(|p| p.area).sum()
    }

    /// Smallest panel characteristic size; meshing below the vortex core
    /// radius produces ill-conditioned self influences, so callers compare
    /// this against the configured core radius before solving.
    pub fn min_panel_size(&self) -> f64 {
        self.panels
            .iter()
            .map(|p| p.max_size)
            .fold(f64::INFINITY, f64::min)
    }

    /// Structured flat plate in the z = 0 plane, centered on the origin,
    /// normals pointing +z. Panels are ordered row-major, spanwise rows of
    /// chordwise panels.
    pub fn flat_plate(params: &FlatPlateParams) -> Self {
        let nx = params.nx.max(1);
        let ny = params.ny.max(1);
        let dx = params.chord / nx as f64;
        let dy = params.span / ny as f64;
        let x0 = -params.chord / 2.0;
        let y0 = -params.span / 2.0;

        let mut panels = Vec::with_capacity(nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                let xa = x0 + i as f64 * dx;
                let xb = xa + dx;
                let ya = y0 + j as f64 * dy;
                let yb = ya + dy;
                panels.push(Panel::quad(
                    Vector3::new(xa, ya, 0.0),
                    Vector3::new(xb, ya, 0.0),
                    Vector3::new(xb, yb, 0.0),
                    Vector3::new(xa, yb, 0.0),
                ));
            }
        }
        Self { panels }
    }
}
