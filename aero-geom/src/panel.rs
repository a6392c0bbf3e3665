//! Flat surface panels
//!
//! A panel is a flat triangle or quadrilateral carrying source/doublet
//! singularity distributions. It stores the derived quantities every
//! influence evaluation needs: collocation point, unit local frame,
//! area and characteristic size.

use crate::vector::Vector3;
use serde::{Deserialize, Serialize};

/// Panel planform shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PanelShape {
    /// Three-node flat triangle
    Triangle,
    /// Four-node flat quadrilateral
    Quad,
}

/// A flat panel in 3-D space.
///
/// Vertices are stored counter-clockwise when viewed from the outward normal
/// side. For a triangle the fourth vertex slot is unused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Panel {
    /// Vertex positions, CCW; `vertices[3]` is ignored for triangles
    pub vertices: [Vector3; 4],
    /// Planform shape
    pub shape: PanelShape,
    /// Collocation point (area centroid)
    pub collocation: Vector3,
    /// Outward unit normal
    pub normal: Vector3,
    /// In-plane unit vector along the first edge
    pub l_unit: Vector3,
    /// In-plane unit vector completing the right-handed frame
    pub m_unit: Vector3,
    /// Panel area
    pub area: f64,
    /// Longest edge length; the far-field gate compares distances against it
    pub max_size: f64,
}

impl Panel {
    /// Build a triangular panel from three CCW vertices.
    pub fn triangle(a: Vector3, b: Vector3, c: Vector3) -> Self {
        let normal = (b - a).cross(&(c - a));
        let area = 0.5 * normal.norm();
        let collocation = (a + b + c) / 3.0;
        let l_unit = (b - a).normalized();
        let n_unit = normal.normalized();
        let m_unit = n_unit.cross(&l_unit);
        let max_size = (b - a)
            .norm()
            .max((c - b).norm())
            .max((a - c).norm());

        Self {
            vertices: [a, b, c, Vector3::ZERO],
            shape: PanelShape::Triangle,
            collocation,
            normal: n_unit,
            l_unit,
            m_unit,
            area,
            max_size,
        }
    }

    /// Build a quadrilateral panel from four CCW vertices.
    ///
    /// The vertices are assumed coplanar to mesh tolerance; the normal is the
    /// normalized cross product of the diagonals, which averages out small
    /// warp.
    pub fn quad(a: Vector3, b: Vector3, c: Vector3, d: Vector3) -> Self {
        let normal = (c - a).cross(&(d - b));
        let n_unit = normal.normalized();
        // area of a (possibly warped) quad = half the diagonal cross product
        let area = 0.5 * (c - a).cross(&(d - b)).norm();
        let collocation = (a + b + c + d) / 4.0;
        let l_unit = (b - a).normalized();
        let m_unit = n_unit.cross(&l_unit);
        let max_size = (b - a)
            .norm()
            .max((c - b).norm())
            .max((d - c).norm())
            .max((a - d).norm());

        Self {
            vertices: [a, b, c, d],
            shape: PanelShape::Quad,
            collocation,
            normal: n_unit,
            l_unit,
            m_unit,
            area,
            max_size,
        }
    }

    /// Number of vertices (3 or 4).
    #[inline]
    pub fn n_vertices(&self) -> usize {
        match self.shape {
            PanelShape::Triangle => 3,
            PanelShape::Quad => 4,
        }
    }

    /// Vertex positions as a slice of the active vertices.
    #[inline]
    pub fn corners(&self) -> &[Vector3] {
        &self.vertices[..self.n_vertices()]
    }

    /// Express a global point in the panel's local frame
    /// (l, m in-plane, n out of plane, origin at the collocation point).
    pub fn to_local(&self, p: &Vector3) -> Vector3 {
        let r = *p - self.collocation;
        Vector3::new(r.dot(&self.l_unit), r.dot(&self.m_unit), r.dot(&self.normal))
    }

    /// Map a point from the panel's local frame back to global coordinates.
    pub fn to_global(&self, p: &Vector3) -> Vector3 {
        self.collocation + self.l_unit * p.x + self.m_unit * p.y + self.normal * p.z
    }
}
