//! # Geometry primitives for panel-method aerodynamics
//!
//! Small, allocation-free value types shared by every other aeroflow crate:
//! 3-D vectors, flat surface panels (triangles and quadrilaterals) and panel
//! meshes, plus a structured flat-plate generator used by tests and demos.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod mesh;
pub mod panel;
pub mod vector;

pub use mesh::{FlatPlateParams, PanelMesh};
pub use panel::{Panel, PanelShape};
pub use vector::Vector3;
