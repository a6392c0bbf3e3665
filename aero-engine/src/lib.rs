//! Aerodynamic analysis execution engine
//!
//! Orchestrates aerodynamic polars over loaded geometries: polar sweeps are
//! normalized into operating-point lists, each (geometry, polar) pair
//! becomes an analysis task, and a batch executor runs the tasks one after
//! another while draining their result channels. The aerodynamics itself
//! lives behind boundary traits, with a lifting-line kernel and a dense
//! panel solver provided in-crate.

#![warn(missing_docs)]

pub mod batch;
pub mod channel;
pub mod config;
pub mod error;
pub mod llt;
pub mod polar;
pub mod range;
pub mod result;
pub mod solver;
pub mod task;
pub mod traits;
pub mod viscous;

pub use batch::{BatchExecutor, BatchSummary, TaskOutcome};
pub use channel::{ProgressMessage, Report, ResultChannel, Severity};
pub use config::SolverConfig;
pub use error::{EngineError, Result};
pub use llt::{LiftingLine, LltSolution};
pub use polar::{
    ControlEndpoints, FluidProperties, OperatingPoint, ParabolicDragFit, PolarSpec, PolarType,
    ReferenceDims, SolverFamily, WakeModel,
};
pub use range::{resolve_ranges, Range};
pub use result::ResultRecord;
pub use solver::DensePanelSolver;
pub use task::{AnalysisTask, TaskContext, TaskCore, TaskState};
pub use traits::{
    CollectingSink, FacadeLogSink, FlatPlateMesher, Geometry, LogSink, MeshProvider, PointSolution,
    PointSolver, PreparedSolver, SectionPolar, ThinAirfoilSection,
};
pub use viscous::{ViscousLoop, ViscousOutcome};
