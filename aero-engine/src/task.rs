//! Analysis tasks
//!
//! A task runs one (geometry, polar) pair through its operating points.
//! The two solver families are a closed enum over a shared core, so the
//! executor and the channel handling are written once. State moves
//! `Pending -> Running -> {Converged | Cancelled | Failed}` and terminal
//! states are final.

use crate::config::SolverConfig;
use crate::error::{EngineError, Result};
use crate::channel::ResultChannel;
use crate::llt::LiftingLine;
use crate::polar::{OperatingPoint, PolarSpec, SolverFamily};
use crate::result::ResultRecord;
use crate::traits::{Geometry, MeshProvider, PointSolver, SectionPolar};
use crate::viscous::ViscousLoop;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TaskState {
    /// Created, objects may still be attached
    #[default]
    Pending,
    /// The point loop is executing
    Running,
    /// Terminal: at least one point produced a record (or nothing was
    /// attempted)
    Converged,
    /// Terminal: the cooperative cancel flag was honored
    Cancelled,
    /// Terminal: every attempted point failed, or meshing failed
    Failed,
}

impl TaskState {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Converged | Self::Cancelled | Self::Failed)
    }
}

/// Boundary implementations a task runs against.
pub struct TaskContext<'a> {
    /// Surface mesher
    pub mesher: &'a dyn MeshProvider,
    /// Point solver for the panel family
    pub solver: &'a dyn PointSolver,
    /// Viscous closure
    pub section: &'a dyn SectionPolar,
}

/// State shared by both task kinds.
pub struct TaskCore {
    name: String,
    state: TaskState,
    config: SolverConfig,
    geometry: Option<Arc<Geometry>>,
    polar: Option<Arc<PolarSpec>>,
    channel: Arc<ResultChannel>,
    cancel: Arc<AtomicBool>,
    n_produced: usize,
    n_failed: usize,
}

impl TaskCore {
    fn new(name: String, config: SolverConfig) -> Self {
        let channel = Arc::new(ResultChannel::with_capacity(config.channel_capacity));
        Self {
            name,
            state: TaskState::Pending,
            config,
            geometry: None,
            polar: None,
            channel,
            cancel: Arc::new(AtomicBool::new(false)),
            n_produced: 0,
            n_failed: 0,
        }
    }
}

/// One analysis of one geometry against one polar.
pub enum AnalysisTask {
    /// Spanwise lifting-line analysis
    LiftingLine(TaskCore),
    /// Surface panel analysis
    Panel(TaskCore),
}

impl AnalysisTask {
    /// A lifting-line task.
    pub fn lifting_line(name: impl Into<String>, config: SolverConfig) -> Self {
        Self::LiftingLine(TaskCore::new(name.into(), config))
    }

    /// A panel task.
    pub fn panel(name: impl Into<String>, config: SolverConfig) -> Self {
        Self::Panel(TaskCore::new(name.into(), config))
    }

    /// A task of the kind matching the polar's solver family.
    pub fn for_polar(name: impl Into<String>, polar: &PolarSpec, config: SolverConfig) -> Self {
        match polar.family {
            SolverFamily::LiftingLine => Self::lifting_line(name, config),
            SolverFamily::VortexLattice | SolverFamily::LinearPanel => Self::panel(name, config),
        }
    }

    fn core(&self) -> &TaskCore {
        match self {
            Self::LiftingLine(core) | Self::Panel(core) => core,
        }
    }

    fn core_mut(&mut self) -> &mut TaskCore {
        match self {
            Self::LiftingLine(core) | Self::Panel(core) => core,
        }
    }

    /// Task display name.
    pub fn name(&self) -> &str {
        &self.core().name
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TaskState {
        self.core().state
    }

    /// The task's report channel; the consumer drains this while `run`
    /// executes on a worker thread.
    pub fn channel(&self) -> Arc<ResultChannel> {
        Arc::clone(&self.core().channel)
    }

    /// The cooperative cancel flag, shared with the executor.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.core().cancel)
    }

    /// Request cancellation; honored before the next operating point.
    pub fn request_cancel(&self) {
        self.core().cancel.store(true, Ordering::Relaxed);
    }

    /// Records produced during the run.
    pub fn n_produced(&self) -> usize {
        self.core().n_produced
    }

    /// Points that failed to solve during the run.
    pub fn n_failed(&self) -> usize {
        self.core().n_failed
    }

    /// Attach the geometry and polar. Only allowed while Pending.
    pub fn set_objects(&mut self, geometry: Arc<Geometry>, polar: Arc<PolarSpec>) -> Result<()> {
        let core = self.core_mut();
        if core.state != TaskState::Pending {
            return Err(EngineError::InvalidState { state: core.state });
        }
        core.geometry = Some(geometry);
        core.polar = Some(polar);
        Ok(())
    }

    /// Run the point loop to a terminal state.
    ///
    /// Mesh and solve failures are folded into the terminal state per the
    /// error taxonomy; `Err` here means the task was not runnable at all
    /// (wrong state or no objects attached). The channel is closed exactly
    /// once, when the terminal state is reached.
    pub fn run(&mut self, ctx: &TaskContext) -> Result<TaskState> {
        let is_llt = matches!(self, Self::LiftingLine(_));
        let core = self.core_mut();
        if core.state != TaskState::Pending {
            return Err(EngineError::InvalidState { state: core.state });
        }
        let (geometry, polar) = match (core.geometry.clone(), core.polar.clone()) {
            (Some(g), Some(p)) => (g, p),
            _ => {
                return Err(EngineError::config(format!(
                    "task '{}' has no geometry/polar attached",
                    core.name
                )))
            }
        };

        core.state = TaskState::Running;
        core.channel
            .push_message(format!("starting analysis '{}' on '{}'", core.name, geometry.name));

        let points = polar.operating_points();
        if points.is_empty() {
            log::info!("task '{}': no operating points, nothing to do", core.name);
            core.channel.push_message("no operating points resolved");
            core.state = TaskState::Converged;
            core.channel.close();
            return Ok(core.state);
        }

        let outcome = if is_llt {
            run_lifting_line(core, ctx, &geometry, &polar, &points)
        } else {
            run_panel(core, ctx, &geometry, &polar, &points)
        };

        core.state = match outcome {
            PointLoopOutcome::Cancelled => {
                core.channel
                    .push_message(format!("analysis '{}' cancelled", core.name));
                TaskState::Cancelled
            }
            PointLoopOutcome::TaskFailed(err) => {
                log::error!("task '{}' failed: {err}", core.name);
                core.channel.push_error(format!("analysis failed: {err}"));
                TaskState::Failed
            }
            PointLoopOutcome::Finished => {
                if core.n_produced == 0 {
                    core.channel.push_error(format!(
                        "analysis '{}' failed: no operating point could be solved",
                        core.name
                    ));
                    TaskState::Failed
                } else {
                    core.channel.push_message(format!(
                        "analysis '{}' finished: {} points solved, {} failed",
                        core.name, core.n_produced, core.n_failed
                    ));
                    TaskState::Converged
                }
            }
        };
        core.channel.close();
        Ok(core.state)
    }
}

enum PointLoopOutcome {
    Finished,
    Cancelled,
    TaskFailed(EngineError),
}

fn run_panel(
    core: &mut TaskCore,
    ctx: &TaskContext,
    geometry: &Geometry,
    polar: &PolarSpec,
    points: &[OperatingPoint],
) -> PointLoopOutcome {
    let mesh = match ctx.mesher.triangulate(geometry) {
        Ok(mesh) => mesh,
        Err(err) => return PointLoopOutcome::TaskFailed(err),
    };
    let prepared = match ctx.solver.assemble(&mesh) {
        Ok(prepared) => prepared,
        Err(err) => return PointLoopOutcome::TaskFailed(err),
    };
    let coupling = match ViscousLoop::from_config(&core.config) {
        Ok(coupling) => coupling,
        Err(err) => return PointLoopOutcome::TaskFailed(err),
    };

    for point in points {
        if core.cancel.load(Ordering::Relaxed) {
            return PointLoopOutcome::Cancelled;
        }

        let solution = match prepared.solve_point(point, &polar.fluid, &polar.reference) {
            Ok(solution) => solution,
            Err(err) => {
                log::warn!("task '{}': {err}", core.name);
                core.channel.push_warning(format!("skipping point: {err}"));
                core.n_failed += 1;
                continue;
            }
        };

        let mut cd = solution.cd;
        let mut converged = true;
        if polar.viscous {
            match viscous_strip_correction(ctx, point, &solution.strip_cl, &coupling) {
                Ok((cd_visc, loop_converged)) => {
                    cd += cd_visc;
                    converged = loop_converged;
                    if !loop_converged {
                        log::warn!(
                            "task '{}': viscous loop unconverged at alpha={:.3}",
                            core.name,
                            point.alpha
                        );
                        core.channel.push_warning(format!(
                            "viscous loop unconverged at alpha={:.3}",
                            point.alpha
                        ));
                    }
                }
                Err(err) => {
                    log::warn!("task '{}': {err}", core.name);
                    core.channel.push_warning(format!("skipping point: {err}"));
                    core.n_failed += 1;
                    continue;
                }
            }
        }
        if let Some(fit) = &polar.drag_fit {
            cd += fit.drag(solution.cl);
        }

        emit(core, point, solution.cl, cd, solution.force, solution.moment, solution.cp, converged);
    }
    PointLoopOutcome::Finished
}

fn run_lifting_line(
    core: &mut TaskCore,
    ctx: &TaskContext,
    _geometry: &Geometry,
    polar: &PolarSpec,
    points: &[OperatingPoint],
) -> PointLoopOutcome {
    let llt = LiftingLine::default();
    let coupling = match ViscousLoop::from_config(&core.config) {
        Ok(coupling) => coupling,
        Err(err) => return PointLoopOutcome::TaskFailed(err),
    };

    for point in points {
        if core.cancel.load(Ordering::Relaxed) {
            return PointLoopOutcome::Cancelled;
        }

        match llt.solve(
            &polar.reference,
            point,
            ctx.section,
            &polar.fluid,
            &coupling,
            polar.viscous,
        ) {
            Ok(sol) => {
                if !sol.converged {
                    log::warn!(
                        "task '{}': circulation loop unconverged at alpha={:.3}",
                        core.name,
                        point.alpha
                    );
                    core.channel.push_warning(format!(
                        "circulation loop unconverged at alpha={:.3}",
                        point.alpha
                    ));
                }
                let mut cd = sol.cd;
                if let Some(fit) = &polar.drag_fit {
                    cd += fit.drag(sol.cl);
                }
                emit(core, point, sol.cl, cd, sol.force, sol.moment, sol.strip_cl, sol.converged);
            }
            Err(err) => {
                log::warn!("task '{}': {err}", core.name);
                core.channel.push_warning(format!("skipping point: {err}"));
                core.n_failed += 1;
            }
        }
    }
    PointLoopOutcome::Finished
}

/// Converge a virtual spanwise twist so the section polar reproduces the
/// inviscid strip lift, and integrate the section drag at the twisted
/// incidence.
fn viscous_strip_correction(
    ctx: &TaskContext,
    point: &OperatingPoint,
    strip_cl: &[f64],
    coupling: &ViscousLoop,
) -> Result<(f64, bool)> {
    let slope = 2.0 * std::f64::consts::PI;
    let outcome = coupling.run(vec![0.0; strip_cl.len()], |twist| {
        let proposed = twist
            .iter()
            .zip(strip_cl)
            .map(|(t, target)| {
                let cl_here = ctx.section.lift_coefficient(point.alpha + t);
                t + (target - cl_here).to_degrees() / slope
            })
            .collect();
        Ok(proposed)
    })?;

    let n = strip_cl.len().max(1) as f64;
    let cd_visc = outcome
        .values
        .iter()
        .map(|t| ctx.section.drag_coefficient(point.alpha + t))
        .sum::<f64>()
        / n;
    Ok((cd_visc, outcome.converged))
}

#[allow(clippy::too_many_arguments)]
fn emit(
    core: &mut TaskCore,
    point: &OperatingPoint,
    cl: f64,
    cd: f64,
    force: aeroflow_geom::Vector3,
    moment: aeroflow_geom::Vector3,
    cp: Vec<f64>,
    converged: bool,
) {
    core.channel.push_message(format!(
        "alpha={:+.3} beta={:+.3} v={:.3}: cl={:.4} cd={:.5}{}",
        point.alpha,
        point.beta,
        point.v_inf,
        cl,
        cd,
        if converged { "" } else { " (unconverged)" }
    ));
    core.channel.push_record(ResultRecord {
        point: *point,
        force,
        moment,
        cl,
        cd,
        converged,
        cp,
    });
    core.n_produced += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Report;
    use crate::solver::DensePanelSolver;
    use crate::traits::{FlatPlateMesher, ThinAirfoilSection};
    use aeroflow_geom::FlatPlateParams;

    fn context(solver: &DensePanelSolver) -> TaskContext<'_> {
        TaskContext {
            mesher: &FlatPlateMesher,
            solver,
            section: &ThinAirfoilSection {
                cl_max: 1.2,
                cd0: 0.01,
                k: 0.02,
            },
        }
    }

    fn plate() -> Arc<Geometry> {
        Arc::new(Geometry::flat_plate("plate", FlatPlateParams::default()))
    }

    #[test]
    fn test_set_objects_only_while_pending() {
        let config = SolverConfig::default();
        let mut task = AnalysisTask::panel("t", config.clone());
        let polar = Arc::new(PolarSpec::fixed_speed("p", 10.0, vec![0.0]));
        task.set_objects(plate(), Arc::clone(&polar)).unwrap();

        let solver = DensePanelSolver::new(&config);
        task.run(&context(&solver)).unwrap();
        assert!(task.state().is_terminal());
        assert!(task.set_objects(plate(), polar).is_err());
    }

    #[test]
    fn test_run_requires_pending() {
        let config = SolverConfig::default();
        let mut task = AnalysisTask::panel("t", config.clone());
        let polar = Arc::new(PolarSpec::fixed_speed("p", 10.0, vec![0.0]));
        task.set_objects(plate(), polar).unwrap();
        let solver = DensePanelSolver::new(&config);
        let ctx = context(&solver);
        task.run(&ctx).unwrap();
        assert!(matches!(
            task.run(&ctx),
            Err(EngineError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_empty_points_is_converged_not_failed() {
        let config = SolverConfig::default();
        let mut task = AnalysisTask::panel("t", config.clone());
        let polar = Arc::new(PolarSpec::fixed_speed("p", 10.0, vec![]));
        task.set_objects(plate(), polar).unwrap();
        let solver = DensePanelSolver::new(&config);
        let state = task.run(&context(&solver)).unwrap();
        assert_eq!(state, TaskState::Converged);
        assert_eq!(task.n_produced(), 0);
    }

    #[test]
    fn test_cancel_before_run_yields_cancelled() {
        let config = SolverConfig::default();
        let mut task = AnalysisTask::panel("t", config.clone());
        let polar = Arc::new(PolarSpec::fixed_speed("p", 10.0, vec![-2.0, 0.0, 2.0]));
        task.set_objects(plate(), polar).unwrap();
        task.request_cancel();
        let solver = DensePanelSolver::new(&config);
        let state = task.run(&context(&solver)).unwrap();
        assert_eq!(state, TaskState::Cancelled);
        assert_eq!(task.n_produced(), 0);
    }

    #[test]
    fn test_records_flow_in_ascending_order() {
        let config = SolverConfig::default();
        let mut task = AnalysisTask::lifting_line("llt", config);
        let polar = Arc::new(PolarSpec {
            family: SolverFamily::LiftingLine,
            ..PolarSpec::fixed_speed("p", 10.0, vec![2.0, -2.0, 0.0])
        });
        task.set_objects(plate(), polar).unwrap();
        let solver = DensePanelSolver::new(&SolverConfig::default());
        let state = task.run(&context(&solver)).unwrap();
        assert_eq!(state, TaskState::Converged);

        let channel = task.channel();
        let mut alphas = Vec::new();
        while let Some(report) = channel.wait_and_pop() {
            if let Report::Record(record) = report {
                alphas.push(record.point.alpha);
            }
        }
        assert_eq!(alphas, vec![-2.0, 0.0, 2.0]);
    }

    #[test]
    fn test_records_survive_a_small_channel() {
        // nothing drains while the task runs; a tight bound must shed
        // messages, never records
        let config = SolverConfig {
            channel_capacity: 2,
            ..SolverConfig::default()
        };
        let mut task = AnalysisTask::lifting_line("llt", config);
        let polar = Arc::new(PolarSpec {
            family: SolverFamily::LiftingLine,
            ..PolarSpec::fixed_speed("p", 10.0, vec![-4.0, -2.0, 0.0, 2.0, 4.0])
        });
        task.set_objects(plate(), polar).unwrap();
        let solver = DensePanelSolver::new(&SolverConfig::default());
        let state = task.run(&context(&solver)).unwrap();
        assert_eq!(state, TaskState::Converged);
        assert_eq!(task.n_produced(), 5);

        let channel = task.channel();
        let mut n_records = 0;
        while let Some(report) = channel.wait_and_pop() {
            if matches!(report, Report::Record(_)) {
                n_records += 1;
            }
        }
        assert_eq!(n_records, 5);
        assert!(channel.dropped() > 0);
    }

    #[test]
    fn test_mesh_failure_fails_task() {
        let config = SolverConfig::default();
        let mut task = AnalysisTask::panel("bad", config.clone());
        let geom = Arc::new(Geometry::flat_plate(
            "null",
            FlatPlateParams {
                chord: 0.0,
                ..FlatPlateParams::default()
            },
        ));
        let polar = Arc::new(PolarSpec::fixed_speed("p", 10.0, vec![0.0]));
        task.set_objects(geom, polar).unwrap();
        let solver = DensePanelSolver::new(&config);
        let state = task.run(&context(&solver)).unwrap();
        assert_eq!(state, TaskState::Failed);
    }
}
