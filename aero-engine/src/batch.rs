//! Batch executor
//!
//! Pairs loaded geometries with polars, builds one task per pair and runs
//! the tasks strictly one after another. Each task executes on a scoped
//! worker thread while the executor drains its channel on the calling
//! thread, so progress messages reach the sink live and the solver never
//! blocks on a slow consumer.

use crate::channel::{Report, ResultChannel};
use crate::config::SolverConfig;
use crate::error::{EngineError, Result};
use crate::polar::{ParabolicDragFit, PolarSpec, SolverFamily, WakeModel};
use crate::result::ResultRecord;
use crate::task::{AnalysisTask, TaskContext, TaskState};
use crate::traits::{Geometry, LogSink};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Terminal report of one task.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    /// Task name, `<polar> / <geometry>`
    pub name: String,
    /// Terminal state
    pub state: TaskState,
    /// Records the task produced
    pub n_records: usize,
    /// Points that failed to solve
    pub n_failed: usize,
    /// Reports lost to the channel capacity bound
    pub n_dropped: u64,
}

/// Aggregated result of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// One outcome per executed task, in execution order
    pub outcomes: Vec<TaskOutcome>,
    /// Harvested records; empty unless the configuration keeps operating
    /// points
    pub records: Vec<ResultRecord>,
}

impl BatchSummary {
    /// True when every executed task converged.
    pub fn all_converged(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| o.state == TaskState::Converged)
    }
}

/// Closes the channel when dropped, normally or on unwind.
struct CloseOnUnwind<'a>(&'a ResultChannel);

impl Drop for CloseOnUnwind<'_> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Sequential executor over geometry/polar pairs.
pub struct BatchExecutor {
    config: SolverConfig,
    geometries: Vec<Arc<Geometry>>,
    polars: Vec<Arc<PolarSpec>>,
    tasks: Vec<AnalysisTask>,
    cancel: Arc<AtomicBool>,
}

impl BatchExecutor {
    /// An executor with a validated configuration.
    pub fn new(config: SolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            geometries: Vec::new(),
            polars: Vec::new(),
            tasks: Vec::new(),
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Register a geometry.
    pub fn add_geometry(&mut self, geometry: Geometry) {
        self.geometries.push(Arc::new(geometry));
    }

    /// Register a polar.
    pub fn add_polar(&mut self, polar: PolarSpec) {
        self.polars.push(Arc::new(polar));
    }

    /// Tasks built so far.
    pub fn tasks(&self) -> &[AnalysisTask] {
        &self.tasks
    }

    /// Request cancellation of the whole batch: no further task starts, and
    /// the running task stops before its next operating point.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
        for task in &self.tasks {
            task.request_cancel();
        }
    }

    /// Pair polars with geometries and build the task list.
    ///
    /// A polar targeting a geometry by name binds to that geometry only; an
    /// untargeted polar is duplicated across every loaded geometry with its
    /// reference dimensions taken from the geometry. Pairs whose sweep
    /// resolves to no operating points are skipped with a log line.
    pub fn build_tasks(&mut self) -> Result<()> {
        if !self.tasks.is_empty() {
            return Ok(());
        }
        for polar in &self.polars {
            if polar.family == SolverFamily::LiftingLine && !polar.polar_type.is_alpha_sweep() {
                return Err(EngineError::config(format!(
                    "polar '{}': the lifting-line family supports alpha sweeps only, got {:?}",
                    polar.name, polar.polar_type
                )));
            }
            if polar.family != SolverFamily::LiftingLine
                && polar.wake == WakeModel::VortexParticle
            {
                return Err(EngineError::config(format!(
                    "polar '{}': the vortex-particle wake is not supported; use the flat-panel wake",
                    polar.name
                )));
            }
            let bound: Vec<Arc<Geometry>> = match &polar.target_geometry {
                Some(target) => {
                    let geom = self
                        .geometries
                        .iter()
                        .find(|g| &g.name == target)
                        .ok_or_else(|| {
                            EngineError::config(format!(
                                "polar '{}' targets unknown geometry '{}'",
                                polar.name, target
                            ))
                        })?;
                    vec![Arc::clone(geom)]
                }
                None => self.geometries.iter().map(Arc::clone).collect(),
            };

            for geometry in bound {
                let points = polar.operating_points();
                if points.is_empty() {
                    log::info!(
                        "skipping '{}' on '{}': sweep resolves to no operating points",
                        polar.name,
                        geometry.name
                    );
                    continue;
                }
                if points.len() > self.config.max_nrhs {
                    return Err(EngineError::config(format!(
                        "polar '{}' resolves to {} points, above the {}-point limit",
                        polar.name,
                        points.len(),
                        self.config.max_nrhs
                    )));
                }
                if polar.drag_fit.is_some() && points.len() < ParabolicDragFit::MIN_POINTS {
                    return Err(EngineError::config(format!(
                        "polar '{}' carries a drag fit but only {} points; at least {} needed",
                        polar.name,
                        points.len(),
                        ParabolicDragFit::MIN_POINTS
                    )));
                }

                let mut spec = (**polar).clone();
                if polar.target_geometry.is_none() {
                    spec.reference = geometry.reference;
                }
                let name = format!("{} / {}", polar.name, geometry.name);
                let mut task = AnalysisTask::for_polar(name, &spec, self.config.clone());
                task.set_objects(Arc::clone(&geometry), Arc::new(spec))?;
                self.tasks.push(task);
            }
        }
        Ok(())
    }

    /// Run every task to its terminal state, in order.
    ///
    /// Messages are forwarded to the sink as they arrive; records are
    /// harvested into the summary when the configuration keeps operating
    /// points, except for tasks that ended cancelled. A task is fully
    /// drained before the next one starts.
    pub fn run_all(&mut self, ctx: &TaskContext, sink: &mut dyn LogSink) -> Result<BatchSummary> {
        if self.tasks.is_empty() {
            self.build_tasks()?;
        }
        let mut summary = BatchSummary::default();

        for task in &mut self.tasks {
            if self.cancel.load(Ordering::Relaxed) {
                log::info!("batch cancelled, remaining tasks not started");
                break;
            }
            let channel = task.channel();
            let mut task_records: Vec<ResultRecord> = Vec::new();

            let joined = std::thread::scope(|scope| {
                let worker_channel = Arc::clone(&channel);
                let task_ref = &mut *task;
                let worker = scope.spawn(move || {
                    // a panicking solver must still close the channel, or
                    // the drain loop below blocks forever
                    let _close = CloseOnUnwind(&worker_channel);
                    task_ref.run(ctx)
                });
                while let Some(report) = channel.wait_and_pop() {
                    match report {
                        Report::Message(message) => {
                            sink.on_message(message.severity, &message.text)
                        }
                        Report::Record(record) => task_records.push(*record),
                    }
                }
                worker.join()
            });
            let state = match joined {
                Ok(run_result) => run_result?,
                Err(_) => {
                    return Err(EngineError::Solve {
                        alpha: f64::NAN,
                        v_inf: f64::NAN,
                        reason: "analysis worker panicked".into(),
                    })
                }
            };

            let outcome = TaskOutcome {
                name: task.name().to_string(),
                state,
                n_records: task_records.len(),
                n_failed: task.n_failed(),
                n_dropped: channel.dropped(),
            };
            if self.config.keep_operating_points && state != TaskState::Cancelled {
                summary.records.append(&mut task_records);
            }
            summary.outcomes.push(outcome);
        }
        Ok(summary)
    }
}
