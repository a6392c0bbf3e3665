//! Bounded result channel
//!
//! One channel connects a running task (producer) to the batch executor
//! (consumer). Pushes never block the solver: at capacity the oldest
//! advisory message is shed and counted. Result records are authoritative
//! and are never dropped; under pressure the queue grows past the bound
//! rather than lose one. The consumer blocks on `wait_and_pop` until a
//! report arrives or the task closes the channel at its terminal state.

use crate::result::ResultRecord;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

/// Severity of an advisory progress message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    /// Routine progress
    #[default]
    Info,
    /// Recoverable degradation: skipped points, unconverged loops
    Warn,
    /// Task-terminal failure
    Error,
}

/// Advisory progress text from a running task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressMessage {
    /// Message severity
    pub severity: Severity,
    /// Human-readable progress line
    pub text: String,
}

/// One entry of the result channel.
#[derive(Debug, Clone)]
pub enum Report {
    /// Advisory progress text
    Message(ProgressMessage),
    /// A solved operating point
    Record(Box<ResultRecord>),
}

struct ChannelState {
    queue: VecDeque<Report>,
    closed: bool,
    dropped: u64,
}

/// Bounded FIFO of task reports.
pub struct ResultChannel {
    state: Mutex<ChannelState>,
    available: Condvar,
    capacity: usize,
}

impl ResultChannel {
    /// A channel holding at most `capacity` undelivered reports.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(ChannelState {
                queue: VecDeque::with_capacity(capacity.min(1024)),
                closed: false,
                dropped: 0,
            }),
            available: Condvar::new(),
            capacity: capacity.max(1),
        }
    }

    fn push(&self, report: Report) {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            // late pushes after the terminal state are discarded
            state.dropped += 1;
            return;
        }
        if state.queue.len() >= self.capacity {
            // the bound sheds advisory messages only; records always survive
            if let Some(idx) = state
                .queue
                .iter()
                .position(|r| matches!(r, Report::Message(_)))
            {
                state.queue.remove(idx);
                state.dropped += 1;
            } else if matches!(report, Report::Message(_)) {
                // queue full of records: the incoming advisory is the one shed
                state.dropped += 1;
                return;
            }
        }
        state.queue.push_back(report);
        drop(state);
        self.available.notify_one();
    }

    /// Queue an informational progress message; never blocks.
    pub fn push_message(&self, text: impl Into<String>) {
        self.push(Report::Message(ProgressMessage {
            severity: Severity::Info,
            text: text.into(),
        }));
    }

    /// Queue a warning message; never blocks.
    pub fn push_warning(&self, text: impl Into<String>) {
        self.push(Report::Message(ProgressMessage {
            severity: Severity::Warn,
            text: text.into(),
        }));
    }

    /// Queue an error message; never blocks.
    pub fn push_error(&self, text: impl Into<String>) {
        self.push(Report::Message(ProgressMessage {
            severity: Severity::Error,
            text: text.into(),
        }));
    }

    /// Queue a result record; never blocks and is never shed by the bound.
    pub fn push_record(&self, record: ResultRecord) {
        self.push(Report::Record(Box::new(record)));
    }

    /// Block until a report is available or the channel is closed.
    ///
    /// Returns `None` only when the channel is closed and drained.
    pub fn wait_and_pop(&self) -> Option<Report> {
        let mut state = self.state.lock().unwrap();
        loop {
            if let Some(report) = state.queue.pop_front() {
                return Some(report);
            }
            if state.closed {
                return None;
            }
            state = self.available.wait(state).unwrap();
        }
    }

    /// Mark the channel closed; called once when the task reaches a
    /// terminal state. Queued reports remain poppable.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        drop(state);
        self.available.notify_all();
    }

    /// Number of advisory messages shed by the capacity bound (plus any
    /// pushes after close).
    pub fn dropped(&self) -> u64 {
        self.state.lock().unwrap().dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_fifo_order() {
        let ch = ResultChannel::with_capacity(8);
        ch.push_message("one");
        ch.push_message("two");
        ch.close();

        match ch.wait_and_pop() {
            Some(Report::Message(m)) => assert_eq!(m.text, "one"),
            other => panic!("unexpected report: {other:?}"),
        }
        match ch.wait_and_pop() {
            Some(Report::Message(m)) => assert_eq!(m.text, "two"),
            other => panic!("unexpected report: {other:?}"),
        }
        assert!(ch.wait_and_pop().is_none());
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let ch = ResultChannel::with_capacity(2);
        ch.push_message("a");
        ch.push_message("b");
        ch.push_message("c");
        assert_eq!(ch.dropped(), 1);
        ch.close();

        match ch.wait_and_pop() {
            Some(Report::Message(m)) => assert_eq!(m.text, "b"),
            other => panic!("unexpected report: {other:?}"),
        }
    }

    #[test]
    fn test_records_survive_capacity_pressure() {
        use crate::polar::OperatingPoint;
        use aeroflow_geom::Vector3;

        let record = |alpha: f64| ResultRecord {
            point: OperatingPoint {
                alpha,
                beta: 0.0,
                v_inf: 10.0,
                ctrl: 0.0,
            },
            force: Vector3::ZERO,
            moment: Vector3::ZERO,
            cl: 0.0,
            cd: 0.0,
            converged: true,
            cp: Vec::new(),
        };

        // deferred drain: the producer outruns the bound by far
        let ch = ResultChannel::with_capacity(2);
        ch.push_message("starting");
        for i in 0..5 {
            ch.push_record(record(i as f64));
        }
        ch.close();

        let mut alphas = Vec::new();
        while let Some(report) = ch.wait_and_pop() {
            if let Report::Record(r) = report {
                alphas.push(r.point.alpha);
            }
        }
        assert_eq!(alphas, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        // only the advisory message was shed
        assert_eq!(ch.dropped(), 1);
    }

    #[test]
    fn test_message_severities() {
        let ch = ResultChannel::with_capacity(8);
        ch.push_message("fine");
        ch.push_warning("degraded");
        ch.push_error("broken");
        ch.close();

        let mut severities = Vec::new();
        while let Some(Report::Message(m)) = ch.wait_and_pop() {
            severities.push(m.severity);
        }
        assert_eq!(
            severities,
            vec![Severity::Info, Severity::Warn, Severity::Error]
        );
    }

    #[test]
    fn test_closed_empty_returns_none_immediately() {
        let ch = ResultChannel::with_capacity(4);
        ch.close();
        assert!(ch.wait_and_pop().is_none());
    }

    #[test]
    fn test_blocking_pop_wakes_on_push() {
        let ch = Arc::new(ResultChannel::with_capacity(4));
        let producer = Arc::clone(&ch);
        let handle = std::thread::spawn(move || {
            producer.push_message("late");
            producer.close();
        });

        match ch.wait_and_pop() {
            Some(Report::Message(m)) => assert_eq!(m.text, "late"),
            other => panic!("unexpected report: {other:?}"),
        }
        assert!(ch.wait_and_pop().is_none());
        handle.join().unwrap();
    }
}
