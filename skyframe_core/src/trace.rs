// Copyright 2026 the Skyframe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing hooks for the frame loop.
//!
//! [`TraceSink`] has one method per event, each defaulting to a no-op, so a
//! sink implements only what it records. The scheduler and monitor emit
//! through a [`Tracer`], which wraps an optional `&mut dyn TraceSink`.
//!
//! Without the `trace` feature every [`Tracer`] method compiles to nothing.
//! With it, each method costs one `Option` branch before dispatch.

use crate::monitor::FrameStats;
use crate::scheduler::FrameReport;
use crate::time::{Duration, HostTime};

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when the scheduler starts a frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameBeginEvent {
    /// Monotonic frame counter.
    pub frame_index: u64,
    /// Host time of the refresh.
    pub now: HostTime,
    /// Time since the previous refresh (zero on the first frame).
    pub delta: Duration,
    /// The frame's total budget.
    pub budget: Duration,
}

/// Emitted after a task has run.
#[derive(Clone, Copy, Debug)]
pub struct TaskRunEvent<'a> {
    /// Frame counter.
    pub frame_index: u64,
    /// Task id.
    pub id: &'a str,
    /// Task priority.
    pub priority: i32,
    /// Host time the task started.
    pub started: HostTime,
    /// Measured cost.
    pub cost: Duration,
    /// `true` if the task ran past the budget check because it had been
    /// starved for too long.
    pub forced: bool,
}

/// Emitted when a task is skipped for lack of budget.
#[derive(Clone, Copy, Debug)]
pub struct TaskSkippedEvent<'a> {
    /// Frame counter.
    pub frame_index: u64,
    /// Task id.
    pub id: &'a str,
    /// Task priority.
    pub priority: i32,
    /// Budget already spent when the task was reached.
    pub budget_used: Duration,
    /// Consecutive frames this task has now been skipped.
    pub skipped_frames: u32,
}

/// Emitted when the scheduler finishes a frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameEndEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Total cost of the tasks that ran.
    pub budget_used: Duration,
    /// Number of tasks that ran.
    pub tasks_run: u32,
    /// Number of tasks that were skipped.
    pub tasks_skipped: u32,
}

impl From<&FrameReport> for FrameEndEvent {
    fn from(report: &FrameReport) -> Self {
        Self {
            frame_index: report.frame_index,
            budget_used: report.budget_used,
            tasks_run: report.tasks_run,
            tasks_skipped: report.tasks_skipped,
        }
    }
}

/// Emitted when the performance monitor closes a sampling window.
#[derive(Clone, Copy, Debug)]
pub struct MonitorSampleEvent {
    /// Host time the window closed.
    pub now: HostTime,
    /// Statistics for the window.
    pub stats: FrameStats,
}

/// Emitted when the performance monitor logs a run of over-budget frames.
#[derive(Clone, Copy, Debug)]
pub struct BudgetWarningEvent {
    /// Host time of the frame that completed the run.
    pub now: HostTime,
    /// Consecutive over-budget frames in the run.
    pub consecutive: u32,
    /// The interval of the last frame in the run.
    pub interval: Duration,
    /// The target frame interval.
    pub budget: Duration,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the frame loop.
///
/// All methods have default no-op implementations.
pub trait TraceSink {
    /// Called when a frame starts.
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        _ = e;
    }

    /// Called after a task runs.
    fn on_task_run(&mut self, e: &TaskRunEvent<'_>) {
        _ = e;
    }

    /// Called when a task is skipped.
    fn on_task_skipped(&mut self, e: &TaskSkippedEvent<'_>) {
        _ = e;
    }

    /// Called when a frame ends.
    fn on_frame_end(&mut self, e: &FrameEndEvent) {
        _ = e;
    }

    /// Called when the monitor emits statistics.
    fn on_monitor_sample(&mut self, e: &MonitorSampleEvent) {
        _ = e;
    }

    /// Called when the monitor warns about sustained slow frames.
    fn on_budget_warning(&mut self, e: &BudgetWarningEvent) {
        _ = e;
    }
}

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

macro_rules! dispatch {
    ($self:ident, $method:ident, $e:ident) => {{
        #[cfg(feature = "trace")]
        if let Some(s) = &mut $self.sink {
            s.$method($e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = $e;
        }
    }};
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to `sink`.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`FrameBeginEvent`].
    #[inline]
    pub fn frame_begin(&mut self, e: &FrameBeginEvent) {
        dispatch!(self, on_frame_begin, e);
    }

    /// Emits a [`TaskRunEvent`].
    #[inline]
    pub fn task_run(&mut self, e: &TaskRunEvent<'_>) {
        dispatch!(self, on_task_run, e);
    }

    /// Emits a [`TaskSkippedEvent`].
    #[inline]
    pub fn task_skipped(&mut self, e: &TaskSkippedEvent<'_>) {
        dispatch!(self, on_task_skipped, e);
    }

    /// Emits a [`FrameEndEvent`].
    #[inline]
    pub fn frame_end(&mut self, e: &FrameEndEvent) {
        dispatch!(self, on_frame_end, e);
    }

    /// Emits a [`MonitorSampleEvent`].
    #[inline]
    pub fn monitor_sample(&mut self, e: &MonitorSampleEvent) {
        dispatch!(self, on_monitor_sample, e);
    }

    /// Emits a [`BudgetWarningEvent`].
    #[inline]
    pub fn budget_warning(&mut self, e: &BudgetWarningEvent) {
        dispatch!(self, on_budget_warning, e);
    }
}
