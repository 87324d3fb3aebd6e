// Copyright 2026 the Skyframe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-refresh execution of prioritized render tasks under a frame budget.
//!
//! The [`FrameBudgetScheduler`] owns a registry of named [`RenderTask`]s.
//! On every host refresh it runs them in descending priority, measures each
//! one's cost with its injected [`Clock`], and stops starting new work once
//! the frame's [`FrameBudget`] is spent. Tasks are never preempted: an
//! overrun only costs the tasks after it.
//!
//! # Admission
//!
//! Before starting a task the scheduler predicts its cost: the task's last
//! measured cost, halved for every consecutive frame the task has been
//! skipped since, or for a task that has never run, the mean cost of the
//! tasks already run this frame. A task is skipped when the budget is
//! already exhausted or when the prediction would overrun it. The first
//! task of a frame always runs.
//!
//! The halving keeps one slow frame from shutting a task out: its estimate
//! shrinks until it fits the free budget, the task runs, and a fresh cost
//! replaces the old one.
//!
//! Skipped tasks keep their previous cost and are retried next frame. Under
//! [`StarvationPolicy::Strict`] a low-priority task can be skipped forever
//! while higher-priority work fills the budget. [`StarvationPolicy::Aging`]
//! bounds that: a task skipped for `max_skipped_frames` consecutive frames
//! runs first in the next frame, ahead of the budget check.
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut scheduler = FrameBudgetScheduler::new(host, clock, SchedulerConfig::hz_144());
//! scheduler.schedule("crosshair", draw_crosshair, 50);
//! // Host refresh callback:
//! let report = scheduler.on_refresh(now, &mut resources);
//! ```

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::budget::FrameBudget;
use crate::clock::Clock;
use crate::error::{RenderError, RenderErrorKind, RenderResult};
use crate::host::{RefreshLink, RefreshSource};
use crate::time::{Duration, HostTime};
use crate::trace::{FrameBeginEvent, FrameEndEvent, TaskRunEvent, TaskSkippedEvent, Tracer};

/// What a task sees of the frame it runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskSlice {
    /// Frame counter.
    pub frame_index: u64,
    /// Time since the previous refresh (zero on the first frame).
    pub delta: Duration,
    /// Budget left when the task started.
    pub remaining: Duration,
}

impl TaskSlice {
    /// Returns [`BudgetExceeded`](RenderErrorKind::BudgetExceeded) when the
    /// frame had no time left for this task, so long-running work can bail
    /// out early with `?`.
    pub fn ensure_budget(&self) -> RenderResult<()> {
        if self.remaining.is_zero() {
            return Err(RenderError::new(
                RenderErrorKind::BudgetExceeded,
                "ensure_budget",
                "no frame budget left",
            )
            .with_value("frame_index", self.frame_index as f64));
        }
        Ok(())
    }
}

/// One unit of render work, run at most once per frame.
///
/// Implemented for every `FnMut(&mut C, &TaskSlice)`.
pub trait RenderTask<C: ?Sized> {
    /// Paints this frame's contribution through `ctx`.
    fn run(&mut self, ctx: &mut C, slice: &TaskSlice);
}

impl<C: ?Sized, F: FnMut(&mut C, &TaskSlice)> RenderTask<C> for F {
    fn run(&mut self, ctx: &mut C, slice: &TaskSlice) {
        self(ctx, slice);
    }
}

/// How the scheduler treats tasks that keep getting skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum StarvationPolicy {
    /// Strict priority: a task runs only when the budget admits it.
    #[default]
    Strict,
    /// A task skipped for `max_skipped_frames` consecutive frames is run
    /// first in the next frame regardless of budget. Values below 1 are
    /// treated as 1.
    Aging {
        /// Consecutive skipped frames before a task is forced.
        max_skipped_frames: u32,
    },
}

/// Configuration for a [`FrameBudgetScheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Per-frame budget and its layer allocation table.
    pub budget: FrameBudget,
    /// Treatment of repeatedly skipped tasks.
    pub starvation: StarvationPolicy,
}

impl SchedulerConfig {
    /// The 144 Hz overlay configuration with strict priorities.
    #[must_use]
    pub const fn hz_144() -> Self {
        Self {
            budget: FrameBudget::overlay_144hz(),
            starvation: StarvationPolicy::Strict,
        }
    }

    /// A 60 Hz configuration with strict priorities and no layer table.
    #[must_use]
    pub const fn hz_60() -> Self {
        Self {
            budget: FrameBudget::for_target_fps(60),
            starvation: StarvationPolicy::Strict,
        }
    }

    /// Replaces the starvation policy.
    #[must_use]
    pub const fn with_starvation(mut self, starvation: StarvationPolicy) -> Self {
        self.starvation = starvation;
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::hz_144()
    }
}

/// Outcome of one refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame counter, starting at 1.
    pub frame_index: u64,
    /// Host time of the refresh.
    pub now: HostTime,
    /// Time since the previous refresh.
    pub delta: Duration,
    /// Total measured cost of the tasks that ran.
    pub budget_used: Duration,
    /// Number of tasks that ran.
    pub tasks_run: u32,
    /// Number of tasks that were skipped.
    pub tasks_skipped: u32,
}

struct ScheduledTask<C: ?Sized> {
    id: String,
    priority: i32,
    seq: u64,
    task: Box<dyn RenderTask<C>>,
    last_cost: Option<Duration>,
    skipped_frames: u32,
    forced: bool,
}

impl<C: ?Sized> fmt::Debug for ScheduledTask<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("seq", &self.seq)
            .field("last_cost", &self.last_cost)
            .field("skipped_frames", &self.skipped_frames)
            .field("forced", &self.forced)
            .finish_non_exhaustive()
    }
}

/// Runs registered render tasks once per host refresh within a frame
/// budget.
///
/// `C` is the context lent to every task, `H` the refresh host and `K` the
/// clock used to measure task cost.
pub struct FrameBudgetScheduler<C: ?Sized, H, K> {
    config: SchedulerConfig,
    link: RefreshLink<H>,
    clock: K,
    budget: FrameBudget,
    tasks: Vec<ScheduledTask<C>>,
    next_seq: u64,
    frame_index: u64,
    last_refresh: Option<HostTime>,
    last_report: Option<FrameReport>,
}

impl<C: ?Sized, H: fmt::Debug, K: fmt::Debug> fmt::Debug for FrameBudgetScheduler<C, H, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBudgetScheduler")
            .field("config", &self.config)
            .field("link", &self.link)
            .field("clock", &self.clock)
            .field("budget", &self.budget)
            .field("tasks", &self.tasks)
            .field("next_seq", &self.next_seq)
            .field("frame_index", &self.frame_index)
            .field("last_refresh", &self.last_refresh)
            .field("last_report", &self.last_report)
            .finish()
    }
}

impl<C: ?Sized, H: RefreshSource, K: Clock> FrameBudgetScheduler<C, H, K> {
    /// Creates a stopped scheduler with no tasks.
    pub fn new(host: H, clock: K, config: SchedulerConfig) -> Self {
        Self {
            link: RefreshLink::new(host),
            clock,
            budget: config.budget,
            tasks: Vec::new(),
            next_seq: 0,
            frame_index: 0,
            last_refresh: None,
            last_report: None,
            config,
        }
    }

    /// Registers `task` under `id`, or replaces the task already registered
    /// there, and starts the scheduler if it is stopped.
    ///
    /// A replaced task keeps its place among equal priorities but forgets
    /// its measured cost.
    pub fn schedule(
        &mut self,
        id: impl Into<String>,
        task: impl RenderTask<C> + 'static,
        priority: i32,
    ) {
        let id = id.into();
        if let Some(existing) = self.tasks.iter_mut().find(|t| t.id == id) {
            log::debug!("replacing render task {id:?} (priority {priority})");
            existing.task = Box::new(task);
            existing.priority = priority;
            existing.last_cost = None;
            existing.skipped_frames = 0;
        } else {
            log::debug!("scheduling render task {id:?} (priority {priority})");
            self.tasks.push(ScheduledTask {
                id,
                priority,
                seq: self.next_seq,
                task: Box::new(task),
                last_cost: None,
                skipped_frames: 0,
                forced: false,
            });
            self.next_seq += 1;
        }
        self.tasks
            .sort_by(|a, b| b.priority.cmp(&a.priority).then(a.seq.cmp(&b.seq)));
        self.start();
    }

    /// Removes the task registered under `id`. Stops the scheduler when the
    /// last task goes. Returns `true` if a task was removed.
    pub fn unschedule(&mut self, id: &str) -> bool {
        let Some(index) = self.tasks.iter().position(|t| t.id == id) else {
            return false;
        };
        self.tasks.remove(index);
        log::debug!("unscheduled render task {id:?}");
        if self.tasks.is_empty() {
            self.stop();
        }
        true
    }

    /// Subscribes to the host. Does nothing if already running.
    pub fn start(&mut self) {
        if self.link.start() {
            log::debug!("frame scheduler started with {} task(s)", self.tasks.len());
        }
    }

    /// Cancels the host subscription. Does nothing if already stopped.
    ///
    /// The next refresh after a restart reports a zero delta.
    pub fn stop(&mut self) {
        if self.link.stop() {
            log::debug!("frame scheduler stopped");
        }
        self.last_refresh = None;
    }

    /// Returns `true` while subscribed to the host.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.link.is_active()
    }

    /// Runs one frame. Returns `None` while stopped.
    pub fn on_refresh(&mut self, now: HostTime, ctx: &mut C) -> Option<FrameReport> {
        self.on_refresh_traced(now, ctx, &mut Tracer::none())
    }

    /// Like [`on_refresh`](Self::on_refresh), reporting to `tracer`.
    pub fn on_refresh_traced(
        &mut self,
        now: HostTime,
        ctx: &mut C,
        tracer: &mut Tracer<'_>,
    ) -> Option<FrameReport> {
        if !self.link.is_active() {
            return None;
        }
        let delta = self
            .last_refresh
            .map_or(Duration::ZERO, |prev| now.saturating_duration_since(prev));
        self.last_refresh = Some(now);
        self.frame_index += 1;
        self.budget.begin_frame();

        let frame_index = self.frame_index;
        tracer.frame_begin(&FrameBeginEvent {
            frame_index,
            now,
            delta,
            budget: self.budget.total(),
        });

        let threshold = match self.config.starvation {
            StarvationPolicy::Strict => None,
            StarvationPolicy::Aging { max_skipped_frames } => Some(max_skipped_frames.max(1)),
        };
        for task in &mut self.tasks {
            task.forced = threshold.is_some_and(|max| task.skipped_frames >= max);
        }

        let mut frame = FrameRun {
            clock: &self.clock,
            budget: &mut self.budget,
            frame_index,
            delta,
            tasks_run: 0,
            tasks_skipped: 0,
        };
        // Overdue tasks first, then the rest, each pass in priority order.
        for task in self.tasks.iter_mut().filter(|t| t.forced) {
            frame.run(task, ctx, tracer);
        }
        for task in self.tasks.iter_mut().filter(|t| !t.forced) {
            if frame.admits(task) {
                frame.run(task, ctx, tracer);
            } else {
                frame.skip(task, tracer);
            }
        }

        let report = FrameReport {
            frame_index,
            now,
            delta,
            budget_used: frame.budget.consumed(),
            tasks_run: frame.tasks_run,
            tasks_skipped: frame.tasks_skipped,
        };
        tracer.frame_end(&FrameEndEvent::from(&report));
        self.last_report = Some(report);
        Some(report)
    }

    /// Returns the last measured cost of every task that has run.
    #[must_use]
    pub fn budget_report(&self) -> BTreeMap<String, Duration> {
        self.tasks
            .iter()
            .filter_map(|t| t.last_cost.map(|cost| (t.id.clone(), cost)))
            .collect()
    }

    /// Returns the last measured cost of the task under `id`.
    #[must_use]
    pub fn last_cost(&self, id: &str) -> Option<Duration> {
        self.find(id).and_then(|t| t.last_cost)
    }

    /// Returns how many consecutive frames the task under `id` has been
    /// skipped.
    #[must_use]
    pub fn skipped_frames(&self, id: &str) -> Option<u32> {
        self.find(id).map(|t| t.skipped_frames)
    }

    /// Returns the registered task ids in execution order.
    pub fn task_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.tasks.iter().map(|t| t.id.as_str())
    }

    /// Returns the number of registered tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` if no task is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Returns the outcome of the most recent frame.
    #[must_use]
    pub fn last_report(&self) -> Option<FrameReport> {
        self.last_report
    }

    /// Returns the frame budget as of the most recent frame.
    #[must_use]
    pub fn frame_budget(&self) -> &FrameBudget {
        &self.budget
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Returns the host link.
    #[must_use]
    pub fn link(&self) -> &RefreshLink<H> {
        &self.link
    }

    fn find(&self, id: &str) -> Option<&ScheduledTask<C>> {
        self.tasks.iter().find(|t| t.id == id)
    }
}

/// `cost` halved once per skipped frame.
fn decayed(cost: Duration, skipped_frames: u32) -> Duration {
    Duration(cost.nanos().checked_shr(skipped_frames).unwrap_or(0))
}

/// Bookkeeping for the frame currently executing.
struct FrameRun<'a, K> {
    clock: &'a K,
    budget: &'a mut FrameBudget,
    frame_index: u64,
    delta: Duration,
    tasks_run: u32,
    tasks_skipped: u32,
}

impl<K: Clock> FrameRun<'_, K> {
    fn admits<C: ?Sized>(&self, task: &ScheduledTask<C>) -> bool {
        if self.budget.is_exhausted() {
            return false;
        }
        let used = self.budget.consumed();
        if used.is_zero() {
            return true;
        }
        let estimate = task
            .last_cost
            .map_or_else(|| self.mean_cost(), |cost| decayed(cost, task.skipped_frames));
        used.saturating_add(estimate) <= self.budget.total()
    }

    fn mean_cost(&self) -> Duration {
        if self.tasks_run == 0 {
            return Duration::ZERO;
        }
        Duration(self.budget.consumed().nanos() / u64::from(self.tasks_run))
    }

    fn run<C: ?Sized>(&mut self, task: &mut ScheduledTask<C>, ctx: &mut C, tracer: &mut Tracer<'_>) {
        let slice = TaskSlice {
            frame_index: self.frame_index,
            delta: self.delta,
            remaining: self.budget.remaining(),
        };
        let started = self.clock.now();
        task.task.run(ctx, &slice);
        let cost = self.clock.now().saturating_duration_since(started);

        if task.forced {
            log::debug!(
                "render task {:?} forced after {} skipped frame(s)",
                task.id,
                task.skipped_frames
            );
        }
        task.last_cost = Some(cost);
        task.skipped_frames = 0;
        self.budget.consume(cost);
        self.tasks_run += 1;
        tracer.task_run(&TaskRunEvent {
            frame_index: self.frame_index,
            id: &task.id,
            priority: task.priority,
            started,
            cost,
            forced: task.forced,
        });
    }

    fn skip<C: ?Sized>(&mut self, task: &mut ScheduledTask<C>, tracer: &mut Tracer<'_>) {
        task.skipped_frames = task.skipped_frames.saturating_add(1);
        self.tasks_skipped += 1;
        log::trace!(
            "render task {:?} skipped ({} consecutive frame(s))",
            task.id,
            task.skipped_frames
        );
        tracer.task_skipped(&TaskSkippedEvent {
            frame_index: self.frame_index,
            id: &task.id,
            priority: task.priority,
            budget_used: self.budget.consumed(),
            skipped_frames: task.skipped_frames,
        });
    }
}
