// Copyright 2026 the Skyframe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The overlay-hosting component.

use std::collections::BTreeMap;
use std::fmt;

use kurbo::Size;
use skyframe_core::clock::Clock;
use skyframe_core::dirty::DirtyRegionTracker;
use skyframe_core::host::RefreshSource;
use skyframe_core::monitor::{FrameStats, MonitorConfig, PerformanceMonitor};
use skyframe_core::scheduler::{FrameBudgetScheduler, FrameReport, RenderTask, SchedulerConfig};
use skyframe_core::time::{Duration, HostTime};
use skyframe_core::trace::Tracer;
use skyframe_surface::SurfaceProvider;

use crate::layers::OverlayLayer;
use crate::resources::RenderResources;

/// Configuration for an [`OverlayHost`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlayConfig {
    /// Scheduler budget and starvation policy.
    pub scheduler: SchedulerConfig,
    /// Performance sampling.
    pub monitor: MonitorConfig,
    /// Dirty rectangles tracked before collapsing to the full surface.
    pub dirty_capacity: usize,
}

impl OverlayConfig {
    /// The 144 Hz dashboard configuration.
    #[must_use]
    pub const fn hz_144() -> Self {
        Self {
            scheduler: SchedulerConfig::hz_144(),
            monitor: MonitorConfig::hz_144(),
            dirty_capacity: DirtyRegionTracker::DEFAULT_CAPACITY,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self::hz_144()
    }
}

/// A render task run by an [`OverlayHost`].
pub trait OverlayTask<P: SurfaceProvider>: RenderTask<RenderResources<P>> {}

impl<P: SurfaceProvider, T: RenderTask<RenderResources<P>>> OverlayTask<P> for T {}

/// Owns one overlay stack: the frame scheduler, the performance monitor and
/// the paint resources lent to tasks.
///
/// The host environment forwards every display refresh to
/// [`on_refresh`](Self::on_refresh). The scheduler and monitor each hold
/// their own subscription on the shared refresh source `H`, so `H` is
/// typically an `Rc<RefCell<_>>` handle.
pub struct OverlayHost<P: SurfaceProvider, H, K> {
    scheduler: FrameBudgetScheduler<RenderResources<P>, H, K>,
    monitor: PerformanceMonitor<H>,
    resources: RenderResources<P>,
}

impl<P, H, K> fmt::Debug for OverlayHost<P, H, K>
where
    P: SurfaceProvider + fmt::Debug,
    H: fmt::Debug,
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayHost")
            .field("scheduler", &self.scheduler)
            .field("monitor", &self.monitor)
            .field("resources", &self.resources)
            .finish()
    }
}

impl<P, H, K> OverlayHost<P, H, K>
where
    P: SurfaceProvider,
    H: RefreshSource + Clone,
    K: Clock,
{
    /// Creates a host with no tasks. Nothing subscribes to `host` until a
    /// task is scheduled or the monitor is started.
    pub fn new(host: H, clock: K, provider: P, config: OverlayConfig) -> Self {
        Self {
            scheduler: FrameBudgetScheduler::new(host.clone(), clock, config.scheduler),
            monitor: PerformanceMonitor::new(host, config.monitor),
            resources: RenderResources::new(provider, config.dirty_capacity),
        }
    }
}

impl<P, H, K> OverlayHost<P, H, K>
where
    P: SurfaceProvider,
    H: RefreshSource,
    K: Clock,
{
    /// Registers `task` under `id` at `priority`.
    pub fn schedule(
        &mut self,
        id: impl Into<String>,
        task: impl OverlayTask<P> + 'static,
        priority: i32,
    ) {
        self.scheduler.schedule(id, task, priority);
    }

    /// Registers `task` as the painter of `layer`, at the layer's priority.
    pub fn schedule_layer(&mut self, layer: OverlayLayer, task: impl OverlayTask<P> + 'static) {
        self.scheduler.schedule(layer.name(), task, layer.priority());
    }

    /// Removes the task under `id`. Returns `true` if one was removed.
    pub fn unschedule(&mut self, id: &str) -> bool {
        self.scheduler.unschedule(id)
    }

    /// Starts frame-rate sampling, routing each window's statistics to
    /// `on_sample`.
    pub fn start_monitor(&mut self, on_sample: impl FnMut(&FrameStats) + 'static) {
        self.monitor.start(on_sample);
    }

    /// Stops frame-rate sampling.
    pub fn stop_monitor(&mut self) {
        self.monitor.stop();
    }

    /// Stops both the scheduler and the monitor.
    pub fn stop(&mut self) {
        self.scheduler.stop();
        self.monitor.stop();
    }

    /// Runs one display refresh.
    pub fn on_refresh(&mut self, now: HostTime) -> Option<FrameReport> {
        self.on_refresh_traced(now, &mut Tracer::none())
    }

    /// Like [`on_refresh`](Self::on_refresh), reporting to `tracer`.
    ///
    /// The monitor counts the refresh first. If the surface is lost, one
    /// recovery attempt is made; a recovered surface starts blank, so the
    /// whole of it is marked dirty. The scheduler then runs the frame. The
    /// dirty set is cleared only when every task ran; while any task is
    /// skipped the regions stay pending (collapsing to the full surface at
    /// capacity) so the skipped task repaints them when it next runs.
    pub fn on_refresh_traced(
        &mut self,
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) -> Option<FrameReport> {
        self.monitor.on_refresh_traced(now, tracer);

        if self.scheduler.is_running() && self.resources.surface.is_lost() {
            self.recover_surface();
        }

        let report = self
            .scheduler
            .on_refresh_traced(now, &mut self.resources, tracer)?;
        if report.tasks_skipped == 0 {
            self.resources.dirty.clear();
        }
        Some(report)
    }

    fn recover_surface(&mut self) {
        match self.resources.surface.attempt_context_recovery() {
            Ok(()) => {
                let bounds = self.resources.surface.size().unwrap_or(Size::ZERO);
                self.resources.dirty.resize(bounds);
            }
            Err(err) => log::warn!("overlay surface still unavailable: {err}"),
        }
    }

    /// Returns the last measured cost of every task.
    #[must_use]
    pub fn budget_report(&self) -> BTreeMap<String, Duration> {
        self.scheduler.budget_report()
    }

    /// Returns the paint resources.
    #[must_use]
    pub fn resources(&self) -> &RenderResources<P> {
        &self.resources
    }

    /// Returns the paint resources for staging work between frames, such as
    /// marking regions dirty.
    pub fn resources_mut(&mut self) -> &mut RenderResources<P> {
        &mut self.resources
    }

    /// Informs the host that the surface changed size. Everything is dirty
    /// afterwards.
    pub fn resize(&mut self, size: Size) {
        self.resources.dirty.resize(size);
    }

    /// Returns the scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &FrameBudgetScheduler<RenderResources<P>, H, K> {
        &self.scheduler
    }

    /// Returns the monitor.
    #[must_use]
    pub fn monitor(&self) -> &PerformanceMonitor<H> {
        &self.monitor
    }
}
