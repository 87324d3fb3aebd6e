// Copyright 2026 the Skyframe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-rate sampling with bounded history.
//!
//! [`PerformanceMonitor`] counts refreshes and, once per sampling window
//! (one second by default), converts the count into a frames-per-second
//! figure. Samples go into a [`BoundedCircularBuffer`] sized to the target
//! rate, so memory stays flat no matter how long the dashboard runs.
//!
//! Individual frames slower than the target interval are counted as budget
//! violations. Every [`MonitorConfig::warn_every`] consecutive violations
//! produce one `warn!` log record and one
//! [`BudgetWarningEvent`](crate::trace::BudgetWarningEvent); a frame back
//! within budget resets the count.

use alloc::boxed::Box;
use core::fmt;

use crate::buffer::BoundedCircularBuffer;
use crate::host::{RefreshLink, RefreshSource};
use crate::time::{Duration, HostTime};
use crate::trace::{BudgetWarningEvent, MonitorSampleEvent, Tracer};

/// Sampling parameters for a [`PerformanceMonitor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Refresh rate the dashboard aims for. Also the history length.
    pub target_fps: u32,
    /// Span over which frames are counted before a sample is emitted.
    pub window: Duration,
    /// Consecutive over-budget frames per warning.
    pub warn_every: u32,
}

impl MonitorConfig {
    /// Default sampling for `fps`: one-second windows, one warning per ten
    /// consecutive slow frames.
    ///
    /// # Panics
    ///
    /// Panics if `fps` is zero.
    #[must_use]
    pub const fn for_target_fps(fps: u32) -> Self {
        assert!(fps > 0, "target fps must not be zero");
        Self {
            target_fps: fps,
            window: Duration::SECOND,
            warn_every: 10,
        }
    }

    /// Sampling for the 144 Hz overlay target.
    #[must_use]
    pub const fn hz_144() -> Self {
        Self::for_target_fps(144)
    }

    /// Returns one refresh interval at the target rate.
    #[must_use]
    pub const fn frame_budget(&self) -> Duration {
        Duration(Duration::SECOND.0 / self.target_fps as u64)
    }
}

/// Statistics emitted at the close of each sampling window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameStats {
    /// Frames per second over the window just closed.
    pub fps: f64,
    /// Mean frame time over the window, in milliseconds.
    pub frame_time_ms: f64,
    /// Mean of the FPS history.
    pub average_fps: f64,
    /// Lowest FPS in the history.
    pub min_fps: f64,
    /// Highest FPS in the history.
    pub max_fps: f64,
}

type SampleCallback = Box<dyn FnMut(&FrameStats)>;

/// Samples the refresh rate of the host it is started on.
pub struct PerformanceMonitor<H> {
    config: MonitorConfig,
    link: RefreshLink<H>,
    on_sample: Option<SampleCallback>,
    history: BoundedCircularBuffer<f64>,
    latest: Option<FrameStats>,
    window_start: Option<HostTime>,
    last_frame: Option<HostTime>,
    frames: u32,
    violations: u32,
    warnings: u32,
}

impl<H: fmt::Debug> fmt::Debug for PerformanceMonitor<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerformanceMonitor")
            .field("config", &self.config)
            .field("link", &self.link)
            .field("history", &self.history)
            .field("latest", &self.latest)
            .field("frames", &self.frames)
            .field("violations", &self.violations)
            .field("warnings", &self.warnings)
            .finish_non_exhaustive()
    }
}

impl<H: RefreshSource> PerformanceMonitor<H> {
    /// Creates a stopped monitor bound to `host`.
    pub fn new(host: H, config: MonitorConfig) -> Self {
        Self {
            link: RefreshLink::new(host),
            on_sample: None,
            history: BoundedCircularBuffer::new(config.target_fps as usize),
            latest: None,
            window_start: None,
            last_frame: None,
            frames: 0,
            violations: 0,
            warnings: 0,
            config,
        }
    }

    /// Starts sampling and routes each window's statistics to `on_sample`.
    ///
    /// Starting a running monitor only replaces the callback; the host
    /// still sees a single subscription.
    pub fn start(&mut self, on_sample: impl FnMut(&FrameStats) + 'static) {
        self.on_sample = Some(Box::new(on_sample));
        if self.link.start() {
            log::debug!(
                "performance monitor started at {} fps target",
                self.config.target_fps
            );
        }
    }

    /// Stops sampling and resets the frame counters. The FPS history is
    /// kept. Stopping a stopped monitor does nothing.
    pub fn stop(&mut self) {
        if self.link.stop() {
            log::debug!("performance monitor stopped");
        }
        self.on_sample = None;
        self.window_start = None;
        self.last_frame = None;
        self.frames = 0;
        self.violations = 0;
    }

    /// Returns `true` while subscribed to the host.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.link.is_active()
    }

    /// Counts one refresh. Returns the statistics if this refresh closed a
    /// sampling window.
    ///
    /// Ignored while stopped.
    pub fn on_refresh(&mut self, now: HostTime) -> Option<FrameStats> {
        self.on_refresh_traced(now, &mut Tracer::none())
    }

    /// Like [`on_refresh`](Self::on_refresh), reporting samples to `tracer`.
    pub fn on_refresh_traced(&mut self, now: HostTime, tracer: &mut Tracer<'_>) -> Option<FrameStats> {
        if !self.link.is_active() {
            return None;
        }
        let Some(window_start) = self.window_start else {
            // First refresh opens the window; there is no interval yet.
            self.window_start = Some(now);
            self.last_frame = Some(now);
            return None;
        };

        if let Some(last) = self.last_frame {
            self.track_budget(now, now.saturating_duration_since(last), tracer);
        }
        self.last_frame = Some(now);
        self.frames += 1;

        let elapsed = now.saturating_duration_since(window_start);
        if elapsed < self.config.window {
            return None;
        }

        let elapsed_ms = elapsed.as_millis_f64();
        let fps = f64::from(self.frames) * 1000.0 / elapsed_ms;
        let frame_time_ms = elapsed_ms / f64::from(self.frames);
        self.history.push(fps);
        self.frames = 0;
        self.window_start = Some(now);

        let (min_fps, max_fps) = self
            .history
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| {
                (lo.min(s), hi.max(s))
            });
        let stats = FrameStats {
            fps,
            frame_time_ms,
            average_fps: self.average_fps(),
            min_fps,
            max_fps,
        };
        self.latest = Some(stats);
        tracer.monitor_sample(&MonitorSampleEvent { now, stats });
        if let Some(on_sample) = &mut self.on_sample {
            on_sample(&stats);
        }
        Some(stats)
    }

    fn track_budget(&mut self, now: HostTime, interval: Duration, tracer: &mut Tracer<'_>) {
        let budget = self.config.frame_budget();
        if interval <= budget {
            self.violations = 0;
            return;
        }
        self.violations += 1;
        if self.violations >= self.config.warn_every {
            log::warn!(
                "{} consecutive frames over the {:.2} ms budget (last {:.2} ms)",
                self.violations,
                budget.as_millis_f64(),
                interval.as_millis_f64(),
            );
            tracer.budget_warning(&BudgetWarningEvent {
                now,
                consecutive: self.violations,
                interval,
                budget,
            });
            self.warnings = self.warnings.saturating_add(1);
            self.violations = 0;
        }
    }

    /// Returns `true` if the recorded history sustains `target_fps`: the
    /// mean is at least 95% of it and at least 90% of samples reach 90% of
    /// it. An empty history is not optimal.
    #[must_use]
    pub fn is_optimal(&self, target_fps: f64) -> bool {
        if self.history.is_empty() {
            return false;
        }
        let floor = target_fps * 0.9;
        let good = self.history.iter().filter(|&&s| s >= floor).count();
        let share = good as f64 / self.history.len() as f64;
        self.average_fps() >= target_fps * 0.95 && share >= 0.9
    }

    /// Returns the statistics from the most recent window.
    #[must_use]
    pub fn latest(&self) -> Option<FrameStats> {
        self.latest
    }

    /// Returns the FPS history, oldest first.
    #[must_use]
    pub fn history(&self) -> &BoundedCircularBuffer<f64> {
        &self.history
    }

    /// Returns the current run of over-budget frames.
    #[must_use]
    pub fn consecutive_violations(&self) -> u32 {
        self.violations
    }

    /// Returns how many sustained-slowness warnings have been issued since
    /// the monitor was created.
    #[must_use]
    pub fn budget_warnings(&self) -> u32 {
        self.warnings
    }

    /// Returns the sampling parameters.
    #[must_use]
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Returns the host link.
    #[must_use]
    pub fn link(&self) -> &RefreshLink<H> {
        &self.link
    }

    fn average_fps(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        self.history.iter().sum::<f64>() / self.history.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use super::*;
    use crate::host::ManualRefresh;

    const TICK_144: Duration = Duration(6_944_444);

    fn monitor() -> PerformanceMonitor<ManualRefresh> {
        PerformanceMonitor::new(ManualRefresh::new(), MonitorConfig::hz_144())
    }

    /// Drives `frames` refreshes spaced `step` apart, starting after `t`.
    fn drive(
        m: &mut PerformanceMonitor<ManualRefresh>,
        t: &mut HostTime,
        step: Duration,
        frames: u32,
    ) -> Vec<FrameStats> {
        let mut out = Vec::new();
        for _ in 0..frames {
            *t = *t + step;
            out.extend(m.on_refresh(*t));
        }
        out
    }

    #[test]
    fn double_start_installs_one_subscription() {
        let mut m = monitor();
        m.start(|_| {});
        m.start(|_| {});
        assert_eq!(m.link().host().active_count(), 1);
        assert_eq!(m.link().host().subscribe_calls(), 1);

        m.stop();
        m.stop();
        assert_eq!(m.link().host().active_count(), 0);
        assert_eq!(m.link().host().unsubscribe_calls(), 1);
        assert!(!m.is_running());
    }

    #[test]
    fn steady_144hz_emits_once_per_second() {
        let samples = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&samples);
        let mut m = monitor();
        m.start(move |s| sink.borrow_mut().push(*s));

        let mut t = HostTime(0);
        assert_eq!(m.on_refresh(t), None, "first refresh only opens the window");
        let emitted = drive(&mut m, &mut t, TICK_144, 145);
        assert_eq!(emitted.len(), 1);
        assert_eq!(samples.borrow().len(), 1);

        let stats = emitted[0];
        assert!(stats.fps > 143.9 && stats.fps < 144.1, "got {}", stats.fps);
        assert!(stats.frame_time_ms > 6.9 && stats.frame_time_ms < 7.0);
        assert_eq!(m.latest(), Some(stats));
        assert_eq!(m.consecutive_violations(), 0);
    }

    #[test]
    fn stats_cover_the_whole_history() {
        let mut m = monitor();
        m.start(|_| {});
        let mut t = HostTime(0);
        m.on_refresh(t);
        // One window at 100 fps, one at 50 fps.
        drive(&mut m, &mut t, Duration::from_millis(10), 100);
        let stats = drive(&mut m, &mut t, Duration::from_millis(20), 50);
        assert_eq!(stats.len(), 1);
        let s = stats[0];
        assert!(s.min_fps > 49.9 && s.min_fps < 50.1);
        assert!(s.max_fps > 99.9 && s.max_fps < 100.1);
        assert!(s.average_fps > 74.9 && s.average_fps < 75.1);
        assert_eq!(m.history().len(), 2);
    }

    #[test]
    fn history_is_bounded_by_target_fps() {
        let mut m = PerformanceMonitor::new(ManualRefresh::new(), MonitorConfig::for_target_fps(2));
        m.start(|_| {});
        let mut t = HostTime(0);
        m.on_refresh(t);
        drive(&mut m, &mut t, Duration::from_millis(500), 20);
        assert_eq!(m.history().len(), 2);
        assert_eq!(m.history().capacity(), 2);
    }

    #[test]
    fn optimal_requires_history() {
        let m = monitor();
        assert!(!m.is_optimal(144.0));
    }

    #[test]
    fn optimal_at_target_rate() {
        let mut m = monitor();
        m.start(|_| {});
        let mut t = HostTime(0);
        m.on_refresh(t);
        drive(&mut m, &mut t, TICK_144, 145 * 3);
        assert!(m.is_optimal(144.0));
        assert!(!m.is_optimal(240.0));
    }

    #[test]
    fn slow_frames_warn_every_tenth_violation() {
        let mut m = monitor();
        m.start(|_| {});
        let mut t = HostTime(0);
        m.on_refresh(t);

        drive(&mut m, &mut t, Duration::from_millis(10), 9);
        assert_eq!(m.consecutive_violations(), 9);
        assert_eq!(m.budget_warnings(), 0, "nine slow frames stay quiet");
        drive(&mut m, &mut t, Duration::from_millis(10), 1);
        assert_eq!(m.consecutive_violations(), 0, "counter resets after warning");
        assert_eq!(m.budget_warnings(), 1);

        drive(&mut m, &mut t, Duration::from_millis(10), 9);
        drive(&mut m, &mut t, TICK_144, 1);
        assert_eq!(m.consecutive_violations(), 0, "in-budget frame resets the run");
        drive(&mut m, &mut t, Duration::from_millis(10), 9);
        assert_eq!(m.budget_warnings(), 1, "the broken run never completed");

        drive(&mut m, &mut t, Duration::from_millis(10), 1);
        assert_eq!(m.budget_warnings(), 2, "tenth consecutive slow frame warns");
    }

    #[cfg(feature = "trace")]
    #[test]
    fn warnings_reach_the_trace_sink() {
        use crate::trace::TraceSink;

        #[derive(Default)]
        struct Warnings(Vec<BudgetWarningEvent>);
        impl TraceSink for Warnings {
            fn on_budget_warning(&mut self, e: &BudgetWarningEvent) {
                self.0.push(*e);
            }
        }

        let mut m = monitor();
        m.start(|_| {});
        let mut sink = Warnings::default();
        let mut t = HostTime(0);
        let slow = Duration::from_millis(10);
        {
            let mut tracer = Tracer::new(&mut sink);
            m.on_refresh_traced(t, &mut tracer);
            for _ in 0..29 {
                t = t + slow;
                m.on_refresh_traced(t, &mut tracer);
            }
        }
        assert_eq!(sink.0.len(), 2, "one warning per ten slow frames");
        let first = sink.0[0];
        assert_eq!(first.consecutive, 10);
        assert_eq!(first.interval, slow);
        assert_eq!(first.budget, MonitorConfig::hz_144().frame_budget());
        assert_eq!(first.now, HostTime(0) + Duration::from_millis(100));
    }

    #[test]
    fn stop_resets_counters_but_keeps_history() {
        let mut m = monitor();
        m.start(|_| {});
        let mut t = HostTime(0);
        m.on_refresh(t);
        drive(&mut m, &mut t, Duration::from_millis(10), 105);
        assert_eq!(m.history().len(), 1);
        assert_eq!(m.consecutive_violations(), 5);

        m.stop();
        assert_eq!(m.consecutive_violations(), 0);
        assert_eq!(m.history().len(), 1);
        assert!(drive(&mut m, &mut t, Duration::from_millis(10), 200).is_empty());
    }

    #[test]
    fn restart_opens_a_fresh_window() {
        let mut m = monitor();
        m.start(|_| {});
        let mut t = HostTime(0);
        m.on_refresh(t);
        drive(&mut m, &mut t, TICK_144, 100);
        m.stop();

        m.start(|_| {});
        t = t + Duration::SECOND;
        assert_eq!(m.on_refresh(t), None);
        assert!(drive(&mut m, &mut t, TICK_144, 100).is_empty());
    }
}
