// Copyright 2026 the Skyframe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Times are
//! printed in milliseconds.

use std::io::Write;

use skyframe_core::trace::{
    BudgetWarningEvent, FrameBeginEvent, FrameEndEvent, MonitorSampleEvent, TaskRunEvent,
    TaskSkippedEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink, returning its writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[frame:begin] frame={} now={:.3}ms delta={:.3}ms budget={:.3}ms",
            e.frame_index,
            e.now.as_millis_f64(),
            e.delta.as_millis_f64(),
            e.budget.as_millis_f64(),
        );
    }

    fn on_task_run(&mut self, e: &TaskRunEvent<'_>) {
        let forced = if e.forced { " FORCED" } else { "" };
        let _ = writeln!(
            self.writer,
            "[task] frame={} {} prio={} cost={:.3}ms{forced}",
            e.frame_index,
            e.id,
            e.priority,
            e.cost.as_millis_f64(),
        );
    }

    fn on_task_skipped(&mut self, e: &TaskSkippedEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[skip] frame={} {} prio={} used={:.3}ms streak={}",
            e.frame_index,
            e.id,
            e.priority,
            e.budget_used.as_millis_f64(),
            e.skipped_frames,
        );
    }

    fn on_frame_end(&mut self, e: &FrameEndEvent) {
        let _ = writeln!(
            self.writer,
            "[frame:end] frame={} used={:.3}ms run={} skipped={}",
            e.frame_index,
            e.budget_used.as_millis_f64(),
            e.tasks_run,
            e.tasks_skipped,
        );
    }

    fn on_monitor_sample(&mut self, e: &MonitorSampleEvent) {
        let s = &e.stats;
        let _ = writeln!(
            self.writer,
            "[fps] {:.1} (avg {:.1} min {:.1} max {:.1}) frame={:.3}ms",
            s.fps, s.average_fps, s.min_fps, s.max_fps, s.frame_time_ms,
        );
    }

    fn on_budget_warning(&mut self, e: &BudgetWarningEvent) {
        let _ = writeln!(
            self.writer,
            "[slow] {} frames over {:.3}ms (last {:.3}ms)",
            e.consecutive,
            e.budget.as_millis_f64(),
            e.interval.as_millis_f64(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyframe_core::time::{Duration, HostTime};

    #[test]
    fn pretty_print_task_lines() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_task_run(&TaskRunEvent {
            frame_index: 4,
            id: "adsb",
            priority: 40,
            started: HostTime(0),
            cost: Duration::from_micros(1_250),
            forced: true,
        });
        sink.on_task_skipped(&TaskSkippedEvent {
            frame_index: 4,
            id: "weather",
            priority: 20,
            budget_used: Duration::from_millis(7),
            skipped_frames: 3,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("[task] frame=4 adsb prio=40 cost=1.250ms FORCED"), "got: {output}");
        assert!(output.contains("[skip] frame=4 weather"), "got: {output}");
        assert!(output.contains("streak=3"), "got: {output}");
    }

    #[test]
    fn pretty_print_budget_warning() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_budget_warning(&BudgetWarningEvent {
            now: HostTime(0),
            consecutive: 10,
            interval: Duration::from_millis(10),
            budget: Duration::from_micros(6_944),
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(output, "[slow] 10 frames over 6.944ms (last 10.000ms)\n");
    }
}
