// Copyright 2026 the Skyframe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`ChromeTraceSink`] collects frame-loop events as they happen and
//! [`write_to`](ChromeTraceSink::write_to) emits them as
//! [Chrome Trace Event Format][trace-format] JSON, suitable for `chrome://tracing`
//! or [Perfetto](https://ui.perfetto.dev/).
//!
//! Frames and task runs become complete (`"X"`) slices, skipped tasks
//! become instant events, and monitor samples become an `fps` counter.
//!
//! [trace-format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use skyframe_core::time::{Duration, HostTime};
use skyframe_core::trace::{
    BudgetWarningEvent, FrameBeginEvent, FrameEndEvent, MonitorSampleEvent, TaskRunEvent,
    TaskSkippedEvent, TraceSink,
};

/// Collects trace events for export as Chrome Trace Event Format JSON.
#[derive(Debug, Default)]
pub struct ChromeTraceSink {
    events: Vec<Value>,
    frame_start: Option<HostTime>,
}

impl ChromeTraceSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collected events.
    #[must_use]
    pub fn events(&self) -> &[Value] {
        &self.events
    }

    /// Writes the collected events as a JSON array.
    pub fn write_to(&self, writer: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(writer, &self.events)?;
        Ok(())
    }
}

fn us(t: HostTime) -> f64 {
    t.nanos() as f64 / 1000.0
}

fn dur_us(d: Duration) -> f64 {
    d.nanos() as f64 / 1000.0
}

impl TraceSink for ChromeTraceSink {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.frame_start = Some(e.now);
    }

    fn on_task_run(&mut self, e: &TaskRunEvent<'_>) {
        self.events.push(json!({
            "ph": "X",
            "name": e.id,
            "cat": "Task",
            "ts": us(e.started),
            "dur": dur_us(e.cost),
            "pid": 0,
            "tid": 1,
            "args": {
                "frame_index": e.frame_index,
                "priority": e.priority,
                "forced": e.forced,
            }
        }));
    }

    fn on_task_skipped(&mut self, e: &TaskSkippedEvent<'_>) {
        let ts = self
            .frame_start
            .map_or(0.0, |start| us(start) + dur_us(e.budget_used));
        self.events.push(json!({
            "ph": "i",
            "name": format!("skip {}", e.id),
            "cat": "Task",
            "ts": ts,
            "pid": 0,
            "tid": 1,
            "s": "t",
            "args": {
                "frame_index": e.frame_index,
                "priority": e.priority,
                "skipped_frames": e.skipped_frames,
            }
        }));
    }

    fn on_frame_end(&mut self, e: &FrameEndEvent) {
        let Some(start) = self.frame_start.take() else {
            return;
        };
        self.events.push(json!({
            "ph": "X",
            "name": "Frame",
            "cat": "Frame",
            "ts": us(start),
            "dur": dur_us(e.budget_used),
            "pid": 0,
            "tid": 0,
            "args": {
                "frame_index": e.frame_index,
                "tasks_run": e.tasks_run,
                "tasks_skipped": e.tasks_skipped,
            }
        }));
    }

    fn on_monitor_sample(&mut self, e: &MonitorSampleEvent) {
        self.events.push(json!({
            "ph": "C",
            "name": "fps",
            "cat": "Monitor",
            "ts": us(e.now),
            "pid": 0,
            "args": {
                "fps": e.stats.fps,
                "average": e.stats.average_fps,
            }
        }));
    }

    fn on_budget_warning(&mut self, e: &BudgetWarningEvent) {
        self.events.push(json!({
            "ph": "i",
            "name": "slow frames",
            "cat": "Monitor",
            "ts": us(e.now),
            "pid": 0,
            "tid": 0,
            "s": "g",
            "args": {
                "consecutive": e.consecutive,
                "interval_us": dur_us(e.interval),
                "budget_us": dur_us(e.budget),
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(sink: &mut ChromeTraceSink) {
        sink.on_frame_begin(&FrameBeginEvent {
            frame_index: 1,
            now: HostTime(2_000_000),
            delta: Duration::ZERO,
            budget: Duration(6_944_444),
        });
        sink.on_task_run(&TaskRunEvent {
            frame_index: 1,
            id: "crosshair",
            priority: 50,
            started: HostTime(2_000_000),
            cost: Duration::from_micros(500),
            forced: false,
        });
        sink.on_task_skipped(&TaskSkippedEvent {
            frame_index: 1,
            id: "weather",
            priority: 20,
            budget_used: Duration::from_micros(500),
            skipped_frames: 1,
        });
        sink.on_frame_end(&FrameEndEvent {
            frame_index: 1,
            budget_used: Duration::from_micros(500),
            tasks_run: 1,
            tasks_skipped: 1,
        });
    }

    #[test]
    fn export_produces_valid_json() {
        let mut sink = ChromeTraceSink::new();
        frame(&mut sink);

        let mut out = Vec::new();
        sink.write_to(&mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 3);

        assert_eq!(parsed[0]["ph"], "X");
        assert_eq!(parsed[0]["name"], "crosshair");
        assert_eq!(parsed[0]["ts"], 2000.0);
        assert_eq!(parsed[0]["dur"], 500.0);

        assert_eq!(parsed[1]["ph"], "i");
        assert_eq!(parsed[1]["name"], "skip weather");
        assert_eq!(parsed[1]["ts"], 2500.0);

        assert_eq!(parsed[2]["name"], "Frame");
        assert_eq!(parsed[2]["args"]["tasks_skipped"], 1);
    }

    #[test]
    fn budget_warning_is_a_global_instant() {
        let mut sink = ChromeTraceSink::new();
        sink.on_budget_warning(&BudgetWarningEvent {
            now: HostTime(100_000_000),
            consecutive: 10,
            interval: Duration::from_millis(10),
            budget: Duration::from_micros(6_944),
        });
        let event = &sink.events()[0];
        assert_eq!(event["ph"], "i");
        assert_eq!(event["s"], "g");
        assert_eq!(event["ts"], 100_000.0);
        assert_eq!(event["args"]["consecutive"], 10);
    }

    #[test]
    fn export_empty_sink() {
        let sink = ChromeTraceSink::new();
        let mut out = Vec::new();
        sink.write_to(&mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn frame_end_without_begin_is_dropped() {
        let mut sink = ChromeTraceSink::new();
        sink.on_frame_end(&FrameEndEvent {
            frame_index: 9,
            budget_used: Duration::ZERO,
            tasks_run: 0,
            tasks_skipped: 0,
        });
        assert!(sink.events().is_empty());
    }
}
