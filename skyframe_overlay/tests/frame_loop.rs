// Copyright 2026 the Skyframe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end frame-loop tests: scheduler, monitor and safe surface driven
//! through an [`OverlayHost`] by a manual refresh source and clock.

use std::cell::RefCell;
use std::rc::Rc;

use kurbo::{Rect, Size};
use skyframe_core::budget::FrameBudget;
use skyframe_core::clock::ManualClock;
use skyframe_core::error::RenderErrorKind;
use skyframe_core::host::ManualRefresh;
use skyframe_core::monitor::{FrameStats, MonitorConfig};
use skyframe_core::scheduler::{SchedulerConfig, StarvationPolicy, TaskSlice};
use skyframe_core::time::{Duration, HostTime};
use skyframe_core::trace::Tracer;
use skyframe_debug::chrome::ChromeTraceSink;
use skyframe_debug::pretty::PrettyPrintSink;
use skyframe_overlay::{OverlayConfig, OverlayHost, OverlayLayer, RenderResources, StagedSlot};
use skyframe_surface::testing::{DrawCall, RecordingProvider, SurfaceControl};

type Resources = RenderResources<RecordingProvider>;
type Host = OverlayHost<RecordingProvider, Rc<RefCell<ManualRefresh>>, ManualClock>;

const VIEWPORT: Size = Size::new(800.0, 600.0);

struct Rig {
    host: Host,
    refresh: Rc<RefCell<ManualRefresh>>,
    clock: ManualClock,
    surface: SurfaceControl,
}

fn rig(config: OverlayConfig) -> Rig {
    let refresh = Rc::new(RefCell::new(ManualRefresh::new()));
    let clock = ManualClock::new(HostTime(0));
    let provider = RecordingProvider::new(VIEWPORT);
    let surface = provider.control();
    let host = OverlayHost::new(Rc::clone(&refresh), clock.clone(), provider, config);
    Rig {
        host,
        refresh,
        clock,
        surface,
    }
}

fn budget_config(total_ms: u64, starvation: StarvationPolicy) -> OverlayConfig {
    OverlayConfig {
        scheduler: SchedulerConfig {
            budget: FrameBudget::with_total(Duration::from_millis(total_ms)),
            starvation,
        },
        ..OverlayConfig::hz_144()
    }
}

/// A task that takes `cost_ms` of the shared clock and counts its runs.
fn busy_task(
    clock: &ManualClock,
    cost_ms: u64,
    runs: &Rc<RefCell<u32>>,
) -> impl FnMut(&mut Resources, &TaskSlice) + 'static {
    let clock = clock.clone();
    let runs = Rc::clone(runs);
    move |_: &mut Resources, _: &TaskSlice| {
        clock.advance(Duration::from_millis(cost_ms));
        *runs.borrow_mut() += 1;
    }
}

fn ms(ms: u64) -> HostTime {
    HostTime(Duration::from_millis(ms).nanos())
}

#[test]
fn refresh_is_ignored_until_something_is_scheduled() {
    let mut rig = rig(OverlayConfig::hz_144());
    assert_eq!(rig.refresh.borrow().active_count(), 0);
    assert!(rig.host.on_refresh(ms(0)).is_none());

    rig.host.schedule("noop", |_: &mut Resources, _: &TaskSlice| {}, 0);
    assert_eq!(rig.refresh.borrow().active_count(), 1);
    assert!(rig.host.on_refresh(ms(7)).is_some());

    assert!(rig.host.unschedule("noop"));
    assert_eq!(rig.refresh.borrow().active_count(), 0);
    assert!(rig.host.on_refresh(ms(14)).is_none());
}

#[test]
fn budget_stops_admitting_work_once_spent() {
    let mut rig = rig(budget_config(8, StarvationPolicy::Strict));
    let runs = Rc::new(RefCell::new(0));
    rig.host.schedule("a", busy_task(&rig.clock, 3, &runs), 3);
    rig.host.schedule("b", busy_task(&rig.clock, 3, &runs), 2);
    rig.host.schedule("c", busy_task(&rig.clock, 3, &runs), 1);

    let report = rig.host.on_refresh(ms(0)).unwrap();
    assert_eq!(report.tasks_run, 2);
    assert_eq!(report.tasks_skipped, 1);
    assert_eq!(report.budget_used, Duration::from_millis(6));
    assert_eq!(*runs.borrow(), 2);

    let costs = rig.host.budget_report();
    assert_eq!(costs.get("a"), Some(&Duration::from_millis(3)));
    assert_eq!(costs.get("b"), Some(&Duration::from_millis(3)));
    assert_eq!(costs.get("c"), None, "never ran");
    assert_eq!(rig.host.scheduler().skipped_frames("c"), Some(1));
}

#[test]
fn strict_priority_starves_the_lower_task() {
    let mut rig = rig(budget_config(8, StarvationPolicy::Strict));
    let a_runs = Rc::new(RefCell::new(0));
    let b_runs = Rc::new(RefCell::new(0));
    rig.host.schedule("a", busy_task(&rig.clock, 5, &a_runs), 2);
    rig.host.schedule("b", busy_task(&rig.clock, 5, &b_runs), 1);

    for frame in 0..5 {
        let report = rig.host.on_refresh(ms(frame * 7)).unwrap();
        assert_eq!((report.tasks_run, report.tasks_skipped), (1, 1));
    }
    assert_eq!(*a_runs.borrow(), 5);
    assert_eq!(*b_runs.borrow(), 0);
    assert_eq!(rig.host.scheduler().skipped_frames("b"), Some(5));
}

#[test]
fn aging_runs_an_overdue_task_ahead_of_priority() {
    let mut rig = rig(budget_config(
        8,
        StarvationPolicy::Aging {
            max_skipped_frames: 2,
        },
    ));
    let a_runs = Rc::new(RefCell::new(0));
    let b_runs = Rc::new(RefCell::new(0));
    rig.host.schedule("a", busy_task(&rig.clock, 5, &a_runs), 2);
    rig.host.schedule("b", busy_task(&rig.clock, 5, &b_runs), 1);

    rig.host.on_refresh(ms(0)).unwrap();
    rig.host.on_refresh(ms(7)).unwrap();
    assert_eq!(*b_runs.borrow(), 0);
    assert_eq!(rig.host.scheduler().skipped_frames("b"), Some(2));

    let third = rig.host.on_refresh(ms(14)).unwrap();
    assert_eq!(*b_runs.borrow(), 1, "b is overdue and forced");
    assert_eq!(*a_runs.borrow(), 2, "b's cost leaves no room for a");
    assert_eq!((third.tasks_run, third.tasks_skipped), (1, 1));
    assert_eq!(rig.host.scheduler().skipped_frames("b"), Some(0));
    assert_eq!(rig.host.scheduler().skipped_frames("a"), Some(1));
}

#[test]
fn lost_surface_is_recovered_before_tasks_paint() {
    let mut rig = rig(OverlayConfig::hz_144());
    let saw_full_surface = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&saw_full_surface);
    rig.host
        .schedule_layer(OverlayLayer::Crosshair, move |res: &mut Resources, _: &TaskSlice| {
            seen.borrow_mut().push(res.dirty.is_full_surface());
            res.surface.fill_rect(395.0, 295.0, 10.0, 10.0).unwrap();
        });

    rig.host.on_refresh(ms(0)).unwrap();
    rig.surface.lose_context();
    assert!(rig.host.resources().surface.is_lost());

    rig.host.on_refresh(ms(7)).unwrap();
    assert!(!rig.host.resources().surface.is_lost());
    assert_eq!(rig.host.resources().surface.recoveries(), 1);
    assert_eq!(rig.surface.generation(), 2);

    let fills: Vec<u32> = rig
        .surface
        .calls()
        .into_iter()
        .filter(|r| matches!(r.call, DrawCall::Fill(_)))
        .map(|r| r.generation)
        .collect();
    assert_eq!(fills, vec![1, 2]);
    assert_eq!(*saw_full_surface.borrow(), vec![false, true]);
    assert!(
        !rig.host.resources().dirty.is_dirty(),
        "dirty set is cleared after the frame"
    );
}

#[test]
fn unrecoverable_surface_surfaces_context_lost_to_tasks() {
    let mut rig = rig(OverlayConfig::hz_144());
    let outcomes = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&outcomes);
    rig.host
        .schedule_layer(OverlayLayer::Adsb, move |res: &mut Resources, _: &TaskSlice| {
            let outcome = res.surface.fill_rect(10.0, 10.0, 4.0, 4.0);
            log.borrow_mut().push(outcome.map_err(|e| e.kind()));
        });

    rig.surface.refuse_acquire(true);
    rig.surface.lose_context();
    rig.host.on_refresh(ms(0)).unwrap();
    rig.host.on_refresh(ms(7)).unwrap();

    rig.surface.refuse_acquire(false);
    rig.host.on_refresh(ms(14)).unwrap();

    assert_eq!(
        *outcomes.borrow(),
        vec![
            Err(RenderErrorKind::ContextLost),
            Err(RenderErrorKind::ContextLost),
            Ok(()),
        ]
    );
    assert_eq!(rig.host.resources().surface.recoveries(), 1);
}

#[test]
fn invalid_draws_are_rejected_without_reaching_the_surface() {
    let mut rig = rig(OverlayConfig::hz_144());
    let outcome = Rc::new(RefCell::new(None));
    let out = Rc::clone(&outcome);
    rig.host
        .schedule_layer(OverlayLayer::MeasuringTools, move |res: &mut Resources, _: &TaskSlice| {
            *out.borrow_mut() = Some(res.surface.stroke_line(0.0, 0.0, f64::NAN, 10.0));
        });

    rig.host.on_refresh(ms(0)).unwrap();
    let err = outcome.borrow_mut().take().unwrap().unwrap_err();
    assert_eq!(err.kind(), RenderErrorKind::InvalidParameters);
    assert_eq!(rig.surface.call_count(), 0);
}

#[test]
fn monitor_reports_samples_through_its_callback() {
    let mut rig = rig(OverlayConfig {
        monitor: MonitorConfig {
            window: Duration::from_millis(100),
            ..MonitorConfig::hz_144()
        },
        ..OverlayConfig::hz_144()
    });
    let samples: Rc<RefCell<Vec<FrameStats>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&samples);
    rig.host.start_monitor(move |stats| sink.borrow_mut().push(*stats));

    // 10 ms refreshes: the window closes on the refresh at 100 ms.
    for frame in 0..=10 {
        rig.host.on_refresh(ms(frame * 10));
    }
    let samples = samples.borrow();
    assert_eq!(samples.len(), 1);
    assert!((samples[0].fps - 100.0).abs() < 1e-9, "{:?}", samples[0]);
    assert!((samples[0].frame_time_ms - 10.0).abs() < 1e-9);
    assert_eq!(rig.host.monitor().history().len(), 1);
    assert!(!rig.host.monitor().is_optimal(144.0));

    rig.host.stop_monitor();
    assert!(!rig.host.monitor().is_running());
    assert_eq!(rig.host.monitor().history().len(), 1);
}

#[test]
fn stop_releases_every_subscription() {
    let mut rig = rig(OverlayConfig::hz_144());
    rig.host.schedule("noop", |_: &mut Resources, _: &TaskSlice| {}, 0);
    rig.host.start_monitor(|_| {});
    assert_eq!(rig.refresh.borrow().active_count(), 2);

    rig.host.stop();
    assert_eq!(rig.refresh.borrow().active_count(), 0);
    assert!(rig.host.on_refresh(ms(0)).is_none());
}

#[test]
fn marks_between_frames_are_visible_to_tasks_once() {
    let mut rig = rig(OverlayConfig::hz_144());
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);
    rig.host
        .schedule_layer(OverlayLayer::Weather, move |res: &mut Resources, _: &TaskSlice| {
            log.borrow_mut().push(res.dirty.dirty_rects().len());
        });

    rig.host.resources_mut().dirty.mark_dirty(0.0, 0.0, 10.0, 10.0);
    rig.host.resources_mut().dirty.mark_dirty(100.0, 100.0, 10.0, 10.0);
    rig.host.on_refresh(ms(0)).unwrap();
    rig.host.on_refresh(ms(7)).unwrap();

    assert_eq!(*seen.borrow(), vec![2, 0]);
}

#[test]
fn damage_waits_for_a_skipped_layer() {
    let mut rig = rig(OverlayConfig::hz_144());
    let crosshair_clock = rig.clock.clone();
    let crosshair_frames = Rc::new(RefCell::new(0_u32));
    let frames = Rc::clone(&crosshair_frames);
    rig.host
        .schedule_layer(OverlayLayer::Crosshair, move |_: &mut Resources, _: &TaskSlice| {
            let first = *frames.borrow() == 0;
            *frames.borrow_mut() += 1;
            // Overruns the whole frame once, then is cheap.
            crosshair_clock.advance(Duration::from_millis(if first { 7 } else { 0 }));
        });
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);
    rig.host
        .schedule_layer(OverlayLayer::Messaging, move |res: &mut Resources, _: &TaskSlice| {
            log.borrow_mut().push(res.dirty.dirty_rects().to_vec());
        });

    rig.host.resources_mut().dirty.mark_dirty(100.0, 100.0, 10.0, 10.0);
    let first = rig.host.on_refresh(ms(0)).unwrap();
    assert_eq!(first.tasks_skipped, 1);
    assert!(seen.borrow().is_empty(), "messaging was skipped");
    assert_eq!(
        rig.host.resources().dirty.dirty_rects(),
        &[Rect::new(100.0, 100.0, 110.0, 110.0)],
        "damage stays pending for the skipped layer"
    );

    let second = rig.host.on_refresh(ms(7)).unwrap();
    assert_eq!(second.tasks_skipped, 0);
    assert_eq!(*seen.borrow(), vec![vec![Rect::new(100.0, 100.0, 110.0, 110.0)]]);
    assert!(!rig.host.resources().dirty.is_dirty(), "cleared once every layer ran");
}

#[test]
fn resize_marks_the_new_surface_dirty() {
    let mut rig = rig(OverlayConfig::hz_144());
    rig.host.resize(Size::new(1024.0, 768.0));
    let dirty = &rig.host.resources().dirty;
    assert!(dirty.is_full_surface());
    assert_eq!(dirty.bounds(), Size::new(1024.0, 768.0));
}

#[test]
fn staged_feed_batches_reach_the_painting_task() {
    let mut rig = rig(OverlayConfig::hz_144());
    let tracks: StagedSlot<Vec<(f64, f64)>> = StagedSlot::new();
    let feed = tracks.clone();
    rig.host
        .schedule_layer(OverlayLayer::Adsb, move |res: &mut Resources, _: &TaskSlice| {
            let Some(batch) = feed.take() else {
                return;
            };
            for (x, y) in batch {
                res.surface.fill_rect(x - 2.0, y - 2.0, 4.0, 4.0).unwrap();
            }
        });

    let producer = tracks.clone();
    std::thread::spawn(move || {
        producer.publish(vec![(10.0, 10.0)]);
    })
    .join()
    .unwrap();
    // Overwritten before the frame: only the newest batch is painted.
    tracks.publish(vec![(50.0, 50.0), (60.0, 60.0)]);

    rig.host.on_refresh(ms(0)).unwrap();
    rig.host.on_refresh(ms(7)).unwrap();
    assert_eq!(rig.surface.call_count(), 2);
    assert!(!tracks.is_staged());
}

#[test]
fn layers_run_in_priority_order() {
    let mut rig = rig(OverlayConfig::hz_144());
    let order = Rc::new(RefCell::new(Vec::new()));
    for layer in [
        OverlayLayer::Messaging,
        OverlayLayer::Adsb,
        OverlayLayer::Crosshair,
        OverlayLayer::Weather,
        OverlayLayer::MeasuringTools,
    ] {
        let order = Rc::clone(&order);
        rig.host
            .schedule_layer(layer, move |_: &mut Resources, _: &TaskSlice| {
                order.borrow_mut().push(layer);
            });
    }

    rig.host.on_refresh(ms(0)).unwrap();
    assert_eq!(*order.borrow(), OverlayLayer::ALL.to_vec());
}

#[test]
fn traced_refresh_feeds_debug_sinks() {
    let mut rig = rig(budget_config(8, StarvationPolicy::Strict));
    let runs = Rc::new(RefCell::new(0));
    rig.host.schedule("a", busy_task(&rig.clock, 5, &runs), 2);
    rig.host.schedule("b", busy_task(&rig.clock, 5, &runs), 1);

    let mut chrome = ChromeTraceSink::new();
    rig.host
        .on_refresh_traced(ms(0), &mut Tracer::new(&mut chrome))
        .unwrap();
    let phases: Vec<&str> = chrome
        .events()
        .iter()
        .filter_map(|e| e["ph"].as_str())
        .collect();
    assert_eq!(phases, vec!["X", "i", "X"]);
    assert_eq!(chrome.events()[0]["name"], "a");
    assert_eq!(chrome.events()[1]["name"], "skip b");
    assert_eq!(chrome.events()[2]["name"], "Frame");

    let mut pretty = PrettyPrintSink::with_writer(Vec::new());
    rig.host
        .on_refresh_traced(ms(7), &mut Tracer::new(&mut pretty))
        .unwrap();
    let text = String::from_utf8(pretty.into_inner()).unwrap();
    assert!(text.contains("[frame:begin] frame=2"), "{text}");
    assert!(text.contains("[task] frame=2 a prio=2 cost=5.000ms"), "{text}");
    assert!(text.contains("[skip] frame=2 b prio=1"), "{text}");
    assert!(text.contains("[frame:end] frame=2 used=5.000ms run=1 skipped=1"), "{text}");
}
