// Copyright 2026 the Skyframe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-budget coordination for real-time map overlays.
//!
//! `skyframe_core` decides how and when already-available overlay data is
//! painted. It is `no_std` compatible (with `alloc`) and owns no platform
//! hooks: the host's display refresh and monotonic clock are injected.
//!
//! # Architecture
//!
//! ```text
//!   Host refresh (RefreshSource)
//!       │ on_refresh(now)
//!       ├──► PerformanceMonitor ──► FrameStats (once per window)
//!       │
//!       └──► FrameBudgetScheduler ──► RenderTask::run(ctx, TaskSlice)
//!                 │                        │
//!             FrameBudget            RenderResourcePool
//!                 │                  DirtyRegionTracker
//!                 ▼
//!             FrameReport
//! ```
//!
//! **[`scheduler`]**: Runs named tasks in priority order each refresh,
//! measuring their cost and skipping the rest once the frame is spent.
//!
//! **[`budget`]**: Per-frame total and the static per-layer allocation
//! table.
//!
//! **[`monitor`]**: Windowed FPS sampling with bounded history and
//! rate-limited budget warnings.
//!
//! **[`dirty`]**: Bounded set of rectangles needing redraw.
//!
//! **[`pool`]** and **[`buffer`]**: Allocation-free scratch storage for the
//! paint path.
//!
//! **[`error`]**: The closed [`RenderErrorKind`](error::RenderErrorKind)
//! taxonomy and [`RenderResult`](error::RenderResult).
//!
//! **[`host`]** and **[`clock`]**: Contracts for the injected refresh hook
//! and time source, with manual implementations for offline use.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) events for the frame loop.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod budget;
pub mod buffer;
pub mod clock;
pub mod color;
pub mod dirty;
pub mod error;
pub mod host;
pub mod monitor;
pub mod pool;
pub mod scheduler;
pub mod time;
pub mod trace;
