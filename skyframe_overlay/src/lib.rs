// Copyright 2026 the Skyframe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The overlay stack of a map dashboard, hosted on one drawing surface.
//!
//! [`OverlayHost`] owns a [`FrameBudgetScheduler`](skyframe_core::scheduler::FrameBudgetScheduler),
//! a [`PerformanceMonitor`](skyframe_core::monitor::PerformanceMonitor) and
//! the [`RenderResources`] (safe surface, scratch pool, dirty tracker) it
//! lends to each task. The host environment forwards display refreshes;
//! data feeds hand parsed batches to tasks through [`StagedSlot`]s.
//!
//! ```rust,ignore
//! let refresh = Rc::new(RefCell::new(platform_refresh));
//! let mut overlays = OverlayHost::new(refresh, StdClock::new(), provider, OverlayConfig::hz_144());
//! let tracks = StagedSlot::new();
//! let feed = tracks.clone();
//! overlays.schedule_layer(OverlayLayer::Adsb, move |res: &mut RenderResources<_>, _: &TaskSlice| {
//!     if let Some(batch) = feed.take() { /* paint */ }
//! });
//! ```

mod clock;
mod host;
mod layers;
mod resources;
mod staged;

pub use clock::StdClock;
pub use host::{OverlayConfig, OverlayHost, OverlayTask};
pub use layers::OverlayLayer;
pub use resources::RenderResources;
pub use staged::StagedSlot;
