// Copyright 2026 the Skyframe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! What the overlay host lends to each render task.

use kurbo::Size;
use skyframe_core::dirty::DirtyRegionTracker;
use skyframe_core::pool::RenderResourcePool;
use skyframe_surface::{SafeSurfaceContext, SurfaceProvider};

/// The shared paint resources of one overlay stack.
///
/// Owned by [`OverlayHost`](crate::OverlayHost) and lent to one task at a
/// time for the duration of its run.
#[derive(Debug)]
pub struct RenderResources<P: SurfaceProvider> {
    /// The validated drawing surface.
    pub surface: SafeSurfaceContext<P>,
    /// Per-frame scratch values.
    pub pool: RenderResourcePool,
    /// Regions needing redraw this frame.
    pub dirty: DirtyRegionTracker,
}

impl<P: SurfaceProvider> RenderResources<P> {
    /// Wraps `provider` and sizes the dirty tracker to its surface.
    ///
    /// A provider with no context yet gets an empty tracker, resized on the
    /// first successful recovery.
    pub fn new(provider: P, dirty_capacity: usize) -> Self {
        let mut surface = SafeSurfaceContext::new(provider);
        let bounds = surface.size().unwrap_or(Size::ZERO);
        Self {
            surface,
            pool: RenderResourcePool::new(),
            dirty: DirtyRegionTracker::with_capacity(bounds, dirty_capacity),
        }
    }
}
