// Copyright 2026 the Skyframe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounded dirty-rectangle tracking.
//!
//! Overlays usually change a small part of the surface per frame: a track
//! symbol moves, a range label updates. [`DirtyRegionTracker`] accumulates
//! the areas that need repainting so tasks can limit their work to them.
//!
//! # Merge policy
//!
//! Each [`mark_dirty`](DirtyRegionTracker::mark_dirty) call does one pass
//! over the tracked rectangles and merges the new one into the first
//! rectangle it overlaps (edges touching counts). Merges are not
//! transitive: a grown rectangle is not re-checked against its neighbours,
//! which keeps the per-call cost bounded by the capacity.
//!
//! When a rectangle overlaps nothing and the tracker is already at
//! capacity, tracking collapses to a single rectangle spanning the whole
//! surface. Further marks are absorbed until [`clear`](DirtyRegionTracker::clear).

use alloc::vec::Vec;

use kurbo::{Point, Rect, Size};

/// Tracks the screen-space rectangles needing redraw since the last paint.
#[derive(Clone, Debug)]
pub struct DirtyRegionTracker {
    rects: Vec<Rect>,
    capacity: usize,
    bounds: Size,
    full_surface: bool,
}

impl DirtyRegionTracker {
    /// Rectangles tracked before collapsing to the full surface.
    pub const DEFAULT_CAPACITY: usize = 10;

    /// Creates an empty tracker for a surface of the given size.
    #[must_use]
    pub fn new(bounds: Size) -> Self {
        Self::with_capacity(bounds, Self::DEFAULT_CAPACITY)
    }

    /// Creates an empty tracker that collapses after `capacity` rectangles.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(bounds: Size, capacity: usize) -> Self {
        assert!(capacity > 0, "dirty region capacity must not be zero");
        Self {
            rects: Vec::with_capacity(capacity),
            capacity,
            bounds,
            full_surface: false,
        }
    }

    /// Marks `width × height` at `(x, y)` as needing redraw.
    ///
    /// Non-finite or empty rectangles are ignored.
    pub fn mark_dirty(&mut self, x: f64, y: f64, width: f64, height: f64) {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return;
        }
        self.mark_rect(Rect::new(x, y, x + width, y + height));
    }

    /// Marks `rect` as needing redraw.
    ///
    /// Non-finite or empty rectangles are ignored.
    pub fn mark_rect(&mut self, rect: Rect) {
        if self.full_surface || !usable(&rect) {
            return;
        }
        if let Some(existing) = self.rects.iter_mut().find(|r| overlaps(r, &rect)) {
            *existing = existing.union(rect);
            return;
        }
        if self.rects.len() == self.capacity {
            self.mark_all();
            return;
        }
        self.rects.push(rect);
    }

    /// Marks the whole surface as needing redraw.
    pub fn mark_all(&mut self) {
        self.rects.clear();
        self.rects.push(Rect::from_origin_size(Point::ZERO, self.bounds));
        self.full_surface = true;
    }

    /// Returns the rectangles needing redraw.
    #[must_use]
    pub fn dirty_rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Forgets all tracked rectangles. Called at the start of each paint pass.
    pub fn clear(&mut self) {
        self.rects.clear();
        self.full_surface = false;
    }

    /// Returns `true` if anything needs redrawing.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.rects.is_empty()
    }

    /// Returns `true` once tracking has collapsed to the whole surface.
    #[must_use]
    pub fn is_full_surface(&self) -> bool {
        self.full_surface
    }

    /// Returns the surface size.
    #[must_use]
    pub fn bounds(&self) -> Size {
        self.bounds
    }

    /// Returns the collapse threshold.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Changes the surface size. Everything is dirty after a resize.
    pub fn resize(&mut self, bounds: Size) {
        self.bounds = bounds;
        self.mark_all();
    }
}

/// Finite with positive width and height.
fn usable(rect: &Rect) -> bool {
    let finite = [rect.x0, rect.y0, rect.x1, rect.y1]
        .iter()
        .all(|v| v.is_finite());
    finite && rect.x1 > rect.x0 && rect.y1 > rect.y0
}

/// Closed-interval overlap: rectangles sharing only an edge overlap.
fn overlaps(a: &Rect, b: &Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}
