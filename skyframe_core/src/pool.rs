// Copyright 2026 the Skyframe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pre-allocated scratch values for the paint hot path.
//!
//! Overlay tasks need small temporary values every frame: a projected point,
//! a color, a label's measured size, a handful of label slots around a
//! compass ring, the vertices of a range circle. [`RenderResourcePool`]
//! allocates all of them once and hands out `&mut` borrows, so the borrow
//! checker enforces the use-before-next-call contract: a scratch value
//! cannot be held across the next request for the same value.

use kurbo::{Point, Size};

use crate::buffer::BoundedCircularBuffer;
use crate::color::Rgba;

/// Reusable scratch objects and bounded lists for one overlay stack.
#[derive(Clone, Debug)]
pub struct RenderResourcePool {
    point: Point,
    color: Rgba,
    metrics: Size,
    label_positions: BoundedCircularBuffer<Point>,
    pixel_samples: BoundedCircularBuffer<Rgba>,
    path_segments: BoundedCircularBuffer<Point>,
}

impl RenderResourcePool {
    /// Slots for labels placed around a ring (cardinal and intercardinal).
    pub const LABEL_SLOTS: usize = 8;
    /// Pixel samples taken for background color detection.
    pub const PIXEL_SAMPLES: usize = 16;
    /// Vertices for one full circle at one-degree resolution.
    pub const PATH_SEGMENTS: usize = 360;

    /// Allocates every scratch value and list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            point: Point::ZERO,
            color: Rgba::TRANSPARENT,
            metrics: Size::ZERO,
            label_positions: BoundedCircularBuffer::new(Self::LABEL_SLOTS),
            pixel_samples: BoundedCircularBuffer::new(Self::PIXEL_SAMPLES),
            path_segments: BoundedCircularBuffer::new(Self::PATH_SEGMENTS),
        }
    }

    /// Returns the scratch point, overwritten with `(x, y)`.
    pub fn temp_point(&mut self, x: f64, y: f64) -> &mut Point {
        self.point.x = x;
        self.point.y = y;
        &mut self.point
    }

    /// Returns the scratch color, overwritten with the given channels.
    pub fn temp_color(&mut self, r: u8, g: u8, b: u8, a: u8) -> &mut Rgba {
        self.color.r = r;
        self.color.g = g;
        self.color.b = b;
        self.color.a = a;
        &mut self.color
    }

    /// Returns the scratch size, overwritten with `width × height`.
    pub fn temp_metrics(&mut self, width: f64, height: f64) -> &mut Size {
        self.metrics.width = width;
        self.metrics.height = height;
        &mut self.metrics
    }

    /// Returns the label slot list, emptied.
    pub fn label_positions(&mut self) -> &mut BoundedCircularBuffer<Point> {
        self.label_positions.clear();
        &mut self.label_positions
    }

    /// Returns the pixel sample list, emptied.
    pub fn pixel_samples(&mut self) -> &mut BoundedCircularBuffer<Rgba> {
        self.pixel_samples.clear();
        &mut self.pixel_samples
    }

    /// Returns the path vertex list, emptied.
    pub fn path_segments(&mut self) -> &mut BoundedCircularBuffer<Point> {
        self.path_segments.clear();
        &mut self.path_segments
    }

    /// Empties every list. Called once per frame by the task that owns the
    /// pool, never by the scheduler.
    pub fn reset(&mut self) {
        self.label_positions.clear();
        self.pixel_samples.clear();
        self.path_segments.clear();
    }
}

impl Default for RenderResourcePool {
    fn default() -> Self {
        Self::new()
    }
}
