// Copyright 2026 the Skyframe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contract with the platform drawing surface.
//!
//! A [`SurfaceProvider`] hands out [`DrawContext`]s. Contexts can be lost at
//! any time (GPU reset, window re-parenting), after which they report
//! [`is_lost`](DrawContext::is_lost) and a fresh one must be acquired.
//!
//! Implementations perform no validation of their own; callers go through
//! [`SafeSurfaceContext`](crate::SafeSurfaceContext).

use alloc::borrow::Cow;

use kurbo::{Line, Point, Rect, Size};

use crate::state::DrawState;

/// A failure reported by the drawing surface itself.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct SurfaceFault(pub Cow<'static, str>);

impl SurfaceFault {
    /// Creates a fault with the given description.
    #[must_use]
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self(message.into())
    }
}

/// Measured extent of a run of text.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextMetrics {
    /// Advance width in pixels.
    pub width: f64,
    /// Distance above the baseline.
    pub ascent: f64,
    /// Distance below the baseline.
    pub descent: f64,
}

impl TextMetrics {
    /// Returns `ascent + descent`.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.ascent + self.descent
    }

    /// Returns the bounding size.
    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height())
    }
}

/// An integer pixel rectangle inside the surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PixelRegion {
    /// Left column.
    pub x: u32,
    /// Top row.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelRegion {
    /// Bytes needed to hold the region as RGBA8, or `None` on overflow.
    #[must_use]
    pub fn byte_len(&self) -> Option<usize> {
        usize::try_from(self.width)
            .ok()?
            .checked_mul(usize::try_from(self.height).ok()?)?
            .checked_mul(4)
    }

    /// Returns `true` if the region covers no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A drawing context on a platform surface.
pub trait DrawContext {
    /// Returns `true` once the context can no longer draw.
    fn is_lost(&self) -> bool;

    /// Returns the surface size in pixels.
    fn size(&self) -> Size;

    /// Returns the current draw state.
    fn draw_state(&self) -> DrawState;

    /// Replaces the draw state.
    fn set_draw_state(&mut self, state: &DrawState);

    /// Resets `rect` to transparent.
    fn clear_rect(&mut self, rect: Rect) -> Result<(), SurfaceFault>;

    /// Fills `rect` with the fill color.
    fn fill_rect(&mut self, rect: Rect) -> Result<(), SurfaceFault>;

    /// Outlines `rect` with the stroke color.
    fn stroke_rect(&mut self, rect: Rect) -> Result<(), SurfaceFault>;

    /// Strokes a straight segment.
    fn stroke_line(&mut self, line: Line) -> Result<(), SurfaceFault>;

    /// Strokes a circular arc between two angles in radians.
    fn stroke_arc(
        &mut self,
        center: Point,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    ) -> Result<(), SurfaceFault>;

    /// Fills `text` with its baseline starting at `origin`.
    fn fill_text(&mut self, text: &str, origin: Point) -> Result<(), SurfaceFault>;

    /// Measures `text` in the current font.
    fn measure_text(&mut self, text: &str) -> Result<TextMetrics, SurfaceFault>;

    /// Copies `region` into `out` as RGBA8 rows. `region` lies inside the
    /// surface and `out` holds at least [`PixelRegion::byte_len`] bytes.
    fn read_pixels(&mut self, region: PixelRegion, out: &mut [u8]) -> Result<(), SurfaceFault>;
}

/// Source of drawing contexts for one surface.
pub trait SurfaceProvider {
    /// The context type handed out.
    type Context: DrawContext;

    /// Acquires a fresh context.
    fn acquire_context(&mut self) -> Result<Self::Context, SurfaceFault>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_byte_len() {
        let region = PixelRegion {
            x: 3,
            y: 4,
            width: 10,
            height: 2,
        };
        assert_eq!(region.byte_len(), Some(80));
        assert!(!region.is_empty());
        assert!(PixelRegion::default().is_empty());
    }

    #[test]
    fn text_metrics_height() {
        let m = TextMetrics {
            width: 30.0,
            ascent: 9.0,
            descent: 3.0,
        };
        assert_eq!(m.size(), Size::new(30.0, 12.0));
    }
}
