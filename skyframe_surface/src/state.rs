// Copyright 2026 the Skyframe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draw state carried by a drawing context between primitives.

use skyframe_core::color::Rgba;

/// The styling a drawing context applies to subsequent primitives.
///
/// Overlays share one context, so a primitive that leaves this state
/// changed would restyle every layer painted after it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawState {
    /// Fill color for rectangles and text.
    pub fill: Rgba,
    /// Stroke color for outlines, lines and arcs.
    pub stroke: Rgba,
    /// Stroke width in pixels.
    pub line_width: f64,
    /// Opacity multiplier applied to everything drawn, `0.0..=1.0`.
    pub global_alpha: f64,
}

impl DrawState {
    /// Opaque black fill and stroke, one-pixel lines, full opacity.
    pub const DEFAULT: Self = Self {
        fill: Rgba::BLACK,
        stroke: Rgba::BLACK,
        line_width: 1.0,
        global_alpha: 1.0,
    };

    /// Returns this state with a different fill.
    #[must_use]
    pub const fn with_fill(mut self, fill: Rgba) -> Self {
        self.fill = fill;
        self
    }

    /// Returns this state with a different stroke.
    #[must_use]
    pub const fn with_stroke(mut self, stroke: Rgba) -> Self {
        self.stroke = stroke;
        self
    }

    /// Returns this state with a different line width.
    #[must_use]
    pub const fn with_line_width(mut self, line_width: f64) -> Self {
        self.line_width = line_width;
        self
    }

    /// Returns this state with a different global alpha.
    #[must_use]
    pub const fn with_global_alpha(mut self, global_alpha: f64) -> Self {
        self.global_alpha = global_alpha;
        self
    }
}

impl Default for DrawState {
    fn default() -> Self {
        Self::DEFAULT
    }
}
