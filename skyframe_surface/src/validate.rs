// Copyright 2026 the Skyframe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parameter checks applied before anything reaches the surface.

use kurbo::{Rect, Size};
use skyframe_core::error::{RenderError, RenderResult};

use crate::context::PixelRegion;
use crate::state::DrawState;

/// Largest magnitude accepted for a draw coordinate, in pixels.
pub const MAX_COORDINATE: f64 = 32_767.0;

fn reject(op: &'static str, name: &'static str, value: f64, why: &'static str) -> RenderError {
    log::trace!("{op}: rejected {name} = {value} ({why})");
    RenderError::invalid_parameters(op, why).with_value(name, value)
}

/// Requires `value` to be finite.
pub(crate) fn finite(op: &'static str, name: &'static str, value: f64) -> RenderResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(reject(op, name, value, "value is not finite"))
    }
}

/// Requires `value` to be a finite coordinate within ±[`MAX_COORDINATE`].
pub(crate) fn coordinate(op: &'static str, name: &'static str, value: f64) -> RenderResult<f64> {
    finite(op, name, value)?;
    if (-MAX_COORDINATE..=MAX_COORDINATE).contains(&value) {
        Ok(value)
    } else {
        Err(reject(op, name, value, "coordinate out of addressable range"))
    }
}

/// Requires `value` to be a finite, non-negative size.
pub(crate) fn extent(op: &'static str, name: &'static str, value: f64) -> RenderResult<f64> {
    finite(op, name, value)?;
    if value >= 0.0 {
        Ok(value)
    } else {
        Err(reject(op, name, value, "size is negative"))
    }
}

/// Validates an `x, y, width, height` rectangle whose corners must all be
/// addressable.
pub(crate) fn rect(op: &'static str, x: f64, y: f64, width: f64, height: f64) -> RenderResult<Rect> {
    coordinate(op, "x", x)?;
    coordinate(op, "y", y)?;
    extent(op, "width", width)?;
    extent(op, "height", height)?;
    let x1 = x + width;
    let y1 = y + height;
    if x1 > MAX_COORDINATE || y1 > MAX_COORDINATE {
        return Err(RenderError::invalid_parameters(op, "rectangle extends past addressable range")
            .with_value("x", x)
            .with_value("y", y)
            .with_value("width", width)
            .with_value("height", height));
    }
    Ok(Rect::new(x, y, x1, y1))
}

/// Validates a draw state before it is applied.
pub(crate) fn draw_state(op: &'static str, state: &DrawState) -> RenderResult<()> {
    extent(op, "line_width", state.line_width)?;
    finite(op, "global_alpha", state.global_alpha)?;
    if !(0.0..=1.0).contains(&state.global_alpha) {
        return Err(reject(
            op,
            "global_alpha",
            state.global_alpha,
            "alpha outside 0..=1",
        ));
    }
    Ok(())
}

/// Whole pixels of a surface dimension.
#[expect(
    clippy::cast_possible_truncation,
    reason = "f64 → u32 saturates; surface dimensions are small and non-negative"
)]
fn whole(v: f64) -> u32 {
    v as u32
}

/// Smallest whole pixel count covering `v` (`v` is non-negative).
#[expect(
    clippy::cast_possible_truncation,
    reason = "f64 → u32 saturates; callers pass values already clamped to the surface"
)]
fn covering(v: f64) -> u32 {
    let t = v as u32;
    if f64::from(t) < v { t + 1 } else { t }
}

/// Clamps a finite read-back rectangle to the surface. Returns `None` if
/// nothing of it lies on the surface.
pub(crate) fn clamp_region(x: f64, y: f64, width: f64, height: f64, surface: Size) -> Option<PixelRegion> {
    let sw = f64::from(whole(surface.width));
    let sh = f64::from(whole(surface.height));
    let x0 = x.clamp(0.0, sw);
    let y0 = y.clamp(0.0, sh);
    let x1 = (x + width).clamp(0.0, sw);
    let y1 = (y + height).clamp(0.0, sh);
    let (left, top) = (whole(x0), whole(y0));
    let (right, bottom) = (covering(x1), covering(y1));
    if right <= left || bottom <= top {
        return None;
    }
    Some(PixelRegion {
        x: left,
        y: top,
        width: right - left,
        height: bottom - top,
    })
}
