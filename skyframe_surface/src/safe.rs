// Copyright 2026 the Skyframe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The validating, state-guarding wrapper around a drawing context.

use alloc::borrow::Cow;
use alloc::format;
use core::fmt;

use kurbo::{Line, Point, Size};
use skyframe_core::color::Rgba;
use skyframe_core::error::{RenderError, RenderErrorKind, RenderResult};

use crate::context::{DrawContext, PixelRegion, SurfaceFault, SurfaceProvider, TextMetrics};
use crate::state::DrawState;
use crate::validate;

/// Total access to a drawing surface: every operation returns a
/// [`RenderResult`] instead of panicking or leaving the surface in a
/// changed state.
///
/// Each operation checks, in order:
///
/// 1. the context is live, else [`ContextLost`](RenderErrorKind::ContextLost)
///    without touching the surface;
/// 2. its numeric parameters, else
///    [`InvalidParameters`](RenderErrorKind::InvalidParameters) carrying the
///    offending values;
/// 3. the surface's own result, mapped to
///    [`SurfaceError`](RenderErrorKind::SurfaceError).
///
/// Fill and stroke primitives snapshot the [`DrawState`] first and restore
/// it if the primitive changed it.
pub struct SafeSurfaceContext<P: SurfaceProvider> {
    provider: P,
    context: Option<P::Context>,
    repairs: u32,
    recoveries: u32,
}

impl<P: SurfaceProvider + fmt::Debug> fmt::Debug for SafeSurfaceContext<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafeSurfaceContext")
            .field("provider", &self.provider)
            .field("lost", &self.is_lost())
            .field("repairs", &self.repairs)
            .field("recoveries", &self.recoveries)
            .finish_non_exhaustive()
    }
}

/// Borrows the live context out of `slot`.
fn live<'a, C: DrawContext>(slot: &'a mut Option<C>, op: &'static str) -> RenderResult<&'a mut C> {
    match slot {
        Some(ctx) if !ctx.is_lost() => Ok(ctx),
        _ => Err(RenderError::context_lost(op)),
    }
}

fn surface_error(op: &'static str, fault: SurfaceFault) -> RenderError {
    RenderError::new(RenderErrorKind::SurfaceError, op, fault.0)
}

impl<P: SurfaceProvider> SafeSurfaceContext<P> {
    /// Wraps `provider`, acquiring an initial context.
    ///
    /// If acquisition fails the wrapper starts out lost; operations return
    /// [`ContextLost`](RenderErrorKind::ContextLost) until
    /// [`attempt_context_recovery`](Self::attempt_context_recovery) succeeds.
    pub fn new(mut provider: P) -> Self {
        let context = match provider.acquire_context() {
            Ok(ctx) => Some(ctx),
            Err(fault) => {
                log::warn!("no drawing context at startup: {fault}");
                None
            }
        };
        Self {
            provider,
            context,
            repairs: 0,
            recoveries: 0,
        }
    }

    /// Returns `true` if there is no usable context.
    #[must_use]
    pub fn is_lost(&self) -> bool {
        self.context.as_ref().is_none_or(|ctx| ctx.is_lost())
    }

    /// Returns the surface size.
    pub fn size(&mut self) -> RenderResult<Size> {
        Ok(live(&mut self.context, "size")?.size())
    }

    /// Returns the current draw state.
    pub fn draw_state(&mut self) -> RenderResult<DrawState> {
        Ok(live(&mut self.context, "draw_state")?.draw_state())
    }

    /// Applies `state` after checking its line width is a finite,
    /// non-negative number and its alpha lies in `0..=1`.
    pub fn set_draw_state(&mut self, state: &DrawState) -> RenderResult<()> {
        const OP: &str = "set_draw_state";
        let ctx = live(&mut self.context, OP)?;
        validate::draw_state(OP, state)?;
        ctx.set_draw_state(state);
        Ok(())
    }

    /// Resets a rectangle to transparent.
    pub fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> RenderResult<()> {
        const OP: &str = "clear_rect";
        let ctx = live(&mut self.context, OP)?;
        let rect = validate::rect(OP, x, y, width, height)?;
        ctx.clear_rect(rect).map_err(|f| surface_error(OP, f))
    }

    /// Fills a rectangle with the current fill color.
    pub fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> RenderResult<()> {
        const OP: &str = "fill_rect";
        live(&mut self.context, OP)?;
        let rect = validate::rect(OP, x, y, width, height)?;
        self.guarded(OP, |ctx| ctx.fill_rect(rect))
    }

    /// Outlines a rectangle with the current stroke.
    pub fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> RenderResult<()> {
        const OP: &str = "stroke_rect";
        live(&mut self.context, OP)?;
        let rect = validate::rect(OP, x, y, width, height)?;
        self.guarded(OP, |ctx| ctx.stroke_rect(rect))
    }

    /// Strokes a segment from `(x0, y0)` to `(x1, y1)`.
    pub fn stroke_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) -> RenderResult<()> {
        const OP: &str = "stroke_line";
        live(&mut self.context, OP)?;
        let line = Line::new(
            (validate::coordinate(OP, "x0", x0)?, validate::coordinate(OP, "y0", y0)?),
            (validate::coordinate(OP, "x1", x1)?, validate::coordinate(OP, "y1", y1)?),
        );
        self.guarded(OP, |ctx| ctx.stroke_line(line))
    }

    /// Strokes an arc around `(cx, cy)` from `start_angle` to `end_angle`
    /// (radians).
    pub fn stroke_arc(
        &mut self,
        cx: f64,
        cy: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    ) -> RenderResult<()> {
        const OP: &str = "stroke_arc";
        live(&mut self.context, OP)?;
        let center = Point::new(
            validate::coordinate(OP, "cx", cx)?,
            validate::coordinate(OP, "cy", cy)?,
        );
        let radius = validate::extent(OP, "radius", radius)?;
        let start = validate::finite(OP, "start_angle", start_angle)?;
        let end = validate::finite(OP, "end_angle", end_angle)?;
        self.guarded(OP, |ctx| ctx.stroke_arc(center, radius, start, end))
    }

    /// Fills `text` with its baseline starting at `(x, y)`.
    pub fn fill_text(&mut self, text: &str, x: f64, y: f64) -> RenderResult<()> {
        const OP: &str = "fill_text";
        live(&mut self.context, OP)?;
        let origin = Point::new(
            validate::coordinate(OP, "x", x)?,
            validate::coordinate(OP, "y", y)?,
        );
        self.guarded(OP, |ctx| ctx.fill_text(text, origin))
    }

    /// Measures `text` in the current font.
    pub fn measure_text(&mut self, text: &str) -> RenderResult<TextMetrics> {
        const OP: &str = "measure_text";
        live(&mut self.context, OP)?
            .measure_text(text)
            .map_err(|f| surface_error(OP, f))
    }

    /// Copies the part of a rectangle lying on the surface into `out` as
    /// RGBA8 rows and returns the region actually read.
    ///
    /// A rectangle entirely off the surface is
    /// [`InvalidParameters`](RenderErrorKind::InvalidParameters); an `out`
    /// too small for the clamped region is
    /// [`MemoryExhausted`](RenderErrorKind::MemoryExhausted).
    pub fn read_pixels(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        out: &mut [u8],
    ) -> RenderResult<PixelRegion> {
        const OP: &str = "read_pixels";
        let ctx = live(&mut self.context, OP)?;
        validate::finite(OP, "x", x)?;
        validate::finite(OP, "y", y)?;
        validate::extent(OP, "width", width)?;
        validate::extent(OP, "height", height)?;
        let Some(region) = validate::clamp_region(x, y, width, height, ctx.size()) else {
            return Err(RenderError::invalid_parameters(OP, "region lies outside the surface")
                .with_value("x", x)
                .with_value("y", y)
                .with_value("width", width)
                .with_value("height", height));
        };
        let needed = region.byte_len().unwrap_or(usize::MAX);
        if out.len() < needed {
            return Err(RenderError::new(
                RenderErrorKind::MemoryExhausted,
                OP,
                Cow::Owned(format!("read-back needs {needed} bytes, buffer holds {}", out.len())),
            )
            .with_value("needed", needed as f64)
            .with_value("available", out.len() as f64));
        }
        ctx.read_pixels(region, &mut out[..needed])
            .map_err(|f| surface_error(OP, f))?;
        Ok(region)
    }

    /// Reads the pixel at `(x, y)`, clamped to the surface.
    pub fn sample_pixel(&mut self, x: f64, y: f64) -> RenderResult<Rgba> {
        const OP: &str = "sample_pixel";
        let ctx = live(&mut self.context, OP)?;
        validate::finite(OP, "x", x)?;
        validate::finite(OP, "y", y)?;
        let size = ctx.size();
        if size.width < 1.0 || size.height < 1.0 {
            return Err(RenderError::invalid_parameters(OP, "surface has no pixels")
                .with_value("width", size.width)
                .with_value("height", size.height));
        }
        let x = x.clamp(0.0, size.width - 1.0);
        let y = y.clamp(0.0, size.height - 1.0);
        let mut px = [0_u8; 4];
        self.read_pixels(x, y, 1.0, 1.0, &mut px)?;
        Ok(Rgba::from_bytes(&px).unwrap_or(Rgba::TRANSPARENT))
    }

    /// Replaces a lost context with a fresh one from the provider.
    ///
    /// Succeeds without acquiring if the current context is live.
    pub fn attempt_context_recovery(&mut self) -> RenderResult<()> {
        const OP: &str = "attempt_context_recovery";
        if !self.is_lost() {
            return Ok(());
        }
        match self.provider.acquire_context() {
            Ok(ctx) if !ctx.is_lost() => {
                self.context = Some(ctx);
                self.recoveries += 1;
                log::info!("drawing context recovered (recovery #{})", self.recoveries);
                Ok(())
            }
            Ok(_) => Err(RenderError::new(
                RenderErrorKind::ContextLost,
                OP,
                "provider returned a lost context",
            )),
            Err(fault) => Err(RenderError::new(
                RenderErrorKind::ContextLost,
                OP,
                Cow::Owned(format!("provider could not supply a context: {fault}")),
            )),
        }
    }

    /// Number of primitives whose draw-state changes were undone.
    #[must_use]
    pub fn repairs(&self) -> u32 {
        self.repairs
    }

    /// Number of successful context recoveries.
    #[must_use]
    pub fn recoveries(&self) -> u32 {
        self.recoveries
    }

    /// Returns the provider.
    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn guarded<T>(
        &mut self,
        op: &'static str,
        draw: impl FnOnce(&mut P::Context) -> Result<T, SurfaceFault>,
    ) -> RenderResult<T> {
        let ctx = live(&mut self.context, op)?;
        let before = ctx.draw_state();
        let result = draw(ctx);
        if ctx.draw_state() != before {
            ctx.set_draw_state(&before);
            self.repairs += 1;
            log::debug!("{op} changed the draw state; restored it");
        }
        result.map_err(|f| surface_error(op, f))
    }
}
