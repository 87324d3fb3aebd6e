// Copyright 2026 the Skyframe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An in-memory drawing surface that records every primitive.
//!
//! [`RecordingProvider`] hands out [`RecordingSurface`]s that share one
//! [`SurfaceControl`]. Through the control, a driver can lose the current
//! context, make the provider refuse new ones, inject a fault into the next
//! primitive, or make the next fill/stroke leak a draw-state change. Each
//! acquired context gets a new generation number, so recorded calls show
//! which context drew them.

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;

use kurbo::{Line, Point, Rect, Size};
use skyframe_core::color::Rgba;

use crate::context::{DrawContext, PixelRegion, SurfaceFault, SurfaceProvider, TextMetrics};
use crate::state::DrawState;

/// One primitive as it reached the surface.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCall {
    /// `clear_rect`.
    Clear(Rect),
    /// `fill_rect`.
    Fill(Rect),
    /// `stroke_rect`.
    Stroke(Rect),
    /// `stroke_line`.
    Line(Line),
    /// `stroke_arc`.
    Arc {
        /// Arc center.
        center: Point,
        /// Arc radius.
        radius: f64,
        /// Start angle in radians.
        start_angle: f64,
        /// End angle in radians.
        end_angle: f64,
    },
    /// `fill_text`.
    Text {
        /// The text drawn.
        text: String,
        /// Baseline origin.
        origin: Point,
    },
    /// `measure_text`.
    Measure(String),
    /// `read_pixels`.
    Read(PixelRegion),
    /// `set_draw_state`.
    SetState(DrawState),
}

/// A recorded primitive and the context generation that executed it.
#[derive(Clone, Debug, PartialEq)]
pub struct Recorded {
    /// Generation of the context (1 for the first acquired).
    pub generation: u32,
    /// The primitive.
    pub call: DrawCall,
}

#[derive(Debug)]
struct Control {
    size: Size,
    generation: u32,
    lost: bool,
    refuse_acquire: bool,
    fail_next: Option<SurfaceFault>,
    bleed_next: Option<DrawState>,
    pixel: Rgba,
    calls: Vec<Recorded>,
}

/// Shared handle for steering and inspecting recording surfaces.
#[derive(Clone, Debug)]
pub struct SurfaceControl {
    inner: Rc<RefCell<Control>>,
}

impl SurfaceControl {
    fn new(size: Size) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Control {
                size,
                generation: 0,
                lost: false,
                refuse_acquire: false,
                fail_next: None,
                bleed_next: None,
                pixel: Rgba::TRANSPARENT,
                calls: Vec::new(),
            })),
        }
    }

    /// Marks the current context as lost.
    pub fn lose_context(&self) {
        self.inner.borrow_mut().lost = true;
    }

    /// Makes the provider fail (or succeed again) on acquisition.
    pub fn refuse_acquire(&self, refuse: bool) {
        self.inner.borrow_mut().refuse_acquire = refuse;
    }

    /// Makes the next primitive fail with `fault`.
    pub fn fail_next(&self, fault: SurfaceFault) {
        self.inner.borrow_mut().fail_next = Some(fault);
    }

    /// Makes the next fill or stroke primitive leave `state` behind.
    pub fn bleed_next(&self, state: DrawState) {
        self.inner.borrow_mut().bleed_next = Some(state);
    }

    /// Sets the color every read-back returns.
    pub fn set_pixel(&self, color: Rgba) {
        self.inner.borrow_mut().pixel = color;
    }

    /// Returns the generation of the most recently acquired context.
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.inner.borrow().generation
    }

    /// Returns every recorded primitive, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<Recorded> {
        self.inner.borrow().calls.clone()
    }

    /// Returns the number of recorded primitives.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.inner.borrow().calls.len()
    }

    /// Forgets the recorded primitives.
    pub fn clear_calls(&self) {
        self.inner.borrow_mut().calls.clear();
    }
}

/// A recording [`DrawContext`].
#[derive(Debug)]
pub struct RecordingSurface {
    generation: u32,
    state: DrawState,
    control: SurfaceControl,
}

impl RecordingSurface {
    /// Returns this context's generation.
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    fn record(&mut self, call: DrawCall) -> Result<(), SurfaceFault> {
        let mut control = self.control.inner.borrow_mut();
        if let Some(fault) = control.fail_next.take() {
            return Err(fault);
        }
        control.calls.push(Recorded {
            generation: self.generation,
            call,
        });
        Ok(())
    }

    /// Records a fill/stroke primitive, applying any pending state bleed.
    fn paint(&mut self, call: DrawCall) -> Result<(), SurfaceFault> {
        if let Some(state) = self.control.inner.borrow_mut().bleed_next.take() {
            self.state = state;
        }
        self.record(call)
    }
}

impl DrawContext for RecordingSurface {
    fn is_lost(&self) -> bool {
        let control = self.control.inner.borrow();
        control.lost || control.generation != self.generation
    }

    fn size(&self) -> Size {
        self.control.inner.borrow().size
    }

    fn draw_state(&self) -> DrawState {
        self.state
    }

    fn set_draw_state(&mut self, state: &DrawState) {
        self.state = *state;
        self.control.inner.borrow_mut().calls.push(Recorded {
            generation: self.generation,
            call: DrawCall::SetState(*state),
        });
    }

    fn clear_rect(&mut self, rect: Rect) -> Result<(), SurfaceFault> {
        self.record(DrawCall::Clear(rect))
    }

    fn fill_rect(&mut self, rect: Rect) -> Result<(), SurfaceFault> {
        self.paint(DrawCall::Fill(rect))
    }

    fn stroke_rect(&mut self, rect: Rect) -> Result<(), SurfaceFault> {
        self.paint(DrawCall::Stroke(rect))
    }

    fn stroke_line(&mut self, line: Line) -> Result<(), SurfaceFault> {
        self.paint(DrawCall::Line(line))
    }

    fn stroke_arc(
        &mut self,
        center: Point,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    ) -> Result<(), SurfaceFault> {
        self.paint(DrawCall::Arc {
            center,
            radius,
            start_angle,
            end_angle,
        })
    }

    fn fill_text(&mut self, text: &str, origin: Point) -> Result<(), SurfaceFault> {
        self.paint(DrawCall::Text {
            text: text.to_string(),
            origin,
        })
    }

    fn measure_text(&mut self, text: &str) -> Result<TextMetrics, SurfaceFault> {
        self.record(DrawCall::Measure(text.to_string()))?;
        // Fixed-advance font: 7 px per character, 10 px ascent, 3 px descent.
        Ok(TextMetrics {
            width: 7.0 * text.chars().count() as f64,
            ascent: 10.0,
            descent: 3.0,
        })
    }

    fn read_pixels(&mut self, region: PixelRegion, out: &mut [u8]) -> Result<(), SurfaceFault> {
        self.record(DrawCall::Read(region))?;
        let pixel = self.control.inner.borrow().pixel;
        for px in out.chunks_exact_mut(4) {
            px.copy_from_slice(&[pixel.r, pixel.g, pixel.b, pixel.a]);
        }
        Ok(())
    }
}

/// A [`SurfaceProvider`] of [`RecordingSurface`]s.
#[derive(Debug)]
pub struct RecordingProvider {
    control: SurfaceControl,
}

impl RecordingProvider {
    /// Creates a provider for a surface of `size`.
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self {
            control: SurfaceControl::new(size),
        }
    }

    /// Returns a handle for steering and inspecting the surfaces.
    #[must_use]
    pub fn control(&self) -> SurfaceControl {
        self.control.clone()
    }
}

impl SurfaceProvider for RecordingProvider {
    type Context = RecordingSurface;

    fn acquire_context(&mut self) -> Result<RecordingSurface, SurfaceFault> {
        let mut control = self.control.inner.borrow_mut();
        if control.refuse_acquire {
            return Err(SurfaceFault::new("surface unavailable"));
        }
        control.generation += 1;
        control.lost = false;
        Ok(RecordingSurface {
            generation: control.generation,
            state: DrawState::DEFAULT,
            control: self.control.clone(),
        })
    }
}
