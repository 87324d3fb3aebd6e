// Copyright 2026 the Skyframe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fault-tolerant access to the drawing surface shared by map overlays.
//!
//! Overlay tasks never talk to the platform surface directly. They go
//! through [`SafeSurfaceContext`], which turns every failure mode into a
//! classified [`RenderResult`](skyframe_core::error::RenderResult):
//!
//! - a lost context is reported without touching the surface, and
//!   [`attempt_context_recovery`](SafeSurfaceContext::attempt_context_recovery)
//!   swaps in a fresh one from the [`SurfaceProvider`];
//! - non-finite or out-of-range parameters are rejected before drawing;
//! - fill and stroke primitives cannot leak draw-state changes into the
//!   layers painted after them.
//!
//! The platform side implements [`DrawContext`] and [`SurfaceProvider`].
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `testing` (disabled by default): Exposes [`testing`], a recording
//!   surface for driving overlay code without a display.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod context;
mod safe;
pub mod state;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod validate;

pub use context::{DrawContext, PixelRegion, SurfaceFault, SurfaceProvider, TextMetrics};
pub use safe::SafeSurfaceContext;
pub use state::DrawState;
