// Copyright 2026 the Skyframe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Classified render failures.
//!
//! Drawing-surface operations never panic on bad input or a broken surface;
//! they return a [`RenderResult`]. The failure arm carries a [`RenderError`]
//! whose [`RenderErrorKind`] is drawn from a closed set, so callers can
//! decide between recovery (only for [`ContextLost`](RenderErrorKind::ContextLost))
//! and skipping the element.

use alloc::borrow::Cow;
use alloc::vec::Vec;
use core::fmt;

/// The closed set of render failure classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderErrorKind {
    /// The drawing context is unusable and must be reacquired.
    ContextLost,
    /// A parameter was non-finite or out of the addressable range. Never
    /// retried; the caller must fix its input.
    InvalidParameters,
    /// The frame has no time left for this work.
    BudgetExceeded,
    /// A fixed-capacity scratch area is too small for the request.
    MemoryExhausted,
    /// The surface provider reported a failure of its own.
    SurfaceError,
}

impl RenderErrorKind {
    /// Returns the stable diagnostic name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ContextLost => "CONTEXT_LOST",
            Self::InvalidParameters => "INVALID_PARAMETERS",
            Self::BudgetExceeded => "BUDGET_EXCEEDED",
            Self::MemoryExhausted => "MEMORY_EXHAUSTED",
            Self::SurfaceError => "SURFACE_ERROR",
        }
    }
}

impl fmt::Display for RenderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified render failure with diagnostic context.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{kind} in {operation}: {message}")]
pub struct RenderError {
    kind: RenderErrorKind,
    operation: &'static str,
    message: Cow<'static, str>,
    context: Vec<(&'static str, f64)>,
}

impl RenderError {
    /// Creates an error of `kind` raised by `operation`.
    #[must_use]
    pub fn new(
        kind: RenderErrorKind,
        operation: &'static str,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            kind,
            operation,
            message: message.into(),
            context: Vec::new(),
        }
    }

    /// Shorthand for a [`ContextLost`](RenderErrorKind::ContextLost) error.
    #[must_use]
    pub fn context_lost(operation: &'static str) -> Self {
        Self::new(
            RenderErrorKind::ContextLost,
            operation,
            "drawing context is lost",
        )
    }

    /// Shorthand for an [`InvalidParameters`](RenderErrorKind::InvalidParameters)
    /// error.
    #[must_use]
    pub fn invalid_parameters(
        operation: &'static str,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::new(RenderErrorKind::InvalidParameters, operation, message)
    }

    /// Attaches a named numeric value to the diagnostic context.
    #[must_use]
    pub fn with_value(mut self, name: &'static str, value: f64) -> Self {
        self.context.push((name, value));
        self
    }

    /// Returns the failure class.
    #[must_use]
    pub fn kind(&self) -> RenderErrorKind {
        self.kind
    }

    /// Returns the name of the operation that failed.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the attached `(name, value)` pairs.
    #[must_use]
    pub fn context(&self) -> &[(&'static str, f64)] {
        &self.context
    }

    /// Returns the attached value named `name`, if any.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<f64> {
        self.context
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }
}

/// Outcome of a render operation: the value, or a classified failure.
pub type RenderResult<T> = Result<T, RenderError>;
