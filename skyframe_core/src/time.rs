// Copyright 2026 the Skyframe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic host time and frame-scale durations.
//!
//! [`HostTime`] is a point on the host's monotonic clock in nanoseconds.
//! Hosts that report refresh timestamps in fractional milliseconds (the usual
//! shape of a display-refresh callback) convert with
//! [`HostTime::from_millis_f64`].
//!
//! [`Duration`] is a span in the same nanosecond units. Frame budgets, task
//! costs and inter-frame intervals are all expressed as [`Duration`]s and
//! converted back to milliseconds only for reporting.

use core::fmt;
use core::ops::{Add, AddAssign, Sub};

const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// Converts fractional milliseconds to whole nanoseconds, saturating.
///
/// Negative and NaN inputs map to zero.
#[expect(
    clippy::cast_possible_truncation,
    reason = "f64 → u64 casts saturate; negative and NaN inputs become 0"
)]
fn millis_to_nanos(ms: f64) -> u64 {
    (ms * NANOS_PER_MILLI) as u64
}

/// A point on the host's monotonic clock, in nanoseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> u64 {
        self.0
    }

    /// Creates a host time from a fractional millisecond timestamp.
    ///
    /// Negative and non-finite timestamps saturate to the clock origin.
    #[inline]
    #[must_use]
    pub fn from_millis_f64(ms: f64) -> Self {
        Self(millis_to_nanos(ms))
    }

    /// Returns this time as fractional milliseconds since the clock origin.
    #[inline]
    #[must_use]
    pub fn as_millis_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_MILLI
    }

    /// Returns the duration between `self` and an earlier time, or zero if
    /// `earlier` is after `self`.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }

    /// Checked addition of a duration.
    #[inline]
    #[must_use]
    pub const fn checked_add(self, duration: Duration) -> Option<Self> {
        match self.0.checked_add(duration.0) {
            Some(t) => Some(Self(t)),
            None => None,
        }
    }
}

impl Add<Duration> for HostTime {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for HostTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Self) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({:.3}ms)", self.as_millis_f64())
    }
}

/// A span of time in nanoseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// A zero-length duration.
    pub const ZERO: Self = Self(0);

    /// One second.
    pub const SECOND: Self = Self(1_000_000_000);

    /// Creates a duration from whole microseconds.
    #[inline]
    #[must_use]
    pub const fn from_micros(us: u64) -> Self {
        Self(us * 1_000)
    }

    /// Creates a duration from whole milliseconds.
    #[inline]
    #[must_use]
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms * 1_000_000)
    }

    /// Creates a duration from fractional milliseconds, saturating negative
    /// and NaN inputs to zero.
    #[inline]
    #[must_use]
    pub fn from_millis_f64(ms: f64) -> Self {
        Self(millis_to_nanos(ms))
    }

    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> u64 {
        self.0
    }

    /// Returns this duration as fractional milliseconds.
    #[inline]
    #[must_use]
    pub fn as_millis_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_MILLI
    }

    /// Returns `true` for a zero-length duration.
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Saturating addition.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtraction.
    #[inline]
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Add for Duration {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Duration {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Duration {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({:.3}ms)", self.as_millis_f64())
    }
}
