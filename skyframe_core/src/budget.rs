// Copyright 2026 the Skyframe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame time budget and its static per-layer allocation table.
//!
//! A [`FrameBudget`] is fixed at construction to one refresh interval of the
//! target rate. The scheduler consumes it as tasks run and resets it at the
//! start of every frame. The per-layer allocations are advisory: only the
//! aggregate is enforced.

use crate::time::Duration;

/// The advisory share of a frame granted to one overlay layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerAllocation {
    /// Layer name, matching the id its task is scheduled under.
    pub layer: &'static str,
    /// Time granted per frame.
    pub budget: Duration,
}

impl LayerAllocation {
    const fn micros(layer: &'static str, us: u64) -> Self {
        Self {
            layer,
            budget: Duration::from_micros(us),
        }
    }
}

/// Default split of a 144 Hz frame across the overlay stack.
pub const OVERLAY_144HZ_ALLOCATIONS: &[LayerAllocation] = &[
    LayerAllocation::micros("crosshair", 1_500),
    LayerAllocation::micros("adsb", 2_000),
    LayerAllocation::micros("measuring", 1_000),
    LayerAllocation::micros("weather", 1_500),
    LayerAllocation::micros("messaging", 300),
    LayerAllocation::micros("scheduling", 140),
];

/// Total time available per frame, what has been spent of it, and the
/// static per-layer allocation table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameBudget {
    total: Duration,
    consumed: Duration,
    allocations: &'static [LayerAllocation],
}

impl FrameBudget {
    /// Creates a budget of one refresh interval at `fps`, with no
    /// per-layer allocations.
    ///
    /// # Panics
    ///
    /// Panics if `fps` is zero.
    #[must_use]
    pub const fn for_target_fps(fps: u32) -> Self {
        assert!(fps > 0, "target fps must not be zero");
        Self::with_total(Duration(1_000_000_000 / fps as u64))
    }

    /// Creates a budget with an explicit total.
    #[must_use]
    pub const fn with_total(total: Duration) -> Self {
        Self {
            total,
            consumed: Duration::ZERO,
            allocations: &[],
        }
    }

    /// The 144 Hz overlay budget (~6.94 ms) with the default layer split.
    #[must_use]
    pub const fn overlay_144hz() -> Self {
        Self::for_target_fps(144).with_allocations(OVERLAY_144HZ_ALLOCATIONS)
    }

    /// Replaces the per-layer allocation table.
    #[must_use]
    pub const fn with_allocations(mut self, allocations: &'static [LayerAllocation]) -> Self {
        self.allocations = allocations;
        self
    }

    /// Returns the fixed per-frame total.
    #[must_use]
    pub const fn total(&self) -> Duration {
        self.total
    }

    /// Returns the time spent so far this frame.
    #[must_use]
    pub const fn consumed(&self) -> Duration {
        self.consumed
    }

    /// Returns `total − consumed`, or zero once overspent.
    #[must_use]
    pub const fn remaining(&self) -> Duration {
        self.total.saturating_sub(self.consumed)
    }

    /// Returns `true` once the spent time has reached the total.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.consumed.0 >= self.total.0
    }

    /// Records `cost` against this frame.
    pub fn consume(&mut self, cost: Duration) {
        self.consumed = self.consumed.saturating_add(cost);
    }

    /// Resets the spent time for a new frame.
    pub fn begin_frame(&mut self) {
        self.consumed = Duration::ZERO;
    }

    /// Returns the allocation for `layer`, if the table has one.
    #[must_use]
    pub fn allocation(&self, layer: &str) -> Option<Duration> {
        self.allocations
            .iter()
            .find(|a| a.layer == layer)
            .map(|a| a.budget)
    }

    /// Returns the whole allocation table.
    #[must_use]
    pub const fn allocations(&self) -> &'static [LayerAllocation] {
        self.allocations
    }

    /// Returns the sum of all layer allocations.
    #[must_use]
    pub fn allocated_total(&self) -> Duration {
        self.allocations
            .iter()
            .fold(Duration::ZERO, |acc, a| acc.saturating_add(a.budget))
    }
}

impl Default for FrameBudget {
    fn default() -> Self {
        Self::overlay_144hz()
    }
}
