// Copyright 2026 the Skyframe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The dashboard's overlay layers and their scheduling priorities.

use skyframe_core::budget::FrameBudget;
use skyframe_core::time::Duration;

/// A standard map overlay. Higher layers paint first and are the last to
/// be skipped when a frame runs long.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OverlayLayer {
    /// Center crosshair and bearing readout.
    Crosshair,
    /// ADS-B traffic tracks.
    Adsb,
    /// Range rings, rulers and bearing lines.
    MeasuringTools,
    /// Weather radar tiles.
    Weather,
    /// Message markers.
    Messaging,
}

impl OverlayLayer {
    /// Every layer, highest priority first.
    pub const ALL: [Self; 5] = [
        Self::Crosshair,
        Self::Adsb,
        Self::MeasuringTools,
        Self::Weather,
        Self::Messaging,
    ];

    /// Task id, matching the layer's entry in the budget allocation table.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Crosshair => "crosshair",
            Self::Adsb => "adsb",
            Self::MeasuringTools => "measuring",
            Self::Weather => "weather",
            Self::Messaging => "messaging",
        }
    }

    /// Scheduling priority.
    #[must_use]
    pub const fn priority(self) -> i32 {
        match self {
            Self::Crosshair => 50,
            Self::Adsb => 40,
            Self::MeasuringTools => 30,
            Self::Weather => 20,
            Self::Messaging => 10,
        }
    }

    /// The layer's advisory share of `budget`.
    #[must_use]
    pub fn allocation(self, budget: &FrameBudget) -> Option<Duration> {
        budget.allocation(self.name())
    }
}
