// Copyright 2026 the Skyframe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wall-clock time source for hosted overlays.

use std::time::Instant;

use skyframe_core::clock::Clock;
use skyframe_core::time::HostTime;

/// A [`Clock`] reading the process's monotonic clock, measured from the
/// moment it was created.
#[derive(Clone, Copy, Debug)]
pub struct StdClock {
    origin: Instant,
}

impl StdClock {
    /// Creates a clock whose origin is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdClock {
    fn now(&self) -> HostTime {
        let nanos = self.origin.elapsed().as_nanos();
        HostTime(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}
