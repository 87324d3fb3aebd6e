// Copyright 2026 the Skyframe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Injected monotonic clocks.
//!
//! The scheduler measures how long each render task takes by reading a
//! [`Clock`] before and after the call. Hosts supply a clock backed by their
//! platform's monotonic timer; headless runs and tests use [`ManualClock`],
//! whose time only moves when told to.

use alloc::rc::Rc;
use core::cell::Cell;

use crate::time::{Duration, HostTime};

/// A monotonic time source.
pub trait Clock {
    /// Returns the current host time.
    fn now(&self) -> HostTime;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> HostTime {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now(&self) -> HostTime {
        (**self).now()
    }
}

/// A clock that advances only when told to.
///
/// Clones share the same underlying time, so a render task can hold a clone
/// and [`advance`](Self::advance) it to simulate doing work while the
/// scheduler measures the elapsed cost through its own handle.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    /// Creates a clock reading `start`.
    #[must_use]
    pub fn new(start: HostTime) -> Self {
        Self {
            now: Rc::new(Cell::new(start.nanos())),
        }
    }

    /// Moves the clock to `t`. Moving backwards is allowed; consumers
    /// saturate negative spans to zero.
    pub fn set(&self, t: HostTime) {
        self.now.set(t.nanos());
    }

    /// Moves the clock forward by `d`.
    pub fn advance(&self, d: Duration) {
        self.now.set(self.now.get().saturating_add(d.nanos()));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> HostTime {
        HostTime(self.now.get())
    }
}
