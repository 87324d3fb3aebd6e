// Copyright 2026 the Skyframe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contract with the host's per-refresh callback.
//!
//! The host environment (a windowing toolkit, a browser animation loop, a
//! headless test driver) owns the display-refresh hook. Components that want
//! to run once per refresh register against it through [`RefreshSource`],
//! and the host then forwards every refresh timestamp to their
//! `on_refresh` method. Components never invoke the hook themselves.
//!
//! # Frame loop
//!
//! ```rust,ignore
//! fn on_display_refresh(timestamp_ms: f64) {
//!     let now = HostTime::from_millis_f64(timestamp_ms);
//!     monitor.on_refresh(now);
//!     scheduler.on_refresh(now, &mut resources);
//! }
//! ```
//!
//! Components that hold no subscription ignore forwarded refreshes, so the
//! host may forward unconditionally.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

/// Handle for one registration with a [`RefreshSource`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Subscription(pub u32);

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subscription({})", self.0)
    }
}

/// A host that delivers one refresh per display frame to its subscribers.
pub trait RefreshSource {
    /// Starts delivering refreshes and returns the registration handle.
    fn subscribe(&mut self) -> Subscription;

    /// Stops delivering refreshes for `subscription`. Unknown handles are
    /// ignored.
    fn unsubscribe(&mut self, subscription: Subscription);
}

impl<R: RefreshSource + ?Sized> RefreshSource for &mut R {
    fn subscribe(&mut self) -> Subscription {
        (**self).subscribe()
    }

    fn unsubscribe(&mut self, subscription: Subscription) {
        (**self).unsubscribe(subscription);
    }
}

impl<R: RefreshSource + ?Sized> RefreshSource for Box<R> {
    fn subscribe(&mut self) -> Subscription {
        (**self).subscribe()
    }

    fn unsubscribe(&mut self, subscription: Subscription) {
        (**self).unsubscribe(subscription);
    }
}

/// Lets several components share one host.
impl<R: RefreshSource + ?Sized> RefreshSource for Rc<RefCell<R>> {
    fn subscribe(&mut self) -> Subscription {
        self.borrow_mut().subscribe()
    }

    fn unsubscribe(&mut self, subscription: Subscription) {
        self.borrow_mut().unsubscribe(subscription);
    }
}

/// A component's (at most one) registration with a host.
///
/// [`start`](Self::start) and [`stop`](Self::stop) are idempotent: starting
/// twice holds one subscription, stopping while stopped does nothing.
#[derive(Debug)]
pub struct RefreshLink<H> {
    host: H,
    subscription: Option<Subscription>,
}

impl<H: RefreshSource> RefreshLink<H> {
    /// Creates an inactive link to `host`.
    pub fn new(host: H) -> Self {
        Self {
            host,
            subscription: None,
        }
    }

    /// Subscribes if not already subscribed. Returns `true` if this call
    /// created the subscription.
    pub fn start(&mut self) -> bool {
        if self.subscription.is_some() {
            return false;
        }
        self.subscription = Some(self.host.subscribe());
        true
    }

    /// Cancels the subscription if there is one. Returns `true` if this call
    /// cancelled it.
    pub fn stop(&mut self) -> bool {
        match self.subscription.take() {
            Some(subscription) => {
                self.host.unsubscribe(subscription);
                true
            }
            None => false,
        }
    }

    /// Returns `true` while subscribed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    /// Returns the current subscription handle, if any.
    #[must_use]
    pub fn subscription(&self) -> Option<Subscription> {
        self.subscription
    }

    /// Returns the host.
    pub fn host(&self) -> &H {
        &self.host
    }
}

/// A host driven by hand: records registrations and leaves refresh delivery
/// to the caller.
///
/// Useful for offline rendering and for tests that step frames explicitly.
#[derive(Debug, Default)]
pub struct ManualRefresh {
    active: Vec<Subscription>,
    next_id: u32,
    subscribe_calls: u32,
    unsubscribe_calls: u32,
}

impl ManualRefresh {
    /// Creates a host with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live subscriptions.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Returns `true` if `subscription` is live.
    #[must_use]
    pub fn is_active(&self, subscription: Subscription) -> bool {
        self.active.contains(&subscription)
    }

    /// Returns how many times [`subscribe`](RefreshSource::subscribe) was
    /// called.
    #[must_use]
    pub fn subscribe_calls(&self) -> u32 {
        self.subscribe_calls
    }

    /// Returns how many times [`unsubscribe`](RefreshSource::unsubscribe)
    /// was called.
    #[must_use]
    pub fn unsubscribe_calls(&self) -> u32 {
        self.unsubscribe_calls
    }
}

impl RefreshSource for ManualRefresh {
    fn subscribe(&mut self) -> Subscription {
        let subscription = Subscription(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.subscribe_calls += 1;
        self.active.push(subscription);
        subscription
    }

    fn unsubscribe(&mut self, subscription: Subscription) {
        self.unsubscribe_calls += 1;
        self.active.retain(|s| *s != subscription);
    }
}
