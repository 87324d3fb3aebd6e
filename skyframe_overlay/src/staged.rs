// Copyright 2026 the Skyframe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-slot mailboxes between data feeds and render tasks.
//!
//! Feed collaborators (track decoders, weather fetchers) run on their own
//! threads and finish at arbitrary times. A [`StagedSlot`] lets them hand the
//! latest parsed batch to a render task without the task ever waiting: the
//! feed [`publish`](StagedSlot::publish)es, replacing anything not yet
//! consumed, and the task [`take`](StagedSlot::take)s inside its frame. If
//! the feed happens to hold the lock at that instant, the task sees nothing
//! this frame and picks the batch up on the next.

use std::sync::{Arc, Mutex, PoisonError, TryLockError};

/// A latest-value-wins slot shared between one producer and one consumer.
#[derive(Debug)]
pub struct StagedSlot<T> {
    inner: Arc<Mutex<Option<T>>>,
}

impl<T> Clone for StagedSlot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for StagedSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> StagedSlot<T> {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(None)),
        }
    }

    /// Stores `value`, returning the unconsumed value it replaced.
    ///
    /// Producer side; may wait briefly for a consumer mid-`take`.
    pub fn publish(&self, value: T) -> Option<T> {
        let mut slot = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        slot.replace(value)
    }

    /// Removes and returns the staged value, if any, without waiting.
    ///
    /// Consumer side. Returns `None` when the producer holds the slot.
    pub fn take(&self) -> Option<T> {
        match self.inner.try_lock() {
            Ok(mut slot) => slot.take(),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().take(),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    /// Returns `true` if a value is staged. `false` when the producer holds
    /// the slot.
    #[must_use]
    pub fn is_staged(&self) -> bool {
        match self.inner.try_lock() {
            Ok(slot) => slot.is_some(),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().is_some(),
            Err(TryLockError::WouldBlock) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_value_wins() {
        let slot = StagedSlot::new();
        assert_eq!(slot.publish(1), None);
        assert_eq!(slot.publish(2), Some(1), "unconsumed value is returned");
        assert!(slot.is_staged());
        assert_eq!(slot.take(), Some(2));
        assert_eq!(slot.take(), None);
        assert!(!slot.is_staged());
    }

    #[test]
    fn take_does_not_wait_for_a_held_slot() {
        let slot = StagedSlot::new();
        slot.publish("tracks");
        let guard = slot.inner.lock().unwrap();
        assert_eq!(slot.take(), None);
        assert!(!slot.is_staged());
        drop(guard);
        assert_eq!(slot.take(), Some("tracks"));
    }

    #[test]
    fn crosses_threads() {
        let slot = StagedSlot::new();
        let feed = slot.clone();
        std::thread::spawn(move || {
            feed.publish(vec![1_u32, 2, 3]);
        })
        .join()
        .unwrap();
        assert_eq!(slot.take(), Some(vec![1, 2, 3]));
    }
}
