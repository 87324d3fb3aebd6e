// Copyright 2026 the Skyframe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-capacity ring storage.
//!
//! [`BoundedCircularBuffer`] is the only structure in the render core that
//! accepts an unbounded number of writes: every frame pushes a sample, and
//! once the buffer is full each push overwrites the oldest entry. Its
//! backing storage is reserved once at construction and never grows.

use alloc::vec::Vec;

/// A fixed-capacity, append-only buffer that overwrites its oldest entry
/// once full.
///
/// Iteration always runs oldest → newest.
#[derive(Clone, Debug)]
pub struct BoundedCircularBuffer<T> {
    items: Vec<T>,
    /// Index of the oldest entry once the buffer has wrapped; zero before.
    head: usize,
    capacity: usize,
}

impl<T> BoundedCircularBuffer<T> {
    /// Creates an empty buffer holding at most `capacity` entries.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "buffer capacity must not be zero");
        Self {
            items: Vec::with_capacity(capacity),
            head: 0,
            capacity,
        }
    }

    /// Appends `item`, overwriting the oldest entry if the buffer is full.
    pub fn push(&mut self, item: T) {
        if self.items.len() < self.capacity {
            self.items.push(item);
        } else {
            self.items[self.head] = item;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    /// Empties the buffer, keeping its storage.
    pub fn clear(&mut self) {
        self.items.clear();
        self.head = 0;
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns `true` once the next push will overwrite.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    /// Returns the fixed capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the oldest entry.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.items.get(self.head)
    }

    /// Returns the newest entry.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        if self.items.is_empty() {
            return None;
        }
        let len = self.items.len();
        self.items.get((self.head + len - 1) % len)
    }

    /// Returns the entry `index` places after the oldest.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.items.len() {
            return None;
        }
        self.items.get((self.head + index) % self.items.len())
    }

    /// Returns the contents as two slices which, concatenated, run
    /// oldest → newest.
    #[must_use]
    pub fn as_slices(&self) -> (&[T], &[T]) {
        let (newer, older) = self.items.split_at(self.head);
        (older, newer)
    }

    /// Iterates oldest → newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + Clone + '_ {
        let (older, newer) = self.as_slices();
        older.iter().chain(newer.iter())
    }
}

impl<T: Clone> BoundedCircularBuffer<T> {
    /// Copies the contents out, oldest → newest.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

impl<'a, T> IntoIterator for &'a BoundedCircularBuffer<T> {
    type Item = &'a T;
    type IntoIter = core::iter::Chain<core::slice::Iter<'a, T>, core::slice::Iter<'a, T>>;

    fn into_iter(self) -> Self::IntoIter {
        let (older, newer) = self.as_slices();
        older.iter().chain(newer.iter())
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[test]
    fn length_never_exceeds_capacity() {
        let mut buf = BoundedCircularBuffer::new(4);
        for i in 0..50 {
            buf.push(i);
            assert!(buf.len() <= 4, "len {} after {} pushes", buf.len(), i + 1);
        }
        assert!(buf.is_full());
    }

    #[test]
    fn keeps_last_n_in_insertion_order() {
        let mut buf = BoundedCircularBuffer::new(5);
        for i in 0..12 {
            buf.push(i);
        }
        assert_eq!(buf.to_vec(), vec![7, 8, 9, 10, 11]);
        assert_eq!(buf.first(), Some(&7));
        assert_eq!(buf.last(), Some(&11));
        assert_eq!(buf.get(2), Some(&9));
        assert_eq!(buf.get(5), None);
    }

    #[test]
    fn partially_filled_buffer_reads_in_order() {
        let mut buf = BoundedCircularBuffer::new(8);
        buf.push('a');
        buf.push('b');
        assert_eq!(buf.to_vec(), vec!['a', 'b']);
        assert_eq!(buf.iter().rev().copied().collect::<Vec<_>>(), vec!['b', 'a']);
        assert!(!buf.is_full());
    }

    #[test]
    fn clear_keeps_storage() {
        let mut buf = BoundedCircularBuffer::new(144);
        for i in 0..200_u32 {
            buf.push(i);
        }
        let storage = buf.items.as_ptr();
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.first(), None);
        assert_eq!(buf.last(), None);
        buf.push(1);
        assert_eq!(buf.items.as_ptr(), storage, "clear must not reallocate");
        assert_eq!(buf.items.capacity(), 144);
    }

    #[test]
    fn pushing_past_capacity_never_reallocates() {
        let mut buf = BoundedCircularBuffer::new(3);
        buf.push(0);
        let storage = buf.items.as_ptr();
        for i in 1..100 {
            buf.push(i);
        }
        assert_eq!(buf.items.as_ptr(), storage);
    }

    #[test]
    #[should_panic(expected = "buffer capacity must not be zero")]
    fn zero_capacity_is_rejected() {
        let _ = BoundedCircularBuffer::<u8>::new(0);
    }
}
