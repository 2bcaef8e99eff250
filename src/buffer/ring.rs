//! Fixed-capacity FIFO ring.

use std::collections::VecDeque;

/// A FIFO buffer that never holds more than `capacity` entries.
#[derive(Debug, Clone)]
pub struct BoundedRing<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedRing<T> {
    /// Create a ring holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Append an entry, returning the oldest one if the ring was full.
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(value);
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut T> {
        self.entries.iter_mut()
    }

    /// Newest first.
    pub fn iter_newest(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().rev()
    }
}
