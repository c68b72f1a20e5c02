//! Fixed-capacity FIFO of recent counts.
//!
//! Counts wait here `m` steps before they reach the background estimator, so
//! an ongoing burst cannot raise its own background.

use crate::error::FocusError;
use crate::Count;

/// Circular buffer of the most recent `m` counts.
#[derive(Debug, Clone)]
pub struct DelayQueue {
    arr: Vec<Count>,
    head: usize,
    tail: usize,
}

impl DelayQueue {
    /// Allocate a queue holding up to `capacity` counts.
    pub fn new(capacity: usize) -> Result<Self, FocusError> {
        if capacity == 0 {
            return Err(FocusError::invalid("m", "must be at least 1"));
        }
        let slots = capacity
            .checked_add(1)
            .ok_or(FocusError::AllocationFailure { what: "delay queue" })?;
        let mut arr = Vec::new();
        arr.try_reserve_exact(slots)
            .map_err(|_| FocusError::AllocationFailure { what: "delay queue" })?;
        arr.resize(slots, 0);
        Ok(Self {
            arr,
            head: 0,
            tail: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.arr.len() - 1
    }

    pub fn len(&self) -> usize {
        (self.tail + self.arr.len() - self.head) % self.arr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    pub fn is_full(&self) -> bool {
        (self.tail + 1) % self.arr.len() == self.head
    }

    /// Append a count. Returns false, leaving the queue untouched, when full.
    pub fn enqueue(&mut self, x: Count) -> bool {
        if self.is_full() {
            return false;
        }
        self.arr[self.tail] = x;
        self.tail = (self.tail + 1) % self.arr.len();
        true
    }

    /// Remove the oldest count.
    pub fn dequeue(&mut self) -> Option<Count> {
        if self.is_empty() {
            return None;
        }
        let x = self.arr[self.head];
        self.head = (self.head + 1) % self.arr.len();
        Some(x)
    }

    /// Queued counts, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = Count> + '_ {
        let slots = self.arr.len();
        (0..self.len()).map(move |i| self.arr[(self.head + i) % slots])
    }

    /// Arithmetic mean of the queued counts, `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let total: i128 = self.iter().map(i128::from).sum();
        Some(total as f64 / self.len() as f64)
    }
}
