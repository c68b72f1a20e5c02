//! Candidate-changepoint curves and the bounded stack that holds them.
//!
//! A [`Curve`] stores the sufficient statistics accumulated since one
//! candidate changepoint. The [`CurveStack`] keeps the curves that may still
//! yield the maximum log-likelihood ratio, newest on top, over a fixed ring
//! of slots addressed by wrapping head/tail cursors. The bottom slot always
//! holds the tail sentinel.

use crate::error::FocusError;
use crate::Count;

/// Maximum number of entries in a [`CurveStack`], tail sentinel included.
pub const MAX_CURVES: usize = 64;

const SLOTS: usize = MAX_CURVES + 1;

/// Sufficient statistics of one changepoint hypothesis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Curve {
    /// Cumulative count.
    pub x: Count,
    /// Cumulative expected background.
    pub b: f64,
    /// Cumulative steps.
    pub t: usize,
    /// Best cumulative log-likelihood ratio ending at this candidate.
    pub m: f64,
}

impl Curve {
    /// No evidence yet.
    pub const NULL: Curve = Curve {
        x: 0,
        b: 0.0,
        t: 0,
        m: 0.0,
    };

    /// Bottom-of-stack marker. No accumulation reaches its count, so every
    /// real curve dominates it.
    pub const TAIL: Curve = Curve {
        x: Count::MAX,
        b: 0.0,
        t: 0,
        m: 0.0,
    };

    /// Statistics accumulated between this curve and `acc`.
    fn since(&self, acc: &Curve) -> (f64, f64) {
        ((acc.x - self.x) as f64, acc.b - self.b)
    }

    /// Poisson log-likelihood ratio for a changepoint at this curve, given
    /// the accumulator. `None` when no events were observed since.
    pub fn max_llr(&self, acc: &Curve) -> Option<f64> {
        let (x, b) = self.since(acc);
        if x <= 0.0 || b <= 0.0 {
            return None;
        }
        Some(x * (x / b).ln() - (x - b))
    }

    /// Whether this curve dominates `other` relative to `acc`.
    ///
    /// Cross-multiplied comparison of the rates observed since each curve.
    pub fn dominates(&self, other: &Curve, acc: &Curve) -> bool {
        let (p_x, p_b) = self.since(acc);
        let (q_x, q_b) = other.since(acc);
        p_x * q_b - q_x * p_b > 0.0
    }
}

/// Fixed-capacity stack of curves over a circular buffer.
#[derive(Debug, Clone)]
pub struct CurveStack {
    arr: Vec<Curve>,
    head: usize,
    tail: usize,
    evictions: u64,
}

fn next(i: usize) -> usize {
    if i + 1 == SLOTS {
        0
    } else {
        i + 1
    }
}

fn prev(i: usize) -> usize {
    if i == 0 {
        SLOTS - 1
    } else {
        i - 1
    }
}

impl CurveStack {
    /// Allocate the ring and seed it with the two sentinels.
    pub fn new() -> Result<Self, FocusError> {
        let mut arr = Vec::new();
        arr.try_reserve_exact(SLOTS)
            .map_err(|_| FocusError::AllocationFailure { what: "curve stack" })?;
        arr.resize(SLOTS, Curve::TAIL);
        let mut stack = Self {
            arr,
            head: 0,
            tail: 0,
            evictions: 0,
        };
        stack.reset();
        Ok(stack)
    }

    /// Discard every curve and restore the tail and null sentinels.
    pub fn reset(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.push(Curve::TAIL);
        self.push(Curve::NULL);
    }

    /// Number of entries, tail sentinel included.
    pub fn len(&self) -> usize {
        (self.head + SLOTS - self.tail) % SLOTS
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    pub fn is_full(&self) -> bool {
        next(self.head) == self.tail
    }

    /// Oldest curves discarded so far because the ring was full.
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Push a curve. A full stack drops its oldest curve first and moves the
    /// tail sentinel up one slot.
    pub fn push(&mut self, curve: Curve) {
        if self.is_full() {
            self.tail = next(self.tail);
            self.arr[self.tail] = Curve::TAIL;
            self.evictions += 1;
            tracing::trace!(evictions = self.evictions, "curve stack full, evicted oldest curve");
        }
        self.arr[self.head] = curve;
        self.head = next(self.head);
    }

    /// Pop the top curve. The tail sentinel is never popped.
    pub fn pop(&mut self) -> Option<Curve> {
        if self.len() <= 1 {
            return None;
        }
        self.head = prev(self.head);
        Some(self.arr[self.head])
    }

    /// The top entry, which is the tail sentinel when nothing else is left.
    pub fn top(&self) -> &Curve {
        if self.is_empty() {
            return &Curve::TAIL;
        }
        &self.arr[prev(self.head)]
    }

    /// Curves from newest to oldest, tail sentinel excluded.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            arr: &self.arr,
            cursor: self.head,
            tail: self.tail,
        }
    }
}

/// Top-down iterator over a [`CurveStack`].
pub struct Iter<'a> {
    arr: &'a [Curve],
    cursor: usize,
    tail: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Curve;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == self.tail {
            return None;
        }
        self.cursor = prev(self.cursor);
        if self.cursor == self.tail {
            return None;
        }
        Some(&self.arr[self.cursor])
    }
}
