//! Bounded FIFO Sample Queue
//!
//! ## Overview
//!
//! Samples produced by the ticker wait here until a reader takes them. The
//! queue is a fixed-capacity ring with explicit read and write cursors:
//!
//! ```text
//! ┌─────┬─────┬─────┬─────┬─────┬─────┬─────┬─────┐
//! │  0  │  1  │  2  │  3  │  4  │  5  │  6  │  7  │
//! └─────┴─────┴─────┴─────┴─────┴─────┴─────┴─────┘
//!          ↑                       ↑
//!       read_idx               write_idx
//!      (oldest)               (next slot)
//! ```
//!
//! ## Overflow Policy
//!
//! Unlike a history buffer, this queue never overwrites. When it is full the
//! incoming sample is refused and the caller counts the drop. Samples that a
//! reader has not seen yet are kept; the newest one is lost instead.
//!
//! ```text
//! push(s33) on a full queue:
//!   [s1 s2 ... s32]  →  [s1 s2 ... s32]   s33 dropped, dropped += 1
//! ```
//!
//! ## Thread Safety
//!
//! The queue itself is plain data. The engine keeps it inside its single
//! state lock together with the statistics it feeds.

use crate::sample::Sample;

/// Queue capacity used by the engine
pub const QUEUE_CAPACITY: usize = 32;

/// Fixed-capacity FIFO of samples that drops new entries when full
///
/// ## Internal Invariants
///
/// - `read_idx < N` and `write_idx < N`
/// - `count <= N`
/// - slots `read_idx .. read_idx + count` (mod N) hold live samples
#[derive(Clone)]
pub struct SampleQueue<const N: usize> {
    /// Storage; `None` marks a slot that has never held a live sample
    slots: [Option<Sample>; N],

    /// Index of the oldest live sample
    read_idx: usize,

    /// Index where the next accepted sample lands
    write_idx: usize,

    /// Number of live samples
    count: usize,

    /// Samples refused because the queue was full
    dropped: u32,

    /// Deepest the queue has been
    high_water: usize,
}

impl<const N: usize> SampleQueue<N> {
    /// Create an empty queue
    pub const fn new() -> Self {
        Self {
            slots: [None; N],
            read_idx: 0,
            write_idx: 0,
            count: 0,
            dropped: 0,
            high_water: 0,
        }
    }

    /// Append a sample
    ///
    /// Returns the sample back as `Err` if the queue is full; nothing already
    /// queued is disturbed.
    pub fn push(&mut self, sample: Sample) -> Result<(), Sample> {
        if self.count == N {
            self.dropped = self.dropped.wrapping_add(1);
            return Err(sample);
        }

        self.slots[self.write_idx] = Some(sample);
        self.write_idx = (self.write_idx + 1) % N;
        self.count += 1;
        self.high_water = self.high_water.max(self.count);
        Ok(())
    }

    /// Remove and return the oldest sample
    pub fn pop(&mut self) -> Option<Sample> {
        if self.count == 0 {
            return None;
        }

        let sample = self.slots[self.read_idx].take();
        self.read_idx = (self.read_idx + 1) % N;
        self.count -= 1;
        sample
    }

    /// Look at the oldest sample without removing it
    pub fn peek(&self) -> Option<&Sample> {
        if self.count == 0 {
            return None;
        }
        self.slots[self.read_idx].as_ref()
    }

    /// Number of queued samples
    pub fn len(&self) -> usize {
        self.count
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Check if queue is full
    pub fn is_full(&self) -> bool {
        self.count == N
    }

    /// Maximum number of samples the queue holds
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Samples refused since creation
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Deepest queue level seen since creation
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// Iterate from oldest to newest without consuming
    pub fn iter(&self) -> SampleQueueIter<'_, N> {
        SampleQueueIter {
            queue: self,
            offset: 0,
        }
    }

    /// Discard every queued sample, keeping counters
    pub fn clear(&mut self) {
        self.slots = [None; N];
        self.read_idx = 0;
        self.write_idx = 0;
        self.count = 0;
    }
}

impl<const N: usize> Default for SampleQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over queued samples, oldest first
pub struct SampleQueueIter<'a, const N: usize> {
    queue: &'a SampleQueue<N>,
    offset: usize,
}

impl<'a, const N: usize> Iterator for SampleQueueIter<'a, N> {
    type Item = &'a Sample;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.queue.count {
            return None;
        }
        let idx = (self.queue.read_idx + self.offset) % N;
        self.offset += 1;
        self.queue.slots[idx].as_ref()
    }
}
