//! The bounded FIFO connecting the producer and consumer threads
//!
//! Collapses the original's hand-linked `next`-pointer list into a
//! `VecDeque` behind a `parking_lot::Mutex` + `Condvar`, the same pairing
//! the teacher uses to guard its ring buffer and playback state. FIFO
//! ordering, the mutex-guarded length probe, and "signal on push" are
//! preserved exactly from the original design.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::audio::AudioBuffer;

/// One produced minute: the audio, plus the sample offset the consumer
/// should start emitting from (non-zero only for the very first entry,
/// to align playback to the wall clock).
pub struct QueueEntry {
    pub buffer: AudioBuffer,
    pub start_offset: usize,
}

impl QueueEntry {
    pub fn new(buffer: AudioBuffer, start_offset: usize) -> Self {
        QueueEntry { buffer, start_offset }
    }
}

/// Shared FIFO of produced minutes. Cloning a handle is cheap (it's an
/// `Arc` internally via the caller holding it behind one); this type
/// itself is meant to be wrapped in `Arc` by whoever spawns the threads.
#[derive(Default)]
pub struct MinuteQueue {
    inner: Mutex<VecDeque<QueueEntry>>,
    not_empty: Condvar,
}

impl MinuteQueue {
    pub fn new() -> Self {
        MinuteQueue {
            inner: Mutex::new(VecDeque::new()),
            not_empty: Condvar::new(),
        }
    }

    /// Append an entry and wake one waiting consumer.
    pub fn push(&self, entry: QueueEntry) {
        let mut guard = self.inner.lock();
        guard.push_back(entry);
        self.not_empty.notify_one();
    }

    /// Block until an entry is available, then remove and return it.
    pub fn pop_blocking(&self) -> QueueEntry {
        let mut guard = self.inner.lock();
        while guard.is_empty() {
            self.not_empty.wait(&mut guard);
        }
        guard.pop_front().expect("checked non-empty above")
    }

    /// Remove and return the front entry if one is already available,
    /// without blocking.
    pub fn try_pop(&self) -> Option<QueueEntry> {
        self.inner.lock().pop_front()
    }

    /// Current queue depth, for the producer's backpressure check.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Block on `pop_blocking` but give up after `timeout`, used by the
    /// producer's coarse backpressure poll so it can re-check an
    /// external shutdown signal periodically rather than blocking forever.
    pub fn wait_while_len_at_least(&self, threshold: usize, timeout: Duration) {
        let mut guard = self.inner.lock();
        let deadline = std::time::Instant::now() + timeout;
        while guard.len() >= threshold {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            if remaining.is_zero() {
                break;
            }
            let result = self.not_empty.wait_for(&mut guard, remaining);
            if result.timed_out() {
                break;
            }
        }
    }
}
