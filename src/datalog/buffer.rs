//! Session buffer
//!
//! Ordered, append-only store of samples for the current recording.
//! Cleared when a new recording starts or on an explicit clear; readers
//! only ever see point-in-time copies, never a live alias.

use super::Sample;

/// Sample store for one recording session
#[derive(Debug, Default)]
pub struct SessionBuffer {
    samples: Vec<Sample>,
}

impl SessionBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one sample. Elapsed times are non-decreasing in append order;
    /// the caller derives them from the session's monotonic start instant.
    pub fn append(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    /// Discard all samples
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Number of samples recorded so far
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the buffer holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Most recently appended sample
    pub fn last(&self) -> Option<Sample> {
        self.samples.last().copied()
    }

    /// Consistent point-in-time copy, for rendering or export
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.clone()
    }
}
