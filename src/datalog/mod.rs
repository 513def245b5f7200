//! Data Logging
//!
//! The in-memory sample store for one recording session and its CSV export.

mod buffer;
mod export;

pub use buffer::SessionBuffer;
pub use export::{default_log_name, read_csv, write_csv, write_csv_to, CSV_HEADER};

use serde::{Deserialize, Serialize};

/// A single reading accepted into the current recording
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds since the recording session started, per a monotonic clock
    pub elapsed_secs: f64,
    /// Signal voltage in millivolts
    pub value: f64,
}

impl Sample {
    /// Create a new sample
    pub fn new(elapsed_secs: f64, value: f64) -> Self {
        Self {
            elapsed_secs,
            value,
        }
    }
}
