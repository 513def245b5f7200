//! Transport errors

use thiserror::Error;

/// Errors that can occur while opening or reading a serial device
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Serial port error: {0}")]
    Serial(String),

    #[error("Port not found: {0}")]
    PortNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
