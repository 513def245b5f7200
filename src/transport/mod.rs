//! Serial Transport
//!
//! Opens and enumerates serial devices and exposes the line-oriented read
//! interface the acquisition loop consumes. The sender (an Arduino-style
//! board) emits one ASCII voltage reading per line; everything above this
//! module works in terms of whole lines.

mod error;
mod serial;

pub use error::TransportError;
pub use serial::{list_ports, open_port, PortInfo, SerialTransport};

use std::time::Duration;

/// Default baud rate, matching the EKG sender sketch
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// Read timeout for a single blocking read.
///
/// Kept short so the acquisition loop can observe disconnect requests at
/// each iteration boundary without unbounded delay.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// A device that yields newline-delimited telemetry lines.
///
/// This is the seam between the acquisition loop and the hardware: the real
/// serial port implements it, as do the demo signal source and test mocks.
pub trait LineTransport: Send {
    /// Read the next line, without its terminator.
    ///
    /// Returns `Ok(None)` when no complete line arrived within the read
    /// timeout; that is a normal poll result, not an error. Implementations
    /// should block for at most a short timeout before returning `Ok(None)`
    /// so that callers can re-check cancellation state.
    fn read_line(&mut self) -> Result<Option<Vec<u8>>, TransportError>;

    /// Whether the underlying device handle is still usable.
    fn is_open(&self) -> bool {
        true
    }
}
