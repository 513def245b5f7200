//! Serial port handling
//!
//! Port enumeration plus the buffered line reader used by the acquisition
//! loop. No retry logic lives here; resilience is the loop's job.

use serde::Serialize;
use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use std::io::Read;
use tracing::{debug, warn};

use super::{LineTransport, TransportError, DEFAULT_READ_TIMEOUT};

/// Longest unterminated run of bytes kept while waiting for a newline.
/// Anything beyond this is line noise, not a reading, and is discarded.
const MAX_LINE_LEN: usize = 1024;

/// Information about an available serial port
#[derive(Debug, Clone, Serialize)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyACM0" or "COM3")
    pub name: String,

    /// Manufacturer name (if the device reports one)
    pub manufacturer: Option<String>,

    /// Product name (if the device reports one)
    pub product: Option<String>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (manufacturer, product) = match info.port_type {
            SerialPortType::UsbPort(usb) => (usb.manufacturer, usb.product),
            _ => (None, None),
        };

        Self {
            name: info.port_name,
            manufacturer,
            product,
        }
    }
}

/// Rank ports so ttyACM* devices list first (the usual Arduino name),
/// then ttyUSB*, then everything else, each group in numeric suffix order.
fn port_rank(name: &str) -> (u8, usize) {
    let basename = name.rsplit('/').next().unwrap_or(name);
    for (rank, prefix) in [(0u8, "ttyACM"), (1, "ttyUSB")] {
        if let Some(suffix) = basename.strip_prefix(prefix) {
            return (rank, suffix.parse().unwrap_or(usize::MAX));
        }
    }
    (2, 0)
}

/// List available serial ports in a deterministic order
pub fn list_ports() -> Vec<PortInfo> {
    let mut ports: Vec<PortInfo> = serialport::available_ports()
        .unwrap_or_default()
        .into_iter()
        .map(PortInfo::from)
        .collect();

    // Linux: pick up ttyACM*/ttyUSB* nodes the enumeration API missed
    #[cfg(target_os = "linux")]
    if let Ok(entries) = std::fs::read_dir("/dev") {
        for entry in entries.flatten() {
            if let Some(fname) = entry.file_name().to_str() {
                if fname.starts_with("ttyACM") || fname.starts_with("ttyUSB") {
                    let name = format!("/dev/{}", fname);
                    if !ports.iter().any(|p| p.name == name) {
                        ports.push(PortInfo {
                            name,
                            manufacturer: None,
                            product: None,
                        });
                    }
                }
            }
        }
    }

    ports.sort_by(|a, b| {
        port_rank(&a.name)
            .cmp(&port_rank(&b.name))
            .then_with(|| a.name.cmp(&b.name))
    });
    ports
}

/// Open a serial port at the given baud rate with 8N1 framing
pub fn open_port(name: &str, baud_rate: u32) -> Result<Box<dyn SerialPort>, TransportError> {
    let mut port = serialport::new(name, baud_rate)
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::None)
        .stop_bits(serialport::StopBits::One)
        .flow_control(serialport::FlowControl::None)
        .timeout(DEFAULT_READ_TIMEOUT)
        .open()
        .map_err(|e| match e.kind {
            serialport::ErrorKind::NoDevice => TransportError::PortNotFound(name.to_string()),
            _ => TransportError::Serial(e.to_string()),
        })?;

    // Keep DTR asserted so the open does not hold an Arduino-style board in
    // its bootloader reset.
    if let Err(e) = port.write_data_terminal_ready(true) {
        warn!("failed to assert DTR on {name}: {e} (continuing)");
    }

    debug!("opened {name} at {baud_rate} baud");
    Ok(port)
}

/// Line-buffered reader over an open serial port.
///
/// Reassembles newline-terminated lines across reads; a read timeout
/// surfaces as `Ok(None)` so the caller can poll its cancellation state.
/// Dropping the transport releases the port handle.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    pending: Vec<u8>,
}

impl SerialTransport {
    /// Wrap an already opened port
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self {
            port,
            pending: Vec::new(),
        }
    }

    /// Open `name` at `baud_rate` and discard any stale input
    pub fn open(name: &str, baud_rate: u32) -> Result<Self, TransportError> {
        let port = open_port(name, baud_rate)?;
        if let Err(e) = port.clear(serialport::ClearBuffer::Input) {
            warn!("failed to clear input buffer on {name}: {e} (continuing)");
        }
        Ok(Self::new(port))
    }

    /// Pop the first complete line out of the pending buffer, if any
    fn take_pending_line(&mut self) -> Option<Vec<u8>> {
        let pos = self.pending.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
        line.pop(); // strip the newline
        Some(line)
    }
}

impl LineTransport for SerialTransport {
    fn read_line(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        if let Some(line) = self.take_pending_line() {
            return Ok(Some(line));
        }

        let mut chunk = [0u8; 256];
        match self.port.read(&mut chunk) {
            Ok(0) => Ok(None),
            Ok(n) => {
                self.pending.extend_from_slice(&chunk[..n]);
                if self.pending.len() > MAX_LINE_LEN && !self.pending.contains(&b'\n') {
                    // Unterminated garbage; drop it and keep reading
                    self.pending.clear();
                }
                Ok(self.take_pending_line())
            }
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::TimedOut
                        | std::io::ErrorKind::WouldBlock
                        | std::io::ErrorKind::Interrupted
                ) =>
            {
                Ok(None)
            }
            Err(e) => Err(TransportError::Io(e)),
        }
    }
}
