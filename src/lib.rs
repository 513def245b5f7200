//! # EKGenie Core Library
//!
//! Core functionality for the EKGenie EKG recorder.

#![warn(missing_docs)]

//!
//! This library is the acquisition-and-recording engine behind the EKGenie
//! shell. It provides:
//! - Serial device enumeration and newline-delimited signal transport
//! - The connect / record / export state machine with its background
//!   acquisition loop
//! - The in-memory session buffer and CSV export
//! - Render throttling and axis fitting for a live plot
//!
//! The graphical shell is a separate layer: it issues commands on
//! [`engine::RecorderEngine`] and consumes [`engine::EngineEvent`]
//! notifications. Nothing in this crate depends on a UI toolkit.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ekgenie_core::engine::RecorderEngine;
//!
//! let (mut engine, events) = RecorderEngine::new();
//! engine.connect("/dev/ttyACM0", 115200)?;
//! engine.start_recording()?;
//! // ... consume events for live plotting, then:
//! engine.stop_recording()?;
//! engine.export("session.csv")?;
//! ```

pub mod datalog;
pub mod decode;
pub mod demo;
pub mod engine;
pub mod render;
pub mod transport;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::datalog::{Sample, SessionBuffer};
    pub use crate::decode::decode_line;
    pub use crate::demo::DemoTransport;
    pub use crate::engine::{EngineError, EngineEvent, EngineState, RecorderEngine};
    pub use crate::render::{RenderThrottle, RenderWindow};
    pub use crate::transport::{list_ports, LineTransport, PortInfo, TransportError};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
