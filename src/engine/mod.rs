//! Recording Engine
//!
//! Governs the connection lifecycle and the recording state machine, and
//! owns the background acquisition thread. The graphical shell drives the
//! engine through its command methods and consumes [`EngineEvent`]
//! notifications from the channel handed out by [`RecorderEngine::new`].

mod acquisition;
mod error;

pub use error::EngineError;

use std::io::Write;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::datalog::{self, Sample, SessionBuffer};
use crate::render::RenderWindow;
use crate::transport::{list_ports, LineTransport, PortInfo, SerialTransport};

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    /// No device attached
    Disconnected,
    /// Device attached and streaming; samples are discarded
    Connected,
    /// Device attached; accepted samples are appended to the session buffer
    Recording,
}

/// Notifications pushed from the engine to the shell
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The human-readable status line changed
    StatusChanged(String),
    /// Enough samples arrived to justify a redraw
    RenderReady {
        /// Axis-fit window for the plot
        window: RenderWindow,
        /// Point-in-time copy of the session buffer
        snapshot: Vec<Sample>,
    },
    /// The transport failed mid-session; the engine is now disconnected
    ConnectionLost,
}

/// Session state shared with the acquisition thread. A single lock keeps
/// state transitions atomic with respect to the recording clock.
pub(crate) struct SessionState {
    pub(crate) state: EngineState,
    /// Monotonic reference point for elapsed times; `Some` while Recording
    pub(crate) started_at: Option<Instant>,
}

/// Everything the acquisition thread shares with the foreground
pub(crate) struct Shared {
    pub(crate) session: Mutex<SessionState>,
    pub(crate) buffer: Mutex<SessionBuffer>,
}

/// Lock a mutex, recovering the data if a panicking thread poisoned it
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The acquisition-and-recording engine.
///
/// Dropping the engine disconnects cooperatively and joins the background
/// thread, so the serial handle is always released deterministically.
pub struct RecorderEngine {
    shared: Arc<Shared>,
    events: Sender<EngineEvent>,
    reader: Option<JoinHandle<()>>,
    device: Option<String>,
}

impl RecorderEngine {
    /// Create a disconnected engine and the event channel the shell
    /// consumes
    pub fn new() -> (Self, Receiver<EngineEvent>) {
        let (events, receiver) = mpsc::channel();
        let engine = Self {
            shared: Arc::new(Shared {
                session: Mutex::new(SessionState {
                    state: EngineState::Disconnected,
                    started_at: None,
                }),
                buffer: Mutex::new(SessionBuffer::new()),
            }),
            events,
            reader: None,
            device: None,
        };
        (engine, receiver)
    }

    /// List available serial devices
    pub fn list_ports() -> Vec<PortInfo> {
        list_ports()
    }

    /// Current lifecycle state
    pub fn state(&self) -> EngineState {
        lock(&self.shared.session).state
    }

    /// Whether a recording session is active
    pub fn is_recording(&self) -> bool {
        self.state() == EngineState::Recording
    }

    /// Number of samples in the current session buffer
    pub fn sample_count(&self) -> usize {
        lock(&self.shared.buffer).len()
    }

    /// Point-in-time copy of the session buffer
    pub fn snapshot(&self) -> Vec<Sample> {
        lock(&self.shared.buffer).snapshot()
    }

    /// Label of the attached device, if any (e.g. "/dev/ttyACM0 at 115200 baud")
    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    /// Open `port_name` at `baud_rate` and start acquiring.
    ///
    /// Only legal while disconnected. On transport failure the error is
    /// returned synchronously and the engine stays disconnected.
    pub fn connect(&mut self, port_name: &str, baud_rate: u32) -> Result<(), EngineError> {
        if self.state() != EngineState::Disconnected {
            return Err(EngineError::AlreadyConnected);
        }
        let transport = SerialTransport::open(port_name, baud_rate)?;
        self.attach(Box::new(transport), format!("{port_name} at {baud_rate} baud"))
    }

    /// Attach an already opened transport (demo source, tests)
    pub fn connect_with(
        &mut self,
        transport: Box<dyn LineTransport>,
        label: impl Into<String>,
    ) -> Result<(), EngineError> {
        if self.state() != EngineState::Disconnected {
            return Err(EngineError::AlreadyConnected);
        }
        self.attach(transport, label.into())
    }

    fn attach(
        &mut self,
        transport: Box<dyn LineTransport>,
        label: String,
    ) -> Result<(), EngineError> {
        // Reap a reader left over from an involuntary disconnect
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }

        lock(&self.shared.session).state = EngineState::Connected;

        let shared = Arc::clone(&self.shared);
        let events = self.events.clone();
        let handle = std::thread::Builder::new()
            .name("ekg-acquisition".into())
            .spawn(move || acquisition::run(transport, shared, events))?;

        self.reader = Some(handle);
        info!("connected to {label}");
        self.status(format!("Connected to {label}"));
        self.device = Some(label);
        Ok(())
    }

    /// Detach from the device, stopping any active recording first.
    ///
    /// Cancellation is cooperative: the acquisition loop observes the state
    /// change at its next iteration boundary, so this blocks for at most
    /// one read-timeout interval. Recorded samples are retained. No-op
    /// while already disconnected.
    pub fn disconnect(&mut self) {
        let was = {
            let mut session = lock(&self.shared.session);
            let was = session.state;
            session.state = EngineState::Disconnected;
            session.started_at = None;
            was
        };

        if let Some(handle) = self.reader.take() {
            if handle.join().is_err() {
                warn!("acquisition thread panicked during shutdown");
            }
        }

        if was != EngineState::Disconnected {
            self.device = None;
            info!("disconnected");
            self.status("Disconnected");
        }
    }

    /// Begin a new recording session.
    ///
    /// Clears the session buffer and captures the monotonic start instant
    /// all elapsed times are measured from. Only legal while connected.
    pub fn start_recording(&mut self) -> Result<(), EngineError> {
        {
            let mut session = lock(&self.shared.session);
            match session.state {
                EngineState::Disconnected => return Err(EngineError::NotConnected),
                EngineState::Recording => return Err(EngineError::AlreadyRecording),
                EngineState::Connected => {}
            }
            lock(&self.shared.buffer).clear();
            session.started_at = Some(Instant::now());
            session.state = EngineState::Recording;
        }
        info!("recording started");
        self.status("Recording...");
        Ok(())
    }

    /// Stop the active recording session, keeping its samples for export
    pub fn stop_recording(&mut self) -> Result<(), EngineError> {
        {
            let mut session = lock(&self.shared.session);
            if session.state != EngineState::Recording {
                return Err(EngineError::NotRecording);
            }
            session.state = EngineState::Connected;
            session.started_at = None;
        }
        info!("recording stopped");
        self.status("Recording stopped - Ready to save data");
        Ok(())
    }

    /// Discard the recorded samples. Refused while a recording is active.
    pub fn clear(&mut self) -> Result<(), EngineError> {
        if self.is_recording() {
            return Err(EngineError::RecordingInProgress);
        }
        lock(&self.shared.buffer).clear();
        self.status("Plot cleared");
        Ok(())
    }

    /// Export the recorded session to a CSV file at `path`.
    ///
    /// Takes a snapshot at call time; samples appended afterwards are not
    /// included. Fails without touching the sink when the buffer is empty.
    /// Returns the number of samples written.
    pub fn export<P: AsRef<Path>>(&self, path: P) -> Result<usize, EngineError> {
        let snapshot = self.snapshot();
        if snapshot.is_empty() {
            return Err(EngineError::EmptyBuffer);
        }
        datalog::write_csv(path, &snapshot)?;
        info!("exported {} samples", snapshot.len());
        Ok(snapshot.len())
    }

    /// Export the recorded session to an arbitrary sink
    pub fn export_to<W: Write>(&self, writer: &mut W) -> Result<usize, EngineError> {
        let snapshot = self.snapshot();
        if snapshot.is_empty() {
            return Err(EngineError::EmptyBuffer);
        }
        datalog::write_csv_to(writer, &snapshot)?;
        Ok(snapshot.len())
    }

    fn status(&self, text: impl Into<String>) {
        // The shell may have dropped its receiver; that is not our problem
        let _ = self.events.send(EngineEvent::StatusChanged(text.into()));
    }
}

impl Drop for RecorderEngine {
    fn drop(&mut self) {
        self.disconnect();
    }
}
