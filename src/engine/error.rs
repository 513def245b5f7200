//! Engine errors

use thiserror::Error;

use crate::transport::TransportError;

/// Errors returned by engine commands.
///
/// None of these are fatal to the engine itself; each maps to a single
/// user-facing notification in the shell.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Already connected")]
    AlreadyConnected,

    #[error("Not connected")]
    NotConnected,

    #[error("Already recording")]
    AlreadyRecording,

    #[error("Not recording")]
    NotRecording,

    #[error("Recording in progress")]
    RecordingInProgress,

    #[error("No samples to export")]
    EmptyBuffer,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
