/// Error taxonomy for the daemon and the control client.
///
/// An empty OCR result is not represented here: it is a normal outcome and
/// never reaches the fatal handler.
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Failure while turning an image into text.
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("failed to encode image for recognition: {0}")]
    Encode(#[from] image::ImageError),

    #[error("OCR engine failed: {0}")]
    Engine(String),

    #[error("OCR engine did not answer within {0:?}")]
    Timeout(Duration),

    #[error("recognition task aborted: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Failure while invoking an external clipboard or notification utility.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error talking to `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}")]
    Status { program: String, status: ExitStatus },

    #[error("`{program}` did not finish within {after:?}")]
    Timeout { program: String, after: Duration },

    #[error("sink command is empty")]
    EmptyCommand,
}

/// Failure of a one-shot control invocation.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("no running daemon recorded in {}: {reason}", path.display())]
    NoDaemon { path: PathBuf, reason: String },

    #[error("failed to deliver {signal} to daemon (pid {pid}): {source}")]
    SignalDelivery {
        pid: i32,
        signal: nix::sys::signal::Signal,
        #[source]
        source: nix::errno::Errno,
    },
}

/// Unrecoverable failure inside the daemon. Every variant ends the process.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("failed to decode image {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Recognition(#[from] RecognitionError),

    #[error("directory watch failed: {0}")]
    Watch(String),

    #[error("failed to prepare watched directory {}: {source}", path.display())]
    WatchDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("failed to write pid record {}: {source}", path.display())]
    PidRecord {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] std::io::Error),

    #[error("image preparation task aborted: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<notify::Error> for DaemonError {
    fn from(e: notify::Error) -> Self {
        DaemonError::Watch(e.to_string())
    }
}
