use std::path::PathBuf;

use crate::error::DaemonError;

/// Messages consumed by the daemon's control loop, one at a time.
#[derive(Debug)]
pub enum DaemonEvent {
    /// The toggle control message arrived (SIGUSR1).
    Toggle,
    /// SIGINT/SIGTERM received; stop watching and exit cleanly.
    Shutdown,
    /// A pipeline stage or background task failed; notify, log and exit.
    Fatal(DaemonError),
}

/// One item from the filesystem watch primitive.
#[derive(Debug)]
pub enum WatchEvent {
    /// A new entry appeared in the watched directory.
    Created(PathBuf),
    /// The watch primitive reported an internal fault.
    Error(String),
}
