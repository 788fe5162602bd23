/// One-shot control client and the two-message control channel.
///
/// The channel is bound to OS signals: `Toggle` travels as SIGUSR1 and is
/// handled by the daemon, `Terminate` travels as SIGKILL and ends the daemon
/// immediately without any drain.
use std::path::Path;

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tracing::info;

use crate::error::ControlError;
use crate::pid;

/// What an invocation of the binary should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Run the long-lived daemon.
    Daemon,
    /// Send one control message to a running daemon and exit.
    Control(ControlMessage),
}

impl Mode {
    /// Maps the first CLI argument to a mode. Anything unrecognized, including
    /// no argument at all, toggles.
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            Some("daemon") => Mode::Daemon,
            Some("kill") => Mode::Control(ControlMessage::Terminate),
            _ => Mode::Control(ControlMessage::Toggle),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    Toggle,
    Terminate,
}

impl ControlMessage {
    pub fn signal(self) -> Signal {
        match self {
            ControlMessage::Toggle => Signal::SIGUSR1,
            ControlMessage::Terminate => Signal::SIGKILL,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            ControlMessage::Toggle => "toggle",
            ControlMessage::Terminate => "kill",
        }
    }
}

/// Delivers `msg` to the daemon recorded in `pid_file`.
pub fn send(pid_file: &Path, msg: ControlMessage) -> Result<Pid, ControlError> {
    dispatch(pid_file, msg, |pid, signal| kill(pid, signal))
}

/// Reads the record, then hands the pid and signal to `deliver`. `deliver` is
/// never called when the record is missing or unreadable.
fn dispatch<F>(pid_file: &Path, msg: ControlMessage, deliver: F) -> Result<Pid, ControlError>
where
    F: FnOnce(Pid, Signal) -> nix::Result<()>,
{
    let pid = pid::read(pid_file)?;
    let signal = msg.signal();
    deliver(pid, signal).map_err(|source| ControlError::SignalDelivery {
        pid: pid.as_raw(),
        signal,
        source,
    })?;
    info!("Sent {} signal ({signal}) to daemon (pid {pid})", msg.describe());
    Ok(pid)
}
