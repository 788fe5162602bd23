/// Delivery of recognized text to the clipboard and of messages to the desktop.
///
/// Both sinks shell out to an external utility (`xclip`, `notify-send` by
/// default). Each invocation runs under a deadline; a child that overruns it
/// is killed and reported as [`SinkError::Timeout`].
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Child;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::SinkError;
use crate::event::DaemonEvent;

/// Places text on the system clipboard.
#[trait_variant::make(ClipboardSink: Send)]
pub trait LocalClipboardSink {
    async fn set(&self, text: &str) -> Result<(), SinkError>;
}

/// Shows a human-readable desktop notification.
#[trait_variant::make(NotificationSink: Send)]
pub trait LocalNotificationSink {
    async fn notify(&self, message: &str) -> Result<(), SinkError>;
}

/// An external program plus its leading arguments.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ExternalCommand {
    /// Builds a command from `argv` (program first).
    pub fn from_argv(argv: &[String], timeout: Duration) -> Result<Self, SinkError> {
        let (program, args) = argv.split_first().ok_or(SinkError::EmptyCommand)?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            timeout,
        })
    }

    /// Runs the command with an optional trailing argument and optional stdin
    /// payload, waiting for it to exit successfully.
    async fn run(&self, trailing_arg: Option<&str>, input: Option<&str>) -> Result<(), SinkError> {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        if let Some(arg) = trailing_arg {
            cmd.arg(arg);
        }

        let mut child = cmd.spawn().map_err(|source| SinkError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let waited = tokio::time::timeout(self.timeout, self.feed_and_wait(&mut child, input)).await;
        let status = match waited {
            Ok(res) => res?,
            Err(_) => {
                let _ = child.start_kill();
                return Err(SinkError::Timeout {
                    program: self.program.clone(),
                    after: self.timeout,
                });
            }
        };

        if !status.success() {
            return Err(SinkError::Status {
                program: self.program.clone(),
                status,
            });
        }
        debug!("`{}` finished", self.program);
        Ok(())
    }

    async fn feed_and_wait(&self, child: &mut Child, input: Option<&str>) -> Result<ExitStatus, SinkError> {
        let io_err = |source| SinkError::Io {
            program: self.program.clone(),
            source,
        };
        if let (Some(text), Some(mut stdin)) = (input, child.stdin.take()) {
            stdin.write_all(text.as_bytes()).await.map_err(io_err)?;
            // Dropping stdin closes the pipe so the child sees EOF.
            drop(stdin);
        }
        child.wait().await.map_err(io_err)
    }
}

/// Clipboard sink that pipes the text into an external utility's stdin.
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    command: ExternalCommand,
}

impl CommandClipboard {
    pub fn new(command: ExternalCommand) -> Self {
        Self { command }
    }
}

impl ClipboardSink for CommandClipboard {
    async fn set(&self, text: &str) -> Result<(), SinkError> {
        self.command.run(None, Some(text)).await
    }
}

/// Notification sink that passes the message as the final argument.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    command: ExternalCommand,
}

impl CommandNotifier {
    pub fn new(command: ExternalCommand) -> Self {
        Self { command }
    }
}

impl NotificationSink for CommandNotifier {
    async fn notify(&self, message: &str) -> Result<(), SinkError> {
        self.command.run(Some(message), None).await
    }
}

/// Fire-and-forget notification. Its completion is not awaited; a failure is
/// forwarded to the control loop as a fatal event.
pub fn spawn_notification<N>(notifier: &N, message: String, events: mpsc::Sender<DaemonEvent>)
where
    N: NotificationSink + Clone + Sync + 'static,
{
    let notifier = notifier.clone();
    tokio::spawn(async move {
        if let Err(e) = NotificationSink::notify(&notifier, &message).await {
            let _ = events.send(DaemonEvent::Fatal(e.into())).await;
        }
    });
}
