/// OS signal binding for the daemon's control channel
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::info;

use crate::event::DaemonEvent;

/// Installs handlers for SIGUSR1 (toggle) and SIGINT/SIGTERM (shutdown) and
/// forwards them to `tx`.
///
/// Handlers are registered before this returns, so the process no longer
/// dies on SIGUSR1 from that point on. SIGKILL cannot be handled and ends the
/// process immediately.
pub fn listen(tx: mpsc::Sender<DaemonEvent>) -> std::io::Result<()> {
    let mut toggle = signal(SignalKind::user_defined1())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                Some(()) = toggle.recv() => {
                    info!("Received SIGUSR1");
                    DaemonEvent::Toggle
                }
                Some(()) = sigint.recv() => {
                    info!("Received SIGINT");
                    DaemonEvent::Shutdown
                }
                Some(()) = sigterm.recv() => {
                    info!("Received SIGTERM");
                    DaemonEvent::Shutdown
                }
                else => break,
            };
            if tx.send(event).await.is_err() {
                break;
            }
        }
    });

    Ok(())
}
