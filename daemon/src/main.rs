mod config;
mod control;
mod controller;
mod error;
mod event;
mod logging;
mod normalize;
mod paths;
mod pid;
mod pipeline;
mod recognize;
mod signals;
mod sink;
#[cfg(test)]
mod test_utils;
mod watcher;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::{Config, SinkConfig};
use crate::control::Mode;
use crate::controller::Controller;
use crate::error::{DaemonError, SinkError};
use crate::event::DaemonEvent;
use crate::normalize::SizeNormalizer;
use crate::pipeline::Pipeline;
use crate::recognize::{RecognitionAdapter, Tesseract};
use crate::sink::{CommandClipboard, CommandNotifier, ExternalCommand, NotificationSink};
use crate::watcher::WatchLauncher;

/// Copies the text found in new screenshots to the clipboard.
#[derive(Debug, Parser)]
#[command(name = "abyssa", version, about)]
struct Cli {
    /// `daemon` runs the watcher, `kill` terminates a running daemon, and
    /// anything else (including nothing) toggles it.
    mode: Option<String>,

    /// Config file to use instead of the default location.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    logging::init();
    let cli = Cli::parse();

    // ── Configuration ─────────────────────────────────────────────────────────
    let config_path = cli.config.unwrap_or_else(paths::config_file_path);
    let config = match config::load_or_default(&config_path) {
        Ok(config) => config,
        Err(e) => {
            // The configured notifier is unknown here; use the stock one.
            let fallback = notifier_for(&SinkConfig::default()).ok();
            report_fatal(fallback.as_ref(), &e).await;
            std::process::exit(1);
        }
    };
    debug!("Loaded config from {}: {config:?}", config_path.display());

    let notifier = match notifier_for(&config.sinks) {
        Ok(notifier) => notifier,
        Err(e) => {
            report_fatal(None, &anyhow::Error::from(e)).await;
            std::process::exit(1);
        }
    };

    // ── Dispatch ──────────────────────────────────────────────────────────────
    let result = match Mode::from_arg(cli.mode.as_deref()) {
        Mode::Daemon => run_daemon(config, notifier.clone())
            .await
            .context("daemon stopped"),
        Mode::Control(msg) => control::send(&config.daemon.pid_file, msg)
            .map(|_| ())
            .with_context(|| format!("could not {}", msg.describe())),
    };

    if let Err(e) = result {
        report_fatal(Some(&notifier), &e).await;
        std::process::exit(1);
    }
}

/// Runs the daemon until a shutdown signal or a fatal error.
async fn run_daemon(config: Config, notifier: CommandNotifier) -> Result<(), DaemonError> {
    let (event_tx, mut event_rx) = mpsc::channel::<DaemonEvent>(32);

    // Handlers go in before the pid is published so an early toggle is not
    // delivered to a process that would die from it.
    signals::listen(event_tx.clone()).map_err(DaemonError::Signals)?;

    let pid_file = &config.daemon.pid_file;
    pid::write(pid_file, std::process::id()).map_err(|source| DaemonError::PidRecord {
        path: pid_file.clone(),
        source,
    })?;

    let clipboard = CommandClipboard::new(ExternalCommand::from_argv(
        &config.sinks.clipboard_command,
        config.sinks.timeout(),
    )?);
    let pipeline = Pipeline::new(
        SizeNormalizer::new(config.ocr.area_lower_bound, config.ocr.scale_damping),
        RecognitionAdapter::new(Tesseract::new(&config.ocr.language), config.ocr.timeout()),
        clipboard,
        notifier.clone(),
    );
    let launcher = WatchLauncher::new(
        config.daemon.watch_dir.clone(),
        config.daemon.poll_interval(),
        pipeline,
        event_tx.clone(),
    );
    let mut controller = Controller::start(launcher, notifier, event_tx)?;

    info!(
        "abyssa v{} started (pid {}, watching {})",
        env!("CARGO_PKG_VERSION"),
        std::process::id(),
        config.daemon.watch_dir.display()
    );

    // ── Event loop ────────────────────────────────────────────────────────────
    while let Some(evt) = event_rx.recv().await {
        match evt {
            DaemonEvent::Toggle => {
                let state = controller.toggle().await?;
                debug!("Now {state:?}");
            }
            DaemonEvent::Fatal(e) => return Err(e),
            DaemonEvent::Shutdown => {
                info!("Shutting down ({:?})", controller.state());
                controller.shutdown().await;
                break;
            }
        }
    }

    Ok(())
}

fn notifier_for(sinks: &SinkConfig) -> Result<CommandNotifier, SinkError> {
    ExternalCommand::from_argv(&sinks.notify_command, sinks.timeout()).map(CommandNotifier::new)
}

/// Logs the error and makes a best-effort attempt to show it on the desktop.
async fn report_fatal(notifier: Option<&CommandNotifier>, err: &anyhow::Error) {
    error!("{err:#}");
    if let Some(notifier) = notifier {
        if let Err(e) = notifier.notify(&format!("abyssa: {err:#}")).await {
            warn!("Could not show error notification: {e}");
        }
    }
}
