/// Directory watch loop: subscribes to create-events and feeds each one
/// through the [`Pipeline`].
///
/// A `WatchLoop` owns its subscription. [`WatchLoop::stop`] returns only after
/// the loop task has exited and the subscription has been dropped, so a new
/// loop can never overlap an old one.
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config as NotifyConfig, EventKind, PollWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::controller::Launcher;
use crate::error::DaemonError;
use crate::event::{DaemonEvent, WatchEvent};
use crate::pipeline::Pipeline;
use crate::recognize::OcrEngine;
use crate::sink::{ClipboardSink, NotificationSink};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Starts polling `dir` for new entries every `poll_interval`.
///
/// The directory is created if missing. Dropping the returned watcher ends the
/// subscription.
pub fn subscribe(
    dir: &Path,
    poll_interval: Duration,
) -> Result<(PollWatcher, mpsc::Receiver<WatchEvent>), DaemonError> {
    std::fs::create_dir_all(dir).map_err(|source| DaemonError::WatchDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let (tx, rx) = mpsc::channel::<WatchEvent>(EVENT_CHANNEL_CAPACITY);
    let mut watcher = PollWatcher::new(
        move |res: notify::Result<notify::Event>| match res {
            Ok(event) if matches!(event.kind, EventKind::Create(_)) => {
                for path in event.paths {
                    let _ = tx.blocking_send(WatchEvent::Created(path));
                }
            }
            Ok(_) => {}
            Err(e) => {
                let _ = tx.blocking_send(WatchEvent::Error(e.to_string()));
            }
        },
        NotifyConfig::default().with_poll_interval(poll_interval),
    )?;
    watcher.watch(dir, RecursiveMode::NonRecursive)?;

    Ok((watcher, rx))
}

/// A running watch loop.
pub struct WatchLoop {
    /// Setting this to `true` asks the loop to exit after the current event.
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl WatchLoop {
    /// Subscribes to `dir` and starts processing its create-events.
    pub fn start<E, C, N>(
        dir: &Path,
        poll_interval: Duration,
        pipeline: Arc<Pipeline<E, C, N>>,
        events: mpsc::Sender<DaemonEvent>,
    ) -> Result<Self, DaemonError>
    where
        E: OcrEngine,
        C: ClipboardSink + Send + Sync + 'static,
        N: NotificationSink + Send + Sync + 'static,
    {
        let (watcher, rx) = subscribe(dir, poll_interval)?;
        info!("Watching {} (poll every {poll_interval:?})", dir.display());
        Ok(Self::spawn(watcher, rx, pipeline, events))
    }

    /// Runs the loop over an existing event stream. `subscription` is held for
    /// the loop's lifetime and dropped when it exits.
    ///
    /// Each event is handled to completion before the next is received. A
    /// pipeline failure or a watch fault is forwarded to `events` as
    /// [`DaemonEvent::Fatal`] and ends the loop.
    pub fn spawn<G, E, C, N>(
        subscription: G,
        mut rx: mpsc::Receiver<WatchEvent>,
        pipeline: Arc<Pipeline<E, C, N>>,
        events: mpsc::Sender<DaemonEvent>,
    ) -> Self
    where
        G: Send + 'static,
        E: OcrEngine,
        C: ClipboardSink + Send + Sync + 'static,
        N: NotificationSink + Send + Sync + 'static,
    {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let _subscription = subscription;
            loop {
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => break,
                    event = rx.recv() => match event {
                        Some(WatchEvent::Created(path)) => {
                            debug!("Created: {}", path.display());
                            if let Err(e) = pipeline.process(&path).await {
                                let _ = events.send(DaemonEvent::Fatal(e)).await;
                                break;
                            }
                        }
                        Some(WatchEvent::Error(msg)) => {
                            let _ = events.send(DaemonEvent::Fatal(DaemonError::Watch(msg))).await;
                            break;
                        }
                        None => break,
                    },
                }
            }
            debug!("Watch loop exited");
        });

        WatchLoop { stop_tx, handle }
    }

    /// Signals the loop to stop and waits until it has released its subscription.
    /// An event already being processed runs to completion first.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.handle.await;
    }
}

/// Launches a fresh [`WatchLoop`] over the configured directory each time the
/// daemon is activated. The pipeline is shared across launches.
pub struct WatchLauncher<E, C, N> {
    dir: PathBuf,
    poll_interval: Duration,
    pipeline: Arc<Pipeline<E, C, N>>,
    events: mpsc::Sender<DaemonEvent>,
}

impl<E, C, N> WatchLauncher<E, C, N> {
    pub fn new(
        dir: PathBuf,
        poll_interval: Duration,
        pipeline: Pipeline<E, C, N>,
        events: mpsc::Sender<DaemonEvent>,
    ) -> Self {
        Self {
            dir,
            poll_interval,
            pipeline: Arc::new(pipeline),
            events,
        }
    }
}

impl<E, C, N> Launcher for WatchLauncher<E, C, N>
where
    E: OcrEngine,
    C: ClipboardSink + Send + Sync + 'static,
    N: NotificationSink + Send + Sync + 'static,
{
    type Running = WatchLoop;

    fn launch(&mut self) -> Result<WatchLoop, DaemonError> {
        WatchLoop::start(
            &self.dir,
            self.poll_interval,
            Arc::clone(&self.pipeline),
            self.events.clone(),
        )
    }

    fn halt(&mut self, running: WatchLoop) -> impl Future<Output = ()> + Send {
        running.stop()
    }
}
