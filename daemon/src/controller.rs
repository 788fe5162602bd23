/// Activation toggle: flips between watching and idle on each toggle message.
///
/// The controller is driven from the daemon's control loop only, one message
/// at a time. A stop always completes before the following start, so at most
/// one watch loop exists at any moment. The watch loop itself never reads the
/// activation state; it only receives start and stop calls.
use std::future::Future;

use tokio::sync::mpsc;
use tracing::info;

use crate::error::DaemonError;
use crate::event::DaemonEvent;
use crate::sink::{spawn_notification, NotificationSink};

pub const ACTIVATED_MESSAGE: &str = "abyssa: activated";
pub const DEACTIVATED_MESSAGE: &str = "abyssa: deactivated";

/// Starts and stops whatever the controller guards (a [`WatchLoop`] in the
/// daemon).
///
/// [`WatchLoop`]: crate::watcher::WatchLoop
pub trait Launcher {
    type Running: Send;

    fn launch(&mut self) -> Result<Self::Running, DaemonError>;

    /// Must not resolve until `running` has fully released its resources.
    fn halt(&mut self, running: Self::Running) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Active,
    Inactive,
}

pub struct Controller<L: Launcher, N> {
    state: Activation,
    running: Option<L::Running>,
    launcher: L,
    notifier: N,
    events: mpsc::Sender<DaemonEvent>,
}

impl<L, N> Controller<L, N>
where
    L: Launcher,
    N: NotificationSink + Clone + Send + Sync + 'static,
{
    /// Creates the controller in its initial `Active` state, launching
    /// immediately.
    pub fn start(
        mut launcher: L,
        notifier: N,
        events: mpsc::Sender<DaemonEvent>,
    ) -> Result<Self, DaemonError> {
        let running = launcher.launch()?;
        let controller = Self {
            state: Activation::Active,
            running: Some(running),
            launcher,
            notifier,
            events,
        };
        controller.announce(ACTIVATED_MESSAGE);
        Ok(controller)
    }

    pub fn state(&self) -> Activation {
        self.state
    }

    /// Handles one toggle message and returns the new state.
    pub async fn toggle(&mut self) -> Result<Activation, DaemonError> {
        match self.state {
            Activation::Active => {
                self.halt().await;
                self.state = Activation::Inactive;
                info!("Deactivated");
                self.announce(DEACTIVATED_MESSAGE);
            }
            Activation::Inactive => {
                self.running = Some(self.launcher.launch()?);
                self.state = Activation::Active;
                info!("Activated");
                self.announce(ACTIVATED_MESSAGE);
            }
        }
        Ok(self.state)
    }

    /// Stops the guarded loop, if any, without changing the reported state.
    pub async fn shutdown(&mut self) {
        self.halt().await;
    }

    async fn halt(&mut self) {
        if let Some(running) = self.running.take() {
            self.launcher.halt(running).await;
        }
    }

    fn announce(&self, message: &str) {
        spawn_notification(&self.notifier, message.to_string(), self.events.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{wait_until, Journal, RecordingNotifier};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Journals launches and halts; panics if a launch overlaps a live run.
    struct FakeLauncher {
        journal: Journal,
        live: Arc<AtomicUsize>,
        launched: usize,
        fail_next: bool,
    }

    struct FakeRun {
        id: usize,
        live: Arc<AtomicUsize>,
    }

    impl FakeLauncher {
        fn new(journal: &Journal) -> Self {
            Self {
                journal: journal.clone(),
                live: Arc::new(AtomicUsize::new(0)),
                launched: 0,
                fail_next: false,
            }
        }
    }

    impl Launcher for FakeLauncher {
        type Running = FakeRun;

        fn launch(&mut self) -> Result<FakeRun, DaemonError> {
            if std::mem::take(&mut self.fail_next) {
                return Err(DaemonError::Watch("cannot subscribe".into()));
            }
            assert_eq!(self.live.fetch_add(1, Ordering::SeqCst), 0, "overlapping runs");
            self.launched += 1;
            self.journal.push(format!("launch:{}", self.launched));
            Ok(FakeRun {
                id: self.launched,
                live: Arc::clone(&self.live),
            })
        }

        fn halt(&mut self, running: FakeRun) -> impl Future<Output = ()> + Send {
            let journal = self.journal.clone();
            async move {
                // Release takes a while; the next launch must wait for it.
                tokio::time::sleep(Duration::from_millis(20)).await;
                running.live.fetch_sub(1, Ordering::SeqCst);
                journal.push(format!("halt:{}", running.id));
            }
        }
    }

    fn controller(journal: &Journal) -> (Controller<FakeLauncher, RecordingNotifier>, mpsc::Receiver<DaemonEvent>) {
        let (tx, rx) = mpsc::channel(8);
        let c = Controller::start(FakeLauncher::new(journal), RecordingNotifier::new(journal), tx).unwrap();
        (c, rx)
    }

    async fn notifications(journal: &Journal, n: usize) -> Vec<String> {
        wait_until(Duration::from_secs(2), || journal.with_prefix("notify:").len() >= n).await;
        journal.with_prefix("notify:")
    }

    #[tokio::test]
    async fn starts_active_and_launched() {
        let journal = Journal::default();
        let (c, _rx) = controller(&journal);

        assert_eq!(c.state(), Activation::Active);
        assert_eq!(journal.with_prefix("launch:"), ["1"]);
        assert_eq!(notifications(&journal, 1).await, [ACTIVATED_MESSAGE]);
    }

    #[tokio::test]
    async fn toggle_flips_state_and_announces() {
        let journal = Journal::default();
        let (mut c, _rx) = controller(&journal);

        assert_eq!(c.toggle().await.unwrap(), Activation::Inactive);
        assert_eq!(notifications(&journal, 2).await[1], DEACTIVATED_MESSAGE);

        assert_eq!(c.toggle().await.unwrap(), Activation::Active);
        assert_eq!(notifications(&journal, 3).await[2], ACTIVATED_MESSAGE);
    }

    #[tokio::test]
    async fn toggling_twice_stops_then_starts_without_overlap() {
        let journal = Journal::default();
        let (mut c, _rx) = controller(&journal);

        c.toggle().await.unwrap();
        c.toggle().await.unwrap();
        c.toggle().await.unwrap();
        c.toggle().await.unwrap();

        let runs: Vec<String> = journal
            .entries()
            .into_iter()
            .filter(|e| e.starts_with("launch:") || e.starts_with("halt:"))
            .collect();
        assert_eq!(runs, ["launch:1", "halt:1", "launch:2", "halt:2", "launch:3"]);
    }

    #[tokio::test]
    async fn shutdown_halts_active_run() {
        let journal = Journal::default();
        let (mut c, _rx) = controller(&journal);

        c.shutdown().await;

        assert_eq!(journal.with_prefix("halt:"), ["1"]);
    }

    #[tokio::test]
    async fn shutdown_while_inactive_halts_nothing_twice() {
        let journal = Journal::default();
        let (mut c, _rx) = controller(&journal);

        c.toggle().await.unwrap();
        c.shutdown().await;

        assert_eq!(journal.with_prefix("halt:"), ["1"]);
    }

    #[tokio::test]
    async fn failed_launch_leaves_controller_inactive() {
        let journal = Journal::default();
        let (mut c, _rx) = controller(&journal);
        c.toggle().await.unwrap();
        c.launcher.fail_next = true;

        assert!(c.toggle().await.is_err());
        assert_eq!(c.state(), Activation::Inactive);
    }

    #[tokio::test]
    async fn broken_notifier_reports_fatal_event() {
        let journal = Journal::default();
        let (tx, mut rx) = mpsc::channel(8);
        let _c = Controller::start(
            FakeLauncher::new(&journal),
            RecordingNotifier::failing(&journal),
            tx,
        )
        .unwrap();

        assert!(matches!(rx.recv().await, Some(DaemonEvent::Fatal(DaemonError::Sink(_)))));
    }
}
