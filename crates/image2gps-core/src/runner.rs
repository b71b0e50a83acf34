//! Real-time driver for a [`Coordinator`].
//!
//! The coordinator keeps virtual time; this module maps it onto the tokio
//! clock. One task owns the coordinator and is the only writer. It:
//!
//! - **Sleeps** until the next timer deadline and fires every timer that is
//!   due, one at a time, publishing a snapshot after each.
//! - **Selects** on command: a [`Command::Select`] tears the old session
//!   down and arms the new one inside the same turn of the loop, so no old
//!   timer can fire in between.
//! - **Publishes** through a [`watch`] channel. Readers get the latest
//!   snapshot and never block the driver.
//! - **Stops** on [`Command::Shutdown`] or when every handle is dropped.

use image2gps_types::{Record, SessionSnapshot};
use rand::Rng;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::{debug, info};

use crate::coordinator::{Coordinator, CoordinatorError};

/// Capacity of the command channel.
const COMMAND_CAPACITY: usize = 32;

/// Errors that can occur while running a session loop.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The coordinator failed to schedule a timer.
    #[error("coordinator error: {source}")]
    Coordinator {
        /// The underlying coordinator error.
        #[from]
        source: CoordinatorError,
    },

    /// The driver task is gone, so the command could not be delivered.
    #[error("session driver is no longer running")]
    ChannelClosed,
}

/// A request to the driver task.
#[derive(Debug, Clone)]
pub enum Command {
    /// Start a new pipeline for this record.
    Select(Box<Record>),
    /// Tear everything down and stop the driver.
    Shutdown,
}

/// Why the driver stopped and what it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Selections applied.
    pub selections: u64,
    /// Timers fired (including stale ones that were ignored).
    pub timers_fired: u64,
    /// Virtual time at shutdown.
    pub final_ms: u64,
}

/// Client side of a running session driver.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Ask the driver to start a new pipeline for `record`.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::ChannelClosed`] if the driver has stopped.
    pub async fn select(&self, record: Record) -> Result<(), RunnerError> {
        self.send(Command::Select(Box::new(record))).await
    }

    /// Ask the driver to shut down.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::ChannelClosed`] if the driver has stopped.
    pub async fn shutdown(&self) -> Result<(), RunnerError> {
        self.send(Command::Shutdown).await
    }

    async fn send(&self, command: Command) -> Result<(), RunnerError> {
        self.commands
            .send(command)
            .await
            .map_err(|_closed| RunnerError::ChannelClosed)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A fresh receiver for snapshot updates.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }
}

/// Spawn a driver task that owns `coordinator`.
///
/// Returns the handle used to send selections and read snapshots, plus the
/// task's join handle.
pub fn spawn<R>(
    coordinator: Coordinator<R>,
) -> (SessionHandle, JoinHandle<Result<RunSummary, RunnerError>>)
where
    R: Rng + Send + 'static,
{
    let (command_tx, mut command_rx) = mpsc::channel(COMMAND_CAPACITY);
    let (snapshot_tx, snapshot_rx) = watch::channel(coordinator.snapshot());

    let task = tokio::spawn(async move {
        let mut coordinator = coordinator;
        run_session(&mut coordinator, &mut command_rx, &snapshot_tx).await
    });

    let handle = SessionHandle {
        commands: command_tx,
        snapshots: snapshot_rx,
    };
    (handle, task)
}

/// Drive `coordinator` until shutdown.
///
/// Virtual millisecond `t` corresponds to `start + t` on the tokio clock,
/// where `start` is the instant this function is entered.
///
/// # Errors
///
/// Returns [`RunnerError::Coordinator`] if a timer cannot be scheduled.
pub async fn run_session<R: Rng>(
    coordinator: &mut Coordinator<R>,
    commands: &mut mpsc::Receiver<Command>,
    publisher: &watch::Sender<SessionSnapshot>,
) -> Result<RunSummary, RunnerError> {
    let now = Instant::now();
    let origin = now
        .checked_sub(Duration::from_millis(coordinator.now_ms()))
        .unwrap_or(now);
    let mut selections: u64 = 0;
    let mut timers_fired: u64 = 0;

    info!(now_ms = coordinator.now_ms(), "Session driver starting");

    loop {
        let wake_at = coordinator
            .next_deadline()
            .and_then(|deadline| origin.checked_add(Duration::from_millis(deadline)));

        tokio::select! {
            biased;

            command = commands.recv() => {
                // Timers that came due before the command are applied first.
                let fired = fire_due(coordinator, publisher, elapsed_ms(origin))?;
                timers_fired = timers_fired.saturating_add(fired);

                match command {
                    Some(Command::Select(record)) => {
                        let generation = coordinator.select(&record)?;
                        selections = selections.saturating_add(1);
                        debug!(sample = %record.id, generation = %generation, "Selection applied");
                        publisher.send_replace(coordinator.snapshot());
                    }
                    Some(Command::Shutdown) | None => {
                        coordinator.shutdown();
                        publisher.send_replace(coordinator.snapshot());
                        let summary = RunSummary {
                            selections,
                            timers_fired,
                            final_ms: coordinator.now_ms(),
                        };
                        log_run_end(&summary);
                        return Ok(summary);
                    }
                }
            }

            () = sleep_until(wake_at), if wake_at.is_some() => {
                let fired = fire_due(coordinator, publisher, elapsed_ms(origin))?;
                timers_fired = timers_fired.saturating_add(fired);
            }
        }
    }
}

/// Fire everything due at `now_ms`, publishing after each timer, then move
/// the virtual clock to `now_ms`.
fn fire_due<R: Rng>(
    coordinator: &mut Coordinator<R>,
    publisher: &watch::Sender<SessionSnapshot>,
    now_ms: u64,
) -> Result<u64, CoordinatorError> {
    let mut fired: u64 = 0;
    while coordinator.step(now_ms)?.is_some() {
        fired = fired.saturating_add(1);
        publisher.send_replace(coordinator.snapshot());
    }
    coordinator.sync_clock(now_ms);
    Ok(fired)
}

async fn sleep_until(deadline: Option<Instant>) {
    if let Some(deadline) = deadline {
        tokio::time::sleep_until(deadline).await;
    }
}

fn elapsed_ms(origin: Instant) -> u64 {
    u64::try_from(origin.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Log how the driver ended.
pub fn log_run_end(summary: &RunSummary) {
    info!(
        selections = summary.selections,
        timers_fired = summary.timers_fired,
        final_ms = summary.final_ms,
        "Session driver stopped"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image2gps_samples::SampleRegistry;
    use image2gps_types::Stage;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::config::TimingConfig;
    use crate::formatter::format_record;

    fn registry() -> SampleRegistry {
        SampleRegistry::penn_engineering().unwrap()
    }

    fn coordinator(seed: u64) -> Coordinator {
        Coordinator::new(TimingConfig::default(), SmallRng::seed_from_u64(seed))
    }

    /// Wait until a snapshot satisfies `pred`, returning it.
    async fn wait_for(
        rx: &mut watch::Receiver<SessionSnapshot>,
        pred: impl Fn(&SessionSnapshot) -> bool,
    ) -> SessionSnapshot {
        rx.wait_for(pred).await.unwrap().clone()
    }

    #[tokio::test(start_paused = true)]
    async fn runs_a_selection_to_idle() {
        let registry = registry();
        let record = registry.default_record().clone();
        let (handle, task) = spawn(coordinator(1));
        let mut rx = handle.subscribe();

        handle.select(record.clone()).await.unwrap();
        let loading = wait_for(&mut rx, |s| s.generation == 1).await;
        assert_eq!(loading.stage, Stage::Loading);

        let done = wait_for(&mut rx, |s| s.generation == 1 && s.stage == Stage::Idle).await;
        assert_eq!(done.progress, 100);
        assert_eq!(done.text, format_record(&record));
        assert!(done.text.contains("39.9515, -75.1911"));

        handle.shutdown().await.unwrap();
        let summary = task.await.unwrap().unwrap();
        assert_eq!(summary.selections, 1);
        assert!(summary.timers_fired > 0);
        assert!(summary.final_ms >= 2600);
    }

    #[tokio::test(start_paused = true)]
    async fn reselecting_mid_load_keeps_only_the_second() {
        let registry = registry();
        let first = registry.get("penn-meyerson-hall").unwrap().clone();
        let second = registry.get("penn-skirkanich-hall").unwrap().clone();
        let (handle, task) = spawn(coordinator(2));
        let mut rx = handle.subscribe();

        handle.select(first).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        handle.select(second.clone()).await.unwrap();

        let done = wait_for(&mut rx, |s| s.generation == 2 && s.stage == Stage::Idle).await;
        assert_eq!(done.text, format_record(&second));
        assert_eq!(done.selection.map(|s| s.id), Some(second.id));

        handle.shutdown().await.unwrap();
        assert_eq!(task.await.unwrap().unwrap().selections, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn published_text_only_grows_within_a_run() {
        let record = registry().default_record().clone();
        let (handle, task) = spawn(coordinator(3));
        let mut rx = handle.subscribe();
        handle.select(record.clone()).await.unwrap();

        let mut last_len = 0;
        loop {
            rx.changed().await.unwrap();
            let snap = rx.borrow_and_update().clone();
            if snap.stage == Stage::Loading {
                assert!(snap.progress <= 95);
                continue;
            }
            assert_eq!(snap.progress, 100);
            let len = snap.text.chars().count();
            assert!(len >= last_len);
            last_len = len;
            if snap.stage == Stage::Idle {
                break;
            }
        }
        assert_eq!(last_len, format_record(&record).chars().count());

        handle.shutdown().await.unwrap();
        task.await.unwrap().unwrap();
    }

    #[test]
    fn fire_due_publishes_each_timer_and_syncs_the_clock() {
        let timing = TimingConfig {
            loading_min_ms: 1_000,
            loading_max_ms: 1_000,
            ..TimingConfig::default()
        };
        let mut c = Coordinator::new(timing, SmallRng::seed_from_u64(6));
        let (publisher, mut rx) = watch::channel(c.snapshot());
        c.select(registry().default_record()).unwrap();

        // Progress ticks at 260, 520 and 780; the clock lands on 900.
        let fired = fire_due(&mut c, &publisher, 900).unwrap();
        assert_eq!(fired, 3);
        assert_eq!(c.now_ms(), 900);
        assert!(rx.has_changed().unwrap());
        let snap = rx.borrow_and_update().clone();
        assert_eq!(snap.stage, Stage::Loading);
        assert!(snap.progress >= 15);

        // Nothing due: clock moves, nothing is published.
        assert_eq!(fire_due(&mut c, &publisher, 950).unwrap(), 0);
        assert_eq!(c.now_ms(), 950);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_the_driver() {
        let (handle, task) = spawn(coordinator(4));
        handle.select(registry().default_record().clone()).await.unwrap();
        drop(handle);
        let summary = task.await.unwrap().unwrap();
        assert_eq!(summary.selections, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn commands_after_shutdown_fail() {
        let (handle, task) = spawn(coordinator(5));
        handle.shutdown().await.unwrap();
        task.await.unwrap().unwrap();
        let result = handle.select(registry().default_record().clone()).await;
        assert!(matches!(result, Err(RunnerError::ChannelClosed)));
    }
}
