//! Background poll loop.
//!
//! The poller runs on its own thread with a current-thread tokio runtime.
//! Each cycle fetches one snapshot and hands it to the UI thread as a
//! [`PollOutcome`] over a std channel; the UI thread owns the store and does
//! all diffing and merging. Between cycles the loop sleeps for the update
//! interval, or wakes early on [`PollCommand::RefreshNow`].

use std::sync::Arc;
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use stormwatch_core::AlertRecord;
use stormwatch_fetch::{AlertSource, FetchError};
use tokio::sync::mpsc as async_mpsc;
use tracing::{debug, info, warn};

/// Why a cycle ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollKind {
    /// The first fetch after startup
    Initial,
    /// A timer-driven cycle
    Scheduled,
    /// A cycle requested by the user
    Refresh,
}

/// The result of one poll cycle.
#[derive(Debug)]
pub struct PollOutcome {
    /// 1-based cycle number
    pub cycle: u64,
    pub kind: PollKind,
    pub result: Result<Vec<AlertRecord>, FetchError>,
    /// How long the fetch took
    pub elapsed: Duration,
}

/// Commands from the UI thread to the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollCommand {
    /// Fetch now and restart the interval
    RefreshNow,
    /// End the loop
    Stop,
}

/// What to fetch and how often.
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub interval: Duration,
    pub areas: Vec<String>,
    pub events: Vec<String>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            areas: Vec::new(),
            events: Vec::new(),
        }
    }
}

/// Run the poll loop until stopped or until the outcome receiver is gone.
///
/// Fetch failures are logged and reported as outcomes; they never end the
/// loop. The first fetch happens immediately.
pub async fn run_poll_loop(
    source: Arc<dyn AlertSource>,
    settings: PollSettings,
    outcomes: mpsc::Sender<PollOutcome>,
    mut commands: async_mpsc::UnboundedReceiver<PollCommand>,
) {
    info!(
        source = source.name(),
        interval_secs = settings.interval.as_secs_f64(),
        areas = ?settings.areas,
        events = ?settings.events,
        "poll loop started"
    );

    let mut commands_open = true;
    let mut kind = PollKind::Initial;
    let mut cycle = 0u64;

    loop {
        cycle += 1;
        let started = Instant::now();
        let result = source.fetch(&settings.areas, &settings.events).await;
        let elapsed = started.elapsed();

        match &result {
            Ok(records) => debug!(cycle, ?kind, count = records.len(), ?elapsed, "poll cycle fetched"),
            Err(e) => warn!(
                cycle,
                ?kind,
                error = %e,
                hint = %e.friendly_message(),
                "poll cycle failed, keeping current alerts"
            ),
        }

        let outcome = PollOutcome {
            cycle,
            kind,
            result,
            elapsed,
        };
        if outcomes.send(outcome).is_err() {
            debug!("outcome receiver dropped, stopping poll loop");
            break;
        }

        let next = if commands_open {
            tokio::select! {
                _ = tokio::time::sleep(settings.interval) => Some(PollKind::Scheduled),
                command = commands.recv() => match command {
                    Some(PollCommand::RefreshNow) => coalesce_refreshes(&mut commands),
                    Some(PollCommand::Stop) => None,
                    None => {
                        commands_open = false;
                        tokio::time::sleep(settings.interval).await;
                        Some(PollKind::Scheduled)
                    }
                },
            }
        } else {
            tokio::time::sleep(settings.interval).await;
            Some(PollKind::Scheduled)
        };

        match next {
            Some(next) => kind = next,
            None => break,
        }
    }

    info!(cycles = cycle, "poll loop stopped");
}

/// Serve one refresh for every request queued so far. A queued stop wins.
fn coalesce_refreshes(commands: &mut async_mpsc::UnboundedReceiver<PollCommand>) -> Option<PollKind> {
    let mut skipped = 0usize;
    while let Ok(command) = commands.try_recv() {
        match command {
            PollCommand::RefreshNow => skipped += 1,
            PollCommand::Stop => return None,
        }
    }
    if skipped > 0 {
        debug!(skipped, "coalesced queued refresh requests");
    }
    Some(PollKind::Refresh)
}

/// Errors starting the poller.
#[derive(Debug, thiserror::Error)]
pub enum PollerError {
    #[error("Failed to create poller runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("Failed to spawn poller thread: {0}")]
    Thread(#[source] std::io::Error),
}

/// UI-side handle to a running poller thread.
pub struct PollerHandle {
    outcomes: mpsc::Receiver<PollOutcome>,
    commands: async_mpsc::UnboundedSender<PollCommand>,
    thread: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Start polling `source` on a background thread.
    pub fn spawn(source: Arc<dyn AlertSource>, settings: PollSettings) -> Result<Self, PollerError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(PollerError::Runtime)?;

        let (outcome_tx, outcome_rx) = mpsc::channel();
        let (command_tx, command_rx) = async_mpsc::unbounded_channel();

        let thread = std::thread::Builder::new()
            .name("stormwatch-poller".to_string())
            .spawn(move || {
                runtime.block_on(run_poll_loop(source, settings, outcome_tx, command_rx));
            })
            .map_err(PollerError::Thread)?;

        Ok(Self {
            outcomes: outcome_rx,
            commands: command_tx,
            thread: Some(thread),
        })
    }

    /// Next outcome, if one is waiting.
    pub fn try_recv(&self) -> Option<PollOutcome> {
        self.outcomes.try_recv().ok()
    }

    /// Block up to `timeout` for the next outcome.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<PollOutcome> {
        self.outcomes.recv_timeout(timeout).ok()
    }

    /// Ask for an immediate fetch.
    pub fn request_refresh(&self) {
        if self.commands.send(PollCommand::RefreshNow).is_err() {
            warn!("poller is not running, refresh ignored");
        }
    }

    /// Stop the loop and wait for the thread when it is idle.
    ///
    /// A fetch in flight is not interrupted, so this does not join; the
    /// thread exits on its own once it sees the command.
    pub fn stop(&mut self) {
        let _ = self.commands.send(PollCommand::Stop);
        if let Some(thread) = self.thread.take() {
            if thread.is_finished() {
                let _ = thread.join();
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
