//! Background polling of `GET /jobs/{id}` until a job settles.
//!
//! One spawned task per started job. Fetches are sequential: the next fetch is
//! scheduled `interval` after the previous one completes, so slow responses
//! never overlap.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::client::Client;
use crate::config::Config;
use crate::error::MediaToolsError;
use crate::types::job::JobPayload;

/// Lower bound on the delay between two fetches
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(800);
/// Delay used when none is requested
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1500);

/// Options for a [`JobPoller`]
#[derive(Clone, Copy, Debug)]
pub struct PollOptions {
    /// Requested delay between fetches; clamped to [`MIN_POLL_INTERVAL`]
    pub interval: Duration,
    /// Halt on the first failed fetch instead of polling through it
    pub stop_on_error: bool,
    /// Event channel capacity
    pub capacity: usize,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            stop_on_error: false,
            capacity: 64,
        }
    }
}

impl PollOptions {
    /// Sets the requested interval
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Halts polling on the first failed fetch
    #[must_use]
    pub const fn with_stop_on_error(mut self, stop: bool) -> Self {
        self.stop_on_error = stop;
        self
    }

    /// The delay actually used between fetches
    #[must_use]
    pub fn effective_interval(&self) -> Duration {
        self.interval.max(MIN_POLL_INTERVAL)
    }
}

/// Lifecycle of a [`JobPoller`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PollerState {
    /// Never started
    #[default]
    Idle,
    /// A job is being polled
    Polling,
    /// Stopped by the caller, a terminal status, or a failure with `stop_on_error`
    Stopped,
}

/// Something observed while polling
#[derive(Debug)]
pub enum PollEvent {
    /// A non-terminal job record
    Update(JobPayload),
    /// A fetch failed; polling continues unless `stop_on_error` is set
    Failed(MediaToolsError),
    /// The job reached `done`, `error` or `canceled`; nothing follows
    Finished(JobPayload),
}

impl PollEvent {
    /// The job record carried by the event, if any
    #[must_use]
    pub const fn job(&self) -> Option<&JobPayload> {
        match self {
            Self::Update(job) | Self::Finished(job) => Some(job),
            Self::Failed(_) => None,
        }
    }
}

struct Run {
    job_id: String,
    cancel: CancellationToken,
    _task: JoinHandle<()>,
}

/// Polls one job at a time on a background task.
///
/// Dropping the poller cancels the task.
pub struct JobPoller<C: Config + Clone + 'static> {
    client: Client<C>,
    options: PollOptions,
    state: Arc<watch::Sender<PollerState>>,
    run: Option<Run>,
}

impl<C: Config + Clone + 'static> JobPoller<C> {
    /// Creates an idle poller that fetches through `client`
    #[must_use]
    pub fn new(client: Client<C>, options: PollOptions) -> Self {
        let (state, _) = watch::channel(PollerState::Idle);
        Self {
            client,
            options,
            state: Arc::new(state),
            run: None,
        }
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> PollerState {
        *self.state.borrow()
    }

    /// Subscribes to lifecycle changes
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<PollerState> {
        self.state.subscribe()
    }

    /// Id of the job most recently started
    #[must_use]
    pub fn job_id(&self) -> Option<&str> {
        self.run.as_ref().map(|r| r.job_id.as_str())
    }

    /// Options in effect
    #[must_use]
    pub const fn options(&self) -> &PollOptions {
        &self.options
    }

    /// Starts polling `job_id`, stopping any job already being polled.
    ///
    /// The first fetch is issued immediately. Events arrive on the returned
    /// channel, which closes once polling ends.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a blank id or a misconfigured client.
    /// Nothing is spawned in that case.
    pub fn start(&mut self, job_id: &str) -> Result<mpsc::Receiver<PollEvent>, MediaToolsError> {
        let job_id = job_id.trim();
        if job_id.is_empty() {
            return Err(MediaToolsError::Config("Job id must not be empty".into()));
        }
        self.client.api_base()?;
        self.client.config().validate_auth()?;

        self.stop();

        let (tx, rx) = mpsc::channel(self.options.capacity.max(1));
        let cancel = CancellationToken::new();
        self.state.send_replace(PollerState::Polling);

        let task = tokio::spawn(poll_loop(
            self.client.clone(),
            job_id.to_string(),
            self.options,
            tx,
            cancel.clone(),
            Arc::clone(&self.state),
        ));

        tracing::info!(
            job_id,
            interval = ?self.options.effective_interval(),
            "polling started"
        );
        self.run = Some(Run {
            job_id: job_id.to_string(),
            cancel,
            _task: task,
        });
        Ok(rx)
    }

    /// Stops polling. Idempotent; does nothing before the first `start`.
    pub fn stop(&mut self) {
        let Some(run) = &self.run else {
            return;
        };
        if !run.cancel.is_cancelled() {
            run.cancel.cancel();
            tracing::info!(job_id = %run.job_id, "polling stopped");
        }
        self.state.send_if_modified(|s| {
            if *s == PollerState::Polling {
                *s = PollerState::Stopped;
                true
            } else {
                false
            }
        });
    }
}

impl<C: Config + Clone + 'static> Drop for JobPoller<C> {
    fn drop(&mut self) {
        if let Some(run) = &self.run {
            run.cancel.cancel();
        }
    }
}

impl<C: Config + Clone + 'static> std::fmt::Debug for JobPoller<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobPoller")
            .field("options", &self.options)
            .field("state", &self.state())
            .field("job_id", &self.job_id())
            .finish_non_exhaustive()
    }
}

/// Marks the run stopped unless it was already cancelled.
///
/// The check runs under the watch lock, so a cancelled run can never overwrite
/// the state of the run that replaced it.
fn settle(state: &watch::Sender<PollerState>, cancel: &CancellationToken) {
    state.send_if_modified(|s| {
        if cancel.is_cancelled() || *s == PollerState::Stopped {
            false
        } else {
            *s = PollerState::Stopped;
            true
        }
    });
}

async fn emit(tx: &mpsc::Sender<PollEvent>, cancel: &CancellationToken, event: PollEvent) -> bool {
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        sent = tx.send(event) => sent.is_ok(),
    }
}

async fn poll_loop<C: Config + Clone + 'static>(
    client: Client<C>,
    job_id: String,
    options: PollOptions,
    tx: mpsc::Sender<PollEvent>,
    cancel: CancellationToken,
    state: Arc<watch::Sender<PollerState>>,
) {
    let interval = options.effective_interval();
    let jobs = client.jobs();

    loop {
        let fetched = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            r = jobs.get(&job_id) => r,
        };

        match fetched {
            Ok(job) if job.status.is_terminal() => {
                tracing::debug!(job_id = %job_id, status = %job.status, "job settled");
                settle(&state, &cancel);
                emit(&tx, &cancel, PollEvent::Finished(job)).await;
                return;
            }
            Ok(job) => {
                tracing::trace!(job_id = %job_id, status = %job.status, progress = ?job.progress, "job update");
                if !emit(&tx, &cancel, PollEvent::Update(job)).await {
                    settle(&state, &cancel);
                    return;
                }
            }
            Err(e) => {
                tracing::warn!(job_id = %job_id, error = %e, "job fetch failed");
                if options.stop_on_error {
                    settle(&state, &cancel);
                    emit(&tx, &cancel, PollEvent::Failed(e)).await;
                    return;
                }
                if !emit(&tx, &cancel, PollEvent::Failed(e)).await {
                    settle(&state, &cancel);
                    return;
                }
            }
        }

        tokio::select! {
            () = tokio::time::sleep(interval) => {}
            () = cancel.cancelled() => return,
        }
    }
}
