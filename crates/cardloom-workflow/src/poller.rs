/*
[INPUT]:  TaskSource (remote client or local manager), task id, PollConfig, CancellationToken
[OUTPUT]: PollOutcome once the task reaches a target/terminal status, is cancelled, or times out; watch updates per read
[POS]:    Polling layer - client-side convergence on backend-driven task status
[UPDATE]: When changing poll cadence, stop conditions, or read-error handling
*/

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use cardloom_adapter::{Result, Task, TaskSource, TaskStatus};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    /// Give up after this long; `None` polls until terminal or cancelled
    pub max_duration: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_duration: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The requested status was observed
    Reached(Task),
    /// A terminal status other than the requested one was observed
    Terminal(Task),
    /// The task moved beyond the requested status without stopping on it
    Passed(Task),
    Cancelled { last: Option<Task> },
    TimedOut { last: Option<Task> },
}

impl PollOutcome {
    /// Latest snapshot observed before the poll stopped
    pub fn task(&self) -> Option<&Task> {
        match self {
            PollOutcome::Reached(task)
            | PollOutcome::Terminal(task)
            | PollOutcome::Passed(task) => Some(task),
            PollOutcome::Cancelled { last } | PollOutcome::TimedOut { last } => last.as_ref(),
        }
    }
}

/// Reads a task at a fixed interval until it settles.
///
/// The first read happens immediately. Reads are the only side effect, and
/// none is issued or published after the token is cancelled.
#[derive(Debug)]
pub struct TaskPoller {
    config: PollConfig,
    updates: watch::Sender<Option<Task>>,
}

impl TaskPoller {
    pub fn new(config: PollConfig) -> Self {
        let (updates, _rx) = watch::channel(None);
        Self { config, updates }
    }

    pub fn config(&self) -> PollConfig {
        self.config
    }

    /// Every snapshot read by this poller, latest first
    pub fn subscribe(&self) -> watch::Receiver<Option<Task>> {
        self.updates.subscribe()
    }

    /// Poll until `completed` or `failed`.
    pub async fn poll_until_terminal<S>(
        &self,
        source: &S,
        task_id: &str,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome>
    where
        S: TaskSource + ?Sized,
    {
        self.run(source, task_id, None, cancel).await
    }

    /// Poll until `target` is observed, stopping early on any terminal status
    /// or once the task has moved past `target`.
    pub async fn poll_until<S>(
        &self,
        source: &S,
        task_id: &str,
        target: TaskStatus,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome>
    where
        S: TaskSource + ?Sized,
    {
        self.run(source, task_id, Some(target), cancel).await
    }

    async fn run<S>(
        &self,
        source: &S,
        task_id: &str,
        target: Option<TaskStatus>,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome>
    where
        S: TaskSource + ?Sized,
    {
        let deadline = self.config.max_duration.map(|limit| Instant::now() + limit);
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last: Option<Task> = None;
        let mut reads: u64 = 0;

        info!(
            task_id,
            target = ?target,
            interval_ms = self.config.interval.as_millis() as u64,
            "polling task"
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(task_id, reads, "polling cancelled");
                    return Ok(PollOutcome::Cancelled { last });
                }
                _ = wait_for(deadline) => {
                    warn!(task_id, reads, "polling timed out");
                    return Ok(PollOutcome::TimedOut { last });
                }
                _ = ticker.tick() => {}
            }

            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(task_id, reads, "polling cancelled during read");
                    return Ok(PollOutcome::Cancelled { last });
                }
                _ = wait_for(deadline) => {
                    warn!(task_id, reads, "polling timed out during read");
                    return Ok(PollOutcome::TimedOut { last });
                }
                result = source.fetch_task(task_id) => result,
            };
            reads += 1;

            let task = match fetched {
                Ok(task) => task,
                Err(err) if err.is_transient() => {
                    warn!(task_id, error = %err, "task read failed, retrying next tick");
                    continue;
                }
                Err(err) => return Err(err),
            };

            debug!(task_id, status = %task.status, reads, "task observed");
            self.updates.send_replace(Some(task.clone()));

            if Some(task.status) == target {
                return Ok(PollOutcome::Reached(task));
            }
            if task.is_terminal() {
                return Ok(PollOutcome::Terminal(task));
            }
            if let Some(target) = target.filter(|target| task.status.has_passed(*target)) {
                info!(task_id, status = %task.status, %target, "task moved past target");
                return Ok(PollOutcome::Passed(task));
            }
            last = Some(task);
        }
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
