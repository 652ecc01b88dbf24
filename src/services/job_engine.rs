//! The dispatch/detect loop tying a queue to a cluster backend.
//!
//! Each iteration reads backend capacity once, then does exactly one of
//! three things: dispatch the next queued item, handle one channel message,
//! or sleep and sweep for jobs that disappeared without reporting. Vanished
//! jobs are scored as failures before the engine decides whether it is
//! finished, so a sweep can re-seed the queue and keep the run alive.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ChannelMessage, EngineConfig, JobName, Outcome};
use crate::domain::ports::{Item, JobTracker, MessageChannel};
use crate::domain::queues::Queue;
use crate::services::results_log::ResultsLog;

/// Engine loop tuning.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Prefix for generated job names.
    pub name: String,
    /// Sleep between idle liveness polls.
    pub poll_interval: Duration,
    /// Bounded wait for one channel message per iteration.
    pub message_wait: Duration,
}

impl EngineSettings {
    /// Settings taken from the loaded configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            name: config.name.clone(),
            poll_interval: Duration::from_secs_f64(config.poll_interval_secs),
            message_wait: Duration::from_millis(config.message_wait_ms),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            name: "gridforge".to_string(),
            poll_interval: Duration::from_secs(8),
            message_wait: Duration::from_millis(100),
        }
    }
}

/// Event emitted by the engine loop.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Engine loop started.
    Started,
    /// An item was submitted to the backend.
    JobDispatched { name: JobName, command: Vec<String> },
    /// A result message was recorded and fed back to the queue.
    ResultRecorded { name: JobName, score: f64 },
    /// A dispatched job disappeared without reporting a result.
    JobPresumedDead { name: JobName },
    /// Queue state was written to disk.
    QueueSaved { path: PathBuf },
    /// Queue state was restored from disk.
    QueueRestored { path: PathBuf },
    /// Engine loop finished.
    Finished(EngineStats),
}

/// Counters accumulated over one engine run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Jobs handed to the backend.
    pub dispatched: usize,
    /// Result messages recorded.
    pub results: usize,
    /// Jobs scored as failed by the death sweep.
    pub presumed_dead: usize,
}

enum StepOutcome {
    Continue,
    Finished,
}

/// Drives one queue against one job tracker until both are exhausted.
///
/// The engine owns the authoritative name-to-item map: results and death
/// sweeps are resolved through it, and job names are minted from its size,
/// so a name is never reused within a run.
pub struct JobEngine<I: Item> {
    settings: EngineSettings,
    tracker: Arc<dyn JobTracker>,
    queue: Box<dyn Queue<I>>,
    channel: Box<dyn MessageChannel>,
    results: ResultsLog,
    name_to_item: HashMap<JobName, I>,
    dispatched: HashMap<JobName, DateTime<Utc>>,
    stats: EngineStats,
}

impl<I: Item> JobEngine<I> {
    /// Assembles an engine from its injected collaborators.
    pub fn new(
        settings: EngineSettings,
        tracker: Arc<dyn JobTracker>,
        queue: Box<dyn Queue<I>>,
        channel: Box<dyn MessageChannel>,
        results: ResultsLog,
    ) -> Self {
        Self {
            settings,
            tracker,
            queue,
            channel,
            results,
            name_to_item: HashMap::new(),
            dispatched: HashMap::new(),
            stats: EngineStats::default(),
        }
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Run the loop until the queue is exhausted and no dispatched job is
    /// still live.
    pub async fn run(&mut self, event_tx: mpsc::Sender<EngineEvent>) -> DomainResult<EngineStats> {
        let _ = event_tx.send(EngineEvent::Started).await;
        info!(
            engine = %self.settings.name,
            tracker = self.tracker.name(),
            channel = self.channel.name(),
            "engine started"
        );

        loop {
            match self.step(&event_tx).await? {
                StepOutcome::Continue => {}
                StepOutcome::Finished => break,
            }
        }

        let stats = self.stats.clone();
        info!(
            dispatched = stats.dispatched,
            results = stats.results,
            presumed_dead = stats.presumed_dead,
            "engine finished"
        );
        let _ = event_tx.send(EngineEvent::Finished(stats.clone())).await;
        Ok(stats)
    }

    /// One loop iteration. Capacity is read once up front; the same answer
    /// gates both dispatch and the termination decision.
    async fn step(&mut self, event_tx: &mpsc::Sender<EngineEvent>) -> DomainResult<StepOutcome> {
        let can_submit = self.tracker.can_submit_more_jobs().await;

        if can_submit {
            if let Some(item) = self.queue.pop()? {
                self.dispatch(item, event_tx).await?;
                return Ok(StepOutcome::Continue);
            }
        }

        if let Some(raw) = self.channel.recv(self.settings.message_wait).await? {
            self.handle_message(&raw, event_tx).await?;
            return Ok(StepOutcome::Continue);
        }

        self.poll_liveness(can_submit, event_tx).await
    }

    async fn dispatch(
        &mut self,
        item: I,
        event_tx: &mpsc::Sender<EngineEvent>,
    ) -> DomainResult<()> {
        let name = JobName::from(format!(
            "{}-{}",
            self.settings.name,
            self.name_to_item.len()
        ));
        let command = item.build_command(&name);
        self.name_to_item.insert(name.clone(), item);

        self.tracker.spawn(&name, &command).await?;
        self.dispatched.insert(name.clone(), Utc::now());
        self.stats.dispatched += 1;
        info!(job = %name, "dispatched job");
        let _ = event_tx
            .send(EngineEvent::JobDispatched { name, command })
            .await;
        Ok(())
    }

    async fn handle_message(
        &mut self,
        raw: &str,
        event_tx: &mpsc::Sender<EngineEvent>,
    ) -> DomainResult<()> {
        match ChannelMessage::parse(raw)? {
            Some(ChannelMessage::Result {
                score,
                name,
                config,
            }) => self.handle_result(score, name, &config, event_tx).await,
            Some(ChannelMessage::QueueControl(text)) => {
                match self.queue.control() {
                    Some(control) => control.message(&text),
                    None => warn!(text = %text, "queue accepts no control messages"),
                }
                Ok(())
            }
            Some(ChannelMessage::SaveQueue(path)) => self.save_queue(&path, event_tx).await,
            Some(ChannelMessage::LoadQueue(path)) => self.load_queue(&path, event_tx).await,
            None => Ok(()),
        }
    }

    async fn handle_result(
        &mut self,
        score: f64,
        name: JobName,
        config: &str,
        event_tx: &mpsc::Sender<EngineEvent>,
    ) -> DomainResult<()> {
        let Some(item) = self.name_to_item.get(&name).cloned() else {
            return Err(DomainError::UnknownJob(name.to_string()));
        };

        self.results.append(score, &name, config)?;
        self.queue.observe(Outcome::Completed(score), &name, &item)?;
        self.tracker.mark_done(&name).await?;
        if self.dispatched.remove(&name).is_none() {
            debug!(job = %name, "result for a job not marked in flight");
        }

        self.stats.results += 1;
        info!(job = %name, score, "recorded result");
        let _ = event_tx
            .send(EngineEvent::ResultRecorded { name, score })
            .await;
        Ok(())
    }

    async fn save_queue(
        &mut self,
        path: &Path,
        event_tx: &mpsc::Sender<EngineEvent>,
    ) -> DomainResult<()> {
        let state = self.queue.snapshot()?;
        let bytes = serde_json::to_vec_pretty(&state)?;
        tokio::fs::write(path, bytes).await?;
        info!(path = %path.display(), "queue state saved");
        let _ = event_tx
            .send(EngineEvent::QueueSaved {
                path: path.to_path_buf(),
            })
            .await;
        Ok(())
    }

    async fn load_queue(
        &mut self,
        path: &Path,
        event_tx: &mpsc::Sender<EngineEvent>,
    ) -> DomainResult<()> {
        let bytes = tokio::fs::read(path).await?;
        let state = serde_json::from_slice(&bytes)?;
        self.queue.restore(state)?;
        info!(path = %path.display(), "queue state restored");
        let _ = event_tx
            .send(EngineEvent::QueueRestored {
                path: path.to_path_buf(),
            })
            .await;
        Ok(())
    }

    /// Idle path: sleep, query liveness once, fail anything that vanished,
    /// then decide whether the run is over. The sweep runs before the
    /// termination check so failures observed here can put the queue back
    /// to work.
    async fn poll_liveness(
        &mut self,
        can_submit: bool,
        event_tx: &mpsc::Sender<EngineEvent>,
    ) -> DomainResult<StepOutcome> {
        tokio::time::sleep(self.settings.poll_interval).await;

        let live = match self.tracker.live_jobs().await {
            Ok(live) => live,
            Err(err) => {
                warn!(error = %err, "liveness query failed; skipping sweep");
                return Ok(StepOutcome::Continue);
            }
        };

        let dead: Vec<JobName> = self
            .dispatched
            .keys()
            .filter(|name| !live.names().any(|n| n == *name))
            .cloned()
            .collect();
        for name in dead {
            let Some(dispatched_at) = self.dispatched.remove(&name) else {
                continue;
            };
            let Some(item) = self.name_to_item.get(&name).cloned() else {
                warn!(job = %name, "presumed-dead job has no item record");
                continue;
            };
            let in_flight_secs = (Utc::now() - dispatched_at).num_seconds();
            warn!(
                job = %name,
                in_flight_secs,
                "job disappeared without reporting; scoring as failed"
            );
            self.queue.observe(Outcome::Failed, &name, &item)?;
            self.stats.presumed_dead += 1;
            let _ = event_tx.send(EngineEvent::JobPresumedDead { name }).await;
        }

        if live.is_empty() && can_submit {
            return Ok(StepOutcome::Finished);
        }
        Ok(StepOutcome::Continue)
    }
}
