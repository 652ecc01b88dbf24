//! Local-process backend with a shared Redis liveness list.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::JobName;
use crate::domain::ports::JobTracker;

/// Runs jobs as detached local processes, with liveness bookkeeping in a
/// shared Redis list.
///
/// There is no queued state: a spawned process starts immediately. Child
/// exit is invisible to this process (children are detached), so names only
/// leave the list through the engine's `mark_done` hook when their result
/// arrives. Each job's stdout/stderr goes to `<name>.log` under the logging
/// directory.
pub struct LocalJobTracker {
    conn: MultiplexedConnection,
    jobs_key: String,
    max_concurrent_jobs: Option<usize>,
    logging_dir: PathBuf,
}

impl LocalJobTracker {
    /// Connects to the Redis server at `url` and prepares the logging
    /// directory.
    pub async fn connect(
        url: &str,
        jobs_key: impl Into<String>,
        max_concurrent_jobs: Option<usize>,
        logging_dir: impl Into<PathBuf>,
    ) -> DomainResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        let logging_dir = logging_dir.into();
        tokio::fs::create_dir_all(&logging_dir).await?;
        Ok(Self {
            conn,
            jobs_key: jobs_key.into(),
            max_concurrent_jobs,
            logging_dir,
        })
    }

    /// Clears the liveness list, dropping names left over from a previous
    /// run so they do not count against capacity.
    pub async fn remove_all_jobs(&self) -> DomainResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(&self.jobs_key).await?;
        info!(key = %self.jobs_key, "cleared local job list");
        Ok(())
    }
}

#[async_trait]
impl JobTracker for LocalJobTracker {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn can_submit_more_jobs(&self) -> bool {
        let Some(max) = self.max_concurrent_jobs else {
            return true;
        };
        match self.jobs_running().await {
            Ok(running) => running.len() < max,
            Err(err) => {
                warn!(error = %err, "job list query failed; reporting no capacity");
                false
            }
        }
    }

    async fn jobs_running(&self) -> DomainResult<Vec<JobName>> {
        let mut conn = self.conn.clone();
        let names: Vec<String> = conn.lrange(&self.jobs_key, 0, -1).await?;
        Ok(names.into_iter().map(JobName::from).collect())
    }

    async fn jobs_queued(&self) -> DomainResult<Vec<JobName>> {
        Ok(Vec::new())
    }

    #[instrument(skip(self, command), fields(job = %name))]
    async fn spawn(&self, name: &JobName, command: &[String]) -> DomainResult<()> {
        let Some((program, args)) = command.split_first() else {
            return Err(DomainError::SpawnFailed {
                name: name.to_string(),
                reason: "empty command".to_string(),
            });
        };

        let log_path = self.logging_dir.join(format!("{name}.log"));
        let log_file = std::fs::File::create(&log_path)?;
        let stderr_file = log_file.try_clone()?;

        // the name is listed before the process starts
        let mut conn = self.conn.clone();
        let _: () = conn.rpush(&self.jobs_key, name.as_str()).await?;

        let child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log_file))
            .stderr(Stdio::from(stderr_file))
            .spawn()
            .map_err(|err| DomainError::SpawnFailed {
                name: name.to_string(),
                reason: err.to_string(),
            })?;
        debug!(pid = child.id(), log = %log_path.display(), "local job launched");
        Ok(())
    }

    async fn mark_done(&self, name: &JobName) -> DomainResult<()> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.lrem(&self.jobs_key, 0, name.as_str()).await?;
        if removed == 0 {
            debug!(job = %name, "name was not on the job list");
        }
        Ok(())
    }
}
