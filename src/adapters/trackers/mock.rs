//! Mock job tracker for tests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::JobName;
use crate::domain::ports::JobTracker;

/// In-memory tracker with scripted liveness.
///
/// Spawned jobs are recorded and, by default, held in a live set until
/// `mark_done`. A tracker built with [`MockJobTracker::vanishing`] never
/// lists spawned names as live, simulating jobs that die silently right
/// after submission.
pub struct MockJobTracker {
    state: Arc<RwLock<MockState>>,
    capacity: Option<usize>,
    vanish_spawned: bool,
}

#[derive(Default)]
struct MockState {
    spawned: Vec<(JobName, Vec<String>)>,
    live: Vec<JobName>,
    fail_queries: bool,
}

impl MockJobTracker {
    /// Tracker that keeps spawned jobs live until completed.
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            state: Arc::new(RwLock::new(MockState::default())),
            capacity,
            vanish_spawned: false,
        }
    }

    /// Tracker whose spawned jobs never appear live.
    pub fn vanishing(capacity: Option<usize>) -> Self {
        Self {
            vanish_spawned: true,
            ..Self::new(capacity)
        }
    }

    /// Every spawn recorded so far, in order.
    pub async fn spawned(&self) -> Vec<(JobName, Vec<String>)> {
        self.state.read().await.spawned.clone()
    }

    /// Removes `name` from the live set, as a finished run would.
    pub async fn complete(&self, name: &JobName) {
        self.state.write().await.live.retain(|n| n != name);
    }

    /// Adds a name to the live set without a spawn (e.g. another user's
    /// job occupying the cluster).
    pub async fn add_live(&self, name: JobName) {
        self.state.write().await.live.push(name);
    }

    /// Scripts status-query failures on or off.
    pub async fn set_fail_queries(&self, fail: bool) {
        self.state.write().await.fail_queries = fail;
    }
}

#[async_trait]
impl JobTracker for MockJobTracker {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn can_submit_more_jobs(&self) -> bool {
        let state = self.state.read().await;
        if state.fail_queries {
            return false;
        }
        match self.capacity {
            None => true,
            Some(max) => state.live.len() < max,
        }
    }

    async fn jobs_running(&self) -> DomainResult<Vec<JobName>> {
        let state = self.state.read().await;
        if state.fail_queries {
            return Err(DomainError::IoError("scripted query failure".to_string()));
        }
        Ok(state.live.clone())
    }

    async fn jobs_queued(&self) -> DomainResult<Vec<JobName>> {
        Ok(Vec::new())
    }

    async fn spawn(&self, name: &JobName, command: &[String]) -> DomainResult<()> {
        let mut state = self.state.write().await;
        state.spawned.push((name.clone(), command.to_vec()));
        if !self.vanish_spawned {
            state.live.push(name.clone());
        }
        Ok(())
    }

    async fn mark_done(&self, name: &JobName) -> DomainResult<()> {
        self.complete(name).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_records_command_and_holds_capacity() {
        let tracker = MockJobTracker::new(Some(1));
        assert!(tracker.can_submit_more_jobs().await);

        let name = JobName::new("run-0");
        tracker.spawn(&name, &["echo".to_string()]).await.unwrap();

        assert!(!tracker.can_submit_more_jobs().await);
        assert_eq!(tracker.jobs_running().await.unwrap(), vec![name.clone()]);
        assert_eq!(tracker.spawned().await.len(), 1);

        tracker.mark_done(&name).await.unwrap();
        assert!(tracker.can_submit_more_jobs().await);
    }

    #[tokio::test]
    async fn test_vanishing_tracker_never_lists_spawns() {
        let tracker = MockJobTracker::vanishing(Some(4));
        tracker
            .spawn(&JobName::new("run-0"), &["echo".to_string()])
            .await
            .unwrap();

        assert!(tracker.jobs_running().await.unwrap().is_empty());
        assert!(tracker.live_jobs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_failure_degrades_capacity_to_false() {
        let tracker = MockJobTracker::new(None);
        assert!(tracker.can_submit_more_jobs().await);

        tracker.set_fail_queries(true).await;
        assert!(!tracker.can_submit_more_jobs().await);
        assert!(tracker.jobs_running().await.is_err());
    }
}
