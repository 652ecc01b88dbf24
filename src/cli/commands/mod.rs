//! CLI command implementations.

pub mod run;
pub mod send;
pub mod status;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::adapters::trackers::{LocalJobTracker, SgeJobTracker};
use crate::domain::models::Config;
use crate::domain::ports::JobTracker;

/// Builds the tracker named by `kind`. `clear_stale` drops names left in
/// the local liveness list by a previous run; status queries must leave
/// the list untouched.
pub(crate) async fn build_tracker(
    config: &Config,
    kind: &str,
    clear_stale: bool,
) -> Result<Arc<dyn JobTracker>> {
    match kind {
        "sge" => {
            let mut tracker = SgeJobTracker::new(&config.tracker.sge_user)
                .with_queue(&config.tracker.sge_queue)
                .with_max_queued(config.tracker.max_concurrent_jobs)
                .with_submit_delay(Duration::from_millis(config.tracker.submit_delay_ms));
            if let Some(dir) = &config.tracker.logging_dir {
                tracker = tracker.with_logging_dir(dir);
            }
            Ok(Arc::new(tracker))
        }
        _ => {
            let tracker = LocalJobTracker::connect(
                &config.channel.url(),
                &config.tracker.local_jobs_key,
                config.tracker.max_concurrent_jobs,
                config.tracker.logging_dir.as_deref().unwrap_or("."),
            )
            .await?;
            if clear_stale {
                tracker.remove_all_jobs().await?;
            }
            Ok(Arc::new(tracker))
        }
    }
}
