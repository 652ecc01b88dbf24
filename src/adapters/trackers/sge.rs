//! Grid Engine backend driven by `qstat` and `qsub`.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{JobName, LiveJobs};
use crate::domain::ports::JobTracker;

/// Memory request when no heap hint is present, in GB.
const DEFAULT_MEM_GB: u32 = 10;
/// Fixed wall-clock request.
const RUNTIME_LIMIT: &str = "72:00:00";
/// Reserved name of interactive sessions; never one of ours.
const INTERACTIVE_JOB: &str = "QLOGIN";

/// Grid Engine proxy: capacity from the pending-job count, liveness from
/// `qstat -u <user> -xml`, submission through `qsub`.
///
/// Submissions are batch, non-blocking (`-b y`), inherit the environment
/// (`-V`) and run from the working directory (`-cwd`); stdout and stderr
/// are joined. Memory is inferred from a `-Xmx<N>g` heap hint in the
/// payload command with one GB of headroom.
pub struct SgeJobTracker {
    user: String,
    queue: String,
    max_jobs_in_queue: Option<usize>,
    logging_dir: Option<PathBuf>,
    submit_delay: Duration,
}

impl SgeJobTracker {
    /// Tracker for `user`'s jobs with default settings.
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            queue: "all.q".to_string(),
            max_jobs_in_queue: None,
            logging_dir: None,
            submit_delay: Duration::from_millis(200),
        }
    }

    /// Submits to `queue` instead of the default.
    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = queue.into();
        self
    }

    /// Caps the number of pending jobs; `None` is unlimited.
    pub fn with_max_queued(mut self, max: Option<usize>) -> Self {
        self.max_jobs_in_queue = max;
        self
    }

    /// Directs job output files to `dir`.
    pub fn with_logging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.logging_dir = Some(dir.into());
        self
    }

    /// Spacing slept after each submission.
    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    async fn qstat_xml(&self) -> DomainResult<String> {
        let output = Command::new("qstat")
            .args(["-u", &self.user, "-xml"])
            .output()
            .await
            .map_err(|err| DomainError::IoError(format!("failed to run qstat: {err}")))?;
        if !output.status.success() {
            return Err(DomainError::SchedulerParse(format!(
                "qstat exited with {}",
                output.status
            )));
        }
        String::from_utf8(output.stdout)
            .map_err(|err| DomainError::SchedulerParse(err.to_string()))
    }

    fn qsub_args(&self, name: &JobName, command: &[String]) -> Vec<String> {
        let mem = infer_mem_gb(command);
        let mut args: Vec<String> = vec![
            "-N".to_string(),
            name.to_string(),
            "-j".to_string(),
            "y".to_string(),
            "-V".to_string(),
            "-b".to_string(),
            "y".to_string(),
            "-cwd".to_string(),
            "-q".to_string(),
            self.queue.clone(),
            "-l".to_string(),
            format!("num_proc=1,mem_free={mem}G,h_rt={RUNTIME_LIMIT}"),
        ];
        if let Some(dir) = &self.logging_dir {
            args.push("-o".to_string());
            args.push(dir.display().to_string());
        }
        args.extend(command.iter().cloned());
        args
    }
}

#[async_trait]
impl JobTracker for SgeJobTracker {
    fn name(&self) -> &'static str {
        "sge"
    }

    async fn can_submit_more_jobs(&self) -> bool {
        let Some(max) = self.max_jobs_in_queue else {
            return true;
        };
        match self.live_jobs().await {
            Ok(live) => live.queued.len() < max,
            Err(err) => {
                warn!(error = %err, "scheduler query failed; reporting no capacity");
                false
            }
        }
    }

    async fn jobs_running(&self) -> DomainResult<Vec<JobName>> {
        Ok(self.live_jobs().await?.running)
    }

    async fn jobs_queued(&self) -> DomainResult<Vec<JobName>> {
        Ok(self.live_jobs().await?.queued)
    }

    async fn live_jobs(&self) -> DomainResult<LiveJobs> {
        let xml = self.qstat_xml().await?;
        parse_qstat_xml(&xml)
    }

    #[instrument(skip(self, command), fields(job = %name))]
    async fn spawn(&self, name: &JobName, command: &[String]) -> DomainResult<()> {
        let args = self.qsub_args(name, command);
        debug!(?args, "submitting via qsub");
        let status = Command::new("qsub")
            .args(&args)
            .status()
            .await
            .map_err(|err| DomainError::SpawnFailed {
                name: name.to_string(),
                reason: format!("failed to run qsub: {err}"),
            })?;
        if !status.success() {
            return Err(DomainError::SpawnFailed {
                name: name.to_string(),
                reason: format!("qsub exited with {status}"),
            });
        }
        tokio::time::sleep(self.submit_delay).await;
        Ok(())
    }
}

/// Parses a `qstat -xml` listing into a liveness snapshot.
///
/// The scheduler nests running jobs under `queue_info` and pending jobs
/// under an inner `job_info` element (the root element is also named
/// `job_info`); each `job_list` child is a single job. Jobs in states other
/// than `r` and `qw` are ignored, as are interactive sessions. Any
/// structural surprise is an explicit error rather than a silent empty
/// listing.
fn parse_qstat_xml(xml: &str) -> DomainResult<LiveJobs> {
    let root = first_element_name(xml)?;
    if root != "job_info" {
        return Err(DomainError::SchedulerParse(format!(
            "unexpected root element {root:?}, expected job_info"
        )));
    }
    let report: QstatReport = quick_xml::de::from_str(xml)?;

    let mut live = LiveJobs::default();
    for entry in report
        .queue_info
        .jobs
        .iter()
        .chain(report.job_info.jobs.iter())
    {
        if entry.name == INTERACTIVE_JOB {
            continue;
        }
        match entry.state.as_str() {
            "r" => live.running.push(JobName::from(entry.name.as_str())),
            "qw" => live.queued.push(JobName::from(entry.name.as_str())),
            other => {
                debug!(job = %entry.name, state = other, "ignoring job in unhandled state");
            }
        }
    }
    Ok(live)
}

fn first_element_name(xml: &str) -> DomainResult<String> {
    use quick_xml::events::Event;

    let mut reader = quick_xml::Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(start) | Event::Empty(start)) => {
                return Ok(String::from_utf8_lossy(start.name().as_ref()).into_owned());
            }
            Ok(Event::Eof) => {
                return Err(DomainError::SchedulerParse(
                    "empty scheduler listing".to_string(),
                ));
            }
            Ok(_) => {}
            Err(err) => return Err(DomainError::SchedulerParse(err.to_string())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct QstatReport {
    #[serde(default)]
    queue_info: JobSection,
    #[serde(default)]
    job_info: JobSection,
}

#[derive(Debug, Default, Deserialize)]
struct JobSection {
    #[serde(default, rename = "job_list")]
    jobs: Vec<JobEntry>,
}

#[derive(Debug, Deserialize)]
struct JobEntry {
    #[serde(rename = "JB_name")]
    name: String,
    state: String,
}

/// Memory to request in GB: a single `-Xmx<N>[gG]` token in the payload
/// yields N+1, two such tokens abandon the inference with a warning, none
/// falls back to the default.
fn infer_mem_gb(command: &[String]) -> u32 {
    let mut inferred: Option<u32> = None;
    for token in command {
        if let Some(heap) = parse_heap_gb(token) {
            if inferred.is_some() {
                warn!(
                    "multiple -Xmx hints in command; requesting the default {DEFAULT_MEM_GB}G"
                );
                return DEFAULT_MEM_GB;
            }
            inferred = Some(heap + 1);
        }
    }
    inferred.unwrap_or(DEFAULT_MEM_GB)
}

fn parse_heap_gb(token: &str) -> Option<u32> {
    let rest = token.strip_prefix("-Xmx")?;
    let digits = rest
        .strip_suffix('g')
        .or_else(|| rest.strip_suffix('G'))?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"<?xml version='1.0'?>
<job_info xmlns:xsd="http://arc.liv.ac.uk/repos/darcs/sge/source/dist/util/resources/schemas/qstat/qstat.xsd">
  <queue_info>
    <job_list state="running">
      <JB_job_number>431289</JB_job_number>
      <JAT_prio>0.55500</JAT_prio>
      <JB_name>sweep-0</JB_name>
      <JB_owner>someuser</JB_owner>
      <state>r</state>
      <slots>1</slots>
    </job_list>
    <job_list state="running">
      <JB_job_number>431290</JB_job_number>
      <JB_name>QLOGIN</JB_name>
      <JB_owner>someuser</JB_owner>
      <state>r</state>
    </job_list>
  </queue_info>
  <job_info>
    <job_list state="pending">
      <JB_job_number>431291</JB_job_number>
      <JB_name>sweep-1</JB_name>
      <JB_owner>someuser</JB_owner>
      <state>qw</state>
    </job_list>
    <job_list state="pending">
      <JB_job_number>431292</JB_job_number>
      <JB_name>sweep-2</JB_name>
      <JB_owner>someuser</JB_owner>
      <state>Eqw</state>
    </job_list>
  </job_info>
</job_info>
"#;

    #[test]
    fn test_parse_listing_classifies_states_and_skips_interactive() {
        let live = parse_qstat_xml(LISTING).unwrap();
        assert_eq!(live.running, vec![JobName::from("sweep-0")]);
        assert_eq!(live.queued, vec![JobName::from("sweep-1")]);
    }

    #[test]
    fn test_parse_empty_sections() {
        let xml = "<job_info><queue_info/><job_info/></job_info>";
        let live = parse_qstat_xml(xml).unwrap();
        assert!(live.is_empty());
    }

    #[test]
    fn test_parse_rejects_unexpected_root() {
        let err = parse_qstat_xml("<html><body/></html>").unwrap_err();
        assert!(matches!(err, DomainError::SchedulerParse(_)));
    }

    #[test]
    fn test_parse_rejects_job_without_state() {
        let xml = "<job_info><queue_info><job_list><JB_name>x</JB_name></job_list></queue_info></job_info>";
        assert!(parse_qstat_xml(xml).is_err());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_qstat_xml("").is_err());
        assert!(parse_qstat_xml("not xml at all").is_err());
    }

    #[test]
    fn test_heap_hint_parsing() {
        assert_eq!(parse_heap_gb("-Xmx7G"), Some(7));
        assert_eq!(parse_heap_gb("-Xmx12g"), Some(12));
        assert_eq!(parse_heap_gb("-Xmx512m"), None);
        assert_eq!(parse_heap_gb("-XmxG"), None);
        assert_eq!(parse_heap_gb("-Xms7G"), None);
        assert_eq!(parse_heap_gb("Xmx7G"), None);
    }

    #[test]
    fn test_memory_inference() {
        let with_hint = vec!["java".to_string(), "-Xmx7G".to_string()];
        assert_eq!(infer_mem_gb(&with_hint), 8);

        let no_hint = vec!["python".to_string(), "train.py".to_string()];
        assert_eq!(infer_mem_gb(&no_hint), DEFAULT_MEM_GB);

        let two_hints = vec!["-Xmx4g".to_string(), "-Xmx8g".to_string()];
        assert_eq!(infer_mem_gb(&two_hints), DEFAULT_MEM_GB);
    }

    #[test]
    fn test_qsub_args_shape() {
        let tracker = SgeJobTracker::new("someuser").with_logging_dir("logs");
        let name = JobName::new("sweep-3");
        let command = vec!["java".to_string(), "-Xmx7G".to_string(), "Run".to_string()];

        let args = tracker.qsub_args(&name, &command);
        assert_eq!(
            args,
            vec![
                "-N", "sweep-3", "-j", "y", "-V", "-b", "y", "-cwd", "-q", "all.q",
                "-l", "num_proc=1,mem_free=8G,h_rt=72:00:00", "-o", "logs",
                "java", "-Xmx7G", "Run",
            ]
        );
    }

    #[test]
    fn test_qsub_args_without_logging_dir() {
        let tracker = SgeJobTracker::new("someuser").with_queue("short.q");
        let args = tracker.qsub_args(&JobName::new("a-0"), &["echo".to_string()]);
        assert!(!args.contains(&"-o".to_string()));
        assert!(args.contains(&"short.q".to_string()));
    }
}
