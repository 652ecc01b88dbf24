use serde::{Deserialize, Serialize};

/// Main configuration structure for gridforge
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Engine loop configuration
    #[serde(default)]
    pub engine: EngineConfig,

    /// Job tracker backend configuration
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Result channel configuration
    #[serde(default)]
    pub channel: ChannelConfig,

    /// Adaptive queue configuration
    #[serde(default)]
    pub queue: QueueConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Engine loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Engine name, used as the prefix for generated job names
    #[serde(default = "default_engine_name")]
    pub name: String,

    /// Seconds slept between idle liveness polls
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: f64,

    /// Milliseconds to wait for a channel message per iteration
    #[serde(default = "default_message_wait_ms")]
    pub message_wait_ms: u64,

    /// Path of the durable results log
    #[serde(default = "default_results_path")]
    pub results_path: String,
}

fn default_engine_name() -> String {
    "gridforge".to_string()
}

const fn default_poll_interval_secs() -> f64 {
    8.0
}

const fn default_message_wait_ms() -> u64 {
    100
}

fn default_results_path() -> String {
    "results.txt".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: default_engine_name(),
            poll_interval_secs: default_poll_interval_secs(),
            message_wait_ms: default_message_wait_ms(),
            results_path: default_results_path(),
        }
    }
}

/// Job tracker backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TrackerConfig {
    /// Backend kind: local or sge
    #[serde(default = "default_tracker_kind")]
    pub kind: String,

    /// Submission cap; `None` means unlimited
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: Option<usize>,

    /// Cluster user whose jobs are tracked (sge only)
    #[serde(default)]
    pub sge_user: String,

    /// Cluster queue submitted to (sge only)
    #[serde(default = "default_sge_queue")]
    pub sge_queue: String,

    /// Directory receiving per-job output files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging_dir: Option<String>,

    /// Milliseconds slept after each submission
    #[serde(default = "default_submit_delay_ms")]
    pub submit_delay_ms: u64,

    /// Redis list key tracking locally launched jobs (local only)
    #[serde(default = "default_local_jobs_key")]
    pub local_jobs_key: String,
}

fn default_tracker_kind() -> String {
    "local".to_string()
}

const fn default_max_concurrent_jobs() -> Option<usize> {
    Some(12)
}

fn default_sge_queue() -> String {
    "all.q".to_string()
}

const fn default_submit_delay_ms() -> u64 {
    200
}

fn default_local_jobs_key() -> String {
    "gridforge.local.jobs".to_string()
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            kind: default_tracker_kind(),
            max_concurrent_jobs: default_max_concurrent_jobs(),
            sge_user: String::new(),
            sge_queue: default_sge_queue(),
            logging_dir: None,
            submit_delay_ms: default_submit_delay_ms(),
            local_jobs_key: default_local_jobs_key(),
        }
    }
}

/// Result channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChannelConfig {
    /// Redis host
    #[serde(default = "default_channel_host")]
    pub host: String,

    /// Redis port
    #[serde(default = "default_channel_port")]
    pub port: u16,

    /// Redis database index
    #[serde(default)]
    pub db: i64,

    /// Pub/sub channel name
    #[serde(default = "default_channel_name")]
    pub channel: String,
}

fn default_channel_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_channel_port() -> u16 {
    6379
}

fn default_channel_name() -> String {
    "gridforge".to_string()
}

impl ChannelConfig {
    /// Connection URL for the configured server.
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            host: default_channel_host(),
            port: default_channel_port(),
            db: 0,
            channel: default_channel_name(),
        }
    }
}

/// Adaptive queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct QueueConfig {
    /// Selection temperature in [0, 1]; higher favors top scores harder
    #[serde(default = "default_greediness")]
    pub greediness: f64,

    /// Mutation retries before a pop yields nothing
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Total pop cap; 0 means unlimited
    #[serde(default)]
    pub max_pops: u64,
}

const fn default_greediness() -> f64 {
    1.0
}

const fn default_max_attempts() -> u32 {
    100
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            greediness: default_greediness(),
            max_attempts: default_max_attempts(),
            max_pops: 0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; `None` logs to stderr only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,

    /// File rotation policy: daily, hourly or never
    #[serde(default = "default_log_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_log_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_log_rotation(),
        }
    }
}
