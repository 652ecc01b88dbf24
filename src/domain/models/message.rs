//! Wire grammar for the result channel.
//!
//! The kind token is separated from the payload by a single space. Result
//! payloads are tab-separated so the config field can carry spaces; the
//! config field may itself contain further tabs and is kept whole.

use std::path::PathBuf;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::JobName;

/// One parsed message from the result channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelMessage {
    /// `result <score>\t<name>\t<config>` reported by a finished run.
    Result {
        /// Fitness score reported by the run.
        score: f64,
        /// Name the run was dispatched under.
        name: JobName,
        /// Opaque configuration description, echoed into the results log.
        config: String,
    },
    /// `messageQ <text>`, forwarded to the queue's control capability.
    QueueControl(String),
    /// `saveQ <path>`, checkpoint the full queue state to a file.
    SaveQueue(PathBuf),
    /// `loadQ <path>`, restore queue state from a checkpoint file.
    LoadQueue(PathBuf),
}

impl ChannelMessage {
    /// Parse one raw payload.
    ///
    /// Unknown kinds return `Ok(None)` so callers can log and move on; a
    /// known kind with a malformed payload is an error.
    pub fn parse(raw: &str) -> DomainResult<Option<Self>> {
        let Some((kind, rest)) = raw.split_once(' ') else {
            return Ok(None);
        };
        match kind {
            "result" => parse_result(rest).map(Some),
            "messageQ" => Ok(Some(Self::QueueControl(rest.to_string()))),
            "saveQ" => parse_path(kind, rest).map(|p| Some(Self::SaveQueue(p))),
            "loadQ" => parse_path(kind, rest).map(|p| Some(Self::LoadQueue(p))),
            _ => Ok(None),
        }
    }
}

fn parse_result(rest: &str) -> DomainResult<ChannelMessage> {
    let mut fields = rest.splitn(3, '\t');
    let (Some(score), Some(name), Some(config)) = (fields.next(), fields.next(), fields.next())
    else {
        return Err(malformed("result", "expected <score>\\t<name>\\t<config>"));
    };
    let score: f64 = score
        .trim()
        .parse()
        .map_err(|_| malformed("result", format!("unparseable score {score:?}")))?;
    Ok(ChannelMessage::Result {
        score,
        name: JobName::from(name),
        config: config.to_string(),
    })
}

fn parse_path(kind: &str, rest: &str) -> DomainResult<PathBuf> {
    if rest.is_empty() {
        return Err(malformed(kind, "missing path"));
    }
    Ok(PathBuf::from(rest))
}

fn malformed(kind: &str, reason: impl Into<String>) -> DomainError {
    DomainError::MalformedMessage {
        kind: kind.to_string(),
        reason: reason.into(),
    }
}
