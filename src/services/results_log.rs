//! Durable tab-separated results log.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::errors::DomainResult;
use crate::domain::models::JobName;

/// Append-only results file, one `<score>\t<name>\t<config>` line per
/// recorded result.
///
/// The file is truncated at open (one log per engine run) and flushed after
/// every append so progress survives a crash. Scores are written with six
/// decimal places.
pub struct ResultsLog {
    file: File,
    path: PathBuf,
}

impl ResultsLog {
    /// Opens `path` fresh, truncating previous contents.
    pub fn create(path: impl AsRef<Path>) -> DomainResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        Ok(Self { file, path })
    }

    /// The log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one result line and flushes it.
    pub fn append(&mut self, score: f64, name: &JobName, config: &str) -> DomainResult<()> {
        writeln!(self.file, "{score:.6}\t{name}\t{config}")?;
        self.file.flush()?;
        Ok(())
    }
}
