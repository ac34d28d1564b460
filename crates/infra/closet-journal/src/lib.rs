//! Append-only JSONL journal of closet pipeline runs.
//!
//! One line per run, bucketed by UTC day into
//! `closet_runs_<YYYY-MM-DD>.jsonl`. Appends take an exclusive file lock so
//! concurrent runs never interleave lines.

use chrono::{DateTime, NaiveDate, Utc};
use fd_lock::RwLock;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

pub use chrono;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Could not determine a journal directory")]
    NoJournalDir,
}

pub type Result<T> = std::result::Result<T, JournalError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageCounts {
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
}

/// One pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    /// CLI command that ran the pipeline (`validate`, `run`, ...).
    pub command: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u128,
    pub scene: String,
    pub avatar: String,
    /// Pipeline summary line.
    pub status: String,
    pub applied: bool,
    pub repaired: bool,
    pub has_error: bool,
    pub counts: MessageCounts,
    #[serde(default)]
    pub messages: serde_json::Value,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dry_run: bool,
}

/// Run id plus wall-clock and monotonic start times.
pub struct RunTimer {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    start_instant: std::time::Instant,
}

impl RunTimer {
    pub fn start() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            start_instant: std::time::Instant::now(),
        }
    }

    /// Completion time and elapsed milliseconds.
    pub fn finish(&self) -> (DateTime<Utc>, u128) {
        (Utc::now(), self.start_instant.elapsed().as_millis())
    }
}

/// `<data_local_dir>/avatar-closet/journal`.
pub fn default_journal_dir() -> Result<PathBuf> {
    dirs::data_local_dir()
        .map(|base| base.join("avatar-closet").join("journal"))
        .ok_or(JournalError::NoJournalDir)
}

pub struct JournalWriter {
    dir: PathBuf,
    enabled: bool,
}

impl JournalWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            enabled: true,
        }
    }

    /// A writer whose appends are no-ops.
    pub fn disabled() -> Self {
        Self {
            dir: PathBuf::new(),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn day_file_name(day: NaiveDate) -> String {
        day.format("closet_runs_%Y-%m-%d.jsonl").to_string()
    }

    pub fn day_file(&self, day: NaiveDate) -> PathBuf {
        self.dir.join(Self::day_file_name(day))
    }

    /// Append `record` to the file of its completion day. Returns the file
    /// written, or `None` when disabled.
    pub fn append(&self, record: &RunRecord) -> Result<Option<PathBuf>> {
        if !self.enabled {
            return Ok(None);
        }
        std::fs::create_dir_all(&self.dir)?;
        let path = self.day_file(record.completed_at.date_naive());

        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut lock = RwLock::new(file);
        let mut guard = lock.write()?;
        guard.write_all(&line)?;
        Ok(Some(path))
    }

    /// Every record of `day`, oldest first. A missing file reads as empty.
    pub fn read_day(&self, day: NaiveDate) -> Result<Vec<RunRecord>> {
        let path = self.day_file(day);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = std::fs::File::open(path)?;
        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }
}
