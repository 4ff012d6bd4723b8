//! Persisted records: review history, interactive sessions, ignore log.

use super::RunStats;
use serde::{Deserialize, Serialize};

/// Runs kept in `history.json`; older entries are dropped on save.
pub const HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRun {
    pub timestamp: String,
    pub command: String,
    /// Short source-control revision, empty when unavailable.
    #[serde(default)]
    pub commit: String,
    pub metrics: RunStats,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    #[serde(default)]
    pub runs: Vec<ReviewRun>,
}

impl History {
    /// Append and truncate to the most recent `HISTORY_LIMIT` runs.
    pub fn push(&mut self, run: ReviewRun) {
        self.runs.push(run);
        if self.runs.len() > HISTORY_LIMIT {
            let excess = self.runs.len() - HISTORY_LIMIT;
            self.runs.drain(..excess);
        }
    }

    pub fn last_of(&self, command: &str) -> Option<&ReviewRun> {
        self.runs.iter().rev().find(|r| r.command == command)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// Outcome of one interactive remediation run.
pub struct SessionRecord {
    pub timestamp: String,
    pub processed: usize,
    pub skipped: Vec<String>,
    pub fixed: Vec<String>,
    pub ignored: Vec<String>,
    pub stats: RunStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// One line of the ignore log.
pub struct IgnoreEntry {
    pub id: String,
    pub file: String,
    pub reason: String,
    pub created: String,
}
