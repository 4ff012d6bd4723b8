//! Project-local state under `.docvet/`: review history, interactive
//! session snapshots, the ignore log, and the rendered link graph.

use crate::error::{DocvetError, Result};
use crate::models::history::{History, IgnoreEntry, ReviewRun, SessionRecord};
use crate::models::RunStats;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const STATE_DIR: &str = ".docvet";
pub const HISTORY_FILE: &str = "history.json";
pub const SESSION_FILE: &str = "session.json";
pub const IGNORE_FILE: &str = ".docignore";
pub const LINK_GRAPH_FILE: &str = "link_graph.md";

pub fn state_dir(root: &Path) -> PathBuf {
    root.join(STATE_DIR)
}

fn ensure_state_dir(root: &Path) -> Result<PathBuf> {
    let dir = state_dir(root);
    fs::create_dir_all(&dir).map_err(|e| DocvetError::persist(&dir, e))?;
    Ok(dir)
}

/// Missing or unreadable history reads as empty. Read-only callers only;
/// writers go through `read_history`.
pub fn load_history(root: &Path) -> History {
    match read_history(root) {
        Ok(h) => h,
        Err(err) => {
            tracing::warn!(error = %err, "ignoring corrupt history");
            History::default()
        }
    }
}

/// Strict read: a missing file is empty history, anything else that fails
/// is an error so the existing file is never replaced.
pub fn read_history(root: &Path) -> Result<History> {
    let path = state_dir(root).join(HISTORY_FILE);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(History::default()),
        Err(e) => return Err(DocvetError::io(&path, e)),
    };
    Ok(serde_json::from_str::<History>(&text)?)
}

pub fn save_history(root: &Path, history: &History) -> Result<()> {
    let dir = ensure_state_dir(root)?;
    let path = dir.join(HISTORY_FILE);
    let text = serde_json::to_string_pretty(history)?;
    fs::write(&path, text).map_err(|e| DocvetError::persist(&path, e))
}

/// Append one run for `command` and rewrite the bounded history.
///
/// An unparseable history file is left untouched and the error returned.
pub fn append_run(root: &Path, command: &str, stats: RunStats) -> Result<ReviewRun> {
    let mut history = read_history(root)?;
    let run = ReviewRun {
        timestamp: chrono::Local::now().to_rfc3339(),
        command: command.to_string(),
        commit: current_commit(root),
        metrics: stats,
    };
    history.push(run.clone());
    save_history(root, &history)?;
    Ok(run)
}

/// Short revision of the checkout at `root`, empty when unavailable.
pub fn current_commit(root: &Path) -> String {
    Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .current_dir(root)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_default()
}

pub fn save_session(root: &Path, record: &SessionRecord) -> Result<PathBuf> {
    let dir = ensure_state_dir(root)?;
    let path = dir.join(SESSION_FILE);
    let text = serde_json::to_string_pretty(record)?;
    fs::write(&path, text).map_err(|e| DocvetError::persist(&path, e))?;
    Ok(path)
}

pub fn append_ignore(root: &Path, entry: &IgnoreEntry) -> Result<()> {
    let dir = ensure_state_dir(root)?;
    let path = dir.join(IGNORE_FILE);
    let line = serde_json::to_string(entry)?;
    let mut f = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| DocvetError::persist(&path, e))?;
    writeln!(f, "{}", line).map_err(|e| DocvetError::persist(&path, e))
}

/// Write the link-graph document and return its project-relative path.
pub fn save_link_graph(root: &Path, content: &str) -> Result<String> {
    let dir = ensure_state_dir(root)?;
    let path = dir.join(LINK_GRAPH_FILE);
    fs::write(&path, content).map_err(|e| DocvetError::persist(&path, e))?;
    Ok(format!("{}/{}", STATE_DIR, LINK_GRAPH_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_append_run_round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let stats = RunStats {
            critical: 1,
            warning: 2,
            info: 3,
        };
        append_run(dir.path(), "review", stats).unwrap();
        append_run(dir.path(), "lint", RunStats::default()).unwrap();
        let h = load_history(dir.path());
        assert_eq!(h.runs.len(), 2);
        assert_eq!(h.last_of("review").unwrap().metrics, stats);
    }

    #[test]
    fn test_corrupt_history_reads_as_empty() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(state_dir(dir.path())).unwrap();
        fs::write(state_dir(dir.path()).join(HISTORY_FILE), "{not json").unwrap();
        assert!(load_history(dir.path()).runs.is_empty());
    }

    #[test]
    fn test_append_run_keeps_unparseable_history() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(state_dir(dir.path())).unwrap();
        let path = state_dir(dir.path()).join(HISTORY_FILE);
        let truncated = r#"{"runs": [{"timestamp": "t1", "command": "review", "commit": "", "metrics": {"critical": 1, "warning": 0, "info": 0}},"#;
        fs::write(&path, truncated).unwrap();

        let err = append_run(dir.path(), "lint", RunStats::default()).unwrap_err();
        assert!(matches!(err, DocvetError::Json(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), truncated);
    }

    #[test]
    fn test_ignore_log_appends_lines() {
        let dir = tempdir().unwrap();
        for id in ["LINT-001", "TERM-002"] {
            append_ignore(
                dir.path(),
                &IgnoreEntry {
                    id: id.into(),
                    file: "a.md:1".into(),
                    reason: "User ignored".into(),
                    created: "2026-01-01".into(),
                },
            )
            .unwrap();
        }
        let text = fs::read_to_string(state_dir(dir.path()).join(IGNORE_FILE)).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: IgnoreEntry = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.id, "LINT-001");
    }

    #[test]
    fn test_save_link_graph_returns_relative_path() {
        let dir = tempdir().unwrap();
        let rel = save_link_graph(dir.path(), "# graph").unwrap();
        assert_eq!(rel, ".docvet/link_graph.md");
        assert!(dir.path().join(&rel).exists());
    }
}
