//! Per-run analysis state: document store, settings, and the issue
//! aggregator every pass records into.
//!
//! One `AnalysisSession` is owned by each orchestrated run. `reset` clears
//! issues and counters between passes so per-pass stats stay attributable;
//! the document cache survives resets.

use crate::config::Settings;
use crate::error::Result;
use crate::models::{Category, FixKind, Issue, Priority, RunStats};
use crate::output;
use crate::remediate::{self, Remediator};
use crate::store::DocumentStore;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Render each issue as it is recorded.
    Default,
    /// Render, then run the remediation prompt before returning.
    Interactive,
    /// Silent; callers map the final stats to an exit code.
    Batch,
}

pub struct AnalysisSession {
    pub store: DocumentStore,
    pub settings: Settings,
    mode: Mode,
    render: bool,
    issues: Vec<Issue>,
    stats: RunStats,
    remediator: Option<Remediator>,
}

impl AnalysisSession {
    pub fn new(root: impl Into<PathBuf>, settings: Settings, mode: Mode) -> Self {
        let store = DocumentStore::new(
            root,
            settings.include.clone(),
            settings.ignore.clone(),
        );
        AnalysisSession {
            store,
            settings,
            mode,
            render: mode != Mode::Batch,
            issues: Vec::new(),
            stats: RunStats::default(),
            remediator: None,
        }
    }

    /// Attach the interactive prompt. Only consulted in `Mode::Interactive`.
    pub fn with_remediator(mut self, remediator: Remediator) -> Self {
        self.remediator = Some(remediator);
        self
    }

    /// Disable per-issue rendering (e.g. for JSON output).
    pub fn set_render(&mut self, render: bool) {
        self.render = render && self.mode != Mode::Batch;
    }

    /// Whether issues are printed as they are recorded.
    pub fn renders(&self) -> bool {
        self.render
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn remediator(&self) -> Option<&Remediator> {
        self.remediator.as_ref()
    }

    /// Write the remediation record to `.docvet/session.json`, if there is
    /// a prompt attached. Called on every exit path of an interactive run.
    pub fn save_remediation(&self) -> Option<PathBuf> {
        let r = self.remediator.as_ref()?;
        remediate::flush_session(self.store.root(), &r.snapshot())
    }

    pub fn documents(&self) -> Vec<String> {
        self.store.list_documents()
    }

    /// Record one issue. In interactive mode this blocks on the prompt and
    /// may return `DocvetError::Interrupted`.
    pub fn record(
        &mut self,
        category: Category,
        file: impl Into<String>,
        line: usize,
        message: impl Into<String>,
        priority: Priority,
        metadata: FixKind,
    ) -> Result<()> {
        let seq = self.issues.len() + 1;
        let issue = Issue {
            id: format!("{}-{:03}", category.as_str(), seq),
            category,
            file: file.into(),
            line,
            message: message.into(),
            priority,
            metadata,
            timestamp: chrono::Local::now().to_rfc3339(),
        };
        self.issues.push(issue.clone());
        self.stats.add(priority);

        if self.render {
            output::print_issue(&issue);
        }
        if self.mode == Mode::Interactive {
            if let Some(r) = self.remediator.as_mut() {
                r.handle(&issue, &mut self.store)?;
            }
        }
        Ok(())
    }

    /// Clear issues and counters before the next pass.
    pub fn reset(&mut self) {
        self.issues.clear();
        self.stats = RunStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_record_assigns_sequential_ids_and_counts() {
        let dir = tempdir().unwrap();
        let mut s = AnalysisSession::new(dir.path(), Settings::default(), Mode::Batch);
        s.record(
            Category::Lint,
            "a.md",
            3,
            "first",
            Priority::Info,
            FixKind::TodoNoIssue,
        )
        .unwrap();
        s.record(
            Category::Lint,
            "a.md",
            0,
            "second",
            Priority::Warning,
            FixKind::Naming,
        )
        .unwrap();
        assert_eq!(s.issues()[0].id, "LINT-001");
        assert_eq!(s.issues()[1].id, "LINT-002");
        assert_eq!(s.stats().info, 1);
        assert_eq!(s.stats().warning, 1);

        s.reset();
        assert!(s.issues().is_empty());
        assert_eq!(s.stats(), RunStats::default());
        s.record(Category::Gap, "b.md", 0, "x", Priority::Critical, FixKind::Orphan)
            .unwrap();
        assert_eq!(s.issues()[0].id, "GAP-001");
    }
}
