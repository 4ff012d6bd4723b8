//! Shared data models: the issue taxonomy and per-priority counters.

pub mod history;

use crate::config::ArtifactPriority;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
/// Which pass produced an issue.
pub enum Category {
    Lint,
    Term,
    Viewpoint,
    Contradiction,
    Gap,
    Link,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Lint => "LINT",
            Category::Term => "TERM",
            Category::Viewpoint => "VIEWPOINT",
            Category::Contradiction => "CONTRADICTION",
            Category::Gap => "GAP",
            Category::Link => "LINK",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    Warning,
    Info,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Critical => "CRITICAL",
            Priority::Warning => "WARNING",
            Priority::Info => "INFO",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Priority::Critical => "🔴",
            Priority::Warning => "🟡",
            Priority::Info => "🟢",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
/// The four kinds of documentation gaps.
pub enum GapKind {
    UnexplainedTopic,
    MissingAcceptanceCriteria,
    MissingStateDiagram,
    MissingEventCatalog,
}

impl GapKind {
    pub fn label(&self) -> &'static str {
        match self {
            GapKind::UnexplainedTopic => "Mentioned topics",
            GapKind::MissingAcceptanceCriteria => "Acceptance criteria",
            GapKind::MissingStateDiagram => "State diagrams",
            GapKind::MissingEventCatalog => "Event catalog",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "fix_type", rename_all = "snake_case")]
/// Category-specific metadata. The variant decides which remediation
/// actions are available and how an issue is explained.
pub enum FixKind {
    BrokenLink { link: String, text: String },
    Naming,
    EmptySection { section: String },
    TodoNoIssue,
    MissingSection { section: String },
    Synonym { synonym: String, canonical: String },
    NewTerm { term: String },
    MissingArtifact {
        viewpoint: String,
        priority: ArtifactPriority,
    },
    ArtifactContent { viewpoint: String, marker: String },
    Contradiction {
        parameter: String,
        values: Vec<String>,
    },
    LogicalConflict { other_file: String, other_line: usize },
    Gap { kind: GapKind },
    Orphan,
    DeadEnd,
}

impl FixKind {
    /// Only these kinds have an automatic fix applier.
    pub fn is_fixable(&self) -> bool {
        matches!(
            self,
            FixKind::BrokenLink { .. } | FixKind::Synonym { .. } | FixKind::EmptySection { .. }
        )
    }
}

#[derive(Debug, Clone, Serialize)]
/// A single finding. Immutable once recorded.
pub struct Issue {
    pub id: String,
    pub category: Category,
    pub file: String,
    /// 1-based; 0 means the whole file.
    pub line: usize,
    pub message: String,
    pub priority: Priority,
    pub metadata: FixKind,
    pub timestamp: String,
}

impl Issue {
    /// `file` or `file:line` when a line is known.
    pub fn location(&self) -> String {
        if self.line > 0 {
            format!("{}:{}", self.file, self.line)
        } else {
            self.file.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Issue counts per priority for one pass or a whole review.
pub struct RunStats {
    #[serde(default)]
    pub critical: usize,
    #[serde(default)]
    pub warning: usize,
    #[serde(default)]
    pub info: usize,
}

impl RunStats {
    pub fn add(&mut self, priority: Priority) {
        match priority {
            Priority::Critical => self.critical += 1,
            Priority::Warning => self.warning += 1,
            Priority::Info => self.info += 1,
        }
    }

    pub fn merge(&mut self, other: &RunStats) {
        self.critical += other.critical;
        self.warning += other.warning;
        self.info += other.info;
    }

    pub fn total(&self) -> usize {
        self.critical + self.warning + self.info
    }

    /// Tri-level batch exit signal: 0 clean, 1 warnings/info, 2 criticals.
    pub fn exit_code(&self) -> i32 {
        if self.critical > 0 {
            2
        } else if self.warning > 0 || self.info > 0 {
            1
        } else {
            0
        }
    }
}
