//! Command runner and the full-review orchestrator.
//!
//! Single commands run one pass and append a history record named after
//! the command. `review` runs all six passes in three phases, resetting
//! the session between passes so each pass's counts stand alone, then
//! scores the aggregate against the previous review.

use crate::error::Result;
use crate::models::history::ReviewRun;
use crate::models::{Issue, RunStats};
use crate::output;
use crate::passes::{
    contradictions::{self, ContradictionsReport},
    gaps::{self, GapsReport},
    links::{self, LinksReport},
    lint::{self, LintReport},
    terms::{self, TermsReport},
    viewpoints::{self, ViewpointsReport},
};
use crate::persist;
use crate::session::AnalysisSession;
use serde::Serialize;
use std::time::Instant;

/// Recommendations shown at most.
const MAX_RECOMMENDATIONS: usize = 5;
/// Coverage below this percentage triggers a recommendation.
const COVERAGE_TARGET: u32 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Lint,
    Links { mermaid: bool },
    Terms,
    Viewpoints,
    Contradictions,
    Gaps,
    Review,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Lint => "lint",
            Command::Links { .. } => "links",
            Command::Terms => "terms",
            Command::Viewpoints => "viewpoints",
            Command::Contradictions => "contradictions",
            Command::Gaps => "gaps",
            Command::Review => "review",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PassReport {
    Lint(LintReport),
    Links(LinksReport),
    Terms(TermsReport),
    Viewpoints(ViewpointsReport),
    Contradictions(ContradictionsReport),
    Gaps(GapsReport),
    Review(Box<ReviewReport>),
}

/// Result of one command: its structured report plus the issues and
/// counts recorded while it ran.
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutcome {
    pub command: &'static str,
    pub report: PassReport,
    pub stats: RunStats,
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsDelta {
    pub critical: i64,
    pub warning: i64,
    pub info: i64,
}

impl StatsDelta {
    pub fn between(current: &RunStats, previous: &RunStats) -> Self {
        StatsDelta {
            critical: current.critical as i64 - previous.critical as i64,
            warning: current.warning as i64 - previous.warning as i64,
            info: current.info as i64 - previous.info as i64,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PassSummary {
    pub name: &'static str,
    pub stats: RunStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewReport {
    pub passes: Vec<PassSummary>,
    pub total: RunStats,
    pub previous: Option<ReviewRun>,
    pub delta: Option<StatsDelta>,
    pub score: u32,
    pub grade: char,
    pub viewpoint_coverage: u32,
    pub glossary_coverage: u32,
    pub orphans: usize,
    pub recommendations: Vec<String>,
    pub elapsed_secs: f64,
}

/// `100 - 10*critical - 2*warning - 0.5*info`, clamped to 0..=100 and rounded.
pub fn score(stats: &RunStats) -> u32 {
    let raw = 100.0
        - 10.0 * stats.critical as f64
        - 2.0 * stats.warning as f64
        - 0.5 * stats.info as f64;
    raw.clamp(0.0, 100.0).round() as u32
}

pub fn grade(score: u32) -> char {
    match score {
        s if s >= 90 => 'A',
        s if s >= 80 => 'B',
        s if s >= 70 => 'C',
        s if s >= 60 => 'D',
        _ => 'F',
    }
}

/// Ranked advice for the next round of documentation work.
pub fn recommendations(
    total: &RunStats,
    contradictions: usize,
    viewpoint_coverage: u32,
    glossary_coverage: u32,
    orphans: usize,
) -> Vec<String> {
    let mut out = Vec::new();
    if total.critical > 0 {
        out.push(format!("Fix {} critical issue(s) first", total.critical));
    }
    if contradictions > 0 {
        out.push(format!(
            "Resolve {} contradiction(s) between documents",
            contradictions
        ));
    }
    if viewpoint_coverage < COVERAGE_TARGET {
        out.push(format!(
            "Raise viewpoint coverage ({}%) by adding the missing artifacts",
            viewpoint_coverage
        ));
    }
    if glossary_coverage < COVERAGE_TARGET {
        out.push(format!(
            "Use glossary terms more consistently ({}% of terms used)",
            glossary_coverage
        ));
    }
    if orphans > 0 {
        out.push(format!(
            "Link {} orphan document(s) from README or a parent document",
            orphans
        ));
    }
    out.truncate(MAX_RECOMMENDATIONS);
    out
}

fn run_pass(session: &mut AnalysisSession, cmd: Command) -> Result<PassReport> {
    Ok(match cmd {
        Command::Lint => PassReport::Lint(lint::run(session)?),
        Command::Links { mermaid } => PassReport::Links(links::run(session, mermaid)?),
        Command::Terms => PassReport::Terms(terms::run(session)?),
        Command::Viewpoints => PassReport::Viewpoints(viewpoints::run(session)?),
        Command::Contradictions => PassReport::Contradictions(contradictions::run(session)?),
        Command::Gaps => PassReport::Gaps(gaps::run(session)?),
        Command::Review => PassReport::Review(Box::new(review(session)?)),
    })
}

fn record_history(session: &AnalysisSession, command: &str, stats: RunStats) {
    if let Err(err) = persist::append_run(session.store.root(), command, stats) {
        tracing::warn!(command, error = %err, "failed to save history");
    }
}

/// Run one command and append its history record.
///
/// For `review` the issues list holds every pass's issues and the stats
/// are the grand total.
pub fn run_command(session: &mut AnalysisSession, cmd: Command) -> Result<CommandOutcome> {
    if cmd == Command::Review {
        let mut issues = Vec::new();
        let report = review_collecting(session, &mut issues)?;
        let stats = report.total;
        return Ok(CommandOutcome {
            command: cmd.name(),
            report: PassReport::Review(Box::new(report)),
            stats,
            issues,
        });
    }
    session.reset();
    let report = run_pass(session, cmd)?;
    let stats = session.stats();
    record_history(session, cmd.name(), stats);
    Ok(CommandOutcome {
        command: cmd.name(),
        report,
        stats,
        issues: session.issues().to_vec(),
    })
}

/// Full review over all passes. Persists a `review` history record.
pub fn review(session: &mut AnalysisSession) -> Result<ReviewReport> {
    let mut sink = Vec::new();
    review_collecting(session, &mut sink)
}

fn review_collecting(
    session: &mut AnalysisSession,
    issues: &mut Vec<Issue>,
) -> Result<ReviewReport> {
    let started = Instant::now();
    let previous = persist::load_history(session.store.root())
        .last_of(Command::Review.name())
        .cloned();

    let phases: [&[Command]; 3] = [
        &[Command::Lint, Command::Links { mermaid: false }],
        &[Command::Terms, Command::Viewpoints],
        &[Command::Contradictions, Command::Gaps],
    ];

    let mut total = RunStats::default();
    let mut passes = Vec::new();
    let mut viewpoint_coverage = 0;
    let mut glossary_coverage = 0;
    let mut orphans = 0;
    let mut contradictions = 0;

    for (n, phase) in phases.iter().enumerate() {
        tracing::debug!(phase = n + 1, "review phase");
        for cmd in phase.iter() {
            session.reset();
            if session.renders() {
                output::print_pass_header(cmd.name());
            }
            match run_pass(session, *cmd)? {
                PassReport::Links(r) => orphans = r.orphans.len(),
                PassReport::Terms(r) => glossary_coverage = r.coverage,
                PassReport::Viewpoints(r) => viewpoint_coverage = r.coverage,
                PassReport::Contradictions(r) => {
                    contradictions = r.conflicts.len() + r.logical_conflicts.len()
                }
                _ => {}
            }
            let stats = session.stats();
            total.merge(&stats);
            issues.extend_from_slice(session.issues());
            passes.push(PassSummary {
                name: cmd.name(),
                stats,
            });
        }
    }

    let score = score(&total);
    let report = ReviewReport {
        passes,
        total,
        delta: previous
            .as_ref()
            .map(|p| StatsDelta::between(&total, &p.metrics)),
        previous,
        score,
        grade: grade(score),
        viewpoint_coverage,
        glossary_coverage,
        orphans,
        recommendations: recommendations(
            &total,
            contradictions,
            viewpoint_coverage,
            glossary_coverage,
            orphans,
        ),
        elapsed_secs: (started.elapsed().as_secs_f64() * 10.0).round() / 10.0,
    };
    record_history(session, Command::Review.name(), total);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(critical: usize, warning: usize, info: usize) -> RunStats {
        RunStats {
            critical,
            warning,
            info,
        }
    }

    #[test]
    fn test_score_and_grade_bands() {
        assert_eq!(score(&stats(0, 0, 0)), 100);
        assert_eq!(score(&stats(1, 0, 0)), 90);
        assert_eq!(score(&stats(0, 1, 1)), 98);
        assert_eq!(score(&stats(20, 0, 0)), 0);
        assert_eq!(grade(100), 'A');
        assert_eq!(grade(90), 'A');
        assert_eq!(grade(89), 'B');
        assert_eq!(grade(70), 'C');
        assert_eq!(grade(60), 'D');
        assert_eq!(grade(59), 'F');
    }

    #[test]
    fn test_score_is_monotone_and_clamped() {
        for c in 0..6 {
            for w in 0..12 {
                for i in 0..30 {
                    let base = score(&stats(c, w, i));
                    assert!(base <= 100);
                    assert!(score(&stats(c + 1, w, i)) <= base);
                    assert!(score(&stats(c, w + 1, i)) <= base);
                    assert!(score(&stats(c, w, i + 1)) <= base);
                }
            }
        }
    }

    #[test]
    fn test_recommendations_are_ranked_and_capped() {
        let all = recommendations(&stats(2, 0, 0), 1, 50, 10, 3);
        assert_eq!(all.len(), 5);
        assert!(all[0].contains("2 critical"));
        assert!(all[4].contains("orphan"));
        assert!(recommendations(&stats(0, 4, 4), 0, 100, 90, 0).is_empty());
    }

    #[test]
    fn test_delta_is_signed() {
        let d = StatsDelta::between(&stats(1, 5, 0), &stats(3, 2, 0));
        assert_eq!(
            d,
            StatsDelta {
                critical: -2,
                warning: 3,
                info: 0
            }
        );
    }
}
