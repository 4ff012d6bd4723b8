//! Architectural viewpoint coverage: required artifacts exist and carry
//! the marker their viewpoint expects.

use crate::config::ArtifactPriority;
use crate::error::Result;
use crate::models::{Category, FixKind, Priority};
use crate::passes::percent;
use crate::session::AnalysisSession;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ViewpointStatus {
    pub name: String,
    pub covered: usize,
    pub total: usize,
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ViewpointsReport {
    pub viewpoints: Vec<ViewpointStatus>,
    pub covered: usize,
    pub total: usize,
    pub coverage: u32,
    pub security_incomplete: bool,
}

/// Marker expected inside an existing artifact, keyed by viewpoint kind.
struct ContentCheck {
    marker: &'static str,
    message: &'static str,
    priority: Priority,
    present: fn(&str) -> bool,
}

fn content_check(viewpoint: &str) -> Option<ContentCheck> {
    match viewpoint.trim_end_matches("_viewpoint") {
        "data" => Some(ContentCheck {
            marker: "state diagram",
            message: "Artifact has no State Diagram (expected a mermaid stateDiagram)",
            priority: Priority::Info,
            present: |c| c.contains("stateDiagram") || c.contains("State Diagram"),
        }),
        "security" => Some(ContentCheck {
            marker: "threat model",
            message: "Security artifact has no STRIDE analysis or trust boundaries",
            priority: Priority::Warning,
            present: |c| cached_regex!(r"(?i)STRIDE|Trust.*Bound|Threat.*Model").is_match(c),
        }),
        "business_rules" => Some(ContentCheck {
            marker: "decision table",
            message: "Artifact has no Decision Table",
            priority: Priority::Info,
            present: |c| {
                c.contains("Decision Table")
                    || cached_regex!(r"(?i)\|.*\|.*\|.*(Result|Результат|Outcome)").is_match(c)
            },
        }),
        _ => None,
    }
}

pub fn run(session: &mut AnalysisSession) -> Result<ViewpointsReport> {
    let viewpoints = session.settings.viewpoints.clone();
    let mut report = ViewpointsReport::default();

    for vp in &viewpoints {
        let mut status = ViewpointStatus {
            name: vp.name.clone(),
            covered: 0,
            total: vp.artifacts.len(),
            missing: Vec::new(),
        };
        for artifact in &vp.artifacts {
            let Some(content) = session.store.read(&artifact.file) else {
                status.missing.push(artifact.file.clone());
                let priority = match artifact.priority {
                    ArtifactPriority::Must => Priority::Critical,
                    ArtifactPriority::Should => Priority::Warning,
                };
                session.record(
                    Category::Viewpoint,
                    &artifact.file,
                    0,
                    format!("Missing {} artifact for {}", priority_word(artifact.priority), vp.name),
                    priority,
                    FixKind::MissingArtifact {
                        viewpoint: vp.name.clone(),
                        priority: artifact.priority,
                    },
                )?;
                continue;
            };
            status.covered += 1;
            if let Some(check) = content_check(&vp.name) {
                if !(check.present)(&content) {
                    session.record(
                        Category::Viewpoint,
                        &artifact.file,
                        0,
                        check.message,
                        check.priority,
                        FixKind::ArtifactContent {
                            viewpoint: vp.name.clone(),
                            marker: check.marker.to_string(),
                        },
                    )?;
                }
            }
        }
        if vp.name.trim_end_matches("_viewpoint") == "security" && status.covered < status.total {
            report.security_incomplete = true;
        }
        report.covered += status.covered;
        report.total += status.total;
        report.viewpoints.push(status);
    }
    report.coverage = percent(report.covered, report.total);
    tracing::debug!(coverage = report.coverage, "viewpoints pass complete");
    Ok(report)
}

fn priority_word(p: ArtifactPriority) -> &'static str {
    match p {
        ArtifactPriority::Must => "required",
        ArtifactPriority::Should => "recommended",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::passes::testutil::{batch_session, write};
    use tempfile::tempdir;

    #[test]
    fn test_empty_project_misses_every_default_artifact() {
        let dir = tempdir().unwrap();
        let mut s = batch_session(dir.path(), Settings::default());
        let report = run(&mut s).unwrap();
        assert_eq!(report.total, 6);
        assert_eq!(report.covered, 0);
        assert_eq!(report.coverage, 0);
        assert!(report.security_incomplete);
        // STATE_MACHINES, BUSINESS_RULES and THREAT_MODEL are "must"
        assert_eq!(s.stats().critical, 3);
        assert_eq!(s.stats().warning, 3);
    }

    #[test]
    fn test_content_markers() {
        let dir = tempdir().unwrap();
        write(dir.path(), "architecture/STATE_MACHINES.md", "```mermaid\nstateDiagram-v2\n```\n");
        write(dir.path(), "architecture/DATA_FLOWS.md", "flows only\n");
        write(dir.path(), "architecture/THREAT_MODEL.md", "# Threats\nnothing here\n");
        write(
            dir.path(),
            "architecture/BUSINESS_RULES.md",
            "| Input | Limit | Result |\n|---|---|---|\n",
        );
        let mut s = batch_session(dir.path(), Settings::default());
        let report = run(&mut s).unwrap();
        assert_eq!(report.covered, 4);
        assert_eq!(report.coverage, 67);
        assert!(!report.security_incomplete);

        let content: Vec<_> = s
            .issues()
            .iter()
            .filter(|i| matches!(i.metadata, FixKind::ArtifactContent { .. }))
            .map(|i| (i.file.clone(), i.priority))
            .collect();
        assert_eq!(
            content,
            vec![
                ("architecture/DATA_FLOWS.md".to_string(), Priority::Info),
                ("architecture/THREAT_MODEL.md".to_string(), Priority::Warning),
            ]
        );
    }
}
