//! Coverage gaps: references to topics nobody wrote up, requirements
//! without acceptance criteria, stateful entities missing from the state
//! diagram, and integrations without an event catalog.

use crate::error::Result;
use crate::models::{Category, FixKind, GapKind, Priority};
use crate::session::AnalysisSession;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

const ACCEPTANCE_LIMIT: usize = 20;
const ENTITY_LIMIT: usize = 10;
/// Findings per category that become issues; the rest stay in the report.
const ISSUES_PER_KIND: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct GapFinding {
    pub kind: GapKind,
    pub file: String,
    pub line: usize,
    pub message: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, Serialize)]
pub struct GapGroup {
    pub kind: GapKind,
    pub label: &'static str,
    pub count: usize,
    pub findings: Vec<GapFinding>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GapsReport {
    pub total: usize,
    pub groups: Vec<GapGroup>,
}

fn mention_patterns() -> [&'static Regex; 6] {
    [
        cached_regex!(r#"(?i)см\.\s+(?:раздел\s+)?["«]([^"»]+)["»]"#),
        cached_regex!(r#"(?i)подробнее\s+в\s+["«]([^"»]+)["»]"#),
        cached_regex!(r#"(?i)описан[оа]?\s+в\s+["«]([^"»]+)["»]"#),
        cached_regex!(r#"(?i)\bsee\s+(?:section\s+)?["«]([^"»]+)["»]"#),
        cached_regex!(r#"(?i)\bdescribed\s+in\s+["«]([^"»]+)["»]"#),
        cached_regex!(r#"(?i)\bdetails\s+in\s+["«]([^"»]+)["»]"#),
    ]
}

fn topic_exists(topic: &str, documents: &[String], content: &str) -> bool {
    let topic_file = format!("{}.md", cached_regex!(r"\s+").replace_all(topic.trim(), "_"))
        .to_lowercase();
    documents
        .iter()
        .any(|d| d.to_lowercase().contains(&topic_file))
        || content.contains(&format!("# {}", topic))
}

pub fn unexplained_topics(documents: &[(String, String)]) -> Vec<GapFinding> {
    let names: Vec<String> = documents.iter().map(|(f, _)| f.clone()).collect();
    let mut out = Vec::new();
    for (file, content) in documents {
        for (idx, line) in content.lines().enumerate() {
            for re in mention_patterns() {
                for cap in re.captures_iter(line) {
                    let topic = cap[1].trim();
                    if topic_exists(topic, &names, content) {
                        continue;
                    }
                    out.push(GapFinding {
                        kind: GapKind::UnexplainedTopic,
                        file: file.clone(),
                        line: idx + 1,
                        message: format!("Topic \"{}\" is referenced but not documented", topic),
                        priority: Priority::Warning,
                    });
                }
            }
        }
    }
    out
}

fn is_requirements_doc(file: &str) -> bool {
    file.contains("REQUIREMENT") || cached_regex!(r"^\d{2}_.*\.md$").is_match(file)
}

fn has_acceptance_criteria(text: &str) -> bool {
    cached_regex!(
        r"(?i)acceptance|критери|criteria|условия приёмки|проверка:|тест:|test:|verification:"
    )
    .is_match(text)
        || cached_regex!(r"(?is)given.*when.*then").is_match(text)
}

/// Requirement bullets whose block (up to a blank line, heading, the
/// next requirement or end of file) never mentions acceptance criteria.
pub fn requirements_without_acceptance(documents: &[(String, String)]) -> Vec<GapFinding> {
    let requirement = cached_regex!(r"(?i)^[-*]\s+.*(должен|должна|MUST|SHOULD|SHALL|необходимо)");
    let mut out = Vec::new();
    for (file, content) in documents {
        if !is_requirements_doc(file) {
            continue;
        }
        let mut block: Option<(usize, String)> = None;
        let close = |block: &mut Option<(usize, String)>, out: &mut Vec<GapFinding>| {
            if let Some((line, text)) = block.take() {
                if !has_acceptance_criteria(&text) {
                    out.push(GapFinding {
                        kind: GapKind::MissingAcceptanceCriteria,
                        file: file.clone(),
                        line,
                        message: "Requirement without acceptance criteria".to_string(),
                        priority: Priority::Warning,
                    });
                }
            }
        };
        for (idx, line) in content.lines().enumerate() {
            if requirement.is_match(line) {
                close(&mut block, &mut out);
                block = Some((idx + 1, line.to_string()));
            } else if line.trim().is_empty() || line.starts_with('#') {
                close(&mut block, &mut out);
            } else if let Some((_, text)) = block.as_mut() {
                text.push('\n');
                text.push_str(line);
            }
        }
        close(&mut block, &mut out);
    }
    out.truncate(ACCEPTANCE_LIMIT);
    out
}

fn entity_patterns() -> [&'static Regex; 6] {
    [
        cached_regex!(r"(?i)статус[ыа]?\s+(\w+)"),
        cached_regex!(r"(?i)состояни[ея]\s+(\w+)"),
        cached_regex!(r"(?i)(\w+)\s+(?:может быть|имеет статус)"),
        cached_regex!(r"(?i)\bstatus(?:es)?\s+(\w+)"),
        cached_regex!(r"(?i)\bstate\s+(\w+)"),
        cached_regex!(r"(?i)(\w+)\s+(?:can be|has status)"),
    ]
}

pub fn entities_without_state_diagram(
    documents: &[(String, String)],
    state_diagram_file: &str,
    state_diagram: &str,
) -> Vec<GapFinding> {
    let mut seen = HashSet::new();
    let mut entities = Vec::new();
    for (_, content) in documents {
        for re in entity_patterns() {
            for cap in re.captures_iter(content) {
                let entity = cap[1].to_lowercase();
                if entity.chars().count() > 2 && seen.insert(entity.clone()) {
                    entities.push(entity);
                }
            }
        }
    }
    let diagram = state_diagram.to_lowercase();
    entities
        .into_iter()
        .filter(|e| !diagram.contains(e.as_str()))
        .take(ENTITY_LIMIT)
        .map(|e| GapFinding {
            kind: GapKind::MissingStateDiagram,
            file: state_diagram_file.to_string(),
            line: 0,
            message: format!("Entity \"{}\" has statuses but no state diagram", e),
            priority: Priority::Info,
        })
        .collect()
}

fn integration_patterns() -> [&'static Regex; 6] {
    [
        cached_regex!(r"(?i)интеграция\s+с\s+(\w+)"),
        cached_regex!(r"(?i)\bintegration\s+with\s+(\w+)"),
        cached_regex!(r"\bAPI\s+(\w+)"),
        cached_regex!(r"(?i)webhook(?:s|ы|и)?\s+(\w+)?"),
        cached_regex!(r"(?i)внешн[яий]+\s+(?:система|сервис)\s+(\w+)?"),
        cached_regex!(r"(?i)\bexternal\s+(?:system|service)\s+(\w+)?"),
    ]
}

/// Integration mentions counted across the corpus. Unnamed mentions count.
pub fn count_integrations(documents: &[(String, String)]) -> usize {
    documents
        .iter()
        .map(|(_, content)| {
            integration_patterns()
                .iter()
                .map(|re| {
                    re.captures_iter(content)
                        .filter(|cap| cap.get(1).map_or(true, |m| m.as_str().chars().count() > 2))
                        .count()
                })
                .sum::<usize>()
        })
        .sum()
}

pub fn run(session: &mut AnalysisSession) -> Result<GapsReport> {
    let mut documents: Vec<(String, String)> = Vec::new();
    for doc in session.documents() {
        if let Some(content) = session.store.read(&doc) {
            documents.push((doc, content));
        }
    }
    let state_file = session.settings.state_diagram_file.clone();
    let catalog_file = session.settings.event_catalog_file.clone();
    let state_diagram = session.store.read(&state_file).unwrap_or_default();

    let mut integrations = Vec::new();
    let mentions = count_integrations(&documents);
    if mentions > 0 && !session.store.exists(&catalog_file) {
        integrations.push(GapFinding {
            kind: GapKind::MissingEventCatalog,
            file: catalog_file,
            line: 0,
            message: format!("Found {} integration mentions but no event catalog", mentions),
            priority: Priority::Warning,
        });
    }

    let buckets = [
        (GapKind::UnexplainedTopic, unexplained_topics(&documents)),
        (
            GapKind::MissingAcceptanceCriteria,
            requirements_without_acceptance(&documents),
        ),
        (
            GapKind::MissingStateDiagram,
            entities_without_state_diagram(&documents, &state_file, &state_diagram),
        ),
        (GapKind::MissingEventCatalog, integrations),
    ];

    let mut report = GapsReport::default();
    for (kind, findings) in buckets {
        for f in findings.iter().take(ISSUES_PER_KIND) {
            session.record(
                Category::Gap,
                &f.file,
                f.line,
                f.message.clone(),
                f.priority,
                FixKind::Gap { kind },
            )?;
        }
        report.total += findings.len();
        report.groups.push(GapGroup {
            kind,
            label: kind.label(),
            count: findings.len(),
            findings,
        });
    }
    tracing::debug!(total = report.total, "gaps pass complete");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::passes::testutil::{batch_session, write};
    use tempfile::tempdir;

    fn docs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(f, c)| (f.to_string(), c.to_string()))
            .collect()
    }

    #[test]
    fn test_unexplained_topic_unless_file_or_heading_exists() {
        let d = docs(&[
            (
                "01_A.md",
                "См. раздел «Risk Model» и see \"Fee Policy\".\n## Fee Policy\nok\n",
            ),
            ("architecture/risk_model.md", "# x\n"),
            ("02_B.md", "Details in \"Missing Topic\".\n"),
        ]);
        let found = unexplained_topics(&d);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].file, "02_B.md");
        assert!(found[0].message.contains("Missing Topic"));
    }

    #[test]
    fn test_acceptance_blocks_are_checked_at_every_boundary() {
        let d = docs(&[(
            "03_REQUIREMENTS.md",
            "\
- The system MUST log withdrawals
  Acceptance: audit entry exists
- The system MUST notify admins
- The system SHOULD retry
## Next
- Users must confirm email
  Given signup When link clicked Then confirmed
- Payouts MUST be signed",
        )]);
        let lines: Vec<usize> = requirements_without_acceptance(&d)
            .iter()
            .map(|g| g.line)
            .collect();
        assert_eq!(lines, vec![3, 4, 8]);
    }

    #[test]
    fn test_non_requirement_docs_are_skipped() {
        let d = docs(&[("notes.md", "- It MUST work\n")]);
        assert!(requirements_without_acceptance(&d).is_empty());
    }

    #[test]
    fn test_entities_checked_against_state_diagram() {
        let d = docs(&[(
            "01_A.md",
            "Order status pending.\nСтатусы payment.\nInvoice can be paid.\n",
        )]);
        let found = entities_without_state_diagram(&d, "SM.md", "stateDiagram\n  Pending --> Done");
        let names: Vec<&str> = found.iter().map(|g| g.message.as_str()).collect();
        assert_eq!(names.len(), 2);
        assert!(names[0].contains("\"payment\""));
        assert!(names[1].contains("\"invoice\""));
        assert!(found.iter().all(|g| g.line == 0 && g.file == "SM.md"));
    }

    #[test]
    fn test_acceptance_findings_stop_at_twenty() {
        let body: String = (1..=25)
            .map(|i| format!("- Rule {} MUST be logged\n", i))
            .collect();
        let d = docs(&[("05_REQUIREMENTS.md", body.as_str())]);
        let found = requirements_without_acceptance(&d);
        assert_eq!(found.len(), 20);
        assert_eq!(found.last().unwrap().line, 20);
    }

    #[test]
    fn test_entity_findings_stop_at_ten() {
        let names = [
            "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "theta", "iota", "kappa",
            "lambda", "sigma", "omega",
        ];
        let body: String = names.iter().map(|n| format!("status {}\n", n)).collect();
        let d = docs(&[("01_A.md", body.as_str())]);
        let found = entities_without_state_diagram(&d, "SM.md", "");
        assert_eq!(found.len(), 10);
        assert!(found[0].message.contains("\"alpha\""));
        assert!(found[9].message.contains("\"kappa\""));
    }

    #[test]
    fn test_pass_groups_and_caps_issues() {
        let dir = tempdir().unwrap();
        let body: String = (0..7)
            .map(|i| format!("- Item {} MUST exist\n\n", i))
            .collect::<String>()
            + "Integration with Stripe via webhooks for payouts.\n";
        write(dir.path(), "04_REQUIREMENTS.md", &body);
        let mut s = batch_session(dir.path(), Settings::default());
        let report = run(&mut s).unwrap();
        let acceptance = report
            .groups
            .iter()
            .find(|g| g.kind == GapKind::MissingAcceptanceCriteria)
            .unwrap();
        assert_eq!(acceptance.count, 7);
        let catalog = report
            .groups
            .iter()
            .find(|g| g.kind == GapKind::MissingEventCatalog)
            .unwrap();
        assert_eq!(catalog.count, 1);
        assert!(catalog.findings[0].message.contains("2 integration"));
        // 5 acceptance + 1 catalog
        assert_eq!(s.stats().warning, 6);
    }
}
