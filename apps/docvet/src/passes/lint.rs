//! Structural lint: broken intra-corpus links, root naming, empty
//! sections, untracked TODO markers and required section headings.

use crate::error::Result;
use crate::models::{Category, FixKind, Priority};
use crate::session::AnalysisSession;
use crate::utils::{is_external_link, link_regex, resolve_link, truncate_chars};
use serde::Serialize;

/// Root files exempt from the naming convention.
const NAMING_ALLOW_LIST: &[&str] = &["README.md", "CHANGELOG.md", "TODO.md", "AGENTS.md"];

#[derive(Debug, Clone, Default, Serialize)]
pub struct LintReport {
    pub documents: usize,
    pub broken_links: usize,
    pub naming: usize,
    pub empty_sections: usize,
    pub todos: usize,
    pub missing_sections: usize,
}

/// Run every lint check over the corpus.
pub fn run(session: &mut AnalysisSession) -> Result<LintReport> {
    let docs = session.documents();
    let mut report = LintReport {
        documents: docs.len(),
        ..Default::default()
    };
    for doc in &docs {
        let Some(content) = session.store.read(doc) else {
            continue;
        };
        check_links(session, doc, &content, &mut report)?;
        check_naming(session, doc, &mut report)?;
        check_empty_sections(session, doc, &content, &mut report)?;
        check_todos(session, doc, &content, &mut report)?;
        check_required_sections(session, doc, &content, &mut report)?;
    }
    tracing::debug!(documents = report.documents, "lint pass complete");
    Ok(report)
}

fn check_links(
    session: &mut AnalysisSession,
    doc: &str,
    content: &str,
    report: &mut LintReport,
) -> Result<()> {
    for (idx, line) in content.lines().enumerate() {
        for cap in link_regex().captures_iter(line) {
            let text = &cap[1];
            let target = cap[2].trim();
            if is_external_link(target) {
                continue;
            }
            let resolved = resolve_link(doc, target);
            if resolved.is_empty() || session.store.exists(&resolved) {
                continue;
            }
            report.broken_links += 1;
            session.record(
                Category::Lint,
                doc,
                idx + 1,
                format!("Broken link: [{}]({})", text, target),
                Priority::Info,
                FixKind::BrokenLink {
                    link: target.to_string(),
                    text: text.to_string(),
                },
            )?;
        }
    }
    Ok(())
}

fn check_naming(session: &mut AnalysisSession, doc: &str, report: &mut LintReport) -> Result<()> {
    if doc.contains('/') || NAMING_ALLOW_LIST.contains(&doc) {
        return Ok(());
    }
    if session.settings.root_naming.is_match(doc) {
        return Ok(());
    }
    report.naming += 1;
    let pattern = session.settings.root_naming.as_str().to_string();
    session.record(
        Category::Lint,
        doc,
        0,
        format!("Naming: expected a name matching {}", pattern),
        Priority::Info,
        FixKind::Naming,
    )
}

fn is_section_heading(line: &str) -> bool {
    cached_regex!(r"^#{2,6}\s").is_match(line)
}

/// Headings (level 2+) with nothing but blank lines before the next one.
pub fn empty_sections(content: &str) -> Vec<(usize, String)> {
    let lines: Vec<&str> = content.lines().collect();
    let mut out = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        if !is_section_heading(line) {
            continue;
        }
        let body_empty = lines[idx + 1..]
            .iter()
            .take_while(|l| !is_section_heading(l))
            .all(|l| l.trim().is_empty());
        if body_empty {
            out.push((idx + 1, line.trim().to_string()));
        }
    }
    out
}

fn check_empty_sections(
    session: &mut AnalysisSession,
    doc: &str,
    content: &str,
    report: &mut LintReport,
) -> Result<()> {
    for (line, heading) in empty_sections(content) {
        report.empty_sections += 1;
        session.record(
            Category::Lint,
            doc,
            line,
            format!("Empty section: {}", heading),
            Priority::Info,
            FixKind::EmptySection { section: heading },
        )?;
    }
    Ok(())
}

fn check_todos(
    session: &mut AnalysisSession,
    doc: &str,
    content: &str,
    report: &mut LintReport,
) -> Result<()> {
    let marker = cached_regex!(r"(?i)\b(TODO|FIXME|XXX|HACK)\b");
    let reference = cached_regex!(r"#\d+|https?://\S+/issues/\d+");
    for (idx, line) in content.lines().enumerate() {
        if !marker.is_match(line) || reference.is_match(line) {
            continue;
        }
        report.todos += 1;
        session.record(
            Category::Lint,
            doc,
            idx + 1,
            format!("TODO without issue: {}", truncate_chars(line.trim(), 80)),
            Priority::Info,
            FixKind::TodoNoIssue,
        )?;
    }
    Ok(())
}

/// Required headings for a document, chosen by its file name.
fn required_sections<'a>(session: &'a AnalysisSession, doc: &str) -> &'a [String] {
    let name = doc.rsplit('/').next().unwrap_or(doc);
    let upper = name.to_uppercase();
    if upper.contains("REQUIREMENT")
        || cached_regex!(r"^\d{2}_REQUIREMENTS?\.md$").is_match(name)
    {
        &session.settings.requirements_sections
    } else if upper.contains("ADR") || name.to_lowercase().contains("decision") {
        &session.settings.decision_sections
    } else {
        &[]
    }
}

fn check_required_sections(
    session: &mut AnalysisSession,
    doc: &str,
    content: &str,
    report: &mut LintReport,
) -> Result<()> {
    let missing: Vec<String> = required_sections(session, doc)
        .iter()
        .filter(|s| !content.contains(s.as_str()))
        .cloned()
        .collect();
    for section in missing {
        report.missing_sections += 1;
        session.record(
            Category::Lint,
            doc,
            0,
            format!("Missing required section: {}", section),
            Priority::Warning,
            FixKind::MissingSection { section },
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::passes::testutil::{batch_session, write};
    use tempfile::tempdir;

    #[test]
    fn test_valid_corpus_has_no_link_or_section_issues() {
        let dir = tempdir().unwrap();
        write(dir.path(), "README.md", "# Project\n\n[Doc](01_DOC.md)\n");
        write(dir.path(), "01_DOC.md", "# Doc\n\n## Content\n\nText.\n");
        let mut s = batch_session(dir.path(), Settings::default());
        let report = run(&mut s).unwrap();
        assert_eq!(report.documents, 2);
        assert_eq!(report.broken_links, 0);
        assert_eq!(report.empty_sections, 0);
        assert_eq!(report.naming, 0);
    }

    #[test]
    fn test_broken_link_and_external_targets() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "README.md",
            "[Gone](missing.md) [Web](https://x.org) [Anchor](#top) [Mail](mailto:a@b.c)\n",
        );
        let mut s = batch_session(dir.path(), Settings::default());
        run(&mut s).unwrap();
        let broken: Vec<_> = s
            .issues()
            .iter()
            .filter(|i| matches!(i.metadata, FixKind::BrokenLink { .. }))
            .collect();
        assert_eq!(broken.len(), 1);
        assert_eq!(broken[0].line, 1);
        assert_eq!(broken[0].priority, Priority::Info);
    }

    #[test]
    fn test_naming_todo_and_empty_sections() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "notes.md",
            "# Notes\n## Empty\n\n## Filled\nTODO: write more\nFIXME #12 tracked\n## Trailing\n",
        );
        let mut s = batch_session(dir.path(), Settings::default());
        let report = run(&mut s).unwrap();
        assert_eq!(report.naming, 1);
        assert_eq!(report.todos, 1);
        assert_eq!(report.empty_sections, 2);
        let sections: Vec<_> = s
            .issues()
            .iter()
            .filter_map(|i| match &i.metadata {
                FixKind::EmptySection { section } => Some((i.line, section.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(
            sections,
            vec![(2, "## Empty".to_string()), (7, "## Trailing".to_string())]
        );
    }

    #[test]
    fn test_required_sections_for_requirement_docs() {
        let dir = tempdir().unwrap();
        write(dir.path(), "03_REQUIREMENTS.md", "# Req\n## Scope\nx\n");
        let mut settings = Settings::default();
        settings.requirements_sections = vec!["## Scope".into(), "## Acceptance".into()];
        let mut s = batch_session(dir.path(), settings);
        let report = run(&mut s).unwrap();
        assert_eq!(report.missing_sections, 1);
        let issue = s
            .issues()
            .iter()
            .find(|i| matches!(i.metadata, FixKind::MissingSection { .. }))
            .unwrap();
        assert_eq!(issue.priority, Priority::Warning);
        assert!(issue.message.contains("## Acceptance"));
    }

    #[test]
    fn test_lint_is_idempotent() {
        let dir = tempdir().unwrap();
        write(dir.path(), "bad name.md", "## X\n[a](b.md)\nTODO\n");
        let mut s = batch_session(dir.path(), Settings::default());
        run(&mut s).unwrap();
        let first: Vec<String> = s.issues().iter().map(|i| i.message.clone()).collect();
        s.reset();
        run(&mut s).unwrap();
        let second: Vec<String> = s.issues().iter().map(|i| i.message.clone()).collect();
        assert_eq!(first, second);
        // naming, broken link, todo
        assert_eq!(first.len(), 3);
    }
}
