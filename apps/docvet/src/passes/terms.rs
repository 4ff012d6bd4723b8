//! Terminology consistency against the project glossary.
//!
//! The glossary is a markdown table; its first column names the canonical
//! terms. Forbidden synonyms are checked whether or not a glossary exists.

use crate::error::Result;
use crate::models::{Category, FixKind, Priority};
use crate::passes::percent;
use crate::session::AnalysisSession;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

/// New-term candidates beyond this many are listed but not recorded.
const NEW_TERM_ISSUE_LIMIT: usize = 10;

#[derive(Debug, Clone, Default, Serialize)]
pub struct TermsReport {
    pub glossary_file: String,
    pub glossary_found: bool,
    pub total_terms: usize,
    pub used_terms: usize,
    pub coverage: u32,
    pub unused_terms: Vec<String>,
    pub new_terms: Vec<String>,
    pub synonym_violations: usize,
}

/// Canonical terms from a glossary table, in first-seen order.
pub fn parse_glossary(content: &str) -> Vec<String> {
    let bold_row = cached_regex!(r"\|\s*\*\*([^*]+)\*\*\s*\|");
    let plain_row = cached_regex!(r"\|\s*([^|*]+)\s*\|.*\|");
    let mut seen = HashSet::new();
    let mut terms = Vec::new();
    for line in content.lines() {
        if line.trim().is_empty() || line.contains("---") {
            continue;
        }
        let term = if let Some(cap) = bold_row.captures(line) {
            cap[1].trim().to_string()
        } else if let Some(cap) = plain_row.captures(line) {
            cap[1].trim().to_string()
        } else {
            continue;
        };
        let lower = term.to_lowercase();
        if lower == "term" || lower == "термин" {
            continue;
        }
        if !term.is_empty() && seen.insert(term.clone()) {
            terms.push(term);
        }
    }
    terms
}

pub fn run(session: &mut AnalysisSession) -> Result<TermsReport> {
    let glossary_file = session.settings.glossary_file.clone();
    let glossary_text = session.store.read(&glossary_file);
    let terms = glossary_text
        .as_deref()
        .map(parse_glossary)
        .unwrap_or_default();
    if glossary_text.is_none() {
        tracing::debug!(file = %glossary_file, "glossary not found");
    }

    let synonyms: Vec<(Regex, String, String)> = session
        .settings
        .forbidden_synonyms
        .iter()
        .flat_map(|g| {
            g.forbidden.iter().filter_map(move |syn| {
                Regex::new(&format!(r"(?i)\b{}\b", regex::escape(syn)))
                    .ok()
                    .map(|re| (re, syn.clone(), g.canonical.clone()))
            })
        })
        .collect();

    let known: HashSet<String> = terms.iter().map(|t| t.to_lowercase()).collect();
    let mut used: HashSet<usize> = HashSet::new();
    let mut seen_new: HashSet<String> = HashSet::new();
    let mut new_terms: Vec<(String, usize, String)> = Vec::new();
    let mut synonym_violations = 0;

    for doc in session.documents() {
        if doc == glossary_file {
            continue;
        }
        let Some(content) = session.store.read(&doc) else {
            continue;
        };

        for (idx, line) in content.lines().enumerate() {
            for (re, syn, canonical) in &synonyms {
                if !re.is_match(line) {
                    continue;
                }
                synonym_violations += 1;
                session.record(
                    Category::Term,
                    &doc,
                    idx + 1,
                    format!("Forbidden synonym \"{}\": use \"{}\"", syn, canonical),
                    Priority::Warning,
                    FixKind::Synonym {
                        synonym: syn.clone(),
                        canonical: canonical.clone(),
                    },
                )?;
            }
            for cap in cached_regex!(r"\*\*([^*]+)\*\*").captures_iter(line) {
                let candidate = cap[1].trim();
                if candidate.chars().count() < 3 {
                    continue;
                }
                let lower = candidate.to_lowercase();
                if known.contains(&lower) || !seen_new.insert(lower) {
                    continue;
                }
                new_terms.push((candidate.to_string(), idx + 1, doc.clone()));
            }
        }

        let lower = content.to_lowercase();
        for (i, term) in terms.iter().enumerate() {
            if lower.contains(&term.to_lowercase()) {
                used.insert(i);
            }
        }
    }

    for (term, line, doc) in new_terms.iter().take(NEW_TERM_ISSUE_LIMIT) {
        session.record(
            Category::Term,
            doc,
            *line,
            format!("New term candidate: \"{}\" is not in the glossary", term),
            Priority::Info,
            FixKind::NewTerm { term: term.clone() },
        )?;
    }

    let unused_terms: Vec<String> = terms
        .iter()
        .enumerate()
        .filter(|(i, _)| !used.contains(i))
        .map(|(_, t)| t.clone())
        .collect();
    let report = TermsReport {
        glossary_found: glossary_text.is_some(),
        glossary_file,
        total_terms: terms.len(),
        used_terms: used.len(),
        coverage: percent(used.len(), terms.len()),
        unused_terms,
        new_terms: new_terms.into_iter().map(|(t, _, _)| t).collect(),
        synonym_violations,
    };
    tracing::debug!(coverage = report.coverage, terms = report.total_terms, "terms pass complete");
    Ok(report)
}
