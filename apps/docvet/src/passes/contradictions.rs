//! Cross-document contradictions.
//!
//! Two heuristics: numeric parameters that take different literal values
//! in different places, and statements with opposite keywords that share
//! enough context words to look like they talk about the same thing.
//! Both are approximate; false positives are expected.

use crate::config::Heuristics;
use crate::error::Result;
use crate::models::{Category, FixKind, Priority};
use crate::session::AnalysisSession;
use regex::Regex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Statements closer than this in the same file are treated as one context.
const SAME_CONTEXT_LINES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterOccurrence {
    pub parameter: String,
    pub value: String,
    pub file: String,
    pub line: usize,
    pub context: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParameterConflict {
    pub parameter: String,
    pub values: Vec<String>,
    pub occurrences: Vec<ParameterOccurrence>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogicalConflict {
    pub file1: String,
    pub line1: usize,
    pub text1: String,
    pub file2: String,
    pub line2: usize,
    pub text2: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ContradictionsReport {
    pub occurrences: usize,
    pub conflicts: Vec<ParameterConflict>,
    pub logical_conflicts: Vec<LogicalConflict>,
}

fn value_patterns() -> [&'static Regex; 5] {
    [
        cached_regex!(
            r"(?i)(?:до|не более|минимум|максимум|около|up to|at most|at least)?\s*(\d+(?:[.,]\d+)?)\s*%"
        ),
        cached_regex!(r"\$\s*(\d+(?:[.,]\d+)?)"),
        cached_regex!(r"(?i)(\d+(?:[.,]\d+)?)\s*(?:USD|EUR|RUB|руб|долл)"),
        cached_regex!(
            r"(?i)(\d+)\s*(?:секунд|минут|час|дней|сек|мин|seconds?|minutes?|hours?|days?)"
        ),
        cached_regex!(
            r"(?i)(\d+)\s*(?:подтвержд|частей|попыт|раз|confirmations?|parts?|attempts?|retries)"
        ),
    ]
}

/// First configured keyword found in `line` names its parameter.
pub fn identify_parameter(line: &str, keywords: &[(String, String)]) -> Option<String> {
    let lower = line.to_lowercase();
    keywords
        .iter()
        .find(|(kw, _)| lower.contains(&kw.to_lowercase()))
        .map(|(_, param)| param.clone())
}

fn context_window(line: &str, value: &str) -> String {
    let pattern = format!(r"(\S+\s+){{0,5}}{}(\s+\S+){{0,5}}", regex::escape(value));
    Regex::new(&pattern)
        .ok()
        .and_then(|re| re.find(line).map(|m| m.as_str().to_string()))
        .unwrap_or_else(|| line.trim().to_string())
}

/// Numeric parameter occurrences in one document.
pub fn extract_parameters(
    file: &str,
    content: &str,
    keywords: &[(String, String)],
) -> Vec<ParameterOccurrence> {
    let mut out: Vec<ParameterOccurrence> = Vec::new();
    let mut seen: HashSet<(String, usize, String)> = HashSet::new();
    for (idx, line) in content.lines().enumerate() {
        let Some(parameter) = identify_parameter(line, keywords) else {
            continue;
        };
        for re in value_patterns() {
            for cap in re.captures_iter(line) {
                let value = cap[1].to_string();
                if !seen.insert((parameter.clone(), idx, value.clone())) {
                    continue;
                }
                out.push(ParameterOccurrence {
                    parameter: parameter.clone(),
                    context: context_window(line, &value),
                    value,
                    file: file.to_string(),
                    line: idx + 1,
                });
            }
        }
    }
    out
}

/// Group by parameter and keep the groups with more than one distinct
/// value. Groups come out in order of first appearance.
pub fn find_parameter_conflicts(occurrences: &[ParameterOccurrence]) -> Vec<ParameterConflict> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<ParameterOccurrence>> = HashMap::new();
    for occ in occurrences {
        let entry = groups.entry(occ.parameter.clone()).or_insert_with(|| {
            order.push(occ.parameter.clone());
            Vec::new()
        });
        entry.push(occ.clone());
    }
    order
        .into_iter()
        .filter_map(|parameter| {
            let occs = groups.remove(&parameter)?;
            let mut values: Vec<String> = Vec::new();
            for o in &occs {
                if !values.contains(&o.value) {
                    values.push(o.value.clone());
                }
            }
            (values.len() > 1).then_some(ParameterConflict {
                parameter,
                values,
                occurrences: occs,
            })
        })
        .collect()
}

struct Statement {
    file: String,
    line: usize,
    text: String,
    keyword: usize,
}

/// Whole-word match for short keywords, word-start match for longer ones
/// so stems still hit inflected forms.
fn keyword_regex(keyword: &str) -> Option<Regex> {
    let escaped = regex::escape(&keyword.to_lowercase());
    let pattern = if keyword.chars().count() >= 4 {
        format!(r"(?i)\b{}", escaped)
    } else {
        format!(r"(?i)\b{}\b", escaped)
    };
    Regex::new(&pattern).ok()
}

fn context_words(text: &str, stop_words: &HashSet<String>) -> HashSet<String> {
    cached_regex!(r"\W+")
        .split(&text.to_lowercase())
        .filter(|w| !w.is_empty() && !stop_words.contains(*w))
        .map(str::to_string)
        .collect()
}

/// Pairs of statements that use opposite keywords in similar wording.
pub fn find_logical_conflicts(
    documents: &[(String, String)],
    heuristics: &Heuristics,
) -> Vec<LogicalConflict> {
    let keywords: Vec<Option<Regex>> = heuristics
        .opposites
        .iter()
        .flat_map(|(a, b)| [keyword_regex(a), keyword_regex(b)])
        .collect();
    let stop_words: HashSet<String> = heuristics
        .stop_words
        .iter()
        .map(|w| w.to_lowercase())
        .collect();

    let mut statements: Vec<Statement> = Vec::new();
    for (file, content) in documents {
        for (idx, line) in content.lines().enumerate() {
            for (k, re) in keywords.iter().enumerate() {
                if re.as_ref().is_some_and(|re| re.is_match(line)) {
                    statements.push(Statement {
                        file: file.clone(),
                        line: idx + 1,
                        text: line.trim().to_string(),
                        keyword: k,
                    });
                }
            }
        }
    }

    let limit = heuristics.logical_conflict_limit;
    let mut conflicts = Vec::new();
    for pair in 0..heuristics.opposites.len() {
        let (first, second) = (pair * 2, pair * 2 + 1);
        for s1 in statements.iter().filter(|s| s.keyword == first) {
            for s2 in statements.iter().filter(|s| s.keyword == second) {
                if s1.file == s2.file && s1.line.abs_diff(s2.line) < SAME_CONTEXT_LINES {
                    continue;
                }
                let w1 = context_words(&s1.text, &stop_words);
                let w2 = context_words(&s2.text, &stop_words);
                if w1.intersection(&w2).count() < heuristics.min_shared_words {
                    continue;
                }
                conflicts.push(LogicalConflict {
                    file1: s1.file.clone(),
                    line1: s1.line,
                    text1: s1.text.clone(),
                    file2: s2.file.clone(),
                    line2: s2.line,
                    text2: s2.text.clone(),
                });
                if conflicts.len() >= limit {
                    return conflicts;
                }
            }
        }
    }
    conflicts
}

pub fn run(session: &mut AnalysisSession) -> Result<ContradictionsReport> {
    let heuristics = session.settings.heuristics.clone();
    let mut documents: Vec<(String, String)> = Vec::new();
    for doc in session.documents() {
        if let Some(content) = session.store.read(&doc) {
            documents.push((doc, content));
        }
    }

    let occurrences: Vec<ParameterOccurrence> = documents
        .iter()
        .flat_map(|(file, content)| {
            extract_parameters(file, content, &heuristics.parameter_keywords)
        })
        .collect();
    let conflicts = find_parameter_conflicts(&occurrences);
    for c in &conflicts {
        let Some(first) = c.occurrences.first() else {
            continue;
        };
        let places: Vec<String> = c
            .occurrences
            .iter()
            .map(|o| format!("{}:{} = {}", o.file, o.line, o.value))
            .collect();
        session.record(
            Category::Contradiction,
            &first.file,
            first.line,
            format!(
                "Contradiction in \"{}\": {} ({})",
                c.parameter,
                c.values.join(" vs "),
                places.join(", ")
            ),
            Priority::Critical,
            FixKind::Contradiction {
                parameter: c.parameter.clone(),
                values: c.values.clone(),
            },
        )?;
    }

    let logical = find_logical_conflicts(&documents, &heuristics);
    for lc in &logical {
        session.record(
            Category::Contradiction,
            &lc.file1,
            lc.line1,
            format!(
                "Possible logical conflict: \"{}\" vs {}:{} \"{}\"",
                crate::utils::truncate_chars(&lc.text1, 60),
                lc.file2,
                lc.line2,
                crate::utils::truncate_chars(&lc.text2, 60)
            ),
            Priority::Warning,
            FixKind::LogicalConflict {
                other_file: lc.file2.clone(),
                other_line: lc.line2,
            },
        )?;
    }

    tracing::debug!(
        occurrences = occurrences.len(),
        conflicts = conflicts.len(),
        logical = logical.len(),
        "contradictions pass complete"
    );
    Ok(ContradictionsReport {
        occurrences: occurrences.len(),
        conflicts,
        logical_conflicts: logical,
    })
}
