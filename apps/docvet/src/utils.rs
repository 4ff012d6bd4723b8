//! Small shared helpers: colored stderr prefixes, link extraction, and
//! lexical path handling for corpus-relative paths.

use glob::{MatchOptions, Pattern};
use owo_colors::OwoColorize;
use regex::Regex;
use std::sync::OnceLock;

fn colors_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix() -> String {
    if colors_enabled() {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

pub fn warn_prefix() -> String {
    if colors_enabled() {
        "warn:".yellow().bold().to_string()
    } else {
        "warn:".to_string()
    }
}

pub fn info_prefix() -> String {
    if colors_enabled() {
        "info:".blue().bold().to_string()
    } else {
        "info:".to_string()
    }
}

pub fn note_prefix() -> String {
    if colors_enabled() {
        "note:".bright_black().bold().to_string()
    } else {
        "note:".to_string()
    }
}

/// Inline markdown link `[text](target)`.
pub fn link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("static regex"))
}

/// A link that points outside the corpus: any URI scheme (http, https,
/// mailto, ...) or an in-page fragment.
pub fn is_external_link(target: &str) -> bool {
    if target.starts_with('#') {
        return true;
    }
    let Some((scheme, _)) = target.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_alphabetic() {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
}

/// Lexically clean a `/`-separated relative path: drops `.` segments and
/// folds `..` into its parent where possible. Leading `..` that would
/// escape the root are kept. An empty result becomes `"."`.
pub fn normalize_rel(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(last) if *last != "..") {
                    parts.pop();
                } else {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Resolve a link target found in `from_file` to a corpus-relative path.
///
/// The fragment is stripped first; an empty remainder resolves to `""`.
pub fn resolve_link(from_file: &str, link: &str) -> String {
    let path_part = link.split('#').next().unwrap_or("");
    if path_part.is_empty() {
        return String::new();
    }
    let dir = match from_file.rfind('/') {
        Some(idx) => &from_file[..idx],
        None => "",
    };
    if dir.is_empty() {
        normalize_rel(path_part)
    } else {
        normalize_rel(&format!("{}/{}", dir, path_part))
    }
}

/// Shell-style match where `*` does not cross `/` and `**/` spans directories.
pub fn path_matches(pattern: &str, path: &str) -> bool {
    let opts = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    match Pattern::new(pattern) {
        Ok(p) => p.matches_with(path, opts),
        Err(err) => {
            tracing::warn!(pattern, error = %err, "ignoring invalid glob pattern");
            false
        }
    }
}

/// File name without directories or the last extension.
pub fn file_stem(path: &str) -> &str {
    let base = path.rsplit('/').next().unwrap_or(path);
    match base.rfind('.') {
        Some(idx) if idx > 0 => &base[..idx],
        _ => base,
    }
}

/// Truncate to at most `max` characters without splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
