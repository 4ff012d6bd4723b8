//! Interactive remediation: a per-issue prompt loop plus the fix appliers.
//!
//! The prompt stays in `Prompting` until a terminal action (fix, skip,
//! ignore) or `edit` is chosen; `explain` prints and loops. Every applier
//! writes through `DocumentStore::write`, which drops the cache entry.

use crate::error::{DocvetError, Result};
use crate::models::history::{IgnoreEntry, SessionRecord};
use crate::models::{Category, FixKind, Issue};
use crate::persist;
use crate::store::DocumentStore;
use crate::utils::{file_stem, normalize_rel};
use regex::{NoExpand, Regex};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};

/// Terminal I/O seam so the state machine can run against scripted input.
pub trait Console {
    fn say(&mut self, text: &str);
    /// Read one answer. End of input is reported as `Interrupted`.
    fn ask(&mut self, prompt: &str) -> Result<String>;
    /// Open `path` at `line` in the user's editor and block until done.
    fn open_editor(&mut self, path: &Path, line: usize) -> Result<()>;
}

/// Console backed by stdin/stdout and `$EDITOR`.
pub struct StdConsole;

impl Console for StdConsole {
    fn say(&mut self, text: &str) {
        println!("{}", text);
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        print!("{}", prompt);
        let _ = io::stdout().flush();
        let mut line = String::new();
        let n = io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| DocvetError::io("<stdin>", e))?;
        if n == 0 {
            return Err(DocvetError::Interrupted);
        }
        Ok(line.trim().to_string())
    }

    fn open_editor(&mut self, path: &Path, line: usize) -> Result<()> {
        let editor = std::env::var("EDITOR").unwrap_or_else(|_| "code".to_string());
        let shown = path.display().to_string();
        let args: Vec<String> = if editor.contains("code") {
            vec!["-g".into(), format!("{}:{}", shown, line)]
        } else if editor.contains("vim") {
            vec![format!("+{}", line), shown.clone()]
        } else {
            vec![shown.clone()]
        };
        self.say(&format!("📝 Opening: {} {}", editor, args.join(" ")));
        if let Err(err) = Command::new(&editor).args(&args).status() {
            tracing::warn!(%editor, error = %err, "failed to launch editor");
        }
        self.ask("Press Enter when done editing...")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Fix,
    Skip,
    Ignore,
    Edit,
    Explain,
}

impl Action {
    /// Unrecognized input maps to `None`, which callers treat as skip.
    pub fn parse(input: &str) -> Option<Action> {
        match input.trim().to_lowercase().as_str() {
            "f" | "fix" => Some(Action::Fix),
            "s" | "skip" => Some(Action::Skip),
            "i" | "ignore" => Some(Action::Ignore),
            "e" | "edit" => Some(Action::Edit),
            "x" | "explain" => Some(Action::Explain),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixOutcome {
    Applied,
    /// The user declined or the text no longer matched.
    NotApplied,
}

pub struct Remediator {
    console: Box<dyn Console>,
    record: Arc<Mutex<SessionRecord>>,
}

impl Remediator {
    pub fn new(console: Box<dyn Console>) -> Self {
        Remediator {
            console,
            record: Arc::new(Mutex::new(SessionRecord::default())),
        }
    }

    /// Shared view of the running session record, for out-of-band flushes.
    pub fn record_handle(&self) -> Arc<Mutex<SessionRecord>> {
        Arc::clone(&self.record)
    }

    /// Stamp and return the current session record.
    pub fn snapshot(&self) -> SessionRecord {
        snapshot_of(&self.record)
    }

    fn update(&self, f: impl FnOnce(&mut SessionRecord)) {
        match self.record.lock() {
            Ok(mut r) => f(&mut r),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    /// Run the prompt loop for one freshly recorded issue.
    pub fn handle(&mut self, issue: &Issue, store: &mut DocumentStore) -> Result<()> {
        self.update(|r| {
            r.processed += 1;
            r.stats.add(issue.priority);
        });
        let fixable = issue.metadata.is_fixable();
        loop {
            let menu = if fixable {
                "[f]ix  [s]kip  [i]gnore  [e]dit  e[x]plain"
            } else {
                "(fix unavailable)  [s]kip  [i]gnore  [e]dit  e[x]plain"
            };
            self.console.say(menu);
            let answer = self.console.ask("> ")?;
            match Action::parse(&answer) {
                Some(Action::Explain) => {
                    for line in explain(issue) {
                        self.console.say(&line);
                    }
                    continue;
                }
                Some(Action::Fix) if fixable => {
                    let outcome = self.apply_fix(issue, store)?;
                    let id = issue.id.clone();
                    match outcome {
                        FixOutcome::Applied => self.update(|r| r.fixed.push(id)),
                        FixOutcome::NotApplied => self.update(|r| r.skipped.push(id)),
                    }
                }
                Some(Action::Fix) => {
                    self.console
                        .say("⚠️ No automatic fix for this issue; skipping.");
                    let id = issue.id.clone();
                    self.update(|r| r.skipped.push(id));
                }
                Some(Action::Skip) => {
                    self.console.say("⏭️ Skipped");
                    let id = issue.id.clone();
                    self.update(|r| r.skipped.push(id));
                }
                Some(Action::Ignore) => {
                    let entry = IgnoreEntry {
                        id: issue.id.clone(),
                        file: format!("{}:{}", issue.file, issue.line),
                        reason: "User ignored".to_string(),
                        created: chrono::Local::now().format("%Y-%m-%d").to_string(),
                    };
                    if let Err(err) = persist::append_ignore(store.root(), &entry) {
                        tracing::warn!(error = %err, "failed to append ignore log");
                    }
                    self.console.say("🚫 Added to ignore log");
                    let id = issue.id.clone();
                    self.update(|r| r.ignored.push(id));
                }
                Some(Action::Edit) => {
                    let path = store.abs_path(&issue.file);
                    self.console.open_editor(&path, issue.line)?;
                    store.invalidate(&issue.file);
                }
                None => {
                    self.console.say("Unknown action, skipping...");
                    let id = issue.id.clone();
                    self.update(|r| r.skipped.push(id));
                }
            }
            return Ok(());
        }
    }

    fn apply_fix(&mut self, issue: &Issue, store: &mut DocumentStore) -> Result<FixOutcome> {
        match &issue.metadata {
            FixKind::BrokenLink { link, text } => {
                fix_broken_link(self.console.as_mut(), store, &issue.file, link, text)
            }
            FixKind::Synonym { synonym, canonical } => {
                self.console
                    .say(&format!("🔧 \"{}\" → \"{}\"", synonym, canonical));
                fix_synonym(store, &issue.file, issue.line, synonym, canonical)
            }
            FixKind::EmptySection { section } => {
                self.console.say(&format!("🔧 Section: {}", section));
                let answer = self.console.ask("Delete section? [y/n]: ")?;
                if !answer.eq_ignore_ascii_case("y") {
                    return Ok(FixOutcome::NotApplied);
                }
                fix_empty_section(store, &issue.file, section)
            }
            _ => Ok(FixOutcome::NotApplied),
        }
    }
}

/// Corpus documents whose base name contains, or is contained in, the
/// base name of the broken target. At most five.
pub fn similar_files(documents: &[String], broken_link: &str) -> Vec<String> {
    let wanted = file_stem(broken_link.split('#').next().unwrap_or("")).to_lowercase();
    if wanted.is_empty() {
        return Vec::new();
    }
    documents
        .iter()
        .filter(|d| {
            let stem = file_stem(d).to_lowercase();
            !stem.is_empty() && (wanted.contains(&stem) || stem.contains(&wanted))
        })
        .take(5)
        .cloned()
        .collect()
}

/// Path of `target` as written from inside `from_file`'s directory.
fn link_from(from_file: &str, target: &str) -> String {
    let dir = match from_file.rfind('/') {
        Some(idx) => &from_file[..idx],
        None => return target.to_string(),
    };
    pathdiff::diff_paths(target, dir)
        .map(|p| normalize_rel(&p.to_string_lossy().replace('\\', "/")))
        .unwrap_or_else(|| target.to_string())
}

fn replace_in_document(
    store: &mut DocumentStore,
    file: &str,
    old: &str,
    new: &str,
) -> Result<FixOutcome> {
    let Some(content) = store.read_with(file, false) else {
        return Ok(FixOutcome::NotApplied);
    };
    let updated = content.replace(old, new);
    if updated == content {
        return Ok(FixOutcome::NotApplied);
    }
    store.write(file, &updated)?;
    Ok(FixOutcome::Applied)
}

/// Either unwrap the link (keeping its text) or retarget it at a similar
/// corpus document chosen by the user.
pub fn fix_broken_link(
    console: &mut dyn Console,
    store: &mut DocumentStore,
    file: &str,
    link: &str,
    text: &str,
) -> Result<FixOutcome> {
    let original = format!("[{}]({})", text, link);
    let candidates = similar_files(&store.list_documents(), link);

    if candidates.is_empty() {
        console.say("No similar files found.");
        let answer = console.ask("Remove link? [y/n]: ")?;
        if answer.eq_ignore_ascii_case("y") {
            return replace_in_document(store, file, &original, text);
        }
        return Ok(FixOutcome::NotApplied);
    }

    console.say("Similar files:");
    for (i, c) in candidates.iter().enumerate() {
        console.say(&format!("  {}. {}", i + 1, c));
    }
    console.say("  0. Remove link (keep text)");
    let answer = console.ask(&format!("Choose (0-{}): ", candidates.len()))?;
    let choice = answer.trim().parse::<usize>().unwrap_or(0);
    if choice == 0 {
        replace_in_document(store, file, &original, text)
    } else if let Some(target) = candidates.get(choice - 1) {
        let replacement = format!("[{}]({})", text, link_from(file, target));
        replace_in_document(store, file, &original, &replacement)
    } else {
        Ok(FixOutcome::NotApplied)
    }
}

/// Replace a forbidden synonym with its canonical term on one line only.
/// The canonical spelling is inserted verbatim.
pub fn fix_synonym(
    store: &mut DocumentStore,
    file: &str,
    line: usize,
    synonym: &str,
    canonical: &str,
) -> Result<FixOutcome> {
    let Some(content) = store.read(file) else {
        return Ok(FixOutcome::NotApplied);
    };
    let Ok(re) = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(synonym))) else {
        return Ok(FixOutcome::NotApplied);
    };
    let mut lines: Vec<String> = content.split_inclusive('\n').map(str::to_string).collect();
    let Some(target) = line.checked_sub(1).and_then(|i| lines.get_mut(i)) else {
        return Ok(FixOutcome::NotApplied);
    };
    let replaced = re.replace_all(target, NoExpand(canonical)).into_owned();
    if replaced == *target {
        return Ok(FixOutcome::NotApplied);
    }
    *target = replaced;
    store.write(file, &lines.concat())?;
    Ok(FixOutcome::Applied)
}

/// Delete every line whose text is exactly the section heading.
pub fn fix_empty_section(
    store: &mut DocumentStore,
    file: &str,
    section: &str,
) -> Result<FixOutcome> {
    let Some(content) = store.read(file) else {
        return Ok(FixOutcome::NotApplied);
    };
    let Ok(re) = Regex::new(&format!(r"(?m)^{}[ \t]*(?:\r?\n|\z)", regex::escape(section)))
    else {
        return Ok(FixOutcome::NotApplied);
    };
    let updated = re.replace_all(&content, "").into_owned();
    if updated == content {
        return Ok(FixOutcome::NotApplied);
    }
    store.write(file, &updated)?;
    Ok(FixOutcome::Applied)
}

/// Human explanation for an issue, chosen by category and metadata.
pub fn explain(issue: &Issue) -> Vec<String> {
    let mut out = vec!["📚 Explanation".to_string()];
    let body: Vec<String> = match &issue.metadata {
        FixKind::BrokenLink { link, .. } => vec![
            format!("Broken link: `{}` points to a file that does not exist.", link),
            "Options: correct the path, create the missing file, or remove the link.".into(),
        ],
        FixKind::Naming => vec![
            "Naming convention violation.".into(),
            "Root documents are expected to look like NN_TITLE.md (e.g. 01_INTRO.md).".into(),
        ],
        FixKind::EmptySection { .. } => vec![
            "Empty section: a heading with no content before the next heading.".into(),
            "Add content or delete the section.".into(),
        ],
        FixKind::TodoNoIssue => vec![
            "TODO/FIXME without an issue reference.".into(),
            "Reference a tracker item, e.g. `TODO #123` or an issue URL.".into(),
        ],
        FixKind::MissingSection { section } => vec![
            format!("Required section `{}` is missing.", section),
            "Requirements and decision records must carry the configured headings.".into(),
        ],
        FixKind::Synonym { synonym, canonical } => vec![
            "A forbidden synonym is used; prefer the canonical term for consistency.".into(),
            format!("Forbidden: {}", synonym),
            format!("Use: {}", canonical),
        ],
        FixKind::NewTerm { term } => vec![
            format!("`{}` is emphasised like a term but is not in the glossary.", term),
            "Add it to the glossary or use an existing term.".into(),
        ],
        FixKind::MissingArtifact { viewpoint, priority } => vec![
            "A required viewpoint artifact is missing.".into(),
            format!("Viewpoint: {}", viewpoint),
            format!("Priority: {:?}", priority).to_lowercase(),
            "Create the file with the expected documentation.".into(),
        ],
        FixKind::ArtifactContent { viewpoint, marker } => vec![
            format!("The {} artifact lacks an expected element: {}.", viewpoint, marker),
        ],
        FixKind::Contradiction { parameter, values } => vec![
            format!(
                "`{}` has different values across documents: {}.",
                parameter,
                values.join(" vs ")
            ),
            "Pick the correct value and update every document.".into(),
        ],
        FixKind::LogicalConflict { other_file, other_line } => vec![
            "Two statements use opposite keywords in a similar context.".into(),
            format!("Compare with {}:{}.", other_file, other_line),
        ],
        FixKind::Gap { kind } => vec![
            "Documentation gap detected.".into(),
            format!("Category: {}", kind.label()),
            "Add the missing information.".into(),
        ],
        FixKind::Orphan => vec![
            "No document links here.".into(),
            "Link it from README or a related document.".into(),
        ],
        FixKind::DeadEnd => vec![
            "This document links to no other document.".into(),
            "Add links to related documents.".into(),
        ],
    };
    out.extend(body);
    if issue.category == Category::Contradiction {
        out.push("Contradictions lead to confusion and implementation errors.".into());
    }
    out
}

/// Copy of a shared session record, stamped with the current time.
pub fn snapshot_of(record: &Mutex<SessionRecord>) -> SessionRecord {
    let mut rec = match record.lock() {
        Ok(r) => r.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    };
    rec.timestamp = chrono::Local::now().to_rfc3339();
    rec
}

/// Persist the current session record, logging instead of failing.
pub fn flush_session(root: &Path, record: &SessionRecord) -> Option<PathBuf> {
    match persist::save_session(root, record) {
        Ok(path) => Some(path),
        Err(err) => {
            tracing::warn!(error = %err, "failed to save session");
            None
        }
    }
}
