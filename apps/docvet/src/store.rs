//! Document store: corpus discovery plus a cached, invalidatable text view.
//!
//! Paths handed out by the store are always relative to the project root
//! and use `/` separators. Every writer must go through `write` (or call
//! `invalidate` itself) so later reads never see stale text.

use crate::error::{DocvetError, Result};
use crate::persist::STATE_DIR;
use crate::utils::path_matches;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

pub struct DocumentStore {
    root: PathBuf,
    include: Vec<String>,
    ignore: Vec<String>,
    cache: HashMap<String, String>,
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>, include: Vec<String>, ignore: Vec<String>) -> Self {
        DocumentStore {
            root: root.into(),
            include,
            ignore,
            cache: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn abs_path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.abs_path(rel).exists()
    }

    /// Expand include globs, drop anything matching an ignore glob, and
    /// return de-duplicated relative paths in discovery order.
    pub fn list_documents(&self) -> Vec<String> {
        let root_pat = glob::Pattern::escape(&self.root.to_string_lossy());
        let mut seen: HashSet<String> = HashSet::new();
        let mut out: Vec<String> = Vec::new();
        for pat in &self.include {
            let pattern = format!("{}/{}", root_pat.trim_end_matches('/'), pat);
            let entries = match glob::glob(&pattern) {
                Ok(entries) => entries,
                Err(err) => {
                    tracing::warn!(pattern = %pat, error = %err, "skipping invalid scope pattern");
                    continue;
                }
            };
            for entry in entries.flatten() {
                if !entry.is_file() {
                    continue;
                }
                let Some(rel) = pathdiff::diff_paths(&entry, &self.root) else {
                    continue;
                };
                let rel = rel.to_string_lossy().replace('\\', "/");
                // generated reports never count as corpus documents
                if rel.starts_with(&format!("{}/", STATE_DIR)) {
                    continue;
                }
                if self.ignore.iter().any(|p| path_matches(p, &rel)) {
                    continue;
                }
                if seen.insert(rel.clone()) {
                    out.push(rel);
                }
            }
        }
        out
    }

    /// Cached read. Missing files yield `None`; unreadable files are
    /// logged and also yield `None`.
    pub fn read(&mut self, rel: &str) -> Option<String> {
        self.read_with(rel, true)
    }

    pub fn read_with(&mut self, rel: &str, use_cache: bool) -> Option<String> {
        if use_cache {
            if let Some(text) = self.cache.get(rel) {
                return Some(text.clone());
            }
        }
        let path = self.abs_path(rel);
        if !path.is_file() {
            return None;
        }
        match fs::read_to_string(&path) {
            Ok(text) => {
                if use_cache {
                    self.cache.insert(rel.to_string(), text.clone());
                }
                Some(text)
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to read document");
                None
            }
        }
    }

    pub fn invalidate(&mut self, rel: &str) {
        self.cache.remove(rel);
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Overwrite a document and drop its cache entry.
    pub fn write(&mut self, rel: &str, content: &str) -> Result<()> {
        let path = self.abs_path(rel);
        let res = fs::write(&path, content).map_err(|e| DocvetError::io(&path, e));
        self.invalidate(rel);
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, text: &str) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, text).unwrap();
    }

    #[test]
    fn test_list_documents_applies_scope() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "README.md", "# R");
        write(root, "01_INTRO.md", "# I");
        write(root, "notes.draft.md", "# D");
        write(root, "architecture/RTM.md", "# RTM");
        write(root, "architecture/deep/X.md", "# X");
        write(root, "claudedocs/tmp.md", "# T");
        write(root, "other/skip.md", "# S");

        let store = DocumentStore::new(
            root,
            vec![
                "*.md".into(),
                "architecture/**/*.md".into(),
                "claudedocs/**/*.md".into(),
                "README.md".into(),
            ],
            vec!["claudedocs/**".into(), "*.draft.md".into()],
        );
        let docs = store.list_documents();
        assert!(docs.contains(&"README.md".to_string()));
        assert!(docs.contains(&"01_INTRO.md".to_string()));
        assert!(docs.contains(&"architecture/RTM.md".to_string()));
        assert!(docs.contains(&"architecture/deep/X.md".to_string()));
        assert!(!docs.iter().any(|d| d.starts_with("claudedocs/")));
        assert!(!docs.contains(&"notes.draft.md".to_string()));
        assert!(!docs.contains(&"other/skip.md".to_string()));
        // README matched twice, listed once
        assert_eq!(docs.iter().filter(|d| *d == "README.md").count(), 1);
    }

    #[test]
    fn test_cache_survives_external_rewrite_until_invalidated() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "doc.md", "old");
        let mut store = DocumentStore::new(root, vec!["*.md".into()], vec![]);
        assert_eq!(store.read("doc.md").as_deref(), Some("old"));

        fs::write(root.join("doc.md"), "new").unwrap();
        assert_eq!(store.read("doc.md").as_deref(), Some("old"));
        assert_eq!(store.read_with("doc.md", false).as_deref(), Some("new"));
        // bypassing the cache does not refresh it
        assert_eq!(store.read("doc.md").as_deref(), Some("old"));

        store.invalidate("doc.md");
        assert_eq!(store.read("doc.md").as_deref(), Some("new"));

        fs::write(root.join("doc.md"), "newer").unwrap();
        store.clear();
        assert_eq!(store.read("doc.md").as_deref(), Some("newer"));
    }

    #[test]
    fn test_missing_document_reads_as_none() {
        let dir = tempdir().unwrap();
        let mut store = DocumentStore::new(dir.path(), vec![], vec![]);
        assert!(store.read("nope.md").is_none());
    }

    #[test]
    fn test_write_invalidates() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.md", "one");
        let mut store = DocumentStore::new(dir.path(), vec![], vec![]);
        assert_eq!(store.read("a.md").as_deref(), Some("one"));
        store.write("a.md", "two").unwrap();
        assert_eq!(store.read("a.md").as_deref(), Some("two"));
    }
}
