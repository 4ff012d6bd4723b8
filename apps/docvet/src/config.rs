//! Configuration discovery and resolution into typed `Settings`.
//!
//! Docvet reads `docvet.toml|yaml|yml` from the project root (or closest
//! ancestor) and resolves it once into a `Settings` value. Every field is
//! optional in the file; missing fields take the built-in defaults:
//! - `glossary.file`: `02_GLOSSARY.md`
//! - `scope.strict`: `*.md`, `architecture/**/*.md`, `decisions/**/*.md`
//! - `scope.ignore`: `claudedocs/**`, `*.draft.md`
//! - `link_exceptions.not_orphans`: `README.md`, `CHANGELOG.md`, `**/GLOSSARY.md`
//! - `link_exceptions.not_dead_ends`: `**/GLOSSARY.md`, `**/INDEX.md`
//! - `formatting.root_naming`: `^[0-9]{2}_[A-Z_]+\.md$`
//! - `modeling_standards.viewpoints`: data, business_rules, security,
//!   integration, traceability (see `default_viewpoints`)
//!
//! A malformed file never aborts a run: the loader reports it through
//! `ConfigStatus::Malformed` and the defaults are used instead.

use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILES: [&str; 3] = ["docvet.toml", "docvet.yaml", "docvet.yml"];
pub const DEFAULT_ROOT_NAMING: &str = r"^[0-9]{2}_[A-Z_]+\.md$";

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration as written on disk.
pub struct RawConfig {
    pub version: Option<u32>,
    pub glossary: Option<GlossaryCfg>,
    pub scope: Option<ScopeCfg>,
    pub link_exceptions: Option<LinkExceptionsCfg>,
    pub formatting: Option<FormattingCfg>,
    pub modeling_standards: Option<ModelingCfg>,
    pub heuristics: Option<HeuristicsCfg>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct GlossaryCfg {
    pub file: Option<String>,
    /// Groups of `[canonical, forbidden...]`.
    pub forbidden_synonyms: Option<Vec<Vec<String>>>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct ScopeCfg {
    pub strict: Option<Vec<String>>,
    pub ignore: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct LinkExceptionsCfg {
    pub not_orphans: Option<Vec<String>>,
    pub not_dead_ends: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct FormattingCfg {
    pub root_naming: Option<String>,
    pub requirements_sections: Option<Vec<String>>,
    pub decision_sections: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct ModelingCfg {
    /// Kept in file order; entries are decoded into `ViewpointCfg` on resolve.
    pub viewpoints: Option<serde_json::Map<String, serde_json::Value>>,
    pub state_diagram_file: Option<String>,
    pub event_catalog_file: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct ViewpointCfg {
    #[serde(default)]
    pub artifacts: Vec<ArtifactCfg>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
/// An artifact is either a bare path or `{file, priority}`.
pub enum ArtifactCfg {
    Path(String),
    Detailed {
        file: String,
        #[serde(default)]
        priority: Option<String>,
    },
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct HeuristicsCfg {
    pub opposites: Option<Vec<Vec<String>>>,
    pub stop_words: Option<Vec<String>>,
    pub parameter_keywords: Option<Vec<ParameterKeywordCfg>>,
    pub min_shared_words: Option<usize>,
    pub logical_conflict_limit: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ParameterKeywordCfg {
    pub keyword: String,
    pub parameter: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactPriority {
    Must,
    Should,
}

impl ArtifactPriority {
    fn parse(s: Option<&str>) -> Self {
        match s {
            Some(p) if p.eq_ignore_ascii_case("must") => ArtifactPriority::Must,
            _ => ArtifactPriority::Should,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactSpec {
    pub file: String,
    pub priority: ArtifactPriority,
}

#[derive(Debug, Clone)]
pub struct ViewpointSpec {
    pub name: String,
    pub artifacts: Vec<ArtifactSpec>,
}

#[derive(Debug, Clone)]
/// A canonical term and the synonyms that must not be used for it.
pub struct SynonymGroup {
    pub canonical: String,
    pub forbidden: Vec<String>,
}

#[derive(Debug, Clone)]
/// Tunables for the approximate text heuristics.
pub struct Heuristics {
    pub opposites: Vec<(String, String)>,
    pub stop_words: Vec<String>,
    /// Ordered; the first keyword found on a line names the parameter.
    pub parameter_keywords: Vec<(String, String)>,
    pub min_shared_words: usize,
    pub logical_conflict_limit: usize,
}

impl Default for Heuristics {
    fn default() -> Self {
        let pairs = [
            ("обязательно", "необязательно"),
            ("должен", "не должен"),
            ("всегда", "никогда"),
            ("разрешено", "запрещено"),
            ("включен", "отключен"),
            ("да", "нет"),
            ("mandatory", "optional"),
            ("must", "must not"),
            ("always", "never"),
            ("allowed", "forbidden"),
            ("enabled", "disabled"),
            ("yes", "no"),
        ];
        let stop_words = [
            "и", "или", "в", "на", "для", "с", "по", "the", "a", "an", "and", "or", "to", "of",
            "in", "is", "be",
        ];
        let keywords = [
            ("горячий кошелёк", "hot_wallet_limit"),
            ("hot wallet", "hot_wallet_limit"),
            ("холодный", "cold_wallet"),
            ("cold wallet", "cold_wallet"),
            ("подтвержд", "confirmations"),
            ("confirm", "confirmations"),
            ("таймаут", "timeout"),
            ("timeout", "timeout"),
            ("лимит", "limit"),
            ("limit", "limit"),
            ("retry", "retry_count"),
            ("попыт", "retry_count"),
            ("RTO", "rto"),
            ("RPO", "rpo"),
        ];
        Heuristics {
            opposites: pairs
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect(),
            stop_words: stop_words.iter().map(|s| s.to_string()).collect(),
            parameter_keywords: keywords
                .iter()
                .map(|(k, p)| (k.to_string(), p.to_string()))
                .collect(),
            min_shared_words: 2,
            logical_conflict_limit: 10,
        }
    }
}

#[derive(Debug, Clone)]
/// Fully-resolved settings consumed by every pass.
pub struct Settings {
    pub glossary_file: String,
    pub forbidden_synonyms: Vec<SynonymGroup>,
    pub include: Vec<String>,
    pub ignore: Vec<String>,
    pub not_orphans: Vec<String>,
    pub not_dead_ends: Vec<String>,
    pub root_naming: Regex,
    pub requirements_sections: Vec<String>,
    pub decision_sections: Vec<String>,
    pub viewpoints: Vec<ViewpointSpec>,
    pub state_diagram_file: String,
    pub event_catalog_file: String,
    pub heuristics: Heuristics,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_root_naming() -> Regex {
    Regex::new(DEFAULT_ROOT_NAMING).expect("default naming regex")
}

/// Built-in viewpoint catalogue used when the config names none.
pub fn default_viewpoints() -> Vec<ViewpointSpec> {
    let vp = |name: &str, artifacts: &[(&str, ArtifactPriority)]| ViewpointSpec {
        name: name.to_string(),
        artifacts: artifacts
            .iter()
            .map(|(file, priority)| ArtifactSpec {
                file: file.to_string(),
                priority: *priority,
            })
            .collect(),
    };
    use ArtifactPriority::{Must, Should};
    vec![
        vp(
            "data_viewpoint",
            &[
                ("architecture/STATE_MACHINES.md", Must),
                ("architecture/DATA_FLOWS.md", Should),
            ],
        ),
        vp(
            "business_rules_viewpoint",
            &[("architecture/BUSINESS_RULES.md", Must)],
        ),
        vp("security_viewpoint", &[("architecture/THREAT_MODEL.md", Must)]),
        vp(
            "integration_viewpoint",
            &[("architecture/EVENT_CATALOG.md", Should)],
        ),
        vp("traceability_viewpoint", &[("architecture/RTM.md", Should)]),
    ]
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            glossary_file: "02_GLOSSARY.md".to_string(),
            forbidden_synonyms: Vec::new(),
            include: strings(&["*.md", "architecture/**/*.md", "decisions/**/*.md"]),
            ignore: strings(&["claudedocs/**", "*.draft.md"]),
            not_orphans: strings(&["README.md", "CHANGELOG.md", "**/GLOSSARY.md"]),
            not_dead_ends: strings(&["**/GLOSSARY.md", "**/INDEX.md"]),
            root_naming: default_root_naming(),
            requirements_sections: Vec::new(),
            decision_sections: Vec::new(),
            viewpoints: default_viewpoints(),
            state_diagram_file: "architecture/STATE_MACHINES.md".to_string(),
            event_catalog_file: "architecture/EVENT_CATALOG.md".to_string(),
            heuristics: Heuristics::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Where the active settings came from.
pub enum ConfigStatus {
    Missing,
    Loaded(PathBuf),
    Malformed { path: PathBuf, reason: String },
}

/// Walk upward from `start` to detect the project root.
///
/// Stops when a `docvet.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_project_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_FILES.iter().any(|f| cur.join(f).exists()) {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `RawConfig` from the first config file present under `root`.
pub fn load_config(root: &Path) -> Result<Option<(PathBuf, RawConfig)>, (PathBuf, String)> {
    for name in CONFIG_FILES {
        let path = root.join(name);
        if !path.exists() {
            continue;
        }
        let text = fs::read_to_string(&path).map_err(|e| (path.clone(), e.to_string()))?;
        let parsed = if name.ends_with(".toml") {
            toml::from_str::<RawConfig>(&text).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str::<Option<RawConfig>>(&text)
                .map(Option::unwrap_or_default)
                .map_err(|e| e.to_string())
        };
        return match parsed {
            Ok(cfg) => Ok(Some((path, cfg))),
            Err(reason) => Err((path, reason)),
        };
    }
    Ok(None)
}

/// Resolve settings for `root`, falling back to defaults on any problem.
pub fn load_settings(root: &Path) -> (Settings, ConfigStatus) {
    match load_config(root) {
        Ok(None) => (Settings::default(), ConfigStatus::Missing),
        Ok(Some((path, raw))) => {
            let settings = resolve_settings(raw);
            (settings, ConfigStatus::Loaded(path))
        }
        Err((path, reason)) => {
            tracing::warn!(path = %path.display(), %reason, "malformed config; using defaults");
            (Settings::default(), ConfigStatus::Malformed { path, reason })
        }
    }
}

/// Merge a parsed config onto the defaults.
pub fn resolve_settings(raw: RawConfig) -> Settings {
    let mut s = Settings::default();

    if let Some(g) = raw.glossary {
        if let Some(file) = g.file {
            s.glossary_file = file;
        }
        s.forbidden_synonyms = g
            .forbidden_synonyms
            .unwrap_or_default()
            .into_iter()
            .filter(|group| group.len() > 1)
            .map(|mut group| {
                let canonical = group.remove(0);
                SynonymGroup {
                    canonical,
                    forbidden: group,
                }
            })
            .collect();
    }

    if let Some(scope) = raw.scope {
        if let Some(strict) = scope.strict {
            s.include = strict;
        }
        if let Some(ignore) = scope.ignore {
            s.ignore = ignore;
        }
    }

    if let Some(le) = raw.link_exceptions {
        if let Some(v) = le.not_orphans {
            s.not_orphans = v;
        }
        if let Some(v) = le.not_dead_ends {
            s.not_dead_ends = v;
        }
    }

    if let Some(fmt) = raw.formatting {
        if let Some(pattern) = fmt.root_naming {
            match Regex::new(&pattern) {
                Ok(re) => s.root_naming = re,
                Err(err) => {
                    tracing::warn!(%pattern, error = %err, "invalid formatting.root_naming; using default");
                }
            }
        }
        s.requirements_sections = fmt.requirements_sections.unwrap_or_default();
        s.decision_sections = fmt.decision_sections.unwrap_or_default();
    }

    if let Some(ms) = raw.modeling_standards {
        if let Some(vps) = ms.viewpoints {
            s.viewpoints = vps
                .into_iter()
                .filter_map(|(name, value)| {
                    match serde_json::from_value::<ViewpointCfg>(value) {
                        Ok(cfg) => Some((name, cfg)),
                        Err(err) => {
                            tracing::warn!(viewpoint = %name, error = %err, "skipping malformed viewpoint");
                            None
                        }
                    }
                })
                .map(|(name, cfg)| ViewpointSpec {
                    name,
                    artifacts: cfg
                        .artifacts
                        .into_iter()
                        .map(|a| match a {
                            ArtifactCfg::Path(file) => ArtifactSpec {
                                file,
                                priority: ArtifactPriority::Should,
                            },
                            ArtifactCfg::Detailed { file, priority } => ArtifactSpec {
                                file,
                                priority: ArtifactPriority::parse(priority.as_deref()),
                            },
                        })
                        .collect(),
                })
                .collect();
        }
        if let Some(f) = ms.state_diagram_file {
            s.state_diagram_file = f;
        }
        if let Some(f) = ms.event_catalog_file {
            s.event_catalog_file = f;
        }
    }

    if let Some(h) = raw.heuristics {
        if let Some(pairs) = h.opposites {
            s.heuristics.opposites = pairs
                .into_iter()
                .filter_map(|p| match p.as_slice() {
                    [a, b] => Some((a.clone(), b.clone())),
                    _ => None,
                })
                .collect();
        }
        if let Some(words) = h.stop_words {
            s.heuristics.stop_words = words;
        }
        if let Some(kws) = h.parameter_keywords {
            s.heuristics.parameter_keywords =
                kws.into_iter().map(|k| (k.keyword, k.parameter)).collect();
        }
        if let Some(n) = h.min_shared_words {
            s.heuristics.min_shared_words = n;
        }
        if let Some(n) = h.logical_conflict_limit {
            s.heuristics.logical_conflict_limit = n;
        }
    }

    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_config_file() {
        let dir = tempdir().unwrap();
        let (settings, status) = load_settings(dir.path());
        assert_eq!(status, ConfigStatus::Missing);
        assert_eq!(settings.glossary_file, "02_GLOSSARY.md");
        assert!(settings.include.iter().any(|p| p == "*.md"));
        assert_eq!(settings.viewpoints.len(), 5);
    }

    #[test]
    fn test_load_yaml_overrides() {
        let dir = tempdir().unwrap();
        let mut f = fs::File::create(dir.path().join("docvet.yml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
version: 2
glossary:
  file: GLOSSARY.md
  forbidden_synonyms:
    - [кошелёк, бумажник, wallet]
    - [lonely]
scope:
  strict: ["docs/**/*.md"]
modeling_standards:
  viewpoints:
    security_viewpoint:
      artifacts:
        - file: sec/THREATS.md
          priority: must
        - sec/NOTES.md
"#
        )
        .unwrap();

        let (settings, status) = load_settings(dir.path());
        assert!(matches!(status, ConfigStatus::Loaded(_)));
        assert_eq!(settings.glossary_file, "GLOSSARY.md");
        assert_eq!(settings.include, vec!["docs/**/*.md".to_string()]);
        // single-entry groups carry no forbidden synonym
        assert_eq!(settings.forbidden_synonyms.len(), 1);
        assert_eq!(settings.forbidden_synonyms[0].canonical, "кошелёк");
        assert_eq!(settings.forbidden_synonyms[0].forbidden.len(), 2);
        assert_eq!(settings.viewpoints.len(), 1);
        let arts = &settings.viewpoints[0].artifacts;
        assert_eq!(arts[0].priority, ArtifactPriority::Must);
        assert_eq!(arts[1].priority, ArtifactPriority::Should);
        // untouched sections keep defaults
        assert_eq!(settings.ignore, vec!["claudedocs/**", "*.draft.md"]);
    }

    #[test]
    fn test_load_toml() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("docvet.toml"),
            r###"
[formatting]
root_naming = "^[a-z]+\\.md$"
requirements_sections = ["## Scope"]

[heuristics]
min_shared_words = 3
opposites = [["on", "off"], ["broken"]]
"###,
        )
        .unwrap();
        let (settings, _) = load_settings(dir.path());
        assert!(settings.root_naming.is_match("intro.md"));
        assert_eq!(settings.requirements_sections, vec!["## Scope"]);
        assert_eq!(settings.heuristics.min_shared_words, 3);
        assert_eq!(
            settings.heuristics.opposites,
            vec![("on".to_string(), "off".to_string())]
        );
    }

    #[test]
    fn test_viewpoints_keep_file_order() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("docvet.yaml"),
            "modeling_standards:\n  viewpoints:\n    zeta_viewpoint:\n      artifacts: [z.md]\n    alpha_viewpoint:\n      artifacts: [a.md]\n    mid_viewpoint:\n      artifacts: [m.md]\n",
        )
        .unwrap();
        let (settings, _) = load_settings(dir.path());
        let names: Vec<&str> = settings.viewpoints.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["zeta_viewpoint", "alpha_viewpoint", "mid_viewpoint"]);

        fs::remove_file(dir.path().join("docvet.yaml")).unwrap();
        fs::write(
            dir.path().join("docvet.toml"),
            "[modeling_standards.viewpoints.zeta_viewpoint]\nartifacts = [\"z.md\"]\n\n[modeling_standards.viewpoints.alpha_viewpoint]\nartifacts = [\"a.md\"]\n",
        )
        .unwrap();
        let (settings, _) = load_settings(dir.path());
        let names: Vec<&str> = settings.viewpoints.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["zeta_viewpoint", "alpha_viewpoint"]);
    }

    #[test]
    fn test_malformed_config_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("docvet.yml"),
            "invalid: yaml: content:\n  - broken",
        )
        .unwrap();
        let (settings, status) = load_settings(dir.path());
        assert!(matches!(status, ConfigStatus::Malformed { .. }));
        assert_eq!(settings.glossary_file, "02_GLOSSARY.md");
    }

    #[test]
    fn test_invalid_naming_regex_keeps_default() {
        let raw = RawConfig {
            formatting: Some(FormattingCfg {
                root_naming: Some("([".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let s = resolve_settings(raw);
        assert_eq!(s.root_naming.as_str(), DEFAULT_ROOT_NAMING);
    }

    #[test]
    fn test_detect_project_root_walks_up_to_config() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("docvet.toml"), "").unwrap();
        let nested = root.join("a/b");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(detect_project_root(&nested), root.to_path_buf());
    }
}
