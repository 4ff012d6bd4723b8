//! Link graph: intra-corpus edges, orphans, dead-ends, README navigation
//! coverage and an optional mermaid rendering.

use crate::error::Result;
use crate::models::{Category, FixKind, Priority};
use crate::passes::percent;
use crate::persist;
use crate::session::AnalysisSession;
use crate::utils::{file_stem, is_external_link, link_regex, path_matches, resolve_link};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

const README: &str = "README.md";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

/// Rebuilt from scratch on every run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LinkGraph {
    pub nodes: Vec<String>,
    pub links: Vec<Edge>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReadmeCoverage {
    pub covered: usize,
    pub total: usize,
    pub percent: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LinksReport {
    pub nodes: usize,
    pub edges: Vec<Edge>,
    pub orphans: Vec<String>,
    pub dead_ends: Vec<String>,
    pub readme: ReadmeCoverage,
    /// Project-relative path of the written diagram, when requested.
    pub diagram: Option<String>,
}

pub fn build_graph(documents: &[(String, String)]) -> LinkGraph {
    let nodes: Vec<String> = documents.iter().map(|(f, _)| f.clone()).collect();
    let known: HashSet<&str> = nodes.iter().map(String::as_str).collect();
    let mut links = Vec::new();
    for (file, content) in documents {
        for cap in link_regex().captures_iter(content) {
            let target = cap[2].trim();
            if is_external_link(target) {
                continue;
            }
            let resolved = resolve_link(file, target);
            if known.contains(resolved.as_str()) {
                links.push(Edge {
                    from: file.clone(),
                    to: resolved,
                });
            }
        }
    }
    LinkGraph { nodes, links }
}

/// Nodes never targeted by a link, minus the exception globs.
pub fn find_orphans(graph: &LinkGraph, exceptions: &[String]) -> Vec<String> {
    let incoming: HashSet<&str> = graph.links.iter().map(|e| e.to.as_str()).collect();
    graph
        .nodes
        .iter()
        .filter(|n| !incoming.contains(n.as_str()))
        .filter(|n| !exceptions.iter().any(|p| path_matches(p, n)))
        .cloned()
        .collect()
}

/// Nodes that link nowhere, minus the exception globs.
pub fn find_dead_ends(graph: &LinkGraph, exceptions: &[String]) -> Vec<String> {
    let outgoing: HashSet<&str> = graph.links.iter().map(|e| e.from.as_str()).collect();
    graph
        .nodes
        .iter()
        .filter(|n| !outgoing.contains(n.as_str()))
        .filter(|n| !exceptions.iter().any(|p| path_matches(p, n)))
        .cloned()
        .collect()
}

pub fn readme_coverage(readme: Option<&str>, documents: &[String]) -> ReadmeCoverage {
    let total = documents.len();
    let Some(readme) = readme else {
        return ReadmeCoverage {
            covered: 0,
            total,
            percent: 0,
        };
    };
    let covered = documents
        .iter()
        .filter(|d| readme.contains(&format!("]({})", d)) || readme.contains(&format!("](./{})", d)))
        .count();
    ReadmeCoverage {
        covered,
        total,
        percent: percent(covered, total),
    }
}

/// Mermaid-safe identifier: ASCII alphanumerics kept, everything else
/// folded into single underscores, never starting with a digit.
pub fn node_to_id(path: &str) -> String {
    let mut id = String::with_capacity(path.len() + 1);
    for ch in path.chars() {
        if ch.is_ascii_alphanumeric() {
            id.push(ch);
        } else if !id.ends_with('_') {
            id.push('_');
        }
    }
    if id.is_empty() {
        id.push('_');
    }
    if id.starts_with(|c: char| c.is_ascii_digit()) {
        id.insert(0, 'n');
    }
    id
}

/// Identifier per node, suffixed where two paths sanitize alike.
fn assign_ids(nodes: &[String]) -> HashMap<&str, String> {
    let mut used: HashMap<String, usize> = HashMap::new();
    let mut ids = HashMap::new();
    for node in nodes {
        let base = node_to_id(node);
        let n = used.entry(base.clone()).or_insert(0);
        *n += 1;
        let id = if *n == 1 {
            base
        } else {
            format!("{}_{}", base, n)
        };
        ids.insert(node.as_str(), id);
    }
    ids
}

pub fn render_mermaid(graph: &LinkGraph, orphans: &[String], dead_ends: &[String]) -> String {
    let ids = assign_ids(&graph.nodes);
    let id_of = |n: &str| ids.get(n).cloned().unwrap_or_else(|| node_to_id(n));
    let mut lines = vec!["```mermaid".to_string(), "flowchart LR".to_string()];

    for node in &graph.nodes {
        let id = id_of(node.as_str());
        let label = file_stem(node);
        let shape = if orphans.contains(node) {
            format!("{}[\"🔸 {}\"]", id, label)
        } else if dead_ends.contains(node) {
            format!("{}[\"{} 🔹\"]", id, label)
        } else if node == README {
            format!("{}((\"{}\"))", id, label)
        } else {
            format!("{}[\"{}\"]", id, label)
        };
        lines.push(format!("    {}", shape));
    }
    lines.push(String::new());
    for e in &graph.links {
        lines.push(format!("    {} --> {}", id_of(e.from.as_str()), id_of(e.to.as_str())));
    }
    lines.push(String::new());
    lines.push("    classDef orphan fill:#fff3cd,stroke:#ffc107".to_string());
    lines.push("    classDef deadend fill:#cfe2ff,stroke:#0d6efd".to_string());
    lines.push("    classDef entry fill:#d1e7dd,stroke:#198754".to_string());
    if !orphans.is_empty() {
        let list: Vec<String> = orphans.iter().map(|o| id_of(o.as_str())).collect();
        lines.push(format!("    class {} orphan", list.join(",")));
    }
    if !dead_ends.is_empty() {
        let list: Vec<String> = dead_ends.iter().map(|d| id_of(d.as_str())).collect();
        lines.push(format!("    class {} deadend", list.join(",")));
    }
    if graph.nodes.iter().any(|n| n == README) {
        lines.push(format!("    class {} entry", id_of(README)));
    }
    lines.push("```".to_string());
    lines.join("\n")
}

/// Companion document wrapping the diagram with a legend.
pub fn link_graph_document(mermaid: &str, generated: &str) -> String {
    format!(
        "# Documentation link graph\n\n\
         > **Generated:** {generated}\n\
         > **Command:** `docvet links --mermaid`\n\n\
         ## Legend\n\n\
         - 🔸 **Orphan**: no incoming links (yellow)\n\
         - 🔹 **Dead-end**: no outgoing links (blue)\n\
         - **README**: entry point (green circle)\n\n\
         ## Graph\n\n\
         {mermaid}\n\n\
         ## Recommendations\n\n\
         1. Orphans should be linked from README or a parent document\n\
         2. Dead-ends are acceptable for glossaries and indexes\n\
         3. Every document should be reachable from README in 2-3 clicks\n"
    )
}

pub fn run(session: &mut AnalysisSession, mermaid: bool) -> Result<LinksReport> {
    let mut documents: Vec<(String, String)> = Vec::new();
    for doc in session.documents() {
        match session.store.read(&doc) {
            Some(content) => documents.push((doc, content)),
            // unreadable documents still count as nodes
            None => documents.push((doc, String::new())),
        }
    }
    let graph = build_graph(&documents);
    let orphans = find_orphans(&graph, &session.settings.not_orphans);
    let dead_ends = find_dead_ends(&graph, &session.settings.not_dead_ends);
    let readme_text = session.store.read(README);
    let readme = readme_coverage(readme_text.as_deref(), &graph.nodes);

    for o in &orphans {
        session.record(
            Category::Link,
            o,
            0,
            "Orphan: no document links here",
            Priority::Info,
            FixKind::Orphan,
        )?;
    }
    for d in &dead_ends {
        session.record(
            Category::Link,
            d,
            0,
            "Dead-end: no links to other documents",
            Priority::Info,
            FixKind::DeadEnd,
        )?;
    }

    let diagram = if mermaid {
        let doc = link_graph_document(
            &render_mermaid(&graph, &orphans, &dead_ends),
            &chrono::Local::now().format("%Y-%m-%d %H:%M").to_string(),
        );
        match persist::save_link_graph(session.store.root(), &doc) {
            Ok(rel) => Some(rel),
            Err(err) => {
                tracing::warn!(error = %err, "failed to write link graph");
                None
            }
        }
    } else {
        None
    };

    tracing::debug!(
        nodes = graph.nodes.len(),
        edges = graph.links.len(),
        "links pass complete"
    );
    Ok(LinksReport {
        nodes: graph.nodes.len(),
        edges: graph.links,
        orphans,
        dead_ends,
        readme,
        diagram,
    })
}
