//! Output rendering for analysis commands.
//!
//! Supports `human` (default) and `json` outputs. Human output streams
//! each issue as it is recorded and closes with a per-command summary;
//! the JSON form is the serialized `CommandOutcome` plus a summary block.

use crate::models::{Issue, Priority, RunStats};
use crate::passes::contradictions::ContradictionsReport;
use crate::passes::gaps::GapsReport;
use crate::passes::links::LinksReport;
use crate::passes::lint::LintReport;
use crate::passes::terms::TermsReport;
use crate::passes::viewpoints::ViewpointsReport;
use crate::review::{CommandOutcome, PassReport, ReviewReport, StatsDelta};
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

fn heading(text: &str, color: bool) -> String {
    if color {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

/// Section banner printed before each pass runs.
pub fn print_pass_header(name: &str) {
    let title = format!("━━ {} ━━", name.to_uppercase());
    println!("\n{}", heading(&title, use_colors("human")));
}

/// One issue, as soon as it is recorded.
pub fn print_issue(issue: &Issue) {
    let color = use_colors("human");
    let tag = format!("[{}]", issue.id);
    let loc = issue.location();
    if color {
        let tag = match issue.priority {
            Priority::Critical => tag.red().bold().to_string(),
            Priority::Warning => tag.yellow().bold().to_string(),
            Priority::Info => tag.blue().to_string(),
        };
        println!(
            "{} {} {}\n   {}",
            issue.priority.symbol(),
            tag,
            loc.bold(),
            issue.message
        );
    } else {
        println!(
            "{} {} {}\n   {}",
            issue.priority.symbol(),
            tag,
            loc,
            issue.message
        );
    }
}

/// Print a finished command in the requested format.
pub fn print_outcome(outcome: &CommandOutcome, output: &str) {
    match output {
        "json" => match serde_json::to_string_pretty(&compose_json(outcome)) {
            Ok(text) => println!("{}", text),
            Err(err) => eprintln!("{} failed to encode JSON: {}", crate::utils::error_prefix(), err),
        },
        _ => {
            let color = use_colors(output);
            match &outcome.report {
                PassReport::Lint(r) => print_lint(r),
                PassReport::Links(r) => print_links(r, color),
                PassReport::Terms(r) => print_terms(r, color),
                PassReport::Viewpoints(r) => print_viewpoints(r),
                PassReport::Contradictions(r) => print_contradictions(r, color),
                PassReport::Gaps(r) => print_gaps(r),
                PassReport::Review(r) => print_review(r, color),
            }
            print_summary(outcome.command, &outcome.stats, color);
        }
    }
}

fn print_summary(command: &str, stats: &RunStats, color: bool) {
    let summary = format!(
        "— Summary ({}) — critical={} warning={} info={} total={}",
        command,
        stats.critical,
        stats.warning,
        stats.info,
        stats.total()
    );
    println!("\n{}", heading(&summary, color));
}

fn print_lint(r: &LintReport) {
    println!(
        "\nChecked {} document(s): {} broken link(s), {} naming, {} empty section(s), {} TODO(s), {} missing section(s)",
        r.documents, r.broken_links, r.naming, r.empty_sections, r.todos, r.missing_sections
    );
}

fn print_links(r: &LinksReport, color: bool) {
    println!("\n{}", heading("Link graph", color));
    println!("  Nodes: {}  Edges: {}", r.nodes, r.edges.len());
    println!("  Orphans: {}  Dead-ends: {}", r.orphans.len(), r.dead_ends.len());
    println!(
        "  README navigation: {}/{} ({}%)",
        r.readme.covered, r.readme.total, r.readme.percent
    );
    if let Some(path) = &r.diagram {
        println!("  📊 Mermaid graph: {}", path);
    }
}

fn print_terms(r: &TermsReport, color: bool) {
    println!("\n{}", heading("Glossary", color));
    if !r.glossary_found {
        println!("  Glossary {} not found", r.glossary_file);
    }
    println!(
        "  Coverage: {}% ({}/{} terms used)",
        r.coverage, r.used_terms, r.total_terms
    );
    if !r.unused_terms.is_empty() {
        println!("  Unused: {}", r.unused_terms.join(", "));
    }
    if !r.new_terms.is_empty() {
        println!("  New term candidates: {}", r.new_terms.join(", "));
    }
}

fn print_viewpoints(r: &ViewpointsReport) {
    println!();
    for vp in &r.viewpoints {
        let mark = if vp.covered == vp.total { "✅" } else { "⚠️" };
        println!("  {} {}: {}/{}", mark, vp.name, vp.covered, vp.total);
    }
    println!("  Coverage: {}% ({}/{})", r.coverage, r.covered, r.total);
    if r.security_incomplete {
        println!("  🔐 Security viewpoint is incomplete");
    }
}

fn print_contradictions(r: &ContradictionsReport, color: bool) {
    println!(
        "\n{}",
        heading(
            &format!("Parameters found: {}", r.occurrences),
            color
        )
    );
    for c in &r.conflicts {
        println!("  ❌ {}: {}", c.parameter, c.values.join(" vs "));
        for o in &c.occurrences {
            println!("     {}:{} \"{}\"", o.file, o.line, o.context);
        }
    }
    if !r.logical_conflicts.is_empty() {
        println!("  Possible logical conflicts: {}", r.logical_conflicts.len());
    }
}

fn print_gaps(r: &GapsReport) {
    println!();
    for g in &r.groups {
        if g.count > 0 {
            println!("  {}: {}", g.label, g.count);
        }
    }
    println!("  Total gaps: {}", r.total);
}

fn signed(n: i64) -> String {
    if n > 0 {
        format!("+{}", n)
    } else {
        n.to_string()
    }
}

fn delta_line(d: &StatsDelta) -> String {
    format!(
        "Δ critical {}  warning {}  info {}",
        signed(d.critical),
        signed(d.warning),
        signed(d.info)
    )
}

fn print_review(r: &ReviewReport, color: bool) {
    println!("\n{}", heading("Review summary", color));
    println!("  {:<16} {:>8} {:>8} {:>8}", "pass", "critical", "warning", "info");
    for p in &r.passes {
        println!(
            "  {:<16} {:>8} {:>8} {:>8}",
            p.name, p.stats.critical, p.stats.warning, p.stats.info
        );
    }
    println!(
        "  {:<16} {:>8} {:>8} {:>8}",
        "TOTAL", r.total.critical, r.total.warning, r.total.info
    );
    if let (Some(prev), Some(d)) = (&r.previous, &r.delta) {
        println!("  vs {}: {}", prev.timestamp, delta_line(d));
    }
    println!(
        "  Viewpoint coverage: {}%  Glossary coverage: {}%",
        r.viewpoint_coverage, r.glossary_coverage
    );
    let score = format!("Score: {}/100 (grade {})", r.score, r.grade);
    if color {
        let painted = match r.grade {
            'A' | 'B' => score.green().bold().to_string(),
            'C' | 'D' => score.yellow().bold().to_string(),
            _ => score.red().bold().to_string(),
        };
        println!("\n  {}", painted);
    } else {
        println!("\n  {}", score);
    }
    if !r.recommendations.is_empty() {
        println!("\n  Recommendations:");
        for (i, rec) in r.recommendations.iter().enumerate() {
            println!("   {}. {}", i + 1, rec);
        }
    }
    println!("\n  ⏱  {:.1}s", r.elapsed_secs);
}

/// Compose the JSON document for one command (pure) for testing.
pub fn compose_json(outcome: &CommandOutcome) -> JsonVal {
    json!({
        "command": outcome.command,
        "report": serde_json::to_value(&outcome.report).unwrap_or(JsonVal::Null),
        "issues": serde_json::to_value(&outcome.issues).unwrap_or(JsonVal::Null),
        "summary": {
            "critical": outcome.stats.critical,
            "warning": outcome.stats.warning,
            "info": outcome.stats.info,
            "total": outcome.stats.total(),
        },
    })
}
