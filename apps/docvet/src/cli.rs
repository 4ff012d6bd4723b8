//! CLI argument parsing via `clap`.

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "docvet",
    version,
    about = "Docvet: documentation analysis and guided remediation",
    long_about = "Docvet analyzes a markdown documentation tree for structural, terminological and logical defects.\n\nConfiguration precedence: CLI > docvet.toml|yaml|yml > defaults.",
    after_help = "Examples:\n  docvet lint\n  docvet links --mermaid\n  docvet review --project docs --output json\n  docvet terms -i\n  docvet review --batch",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Args, Clone, Debug)]
/// Options shared by every analysis command.
pub struct RunArgs {
    #[arg(long, help = "Project root or a directory inside it (default: current dir)")]
    pub project: Option<String>,
    #[arg(short, long, action = clap::ArgAction::SetTrue, conflicts_with = "batch", help = "Prompt for an action on every issue")]
    pub interactive: bool,
    #[arg(short, long, action = clap::ArgAction::SetTrue, help = "No per-issue output; exit 2 on criticals, 1 on other issues")]
    pub batch: bool,
    #[arg(long, help = "Output mode: human|json (default: human)")]
    pub output: Option<String>,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Enable debug logging on stderr")]
    pub verbose: bool,
}

#[derive(Subcommand)]
/// Supported analysis commands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current docvet version.")]
    Version,
    #[command(
        about = "Structural lint",
        long_about = "Check broken links, root file naming, empty sections, TODOs without issue references and required sections."
    )]
    Lint {
        #[command(flatten)]
        run: RunArgs,
    },
    #[command(
        about = "Link graph analysis",
        long_about = "Build the intra-corpus link graph and report orphans, dead-ends and README navigation coverage.",
        after_help = "Examples:\n  docvet links\n  docvet links --mermaid"
    )]
    Links {
        #[command(flatten)]
        run: RunArgs,
        #[arg(short, long, action = clap::ArgAction::SetTrue, help = "Write a mermaid diagram to .docvet/link_graph.md")]
        mermaid: bool,
    },
    #[command(
        about = "Terminology consistency",
        long_about = "Check forbidden synonyms, glossary coverage and new term candidates."
    )]
    Terms {
        #[command(flatten)]
        run: RunArgs,
    },
    #[command(
        about = "Viewpoint coverage",
        long_about = "Check that every configured architectural viewpoint has its artifacts."
    )]
    Viewpoints {
        #[command(flatten)]
        run: RunArgs,
    },
    #[command(
        about = "Cross-document contradictions",
        long_about = "Find numeric parameters with conflicting values and statements with opposite keywords."
    )]
    Contradictions {
        #[command(flatten)]
        run: RunArgs,
    },
    #[command(
        about = "Coverage gaps",
        long_about = "Find unexplained topics, requirements without acceptance criteria, entities without state diagrams and integrations without an event catalog."
    )]
    Gaps {
        #[command(flatten)]
        run: RunArgs,
    },
    #[command(
        about = "Full review",
        long_about = "Run every pass, compare with the previous review, and print a score with recommendations."
    )]
    Review {
        #[command(flatten)]
        run: RunArgs,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_links_flags() {
        let cli = Cli::parse_from(["docvet", "links", "-m", "--project", "docs", "-b"]);
        match cli.cmd {
            Commands::Links { run, mermaid } => {
                assert!(mermaid);
                assert!(run.batch);
                assert_eq!(run.project.as_deref(), Some("docs"));
            }
            _ => panic!("expected links"),
        }
    }

    #[test]
    fn test_interactive_conflicts_with_batch() {
        assert!(Cli::try_parse_from(["docvet", "lint", "-i", "-b"]).is_err());
    }
}
