//! Docvet CLI binary entry point.
//! Resolves the project, runs the requested command and prints results.

use clap::Parser;
use docvet::cli::{Cli, Commands, RunArgs};
use docvet::config::{self, ConfigStatus};
use docvet::error::DocvetError;
use docvet::models::history::SessionRecord;
use docvet::remediate::{self, Remediator, StdConsole};
use docvet::review::{self, Command};
use docvet::session::{AnalysisSession, Mode};
use docvet::{output, utils};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("DOCVET_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn report_session_saved(path: Option<PathBuf>) {
    if let Some(path) = path {
        eprintln!("{} Session saved: {}", utils::info_prefix(), path.display());
    }
}

/// Flush the session record and exit when the user hits Ctrl-C mid-prompt.
#[cfg(unix)]
fn spawn_interrupt_listener(root: PathBuf, record: Arc<Mutex<SessionRecord>>) {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = match Signals::new([SIGINT, SIGTERM]) {
        Ok(s) => s,
        Err(err) => {
            tracing::warn!(error = %err, "failed to register interrupt handler");
            return;
        }
    };
    std::thread::spawn(move || {
        if signals.forever().next().is_some() {
            eprintln!("\n{} Interrupted", utils::warn_prefix());
            let snapshot = remediate::snapshot_of(&record);
            report_session_saved(remediate::flush_session(&root, &snapshot));
            std::process::exit(0);
        }
    });
}

#[cfg(not(unix))]
fn spawn_interrupt_listener(_root: PathBuf, _record: Arc<Mutex<SessionRecord>>) {}

fn announce_config(status: &ConfigStatus, quiet: bool) {
    match status {
        ConfigStatus::Loaded(path) => {
            tracing::debug!(path = %path.display(), "loaded config");
        }
        ConfigStatus::Missing => {
            if !quiet {
                eprintln!(
                    "{} No docvet.toml/docvet.yaml found; using defaults.",
                    utils::note_prefix()
                );
            }
        }
        ConfigStatus::Malformed { path, reason } => {
            eprintln!(
                "{} Ignoring malformed config {}: {}. Using defaults.",
                utils::warn_prefix(),
                path.display(),
                reason
            );
        }
    }
}

fn run(cmd: Command, args: RunArgs) -> i32 {
    init_tracing(args.verbose);
    let output = args.output.as_deref().unwrap_or("human").to_string();
    if output != "human" && output != "json" {
        eprintln!(
            "{} Unknown output mode '{}'; expected human or json.",
            utils::error_prefix(),
            output
        );
        return 2;
    }
    let start = PathBuf::from(args.project.as_deref().unwrap_or("."));
    if !start.is_dir() {
        eprintln!(
            "{} Project directory not found: {}",
            utils::error_prefix(),
            start.display()
        );
        return 2;
    }
    let start = start.canonicalize().unwrap_or(start);
    let root = config::detect_project_root(&start);
    let (settings, status) = config::load_settings(&root);

    let mode = if args.interactive {
        Mode::Interactive
    } else if args.batch {
        Mode::Batch
    } else {
        Mode::Default
    };
    announce_config(&status, output == "json" || mode == Mode::Batch);
    tracing::debug!(root = %root.display(), command = cmd.name(), "starting");

    let mut session = AnalysisSession::new(&root, settings, mode);
    if output == "json" {
        session.set_render(false);
    }
    if mode == Mode::Interactive {
        let remediator = Remediator::new(Box::new(StdConsole));
        spawn_interrupt_listener(root.clone(), remediator.record_handle());
        session = session.with_remediator(remediator);
    }
    if mode != Mode::Batch && output != "json" && cmd != Command::Review {
        output::print_pass_header(cmd.name());
    }

    match review::run_command(&mut session, cmd) {
        Ok(outcome) => {
            if mode != Mode::Batch {
                output::print_outcome(&outcome, &output);
            }
            finish_interactive(&session);
            if mode == Mode::Batch {
                outcome.stats.exit_code()
            } else {
                0
            }
        }
        Err(DocvetError::Interrupted) => {
            eprintln!("\n{} Interrupted", utils::warn_prefix());
            finish_interactive(&session);
            0
        }
        Err(err) => {
            eprintln!("{} {}", utils::error_prefix(), err);
            finish_interactive(&session);
            1
        }
    }
}

fn finish_interactive(session: &AnalysisSession) {
    report_session_saved(session.save_remediation());
}

fn main() {
    let cli = Cli::parse();
    let code = match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            0
        }
        Commands::Lint { run: args } => run(Command::Lint, args),
        Commands::Links { run: args, mermaid } => run(Command::Links { mermaid }, args),
        Commands::Terms { run: args } => run(Command::Terms, args),
        Commands::Viewpoints { run: args } => run(Command::Viewpoints, args),
        Commands::Contradictions { run: args } => run(Command::Contradictions, args),
        Commands::Gaps { run: args } => run(Command::Gaps, args),
        Commands::Review { run: args } => run(Command::Review, args),
    };
    std::process::exit(code);
}
