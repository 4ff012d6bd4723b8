use docvet::config::{Settings, SynonymGroup};
use docvet::error::{DocvetError, Result};
use docvet::passes::terms::TermsReport;
use docvet::remediate::{self, Console, Remediator};
use docvet::review::{self, Command, PassReport};
use docvet::session::{AnalysisSession, Mode};
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// Console that replays canned answers and reports EOF once they run out.
struct Scripted(VecDeque<String>);

impl Scripted {
    fn boxed(answers: &[&str]) -> Box<dyn Console> {
        Box::new(Scripted(answers.iter().map(|s| s.to_string()).collect()))
    }
}

impl Console for Scripted {
    fn say(&mut self, _text: &str) {}
    fn ask(&mut self, _prompt: &str) -> Result<String> {
        self.0.pop_front().ok_or(DocvetError::Interrupted)
    }
    fn open_editor(&mut self, _path: &Path, _line: usize) -> Result<()> {
        Ok(())
    }
}

fn wallet_settings() -> Settings {
    Settings {
        forbidden_synonyms: vec![SynonymGroup {
            canonical: "кошелёк".to_string(),
            forbidden: vec!["бумажник".to_string()],
        }],
        ..Settings::default()
    }
}

fn terms_report(outcome: &review::CommandOutcome) -> &TermsReport {
    match &outcome.report {
        PassReport::Terms(r) => r,
        _ => panic!("expected terms report"),
    }
}

#[test]
fn fix_answer_rewrites_synonym_and_records_it() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("01_DOC.md"), "# Doc\n\nИспользуйте бумажник\n").unwrap();

    let mut session = AnalysisSession::new(dir.path(), wallet_settings(), Mode::Interactive)
        .with_remediator(Remediator::new(Scripted::boxed(&["f"])));
    session.set_render(false);
    let outcome = review::run_command(&mut session, Command::Terms).unwrap();
    assert_eq!(terms_report(&outcome).synonym_violations, 1);

    let text = fs::read_to_string(dir.path().join("01_DOC.md")).unwrap();
    assert_eq!(text, "# Doc\n\nИспользуйте кошелёк\n");
    let record = session.remediator().unwrap().snapshot();
    assert_eq!(record.processed, 1);
    assert_eq!(record.fixed, vec!["TERM-001"]);
    assert!(record.skipped.is_empty());

    let mut again = AnalysisSession::new(dir.path(), wallet_settings(), Mode::Batch);
    let rerun = review::run_command(&mut again, Command::Terms).unwrap();
    assert_eq!(terms_report(&rerun).synonym_violations, 0);
}

#[test]
fn exhausted_input_interrupts_and_session_can_be_flushed() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("01_DOC.md"), "# Doc\n\nИспользуйте бумажник\n").unwrap();

    let mut session = AnalysisSession::new(dir.path(), wallet_settings(), Mode::Interactive)
        .with_remediator(Remediator::new(Scripted::boxed(&[])));
    session.set_render(false);
    let err = review::run_command(&mut session, Command::Terms).unwrap_err();
    assert!(matches!(err, DocvetError::Interrupted));

    // the file is untouched and the prompt was reached once
    let text = fs::read_to_string(dir.path().join("01_DOC.md")).unwrap();
    assert!(text.contains("бумажник"));
    let record = session.remediator().unwrap().snapshot();
    assert_eq!(record.processed, 1);

    let path = remediate::flush_session(dir.path(), &record).unwrap();
    assert_eq!(path, dir.path().join(".docvet").join("session.json"));
    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(saved["processed"], 1);
}

#[test]
fn ignore_answer_appends_to_ignore_log() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("01_DOC.md"), "# Doc\n\nИспользуйте бумажник\n").unwrap();

    let mut session = AnalysisSession::new(dir.path(), wallet_settings(), Mode::Interactive)
        .with_remediator(Remediator::new(Scripted::boxed(&["x", "i"])));
    session.set_render(false);
    review::run_command(&mut session, Command::Terms).unwrap();

    let record = session.remediator().unwrap().snapshot();
    assert_eq!(record.ignored, vec!["TERM-001"]);
    let log = fs::read_to_string(dir.path().join(".docvet").join(".docignore")).unwrap();
    assert!(log.contains("01_DOC.md:3"));
    assert!(log.contains("User ignored"));
}

/// Answers "f" once, then fails the way a broken stdin does.
struct FailsAfterFix(bool);

impl Console for FailsAfterFix {
    fn say(&mut self, _text: &str) {}
    fn ask(&mut self, _prompt: &str) -> Result<String> {
        if std::mem::replace(&mut self.0, true) {
            Err(DocvetError::io(
                "<stdin>",
                std::io::Error::new(std::io::ErrorKind::InvalidData, "stream did not contain valid UTF-8"),
            ))
        } else {
            Ok("f".to_string())
        }
    }
    fn open_editor(&mut self, _path: &Path, _line: usize) -> Result<()> {
        Ok(())
    }
}

#[test]
fn input_failure_still_saves_applied_fixes() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("01_DOC.md"),
        "# Doc\n\nИспользуйте бумажник\nГде мой бумажник?\n",
    )
    .unwrap();

    let mut session = AnalysisSession::new(dir.path(), wallet_settings(), Mode::Interactive)
        .with_remediator(Remediator::new(Box::new(FailsAfterFix(false))));
    session.set_render(false);
    let err = review::run_command(&mut session, Command::Terms).unwrap_err();
    assert!(matches!(err, DocvetError::Io { .. }));

    let path = session.save_remediation().unwrap();
    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(saved["fixed"], serde_json::json!(["TERM-001"]));
    assert_eq!(saved["processed"], 2);
}
