//! End-to-end controller workflows over files on disk.

use std::fs;
use std::path::Path;

use secview::analyze::JsonReportAnalyzer;
use secview::classify::{ClassificationEngine, SymbolCountPolicy, Verdict};
use secview::controller::{BatchInput, Controller, INVALID_LINK_BANNER};
use secview::progress::NoProgress;
use secview::render::ReportRenderer;
use secview::session::{SessionState, TabContent, Transition};
use tempfile::tempdir;

const LS_REPORT: &str = r#"{
  "version": "0.1.0",
  "filename": "ls",
  "binary_type": "Elf64",
  "properties": {
    "canary": true,
    "nx": "Enabled",
    "pie": "PIE",
    "relro": "Partial",
    "rpath": {"paths": ["None"]},
    "runpath": {"paths": ["/opt/lib", "$ORIGIN/../lib"]},
    "symbol_count": 0,
    "dynlibs": ["libselinux.so.1", "libc.so.6"]
  }
}"#;

const LEGACY_REPORT: &str = r#"{
  "version": "0.0.9",
  "filename": "putty.exe",
  "data": {"PE": {"bitness": 32, "aslr": "DynamicBase", "safeseh": false}}
}"#;

fn read_input(path: &Path) -> BatchInput {
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    match fs::read(path) {
        Ok(bytes) => BatchInput::new(name, bytes),
        Err(e) => BatchInput::unreadable(name, e.to_string()),
    }
}

#[test]
fn test_mixed_batch_workflow() {
    let dir = tempdir().unwrap();
    let ls = dir.path().join("ls.json");
    let putty = dir.path().join("putty.json");
    let garbage = dir.path().join("a.out");
    fs::write(&ls, LS_REPORT).unwrap();
    fs::write(&putty, LEGACY_REPORT).unwrap();
    fs::write(&garbage, b"\x7fELF\x02\x01\x01").unwrap();
    let missing = dir.path().join("missing.json");

    let mut controller = Controller::new(JsonReportAnalyzer);
    let outcomes = controller.analyze_batch(
        [&ls, &garbage, &putty, &missing].map(|p| read_input(p)),
        &NoProgress,
    );

    assert_eq!(outcomes.len(), 4);
    let ok: Vec<bool> = outcomes.iter().map(|o| o.is_success()).collect();
    assert_eq!(ok, vec![true, false, true, false]);

    let session = controller.session();
    assert_eq!(session.state(), SessionState::Populated);
    assert_eq!(session.export_eligible(), 2);
    assert_eq!(session.active().unwrap().title(), "missing.json");

    // The legacy report has an unknown version and falls back.
    assert_eq!(session.diagnostics().len(), 1);

    let tab = session.get(outcomes[0].tab()).unwrap();
    let TabContent::Report { view } = tab.content() else {
        panic!("expected a report tab");
    };
    assert_eq!(view.title, "ELF (64 bit) Security Analysis - ls.json");
    assert_eq!(view.row("relro").unwrap().verdict, Verdict::Partial);
    assert_eq!(view.row("rpath").unwrap().value, "None");
    assert_eq!(view.row("runpath").unwrap().value, "2 path(s)");
    assert_eq!(view.row("runpath").unwrap().verdict, Verdict::Insecure);
    assert_eq!(
        view.row("dynlibs").unwrap().details,
        vec!["• libselinux.so.1", "• libc.so.6"]
    );
    assert_eq!(view.row("symbol_count").unwrap().verdict, Verdict::Info);

    let legacy = session.get(outcomes[2].tab()).unwrap();
    let TabContent::Report { view } = legacy.content() else {
        panic!("expected a report tab");
    };
    assert_eq!(view.title, "PE (32 bit) Security Analysis - putty.json");
}

#[test]
fn test_symbol_policy_flows_into_rendering() {
    let engine = ClassificationEngine::new(SymbolCountPolicy::StrippedIsSecure);
    let mut controller =
        Controller::new(JsonReportAnalyzer).with_renderer(ReportRenderer::new(engine));
    let outcomes = controller.analyze_batch(
        [BatchInput::new("ls", LS_REPORT.as_bytes().to_vec())],
        &NoProgress,
    );

    let TabContent::Report { view } = controller
        .session()
        .get(outcomes[0].tab())
        .unwrap()
        .content()
    else {
        panic!("expected a report tab");
    };
    assert_eq!(view.row("symbol_count").unwrap().verdict, Verdict::Secure);
}

#[test]
fn test_share_link_opens_in_fresh_session() {
    let mut first = Controller::new(JsonReportAnalyzer).with_base_url("https://checksec.example/");
    let outcomes = first.analyze_batch(
        [BatchInput::new("ls", LS_REPORT.as_bytes().to_vec())],
        &NoProgress,
    );
    let url = first.share(outcomes[0].tab()).unwrap();

    let mut second = Controller::new(JsonReportAnalyzer);
    let tab = second.load_from_url(&url).unwrap().unwrap();

    assert!(second.is_viewing_shared());
    assert_eq!(
        second.session().report(tab),
        first.session().report(outcomes[0].tab())
    );
    assert_eq!(
        second.export(tab).is_ok(),
        first.export(outcomes[0].tab()).is_ok()
    );
}

#[test]
fn test_tampered_link_shows_banner() {
    let mut first = Controller::new(JsonReportAnalyzer);
    let outcomes = first.analyze_batch(
        [BatchInput::new("ls", LS_REPORT.as_bytes().to_vec())],
        &NoProgress,
    );
    let url = first.share(outcomes[0].tab()).unwrap();
    let truncated = &url[..url.len() - 10];

    let mut second = Controller::new(JsonReportAnalyzer);
    assert!(second.load_from_url(truncated).unwrap().is_err());
    assert_eq!(second.banner(), Some(INVALID_LINK_BANNER));
    assert!(second.session().is_empty());
}

#[test]
fn test_close_sequence_from_ui() {
    let mut controller = Controller::new(JsonReportAnalyzer);
    let outcomes = controller.analyze_batch(
        ["a", "b", "c"].map(|n| BatchInput::new(n, LS_REPORT.as_bytes().to_vec())),
        &NoProgress,
    );
    let [a, b, c] = [0, 1, 2].map(|i| outcomes[i].tab());

    // c is active; closing it activates b.
    assert_eq!(
        controller.close(c),
        Transition::Closed {
            id: c,
            activated: Some(b)
        }
    );
    assert_eq!(controller.switch_to(a), Transition::Activated { id: a });
    // Closing the active first tab activates the new first tab.
    assert_eq!(
        controller.close(a),
        Transition::Closed {
            id: a,
            activated: Some(b)
        }
    );
    assert_eq!(controller.session().get(b).unwrap().index(), 0);
    assert_eq!(controller.close(b), Transition::Emptied { closed: 1 });
    assert_eq!(controller.session().state(), SessionState::Empty);
    assert!(controller.export_combined().is_err());
}
