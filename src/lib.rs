//! secview - Binary Hardening Report Viewer
//!
//! Turns binary-security analysis reports into judged, tabbed views. A
//! report can be carried whole inside a share URL and opened again
//! elsewhere, and findings can be exported per report or combined.
//!
//! The crate is organized leaves first:
//!
//! * [`report`]: the report data model
//! * [`classify`]: verdicts, display strings and labels per property
//! * [`render`]: version dispatch and rendering into rows
//! * [`session`]: the tab session state machine
//! * [`share`]: share tokens and URLs
//! * [`export`]: SARIF documents
//! * [`controller`]: owns the session and drives the flows above

pub mod analyze;
pub mod classify;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod logging;
pub mod output;
pub mod progress;
pub mod render;
pub mod report;
pub mod session;
pub mod share;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::analyze::JsonReportAnalyzer;
use crate::classify::ClassificationEngine;
use crate::cli::{Cli, Commands, ExportArgs, LoadArgs, OutputFormat, ShareArgs, ViewArgs};
use crate::config::Config;
use crate::controller::{BatchInput, Controller, Outcome};
use crate::error::ExitCode;
use crate::export::{ExportError, SarifGenerator};
use crate::output::{JsonOutput, TextOutput};
use crate::progress::{NoProgress, Progress};
use crate::render::ReportRenderer;
use crate::share::token_from_url;

type AppController = Controller<JsonReportAnalyzer>;

/// Run the application for parsed command-line arguments.
///
/// # Errors
///
/// Returns an error for invalid configuration, unreadable output targets,
/// failed share or export actions, and batches where nothing could be
/// exported.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    config.merge_cli(&cli);
    if !config.color {
        yansi::disable();
    }
    log::debug!("Using config: {:?}", config);

    let engine = ClassificationEngine::new(config.symbol_count_policy);
    let mut controller = Controller::new(JsonReportAnalyzer)
        .with_renderer(ReportRenderer::new(engine))
        .with_generator(SarifGenerator::new(engine))
        .with_base_url(config.base_url.clone());

    match &cli.command {
        Commands::View(args) => run_view(&mut controller, args, &config, cli.quiet),
        Commands::Share(args) => run_share(controller, args),
        Commands::Load(args) => run_load(&mut controller, args, &config),
        Commands::Export(args) => run_export(&mut controller, args, cli.quiet),
    }
}

fn run_view(
    controller: &mut AppController,
    args: &ViewArgs,
    config: &Config,
    quiet: bool,
) -> Result<ExitCode> {
    let outcomes = analyze_files(controller, &args.files, quiet);
    let code = exit_code_for(&outcomes);
    print_session(controller, args.output, config, code)?;
    Ok(code)
}

fn run_share(controller: AppController, args: &ShareArgs) -> Result<ExitCode> {
    let mut controller = match &args.base_url {
        Some(url) => controller.with_base_url(url.clone()),
        None => controller,
    };

    let outcomes = analyze_files(&mut controller, std::slice::from_ref(&args.file), true);
    let outcome = outcomes
        .first()
        .context("no input to share")?;
    if let Outcome::Failure {
        filename, message, ..
    } = outcome
    {
        anyhow::bail!("cannot share {}: {}", filename, message);
    }

    let url = controller
        .share(outcome.tab())
        .with_context(|| format!("failed to build share link for {}", outcome.filename()))?;
    println!("{}", url);
    Ok(ExitCode::Success)
}

fn run_load(controller: &mut AppController, args: &LoadArgs, config: &Config) -> Result<ExitCode> {
    let result = match token_from_url(&args.link) {
        Some(_) => controller.load_from_url(&args.link),
        None => Some(controller.load_shared(&args.link)),
    };

    let code = match result {
        Some(Ok(_)) => ExitCode::Success,
        Some(Err(_)) | None => ExitCode::GeneralError,
    };
    print_session(controller, args.output, config, code)?;
    Ok(code)
}

fn run_export(controller: &mut AppController, args: &ExportArgs, quiet: bool) -> Result<ExitCode> {
    let outcomes = analyze_files(controller, &args.files, quiet);
    let code = exit_code_for(&outcomes);

    let documents: Vec<(String, String)> = if args.combined {
        vec![("combined".to_string(), controller.export_combined()?)]
    } else {
        let mut docs = Vec::new();
        for outcome in outcomes.iter().filter(|o| o.is_success()) {
            docs.push((outcome.filename().to_string(), controller.export(outcome.tab())?));
        }
        if docs.is_empty() {
            return Err(ExportError::NoReports.into());
        }
        docs
    };

    for outcome in outcomes.iter().filter(|o| !o.is_success()) {
        log::warn!("Skipping {} (analysis failed)", outcome.filename());
    }

    match &args.out {
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            for (_, doc) in &documents {
                writeln!(handle, "{}", doc)?;
            }
        }
        Some(path) if documents.len() == 1 => write_document(path, &documents[0].1)?,
        Some(path) => {
            for (n, (name, doc)) in documents.iter().enumerate() {
                let target = numbered_path(path, n + 1);
                log::debug!("Writing findings for {} to {}", name, target.display());
                write_document(&target, doc)?;
            }
        }
    }

    Ok(code)
}

/// Read every file and run one batch through the controller.
fn analyze_files(controller: &mut AppController, files: &[PathBuf], quiet: bool) -> Vec<Outcome> {
    let inputs = files.iter().map(|path| {
        let name = display_name(path);
        match fs::read(path) {
            Ok(bytes) => BatchInput::new(name, bytes),
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                BatchInput::unreadable(name, format!("Failed to read file: {}", e))
            }
        }
    });

    if quiet {
        controller.analyze_batch(inputs, &NoProgress)
    } else {
        controller.analyze_batch(inputs, &Progress::new(false))
    }
}

fn exit_code_for(outcomes: &[Outcome]) -> ExitCode {
    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    ExitCode::for_batch(succeeded, outcomes.len())
}

fn print_session(
    controller: &AppController,
    format: OutputFormat,
    config: &Config,
    code: ExitCode,
) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match format {
        OutputFormat::Text => TextOutput::new(controller.session(), config.color)
            .with_banner(controller.banner())
            .shared(controller.is_viewing_shared())
            .write_to(&mut handle)?,
        OutputFormat::Json => JsonOutput::new(
            controller.session(),
            controller.is_viewing_shared(),
            controller.banner(),
            code,
        )
        .write_to(&mut handle, config.pretty_json)?,
    }
    Ok(())
}

/// Tab title for a path: the file name, or the whole path if it has none.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `out.json` with n=2 becomes `out-2.json`.
fn numbered_path(path: &Path, n: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "findings".to_string());
    let file = match path.extension() {
        Some(ext) => format!("{}-{}.{}", stem, n, ext.to_string_lossy()),
        None => format!("{}-{}", stem, n),
    };
    path.with_file_name(file)
}

fn write_document(path: &Path, doc: &str) -> Result<()> {
    fs::write(path, format!("{}\n", doc))
        .with_context(|| format!("failed to write {}", path.display()))?;
    log::info!("Wrote {}", path.display());
    Ok(())
}
