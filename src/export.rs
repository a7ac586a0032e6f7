//! SARIF export for one or many reports.
//!
//! Export goes through the [`InterchangeGenerator`] trait. The built-in
//! [`SarifGenerator`] writes a SARIF 2.1.0 log with one run per report. Each
//! run names the analyzed file as its artifact and carries one result per
//! labelled property.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "$schema": "https://schemastore.azurewebsites.net/schemas/json/sarif-2.1.0-rtm.5.json",
//!   "version": "2.1.0",
//!   "runs": [
//!     {
//!       "tool": { "driver": { "name": "secview", "version": "0.1.0" } },
//!       "artifacts": [ { "location": { "uri": "ls" } } ],
//!       "results": [
//!         {
//!           "ruleId": "relro",
//!           "message": { "text": "RELRO: Partial" },
//!           "level": "warning"
//!         }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::io::Write;

use serde_sarif::sarif;

use crate::classify::{ClassificationEngine, SymbolCountPolicy, Verdict};
use crate::report::{BinaryReport, PathEntry, SecurityProperty};
use crate::session::TabId;

/// SARIF format version written by [`SarifGenerator`].
pub const SARIF_VERSION: &str = "2.1.0";

/// Errors that can occur during export.
#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during export: {0}")]
    Io(#[from] std::io::Error),

    /// Nothing to export
    #[error("no successful reports to export")]
    NoReports,

    /// The requested tab has no report (unknown or failed analysis)
    #[error("{0} has no exportable report")]
    NotExportable(TabId),
}

/// Produces an interchange document from one or more reports.
pub trait InterchangeGenerator {
    /// Generate a single document covering every report given.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] if the document cannot be produced.
    fn generate(&self, reports: &[&BinaryReport]) -> Result<String, ExportError>;
}

/// Built-in SARIF 2.1.0 generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SarifGenerator {
    engine: ClassificationEngine,
}

impl SarifGenerator {
    #[must_use]
    pub fn new(engine: ClassificationEngine) -> Self {
        Self { engine }
    }

    /// Build the SARIF log covering `reports`, one run each.
    #[must_use]
    pub fn build(&self, reports: &[&BinaryReport]) -> sarif::Sarif {
        let runs: Vec<sarif::Run> = reports.iter().map(|r| self.run_for(r)).collect();
        sarif::Sarif::builder()
            .schema(sarif::SCHEMA_URL)
            .runs(runs)
            .version(SARIF_VERSION.to_string())
            .build()
    }

    /// Write the SARIF log for `reports` as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(
        &self,
        reports: &[&BinaryReport],
        writer: &mut W,
    ) -> Result<(), ExportError> {
        let json = self.generate(reports)?;
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    fn run_for(&self, report: &BinaryReport) -> sarif::Run {
        let tool = sarif::Tool::builder()
            .driver(
                sarif::ToolComponent::builder()
                    .name(env!("CARGO_PKG_NAME").to_string())
                    .version(env!("CARGO_PKG_VERSION").to_string())
                    .build(),
            )
            .build();
        let artifact = sarif::Artifact::builder()
            .location(
                sarif::ArtifactLocation::builder()
                    .uri(report.filename.clone())
                    .build(),
            )
            .build();

        let results: Vec<sarif::Result> = report
            .properties
            .iter()
            .filter_map(|(key, value)| {
                let label = ClassificationEngine::label(key)?;
                Some(
                    sarif::Result::builder()
                        .rule_id(key.to_string())
                        .message(
                            sarif::Message::builder()
                                .text(format!("{}: {}", label, message_value(&self.engine, key, value)))
                                .build(),
                        )
                        .level(self.level(report, key, value))
                        .build(),
                )
            })
            .collect();

        sarif::Run::builder()
            .tool(tool)
            .artifacts(vec![artifact])
            .results(results)
            .build()
    }

    /// SARIF level of one property.
    ///
    /// Secure values map to `none` and failed checks to `warning`. Values
    /// that cannot be judged are notes, as are PIE DSO and REL objects.
    fn level(&self, report: &BinaryReport, key: &str, value: &SecurityProperty) -> sarif::ResultLevel {
        match (key, value) {
            ("pie", SecurityProperty::Enum(v)) if v == "DSO" || v == "REL" => {
                return sarif::ResultLevel::Note;
            }
            // Function counts share the level of the fortify verdict.
            ("fortified" | "fortifiable", SecurityProperty::Count(_)) => {
                if let Some(fortify @ SecurityProperty::Enum(_)) = report.properties.get("fortify") {
                    return self.level(report, "fortify", fortify);
                }
            }
            ("symbol_count", SecurityProperty::Count(n))
                if self.engine.symbol_policy() == SymbolCountPolicy::Informational =>
            {
                return if *n == 0 {
                    sarif::ResultLevel::None
                } else {
                    sarif::ResultLevel::Warning
                };
            }
            _ => {}
        }
        match self.engine.classify(key, value) {
            Verdict::Secure => sarif::ResultLevel::None,
            Verdict::Partial | Verdict::Insecure => sarif::ResultLevel::Warning,
            Verdict::Info => sarif::ResultLevel::Note,
        }
    }
}

impl InterchangeGenerator for SarifGenerator {
    fn generate(&self, reports: &[&BinaryReport]) -> Result<String, ExportError> {
        if reports.is_empty() {
            return Err(ExportError::NoReports);
        }
        log::debug!("Generating SARIF for {} report(s)", reports.len());
        Ok(serde_json::to_string_pretty(&self.build(reports))?)
    }
}

/// Message text for a value; list values are spelled out in full.
fn message_value(engine: &ClassificationEngine, key: &str, value: &SecurityProperty) -> String {
    match value {
        SecurityProperty::Libraries(libs) if !libs.is_empty() => libs.join(", "),
        SecurityProperty::Paths { paths } => {
            let listed: Vec<&str> = paths.iter().filter_map(PathEntry::path).collect();
            if listed.is_empty() {
                engine.format(key, value)
            } else {
                listed.join(", ")
            }
        }
        _ => engine.format(key, value),
    }
}
