//! Turning reports into displayable structures.
//!
//! The [`ReportRenderer`] picks a rendering strategy through the
//! [`VersionDispatcher`] and classifies every displayable property with the
//! [`ClassificationEngine`]. The result is a [`RenderedReport`]: plain rows of
//! label, value, verdict and detail lines that any UI collaborator can draw.

pub mod dispatch;

use serde::Serialize;

use crate::classify::{ClassificationEngine, Verdict};
use crate::report::BinaryReport;

pub use dispatch::{RenderFn, Resolution, UnknownVersion, VersionDispatcher, FALLBACK_VERSION};

/// Report schema version written by the current engine.
pub const CURRENT_VERSION: &str = "0.1.0";

/// One displayable line of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    /// Property key, or a synthetic key for header rows.
    pub key: String,
    pub label: String,
    pub value: String,
    pub verdict: Verdict,
    /// Bullet lines listing list entries; empty for scalar values.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

/// A report ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedReport {
    pub title: String,
    pub filename: String,
    pub rows: Vec<Row>,
}

/// Count of rows per verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VerdictTally {
    pub secure: usize,
    pub partial: usize,
    pub insecure: usize,
    pub info: usize,
}

impl RenderedReport {
    /// Tally the verdicts of all rows.
    #[must_use]
    pub fn tally(&self) -> VerdictTally {
        let mut tally = VerdictTally::default();
        for row in &self.rows {
            match row.verdict {
                Verdict::Secure => tally.secure += 1,
                Verdict::Partial => tally.partial += 1,
                Verdict::Insecure => tally.insecure += 1,
                Verdict::Info => tally.info += 1,
            }
        }
        tally
    }

    /// Find a row by property key.
    #[must_use]
    pub fn row(&self, key: &str) -> Option<&Row> {
        self.rows.iter().find(|r| r.key == key)
    }
}

/// Renderer for `0.1.0` reports: header rows, then every labelled property in order.
pub(crate) fn render_v1(engine: &ClassificationEngine, report: &BinaryReport) -> RenderedReport {
    let family = report.binary_type.family();
    let title = match report.binary_type.bits() {
        Some(bits) => format!(
            "{} ({} bit) Security Analysis - {}",
            family, bits, report.filename
        ),
        None => format!("{} Security Analysis - {}", family, report.filename),
    };

    let mut rows = vec![
        Row {
            key: "file_type".to_string(),
            label: "File Type".to_string(),
            value: family.to_string(),
            verdict: Verdict::Info,
            details: Vec::new(),
        },
        Row {
            key: "filename".to_string(),
            label: "Filename".to_string(),
            value: report.filename.clone(),
            verdict: Verdict::Info,
            details: Vec::new(),
        },
    ];

    for (key, value) in report.properties.iter() {
        // Filename is already a header row.
        if key == "filename" {
            continue;
        }
        let Some(label) = ClassificationEngine::label(key) else {
            log::trace!("Suppressing unlabelled property {}", key);
            continue;
        };
        rows.push(Row {
            key: key.to_string(),
            label: label.to_string(),
            value: engine.format(key, value),
            verdict: engine.classify(key, value),
            details: engine.details(key, value),
        });
    }

    RenderedReport {
        title,
        filename: report.filename.clone(),
        rows,
    }
}

/// A rendered report together with any version diagnostic raised on the way.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub view: RenderedReport,
    pub warning: Option<UnknownVersion>,
}

/// Composes version dispatch and classification.
#[derive(Debug, Clone, Default)]
pub struct ReportRenderer {
    engine: ClassificationEngine,
    dispatcher: VersionDispatcher,
}

impl ReportRenderer {
    #[must_use]
    pub fn new(engine: ClassificationEngine) -> Self {
        Self {
            engine,
            dispatcher: VersionDispatcher::default(),
        }
    }

    #[must_use]
    pub fn engine(&self) -> &ClassificationEngine {
        &self.engine
    }

    #[must_use]
    pub fn dispatcher(&self) -> &VersionDispatcher {
        &self.dispatcher
    }

    /// Render one report with the strategy registered for its version.
    #[must_use]
    pub fn render(&self, report: &BinaryReport) -> Rendered {
        let resolution = self.dispatcher.resolve(report.version.as_deref());
        log::debug!(
            "Rendering {} with {} renderer",
            report.filename,
            resolution.version
        );
        Rendered {
            view: (resolution.render)(&self.engine, report),
            warning: resolution.warning,
        }
    }
}
