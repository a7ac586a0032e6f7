//! Seam to the external binary-analysis engine.
//!
//! The engine itself (format parsing, hashing, hardening detection) lives
//! outside this crate. [`Analyzer`] is the interface the session controller
//! calls; [`JsonReportAnalyzer`] adapts the engine's JSON output so the CLI
//! can work from reports the engine has already written.

use serde::Deserialize;
use serde_json::Value;

use crate::report::{BinaryReport, BinaryType, Properties, SecurityProperty};

/// One file failed analysis.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// The input had no bytes
    #[error("file is empty")]
    Empty,

    /// The input is not something the engine understands
    #[error("unsupported file type: {0}")]
    Unsupported(String),

    /// The engine ran and reported a failure
    #[error("{0}")]
    Engine(String),
}

/// The binary-analysis engine.
pub trait Analyzer {
    /// Analyze one file's bytes.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError`] when the file cannot be analyzed. The error
    /// affects only this file.
    fn analyze(&self, bytes: &[u8], filename: &str) -> Result<BinaryReport, AnalysisError>;
}

impl<F> Analyzer for F
where
    F: Fn(&[u8], &str) -> Result<BinaryReport, AnalysisError>,
{
    fn analyze(&self, bytes: &[u8], filename: &str) -> Result<BinaryReport, AnalysisError> {
        self(bytes, filename)
    }
}

/// Older engine output: `{"version", "filename", "data": {"Elf": {...}}}`.
#[derive(Deserialize)]
struct LegacyReport {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    filename: Option<String>,
    data: serde_json::Map<String, Value>,
}

/// Reads reports the engine has already serialized to JSON.
///
/// Both the current report shape and the older `data`-keyed shape are
/// accepted. The filename the user supplied always wins over the one stored
/// in the document, since the engine may not know the original name.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReportAnalyzer;

impl Analyzer for JsonReportAnalyzer {
    fn analyze(&self, bytes: &[u8], filename: &str) -> Result<BinaryReport, AnalysisError> {
        if bytes.is_empty() {
            return Err(AnalysisError::Empty);
        }

        let doc: Value = serde_json::from_slice(bytes).map_err(|e| {
            log::debug!("{} is not an engine JSON report: {}", filename, e);
            AnalysisError::Unsupported("expected an analysis report in JSON form".to_string())
        })?;

        if let Some(message) = doc.get("error").and_then(Value::as_str) {
            return Err(AnalysisError::Engine(message.to_string()));
        }

        let mut report = if doc.get("properties").is_some() {
            serde_json::from_value::<BinaryReport>(doc)
                .map_err(|e| AnalysisError::Unsupported(e.to_string()))?
        } else if doc.get("data").is_some() {
            let legacy = serde_json::from_value::<LegacyReport>(doc)
                .map_err(|e| AnalysisError::Unsupported(e.to_string()))?;
            from_legacy(legacy)?
        } else {
            return Err(AnalysisError::Unsupported(
                "report has neither properties nor data".to_string(),
            ));
        };

        if !filename.is_empty() {
            report.filename = filename.to_string();
        }
        Ok(report)
    }
}

fn from_legacy(legacy: LegacyReport) -> Result<BinaryReport, AnalysisError> {
    let mut entries = legacy.data.into_iter();
    let (family, body) = match (entries.next(), entries.next()) {
        (Some(only), None) => only,
        _ => {
            return Err(AnalysisError::Unsupported(
                "expected exactly one binary format in report data".to_string(),
            ))
        }
    };

    let properties: Properties = serde_json::from_value(body)
        .map_err(|e| AnalysisError::Unsupported(format!("{} properties: {}", family, e)))?;

    let bits = match properties.get("bitness") {
        Some(SecurityProperty::Count(n)) => Some(*n),
        Some(SecurityProperty::Enum(s)) => s.trim().parse().ok(),
        _ => None,
    };

    Ok(BinaryReport {
        version: legacy.version,
        filename: legacy.filename.unwrap_or_default(),
        binary_type: BinaryType::from_family(&family, bits),
        properties,
    })
}
