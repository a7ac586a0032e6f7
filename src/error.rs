//! Exit codes and structured error output.

use serde::Serialize;

/// Process exit codes.
///
/// - 0: Success (every requested report was produced)
/// - 1: General error (bad arguments, config, I/O, invalid share link)
/// - 2: No successful reports (every file failed analysis)
/// - 3: Partial success (some files failed analysis)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: every input produced a report, or the command completed.
    Success = 0,
    /// General error: arguments, configuration, I/O or an invalid share link.
    GeneralError = 1,
    /// No successful reports: every input failed analysis.
    NoSuccessfulReports = 2,
    /// Partial success: some inputs failed analysis but at least one succeeded.
    PartialSuccess = 3,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Machine-readable code, e.g. `SV002`.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "SV000",
            Self::GeneralError => "SV001",
            Self::NoSuccessfulReports => "SV002",
            Self::PartialSuccess => "SV003",
        }
    }

    /// Exit code for a batch with `succeeded` of `total` files analyzed.
    ///
    /// An empty batch counts as success.
    #[must_use]
    pub fn for_batch(succeeded: usize, total: usize) -> Self {
        if succeeded == total {
            Self::Success
        } else if succeeded == 0 {
            Self::NoSuccessfulReports
        } else {
            Self::PartialSuccess
        }
    }
}

/// Error description printed with `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// Machine-readable error code (e.g. `SV001`).
    pub code: String,
    /// Numeric process exit code.
    pub exit_code: i32,
    /// Human-readable message of the outermost error.
    pub message: String,
    /// Underlying causes, outermost first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl StructuredError {
    /// Build from an error chain and the exit code it maps to.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: err.to_string(),
            causes: err.chain().skip(1).map(ToString::to_string).collect(),
        }
    }
}
