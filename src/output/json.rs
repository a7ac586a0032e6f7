//! JSON output for a viewed session.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "tabs": [
//!     {
//!       "id": 0,
//!       "index": 0,
//!       "title": "ls",
//!       "content": {
//!         "kind": "report",
//!         "view": { "title": "ELF (64 bit) Security Analysis - ls", "filename": "ls", "rows": [] }
//!       },
//!       "active": true,
//!       "opened_at": "2026-01-01T00:00:00Z"
//!     }
//!   ],
//!   "summary": {
//!     "tabs": 1,
//!     "export_eligible": 1,
//!     "viewing_shared": false,
//!     "banner": null,
//!     "diagnostics": [],
//!     "exit_code": 0,
//!     "exit_code_name": "SV000"
//!   }
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::error::ExitCode;
use crate::render::UnknownVersion;
use crate::session::{Session, Tab};

/// Session-level facts.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary<'a> {
    pub tabs: usize,
    pub export_eligible: usize,
    pub viewing_shared: bool,
    pub banner: Option<&'a str>,
    pub diagnostics: Vec<&'a UnknownVersion>,
    pub exit_code: i32,
    pub exit_code_name: &'static str,
}

/// Complete JSON document for a session.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    pub tabs: &'a [Tab],
    pub summary: JsonSummary<'a>,
}

impl<'a> JsonOutput<'a> {
    #[must_use]
    pub fn new(
        session: &'a Session,
        viewing_shared: bool,
        banner: Option<&'a str>,
        exit_code: ExitCode,
    ) -> Self {
        Self {
            tabs: session.tabs(),
            summary: JsonSummary {
                tabs: session.len(),
                export_eligible: session.export_eligible(),
                viewing_shared,
                banner,
                diagnostics: session.diagnostics(),
                exit_code: exit_code.as_i32(),
                exit_code_name: exit_code.code_prefix(),
            },
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write to a writer, followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> anyhow::Result<()> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}
