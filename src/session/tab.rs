//! Data structures for session tabs.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::render::{RenderedReport, UnknownVersion};
use crate::report::BinaryReport;

/// Identifier of a tab, stable for the tab's lifetime.
///
/// Ids are allocated monotonically per session and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TabId(pub(crate) u64);

impl TabId {
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab-{}", self.0)
    }
}

/// What a tab shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TabContent {
    /// A successfully rendered report.
    Report { view: RenderedReport },
    /// Analysis of this file failed.
    Error { message: String },
}

impl TabContent {
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// One open report or error view.
#[derive(Debug, Clone, Serialize)]
pub struct Tab {
    pub(crate) id: TabId,
    pub(crate) index: usize,
    pub(crate) title: String,
    pub(crate) content: TabContent,
    pub(crate) active: bool,
    pub(crate) opened_at: DateTime<Utc>,
}

impl Tab {
    #[must_use]
    pub fn id(&self) -> TabId {
        self.id
    }

    /// Position in the tab strip (0-based, contiguous).
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn content(&self) -> &TabContent {
        &self.content
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.content.is_error()
    }

    #[must_use]
    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }
}

/// Input for opening a tab.
///
/// Successful entries carry the source report so the session can retain it
/// for share and export while the tab stays open. A version fallback raised
/// while rendering travels with the entry and lives as long as the tab.
#[derive(Debug, Clone)]
pub struct TabEntry {
    pub title: String,
    pub content: TabContent,
    pub report: Option<BinaryReport>,
    pub warning: Option<UnknownVersion>,
}

impl TabEntry {
    /// Entry for a rendered report; the report is retained for share/export.
    pub fn report(title: impl Into<String>, view: RenderedReport, report: BinaryReport) -> Self {
        Self {
            title: title.into(),
            content: TabContent::Report { view },
            report: Some(report),
            warning: None,
        }
    }

    /// Attach the version diagnostic raised while rendering this entry.
    #[must_use]
    pub fn with_warning(mut self, warning: Option<UnknownVersion>) -> Self {
        self.warning = warning;
        self
    }

    /// Entry for a failed analysis.
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: TabContent::Error {
                message: message.into(),
            },
            report: None,
            warning: None,
        }
    }
}
