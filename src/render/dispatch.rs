//! Rendering strategy selection by report schema version.
//!
//! Renderers are registered in a table keyed by version string. A report
//! whose version is missing or not in the table is rendered with the
//! [`FALLBACK_VERSION`] renderer and the lookup yields an [`UnknownVersion`]
//! warning instead of an error.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::classify::ClassificationEngine;
use crate::report::BinaryReport;

use super::{render_v1, RenderedReport, CURRENT_VERSION};

/// Version whose renderer handles every unknown version.
pub const FALLBACK_VERSION: &str = CURRENT_VERSION;

/// A rendering strategy for one schema version.
pub type RenderFn = fn(&ClassificationEngine, &BinaryReport) -> RenderedReport;

/// Non-fatal diagnostic: the report version had no registered renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownVersion {
    /// Version found in the report, if any.
    pub requested: Option<String>,
    /// Version whose renderer was used instead.
    pub fallback: &'static str,
}

impl fmt::Display for UnknownVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.requested {
            Some(v) => write!(
                f,
                "Unknown report version {}, falling back to {} display",
                v, self.fallback
            ),
            None => write!(
                f,
                "Report has no version, falling back to {} display",
                self.fallback
            ),
        }
    }
}

/// Outcome of a version lookup.
#[derive(Clone)]
pub struct Resolution {
    /// Version whose renderer was selected.
    pub version: &'static str,
    pub render: RenderFn,
    /// Set when the fallback was used.
    pub warning: Option<UnknownVersion>,
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolution")
            .field("version", &self.version)
            .field("warning", &self.warning)
            .finish_non_exhaustive()
    }
}

/// Table of renderers keyed by report schema version.
#[derive(Clone)]
pub struct VersionDispatcher {
    renderers: BTreeMap<&'static str, RenderFn>,
}

impl Default for VersionDispatcher {
    fn default() -> Self {
        let mut renderers: BTreeMap<&'static str, RenderFn> = BTreeMap::new();
        renderers.insert(CURRENT_VERSION, render_v1);
        Self { renderers }
    }
}

impl fmt::Debug for VersionDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionDispatcher")
            .field("versions", &self.versions())
            .finish()
    }
}

impl VersionDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Versions with a registered renderer, in sorted order.
    #[must_use]
    pub fn versions(&self) -> Vec<&'static str> {
        self.renderers.keys().copied().collect()
    }

    #[must_use]
    pub fn is_known(&self, version: &str) -> bool {
        self.renderers.contains_key(version)
    }

    /// Select the renderer for `version`, falling back for unknown or absent values.
    #[must_use]
    pub fn resolve(&self, version: Option<&str>) -> Resolution {
        if let Some((known, render)) = version.and_then(|v| self.renderers.get_key_value(v)) {
            return Resolution {
                version: known,
                render: *render,
                warning: None,
            };
        }

        let warning = UnknownVersion {
            requested: version.map(str::to_string),
            fallback: FALLBACK_VERSION,
        };
        log::warn!("{}", warning);

        Resolution {
            version: FALLBACK_VERSION,
            render: self.fallback(),
            warning: Some(warning),
        }
    }

    fn fallback(&self) -> RenderFn {
        self.renderers
            .get(FALLBACK_VERSION)
            .copied()
            .unwrap_or(render_v1)
    }
}
