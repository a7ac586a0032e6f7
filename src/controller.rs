//! Session controller.
//!
//! The [`Controller`] owns the [`Session`] and the collaborators that feed it:
//! an [`Analyzer`] for batch analysis, a [`ReportRenderer`] for display, a
//! [`ShareCodec`] for share links and an [`InterchangeGenerator`] for export.
//! It processes one request at a time; nothing here is shared across threads.
//!
//! # Example
//!
//! ```
//! use secview::analyze::JsonReportAnalyzer;
//! use secview::controller::{BatchInput, Controller};
//! use secview::progress::NoProgress;
//!
//! let mut controller = Controller::new(JsonReportAnalyzer);
//! let report = br#"{"filename":"ls","binary_type":"Elf64","properties":{"nx":"Enabled"}}"#;
//!
//! let outcomes = controller.analyze_batch(
//!     vec![
//!         BatchInput::new("ls", report.to_vec()),
//!         BatchInput::new("broken", Vec::new()),
//!     ],
//!     &NoProgress,
//! );
//!
//! assert_eq!(outcomes.len(), 2);
//! assert!(outcomes[0].is_success());
//! assert!(!outcomes[1].is_success());
//! assert_eq!(controller.session().export_eligible(), 1);
//! ```

use crate::analyze::Analyzer;
use crate::export::{ExportError, InterchangeGenerator, SarifGenerator};
use crate::progress::BatchProgress;
use crate::render::ReportRenderer;
use crate::report::BinaryReport;
use crate::session::{Session, TabEntry, TabId, Transition};
use crate::share::{
    share_url, token_from_url, Compressor, DecodeError, EncodeError, ShareCodec, ZlibCompressor,
};

/// Banner shown when a share link cannot be decoded.
pub const INVALID_LINK_BANNER: &str = "Invalid or corrupted report link";

/// Default page URL share links are built on.
pub const DEFAULT_BASE_URL: &str = "https://checksec.example/";

/// One file queued for batch analysis.
#[derive(Debug)]
pub struct BatchInput {
    pub filename: String,
    /// File contents, or the reason they could not be read.
    pub bytes: Result<Vec<u8>, String>,
}

impl BatchInput {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes: Ok(bytes),
        }
    }

    /// An input whose contents could not be read; it still gets a tab.
    pub fn unreadable(filename: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            bytes: Err(reason.into()),
        }
    }
}

/// Result of one batch item, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success {
        filename: String,
        tab: TabId,
    },
    Failure {
        filename: String,
        tab: TabId,
        message: String,
    },
}

impl Outcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        match self {
            Self::Success { filename, .. } | Self::Failure { filename, .. } => filename,
        }
    }

    #[must_use]
    pub fn tab(&self) -> TabId {
        match self {
            Self::Success { tab, .. } | Self::Failure { tab, .. } => *tab,
        }
    }
}

/// Errors raised by the share action.
#[derive(thiserror::Error, Debug)]
pub enum ShareError {
    /// The tab is unknown or holds a failed analysis
    #[error("{0} has no shareable report")]
    NotShareable(TabId),

    /// Encoding failed
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Owns the session and drives analysis, sharing and export.
pub struct Controller<A, C = ZlibCompressor, G = SarifGenerator> {
    analyzer: A,
    renderer: ReportRenderer,
    codec: ShareCodec<C>,
    generator: G,
    base_url: String,
    session: Session,
    viewing_shared: bool,
    banner: Option<String>,
}

impl<A: Analyzer> Controller<A> {
    /// Create a controller with the default renderer, codec and generator.
    pub fn new(analyzer: A) -> Self {
        Self {
            analyzer,
            renderer: ReportRenderer::default(),
            codec: ShareCodec::default(),
            generator: SarifGenerator::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            session: Session::new(),
            viewing_shared: false,
            banner: None,
        }
    }
}

impl<A, C, G> Controller<A, C, G>
where
    A: Analyzer,
    C: Compressor,
    G: InterchangeGenerator,
{
    /// Use a different renderer (e.g. with a non-default symbol policy).
    #[must_use]
    pub fn with_renderer(mut self, renderer: ReportRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Use a different share codec.
    pub fn with_codec<C2: Compressor>(self, codec: ShareCodec<C2>) -> Controller<A, C2, G> {
        Controller {
            analyzer: self.analyzer,
            renderer: self.renderer,
            codec,
            generator: self.generator,
            base_url: self.base_url,
            session: self.session,
            viewing_shared: self.viewing_shared,
            banner: self.banner,
        }
    }

    /// Use a different export generator.
    pub fn with_generator<G2: InterchangeGenerator>(self, generator: G2) -> Controller<A, C, G2> {
        Controller {
            analyzer: self.analyzer,
            renderer: self.renderer,
            codec: self.codec,
            generator,
            base_url: self.base_url,
            session: self.session,
            viewing_shared: self.viewing_shared,
            banner: self.banner,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    // ==================== Queries ====================

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn renderer(&self) -> &ReportRenderer {
        &self.renderer
    }

    /// Page-level message, set when a share link fails to load.
    #[must_use]
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// True while the session shows a report loaded from a share link.
    #[must_use]
    pub fn is_viewing_shared(&self) -> bool {
        self.viewing_shared
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ==================== Analysis ====================

    /// Analyze every input in order and open one tab per input.
    ///
    /// Files are analyzed strictly one after another. A failing file becomes
    /// an error tab and the batch continues. The returned outcomes match the
    /// inputs one to one. Starting a batch leaves shared-report mode and
    /// clears the banner.
    pub fn analyze_batch<I>(&mut self, inputs: I, progress: &dyn BatchProgress) -> Vec<Outcome>
    where
        I: IntoIterator<Item = BatchInput>,
    {
        let inputs: Vec<BatchInput> = inputs.into_iter().collect();
        let total = inputs.len();

        if self.viewing_shared || self.banner.is_some() {
            log::debug!("New batch, leaving shared report view");
        }
        self.viewing_shared = false;
        self.banner = None;

        progress.on_batch_start(total);
        log::info!("Analyzing {} file(s)", total);

        let mut entries = Vec::with_capacity(total);
        let mut failures: Vec<Option<String>> = Vec::with_capacity(total);
        let mut names = Vec::with_capacity(total);

        for (n, input) in inputs.into_iter().enumerate() {
            let analyzed = input
                .bytes
                .and_then(|bytes| {
                    self.analyzer
                        .analyze(&bytes, &input.filename)
                        .map_err(|e| e.to_string())
                });

            match analyzed {
                Ok(report) => {
                    let entry = self.render_entry(input.filename.clone(), report);
                    entries.push(entry);
                    failures.push(None);
                }
                Err(message) => {
                    log::warn!("Analysis of {} failed: {}", input.filename, message);
                    entries.push(TabEntry::error(input.filename.clone(), message.clone()));
                    failures.push(Some(message));
                }
            }
            progress.on_item(n + 1, &input.filename);
            names.push(input.filename);
        }

        let ids = self.session.open_batch(entries);
        progress.on_batch_end();

        names
            .into_iter()
            .zip(failures)
            .zip(ids)
            .map(|((filename, failure), tab)| match failure {
                None => Outcome::Success { filename, tab },
                Some(message) => Outcome::Failure {
                    filename,
                    tab,
                    message,
                },
            })
            .collect()
    }

    // ==================== Share links ====================

    /// Build a share URL for the report behind `tab`.
    ///
    /// # Errors
    ///
    /// Returns [`ShareError`] if the tab has no report or encoding fails.
    /// The session is left untouched either way.
    pub fn share(&self, tab: TabId) -> Result<String, ShareError> {
        let report = self
            .session
            .report(tab)
            .ok_or(ShareError::NotShareable(tab))?;
        let token = self.codec.encode(report)?;
        Ok(share_url(&self.base_url, &token))
    }

    /// Load a report from a share URL.
    ///
    /// Returns `None` when the URL carries no share marker, in which case
    /// nothing happens.
    pub fn load_from_url(&mut self, url: &str) -> Option<Result<TabId, DecodeError>> {
        let token = token_from_url(url)?;
        Some(self.load_shared(token))
    }

    /// Decode a share token and open its report in a new tab.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] for any invalid token. The banner is set to
    /// [`INVALID_LINK_BANNER`] and no tab is created.
    pub fn load_shared(&mut self, token: &str) -> Result<TabId, DecodeError> {
        let report = match self.codec.decode(token) {
            Ok(report) => report,
            Err(e) => {
                log::warn!("Could not load shared report: {}", e);
                self.banner = Some(INVALID_LINK_BANNER.to_string());
                return Err(e);
            }
        };

        self.banner = None;
        self.viewing_shared = true;
        let title = report.filename.clone();
        let entry = self.render_entry(title, report);
        let ids = self.session.open_batch([entry]);
        log::info!("Loaded shared report into {}", ids[0]);
        Ok(ids[0])
    }

    // ==================== Export ====================

    /// Export the report behind one tab.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::NotExportable`] for error or unknown tabs, or
    /// whatever the generator reports.
    pub fn export(&self, tab: TabId) -> Result<String, ExportError> {
        let report = self
            .session
            .report(tab)
            .ok_or(ExportError::NotExportable(tab))?;
        self.generator.generate(&[report])
    }

    /// Export every successful tab in one document, in tab order.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::NoReports`] when no tab holds a report.
    pub fn export_combined(&self) -> Result<String, ExportError> {
        let reports = self.session.exportable_reports();
        if reports.is_empty() {
            return Err(ExportError::NoReports);
        }
        log::debug!("Exporting {} report(s)", reports.len());
        self.generator.generate(&reports)
    }

    // ==================== Tab operations ====================

    pub fn close(&mut self, tab: TabId) -> Transition {
        self.session.close(tab)
    }

    pub fn switch_to(&mut self, tab: TabId) -> Transition {
        self.session.switch_to(tab)
    }

    pub fn close_all(&mut self) -> Transition {
        self.session.close_all()
    }

    // ==================== Internals ====================

    /// Render a report; any version diagnostic rides along with the entry.
    fn render_entry(&self, title: String, report: BinaryReport) -> TabEntry {
        let rendered = self.renderer.render(&report);
        TabEntry::report(title, rendered.view, report).with_warning(rendered.warning)
    }
}
