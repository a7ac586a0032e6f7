//! Plain-text session output for the terminal.
//!
//! Every tab is printed in order; the active tab is marked with `*`. Verdicts
//! are colored with `yansi` when color is enabled.

use std::fmt::Write as _;
use std::io::Write;

use yansi::Paint;

use crate::classify::Verdict;
use crate::render::{RenderedReport, VerdictTally};
use crate::session::{Session, Tab, TabContent};

/// Renders a session as text.
#[derive(Debug, Clone, Copy)]
pub struct TextOutput<'a> {
    session: &'a Session,
    banner: Option<&'a str>,
    viewing_shared: bool,
    color: bool,
}

impl<'a> TextOutput<'a> {
    #[must_use]
    pub fn new(session: &'a Session, color: bool) -> Self {
        Self {
            session,
            banner: None,
            viewing_shared: false,
            color,
        }
    }

    #[must_use]
    pub fn with_banner(mut self, banner: Option<&'a str>) -> Self {
        self.banner = banner;
        self
    }

    #[must_use]
    pub fn shared(mut self, viewing_shared: bool) -> Self {
        self.viewing_shared = viewing_shared;
        self
    }

    /// Render to a string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();

        if let Some(banner) = self.banner {
            let _ = writeln!(out, "{}", self.paint(banner, Verdict::Insecure));
            let _ = writeln!(out);
        }
        if self.viewing_shared {
            let _ = writeln!(out, "Viewing a shared report");
            let _ = writeln!(out);
        }

        for warning in self.session.diagnostics() {
            let _ = writeln!(out, "{}", self.paint(&warning.to_string(), Verdict::Partial));
        }

        for tab in self.session.tabs() {
            self.render_tab(&mut out, tab);
        }
        out
    }

    /// Write to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(self.render().as_bytes())
    }

    fn render_tab(&self, out: &mut String, tab: &Tab) {
        let marker = if tab.is_active() { '*' } else { ' ' };
        let _ = writeln!(out, "{} [{}] {}", marker, tab.index() + 1, tab.title());

        match tab.content() {
            TabContent::Report { view } => self.render_report(out, view),
            TabContent::Error { message } => {
                let _ = writeln!(
                    out,
                    "    {} {}",
                    self.paint("Error:", Verdict::Insecure),
                    message
                );
            }
        }
        let _ = writeln!(out);
    }

    fn render_report(&self, out: &mut String, view: &RenderedReport) {
        let _ = writeln!(out, "    {}", view.title);
        let width = view
            .rows
            .iter()
            .map(|r| r.label.chars().count())
            .max()
            .unwrap_or(0);

        for row in &view.rows {
            let _ = writeln!(
                out,
                "    {:<width$}  {}",
                row.label,
                self.paint(&row.value, row.verdict),
                width = width
            );
            for detail in &row.details {
                let _ = writeln!(out, "    {:<width$}    {}", "", detail, width = width);
            }
        }
        let _ = writeln!(out, "    {}", summary_line(view.tally()));
    }

    fn paint(&self, text: &str, verdict: Verdict) -> String {
        if !self.color {
            return text.to_string();
        }
        match verdict {
            Verdict::Secure => text.green().to_string(),
            Verdict::Partial => text.yellow().to_string(),
            Verdict::Insecure => text.red().bold().to_string(),
            Verdict::Info => text.cyan().to_string(),
        }
    }
}

fn summary_line(tally: VerdictTally) -> String {
    format!(
        "{} secure, {} partial, {} insecure, {} info",
        tally.secure, tally.partial, tally.insecure, tally.info
    )
}
