//! Tab session state machine.
//!
//! A [`Session`] is either empty or holds an ordered list of tabs of which
//! exactly one is active once a mutation settles. Tab indices always equal
//! their positions `0..n-1`. Every mutation returns enough information for a
//! UI collaborator to translate it into visual effects without carrying any
//! session logic of its own.

use std::collections::HashMap;

use chrono::Utc;

use crate::render::UnknownVersion;
use crate::report::BinaryReport;
use crate::session::tab::{Tab, TabContent, TabEntry, TabId};

/// Coarse session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No tabs open.
    Empty,
    /// At least one tab open.
    Populated,
}

/// Visual effect of a session mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed.
    Unchanged,
    /// A different tab became active.
    Activated { id: TabId },
    /// A tab was removed; `activated` is set when the active tab moved.
    Closed {
        id: TabId,
        activated: Option<TabId>,
    },
    /// The last tabs were removed and the session is empty.
    Emptied { closed: usize },
}

/// Ordered set of open tabs plus the reports retained for them.
#[derive(Debug, Clone, Default)]
pub struct Session {
    tabs: Vec<Tab>,
    reports: HashMap<TabId, BinaryReport>,
    next_id: u64,
    export_eligible: usize,
    diagnostics: HashMap<TabId, UnknownVersion>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Queries ====================

    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.tabs.is_empty() {
            SessionState::Empty
        } else {
            SessionState::Populated
        }
    }

    #[must_use]
    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    /// The active tab, if any.
    #[must_use]
    pub fn active(&self) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.active)
    }

    /// Report retained for a successful tab.
    #[must_use]
    pub fn report(&self, id: TabId) -> Option<&BinaryReport> {
        self.reports.get(&id)
    }

    /// Reports of all successful tabs, in tab order.
    #[must_use]
    pub fn exportable_reports(&self) -> Vec<&BinaryReport> {
        self.tabs
            .iter()
            .filter_map(|t| self.reports.get(&t.id))
            .collect()
    }

    /// Number of successful (non-error) tabs available for combined export.
    #[must_use]
    pub fn export_eligible(&self) -> usize {
        self.export_eligible
    }

    /// Version fallbacks of the open tabs, in tab order.
    #[must_use]
    pub fn diagnostics(&self) -> Vec<&UnknownVersion> {
        self.tabs
            .iter()
            .filter_map(|t| self.diagnostics.get(&t.id))
            .collect()
    }

    /// Version fallback raised while rendering `id`, if any.
    #[must_use]
    pub fn diagnostic(&self, id: TabId) -> Option<&UnknownVersion> {
        self.diagnostics.get(&id)
    }

    // ==================== Transitions ====================

    /// Append a tab at the end.
    ///
    /// The new tab becomes active only when it is the only tab.
    pub fn open(&mut self, entry: TabEntry) -> TabId {
        let id = self.push(entry);
        if self.tabs.len() == 1 {
            self.tabs[0].active = true;
        }
        self.recount();
        log::debug!("Opened {} at index {}", id, self.tabs.len() - 1);
        id
    }

    /// Append several tabs in input order, then activate only the last one.
    ///
    /// An empty batch leaves the session untouched.
    pub fn open_batch<I>(&mut self, entries: I) -> Vec<TabId>
    where
        I: IntoIterator<Item = TabEntry>,
    {
        let ids: Vec<TabId> = entries.into_iter().map(|e| self.push(e)).collect();
        if let Some(&last) = ids.last() {
            for tab in &mut self.tabs {
                tab.active = tab.id == last;
            }
            log::debug!("Opened batch of {} tabs, {} active", ids.len(), last);
        }
        self.recount();
        ids
    }

    /// Remove a tab and keep indices contiguous.
    ///
    /// If the closed tab was active, the tab now at `max(0, index - 1)`
    /// becomes active. Closing the last tab empties the session and drops all
    /// retained reports. The tab's diagnostic goes with it. Unknown ids are
    /// ignored.
    pub fn close(&mut self, id: TabId) -> Transition {
        let Some(position) = self.tabs.iter().position(|t| t.id == id) else {
            log::trace!("Close ignored for unknown {}", id);
            return Transition::Unchanged;
        };

        let removed = self.tabs.remove(position);
        self.reports.remove(&id);
        self.diagnostics.remove(&id);
        self.reindex();

        if self.tabs.is_empty() {
            self.reports.clear();
            self.diagnostics.clear();
            self.recount();
            log::debug!("Closed {}, session empty", id);
            return Transition::Emptied { closed: 1 };
        }

        let activated = if removed.active {
            let target = position.saturating_sub(1);
            self.tabs[target].active = true;
            Some(self.tabs[target].id)
        } else {
            None
        };
        self.recount();

        log::debug!("Closed {} (index {}), activated {:?}", id, position, activated);
        Transition::Closed { id, activated }
    }

    /// Make `id` the only active tab.
    pub fn switch_to(&mut self, id: TabId) -> Transition {
        match self.get(id) {
            None => return Transition::Unchanged,
            Some(tab) if tab.active => return Transition::Unchanged,
            Some(_) => {}
        }
        for tab in &mut self.tabs {
            tab.active = tab.id == id;
        }
        log::trace!("Switched to {}", id);
        Transition::Activated { id }
    }

    /// Close every tab and drop all retained reports and diagnostics.
    pub fn close_all(&mut self) -> Transition {
        let closed = self.tabs.len();
        if closed == 0 {
            return Transition::Unchanged;
        }
        self.tabs.clear();
        self.reports.clear();
        self.diagnostics.clear();
        self.recount();
        log::debug!("Closed all {} tabs", closed);
        Transition::Emptied { closed }
    }

    // ==================== Internals ====================

    fn push(&mut self, entry: TabEntry) -> TabId {
        let id = TabId(self.next_id);
        self.next_id += 1;

        if let Some(report) = entry.report {
            if !entry.content.is_error() {
                self.reports.insert(id, report);
            }
        }
        if let Some(warning) = entry.warning {
            self.diagnostics.insert(id, warning);
        }

        self.tabs.push(Tab {
            id,
            index: self.tabs.len(),
            title: entry.title,
            content: entry.content,
            active: false,
            opened_at: Utc::now(),
        });
        id
    }

    fn reindex(&mut self) {
        for (index, tab) in self.tabs.iter_mut().enumerate() {
            tab.index = index;
        }
    }

    fn recount(&mut self) {
        self.export_eligible = self
            .tabs
            .iter()
            .filter(|t| matches!(t.content, TabContent::Report { .. }) && self.reports.contains_key(&t.id))
            .count();
    }
}
