//! Session module for the set of open analysis-result tabs.
//!
//! A session is an in-memory, ordered collection of tabs. Each tab shows
//! either a rendered report or the error that prevented one. Reports behind
//! successful tabs are retained by the session, keyed by tab id, so they can
//! be shared or exported while the tab stays open.
//!
//! # Invariants
//!
//! * **Single active tab**: once a mutation settles, exactly one tab is
//!   active whenever the session is non-empty.
//! * **Index stability**: tab indices are always the positions `0..n-1`,
//!   recomputed on every removal, in original relative order.
//! * **Id stability**: a tab keeps its id for its whole lifetime; ids are
//!   never reused within a session.
//!
//! # Architecture
//!
//! * [`tab`]: Tab data, content and open requests.
//! * [`state`]: The [`Session`] state machine and its transitions.

pub mod state;
pub mod tab;

pub use state::{Session, SessionState, Transition};
pub use tab::{Tab, TabContent, TabEntry, TabId};
