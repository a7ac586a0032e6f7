//! Output formatters for a viewed session.
//!
//! - [`text`]: colored terminal text
//! - [`json`]: machine-readable JSON
//!
//! Findings documents for export live in [`crate::export`].
//!
//! # Example
//!
//! ```
//! use secview::output::TextOutput;
//! use secview::session::Session;
//!
//! let session = Session::new();
//! let text = TextOutput::new(&session, false).render();
//! assert!(text.is_empty());
//! ```

pub mod json;
pub mod text;

pub use json::JsonOutput;
pub use text::TextOutput;
