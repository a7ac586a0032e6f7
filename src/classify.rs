//! Security verdicts for raw report properties.
//!
//! The [`ClassificationEngine`] maps a `(key, value)` pair to a [`Verdict`],
//! a display string, and optional detail rows. Every function here is pure:
//! the same input always yields the same output.
//!
//! # Example
//!
//! ```
//! use secview::classify::{ClassificationEngine, Verdict};
//! use secview::report::SecurityProperty;
//!
//! let engine = ClassificationEngine::default();
//! let relro = SecurityProperty::enumerated("Full");
//! assert_eq!(engine.classify("relro", &relro), Verdict::Secure);
//! assert_eq!(engine.format("relro", &relro), "Full");
//! ```

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::report::{PathEntry, SecurityProperty};

/// Classification assigned to a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Secure,
    Partial,
    Insecure,
    Info,
}

impl Verdict {
    /// Lowercase name, also used as the display class by UI collaborators.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Secure => "secure",
            Self::Partial => "partial",
            Self::Insecure => "insecure",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How symbol counters are judged.
///
/// Whether a binary that still carries symbols is a hardening problem is a
/// product decision, so the polarity is never inferred: callers pick one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SymbolCountPolicy {
    /// Report the count without a verdict.
    #[default]
    Informational,
    /// A stripped binary (zero symbols) is secure; any symbols are insecure.
    StrippedIsSecure,
    /// Having symbols is secure; zero symbols is insecure.
    SymbolsIsSecure,
}

/// Keys whose integer value is judged by [`SymbolCountPolicy`].
const SYMBOL_COUNT_KEYS: &[&str] = &["symbol_count"];

/// Keys holding runtime search path lists.
const PATH_KEYS: &[&str] = &["rpath", "runpath"];

/// Display titles. Keys not listed here are suppressed from display.
const LABELS: &[(&str, &str)] = &[
    ("filename", "Filename"),
    ("sha256", "SHA256 Hash"),
    ("canary", "Stack Canary"),
    ("clang_cfi", "Clang CFI"),
    ("clang_safestack", "SafeStack"),
    ("stack_clash_protection", "Stack Clash Protection"),
    ("fortify", "Fortification"),
    ("fortified", "Fortified Functions"),
    ("fortifiable", "Fortifiable Functions"),
    ("nx", "NX Bit"),
    ("pie", "Position Independent Executable"),
    ("relro", "RELRO"),
    ("rpath", "RPATH"),
    ("runpath", "RUNPATH"),
    ("dynlibs", "Dynamic Libraries"),
    ("symbol_count", "Symbol Count"),
    ("aslr", "ASLR"),
    ("authenticode", "Authenticode"),
    ("cfg", "Control Flow Guard"),
    ("dotnet", ".NET Framework"),
    ("force_integrity", "Force Integrity"),
    ("gs", "Stack Canary (GS)"),
    ("high_entropy_va", "High Entropy VA"),
    ("isolation", "Process Isolation"),
    ("rfg", "Return Flow Guard"),
    ("safeseh", "Safe SEH"),
    ("seh", "Structured Exception Handling"),
    ("cet", "CET Compatible"),
    ("arc", "Automatic Reference Counting"),
    ("code_signature", "Code Signature"),
    ("encrypted", "Binary Encryption"),
    ("restrict", "Restrict Segment"),
    ("nx_heap", "NX Heap"),
    ("nx_stack", "NX Stack"),
    ("architecture", "Architecture"),
    ("asan", "Address Sanitizer"),
    ("bitness", "Bitness"),
    ("endianness", "Endianness"),
    ("dyn_linking", "Dynamic Linking"),
    ("interpreter", "Interpreter Path"),
    ("seperate_code", "Code/Data Separation"),
];

/// Pure mapping from raw property values to verdicts and display text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassificationEngine {
    symbol_policy: SymbolCountPolicy,
}

impl ClassificationEngine {
    #[must_use]
    pub fn new(symbol_policy: SymbolCountPolicy) -> Self {
        Self { symbol_policy }
    }

    #[must_use]
    pub fn symbol_policy(&self) -> SymbolCountPolicy {
        self.symbol_policy
    }

    /// Classify a property value.
    #[must_use]
    pub fn classify(&self, key: &str, value: &SecurityProperty) -> Verdict {
        match value {
            SecurityProperty::Bool(enabled) => classify_bool(key, *enabled),
            SecurityProperty::Enum(v) => classify_enum(key, v),
            SecurityProperty::Paths { paths } if PATH_KEYS.contains(&key) => {
                if is_pathless(paths) {
                    Verdict::Secure
                } else {
                    Verdict::Insecure
                }
            }
            SecurityProperty::Count(n) if SYMBOL_COUNT_KEYS.contains(&key) => {
                self.classify_symbol_count(*n)
            }
            _ => Verdict::Info,
        }
    }

    /// Human-readable rendering of a property value.
    #[must_use]
    pub fn format(&self, _key: &str, value: &SecurityProperty) -> String {
        match value {
            SecurityProperty::Bool(true) => "Enabled".to_string(),
            SecurityProperty::Bool(false) => "Disabled".to_string(),
            SecurityProperty::Count(n) => n.to_string(),
            SecurityProperty::Number(n) => n.to_string(),
            SecurityProperty::Enum(v) => v.clone(),
            SecurityProperty::Paths { paths } => {
                if is_pathless(paths) {
                    "None".to_string()
                } else {
                    format!("{} path(s)", paths.len())
                }
            }
            SecurityProperty::Libraries(libs) => format!("{} entries", libs.len()),
        }
    }

    /// Bullet rows listing the individual entries of a list value.
    ///
    /// Sentinel path entries are skipped. Scalar values have no detail rows.
    #[must_use]
    pub fn details(&self, _key: &str, value: &SecurityProperty) -> Vec<String> {
        match value {
            SecurityProperty::Paths { paths } => paths
                .iter()
                .filter_map(PathEntry::path)
                .map(|p| format!("• {}", p))
                .collect(),
            SecurityProperty::Libraries(libs) => libs.iter().map(|l| format!("• {}", l)).collect(),
            _ => Vec::new(),
        }
    }

    /// Display title for a key, or `None` if the key is not shown on its own.
    #[must_use]
    pub fn label(key: &str) -> Option<&'static str> {
        LABELS
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, label)| *label)
    }

    fn classify_symbol_count(&self, count: u64) -> Verdict {
        match (self.symbol_policy, count) {
            (SymbolCountPolicy::Informational, _) => Verdict::Info,
            (SymbolCountPolicy::StrippedIsSecure, 0) => Verdict::Secure,
            (SymbolCountPolicy::StrippedIsSecure, _) => Verdict::Insecure,
            (SymbolCountPolicy::SymbolsIsSecure, 0) => Verdict::Insecure,
            (SymbolCountPolicy::SymbolsIsSecure, _) => Verdict::Secure,
        }
    }
}

/// Empty, or exactly the single "None" sentinel.
fn is_pathless(paths: &[PathEntry]) -> bool {
    match paths {
        [] => true,
        [only] => only.is_sentinel(),
        _ => false,
    }
}

fn classify_bool(key: &str, enabled: bool) -> Verdict {
    match key {
        // Sanitizer builds are not production-hardened.
        "asan" if enabled => Verdict::Insecure,
        "asan" => Verdict::Secure,
        "dyn_linking" => Verdict::Info,
        _ if enabled => Verdict::Secure,
        _ => Verdict::Insecure,
    }
}

fn classify_enum(key: &str, value: &str) -> Verdict {
    match (key, value) {
        ("relro" | "fortify", "Full") => Verdict::Secure,
        ("relro" | "fortify", "Partial") => Verdict::Partial,
        ("relro" | "fortify", "None") => Verdict::Insecure,
        ("aslr", "HighEntropyVa") => Verdict::Secure,
        ("aslr", "DynamicBase") => Verdict::Partial,
        ("aslr", "None") => Verdict::Insecure,
        ("nx", "Enabled") => Verdict::Secure,
        ("nx", "Disabled") => Verdict::Insecure,
        ("pie", "PIE") => Verdict::Secure,
        ("pie", "DSO" | "REL") => Verdict::Partial,
        ("pie", "None") => Verdict::Insecure,
        _ => Verdict::Info,
    }
}
