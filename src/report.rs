//! Data model for analysis reports produced by the external engine.
//!
//! A [`BinaryReport`] describes one analyzed binary: the schema version the
//! engine wrote it with, the filename, the detected [`BinaryType`], and an
//! insertion-ordered list of raw security properties.
//!
//! # Wire shape
//!
//! Property values keep the engine's natural JSON shape so that reports can be
//! read straight from its output:
//!
//! ```json
//! {
//!   "version": "0.1.0",
//!   "filename": "ls",
//!   "binary_type": "Elf64",
//!   "properties": {
//!     "canary": true,
//!     "relro": "Full",
//!     "rpath": { "paths": ["None"] },
//!     "dynlibs": ["libc.so.6"],
//!     "symbol_count": 0
//!   }
//! }
//! ```

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Sentinel entry used by the engine for "no search path".
pub const PATH_SENTINEL: &str = "None";

/// Binary format and word size reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BinaryType {
    Elf32,
    Elf64,
    PE32,
    PE64,
    MachO32,
    MachO64,
    #[default]
    Unknown,
}

impl BinaryType {
    /// Human-readable format family ("ELF", "PE", "Mach-O").
    #[must_use]
    pub fn family(self) -> &'static str {
        match self {
            Self::Elf32 | Self::Elf64 => "ELF",
            Self::PE32 | Self::PE64 => "PE",
            Self::MachO32 | Self::MachO64 => "Mach-O",
            Self::Unknown => "Unknown File",
        }
    }

    /// Word size in bits, if known.
    #[must_use]
    pub fn bits(self) -> Option<u8> {
        match self {
            Self::Elf32 | Self::PE32 | Self::MachO32 => Some(32),
            Self::Elf64 | Self::PE64 | Self::MachO64 => Some(64),
            Self::Unknown => None,
        }
    }

    /// Build a binary type from a format family name and a bitness.
    ///
    /// Accepts the family spellings the engine uses (`Elf`, `Pe`, `Macho`)
    /// case-insensitively. Anything unrecognized maps to [`BinaryType::Unknown`].
    #[must_use]
    pub fn from_family(family: &str, bits: Option<u64>) -> Self {
        match (family.to_ascii_lowercase().as_str(), bits) {
            ("elf", Some(32)) => Self::Elf32,
            ("elf", Some(64)) => Self::Elf64,
            ("pe", Some(32)) => Self::PE32,
            ("pe", Some(64)) => Self::PE64,
            ("macho" | "mach-o", Some(32)) => Self::MachO32,
            ("macho" | "mach-o", Some(64)) => Self::MachO64,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for BinaryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bits() {
            Some(bits) => write!(f, "{} ({} bit)", self.family(), bits),
            None => write!(f, "{}", self.family()),
        }
    }
}

/// One entry of an `rpath`/`runpath` list.
///
/// The engine writes either a bare string (possibly the [`PATH_SENTINEL`]) or
/// a single-key object such as `{"Yes": "/opt/lib"}` naming the kind of path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathEntry {
    Plain(String),
    Tagged(std::collections::BTreeMap<String, String>),
}

impl PathEntry {
    /// The path this entry points at, or `None` for the sentinel.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Plain(p) if p == PATH_SENTINEL => None,
            Self::Plain(p) => Some(p),
            Self::Tagged(map) => map.values().next().map(String::as_str),
        }
    }

    /// True if this entry is the "no path" sentinel.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::Plain(p) if p == PATH_SENTINEL)
    }
}

impl From<&str> for PathEntry {
    fn from(value: &str) -> Self {
        Self::Plain(value.to_string())
    }
}

/// A raw security property value as produced by the engine.
///
/// Variant order matters for deserialization: integers are tried before
/// floats, and strings before lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SecurityProperty {
    /// Feature present/absent.
    Bool(bool),
    /// Non-negative integer counter (e.g. symbol counts).
    Count(u64),
    /// Any other numeric value.
    Number(f64),
    /// Enumerated string such as `"Full"` or `"HighEntropyVa"`.
    Enum(String),
    /// Runtime search path list.
    Paths { paths: Vec<PathEntry> },
    /// Linked library list.
    Libraries(Vec<String>),
}

impl SecurityProperty {
    /// Convenience constructor for an enumerated value.
    pub fn enumerated(value: impl Into<String>) -> Self {
        Self::Enum(value.into())
    }

    /// Free-form text such as an architecture or interpreter path.
    ///
    /// Text and enumerated strings share one wire form, so both are
    /// carried by [`SecurityProperty::Enum`].
    pub fn text(value: impl Into<String>) -> Self {
        Self::Enum(value.into())
    }

    /// Convenience constructor for a path list from plain strings.
    pub fn paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Paths {
            paths: paths.into_iter().map(|p| PathEntry::from(p.as_ref())).collect(),
        }
    }

    /// Convenience constructor for a library list.
    pub fn libraries<I, S>(libs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Libraries(libs.into_iter().map(Into::into).collect())
    }
}

/// Insertion-ordered mapping of property key to value.
///
/// Serialized as a JSON object; key order is preserved in both directions.
/// Inserting an existing key replaces its value in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Properties(Vec<(String, SecurityProperty)>);

impl Properties {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a property, keeping the original position on replace.
    pub fn insert(&mut self, key: impl Into<String>, value: SecurityProperty) {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SecurityProperty> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SecurityProperty)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, SecurityProperty)> for Properties {
    fn from_iter<T: IntoIterator<Item = (K, SecurityProperty)>>(iter: T) -> Self {
        let mut props = Self::new();
        for (k, v) in iter {
            props.insert(k, v);
        }
        props
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct PropertiesVisitor;

impl<'de> Visitor<'de> for PropertiesVisitor {
    type Value = Properties;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of property names to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut props = Properties::new();
        while let Some((key, value)) = access.next_entry::<String, SecurityProperty>()? {
            props.insert(key, value);
        }
        Ok(props)
    }
}

impl<'de> Deserialize<'de> for Properties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PropertiesVisitor)
    }
}

/// Structured output describing one analyzed binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryReport {
    /// Report schema version written by the engine; absent in old reports.
    #[serde(default)]
    pub version: Option<String>,
    /// Name of the analyzed file.
    pub filename: String,
    /// Detected binary format.
    #[serde(default)]
    pub binary_type: BinaryType,
    /// Raw security properties in engine order.
    #[serde(default)]
    pub properties: Properties,
}

impl BinaryReport {
    /// Create a report tagged with the current engine schema version.
    pub fn new(filename: impl Into<String>, binary_type: BinaryType, properties: Properties) -> Self {
        Self {
            version: Some(crate::render::CURRENT_VERSION.to_string()),
            filename: filename.into(),
            binary_type,
            properties,
        }
    }
}
