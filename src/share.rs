//! Shareable report links.
//!
//! A report is wrapped in a small envelope carrying the share-format schema
//! tag and an integrity checksum, serialized to JSON, and handed to a
//! [`Compressor`] that turns the bytes into URL-safe text. The resulting
//! [`ShareToken`] is appended to a page URL after the [`SHARE_MARKER`].
//!
//! ```text
//! BinaryReport -> envelope JSON -> zlib -> base64url -> https://host/#data=<token>
//! ```
//!
//! Decoding reverses every step. Any malformed, truncated, tampered or
//! incompatible token yields a typed [`DecodeError`]; decoding never panics.
//!
//! # Example
//!
//! ```
//! use secview::report::{BinaryReport, BinaryType, Properties};
//! use secview::share::ShareCodec;
//!
//! let codec = ShareCodec::default();
//! let report = BinaryReport::new("ls", BinaryType::Elf64, Properties::new());
//! let token = codec.encode(&report).unwrap();
//! assert_eq!(codec.decode(token.as_str()).unwrap(), report);
//! ```

use std::fmt;
use std::io::{Read, Write};

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::report::{BinaryReport, SecurityProperty};

/// Current share envelope schema.
pub const SHARE_SCHEMA: u32 = 1;

/// Fragment marker that introduces a token in a share URL.
pub const SHARE_MARKER: &str = "#data=";

/// Default cap on decompressed token size.
pub const DEFAULT_MAX_DECOMPRESSED: u64 = 8 * 1024 * 1024;

/// Hex characters of the SHA-256 digest kept in the envelope.
const CHECKSUM_LEN: usize = 16;

/// Errors raised by a [`Compressor`].
#[derive(thiserror::Error, Debug)]
pub enum CompressError {
    /// I/O error inside the compression stream
    #[error("compression stream error: {0}")]
    Io(#[from] std::io::Error),

    /// Token text is not valid base64
    #[error("token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Decompressed payload exceeds the configured limit
    #[error("decompressed payload exceeds {limit} bytes")]
    TooLarge { limit: u64 },
}

/// Byte-level codec primitive used by [`ShareCodec`].
pub trait Compressor {
    /// Compress bytes into URL-embeddable text.
    fn compress(&self, data: &[u8]) -> Result<String, CompressError>;

    /// Reverse [`Compressor::compress`].
    fn decompress(&self, token: &str) -> Result<Vec<u8>, CompressError>;
}

/// zlib compression with URL-safe, unpadded base64 text.
///
/// Decoding also accepts standard padded base64, which older links used.
#[derive(Debug, Clone, Copy)]
pub struct ZlibCompressor {
    max_decompressed: u64,
}

impl Default for ZlibCompressor {
    fn default() -> Self {
        Self {
            max_decompressed: DEFAULT_MAX_DECOMPRESSED,
        }
    }
}

impl ZlibCompressor {
    /// Create a compressor with a custom decompressed-size limit.
    #[must_use]
    pub fn with_limit(max_decompressed: u64) -> Self {
        Self { max_decompressed }
    }
}

impl Compressor for ZlibCompressor {
    fn compress(&self, data: &[u8]) -> Result<String, CompressError> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data)?;
        let compressed = encoder.finish()?;
        Ok(URL_SAFE_NO_PAD.encode(compressed))
    }

    fn decompress(&self, token: &str) -> Result<Vec<u8>, CompressError> {
        let compressed = match URL_SAFE_NO_PAD.decode(token) {
            Ok(bytes) => bytes,
            Err(url_err) => STANDARD.decode(token).map_err(|_| url_err)?,
        };

        let decoder = ZlibDecoder::new(compressed.as_slice());
        let mut out = Vec::new();
        decoder
            .take(self.max_decompressed + 1)
            .read_to_end(&mut out)?;
        if out.len() as u64 > self.max_decompressed {
            return Err(CompressError::TooLarge {
                limit: self.max_decompressed,
            });
        }
        Ok(out)
    }
}

/// Errors while generating a share token.
#[derive(thiserror::Error, Debug)]
pub enum EncodeError {
    /// Report could not be serialized
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Compression primitive failed
    #[error("failed to compress report: {0}")]
    Compress(#[source] CompressError),

    /// A numeric property is NaN or infinite
    #[error("property '{key}' is not a finite number")]
    NonFiniteNumber { key: String },
}

/// Errors while loading a share token.
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    /// Token is empty
    #[error("share token is empty")]
    Empty,

    /// Token text could not be decompressed
    #[error("share token could not be decompressed: {0}")]
    Decompress(#[source] CompressError),

    /// Payload is not a valid share envelope
    #[error("share token payload is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Envelope schema is not supported by this build
    #[error("unsupported share schema {found} (supported: {supported})")]
    UnsupportedSchema { found: u32, supported: u32 },

    /// Report checksum does not match the envelope
    #[error("share token integrity check failed: checksum mismatch")]
    ChecksumMismatch,
}

/// Opaque, URL-embeddable encoding of one report.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShareToken(String);

impl ShareToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ShareToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    schema: u32,
    checksum: &'a str,
    report: &'a BinaryReport,
}

#[derive(Deserialize)]
struct Envelope {
    schema: u32,
    checksum: String,
    report: BinaryReport,
}

#[derive(Deserialize)]
struct SchemaProbe {
    schema: u32,
}

/// Encodes reports to share tokens and back.
#[derive(Debug, Clone)]
pub struct ShareCodec<C = ZlibCompressor> {
    compressor: C,
}

impl Default for ShareCodec {
    fn default() -> Self {
        Self::new(ZlibCompressor::default())
    }
}

impl<C: Compressor> ShareCodec<C> {
    pub fn new(compressor: C) -> Self {
        Self { compressor }
    }

    /// Encode a report into a share token.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if serialization or the compression primitive
    /// fails. Failures are not retried.
    pub fn encode(&self, report: &BinaryReport) -> Result<ShareToken, EncodeError> {
        // JSON has no NaN or infinity; such a token would never decode.
        if let Some((key, _)) = report
            .properties
            .iter()
            .find(|(_, value)| matches!(value, SecurityProperty::Number(n) if !n.is_finite()))
        {
            return Err(EncodeError::NonFiniteNumber {
                key: key.to_string(),
            });
        }
        let report_json = serde_json::to_vec(report)?;
        let checksum = checksum(&report_json);
        let envelope = EnvelopeRef {
            schema: SHARE_SCHEMA,
            checksum: &checksum,
            report,
        };
        let payload = serde_json::to_vec(&envelope)?;
        let token = self
            .compressor
            .compress(&payload)
            .map_err(EncodeError::Compress)?;
        log::debug!(
            "Encoded {} into {} byte share token ({} byte payload)",
            report.filename,
            token.len(),
            payload.len()
        );
        Ok(ShareToken(token))
    }

    /// Decode a share token back into the report it carries.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] for empty, undecodable, malformed,
    /// incompatible or tampered tokens.
    pub fn decode(&self, token: &str) -> Result<BinaryReport, DecodeError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(DecodeError::Empty);
        }

        let payload = self
            .compressor
            .decompress(token)
            .map_err(DecodeError::Decompress)?;

        let probe: SchemaProbe = serde_json::from_slice(&payload)?;
        if probe.schema != SHARE_SCHEMA {
            return Err(DecodeError::UnsupportedSchema {
                found: probe.schema,
                supported: SHARE_SCHEMA,
            });
        }

        let envelope: Envelope = serde_json::from_slice(&payload)?;

        // Re-serialize compactly, exactly as encode() did.
        let report_json = serde_json::to_vec(&envelope.report)?;
        if checksum(&report_json) != envelope.checksum {
            return Err(DecodeError::ChecksumMismatch);
        }

        Ok(envelope.report)
    }
}

fn checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(CHECKSUM_LEN);
    hex
}

/// Build a share URL from a page URL and a token.
///
/// Any fragment already present on `base` is replaced.
#[must_use]
pub fn share_url(base: &str, token: &ShareToken) -> String {
    let page = base.split('#').next().unwrap_or(base);
    format!("{}{}{}", page, SHARE_MARKER, token)
}

/// Extract the token following the share marker, if the URL has one.
#[must_use]
pub fn token_from_url(url: &str) -> Option<&str> {
    url.find(SHARE_MARKER)
        .map(|pos| &url[pos + SHARE_MARKER.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{BinaryType, Properties, SecurityProperty};

    fn sample() -> BinaryReport {
        let props: Properties = vec![
            ("canary", SecurityProperty::Bool(true)),
            ("relro", SecurityProperty::enumerated("Partial")),
            ("runpath", SecurityProperty::paths(["$ORIGIN/../lib"])),
            ("dynlibs", SecurityProperty::libraries(["libc.so.6", "libm.so.6"])),
            ("symbol_count", SecurityProperty::Count(1200)),
        ]
        .into_iter()
        .collect();
        BinaryReport::new("server", BinaryType::Elf64, props)
    }

    #[test]
    fn test_round_trip() {
        let codec = ShareCodec::default();
        let report = sample();
        let token = codec.encode(&report).unwrap();
        assert_eq!(codec.decode(token.as_str()).unwrap(), report);
    }

    #[test]
    fn test_token_is_url_safe() {
        let token = ShareCodec::default().encode(&sample()).unwrap();
        assert!(token
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_decode_empty() {
        assert!(matches!(
            ShareCodec::default().decode("   "),
            Err(DecodeError::Empty)
        ));
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            ShareCodec::default().decode("!!not base64!!"),
            Err(DecodeError::Decompress(CompressError::Base64(_)))
        ));
    }

    #[test]
    fn test_decode_truncated() {
        let codec = ShareCodec::default();
        let token = codec.encode(&sample()).unwrap().into_string();
        let truncated = &token[..token.len() / 2];
        assert!(codec.decode(truncated).is_err());
    }

    #[test]
    fn test_decode_valid_zlib_but_not_envelope() {
        let token = ZlibCompressor::default().compress(b"[1,2,3]").unwrap();
        assert!(matches!(
            ShareCodec::default().decode(&token),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_unsupported_schema() {
        let payload = br#"{"schema":7,"checksum":"","report":{"filename":"x"}}"#;
        let token = ZlibCompressor::default().compress(payload).unwrap();
        match ShareCodec::default().decode(&token) {
            Err(DecodeError::UnsupportedSchema { found, supported }) => {
                assert_eq!(found, 7);
                assert_eq!(supported, SHARE_SCHEMA);
            }
            other => panic!("expected UnsupportedSchema, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_tampered_report() {
        let payload =
            br#"{"schema":1,"checksum":"0000000000000000","report":{"filename":"x"}}"#;
        let token = ZlibCompressor::default().compress(payload).unwrap();
        assert!(matches!(
            ShareCodec::default().decode(&token),
            Err(DecodeError::ChecksumMismatch)
        ));
    }

    #[test]
    fn test_decode_accepts_standard_base64() {
        let payload = {
            let report = sample();
            let json = serde_json::to_vec(&report).unwrap();
            serde_json::to_vec(&EnvelopeRef {
                schema: SHARE_SCHEMA,
                checksum: &checksum(&json),
                report: &report,
            })
            .unwrap()
        };
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&payload).unwrap();
        let token = STANDARD.encode(encoder.finish().unwrap());
        assert_eq!(ShareCodec::default().decode(&token).unwrap(), sample());
    }

    #[test]
    fn test_decompression_limit() {
        let big = vec![b' '; 4096];
        let token = ZlibCompressor::default().compress(&big).unwrap();
        let err = ZlibCompressor::with_limit(1024).decompress(&token).unwrap_err();
        assert!(matches!(err, CompressError::TooLarge { limit: 1024 }));
    }

    #[test]
    fn test_share_url_replaces_fragment() {
        let token = ShareToken("abc".to_string());
        assert_eq!(
            share_url("https://example.org/app/#old", &token),
            "https://example.org/app/#data=abc"
        );
        assert_eq!(
            share_url("https://example.org/", &token),
            "https://example.org/#data=abc"
        );
    }

    #[test]
    fn test_token_from_url() {
        assert_eq!(token_from_url("https://x/#data=abc"), Some("abc"));
        assert_eq!(token_from_url("https://x/#data="), Some(""));
        assert_eq!(token_from_url("https://x/#other"), None);
    }

    struct FailingCompressor;

    impl Compressor for FailingCompressor {
        fn compress(&self, _data: &[u8]) -> Result<String, CompressError> {
            Err(CompressError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "out of memory",
            )))
        }

        fn decompress(&self, _token: &str) -> Result<Vec<u8>, CompressError> {
            Err(CompressError::TooLarge { limit: 0 })
        }
    }

    #[test]
    fn test_encode_surfaces_compressor_failure() {
        let codec = ShareCodec::new(FailingCompressor);
        assert!(matches!(
            codec.encode(&sample()),
            Err(EncodeError::Compress(_))
        ));
    }

    #[test]
    fn test_encode_rejects_non_finite_numbers() {
        let codec = ShareCodec::default();
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut report = sample();
            report.properties.insert("entropy", SecurityProperty::Number(value));
            match codec.encode(&report) {
                Err(EncodeError::NonFiniteNumber { key }) => assert_eq!(key, "entropy"),
                other => panic!("expected NonFiniteNumber, got {:?}", other),
            }
        }

        let mut report = sample();
        report.properties.insert("entropy", SecurityProperty::Number(7.25));
        let token = codec.encode(&report).unwrap();
        assert_eq!(codec.decode(token.as_str()).unwrap(), report);
    }
}
