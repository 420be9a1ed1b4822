//! Cache key derivation.
//!
//! A request is rendered to canonical JSON bytes and hashed with BLAKE3. The
//! rendering is byte-compatible with Python's default `json.dumps`
//! (`", "` separators, ASCII-only output), so existing cache directories keep
//! resolving to the same file names.

use std::fmt;
use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;

use crate::embedding::EmbeddingRequest;

/// Length of a rendered key in hex characters (256-bit digest).
pub const CACHE_KEY_HEX_LEN: usize = 64;

/// Hex-encoded BLAKE3 digest identifying one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derives the key for `request`. Pure: no I/O, same input same key.
    pub fn derive(request: &EmbeddingRequest) -> Self {
        Self::from_digest(blake3::hash(&canonical_bytes(request)))
    }

    /// Wraps an already computed digest.
    pub fn from_digest(hash: blake3::Hash) -> Self {
        Self(hash.to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Convenience wrapper around [`CacheKey::derive`].
#[inline]
pub fn derive_key(request: &EmbeddingRequest) -> CacheKey {
    CacheKey::derive(request)
}

/// Canonical byte form of `request`.
///
/// A bare string renders as a JSON string literal and a batch as a JSON
/// array, so `"x"` and `["x"]` never share bytes.
pub fn canonical_bytes(request: &EmbeddingRequest) -> Vec<u8> {
    let mut out = Vec::with_capacity(64);
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, AsciiListFormatter);
    request
        .serialize(&mut serializer)
        .expect("serializing strings into a Vec<u8> cannot fail");
    out
}

/// Compact JSON with `", "` between array items and every character outside
/// printable ASCII escaped as `\uXXXX` (UTF-16 units, lowercase hex).
struct AsciiListFormatter;

impl Formatter for AsciiListFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (index, ch) in fragment.char_indices() {
            if (' '..='~').contains(&ch) {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[start..index])?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = index + ch.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }
}
