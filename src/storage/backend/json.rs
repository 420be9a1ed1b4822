use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use super::SerializationBackend;
use crate::embedding::Embeddings;
use crate::storage::error::{BackendError, BackendResult};

/// Human-readable JSON: a flat list for one vector, a list of lists for a batch.
///
/// Floats are written in shortest round-trip form, so decoding reproduces the
/// stored `f32` values exactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBackend;

impl SerializationBackend for JsonBackend {
    fn tag(&self) -> &str {
        "json"
    }

    fn extension(&self) -> &str {
        "json"
    }

    fn encode(&self, embeddings: &Embeddings) -> BackendResult<Vec<u8>> {
        if let Some(index) = embeddings.values().position(|v| !v.is_finite()) {
            return Err(BackendError::NonFinite { index });
        }

        let mut out = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
        embeddings.serialize(&mut serializer)?;
        out.push(b'\n');
        Ok(out)
    }

    fn decode(&self, bytes: &[u8]) -> BackendResult<Embeddings> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
