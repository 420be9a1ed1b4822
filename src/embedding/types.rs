use serde::{Deserialize, Serialize};

use crate::provider::{ProviderError, ProviderResult};

/// Input to an embedding call.
///
/// Identity is structural: the variant and the texts (in order) determine the
/// cache key, so `Single("x")` and `Batch(["x"])` are different requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmbeddingRequest {
    /// One text, answered by a single vector.
    Single(String),
    /// A non-empty ordered list of texts, answered by one row per text.
    Batch(Vec<String>),
}

impl EmbeddingRequest {
    /// Creates a single-text request.
    pub fn single(text: impl Into<String>) -> Self {
        Self::Single(text.into())
    }

    /// Creates a batch request from `texts`, preserving their order.
    pub fn batch<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Batch(texts.into_iter().map(Into::into).collect())
    }

    /// Number of texts in the request.
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Batch(texts) => texts.len(),
        }
    }

    /// Returns `true` for an empty batch (never valid).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_batch(&self) -> bool {
        matches!(self, Self::Batch(_))
    }

    /// Borrowed view of the texts, in request order.
    pub fn texts(&self) -> Vec<&str> {
        match self {
            Self::Single(text) => vec![text.as_str()],
            Self::Batch(texts) => texts.iter().map(String::as_str).collect(),
        }
    }

    /// Rejects requests no provider can answer (an empty batch).
    pub fn validate(&self) -> ProviderResult<()> {
        if self.is_empty() {
            return Err(ProviderError::InvalidRequest {
                reason: "batch request must contain at least one text".to_string(),
            });
        }
        Ok(())
    }
}

impl From<&str> for EmbeddingRequest {
    fn from(text: &str) -> Self {
        Self::single(text)
    }
}

impl From<String> for EmbeddingRequest {
    fn from(text: String) -> Self {
        Self::Single(text)
    }
}

impl From<Vec<String>> for EmbeddingRequest {
    fn from(texts: Vec<String>) -> Self {
        Self::Batch(texts)
    }
}

/// Vectors produced for an [`EmbeddingRequest`].
///
/// The logical value is independent of how it is stored: every serialization
/// backend must round-trip it to an equal `Embeddings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Embeddings {
    /// Answer to [`EmbeddingRequest::Single`].
    One(Vec<f32>),
    /// Answer to [`EmbeddingRequest::Batch`], one row per input text.
    Many(Vec<Vec<f32>>),
}

impl Embeddings {
    /// Returns `true` if this value has the shape `request` expects.
    pub fn matches(&self, request: &EmbeddingRequest) -> bool {
        match (self, request) {
            (Self::One(_), EmbeddingRequest::Single(_)) => true,
            (Self::Many(rows), EmbeddingRequest::Batch(texts)) => rows.len() == texts.len(),
            _ => false,
        }
    }

    /// Number of vectors held.
    pub fn rows(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(rows) => rows.len(),
        }
    }

    /// Length of the (first) vector, or `None` for an empty matrix.
    pub fn dimension(&self) -> Option<usize> {
        match self {
            Self::One(vector) => Some(vector.len()),
            Self::Many(rows) => rows.first().map(Vec::len),
        }
    }

    /// Returns `true` if every row has the same length.
    pub fn is_rectangular(&self) -> bool {
        match self {
            Self::One(_) => true,
            Self::Many(rows) => {
                let width = rows.first().map_or(0, Vec::len);
                rows.iter().all(|row| row.len() == width)
            }
        }
    }

    /// Iterates over every stored float in row-major order.
    pub fn values(&self) -> Box<dyn Iterator<Item = f32> + '_> {
        match self {
            Self::One(vector) => Box::new(vector.iter().copied()),
            Self::Many(rows) => Box::new(rows.iter().flatten().copied()),
        }
    }

    pub fn as_one(&self) -> Option<&[f32]> {
        match self {
            Self::One(vector) => Some(vector),
            Self::Many(_) => None,
        }
    }

    pub fn as_many(&self) -> Option<&[Vec<f32>]> {
        match self {
            Self::One(_) => None,
            Self::Many(rows) => Some(rows),
        }
    }
}
