//! Request and result types shared by every layer.
//!
//! - [`EmbeddingRequest`] is what callers ask for (one text or an ordered batch).
//! - [`Embeddings`] is what providers return and what the cache persists.

mod types;


pub use types::{EmbeddingRequest, Embeddings};
