//! In-memory nearest-neighbor index over chunk embeddings.
//!
//! The index is built from the whole corpus at startup and is read-only
//! afterwards. Search is exhaustive cosine similarity, which is exact and
//! fast enough for corpora of a few thousand chunks.

mod index;

pub use index::{cosine_similarity, FlatIndex, IndexEntry};
pub use pdfrag_core::traits::VectorIndex;
