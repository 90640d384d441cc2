//! Domain types shared by the corpus builder, the index and the query engine.

use serde::{Deserialize, Serialize};

/// One retrievable window of a source document.
///
/// - `text`: the chunk payload, stored as `chunk_text` in the corpus file
/// - `source`: base name of the originating PDF
/// - `chunk_id`: zero-based position of the chunk within its source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    #[serde(rename = "chunk_text")]
    pub text: String,
    pub source: String,
    pub chunk_id: usize,
}

impl ChunkRecord {
    pub fn new(text: impl Into<String>, source: impl Into<String>, chunk_id: usize) -> Self {
        Self { text: text.into(), source: source.into(), chunk_id }
    }
}

/// A retrieved chunk together with its similarity to the query.
///
/// `score` is cosine similarity, higher is better. `position` is the chunk's
/// index in the corpus and breaks ties between equal scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk: ChunkRecord,
    pub score: f32,
    pub position: usize,
}
