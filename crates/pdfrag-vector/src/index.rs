use anyhow::{anyhow, ensure, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::cmp::Ordering;

use pdfrag_core::traits::{Embedder, VectorIndex};
use pdfrag_core::types::{ChunkRecord, SearchHit};

const EMBED_BATCH_SIZE: usize = 32;

/// One embedded chunk. Entries keep corpus order.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub vector: Vec<f32>,
    pub chunk: ChunkRecord,
}

#[derive(Debug, Clone)]
pub struct FlatIndex {
    dim: usize,
    entries: Vec<IndexEntry>,
}

impl FlatIndex {
    /// Embed every chunk and keep the vectors alongside their records.
    pub fn build(corpus: Vec<ChunkRecord>, embedder: &dyn Embedder) -> Result<Self> {
        let dim = embedder.dim();
        tracing::info!("Embedding {} chunks (dim {})", corpus.len(), dim);
        let pb = ProgressBar::new(corpus.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%)")?
                .progress_chars("#>-"),
        );

        let mut entries = Vec::with_capacity(corpus.len());
        let mut pending = corpus.into_iter().peekable();
        while pending.peek().is_some() {
            let batch: Vec<ChunkRecord> = pending.by_ref().take(EMBED_BATCH_SIZE).collect();
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = embedder.embed_batch(&texts)?;
            ensure!(vectors.len() == batch.len(), "embedder returned {} vectors for {} texts", vectors.len(), batch.len());
            for (chunk, vector) in batch.into_iter().zip(vectors) {
                entries.push(IndexEntry { vector, chunk });
            }
            pb.set_position(entries.len() as u64);
        }
        pb.finish_and_clear();
        Self::from_entries(dim, entries)
    }

    pub fn from_entries(dim: usize, entries: Vec<IndexEntry>) -> Result<Self> {
        if let Some(bad) = entries.iter().find(|e| e.vector.len() != dim) {
            return Err(anyhow!(
                "vector for {}#{} has {} dims, index expects {}",
                bad.chunk.source,
                bad.chunk.chunk_id,
                bad.vector.len(),
                dim
            ));
        }
        Ok(Self { dim, entries })
    }

    pub fn dim(&self) -> usize { self.dim }

    pub fn entries(&self) -> &[IndexEntry] { &self.entries }
}

impl VectorIndex for FlatIndex {
    fn len(&self) -> usize { self.entries.len() }

    /// Top `k` chunks by cosine similarity; equal scores keep corpus order.
    fn search_vec(&self, query_vec: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        ensure!(query_vec.len() == self.dim, "query has {} dims, index expects {}", query_vec.len(), self.dim);
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, e)| (position, cosine_similarity(query_vec, &e.vector)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        Ok(scored
            .into_iter()
            .map(|(position, score)| SearchHit { chunk: self.entries[position].chunk.clone(), score, position })
            .collect())
    }
}

/// Cosine similarity; zero vectors score 0 against everything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut na, mut nb) = (0f32, 0f32, 0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 { return 0.0; }
    dot / (na.sqrt() * nb.sqrt())
}
