//! Token-window segmentation with overlap.
//!
//! Tokens are whitespace-delimited words. Windows of `chunk_size` tokens
//! start every `chunk_size - overlap` tokens until one reaches the last
//! token; only that final window may be shorter.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 300, overlap: 50 }
    }
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        let config = Self { chunk_size, overlap };
        config.validate()?;
        Ok(config)
    }

    /// A window must hold at least one token and every step must advance.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be at least 1".to_string()));
        }
        if self.overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    /// Number of tokens between the starts of consecutive windows.
    pub fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

pub fn chunk_text_by_tokens(text: &str, config: &ChunkingConfig) -> Result<Vec<String>> {
    config.validate()?;
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let step = config.step();
    let mut chunks = Vec::with_capacity(tokens.len() / step + 1);
    let mut start = 0;
    while start < tokens.len() {
        let end = (start + config.chunk_size).min(tokens.len());
        chunks.push(tokens[start..end].join(" "));
        if end == tokens.len() {
            break;
        }
        start += step;
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn eight_tokens_size_three_overlap_one() {
        let config = ChunkingConfig::new(3, 1).unwrap();
        let chunks = chunk_text_by_tokens("A B C D E F G H", &config).unwrap();
        assert_eq!(chunks, vec!["A B C", "C D E", "E F G", "G H"]);
    }

    #[test]
    fn short_text_is_a_single_normalized_chunk() {
        let config = ChunkingConfig::default();
        let chunks = chunk_text_by_tokens("  Article 1\n defines   terms. ", &config).unwrap();
        assert_eq!(chunks, vec!["Article 1 defines terms."]);
    }

    #[test]
    fn exact_fit_stops_at_the_last_token() {
        let config = ChunkingConfig::new(3, 1).unwrap();
        let chunks = chunk_text_by_tokens("A B C D E", &config).unwrap();
        assert_eq!(chunks, vec!["A B C", "C D E"]);
    }

    #[test]
    fn large_overlap_has_no_short_windows_before_the_last() {
        let config = ChunkingConfig::new(7, 6).unwrap();
        let chunks = chunk_text_by_tokens(&words(30), &config).unwrap();
        assert_eq!(chunks.len(), 24);
        assert!(chunks.iter().all(|c| c.split_whitespace().count() == 7));
        assert!(chunks[23].ends_with("w29"));
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        let chunks = chunk_text_by_tokens(" \n ", &ChunkingConfig::default()).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn degenerate_overlap_is_rejected() {
        let config = ChunkingConfig { chunk_size: 4, overlap: 4 };
        assert!(matches!(chunk_text_by_tokens("a b c", &config), Err(Error::InvalidConfig(_))));
        assert!(ChunkingConfig::new(0, 0).is_err());
        assert!(ChunkingConfig::new(4, 9).is_err());
    }

    #[test]
    fn windows_are_full_and_cover_every_token() {
        for (size, overlap, n) in [(5, 0, 23), (5, 2, 23), (7, 6, 30), (300, 50, 1000), (10, 3, 10)] {
            let config = ChunkingConfig::new(size, overlap).unwrap();
            let text = words(n);
            let tokens: Vec<&str> = text.split_whitespace().collect();
            let chunks = chunk_text_by_tokens(&text, &config).unwrap();

            let (last, full) = chunks.split_last().unwrap();
            for c in full {
                assert_eq!(c.split_whitespace().count(), size);
            }
            assert!(last.split_whitespace().count() <= size);

            // Stitch chunks back together, dropping the overlapping prefix of each.
            let mut rebuilt: Vec<&str> = Vec::new();
            for (i, c) in chunks.iter().enumerate() {
                let start = i * config.step();
                let skip = rebuilt.len() - start.min(rebuilt.len());
                rebuilt.extend(c.split_whitespace().skip(skip));
            }
            assert_eq!(rebuilt, tokens, "size={size} overlap={overlap} n={n}");
        }
    }
}
