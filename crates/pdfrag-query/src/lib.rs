//! Question answering over the vector index: embed, retrieve, prompt, complete.

use pdfrag_core::config::Settings;
use pdfrag_core::error::{Error, Result};
use pdfrag_core::traits::{Embedder, VectorIndex};
use pdfrag_core::types::{ChunkRecord, SearchHit};

pub mod completion;
pub mod prompt;

pub use completion::{ChatMessage, CompletionClient, CompletionError, OpenAiChatClient};

/// The generated answer, or the reason none could be generated.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Generated(String),
    /// Completion was skipped or refused because of the credential. Retrieval
    /// still ran, so supporting chunks are available.
    Unavailable { warning: String },
}

impl Answer {
    pub fn text(&self) -> Option<&str> {
        match self {
            Answer::Generated(text) => Some(text),
            Answer::Unavailable { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryResult {
    pub answer: Answer,
    /// Retrieved chunks, best first.
    pub supporting_chunks: Vec<ChunkRecord>,
    /// Cosine similarity of each supporting chunk, same order.
    pub scores: Vec<f32>,
}

pub struct QueryEngine<VI> where VI: VectorIndex {
    index: VI,
    embedder: Box<dyn Embedder>,
    client: Option<Box<dyn CompletionClient>>,
    missing_client: Option<String>,
    k: usize,
}

impl<VI> QueryEngine<VI> where VI: VectorIndex {
    /// Build an engine from settings. A missing credential is not an error
    /// here: it is logged and every answer reports it as a warning.
    pub fn new(index: VI, embedder: Box<dyn Embedder>, settings: &Settings) -> Result<Self> {
        settings.validate()?;
        let (client, missing_client) = match settings.completion.credential() {
            Ok(key) => {
                let client = OpenAiChatClient::new(&settings.completion, key)
                    .map_err(|e| Error::Completion(e.to_string()))?;
                (Some(Box::new(client) as Box<dyn CompletionClient>), None)
            }
            Err(e @ Error::MissingCredential(_)) => {
                tracing::warn!("{e}; answers will include retrieved context only");
                (None, Some(e.to_string()))
            }
            Err(e) => return Err(e),
        };
        Ok(Self { index, embedder, client, missing_client, k: settings.retrieval.k })
    }

    /// Build an engine around an explicit client; `None` behaves like a missing credential.
    pub fn with_client(index: VI, embedder: Box<dyn Embedder>, client: Option<Box<dyn CompletionClient>>, k: usize) -> Result<Self> {
        if k == 0 {
            return Err(Error::InvalidConfig("k must be at least 1".to_string()));
        }
        let missing_client = client.is_none().then(|| Error::MissingCredential(pdfrag_core::config::CREDENTIAL_VAR).to_string());
        Ok(Self { index, embedder, client, missing_client, k })
    }

    pub fn k(&self) -> usize { self.k }

    pub fn index(&self) -> &VI { &self.index }

    /// The `k` nearest chunks to the question, best first.
    pub fn retrieve(&self, question: &str, k: usize) -> Result<Vec<SearchHit>> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::EmptyQuestion);
        }
        let q_vec = self
            .embedder
            .embed_one(question)
            .map_err(|e| Error::Retrieval(format!("embedding the question failed: {e}")))?;
        self.index
            .search_vec(&q_vec, k)
            .map_err(|e| Error::Retrieval(e.to_string()))
    }

    pub fn ask(&self, question: &str) -> Result<QueryResult> {
        self.ask_with_k(question, self.k)
    }

    pub fn ask_with_k(&self, question: &str, k: usize) -> Result<QueryResult> {
        let hits = self.retrieve(question, k)?;
        tracing::debug!(hits = hits.len(), "retrieved context");
        let scores = hits.iter().map(|h| h.score).collect();
        let supporting_chunks: Vec<ChunkRecord> = hits.into_iter().map(|h| h.chunk).collect();

        let answer = match &self.client {
            None => Answer::Unavailable {
                warning: self.missing_client.clone().unwrap_or_else(|| "no completion client configured".to_string()),
            },
            Some(client) => {
                let messages = prompt::build_messages(question.trim(), &supporting_chunks);
                match client.complete(&messages) {
                    Ok(text) => Answer::Generated(text),
                    Err(CompletionError::Unauthorized(msg)) => {
                        tracing::warn!("completion credential rejected: {msg}");
                        Answer::Unavailable { warning: format!("credential rejected by completion service: {msg}") }
                    }
                    Err(CompletionError::Request(msg)) => return Err(Error::Completion(msg)),
                }
            }
        };
        Ok(QueryResult { answer, supporting_chunks, scores })
    }
}
