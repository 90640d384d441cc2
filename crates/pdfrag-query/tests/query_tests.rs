use std::sync::{Arc, Mutex};

use pdfrag_core::config::Settings;
use pdfrag_core::{ChunkRecord, Error};
use pdfrag_embed::FakeEmbedder;
use pdfrag_query::{Answer, ChatMessage, CompletionClient, CompletionError, QueryEngine};
use pdfrag_vector::{FlatIndex, VectorIndex};

const DIM: usize = 256;

#[derive(Clone, Default)]
struct RecordingClient {
    calls: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl CompletionClient for RecordingClient {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, CompletionError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        Ok("Article 1 defines the terms of the act.".to_string())
    }
}

struct RefusingClient;

impl CompletionClient for RefusingClient {
    fn complete(&self, _messages: &[ChatMessage]) -> Result<String, CompletionError> {
        Err(CompletionError::Unauthorized("401 Unauthorized: invalid api key".to_string()))
    }
}

struct OfflineClient;

impl CompletionClient for OfflineClient {
    fn complete(&self, _messages: &[ChatMessage]) -> Result<String, CompletionError> {
        Err(CompletionError::Request("failed to reach https://api.openai.com".to_string()))
    }
}

fn corpus() -> Vec<ChunkRecord> {
    vec![
        ChunkRecord::new("Article 1 defines terms.", "law.pdf", 0),
        ChunkRecord::new("Article 2 sets penalties for late filing.", "law.pdf", 1),
        ChunkRecord::new("The annex lists approved forms and fees.", "annex.pdf", 0),
    ]
}

fn index(chunks: Vec<ChunkRecord>) -> FlatIndex {
    FlatIndex::build(chunks, &FakeEmbedder::new(DIM)).expect("index")
}

#[test]
fn single_chunk_corpus_is_the_sole_support_for_k_one() {
    let client = RecordingClient::default();
    let only = ChunkRecord::new("Article 1 defines terms.", "law.pdf", 0);
    let engine = QueryEngine::with_client(
        index(vec![only.clone()]),
        Box::new(FakeEmbedder::new(DIM)),
        Some(Box::new(client.clone())),
        1,
    )
    .unwrap();

    let result = engine.ask("Which article defines terms?").expect("ask");
    assert_eq!(result.supporting_chunks, vec![only]);
    assert_eq!(result.answer, Answer::Generated("Article 1 defines the terms of the act.".to_string()));

    let calls = client.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0][0].content.contains("Article 1 defines terms."));
    assert_eq!(calls[0][1].content, "Which article defines terms?");
}

#[test]
fn supporting_chunks_are_ranked_and_limited_to_k() {
    let engine = QueryEngine::with_client(index(corpus()), Box::new(FakeEmbedder::new(DIM)), Some(Box::new(RecordingClient::default())), 2).unwrap();
    assert_eq!(engine.k(), 2);
    assert_eq!(engine.index().len(), corpus().len());
    let result = engine.ask("penalties for late filing").expect("ask");
    assert_eq!(result.supporting_chunks.len(), 2);
    assert_eq!(result.supporting_chunks[0].chunk_id, 1);
    assert_eq!(result.supporting_chunks[0].source, "law.pdf");
    assert!(result.scores[0] >= result.scores[1]);
}

#[test]
fn missing_credential_warns_without_calling_the_service() {
    let settings = Settings::default();
    assert!(settings.completion.api_key.is_none());
    let engine = QueryEngine::new(index(corpus()), Box::new(FakeEmbedder::new(DIM)), &settings).unwrap();

    let result = engine.ask("What does article 1 define?").expect("retrieval still works");
    match &result.answer {
        Answer::Unavailable { warning } => assert!(warning.contains("OPENAI_API_KEY"), "{warning}"),
        other => panic!("expected a credential warning, got {other:?}"),
    }
    assert_eq!(result.supporting_chunks.len(), 3);
    assert!(result.answer.text().is_none());
}

#[test]
fn rejected_credential_is_a_warning_not_an_error() {
    let engine = QueryEngine::with_client(index(corpus()), Box::new(FakeEmbedder::new(DIM)), Some(Box::new(RefusingClient)), 1).unwrap();
    let result = engine.ask("fees").expect("ask");
    assert!(matches!(result.answer, Answer::Unavailable { .. }));
    assert_eq!(result.supporting_chunks.len(), 1);
}

#[test]
fn network_failure_is_a_completion_error() {
    let engine = QueryEngine::with_client(index(corpus()), Box::new(FakeEmbedder::new(DIM)), Some(Box::new(OfflineClient)), 1).unwrap();
    assert!(matches!(engine.ask("fees"), Err(Error::Completion(_))));
}

#[test]
fn empty_question_is_rejected_before_any_work() {
    let client = RecordingClient::default();
    let engine = QueryEngine::with_client(index(corpus()), Box::new(FakeEmbedder::new(DIM)), Some(Box::new(client.clone())), 3).unwrap();
    assert!(matches!(engine.ask("   \n"), Err(Error::EmptyQuestion)));
    assert!(client.calls.lock().unwrap().is_empty());
}

#[test]
fn embedding_mismatch_is_a_retrieval_error() {
    let client = RecordingClient::default();
    let engine = QueryEngine::with_client(index(corpus()), Box::new(FakeEmbedder::new(DIM / 2)), Some(Box::new(client.clone())), 3).unwrap();
    assert!(matches!(engine.ask("fees"), Err(Error::Retrieval(_))));
    assert!(client.calls.lock().unwrap().is_empty(), "no partial answer");
}

#[test]
fn zero_k_is_invalid() {
    let built = QueryEngine::with_client(index(corpus()), Box::new(FakeEmbedder::new(DIM)), None, 0);
    assert!(matches!(built, Err(Error::InvalidConfig(_))));
}
