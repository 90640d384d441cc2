use pdfrag_core::types::ChunkRecord;

use crate::completion::ChatMessage;

const SYSTEM_TEMPLATE: &str = "Use the following pieces of context to answer the user's question. \n\
If you don't know the answer, just say that you don't know, don't try to make up an answer.\n\
----------------\n";

/// Stuff every retrieved chunk, in rank order, into the system message; the
/// question goes in the user message unchanged.
pub fn build_messages(question: &str, context: &[ChunkRecord]) -> Vec<ChatMessage> {
    let joined = context.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join("\n\n");
    vec![
        ChatMessage::system(format!("{SYSTEM_TEMPLATE}{joined}")),
        ChatMessage::user(question),
    ]
}
