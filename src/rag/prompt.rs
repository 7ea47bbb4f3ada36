use super::search::ScoredChunk;
use crate::types::ChatMessage;

const SYSTEM_TEMPLATE: &str = r#"You are an AI assistant helping students with their studies. Use the following context from the subject material to answer the student's question accurately and helpfully. If the context doesn't contain enough information to answer the question, say so clearly.

Context from subject material:
"#;

/// Build the generation request for a student question.
///
/// Retrieved chunk texts are joined with a blank line in the order given
/// (similarity-descending, as returned by `top_k`) and embedded in the
/// instruction message; the user prompt follows verbatim.
pub fn assemble(retrieved: &[ScoredChunk], user_prompt: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_message(retrieved)),
        ChatMessage::user(user_prompt),
    ]
}

fn system_message(retrieved: &[ScoredChunk]) -> String {
    let context = retrieved
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{}{}", SYSTEM_TEMPLATE, context)
}
