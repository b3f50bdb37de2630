//! Prompt formatting and output parsing around a single model call.

use crate::model::Message;

const QUESTION_PREFIX: &str = "Question:";

/// Fixed system instruction followed by the user's question.
pub fn build_prompt(system_prompt: &str, question: &str) -> Vec<Message> {
    vec![
        Message::system(system_prompt),
        Message::user(format!("{QUESTION_PREFIX}{question}")),
    ]
}

/// Flattens the chat messages into the single text input a hosted
/// text-generation endpoint accepts, one `Label: content` line per message.
pub fn render_prompt(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|msg| format!("{}: {}", msg.role.label(), msg.content))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn parse_output(raw: &str) -> String {
    raw.trim().to_string()
}
