//! Context augmentation: folding retrieved search results into a conversation.
//!
//! Everything here is pure. Identical inputs always produce identical output.

use crate::types::{ChatMessage, Role, SearchResult};

/// Separator placed between formatted results in the context block.
pub const RESULT_SEPARATOR: &str = "\n\n---\n\n";

const STUDY_ASSISTANT_PROMPT: &str = "You are StudyBolt, an AI study assistant. \
You have access to current web search results to provide accurate, up-to-date information.

When answering:
- Use the search results provided to give comprehensive answers
- Cite sources when making specific claims
- If search results don't fully answer the question, acknowledge limitations
- Focus on being helpful for studying and learning
- Structure responses clearly with proper formatting

Current search results:
";

const SUMMARY_PROMPT: &str = "You are a research assistant. Provide a concise summary of the \
search results below, highlighting key points and insights.";

/// Format results as `[title]\nsnippet\nSource: link`, in input order.
pub fn context_block(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| format!("[{}]\n{}\nSource: {}", r.title, r.snippet, r.link))
        .collect::<Vec<_>>()
        .join(RESULT_SEPARATOR)
}

/// The synthesized system instruction carrying `results` as context.
pub fn system_instruction(results: &[SearchResult]) -> String {
    format!("{}{}", STUDY_ASSISTANT_PROMPT, context_block(results))
}

/// Prepend a StudyBolt system message carrying `results` to `history`.
///
/// The output never starts with two system messages: a leading system message
/// already in `history` is appended to the synthesized instruction. Every
/// other message is carried over unchanged and in order.
pub fn augment(history: &[ChatMessage], results: &[SearchResult]) -> Vec<ChatMessage> {
    let mut instruction = system_instruction(results);

    let rest = match history.split_first() {
        Some((first, rest)) if first.role == Role::System => {
            instruction.push_str("\n\n");
            instruction.push_str(&first.content);
            rest
        }
        _ => history,
    };

    let mut messages = Vec::with_capacity(rest.len() + 1);
    messages.push(ChatMessage::system(instruction));
    messages.extend(rest.iter().cloned());
    messages
}

/// Messages asking the agent to summarize `results` for `query`.
pub fn summary_messages(query: &str, results: &[SearchResult]) -> Vec<ChatMessage> {
    let listing = results
        .iter()
        .map(|r| r.rendered_text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    vec![
        ChatMessage::system(SUMMARY_PROMPT),
        ChatMessage::user(format!(
            "Please summarize these search results for the query \"{}\":\n\n{}",
            query, listing
        )),
    ]
}
