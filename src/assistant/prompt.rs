//! Prompt and query assembly

use crate::memory::ConversationMemory;

/// The query sent to the search provider
///
/// The whole conversation transcript is prepended to the user's input, so the
/// search query grows with the conversation just like the prompt does.
pub fn effective_query(memory: &ConversationMemory, input: &str) -> String {
    if memory.is_empty() {
        input.to_string()
    } else {
        format!("{}\n{}", memory.transcript(), input)
    }
}

/// Assemble the prompt for one turn
///
/// `question` is the raw user input, not the history-prefixed search query;
/// the history already has its own section.
pub fn build_prompt(history: &str, question: &str, search_results: &str) -> String {
    format!(
        "You are an AI assistant that uses search results to answer questions accurately.
Base your answers on the provided search results and conversation history.
If the search results don't contain relevant information, say so.

Conversation history:
{history}

Current question: {question}

Search results:
{search_results}

Instructions:
1. Analyze the search results and conversation history carefully.
2. Provide a comprehensive answer based on the information in the search results and relevant context from the conversation history.
3. If the search results don't contain relevant information to answer the question, state that clearly.
4. Keep your answer concise and to the point.

Your answer:"
    )
}
