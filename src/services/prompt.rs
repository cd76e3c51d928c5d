//! Coaching prompt assembly.

use crate::models::SearchResult;

/// Separator between retrieved chunks in the context block.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Concatenate chunk texts in retrieval order.
pub fn build_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| r.content.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// Build the single-turn coaching prompt for a belief and its context block.
pub fn build_coaching_prompt(belief: &str, context: &str) -> String {
    format!(
        r#"You are MindShift, an expert NLP coach specializing in Sleight of Mouth (SOM) patterns. The user has shared a limiting belief: "{belief}"

Here are the relevant SOM patterns and conversation examples from the knowledge base:

{context}

Based on this retrieved information, please:
1. Identify 2-3 relevant SOM patterns from the knowledge base that could challenge this belief
2. Formulate 2-3 powerful questions using these specific patterns
3. Maintain a supportive, conversational tone like in the examples
4. Reference specific patterns by name when appropriate
5. Use the conversation style and approach shown in the examples

Focus on helping the user reframe their limiting belief into a more empowering perspective using the exact patterns and techniques from the knowledge base."#
    )
}
