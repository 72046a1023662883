//! Prompt contract for SQL generation.

use crate::ai_types::Message;

/// Rules the model is held to. Its output is still treated as untrusted.
pub const SQL_SYSTEM_PROMPT: &str = "You are a PostgreSQL SQL generator.

STRICT RULES:
- Use ONLY the tables and columns listed under Available Schema.
- Do NOT invent tables, columns or values.
- If the question is about the tables themselves, query information_schema.
- Return ONLY one SQL statement.
- No markdown.
- No explanations.";

/// Build the messages asking for SQL that answers `question` using only
/// the `schema.table.column` identifiers in `grounding`.
#[must_use]
pub fn build_sql_messages(question: &str, grounding: &[String]) -> Vec<Message> {
    let schema = if grounding.is_empty() { "(none)".to_owned() } else { grounding.join("\n") };
    let user = format!("User Question:\n{}\n\nAvailable Schema:\n{schema}", question.trim());
    vec![Message::system(SQL_SYSTEM_PROMPT), Message::user(user)]
}
