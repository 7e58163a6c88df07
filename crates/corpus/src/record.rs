//! One training record: a user turn, the configuration produced, and a score.

use assetwright_core::message::Message;
use serde::{Deserialize, Serialize};

/// A `{messages, score}` record as written to the corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub messages: Vec<Message>,
    pub score: f32,
}

impl InteractionRecord {
    /// Build a record from the user's text and the resulting configuration
    /// JSON.
    pub fn new(user_text: impl Into<String>, configuration_json: impl Into<String>, score: f32) -> Self {
        Self {
            messages: vec![Message::user(user_text), Message::assistant(configuration_json)],
            score,
        }
    }

    /// Serialize as a single JSONL line, newline included.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}
