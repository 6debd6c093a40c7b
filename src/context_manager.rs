// context_manager.rs
use crate::triggers::display_text;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Turn {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Turn {
            role: Role::Assistant,
            text: text.into(),
        }
    }

    pub fn display_text(&self) -> String {
        match self.role {
            Role::User => self.text.clone(),
            Role::Assistant => display_text(&self.text),
        }
    }
}

/// Append-only conversation log.
///
/// While a user turn waits for its reply the log is held: notices added in
/// that window are queued and land after the reply, so a user turn is always
/// followed directly by its assistant turn.
#[derive(Debug, Clone, Default)]
pub struct ContextManager {
    turns: Vec<Turn>,
    held: Option<Vec<Turn>>,
}

impl ContextManager {
    pub fn with_greeting(greeting: &str) -> Self {
        ContextManager {
            turns: vec![Turn::assistant(greeting)],
            held: None,
        }
    }

    pub fn add_turn(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Appends an out-of-band assistant notice, queued while the log is held.
    pub fn add_notice(&mut self, turn: Turn) {
        match &mut self.held {
            Some(queued) => queued.push(turn),
            None => self.turns.push(turn),
        }
    }

    pub fn hold(&mut self) {
        self.held.get_or_insert_with(Vec::new);
    }

    pub fn release(&mut self) {
        if let Some(queued) = self.held.take() {
            self.turns.extend(queued);
        }
    }

    pub fn get_context(&self) -> Vec<Turn> {
        self.turns.clone()
    }
}
