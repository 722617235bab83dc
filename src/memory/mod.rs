//! Conversation memory
//!
//! A bounded, oldest-first log of successful exchanges that is folded into
//! later prompts and search queries.

use crate::config::MemorySettings;
use std::collections::VecDeque;
use std::fmt;

const ELLIPSIS: &str = "...";

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("User"),
            Role::Assistant => f.write_str("Assistant"),
        }
    }
}

/// One side of a completed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

impl fmt::Display for ConversationTurn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.role, self.text)
    }
}

/// Bounded FIFO of conversation turns
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    turns: VecDeque<ConversationTurn>,
    max_turns: usize,
    user_max_chars: usize,
    assistant_max_chars: usize,
}

impl ConversationMemory {
    /// Memory holding five exchanges with the default text limits
    pub fn new() -> Self {
        Self::with_settings(&MemorySettings::default())
    }

    pub fn with_settings(settings: &MemorySettings) -> Self {
        Self {
            turns: VecDeque::with_capacity(settings.max_turns + 1),
            max_turns: settings.max_turns,
            user_max_chars: settings.user_max_chars,
            assistant_max_chars: settings.assistant_max_chars,
        }
    }

    /// Store a turn, truncating its text and evicting the oldest turns over capacity
    pub fn append(&mut self, mut turn: ConversationTurn) {
        let limit = match turn.role {
            Role::User => self.user_max_chars,
            Role::Assistant => self.assistant_max_chars,
        };
        turn.text = truncate(&turn.text, limit);

        self.turns.push_back(turn);
        while self.turns.len() > self.max_turns {
            self.turns.pop_front();
        }
    }

    /// Stored turns, oldest first
    pub fn snapshot(&self) -> Vec<ConversationTurn> {
        self.turns.iter().cloned().collect()
    }

    /// Stored turns rendered one per line
    pub fn transcript(&self) -> String {
        self.turns
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new()
    }
}

/// Cut `text` to at most `max_chars` characters, ending in "..." when anything was dropped
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}
