//! The core models for a streamed conversation transcript.
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
}

/// One utterance in a conversation. Content is only mutable through the
/// owning [`Transcript`] while the turn is open for streaming.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Turn {
    pub role: Role,
    content: String,
}

impl Turn {
    pub fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Ordered history for a single conversation.
///
/// At most one turn is open for streaming at a time and it is tracked by
/// an explicit index rather than a "last element" convention, so a stale
/// stream can be told apart from the current one after a reset.
#[derive(Default)]
pub struct Transcript {
    turns: Vec<Turn>,
    open: Option<usize>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Append a frozen turn.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Append an empty assistant turn and mark it as the one receiving
    /// streamed fragments.
    pub fn open_assistant_turn(&mut self) {
        self.turns.push(Turn::new(Role::Assistant, ""));
        self.open = Some(self.turns.len() - 1);
    }

    /// Grow the open turn's content. A no-op when no turn is open, which
    /// is what guards against fragments from a superseded stream landing
    /// in a fresh conversation.
    pub fn append_to_open_turn(&mut self, fragment: &str) {
        if let Some(index) = self.open {
            self.turns[index].content.push_str(fragment);
        }
    }

    /// Replace the open turn's content wholesale, used for error notices.
    /// A no-op when no turn is open.
    pub fn set_open_turn(&mut self, content: &str) {
        if let Some(index) = self.open {
            self.turns[index].content = content.to_string();
        }
    }

    /// Freeze the open turn. Its content can no longer change.
    pub fn close_open_turn(&mut self) {
        self.open = None;
    }

    pub fn has_open_turn(&self) -> bool {
        self.open.is_some()
    }

    /// Discard all turns unconditionally, used on conversation switch.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.open = None;
    }
}
