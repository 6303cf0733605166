//! Bounded conversation memory.

use std::collections::VecDeque;

use crate::document::ConversationTurn;

/// Ordered log of the most recent conversation turns.
///
/// Holds at most `max_turns` turns; appending past the cap drops the oldest
/// ones. Reads never mutate the log.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    turns: VecDeque<ConversationTurn>,
    max_turns: usize,
}

impl Default for ConversationMemory {
    /// Fifty question/answer exchanges.
    fn default() -> Self {
        Self::new(100)
    }
}

impl ConversationMemory {
    /// Create an empty memory holding at most `max_turns` turns.
    pub fn new(max_turns: usize) -> Self {
        Self { turns: VecDeque::with_capacity(max_turns.min(1024)), max_turns }
    }

    /// Maximum number of turns kept.
    pub fn capacity(&self) -> usize {
        self.max_turns
    }

    /// Append a turn, then drop the oldest turns beyond the cap.
    pub fn append(&mut self, turn: ConversationTurn) {
        self.turns.push_back(turn);
        while self.turns.len() > self.max_turns {
            self.turns.pop_front();
        }
    }

    /// The last `n` turns (or fewer), oldest first.
    pub fn recent(
        &self,
        n: usize,
    ) -> impl DoubleEndedIterator<Item = &ConversationTurn> + ExactSizeIterator + Clone {
        self.turns.range(self.turns.len().saturating_sub(n)..)
    }

    /// All stored turns, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ConversationTurn> + Clone {
        self.turns.iter()
    }

    /// Remove every turn.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
