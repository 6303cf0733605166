//! Conversation memory cap and context budget properties.

use std::collections::HashMap;

use docchat_rag::{Chunk, ContextAssembler, ConversationMemory, ConversationTurn, RetrievedPassage};
use proptest::prelude::*;

fn passage(text: String) -> RetrievedPassage {
    RetrievedPassage {
        chunk: Chunk {
            id: "doc:0:0".to_string(),
            text,
            source: "doc".to_string(),
            page_index: 0,
            chunk_index: 0,
            metadata: HashMap::new(),
        },
        score: 0.5,
    }
}

#[test]
fn memory_keeps_the_last_hundred_of_three_hundred_turns() {
    let mut memory = ConversationMemory::new(100);
    for i in 0..300 {
        memory.append(ConversationTurn::user(format!("turn {i}")));
    }

    assert_eq!(memory.len(), 100);
    let texts: Vec<String> = memory.iter().map(|t| t.text.clone()).collect();
    let expected: Vec<String> = (200..300).map(|i| format!("turn {i}")).collect();
    assert_eq!(texts, expected);
}

proptest! {
    #[test]
    fn memory_never_exceeds_its_cap(cap in 0usize..50, appends in 0usize..200) {
        let mut memory = ConversationMemory::new(cap);
        for i in 0..appends {
            memory.append(ConversationTurn::assistant(i.to_string()));
            prop_assert!(memory.len() <= cap);
        }
        prop_assert_eq!(memory.len(), appends.min(cap));
        if let Some(last) = memory.recent(1).next() {
            prop_assert_eq!(last.text.clone(), (appends - 1).to_string());
        }
    }

    /// Passages whose blocks overflow the budget are cut short.
    #[test]
    fn overflowing_passages_are_truncated(
        lengths in proptest::collection::vec(1usize..400, 2..8),
        max_passages in 1usize..6,
    ) {
        let passages: Vec<_> = lengths.iter().map(|n| passage("x".repeat(*n))).collect();
        let total: usize = lengths.iter().map(|n| n + "[Passage 1]\n\n\n".len()).sum();
        // Strictly less than the full concatenation.
        let max_bytes = total / 2;

        let context = ContextAssembler::new(max_passages, max_bytes).assemble(&passages);

        prop_assert!(context.text.len() <= max_bytes);
        prop_assert!(context.used_count <= max_passages.min(passages.len()));
        if max_passages >= passages.len() {
            prop_assert!(context.truncated);
            prop_assert!(context.used_count < passages.len());
        }
    }
}
