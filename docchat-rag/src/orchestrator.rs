//! Answer orchestration: retrieve, assemble, compose, generate, record.
//!
//! [`AnswerOrchestrator::answer`] never fails. Every path ends in a reply
//! string that is appended to the chat display log; conversation memory only
//! grows when the reply is a real answer or the "nothing found" message.

use std::fmt::Write as _;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::context::ContextAssembler;
use crate::document::{ChatMessage, ConversationTurn, RetrievedPassage};
use crate::error::RagError;
use crate::generation::GenerationService;
use crate::session::SessionState;

/// Reply shown when a question arrives before anything has been indexed.
pub const NO_INDEX_REPLY: &str = "Please upload and process documents first.";

const FORMAT_INSTRUCTIONS: &str = "\
Answer the question using both the documents above and the previous conversation.
If earlier turns mention something relevant, build on it to give a more accurate, contextual answer.

Answer format:
- Structure the answer with markdown headings (#, ##, ###)
- Use # for the main topic, ## for details, and ### for specific explanations
- Use several headings when the answer is long or covers several aspects
- Write in complete, polite sentences
- Do not answer in fragments or incomplete sentences

Restrictions:
- Do not insert reference markers such as (Passage 1) or [Passage 2]
- Do not mention \"the reference documents\", \"the provided documents\" or passage numbers
- Write only the content of the answer, without citation wording
- Do not append a sources or references section at the end";

/// Reply shown when retrieval returns no passages for `question`.
pub fn no_relevant_documents_reply(question: &str) -> String {
    format!("Sorry, no relevant documents were found for '{question}'.")
}

/// Reply shown when retrieval or generation fails.
pub fn error_reply(cause: &RagError) -> String {
    format!("An error occurred: {cause}")
}

/// Which path [`AnswerOrchestrator::answer`] took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnswerOutcome {
    /// Nothing has been indexed yet.
    NoIndex,
    /// Retrieval found no passages.
    NoRelevantDocuments,
    /// The generation service produced the reply.
    Generated,
    /// Retrieval or generation failed; the reply carries the cause.
    Failed,
}

/// The reply to one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    /// Text shown to the user.
    pub text: String,
    pub outcome: AnswerOutcome,
    /// Number of passages used when the context budget cut the list short.
    pub truncated_to: Option<usize>,
    /// Distinct document names of the passages placed in the prompt, best first.
    pub sources: Vec<String>,
}

impl Answer {
    fn new(text: impl Into<String>, outcome: AnswerOutcome) -> Self {
        Self { text: text.into(), outcome, truncated_to: None, sources: Vec::new() }
    }

    fn failed(cause: &RagError) -> Self {
        Self::new(error_reply(cause), AnswerOutcome::Failed)
    }
}

/// Drives a question through retrieval and generation against a session.
pub struct AnswerOrchestrator {
    generator: Arc<dyn GenerationService>,
    assembler: ContextAssembler,
    top_k: usize,
    history_turns: usize,
}

impl AnswerOrchestrator {
    /// `history_turns` bounds how many memory turns go into each prompt.
    pub fn new(
        generator: Arc<dyn GenerationService>,
        assembler: ContextAssembler,
        top_k: usize,
        history_turns: usize,
    ) -> Self {
        Self { generator, assembler, top_k, history_turns }
    }

    /// Answer `question` and log both sides to the chat display log.
    pub async fn answer(&self, state: &mut SessionState, question: &str) -> Answer {
        state.push_chat(ChatMessage::user(question));
        let answer = self.respond(state, question).await;
        state.push_chat(ChatMessage::assistant(answer.text.clone()));
        answer
    }

    async fn respond(&self, state: &mut SessionState, question: &str) -> Answer {
        let retriever = match state.index().build_retriever(self.top_k) {
            Ok(retriever) => retriever,
            Err(RagError::NoIndex) => {
                info!("question received before any document was indexed");
                return Answer::new(NO_INDEX_REPLY, AnswerOutcome::NoIndex);
            }
            Err(e) => return Answer::failed(&e),
        };

        let passages = match retriever.query(question).await {
            Ok(passages) => passages,
            Err(e) => {
                error!(error = %e, "retrieval failed");
                return Answer::failed(&e);
            }
        };

        if passages.is_empty() {
            let text = no_relevant_documents_reply(question);
            record_exchange(state, question, &text);
            return Answer::new(text, AnswerOutcome::NoRelevantDocuments);
        }

        let context = self.assembler.assemble(&passages);
        let truncated_to = context.truncated.then_some(context.used_count);
        if context.truncated {
            warn!(
                retrieved = passages.len(),
                used = context.used_count,
                "context budget exceeded; remaining passages dropped"
            );
        }

        let prompt =
            compose_prompt(question, &context.text, state.memory().recent(self.history_turns));

        match self.generator.generate(&prompt).await {
            Ok(reply) => {
                info!(
                    provider = self.generator.name(),
                    passages = context.used_count,
                    reply_len = reply.len(),
                    "generated answer"
                );
                record_exchange(state, question, &reply);
                Answer {
                    text: reply,
                    outcome: AnswerOutcome::Generated,
                    truncated_to,
                    sources: sources(&passages[..context.used_count]),
                }
            }
            Err(e) => {
                error!(provider = self.generator.name(), error = %e, "generation failed");
                Answer { truncated_to, ..Answer::failed(&e) }
            }
        }
    }
}

fn record_exchange(state: &mut SessionState, question: &str, reply: &str) {
    let memory = state.memory_mut();
    memory.append(ConversationTurn::user(question));
    memory.append(ConversationTurn::assistant(reply));
}

fn sources(passages: &[RetrievedPassage]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for passage in passages {
        if !sources.contains(&passage.chunk.source) {
            sources.push(passage.chunk.source.clone());
        }
    }
    sources
}

/// Build the generation prompt.
///
/// The "Previous conversation" block is included only when `history` yields
/// at least one turn.
pub fn compose_prompt<'a>(
    question: &str,
    context: &str,
    history: impl IntoIterator<Item = &'a ConversationTurn>,
) -> String {
    let mut prompt = format!("Question: {question}\n\nRelevant documents:\n{context}");

    let mut history = history.into_iter().peekable();
    if history.peek().is_some() {
        prompt.push_str("\n=== Previous conversation ===\n");
        for turn in history {
            // Writing into a String cannot fail.
            let _ = writeln!(prompt, "{turn}");
        }
        prompt.push_str("=== End of previous conversation ===\n");
    }

    prompt.push('\n');
    prompt.push_str(FORMAT_INSTRUCTIONS);
    prompt
}
