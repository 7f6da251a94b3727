//! Retrieval-augmented question answering over a local CSV corpus.
//!
//! For each question the tool:
//!
//! 1. **Assembles** a prompt from the template, the question, and as many
//!    corpus rows as fit the token budget (in file order)
//! 2. **Completes** the bare question
//! 3. **Completes** the augmented prompt
//! 4. **Reports** both answers side by side with the prompt's token count
//!
//! [`Session`] wires configuration into a [`QueryOrchestrator`] once at
//! startup; everything after that is read-only.

pub mod context;
pub mod orchestrator;
pub mod session;

#[cfg(test)]
mod test_helpers;

pub use context::{
    AssembledPrompt, ContextAssembler, ContextCorpus, CorpusError, HeuristicCounter,
    PromptTemplate, TemplateError, TiktokenCounter, TokenBudget, TokenCounter,
};
pub use orchestrator::{FAILURE_MESSAGE, QueryOrchestrator, QueryResult};
pub use session::Session;
