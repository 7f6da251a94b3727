//! Context assembly: corpus, template, token counting and the greedy packer.
//!
//! | Piece | Role |
//! |-------|------|
//! | [`ContextCorpus`] | Rows from one CSV column, in file order |
//! | [`PromptTemplate`] | Text with `{context}` and `{question}` slots |
//! | [`TokenCounter`] | `cl100k_base` counts (or a heuristic) |
//! | [`ContextAssembler`] | Largest corpus prefix that fits the budget |

pub mod assembler;
pub mod corpus;
pub mod template;
pub mod token;

pub use assembler::{AssembledPrompt, CONTEXT_SEPARATOR, ContextAssembler, TokenBudget, assemble};
pub use corpus::{ContextCorpus, CorpusError};
pub use template::{PromptTemplate, TemplateError};
pub use token::{HeuristicCounter, TiktokenCounter, TokenCounter};
