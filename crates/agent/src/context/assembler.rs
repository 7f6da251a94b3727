//! Token-budgeted prompt assembly.
//!
//! Packs corpus rows into the prompt template's context slot:
//!
//! 1. `base = tokens(template with empty slots) + tokens(question)`
//! 2. Walk the corpus in order, adding each row while
//!    `running + tokens(row) <= budget`
//! 3. Stop at the **first** row that does not fit. Later, smaller rows are
//!    never tried, so the included rows are always a prefix of the corpus.
//! 4. Join the included rows with [`CONTEXT_SEPARATOR`] and render.
//!
//! # Determinism
//!
//! Identical inputs always produce identical outputs. The assembler holds no
//! mutable state; the template's own cost is computed once at construction.
//!
//! # Over-budget prompts
//!
//! When the template and question alone exceed the budget the prompt is still
//! rendered, with an empty context block, and the returned count reports the
//! overshoot. It is not an error.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::context::corpus::ContextCorpus;
use crate::context::template::PromptTemplate;
use crate::context::token::TokenCounter;
use contextchat_core::error::Error;

/// Placed between consecutive context rows.
pub const CONTEXT_SEPARATOR: &str = "\n\n###\n\n";

/// Tokens available for template + question + context rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBudget {
    limit: usize,
}

impl TokenBudget {
    /// A budget of `limit` tokens. Zero is rejected.
    pub fn new(limit: usize) -> Result<Self, Error> {
        if limit == 0 {
            return Err(Error::Config {
                message: "token budget must be greater than zero".into(),
            });
        }
        Ok(Self { limit })
    }

    /// `max_total - reserved_output`, rejected unless positive.
    pub fn from_limits(max_total: u32, reserved_output: u32) -> Result<Self, Error> {
        let limit = max_total.saturating_sub(reserved_output) as usize;
        Self::new(limit)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// A rendered prompt and what it cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembledPrompt {
    /// The template with context block and question substituted.
    pub prompt: String,
    /// Template + question + included rows.
    pub token_count: usize,
    /// How many corpus rows made it in (always a prefix).
    pub rows_included: usize,
    /// Size of the corpus the rows were drawn from.
    pub rows_total: usize,
    /// The budget the prompt was assembled against.
    pub budget: usize,
}

impl AssembledPrompt {
    /// Whether the template and question alone overshot the budget.
    pub fn over_budget(&self) -> bool {
        self.token_count > self.budget
    }
}

/// Assemble a prompt in one shot, without a configured assembler.
///
/// Same algorithm as [`ContextAssembler::assemble`]; the template cost is
/// computed on every call.
pub fn assemble(
    question: &str,
    corpus: &[String],
    template: &PromptTemplate,
    budget: TokenBudget,
    counter: &dyn TokenCounter,
) -> AssembledPrompt {
    let template_tokens = counter.count(&template.skeleton());
    fill(question, corpus, template, template_tokens, budget, counter)
}

fn fill(
    question: &str,
    corpus: &[String],
    template: &PromptTemplate,
    template_tokens: usize,
    budget: TokenBudget,
    counter: &dyn TokenCounter,
) -> AssembledPrompt {
    let base = template_tokens + counter.count(question);
    let mut running = base;
    let mut included: Vec<&str> = Vec::new();

    for row in corpus {
        let row_tokens = counter.count(row);
        if running + row_tokens <= budget.limit() {
            included.push(row);
            running += row_tokens;
        } else {
            break;
        }
    }

    if base > budget.limit() {
        warn!(
            base_tokens = base,
            budget = budget.limit(),
            "Template and question exceed the token budget; no context included"
        );
    }

    debug!(
        base_tokens = base,
        total_tokens = running,
        rows_included = included.len(),
        rows_total = corpus.len(),
        "Assembled prompt"
    );

    AssembledPrompt {
        prompt: template.render(&included.join(CONTEXT_SEPARATOR), question),
        token_count: running,
        rows_included: included.len(),
        rows_total: corpus.len(),
        budget: budget.limit(),
    }
}

/// The context assembler. Stateless across calls; create one and reuse it.
pub struct ContextAssembler {
    template: PromptTemplate,
    template_tokens: usize,
    corpus: Arc<ContextCorpus>,
    budget: TokenBudget,
    counter: Arc<dyn TokenCounter>,
}

impl ContextAssembler {
    pub fn new(
        template: PromptTemplate,
        corpus: Arc<ContextCorpus>,
        budget: TokenBudget,
        counter: Arc<dyn TokenCounter>,
    ) -> Self {
        let template_tokens = counter.count(&template.skeleton());
        debug!(
            template_tokens,
            budget = budget.limit(),
            encoding = counter.name(),
            "Context assembler ready"
        );
        Self {
            template,
            template_tokens,
            corpus,
            budget,
            counter,
        }
    }

    /// Build the largest corpus prefix that fits and render the prompt.
    pub fn assemble(&self, question: &str) -> AssembledPrompt {
        fill(
            question,
            self.corpus.rows(),
            &self.template,
            self.template_tokens,
            self.budget,
            self.counter.as_ref(),
        )
    }

    /// Token cost of the template with both slots empty.
    pub fn template_tokens(&self) -> usize {
        self.template_tokens
    }

    pub fn budget(&self) -> TokenBudget {
        self.budget
    }

    pub fn corpus(&self) -> &ContextCorpus {
        &self.corpus
    }
}
