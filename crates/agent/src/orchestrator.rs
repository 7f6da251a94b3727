//! Query orchestration: one bare completion and one context-augmented
//! completion for the same question.
//!
//! # Flow
//!
//! 1. Assemble the augmented prompt from the corpus
//! 2. Complete the bare question
//! 3. Complete the augmented prompt
//! 4. Return both answers, trimmed, with the prompt's token count
//!
//! Remote failures never escape [`QueryOrchestrator::answer`]: any failed
//! call turns the whole result into [`QueryResult::failed`].

use std::sync::Arc;

use contextchat_core::completion::{CompletionClient, CompletionRequest};
use contextchat_core::error::ProviderError;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::context::{AssembledPrompt, ContextAssembler};

/// Shown in place of the answer when a completion call fails.
pub const FAILURE_MESSAGE: &str = "I apologize, an error occurred during the API call.";

/// Both answers for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Tokens in the augmented prompt (0 on failure).
    pub token_count: usize,
    /// The question as asked.
    pub question: String,
    /// Answer to the bare question, or [`FAILURE_MESSAGE`].
    pub bare_answer: String,
    /// Answer to the augmented prompt (empty on failure).
    pub augmented_answer: String,
    /// Set only on the failure sentinel.
    #[serde(default)]
    pub degraded: bool,
}

impl QueryResult {
    /// The sentinel returned when either completion fails.
    pub fn failed(question: impl Into<String>) -> Self {
        Self {
            token_count: 0,
            question: question.into(),
            bare_answer: FAILURE_MESSAGE.into(),
            augmented_answer: String::new(),
            degraded: true,
        }
    }
}

/// Runs questions through the bare and augmented paths.
pub struct QueryOrchestrator {
    assembler: ContextAssembler,
    client: Arc<dyn CompletionClient>,
    model: String,
    max_output_tokens: u32,
    temperature: Option<f32>,
}

impl QueryOrchestrator {
    pub fn new(
        assembler: ContextAssembler,
        client: Arc<dyn CompletionClient>,
        model: impl Into<String>,
        max_output_tokens: u32,
    ) -> Self {
        Self {
            assembler,
            client,
            model: model.into(),
            max_output_tokens,
            temperature: None,
        }
    }

    /// Set the sampling temperature for both calls.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// The augmented prompt that [`answer`](Self::answer) would send.
    pub fn prepare(&self, question: &str) -> AssembledPrompt {
        self.assembler.assemble(question)
    }

    pub fn assembler(&self) -> &ContextAssembler {
        &self.assembler
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Answer `question` with and without context. Never fails.
    pub async fn answer(&self, question: &str) -> QueryResult {
        let assembled = self.assembler.assemble(question);
        info!(
            tokens = assembled.token_count,
            rows = assembled.rows_included,
            of = assembled.rows_total,
            "Prompt assembled"
        );

        match self.complete_both(question, &assembled.prompt).await {
            Ok((bare, augmented)) => QueryResult {
                token_count: assembled.token_count,
                question: question.to_string(),
                bare_answer: bare.trim().to_string(),
                augmented_answer: augmented.trim().to_string(),
                degraded: false,
            },
            Err(e) => {
                error!(
                    client = self.client.name(),
                    model = %self.model,
                    error = %e,
                    "Completion request failed"
                );
                QueryResult::failed(question)
            }
        }
    }

    async fn complete_both(
        &self,
        question: &str,
        prompt: &str,
    ) -> Result<(String, String), ProviderError> {
        let bare = self.complete(question).await?;
        debug!(chars = bare.len(), "Bare completion received");

        let augmented = self.complete(prompt).await?;
        debug!(chars = augmented.len(), "Augmented completion received");

        Ok((bare, augmented))
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = CompletionRequest::new(&self.model, prompt, self.max_output_tokens)
            .with_temperature(self.temperature);
        let response = self.client.complete(request).await?;
        Ok(response.text)
    }
}
