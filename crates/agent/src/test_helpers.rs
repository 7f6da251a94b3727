//! Shared test helpers.

use contextchat_core::completion::{CompletionClient, CompletionRequest, CompletionResponse, Usage};
use contextchat_core::error::ProviderError;
use std::sync::Mutex;

/// A mock client that returns a sequence of scripted outcomes.
///
/// Each call to `complete` returns the next outcome in the queue and records
/// the request. Panics if more calls are made than outcomes provided.
pub struct ScriptedClient {
    outcomes: Mutex<Vec<Result<String, ProviderError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    pub fn new(outcomes: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a client whose calls all succeed with the given texts.
    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CompletionClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let call = requests.len();
        let outcomes = self.outcomes.lock().unwrap();

        if call >= outcomes.len() {
            panic!(
                "ScriptedClient: no more outcomes (call #{}, have {})",
                call,
                outcomes.len()
            );
        }

        let outcome = outcomes[call].clone();
        let model = request.model.clone();
        requests.push(request);

        outcome.map(|text| CompletionResponse {
            text,
            model,
            finish_reason: Some("stop".into()),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
        })
    }
}
