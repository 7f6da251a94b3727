//! Startup wiring: turn a validated [`AppConfig`] into a ready orchestrator.
//!
//! Every fatal configuration problem surfaces here, before any completion
//! call is attempted. The credential is checked first, so a missing key never
//! constructs a client.

use std::sync::Arc;

use contextchat_config::AppConfig;
use contextchat_core::completion::CompletionClient;
use contextchat_core::error::{Error, ProviderError, Result};
use tracing::info;

use crate::context::{
    ContextAssembler, ContextCorpus, PromptTemplate, TiktokenCounter, TokenBudget, TokenCounter,
};
use crate::orchestrator::QueryOrchestrator;

/// Everything needed to answer questions, built once per process.
pub struct Session {
    orchestrator: QueryOrchestrator,
}

impl Session {
    /// Build a session with the `cl100k_base` tokenizer.
    ///
    /// `connect` receives the config and the credential and returns the
    /// completion client; it is only called once every other check passed.
    pub fn start<F>(config: &AppConfig, connect: F) -> Result<Self>
    where
        F: FnOnce(&AppConfig, &str) -> std::result::Result<Arc<dyn CompletionClient>, ProviderError>,
    {
        let api_key = config.require_api_key()?;
        let counter = Arc::new(TiktokenCounter::cl100k()?);
        Self::assemble_session(config, api_key, counter, connect)
    }

    /// Like [`start`](Self::start) with a caller-supplied token counter.
    pub fn start_with_counter<F>(
        config: &AppConfig,
        counter: Arc<dyn TokenCounter>,
        connect: F,
    ) -> Result<Self>
    where
        F: FnOnce(&AppConfig, &str) -> std::result::Result<Arc<dyn CompletionClient>, ProviderError>,
    {
        let api_key = config.require_api_key()?;
        Self::assemble_session(config, api_key, counter, connect)
    }

    fn assemble_session<F>(
        config: &AppConfig,
        api_key: &str,
        counter: Arc<dyn TokenCounter>,
        connect: F,
    ) -> Result<Self>
    where
        F: FnOnce(&AppConfig, &str) -> std::result::Result<Arc<dyn CompletionClient>, ProviderError>,
    {
        let budget = TokenBudget::new(config.token_budget()?)?;
        let template = PromptTemplate::parse(&config.prompt_template)?;
        let corpus = Arc::new(ContextCorpus::from_csv_path(
            &config.data.path,
            &config.data.column,
        )?);

        let client = connect(config, api_key).map_err(Error::Provider)?;
        info!(
            client = client.name(),
            model = %config.model,
            budget = budget.limit(),
            rows = corpus.len(),
            encoding = counter.name(),
            "Session ready"
        );

        let assembler = ContextAssembler::new(template, corpus, budget, counter);
        let orchestrator =
            QueryOrchestrator::new(assembler, client, config.model.clone(), config.max_output_tokens)
                .with_temperature(config.temperature);

        Ok(Self { orchestrator })
    }

    pub fn orchestrator(&self) -> &QueryOrchestrator {
        &self.orchestrator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::HeuristicCounter;
    use crate::test_helpers::ScriptedClient;
    use std::path::PathBuf;

    fn write_csv(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("trends.csv");
        std::fs::write(&path, "Trends\nOversized bags.\nSheer fabrics.\n").unwrap();
        path
    }

    fn config(data: PathBuf, api_key: Option<&str>) -> AppConfig {
        let mut config = AppConfig {
            api_key: api_key.map(String::from),
            ..AppConfig::default()
        };
        config.data.path = data;
        config
    }

    #[test]
    fn missing_api_key_never_connects() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(write_csv(&dir), None);
        let client = Arc::new(ScriptedClient::texts(&["unused"]));
        let mut connected = false;

        let result = Session::start_with_counter(&config, Arc::new(HeuristicCounter), |_, _| {
            connected = true;
            Ok(client.clone() as Arc<dyn CompletionClient>)
        });

        assert!(matches!(result, Err(Error::Config { .. })));
        assert!(!connected);
        assert_eq!(client.calls(), 0);
    }

    #[test]
    fn missing_data_file_is_fatal() {
        let config = config(PathBuf::from("/nonexistent/trends.csv"), Some("sk-test"));
        let result = Session::start_with_counter(&config, Arc::new(HeuristicCounter), |_, _| {
            Ok(Arc::new(ScriptedClient::texts(&[])) as Arc<dyn CompletionClient>)
        });

        match result {
            Err(Error::Corpus { message }) => assert!(message.contains("not found")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("session should not start"),
        }
    }

    #[test]
    fn missing_column_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(write_csv(&dir), Some("sk-test"));
        config.data.column = "Notes".into();

        let result = Session::start_with_counter(&config, Arc::new(HeuristicCounter), |_, _| {
            Ok(Arc::new(ScriptedClient::texts(&[])) as Arc<dyn CompletionClient>)
        });
        assert!(matches!(result, Err(Error::Corpus { .. })));
    }

    #[test]
    fn invalid_budget_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(write_csv(&dir), Some("sk-test"));
        config.max_output_tokens = config.max_total_tokens;

        let result = Session::start_with_counter(&config, Arc::new(HeuristicCounter), |_, _| {
            Ok(Arc::new(ScriptedClient::texts(&[])) as Arc<dyn CompletionClient>)
        });
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn connect_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(write_csv(&dir), Some("sk-test"));

        let result = Session::start_with_counter(&config, Arc::new(HeuristicCounter), |_, _| {
            Err(ProviderError::Network("no TLS backend".into()))
        });
        assert!(matches!(result, Err(Error::Provider(_))));
    }

    #[tokio::test]
    async fn wires_config_through_to_requests() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(write_csv(&dir), Some("sk-test"));
        config.model = "davinci-002".into();
        config.max_output_tokens = 64;
        config.temperature = Some(0.3);

        let client = Arc::new(ScriptedClient::texts(&["bare", "augmented"]));
        let mut seen_key = String::new();
        let session = Session::start(&config, |_, key| {
            seen_key = key.to_string();
            Ok(client.clone() as Arc<dyn CompletionClient>)
        })
        .unwrap();

        let result = session.orchestrator().answer("What bags?").await;
        assert_eq!(seen_key, "sk-test");
        assert_eq!(result.augmented_answer, "augmented");
        assert!(result.token_count > 0);

        let requests = client.requests();
        assert_eq!(requests[0].model, "davinci-002");
        assert_eq!(requests[1].max_tokens, 64);
        assert_eq!(requests[1].temperature, Some(0.3));
        assert!(requests[1].prompt.contains("Oversized bags.\n\n###\n\nSheer fabrics."));
    }
}
