//! Error types for the contextchat domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Startup failures share one top-level [`Error`]. Remote call failures are
//! [`ProviderError`]s; during a query the orchestrator absorbs them.

use thiserror::Error;

/// The top-level error type for startup and wiring operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Context data errors ---
    #[error("Context data error: {message}")]
    Corpus { message: String },

    // --- Prompt template errors ---
    #[error("Prompt template error: {message}")]
    Template { message: String },

    // --- Tokenizer errors ---
    #[error("Tokenizer unavailable: {0}")]
    Tokenizer(String),
}

impl Error {
    /// Whether this error came from configuration the user can fix
    /// (credential, config file, data file, template).
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::Provider(_) | Self::Tokenizer(_))
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Remote call errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = ProviderError::ApiError {
            status_code: 500,
            message: "upstream exploded".into(),
        };
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("upstream exploded"));
    }

    #[test]
    fn rate_limit_mentions_retry_window() {
        let err = ProviderError::RateLimited { retry_after_secs: 20 };
        assert!(err.to_string().contains("20s"));
    }

    #[test]
    fn config_errors_are_configuration() {
        let err = Error::Config {
            message: "OPENAI_API_KEY is not set".into(),
        };
        assert!(err.is_configuration());
        assert!(err.to_string().contains("OPENAI_API_KEY"));
        assert!(!Error::Tokenizer("bpe table".into()).is_configuration());
        assert!(!Error::from(ProviderError::Network("refused".into())).is_configuration());
    }
}
