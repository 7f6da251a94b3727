//! Completion client implementations for contextchat.
//!
//! All clients implement the `contextchat_core::CompletionClient` trait.

pub mod openai;

pub use openai::OpenAiCompletionClient;
