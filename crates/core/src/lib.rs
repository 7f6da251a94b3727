//! # contextchat Core
//!
//! Domain types, traits, and error definitions shared by every contextchat
//! crate. This crate has **no HTTP or runtime dependencies**: it defines the
//! completion-client seam that the providers crate implements and the agent
//! crate consumes.
//!
//! Keeping the seam here lets the orchestrator be tested against scripted
//! clients without touching the network.

pub mod completion;
pub mod error;

// Re-export key types at crate root for ergonomics
pub use completion::{CompletionClient, CompletionRequest, CompletionResponse, Usage};
pub use error::{Error, ProviderError, Result};
