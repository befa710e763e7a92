//! Model invocation collaborator.
//!
//! The governance core selects a model and hands off; prompt construction
//! and completion parsing live outside this system. This module defines the
//! narrow seam and a pass-through implementation used until a real provider
//! is wired in.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// One message in a conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Invocation request handed to the provider.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: Option<String>,
    pub context_messages: Vec<ChatMessage>,
    pub user_messages: Vec<ChatMessage>,
    pub model: String,
    pub max_output_tokens: u32,
}

/// Provider output.
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
}

/// Terminal provider failure. No retry/backoff policy is applied here.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("provider error: {0}")]
    Provider(String),
}

/// Dyn-compatible provider seam.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CompletionError>;
}

/// Pass-through implementation: echoes a fixed reply without any network
/// call.
pub struct StubCompletionClient;

#[async_trait]
impl CompletionClient for StubCompletionClient {
    async fn complete(&self, _request: CompletionRequest) -> Result<Completion, CompletionError> {
        Ok(Completion {
            content: "stub reply".to_string(),
        })
    }
}
