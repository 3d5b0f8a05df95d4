//! Trait abstractions for the remote generation capability
//!
//! These traits enable testing the executor with mock implementations.

use crate::llm::{LlmError, LlmMessage, LlmRequest, LlmService, Sampling};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Everything the backend needs to open a session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSetup {
    pub system_instruction: String,
    pub sampling: Sampling,
}

/// Factory for remote chat sessions
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Open a session; fails fast when the capability cannot be used at all
    async fn open_session(&self, setup: SessionSetup) -> Result<Arc<dyn RemoteSession>, LlmError>;
}

/// An open chat with the remote model
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// Send one user message and return the reply text
    async fn send_message(&self, text: &str) -> Result<String, LlmError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: ChatBackend + ?Sized> ChatBackend for Arc<T> {
    async fn open_session(&self, setup: SessionSetup) -> Result<Arc<dyn RemoteSession>, LlmError> {
        (**self).open_session(setup).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to open chat sessions on an `LlmService`
#[derive(Clone)]
pub struct LlmBackend {
    service: Arc<dyn LlmService>,
}

impl LlmBackend {
    pub fn new(service: Arc<dyn LlmService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ChatBackend for LlmBackend {
    async fn open_session(&self, setup: SessionSetup) -> Result<Arc<dyn RemoteSession>, LlmError> {
        self.service.ensure_credentials()?;
        tracing::info!(model = %self.service.model_id(), "Opened chat session");
        Ok(Arc::new(LlmChatSession {
            service: self.service.clone(),
            setup,
            history: Mutex::new(Vec::new()),
        }))
    }
}

/// Multi-turn chat that replays its history on every request
///
/// Only completed exchanges are recorded, so a failed send leaves the
/// remote history exactly as it was.
pub struct LlmChatSession {
    service: Arc<dyn LlmService>,
    setup: SessionSetup,
    history: Mutex<Vec<LlmMessage>>,
}

#[async_trait]
impl RemoteSession for LlmChatSession {
    async fn send_message(&self, text: &str) -> Result<String, LlmError> {
        let mut history = self.history.lock().await;

        let mut messages = history.clone();
        messages.push(LlmMessage::user(text));
        let request = LlmRequest {
            system: Some(self.setup.system_instruction.clone()),
            messages,
            sampling: self.setup.sampling,
        };

        let response = self.service.complete(&request).await?;
        history.push(LlmMessage::user(text));
        history.push(LlmMessage::model(response.text.clone()));
        Ok(response.text)
    }
}
