//! Mock implementations for testing
//!
//! These mocks enable runtime tests without real I/O.

use super::traits::{ChatBackend, RemoteSession, SessionSetup};
use crate::llm::LlmError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct MockState {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    open_error: Mutex<Option<LlmError>>,
    setups: Mutex<Vec<SessionSetup>>,
    requests: Mutex<Vec<String>>,
    delay: Option<Duration>,
    open_delay: Option<Duration>,
}

/// Mock backend that returns queued replies
///
/// Clones share state, so a test can keep one clone for inspection while
/// the runtime owns another.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<MockState>,
}

#[allow(dead_code)]
impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request takes `delay` before answering
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            state: Arc::new(MockState {
                delay: Some(delay),
                ..MockState::default()
            }),
        }
    }

    /// Opening a session takes `delay`
    pub fn with_open_delay(delay: Duration) -> Self {
        Self {
            state: Arc::new(MockState {
                open_delay: Some(delay),
                ..MockState::default()
            }),
        }
    }

    /// Queue a successful reply
    pub fn queue_reply(&self, text: impl Into<String>) {
        self.state.replies.lock().unwrap().push_back(Ok(text.into()));
    }

    /// Queue a failed exchange
    pub fn queue_error(&self, error: LlmError) {
        self.state.replies.lock().unwrap().push_back(Err(error));
    }

    /// Make `open_session` fail
    pub fn fail_open(&self, error: LlmError) {
        *self.state.open_error.lock().unwrap() = Some(error);
    }

    /// Texts sent to the remote session, in order
    pub fn recorded_requests(&self) -> Vec<String> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Setups passed to `open_session`
    pub fn recorded_setups(&self) -> Vec<SessionSetup> {
        self.state.setups.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn open_session(&self, setup: SessionSetup) -> Result<Arc<dyn RemoteSession>, LlmError> {
        self.state.setups.lock().unwrap().push(setup);
        if let Some(delay) = self.state.open_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.state.open_error.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(Arc::new(MockSession {
            state: self.state.clone(),
        }))
    }
}

struct MockSession {
    state: Arc<MockState>,
}

#[async_trait]
impl RemoteSession for MockSession {
    async fn send_message(&self, text: &str) -> Result<String, LlmError> {
        self.state.requests.lock().unwrap().push(text.to_string());
        if let Some(delay) = self.state.delay {
            tokio::time::sleep(delay).await;
        }
        self.state
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock reply queued")))
    }
}
