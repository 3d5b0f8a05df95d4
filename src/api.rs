//! HTTP API for the companion chat

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::runtime::{ChatBackend, ConversationHandle};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Set once by the profile form
    pub session: Arc<RwLock<Option<ConversationHandle>>>,
    pub backend: Arc<dyn ChatBackend>,
}

impl AppState {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            session: Arc::new(RwLock::new(None)),
            backend,
        }
    }

    /// Handle of the active session, if setup has completed
    pub async fn current(&self) -> Option<ConversationHandle> {
        self.session.read().await.clone()
    }
}
