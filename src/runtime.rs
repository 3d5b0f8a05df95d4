//! Runtime for executing a chat session
//!
//! One runtime task per session. Writes go in as events over an mpsc
//! channel; reads come out as snapshots over a watch channel, so rendering
//! never waits on the remote call or the pacing timer.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;
pub use traits::*;

use crate::profile::SessionConfig;
use crate::state_machine::{ConvContext, ConvState, Event};
use crate::transcript::Turn;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Profile fields the view needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileView {
    pub user_name: String,
    pub partner_name: String,
    /// `data:` URL, absent when no avatar was captured
    pub partner_avatar: Option<String>,
}

impl From<&SessionConfig> for ProfileView {
    fn from(config: &SessionConfig) -> Self {
        Self {
            user_name: config.user_display_name.clone(),
            partner_name: config.partner_display_name.clone(),
            partner_avatar: config.partner_avatar.as_ref().map(|a| a.data_url()),
        }
    }
}

/// Everything a view renders from
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversationSnapshot {
    pub profile: Option<ProfileView>,
    pub turns: Vec<Turn>,
    pub pending: bool,
    pub last_error: Option<String>,
    pub state: ConvState,
}

/// The runtime has stopped and no longer accepts events
#[derive(Debug, Error)]
#[error("Session runtime has stopped")]
pub struct RuntimeStopped;

/// Handle to interact with a running session
#[derive(Clone)]
pub struct ConversationHandle {
    session_id: String,
    event_tx: mpsc::Sender<Event>,
    snapshot_rx: watch::Receiver<ConversationSnapshot>,
    shutdown: CancellationToken,
}

impl ConversationHandle {
    /// Spawn the runtime for `config` and start opening the remote session
    pub fn initialize<B>(config: SessionConfig, backend: B) -> Result<Self, RuntimeStopped>
    where
        B: ChatBackend + 'static,
    {
        let session_id = uuid::Uuid::new_v4().to_string();
        let (event_tx, event_rx) = mpsc::channel(32);
        let initial = ConversationSnapshot {
            profile: Some((&config).into()),
            ..ConversationSnapshot::default()
        };
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);
        let shutdown = CancellationToken::new();

        let runtime = SessionRuntime::new(
            ConvContext::new(&session_id),
            config,
            backend,
            event_rx,
            event_tx.downgrade(),
            snapshot_tx,
            shutdown.clone(),
        );

        let id = session_id.clone();
        tokio::spawn(async move {
            runtime.run().await;
            tracing::info!(session_id = %id, "Session runtime finished");
        });

        event_tx
            .try_send(Event::Initialize)
            .map_err(|_| RuntimeStopped)?;

        Ok(Self {
            session_id,
            event_tx,
            snapshot_rx,
            shutdown,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Queue a user message; blank or concurrent submissions are dropped by the runtime
    pub async fn submit(&self, text: impl Into<String>) -> Result<(), RuntimeStopped> {
        self.event_tx
            .send(Event::UserMessage { text: text.into() })
            .await
            .map_err(|_| RuntimeStopped)
    }

    /// Latest published state
    pub fn snapshot(&self) -> ConversationSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver that observes every future snapshot
    pub fn subscribe(&self) -> watch::Receiver<ConversationSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Tear the session down; pending timers are cancelled
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}
