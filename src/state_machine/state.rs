//! Conversation state types

use crate::llm::LlmErrorKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a failure should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or placeholder credential; needs reconfiguration and a restart
    Config,
    /// The remote call failed; the user may resubmit
    Connection,
}

impl From<LlmErrorKind> for ErrorKind {
    fn from(kind: LlmErrorKind) -> Self {
        match kind {
            LlmErrorKind::Config => ErrorKind::Config,
            _ => ErrorKind::Connection,
        }
    }
}

/// Session state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConvState {
    /// No remote session yet
    #[default]
    Uninitialized,

    /// Remote session being opened
    Initializing,

    /// Accepting user input
    Ready {
        /// Failure of the previous exchange, cleared by the next submit
        #[serde(default, skip_serializing_if = "Option::is_none")]
        last_error: Option<String>,
    },

    /// Request in flight
    AwaitingReply,

    /// Reply received, held back until the pacing delay elapses
    Typing {
        /// Never published; the text only becomes visible as a partner turn
        #[serde(skip)]
        reply: String,
    },

    /// Initialization failed - terminal for this session
    Failed {
        message: String,
        error_kind: ErrorKind,
    },
}

impl ConvState {
    /// Ready with no error recorded
    pub fn ready() -> Self {
        ConvState::Ready { last_error: None }
    }

    /// A reply is outstanding (request in flight or pacing)
    pub fn is_pending(&self) -> bool {
        matches!(self, ConvState::AwaitingReply | ConvState::Typing { .. })
    }

    /// Cannot transition out
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConvState::Failed { .. })
    }

    /// Human-readable error to show, if any
    pub fn last_error(&self) -> Option<&str> {
        match self {
            ConvState::Ready { last_error } => last_error.as_deref(),
            ConvState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            ConvState::Uninitialized => "uninitialized",
            ConvState::Initializing => "initializing",
            ConvState::Ready { .. } => "ready",
            ConvState::AwaitingReply => "awaiting_reply",
            ConvState::Typing { .. } => "typing",
            ConvState::Failed { .. } => "failed",
        }
    }
}

/// Artificial "typing" delay before a reply appears
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    pub per_char: Duration,
    pub min: Duration,
    pub max: Duration,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            per_char: Duration::from_millis(20),
            min: Duration::from_millis(1000),
            max: Duration::from_millis(3000),
        }
    }
}

impl PacingPolicy {
    /// Delay for a reply; monotonic in length and clamped to `[min, max]`
    pub fn delay_for(&self, reply: &str) -> Duration {
        let chars = u32::try_from(reply.chars().count()).unwrap_or(u32::MAX);
        self.per_char
            .checked_mul(chars)
            .unwrap_or(self.max)
            .clamp(self.min, self.max)
    }
}

/// Context for a session (immutable configuration)
#[derive(Debug, Clone)]
pub struct ConvContext {
    pub session_id: String,
    pub pacing: PacingPolicy,
}

impl ConvContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            pacing: PacingPolicy::default(),
        }
    }
}
