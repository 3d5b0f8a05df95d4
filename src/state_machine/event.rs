//! Events that can occur in a session

use super::state::ErrorKind;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // Lifecycle events
    Initialize,
    SessionOpened,
    SessionFailed {
        message: String,
        error_kind: ErrorKind,
    },

    // User events
    UserMessage {
        text: String,
    },

    // Remote events
    ReplyReceived {
        text: String,
    },
    ReplyFailed {
        message: String,
        error_kind: ErrorKind,
    },

    // Timer events
    PacingElapsed,
}
