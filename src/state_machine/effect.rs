//! Effects produced by state transitions

use crate::transcript::Speaker;
use std::time::Duration;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Ask the backend for a remote session
    OpenSession,

    /// Append a turn to the transcript
    AppendTurn { speaker: Speaker, text: String },

    /// Send the user's text through the remote session (background task)
    RequestReply { text: String },

    /// Fire `PacingElapsed` after `delay`
    SchedulePacing { delay: Duration },

    /// Publish a fresh snapshot to readers
    PublishState,
}

impl Effect {
    pub fn append_user_turn(text: impl Into<String>) -> Self {
        Effect::AppendTurn {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn append_partner_turn(text: impl Into<String>) -> Self {
        Effect::AppendTurn {
            speaker: Speaker::Partner,
            text: text.into(),
        }
    }
}
