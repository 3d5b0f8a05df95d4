//! Pure state transition function
//!
//! Given the same state, context and event this always produces the same
//! result; all I/O happens in the runtime that executes the effects.

use super::{ConvContext, ConvState, Effect, ErrorKind, Event};
use thiserror::Error;

/// Shown when the remote session could not be opened
pub const INIT_FAILURE_MESSAGE: &str = "I can't seem to reach you... Try refreshing?";

/// Shown when an exchange fails; the user can simply send again
pub const SEND_FAILURE_MESSAGE: &str =
    "Sorry love, I lost my connection for a moment. Can you repeat that?";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Reasons an event is rejected; the state is left unchanged
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Message is empty")]
    EmptyMessage,
    #[error("Still waiting for the previous reply")]
    ReplyPending,
    #[error("Session is not ready")]
    NotReady,
    #[error("Session already initialized")]
    AlreadyInitialized,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

impl TransitionError {
    /// Expected rejections from normal use, as opposed to protocol bugs
    pub fn is_validation(&self) -> bool {
        !matches!(self, TransitionError::InvalidTransition(_))
    }
}

/// Pure transition function
pub fn transition(
    state: &ConvState,
    context: &ConvContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Initialization
        // ============================================================
        (ConvState::Uninitialized, Event::Initialize) => {
            Ok(TransitionResult::new(ConvState::Initializing)
                .with_effect(Effect::PublishState)
                .with_effect(Effect::OpenSession))
        }

        (_, Event::Initialize) => Err(TransitionError::AlreadyInitialized),

        (ConvState::Initializing, Event::SessionOpened) => {
            Ok(TransitionResult::new(ConvState::ready()).with_effect(Effect::PublishState))
        }

        (ConvState::Initializing, Event::SessionFailed { message, error_kind }) => {
            Ok(TransitionResult::new(ConvState::Failed {
                message: user_facing_message(error_kind, message, INIT_FAILURE_MESSAGE),
                error_kind,
            })
            .with_effect(Effect::PublishState))
        }

        // ============================================================
        // User Message Handling
        // ============================================================
        (_, Event::UserMessage { text }) if text.trim().is_empty() => {
            Err(TransitionError::EmptyMessage)
        }

        // Ready + UserMessage -> AwaitingReply; turn is visible before the request starts
        (ConvState::Ready { .. }, Event::UserMessage { text }) => {
            Ok(TransitionResult::new(ConvState::AwaitingReply)
                .with_effect(Effect::append_user_turn(text.clone()))
                .with_effect(Effect::PublishState)
                .with_effect(Effect::RequestReply { text }))
        }

        (ConvState::AwaitingReply | ConvState::Typing { .. }, Event::UserMessage { .. }) => {
            Err(TransitionError::ReplyPending)
        }

        (
            ConvState::Uninitialized | ConvState::Initializing | ConvState::Failed { .. },
            Event::UserMessage { .. },
        ) => Err(TransitionError::NotReady),

        // ============================================================
        // Reply Processing
        // ============================================================
        (ConvState::AwaitingReply, Event::ReplyReceived { text }) => {
            let delay = context.pacing.delay_for(&text);
            Ok(TransitionResult::new(ConvState::Typing { reply: text })
                .with_effect(Effect::PublishState)
                .with_effect(Effect::SchedulePacing { delay }))
        }

        // The user's turn stays; only the error is recorded
        (ConvState::AwaitingReply, Event::ReplyFailed { message, error_kind }) => {
            Ok(TransitionResult::new(ConvState::Ready {
                last_error: Some(user_facing_message(error_kind, message, SEND_FAILURE_MESSAGE)),
            })
            .with_effect(Effect::PublishState))
        }

        (ConvState::Typing { reply }, Event::PacingElapsed) => {
            Ok(TransitionResult::new(ConvState::ready())
                .with_effect(Effect::append_partner_turn(reply.clone()))
                .with_effect(Effect::PublishState))
        }

        // ============================================================
        // Invalid Transitions
        // ============================================================
        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {} with event {event:?}",
            state.name()
        ))),
    }
}

/// Config problems keep their own text (it says what to fix); anything else
/// gets the friendly in-character fallback.
fn user_facing_message(error_kind: ErrorKind, raw: String, fallback: &str) -> String {
    match error_kind {
        ErrorKind::Config => raw,
        ErrorKind::Connection => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Speaker;
    use std::time::Duration;

    fn test_context() -> ConvContext {
        ConvContext::new("test-session")
    }

    fn user_message(text: &str) -> Event {
        Event::UserMessage {
            text: text.to_string(),
        }
    }

    #[test]
    fn test_initialize_opens_session() {
        let result = transition(&ConvState::Uninitialized, &test_context(), Event::Initialize).unwrap();

        assert_eq!(result.new_state, ConvState::Initializing);
        assert!(result.effects.contains(&Effect::OpenSession));
    }

    #[test]
    fn test_initialize_runs_once() {
        for state in [ConvState::Initializing, ConvState::ready(), ConvState::AwaitingReply] {
            let result = transition(&state, &test_context(), Event::Initialize);
            assert!(matches!(result, Err(TransitionError::AlreadyInitialized)));
        }
    }

    #[test]
    fn test_config_failure_keeps_actionable_message() {
        let result = transition(
            &ConvState::Initializing,
            &test_context(),
            Event::SessionFailed {
                message: "GEMINI_API_KEY is not configured".to_string(),
                error_kind: ErrorKind::Config,
            },
        )
        .unwrap();

        assert!(result.new_state.is_terminal());
        assert_eq!(
            result.new_state.last_error(),
            Some("GEMINI_API_KEY is not configured")
        );
    }

    #[test]
    fn test_connection_failure_during_init_uses_fallback() {
        let result = transition(
            &ConvState::Initializing,
            &test_context(),
            Event::SessionFailed {
                message: "connect refused".to_string(),
                error_kind: ErrorKind::Connection,
            },
        )
        .unwrap();

        assert_eq!(result.new_state.last_error(), Some(INIT_FAILURE_MESSAGE));
    }

    #[test]
    fn test_ready_to_awaiting_reply() {
        let state = ConvState::Ready {
            last_error: Some("old".to_string()),
        };
        let result = transition(&state, &test_context(), user_message("hi")).unwrap();

        assert_eq!(result.new_state, ConvState::AwaitingReply);
        assert_eq!(result.new_state.last_error(), None);
        assert_eq!(
            result.effects,
            vec![
                Effect::AppendTurn {
                    speaker: Speaker::User,
                    text: "hi".to_string()
                },
                Effect::PublishState,
                Effect::RequestReply {
                    text: "hi".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_whitespace_rejected_everywhere() {
        for state in [ConvState::ready(), ConvState::AwaitingReply, ConvState::Uninitialized] {
            let result = transition(&state, &test_context(), user_message("  \n\t"));
            assert_eq!(result.unwrap_err(), TransitionError::EmptyMessage);
        }
    }

    #[test]
    fn test_reject_message_while_pending() {
        let result = transition(&ConvState::AwaitingReply, &test_context(), user_message("world"));
        assert_eq!(result.unwrap_err(), TransitionError::ReplyPending);

        let typing = ConvState::Typing {
            reply: "hi love".to_string(),
        };
        let result = transition(&typing, &test_context(), user_message("world"));
        assert_eq!(result.unwrap_err(), TransitionError::ReplyPending);
    }

    #[test]
    fn test_reject_message_before_ready() {
        let failed = ConvState::Failed {
            message: "no key".to_string(),
            error_kind: ErrorKind::Config,
        };
        for state in [ConvState::Uninitialized, ConvState::Initializing, failed] {
            let result = transition(&state, &test_context(), user_message("hi"));
            assert_eq!(result.unwrap_err(), TransitionError::NotReady);
        }
    }

    #[test]
    fn test_reply_schedules_pacing() {
        let result = transition(
            &ConvState::AwaitingReply,
            &test_context(),
            Event::ReplyReceived {
                text: "hi love".to_string(),
            },
        )
        .unwrap();

        assert!(result.new_state.is_pending());
        assert!(result.effects.contains(&Effect::SchedulePacing {
            delay: Duration::from_millis(1000)
        }));
        // Partner turn waits for the delay
        assert!(!result
            .effects
            .iter()
            .any(|e| matches!(e, Effect::AppendTurn { .. })));
    }

    #[test]
    fn test_pacing_elapsed_appends_partner_turn() {
        let result = transition(
            &ConvState::Typing {
                reply: "hi love".to_string(),
            },
            &test_context(),
            Event::PacingElapsed,
        )
        .unwrap();

        assert_eq!(result.new_state, ConvState::ready());
        assert_eq!(result.effects[0], Effect::append_partner_turn("hi love"));
    }

    #[test]
    fn test_reply_failure_records_error() {
        let result = transition(
            &ConvState::AwaitingReply,
            &test_context(),
            Event::ReplyFailed {
                message: "503".to_string(),
                error_kind: ErrorKind::Connection,
            },
        )
        .unwrap();

        assert!(!result.new_state.is_pending());
        assert_eq!(result.new_state.last_error(), Some(SEND_FAILURE_MESSAGE));
        assert_eq!(result.effects, vec![Effect::PublishState]);
    }

    #[test]
    fn test_stale_timer_is_invalid() {
        let result = transition(&ConvState::ready(), &test_context(), Event::PacingElapsed);
        let err = result.unwrap_err();
        assert!(!err.is_validation());
    }
}
