//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::state::*;
use super::transition::*;
use super::*;
use crate::transcript::Speaker;
use proptest::prelude::*;
use std::time::Duration;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> ConvContext {
    ConvContext::new("test-session")
}

/// Drive the machine, applying `AppendTurn` effects to a plain list
struct Harness {
    state: ConvState,
    turns: Vec<(Speaker, String)>,
    outstanding_requests: usize,
}

impl Harness {
    fn ready() -> Self {
        Self {
            state: ConvState::ready(),
            turns: vec![],
            outstanding_requests: 0,
        }
    }

    fn apply(&mut self, event: Event) -> Result<(), TransitionError> {
        let settles_request = matches!(
            (&self.state, &event),
            (
                ConvState::AwaitingReply,
                Event::ReplyReceived { .. } | Event::ReplyFailed { .. }
            )
        );
        let result = transition(&self.state, &test_context(), event)?;
        if settles_request {
            self.outstanding_requests -= 1;
        }
        for effect in result.effects {
            match effect {
                Effect::AppendTurn { speaker, text } => self.turns.push((speaker, text)),
                Effect::RequestReply { .. } => self.outstanding_requests += 1,
                _ => {}
            }
        }
        self.state = result.new_state;
        Ok(())
    }
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z ]{1,40}".prop_filter("non-blank", |s| !s.trim().is_empty())
}

fn arb_whitespace() -> impl Strategy<Value = String> {
    "[ \t\n]{0,10}"
}

fn arb_error_kind() -> impl Strategy<Value = ErrorKind> {
    prop_oneof![Just(ErrorKind::Config), Just(ErrorKind::Connection)]
}

fn arb_state() -> impl Strategy<Value = ConvState> {
    prop_oneof![
        Just(ConvState::Uninitialized),
        Just(ConvState::Initializing),
        proptest::option::of("[a-z ]{1,20}").prop_map(|last_error| ConvState::Ready { last_error }),
        Just(ConvState::AwaitingReply),
        arb_text().prop_map(|reply| ConvState::Typing { reply }),
        ("[a-z ]{1,20}", arb_error_kind())
            .prop_map(|(message, error_kind)| ConvState::Failed { message, error_kind }),
    ]
}

fn arb_pending_state() -> impl Strategy<Value = ConvState> {
    prop_oneof![
        Just(ConvState::AwaitingReply),
        arb_text().prop_map(|reply| ConvState::Typing { reply }),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(Event::Initialize),
        Just(Event::SessionOpened),
        ("[a-z ]{1,20}", arb_error_kind())
            .prop_map(|(message, error_kind)| Event::SessionFailed { message, error_kind }),
        arb_text().prop_map(|text| Event::UserMessage { text }),
        arb_whitespace().prop_map(|text| Event::UserMessage { text }),
        arb_text().prop_map(|text| Event::ReplyReceived { text }),
        ("[a-z ]{1,20}", arb_error_kind())
            .prop_map(|(message, error_kind)| Event::ReplyFailed { message, error_kind }),
        Just(Event::PacingElapsed),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_user_message_rejected_while_pending(state in arb_pending_state(), text in arb_text()) {
        let result = transition(&state, &test_context(), Event::UserMessage { text });
        prop_assert_eq!(result.unwrap_err(), TransitionError::ReplyPending);
    }

    #[test]
    fn prop_blank_message_rejected_in_every_state(state in arb_state(), text in arb_whitespace()) {
        let result = transition(&state, &test_context(), Event::UserMessage { text });
        prop_assert_eq!(result.unwrap_err(), TransitionError::EmptyMessage);
    }

    #[test]
    fn prop_failed_is_terminal(
        (message, error_kind) in ("[a-z ]{1,20}", arb_error_kind()),
        event in arb_event(),
    ) {
        let state = ConvState::Failed { message, error_kind };
        prop_assert!(transition(&state, &test_context(), event).is_err());
    }

    #[test]
    fn prop_each_exchange_adds_user_then_partner(
        exchanges in proptest::collection::vec((arb_text(), arb_text()), 1..10),
    ) {
        let mut harness = Harness::ready();
        for (i, (prompt, reply)) in exchanges.iter().enumerate() {
            harness.apply(Event::UserMessage { text: prompt.clone() }).unwrap();
            prop_assert_eq!(harness.turns.len(), 2 * i + 1);
            harness.apply(Event::ReplyReceived { text: reply.clone() }).unwrap();
            prop_assert_eq!(harness.turns.len(), 2 * i + 1);
            harness.apply(Event::PacingElapsed).unwrap();

            prop_assert_eq!(harness.turns.len(), 2 * (i + 1));
            prop_assert_eq!(&harness.turns[2 * i], &(Speaker::User, prompt.clone()));
            prop_assert_eq!(&harness.turns[2 * i + 1], &(Speaker::Partner, reply.clone()));
            prop_assert!(!harness.state.is_pending());
        }
    }

    #[test]
    fn prop_at_most_one_outstanding_request(
        events in proptest::collection::vec(arb_event(), 0..40),
    ) {
        let mut harness = Harness::ready();
        for event in events {
            let before = harness.turns.len();
            let state_before = harness.state.clone();
            match harness.apply(event) {
                Ok(()) => {
                    prop_assert!(harness.outstanding_requests <= 1);
                    prop_assert_eq!(harness.outstanding_requests == 1, harness.state == ConvState::AwaitingReply);
                }
                Err(_) => {
                    // Rejected events leave everything untouched
                    prop_assert_eq!(harness.turns.len(), before);
                    prop_assert_eq!(&harness.state, &state_before);
                }
            }
        }
    }

    #[test]
    fn prop_failed_reply_keeps_turns_and_clears_pending(
        prompt in arb_text(),
        (message, error_kind) in ("[a-z ]{1,20}", arb_error_kind()),
    ) {
        let mut harness = Harness::ready();
        harness.apply(Event::UserMessage { text: prompt.clone() }).unwrap();
        harness.apply(Event::ReplyFailed { message, error_kind }).unwrap();

        prop_assert_eq!(harness.turns, vec![(Speaker::User, prompt)]);
        prop_assert!(!harness.state.is_pending());
        prop_assert!(harness.state.last_error().is_some_and(|e| !e.is_empty()));
    }

    #[test]
    fn prop_pacing_is_monotonic_and_bounded(a in 0usize..500, b in 0usize..500) {
        let pacing = PacingPolicy::default();
        let (short, long) = if a <= b { (a, b) } else { (b, a) };
        let d_short = pacing.delay_for(&"x".repeat(short));
        let d_long = pacing.delay_for(&"x".repeat(long));

        prop_assert!(d_short <= d_long);
        prop_assert!(d_short >= Duration::from_millis(1000));
        prop_assert!(d_long <= Duration::from_millis(3000));
    }
}
