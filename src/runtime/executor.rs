//! Session runtime executor

use super::traits::{ChatBackend, RemoteSession, SessionSetup};
use super::ConversationSnapshot;
use crate::llm::Sampling;
use crate::persona::build_persona_instruction;
use crate::profile::SessionConfig;
use crate::state_machine::{transition, ConvContext, ConvState, Effect, ErrorKind, Event};
use crate::transcript::Transcript;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Session runtime, generic over the generation backend
///
/// Owns the state, the transcript and the remote session. Everything else
/// talks to it through events and reads it through snapshots.
pub struct SessionRuntime<B>
where
    B: ChatBackend + 'static,
{
    context: ConvContext,
    config: SessionConfig,
    state: ConvState,
    transcript: Transcript,
    backend: B,
    /// Present once the backend opened a session
    session: Option<Arc<dyn RemoteSession>>,
    event_rx: mpsc::Receiver<Event>,
    /// Weak so that dropping every handle stops the runtime
    event_tx: mpsc::WeakSender<Event>,
    snapshot_tx: watch::Sender<ConversationSnapshot>,
    /// Cancelled on teardown; pending timers give up instead of firing
    shutdown: CancellationToken,
}

impl<B> SessionRuntime<B>
where
    B: ChatBackend + 'static,
{
    pub fn new(
        context: ConvContext,
        config: SessionConfig,
        backend: B,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::WeakSender<Event>,
        snapshot_tx: watch::Sender<ConversationSnapshot>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            context,
            config,
            state: ConvState::default(),
            transcript: Transcript::new(),
            backend,
            session: None,
            event_rx,
            event_tx,
            snapshot_tx,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(session_id = %self.context.session_id, "Starting session runtime");

        loop {
            tokio::select! {
                biased;

                () = self.shutdown.cancelled() => break,

                event = self.event_rx.recv() => match event {
                    Some(event) => self.process_event(event).await,
                    None => break,
                },
            }
        }

        // Stop any pacing timer still sleeping
        self.shutdown.cancel();
        tracing::info!(
            session_id = %self.context.session_id,
            turns = self.transcript.turns().len(),
            "Session runtime stopped"
        );
    }

    async fn process_event(&mut self, event: Event) {
        // Effects may produce follow-up events synchronously (session opening)
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let result = match transition(&self.state, &self.context, current_event) {
                Ok(r) => r,
                Err(e) if e.is_validation() => {
                    tracing::debug!(state = self.state.name(), reason = %e, "Event rejected");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(state = self.state.name(), error = %e, "Unexpected event");
                    continue;
                }
            };

            let old_state = std::mem::replace(&mut self.state, result.new_state);
            tracing::debug!(
                session_id = %self.context.session_id,
                from = old_state.name(),
                to = self.state.name(),
                "State transition"
            );

            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect).await {
                    events_to_process.push(generated_event);
                }
            }
        }
    }

    /// Execute an effect and optionally return a generated event
    async fn execute_effect(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::OpenSession => {
                let setup = SessionSetup {
                    system_instruction: build_persona_instruction(&self.config),
                    sampling: Sampling::default(),
                };
                let opened = tokio::select! {
                    biased;

                    () = self.shutdown.cancelled() => {
                        tracing::debug!("Session open abandoned on shutdown");
                        return None;
                    }
                    result = self.backend.open_session(setup) => result,
                };
                match opened {
                    Ok(session) => {
                        self.session = Some(session);
                        Some(Event::SessionOpened)
                    }
                    Err(e) => {
                        tracing::error!(error = %e.message, kind = ?e.kind, "Failed to open session");
                        Some(Event::SessionFailed {
                            message: e.message,
                            error_kind: e.kind.into(),
                        })
                    }
                }
            }

            Effect::AppendTurn { speaker, text } => {
                let turn = self.transcript.append(speaker, text);
                tracing::info!(
                    session_id = %self.context.session_id,
                    turn_id = %turn.id,
                    speaker = %speaker,
                    chars = turn.text.chars().count(),
                    "Turn appended"
                );
                None
            }

            Effect::PublishState => {
                self.snapshot_tx.send_replace(self.snapshot());
                None
            }

            Effect::RequestReply { text } => {
                let Some(session) = self.session.clone() else {
                    // Ready is unreachable without a session
                    return Some(Event::ReplyFailed {
                        message: "No remote session".to_string(),
                        error_kind: ErrorKind::Connection,
                    });
                };
                let event_tx = self.event_tx.clone();

                tokio::spawn(async move {
                    tracing::info!("Requesting reply (background)");
                    let event = match session.send_message(&text).await {
                        Ok(reply) => Event::ReplyReceived { text: reply },
                        Err(e) => {
                            tracing::warn!(error = %e.message, kind = ?e.kind, "Reply failed");
                            Event::ReplyFailed {
                                message: e.message,
                                error_kind: e.kind.into(),
                            }
                        }
                    };
                    send_event(&event_tx, event).await;
                });

                // The event will come from the spawned task
                None
            }

            Effect::SchedulePacing { delay } => {
                self.schedule_pacing(delay);
                None
            }
        }
    }

    fn schedule_pacing(&self, delay: Duration) {
        let event_tx = self.event_tx.clone();
        let shutdown = self.shutdown.clone();
        tracing::debug!(delay_ms = %delay.as_millis(), "Pacing reply");

        tokio::spawn(async move {
            tokio::select! {
                () = shutdown.cancelled() => {
                    tracing::debug!("Pacing timer dropped on shutdown");
                }
                () = tokio::time::sleep(delay) => {
                    send_event(&event_tx, Event::PacingElapsed).await;
                }
            }
        });
    }

    fn snapshot(&self) -> ConversationSnapshot {
        ConversationSnapshot {
            profile: Some((&self.config).into()),
            turns: self.transcript.turns().to_vec(),
            pending: self.state.is_pending(),
            last_error: self.state.last_error().map(str::to_string),
            state: self.state.clone(),
        }
    }
}

/// Deliver an event if the runtime is still alive
async fn send_event(event_tx: &mpsc::WeakSender<Event>, event: Event) {
    match event_tx.upgrade() {
        Some(tx) => {
            if tx.send(event).await.is_err() {
                tracing::debug!("Runtime gone, event dropped");
            }
        }
        None => tracing::debug!("Runtime gone, event dropped"),
    }
}
