//! Glue between the reveal engine and the chat.
//!
//! The engine lives in the main loop and its observers cannot borrow
//! `AppState`, so a [`MessageObserver`] forwards each callback onto the event
//! bus tagged with the message it belongs to. Progress travels as a byte
//! offset into the message content, which never changes once the message is
//! pushed.

use std::time::Duration;

use etab_core::reveal::{OwnerId, RevealEngine, RevealObserver, RevealRequest, SessionId};
use etab_core::scheduler::TokioTimers;
use etab_core::RevealError;
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;
use uuid::Uuid;

use crate::event::AppEvent;

/// The reveal engine as driven by the application.
pub type Engine = RevealEngine<TokioTimers<AppEvent>>;

pub fn new_engine(tx: UnboundedSender<AppEvent>) -> Engine {
    RevealEngine::new(TokioTimers::new(tx, AppEvent::RevealTick))
}

pub struct MessageObserver {
    message: Uuid,
    tx: UnboundedSender<AppEvent>,
}

impl MessageObserver {
    pub fn new(message: Uuid, tx: UnboundedSender<AppEvent>) -> Self {
        Self { message, tx }
    }
}

impl RevealObserver for MessageObserver {
    fn on_progress(&mut self, revealed: &str) {
        let _ = self.tx.send(AppEvent::RevealProgress {
            message: self.message,
            revealed: revealed.len(),
        });
    }

    fn on_complete(&mut self) {
        let _ = self.tx.send(AppEvent::RevealDone(self.message));
    }

    fn on_error(&mut self, error: &RevealError) {
        let _ = self.tx.send(AppEvent::RevealFailed {
            message: self.message,
            error: error.clone(),
        });
    }
}

/// Starts (or restarts) the reveal of one message.
///
/// With `streaming` off the whole content is shown immediately and the
/// finished session is released at once, since no completion event will
/// follow. Returns `None` when the engine rejects the request; the caller
/// then shows the content in full.
pub fn reveal_message(
    engine: &mut Engine,
    tx: &UnboundedSender<AppEvent>,
    owner: OwnerId,
    message: Uuid,
    content: &str,
    rate: Duration,
    streaming: bool,
) -> Option<SessionId> {
    let request = RevealRequest::new(content).rate(rate).streaming(streaming);
    match engine.start_for(owner, request, MessageObserver::new(message, tx.clone())) {
        Ok(id) => {
            if !streaming {
                engine.release_owner(owner);
            }
            Some(id)
        }
        Err(error) => {
            warn!(%message, %error, "could not start reveal");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[tokio::test(start_paused = true)]
    async fn streamed_reveal_arrives_as_progress_then_done() {
        let (tx, mut rx) = unbounded_channel();
        let mut engine = new_engine(tx.clone());
        let message = Uuid::new_v4();
        let rate = Duration::from_millis(5);
        reveal_message(&mut engine, &tx, OwnerId(1), message, "hé", rate, true).unwrap();

        let mut progress = Vec::new();
        loop {
            match rx.recv().await.unwrap() {
                AppEvent::RevealTick(timer) => {
                    engine.fire(timer);
                }
                AppEvent::RevealProgress { message: m, revealed } => {
                    assert_eq!(m, message);
                    progress.push(revealed);
                }
                AppEvent::RevealDone(m) => {
                    assert_eq!(m, message);
                    break;
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(progress, vec![1, 3]);
    }

    #[tokio::test]
    async fn non_streaming_reveal_is_one_progress_event() {
        let (tx, mut rx) = unbounded_channel();
        let mut engine = new_engine(tx.clone());
        let message = Uuid::new_v4();
        let rate = Duration::from_millis(5);
        reveal_message(&mut engine, &tx, OwnerId(1), message, "hello", rate, false).unwrap();

        assert!(matches!(
            rx.try_recv(),
            Ok(AppEvent::RevealProgress { revealed: 5, .. })
        ));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn non_streaming_reveal_leaves_no_session_behind() {
        let (tx, _rx) = unbounded_channel();
        let mut engine = new_engine(tx.clone());
        let rate = Duration::from_millis(5);
        for owner in 1..=3 {
            reveal_message(&mut engine, &tx, OwnerId(owner), Uuid::new_v4(), "reply", rate, false).unwrap();
        }
        for owner in 1..=3 {
            assert!(engine.session_for(OwnerId(owner)).is_none());
        }

        reveal_message(&mut engine, &tx, OwnerId(4), Uuid::new_v4(), "reply", rate, true).unwrap();
        assert!(engine.session_for(OwnerId(4)).is_some());
    }

    #[tokio::test]
    async fn zero_rate_is_rejected() {
        let (tx, _rx) = unbounded_channel();
        let mut engine = new_engine(tx.clone());
        let started = reveal_message(&mut engine, &tx, OwnerId(1), Uuid::new_v4(), "x", Duration::ZERO, true);
        assert_eq!(started, None);
    }
}
