//! Event bus for etab.
//!
//! All user input, timer ticks, reveal progress and simulated background work
//! (assistant replies, terminal commands) are normalised into a single
//! `AppEvent` enum and sent over a tokio unbounded MPSC channel. The main loop
//! receives from this channel and dispatches accordingly.
//!
//! Two independent intervals drive the render and animation cycles:
//! - **Render interval** (33 ms ≈ 30 FPS) triggers a `terminal.draw()` call.
//! - **Tick interval** (250 ms) advances the "thinking" indicator.
//!
//! Reveal ticks do not use these intervals. Each reveal timer is its own
//! `tokio::time::sleep` task armed by `TokioTimers`, which posts
//! [`AppEvent::RevealTick`] when it elapses.

use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind, MouseEvent};
use etab_core::responder::AssistantReply;
use etab_core::scheduler::TimerId;
use etab_core::terminal::CommandOutcome;
use etab_core::RevealError;
use futures::{FutureExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;
use uuid::Uuid;

/// All events the application can receive from any source.
#[derive(Debug)]
#[non_exhaustive]
pub enum AppEvent {
    /// A key press from the terminal (`KeyEventKind::Press` only).
    Key(KeyEvent),
    /// A mouse event from the terminal (click, scroll, move).
    Mouse(MouseEvent),
    /// Terminal was resized to (columns, rows).
    Resize(u16, u16),
    /// Animation tick (4 Hz / 250 ms).
    Tick,
    /// Render tick: triggers a `terminal.draw()` call (≈30 FPS / 33 ms).
    Render,
    /// A reveal timer elapsed; hand it to `RevealEngine::fire`.
    RevealTick(TimerId),
    /// The visible prefix of `message` grew to `revealed` bytes.
    RevealProgress { message: Uuid, revealed: usize },
    /// `message` is fully revealed.
    RevealDone(Uuid),
    /// Ticking `message` failed; the reveal was cancelled.
    RevealFailed { message: Uuid, error: RevealError },
    /// The simulated reply delay elapsed.
    ReplyReady(Box<AssistantReply>),
    /// A terminal command finished after its simulated latency.
    CommandFinished(CommandOutcome),
}

/// Holds the sender and receiver ends of the unified event channel.
///
/// The sender (`tx`) is cloned and distributed to background tasks, reveal
/// observers and the reveal scheduler; the receiver (`rx`) is owned by the
/// main event loop.
pub struct EventHandler {
    pub tx: mpsc::UnboundedSender<AppEvent>,
    pub rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the background tokio task that feeds terminal input and the render
/// and animation intervals into the event channel.
///
/// - `reader.next().fuse()` keeps `tokio::select!` from polling a finished
///   crossterm stream.
/// - Only `KeyEventKind::Press` is forwarded; Windows also reports releases.
/// - The task exits once the receiver is gone.
pub fn spawn_event_task(tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut tick_interval = interval(Duration::from_millis(250));
        let mut render_interval = interval(Duration::from_millis(33));
        let mut reader = EventStream::new();

        loop {
            let tick_tick = tick_interval.tick();
            let render_tick = render_interval.tick();
            let crossterm_event = reader.next().fuse();

            let sent = tokio::select! {
                _ = tick_tick => tx.send(AppEvent::Tick),
                _ = render_tick => tx.send(AppEvent::Render),
                maybe_event = crossterm_event => match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        tx.send(AppEvent::Key(key))
                    }
                    Some(Ok(Event::Resize(w, h))) => tx.send(AppEvent::Resize(w, h)),
                    Some(Ok(Event::Mouse(mouse))) => tx.send(AppEvent::Mouse(mouse)),
                    _ => Ok(()),
                },
            };
            if sent.is_err() {
                break;
            }
        }
    });
}

/// Posts `event` after `delay`. Used for the simulated reply and command
/// latencies.
pub fn send_after(tx: &mpsc::UnboundedSender<AppEvent>, delay: Duration, event: AppEvent) {
    let tx = tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = tx.send(event);
    });
}
