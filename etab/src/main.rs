//! etab: a terminal chat with a simulated AI coding assistant.
//!
//! Entry point for the `etab` binary. Wires together the terminal lifecycle
//! (`tui`), the unified event bus (`event`), the reveal engine (`stream`),
//! rendering (`ui`), configuration (`config`, `theme`) and the system
//! clipboard (`clipboard`).
//!
//! # Startup sequence
//!
//! 1. File logging, then config. Both are safe before terminal init.
//! 2. `install_panic_hook()` so a panic restores the terminal first.
//! 3. `register_sigterm()`, polled in the event loop.
//! 4. `init_tui()` enters the alternate screen and raw mode.
//! 5. Event channel, `spawn_event_task()` and the reveal engine.
//! 6. The welcome message is pushed and shown.
//!
//! `restore_tui()` runs after the event loop exits, whatever the reason. The
//! `?` operator is only used before `init_tui()`; a failed draw breaks out of
//! the loop and is returned after the terminal is restored.

mod app;
mod clipboard;
mod config;
mod event;
mod stream;
mod theme;
mod tui;
mod ui;

use std::sync::atomic::Ordering;
use std::sync::Mutex;
use std::time::Duration;

use etab_core::reveal::RevealState;
use etab_core::responder::compose_reply;
use etab_core::terminal::{run_command, MAX_LATENCY, MIN_LATENCY};
use rand::Rng;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use app::AppState;
use event::{send_after, AppEvent};
use stream::{reveal_message, Engine};
use theme::{Appearance, Theme};
use ui::keybindings::{handle_key, handle_mouse, KeyAction};

/// Logs to `<state dir>/etab.log`; stderr belongs to the TUI. The filter is
/// read from `ETAB_LOG` and defaults to `warn`.
fn init_logging() -> std::io::Result<()> {
    let dir = config::state_dir();
    std::fs::create_dir_all(&dir)?;
    let file = std::fs::File::create(dir.join("etab.log"))?;

    let filter = EnvFilter::try_from_env("ETAB_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    if let Err(error) = init_logging() {
        eprintln!("etab: logging disabled: {error}");
    }
    let config = config::load();
    let appearance = Appearance::detect(|key| std::env::var(key).ok());
    let mut state = AppState::new(&config, appearance);
    info!(model = %state.model.id(), appearance = appearance.label(), "starting etab");

    tui::install_panic_hook();
    let term_flag = tui::register_sigterm()?;
    let mut terminal = tui::init_tui()?;

    let handler = event::EventHandler::new();
    event::spawn_event_task(handler.tx.clone());
    let tx = handler.tx;
    let mut rx = handler.rx;
    let mut engine = stream::new_engine(tx.clone());

    let (welcome, owner) = state.push_welcome();
    let content = state.message(welcome).map(|m| m.content.clone()).unwrap_or_default();
    if reveal_message(&mut engine, &tx, owner, welcome, &content, state.reveal_rate, false).is_none() {
        state.finish_reveal(welcome);
    }

    // Exits only via `break`, never via `?`, so `restore_tui()` is always
    // reached after the loop.
    let mut draw_error = None;
    'event_loop: loop {
        tokio::select! {
            // Heartbeat: SIGTERM is checked at least every 50ms even when no
            // other event arrives.
            _ = tokio::time::sleep(Duration::from_millis(50)) => {}
            maybe_event = rx.recv() => {
                let Some(event) = maybe_event else {
                    break 'event_loop;
                };
                match event {
                    AppEvent::Render => {
                        let theme = Theme::for_appearance(state.appearance());
                        if let Err(error) = terminal.draw(|frame| ui::render(frame, &mut state, &theme)) {
                            draw_error = Some(error);
                            break 'event_loop;
                        }
                    }
                    AppEvent::Key(key) => {
                        let action = handle_key(key, &mut state);
                        if !apply_action(action, &mut state, &mut engine, &tx) {
                            break 'event_loop;
                        }
                    }
                    AppEvent::Mouse(mouse) => {
                        handle_mouse(mouse, &mut state);
                    }
                    // ratatui picks up the new size on the next draw.
                    AppEvent::Resize(_, _) => {}
                    AppEvent::Tick => state.tick(),
                    AppEvent::RevealTick(timer) => {
                        engine.fire(timer);
                    }
                    AppEvent::RevealProgress { message, revealed } => {
                        state.apply_progress(message, revealed);
                    }
                    AppEvent::RevealDone(message) => {
                        if let Some(owner) = state.finish_reveal(message) {
                            engine.release_owner(owner);
                        }
                    }
                    AppEvent::RevealFailed { message, error } => {
                        warn!(%message, %error, "reveal failed, showing message in full");
                        if let Some(owner) = state.finish_reveal(message) {
                            engine.release_owner(owner);
                        }
                        state.status = Some(format!("Reveal failed: {error}"));
                    }
                    AppEvent::ReplyReady(reply) => {
                        let (id, owner, content) = state.receive_reply(*reply);
                        let started = reveal_message(
                            &mut engine,
                            &tx,
                            owner,
                            id,
                            &content,
                            state.reveal_rate,
                            state.streaming,
                        );
                        if started.is_none() {
                            state.finish_reveal(id);
                        }
                    }
                    AppEvent::CommandFinished(outcome) => state.finish_command(outcome),
                }
            }
        }
        if term_flag.load(Ordering::Relaxed) {
            info!("SIGTERM received");
            break 'event_loop;
        }
    }

    tui::restore_tui()?;
    match draw_error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

/// Carries out the part of a key action that needs the engine or the event
/// bus. Returns `false` to quit.
fn apply_action(
    action: KeyAction,
    state: &mut AppState,
    engine: &mut Engine,
    tx: &UnboundedSender<AppEvent>,
) -> bool {
    match action {
        KeyAction::Continue => {}
        KeyAction::Quit => return false,
        KeyAction::Send(prompt) => {
            debug!(model = state.model.id(), chars = prompt.chars().count(), "prompt sent");
            let reply = compose_reply(&prompt);
            send_after(tx, state.reply_delay, AppEvent::ReplyReady(Box::new(reply)));
        }
        KeyAction::Run(command) => {
            let latency = rand::thread_rng().gen_range(MIN_LATENCY..MAX_LATENCY);
            debug!(%command, ?latency, "command submitted");
            send_after(tx, latency, AppEvent::CommandFinished(run_command(&command)));
        }
        KeyAction::TogglePause => toggle_pause(state, engine),
        KeyAction::SkipReveal => match state.reveal_target().map(|m| (m.id, m.owner)) {
            Some((id, owner)) => {
                engine.release_owner(owner);
                state.finish_reveal(id);
            }
            None => state.status = Some("Nothing to skip".to_owned()),
        },
        KeyAction::ToggleStreaming => {
            state.streaming = !state.streaming;
            let label = if state.streaming { "on" } else { "off" };
            state.status = Some(format!("Streaming {label}"));
            if !state.streaming {
                show_revealing_in_full(state, engine, tx);
            }
        }
    }
    true
}

fn toggle_pause(state: &mut AppState, engine: &mut Engine) {
    let Some((id, owner)) = state.reveal_target().map(|m| (m.id, m.owner)) else {
        state.status = Some("Nothing to pause".to_owned());
        return;
    };
    let Some((session, _)) = engine.session_for(owner) else {
        state.status = Some("Nothing to pause".to_owned());
        return;
    };
    match engine.toggle_pause(session) {
        Ok(now) => {
            let paused = now == RevealState::Paused;
            state.set_paused(id, paused);
            state.status = Some(if paused { "Paused" } else { "Resumed" }.to_owned());
        }
        Err(error) => {
            debug!(%error, "pause toggle rejected");
            state.status = Some("Nothing to pause".to_owned());
        }
    }
}

/// Restarts every message still being revealed as a non-streaming reveal,
/// which shows it in full at once.
fn show_revealing_in_full(state: &mut AppState, engine: &mut Engine, tx: &UnboundedSender<AppEvent>) {
    let revealing: Vec<_> = state
        .messages
        .iter()
        .filter(|m| m.is_revealing())
        .map(|m| (m.id, m.owner, m.content.clone()))
        .collect();
    for (id, owner, content) in revealing {
        if reveal_message(engine, tx, owner, id, &content, state.reveal_rate, false).is_none() {
            state.finish_reveal(id);
        }
        state.set_paused(id, false);
    }
}
