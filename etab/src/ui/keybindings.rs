//! Keybinding dispatcher for etab.
//!
//! Translates raw crossterm `KeyEvent`s into `AppState` mutations and returns a
//! `KeyAction` for the work the event loop has to do itself: sending a prompt,
//! running a command, or driving the reveal engine. The dispatcher branches
//! first on `state.mode` so that HelpOverlay, Insert and Normal all have
//! isolated handler functions.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{AppState, Mode, Tab};

/// What the event loop should do after a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Nothing beyond redrawing.
    Continue,
    Quit,
    /// A prompt was added to the chat; compose and deliver its reply.
    Send(String),
    /// A command was echoed into the terminal; run it.
    Run(String),
    /// Pause or resume the reply being revealed.
    TogglePause,
    /// Show the reply being revealed in full.
    SkipReveal,
    /// Turn gradual reveal of replies on or off.
    ToggleStreaming,
}

/// Dispatches a key event to the handler matching the current mode.
///
/// The status-bar message of the previous action is cleared first.
pub fn handle_key(key: KeyEvent, state: &mut AppState) -> KeyAction {
    state.status = None;
    match state.mode {
        Mode::HelpOverlay => handle_help(key, state),
        Mode::Normal => handle_normal(key, state),
        Mode::Insert => handle_insert(key, state),
    }
}

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

fn handle_normal(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if let Some(action) = handle_scroll_key(key, state) {
        return action;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
            KeyAction::Continue
        }

        KeyCode::Char('i') | KeyCode::Enter if state.tab.accepts_input() => {
            state.mode = Mode::Insert;
            KeyAction::Continue
        }
        KeyCode::Tab => {
            state.tab = state.tab.next();
            KeyAction::Continue
        }
        KeyCode::BackTab => {
            state.tab = state.tab.prev();
            KeyAction::Continue
        }

        // Message actions
        KeyCode::Char('[') => { state.select_prev(); KeyAction::Continue }
        KeyCode::Char(']') => { state.select_next(); KeyAction::Continue }
        KeyCode::Char('p') => KeyAction::TogglePause,
        KeyCode::Char('s') => KeyAction::SkipReveal,
        KeyCode::Char('S') => KeyAction::ToggleStreaming,
        KeyCode::Char('d') => { state.toggle_diff(); KeyAction::Continue }
        KeyCode::Char('o') => { state.toggle_terminal_output(); KeyAction::Continue }
        KeyCode::Char('z') => { state.toggle_terminal_maximized(); KeyAction::Continue }

        // Copy
        KeyCode::Char('y') => { state.yank_message(); KeyAction::Continue }
        KeyCode::Char('Y') => { state.yank_diff(); KeyAction::Continue }
        KeyCode::Char('c') => { state.yank_terminal(); KeyAction::Continue }

        KeyCode::Char('m') => { state.cycle_model(); KeyAction::Continue }
        KeyCode::Char('T') => { state.cycle_theme(); KeyAction::Continue }

        _ => KeyAction::Continue,
    }
}

/// Handles j / k / g / G and the Ctrl page keys for the active tab.
///
/// Returns `None` when the key is not a scroll key.
fn handle_scroll_key(key: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let is_scroll = matches!(
        (key.code, ctrl),
        (KeyCode::Char('j' | 'k' | 'g' | 'G') | KeyCode::Down | KeyCode::Up, false)
            | (KeyCode::Char('d' | 'u' | 'f' | 'b'), true)
    );
    if !is_scroll {
        return None;
    }
    let Some(scroll) = state.active_scroll() else {
        return Some(KeyAction::Continue);
    };

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => scroll.down(1),
        KeyCode::Char('k') | KeyCode::Up => scroll.up(1),
        KeyCode::Char('g') => scroll.top(),
        KeyCode::Char('G') => scroll.bottom(),
        KeyCode::Char('d') => scroll.half_page_down(),
        KeyCode::Char('u') => scroll.half_page_up(),
        KeyCode::Char('f') => scroll.page_down(),
        KeyCode::Char('b') => scroll.page_up(),
        _ => {}
    }
    Some(KeyAction::Continue)
}

// ---------------------------------------------------------------------------
// HelpOverlay mode
// ---------------------------------------------------------------------------

/// j / k scroll the overlay; `?`, `Esc` or `q` close it.
fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            state.help_scroll = state.help_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.help_scroll = state.help_scroll.saturating_sub(1);
        }
        KeyCode::Char('g') => state.help_scroll = 0,
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Insert mode
// ---------------------------------------------------------------------------

/// Edits the input box of the active tab.
///
/// Enter sends the chat message or runs the terminal command. Alt-Enter and
/// Shift-Enter insert a newline into a chat message. Ctrl-V pastes the last
/// copied text.
fn handle_insert(key: KeyEvent, state: &mut AppState) -> KeyAction {
    let newline = key
        .modifiers
        .intersects(KeyModifiers::ALT | KeyModifiers::SHIFT);

    match key.code {
        KeyCode::Esc => {
            state.mode = Mode::Normal;
            KeyAction::Continue
        }
        KeyCode::Enter if newline && state.tab == Tab::Chat => {
            state.input.push('\n');
            KeyAction::Continue
        }
        KeyCode::Enter => match state.tab {
            Tab::Chat => state.submit_prompt().map_or(KeyAction::Continue, KeyAction::Send),
            Tab::Terminal => state.submit_command().map_or(KeyAction::Continue, KeyAction::Run),
            Tab::Files => KeyAction::Continue,
        },
        KeyCode::Backspace => {
            if let Some(input) = state.active_input() {
                input.pop();
            }
            KeyAction::Continue
        }
        KeyCode::Char('v') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            state.paste_register();
            KeyAction::Continue
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            if let Some(input) = state.active_input() {
                input.push(c);
            }
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

// ---------------------------------------------------------------------------
// Mouse events
// ---------------------------------------------------------------------------

/// Scroll wheel moves the active tab (or the help overlay) by 3 lines.
pub fn handle_mouse(mouse: MouseEvent, state: &mut AppState) -> KeyAction {
    let down = match mouse.kind {
        MouseEventKind::ScrollDown => true,
        MouseEventKind::ScrollUp => false,
        _ => return KeyAction::Continue,
    };
    if state.mode == Mode::HelpOverlay {
        state.help_scroll = if down {
            state.help_scroll.saturating_add(3)
        } else {
            state.help_scroll.saturating_sub(3)
        };
    } else if let Some(scroll) = state.active_scroll() {
        if down {
            scroll.down(3);
        } else {
            scroll.up(3);
        }
    }
    KeyAction::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::config::Config;
    use crate::theme::Appearance;
    use etab_core::responder::compose_reply;

    fn state() -> AppState {
        AppState::new(&Config::default(), Appearance::Dark).with_clipboard(MemoryClipboard::default())
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(state: &mut AppState, text: &str) {
        for c in text.chars() {
            handle_key(key(KeyCode::Char(c)), state);
        }
    }

    #[test]
    fn typing_and_sending_a_prompt() {
        let mut state = state();
        handle_key(key(KeyCode::Char('i')), &mut state);
        assert_eq!(state.mode, Mode::Insert);
        type_str(&mut state, "hi!");
        handle_key(key(KeyCode::Backspace), &mut state);
        handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::ALT), &mut state);
        type_str(&mut state, "x");
        assert_eq!(state.input, "hi\nx");

        let action = handle_key(key(KeyCode::Enter), &mut state);
        assert_eq!(action, KeyAction::Send("hi\nx".into()));
        assert!(state.input.is_empty());

        // Letters are text while typing, not commands.
        assert_eq!(handle_key(key(KeyCode::Char('q')), &mut state), KeyAction::Continue);
        handle_key(key(KeyCode::Esc), &mut state);
        assert_eq!(state.mode, Mode::Normal);
        assert_eq!(handle_key(key(KeyCode::Char('q')), &mut state), KeyAction::Quit);
    }

    #[test]
    fn terminal_tab_runs_commands() {
        let mut state = state();
        handle_key(key(KeyCode::Tab), &mut state);
        handle_key(key(KeyCode::Tab), &mut state);
        assert_eq!(state.tab, Tab::Terminal);
        handle_key(key(KeyCode::Enter), &mut state);
        type_str(&mut state, "pwd");
        assert_eq!(handle_key(key(KeyCode::Enter), &mut state), KeyAction::Run("pwd".into()));
        assert!(state.terminal_input.is_empty());
        assert_eq!(state.commands_running, 1);
    }

    #[test]
    fn z_maximizes_and_restores_the_terminal() {
        let mut state = state();
        handle_key(key(KeyCode::Char('z')), &mut state);
        assert!(!state.terminal_maximized);

        state.tab = Tab::Terminal;
        handle_key(key(KeyCode::Char('z')), &mut state);
        assert!(state.terminal_maximized);
        handle_key(key(KeyCode::Char('z')), &mut state);
        assert!(!state.terminal_maximized);
    }

    #[test]
    fn files_tab_has_no_insert_mode() {
        let mut state = state();
        handle_key(key(KeyCode::BackTab), &mut state);
        handle_key(key(KeyCode::BackTab), &mut state);
        assert_eq!(state.tab, Tab::Files);
        handle_key(key(KeyCode::Char('i')), &mut state);
        assert_eq!(state.mode, Mode::Normal);
    }

    #[test]
    fn reveal_keys_become_actions() {
        let mut state = state();
        assert_eq!(handle_key(key(KeyCode::Char('p')), &mut state), KeyAction::TogglePause);
        assert_eq!(handle_key(key(KeyCode::Char('s')), &mut state), KeyAction::SkipReveal);
        assert_eq!(handle_key(key(KeyCode::Char('S')), &mut state), KeyAction::ToggleStreaming);
    }

    #[test]
    fn status_clears_on_next_key() {
        let mut state = state();
        let (id, _) = state.push_assistant(compose_reply("hello"));
        state.finish_reveal(id);
        handle_key(key(KeyCode::Char('y')), &mut state);
        assert!(state.status.as_deref().is_some_and(|s| s.starts_with("Copied message")));
        handle_key(key(KeyCode::Char('j')), &mut state);
        assert_eq!(state.status, None);
    }

    #[test]
    fn copy_then_paste_into_the_prompt() {
        let mut state = state();
        let (id, _) = state.push_assistant(compose_reply("hello"));
        state.finish_reveal(id);
        handle_key(key(KeyCode::Char('y')), &mut state);
        handle_key(key(KeyCode::Char('i')), &mut state);
        handle_key(KeyEvent::new(KeyCode::Char('v'), KeyModifiers::CONTROL), &mut state);
        assert_eq!(state.input, state.message(id).unwrap().content);
    }

    #[test]
    fn help_overlay_scrolls_and_closes() {
        let mut state = state();
        handle_key(key(KeyCode::Char('?')), &mut state);
        assert_eq!(state.mode, Mode::HelpOverlay);
        handle_key(key(KeyCode::Char('j')), &mut state);
        handle_key(key(KeyCode::Char('j')), &mut state);
        assert_eq!(state.help_scroll, 2);
        assert_eq!(handle_key(key(KeyCode::Char('q')), &mut state), KeyAction::Continue);
        assert_eq!(state.mode, Mode::Normal);
    }

    #[test]
    fn scroll_keys_move_the_active_pane() {
        let mut state = state();
        state.chat_scroll.set_extent(100, 20);
        handle_key(key(KeyCode::Char('g')), &mut state);
        assert_eq!(state.chat_scroll.offset(), 0);
        handle_key(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL), &mut state);
        assert_eq!(state.chat_scroll.offset(), 10);
        handle_key(key(KeyCode::Char('G')), &mut state);
        assert!(state.chat_scroll.is_following());
    }
}
