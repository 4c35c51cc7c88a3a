//! Central application state for etab.
//!
//! This module owns all mutable UI state: the mode, the active tab, the chat
//! messages and how much of each is revealed, the two input buffers, the
//! terminal transcript, scroll positions and the yank register with its
//! clipboard. No ratatui
//! rendering logic lives here. `app.rs` is pure state that is read by the
//! render module and mutated by the keybinding dispatcher and the event loop.

use std::time::Duration;

use etab_core::diff::CodeDiff;
use etab_core::responder::{welcome_message, AssistantReply, ModelChoice};
use etab_core::reveal::OwnerId;
use etab_core::terminal::{CommandOutcome, TerminalLine, Transcript};
use tracing::warn;
use uuid::Uuid;

use crate::clipboard::{Clipboard, SystemClipboard};
use crate::config::Config;
use crate::theme::{Appearance, ThemePreference};
use crate::ui::highlight::HighlightCache;

/// Editor mode controlling which keybinding set is active.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Navigation and message actions (default).
    #[default]
    Normal,
    /// Typing into the input box of the active tab.
    Insert,
    /// Full-screen help overlay is shown above everything.
    HelpOverlay,
}

/// The three tabs under the header.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Chat,
    Files,
    Terminal,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Chat, Tab::Files, Tab::Terminal];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Chat => "Chat",
            Tab::Files => "Files",
            Tab::Terminal => "Terminal",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Tab::Chat => 0,
            Tab::Files => 1,
            Tab::Terminal => 2,
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Whether the tab has an input box.
    pub fn accepts_input(self) -> bool {
        !matches!(self, Tab::Files)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One chat message.
///
/// `content` is fixed once the message is pushed. `revealed` is the byte
/// length of the visible prefix and only ever lands on char boundaries.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: Uuid,
    /// Reveal-engine owner for this message.
    pub owner: OwnerId,
    pub role: Role,
    pub content: String,
    revealed: usize,
    pub paused: bool,
    pub code_diff: Option<CodeDiff>,
    /// Collapsible state of the attached diff.
    pub diff_open: bool,
    pub terminal: Option<Vec<TerminalLine>>,
    /// Collapsible state of the attached command output. Starts closed.
    pub terminal_open: bool,
}

impl Message {
    fn new(owner: OwnerId, role: Role, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            role,
            content,
            revealed: 0,
            paused: false,
            code_diff: None,
            diff_open: true,
            terminal: None,
            terminal_open: false,
        }
    }

    /// The currently visible prefix of the content.
    pub fn visible(&self) -> &str {
        self.content.get(..self.revealed).unwrap_or(&self.content)
    }

    /// `true` while part of the content is still hidden.
    pub fn is_revealing(&self) -> bool {
        self.revealed < self.content.len()
    }

    /// Grows the visible prefix to `bytes`. Never shrinks it: progress
    /// still queued from a session that was skipped or restarted is stale.
    pub fn set_revealed(&mut self, bytes: usize) {
        if bytes > self.revealed && self.content.is_char_boundary(bytes) {
            self.revealed = bytes;
        }
    }

    pub fn reveal_all(&mut self) {
        self.revealed = self.content.len();
        self.paused = false;
    }

    /// Attachments are shown once the text itself is fully visible.
    pub fn shows_attachments(&self) -> bool {
        !self.is_revealing()
    }
}

/// Scroll position of a pane whose content length is only known at render
/// time.
///
/// While `follow` is set the pane sticks to the bottom as content grows.
#[derive(Debug, Clone, Copy)]
pub struct Scroll {
    offset: usize,
    viewport: u16,
    total: usize,
    follow: bool,
}

impl Default for Scroll {
    fn default() -> Self {
        Self {
            offset: 0,
            viewport: 0,
            total: 0,
            follow: true,
        }
    }
}

impl Scroll {
    fn max_offset(&self) -> usize {
        self.total.saturating_sub(self.viewport as usize)
    }

    /// First visible row.
    pub fn offset(&self) -> usize {
        if self.follow {
            self.max_offset()
        } else {
            self.offset.min(self.max_offset())
        }
    }

    pub fn is_following(&self) -> bool {
        self.follow
    }

    /// Records the content height and viewport height of the last render.
    pub fn set_extent(&mut self, total: usize, viewport: u16) {
        self.total = total;
        self.viewport = viewport;
    }

    pub fn down(&mut self, rows: usize) {
        let max = self.max_offset();
        self.offset = self.offset().saturating_add(rows).min(max);
        self.follow = self.offset >= max;
    }

    pub fn up(&mut self, rows: usize) {
        self.offset = self.offset().saturating_sub(rows);
        self.follow = self.offset >= self.max_offset();
    }

    pub fn top(&mut self) {
        self.offset = 0;
        self.follow = self.max_offset() == 0;
    }

    pub fn bottom(&mut self) {
        self.follow = true;
    }

    pub fn half_page_down(&mut self) {
        self.down((self.viewport as usize / 2).max(1));
    }

    pub fn half_page_up(&mut self) {
        self.up((self.viewport as usize / 2).max(1));
    }

    pub fn page_down(&mut self) {
        self.down((self.viewport as usize).max(1));
    }

    pub fn page_up(&mut self) {
        self.up((self.viewport as usize).max(1));
    }
}

/// All mutable UI state passed through every render cycle.
pub struct AppState {
    pub mode: Mode,
    pub tab: Tab,

    pub messages: Vec<Message>,
    /// Chat input buffer.
    pub input: String,
    /// Set between sending a prompt and its reply arriving.
    pub loading: bool,
    /// Message targeted by message actions (`y`, `p`, `s`, `d`, `o`). `None`
    /// means the most recent assistant message.
    pub selected: Option<usize>,
    pub chat_scroll: Scroll,

    pub model: ModelChoice,
    pub theme_pref: ThemePreference,
    system_appearance: Appearance,
    /// Reveal new replies gradually.
    pub streaming: bool,
    pub reveal_rate: Duration,
    pub reply_delay: Duration,

    pub transcript: Transcript,
    /// Terminal input buffer.
    pub terminal_input: String,
    /// Commands submitted whose output has not arrived yet.
    pub commands_running: usize,
    pub terminal_scroll: Scroll,
    /// The terminal tab hides the header and tab row to use the full height.
    pub terminal_maximized: bool,

    pub help_scroll: u16,

    /// Last yanked text. Kept even when the system clipboard is missing, and
    /// pasted back with Ctrl-V.
    pub register: Option<String>,
    clipboard: Box<dyn Clipboard>,
    /// One-line feedback shown in the status bar until the next key.
    pub status: Option<String>,
    /// Frame counter for the "thinking" indicator, advanced on every tick.
    pub spinner: usize,

    /// Syntax-highlighted code blocks, reused across frames.
    pub highlight: HighlightCache,

    next_owner: u64,
}

impl AppState {
    pub fn new(config: &Config, system_appearance: Appearance) -> Self {
        Self {
            mode: Mode::default(),
            tab: Tab::default(),
            messages: Vec::new(),
            input: String::new(),
            loading: false,
            selected: None,
            chat_scroll: Scroll::default(),
            model: config.model(),
            theme_pref: config.theme,
            system_appearance,
            streaming: config.streaming.enabled,
            reveal_rate: config.reveal_rate(),
            reply_delay: config.reply_delay(),
            transcript: Transcript::welcome(),
            terminal_input: String::new(),
            commands_running: 0,
            terminal_scroll: Scroll::default(),
            terminal_maximized: false,
            help_scroll: 0,
            register: None,
            clipboard: Box::new(SystemClipboard),
            status: None,
            spinner: 0,
            highlight: HighlightCache::default(),
            next_owner: 0,
        }
    }

    /// Replaces the system clipboard.
    #[cfg(test)]
    pub fn with_clipboard(mut self, clipboard: impl Clipboard + 'static) -> Self {
        self.clipboard = Box::new(clipboard);
        self
    }

    pub fn appearance(&self) -> Appearance {
        self.theme_pref.resolve(self.system_appearance)
    }

    fn allocate_owner(&mut self) -> OwnerId {
        self.next_owner += 1;
        OwnerId(self.next_owner)
    }

    pub fn message(&self, id: Uuid) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn message_mut(&mut self, id: Uuid) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    /// Pushes the greeting. Returns its id and owner so the caller can start
    /// its reveal.
    pub fn push_welcome(&mut self) -> (Uuid, OwnerId) {
        self.push_assistant(AssistantReply {
            content: welcome_message().to_owned(),
            code_diff: None,
            terminal: None,
        })
    }

    /// Pushes an assistant message with nothing revealed yet.
    pub fn push_assistant(&mut self, reply: AssistantReply) -> (Uuid, OwnerId) {
        let owner = self.allocate_owner();
        let mut message = Message::new(owner, Role::Assistant, reply.content);
        message.code_diff = reply.code_diff;
        message.terminal = reply.terminal;
        let handle = (message.id, owner);
        self.messages.push(message);
        self.chat_scroll.bottom();
        handle
    }

    /// Sends the chat input as a user message.
    ///
    /// Returns the prompt, or `None` when the input is blank or a reply is
    /// still pending. The input is kept in that case.
    pub fn submit_prompt(&mut self) -> Option<String> {
        if self.loading || self.input.trim().is_empty() {
            return None;
        }
        let prompt = std::mem::take(&mut self.input);
        let owner = self.allocate_owner();
        let mut message = Message::new(owner, Role::User, prompt.clone());
        message.reveal_all();
        self.messages.push(message);
        self.loading = true;
        self.selected = None;
        self.chat_scroll.bottom();
        Some(prompt)
    }

    /// Stores an arrived reply. Returns the new message's id, owner and content
    /// for starting its reveal.
    pub fn receive_reply(&mut self, reply: AssistantReply) -> (Uuid, OwnerId, String) {
        self.loading = false;
        let content = reply.content.clone();
        let (id, owner) = self.push_assistant(reply);
        (id, owner, content)
    }

    pub fn apply_progress(&mut self, id: Uuid, revealed: usize) {
        if let Some(message) = self.message_mut(id) {
            message.set_revealed(revealed);
        }
    }

    /// Marks `id` fully revealed. Returns its owner so the finished session
    /// can be released.
    pub fn finish_reveal(&mut self, id: Uuid) -> Option<OwnerId> {
        let message = self.message_mut(id)?;
        message.reveal_all();
        Some(message.owner)
    }

    fn target_index(&self) -> Option<usize> {
        self.selected.or_else(|| {
            self.messages
                .iter()
                .rposition(|m| m.role == Role::Assistant)
        })
    }

    /// Message the action keys apply to.
    pub fn target_message(&self) -> Option<&Message> {
        self.target_index().and_then(|idx| self.messages.get(idx))
    }

    fn target_message_mut(&mut self) -> Option<&mut Message> {
        self.target_index().and_then(|idx| self.messages.get_mut(idx))
    }

    /// The message a pause/skip should act on: the target if it is still
    /// revealing, else the most recent message that is.
    pub fn reveal_target(&self) -> Option<&Message> {
        self.target_message()
            .filter(|m| m.is_revealing())
            .or_else(|| self.messages.iter().rev().find(|m| m.is_revealing()))
    }

    pub fn select_prev(&mut self) {
        let last = match self.messages.len() {
            0 => return,
            n => n - 1,
        };
        self.selected = Some(match self.selected {
            Some(idx) => idx.saturating_sub(1),
            None => last,
        });
    }

    pub fn select_next(&mut self) {
        self.selected = match self.selected {
            Some(idx) if idx + 1 < self.messages.len() => Some(idx + 1),
            _ => None,
        };
    }

    /// Copies the visible text of the target message.
    pub fn yank_message(&mut self) {
        match self.target_message().map(|m| m.visible().to_owned()) {
            Some(text) => self.yank(text, "message"),
            None => self.status = Some("Nothing to copy".to_owned()),
        }
    }

    /// Copies every line of the target message's diff.
    pub fn yank_diff(&mut self) {
        let text = self
            .target_message()
            .and_then(|m| m.code_diff.as_ref())
            .map(CodeDiff::clipboard_text);
        match text {
            Some(text) => self.yank(text, "diff"),
            None => self.status = Some("No diff on this message".to_owned()),
        }
    }

    /// Copies the terminal transcript.
    pub fn yank_terminal(&mut self) {
        let text = self.transcript.copy_text();
        self.yank(text, "terminal output");
    }

    /// Copies to the system clipboard and the register. Without a system
    /// clipboard the text only lands in the register.
    fn yank(&mut self, text: String, what: &str) {
        let chars = text.chars().count();
        self.status = Some(match self.clipboard.copy(&text) {
            Ok(()) => format!("Copied {what} ({chars} chars)"),
            Err(error) => {
                warn!(%error, "system clipboard unavailable");
                format!("Copied {what} ({chars} chars) to the register only, Ctrl-V pastes it")
            }
        });
        self.register = Some(text);
    }

    /// Inserts the register into the input box of the active tab.
    pub fn paste_register(&mut self) {
        let Some(text) = self.register.clone() else {
            self.status = Some("Register is empty".to_owned());
            return;
        };
        // The terminal prompt is one line.
        let single_line = self.tab == Tab::Terminal;
        if let Some(input) = self.active_input() {
            if single_line {
                input.push_str(&text.replace('\n', " "));
            } else {
                input.push_str(&text);
            }
        }
    }

    pub fn toggle_diff(&mut self) {
        if let Some(message) = self.target_message_mut() {
            if message.code_diff.is_some() {
                message.diff_open = !message.diff_open;
            }
        }
    }

    pub fn toggle_terminal_output(&mut self) {
        if let Some(message) = self.target_message_mut() {
            if message.terminal.is_some() {
                message.terminal_open = !message.terminal_open;
            }
        }
    }

    pub fn set_paused(&mut self, id: Uuid, paused: bool) {
        if let Some(message) = self.message_mut(id) {
            message.paused = paused;
        }
    }

    /// Takes the terminal input and echoes it.
    ///
    /// Returns the command to run, or `None` for blank input.
    pub fn submit_command(&mut self) -> Option<String> {
        let command = std::mem::take(&mut self.terminal_input);
        if !self.transcript.submit(&command) {
            return None;
        }
        self.commands_running += 1;
        self.terminal_scroll.bottom();
        Some(command.trim().to_owned())
    }

    pub fn finish_command(&mut self, outcome: CommandOutcome) {
        self.transcript.apply(outcome);
        self.commands_running = self.commands_running.saturating_sub(1);
        self.terminal_scroll.bottom();
    }

    /// Maximizes or restores the terminal. Only meaningful on its tab.
    pub fn toggle_terminal_maximized(&mut self) {
        if self.tab != Tab::Terminal {
            return;
        }
        self.terminal_maximized = !self.terminal_maximized;
        let now = if self.terminal_maximized { "maximized" } else { "restored" };
        self.status = Some(format!("Terminal {now}"));
    }

    /// Whether the current frame shows the maximized terminal.
    pub fn shows_maximized_terminal(&self) -> bool {
        self.tab == Tab::Terminal && self.terminal_maximized
    }

    /// Input buffer of the active tab, if it has one.
    pub fn active_input(&mut self) -> Option<&mut String> {
        match self.tab {
            Tab::Chat => Some(&mut self.input),
            Tab::Terminal => Some(&mut self.terminal_input),
            Tab::Files => None,
        }
    }

    /// Scroll state of the active tab, if it scrolls.
    pub fn active_scroll(&mut self) -> Option<&mut Scroll> {
        match self.tab {
            Tab::Chat => Some(&mut self.chat_scroll),
            Tab::Terminal => Some(&mut self.terminal_scroll),
            Tab::Files => None,
        }
    }

    pub fn cycle_model(&mut self) {
        self.model = self.model.next();
        self.status = Some(format!("Model: {}", self.model.label()));
    }

    pub fn cycle_theme(&mut self) {
        self.theme_pref = self.theme_pref.next();
        self.status = Some(format!("Theme: {}", self.theme_pref.label()));
    }

    pub fn tick(&mut self) {
        self.spinner = self.spinner.wrapping_add(1);
    }
}
