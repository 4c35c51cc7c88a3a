//! UI rendering module for etab.
//!
//! `render()` is the single entry point called by the event loop's
//! `terminal.draw()` closure. Layout arithmetic and the fixed bars live in
//! `layout.rs`; each tab body has its own module.

mod layout;
pub mod chat;
pub mod diff_view;
pub mod help;
pub mod highlight;
pub mod keybindings;
pub mod terminal_panel;

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::Line,
    widgets::Paragraph,
};

use crate::app::{AppState, Mode, Tab};
use crate::theme::Theme;
use layout::{compute_layout, inner_rect, panel_block};

/// Renders one complete frame.
///
/// Called exactly once per `AppEvent::Render` inside `terminal.draw()`. The
/// body renderers record their scroll extent in `state`, so scroll keys
/// pressed before the next frame use the current viewport height.
pub fn render(frame: &mut Frame, state: &mut AppState, theme: &Theme) {
    let areas = compute_layout(frame.area(), state);

    if !state.shows_maximized_terminal() {
        layout::render_header(frame, areas.header, state, theme);
        layout::render_tabs(frame, areas.tabs, state, theme);
    }

    match state.tab {
        Tab::Chat => chat::render_chat(frame, areas.body, state, theme),
        Tab::Files => render_files(frame, areas.body, theme),
        Tab::Terminal => terminal_panel::render_terminal(frame, areas.body, state, theme),
    }

    layout::render_input(frame, areas.input, state, theme);
    layout::render_status_bar(frame, areas.status_bar, state, theme);

    // Drawn last so it sits on top.
    if state.mode == Mode::HelpOverlay {
        help::render_help_overlay(frame, theme, state.help_scroll);
    }
}

fn render_files(frame: &mut Frame, area: Rect, theme: &Theme) {
    frame.render_widget(panel_block("Files", false, theme), area);
    let text = vec![
        Line::default(),
        Line::styled(
            "File Explorer",
            Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        )
        .centered(),
        Line::styled(
            "Connect to your workspace to browse files",
            Style::default().fg(theme.muted),
        )
        .centered(),
    ];
    frame.render_widget(Paragraph::new(text), inner_rect(area));
}
