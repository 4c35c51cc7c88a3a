//! Terminal tab renderer: the mock shell's scrollback.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use etab_core::terminal::{TerminalLine, TerminalLineKind, WORKING_DIRECTORY};

use crate::app::AppState;
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

/// Styles one transcript line. Also used for the output attached to chat
/// messages.
pub fn transcript_line(line: &TerminalLine, theme: &Theme) -> Line<'static> {
    let style = match line.kind {
        TerminalLineKind::Command => Style::default()
            .fg(theme.terminal_command)
            .add_modifier(Modifier::BOLD),
        TerminalLineKind::Output => Style::default().fg(theme.terminal_output),
        TerminalLineKind::Error => Style::default().fg(theme.terminal_error),
        TerminalLineKind::Info => Style::default().fg(theme.terminal_info),
    };
    Line::from(Span::styled(line.content.clone(), style))
}

pub fn render_terminal(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let hint = if state.terminal_maximized { " z: restore " } else { " z: maximize " };
    let block = panel_block("ETAB Terminal", false, theme)
        .title(Line::from(hint).right_aligned())
        .title_bottom(Line::from(format!(" {WORKING_DIRECTORY} ")).right_aligned());
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line<'static>> = state
        .transcript
        .lines()
        .iter()
        .map(|line| transcript_line(line, theme))
        .collect();
    if state.commands_running > 0 {
        lines.push(Line::from(Span::styled(
            "running...",
            Style::default()
                .fg(theme.muted)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    state.terminal_scroll.set_extent(lines.len(), inner.height);
    let offset = u16::try_from(state.terminal_scroll.offset()).unwrap_or(u16::MAX);
    frame.render_widget(Paragraph::new(lines).scroll((offset, 0)), inner);
}
