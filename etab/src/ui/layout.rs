//! Screen layout for etab.
//!
//! Pure layout arithmetic plus the small fixed-height bars around the body.
//! It runs inside `terminal.draw()` on every render, so every frame gets a
//! layout that reflects the current terminal size.
//!
//! ```text
//! ETAB  Enhanced Terminal AI Bot              GPT-4 Turbo · system
//!  Chat │ Files │ Terminal
//! ┌──────────────────────────────────────────────────────────────┐
//! │ body                                                         │
//! └──────────────────────────────────────────────────────────────┘
//! ┏━ Message ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┓
//! ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛
//!  NORMAL  ...status bar
//! ```

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph, Tabs},
};

use crate::app::{AppState, Mode, Tab};
use crate::theme::Theme;

/// Screen regions for one frame.
pub struct Areas {
    pub header: Rect,
    pub tabs: Rect,
    pub body: Rect,
    /// Zero-height on tabs without an input box.
    pub input: Rect,
    pub status_bar: Rect,
}

/// Splits the frame into header, tabs, body, input box and status bar.
///
/// The input box grows with the number of lines typed, up to six. A
/// maximized terminal gets the header and tab rows as well.
pub fn compute_layout(area: Rect, state: &AppState) -> Areas {
    let input_height = match state.tab {
        Tab::Chat => input_box_height(&state.input),
        Tab::Terminal => 3,
        Tab::Files => 0,
    };
    let bar_height = if state.shows_maximized_terminal() { 0 } else { 1 };
    let [header, tabs, body, input, status_bar] = area.layout(&Layout::vertical([
        Constraint::Length(bar_height),
        Constraint::Length(bar_height),
        Constraint::Fill(1),
        Constraint::Length(input_height),
        Constraint::Length(1),
    ]));
    Areas {
        header,
        tabs,
        body,
        input,
        status_bar,
    }
}

fn input_box_height(input: &str) -> u16 {
    let lines = input.split('\n').count().clamp(1, 6);
    lines as u16 + 2
}

/// Returns the inner `Rect` of a panel after removing the 1-cell border on each side.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin {
        vertical: 1,
        horizontal: 1,
    })
}

/// Builds a bordered `Block` for a panel.
///
/// A focused panel gets a thick border in the active color.
pub fn panel_block<'a>(title: &'a str, is_focused: bool, theme: &Theme) -> Block<'a> {
    let (border_type, color) = if is_focused {
        (BorderType::Thick, theme.border_active)
    } else {
        (BorderType::Plain, theme.border_inactive)
    };
    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(Style::default().fg(color))
}

pub fn render_header(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let [left, right] = area.layout(&Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(40),
    ]));
    let title = Line::from(vec![
        Span::styled(
            "ETAB",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("  Enhanced Terminal AI Bot", Style::default().fg(theme.muted)),
    ]);
    let settings = Line::from(vec![
        Span::styled(state.model.label(), Style::default().fg(theme.text)),
        Span::styled(
            format!(" · {} ", state.theme_pref.label()),
            Style::default().fg(theme.muted),
        ),
    ])
    .right_aligned();

    frame.render_widget(Paragraph::new(title), left);
    frame.render_widget(Paragraph::new(settings), right);
}

pub fn render_tabs(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let tabs = Tabs::new(Tab::ALL.iter().map(|tab| tab.title()))
        .select(state.tab.index())
        .style(Style::default().fg(theme.muted))
        .highlight_style(
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        );
    frame.render_widget(tabs, area);
}

/// Renders the input box of the active tab and places the cursor in it
/// while typing.
pub fn render_input(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    if area.height == 0 {
        return;
    }
    let typing = state.mode == Mode::Insert;
    let (title, text, placeholder) = match state.tab {
        Tab::Terminal => (
            " $ ",
            state.terminal_input.as_str(),
            "Enter command... (i to type)",
        ),
        _ if state.loading => (" Message ", state.input.as_str(), "Waiting for reply..."),
        _ => (
            " Message ",
            state.input.as_str(),
            "Ask me anything about your code... (i to type)",
        ),
    };
    let block = panel_block(title, typing, theme);
    let inner = inner_rect(area);

    let body = if text.is_empty() && !typing {
        Paragraph::new(Span::styled(placeholder, Style::default().fg(theme.muted)))
    } else {
        Paragraph::new(text.to_owned()).style(Style::default().fg(theme.text))
    };

    // Keep the last typed line in view when the text is taller than the box.
    let rows = text.split('\n').count() as u16;
    let scroll = rows.saturating_sub(inner.height);
    frame.render_widget(body.block(block).scroll((scroll, 0)), area);

    if typing {
        let last = text.rsplit('\n').next().unwrap_or("");
        let col = Span::raw(last).width() as u16;
        let row = rows.saturating_sub(1).saturating_sub(scroll);
        frame.set_cursor_position((
            inner.x + col.min(inner.width.saturating_sub(1)),
            inner.y + row.min(inner.height.saturating_sub(1)),
        ));
    }
}

/// Renders the 1-row status bar at the bottom of the terminal.
///
/// Shows the mode, model, message count, theme and streaming toggle, then
/// the feedback of the last action if there is one.
pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let (mode_text, mode_fg) = match state.mode {
        Mode::Insert => (" INSERT ", theme.status_mode_insert),
        Mode::Normal => (" NORMAL ", theme.status_mode_normal),
        Mode::HelpOverlay => (" HELP ", theme.status_mode_normal),
    };

    let mut spans = vec![
        Span::styled(
            mode_text,
            Style::default().fg(mode_fg).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " {} │ {} messages │ theme: {} │ streaming: {} ",
            state.model.label(),
            state.messages.len(),
            state.appearance().label(),
            if state.streaming { "on" } else { "off" },
        )),
    ];
    match &state.status {
        Some(status) => spans.push(Span::styled(
            format!("│ {status}"),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        None => spans.push(Span::raw("│ ? for help")),
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg)),
        area,
    );
}
