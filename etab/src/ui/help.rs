//! Help overlay.
//!
//! Draws a centred modal over the current tab. `Clear` erases the area first,
//! so the overlay is drawn in the same `terminal.draw()` pass as everything
//! else.

use ratatui::{
    Frame,
    layout::Constraint,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::theme::Theme;

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigation",
        &[
            ("Tab / S-Tab", "Next / previous tab"),
            ("j / k", "Scroll down / up one line"),
            ("g / G", "Jump to top / bottom"),
            ("Ctrl-d / u", "Scroll half page down / up"),
            ("Ctrl-f / b", "Scroll full page down / up"),
            ("[ / ]", "Select previous / next message"),
        ],
    ),
    (
        "Typing",
        &[
            ("i / Enter", "Start typing in the input box"),
            ("Enter", "Send message / run command"),
            ("Alt-Enter", "New line in the message"),
            ("Ctrl-V", "Paste the last copied text"),
            ("Esc", "Stop typing"),
        ],
    ),
    (
        "Replies",
        &[
            ("p", "Pause / resume the reply being revealed"),
            ("s", "Show the whole reply now"),
            ("S", "Toggle streaming of new replies"),
            ("d", "Collapse / expand the code diff"),
            ("o", "Show / hide terminal output"),
            ("z", "Maximize / restore the terminal tab"),
        ],
    ),
    (
        "Copy",
        &[
            ("y", "Copy message"),
            ("Y", "Copy diff"),
            ("c", "Copy terminal output"),
        ],
    ),
    (
        "General",
        &[
            ("m", "Next model"),
            ("T", "Next theme (light, dark, system)"),
            ("?", "Open / close this help"),
            ("q / Esc", "Quit"),
        ],
    ),
];

/// Renders the help overlay, scrolled down by `help_scroll` rows.
///
/// Skipped on terminals narrower than 50 columns.
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    if frame.area().width < 50 {
        return;
    }

    let overlay_area = frame
        .area()
        .centered(Constraint::Percentage(70), Constraint::Percentage(80));
    frame.render_widget(Clear, overlay_area);

    let block = Block::bordered()
        .title(" Help: j/k scroll, ? or Esc to close ")
        .border_style(Style::default().fg(theme.border_active));

    frame.render_widget(
        Paragraph::new(help_text(theme))
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((help_scroll, 0)),
        overlay_area,
    );
}

fn help_text(theme: &Theme) -> Text<'static> {
    let mut lines = Vec::new();
    for (idx, (section, keys)) in SECTIONS.iter().enumerate() {
        if idx > 0 {
            lines.push(Line::default());
        }
        lines.push(Line::from(Span::styled(
            *section,
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        )));
        for (key, action) in keys.iter() {
            lines.push(Line::from(vec![
                Span::styled(format!("  {key:<13} "), Style::default().fg(theme.text)),
                Span::styled(*action, Style::default().fg(theme.muted)),
            ]));
        }
    }
    Text::from(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_section_is_listed() {
        let text = help_text(&Theme::dark());
        let rendered: Vec<String> = text
            .lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        for (section, keys) in SECTIONS {
            assert!(rendered.iter().any(|l| l.as_str() == *section));
            assert!(keys
                .iter()
                .all(|(_, action)| rendered.iter().any(|l| l.ends_with(*action))));
        }
    }
}
