//! Chat panel renderer.
//!
//! Every frame the message list is rebuilt into styled lines from each
//! message's visible prefix. The prefix is split into prose and fenced code
//! with [`segments`], so a code block that is still streaming renders as an
//! open block that grows tick by tick. Only the visible window of lines is
//! handed to the `Paragraph`, like the virtual scrolling of a `List`.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use etab_core::markdown::{segments, Segment};

use crate::app::{AppState, Message, Role};
use crate::theme::Theme;
use crate::ui::diff_view::diff_lines;
use crate::ui::highlight::HighlightCache;
use crate::ui::layout::{inner_rect, panel_block};
use crate::ui::terminal_panel::transcript_line;

const INDENT: &str = "  ";
const CURSOR: &str = "▌";
const THINKING_FRAMES: [&str; 4] = ["   ", ".  ", ".. ", "..."];

/// Renders the chat panel and records its scroll extent.
///
/// # Arguments
///
/// * `frame` — current render frame
/// * `area` — the `Rect` for the chat panel (includes borders)
/// * `state` — app state; the highlight cache and scroll extent are updated
/// * `theme` — active color theme
pub fn render_chat(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let block = panel_block("Chat", false, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let lines = chat_lines(state, theme, inner.width as usize);
    state.chat_scroll.set_extent(lines.len(), inner.height);
    let start = state.chat_scroll.offset();
    let end = (start + inner.height as usize).min(lines.len());

    frame.render_widget(Paragraph::new(lines[start..end].to_vec()), inner);
}

/// Builds the lines of the whole conversation for a pane `width` cells wide.
pub fn chat_lines(state: &mut AppState, theme: &Theme, width: usize) -> Vec<Line<'static>> {
    let AppState {
        messages,
        selected,
        highlight,
        loading,
        spinner,
        ..
    } = state;

    let mut out = Vec::new();
    for (idx, message) in messages.iter().enumerate() {
        let is_selected = *selected == Some(idx);
        out.extend(message_lines(message, is_selected, width, theme, highlight));
        out.push(Line::default());
    }
    if *loading {
        let dots = THINKING_FRAMES[*spinner % THINKING_FRAMES.len()];
        out.push(Line::from(vec![
            Span::styled(
                format!("{INDENT}ETAB is thinking{dots}"),
                Style::default().fg(theme.muted).add_modifier(Modifier::ITALIC),
            ),
        ]));
    }
    out
}

/// Builds the lines of one message: author line, body, attachments.
pub fn message_lines(
    message: &Message,
    selected: bool,
    width: usize,
    theme: &Theme,
    cache: &mut HighlightCache,
) -> Vec<Line<'static>> {
    let mut out = vec![author_line(message, selected, theme)];

    match message.role {
        Role::User => {
            for line in message.visible().split('\n') {
                out.extend(wrap_spans(
                    vec![Span::styled(line.to_owned(), Style::default().fg(theme.text))],
                    width,
                ));
            }
        }
        Role::Assistant => out.extend(markdown_lines(message.visible(), width, theme, cache)),
    }

    if message.is_revealing() && !message.paused {
        let cursor = Span::styled(CURSOR, Style::default().fg(theme.accent));
        if out.len() > 1 {
            if let Some(last) = out.last_mut() {
                last.push_span(cursor);
            }
        } else {
            out.push(Line::from(vec![Span::raw(INDENT), cursor]));
        }
    }

    if message.shows_attachments() {
        if let Some(diff) = &message.code_diff {
            out.push(Line::default());
            out.extend(diff_lines(diff, message.diff_open, theme).into_iter().map(indent));
        }
        if let Some(transcript) = &message.terminal {
            out.push(Line::default());
            let label = if message.terminal_open {
                "▾ Hide Terminal Output"
            } else {
                "▸ Show Terminal Output"
            };
            out.push(indent(Line::from(Span::styled(label, Style::default().fg(theme.muted)))));
            if message.terminal_open {
                out.extend(transcript.iter().map(|l| indent(indent(transcript_line(l, theme)))));
            }
        }
    }
    out
}

fn author_line(message: &Message, selected: bool, theme: &Theme) -> Line<'static> {
    let marker = if selected {
        Span::styled("▍", Style::default().fg(theme.selection))
    } else {
        Span::raw(" ")
    };
    let (name, color) = match message.role {
        Role::User => ("You", theme.user),
        Role::Assistant => ("ETAB", theme.assistant),
    };
    let mut spans = vec![
        marker,
        Span::styled(name, Style::default().fg(color).add_modifier(Modifier::BOLD)),
    ];
    if message.is_revealing() {
        let note = if message.paused { "  paused" } else { "  streaming" };
        spans.push(Span::styled(note, Style::default().fg(theme.muted)));
    }
    Line::from(spans)
}

fn markdown_lines(
    text: &str,
    width: usize,
    theme: &Theme,
    cache: &mut HighlightCache,
) -> Vec<Line<'static>> {
    let segs = segments(text);
    let mut out = Vec::new();
    for (idx, seg) in segs.iter().enumerate() {
        match *seg {
            Segment::Text(prose) => {
                let mut prose = prose;
                if idx > 0 && segs[idx - 1].is_code() {
                    prose = prose.strip_prefix('\n').unwrap_or(prose);
                }
                if segs.get(idx + 1).is_some_and(Segment::is_code) {
                    prose = prose.strip_suffix('\n').unwrap_or(prose);
                }
                for line in prose.split('\n') {
                    out.extend(prose_line(line, width, theme));
                }
            }
            Segment::Code {
                language,
                body,
                closed,
            } => {
                let frame_style = Style::default().fg(theme.code_header);
                out.push(Line::from(vec![
                    Span::styled(format!("{INDENT}┌ "), frame_style),
                    Span::styled(language.to_owned(), frame_style.add_modifier(Modifier::ITALIC)),
                ]));
                for line in cache.get(body, language, theme.syntax_theme).iter() {
                    let mut spans = vec![Span::styled(format!("{INDENT}│ "), frame_style)];
                    spans.extend(line.spans.iter().cloned());
                    out.push(Line::from(spans));
                }
                if closed {
                    out.push(Line::from(Span::styled(format!("{INDENT}└"), frame_style)));
                }
            }
        }
    }
    out
}

/// Renders one line of prose: headings, bullets, `**bold**` and `code`.
fn prose_line(line: &str, width: usize, theme: &Theme) -> Vec<Line<'static>> {
    let base = Style::default().fg(theme.text);
    let heading = |level: usize, rest: &str| {
        let mut style = base.fg(theme.accent).add_modifier(Modifier::BOLD);
        if level == 1 {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        inline_spans(rest, style, theme)
    };

    let spans = if let Some(rest) = line.strip_prefix("### ") {
        heading(3, rest)
    } else if let Some(rest) = line.strip_prefix("## ") {
        heading(2, rest)
    } else if let Some(rest) = line.strip_prefix("# ") {
        heading(1, rest)
    } else if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        let mut spans = vec![Span::styled("• ", Style::default().fg(theme.accent))];
        spans.extend(inline_spans(rest, base, theme));
        spans
    } else {
        inline_spans(line, base, theme)
    };
    wrap_spans(spans, width)
}

fn inline_spans(text: &str, base: Style, theme: &Theme) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for (i, chunk) in text.split("**").enumerate() {
        for (j, piece) in chunk.split('`').enumerate() {
            if piece.is_empty() {
                continue;
            }
            let mut style = base;
            if i % 2 == 1 {
                style = style.add_modifier(Modifier::BOLD);
            }
            if j % 2 == 1 {
                style = style.fg(theme.accent);
            }
            spans.push(Span::styled(piece.to_owned(), style));
        }
    }
    spans
}

/// Word-wraps `spans` into lines of at most `width` cells, each indented.
/// A single word wider than the pane is left to overflow.
fn wrap_spans(spans: Vec<Span<'static>>, width: usize) -> Vec<Line<'static>> {
    let indent_width = INDENT.len();
    let mut lines = Vec::new();
    let mut current = vec![Span::raw(INDENT)];
    let mut col = indent_width;

    for span in spans {
        let style = span.style;
        for word in span.content.split_inclusive(' ') {
            let fit = Span::raw(word.trim_end()).width();
            if col + fit > width && col > indent_width {
                lines.push(Line::from(std::mem::replace(&mut current, vec![Span::raw(INDENT)])));
                col = indent_width;
            }
            col += Span::raw(word).width();
            current.push(Span::styled(word.to_owned(), style));
        }
    }
    lines.push(Line::from(current));
    lines
}

fn indent(line: Line<'static>) -> Line<'static> {
    let mut spans = vec![Span::raw(INDENT)];
    spans.extend(line.spans);
    Line::from(spans).style(line.style)
}
