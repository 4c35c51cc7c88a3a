//! Code-diff renderer.
//!
//! Turns a [`CodeDiff`] into styled lines shown under the assistant message
//! that carries it: a collapsible header with the title, filename and
//! added/removed counts, then one row per diff line with a line-number gutter
//! and `+`/`-`/` ` prefix. Replace pairs get word-level emphasis so the
//! changed words stand out inside otherwise similar lines.

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use similar::{ChangeTag, TextDiff};

use etab_core::diff::{CodeDiff, DiffLine, DiffLineKind, DiffRow};

use crate::theme::Theme;
use crate::ui::highlight::LineHighlighter;

/// Builds the lines of a diff card.
///
/// # Arguments
///
/// * `diff` — the diff to show
/// * `open` — `false` renders only the header (the card is collapsed)
/// * `theme` — active color theme
pub fn diff_lines(diff: &CodeDiff, open: bool, theme: &Theme) -> Vec<Line<'static>> {
    let mut out = vec![header_line(diff, open, theme)];
    if !open {
        return out;
    }

    let width = gutter_width(&diff.lines);
    let mut highlighter = LineHighlighter::new(&diff.language, theme.syntax_theme);

    for row in diff.rows() {
        match row {
            DiffRow::Line(line) => {
                let content = match line.kind {
                    DiffLineKind::Unchanged => highlighter.spans(&line.content),
                    _ => vec![Span::styled(line.content.clone(), kind_style(line.kind, theme))],
                };
                out.push(row_line(line, width, content, theme));
            }
            DiffRow::Modified { old, new } => {
                let (old_words, new_words) = word_diff_spans(&old.content, &new.content, theme);
                out.push(row_line(old, width, old_words, theme));
                out.push(row_line(new, width, new_words, theme));
            }
        }
    }
    out
}

fn header_line(diff: &CodeDiff, open: bool, theme: &Theme) -> Line<'static> {
    let stats = diff.stats();
    let mut spans = vec![
        Span::styled(if open { "▾ " } else { "▸ " }, Style::default().fg(theme.muted)),
        Span::styled(
            diff.title.clone(),
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        ),
    ];
    if let Some(filename) = &diff.filename {
        spans.push(Span::styled(format!("  {filename}"), Style::default().fg(theme.muted)));
    }
    if stats.added > 0 {
        spans.push(Span::styled(
            format!("  +{}", stats.added),
            Style::default().fg(theme.diff_added),
        ));
    }
    if stats.removed > 0 {
        spans.push(Span::styled(
            format!("  -{}", stats.removed),
            Style::default().fg(theme.diff_removed),
        ));
    }
    Line::from(spans)
}

fn gutter_width(lines: &[DiffLine]) -> usize {
    let max = lines
        .iter()
        .filter_map(DiffLine::gutter_lineno)
        .max()
        .unwrap_or(0);
    max.to_string().len().max(2)
}

fn kind_style(kind: DiffLineKind, theme: &Theme) -> Style {
    match kind {
        DiffLineKind::Added => Style::default().fg(theme.diff_added),
        DiffLineKind::Removed => Style::default().fg(theme.diff_removed),
        DiffLineKind::Unchanged => Style::default().fg(theme.diff_context),
    }
}

fn row_line(line: &DiffLine, width: usize, content: Vec<Span<'static>>, theme: &Theme) -> Line<'static> {
    let gutter = match line.gutter_lineno() {
        Some(n) => format!("{n:>width$} "),
        None => " ".repeat(width + 1),
    };
    let mut spans = vec![
        Span::styled(gutter, Style::default().fg(theme.diff_gutter)),
        Span::styled(format!("{} ", line.prefix()), kind_style(line.kind, theme)),
    ];
    spans.extend(content);
    Line::from(spans)
}

/// Computes word-level spans for a removed/added line pair.
///
/// Returns the old line's spans and the new line's spans. Words present on
/// only one side are bold; shared words are dimmed.
fn word_diff_spans(
    old_line: &str,
    new_line: &str,
    theme: &Theme,
) -> (Vec<Span<'static>>, Vec<Span<'static>>) {
    let diff = TextDiff::from_words(old_line, new_line);
    let mut old_spans = Vec::new();
    let mut new_spans = Vec::new();

    for op in diff.ops() {
        for change in diff.iter_inline_changes(op) {
            for (emphasized, value) in change.iter_strings_lossy() {
                let text = value.into_owned();
                match change.tag() {
                    ChangeTag::Delete => {
                        old_spans.push(Span::styled(text, emphasis(theme.diff_removed, emphasized)));
                    }
                    ChangeTag::Insert => {
                        new_spans.push(Span::styled(text, emphasis(theme.diff_added, emphasized)));
                    }
                    ChangeTag::Equal => {
                        let style = Style::default().fg(theme.diff_context);
                        old_spans.push(Span::styled(text.clone(), style));
                        new_spans.push(Span::styled(text, style));
                    }
                }
            }
        }
    }
    (old_spans, new_spans)
}

fn emphasis(color: ratatui::style::Color, emphasized: bool) -> Style {
    let style = Style::default().fg(color);
    if emphasized {
        style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        style
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use etab_core::responder::suggested_change;

    fn text_of(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn open_card_has_one_row_per_diff_line() {
        let diff = suggested_change();
        let lines = diff_lines(&diff, true, &Theme::dark());
        assert_eq!(lines.len(), 1 + diff.lines.len());

        let header = text_of(&lines[0]);
        let stats = diff.stats();
        assert!(header.contains("Suggested Changes"));
        assert!(header.contains("src/components/Example.tsx"));
        assert!(header.contains(&format!("+{}", stats.added)));
        assert!(header.contains(&format!("-{}", stats.removed)));
    }

    #[test]
    fn collapsed_card_is_header_only() {
        let lines = diff_lines(&suggested_change(), false, &Theme::light());
        assert_eq!(lines.len(), 1);
        assert!(text_of(&lines[0]).starts_with("▸ "));
    }

    #[test]
    fn rows_carry_gutter_prefix_and_content() {
        let diff = CodeDiff::from_texts("t", "a\nb", "a\nc\nd");
        let lines = diff_lines(&diff, true, &Theme::dark());
        let rows: Vec<String> = lines[1..].iter().map(text_of).collect();
        assert_eq!(rows, vec![" 1   a", " 2 - b", " 2 + c", " 3 + d"]);
    }

    #[test]
    fn word_diff_keeps_both_sides_text() {
        let (old, new) = word_diff_spans("let a = 1;", "let a = 2;", &Theme::dark());
        let old_text: String = old.iter().map(|s| s.content.as_ref()).collect();
        let new_text: String = new.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(old_text, "let a = 1;");
        assert_eq!(new_text, "let a = 2;");
        assert!(new
            .iter()
            .any(|s| s.style.add_modifier.contains(Modifier::BOLD)));
    }
}
