//! Syntax highlighting for code blocks and diff lines.
//!
//! syntect's default syntax and theme sets are loaded lazily once per
//! process. Highlighted blocks are cached by (code, language, theme) because
//! the chat is redrawn at 30 FPS while finished messages never change.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEMES: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

/// Entries kept before the cache is flushed. Streaming code blocks produce a
/// new entry per tick, so the cache is cleared rather than grown.
const CACHE_LIMIT: usize = 64;

/// Resolves a fence language to a syntax, falling back to plain text.
///
/// The default syntect set has no TypeScript grammar, so the TypeScript and
/// JSX family is highlighted as JavaScript.
fn syntax_for(language: &str) -> &'static SyntaxReference {
    let language = language.to_ascii_lowercase();
    let token = match language.as_str() {
        "typescript" | "ts" | "tsx" | "jsx" | "javascript" => "js",
        "shell" | "bash" | "zsh" | "console" => "sh",
        other => other,
    };
    SYNTAXES
        .find_syntax_by_token(token)
        .unwrap_or_else(|| SYNTAXES.find_syntax_plain_text())
}

/// Converts a syntect style and text into an owned ratatui span.
///
/// Only the foreground and font style are carried over; syntect's background
/// would paint a ragged box behind the text in a terminal.
fn syntect_to_span(style: syntect::highlighting::Style, content: &str) -> Span<'static> {
    let fg = style.foreground;
    let mut ratatui_style = Style::default();
    if fg.a > 0 {
        ratatui_style = ratatui_style.fg(Color::Rgb(fg.r, fg.g, fg.b));
    }
    if style.font_style.contains(FontStyle::BOLD) {
        ratatui_style = ratatui_style.add_modifier(Modifier::BOLD);
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        ratatui_style = ratatui_style.add_modifier(Modifier::ITALIC);
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        ratatui_style = ratatui_style.add_modifier(Modifier::UNDERLINED);
    }
    Span::styled(content.to_owned(), ratatui_style)
}

/// Stateful highlighter for consecutive lines of one code listing.
pub struct LineHighlighter {
    inner: Option<HighlightLines<'static>>,
}

impl LineHighlighter {
    /// # Arguments
    ///
    /// * `language` — fence language or file language, e.g. `"typescript"`
    /// * `theme_name` — syntect theme name from the active [`crate::theme::Theme`]
    pub fn new(language: &str, theme_name: &str) -> Self {
        let theme = THEMES
            .themes
            .get(theme_name)
            .or_else(|| THEMES.themes.values().next());
        Self {
            inner: theme.map(|theme| HighlightLines::new(syntax_for(language), theme)),
        }
    }

    /// Highlights one line. `line` may or may not end with a newline; the
    /// returned spans never contain one.
    pub fn spans(&mut self, line: &str) -> Vec<Span<'static>> {
        let bare = line.trim_end_matches(['\n', '\r']);
        let Some(highlighter) = self.inner.as_mut() else {
            return vec![Span::raw(bare.to_owned())];
        };
        // The newline-aware syntax set expects each line to keep its `\n`.
        let owned;
        let input = if line.ends_with('\n') {
            line
        } else {
            owned = format!("{line}\n");
            &owned
        };
        match highlighter.highlight_line(input, &SYNTAXES) {
            Ok(ranges) => ranges
                .into_iter()
                .filter_map(|(style, text)| {
                    let text = text.trim_end_matches(['\n', '\r']);
                    (!text.is_empty()).then(|| syntect_to_span(style, text))
                })
                .collect(),
            Err(_) => vec![Span::raw(bare.to_owned())],
        }
    }
}

/// Highlights a whole listing into one `Line` per source line.
pub fn highlight_code(code: &str, language: &str, theme_name: &str) -> Vec<Line<'static>> {
    let mut highlighter = LineHighlighter::new(language, theme_name);
    LinesWithEndings::from(code)
        .map(|line| Line::from(highlighter.spans(line)))
        .collect()
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    code: String,
    language: String,
    theme: &'static str,
}

/// Cache of highlighted listings.
#[derive(Default)]
pub struct HighlightCache {
    entries: HashMap<CacheKey, Arc<[Line<'static>]>>,
}

impl HighlightCache {
    pub fn get(&mut self, code: &str, language: &str, theme: &'static str) -> Arc<[Line<'static>]> {
        let key = CacheKey {
            code: code.to_owned(),
            language: language.to_owned(),
            theme,
        };
        if let Some(hit) = self.entries.get(&key) {
            return Arc::clone(hit);
        }
        if self.entries.len() >= CACHE_LIMIT {
            self.entries.clear();
        }
        let lines: Arc<[Line<'static>]> = highlight_code(code, language, theme).into();
        self.entries.insert(key, Arc::clone(&lines));
        lines
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn highlighting_keeps_text_and_drops_newlines() {
        let lines = highlight_code("const a = 1\nlet b = 'x'", "typescript", "base16-ocean.dark");
        assert_eq!(lines.len(), 2);
        assert_eq!(text_of(&lines[0]), "const a = 1");
        assert_eq!(text_of(&lines[1]), "let b = 'x'");
        assert!(lines[0].spans.iter().any(|s| s.style.fg.is_some()));
    }

    #[test]
    fn unknown_language_and_theme_still_render() {
        let lines = highlight_code("plain words", "klingon", "no-such-theme");
        assert_eq!(text_of(&lines[0]), "plain words");
        assert!(highlight_code("", "rust", "InspiredGitHub").is_empty());
    }

    #[test]
    fn cache_reuses_entries() {
        let mut cache = HighlightCache::default();
        let a = cache.get("fn main() {}", "rust", "base16-ocean.dark");
        let b = cache.get("fn main() {}", "rust", "base16-ocean.dark");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
        cache.get("fn main() {}", "rust", "InspiredGitHub");
        assert_eq!(cache.len(), 2);
    }
}
