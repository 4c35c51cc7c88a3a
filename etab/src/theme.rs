//! Color themes for etab.
//!
//! The user picks a [`ThemePreference`] (`light`, `dark` or `system`). `system`
//! is resolved once at startup from what the hosting terminal advertises, the
//! same way an editor webview follows the editor's theme. A resolved
//! [`Appearance`] selects one of the two built-in [`Theme`] palettes.

use ratatui::style::Color;
use serde::Deserialize;

/// Theme as chosen in config or cycled with `T`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemePreference {
    /// Cycle order: light → dark → system → light.
    pub fn next(self) -> Self {
        match self {
            ThemePreference::Light => ThemePreference::Dark,
            ThemePreference::Dark => ThemePreference::System,
            ThemePreference::System => ThemePreference::Light,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
            ThemePreference::System => "system",
        }
    }

    /// Resolves the preference, using `system` for the `System` case.
    pub fn resolve(self, system: Appearance) -> Appearance {
        match self {
            ThemePreference::Light => Appearance::Light,
            ThemePreference::Dark => Appearance::Dark,
            ThemePreference::System => system,
        }
    }
}

/// A concrete light or dark appearance.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Appearance {
    Light,
    #[default]
    Dark,
}

impl Appearance {
    pub fn label(self) -> &'static str {
        match self {
            Appearance::Light => "light",
            Appearance::Dark => "dark",
        }
    }

    /// Guesses the terminal's appearance from its environment.
    ///
    /// `COLORFGBG` (set by rxvt, Konsole, iTerm2 and others) carries the
    /// background palette index as its last field: 7 and 15 are light
    /// backgrounds, everything else is dark. Apple Terminal defaults to a
    /// light profile. Anything unknown is treated as dark.
    ///
    /// # Arguments
    ///
    /// * `var` — environment lookup, `std::env::var(..).ok()` in production
    pub fn detect(var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(colorfgbg) = var("COLORFGBG") {
            let background = colorfgbg.rsplit(';').next().and_then(|bg| bg.trim().parse::<u8>().ok());
            return match background {
                Some(7 | 15) => Appearance::Light,
                _ => Appearance::Dark,
            };
        }
        match var("TERM_PROGRAM").as_deref() {
            Some("Apple_Terminal") => Appearance::Light,
            _ => Appearance::Dark,
        }
    }
}

/// All color values used across etab's UI surfaces.
#[derive(Debug, Clone)]
pub struct Theme {
    // Panel borders
    /// Border color for the focused panel (the input box in insert mode).
    pub border_active: Color,
    pub border_inactive: Color,

    // Chat
    /// Author line of the user's messages.
    pub user: Color,
    /// Author line of assistant messages.
    pub assistant: Color,
    /// Body text.
    pub text: Color,
    /// Hints and the "thinking" indicator.
    pub muted: Color,
    /// Headings and inline emphasis.
    pub accent: Color,
    /// Marker of the selected message.
    pub selection: Color,
    /// Header row of code blocks.
    pub code_header: Color,

    // Diff view
    pub diff_added: Color,
    pub diff_removed: Color,
    pub diff_context: Color,
    pub diff_gutter: Color,

    // Terminal
    pub terminal_command: Color,
    pub terminal_output: Color,
    pub terminal_error: Color,
    pub terminal_info: Color,

    // Status bar
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub status_mode_normal: Color,
    pub status_mode_insert: Color,

    /// Name of the syntect theme used for code blocks.
    pub syntax_theme: &'static str,
}

impl Theme {
    /// The dark palette, ANSI 16 colors only so it works on any terminal.
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,

            user: Color::LightBlue,
            assistant: Color::LightMagenta,
            text: Color::Reset,
            muted: Color::DarkGray,
            accent: Color::Cyan,
            selection: Color::Cyan,
            code_header: Color::Gray,

            diff_added: Color::Green,
            diff_removed: Color::Red,
            diff_context: Color::Gray,
            diff_gutter: Color::DarkGray,

            terminal_command: Color::LightBlue,
            terminal_output: Color::Reset,
            terminal_error: Color::LightRed,
            terminal_info: Color::Yellow,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_mode_normal: Color::Cyan,
            status_mode_insert: Color::Green,

            syntax_theme: "base16-ocean.dark",
        }
    }

    /// The light palette. Avoids the bright ANSI colors that wash out on
    /// white backgrounds.
    pub fn light() -> Self {
        Self {
            border_active: Color::Blue,
            border_inactive: Color::Gray,

            user: Color::Blue,
            assistant: Color::Magenta,
            text: Color::Reset,
            muted: Color::Gray,
            accent: Color::Blue,
            selection: Color::Blue,
            code_header: Color::DarkGray,

            diff_added: Color::Green,
            diff_removed: Color::Red,
            diff_context: Color::DarkGray,
            diff_gutter: Color::Gray,

            terminal_command: Color::Blue,
            terminal_output: Color::Reset,
            terminal_error: Color::Red,
            terminal_info: Color::Rgb(154, 103, 0),

            status_bar_bg: Color::Gray,
            status_bar_fg: Color::Black,
            status_mode_normal: Color::Blue,
            status_mode_insert: Color::Green,

            syntax_theme: "InspiredGitHub",
        }
    }

    pub fn for_appearance(appearance: Appearance) -> Self {
        match appearance {
            Appearance::Light => Self::light(),
            Appearance::Dark => Self::dark(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_owned())
        }
    }

    #[test]
    fn colorfgbg_background_decides() {
        assert_eq!(Appearance::detect(env(&[("COLORFGBG", "0;15")])), Appearance::Light);
        assert_eq!(Appearance::detect(env(&[("COLORFGBG", "15;default;0")])), Appearance::Dark);
        assert_eq!(Appearance::detect(env(&[("COLORFGBG", "garbage")])), Appearance::Dark);
    }

    #[test]
    fn apple_terminal_defaults_light_and_unknown_is_dark() {
        assert_eq!(
            Appearance::detect(env(&[("TERM_PROGRAM", "Apple_Terminal")])),
            Appearance::Light
        );
        assert_eq!(Appearance::detect(env(&[])), Appearance::Dark);
    }

    #[test]
    fn preference_cycles_and_resolves() {
        let pref = ThemePreference::Light;
        assert_eq!(pref.next().next().next(), pref);
        assert_eq!(ThemePreference::System.resolve(Appearance::Light), Appearance::Light);
        assert_eq!(ThemePreference::Dark.resolve(Appearance::Light), Appearance::Dark);
    }

    #[test]
    fn palettes_use_distinct_syntax_themes() {
        assert_ne!(Theme::dark().syntax_theme, Theme::light().syntax_theme);
    }
}
