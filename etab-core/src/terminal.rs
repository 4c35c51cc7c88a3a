//! Mock terminal: a fixed table of canned command outputs.
//!
//! Nothing is executed. [`run_command`] looks the command up and returns the
//! lines a real shell might have printed; [`Transcript`] keeps the scrollback.

use std::time::Duration;

/// Shortest simulated command latency.
pub const MIN_LATENCY: Duration = Duration::from_millis(300);
/// Longest simulated command latency (exclusive).
pub const MAX_LATENCY: Duration = Duration::from_millis(800);

pub const WORKING_DIRECTORY: &str = "/workspace/etab-vscode-extension";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalLineKind {
    Command,
    Output,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalLine {
    pub kind: TerminalLineKind,
    pub content: String,
}

impl TerminalLine {
    pub fn new(kind: TerminalLineKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
        }
    }

    pub fn command(content: impl Into<String>) -> Self {
        Self::new(TerminalLineKind::Command, content)
    }

    pub fn output(content: impl Into<String>) -> Self {
        Self::new(TerminalLineKind::Output, content)
    }

    pub fn info(content: impl Into<String>) -> Self {
        Self::new(TerminalLineKind::Info, content)
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(TerminalLineKind::Error, content)
    }
}

/// What a command does to the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Append these lines.
    Lines(Vec<TerminalLine>),
    /// Wipe the transcript.
    Clear,
}

/// Looks up the canned result of `command`. Matching ignores case and
/// surrounding whitespace. A blank command produces no lines.
pub fn run_command(command: &str) -> CommandOutcome {
    use TerminalLine as L;

    let normalized = command.trim().to_lowercase();
    let lines = match normalized.as_str() {
        "clear" => return CommandOutcome::Clear,
        "" => Vec::new(),
        "help" => vec![
            L::info("Available commands:"),
            L::info("  help     - Show this help message"),
            L::info("  clear    - Clear terminal"),
            L::info("  ls       - List files"),
            L::info("  pwd      - Print working directory"),
            L::info("  npm run dev - Start development server"),
            L::info("  git status - Show git status"),
        ],
        "ls" => ["src/", "public/", "package.json", "tsconfig.json", "vite.config.ts"]
            .into_iter()
            .map(L::output)
            .collect(),
        "pwd" => vec![L::output(WORKING_DIRECTORY)],
        "npm run dev" => vec![
            L::info("Starting development server..."),
            L::output("> etab@1.0.0 dev"),
            L::output("> vite"),
            L::output(""),
            L::output("  VITE v5.0.0  ready in 1234 ms"),
            L::output(""),
            L::output("  ➜  Local:   http://localhost:3000/"),
            L::output("  ➜  Network: use --host to expose"),
        ],
        "git status" => [
            "On branch main",
            "Your branch is up to date with 'origin/main'.",
            "",
            "Changes not staged for commit:",
            "  (use \"git add <file>...\" to update what will be committed)",
            "  (use \"git restore <file>...\" to discard changes in working directory)",
            "        modified:   src/components/ChatInterface.tsx",
            "",
            "no changes added to commit (use \"git add\" or \"git commit -a\")",
        ]
        .into_iter()
        .map(L::output)
        .collect(),
        _ => vec![
            L::error(format!("Command not found: {}", command.trim())),
            L::info("Type \"help\" for available commands"),
        ],
    };
    CommandOutcome::Lines(lines)
}

/// Terminal scrollback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    lines: Vec<TerminalLine>,
}

impl Transcript {
    pub fn new(lines: Vec<TerminalLine>) -> Self {
        Self { lines }
    }

    /// Transcript shown when the terminal tab first opens.
    pub fn welcome() -> Self {
        Self::new(vec![TerminalLine::info(
            "Welcome to ETAB Terminal! Type \"help\" for available commands.",
        )])
    }

    pub fn lines(&self) -> &[TerminalLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Echoes `command` as a `$ ` line. Returns `false` (and records nothing)
    /// for blank input.
    pub fn submit(&mut self, command: &str) -> bool {
        let command = command.trim();
        if command.is_empty() {
            return false;
        }
        self.lines.push(TerminalLine::command(format!("$ {command}")));
        true
    }

    pub fn apply(&mut self, outcome: CommandOutcome) {
        match outcome {
            CommandOutcome::Lines(lines) => self.lines.extend(lines),
            CommandOutcome::Clear => self.lines.clear(),
        }
    }

    /// Copy-all text: commands flush left, everything else indented two spaces.
    pub fn copy_text(&self) -> String {
        self.lines
            .iter()
            .map(|line| match line.kind {
                TerminalLineKind::Command => line.content.clone(),
                _ => format!("  {}", line.content),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
