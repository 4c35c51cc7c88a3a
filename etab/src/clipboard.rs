//! System clipboard access for the yank keys.
//!
//! Copies are piped into the platform's clipboard program. Terminals give a
//! TUI no clipboard of their own, and shelling out keeps etab free of a
//! windowing-system dependency.

use std::io::{self, Write};
use std::process::{Command, Stdio};

use tracing::debug;

/// Something text can be copied to.
pub trait Clipboard {
    /// Replaces the clipboard contents with `text`.
    ///
    /// # Errors
    ///
    /// Returns `Err` when no clipboard could take the text.
    fn copy(&mut self, text: &str) -> io::Result<()>;
}

/// Clipboard programs tried in order, with their arguments.
#[cfg(target_os = "macos")]
const PROGRAMS: &[(&str, &[&str])] = &[("pbcopy", &[])];

#[cfg(target_os = "windows")]
const PROGRAMS: &[(&str, &[&str])] = &[("clip", &[])];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const PROGRAMS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

/// The desktop clipboard, reached through `pbcopy`, `clip`, `wl-copy`,
/// `xclip` or `xsel`.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn copy(&mut self, text: &str) -> io::Result<()> {
        let mut last_error = io::Error::new(io::ErrorKind::NotFound, "no clipboard program");
        for (program, args) in PROGRAMS {
            match pipe_to(program, args, text) {
                Ok(()) => {
                    debug!(program, bytes = text.len(), "copied to clipboard");
                    return Ok(());
                }
                Err(error) => {
                    debug!(program, %error, "clipboard program failed");
                    last_error = error;
                }
            }
        }
        Err(last_error)
    }
}

/// Runs `program`, writes `text` to its stdin and waits for it to exit.
fn pipe_to(program: &str, args: &[&str], text: &str) -> io::Result<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    // Dropping stdin closes the pipe so the program sees EOF.
    let written = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(text.as_bytes()),
        None => Ok(()),
    };
    // Always reaped, even when the write failed.
    let status = child.wait()?;
    if !status.success() {
        return Err(io::Error::other(format!("{program} exited with {status}")));
    }
    written
}

/// Records copies in memory. `failing` clipboards reject every copy.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    pub copies: std::rc::Rc<std::cell::RefCell<Vec<String>>>,
    pub failing: bool,
}

#[cfg(test)]
impl Clipboard for MemoryClipboard {
    fn copy(&mut self, text: &str) -> io::Result<()> {
        if self.failing {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no clipboard"));
        }
        self.copies.borrow_mut().push(text.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_platform_has_a_program() {
        assert!(!PROGRAMS.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn missing_program_is_an_error() {
        let error = pipe_to("etab-no-such-clipboard-program", &[], "x").unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn program_reads_the_whole_text() {
        // `cat` drains stdin and exits 0 once the pipe closes.
        pipe_to("cat", &[], "line one\nline two\n").unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn failing_program_is_an_error() {
        let error = pipe_to("false", &[], "x").unwrap_err();
        assert!(error.to_string().contains("false exited"));
    }
}
