//! Incremental text reveal driven by timer ticks.
//!
//! A session exposes its target one `char` per tick, reporting every new
//! prefix to a [`RevealObserver`] and calling `on_complete` exactly once when
//! the whole target is visible.
//!
//! ```text
//! Streaming ──tick──▶ Streaming ──last char──▶ Completed
//!     │  ▲
//! pause  resume
//!     ▼  │
//!   Paused          (cancel from Streaming or Paused ──▶ Cancelled)
//! ```

mod engine;
mod session;

use std::fmt;
use std::time::Duration;

pub use engine::RevealEngine;
pub use session::RevealSession;

use crate::error::RevealError;

/// Default tick interval for chat messages.
pub const DEFAULT_MESSAGE_RATE: Duration = Duration::from_millis(20);

/// Handle naming one reveal session within an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The view a session belongs to. An owner has at most one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId(pub u64);

/// Lifecycle state of a reveal session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealState {
    Streaming,
    Paused,
    Completed,
    Cancelled,
}

impl RevealState {
    /// `true` for `Streaming` and `Paused`.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Streaming | Self::Paused)
    }
}

/// Parameters for starting a session.
#[derive(Debug, Clone)]
pub struct RevealRequest {
    /// Text to reveal. Required.
    pub target: Option<String>,
    /// Delay between ticks. Must be non-zero.
    pub rate: Duration,
    /// When `false` the full target is shown at once and no ticks run.
    pub streaming: bool,
}

impl Default for RevealRequest {
    fn default() -> Self {
        Self {
            target: None,
            rate: DEFAULT_MESSAGE_RATE,
            streaming: true,
        }
    }
}

impl RevealRequest {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
            ..Self::default()
        }
    }

    pub fn rate(mut self, rate: Duration) -> Self {
        self.rate = rate;
        self
    }

    pub fn streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    fn validate(self) -> Result<(String, Duration, bool), RevealError> {
        let target = self.target.ok_or(RevealError::MissingTarget)?;
        if self.rate.is_zero() {
            return Err(RevealError::InvalidRate);
        }
        Ok((target, self.rate, self.streaming))
    }
}

/// Receives the events of one session.
///
/// Any `FnMut(&str)` closure is an observer that only listens to progress.
pub trait RevealObserver {
    /// The revealed prefix grew; `revealed` is the whole visible prefix.
    fn on_progress(&mut self, revealed: &str);

    /// The full target is visible. Called at most once per session.
    fn on_complete(&mut self) {}

    /// Ticking failed and the session was cancelled.
    fn on_error(&mut self, _error: &RevealError) {}
}

impl<F: FnMut(&str)> RevealObserver for F {
    fn on_progress(&mut self, revealed: &str) {
        self(revealed)
    }
}
