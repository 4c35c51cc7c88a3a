use std::time::Duration;

use super::RevealState;
use crate::scheduler::TimerId;

/// State of one reveal: the target, how much of it is visible, and the single
/// timer currently armed for it.
#[derive(Debug, Clone)]
pub struct RevealSession {
    target: String,
    /// Chars revealed.
    cursor: usize,
    /// Byte offset of the end of the revealed prefix.
    offset: usize,
    len: usize,
    rate: Duration,
    pub(super) state: RevealState,
    pub(super) pending: Option<TimerId>,
}

impl RevealSession {
    pub(super) fn new(target: String, rate: Duration) -> Self {
        let len = target.chars().count();
        Self {
            target,
            cursor: 0,
            offset: 0,
            len,
            rate,
            state: RevealState::Streaming,
            pending: None,
        }
    }

    /// A session that starts (and ends) fully revealed.
    pub(super) fn shown(target: String, rate: Duration) -> Self {
        let mut session = Self::new(target, rate);
        session.cursor = session.len;
        session.offset = session.target.len();
        session.state = RevealState::Completed;
        session
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Number of chars revealed so far.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Length of the target in chars.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn rate(&self) -> Duration {
        self.rate
    }

    pub fn state(&self) -> RevealState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.state == RevealState::Paused
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// The visible prefix.
    pub fn revealed(&self) -> &str {
        &self.target[..self.offset]
    }

    pub fn is_fully_revealed(&self) -> bool {
        self.cursor == self.len
    }

    /// Timer armed for the next tick, if any.
    pub fn pending_timer(&self) -> Option<TimerId> {
        self.pending
    }

    /// Reveals one more char. Returns `false` when nothing was left.
    pub(super) fn advance(&mut self) -> bool {
        match self.target[self.offset..].chars().next() {
            Some(ch) => {
                self.offset += ch.len_utf8();
                self.cursor += 1;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_steps_over_multibyte_chars() {
        let mut session = RevealSession::new("añ✅".to_owned(), Duration::from_millis(1));
        assert_eq!(session.len(), 3);
        assert!(session.advance());
        assert!(session.advance());
        assert_eq!(session.revealed(), "añ");
        assert!(session.advance());
        assert_eq!(session.revealed(), "añ✅");
        assert!(session.is_fully_revealed());
        assert!(!session.advance());
        assert_eq!(session.cursor(), 3);
    }

    #[test]
    fn shown_session_is_complete_without_ticks() {
        let session = RevealSession::shown("done".to_owned(), Duration::from_millis(1));
        assert_eq!(session.revealed(), "done");
        assert_eq!(session.state(), RevealState::Completed);
        assert!(session.pending_timer().is_none());
    }
}
