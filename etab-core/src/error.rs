//! Error types shared by the reveal engine and its schedulers.

use crate::reveal::{RevealState, SessionId};

/// Failure to arm a timer with the host's timer facility.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    /// No async runtime is running on the current thread.
    #[error("no async runtime is available to drive timers")]
    NoRuntime,
    /// The timer facility declined to arm a new timer.
    #[error("timer facility refused to arm a new timer")]
    Refused,
}

/// Errors surfaced by [`RevealEngine`](crate::reveal::RevealEngine) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RevealError {
    /// The request carried no target text.
    #[error("reveal request has no target text")]
    MissingTarget,
    /// The tick interval was zero.
    #[error("reveal rate must be greater than zero")]
    InvalidRate,
    /// The handle does not name a live session.
    #[error("unknown reveal session {0}")]
    UnknownSession(SessionId),
    /// The session already reached a terminal state.
    #[error("reveal session {id} already finished ({state:?})")]
    Finished {
        /// Session the operation targeted.
        id: SessionId,
        /// Terminal state the session is in.
        state: RevealState,
    },
    /// Arming the next tick failed; the session was cancelled.
    #[error("failed to schedule reveal tick: {0}")]
    Schedule(#[from] ScheduleError),
}
