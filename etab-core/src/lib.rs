//! Core engines for the etab assistant simulator.
//!
//! Two engines carry the real logic: a positional line diff ([`diff`]) and a
//! timer-driven incremental text reveal ([`reveal`]). Timers go through the
//! [`scheduler::Scheduler`] seam so the reveal state machine can run against a
//! virtual clock in tests and against tokio in the application.
//!
//! The remaining modules hold the canned content the simulator serves:
//! reply templates, the mock terminal's command table, and the fenced-code
//! segmentation applied to revealed text.

pub mod diff;
pub mod error;
pub mod markdown;
pub mod responder;
pub mod reveal;
pub mod scheduler;
pub mod terminal;

pub use error::{RevealError, ScheduleError};
