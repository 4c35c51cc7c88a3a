use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, trace, warn};

use super::{OwnerId, RevealObserver, RevealRequest, RevealSession, RevealState, SessionId};
use crate::error::RevealError;
use crate::scheduler::{Scheduler, TimerId, VirtualClock};

struct Slot {
    session: RevealSession,
    observer: Box<dyn RevealObserver>,
}

/// Owns every reveal session and the scheduler that ticks them.
///
/// Single-threaded: all operations take `&mut self` and observers run inline
/// on the caller's thread. The host delivers due timers through [`fire`].
///
/// [`fire`]: RevealEngine::fire
pub struct RevealEngine<S: Scheduler> {
    scheduler: S,
    sessions: HashMap<SessionId, Slot>,
    timers: HashMap<TimerId, SessionId>,
    owners: HashMap<OwnerId, SessionId>,
    next_id: u64,
}

impl<S: Scheduler> RevealEngine<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            sessions: HashMap::new(),
            timers: HashMap::new(),
            owners: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Starts a session with no owning view.
    ///
    /// # Errors
    ///
    /// [`RevealError::MissingTarget`] or [`RevealError::InvalidRate`] when the
    /// request is malformed. Scheduling failures are not returned here; they
    /// reach the observer's `on_error` and leave the session `Cancelled`.
    pub fn start(
        &mut self,
        request: RevealRequest,
        observer: impl RevealObserver + 'static,
    ) -> Result<SessionId, RevealError> {
        self.open(None, request, Box::new(observer))
    }

    /// Starts a session for `owner`, replacing whatever session it had.
    ///
    /// The previous session's pending tick is disarmed before the new session
    /// exists, so no tick of the old target can fire afterwards.
    pub fn start_for(
        &mut self,
        owner: OwnerId,
        request: RevealRequest,
        observer: impl RevealObserver + 'static,
    ) -> Result<SessionId, RevealError> {
        let (target, rate, streaming) = request.validate()?;
        self.release_owner(owner);
        self.open_validated(Some(owner), target, rate, streaming, Box::new(observer))
    }

    fn open(
        &mut self,
        owner: Option<OwnerId>,
        request: RevealRequest,
        observer: Box<dyn RevealObserver>,
    ) -> Result<SessionId, RevealError> {
        let (target, rate, streaming) = request.validate()?;
        self.open_validated(owner, target, rate, streaming, observer)
    }

    fn open_validated(
        &mut self,
        owner: Option<OwnerId>,
        target: String,
        rate: Duration,
        streaming: bool,
        mut observer: Box<dyn RevealObserver>,
    ) -> Result<SessionId, RevealError> {
        self.next_id += 1;
        let id = SessionId(self.next_id);

        let mut slot = if streaming {
            Slot {
                session: RevealSession::new(target, rate),
                observer,
            }
        } else {
            let session = RevealSession::shown(target, rate);
            observer.on_progress(session.revealed());
            Slot {
                session,
                observer,
            }
        };

        debug!(
            session = %id,
            chars = slot.session.len(),
            rate_ms = rate.as_millis() as u64,
            streaming,
            "reveal session started"
        );

        if streaming {
            arm(&mut self.scheduler, &mut self.timers, id, &mut slot);
        }
        if let Some(owner) = owner {
            self.owners.insert(owner, id);
        }
        self.sessions.insert(id, slot);
        Ok(id)
    }

    /// Freezes a streaming session at its current cursor.
    ///
    /// Pausing a paused session is a no-op.
    pub fn pause(&mut self, id: SessionId) -> Result<(), RevealError> {
        let slot = self.slot_mut(id)?;
        match slot.session.state {
            RevealState::Paused => return Ok(()),
            RevealState::Streaming => {}
            state => return Err(RevealError::Finished { id, state }),
        }
        let timer = slot.session.pending.take();
        slot.session.state = RevealState::Paused;
        if let Some(timer) = timer {
            self.disarm(timer);
        }
        debug!(session = %id, "reveal session paused");
        Ok(())
    }

    /// Continues a paused session from where it stopped.
    ///
    /// Resuming a streaming session is a no-op.
    pub fn resume(&mut self, id: SessionId) -> Result<(), RevealError> {
        let Self {
            scheduler,
            sessions,
            timers,
            ..
        } = self;
        let slot = sessions.get_mut(&id).ok_or(RevealError::UnknownSession(id))?;
        match slot.session.state {
            RevealState::Streaming => return Ok(()),
            RevealState::Paused => {}
            state => return Err(RevealError::Finished { id, state }),
        }
        slot.session.state = RevealState::Streaming;
        debug!(session = %id, cursor = slot.session.cursor(), "reveal session resumed");
        arm(scheduler, timers, id, slot);
        Ok(())
    }

    /// Pauses a streaming session or resumes a paused one. Returns the new state.
    pub fn toggle_pause(&mut self, id: SessionId) -> Result<RevealState, RevealError> {
        match self.state(id) {
            Some(RevealState::Streaming) => self.pause(id)?,
            Some(RevealState::Paused) => self.resume(id)?,
            Some(state) => return Err(RevealError::Finished { id, state }),
            None => return Err(RevealError::UnknownSession(id)),
        }
        self.state(id).ok_or(RevealError::UnknownSession(id))
    }

    /// Stops a session for good. Returns `true` if it was active.
    ///
    /// Idempotent: cancelling a finished or unknown session does nothing. Once
    /// this returns, no callback of the session will run again.
    pub fn cancel(&mut self, id: SessionId) -> bool {
        let Some(slot) = self.sessions.get_mut(&id) else {
            return false;
        };
        if !slot.session.state.is_active() {
            return false;
        }
        let timer = slot.session.pending.take();
        slot.session.state = RevealState::Cancelled;
        if let Some(timer) = timer {
            self.disarm(timer);
        }
        debug!(session = %id, "reveal session cancelled");
        true
    }

    /// Cancels and forgets the session owned by `owner`, if any.
    pub fn release_owner(&mut self, owner: OwnerId) {
        if let Some(id) = self.owners.remove(&owner) {
            self.cancel(id);
            self.sessions.remove(&id);
        }
    }

    /// Runs the tick armed as `timer`. Returns `false` for timers that no
    /// longer belong to an active session (cancelled, paused, replaced).
    pub fn fire(&mut self, timer: TimerId) -> bool {
        self.scheduler.retire(timer);
        let Some(id) = self.timers.remove(&timer) else {
            trace!(timer = timer.as_u64(), "ignoring stale reveal tick");
            return false;
        };
        let Self {
            scheduler,
            sessions,
            timers,
            ..
        } = self;
        let Some(slot) = sessions.get_mut(&id) else {
            return false;
        };
        if slot.session.pending != Some(timer) || slot.session.state != RevealState::Streaming {
            return false;
        }
        slot.session.pending = None;

        if slot.session.advance() {
            trace!(session = %id, cursor = slot.session.cursor(), "reveal tick");
            slot.observer.on_progress(slot.session.revealed());
        }
        if slot.session.is_fully_revealed() {
            slot.session.state = RevealState::Completed;
            debug!(session = %id, "reveal session completed");
            slot.observer.on_complete();
        } else {
            arm(scheduler, timers, id, slot);
        }
        true
    }

    pub fn state(&self, id: SessionId) -> Option<RevealState> {
        self.sessions.get(&id).map(|slot| slot.session.state)
    }

    pub fn session(&self, id: SessionId) -> Option<&RevealSession> {
        self.sessions.get(&id).map(|slot| &slot.session)
    }

    /// The current session of `owner`.
    pub fn session_for(&self, owner: OwnerId) -> Option<(SessionId, &RevealSession)> {
        let id = *self.owners.get(&owner)?;
        self.session(id).map(|session| (id, session))
    }

    /// Number of sessions that are streaming or paused.
    pub fn active_count(&self) -> usize {
        self.sessions
            .values()
            .filter(|slot| slot.session.state.is_active())
            .count()
    }

    fn slot_mut(&mut self, id: SessionId) -> Result<&mut Slot, RevealError> {
        self.sessions.get_mut(&id).ok_or(RevealError::UnknownSession(id))
    }

    fn disarm(&mut self, timer: TimerId) {
        self.scheduler.cancel(timer);
        self.timers.remove(&timer);
    }
}

impl RevealEngine<VirtualClock> {
    /// Advances virtual time by `by`, firing every tick that falls due,
    /// including ticks armed along the way. Returns the number of ticks run.
    pub fn advance(&mut self, by: Duration) -> usize {
        let target = self.scheduler.now() + by;
        let mut fired = 0;
        while let Some(timer) = self.scheduler.pop_due(target) {
            if self.fire(timer) {
                fired += 1;
            }
        }
        self.scheduler.settle(target);
        fired
    }
}

/// Arms the next tick of `slot`. On failure the session is cancelled and the
/// observer told why.
fn arm<S: Scheduler>(
    scheduler: &mut S,
    timers: &mut HashMap<TimerId, SessionId>,
    id: SessionId,
    slot: &mut Slot,
) {
    debug_assert!(slot.session.pending.is_none(), "session already has a tick in flight");
    match scheduler.schedule(slot.session.rate()) {
        Ok(timer) => {
            slot.session.pending = Some(timer);
            timers.insert(timer, id);
        }
        Err(error) => {
            warn!(session = %id, %error, "could not schedule reveal tick");
            slot.session.state = RevealState::Cancelled;
            slot.observer.on_error(&RevealError::Schedule(error));
        }
    }
}
