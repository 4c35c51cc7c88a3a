use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use etab_core::reveal::{OwnerId, RevealEngine, RevealObserver, RevealRequest, RevealState};
use etab_core::scheduler::VirtualClock;
use etab_core::{RevealError, ScheduleError};
use proptest::prelude::*;

const RATE: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Progress(String),
    Complete,
    Error(RevealError),
}

#[derive(Clone, Default)]
struct Recorder(Rc<RefCell<Vec<Event>>>);

impl Recorder {
    fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    fn prefixes(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Progress(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    fn completions(&self) -> usize {
        self.events().iter().filter(|e| **e == Event::Complete).count()
    }
}

impl RevealObserver for Recorder {
    fn on_progress(&mut self, revealed: &str) {
        self.0.borrow_mut().push(Event::Progress(revealed.to_owned()));
    }

    fn on_complete(&mut self) {
        self.0.borrow_mut().push(Event::Complete);
    }

    fn on_error(&mut self, error: &RevealError) {
        self.0.borrow_mut().push(Event::Error(error.clone()));
    }
}

fn engine() -> RevealEngine<VirtualClock> {
    RevealEngine::new(VirtualClock::new())
}

#[test]
fn streams_one_char_per_tick_then_completes_once() {
    let mut engine = engine();
    let rec = Recorder::default();
    let id = engine
        .start(RevealRequest::new("héllo").rate(RATE), rec.clone())
        .unwrap();
    assert_eq!(engine.state(id), Some(RevealState::Streaming));

    // Nothing before the first interval elapses.
    assert_eq!(engine.advance(RATE - Duration::from_millis(1)), 0);
    assert!(rec.events().is_empty());

    engine.advance(Duration::from_millis(1));
    assert_eq!(rec.prefixes(), vec!["h"]);

    engine.advance(RATE * 10);
    assert_eq!(
        rec.events(),
        vec![
            Event::Progress("h".into()),
            Event::Progress("hé".into()),
            Event::Progress("hél".into()),
            Event::Progress("héll".into()),
            Event::Progress("héllo".into()),
            Event::Complete,
        ]
    );
    assert_eq!(engine.state(id), Some(RevealState::Completed));
    assert_eq!(engine.scheduler().pending(), 0);

    engine.advance(RATE * 10);
    assert_eq!(rec.completions(), 1);
}

#[test]
fn a_session_never_has_two_ticks_in_flight() {
    let mut engine = engine();
    let id = engine
        .start(RevealRequest::new("abcdef").rate(RATE), |_: &str| {})
        .unwrap();
    for _ in 0..3 {
        assert_eq!(engine.scheduler().pending(), 1);
        assert!(engine.session(id).unwrap().pending_timer().is_some());
        engine.advance(RATE);
    }
    assert_eq!(engine.session(id).unwrap().cursor(), 3);
}

#[test]
fn pause_holds_cursor_and_resume_continues_from_it() {
    let target = "pause me";
    let mut straight = engine();
    let plain = Recorder::default();
    straight
        .start(RevealRequest::new(target).rate(RATE), plain.clone())
        .unwrap();
    straight.advance(RATE * 20);

    let mut engine = engine();
    let rec = Recorder::default();
    let id = engine
        .start(RevealRequest::new(target).rate(RATE), rec.clone())
        .unwrap();
    engine.advance(RATE * 3);
    engine.pause(id).unwrap();
    engine.pause(id).unwrap();
    assert_eq!(engine.state(id), Some(RevealState::Paused));
    assert!(engine.session(id).unwrap().is_paused());
    assert_eq!(engine.scheduler().pending(), 0);

    engine.advance(RATE * 50);
    assert_eq!(engine.session(id).unwrap().cursor(), 3);
    assert_eq!(rec.prefixes().len(), 3);

    engine.resume(id).unwrap();
    engine.resume(id).unwrap();
    engine.advance(RATE * 20);

    assert_eq!(rec.events(), plain.events());
    assert_eq!(rec.completions(), 1);
}

#[test]
fn toggle_pause_flips_between_streaming_and_paused() {
    let mut engine = engine();
    let id = engine
        .start(RevealRequest::new("xyz").rate(RATE), |_: &str| {})
        .unwrap();
    assert_eq!(engine.toggle_pause(id), Ok(RevealState::Paused));
    assert_eq!(engine.toggle_pause(id), Ok(RevealState::Streaming));
    engine.advance(RATE * 5);
    assert_eq!(
        engine.toggle_pause(id),
        Err(RevealError::Finished {
            id,
            state: RevealState::Completed
        })
    );
}

#[test]
fn cancel_silences_the_session_for_good() {
    let mut engine = engine();
    let rec = Recorder::default();
    let id = engine
        .start(RevealRequest::new("cancel me").rate(RATE), rec.clone())
        .unwrap();
    engine.advance(RATE * 2);
    let timer = engine.session(id).unwrap().pending_timer().unwrap();

    assert!(engine.cancel(id));
    assert!(!engine.cancel(id));
    assert_eq!(engine.state(id), Some(RevealState::Cancelled));
    assert_eq!(engine.scheduler().pending(), 0);

    // A delivery that was already in flight is ignored.
    assert!(!engine.fire(timer));
    engine.advance(RATE * 100);
    assert_eq!(rec.prefixes(), vec!["c", "ca"]);
    assert_eq!(rec.completions(), 0);

    assert!(matches!(engine.resume(id), Err(RevealError::Finished { .. })));
    assert!(matches!(engine.pause(id), Err(RevealError::Finished { .. })));
}

#[test]
fn retargeting_an_owner_drops_the_old_tick() {
    let owner = OwnerId(7);
    let mut engine = engine();
    let old = Recorder::default();
    let first = engine
        .start_for(owner, RevealRequest::new("old target").rate(RATE), old.clone())
        .unwrap();
    engine.advance(RATE * 2);
    let stale = engine.session(first).unwrap().pending_timer().unwrap();

    let new = Recorder::default();
    let second = engine
        .start_for(owner, RevealRequest::new("new").rate(RATE), new.clone())
        .unwrap();
    assert_ne!(first, second);
    assert_eq!(engine.state(first), None);
    assert_eq!(engine.session_for(owner).map(|(id, _)| id), Some(second));

    assert!(!engine.fire(stale));
    engine.advance(RATE * 50);

    assert_eq!(old.prefixes(), vec!["o", "ol"]);
    assert_eq!(old.completions(), 0);
    assert_eq!(new.prefixes(), vec!["n", "ne", "new"]);
    assert_eq!(new.completions(), 1);
    assert_eq!(engine.active_count(), 0);
}

#[test]
fn releasing_an_owner_cancels_its_session() {
    let owner = OwnerId(1);
    let mut engine = engine();
    let rec = Recorder::default();
    let id = engine
        .start_for(owner, RevealRequest::new("unmounted").rate(RATE), rec.clone())
        .unwrap();
    engine.advance(RATE);
    engine.release_owner(owner);
    engine.release_owner(owner);
    engine.advance(RATE * 20);
    assert_eq!(rec.prefixes(), vec!["u"]);
    assert_eq!(engine.state(id), None);
    assert!(engine.session_for(owner).is_none());
}

#[test]
fn non_streaming_shows_everything_at_once() {
    let mut engine = engine();
    let rec = Recorder::default();
    let id = engine
        .start(
            RevealRequest::new("instant").streaming(false),
            rec.clone(),
        )
        .unwrap();
    assert_eq!(rec.events(), vec![Event::Progress("instant".into())]);
    assert_eq!(engine.state(id), Some(RevealState::Completed));
    assert_eq!(engine.scheduler().pending(), 0);
    engine.advance(RATE * 10);
    assert_eq!(rec.events().len(), 1);
}

#[test]
fn toggling_streaming_off_replaces_a_running_session() {
    let owner = OwnerId(3);
    let mut engine = engine();
    let streaming = Recorder::default();
    engine
        .start_for(owner, RevealRequest::new("abc").rate(RATE), streaming.clone())
        .unwrap();
    engine.advance(RATE);

    let shown = Recorder::default();
    engine
        .start_for(owner, RevealRequest::new("abc").streaming(false), shown.clone())
        .unwrap();
    engine.advance(RATE * 10);
    assert_eq!(streaming.prefixes(), vec!["a"]);
    assert_eq!(shown.prefixes(), vec!["abc"]);
}

#[test]
fn empty_target_completes_on_first_tick() {
    let mut engine = engine();
    let rec = Recorder::default();
    let id = engine
        .start(RevealRequest::new("").rate(RATE), rec.clone())
        .unwrap();
    engine.advance(RATE);
    assert_eq!(rec.events(), vec![Event::Complete]);
    assert_eq!(engine.state(id), Some(RevealState::Completed));
}

#[test]
fn malformed_requests_fail_fast() {
    let mut engine = engine();
    assert_eq!(
        engine.start(RevealRequest::default(), |_: &str| {}),
        Err(RevealError::MissingTarget)
    );
    assert_eq!(
        engine.start(RevealRequest::new("x").rate(Duration::ZERO), |_: &str| {}),
        Err(RevealError::InvalidRate)
    );
    assert_eq!(engine.active_count(), 0);
}

#[test]
fn unknown_handles_are_reported() {
    let mut other = engine();
    let foreign = other
        .start(RevealRequest::new("x"), |_: &str| {})
        .unwrap();
    let mut engine = engine();
    assert_eq!(engine.pause(foreign), Err(RevealError::UnknownSession(foreign)));
    assert_eq!(engine.resume(foreign), Err(RevealError::UnknownSession(foreign)));
    assert!(!engine.cancel(foreign));
}

#[test]
fn scheduling_failure_is_reported_and_cancels() {
    let mut engine = engine();
    engine.scheduler_mut().refuse_timers(true);
    let rec = Recorder::default();
    let id = engine
        .start(RevealRequest::new("abc").rate(RATE), rec.clone())
        .unwrap();
    assert_eq!(
        rec.events(),
        vec![Event::Error(RevealError::Schedule(ScheduleError::Refused))]
    );
    assert_eq!(engine.state(id), Some(RevealState::Cancelled));

    engine.scheduler_mut().refuse_timers(false);
    let rec = Recorder::default();
    let id = engine
        .start(RevealRequest::new("abc").rate(RATE), rec.clone())
        .unwrap();
    engine.scheduler_mut().refuse_timers(true);
    engine.advance(RATE * 10);
    assert_eq!(
        rec.events(),
        vec![
            Event::Progress("a".into()),
            Event::Error(RevealError::Schedule(ScheduleError::Refused)),
        ]
    );
    assert_eq!(engine.state(id), Some(RevealState::Cancelled));
}

proptest! {
    #[test]
    fn prefixes_grow_to_the_target_then_complete(
        target in "[a-z é✅\n]{0,24}",
        rate_ms in 1u64..50,
    ) {
        let mut engine = engine();
        let rec = Recorder::default();
        let rate = Duration::from_millis(rate_ms);
        engine.start(RevealRequest::new(target.clone()).rate(rate), rec.clone()).unwrap();
        engine.advance(rate * 30);

        let prefixes = rec.prefixes();
        prop_assert_eq!(prefixes.len(), target.chars().count());
        for pair in prefixes.windows(2) {
            prop_assert!(pair[0].chars().count() < pair[1].chars().count());
        }
        for p in &prefixes {
            prop_assert!(target.starts_with(p.as_str()));
        }
        if let Some(last) = prefixes.last() {
            prop_assert_eq!(last, &target);
        }
        let events = rec.events();
        prop_assert_eq!(events.last(), Some(&Event::Complete));
        prop_assert_eq!(rec.completions(), 1);
    }

    #[test]
    fn pausing_changes_timing_not_content(
        target in "[a-z]{1,16}",
        pause_after in 0u32..16,
        pause_for in 1u32..40,
    ) {
        let mut plain = engine();
        let expected = Recorder::default();
        plain.start(RevealRequest::new(target.clone()).rate(RATE), expected.clone()).unwrap();
        plain.advance(RATE * 40);

        let mut engine = engine();
        let rec = Recorder::default();
        let id = engine.start(RevealRequest::new(target.clone()).rate(RATE), rec.clone()).unwrap();
        engine.advance(RATE * pause_after);
        let _ = engine.pause(id);
        engine.advance(RATE * pause_for);
        let _ = engine.resume(id);
        engine.advance(RATE * 40);

        prop_assert_eq!(rec.events(), expected.events());
    }
}
