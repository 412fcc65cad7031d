//! # Dispatch Ordering and Reentrancy Tests
//!
//! End-to-end checks of the registry's delivery guarantees: gap-free
//! catch-up, insertion-order forward passes, reverse-order teardown,
//! lock-step convergence, and observers that mutate the registry from
//! inside their own callbacks.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use lifecycle_runtime::{
    DefaultLifecycleObserver, Event, Lifecycle, LifecycleError, LifecycleScope, ObserverError,
    ObserverRef, ObserverResult, State,
};

type Log = Rc<RefCell<Vec<(String, Event, State)>>>;

fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

/// Observer appending `(name, event, owner state at delivery)` to `log`.
fn recorder(name: &str, log: &Log) -> ObserverRef {
    let name = name.to_string();
    let log = log.clone();
    ObserverRef::from_fn(move |owner, event| {
        log.borrow_mut()
            .push((name.clone(), event, owner.current_state()));
    })
}

fn entries(log: &Log) -> Vec<(String, Event)> {
    log.borrow()
        .iter()
        .map(|(name, event, _)| (name.clone(), *event))
        .collect()
}

fn e(name: &str, event: Event) -> (String, Event) {
    (name.to_string(), event)
}

fn make_resumed() -> Lifecycle {
    let lifecycle = Lifecycle::with_owner("dispatch-tests");
    lifecycle.handle_transition(Event::OnCreate).unwrap();
    lifecycle.handle_transition(Event::OnStart).unwrap();
    lifecycle.handle_transition(Event::OnResume).unwrap();
    lifecycle
}

// ── Full scenario ────────────────────────────────────────────────────

#[test]
fn test_late_observer_walkthrough() {
    let lifecycle = make_resumed();
    let log = new_log();

    lifecycle.add_observer(recorder("x", &log)).unwrap();
    assert_eq!(
        *log.borrow(),
        vec![
            ("x".to_string(), Event::OnCreate, State::Resumed),
            ("x".to_string(), Event::OnStart, State::Resumed),
            ("x".to_string(), Event::OnResume, State::Resumed),
        ]
    );

    log.borrow_mut().clear();
    lifecycle.handle_transition(Event::OnPause).unwrap();
    assert_eq!(entries(&log), vec![e("x", Event::OnPause)]);

    log.borrow_mut().clear();
    lifecycle.handle_transition(Event::OnDestroy).unwrap();
    assert_eq!(
        entries(&log),
        vec![e("x", Event::OnStop), e("x", Event::OnDestroy)]
    );
    assert_eq!(lifecycle.current_state(), State::Destroyed);
    assert_eq!(lifecycle.observer_count(), 0);

    log.borrow_mut().clear();
    lifecycle.add_observer(recorder("y", &log)).unwrap();
    assert!(log.borrow().is_empty());
    assert_eq!(lifecycle.observer_count(), 0);
}

// ── Ordering ─────────────────────────────────────────────────────────

#[test]
fn test_forward_insertion_order_in_lock_step() {
    let lifecycle = Lifecycle::with_owner("dispatch-tests");
    let log = new_log();
    lifecycle.add_observer(recorder("a", &log)).unwrap();
    lifecycle.add_observer(recorder("b", &log)).unwrap();
    assert!(log.borrow().is_empty());

    lifecycle.handle_transition(Event::OnCreate).unwrap();
    lifecycle.set_current_state(State::Resumed).unwrap();
    assert_eq!(
        entries(&log),
        vec![
            e("a", Event::OnCreate),
            e("b", Event::OnCreate),
            e("a", Event::OnStart),
            e("b", Event::OnStart),
            e("a", Event::OnResume),
            e("b", Event::OnResume),
        ]
    );
}

#[test]
fn test_teardown_in_reverse_order_at_each_step() {
    let lifecycle = make_resumed();
    let log = new_log();
    for name in ["a", "b", "c"] {
        lifecycle.add_observer(recorder(name, &log)).unwrap();
    }
    log.borrow_mut().clear();

    lifecycle.handle_transition(Event::OnDestroy).unwrap();
    assert_eq!(
        entries(&log),
        vec![
            e("c", Event::OnPause),
            e("b", Event::OnPause),
            e("a", Event::OnPause),
            e("c", Event::OnStop),
            e("b", Event::OnStop),
            e("a", Event::OnStop),
            e("c", Event::OnDestroy),
            e("b", Event::OnDestroy),
            e("a", Event::OnDestroy),
        ]
    );
    assert!(log
        .borrow()
        .iter()
        .all(|(_, _, state)| *state == State::Destroyed));
}

#[test]
fn test_backward_event_skipping_rungs() {
    let lifecycle = make_resumed();
    let log = new_log();
    lifecycle.add_observer(recorder("a", &log)).unwrap();
    log.borrow_mut().clear();

    lifecycle.handle_transition(Event::OnStop).unwrap();
    assert_eq!(
        entries(&log),
        vec![e("a", Event::OnPause), e("a", Event::OnStop)]
    );
    assert_eq!(lifecycle.current_state(), State::Created);
}

// ── Terminal state ───────────────────────────────────────────────────

#[test]
fn test_add_after_destroy_never_invokes() {
    let lifecycle = make_resumed();
    lifecycle.handle_transition(Event::OnDestroy).unwrap();

    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    for _ in 0..3 {
        let counter = counter.clone();
        let result = lifecycle.add_observer(ObserverRef::from_fn(move |_, _| {
            counter.set(counter.get() + 1);
        }));
        assert!(result.is_ok());
    }
    assert_eq!(calls.get(), 0);
    assert_eq!(lifecycle.observer_count(), 0);
}

#[test]
fn test_every_event_rejected_after_destroy() {
    let lifecycle = make_resumed();
    lifecycle.handle_transition(Event::OnDestroy).unwrap();
    for event in Event::TRANSITIONS {
        assert!(matches!(
            lifecycle.handle_transition(event),
            Err(LifecycleError::IllegalTransition {
                from: State::Destroyed,
                ..
            })
        ));
    }
}

#[test]
fn test_skipping_forward_rejected() {
    let lifecycle = Lifecycle::with_owner("dispatch-tests");
    let log = new_log();
    lifecycle.add_observer(recorder("a", &log)).unwrap();
    let err = lifecycle.handle_transition(Event::OnResume).unwrap_err();
    assert!(matches!(err, LifecycleError::IllegalTransition { .. }));
    assert_eq!(lifecycle.current_state(), State::Initialized);
    assert!(log.borrow().is_empty());
}

// ── Reentrant removal ────────────────────────────────────────────────

#[test]
fn test_observer_removes_itself() {
    let lifecycle = Lifecycle::with_owner("dispatch-tests");
    let log = new_log();

    let self_log = log.clone();
    lifecycle
        .add_observer(ObserverRef::from_fn(move |owner, event| {
            self_log
                .borrow_mut()
                .push(("quitter".to_string(), event, owner.current_state()));
            if event == Event::OnStart {
                let id = owner.dispatching_observer().unwrap();
                assert!(owner.remove_observer(id));
            }
        }))
        .unwrap();
    lifecycle.add_observer(recorder("stayer", &log)).unwrap();

    lifecycle.handle_transition(Event::OnCreate).unwrap();
    lifecycle.set_current_state(State::Resumed).unwrap();
    assert_eq!(
        entries(&log),
        vec![
            e("quitter", Event::OnCreate),
            e("stayer", Event::OnCreate),
            e("quitter", Event::OnStart),
            e("stayer", Event::OnStart),
            e("stayer", Event::OnResume),
        ]
    );
    assert_eq!(lifecycle.observer_count(), 1);
}

#[test]
fn test_observer_removes_sibling_mid_dispatch() {
    let lifecycle = Lifecycle::with_owner("dispatch-tests");
    let log = new_log();
    let victim = Rc::new(Cell::new(None));

    let killer_log = log.clone();
    let target = victim.clone();
    lifecycle
        .add_observer(ObserverRef::from_fn(move |owner, event| {
            killer_log
                .borrow_mut()
                .push(("killer".to_string(), event, owner.current_state()));
            if event == Event::OnStart {
                if let Some(id) = target.get() {
                    owner.remove_observer(id);
                }
            }
        }))
        .unwrap();
    victim.set(Some(lifecycle.add_observer(recorder("victim", &log)).unwrap()));

    lifecycle.handle_transition(Event::OnCreate).unwrap();
    lifecycle.handle_transition(Event::OnStart).unwrap();
    assert_eq!(
        entries(&log),
        vec![
            e("killer", Event::OnCreate),
            e("victim", Event::OnCreate),
            e("killer", Event::OnStart),
        ]
    );
    assert!(lifecycle.is_synced());
}

// ── Reentrant addition ───────────────────────────────────────────────

#[test]
fn test_observer_added_from_callback_catches_up() {
    let lifecycle = Lifecycle::with_owner("dispatch-tests");
    let log = new_log();

    let parent_log = log.clone();
    let child = recorder("child", &log);
    lifecycle
        .add_observer(ObserverRef::from_fn(move |owner, event| {
            parent_log
                .borrow_mut()
                .push(("parent".to_string(), event, owner.current_state()));
            if event == Event::OnStart {
                owner.add_observer(child.clone()).unwrap();
            }
        }))
        .unwrap();

    lifecycle.handle_transition(Event::OnCreate).unwrap();
    lifecycle.handle_transition(Event::OnStart).unwrap();
    assert_eq!(
        *log.borrow(),
        vec![
            ("parent".to_string(), Event::OnCreate, State::Created),
            ("parent".to_string(), Event::OnStart, State::Started),
            ("child".to_string(), Event::OnCreate, State::Started),
            ("child".to_string(), Event::OnStart, State::Started),
        ]
    );
    assert_eq!(lifecycle.observer_count(), 2);
    assert!(lifecycle.is_synced());
}

#[test]
fn test_addition_during_catch_up_of_another_addition() {
    let lifecycle = make_resumed();
    let log = new_log();

    let parent_log = log.clone();
    let child = recorder("child", &log);
    lifecycle
        .add_observer(ObserverRef::from_fn(move |owner, event| {
            parent_log
                .borrow_mut()
                .push(("parent".to_string(), event, owner.current_state()));
            if event == Event::OnCreate {
                owner.add_observer(child.clone()).unwrap();
            }
        }))
        .unwrap();

    assert_eq!(
        entries(&log),
        vec![
            e("parent", Event::OnCreate),
            e("child", Event::OnCreate),
            e("parent", Event::OnStart),
            e("child", Event::OnStart),
            e("parent", Event::OnResume),
            e("child", Event::OnResume),
        ]
    );
}

#[test]
fn test_addition_during_backward_pass() {
    let lifecycle = make_resumed();
    let log = new_log();

    let parent_log = log.clone();
    let child = recorder("child", &log);
    lifecycle
        .add_observer(ObserverRef::from_fn(move |owner, event| {
            parent_log
                .borrow_mut()
                .push(("parent".to_string(), event, owner.current_state()));
            if event == Event::OnPause {
                owner.add_observer(child.clone()).unwrap();
            }
        }))
        .unwrap();
    log.borrow_mut().clear();

    lifecycle.handle_transition(Event::OnStop).unwrap();
    assert_eq!(
        entries(&log),
        vec![
            e("parent", Event::OnPause),
            e("parent", Event::OnStop),
            e("child", Event::OnCreate),
        ]
    );
}

// ── Nested transitions ───────────────────────────────────────────────

#[test]
fn test_nested_transition_keeps_siblings_in_order() {
    let lifecycle = Lifecycle::with_owner("dispatch-tests");
    let log = new_log();
    let fired = Rc::new(Cell::new(false));

    let eager_log = log.clone();
    let once = fired.clone();
    lifecycle
        .add_observer(ObserverRef::try_from_fn(move |owner, event| {
            eager_log
                .borrow_mut()
                .push(("eager".to_string(), event, owner.current_state()));
            if event == Event::OnStart && !once.replace(true) {
                owner
                    .handle_transition(Event::OnResume)
                    .map_err(|err| ObserverError::new(err.to_string()))?;
            }
            Ok(())
        }))
        .unwrap();
    lifecycle.add_observer(recorder("sibling", &log)).unwrap();

    lifecycle.handle_transition(Event::OnCreate).unwrap();
    log.borrow_mut().clear();
    lifecycle.handle_transition(Event::OnStart).unwrap();

    assert_eq!(
        entries(&log),
        vec![
            e("eager", Event::OnStart),
            e("sibling", Event::OnStart),
            e("eager", Event::OnResume),
            e("sibling", Event::OnResume),
        ]
    );
    assert_eq!(lifecycle.current_state(), State::Resumed);
    let moves: Vec<_> = lifecycle.history().iter().map(|r| r.to_state).collect();
    assert_eq!(moves, vec![State::Created, State::Started, State::Resumed]);
}

#[test]
fn test_destroy_from_inside_forward_dispatch() {
    let lifecycle = Lifecycle::with_owner("dispatch-tests");
    let log = new_log();

    let first_log = log.clone();
    lifecycle
        .add_observer(ObserverRef::try_from_fn(move |owner, event| {
            first_log
                .borrow_mut()
                .push(("first".to_string(), event, owner.current_state()));
            if event == Event::OnStart {
                owner
                    .handle_transition(Event::OnDestroy)
                    .map_err(|err| ObserverError::new(err.to_string()))?;
            }
            Ok(())
        }))
        .unwrap();
    lifecycle.add_observer(recorder("second", &log)).unwrap();

    lifecycle.handle_transition(Event::OnCreate).unwrap();
    log.borrow_mut().clear();
    lifecycle.handle_transition(Event::OnStart).unwrap();

    assert_eq!(
        entries(&log),
        vec![
            e("first", Event::OnStart),
            e("first", Event::OnStop),
            e("second", Event::OnDestroy),
            e("first", Event::OnDestroy),
        ]
    );
    assert_eq!(lifecycle.current_state(), State::Destroyed);
    assert_eq!(lifecycle.observer_count(), 0);
}

// ── Failures ─────────────────────────────────────────────────────────

#[test]
fn test_observer_failure_propagates_without_rollback() {
    let lifecycle = Lifecycle::with_owner("dispatch-tests");
    let log = new_log();
    let failed_once = Rc::new(Cell::new(false));

    lifecycle.add_observer(recorder("a", &log)).unwrap();
    let flaky_log = log.clone();
    let flag = failed_once.clone();
    let flaky = lifecycle
        .add_observer(ObserverRef::try_from_fn(move |owner, event| {
            if event == Event::OnStart && !flag.replace(true) {
                return Err(ObserverError::new("not ready"));
            }
            flaky_log
                .borrow_mut()
                .push(("flaky".to_string(), event, owner.current_state()));
            Ok(())
        }))
        .unwrap();
    lifecycle.add_observer(recorder("c", &log)).unwrap();
    lifecycle.handle_transition(Event::OnCreate).unwrap();
    log.borrow_mut().clear();

    let err = lifecycle.handle_transition(Event::OnStart).unwrap_err();
    match err {
        LifecycleError::Observer {
            observer,
            event,
            source,
        } => {
            assert_eq!(observer, flaky);
            assert_eq!(event, Event::OnStart);
            assert_eq!(source.message(), "not ready");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(lifecycle.current_state(), State::Started);
    assert_eq!(entries(&log), vec![e("a", Event::OnStart)]);
    assert_eq!(lifecycle.observer_state(flaky), Some(State::Created));
    assert!(!lifecycle.is_synced());
    assert_eq!(lifecycle.dispatching_observer(), None);

    log.borrow_mut().clear();
    lifecycle.handle_transition(Event::OnResume).unwrap();
    assert_eq!(
        entries(&log),
        vec![
            e("flaky", Event::OnStart),
            e("c", Event::OnStart),
            e("a", Event::OnResume),
            e("flaky", Event::OnResume),
            e("c", Event::OnResume),
        ]
    );
    assert!(lifecycle.is_synced());
}

#[test]
fn test_failure_during_destroy_still_tears_down() {
    let lifecycle = Lifecycle::with_owner("dispatch-tests");
    let log = new_log();
    lifecycle.handle_transition(Event::OnCreate).unwrap();
    lifecycle.add_observer(recorder("a", &log)).unwrap();
    let scope = LifecycleScope::of(&lifecycle).unwrap();
    let stubborn = lifecycle
        .add_observer(ObserverRef::try_from_fn(|_, event| {
            if event == Event::OnDestroy {
                return Err(ObserverError::new("refusing to die"));
            }
            Ok(())
        }))
        .unwrap();
    lifecycle.handle_transition(Event::OnStart).unwrap();
    log.borrow_mut().clear();

    let err = lifecycle.handle_transition(Event::OnDestroy).unwrap_err();
    match err {
        LifecycleError::Observer { observer, event, .. } => {
            assert_eq!(observer, stubborn);
            assert_eq!(event, Event::OnDestroy);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(
        entries(&log),
        vec![e("a", Event::OnStop), e("a", Event::OnDestroy)]
    );
    assert_eq!(lifecycle.current_state(), State::Destroyed);
    assert_eq!(lifecycle.observer_count(), 0);
    assert_eq!(lifecycle.association_count(), 0);
    assert!(!scope.is_active());
    assert!(lifecycle.is_synced());
}

// ── Per-event adapter ────────────────────────────────────────────────

#[derive(Default)]
struct Counters {
    created: u32,
    destroyed: u32,
    any: Vec<Event>,
}

struct CountingObserver(Rc<RefCell<Counters>>);

impl DefaultLifecycleObserver for CountingObserver {
    fn on_create(&mut self, _owner: &Lifecycle) -> ObserverResult {
        self.0.borrow_mut().created += 1;
        Ok(())
    }

    fn on_destroy(&mut self, _owner: &Lifecycle) -> ObserverResult {
        self.0.borrow_mut().destroyed += 1;
        Ok(())
    }

    fn on_any(&mut self, _owner: &Lifecycle, event: Event) -> ObserverResult {
        self.0.borrow_mut().any.push(event);
        Ok(())
    }
}

#[test]
fn test_default_observer_receives_every_event() {
    let lifecycle = Lifecycle::with_owner("dispatch-tests");
    let counters = Rc::new(RefCell::new(Counters::default()));
    lifecycle
        .add_observer(ObserverRef::from_default(CountingObserver(counters.clone())))
        .unwrap();

    lifecycle.handle_transition(Event::OnCreate).unwrap();
    lifecycle.handle_transition(Event::OnStart).unwrap();
    lifecycle.handle_transition(Event::OnDestroy).unwrap();

    let counters = counters.borrow();
    assert_eq!(counters.created, 1);
    assert_eq!(counters.destroyed, 1);
    assert_eq!(
        counters.any,
        vec![
            Event::OnCreate,
            Event::OnStart,
            Event::OnStop,
            Event::OnDestroy
        ]
    );
}
