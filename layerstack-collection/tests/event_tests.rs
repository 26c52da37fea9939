use layerstack_collection::EventNotifier;
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn new_notifier_has_no_listeners() {
    let notifier: EventNotifier<u32> = EventNotifier::new();
    assert_eq!(notifier.listener_count(), 0);
    assert!(!notifier.is_destroyed());
}

#[test]
fn raise_invokes_listeners_in_registration_order() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut notifier = EventNotifier::new();

    let first = Rc::clone(&seen);
    notifier.add_listener(move |value: &u32| first.borrow_mut().push(("first", *value)));
    let second = Rc::clone(&seen);
    notifier.add_listener(move |value: &u32| second.borrow_mut().push(("second", *value)));

    notifier.raise(&7);
    assert_eq!(*seen.borrow(), vec![("first", 7), ("second", 7)]);
}

#[test]
fn raise_without_listeners_is_noop() {
    let mut notifier: EventNotifier<String> = EventNotifier::default();
    notifier.raise(&"nobody listens".to_owned());
}

#[test]
fn listener_can_keep_state() {
    let total = Rc::new(RefCell::new(0));
    let mut notifier = EventNotifier::new();
    let sink = Rc::clone(&total);
    let mut calls = 0;
    notifier.add_listener(move |value: &i32| {
        calls += 1;
        *sink.borrow_mut() += value * calls;
    });

    notifier.raise(&10);
    notifier.raise(&10);
    assert_eq!(*total.borrow(), 30);
}

#[test]
fn removed_listener_is_not_called() {
    let count = Rc::new(RefCell::new(0));
    let mut notifier = EventNotifier::new();
    let sink = Rc::clone(&count);
    let id = notifier.add_listener(move |_: &()| *sink.borrow_mut() += 1);

    notifier.raise(&());
    assert!(notifier.remove_listener(id));
    notifier.raise(&());
    assert_eq!(*count.borrow(), 1);
    assert_eq!(notifier.listener_count(), 0);
}

#[test]
fn removing_unknown_listener_returns_false() {
    let mut notifier = EventNotifier::new();
    let id = notifier.add_listener(|_: &u8| {});
    assert!(notifier.remove_listener(id));
    assert!(!notifier.remove_listener(id));
}

#[test]
fn listener_ids_are_distinct() {
    let mut notifier = EventNotifier::new();
    let a = notifier.add_listener(|_: &u8| {});
    let b = notifier.add_listener(|_: &u8| {});
    assert_ne!(a, b);

    // Removing one leaves the other registered.
    notifier.remove_listener(a);
    assert_eq!(notifier.listener_count(), 1);
}

#[test]
fn destroy_drops_listeners_and_ignores_new_ones() {
    let count = Rc::new(RefCell::new(0));
    let mut notifier = EventNotifier::new();
    let sink = Rc::clone(&count);
    notifier.add_listener(move |_: &()| *sink.borrow_mut() += 1);

    notifier.destroy();
    assert!(notifier.is_destroyed());
    assert_eq!(notifier.listener_count(), 0);

    let sink = Rc::clone(&count);
    notifier.add_listener(move |_: &()| *sink.borrow_mut() += 1);
    notifier.raise(&());
    assert_eq!(*count.borrow(), 0);
}
