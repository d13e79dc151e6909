//! Property tests for the propagation rule of a single sync pair.

use std::cell::Cell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use atom_sync::{ConversionError, Converter, FailurePolicy, Observable, SyncOptions, SyncPair};
use proptest::prelude::*;

fn is_integer(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|c| c.is_ascii_digit())
}

fn text_to_int(s: &String) -> Result<i64, ConversionError> {
    if !is_integer(s) {
        return Err(ConversionError::new("not a number"));
    }
    s.parse().map_err(|_| ConversionError::new("out of range"))
}

struct Fixture {
    a: Observable<i64>,
    b: Observable<String>,
    pair: SyncPair<i64, String>,
}

fn fixture(a0: i64, b0: &str) -> Fixture {
    let a = Observable::new(a0);
    let b = Observable::new(b0.to_string());
    let pair = SyncPair::bind(
        a.clone(),
        b.clone(),
        |n: &i64| Ok(n.to_string()),
        text_to_int,
    );
    Fixture { a, b, pair }
}

fn any_text() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<i64>().prop_map(|n| n.to_string()),
        "[a-z]{1,8}",
        "-?[0-9]{0,3}[a-z]?",
    ]
}

fn narrow(n: &i64) -> Result<u8, ConversionError> {
    u8::try_from(*n).map_err(|_| ConversionError::new("out of range"))
}

fn widen(b: &u8) -> Result<i64, ConversionError> {
    Ok(i64::from(*b))
}

type Narrowing = (Observable<i64>, Observable<u8>, SyncPair<i64, u8>);

fn narrowing_pair(b0: u8, failure: FailurePolicy) -> Narrowing {
    let a = Observable::new(i64::from(b0));
    let b = Observable::new(b0);
    let pair = SyncPair::bind_with(
        a.clone(),
        b.clone(),
        Converter::new(narrow, widen),
        SyncOptions::new().failure(failure),
    );
    (a, b, pair)
}

fn any_wide() -> impl Strategy<Value = i64> {
    prop_oneof![any::<i64>(), -300_i64..600]
}

proptest! {
    #[test]
    fn a_side_failure_is_contained(b0 in any::<u8>(), n in any_wide()) {
        let (a, b, pair) = narrowing_pair(b0, FailurePolicy::CommitOwnSide);
        pair.a().set(n);
        prop_assert_eq!(a.get(), n, "A always holds the written value");
        match narrow(&n) {
            Ok(v) => {
                prop_assert_eq!(b.get(), v);
                prop_assert_eq!(pair.error().get(), None);
            }
            Err(e) => {
                prop_assert_eq!(b.get(), b0, "B is untouched on failure");
                prop_assert_eq!(pair.error().get(), Some(e));
            }
        }
    }

    #[test]
    fn rejected_a_side_write_touches_neither_side(b0 in any::<u8>(), n in any_wide()) {
        prop_assume!(narrow(&n).is_err());
        let (a, b, pair) = narrowing_pair(b0, FailurePolicy::Reject);
        pair.a().set(n);
        prop_assert_eq!(a.get(), i64::from(b0));
        prop_assert_eq!(b.get(), b0);
        prop_assert_eq!(pair.error().get(), narrow(&n).err());
    }

    #[test]
    fn b_side_always_converts_under_either_policy(
        b0 in any::<u8>(),
        v in any::<u8>(),
        reject in any::<bool>(),
    ) {
        let failure = if reject { FailurePolicy::Reject } else { FailurePolicy::CommitOwnSide };
        let (a, b, pair) = narrowing_pair(b0, failure);
        pair.a().set(1_000);
        pair.b().set(v);
        prop_assert_eq!((a.get(), b.get()), (i64::from(v), v));
        prop_assert_eq!(pair.error().get(), None, "success on B clears A's failure");
    }

    #[test]
    fn a_side_success_propagates(a0 in any::<i64>(), n in any::<i64>()) {
        let f = fixture(a0, "seed");
        f.pair.a().set(n);
        prop_assert_eq!(f.a.get(), n);
        prop_assert_eq!(f.b.get(), n.to_string());
        prop_assert_eq!(f.pair.error().get(), None);
    }

    #[test]
    fn b_side_obeys_mirror_rule(a0 in any::<i64>(), s in any_text()) {
        let f = fixture(a0, "seed");
        f.pair.b().set(s.clone());
        prop_assert_eq!(f.b.get(), s.clone());
        match text_to_int(&s) {
            Ok(n) => {
                prop_assert_eq!(f.a.get(), n);
                prop_assert_eq!(f.pair.error().get(), None);
            }
            Err(e) => {
                prop_assert_eq!(f.a.get(), a0, "A is untouched on failure");
                prop_assert_eq!(f.pair.error().get(), Some(e));
            }
        }
    }

    #[test]
    fn lossless_round_trip_does_not_drift(n in any::<i64>()) {
        let f = fixture(0, "0");
        f.pair.a().set(n);
        let after_first = (f.a.get(), f.b.get());

        f.pair.b().set(f.b.get());
        prop_assert_eq!((f.a.get(), f.b.get()), after_first);
        prop_assert_eq!(f.pair.error().get(), None);
    }

    #[test]
    fn error_reflects_only_the_latest_write(writes in proptest::collection::vec(any_text(), 1..12)) {
        let f = fixture(0, "0");
        for s in &writes {
            f.pair.b().set(s.clone());
        }
        let last = writes.last().unwrap();
        prop_assert_eq!(f.pair.error().get(), text_to_int(last).err());

        let last_good = writes.iter().rev().find_map(|s| text_to_int(s).ok()).unwrap_or(0);
        prop_assert_eq!(f.a.get(), last_good);
    }
}

#[test]
fn failure_then_fix_scenario() {
    let f = fixture(0, "0");

    f.pair.a().set(5);
    assert_eq!((f.a.get(), f.b.get().as_str()), (5, "5"));
    assert_eq!(f.pair.error().get(), None);

    f.pair.b().set("abc".to_string());
    assert_eq!((f.a.get(), f.b.get().as_str()), (5, "abc"));
    assert_eq!(f.pair.error().get().unwrap().message(), "not a number");

    f.pair.b().set("7".to_string());
    assert_eq!((f.a.get(), f.b.get().as_str()), (7, "7"));
    assert_eq!(f.pair.error().get(), None);
}

#[test]
fn error_notifications_track_failures() {
    let f = fixture(0, "0");
    let log = Rc::new(std::cell::RefCell::new(Vec::new()));
    let l = Rc::clone(&log);
    let _sub = f
        .pair
        .error()
        .subscribe(move |e| l.borrow_mut().push(e.as_ref().map(|e| e.to_string())));

    f.pair.b().set("x".to_string());
    f.pair.b().set("y".to_string());
    f.pair.b().set("3".to_string());
    f.pair.a().set(4);

    // Same error twice is a no-op; clearing an already clear channel too.
    assert_eq!(
        *log.borrow(),
        vec![Some("not a number".to_string()), None]
    );
}

#[test]
fn error_channel_recovers_after_subscriber_panic() {
    let f = fixture(0, "0");
    let armed = Rc::new(Cell::new(true));
    let trigger = Rc::clone(&armed);
    let _boom = f.b.subscribe(move |_| {
        if trigger.replace(false) {
            panic!("subscriber failed");
        }
    });
    let notes = Rc::new(Cell::new(0));
    let n = Rc::clone(&notes);
    let _errors = f.pair.error().subscribe(move |_| n.set(n.get() + 1));

    let outcome = catch_unwind(AssertUnwindSafe(|| f.pair.b().set("x".to_string())));
    assert!(outcome.is_err());
    assert_eq!(f.pair.error().get().unwrap().message(), "not a number");

    f.pair.b().set("5".to_string());
    f.pair.b().set("y".to_string());
    assert_eq!(notes.get(), 2, "clear and re-record both notify");
    assert_eq!(f.a.get(), 5);
}
