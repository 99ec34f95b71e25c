//! Panic safety tests for the `growable_array` package.
//!
//! Element constructors that panic must never cause leaks or double drops. Operations that
//! reallocate or insert must additionally leave the array exactly as it was before the call.

use std::cell::Cell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use growable_array::GrowableArray;

/// Shared bookkeeping for a family of [`Probe`] instances.
#[derive(Debug, Default)]
struct Ledger {
    live: Cell<isize>,
    clones_allowed: Cell<usize>,
}

/// Element whose clones fail once the ledger's clone allowance is spent, and which keeps count
/// of how many instances are alive.
#[derive(Debug)]
struct Probe {
    value: u32,
    ledger: Rc<Ledger>,
}

impl Probe {
    fn new(value: u32, ledger: &Rc<Ledger>) -> Self {
        ledger.live.set(ledger.live.get().wrapping_add(1));

        Self {
            value,
            ledger: Rc::clone(ledger),
        }
    }
}

impl Clone for Probe {
    fn clone(&self) -> Self {
        let allowed = self.ledger.clones_allowed.get();
        assert!(allowed > 0, "clone failure");
        self.ledger.clones_allowed.set(allowed.wrapping_sub(1));

        Self::new(self.value, &self.ledger)
    }
}

impl Drop for Probe {
    fn drop(&mut self) {
        self.ledger.live.set(self.ledger.live.get().wrapping_sub(1));
    }
}

fn probes(count: u32, ledger: &Rc<Ledger>) -> GrowableArray<Probe> {
    (0..count).map(|value| Probe::new(value, ledger)).collect()
}

fn values_of(array: &GrowableArray<Probe>) -> Vec<u32> {
    array.iter().map(|probe| probe.value).collect()
}

/// Snapshot of everything observable about an array's storage.
fn fingerprint(array: &GrowableArray<Probe>) -> (Vec<u32>, usize, *const Probe) {
    (values_of(array), array.capacity(), array.as_ptr())
}

#[test]
fn reallocating_insert_n_with_failing_clone() {
    let ledger = Rc::new(Ledger::default());
    let mut array = probes(3, &ledger);
    let value = Probe::new(9, &ledger);
    let before = fingerprint(&array);

    ledger.clones_allowed.set(2);

    let result = catch_unwind(AssertUnwindSafe(|| array.insert_n(1, 5, &value)));

    assert!(result.is_err());
    assert_eq!(fingerprint(&array), before);
    assert_eq!(ledger.live.get(), 4);
}

#[test]
fn in_place_insert_slice_with_failing_clone() {
    let ledger = Rc::new(Ledger::default());
    let mut array = probes(6, &ledger);
    array.reserve(32).unwrap();
    let items: Vec<_> = (10..14).map(|value| Probe::new(value, &ledger)).collect();
    let before = fingerprint(&array);

    ledger.clones_allowed.set(3);

    let result = catch_unwind(AssertUnwindSafe(|| array.insert_slice(2, &items)));

    assert!(result.is_err());
    assert_eq!(fingerprint(&array), before);
    assert_eq!(ledger.live.get(), 10);
}

#[test]
fn reallocating_resize_with_failing_clone() {
    let ledger = Rc::new(Ledger::default());
    let mut array = probes(2, &ledger);
    let value = Probe::new(5, &ledger);
    let before = fingerprint(&array);

    ledger.clones_allowed.set(1);

    let result = catch_unwind(AssertUnwindSafe(|| array.resize_value(10, &value)));

    assert!(result.is_err());
    assert_eq!(fingerprint(&array), before);
    assert_eq!(ledger.live.get(), 3);
}

#[test]
fn rebuilding_assign_with_failing_clone() {
    let ledger = Rc::new(Ledger::default());
    let mut array = probes(2, &ledger);
    let value = Probe::new(5, &ledger);
    let before = fingerprint(&array);

    ledger.clones_allowed.set(4);

    let result = catch_unwind(AssertUnwindSafe(|| array.assign_n(8, &value)));

    assert!(result.is_err());
    assert_eq!(fingerprint(&array), before);
    assert_eq!(ledger.live.get(), 3);
}

#[test]
fn overwriting_assign_with_failing_clone_does_not_leak() {
    let ledger = Rc::new(Ledger::default());
    let mut array = probes(6, &ledger);
    let value = Probe::new(5, &ledger);

    ledger.clones_allowed.set(2);

    let result = catch_unwind(AssertUnwindSafe(|| array.assign_n(4, &value)));

    assert!(result.is_err());

    // The contents are unspecified, but every live probe is accounted for.
    let live_in_array = isize::try_from(array.len()).unwrap();
    assert_eq!(ledger.live.get(), live_in_array + 1);

    drop(array);
    drop(value);
    assert_eq!(ledger.live.get(), 0);
}

#[test]
fn emplace_with_failing_constructor() {
    let ledger = Rc::new(Ledger::default());
    let mut array = probes(4, &ledger);
    let before = fingerprint(&array);

    let result = catch_unwind(AssertUnwindSafe(|| {
        array.emplace(2, || panic!("constructor failure"))
    }));

    assert!(result.is_err());
    assert_eq!(fingerprint(&array), before);
}

#[test]
fn insert_iter_with_failing_iterator() {
    let ledger = Rc::new(Ledger::default());
    let mut array = probes(4, &ledger);
    array.reserve(16).unwrap();
    let before = fingerprint(&array);

    let result = catch_unwind(AssertUnwindSafe(|| {
        array.insert_iter(
            1,
            (100..110).map(|value| {
                assert!(value < 104, "iterator failure");
                Probe::new(value, &ledger)
            }),
        )
    }));

    assert!(result.is_err());
    assert_eq!(fingerprint(&array), before);
    assert_eq!(ledger.live.get(), 4);
}

#[test]
fn clone_with_failing_element_clone() {
    let ledger = Rc::new(Ledger::default());
    let array = probes(5, &ledger);

    ledger.clones_allowed.set(3);

    let result = catch_unwind(AssertUnwindSafe(|| array.clone()));

    assert!(result.is_err());
    assert_eq!(values_of(&array), [0, 1, 2, 3, 4]);
    assert_eq!(ledger.live.get(), 5);
}

#[test]
fn panicking_destructor_during_erase_still_shifts_tail() {
    struct Grumpy {
        value: u32,
        explode: bool,
    }

    impl Drop for Grumpy {
        fn drop(&mut self) {
            assert!(!self.explode, "destructor failure");
        }
    }

    let mut array = GrowableArray::new();

    for value in 0..5 {
        array
            .push_back(Grumpy {
                value,
                explode: value == 1,
            })
            .unwrap();
    }

    let result = catch_unwind(AssertUnwindSafe(|| array.erase_range(1..3)));

    assert!(result.is_err());

    let remaining: Vec<_> = array.iter().map(|item| item.value).collect();
    assert_eq!(remaining, [0, 3, 4]);
}
