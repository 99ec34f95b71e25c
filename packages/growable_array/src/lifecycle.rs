//! Placement construction and conditional destruction of elements in raw storage.
//!
//! None of these functions check bounds or liveness. The caller is responsible for knowing
//! which slots are initialized and which are not.

use std::mem;
use std::ptr::NonNull;

/// Writes `value` into the uninitialized slot at `slot`.
///
/// # Safety
///
/// The caller must ensure that `slot` is valid for writes, properly aligned for `T` and does
/// not currently hold a live object (any object there is overwritten without being dropped).
#[inline]
pub unsafe fn construct<T>(slot: NonNull<T>, value: T) {
    // SAFETY: Forwarding safety requirements to the caller.
    unsafe {
        slot.write(value);
    }
}

/// Constructs an object in the uninitialized slot at `slot` from the result of `f`.
///
/// This is the general form of in-place construction; default construction and copy
/// construction are both expressed through it. If `f` panics, the slot remains
/// uninitialized.
///
/// # Safety
///
/// Same as [`construct()`].
#[inline]
pub unsafe fn construct_with<T>(slot: NonNull<T>, f: impl FnOnce() -> T) {
    // SAFETY: Forwarding safety requirements to the caller.
    unsafe {
        slot.write(f());
    }
}

/// Constructs `T::default()` in the uninitialized slot at `slot`.
///
/// # Safety
///
/// Same as [`construct()`].
#[inline]
pub unsafe fn construct_default<T: Default>(slot: NonNull<T>) {
    // SAFETY: Forwarding safety requirements to the caller.
    unsafe {
        construct_with(slot, T::default);
    }
}

/// Constructs a clone of `source` in the uninitialized slot at `slot`.
///
/// # Safety
///
/// Same as [`construct()`].
#[inline]
pub unsafe fn construct_clone<T: Clone>(slot: NonNull<T>, source: &T) {
    // SAFETY: Forwarding safety requirements to the caller.
    unsafe {
        construct_with(slot, || source.clone());
    }
}

/// Drops the object at `slot` in place, leaving the slot uninitialized.
///
/// Does nothing for types that do not need to be dropped.
///
/// # Safety
///
/// The caller must ensure that `slot` points to a live, properly aligned `T` that nobody
/// will use (or drop) again.
#[inline]
pub unsafe fn destroy<T>(slot: NonNull<T>) {
    if !mem::needs_drop::<T>() {
        return;
    }

    // SAFETY: Forwarding safety requirements to the caller.
    unsafe {
        slot.drop_in_place();
    }
}

/// Drops `count` consecutive objects starting at `first`, leaving the slots uninitialized.
///
/// Does nothing for types that do not need to be dropped. If one of the destructors panics,
/// the remaining objects are still dropped (the same behavior as dropping a slice).
///
/// # Safety
///
/// The caller must ensure that all `count` slots starting at `first` hold live, properly
/// aligned objects that nobody will use (or drop) again.
#[inline]
pub unsafe fn destroy_range<T>(first: NonNull<T>, count: usize) {
    if !mem::needs_drop::<T>() || count == 0 {
        return;
    }

    let range = NonNull::slice_from_raw_parts(first, count);

    // SAFETY: Forwarding safety requirements to the caller.
    unsafe {
        range.drop_in_place();
    }
}

/// Tracks a run of slots being constructed left to right.
///
/// If the guard is dropped without being committed (typically because an element constructor
/// panicked), every object it constructed is destroyed again, so the slots return to the
/// uninitialized state and nothing leaks.
#[derive(Debug)]
pub(crate) struct ConstructionGuard<T> {
    first: NonNull<T>,
    constructed: usize,
}

impl<T> ConstructionGuard<T> {
    /// Starts tracking construction into the uninitialized slots starting at `first`.
    #[must_use]
    pub(crate) fn new(first: NonNull<T>) -> Self {
        Self {
            first,
            constructed: 0,
        }
    }

    /// The number of objects constructed so far.
    #[must_use]
    pub(crate) fn constructed(&self) -> usize {
        self.constructed
    }

    /// Constructs the next object from the result of `f`.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the next slot (at offset [`constructed()`][Self::constructed]
    /// from the first slot) is valid for writes and uninitialized.
    pub(crate) unsafe fn push_with(&mut self, f: impl FnOnce() -> T) {
        // SAFETY: Forwarding safety requirements to the caller.
        let slot = unsafe { self.first.add(self.constructed) };

        // SAFETY: Forwarding safety requirements to the caller.
        unsafe {
            construct_with(slot, f);
        }

        // Cannot overflow because we would run out of memory first.
        self.constructed = self.constructed.wrapping_add(1);
    }

    /// Constructs the next object by moving `value` into it.
    ///
    /// # Safety
    ///
    /// Same as [`push_with()`][Self::push_with].
    pub(crate) unsafe fn push(&mut self, value: T) {
        // SAFETY: Forwarding safety requirements to the caller.
        unsafe {
            self.push_with(|| value);
        }
    }

    /// Stops tracking the constructed objects, making them the responsibility of the caller.
    ///
    /// Returns the number of objects that were constructed.
    pub(crate) fn commit(self) -> usize {
        let constructed = self.constructed;
        mem::forget(self);
        constructed
    }
}

impl<T> Drop for ConstructionGuard<T> {
    fn drop(&mut self) {
        // SAFETY: We only count slots after they have been successfully constructed, and
        // nobody else has taken responsibility for them because we were not committed.
        unsafe {
            destroy_range(self.first, self.constructed);
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    reason = "test code doesn't need the same safety rigor as production code"
)]
mod tests {
    use std::cell::Cell;
    use std::mem::MaybeUninit;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::rc::Rc;

    use super::*;

    /// Test helper that counts how many times instances have been dropped.
    struct DropCounter {
        drops: Rc<Cell<usize>>,
    }

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    fn slot_of<T>(storage: &mut MaybeUninit<T>) -> NonNull<T> {
        NonNull::from(storage).cast()
    }

    #[test]
    fn construct_then_destroy() {
        let drops = Rc::new(Cell::new(0));
        let mut storage = MaybeUninit::<DropCounter>::uninit();
        let slot = slot_of(&mut storage);

        unsafe {
            construct(
                slot,
                DropCounter {
                    drops: Rc::clone(&drops),
                },
            );
        }

        assert_eq!(drops.get(), 0);

        unsafe {
            destroy(slot);
        }

        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn construct_default_and_clone() {
        let mut first = MaybeUninit::<String>::uninit();
        let mut second = MaybeUninit::<String>::uninit();

        unsafe {
            construct_default(slot_of(&mut first));
            construct_clone(slot_of(&mut second), &"copy".to_string());
        }

        let first = unsafe { first.assume_init() };
        let second = unsafe { second.assume_init() };

        assert_eq!(first, "");
        assert_eq!(second, "copy");
    }

    #[test]
    fn destroy_range_drops_every_element() {
        let drops = Rc::new(Cell::new(0));
        let mut storage: [MaybeUninit<DropCounter>; 4] = [const { MaybeUninit::uninit() }; 4];
        let first = NonNull::from(&mut storage).cast::<DropCounter>();

        for index in 0..4 {
            unsafe {
                construct(
                    first.add(index),
                    DropCounter {
                        drops: Rc::clone(&drops),
                    },
                );
            }
        }

        unsafe {
            destroy_range(first.add(1), 3);
        }

        assert_eq!(drops.get(), 3);

        unsafe {
            destroy(first);
        }

        assert_eq!(drops.get(), 4);
    }

    #[test]
    fn destroy_range_of_zero_is_noop() {
        let mut storage = MaybeUninit::<String>::uninit();

        // Nothing is initialized, so anything other than a no-op would be UB under Miri.
        unsafe {
            destroy_range(slot_of(&mut storage), 0);
        }
    }

    #[test]
    fn trivially_destructible_destroy_is_noop() {
        let mut storage = MaybeUninit::<u64>::new(42);

        unsafe {
            destroy(slot_of(&mut storage));
        }

        // The value is untouched because u64 needs no destructor logic.
        assert_eq!(unsafe { storage.assume_init() }, 42);
    }

    #[test]
    fn guard_commit_keeps_objects() {
        let drops = Rc::new(Cell::new(0));
        let mut storage: [MaybeUninit<DropCounter>; 2] = [const { MaybeUninit::uninit() }; 2];
        let first = NonNull::from(&mut storage).cast::<DropCounter>();

        let mut guard = ConstructionGuard::new(first);

        for _ in 0..2 {
            unsafe {
                guard.push(DropCounter {
                    drops: Rc::clone(&drops),
                });
            }
        }

        assert_eq!(guard.constructed(), 2);
        assert_eq!(guard.commit(), 2);
        assert_eq!(drops.get(), 0);

        unsafe {
            destroy_range(first, 2);
        }

        assert_eq!(drops.get(), 2);
    }

    #[test]
    fn guard_destroys_prefix_on_panic() {
        let drops = Rc::new(Cell::new(0));
        let mut storage: [MaybeUninit<DropCounter>; 4] = [const { MaybeUninit::uninit() }; 4];
        let first = NonNull::from(&mut storage).cast::<DropCounter>();

        let result = catch_unwind(AssertUnwindSafe(|| {
            let mut guard = ConstructionGuard::new(first);

            for index in 0..4 {
                unsafe {
                    guard.push_with(|| {
                        assert!(index < 2, "constructor failure");
                        DropCounter {
                            drops: Rc::clone(&drops),
                        }
                    });
                }
            }

            guard.commit();
        }));

        assert!(result.is_err());
        assert_eq!(drops.get(), 2);
    }
}
