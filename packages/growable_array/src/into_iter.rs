use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ptr::NonNull;
use std::{slice, thread};

use crate::{DropPolicy, GrowableArray, RawAllocator};

/// An iterator that moves elements out of a [`GrowableArray`], front to back or back to front.
///
/// Created by the [`IntoIterator`] implementation of [`GrowableArray`]. Elements that are not
/// consumed are destroyed when the iterator is dropped, together with the block.
///
/// The iterator inherits the [`DropPolicy`] of the array. With [`DropPolicy::MustNotDropItems`],
/// dropping the iterator before it is exhausted panics after the remaining elements have been
/// destroyed and the memory released.
///
/// # Examples
///
/// ```
/// use growable_array::GrowableArray;
///
/// let array = GrowableArray::from([String::from("a"), String::from("b")]);
///
/// let mut iter = array.into_iter();
///
/// assert_eq!(iter.next_back().as_deref(), Some("b"));
/// assert_eq!(iter.next().as_deref(), Some("a"));
/// assert_eq!(iter.next(), None);
/// ```
pub struct IntoIter<T> {
    block: NonNull<T>,
    block_capacity: usize,

    /// Slots `front..back` still hold live elements.
    front: usize,
    back: usize,

    drop_policy: DropPolicy,

    _owns: PhantomData<T>,
}

impl<T> IntoIter<T> {
    pub(crate) fn new(array: GrowableArray<T>) -> Self {
        let (block, len, block_capacity, drop_policy) = array.into_raw_parts();

        Self {
            block,
            block_capacity,
            front: 0,
            back: len,
            drop_policy,
            _owns: PhantomData,
        }
    }

    /// The elements that have not yet been consumed.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: front <= back <= len, so the offset is within the block.
        let first = unsafe { self.block.add(self.front) };

        // SAFETY: The slots front..back hold live elements owned by us.
        unsafe { slice::from_raw_parts(first.as_ptr(), self.remaining()) }
    }

    fn remaining(&self) -> usize {
        // Cannot underflow because front never passes back.
        self.back.wrapping_sub(self.front)
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }

        // SAFETY: front < back <= len, so the offset is within the block.
        let slot = unsafe { self.block.add(self.front) };

        // SAFETY: front < back, so the slot holds a live element. Advancing front below
        // transfers its ownership to the caller exactly once.
        let item = unsafe { slot.read() };

        // Cannot overflow because front < back.
        self.front = self.front.wrapping_add(1);

        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }

        // Cannot underflow because front < back.
        self.back = self.back.wrapping_sub(1);

        // SAFETY: The new back is less than len, so the offset is within the block.
        let slot = unsafe { self.block.add(self.back) };

        // SAFETY: The slot holds a live element that is no longer counted as remaining, so
        // ownership is transferred to the caller exactly once.
        Some(unsafe { slot.read() })
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

impl<T> Drop for IntoIter<T> {
    fn drop(&mut self) {
        let remaining = self.remaining();

        {
            let block = self.block;
            let block_capacity = self.block_capacity;

            // Release the block even if one of the element destructors panics.
            let _release = scopeguard::guard((), move |()| {
                // SAFETY: The block was allocated for block_capacity elements and we own it.
                unsafe {
                    RawAllocator::<T>::new().deallocate(block, block_capacity);
                }
            });

            // SAFETY: front <= len, so the offset is within the block.
            let first = unsafe { block.add(self.front) };

            self.front = self.back;

            // SAFETY: The slots that were front..back hold live elements that nobody consumed.
            unsafe {
                crate::destroy_range(first, remaining);
            }
        }

        // Same as the array: clean up first and never panic on top of another panic.
        if !thread::panicking() && matches!(self.drop_policy, DropPolicy::MustNotDropItems) {
            assert!(
                remaining == 0,
                "dropped an unfinished IntoIter with {remaining} remaining elements - this is forbidden by DropPolicy::MustNotDropItems"
            );
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for IntoIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}

// SAFETY: The iterator exclusively owns the remaining elements, same as the array it came from.
unsafe impl<T: Send> Send for IntoIter<T> {}

// SAFETY: Shared access to the iterator only grants shared access to the remaining elements.
unsafe impl<T: Sync> Sync for IntoIter<T> {}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(
    clippy::arithmetic_side_effects,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(IntoIter<u32>: Send, Sync, ExactSizeIterator, DoubleEndedIterator);
    assert_not_impl_any!(IntoIter<Rc<u32>>: Send, Sync);

    struct Counted(Rc<Cell<usize>>);

    impl Drop for Counted {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn yields_in_order() {
        let array = GrowableArray::from([1, 2, 3]);

        let collected: Vec<_> = array.into_iter().collect();

        assert_eq!(collected, [1, 2, 3]);
    }

    #[test]
    fn yields_from_both_ends() {
        let mut iter = GrowableArray::from([1, 2, 3, 4]).into_iter();

        assert_eq!(iter.len(), 4);
        assert_eq!(iter.next(), Some(1));
        assert_eq!(iter.next_back(), Some(4));
        assert_eq!(iter.as_slice(), [2, 3]);
        assert_eq!(iter.len(), 2);
        assert_eq!(iter.next_back(), Some(3));
        assert_eq!(iter.next(), Some(2));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    fn drop_destroys_unconsumed_only() {
        let drops = Rc::new(Cell::new(0));
        let mut array = GrowableArray::new();

        for _ in 0..5 {
            array.push_back(Counted(Rc::clone(&drops))).unwrap();
        }

        let mut iter = array.into_iter();

        let first = iter.next();
        let last = iter.next_back();
        assert_eq!(drops.get(), 0);

        drop(iter);
        assert_eq!(drops.get(), 3);

        drop(first);
        drop(last);
        assert_eq!(drops.get(), 5);
    }

    #[test]
    fn empty_and_zero_sized() {
        assert_eq!(GrowableArray::<String>::new().into_iter().next(), None);

        let array: GrowableArray<()> = std::iter::repeat_n((), 10).collect();
        assert_eq!(array.into_iter().count(), 10);
    }

    fn must_not_drop(values: &[u32]) -> GrowableArray<u32> {
        let mut array = GrowableArray::builder()
            .drop_policy(DropPolicy::MustNotDropItems)
            .build()
            .unwrap();

        array.extend_from_slice(values).unwrap();
        array
    }

    #[test]
    #[should_panic(expected = "forbidden by DropPolicy::MustNotDropItems")]
    fn must_not_drop_items_panics_when_dropped_unfinished() {
        let array = must_not_drop(&[1]);

        drop(array.into_iter());
    }

    #[test]
    fn must_not_drop_items_allows_exhausted_drop() {
        let array = must_not_drop(&[1, 2, 3]);

        let mut iter = array.into_iter();

        assert_eq!(iter.next(), Some(1));
        assert_eq!(iter.next_back(), Some(3));
        assert_eq!(iter.next(), Some(2));
        assert_eq!(iter.next(), None);

        drop(iter);
    }

    #[test]
    fn must_not_drop_items_releases_elements_before_panicking() {
        let drops = Rc::new(Cell::new(0));
        let mut array = GrowableArray::builder()
            .drop_policy(DropPolicy::MustNotDropItems)
            .build()
            .unwrap();

        for _ in 0..3 {
            array.push_back(Counted(Rc::clone(&drops))).unwrap();
        }

        let mut iter = array.into_iter();
        drop(iter.next());

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || drop(iter)));

        assert!(result.is_err());
        assert_eq!(drops.get(), 3);
    }

    #[test]
    fn may_drop_items_allows_unfinished_drop() {
        let iter = GrowableArray::from([1, 2, 3]).into_iter();

        drop(iter);
    }

    #[test]
    fn debug_shows_remaining() {
        let mut iter = GrowableArray::from([1, 2]).into_iter();
        iter.next();

        assert_eq!(format!("{iter:?}"), "IntoIter([2])");
    }
}
