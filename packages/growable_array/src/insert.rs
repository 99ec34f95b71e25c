use std::ops::{Bound, RangeBounds};
use std::ptr;

use crate::{ConstructionGuard, Error, GrowableArray, Result};

/// A run of uninitialized slots opened in the middle of an array by shifting the elements after
/// it towards the end of the block.
///
/// Dropping the gap shifts those elements back so they directly follow however many slots were
/// filled, and makes the filled slots part of the array. If nothing was filled (e.g. because an
/// element constructor panicked), the array returns to exactly its original state.
struct Gap<'a, T> {
    array: &'a mut GrowableArray<T>,
    position: usize,
    width: usize,

    /// Number of elements that were moved out of the way.
    tail: usize,

    filled: usize,
}

impl<'a, T> Gap<'a, T> {
    /// Opens a gap of `width` slots at `position`.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `position <= len` and that the spare capacity is at least
    /// `width`.
    unsafe fn open(array: &'a mut GrowableArray<T>, position: usize, width: usize) -> Self {
        let len = array.len();

        debug_assert!(position <= len);
        debug_assert!(width <= array.spare_capacity());

        // Cannot underflow because position <= len.
        let tail = len.wrapping_sub(position);

        // Cannot overflow because all of these are within the block capacity.
        let gap_end = position.wrapping_add(width);

        // SAFETY: position <= len <= capacity.
        let source = unsafe { array.slot(position) };

        // SAFETY: The caller guarantees spare capacity for the gap, so gap_end <= capacity.
        let target = unsafe { array.slot(gap_end) };

        if tail > width {
            // The last `width` elements move into spare capacity, which never overlaps them.
            // SAFETY: width < tail <= len.
            let last = unsafe { array.slot(len.wrapping_sub(width)) };

            // SAFETY: len <= capacity.
            let end = unsafe { array.slot(len) };

            // SAFETY: The source holds live elements and the destination is spare capacity
            // with room for `width` elements.
            unsafe {
                ptr::copy_nonoverlapping(last.as_ptr(), end.as_ptr(), width);
            }

            // The rest of the tail shifts within the live range, overlapping itself.
            // SAFETY: Both ranges are inside the block and ptr::copy permits overlap.
            unsafe {
                ptr::copy(source.as_ptr(), target.as_ptr(), tail.wrapping_sub(width));
            }
        } else {
            // The whole tail lands at or beyond the old end, so no slot is both read and written.
            // SAFETY: Both ranges are inside the block. The destination starts at or after len.
            unsafe {
                ptr::copy_nonoverlapping(source.as_ptr(), target.as_ptr(), tail);
            }
        }

        // While the gap is open, only the prefix counts as live.
        array.set_len(position);

        Self {
            array,
            position,
            width,
            tail,
            filled: 0,
        }
    }

    fn start(&self) -> ConstructionGuard<T> {
        // SAFETY: The position is within the block because position <= len.
        ConstructionGuard::new(unsafe { self.array.slot(self.position) })
    }

    /// Closes the gap, keeping the first `filled` slots of it as live elements.
    fn close(mut self, filled: usize) {
        debug_assert!(filled <= self.width);
        self.filled = filled;
    }
}

impl<T> Drop for Gap<'_, T> {
    fn drop(&mut self) {
        // Cannot overflow because all of these are within the block capacity.
        let filled_end = self.position.wrapping_add(self.filled);
        let gap_end = self.position.wrapping_add(self.width);

        if filled_end != gap_end {
            // SAFETY: The gap was opened within the capacity.
            let source = unsafe { self.array.slot(gap_end) };

            // SAFETY: filled_end < gap_end, which is within the capacity.
            let target = unsafe { self.array.slot(filled_end) };

            // SAFETY: The tail elements are live at gap_end and the destination is inside the
            // block. The ranges may overlap, which ptr::copy permits.
            unsafe {
                ptr::copy(source.as_ptr(), target.as_ptr(), self.tail);
            }
        }

        self.array.set_len(filled_end.wrapping_add(self.tail));
    }
}

impl<T> GrowableArray<T> {
    /// Inserts `value` before the element at `position`, shifting all elements after it.
    ///
    /// A `position` equal to [`len()`][Self::len] appends. Returns the position of the inserted
    /// element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if `position` is greater than [`len()`][Self::len], as well
    /// as [`Error::LengthExceeded`] or [`Error::AllocationFailed`] if the array needs to grow
    /// and cannot. The array is unchanged in all cases and `value` is dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use growable_array::GrowableArray;
    ///
    /// let mut array = GrowableArray::from([1, 2, 3]);
    ///
    /// let position = array.insert(1, 9).unwrap();
    ///
    /// assert_eq!(position, 1);
    /// assert_eq!(array, [1, 9, 2, 3]);
    /// ```
    pub fn insert(&mut self, position: usize, value: T) -> Result<usize> {
        self.emplace(position, || value)
    }

    /// Inserts an element constructed in place by `f` before the element at `position`.
    ///
    /// If the array needs to grow, the new element is constructed directly in the new block
    /// before the existing elements are moved over. If `f` panics, the array is unchanged.
    ///
    /// # Errors
    ///
    /// Same as [`insert()`][Self::insert]. `f` is not called on error.
    pub fn emplace(&mut self, position: usize, f: impl FnOnce() -> T) -> Result<usize> {
        self.check_position(position)?;

        self.insert_counted(position, 1, |guard| {
            // SAFETY: The gap has room for exactly the one element we construct here.
            unsafe {
                guard.push_with(f);
            }
        })?;

        Ok(position)
    }

    /// Inserts `count` clones of `value` before the element at `position`.
    ///
    /// Returns `position`. If any clone panics, the array is unchanged.
    ///
    /// # Errors
    ///
    /// Same as [`insert()`][Self::insert].
    ///
    /// # Examples
    ///
    /// ```
    /// use growable_array::GrowableArray;
    ///
    /// let mut array = GrowableArray::from([1, 5]);
    ///
    /// array.insert_n(1, 3, &0).unwrap();
    ///
    /// assert_eq!(array, [1, 0, 0, 0, 5]);
    /// ```
    pub fn insert_n(&mut self, position: usize, count: usize, value: &T) -> Result<usize>
    where
        T: Clone,
    {
        self.check_position(position)?;

        self.insert_counted(position, count, |guard| {
            for _ in 0..count {
                // SAFETY: The gap has room for exactly `count` elements.
                unsafe {
                    guard.push_with(|| value.clone());
                }
            }
        })?;

        Ok(position)
    }

    /// Inserts clones of all the elements of `items` before the element at `position`,
    /// preserving their order.
    ///
    /// Returns `position`. If any clone panics, the array is unchanged.
    ///
    /// # Errors
    ///
    /// Same as [`insert()`][Self::insert].
    pub fn insert_slice(&mut self, position: usize, items: &[T]) -> Result<usize>
    where
        T: Clone,
    {
        self.check_position(position)?;

        self.insert_counted(position, items.len(), |guard| {
            for item in items {
                // SAFETY: The gap has room for exactly `items.len()` elements.
                unsafe {
                    guard.push_with(|| item.clone());
                }
            }
        })?;

        Ok(position)
    }

    /// Inserts all the items produced by `items` before the element at `position`, preserving
    /// their order.
    ///
    /// If the iterator reports an exact size, the gap is opened once and filled directly.
    /// Otherwise, the items are first collected into a temporary array and then moved into
    /// place, so the iterator is only traversed once. Returns `position`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if `position` is greater than [`len()`][Self::len], in
    /// which case the array is unchanged. Returns [`Error::LengthExceeded`] or
    /// [`Error::AllocationFailed`] if the array needs to grow and cannot. If the iterator
    /// produces more items than its exact size hint announced, the announced items are inserted
    /// first and remain in the array when inserting the surplus fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use growable_array::GrowableArray;
    ///
    /// let mut array = GrowableArray::from([0, 100]);
    ///
    /// array.insert_iter(1, (1..5).filter(|n| n % 2 == 0)).unwrap();
    ///
    /// assert_eq!(array, [0, 2, 4, 100]);
    /// ```
    pub fn insert_iter<I>(&mut self, position: usize, items: I) -> Result<usize>
    where
        I: IntoIterator<Item = T>,
    {
        self.check_position(position)?;

        let mut items = items.into_iter();

        let inserted = match items.size_hint() {
            (lower, Some(upper)) if lower == upper => {
                self.insert_counted(position, lower, |guard| {
                    for item in items.by_ref().take(lower) {
                        // SAFETY: The gap has room for `lower` elements and take() limits us.
                        unsafe {
                            guard.push(item);
                        }
                    }
                })?
            }
            _ => 0,
        };

        // Anything the size hint did not account for is collected in one pass before insertion.
        let mut rest = Self::new();

        for item in items {
            rest.push_back(item)?;
        }

        if rest.is_empty() {
            return Ok(position);
        }

        let count = rest.len();
        let mut source = rest.into_iter();

        // Cannot overflow because the inserted elements are already in the array.
        self.insert_counted(position.wrapping_add(inserted), count, |guard| {
            for item in source.by_ref() {
                // SAFETY: The gap has room for `count` elements, which is all the source has.
                unsafe {
                    guard.push(item);
                }
            }
        })?;

        Ok(position)
    }

    /// Appends clones of all the elements of `items`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthExceeded`] or [`Error::AllocationFailed`] if the array needs to
    /// grow and cannot. The array is unchanged in both cases.
    pub fn extend_from_slice(&mut self, items: &[T]) -> Result<()>
    where
        T: Clone,
    {
        let position = self.len();
        self.insert_slice(position, items).map(|_| ())
    }

    /// Appends all the items produced by `items`.
    ///
    /// Exact-size iterators are appended in one step; any other iterator is appended one item
    /// at a time, growing as needed. Items appended before an error or a panic remain.
    pub(crate) fn append_iter<I>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        let mut items = items.into_iter();

        match items.size_hint() {
            (lower, Some(upper)) if lower == upper => {
                self.append_counted(lower, |guard| {
                    for item in items.by_ref().take(lower) {
                        // SAFETY: The gap has room for `lower` elements and take() limits us.
                        unsafe {
                            guard.push(item);
                        }
                    }
                })?;
            }
            _ => {}
        }

        for item in items {
            self.push_back(item)?;
        }

        Ok(())
    }

    /// Removes and destroys the element at `position`, shifting all elements after it.
    ///
    /// Returns `position`, which now refers to the element that followed the removed one (or
    /// equals [`len()`][Self::len] if the last element was removed).
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if `position` is not less than [`len()`][Self::len]. The
    /// array is unchanged in this case.
    ///
    /// # Examples
    ///
    /// ```
    /// use growable_array::GrowableArray;
    ///
    /// let mut array = GrowableArray::from([1, 9, 2, 3]);
    ///
    /// assert_eq!(array.erase(0), Ok(0));
    /// assert_eq!(array, [9, 2, 3]);
    /// ```
    pub fn erase(&mut self, position: usize) -> Result<usize> {
        if position >= self.len() {
            return Err(Error::OutOfRange {
                index: position,
                len: self.len(),
            });
        }

        // Cannot overflow because position < len.
        self.erase_range(position..position.wrapping_add(1))
    }

    /// Removes and destroys the elements in `range`, shifting all elements after it.
    ///
    /// Returns the start of the range, which now refers to the element that followed the
    /// removed ones. An empty range changes nothing. The capacity is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if the range does not lie within the array. The array is
    /// unchanged in this case.
    ///
    /// # Examples
    ///
    /// ```
    /// use growable_array::GrowableArray;
    ///
    /// let mut array = GrowableArray::from([1, 2, 3, 4, 5]);
    ///
    /// assert_eq!(array.erase_range(1..3), Ok(1));
    /// assert_eq!(array, [1, 4, 5]);
    /// ```
    pub fn erase_range(&mut self, range: impl RangeBounds<usize>) -> Result<usize> {
        let len = self.len();

        let start = match range.start_bound() {
            Bound::Included(&start) => start,
            Bound::Excluded(&start) => start
                .checked_add(1)
                .ok_or(Error::OutOfRange { index: start, len })?,
            Bound::Unbounded => 0,
        };

        let end = match range.end_bound() {
            Bound::Included(&end) => end
                .checked_add(1)
                .ok_or(Error::OutOfRange { index: end, len })?,
            Bound::Excluded(&end) => end,
            Bound::Unbounded => len,
        };

        if end > len {
            return Err(Error::OutOfRange { index: end, len });
        }

        if start > end {
            return Err(Error::OutOfRange { index: start, len });
        }

        if start == end {
            return Ok(start);
        }

        // Cannot underflow because start < end <= len.
        let removed = end.wrapping_sub(start);
        let tail = len.wrapping_sub(end);

        // SAFETY: end <= len <= capacity.
        let source = unsafe { self.slot(end) };
        // SAFETY: start < end <= capacity.
        let target = unsafe { self.slot(start) };

        // Until the tail is shifted down, only the prefix counts as live.
        self.set_len(start);

        // The tail is shifted down even if one of the destructors panics.
        let _shift = scopeguard::guard(&mut *self, |array| {
            // SAFETY: The tail is live at `source` and the destination slots were vacated by
            // destroying the removed elements. ptr::copy permits overlap.
            unsafe {
                ptr::copy(source.as_ptr(), target.as_ptr(), tail);
            }

            // Cannot overflow because the result is less than the original len.
            array.set_len(start.wrapping_add(tail));
        });

        // SAFETY: The removed slots held live elements that are no longer counted as live.
        unsafe {
            crate::destroy_range(target, removed);
        }

        Ok(start)
    }

    /// Removes the element at `position` and returns it, shifting all elements after it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if `position` is not less than [`len()`][Self::len]. The
    /// array is unchanged in this case.
    pub fn remove(&mut self, position: usize) -> Result<T> {
        let len = self.len();

        if position >= len {
            return Err(Error::OutOfRange {
                index: position,
                len,
            });
        }

        // Cannot overflow because position < len.
        let next = position.wrapping_add(1);

        // SAFETY: position < len <= capacity.
        let target = unsafe { self.slot(position) };

        // SAFETY: next <= len <= capacity.
        let source = unsafe { self.slot(next) };

        // SAFETY: position < len, so the slot holds a live element. Ownership moves out here and
        // the slot is overwritten by the shift below before anyone can observe it.
        let value = unsafe { target.read() };

        // SAFETY: Both ranges are inside the live part of the block. ptr::copy permits overlap.
        unsafe {
            ptr::copy(source.as_ptr(), target.as_ptr(), len.wrapping_sub(next));
        }

        self.set_len(len.wrapping_sub(1));

        Ok(value)
    }

    /// Inserts elements constructed by `fill` at `position`, which must already be validated.
    ///
    /// Returns the number of elements that `fill` constructed, which must not exceed `count`.
    /// If `fill` panics, the array is unchanged.
    pub(crate) fn insert_counted(
        &mut self,
        position: usize,
        count: usize,
        fill: impl FnOnce(&mut ConstructionGuard<T>),
    ) -> Result<usize> {
        if count == 0 {
            return Ok(0);
        }

        if position == self.len() {
            return self.append_counted(count, fill);
        }

        if count > self.spare_capacity() {
            let new_capacity = self.grown_capacity(count)?;
            return self.relocate_with_gap(new_capacity, position, fill);
        }

        // SAFETY: The position was validated by the caller and we checked the spare capacity.
        let gap = unsafe { Gap::open(self, position, count) };

        let mut guard = gap.start();
        fill(&mut guard);

        let constructed = guard.commit();
        gap.close(constructed);

        Ok(constructed)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]
mod tests {
    use std::cell::Cell;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::rc::Rc;

    use super::*;

    /// Element whose clones start failing once a shared budget runs out.
    #[derive(Debug, PartialEq)]
    struct Fragile {
        value: u32,
        budget: Rc<Cell<usize>>,
    }

    impl Clone for Fragile {
        fn clone(&self) -> Self {
            let remaining = self.budget.get();
            assert!(remaining > 0, "clone budget exhausted");
            self.budget.set(remaining - 1);

            Self {
                value: self.value,
                budget: Rc::clone(&self.budget),
            }
        }
    }

    fn fragile_array(values: &[u32], budget: &Rc<Cell<usize>>) -> GrowableArray<Fragile> {
        values
            .iter()
            .map(|value| Fragile {
                value: *value,
                budget: Rc::clone(budget),
            })
            .collect()
    }

    fn values_of(array: &GrowableArray<Fragile>) -> Vec<u32> {
        array.iter().map(|item| item.value).collect()
    }

    /// Iterator that claims an exact size it does not actually have.
    struct Liar {
        inner: std::ops::Range<u32>,
        claimed: usize,
    }

    impl Iterator for Liar {
        type Item = u32;

        fn next(&mut self) -> Option<u32> {
            self.inner.next()
        }

        fn size_hint(&self) -> (usize, Option<usize>) {
            (self.claimed, Some(self.claimed))
        }
    }

    #[test]
    fn insert_in_middle() {
        let mut array = GrowableArray::from([1, 2, 3]);

        assert_eq!(array.insert(1, 9), Ok(1));
        assert_eq!(array, [1, 9, 2, 3]);
        array.integrity_check();
    }

    #[test]
    fn insert_at_front_and_end() {
        let mut array = GrowableArray::from([2]);

        array.insert(0, 1).unwrap();
        array.insert(2, 3).unwrap();

        assert_eq!(array, [1, 2, 3]);
    }

    #[test]
    fn insert_past_end_is_error_and_unchanged() {
        let mut array = GrowableArray::from([1, 2]);

        assert_eq!(
            array.insert(3, 9),
            Err(Error::OutOfRange { index: 3, len: 2 })
        );
        assert_eq!(array, [1, 2]);
    }

    #[test]
    fn insert_in_place_keeps_block() {
        let mut array = GrowableArray::builder().capacity(8).build().unwrap();
        array.extend_from_slice(&[1, 2, 3]).unwrap();
        let block = array.as_ptr();

        array.insert(0, 0).unwrap();

        assert_eq!(array, [0, 1, 2, 3]);
        assert_eq!(array.as_ptr(), block);
    }

    #[test]
    fn insert_growth_uses_growth_policy() {
        let mut array = GrowableArray::from([1, 2, 3]);

        array.insert(1, 9).unwrap();

        assert_eq!(array.capacity(), 6);
    }

    #[test]
    fn insert_n_long_tail_in_place() {
        // More elements after the position than are inserted.
        let mut array = GrowableArray::builder().capacity(10).build().unwrap();
        array.extend_from_slice(&[1, 2, 3, 4, 5]).unwrap();

        array.insert_n(1, 2, &0).unwrap();

        assert_eq!(array, [1, 0, 0, 2, 3, 4, 5]);
        assert_eq!(array.capacity(), 10);
    }

    #[test]
    fn insert_n_short_tail_in_place() {
        // Fewer elements after the position than are inserted.
        let mut array = GrowableArray::builder().capacity(10).build().unwrap();
        array.extend_from_slice(&[1, 2, 3]).unwrap();

        array.insert_n(2, 4, &0).unwrap();

        assert_eq!(array, [1, 2, 0, 0, 0, 0, 3]);
        assert_eq!(array.capacity(), 10);
    }

    #[test]
    fn insert_n_equal_tail_in_place() {
        let mut array = GrowableArray::builder().capacity(10).build().unwrap();
        array
            .extend_from_slice(&[String::from("a"), String::from("b")])
            .unwrap();

        array.insert_n(0, 2, &String::from("x")).unwrap();

        assert_eq!(array, ["x", "x", "a", "b"]);
    }

    #[test]
    fn insert_n_large_growth_is_exact() {
        let mut array = GrowableArray::from([1, 2]);

        array.insert_n(1, 10, &7).unwrap();

        assert_eq!(array.len(), 12);
        assert_eq!(array.capacity(), 12);
        assert_eq!(array[0], 1);
        assert_eq!(array[11], 2);
    }

    #[test]
    fn insert_n_zero_is_noop() {
        let mut array = GrowableArray::<u8>::new();

        assert_eq!(array.insert_n(0, 0, &1), Ok(0));
        assert_eq!(array.capacity(), 0);
    }

    #[test]
    fn insert_n_excess_is_length_exceeded() {
        let mut array = GrowableArray::from([1_u64]);

        let result = array.insert_n(0, usize::MAX, &0);

        assert!(matches!(result, Err(Error::LengthExceeded { .. })));
        assert_eq!(array, [1]);
    }

    #[test]
    fn insert_n_panicking_clone_during_growth_leaves_array_unchanged() {
        let budget = Rc::new(Cell::new(usize::MAX));
        let mut array = fragile_array(&[1, 2, 3], &budget);
        let block = array.as_ptr();
        let capacity = array.capacity();

        let value = Fragile {
            value: 9,
            budget: Rc::clone(&budget),
        };

        budget.set(2);

        let result = catch_unwind(AssertUnwindSafe(|| array.insert_n(1, 5, &value)));

        assert!(result.is_err());
        assert_eq!(values_of(&array), [1, 2, 3]);
        assert_eq!(array.capacity(), capacity);
        assert_eq!(array.as_ptr(), block);
    }

    #[test]
    fn insert_n_panicking_clone_in_place_leaves_array_unchanged() {
        for (position, count) in [(0, 2), (1, 5), (3, 1), (2, 1)] {
            let budget = Rc::new(Cell::new(usize::MAX));
            let mut array = fragile_array(&[1, 2, 3, 4], &budget);
            array.reserve(20).unwrap();

            let value = Fragile {
                value: 9,
                budget: Rc::clone(&budget),
            };

            budget.set(count - 1);

            let result = catch_unwind(AssertUnwindSafe(|| array.insert_n(position, count, &value)));

            assert!(result.is_err());
            assert_eq!(values_of(&array), [1, 2, 3, 4]);
            array.integrity_check();
        }
    }

    #[test]
    fn insert_slice_preserves_order() {
        let mut array = GrowableArray::from([1, 5]);

        array.insert_slice(1, &[2, 3, 4]).unwrap();

        assert_eq!(array, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn insert_iter_exact_size() {
        let mut array = GrowableArray::from([String::from("a"), String::from("d")]);

        array
            .insert_iter(1, ["b", "c"].into_iter().map(String::from))
            .unwrap();

        assert_eq!(array, ["a", "b", "c", "d"]);
    }

    #[test]
    fn insert_iter_single_pass() {
        let mut array = GrowableArray::from([0, 100]);

        array
            .insert_iter(1, (1..=10).filter(|value| value % 3 == 0))
            .unwrap();

        assert_eq!(array, [0, 3, 6, 9, 100]);
    }

    #[test]
    fn insert_iter_empty_is_noop() {
        let mut array = GrowableArray::from([1]);

        array.insert_iter(0, std::iter::empty()).unwrap();

        assert_eq!(array, [1]);
    }

    #[test]
    fn insert_iter_tolerates_short_exact_size() {
        let mut array = GrowableArray::from([0_u32, 100]);
        array.reserve(20).unwrap();

        array
            .insert_iter(
                1,
                Liar {
                    inner: 1..3,
                    claimed: 5,
                },
            )
            .unwrap();

        assert_eq!(array, [0, 1, 2, 100]);
        array.integrity_check();
    }

    #[test]
    fn insert_iter_tolerates_long_exact_size() {
        let mut array = GrowableArray::from([0_u32, 100]);

        array
            .insert_iter(
                1,
                Liar {
                    inner: 1..6,
                    claimed: 2,
                },
            )
            .unwrap();

        assert_eq!(array, [0, 1, 2, 3, 4, 5, 100]);
        array.integrity_check();
    }

    #[test]
    fn insert_iter_surplus_failure_keeps_announced_items() {
        let mut array = GrowableArray::<()>::new();
        array.set_len(GrowableArray::<()>::max_size() - 1);

        let items = Liar {
            inner: 0..2,
            claimed: 1,
        }
        .map(|_| ());

        let result = array.insert_iter(0, items);

        assert!(matches!(result, Err(Error::LengthExceeded { .. })));
        assert_eq!(array.len(), GrowableArray::<()>::max_size());
    }

    #[test]
    fn insert_iter_panicking_iterator_leaves_array_unchanged() {
        let mut array = GrowableArray::from([String::from("a"), String::from("b")]);

        let result = catch_unwind(AssertUnwindSafe(|| {
            array.insert_iter(
                1,
                (0..5).map(|index| {
                    assert!(index < 3, "iterator failure");
                    index.to_string()
                }),
            )
        }));

        assert!(result.is_err());
        assert_eq!(array, ["a", "b"]);
    }

    #[test]
    fn erase_returns_position() {
        let mut array = GrowableArray::from([1, 9, 2, 3]);

        assert_eq!(array.erase(0), Ok(0));
        assert_eq!(array, [9, 2, 3]);

        assert_eq!(array.erase(2), Ok(2));
        assert_eq!(array, [9, 2]);
        assert_eq!(array.capacity(), 4);
    }

    #[test]
    fn erase_out_of_range_is_error() {
        let mut array = GrowableArray::from([1]);

        assert_eq!(array.erase(1), Err(Error::OutOfRange { index: 1, len: 1 }));
        assert_eq!(array, [1]);
    }

    #[test]
    fn erase_range_variants() {
        let mut array: GrowableArray<u32> = (0..10).collect();

        assert_eq!(array.erase_range(2..2), Ok(2));
        assert_eq!(array.len(), 10);

        assert_eq!(array.erase_range(..=1), Ok(0));
        assert_eq!(array, [2, 3, 4, 5, 6, 7, 8, 9]);

        assert_eq!(array.erase_range(6..), Ok(6));
        assert_eq!(array, [2, 3, 4, 5, 6, 7]);

        assert_eq!(array.erase_range(1..4), Ok(1));
        assert_eq!(array, [2, 6, 7]);

        assert_eq!(array.erase_range(..), Ok(0));
        assert!(array.is_empty());
    }

    #[test]
    fn erase_range_invalid_is_error() {
        let mut array = GrowableArray::from([1, 2, 3]);

        assert_eq!(
            array.erase_range(1..4),
            Err(Error::OutOfRange { index: 4, len: 3 })
        );

        #[allow(clippy::reversed_empty_ranges, reason = "testing invalid input")]
        let result = array.erase_range(2..1);
        assert_eq!(result, Err(Error::OutOfRange { index: 2, len: 3 }));

        assert_eq!(array, [1, 2, 3]);
    }

    #[test]
    fn erase_range_destroys_exactly_removed() {
        struct Counted(Rc<Cell<usize>>);

        impl Drop for Counted {
            fn drop(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        let drops = Rc::new(Cell::new(0));
        let mut array = GrowableArray::new();

        for _ in 0..6 {
            array.push_back(Counted(Rc::clone(&drops))).unwrap();
        }

        array.erase_range(1..4).unwrap();

        assert_eq!(drops.get(), 3);
        assert_eq!(array.len(), 3);

        drop(array);
        assert_eq!(drops.get(), 6);
    }

    #[test]
    fn remove_returns_element() {
        let mut array = GrowableArray::from([String::from("a"), String::from("b")]);

        assert_eq!(array.remove(0).unwrap(), "a");
        assert_eq!(array, ["b"]);
        assert_eq!(
            array.remove(1),
            Err(Error::OutOfRange { index: 1, len: 1 })
        );
    }

    #[test]
    fn zero_sized_insert_and_erase() {
        let mut array = GrowableArray::new();

        array.insert_n(0, 100, &()).unwrap();
        array.insert(50, ()).unwrap();
        assert_eq!(array.len(), 101);

        array.erase_range(10..20).unwrap();
        assert_eq!(array.len(), 91);
        assert_eq!(array.remove(0), Ok(()));
        assert_eq!(array.len(), 90);
    }
}
