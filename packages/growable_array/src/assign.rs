use crate::{ConstructionGuard, GrowableArray, Result};

impl<T> GrowableArray<T> {
    /// Replaces the contents of the array with `count` clones of `value`.
    ///
    /// If `count` exceeds the current capacity, a new block of exactly `count` elements is
    /// filled first and then replaces the old one. Otherwise, the existing block is reused: the
    /// overlapping elements are overwritten and the remainder is either destroyed or appended.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthExceeded`][crate::Error::LengthExceeded] or
    /// [`Error::AllocationFailed`][crate::Error::AllocationFailed] if a new block is needed and
    /// cannot be obtained. The array is unchanged in both cases.
    ///
    /// # Examples
    ///
    /// ```
    /// use growable_array::GrowableArray;
    ///
    /// let mut array = GrowableArray::from([1, 2, 3, 4, 5]);
    ///
    /// array.assign_n(2, &7).unwrap();
    ///
    /// assert_eq!(array, [7, 7]);
    /// assert_eq!(array.capacity(), 5);
    /// ```
    pub fn assign_n(&mut self, count: usize, value: &T) -> Result<()>
    where
        T: Clone,
    {
        if count > self.capacity() {
            let fresh = self.rebuilt(count, |guard| {
                for _ in 0..count {
                    // SAFETY: The fresh block has room for exactly `count` elements.
                    unsafe {
                        guard.push_with(|| value.clone());
                    }
                }
            })?;

            self.replace_storage(fresh);
            return Ok(());
        }

        for item in self.iter_mut().take(count) {
            item.clone_from(value);
        }

        // Never reallocates because count fits in the capacity.
        self.resize_value(count, value)
    }

    /// Replaces the contents of the array with clones of the elements of `items`.
    ///
    /// Storage is reused or replaced the same way as in [`assign_n()`][Self::assign_n].
    ///
    /// # Errors
    ///
    /// Same as [`assign_n()`][Self::assign_n].
    pub fn assign_slice(&mut self, items: &[T]) -> Result<()>
    where
        T: Clone,
    {
        if items.len() > self.capacity() {
            let fresh = self.rebuilt(items.len(), |guard| {
                for item in items {
                    // SAFETY: The fresh block has room for exactly `items.len()` elements.
                    unsafe {
                        guard.push_with(|| item.clone());
                    }
                }
            })?;

            self.replace_storage(fresh);
            return Ok(());
        }

        let (overwrite, append) = items.split_at(self.len().min(items.len()));

        for (target, source) in self.iter_mut().zip(overwrite) {
            target.clone_from(source);
        }

        self.truncate(items.len());

        // Never reallocates because all the items fit in the capacity.
        self.append_counted(append.len(), |guard| {
            for item in append {
                // SAFETY: There is spare capacity for all of `append`.
                unsafe {
                    guard.push_with(|| item.clone());
                }
            }
        })?;

        Ok(())
    }

    /// Replaces the contents of the array with the items produced by `items`.
    ///
    /// If the iterator reports an exact size that exceeds the current capacity, a new block of
    /// exactly that size is filled and replaces the old one. Otherwise, the iterator is consumed
    /// in a single pass: existing elements are overwritten one by one, then either the leftover
    /// elements are destroyed or the leftover items are appended (growing as needed).
    ///
    /// # Errors
    ///
    /// Same as [`assign_n()`][Self::assign_n], except that an error while appending leftover
    /// items from a single-pass iterator leaves the items assigned so far in place.
    ///
    /// # Examples
    ///
    /// ```
    /// use growable_array::GrowableArray;
    ///
    /// let mut array = GrowableArray::from(['x', 'y', 'z']);
    ///
    /// array.assign_iter("abcde".chars().filter(|c| *c != 'c')).unwrap();
    ///
    /// assert_eq!(array, ['a', 'b', 'd', 'e']);
    /// ```
    pub fn assign_iter<I>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        let mut items = items.into_iter();

        match items.size_hint() {
            (lower, Some(upper)) if lower == upper && lower > self.capacity() => {
                let fresh = self.rebuilt(lower, |guard| {
                    for item in items.by_ref().take(lower) {
                        // SAFETY: The fresh block has room for `lower` elements and take()
                        // limits us.
                        unsafe {
                            guard.push(item);
                        }
                    }
                })?;

                self.replace_storage(fresh);

                // Surplus items, if the size hint was not accurate.
                return self.append_iter(items);
            }
            _ => {}
        }

        let mut assigned = 0_usize;

        for target in self.iter_mut() {
            let Some(item) = items.next() else {
                break;
            };

            *target = item;

            // Cannot overflow because we are counting existing elements.
            assigned = assigned.wrapping_add(1);
        }

        self.truncate(assigned);
        self.append_iter(items)
    }

    /// Creates an empty array with the same drop policy and a block of exactly `len` elements,
    /// then fills it via `fill`.
    pub(crate) fn rebuilt(
        &self,
        len: usize,
        fill: impl FnOnce(&mut ConstructionGuard<T>),
    ) -> Result<Self> {
        let mut fresh = Self::new_inner(self.drop_policy());
        fresh.reserve(len)?;
        fresh.append_counted(len, fill)?;
        Ok(fresh)
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
    use std::rc::Rc;

    use crate::{DropPolicy, Error, GrowableArray};

    /// Test helper that counts how many times instances have been dropped.
    #[derive(Clone, Debug)]
    struct Tracked {
        value: u32,
        drops: Rc<Cell<usize>>,
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    #[test]
    fn assign_n_truncates_and_destroys_surplus() {
        let drops = Rc::new(Cell::new(0));
        let mut array = GrowableArray::new();

        for value in 0..5 {
            array
                .push_back(Tracked {
                    value,
                    drops: Rc::clone(&drops),
                })
                .unwrap();
        }

        let replacement = Tracked {
            value: 42,
            drops: Rc::clone(&drops),
        };

        let capacity = array.capacity();
        let block = array.as_ptr();

        // Reset the counter after constructing the initial contents.
        drops.set(0);

        array.assign_n(2, &replacement).unwrap();

        assert_eq!(array.len(), 2);
        assert_eq!(array[0].value, 42);
        assert_eq!(array[1].value, 42);
        assert_eq!(array.capacity(), capacity);
        assert_eq!(array.as_ptr(), block);

        // The 3 surplus elements, plus the 2 overwritten ones replaced via clone_from.
        assert_eq!(drops.get(), 5);
    }

    #[test]
    fn assign_n_beyond_capacity_is_exact() {
        let mut array = GrowableArray::from([1, 2]);

        array.assign_n(7, &3).unwrap();

        assert_eq!(array, [3; 7]);
        assert_eq!(array.capacity(), 7);
    }

    #[test]
    fn assign_n_within_capacity_extends() {
        let mut array = GrowableArray::builder().capacity(10).build().unwrap();
        array.extend_from_slice(&[1, 2]).unwrap();

        array.assign_n(6, &9).unwrap();

        assert_eq!(array, [9; 6]);
        assert_eq!(array.capacity(), 10);
    }

    #[test]
    fn assign_n_excess_is_error_and_unchanged() {
        let mut array = GrowableArray::from([1_u64, 2]);

        let result = array.assign_n(usize::MAX, &0);

        assert!(matches!(result, Err(Error::LengthExceeded { .. })));
        assert_eq!(array, [1, 2]);
    }

    #[test]
    fn assign_slice_shorter_longer_and_larger() {
        let mut array = GrowableArray::builder().capacity(4).build().unwrap();
        array
            .extend_from_slice(&[String::from("a"), String::from("b"), String::from("c")])
            .unwrap();

        array.assign_slice(&[String::from("x")]).unwrap();
        assert_eq!(array, ["x"]);
        assert_eq!(array.capacity(), 4);

        array
            .assign_slice(&[String::from("p"), String::from("q"), String::from("r")])
            .unwrap();
        assert_eq!(array, ["p", "q", "r"]);
        assert_eq!(array.capacity(), 4);

        let many: Vec<String> = (0..9).map(|index| index.to_string()).collect();
        array.assign_slice(&many).unwrap();
        assert_eq!(array.as_slice(), many.as_slice());
        assert_eq!(array.capacity(), 9);
    }

    #[test]
    fn assign_slice_keeps_drop_policy() {
        let mut array = GrowableArray::builder()
            .drop_policy(DropPolicy::MustNotDropItems)
            .build()
            .unwrap();

        array.push_back(1).unwrap();

        // Replacing the block must not trip the drop policy.
        array.assign_slice(&[1, 2, 3, 4]).unwrap();

        assert_eq!(array.drop_policy(), DropPolicy::MustNotDropItems);
        array.clear();
    }

    #[test]
    fn assign_iter_single_pass_shorter() {
        let mut array = GrowableArray::from([1, 2, 3, 4, 5]);

        array.assign_iter((10..20).filter(|value| value % 5 == 0)).unwrap();

        assert_eq!(array, [10, 15]);
        assert_eq!(array.capacity(), 5);
    }

    #[test]
    fn assign_iter_single_pass_longer() {
        let mut array = GrowableArray::from([1, 2]);

        array.assign_iter((0..10).filter(|value| value % 2 == 1)).unwrap();

        assert_eq!(array, [1, 3, 5, 7, 9]);
    }

    #[test]
    fn assign_iter_exact_beyond_capacity_is_exact() {
        let mut array = GrowableArray::from([1, 2]);

        array.assign_iter(0..6).unwrap();

        assert_eq!(array, [0, 1, 2, 3, 4, 5]);
        assert_eq!(array.capacity(), 6);
    }

    #[test]
    fn assign_iter_exact_within_capacity_reuses_block() {
        let mut array = GrowableArray::builder().capacity(8).build().unwrap();
        array.extend_from_slice(&[9, 9, 9]).unwrap();
        let block = array.as_ptr();

        array.assign_iter(0..5).unwrap();

        assert_eq!(array, [0, 1, 2, 3, 4]);
        assert_eq!(array.as_ptr(), block);
    }

    #[test]
    fn assign_iter_empty_clears() {
        let mut array = GrowableArray::from([1, 2, 3]);

        array.assign_iter(std::iter::empty()).unwrap();

        assert!(array.is_empty());
        assert_eq!(array.capacity(), 3);
    }
}
