//! Standard library trait implementations for [`GrowableArray`].
//!
//! Traits that cannot report failure (e.g. [`Clone`], [`Extend`], [`FromIterator`]) panic if the
//! array cannot grow, and route allocation failure through [`std::alloc::handle_alloc_error`].

use std::borrow::{Borrow, BorrowMut};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Deref, DerefMut};

use crate::{GrowableArray, IntoIter};

impl<T> Deref for GrowableArray<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for GrowableArray<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T> AsRef<[T]> for GrowableArray<T> {
    fn as_ref(&self) -> &[T] {
        self
    }
}

impl<T> AsMut<[T]> for GrowableArray<T> {
    fn as_mut(&mut self) -> &mut [T] {
        self
    }
}

impl<T> Borrow<[T]> for GrowableArray<T> {
    fn borrow(&self) -> &[T] {
        self
    }
}

impl<T> BorrowMut<[T]> for GrowableArray<T> {
    fn borrow_mut(&mut self) -> &mut [T] {
        self
    }
}

impl<T: Clone> Clone for GrowableArray<T> {
    /// Creates an independent copy with a block of exactly [`len()`][GrowableArray::len]
    /// elements and the same drop policy.
    fn clone(&self) -> Self {
        self.rebuilt(self.len(), |guard| {
            for item in self.iter() {
                // SAFETY: The fresh block has room for exactly len elements.
                unsafe {
                    guard.push_with(|| item.clone());
                }
            }
        })
        .unwrap_or_else(|error| error.raise())
    }

    /// Overwrites the contents with clones of `source`, reusing the existing block if it is
    /// large enough. The drop policy of `self` is kept.
    fn clone_from(&mut self, source: &Self) {
        self.assign_slice(source)
            .unwrap_or_else(|error| error.raise());
    }
}

impl<T: fmt::Debug> fmt::Debug for GrowableArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_slice(), f)
    }
}

impl<T, U> PartialEq<GrowableArray<U>> for GrowableArray<T>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &GrowableArray<U>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T, U> PartialEq<[U]> for GrowableArray<T>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U]) -> bool {
        self.as_slice() == other
    }
}

impl<T, U> PartialEq<&[U]> for GrowableArray<T>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &&[U]) -> bool {
        self.as_slice() == *other
    }
}

impl<T, U, const N: usize> PartialEq<[U; N]> for GrowableArray<T>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U; N]) -> bool {
        self.as_slice() == other
    }
}

impl<T: Eq> Eq for GrowableArray<T> {}

impl<T: PartialOrd> PartialOrd for GrowableArray<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.as_slice().partial_cmp(other.as_slice())
    }
}

impl<T: Ord> Ord for GrowableArray<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl<T: Hash> Hash for GrowableArray<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl<T> FromIterator<T> for GrowableArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut array = Self::new();
        array.extend(iter);
        array
    }
}

impl<T> Extend<T> for GrowableArray<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.append_iter(iter)
            .unwrap_or_else(|error| error.raise());
    }
}

impl<'a, T: Copy + 'a> Extend<&'a T> for GrowableArray<T> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.append_iter(iter.into_iter().copied())
            .unwrap_or_else(|error| error.raise());
    }
}

impl<T, const N: usize> From<[T; N]> for GrowableArray<T> {
    /// Creates an array with a block of exactly `N` elements.
    fn from(items: [T; N]) -> Self {
        items.into_iter().collect()
    }
}

impl<T: Clone> From<&[T]> for GrowableArray<T> {
    fn from(items: &[T]) -> Self {
        let mut array = Self::new();
        array
            .extend_from_slice(items)
            .unwrap_or_else(|error| error.raise());
        array
    }
}

impl<T> From<Vec<T>> for GrowableArray<T> {
    fn from(items: Vec<T>) -> Self {
        items.into_iter().collect()
    }
}

impl<T> IntoIterator for GrowableArray<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter::new(self)
    }
}

impl<'a, T> IntoIterator for &'a GrowableArray<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut GrowableArray<T> {
    type Item = &'a mut T;
    type IntoIter = std::slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(
    clippy::indexing_slicing,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]
mod tests {
    use std::collections::HashSet;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use crate::{DropPolicy, GrowableArray};

    #[test]
    fn clone_is_independent() {
        let original = GrowableArray::from([String::from("a"), String::from("b")]);
        let mut copy = original.clone();

        copy[0].push('!');
        copy.push_back(String::from("c")).unwrap();

        assert_eq!(original, ["a", "b"]);
        assert_eq!(copy, ["a!", "b", "c"]);
    }

    #[test]
    fn clone_is_exactly_sized() {
        let mut original = GrowableArray::from([1, 2, 3]);
        original.reserve(100).unwrap();

        let copy = original.clone();

        assert_eq!(copy.capacity(), 3);
        assert_eq!(copy, original);
    }

    #[test]
    fn clone_keeps_drop_policy() {
        let mut original = GrowableArray::builder()
            .drop_policy(DropPolicy::MustNotDropItems)
            .build()
            .unwrap();
        original.push_back(1).unwrap();

        let mut copy = original.clone();
        assert_eq!(copy.drop_policy(), DropPolicy::MustNotDropItems);

        copy.clear();
        original.clear();
    }

    #[test]
    fn clone_from_reuses_block() {
        let source = GrowableArray::from([7, 8]);
        let mut target = GrowableArray::from([1, 2, 3, 4]);
        let block = target.as_ptr();

        target.clone_from(&source);

        assert_eq!(target, [7, 8]);
        assert_eq!(target.as_ptr(), block);
        assert_eq!(target.capacity(), 4);
    }

    #[test]
    fn clone_from_grows_exactly() {
        let source = GrowableArray::from([1, 2, 3, 4, 5]);
        let mut target = GrowableArray::from([0]);

        target.clone_from(&source);

        assert_eq!(target, source);
        assert_eq!(target.capacity(), 5);
    }

    #[test]
    fn comparisons_are_lexicographic() {
        let a = GrowableArray::from([1, 2, 3]);
        let b = GrowableArray::from([1, 2, 4]);
        let c = GrowableArray::from([1, 2]);

        assert!(a < b);
        assert!(c < a);
        assert!(b > c);
        assert_eq!(a.cmp(&a.clone()), std::cmp::Ordering::Equal);
        assert_ne!(a, b);
        assert!(GrowableArray::<u8>::new() < GrowableArray::from([0]));
    }

    #[test]
    fn hash_matches_equality() {
        let mut set = HashSet::new();

        set.insert(GrowableArray::from([1, 2]));
        set.insert(GrowableArray::from([1, 2]));
        set.insert(GrowableArray::from([2, 1]));

        assert_eq!(set.len(), 2);
    }

    #[test]
    fn debug_formats_as_list() {
        let array = GrowableArray::from(["x", "y"]);

        assert_eq!(format!("{array:?}"), r#"["x", "y"]"#);
    }

    #[test]
    fn conversions() {
        let from_array = GrowableArray::from([1, 2, 3]);
        let from_slice = GrowableArray::from(&[1, 2, 3][..]);
        let from_vec = GrowableArray::from(vec![1, 2, 3]);

        assert_eq!(from_array, from_slice);
        assert_eq!(from_slice, from_vec);
        assert_eq!(from_array.capacity(), 3);
        assert_eq!(from_vec.capacity(), 3);
    }

    #[test]
    fn extend_by_value_and_reference() {
        let mut array = GrowableArray::from([1]);

        array.extend([2, 3]);
        array.extend(&[4, 5]);
        array.extend((6..10).filter(|value| value % 2 == 0));

        assert_eq!(array, [1, 2, 3, 4, 5, 6, 8]);
    }

    #[test]
    fn iteration_by_reference() {
        let mut array = GrowableArray::from([1, 2, 3]);

        for value in &mut array {
            *value *= 10;
        }

        let mut sum = 0;
        for value in &array {
            sum += value;
        }

        assert_eq!(sum, 60);
        assert_eq!(array.iter().rev().copied().collect::<Vec<_>>(), [30, 20, 10]);
    }

    #[test]
    fn slice_methods_through_deref() {
        let mut array = GrowableArray::from([3, 1, 2]);

        array.sort_unstable();

        assert_eq!(array.first(), Some(&1));
        assert!(array.contains(&3));
        assert_eq!(array[1], 2);
    }

    #[test]
    #[should_panic(expected = "exceeds the maximum")]
    fn extend_panics_on_length_exceeded() {
        let mut array = GrowableArray::<u64>::new();

        array.extend(std::iter::repeat_n(0_u64, usize::MAX));
    }

    #[test]
    fn panicking_clone_cleans_up() {
        #[derive(Debug)]
        struct Bomb(u32);

        impl Clone for Bomb {
            fn clone(&self) -> Self {
                assert!(self.0 != 2, "clone failure");
                Self(self.0)
            }
        }

        let array = GrowableArray::from([Bomb(1), Bomb(2), Bomb(3)]);

        let result = catch_unwind(AssertUnwindSafe(|| array.clone()));

        assert!(result.is_err());
        assert_eq!(array.len(), 3);
    }
}
