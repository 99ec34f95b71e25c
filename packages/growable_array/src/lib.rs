//! A contiguous, growable array with an explicit storage engine.
//!
//! This crate provides [`GrowableArray`], a dynamically resizable sequence that keeps its
//! elements in a single block of memory, together with the two building blocks it is made of:
//!
//! - [`RawAllocator`] acquires and releases untyped memory blocks sized for a number of
//!   elements, and reports the largest element count it can describe.
//! - The lifecycle functions ([`construct()`], [`construct_with()`], [`construct_default()`],
//!   [`construct_clone()`], [`destroy()`] and [`destroy_range()`]) construct objects in place
//!   in raw storage and destroy them again, skipping destructor logic for types that have none.
//!
//! # Key Features
//!
//! - **Amortized O(1) append**: every growing operation follows one growth policy that at least
//!   doubles the capacity (see [`GrowableArray::grown_capacity()`])
//! - **Explicit failure**: operations that can grow or take a position return a [`Result`]
//!   instead of aborting or panicking
//! - **Panic safety**: if an element constructor panics while the array reallocates or inserts,
//!   the array is left exactly as it was before the call
//! - **In-place construction**: [`GrowableArray::emplace_back()`] and
//!   [`GrowableArray::emplace()`] construct elements directly in their final slot
//! - **Flexible drop policies**: configure behavior when the array is dropped with remaining
//!   elements
//!
//! # Examples
//!
//! ## Basic usage
//!
//! ```rust
//! use growable_array::GrowableArray;
//!
//! let mut array = GrowableArray::new();
//!
//! array.push_back(1).unwrap();
//! array.push_back(2).unwrap();
//! array.push_back(3).unwrap();
//!
//! array.insert(1, 9).unwrap();
//! assert_eq!(array, [1, 9, 2, 3]);
//!
//! array.erase(0).unwrap();
//! assert_eq!(array, [9, 2, 3]);
//!
//! // All slice methods are available through Deref.
//! assert_eq!(array.iter().sum::<i32>(), 14);
//! ```
//!
//! ## Reserving capacity up front
//!
//! ```rust
//! use growable_array::GrowableArray;
//!
//! let mut array = GrowableArray::<u64>::builder().capacity(100).build().unwrap();
//!
//! for value in 0..100 {
//!     array.push_back(value).unwrap();
//! }
//!
//! // No reallocation was needed.
//! assert_eq!(array.capacity(), 100);
//! ```
//!
//! ## Handling failure
//!
//! ```rust
//! use growable_array::{Error, GrowableArray};
//!
//! let mut array = growable_array::growable_array![1_u64, 2, 3];
//!
//! assert!(matches!(
//!     array.reserve(usize::MAX),
//!     Err(Error::LengthExceeded { .. })
//! ));
//!
//! assert_eq!(
//!     array.insert(10, 4),
//!     Err(Error::OutOfRange { index: 10, len: 3 })
//! );
//!
//! // Failed operations leave the array unchanged.
//! assert_eq!(array, [1, 2, 3]);
//! ```

mod allocator;
mod array;
mod assign;
mod builder;
mod drop_policy;
mod error;
mod insert;
mod into_iter;
mod lifecycle;
mod traits;

pub use allocator::RawAllocator;
pub use array::{GrowableArray, swap};
pub use builder::*;
pub use drop_policy::*;
pub use error::{Error, Result};
pub use into_iter::IntoIter;
pub(crate) use lifecycle::ConstructionGuard;
pub use lifecycle::{
    construct, construct_clone, construct_default, construct_with, destroy, destroy_range,
};

/// Creates a [`GrowableArray`] containing the arguments.
///
/// - `growable_array![a, b, c]` creates an array of the given elements, allocated to exactly
///   that many elements.
/// - `growable_array![value; n]` creates an array of `n` clones of `value`.
///
/// Panics if the array cannot be allocated, like the [`FromIterator`] implementation.
///
/// # Examples
///
/// ```
/// use growable_array::growable_array;
///
/// let letters = growable_array!['a', 'b', 'c'];
/// assert_eq!(letters, ['a', 'b', 'c']);
/// assert_eq!(letters.capacity(), 3);
///
/// let zeros = growable_array![0_u8; 4];
/// assert_eq!(zeros, [0, 0, 0, 0]);
///
/// let empty: growable_array::GrowableArray<String> = growable_array![];
/// assert!(empty.is_empty());
/// ```
#[macro_export]
macro_rules! growable_array {
    () => {
        $crate::GrowableArray::new()
    };
    ($value:expr; $count:expr) => {
        <$crate::GrowableArray<_> as ::core::iter::FromIterator<_>>::from_iter(
            ::core::iter::repeat_n($value, $count),
        )
    };
    ($($item:expr),+ $(,)?) => {
        $crate::GrowableArray::from([$($item),+])
    };
}
