use std::fmt;
use std::marker::PhantomData;

use crate::{DropPolicy, GrowableArray, Result};

/// Builder for creating an instance of [`GrowableArray`].
///
/// All settings are optional. Without any settings, the builder produces the same empty,
/// unallocated array as [`GrowableArray::new()`].
///
/// # Examples
///
/// ```
/// use growable_array::{DropPolicy, GrowableArray};
///
/// let array = GrowableArray::<String>::builder()
///     .capacity(16)
///     .drop_policy(DropPolicy::MayDropItems)
///     .build()
///     .unwrap();
///
/// assert_eq!(array.capacity(), 16);
/// assert!(array.is_empty());
/// ```
#[must_use]
pub struct GrowableArrayBuilder<T> {
    capacity: usize,
    drop_policy: DropPolicy,

    _element: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for GrowableArrayBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrowableArrayBuilder")
            .field(
                "element_type",
                &format_args!("{}", std::any::type_name::<T>()),
            )
            .field("capacity", &self.capacity)
            .field("drop_policy", &self.drop_policy)
            .finish()
    }
}

impl<T> GrowableArrayBuilder<T> {
    #[inline]
    pub(crate) fn new() -> Self {
        Self {
            capacity: 0,
            drop_policy: DropPolicy::default(),
            _element: PhantomData,
        }
    }

    /// Sets the capacity that the array starts out with.
    ///
    /// The block is allocated when [`build()`][Self::build] is called. A capacity of zero
    /// (the default) means no memory is allocated until the first element is added.
    #[inline]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the [drop policy][DropPolicy] for the array. This governs how to treat remaining
    /// elements when the array is dropped.
    #[inline]
    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.drop_policy = policy;
        self
    }

    /// Builds the array with the specified configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthExceeded`][crate::Error::LengthExceeded] if the requested
    /// capacity is greater than [`GrowableArray::max_size()`] and
    /// [`Error::AllocationFailed`][crate::Error::AllocationFailed] if the memory for the
    /// requested capacity cannot be obtained.
    pub fn build(self) -> Result<GrowableArray<T>> {
        let mut array = GrowableArray::new_inner(self.drop_policy);
        array.reserve(self.capacity)?;
        Ok(array)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn default_builder_is_unallocated() {
        let array = GrowableArrayBuilder::<u64>::new().build().unwrap();

        assert_eq!(array.capacity(), 0);
        assert_eq!(array.len(), 0);
        assert_eq!(array.drop_policy(), DropPolicy::MayDropItems);
    }

    #[test]
    fn capacity_is_reserved() {
        let array = GrowableArrayBuilder::<u64>::new().capacity(10).build().unwrap();

        assert_eq!(array.capacity(), 10);
        assert!(array.is_empty());
    }

    #[test]
    fn drop_policy_is_applied() {
        let array = GrowableArrayBuilder::<u64>::new()
            .drop_policy(DropPolicy::MustNotDropItems)
            .build()
            .unwrap();

        assert_eq!(array.drop_policy(), DropPolicy::MustNotDropItems);
    }

    #[test]
    fn builder_chain_order_independence() {
        let first = GrowableArrayBuilder::<u32>::new()
            .capacity(5)
            .drop_policy(DropPolicy::MustNotDropItems)
            .build()
            .unwrap();

        let second = GrowableArrayBuilder::<u32>::new()
            .drop_policy(DropPolicy::MustNotDropItems)
            .capacity(5)
            .build()
            .unwrap();

        assert_eq!(first.capacity(), second.capacity());
        assert_eq!(first.drop_policy(), second.drop_policy());
    }

    #[test]
    fn excessive_capacity_is_error() {
        let result = GrowableArrayBuilder::<u64>::new()
            .capacity(usize::MAX)
            .build();

        assert!(matches!(result, Err(Error::LengthExceeded { .. })));
    }

    #[test]
    fn builder_send_trait() {
        fn assert_send<T: Send>() {}
        assert_send::<GrowableArrayBuilder<std::rc::Rc<u8>>>();

        // Verify builder can be moved between threads.
        let builder = GrowableArrayBuilder::<u64>::new().capacity(3);
        let handle = std::thread::spawn(move || builder.build().map(|array| array.capacity()));
        let capacity = handle.join().expect("thread completed successfully");

        assert_eq!(capacity, Ok(3));
    }
}
