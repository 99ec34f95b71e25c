use std::alloc::{Layout, alloc, dealloc, realloc};
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;

use crate::{Error, Result, lifecycle};

/// Acquires and releases untyped memory blocks sized for a number of `T` elements.
///
/// The allocator is a zero-sized handle over the global allocator. It never constructs or drops
/// elements on its own; the [`construct()`][Self::construct] and [`destroy()`][Self::destroy]
/// family of methods merely delegate to the free functions of the same name so that a container
/// can depend on a single unit for all of its raw storage needs.
///
/// Blocks for zero elements, and all blocks for zero-sized types, are represented by a dangling
/// (well-aligned, non-null) pointer that owns no memory.
///
/// # Examples
///
/// ```
/// use growable_array::RawAllocator;
///
/// let allocator = RawAllocator::<u32>::new();
///
/// let block = allocator.allocate(4).unwrap();
///
/// // SAFETY: The block was just allocated with room for 4 elements.
/// unsafe {
///     allocator.construct(block, 42);
///     assert_eq!(block.read(), 42);
///     allocator.deallocate(block, 4);
/// }
/// ```
pub struct RawAllocator<T> {
    _element: PhantomData<fn() -> T>,
}

impl<T> RawAllocator<T> {
    /// Creates a new allocator handle.
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self {
            _element: PhantomData,
        }
    }

    /// The largest element count for which a block can be described.
    ///
    /// This is the largest `n` such that `n * size_of::<T>()` does not exceed `isize::MAX`,
    /// which is the limit that Rust places on the size of any single allocation. For
    /// zero-sized types, this is `usize::MAX`.
    #[must_use]
    #[inline]
    pub const fn max_size() -> usize {
        let element_size = mem::size_of::<T>();

        if element_size == 0 {
            usize::MAX
        } else {
            // Cannot divide by zero because we checked above.
            #[allow(
                clippy::integer_division,
                reason = "we want the floor, any remainder does not fit a whole element"
            )]
            let max = isize::MAX.unsigned_abs() / element_size;
            max
        }
    }

    /// Allocates an uninitialized block with room for `n` elements.
    ///
    /// Returns a dangling pointer without allocating if `n` is zero or `T` is zero-sized.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthExceeded`] if `n` is greater than [`max_size()`][Self::max_size]
    /// and [`Error::AllocationFailed`] if the global allocator cannot satisfy the request.
    pub fn allocate(&self, n: usize) -> Result<NonNull<T>> {
        if n == 0 || mem::size_of::<T>() == 0 {
            return Ok(NonNull::dangling());
        }

        let layout = Self::layout_for(n)?;

        // SAFETY: The layout has a non-zero size because both n and the element size are
        // non-zero, which is the only requirement of alloc().
        let ptr = unsafe { alloc(layout) };

        let Some(ptr) = NonNull::new(ptr) else {
            tracing::debug!(
                elements = n,
                bytes = layout.size(),
                "global allocator refused request"
            );

            return Err(Error::AllocationFailed { layout });
        };

        tracing::trace!(elements = n, bytes = layout.size(), "allocated block");

        Ok(ptr.cast())
    }

    /// Releases a block previously returned by [`allocate()`][Self::allocate] or
    /// [`shrink()`][Self::shrink].
    ///
    /// Does nothing if `n` is zero or `T` is zero-sized. Any elements still in the block are
    /// not dropped.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `ptr` was obtained from this allocator type for exactly `n`
    /// elements and has not yet been released.
    pub unsafe fn deallocate(&self, ptr: NonNull<T>, n: usize) {
        if n == 0 || mem::size_of::<T>() == 0 {
            return;
        }

        // The layout was valid when the block was allocated, so it is still valid now.
        let Ok(layout) = Self::layout_for(n) else {
            unreachable!("block of {n} elements could not have been allocated");
        };

        // SAFETY: The caller guarantees the block was allocated with this same layout
        // and has not yet been released.
        unsafe {
            dealloc(ptr.as_ptr().cast(), layout);
        }

        tracing::trace!(elements = n, bytes = layout.size(), "released block");
    }

    /// Releases the tail of a block, keeping only room for the first `new_n` elements.
    ///
    /// The initialized contents of the retained part of the block are preserved, though the
    /// block may move to a new address. If `new_n` is zero, the whole block is released and a
    /// dangling pointer is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailed`] if the global allocator refuses to resize the block.
    /// In this case, the original block remains valid and unchanged.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `ptr` was obtained from this allocator type for exactly
    /// `old_n` elements, has not yet been released, and that `new_n <= old_n`. If the call
    /// succeeds, `ptr` must no longer be used; the returned pointer owns the block instead.
    pub unsafe fn shrink(&self, ptr: NonNull<T>, old_n: usize, new_n: usize) -> Result<NonNull<T>> {
        debug_assert!(new_n <= old_n, "shrink({old_n} -> {new_n}) would grow the block");

        if new_n == old_n {
            return Ok(ptr);
        }

        if new_n == 0 || mem::size_of::<T>() == 0 {
            // SAFETY: Forwarding safety requirements to the caller.
            unsafe {
                self.deallocate(ptr, old_n);
            }

            return Ok(NonNull::dangling());
        }

        let Ok(old_layout) = Self::layout_for(old_n) else {
            unreachable!("block of {old_n} elements could not have been allocated");
        };

        // Cannot overflow because the new size is smaller than an existing valid layout.
        let new_size = new_n.wrapping_mul(mem::size_of::<T>());

        // SAFETY: The caller guarantees the block was allocated with old_layout. The new size is
        // non-zero and smaller than the old size, so it cannot overflow isize when rounded up.
        let new_ptr = unsafe { realloc(ptr.as_ptr().cast(), old_layout, new_size) };

        let Some(new_ptr) = NonNull::new(new_ptr) else {
            return Err(Error::AllocationFailed {
                layout: Layout::from_size_align(new_size, old_layout.align())
                    .unwrap_or(old_layout),
            });
        };

        tracing::trace!(
            old_elements = old_n,
            new_elements = new_n,
            "shrunk block"
        );

        Ok(new_ptr.cast())
    }

    /// Writes `value` into the uninitialized slot at `slot`.
    ///
    /// # Safety
    ///
    /// See [`construct()`][crate::construct].
    #[inline]
    pub unsafe fn construct(&self, slot: NonNull<T>, value: T) {
        // SAFETY: Forwarding safety requirements to the caller.
        unsafe {
            lifecycle::construct(slot, value);
        }
    }

    /// Constructs an object in the uninitialized slot at `slot` from the result of `f`.
    ///
    /// # Safety
    ///
    /// See [`construct_with()`][crate::construct_with].
    #[inline]
    pub unsafe fn construct_with(&self, slot: NonNull<T>, f: impl FnOnce() -> T) {
        // SAFETY: Forwarding safety requirements to the caller.
        unsafe {
            lifecycle::construct_with(slot, f);
        }
    }

    /// Drops the object at `slot` in place.
    ///
    /// # Safety
    ///
    /// See [`destroy()`][crate::destroy].
    #[inline]
    pub unsafe fn destroy(&self, slot: NonNull<T>) {
        // SAFETY: Forwarding safety requirements to the caller.
        unsafe {
            lifecycle::destroy(slot);
        }
    }

    /// Drops `count` consecutive objects starting at `first`.
    ///
    /// # Safety
    ///
    /// See [`destroy_range()`][crate::destroy_range].
    #[inline]
    pub unsafe fn destroy_range(&self, first: NonNull<T>, count: usize) {
        // SAFETY: Forwarding safety requirements to the caller.
        unsafe {
            lifecycle::destroy_range(first, count);
        }
    }

    fn layout_for(n: usize) -> Result<Layout> {
        Layout::array::<T>(n).map_err(|_layout_error| Error::LengthExceeded {
            requested: n,
            max: Self::max_size(),
        })
    }
}

impl<T> Clone for RawAllocator<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RawAllocator<T> {}

impl<T> Default for RawAllocator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for RawAllocator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawAllocator")
            .field("element", &std::any::type_name::<T>())
            .finish()
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
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(RawAllocator<String>: Send, Sync, Copy);
    assert_impl_all!(RawAllocator<std::rc::Rc<u8>>: Send, Sync);

    #[test]
    fn max_size_divides_isize_range() {
        assert_eq!(RawAllocator::<u8>::max_size(), isize::MAX as usize);
        assert_eq!(RawAllocator::<u64>::max_size(), isize::MAX as usize / 8);
        assert_eq!(RawAllocator::<[u8; 3]>::max_size(), isize::MAX as usize / 3);
    }

    #[test]
    fn max_size_of_zst_is_unbounded() {
        assert_eq!(RawAllocator::<()>::max_size(), usize::MAX);
    }

    #[test]
    fn zero_elements_is_dangling() {
        let allocator = RawAllocator::<u64>::new();

        let block = allocator.allocate(0).unwrap();
        assert_eq!(block, NonNull::dangling());

        // No-op, must not attempt to free the dangling pointer.
        unsafe {
            allocator.deallocate(block, 0);
        }
    }

    #[test]
    fn zst_never_allocates() {
        let allocator = RawAllocator::<()>::new();

        let block = allocator.allocate(1000).unwrap();
        assert_eq!(block, NonNull::dangling());

        unsafe {
            allocator.deallocate(block, 1000);
        }
    }

    #[test]
    fn too_many_elements_is_length_exceeded() {
        let allocator = RawAllocator::<u64>::new();
        let max = RawAllocator::<u64>::max_size();

        let result = allocator.allocate(max + 1);

        assert_eq!(
            result,
            Err(Error::LengthExceeded {
                requested: max + 1,
                max
            })
        );
    }

    #[test]
    fn allocate_construct_destroy_deallocate() {
        let allocator = RawAllocator::<String>::new();

        let block = allocator.allocate(3).unwrap();

        unsafe {
            for index in 0..3 {
                allocator.construct_with(block.add(index), || format!("item {index}"));
            }

            assert_eq!(block.add(2).as_ref(), "item 2");

            allocator.destroy(block);
            allocator.destroy_range(block.add(1), 2);
            allocator.deallocate(block, 3);
        }
    }

    #[test]
    fn shrink_preserves_prefix() {
        let allocator = RawAllocator::<u32>::new();

        let block = allocator.allocate(8).unwrap();

        unsafe {
            for index in 0..3 {
                allocator.construct(block.add(index), u32::try_from(index).unwrap() * 10);
            }

            let block = allocator.shrink(block, 8, 3).unwrap();

            assert_eq!(block.read(), 0);
            assert_eq!(block.add(1).read(), 10);
            assert_eq!(block.add(2).read(), 20);

            allocator.deallocate(block, 3);
        }
    }

    #[test]
    fn shrink_to_zero_releases_block() {
        let allocator = RawAllocator::<u32>::new();

        let block = allocator.allocate(8).unwrap();

        let block = unsafe { allocator.shrink(block, 8, 0) }.unwrap();

        assert_eq!(block, NonNull::dangling());
    }

    #[test]
    fn shrink_to_same_size_is_noop() {
        let allocator = RawAllocator::<u32>::new();

        let block = allocator.allocate(4).unwrap();
        let shrunk = unsafe { allocator.shrink(block, 4, 4) }.unwrap();

        assert_eq!(block, shrunk);

        unsafe {
            allocator.deallocate(shrunk, 4);
        }
    }
}
