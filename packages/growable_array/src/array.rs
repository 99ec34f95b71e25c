use std::marker::PhantomData;
use std::mem::{self, ManuallyDrop};
use std::ptr::{self, NonNull};
use std::{slice, thread};

use crate::{ConstructionGuard, DropPolicy, Error, GrowableArrayBuilder, RawAllocator, Result};

/// A contiguous, growable array of `T` with amortized O(1) append.
///
/// The array owns a single block of memory obtained from a [`RawAllocator`]. The first
/// [`len()`][Self::len] slots of the block hold live elements; the remaining slots up to
/// [`capacity()`][Self::capacity] are allocated but uninitialized.
///
/// # Growth
///
/// Whenever an operation needs more room than the current block provides, the new capacity is
/// calculated by [`grown_capacity()`][Self::grown_capacity]: the array at least doubles in size,
/// and grows by at least as much as the operation requires. Every growing operation uses this
/// same calculation, which is what makes repeated appends amortized O(1).
///
/// # Failure behavior
///
/// Operations that can grow the array return a [`Result`]. [`Error::LengthExceeded`] is
/// detected before anything is allocated or modified, and [`Error::AllocationFailed`] leaves
/// the existing block and its elements intact.
///
/// If an element constructor (a closure, [`Clone::clone()`] or [`Default::default()`]) panics
/// during an operation that reallocates or inserts, the array is left exactly as it was before
/// the call. The new block is fully prepared before the old one is touched, and relocating
/// existing elements is a bitwise move that cannot fail. Operations that overwrite existing
/// elements in place (the `assign` family and [`Clone::clone_from()`]) only guarantee that
/// nothing is leaked or dropped twice if a constructor panics midway.
///
/// # Positions
///
/// Positions are element indices. Any operation that reallocates moves every element to a new
/// address; insertions and removals shift the elements after the affected position.
///
/// # Examples
///
/// ```
/// use growable_array::GrowableArray;
///
/// let mut array = GrowableArray::new();
///
/// array.push_back(1).unwrap();
/// array.push_back(2).unwrap();
/// array.push_back(3).unwrap();
///
/// array.insert(1, 9).unwrap();
/// assert_eq!(array, [1, 9, 2, 3]);
///
/// array.erase(0).unwrap();
/// assert_eq!(array, [9, 2, 3]);
/// assert!(array.capacity() >= 4);
/// ```
///
/// # Thread safety
///
/// The array has no internal synchronization. It is [`Send`] and [`Sync`] if `T` is, just like
/// any other owned container, and follows the usual Rust borrowing rules for concurrent access.
pub struct GrowableArray<T> {
    /// Start of the block. Dangling if no block is allocated or if `T` is zero-sized.
    ptr: NonNull<T>,

    /// Number of live elements at the start of the block.
    len: usize,

    /// Number of elements the block has room for. Always zero for zero-sized `T`, which never
    /// needs a block (the public capacity is unbounded for those).
    block_capacity: usize,

    /// Determines whether the array may be dropped while it still holds elements.
    drop_policy: DropPolicy,

    _owns: PhantomData<T>,
}

impl<T> GrowableArray<T> {
    /// Creates a new, empty array without allocating any memory.
    ///
    /// # Examples
    ///
    /// ```
    /// use growable_array::GrowableArray;
    ///
    /// let array = GrowableArray::<String>::new();
    ///
    /// assert!(array.is_empty());
    /// assert_eq!(array.capacity(), 0);
    /// ```
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self::new_inner(DropPolicy::MayDropItems)
    }

    /// Creates a builder for configuring and constructing a [`GrowableArray`].
    #[inline]
    pub fn builder() -> GrowableArrayBuilder<T> {
        GrowableArrayBuilder::new()
    }

    #[must_use]
    pub(crate) const fn new_inner(drop_policy: DropPolicy) -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            block_capacity: 0,
            drop_policy,
            _owns: PhantomData,
        }
    }

    /// Creates an array of `len` default-constructed elements, allocated to exactly that size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthExceeded`] if `len` is greater than [`max_size()`][Self::max_size]
    /// and [`Error::AllocationFailed`] if the memory cannot be obtained.
    pub fn with_len(len: usize) -> Result<Self>
    where
        T: Default,
    {
        let mut array = Self::new();
        array.reserve(len)?;
        array.resize_with(len, T::default)?;
        Ok(array)
    }

    /// Creates an array of `len` clones of `value`, allocated to exactly that size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthExceeded`] if `len` is greater than [`max_size()`][Self::max_size]
    /// and [`Error::AllocationFailed`] if the memory cannot be obtained.
    ///
    /// # Examples
    ///
    /// ```
    /// use growable_array::GrowableArray;
    ///
    /// let array = GrowableArray::from_elem(3, &"x").unwrap();
    ///
    /// assert_eq!(array, ["x", "x", "x"]);
    /// assert_eq!(array.capacity(), 3);
    /// ```
    pub fn from_elem(len: usize, value: &T) -> Result<Self>
    where
        T: Clone,
    {
        let mut array = Self::new();
        array.reserve(len)?;
        array.resize_value(len, value)?;
        Ok(array)
    }

    /// The number of live elements in the array.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the array contains no elements.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The number of elements the array can hold without reallocating.
    ///
    /// For zero-sized types, this is always `usize::MAX`.
    #[must_use]
    #[inline]
    pub fn capacity(&self) -> usize {
        if mem::size_of::<T>() == 0 {
            usize::MAX
        } else {
            self.block_capacity
        }
    }

    /// The largest number of elements any array of `T` can hold.
    #[must_use]
    #[inline]
    pub const fn max_size() -> usize {
        RawAllocator::<T>::max_size()
    }

    /// The drop policy that the array was created with.
    #[must_use]
    #[inline]
    pub fn drop_policy(&self) -> DropPolicy {
        self.drop_policy
    }

    /// Number of uninitialized slots after the live elements.
    #[inline]
    pub(crate) fn spare_capacity(&self) -> usize {
        // Cannot underflow because len never exceeds capacity.
        self.capacity().wrapping_sub(self.len)
    }

    /// Calculates the capacity to grow to when `extra` more elements are needed than there is
    /// room for.
    ///
    /// The result is `len + max(extra, len)`, clamped to [`max_size()`][Self::max_size]. In
    /// other words, the array at least doubles in size and grows by at least `extra`. Every
    /// operation that grows the array uses this calculation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthExceeded`] if even `len + extra` exceeds
    /// [`max_size()`][Self::max_size].
    ///
    /// # Examples
    ///
    /// ```
    /// use growable_array::GrowableArray;
    ///
    /// let array = GrowableArray::from([1, 2, 3]);
    ///
    /// assert_eq!(array.grown_capacity(1), Ok(6));
    /// assert_eq!(array.grown_capacity(10), Ok(13));
    /// ```
    pub fn grown_capacity(&self, extra: usize) -> Result<usize> {
        let max = Self::max_size();

        let required = self.len.checked_add(extra).filter(|required| *required <= max);

        if required.is_none() {
            return Err(Error::LengthExceeded {
                requested: self.len.saturating_add(extra),
                max,
            });
        }

        Ok(self.len.saturating_add(extra.max(self.len)).min(max))
    }

    /// Ensures the array can hold at least `capacity` elements in total without reallocating.
    ///
    /// If `capacity` is greater than the current capacity, the array is moved into a new block
    /// of exactly `capacity` elements. Otherwise, nothing happens. Never shrinks the array.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthExceeded`] if `capacity` is greater than
    /// [`max_size()`][Self::max_size] and [`Error::AllocationFailed`] if the memory cannot be
    /// obtained. The array is unchanged in both cases.
    ///
    /// # Examples
    ///
    /// ```
    /// use growable_array::GrowableArray;
    ///
    /// let mut array = GrowableArray::new();
    /// array.reserve(10).unwrap();
    ///
    /// for value in 0..10 {
    ///     array.push_back(value).unwrap();
    /// }
    ///
    /// assert_eq!(array.capacity(), 10);
    /// ```
    pub fn reserve(&mut self, capacity: usize) -> Result<()> {
        let max = Self::max_size();

        if capacity > max {
            return Err(Error::LengthExceeded {
                requested: capacity,
                max,
            });
        }

        if capacity <= self.capacity() {
            return Ok(());
        }

        let position = self.len;
        self.relocate_with_gap(capacity, position, |_| {})?;

        Ok(())
    }

    /// Releases the unused capacity after the live elements, if the allocator allows it.
    ///
    /// This is a best-effort operation: if the allocator refuses, the array keeps its current
    /// block. The live elements keep their values and order but may be relocated to a
    /// different address.
    ///
    /// # Examples
    ///
    /// ```
    /// use growable_array::GrowableArray;
    ///
    /// let mut array = GrowableArray::from([1, 2, 3]);
    /// array.reserve(100).unwrap();
    ///
    /// array.shrink_to_fit();
    ///
    /// assert_eq!(array.capacity(), 3);
    /// assert_eq!(array, [1, 2, 3]);
    /// ```
    pub fn shrink_to_fit(&mut self) {
        if mem::size_of::<T>() == 0 || self.block_capacity == self.len {
            return;
        }

        // SAFETY: The block was allocated for block_capacity elements by the same allocator type
        // and only the uninitialized tail beyond len is released.
        let shrunk = unsafe {
            RawAllocator::<T>::new().shrink(self.ptr, self.block_capacity, self.len)
        };

        match shrunk {
            Ok(ptr) => {
                tracing::debug!(
                    old_capacity = self.block_capacity,
                    new_capacity = self.len,
                    "released unused capacity"
                );

                self.ptr = ptr;
                self.block_capacity = self.len;
            }
            Err(error) => {
                tracing::debug!(%error, "keeping unused capacity");
            }
        }
    }

    /// Appends `value` after the last element.
    ///
    /// If there is spare capacity, this is O(1) and does not reallocate. Otherwise, the array
    /// grows according to [`grown_capacity(1)`][Self::grown_capacity].
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthExceeded`] or [`Error::AllocationFailed`] if the array needs to
    /// grow and cannot. The array is unchanged in both cases and `value` is dropped.
    pub fn push_back(&mut self, value: T) -> Result<()> {
        self.emplace_back(|| value).map(|_| ())
    }

    /// Appends an element constructed in place by `f` and returns a reference to it.
    ///
    /// If growth is required, the element is constructed directly in its final slot in the new
    /// block, before the existing elements are moved over.
    ///
    /// # Errors
    ///
    /// Same as [`push_back()`][Self::push_back]. `f` is not called on error.
    ///
    /// # Examples
    ///
    /// ```
    /// use growable_array::GrowableArray;
    ///
    /// let mut array = GrowableArray::new();
    ///
    /// let item = array.emplace_back(|| String::from("hello")).unwrap();
    /// item.push_str(", world");
    ///
    /// assert_eq!(array[0], "hello, world");
    /// ```
    pub fn emplace_back(&mut self, f: impl FnOnce() -> T) -> Result<&mut T> {
        let position = self.len;

        if self.spare_capacity() == 0 {
            let new_capacity = self.grown_capacity(1)?;

            self.relocate_with_gap(new_capacity, position, |guard| {
                // SAFETY: The gap has room for exactly the one element we construct here.
                unsafe {
                    guard.push_with(f);
                }
            })?;
        } else {
            // SAFETY: There is spare capacity, so position < capacity.
            let slot = unsafe { self.slot(position) };

            // SAFETY: The slot is allocated and uninitialized because it is beyond len.
            unsafe {
                crate::construct_with(slot, f);
            }

            // Cannot overflow because there was spare capacity.
            self.len = self.len.wrapping_add(1);
        }

        // SAFETY: The element was just constructed, so position < len <= capacity.
        let mut slot = unsafe { self.slot(position) };

        // SAFETY: The slot holds a live element and we hold &mut self, so access is exclusive.
        Ok(unsafe { slot.as_mut() })
    }

    /// Removes the last element and returns it, or `None` if the array is empty.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }

        // Cannot underflow because we checked for emptiness above.
        self.len = self.len.wrapping_sub(1);

        // SAFETY: The new len is less than the old len, which is within capacity.
        let slot = unsafe { self.slot(self.len) };

        // SAFETY: The slot held the last live element, which is no longer counted as live,
        // so ownership is transferred out exactly once.
        Some(unsafe { slot.read() })
    }

    /// Destroys all elements. The capacity is unchanged.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Destroys the elements at positions `len..`, if any. The capacity is unchanged.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }

        // Cannot underflow because we checked above.
        let surplus = self.len.wrapping_sub(len);

        // Shorten first, so a panicking destructor cannot lead to a double drop.
        self.len = len;

        // SAFETY: len is less than the old len, which is within capacity.
        let first = unsafe { self.slot(len) };

        // SAFETY: The surplus slots held live elements that are no longer counted as live.
        unsafe {
            crate::destroy_range(first, surplus);
        }
    }

    /// Resizes the array to `len` elements, default-constructing any new elements.
    ///
    /// Shrinking destroys the trailing elements. Growing reallocates according to
    /// [`grown_capacity()`][Self::grown_capacity] if there is not enough spare capacity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthExceeded`] or [`Error::AllocationFailed`] if the array needs to
    /// grow and cannot. The array is unchanged in both cases.
    pub fn resize(&mut self, len: usize) -> Result<()>
    where
        T: Default,
    {
        self.resize_with(len, T::default)
    }

    /// Resizes the array to `len` elements, filling any new slots with clones of `value`.
    ///
    /// # Errors
    ///
    /// Same as [`resize()`][Self::resize].
    pub fn resize_value(&mut self, len: usize, value: &T) -> Result<()>
    where
        T: Clone,
    {
        self.resize_with(len, || value.clone())
    }

    /// Resizes the array to `len` elements, filling any new slots with the results of `f`.
    ///
    /// # Errors
    ///
    /// Same as [`resize()`][Self::resize].
    pub fn resize_with(&mut self, len: usize, mut f: impl FnMut() -> T) -> Result<()> {
        if len <= self.len {
            self.truncate(len);
            return Ok(());
        }

        // Cannot underflow because we checked above.
        let extra = len.wrapping_sub(self.len);

        self.append_counted(extra, |guard| {
            for _ in 0..extra {
                // SAFETY: The gap has room for exactly `extra` elements.
                unsafe {
                    guard.push_with(&mut f);
                }
            }
        })?;

        Ok(())
    }

    /// Exchanges the contents of two arrays without touching any elements.
    ///
    /// See [`DropPolicy`] for how the policies follow the contents.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Returns a reference to the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if `index` is not less than [`len()`][Self::len].
    ///
    /// # Examples
    ///
    /// ```
    /// use growable_array::{Error, GrowableArray};
    ///
    /// let array = GrowableArray::from([10, 20]);
    ///
    /// assert_eq!(array.at(1), Ok(&20));
    /// assert_eq!(array.at(2), Err(Error::OutOfRange { index: 2, len: 2 }));
    /// ```
    pub fn at(&self, index: usize) -> Result<&T> {
        let len = self.len;
        self.as_slice()
            .get(index)
            .ok_or(Error::OutOfRange { index, len })
    }

    /// Returns an exclusive reference to the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if `index` is not less than [`len()`][Self::len].
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T> {
        let len = self.len;
        self.as_mut_slice()
            .get_mut(index)
            .ok_or(Error::OutOfRange { index, len })
    }

    /// The first element, or `None` if the array is empty.
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.as_slice().first()
    }

    /// The first element, or `None` if the array is empty.
    #[must_use]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().first_mut()
    }

    /// The last element, or `None` if the array is empty.
    #[must_use]
    pub fn back(&self) -> Option<&T> {
        self.as_slice().last()
    }

    /// The last element, or `None` if the array is empty.
    #[must_use]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().last_mut()
    }

    /// A pointer to the start of the block.
    ///
    /// The pointer is dangling (but non-null and aligned) if nothing is allocated. It is
    /// invalidated by any operation that reallocates.
    #[must_use]
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// A mutable pointer to the start of the block.
    ///
    /// See [`as_ptr()`][Self::as_ptr].
    #[must_use]
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// The live elements as a slice.
    #[must_use]
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: The first len slots of the block are live elements, the pointer is aligned and
        // non-null even when dangling, and we hold &self so nobody can mutate them.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// The live elements as a mutable slice.
    #[must_use]
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: The first len slots of the block are live elements, the pointer is aligned and
        // non-null even when dangling, and we hold &mut self so the access is exclusive.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Pointer to the slot at `index`, which may be live or not.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `index <= capacity`.
    #[inline]
    pub(crate) unsafe fn slot(&self, index: usize) -> NonNull<T> {
        debug_assert!(
            mem::size_of::<T>() == 0 || index <= self.block_capacity,
            "slot {index} is beyond the block of capacity {}",
            self.block_capacity
        );

        // SAFETY: Forwarding the bounds requirement to the caller. One past the end of the
        // block is a valid offset, as is any offset for zero-sized types.
        unsafe { self.ptr.add(index) }
    }

    #[inline]
    pub(crate) fn set_len(&mut self, len: usize) {
        debug_assert!(len <= self.capacity());
        self.len = len;
    }

    /// Verifies that `position` is a valid insertion point.
    pub(crate) fn check_position(&self, position: usize) -> Result<()> {
        if position > self.len {
            return Err(Error::OutOfRange {
                index: position,
                len: self.len,
            });
        }

        Ok(())
    }

    /// Appends elements constructed by `fill`, growing per [`grown_capacity()`] if there is
    /// less spare capacity than `count`. Returns the number of elements that `fill` constructed,
    /// which must not exceed `count`.
    ///
    /// [`grown_capacity()`]: Self::grown_capacity
    pub(crate) fn append_counted(
        &mut self,
        count: usize,
        fill: impl FnOnce(&mut ConstructionGuard<T>),
    ) -> Result<usize> {
        if count == 0 {
            return Ok(0);
        }

        let position = self.len;

        if count > self.spare_capacity() {
            let new_capacity = self.grown_capacity(count)?;
            return self.relocate_with_gap(new_capacity, position, fill);
        }

        // SAFETY: There is spare capacity for count elements after len.
        let mut guard = ConstructionGuard::new(unsafe { self.slot(position) });
        fill(&mut guard);

        let constructed = guard.commit();
        debug_assert!(constructed <= count);

        // Cannot overflow because the new elements fit in the spare capacity.
        self.len = self.len.wrapping_add(constructed);

        Ok(constructed)
    }

    /// Moves the array into a new block of `new_capacity` elements, leaving a gap at `position`
    /// into which `fill` constructs new elements before the existing ones are moved.
    ///
    /// Returns the number of elements constructed by `fill`, which must fit in the new block
    /// alongside the existing elements.
    ///
    /// Nothing is changed if the allocation fails or if `fill` panics: the new elements are
    /// destroyed and the new block is released, leaving the old block untouched.
    pub(crate) fn relocate_with_gap(
        &mut self,
        new_capacity: usize,
        position: usize,
        fill: impl FnOnce(&mut ConstructionGuard<T>),
    ) -> Result<usize> {
        debug_assert!(position <= self.len);
        debug_assert!(new_capacity >= self.len);

        let allocator = RawAllocator::<T>::new();

        let new_ptr = allocator.allocate(new_capacity)?;

        // If anything below panics, the new block goes back to the allocator.
        let new_block = scopeguard::guard(new_ptr, |ptr| {
            // SAFETY: We allocated this block above for new_capacity elements and
            // nobody else has taken ownership of it.
            unsafe {
                allocator.deallocate(ptr, new_capacity);
            }
        });

        // SAFETY: The position is within the new block because the block can hold all the
        // existing elements and position <= len.
        let mut guard = ConstructionGuard::new(unsafe { new_block.add(position) });
        fill(&mut guard);
        let constructed = guard.commit();

        // Cannot underflow because position <= len.
        let after = self.len.wrapping_sub(position);

        // Cannot overflow because all elements fit in the new block.
        let new_len = self.len.wrapping_add(constructed);
        debug_assert!(new_len <= new_capacity || mem::size_of::<T>() == 0);

        // SAFETY: The old block holds len live elements and the new block has room for them
        // around the constructed ones. The blocks are distinct allocations so cannot overlap.
        // After this, the old slots are logically uninitialized (ownership moved bitwise).
        unsafe {
            ptr::copy_nonoverlapping(self.ptr.as_ptr(), new_block.as_ptr(), position);
        }

        // SAFETY: position <= len, which is within the old block.
        let old_suffix = unsafe { self.slot(position) };

        // SAFETY: position + constructed <= new_len, which is within the new block.
        let new_suffix = unsafe { new_block.add(position.wrapping_add(constructed)) };

        // SAFETY: See above. The elements after the position land after the constructed ones.
        unsafe {
            ptr::copy_nonoverlapping(old_suffix.as_ptr(), new_suffix.as_ptr(), after);
        }

        let new_ptr = scopeguard::ScopeGuard::into_inner(new_block);

        // SAFETY: The old block was allocated for block_capacity elements and its contents were
        // moved out above, so it only needs to be released.
        unsafe {
            allocator.deallocate(self.ptr, self.block_capacity);
        }

        tracing::debug!(
            old_capacity = self.block_capacity,
            new_capacity,
            len = new_len,
            "reallocated"
        );

        self.ptr = new_ptr;
        self.len = new_len;
        self.block_capacity = if mem::size_of::<T>() == 0 {
            0
        } else {
            new_capacity
        };

        Ok(constructed)
    }

    /// Replaces the storage of this array with that of `fresh`, destroying the current elements.
    ///
    /// The drop policy of `self` is kept.
    pub(crate) fn replace_storage(&mut self, mut fresh: Self) {
        fresh.drop_policy = self.drop_policy;

        let mut old = mem::replace(self, fresh);

        // Replacing the contents is an explicit request, not an accidental drop.
        old.drop_policy = DropPolicy::MayDropItems;
        drop(old);
    }

    /// Hands over ownership of the block and its elements, leaving nothing behind to drop.
    ///
    /// Returns the block pointer, the element count, the block capacity and the drop policy,
    /// which the new owner is expected to keep enforcing.
    pub(crate) fn into_raw_parts(self) -> (NonNull<T>, usize, usize, DropPolicy) {
        let this = ManuallyDrop::new(self);
        (this.ptr, this.len, this.block_capacity, this.drop_policy)
    }

    #[cfg_attr(test, mutants::skip)] // This is essentially test logic, mutation is meaningless.
    #[cfg(test)]
    pub(crate) fn integrity_check(&self) {
        assert!(
            self.len <= self.capacity(),
            "len {} exceeds capacity {}",
            self.len,
            self.capacity()
        );

        assert!(
            self.len <= Self::max_size(),
            "len {} exceeds max_size {}",
            self.len,
            Self::max_size()
        );

        if self.block_capacity == 0 {
            assert_eq!(
                self.ptr,
                NonNull::dangling(),
                "an array without a block must use the dangling pointer"
            );
        }
    }
}

impl<T> Drop for GrowableArray<T> {
    fn drop(&mut self) {
        let original_len = self.len;

        {
            let ptr = self.ptr;
            let block_capacity = self.block_capacity;

            // Release the block even if one of the element destructors panics.
            let _release = scopeguard::guard((), move |()| {
                // SAFETY: The block was allocated for block_capacity elements by the same
                // allocator type and is released exactly once, here.
                unsafe {
                    RawAllocator::<T>::new().deallocate(ptr, block_capacity);
                }
            });

            self.len = 0;

            // SAFETY: The first original_len slots held live elements, no longer counted as live.
            unsafe {
                crate::destroy_range(ptr, original_len);
            }
        }

        // We do this check at the end so we clean up the memory first. If we are already
        // panicking, we do not want to panic again because that will simply obscure whatever
        // the original panic was.
        if !thread::panicking() && matches!(self.drop_policy, DropPolicy::MustNotDropItems) {
            assert!(
                original_len == 0,
                "dropped a non-empty GrowableArray with {original_len} elements - this is forbidden by DropPolicy::MustNotDropItems"
            );
        }
    }
}

impl<T> Default for GrowableArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: The array exclusively owns its elements, so sending it sends the elements.
unsafe impl<T: Send> Send for GrowableArray<T> {}

// SAFETY: Shared access to the array only grants shared access to the elements.
unsafe impl<T: Sync> Sync for GrowableArray<T> {}

/// Exchanges the contents of two arrays. Equivalent to [`GrowableArray::swap()`].
#[inline]
pub fn swap<T>(a: &mut GrowableArray<T>, b: &mut GrowableArray<T>) {
    a.swap(b);
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

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(GrowableArray<u32>: Send, Sync);
    assert_impl_all!(GrowableArray<Cell<u32>>: Send);
    assert_not_impl_any!(GrowableArray<Cell<u32>>: Sync);
    assert_not_impl_any!(GrowableArray<Rc<u32>>: Send, Sync);

    /// Test helper that counts how many times instances have been dropped.
    #[derive(Debug)]
    struct Tracked {
        value: u32,
        drops: Rc<Cell<usize>>,
    }

    impl Tracked {
        fn new(value: u32, drops: &Rc<Cell<usize>>) -> Self {
            Self {
                value,
                drops: Rc::clone(drops),
            }
        }
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    #[test]
    fn new_is_unallocated() {
        let array = GrowableArray::<u64>::new();

        assert_eq!(array.len(), 0);
        assert_eq!(array.capacity(), 0);
        assert!(array.is_empty());
        assert_eq!(array.as_ptr(), NonNull::<u64>::dangling().as_ptr());
        array.integrity_check();
    }

    #[test]
    fn push_back_preserves_order() {
        let mut array = GrowableArray::new();

        for value in 0..100_u32 {
            array.push_back(value).unwrap();
            assert_eq!(array.len(), value as usize + 1);
            assert!(array.capacity() >= array.len());
        }

        for (index, value) in array.iter().enumerate() {
            assert_eq!(*value as usize, index);
        }

        array.integrity_check();
    }

    #[test]
    fn growth_doubles_capacity() {
        let mut array = GrowableArray::new();

        array.push_back(1_u8).unwrap();
        assert_eq!(array.capacity(), 1);

        array.push_back(2).unwrap();
        assert_eq!(array.capacity(), 2);

        array.push_back(3).unwrap();
        assert_eq!(array.capacity(), 4);

        array.push_back(4).unwrap();
        assert_eq!(array.capacity(), 4);

        array.push_back(5).unwrap();
        assert_eq!(array.capacity(), 8);
    }

    #[test]
    fn grown_capacity_is_at_least_double() {
        let array = GrowableArray::from([1_u16; 5]);

        assert_eq!(array.grown_capacity(0), Ok(5));
        assert_eq!(array.grown_capacity(1), Ok(10));
        assert_eq!(array.grown_capacity(5), Ok(10));
        assert_eq!(array.grown_capacity(6), Ok(11));
    }

    #[test]
    fn grown_capacity_of_empty_is_exact() {
        let array = GrowableArray::<u16>::new();

        assert_eq!(array.grown_capacity(0), Ok(0));
        assert_eq!(array.grown_capacity(7), Ok(7));
    }

    #[test]
    fn grown_capacity_clamps_to_max_size() {
        let max = GrowableArray::<()>::max_size();

        let mut array = GrowableArray::<()>::new();

        // Zero-sized elements need no construction, so we can jump straight to a huge length.
        array.set_len(max / 2 + 10);

        // Doubling would overflow, but the required growth fits.
        assert_eq!(array.grown_capacity(1), Ok(max));
    }

    #[test]
    fn grown_capacity_rejects_excess() {
        let max = GrowableArray::<u64>::max_size();
        let array = GrowableArray::from([1_u64, 2]);

        assert_eq!(
            array.grown_capacity(max),
            Err(Error::LengthExceeded {
                requested: max + 2,
                max
            })
        );

        assert_eq!(
            array.grown_capacity(usize::MAX),
            Err(Error::LengthExceeded {
                requested: usize::MAX,
                max
            })
        );
    }

    #[test]
    fn reserve_then_push_does_not_reallocate() {
        let mut array = GrowableArray::new();
        array.reserve(50).unwrap();

        let block = array.as_ptr();

        for value in 0..50_u32 {
            array.push_back(value).unwrap();
            assert_eq!(array.capacity(), 50);
            assert_eq!(array.as_ptr(), block);
        }
    }

    #[test]
    fn reserve_zero_on_empty_is_noop() {
        let mut array = GrowableArray::<String>::new();

        array.reserve(0).unwrap();

        assert_eq!(array.capacity(), 0);
        assert_eq!(array.as_ptr(), NonNull::<String>::dangling().as_ptr());
    }

    #[test]
    fn reserve_never_shrinks() {
        let mut array = GrowableArray::<u8>::new();
        array.reserve(20).unwrap();
        array.reserve(5).unwrap();

        assert_eq!(array.capacity(), 20);
    }

    #[test]
    fn reserve_excess_is_error_and_unchanged() {
        let mut array = GrowableArray::from([1_u32, 2, 3]);
        let capacity = array.capacity();

        let result = array.reserve(GrowableArray::<u32>::max_size() + 1);

        assert!(matches!(result, Err(Error::LengthExceeded { .. })));
        assert_eq!(array, [1, 2, 3]);
        assert_eq!(array.capacity(), capacity);
    }

    #[test]
    fn reserve_moves_elements() {
        let mut array = GrowableArray::from([String::from("a"), String::from("b")]);

        array.reserve(10).unwrap();

        assert_eq!(array.capacity(), 10);
        assert_eq!(array, ["a", "b"]);
    }

    #[test]
    fn shrink_to_fit_releases_tail() {
        let mut array = GrowableArray::new();
        array.reserve(16).unwrap();
        array.push_back(String::from("x")).unwrap();
        array.push_back(String::from("y")).unwrap();

        array.shrink_to_fit();

        assert_eq!(array.capacity(), 2);
        assert_eq!(array, ["x", "y"]);
        array.integrity_check();
    }

    #[test]
    fn shrink_to_fit_of_empty_releases_block() {
        let mut array = GrowableArray::<u32>::new();
        array.reserve(16).unwrap();

        array.shrink_to_fit();

        assert_eq!(array.capacity(), 0);
        array.integrity_check();

        // The array remains usable.
        array.push_back(5).unwrap();
        assert_eq!(array, [5]);
    }

    #[test]
    fn emplace_back_returns_new_element() {
        let mut array = GrowableArray::new();

        *array.emplace_back(|| 5_u32).unwrap() += 1;
        *array.emplace_back(|| 7_u32).unwrap() += 1;

        assert_eq!(array, [6, 8]);
    }

    #[test]
    fn emplace_back_panic_during_growth_leaves_array_unchanged() {
        let drops = Rc::new(Cell::new(0));
        let mut array = GrowableArray::new();
        array.push_back(Tracked::new(1, &drops)).unwrap();

        let block = array.as_ptr();

        let result = catch_unwind(AssertUnwindSafe(|| {
            _ = array.emplace_back(|| panic!("constructor failure"));
        }));

        assert!(result.is_err());
        assert_eq!(array.len(), 1);
        assert_eq!(array.capacity(), 1);
        assert_eq!(array.as_ptr(), block);
        assert_eq!(array[0].value, 1);
        assert_eq!(drops.get(), 0);
    }

    #[test]
    fn pop_back_returns_last() {
        let mut array = GrowableArray::from([1, 2]);

        assert_eq!(array.pop_back(), Some(2));
        assert_eq!(array.pop_back(), Some(1));
        assert_eq!(array.pop_back(), None);
        assert_eq!(array.capacity(), 2);
    }

    #[test]
    fn clear_destroys_everything_keeps_capacity() {
        let drops = Rc::new(Cell::new(0));
        let mut array = GrowableArray::new();

        for value in 0..5 {
            array.push_back(Tracked::new(value, &drops)).unwrap();
        }

        let capacity = array.capacity();
        array.clear();

        assert_eq!(drops.get(), 5);
        assert!(array.is_empty());
        assert_eq!(array.capacity(), capacity);
    }

    #[test]
    fn resize_shrinking_destroys_tail_exactly() {
        let drops = Rc::new(Cell::new(0));
        let mut array = GrowableArray::new();

        for value in 0..6 {
            array.push_back(Tracked::new(value, &drops)).unwrap();
        }

        array
            .resize_with(2, || unreachable!("shrinking never constructs"))
            .unwrap();

        assert_eq!(drops.get(), 4);
        assert_eq!(array.len(), 2);
        assert_eq!(array[1].value, 1);
    }

    #[test]
    fn resize_growing_appends_defaults() {
        let mut array = GrowableArray::from([7_u32]);

        array.resize(4).unwrap();

        assert_eq!(array, [7, 0, 0, 0]);
        assert_eq!(array.capacity(), 4);
    }

    #[test]
    fn resize_growing_uses_growth_policy() {
        let mut array = GrowableArray::from([1_u32, 2, 3, 4]);

        array.resize(5).unwrap();

        assert_eq!(array.capacity(), 8);
    }

    #[test]
    fn resize_value_clones() {
        let mut array = GrowableArray::<String>::new();

        array.resize_value(3, &String::from("z")).unwrap();

        assert_eq!(array, ["z", "z", "z"]);
    }

    #[test]
    fn resize_in_place_panic_leaves_array_unchanged() {
        let drops = Rc::new(Cell::new(0));
        let mut array = GrowableArray::new();
        array.reserve(10).unwrap();
        array.push_back(Tracked::new(0, &drops)).unwrap();

        let mut calls = 0;
        let result = catch_unwind(AssertUnwindSafe(|| {
            array.resize_with(5, || {
                calls += 1;
                assert!(calls < 3, "constructor failure");
                Tracked::new(calls, &drops)
            })
        }));

        assert!(result.is_err());
        assert_eq!(array.len(), 1);

        // The two successfully constructed elements were destroyed again.
        assert_eq!(drops.get(), 2);
    }

    #[test]
    fn at_checks_bounds() {
        let mut array = GrowableArray::from([1, 2, 3]);

        assert_eq!(array.at(0), Ok(&1));
        assert_eq!(array.at(3), Err(Error::OutOfRange { index: 3, len: 3 }));

        *array.at_mut(2).unwrap() = 30;
        assert_eq!(array.at_mut(5), Err(Error::OutOfRange { index: 5, len: 3 }));

        assert_eq!(array, [1, 2, 30]);
    }

    #[test]
    fn front_and_back() {
        let mut array = GrowableArray::from([1, 2, 3]);

        assert_eq!(array.front(), Some(&1));
        assert_eq!(array.back(), Some(&3));

        *array.front_mut().unwrap() = 10;
        *array.back_mut().unwrap() = 30;

        assert_eq!(array, [10, 2, 30]);

        let empty = GrowableArray::<u8>::new();
        assert_eq!(empty.front(), None);
        assert_eq!(empty.back(), None);
    }

    #[test]
    fn swap_exchanges_contents() {
        let mut a = GrowableArray::from([1, 2, 3]);
        let mut b = GrowableArray::builder()
            .capacity(10)
            .drop_policy(DropPolicy::MustNotDropItems)
            .build()
            .unwrap();

        let a_block = a.as_ptr();

        swap(&mut a, &mut b);

        assert!(a.is_empty());
        assert_eq!(a.capacity(), 10);
        assert_eq!(b, [1, 2, 3]);
        assert_eq!(b.as_ptr(), a_block);
        assert_eq!(a.drop_policy(), DropPolicy::MustNotDropItems);
    }

    #[test]
    fn move_out_leaves_empty_source() {
        let mut a = GrowableArray::from([1, 2, 3]);

        let b = mem::take(&mut a);

        assert_eq!(b, [1, 2, 3]);
        assert_eq!(a.len(), 0);
        assert_eq!(a.capacity(), 0);
        a.integrity_check();
    }

    #[test]
    fn take_moves_drop_policy_with_contents() {
        let mut source = GrowableArray::builder()
            .drop_policy(DropPolicy::MustNotDropItems)
            .build()
            .unwrap();
        source.push_back(1_u32).unwrap();

        let mut taken = mem::take(&mut source);

        assert_eq!(taken.drop_policy(), DropPolicy::MustNotDropItems);
        assert_eq!(source.drop_policy(), DropPolicy::MayDropItems);

        taken.clear();
    }

    #[test]
    fn move_assignment_releases_old_contents() {
        let drops = Rc::new(Cell::new(0));
        let mut target = GrowableArray::new();
        target.push_back(Tracked::new(1, &drops)).unwrap();

        let mut source = GrowableArray::new();
        source.push_back(Tracked::new(2, &drops)).unwrap();

        target = mem::take(&mut source);

        assert_eq!(drops.get(), 1);
        assert_eq!(target[0].value, 2);
        assert!(source.is_empty());
    }

    #[test]
    fn drop_destroys_all_elements() {
        let drops = Rc::new(Cell::new(0));

        {
            let mut array = GrowableArray::new();

            for value in 0..10 {
                array.push_back(Tracked::new(value, &drops)).unwrap();
            }
        }

        assert_eq!(drops.get(), 10);
    }

    #[test]
    #[should_panic]
    fn must_not_drop_items_panics_when_dropped_with_items() {
        let mut array = GrowableArray::builder()
            .drop_policy(DropPolicy::MustNotDropItems)
            .build()
            .unwrap();

        array.push_back(1_u32).unwrap();
    }

    #[test]
    fn must_not_drop_items_allows_empty_drop() {
        let mut array = GrowableArray::builder()
            .drop_policy(DropPolicy::MustNotDropItems)
            .build()
            .unwrap();

        array.push_back(1_u32).unwrap();
        array.clear();
    }

    #[test]
    fn zero_sized_elements_never_allocate() {
        let mut array = GrowableArray::new();

        for _ in 0..1000 {
            array.push_back(()).unwrap();
        }

        assert_eq!(array.len(), 1000);
        assert_eq!(array.capacity(), usize::MAX);
        assert_eq!(array.as_ptr(), NonNull::<()>::dangling().as_ptr());

        array.shrink_to_fit();
        array.truncate(10);
        assert_eq!(array.pop_back(), Some(()));
        assert_eq!(array.len(), 9);
        array.integrity_check();
    }
}
