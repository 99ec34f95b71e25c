use std::alloc::Layout;

use thiserror::Error;

/// Errors that can occur when operating on a [`GrowableArray`][crate::GrowableArray].
///
/// An operation that returns one of these errors leaves the array exactly as it was before the
/// call, with one exception: when [`insert_iter()`][crate::GrowableArray::insert_iter] or
/// [`assign_iter()`][crate::GrowableArray::assign_iter] consume an iterator whose length is not
/// known up front (no exact size hint, or more items than the hint announced), the items already
/// placed in the array when the error occurred remain there.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// A position or index was not within the valid range of the array.
    #[error("index {index} is out of range for array of length {len}")]
    OutOfRange {
        /// The index that was requested.
        index: usize,

        /// The length of the array at the time of the request.
        len: usize,
    },

    /// The operation would have required the array to hold more elements than
    /// [`max_size()`][crate::GrowableArray::max_size] allows.
    #[error("requested length {requested} exceeds the maximum of {max} elements")]
    LengthExceeded {
        /// The element count that the operation required. Saturates at `usize::MAX` if
        /// the true requirement does not fit in `usize`.
        requested: usize,

        /// The largest element count the array can hold.
        max: usize,
    },

    /// The global allocator was unable to provide a block of memory.
    #[error("memory allocation of {} bytes failed", layout.size())]
    AllocationFailed {
        /// The layout of the block that could not be obtained.
        layout: Layout,
    },
}

/// A specialized `Result` type for growable array operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Converts the error into a panic, for entry points that have no way to report failure.
    ///
    /// Allocation failure is routed through [`std::alloc::handle_alloc_error`] so that the
    /// process-wide allocation error hook applies.
    #[cold]
    #[track_caller]
    pub(crate) fn raise(self) -> ! {
        match self {
            Self::AllocationFailed { layout } => std::alloc::handle_alloc_error(layout),
            other => panic!("{other}"),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug, Clone);

    #[test]
    fn out_of_range_message_names_index_and_len() {
        let error = Error::OutOfRange { index: 7, len: 3 };

        assert_eq!(
            error.to_string(),
            "index 7 is out of range for array of length 3"
        );
    }

    #[test]
    fn length_exceeded_message_names_limits() {
        let error = Error::LengthExceeded {
            requested: 10,
            max: 5,
        };

        assert_eq!(
            error.to_string(),
            "requested length 10 exceeds the maximum of 5 elements"
        );
    }

    #[test]
    fn allocation_failed_message_names_size() {
        let error = Error::AllocationFailed {
            layout: Layout::new::<u64>(),
        };

        assert_eq!(error.to_string(), "memory allocation of 8 bytes failed");
    }

    #[test]
    #[should_panic(expected = "requested length 10 exceeds the maximum of 5 elements")]
    fn raise_panics_with_message() {
        Error::LengthExceeded {
            requested: 10,
            max: 5,
        }
        .raise();
    }
}
