/// Determines element dropping behavior when a [`GrowableArray`][crate::GrowableArray] is dropped.
///
/// By default, the array drops its elements when it is dropped.
///
/// The policy is part of the array value and travels with its contents: moving the array
/// (including [`mem::take`][std::mem::take] and [`swap()`][crate::GrowableArray::swap]) moves
/// the policy along, converting the array into an iterator hands the policy to the
/// [`IntoIter`][crate::IntoIter], and cloning copies it. Operations that replace the contents
/// in place, such as the `assign_*` family and [`clone_from()`][Clone::clone_from], keep the
/// policy of the array being modified. An array left behind by `mem::take` is a new
/// default-constructed array and therefore uses [`DropPolicy::MayDropItems`].
///
/// # Examples
///
/// ```
/// use growable_array::{DropPolicy, GrowableArray};
///
/// // The drop policy is set at creation time.
/// let array = GrowableArray::<u32>::builder()
///     .drop_policy(DropPolicy::MustNotDropItems)
///     .build()
///     .unwrap();
///
/// assert!(array.is_empty());
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum DropPolicy {
    /// The array will drop its elements when the array is dropped. This is the default.
    #[default]
    MayDropItems,

    /// The array will panic if it still contains elements when it is dropped.
    ///
    /// The elements are still dropped and the memory is still released before the panic.
    /// This may be valuable if the owner is expected to drain the array explicitly, for
    /// example because the elements need to be handed off somewhere before the array goes away.
    MustNotDropItems,
}
