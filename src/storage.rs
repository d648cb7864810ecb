//! Storage backing for per-topic value and subscriber lists.
//!
//! Plain `Vec` by default. With the `lite` feature, both collections are
//! backed by a `smallvec::SmallVec` with a small inline capacity, so the
//! overwhelmingly common case (a handful of values or subscribers per
//! traversal) never touches the heap. The two must stay behaviorally
//! identical; `lite` only changes where the bytes live.

#[cfg(not(feature = "lite"))]
pub type List<T> = Vec<T>;

#[cfg(feature = "lite")]
pub type List<T> = smallvec::SmallVec<[T; 4]>;
