#![no_std]

//! Last-mile searches for learned indexes.
//!
//! A learned model predicts where a key should sit in a sorted slice and
//! records the largest error it made on its training data. This crate turns
//! such a prediction into a search window and finds the key inside it.
//!
//! Every [`Search`] strategy returns the same answer, the index of the first
//! element greater than or equal to the key, so they are interchangeable.
#![deny(missing_docs)]

use core::borrow::Borrow;
use core::ops::Range;

/// Returns the window `[predicted - error, predicted + error + 1)`, clipped
/// into `[0, len]`.
///
/// # Example
/// ```
/// use last_mile_search::search_window;
///
/// assert_eq!(search_window(5, 2, 100), 3..8);
/// assert_eq!(search_window(1, 4, 100), 0..6);
/// assert_eq!(search_window(98, 4, 100), 94..100);
/// assert_eq!(search_window(3, usize::MAX, 10), 0..10);
/// ```
#[inline]
pub fn search_window(predicted: usize, error: usize, len: usize) -> Range<usize> {
    let lo = predicted.saturating_sub(error).min(len);
    let hi = predicted.saturating_add(error).saturating_add(1).min(len);
    lo..hi
}

/// An algorithm for searching a sorted slice, e.g. Binary or Linear
pub trait Search {
    /// Returns the index of the first element of `slice` whose key is not less
    /// than `x`, or `slice.len()` if there is none.
    ///
    /// This method assumes that the given slice is sorted. With duplicate keys
    /// the first of the run is returned.
    ///
    /// ```
    /// use last_mile_search::*;
    ///
    /// let slice = [1, 2, 2, 2, 5, 8];
    /// assert_eq!(BinarySearch::lower_bound(&slice, &2), 1);
    /// assert_eq!(BinarySearch::lower_bound(&slice, &6), 5);
    /// assert_eq!(BinarySearch::lower_bound(&slice, &9), 6);
    /// ```
    fn lower_bound<T: Ord>(slice: &[T], x: &T) -> usize {
        Self::lower_bound_by_key(slice, x)
    }

    /// Same as [`Search::lower_bound`] for a slice of `T: Borrow<K>`, using the
    /// `Borrow<K>` trait like a key extraction function.
    fn lower_bound_by_key<K: Ord, T: Borrow<K>>(slice: &[T], x: &K) -> usize;
}

/// Performs a binary search on a slice, with computational complexity `O(log n)`
pub struct BinarySearch;

impl Search for BinarySearch {
    #[inline]
    fn lower_bound_by_key<K: Ord, T: Borrow<K>>(slice: &[T], x: &K) -> usize {
        slice.partition_point(|y| y.borrow() < x)
    }
}

/// Performs a simple linear scan of a slice, with computational complexity `O(n)`
pub struct LinearSearch;

impl Search for LinearSearch {
    #[inline]
    fn lower_bound_by_key<K: Ord, T: Borrow<K>>(slice: &[T], x: &K) -> usize {
        slice
            .iter()
            .position(|y| y.borrow() >= x)
            .unwrap_or(slice.len())
    }
}

const BINARY_SEARCH_CUTOFF: usize = 256;

/// Scans small windows linearly and falls back to binary search once the
/// window spans more than a few cache lines
pub struct OptimalSearch;

impl Search for OptimalSearch {
    #[inline]
    fn lower_bound_by_key<K: Ord, T: Borrow<K>>(slice: &[T], x: &K) -> usize {
        if core::mem::size_of_val(slice) > BINARY_SEARCH_CUTOFF {
            BinarySearch::lower_bound_by_key(slice, x)
        } else {
            LinearSearch::lower_bound_by_key(slice, x)
        }
    }
}

/// Searches `keys` for `key` within the window around `predicted` given by
/// `error`, returning the index of the first matching element if it lies
/// inside the window.
///
/// The caller guarantees that, if `key` is present, some occurrence of it
/// lies within `error` of `predicted`.
///
/// # Example
/// ```
/// use last_mile_search::*;
///
/// let keys = [1, 3, 5, 7, 9, 11, 13];
///
/// assert_eq!(bounded_search::<BinarySearch, _>(&keys, &9, 3, 1), Some(4));
/// assert_eq!(bounded_search::<BinarySearch, _>(&keys, &8, 3, 1), None);
/// // The key exists but lies outside of the window
/// assert_eq!(bounded_search::<BinarySearch, _>(&keys, &13, 0, 2), None);
/// ```
pub fn bounded_search<S: Search, K: Ord>(
    keys: &[K],
    key: &K,
    predicted: usize,
    error: usize,
) -> Option<usize> {
    search_in_window::<S, K>(keys, key, search_window(predicted, error, keys.len()))
}

/// Same as [`bounded_search`] over an already computed `window`, which must
/// lie within `keys`.
///
/// ```
/// use last_mile_search::*;
///
/// let keys = [2, 4, 6, 8];
/// let window = search_window(2, 1, keys.len());
///
/// assert_eq!(search_in_window::<LinearSearch, _>(&keys, &4, window.clone()), Some(1));
/// assert_eq!(search_in_window::<LinearSearch, _>(&keys, &2, window), None);
/// ```
pub fn search_in_window<S: Search, K: Ord>(
    keys: &[K],
    key: &K,
    window: Range<usize>,
) -> Option<usize> {
    let index = window.start + S::lower_bound(&keys[window.clone()], key);
    (index < window.end && keys[index] == *key).then_some(index)
}
