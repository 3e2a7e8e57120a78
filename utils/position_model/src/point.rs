use num::PrimInt;

/// Converts an integer key into the model's input space. Conversion is
/// monotone, so equal or increasing keys never produce decreasing inputs.
#[inline]
pub fn key_to_f64<K: PrimInt>(key: K) -> f64 {
    // Integer to float casts are infallible in `num`; NaN is unreachable.
    key.to_f64().unwrap_or(f64::NAN)
}

/// A training sample: model input `x`, target position `y`, and a
/// non-negative `weight` which only weighted fits look at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub weight: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, weight: 1.0 }
    }

    pub fn weighted(x: f64, y: f64, weight: f64) -> Self {
        debug_assert!(weight >= 0.0);
        Self { x, y, weight }
    }

    /// Sample for `key` stored at position `pos`.
    pub fn from_key<K: PrimInt>(key: K, pos: usize) -> Self {
        Self::new(key_to_f64(key), pos as f64)
    }

    /// Sample for `key` stored at position `pos`, queried `frequency` times.
    pub fn from_weighted_key<K: PrimInt>(key: K, pos: usize, frequency: u64) -> Self {
        Self::weighted(key_to_f64(key), pos as f64, frequency as f64)
    }
}
