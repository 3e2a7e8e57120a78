//! The model half of a learned index: a line through key-position space.

use num::PrimInt;
use serde::{Deserialize, Serialize};

use crate::point::key_to_f64;

/// A linear model `y = slope * x + intercept` predicting the position of a
/// key in a sorted array. Predictions are not clipped; callers clip them to
/// whatever range they index into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    slope: f64,
    intercept: f64,
}

impl LinearModel {
    pub fn new(slope: f64, intercept: f64) -> Self {
        Self { slope, intercept }
    }

    /// A model which predicts `value` for every key.
    pub fn constant(value: f64) -> Self {
        Self {
            slope: 0.0,
            intercept: value,
        }
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// `floor(slope * x + intercept)`. Out of range and NaN results saturate
    /// through the float to integer cast (NaN becomes 0).
    #[inline]
    pub fn predict(&self, x: f64) -> i64 {
        (self.slope * x + self.intercept).floor() as i64
    }

    #[inline]
    pub fn predict_key<K: PrimInt>(&self, key: K) -> i64 {
        self.predict(key_to_f64(key))
    }

    /// Prediction clipped into `[0, len - 1]`. `len` must be non-zero.
    #[inline]
    pub fn predict_clipped<K: PrimInt>(&self, key: K, len: usize) -> usize {
        debug_assert!(len > 0);
        let upper = i64::try_from(len - 1).unwrap_or(i64::MAX);
        num::clamp(self.predict_key(key), 0, upper) as usize
    }

    /// Multiplies both coefficients, turning a position predictor over `n`
    /// entries into a bucket selector over `c * n` buckets.
    pub fn rescale(&mut self, c: f64) {
        self.slope *= c;
        self.intercept *= c;
    }

    pub fn is_constant(&self) -> bool {
        self.slope == 0.0
    }

    /// Whether predictions never decrease as the key grows. Float
    /// multiplication, addition and `floor` are all monotone, so a
    /// non-negative finite slope is enough.
    pub fn is_monotone(&self) -> bool {
        self.slope >= 0.0 && self.slope.is_finite()
    }
}
