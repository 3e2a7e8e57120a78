//! Linear position models for learned indexes.
//!
//! A [`LinearModel`] maps a numeric key to a predicted integer position,
//! `floor(slope * key + intercept)`. Models are produced by a [`Regression`]
//! over a set of [`Point`]s; two closed-form fits are provided, ordinary
//! least squares and workload-weighted least squares.
//!
//! ```
//! use position_model::{OrdinaryLeastSquares, Point, Regression};
//!
//! let points: Vec<Point> = [1u64, 3, 5, 7, 9]
//!     .iter()
//!     .enumerate()
//!     .map(|(pos, &key)| Point::from_key(key, pos))
//!     .collect();
//!
//! let model = OrdinaryLeastSquares::fit(&points);
//! assert_eq!(model.predict(5.0), 2);
//! ```

mod model;
mod point;
mod regression;

pub use model::LinearModel;
pub use point::{key_to_f64, Point};
pub use regression::{OrdinaryLeastSquares, Regression, WeightedLeastSquares};
