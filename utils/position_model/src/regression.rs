//! Closed-form fits turning a set of points into a [`LinearModel`].
//!
//! Neither fit can fail: degenerate input (no points, a single point, all
//! inputs equal, zero total weight) yields a constant model instead.

use crate::model::LinearModel;
use crate::point::Point;

/// An algorithm for fitting a linear model to key-position samples.
pub trait Regression: 'static {
    fn fit(points: &[Point]) -> LinearModel;
}

fn mean_position(points: &[Point]) -> f64 {
    if points.is_empty() {
        0.0
    } else {
        points.iter().map(|p| p.y).sum::<f64>() / points.len() as f64
    }
}

/// Ordinary least squares, ignoring point weights.
pub struct OrdinaryLeastSquares;

impl Regression for OrdinaryLeastSquares {
    fn fit(points: &[Point]) -> LinearModel {
        if points.len() <= 1 {
            return LinearModel::constant(mean_position(points));
        }

        let n = points.len() as f64;
        let (mut sx, mut sy, mut sxx, mut sxy) = (0.0, 0.0, 0.0, 0.0);
        for p in points {
            sx += p.x;
            sy += p.y;
            sxx += p.x * p.x;
            sxy += p.x * p.y;
        }

        let den = n * sxx - sx * sx;
        // All inputs equal
        if den == 0.0 || !den.is_finite() {
            return LinearModel::constant(sy / n);
        }

        let slope = (n * sxy - sx * sy) / den;
        LinearModel::new(slope, (sy - slope * sx) / n)
    }
}

/// Weighted least squares over weighted means and central moments. Points
/// with higher weight (more frequently queried keys) get a tighter fit.
pub struct WeightedLeastSquares;

impl Regression for WeightedLeastSquares {
    fn fit(points: &[Point]) -> LinearModel {
        let total: f64 = points.iter().map(|p| p.weight).sum();
        // No queries at all, fall back to the unweighted mean
        if !(total > 0.0) || !total.is_finite() {
            return LinearModel::constant(mean_position(points));
        }

        let xbar = points.iter().map(|p| p.weight * p.x).sum::<f64>() / total;
        let ybar = points.iter().map(|p| p.weight * p.y).sum::<f64>() / total;

        if points.len() <= 1 {
            return LinearModel::constant(ybar);
        }

        let (mut num, mut den) = (0.0, 0.0);
        for p in points {
            let dx = p.x - xbar;
            num += p.weight * dx * (p.y - ybar);
            den += p.weight * dx * dx;
        }

        if den == 0.0 || !den.is_finite() {
            return LinearModel::constant(ybar);
        }

        let slope = num / den;
        LinearModel::new(slope, ybar - slope * xbar)
    }
}
