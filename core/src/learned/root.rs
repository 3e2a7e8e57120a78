use log::warn;
use position_model::{LinearModel, Point, Regression};
use serde::{Deserialize, Serialize};

use crate::Key;

/// The top of the index: a single position model, rescaled so that its
/// prediction selects one of `fanout` leaf models instead of a position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RootModel {
    model: LinearModel,
    fanout: usize,
}

impl RootModel {
    /// Trains over all modelled points. Routing must never decrease as keys
    /// grow, otherwise lookups could disagree with the partitioning done at
    /// build time, so a decreasing fit is replaced with a constant router.
    pub(crate) fn train<R: Regression>(points: &[Point], fanout: usize) -> Self {
        debug_assert!(!points.is_empty());
        debug_assert!(fanout > 0);

        let mut model = R::fit(points);
        if !model.is_monotone() {
            warn!(
                "root model slope {} is not monotone over {} keys, routing every key to leaf 0",
                model.slope(),
                points.len()
            );
            model = LinearModel::constant(0.0);
        }

        model.rescale(fanout as f64 / points.len() as f64);
        Self { model, fanout }
    }

    /// Leaf id for `key`, clipped into `[0, fanout - 1]`.
    #[inline]
    pub fn route<K: Key>(&self, key: K) -> usize {
        self.model.predict_clipped(key, self.fanout)
    }

    pub fn model(&self) -> &LinearModel {
        &self.model
    }

    pub fn fanout(&self) -> usize {
        self.fanout
    }
}

#[cfg(test)]
mod root_tests {
    use position_model::{OrdinaryLeastSquares, WeightedLeastSquares};

    use super::*;

    fn points(keys: &[u64]) -> Vec<Point> {
        keys.iter()
            .enumerate()
            .map(|(pos, &key)| Point::from_key(key, pos))
            .collect()
    }

    #[test]
    fn routes_uniform_keys_evenly() {
        let keys: Vec<u64> = (0..1_000).map(|i| i * 10).collect();
        let root = RootModel::train::<OrdinaryLeastSquares>(&points(&keys), 10);

        assert_eq!(root.fanout(), 10);
        assert_eq!(root.route(0u64), 0);
        assert_eq!(root.route(5_005u64), 5);
        assert_eq!(root.route(9_990u64), 9);

        // Out of range keys are clipped
        assert_eq!(root.route(u64::MAX), 9);
    }

    #[test]
    fn routing_is_monotone() {
        let keys: Vec<u64> = (0..500).map(|i| i * i).collect();
        let root = RootModel::train::<OrdinaryLeastSquares>(&points(&keys), 16);

        let mut last = 0;
        for key in 0..250_000u64 {
            let leaf = root.route(key);
            assert!(leaf >= last);
            last = leaf;
        }
    }

    #[test]
    fn decreasing_fit_routes_to_first_leaf() {
        // Positions decreasing in key can only come from a misuse, but the
        // router must stay usable.
        let points: Vec<Point> = (0..10).map(|i| Point::new(i as f64, (9 - i) as f64)).collect();
        let root = RootModel::train::<OrdinaryLeastSquares>(&points, 4);

        assert!(root.model().is_constant());
        for key in 0u32..10 {
            assert_eq!(root.route(key), 0);
        }
    }

    #[test]
    fn single_key_routes_to_first_leaf() {
        let root = RootModel::train::<WeightedLeastSquares>(&[Point::weighted(7.0, 0.0, 3.0)], 8);
        assert_eq!(root.route(7u8), 0);
        assert_eq!(root.route(200u8), 0);
    }
}
