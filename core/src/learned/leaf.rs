use std::ops::Range;

use log::trace;
use position_model::{LinearModel, Point, Regression};
use serde::{Deserialize, Serialize};

use crate::config::Partitioning;
use crate::learned::root::RootModel;
use crate::Key;

/// A second-level model together with the largest absolute error it made
/// on its own training keys.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Leaf {
    model: LinearModel,
    error_bound: usize,
    size: usize,
}

impl Leaf {
    /// Trains on a bucket of points whose `y` are positions into an array of
    /// `total` keys. An empty bucket predicts its `boundary` and searches the
    /// whole array.
    pub(crate) fn train<R: Regression>(points: &[Point], boundary: usize, total: usize) -> Self {
        if points.is_empty() {
            return Self {
                model: LinearModel::constant(boundary as f64),
                error_bound: total,
                size: 0,
            };
        }

        let model = R::fit(points);
        let error_bound = points
            .iter()
            .map(|p| {
                let error = model.predict(p.x).saturating_sub(p.y as i64).unsigned_abs();
                usize::try_from(error).unwrap_or(usize::MAX)
            })
            .max()
            .unwrap_or(0);

        Self {
            model,
            error_bound,
            size: points.len(),
        }
    }

    pub fn model(&self) -> &LinearModel {
        &self.model
    }

    /// Every training key of this leaf sits within `error_bound` positions of
    /// the model's (unclipped) prediction for it.
    pub fn error_bound(&self) -> usize {
        self.error_bound
    }

    /// Number of keys this leaf was trained on.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// Splits sorted `keys` into `root.fanout()` contiguous ranges in one pass.
pub(crate) fn boundary_scan<K: Key>(keys: &[K], root: &RootModel) -> Vec<Range<usize>> {
    let fanout = root.fanout();
    let mut buckets = Vec::with_capacity(fanout);
    let mut start = 0;

    for (i, &key) in keys.iter().enumerate() {
        let target = root.route(key);
        while buckets.len() < target {
            buckets.push(start..i);
            start = i;
        }
    }

    while buckets.len() < fanout {
        buckets.push(start..keys.len());
        start = keys.len();
    }

    buckets
}

/// Collects the positions of `keys` into the bucket the root routes each
/// one to.
pub(crate) fn membership_scan<K: Key>(keys: &[K], root: &RootModel) -> Vec<Vec<usize>> {
    let mut buckets = vec![Vec::new(); root.fanout()];
    for (i, &key) in keys.iter().enumerate() {
        buckets[root.route(key)].push(i);
    }
    buckets
}

/// Trains one leaf per bucket. `points[i]` is the training sample of
/// `keys[i]`.
pub(crate) fn train_leaves<K: Key, R: Regression>(
    keys: &[K],
    points: &[Point],
    root: &RootModel,
    partitioning: Partitioning,
) -> Vec<Leaf> {
    debug_assert_eq!(keys.len(), points.len());
    let total = keys.len();

    let leaves: Vec<Leaf> = match partitioning {
        Partitioning::BoundaryScan => boundary_scan(keys, root)
            .into_iter()
            .map(|range| {
                let start = range.start;
                Leaf::train::<R>(&points[range], start, total)
            })
            .collect(),
        Partitioning::MembershipScan => {
            let mut scratch = Vec::new();
            let mut boundary = 0;
            membership_scan(keys, root)
                .into_iter()
                .map(|members| {
                    scratch.clear();
                    scratch.extend(members.iter().map(|&i| points[i]));
                    let leaf = Leaf::train::<R>(&scratch, boundary, total);
                    boundary += members.len();
                    leaf
                })
                .collect()
        }
    };

    for (id, leaf) in leaves.iter().enumerate() {
        trace!(
            "leaf {id}: {} keys, slope {}, intercept {}, error bound {}",
            leaf.size(),
            leaf.model().slope(),
            leaf.model().intercept(),
            leaf.error_bound()
        );
    }

    leaves
}

#[cfg(test)]
mod leaf_tests {
    use position_model::{OrdinaryLeastSquares, WeightedLeastSquares};
    use rand::Rng;
    use rand_distr::LogNormal;

    use super::*;

    fn points(keys: &[u64]) -> Vec<Point> {
        keys.iter()
            .enumerate()
            .map(|(pos, &key)| Point::from_key(key, pos))
            .collect()
    }

    fn lognormal_keys(n: usize) -> Vec<u64> {
        let dist = LogNormal::new(0.0, 2.0).unwrap();
        let mut keys: Vec<u64> = rand::thread_rng()
            .sample_iter(dist)
            .take(n)
            .map(|x: f64| (x * 1e9) as u64)
            .collect();
        keys.sort();
        keys
    }

    #[test]
    fn error_bound_covers_training_keys() {
        let keys = lognormal_keys(5_000);
        let points = points(&keys);
        let leaf = Leaf::train::<OrdinaryLeastSquares>(&points, 0, keys.len());

        assert_eq!(leaf.size(), keys.len());
        for (pos, &key) in keys.iter().enumerate() {
            let error = (leaf.model().predict_key(key) - pos as i64).unsigned_abs() as usize;
            assert!(error <= leaf.error_bound());
        }
    }

    #[test]
    fn exact_fit_has_zero_error() {
        let keys: Vec<u64> = (0..100).map(|i| 4 * i + 2).collect();
        let leaf = Leaf::train::<OrdinaryLeastSquares>(&points(&keys), 0, keys.len());
        assert_eq!(leaf.error_bound(), 0);
    }

    #[test]
    fn empty_leaf_searches_everything() {
        let leaf = Leaf::train::<WeightedLeastSquares>(&[], 17, 40);
        assert!(leaf.is_empty());
        assert_eq!(leaf.error_bound(), 40);
        assert_eq!(leaf.model().predict_key(123u64), 17);
    }

    #[test]
    fn boundary_scan_is_exhaustive_and_contiguous() {
        for fanout in [1, 2, 7, 64, 1_000] {
            let keys = lognormal_keys(2_000);
            let root = RootModel::train::<OrdinaryLeastSquares>(&points(&keys), fanout);
            let buckets = boundary_scan(&keys, &root);

            assert_eq!(buckets.len(), fanout);
            assert_eq!(buckets[0].start, 0);
            assert_eq!(buckets[fanout - 1].end, keys.len());
            for pair in buckets.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
            }

            // Every key is in the bucket the root routes it to
            for (id, range) in buckets.iter().enumerate() {
                for &key in &keys[range.clone()] {
                    assert_eq!(root.route(key), id);
                }
            }
        }
    }

    #[test]
    fn scans_agree() {
        let keys = lognormal_keys(3_000);
        let root = RootModel::train::<OrdinaryLeastSquares>(&points(&keys), 50);

        let ranges = boundary_scan(&keys, &root);
        let members = membership_scan(&keys, &root);
        for (range, members) in ranges.into_iter().zip(members) {
            assert_eq!(range.collect::<Vec<_>>(), members);
        }

        let points = points(&keys);
        let by_boundary = train_leaves::<u64, OrdinaryLeastSquares>(
            &keys,
            &points,
            &root,
            Partitioning::BoundaryScan,
        );
        let by_membership = train_leaves::<u64, OrdinaryLeastSquares>(
            &keys,
            &points,
            &root,
            Partitioning::MembershipScan,
        );
        assert_eq!(by_boundary, by_membership);
    }

    #[test]
    fn more_leaves_than_keys() {
        let keys: Vec<u64> = vec![1, 3, 5];
        let root = RootModel::train::<OrdinaryLeastSquares>(&points(&keys), 10);
        let leaves = train_leaves::<u64, OrdinaryLeastSquares>(
            &keys,
            &points(&keys),
            &root,
            Partitioning::BoundaryScan,
        );

        assert_eq!(leaves.len(), 10);
        assert_eq!(leaves.iter().map(Leaf::size).sum::<usize>(), 3);
        assert!(leaves
            .iter()
            .filter(|leaf| leaf.is_empty())
            .all(|leaf| leaf.error_bound() == 3));
    }
}
