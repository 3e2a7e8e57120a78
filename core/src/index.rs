use std::collections::HashMap;

use last_mile_search::{search_in_window, search_window, OptimalSearch};
use log::debug;
use position_model::{OrdinaryLeastSquares, Point, Regression, WeightedLeastSquares};

use crate::config::{RmiConfig, Weighting};
use crate::error::Result;
use crate::hot_keys::{count_frequencies, HotKeyTable};
use crate::learned::{Leaf, ModelLayers, RootModel};
use crate::lookup::{Lookup, Probe};
use crate::position::{OriginalPos, PositionMap, ReducedPos};
use crate::stats::RmiStats;
use crate::{Key, Value};

/// A two-level recursive model index over an immutable, sorted set of
/// records.
///
/// A root model routes a key to one of the leaf models, the leaf predicts the
/// key's position, and a search bounded by the leaf's recorded error corrects
/// the prediction. Optionally, the most frequently queried keys are kept out
/// of the models entirely and answered from an exact table.
///
/// The index never changes after it is built, so shared references can be
/// used for lookups from any number of threads.
pub struct RecursiveModelIndex<K, V> {
    /// All records sorted by key, addressed by `OriginalPos`
    records: Box<[(K, V)]>,
    hot_keys: HotKeyTable<K>,

    /// Keys the models were trained on, addressed by `ReducedPos`
    keys: Box<[K]>,
    positions: PositionMap,

    /// Absent when there was nothing left to train on
    layers: Option<ModelLayers>,
    num_leaf_models: usize,
}

impl<K: Key, V: Value> RecursiveModelIndex<K, V> {
    /// Builds an index trained with ordinary least squares.
    pub fn build(records: Vec<(K, V)>, num_leaf_models: usize) -> Result<Self> {
        Self::build_from_workload(records, &[], &RmiConfig::new(num_leaf_models))
    }

    /// Builds an index trained with weighted least squares, each record
    /// weighted by its query frequency.
    pub fn build_weighted(records: Vec<(K, V, u64)>, num_leaf_models: usize) -> Result<Self> {
        let config = RmiConfig::new(num_leaf_models).with_weighting(Weighting::Workload);
        config.validate()?;

        let mut records = records;
        records.sort_by_key(|&(key, _, _)| key);

        let mut weights = Vec::with_capacity(records.len());
        let records: Vec<(K, V)> = records
            .into_iter()
            .map(|(key, value, weight)| {
                weights.push(weight);
                (key, value)
            })
            .collect();

        Ok(Self::assemble::<WeightedLeastSquares>(
            records.into_boxed_slice(),
            Some(&weights),
            HotKeyTable::empty(),
            &config,
        ))
    }

    /// Builds an index whose `table_size` most frequently queried keys in
    /// `trace` are served from an exact table, training the models on the
    /// remaining keys only.
    pub fn build_with_lookup_table(
        records: Vec<(K, V)>,
        trace: &[K],
        num_leaf_models: usize,
        table_size: usize,
    ) -> Result<Self> {
        let config = RmiConfig::new(num_leaf_models).with_table_size(table_size);
        Self::build_from_workload(records, trace, &config)
    }

    /// Builds an index as described by `config`, using `trace` for weighting
    /// and hot-key selection where the configuration asks for them.
    pub fn build_from_workload(
        mut records: Vec<(K, V)>,
        trace: &[K],
        config: &RmiConfig,
    ) -> Result<Self> {
        config.validate()?;
        records.sort_by_key(|&(key, _)| key);

        let needs_frequencies = config.table_size > 0 || config.weighting == Weighting::Workload;
        let frequencies = if needs_frequencies {
            count_frequencies(trace)
        } else {
            HashMap::new()
        };

        let hot_keys = HotKeyTable::select(&records, &frequencies, config.table_size);

        Ok(match config.weighting {
            Weighting::Uniform => Self::assemble::<OrdinaryLeastSquares>(
                records.into_boxed_slice(),
                None,
                hot_keys,
                config,
            ),
            Weighting::Workload => {
                let weights: Vec<u64> = records
                    .iter()
                    .map(|(key, _)| frequencies.get(key).copied().unwrap_or(0))
                    .collect();
                Self::assemble::<WeightedLeastSquares>(
                    records.into_boxed_slice(),
                    Some(&weights),
                    hot_keys,
                    config,
                )
            }
        })
    }

    /// Trains the models on every sorted record whose key is not hot.
    /// `weights`, when given, runs parallel to `records`.
    fn assemble<R: Regression>(
        records: Box<[(K, V)]>,
        weights: Option<&[u64]>,
        hot_keys: HotKeyTable<K>,
        config: &RmiConfig,
    ) -> Self {
        let sample = |key: K, reduced: usize, original: usize| match weights {
            Some(weights) => Point::from_weighted_key(key, reduced, weights[original]),
            None => Point::from_key(key, reduced),
        };

        let mut keys = Vec::with_capacity(records.len() - hot_keys.len().min(records.len()));
        let mut points = Vec::with_capacity(keys.capacity());

        let positions = if hot_keys.is_empty() {
            for (pos, &(key, _)) in records.iter().enumerate() {
                keys.push(key);
                points.push(sample(key, pos, pos));
            }
            PositionMap::Identity
        } else {
            let mut origins = Vec::with_capacity(keys.capacity());
            for (pos, &(key, _)) in records.iter().enumerate() {
                if hot_keys.contains(&key) {
                    continue;
                }
                points.push(sample(key, keys.len(), pos));
                keys.push(key);
                origins.push(OriginalPos::new(pos));
            }
            PositionMap::Remapped(origins.into_boxed_slice())
        };

        let layers = (!keys.is_empty()).then(|| {
            ModelLayers::train::<K, R>(
                &keys,
                &points,
                config.num_leaf_models,
                config.partitioning,
            )
        });

        let index = Self {
            records,
            hot_keys,
            keys: keys.into_boxed_slice(),
            positions,
            layers,
            num_leaf_models: config.num_leaf_models,
        };

        let stats = index.stats();
        debug!(
            "built rmi over {} records: {} hot keys, {} modelled, {} leaves ({} empty), max error {}, mean error {:.2}",
            stats.records,
            stats.hot_keys,
            stats.modelled,
            stats.leaf_models,
            stats.empty_leaves,
            stats.max_error_bound,
            stats.mean_error_bound
        );

        index
    }

    /// Returns the value stored for `key`, if any.
    #[inline]
    pub fn get_value(&self, key: K) -> Option<&V> {
        self.position(key)
            .and_then(|pos| self.entry(pos))
            .map(|(_, value)| value)
    }

    /// Returns where the record for `key` lives in [`Self::records`].
    #[inline]
    pub fn position(&self, key: K) -> Option<OriginalPos> {
        self.probe(key).0
    }

    /// Same as [`Self::get_value`], but also reports how the key was found.
    pub fn lookup(&self, key: K) -> Lookup<'_, V> {
        let (position, probe) = self.probe(key);
        Lookup {
            position,
            value: position.and_then(|pos| self.entry(pos)).map(|(_, value)| value),
            probe,
        }
    }

    /// The one lookup path: hot-key table, then the leaf's prediction, then a
    /// search over the leaf's error window.
    #[inline]
    fn probe(&self, key: K) -> (Option<OriginalPos>, Probe) {
        if let Some(pos) = self.hot_keys.get(&key) {
            return (Some(pos), Probe::HotKey);
        }

        let Some(layers) = self.layers.as_ref() else {
            return (None, Probe::Miss { window: None });
        };

        let leaf = layers.leaf_for(key);
        let predicted = leaf.model().predict_clipped(key, self.keys.len());

        if self.keys[predicted] == key {
            let pos = self.positions.original(ReducedPos::new(predicted));
            return (Some(pos), Probe::Predicted);
        }

        let window = search_window(predicted, leaf.error_bound(), self.keys.len());
        match search_in_window::<OptimalSearch, K>(&self.keys, &key, window.clone()) {
            Some(pos) => (
                Some(self.positions.original(ReducedPos::new(pos))),
                Probe::LastMile { window },
            ),
            None => (
                None,
                Probe::Miss {
                    window: Some(window),
                },
            ),
        }
    }

    /// The record at `pos`, for positions previously returned by this index.
    pub fn entry(&self, pos: OriginalPos) -> Option<&(K, V)> {
        self.records.get(pos.get())
    }

    /// All records, sorted by key.
    pub fn records(&self) -> &[(K, V)] {
        &self.records
    }

    /// The keys the models were trained on, sorted.
    pub fn modelled_keys(&self) -> &[K] {
        &self.keys
    }

    /// Maps a position among [`Self::modelled_keys`] to a record position.
    pub fn original_position(&self, pos: ReducedPos) -> OriginalPos {
        self.positions.original(pos)
    }

    pub fn hot_keys(&self) -> &HotKeyTable<K> {
        &self.hot_keys
    }

    /// `None` when every key is hot or there were no records.
    pub fn root(&self) -> Option<&RootModel> {
        self.layers.as_ref().map(|layers| &layers.root)
    }

    pub fn leaves(&self) -> &[Leaf] {
        match &self.layers {
            Some(layers) => &layers.leaves,
            None => &[],
        }
    }

    /// Which leaf the root routes `key` to.
    pub fn leaf_for(&self, key: K) -> Option<usize> {
        self.root().map(|root| root.route(key))
    }

    pub fn num_leaf_models(&self) -> usize {
        self.num_leaf_models
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stats(&self) -> RmiStats {
        let leaves = self.leaves();
        let trained = leaves.iter().filter(|leaf| !leaf.is_empty());
        let (count, sum, max) = trained.fold((0usize, 0f64, 0usize), |(count, sum, max), leaf| {
            (
                count + 1,
                sum + leaf.error_bound() as f64,
                max.max(leaf.error_bound()),
            )
        });

        RmiStats {
            records: self.records.len(),
            hot_keys: self.hot_keys.len(),
            modelled: self.keys.len(),
            leaf_models: leaves.len(),
            empty_leaves: leaves.len() - count,
            max_error_bound: max,
            mean_error_bound: if count == 0 { 0.0 } else { sum / count as f64 },
            memory_bytes: std::mem::size_of_val(self.records.as_ref())
                + std::mem::size_of_val(self.keys.as_ref())
                + std::mem::size_of_val(leaves)
                + self.positions.size_in_bytes()
                + self.hot_keys.size_in_bytes(),
        }
    }
}
