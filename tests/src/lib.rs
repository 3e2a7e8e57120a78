#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use rmi_engine::prelude::*;
    use rand::{thread_rng, Rng};
    use rand_distr::{Distribution, LogNormal, Uniform, Zipf};

    type K = i64;
    type V = i64;

    const NUM: usize = 20_000;

    /// Uniform keys, leaving 0..10_000 out of the distribution so that false
    /// positives can be checked for
    fn uniform_keys() -> Vec<K> {
        let key_dist = Uniform::new(K::MIN, K::MAX);
        thread_rng()
            .sample_iter(key_dist)
            .filter(|&x| x < 0 as K || x > 10_000 as K)
            .take(NUM)
            .collect()
    }

    /// Heavily skewed keys with plenty of duplicates, all at least 10_001
    fn lognormal_keys() -> Vec<K> {
        let key_dist = LogNormal::new(0.0, 2.0).unwrap();
        let mut rng = thread_rng();
        (0..NUM)
            .map(|_| 10_001 + (key_dist.sample(&mut rng) * 1_000_000.0) as K)
            .collect()
    }

    fn records(keys: &[K]) -> Vec<(K, V)> {
        let value_dist = Uniform::new(V::MIN, V::MAX);
        let values: Vec<V> = thread_rng()
            .sample_iter(value_dist)
            .take(keys.len())
            .collect();
        keys.iter().copied().zip(values).collect()
    }

    /// Samples a skewed trace over the given keys
    fn zipf_trace(keys: &[K], len: usize) -> Vec<K> {
        let dist = Zipf::new(keys.len() as u64, 1.1).unwrap();
        let mut rng = thread_rng();
        (0..len)
            .map(|_| keys[dist.sample(&mut rng) as usize - 1])
            .collect()
    }

    fn check_index(index: &RecursiveModelIndex<K, V>, records: &[(K, V)]) {
        // Among duplicate keys, any of their values is a valid answer
        let mut expected: HashMap<K, Vec<V>> = HashMap::new();
        for &(key, value) in records {
            expected.entry(key).or_default().push(value);
        }

        for (key, values) in &expected {
            let found = index.get_value(*key).copied();
            assert!(
                found.is_some_and(|value| values.contains(&value)),
                "key {key} resolved to {found:?}"
            );
        }

        for key in 0..10_000 {
            assert_eq!(index.get_value(key as K), None);
        }
    }

    fn test_build(keys: Vec<K>) {
        let records = records(&keys);

        for num_leaf_models in [1, 10, 1_000, 100_000] {
            let index = RecursiveModelIndex::build(records.clone(), num_leaf_models).unwrap();
            check_index(&index, &records);
        }
    }

    fn test_build_weighted(keys: Vec<K>) {
        let records = records(&keys);
        let frequencies = count_frequencies(&zipf_trace(&keys, NUM));

        let weighted: Vec<(K, V, u64)> = records
            .iter()
            .map(|&(key, value)| (key, value, frequencies.get(&key).copied().unwrap_or(0)))
            .collect();

        for num_leaf_models in [1, 10, 1_000] {
            let index =
                RecursiveModelIndex::build_weighted(weighted.clone(), num_leaf_models).unwrap();
            check_index(&index, &records);
        }
    }

    fn test_build_with_lookup_table(keys: Vec<K>) {
        let records = records(&keys);
        let trace = zipf_trace(&keys, NUM);

        for table_size in [0, 1, 100, NUM, 2 * NUM] {
            let index = RecursiveModelIndex::build_with_lookup_table(
                records.clone(),
                &trace,
                100,
                table_size,
            )
            .unwrap();
            assert!(index.hot_keys().len() <= table_size);
            check_index(&index, &records);

            // Hot and modelled keys split the input keys between them
            let distinct: HashSet<K> = keys.iter().copied().collect();
            let modelled: HashSet<K> = index.modelled_keys().iter().copied().collect();
            let hot: HashSet<K> = index.hot_keys().iter().map(|(&key, _)| key).collect();

            assert!(modelled.is_disjoint(&hot));
            assert_eq!(hot.len(), table_size.min(distinct.len()));
            assert_eq!(&modelled | &hot, distinct);

            // Every record of a hot key left the models, every other stayed
            let expected_modelled = records
                .iter()
                .filter(|(key, _)| !hot.contains(key))
                .count();
            assert_eq!(index.modelled_keys().len(), expected_modelled);

            for key in &trace {
                if index.hot_keys().contains(key) {
                    assert_eq!(index.lookup(*key).probe, Probe::HotKey);
                }
            }
        }
    }

    fn test_build_from_workload(keys: Vec<K>) {
        let records = records(&keys);
        let trace = zipf_trace(&keys, NUM);

        for partitioning in [Partitioning::BoundaryScan, Partitioning::MembershipScan] {
            for weighting in [Weighting::Uniform, Weighting::Workload] {
                let config = RmiConfig::new(500)
                    .with_partitioning(partitioning)
                    .with_weighting(weighting)
                    .with_table_size(64);

                let index =
                    RecursiveModelIndex::build_from_workload(records.clone(), &trace, &config)
                        .unwrap();
                check_index(&index, &records);
            }
        }
    }

    /// Every modelled key must lie within its leaf's error bound of the
    /// leaf's unclipped prediction, for every build configuration
    fn test_error_bounds(keys: Vec<K>) {
        let records = records(&keys);
        let trace = zipf_trace(&keys, NUM);

        for partitioning in [Partitioning::BoundaryScan, Partitioning::MembershipScan] {
            for weighting in [Weighting::Uniform, Weighting::Workload] {
                for table_size in [0, 32] {
                    let config = RmiConfig::new(200)
                        .with_partitioning(partitioning)
                        .with_weighting(weighting)
                        .with_table_size(table_size);
                    let index =
                        RecursiveModelIndex::build_from_workload(records.clone(), &trace, &config)
                            .unwrap();

                    for (pos, &key) in index.modelled_keys().iter().enumerate() {
                        let leaf = &index.leaves()[index.leaf_for(key).unwrap()];
                        let error = leaf
                            .model()
                            .predict_key(key)
                            .saturating_sub(pos as i64)
                            .unsigned_abs() as usize;
                        assert!(
                            error <= leaf.error_bound(),
                            "key {key} at {pos} off by {error}, bound {} ({config:?})",
                            leaf.error_bound()
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_build_uniform() {
        test_build(uniform_keys());
    }

    #[test]
    fn test_build_lognormal() {
        test_build(lognormal_keys());
    }

    #[test]
    fn test_build_weighted_uniform() {
        test_build_weighted(uniform_keys());
    }

    #[test]
    fn test_build_weighted_lognormal() {
        test_build_weighted(lognormal_keys());
    }

    #[test]
    fn test_build_with_lookup_table_uniform() {
        test_build_with_lookup_table(uniform_keys());
    }

    #[test]
    fn test_build_with_lookup_table_lognormal() {
        test_build_with_lookup_table(lognormal_keys());
    }

    #[test]
    fn test_build_from_workload_uniform() {
        test_build_from_workload(uniform_keys());
    }

    #[test]
    fn test_build_from_workload_lognormal() {
        test_build_from_workload(lognormal_keys());
    }

    #[test]
    fn test_error_bounds_uniform() {
        test_error_bounds(uniform_keys());
    }

    #[test]
    fn test_error_bounds_lognormal() {
        test_error_bounds(lognormal_keys());
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let records = records(&lognormal_keys());
        let a = RecursiveModelIndex::build(records.clone(), 300).unwrap();
        let b = RecursiveModelIndex::build(records, 300).unwrap();

        assert_eq!(a.root().map(|root| *root.model()), b.root().map(|root| *root.model()));
        assert_eq!(a.leaves(), b.leaves());
        assert_eq!(a.stats(), b.stats());
    }

    #[test]
    fn test_concurrent_lookups() {
        let keys = uniform_keys();
        let records = records(&keys);
        let trace = zipf_trace(&keys, NUM);
        let config = RmiConfig::new(1_000).with_table_size(16);
        let index =
            RecursiveModelIndex::build_from_workload(records.clone(), &trace, &config).unwrap();

        let stats: Vec<LookupStats> = std::thread::scope(|scope| {
            let handles: Vec<_> = trace
                .chunks(NUM / 4)
                .map(|chunk| {
                    let index = &index;
                    scope.spawn(move || {
                        let mut stats = LookupStats::default();
                        for &key in chunk {
                            let lookup = index.lookup(key);
                            assert!(lookup.is_found());
                            stats.record(&lookup);
                        }
                        stats
                    })
                })
                .collect();

            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let mut total = LookupStats::default();
        for s in &stats {
            total.merge(s);
        }
        assert_eq!(total.lookups, NUM as u64);
        assert_eq!(total.misses, 0);
        assert_eq!(
            total.hot_hits + total.predicted_hits + total.last_mile_searches,
            NUM as u64
        );
    }
}
