//! An exact cache of the most frequently queried keys, consulted before the
//! models. Under skewed workloads most lookups end here.

use std::cmp::Reverse;
use std::collections::HashMap;

use log::debug;

use crate::position::OriginalPos;
use crate::Key;

/// Counts how many times each key occurs in a workload trace.
pub fn count_frequencies<K: Key>(trace: &[K]) -> HashMap<K, u64> {
    let mut frequencies = HashMap::new();
    for &key in trace {
        *frequencies.entry(key).or_insert(0) += 1;
    }
    frequencies
}

/// Maps hot keys to where their record lives in the sorted record array.
#[derive(Clone, Debug, Default)]
pub struct HotKeyTable<K> {
    table: HashMap<K, OriginalPos>,
}

impl<K: Key> HotKeyTable<K> {
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Picks the `table_size` distinct keys of the sorted `records` with the
    /// highest frequency. Keys missing from `frequencies` count as never
    /// queried; ties go to the smaller key. Duplicate keys map to their first
    /// record.
    pub(crate) fn select<V>(
        records: &[(K, V)],
        frequencies: &HashMap<K, u64>,
        table_size: usize,
    ) -> Self {
        if table_size == 0 {
            return Self::empty();
        }

        let mut candidates: Vec<(K, OriginalPos, u64)> = Vec::new();
        for (pos, (key, _)) in records.iter().enumerate() {
            if candidates.last().is_some_and(|(last, _, _)| last == key) {
                continue;
            }
            let frequency = frequencies.get(key).copied().unwrap_or(0);
            candidates.push((*key, OriginalPos::new(pos), frequency));
        }

        // Stable, so equal frequencies keep key order
        candidates.sort_by_key(|&(_, _, frequency)| Reverse(frequency));
        candidates.truncate(table_size);

        debug!(
            "selected {} hot keys out of {} requested, lowest frequency {}",
            candidates.len(),
            table_size,
            candidates.last().map_or(0, |&(_, _, frequency)| frequency)
        );

        Self {
            table: candidates
                .into_iter()
                .map(|(key, pos, _)| (key, pos))
                .collect(),
        }
    }

    #[inline]
    pub fn get(&self, key: &K) -> Option<OriginalPos> {
        if self.table.is_empty() {
            return None;
        }
        self.table.get(key).copied()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.table.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, OriginalPos)> {
        self.table.iter().map(|(key, &pos)| (key, pos))
    }

    pub(crate) fn size_in_bytes(&self) -> usize {
        self.table.capacity() * std::mem::size_of::<(K, OriginalPos)>()
    }
}
