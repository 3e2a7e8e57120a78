use std::ops::Range;

use crate::position::OriginalPos;

/// The route a lookup took through the index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Probe {
    /// Served from the hot-key table.
    HotKey,

    /// The leaf model's prediction landed exactly on the key.
    Predicted,

    /// Found by a bounded search over `window` of the modelled keys.
    LastMile { window: Range<usize> },

    /// Not present. `window` is the range that was searched, if the model
    /// path was taken at all.
    Miss { window: Option<Range<usize>> },
}

/// The result of a lookup along with how it was obtained.
#[derive(Clone, Debug)]
pub struct Lookup<'a, V> {
    pub position: Option<OriginalPos>,
    pub value: Option<&'a V>,
    pub probe: Probe,
}

impl<'a, V> Lookup<'a, V> {
    pub fn is_found(&self) -> bool {
        self.value.is_some()
    }

    /// Whether a last-mile search ran for this lookup.
    pub fn searched(&self) -> bool {
        matches!(
            self.probe,
            Probe::LastMile { .. } | Probe::Miss { window: Some(_) }
        )
    }
}

/// Tallies lookups on the caller's side, keeping the index itself free of
/// mutable state. Merge per-thread tallies with [`LookupStats::merge`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LookupStats {
    pub lookups: u64,
    pub hot_hits: u64,
    pub predicted_hits: u64,
    pub last_mile_searches: u64,
    pub misses: u64,

    /// Sum of all searched window lengths.
    pub searched_entries: u64,
}

impl LookupStats {
    pub fn record<V>(&mut self, lookup: &Lookup<'_, V>) {
        self.lookups += 1;
        match &lookup.probe {
            Probe::HotKey => self.hot_hits += 1,
            Probe::Predicted => self.predicted_hits += 1,
            Probe::LastMile { window } => {
                self.last_mile_searches += 1;
                self.searched_entries += window.len() as u64;
            }
            Probe::Miss { window } => {
                self.misses += 1;
                if let Some(window) = window {
                    self.last_mile_searches += 1;
                    self.searched_entries += window.len() as u64;
                }
            }
        }
    }

    pub fn merge(&mut self, other: &Self) {
        self.lookups += other.lookups;
        self.hot_hits += other.hot_hits;
        self.predicted_hits += other.predicted_hits;
        self.last_mile_searches += other.last_mile_searches;
        self.misses += other.misses;
        self.searched_entries += other.searched_entries;
    }

    /// Average window length over the lookups that searched.
    pub fn mean_window(&self) -> f64 {
        if self.last_mile_searches == 0 {
            0.0
        } else {
            self.searched_entries as f64 / self.last_mile_searches as f64
        }
    }
}
