//! `rmi_engine` builds recursive model indexes (RMIs): two levels of linear
//! models that learn where each key sits in a sorted array, backed by a
//! short bounded search that corrects the model's guess.
//!
//! ```
//! use rmi_engine::prelude::*;
//!
//! let records: Vec<(u64, u64)> = (0..10_000).map(|i| (i * i, i)).collect();
//! let index = RecursiveModelIndex::build(records, 64)?;
//!
//! assert_eq!(index.get_value(49), Some(&7));
//! assert_eq!(index.get_value(50), None);
//! # Ok::<(), rmi_engine::Error>(())
//! ```
//!
//! When a sample of the query workload is available, the index can be tuned
//! to it. Either the models are trained with every key weighted by how often
//! it was queried, or the most popular keys are pulled out of the models and
//! answered from an exact table:
//!
//! ```
//! use rmi_engine::prelude::*;
//!
//! let records: Vec<(u64, u64)> = (0..10_000).map(|i| (i * i, i)).collect();
//! let trace: Vec<u64> = vec![0, 0, 0, 81, 81, 4, 99 * 99];
//!
//! let config = RmiConfig::new(64).with_table_size(2);
//! let index = RecursiveModelIndex::build_from_workload(records, &trace, &config)?;
//!
//! assert_eq!(index.lookup(81).probe, Probe::HotKey);
//! assert_eq!(index.get_value(99 * 99), Some(&99));
//!
//! let mut stats = LookupStats::default();
//! for key in &trace {
//!     stats.record(&index.lookup(*key));
//! }
//! assert_eq!(stats.hot_hits, 5);
//! # Ok::<(), rmi_engine::Error>(())
//! ```
#![deny(missing_docs)]

/// Include this at the top of the file when building or querying an index.
pub mod prelude {
    pub use rmi_core::count_frequencies;
    pub use rmi_core::RecursiveModelIndex;
    pub use rmi_core::{Lookup, LookupStats, Probe};
    pub use rmi_core::{Partitioning, RmiConfig, Weighting};
}

pub use rmi_core::{Error, Result};
