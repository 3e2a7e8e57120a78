//! A recursive model index (RMI): a learned replacement for searching a
//! sorted array.
//!
//! A root linear model routes each key to one of many leaf linear models,
//! the leaf predicts the key's position, and a binary search bounded by the
//! leaf's largest training error corrects the prediction. Two augmentations
//! are available:
//!
//! - workload-weighted training, which fits the models more tightly around
//!   frequently queried keys, and
//! - a hot-key table, which answers the most frequently queried keys
//!   exactly and keeps them out of the models.
//!
//! ```
//! use rmi_core::RecursiveModelIndex;
//!
//! let records = vec![(1u64, 10), (3, 30), (5, 50), (7, 70), (9, 90)];
//! let index = RecursiveModelIndex::build(records, 2)?;
//!
//! assert_eq!(index.get_value(5), Some(&50));
//! assert_eq!(index.get_value(4), None);
//! # Ok::<(), rmi_core::Error>(())
//! ```

mod config;
mod error;
mod hot_keys;
mod index;
mod learned;
mod lookup;
mod position;
mod stats;
mod traits;

pub use config::{Partitioning, RmiConfig, Weighting};
pub use error::{ConfigurationError, Error, Result};
pub use hot_keys::{count_frequencies, HotKeyTable};
pub use index::RecursiveModelIndex;
pub use learned::{Leaf, RootModel};
pub use lookup::{Lookup, LookupStats, Probe};
pub use position::{OriginalPos, ReducedPos};
pub use stats::RmiStats;
pub use traits::*;

pub use position_model::LinearModel;
