use std::{fmt::Debug, hash::Hash};

use num::PrimInt;
use trait_set::trait_set;

// Until `trait_alias` is stabilized, we have to use a macro
trait_set! {
    /// General key type: a primitive integer, thread safe. Keys must hash so
    /// that hot keys can be served from an exact table.
    pub trait Key = PrimInt + Hash + Debug + Send + Sync + 'static;

    /// General value type, thread-safe
    pub trait Value = Send + Sync + 'static;
}
