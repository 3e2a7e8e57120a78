use serde::Serialize;

/// Shape and size of a built index.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RmiStats {
    pub records: usize,
    pub hot_keys: usize,
    pub modelled: usize,
    pub leaf_models: usize,
    pub empty_leaves: usize,

    /// Largest and average error bound over the non-empty leaves
    pub max_error_bound: usize,
    pub mean_error_bound: f64,

    /// Approximate heap footprint, records included.
    pub memory_bytes: usize,
}
