use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// How the modelled keys are split across the leaf models once the root
/// model has been trained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partitioning {
    /// Walk the sorted keys once, advancing to the next bucket whenever the
    /// root routes a key past the current one. Buckets are contiguous ranges
    /// of the sorted array and the last one absorbs any remainder.
    #[default]
    BoundaryScan,

    /// Route every key independently and collect it into the bucket the root
    /// selects.
    MembershipScan,
}

/// Which regression trains the root and leaf models.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weighting {
    /// Ordinary least squares, every key counts the same.
    #[default]
    Uniform,

    /// Weighted least squares, each key weighted by how often it appears in
    /// the workload trace.
    Workload,
}

/// Build parameters for a `RecursiveModelIndex`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RmiConfig {
    pub num_leaf_models: usize,
    pub partitioning: Partitioning,
    pub weighting: Weighting,

    /// Number of most frequently queried keys served from an exact table
    /// instead of the models. Zero disables the table.
    pub table_size: usize,
}

impl Default for RmiConfig {
    fn default() -> Self {
        Self {
            num_leaf_models: 100,
            partitioning: Partitioning::default(),
            weighting: Weighting::default(),
            table_size: 0,
        }
    }
}

impl RmiConfig {
    pub fn new(num_leaf_models: usize) -> Self {
        Self {
            num_leaf_models,
            ..Default::default()
        }
    }

    pub fn with_partitioning(mut self, partitioning: Partitioning) -> Self {
        self.partitioning = partitioning;
        self
    }

    pub fn with_weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = weighting;
        self
    }

    pub fn with_table_size(mut self, table_size: usize) -> Self {
        self.table_size = table_size;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.num_leaf_models == 0 {
            return Err(ConfigurationError::ZeroLeafModels);
        }

        Ok(())
    }
}
