use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A build was requested with parameters no index can satisfy. These are
/// caller contract violations and are never clamped into range.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("num_leaf_models must be at least 1")]
    ZeroLeafModels,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),
}
