//! The learned half of the index: a root model routing keys to leaf models,
//! and the leaf models predicting positions with a recorded error bound.

use position_model::{Point, Regression};

use crate::config::Partitioning;
use crate::Key;

mod leaf;
mod root;

pub use leaf::Leaf;
pub use root::RootModel;

/// Both model levels of a trained index.
pub(crate) struct ModelLayers {
    pub(crate) root: RootModel,
    pub(crate) leaves: Box<[Leaf]>,
}

impl ModelLayers {
    /// Trains over non-empty, sorted `keys` whose training samples are
    /// `points`.
    pub(crate) fn train<K: Key, R: Regression>(
        keys: &[K],
        points: &[Point],
        num_leaf_models: usize,
        partitioning: Partitioning,
    ) -> Self {
        let root = RootModel::train::<R>(points, num_leaf_models);
        let leaves = leaf::train_leaves::<K, R>(keys, points, &root, partitioning);

        Self {
            root,
            leaves: leaves.into_boxed_slice(),
        }
    }

    #[inline]
    pub(crate) fn leaf_for<K: Key>(&self, key: K) -> &Leaf {
        &self.leaves[self.root.route(key)]
    }
}
