//! Two position spaces exist once a hot-key table is carved out of the data:
//! positions into the full sorted record array, and positions into the
//! smaller array of keys the models were trained on. They are kept apart by
//! type so one is never used to index the other.

/// Index into the full, sorted record array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OriginalPos(usize);

/// Index into the array of modelled (non-hot) keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReducedPos(usize);

impl OriginalPos {
    pub(crate) fn new(pos: usize) -> Self {
        Self(pos)
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl ReducedPos {
    pub(crate) fn new(pos: usize) -> Self {
        Self(pos)
    }

    pub fn get(self) -> usize {
        self.0
    }
}

/// Translates reduced positions back into the record array.
pub(crate) enum PositionMap {
    /// No key was removed, both spaces coincide.
    Identity,

    /// `origins[reduced]` is where the reduced entry lives in the records.
    Remapped(Box<[OriginalPos]>),
}

impl PositionMap {
    #[inline]
    pub(crate) fn original(&self, pos: ReducedPos) -> OriginalPos {
        match self {
            Self::Identity => OriginalPos(pos.0),
            Self::Remapped(origins) => origins[pos.0],
        }
    }

    pub(crate) fn size_in_bytes(&self) -> usize {
        match self {
            Self::Identity => 0,
            Self::Remapped(origins) => std::mem::size_of_val(origins.as_ref()),
        }
    }
}
