//! Sense identifiers and per-listener interest sets

use std::fmt;

/// Index of a sense (sight, hearing, team, ...) within a perception system
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SenseId(u8);

impl SenseId {
    /// Highest index a [`SenseSet`] can hold
    pub const MAX_INDEX: u8 = 63;

    /// Create a sense id, `None` if the index exceeds [`SenseId::MAX_INDEX`]
    pub const fn new(index: u8) -> Option<Self> {
        if index <= Self::MAX_INDEX {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Get the raw index
    pub fn index(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for SenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sense#{}", self.0)
    }
}

/// Set of senses a listener is interested in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SenseSet(u64);

impl SenseSet {
    /// A set with no senses
    pub const fn empty() -> Self {
        Self(0)
    }

    /// A set holding a single sense
    pub const fn of(sense: SenseId) -> Self {
        Self(1 << sense.0)
    }

    /// Add a sense
    pub fn insert(&mut self, sense: SenseId) {
        self.0 |= 1 << sense.0;
    }

    /// Remove a sense
    pub fn remove(&mut self, sense: SenseId) {
        self.0 &= !(1 << sense.0);
    }

    /// Check membership
    pub fn contains(&self, sense: SenseId) -> bool {
        self.0 & (1 << sense.0) != 0
    }

    /// Whether no sense is set
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<SenseId> for SenseSet {
    fn from_iter<I: IntoIterator<Item = SenseId>>(iter: I) -> Self {
        let mut set = SenseSet::empty();
        for sense in iter {
            set.insert(sense);
        }
        set
    }
}
