//! Ordered, de-duplicated tag collections

use crate::{MatchPolicy, Tag, TagSnapshot};
use std::fmt;

/// A group of tags in insertion order, without duplicates
///
/// Used both as the argument of bulk counter operations and as an immutable
/// snapshot that requirements can be evaluated against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet(Vec<Tag>);

impl TagSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag, returning `false` if it was already present
    pub fn insert(&mut self, tag: Tag) -> bool {
        if self.0.contains(&tag) {
            return false;
        }
        self.0.push(tag);
        true
    }

    /// Remove a tag, returning `false` if it was not present
    pub fn remove(&mut self, tag: &Tag) -> bool {
        match self.0.iter().position(|t| t == tag) {
            Some(index) => {
                self.0.remove(index);
                true
            }
            None => false,
        }
    }

    /// Check for an exact member
    pub fn contains(&self, tag: &Tag) -> bool {
        self.0.contains(tag)
    }

    /// Iterate over members in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.0.iter()
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy of this set with every member's ancestors added
    pub fn with_parents(&self) -> TagSet {
        self.0
            .iter()
            .flat_map(|tag| tag.with_ancestors().cloned())
            .collect()
    }
}

impl TagSnapshot for TagSet {
    fn has_tag(&self, tag: &Tag, policy: MatchPolicy) -> bool {
        match policy {
            MatchPolicy::Explicit => self.contains(tag),
            MatchPolicy::IncludeParents => tag.with_ancestors().any(|t| self.contains(t)),
        }
    }
}

impl FromIterator<Tag> for TagSet {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

impl Extend<Tag> for TagSet {
    fn extend<I: IntoIterator<Item = Tag>>(&mut self, iter: I) {
        for tag in iter {
            self.insert(tag);
        }
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for TagSet {
    type Item = Tag;
    type IntoIter = std::vec::IntoIter<Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl From<Tag> for TagSet {
    fn from(tag: Tag) -> Self {
        TagSet(vec![tag])
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, tag) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", tag)?;
        }
        Ok(())
    }
}
