//! Hierarchical tags and the registry that interns them
//!
//! Tags use dot-delimited paths: `Status.Burning.Severe` has the parent chain
//! `Status.Burning` -> `Status`. A tag is only ever created by a
//! [`TagRegistry`], which interns every ancestor along the way, so the parent
//! chain of any tag is always complete and acyclic.

use crate::TagError;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// How a tag operation treats the ancestors of the tags it is given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MatchPolicy {
    /// Only the named tag itself
    #[default]
    Explicit,

    /// The named tag and every one of its ancestors
    IncludeParents,
}

impl MatchPolicy {
    /// Get the policy name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchPolicy::Explicit => "explicit",
            MatchPolicy::IncludeParents => "include_parents",
        }
    }

    /// Parse a policy from a string
    ///
    /// Accepts both `include_parents` and `include-parents`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "explicit" => Some(MatchPolicy::Explicit),
            "include_parents" | "parents" => Some(MatchPolicy::IncludeParents),
            _ => None,
        }
    }
}

impl std::str::FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid match policy: {}", s))
    }
}

struct TagNode {
    name: String,
    parent: Option<Tag>,
    depth: usize,
}

/// An interned hierarchical tag
///
/// Cloning is cheap. Equality and hashing use the identity of the interned
/// node, so two tags with the same name from different registries are not
/// equal.
#[derive(Clone)]
pub struct Tag(Arc<TagNode>);

impl Tag {
    /// Full dotted name of the tag
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Last segment of the name (`Severe` for `Status.Burning.Severe`)
    pub fn leaf(&self) -> &str {
        self.0.name.rsplit('.').next().unwrap_or(&self.0.name)
    }

    /// Immediate parent, `None` for a root tag
    pub fn parent(&self) -> Option<&Tag> {
        self.0.parent.as_ref()
    }

    /// Number of segments in the name (a root tag has depth 1)
    pub fn depth(&self) -> usize {
        self.0.depth
    }

    /// Whether this tag has no parent
    pub fn is_root(&self) -> bool {
        self.0.parent.is_none()
    }

    /// Iterate over the ancestors of this tag, nearest first, excluding itself
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors {
            next: self.parent(),
        }
    }

    /// Iterate over this tag followed by its ancestors, nearest first
    pub fn with_ancestors(&self) -> Ancestors<'_> {
        Ancestors { next: Some(self) }
    }

    /// Check if this tag is a strict ancestor of `other`
    pub fn is_ancestor_of(&self, other: &Tag) -> bool {
        other.ancestors().any(|ancestor| ancestor == self)
    }

    /// Check if this tag is `other` or lies underneath it
    ///
    /// `Status.Burning.Severe` matches `Status.Burning` and `Status`, but not
    /// the other way round.
    pub fn matches(&self, other: &Tag) -> bool {
        self.with_ancestors().any(|tag| tag == other)
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Tag").field(&self.0.name).finish()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

/// Iterator over a tag's parent chain
pub struct Ancestors<'a> {
    next: Option<&'a Tag>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Tag;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent();
        Some(current)
    }
}

/// Interns tags by name
///
/// The registry is an ordinary value owned by whoever sets up the game or
/// simulation; pass it by reference to whatever needs to create tags.
#[derive(Debug, Default)]
pub struct TagRegistry {
    by_name: HashMap<String, Tag>,
    order: Vec<Tag>,
}

impl TagRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a tag and any ancestors that do not exist yet
    ///
    /// # Errors
    /// Returns error if the name is empty, has an empty segment, or a segment
    /// contains whitespace
    pub fn request(&mut self, name: &str) -> Result<Tag, TagError> {
        if let Some(tag) = self.by_name.get(name) {
            return Ok(tag.clone());
        }

        validate_name(name)?;

        let mut parent: Option<Tag> = None;
        let mut end = 0;
        for (index, segment) in name.split('.').enumerate() {
            end = if index == 0 { segment.len() } else { end + 1 + segment.len() };
            let path = &name[..end];

            let tag = match self.by_name.get(path) {
                Some(existing) => existing.clone(),
                None => {
                    let tag = Tag(Arc::new(TagNode {
                        name: path.to_string(),
                        parent: parent.take(),
                        depth: index + 1,
                    }));
                    self.by_name.insert(path.to_string(), tag.clone());
                    self.order.push(tag.clone());
                    tag
                }
            };
            parent = Some(tag);
        }

        parent.ok_or(TagError::Empty)
    }

    /// Intern several tags at once, collecting them into a [`TagSet`](crate::TagSet)
    pub fn request_all<I, S>(&mut self, names: I) -> Result<crate::TagSet, TagError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| self.request(name.as_ref()))
            .collect()
    }

    /// Look up an already interned tag without creating it
    pub fn find(&self, name: &str) -> Option<Tag> {
        self.by_name.get(name).cloned()
    }

    /// Number of interned tags, ancestors included
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no tag has been interned yet
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate over interned tags in creation order
    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.order.iter()
    }
}

fn validate_name(name: &str) -> Result<(), TagError> {
    if name.is_empty() {
        return Err(TagError::Empty);
    }

    let invalid = |reason: &str| TagError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    for segment in name.split('.') {
        if segment.is_empty() {
            return Err(invalid("empty segment"));
        }
        if segment.chars().any(char::is_whitespace) {
            return Err(invalid("segments cannot contain whitespace"));
        }
    }

    Ok(())
}
