//! Tag requirement evaluation

use tagsense_domain::{MatchPolicy, TagSet, TagSnapshot};

/// "All of these, none of those" predicate over a tag snapshot
///
/// An empty required set is always satisfied and an empty ignored set never
/// excludes anything, so `TagRequirements::default()` matches every snapshot.
///
/// # Examples
///
/// ```
/// use tagsense_domain::{TagRegistry, TagSet};
/// use tagsense_tags::TagRequirements;
///
/// let mut registry = TagRegistry::new();
/// let required = registry.request_all(["State.Alert"]).unwrap();
/// let ignored = registry.request_all(["State.Stunned"]).unwrap();
/// let requirements = TagRequirements::new(required, ignored);
///
/// let alert = registry.request_all(["State.Alert"]).unwrap();
/// let stunned = registry.request_all(["State.Alert", "State.Stunned"]).unwrap();
/// assert!(requirements.matches(&alert));
/// assert!(!requirements.matches(&stunned));
/// assert!(!requirements.matches(&TagSet::new()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagRequirements {
    required: TagSet,
    ignored: TagSet,
    policy: MatchPolicy,
}

impl TagRequirements {
    /// Create requirements queried with [`MatchPolicy::Explicit`]
    pub fn new(required: TagSet, ignored: TagSet) -> Self {
        Self {
            required,
            ignored,
            policy: MatchPolicy::Explicit,
        }
    }

    /// Use a different policy when querying snapshots
    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Tags that must all be present
    pub fn required(&self) -> &TagSet {
        &self.required
    }

    /// Tags of which none may be present
    pub fn ignored(&self) -> &TagSet {
        &self.ignored
    }

    /// Policy used for snapshot queries
    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Whether both sets are empty
    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.ignored.is_empty()
    }

    /// Evaluate against a snapshot
    pub fn matches<S: TagSnapshot + ?Sized>(&self, snapshot: &S) -> bool {
        snapshot.has_all_tags(&self.required, self.policy, true)
            && !snapshot.has_any_tags(&self.ignored, self.policy, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TagCounter;
    use tagsense_domain::TagRegistry;

    #[test]
    fn test_empty_requirements_match_everything() {
        let mut registry = TagRegistry::new();
        let requirements = TagRequirements::default();
        assert!(requirements.is_empty());
        assert!(requirements.matches(&TagSet::new()));
        assert!(requirements.matches(&registry.request_all(["A"]).unwrap()));
    }

    #[test]
    fn test_required_and_ignored() {
        let mut registry = TagRegistry::new();
        let requirements = TagRequirements::new(
            registry.request_all(["A", "B"]).unwrap(),
            registry.request_all(["C"]).unwrap(),
        );

        assert!(requirements.matches(&registry.request_all(["A", "B"]).unwrap()));
        assert!(requirements.matches(&registry.request_all(["A", "B", "D"]).unwrap()));
        assert!(!requirements.matches(&registry.request_all(["A"]).unwrap()));
        assert!(!requirements.matches(&registry.request_all(["A", "B", "C"]).unwrap()));
    }

    #[test]
    fn test_only_ignored() {
        let mut registry = TagRegistry::new();
        let requirements =
            TagRequirements::new(TagSet::new(), registry.request_all(["Dead"]).unwrap());

        assert!(requirements.matches(&TagSet::new()));
        assert!(!requirements.matches(&registry.request_all(["Dead"]).unwrap()));
    }

    #[test]
    fn test_policy_is_used_for_queries() {
        let mut registry = TagRegistry::new();
        let snapshot = registry.request_all(["Status"]).unwrap();
        let required = registry.request_all(["Status.Burning"]).unwrap();

        let explicit = TagRequirements::new(required.clone(), TagSet::new());
        let parents = explicit.clone().with_policy(MatchPolicy::IncludeParents);

        assert!(!explicit.matches(&snapshot));
        assert!(parents.matches(&snapshot));
        assert_eq!(parents.policy(), MatchPolicy::IncludeParents);
    }

    #[test]
    fn test_matches_is_pure() {
        let mut registry = TagRegistry::new();
        let tags = registry.request_all(["A"]).unwrap();
        let requirements = TagRequirements::new(tags.clone(), TagSet::new());

        let mut counter = TagCounter::new();
        counter.add_tags(&tags, MatchPolicy::Explicit);

        let before = requirements.clone();
        let first = requirements.matches(&counter);
        let second = requirements.matches(&counter);

        assert_eq!(first, second);
        assert_eq!(requirements, before);
        assert_eq!(counter.snapshot(), tags);
    }
}
