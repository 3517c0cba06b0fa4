//! Reference-counted tag container with zero-crossing notifications

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use tagsense_domain::{MatchPolicy, Tag, TagSet, TagSnapshot};

type TagObserver = Box<dyn FnMut(&Tag, i32) + Send>;

/// Handle returned when registering an observer, used to remove it again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverHandle(u64);

/// Counts how many independent reasons keep each tag active
///
/// Counts never go below zero: removing a tag more often than it was added is
/// clamped silently. Observers fire only when a count moves from zero to a
/// positive value or back, never on changes that stay on the same side.
///
/// Bulk operations apply every count change first and notify afterwards, so
/// an observer always sees the counter in its post-batch state and receives
/// the final count of the tag.
///
/// # Examples
///
/// ```
/// use tagsense_domain::{MatchPolicy, TagRegistry};
/// use tagsense_tags::TagCounter;
///
/// let mut registry = TagRegistry::new();
/// let tags = registry.request_all(["A.B.C"]).unwrap();
/// let a = registry.request("A").unwrap();
///
/// let mut counter = TagCounter::new();
/// counter.add_tags(&tags, MatchPolicy::IncludeParents);
/// counter.add_tags(&tags, MatchPolicy::IncludeParents);
/// assert_eq!(counter.count(&a), 2);
///
/// counter.remove_tags(&tags, MatchPolicy::IncludeParents);
/// assert_eq!(counter.count(&a), 1);
/// ```
#[derive(Default)]
pub struct TagCounter {
    counts: HashMap<Tag, i32>,
    order: Vec<Tag>,
    any_observers: Vec<(ObserverHandle, TagObserver)>,
    tag_observers: HashMap<Tag, Vec<(ObserverHandle, TagObserver)>>,
    next_handle: u64,
}

impl TagCounter {
    /// Create an empty counter
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one reference to each tag in `tags`
    pub fn add_tags(&mut self, tags: &TagSet, policy: MatchPolicy) {
        self.update_tags(tags, 1, policy);
    }

    /// Remove one reference from each tag in `tags`
    pub fn remove_tags(&mut self, tags: &TagSet, policy: MatchPolicy) {
        self.update_tags(tags, -1, policy);
    }

    /// Apply `delta` to a single tag
    pub fn update_tag(&mut self, tag: &Tag, delta: i32, policy: MatchPolicy) {
        if delta == 0 {
            return;
        }
        let mut crossed = Vec::new();
        self.apply(tag, delta, policy, &mut crossed);
        self.notify(crossed);
    }

    /// Apply `delta` to every tag in `tags`, then notify
    ///
    /// Under [`MatchPolicy::IncludeParents`] the delta also lands on every
    /// ancestor, once per member whose chain contains it.
    ///
    /// Observers receive each tag's count after the whole batch, not the count
    /// at the moment it crossed zero: adding `A.B` and `A.C` together under
    /// `IncludeParents` reports `A` once, with a count of 2.
    pub fn update_tags(&mut self, tags: &TagSet, delta: i32, policy: MatchPolicy) {
        if delta == 0 {
            return;
        }
        let mut crossed = Vec::new();
        for tag in tags {
            self.apply(tag, delta, policy, &mut crossed);
        }
        self.notify(crossed);
    }

    /// Current count of a tag, zero if it was never added
    pub fn count(&self, tag: &Tag) -> i32 {
        self.counts.get(tag).copied().unwrap_or(0)
    }

    /// Tags with a positive count, in the order they were first added
    pub fn active_tags(&self) -> impl Iterator<Item = (&Tag, i32)> {
        self.order.iter().filter_map(|tag| {
            let count = self.count(tag);
            (count > 0).then_some((tag, count))
        })
    }

    /// Snapshot of the active tags
    pub fn snapshot(&self) -> TagSet {
        self.active_tags().map(|(tag, _)| tag.clone()).collect()
    }

    /// Number of tags with a positive count
    pub fn len(&self) -> usize {
        self.active_tags().count()
    }

    /// Whether no tag is active
    pub fn is_empty(&self) -> bool {
        self.counts.values().all(|count| *count == 0)
    }

    /// Register an observer for zero crossings of any tag
    pub fn on_any_tag_changed<F>(&mut self, observer: F) -> ObserverHandle
    where
        F: FnMut(&Tag, i32) + Send + 'static,
    {
        let handle = self.next_handle();
        self.any_observers.push((handle, Box::new(observer)));
        handle
    }

    /// Register an observer for zero crossings of one tag
    pub fn on_tag_changed<F>(&mut self, tag: &Tag, observer: F) -> ObserverHandle
    where
        F: FnMut(&Tag, i32) + Send + 'static,
    {
        let handle = self.next_handle();
        self.tag_observers
            .entry(tag.clone())
            .or_default()
            .push((handle, Box::new(observer)));
        handle
    }

    /// Remove an observer, returning `false` if the handle is unknown
    pub fn remove_observer(&mut self, handle: ObserverHandle) -> bool {
        let before = self.any_observers.len();
        self.any_observers.retain(|(h, _)| *h != handle);
        if self.any_observers.len() != before {
            return true;
        }

        let mut removed = false;
        self.tag_observers.retain(|_, observers| {
            let before = observers.len();
            observers.retain(|(h, _)| *h != handle);
            removed |= observers.len() != before;
            !observers.is_empty()
        });
        removed
    }

    fn next_handle(&mut self) -> ObserverHandle {
        self.next_handle += 1;
        ObserverHandle(self.next_handle)
    }

    fn apply(&mut self, tag: &Tag, delta: i32, policy: MatchPolicy, crossed: &mut Vec<Tag>) {
        match policy {
            MatchPolicy::Explicit => self.apply_one(tag, delta, crossed),
            MatchPolicy::IncludeParents => {
                for tag in tag.with_ancestors() {
                    self.apply_one(tag, delta, crossed);
                }
            }
        }
    }

    fn apply_one(&mut self, tag: &Tag, delta: i32, crossed: &mut Vec<Tag>) {
        let count = match self.counts.entry(tag.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                if delta < 0 {
                    tracing::trace!(tag = %tag, delta, "Ignoring removal of a tag that was never added");
                    return;
                }
                self.order.push(tag.clone());
                entry.insert(0)
            }
        };

        let previous = *count;
        let raw = previous.saturating_add(delta);
        if raw < 0 {
            tracing::trace!(tag = %tag, previous, delta, "Tag count clamped at zero");
        }
        *count = raw.max(0);

        if (previous == 0) != (*count == 0) && !crossed.contains(tag) {
            crossed.push(tag.clone());
        }
    }

    fn notify(&mut self, crossed: Vec<Tag>) {
        for tag in crossed {
            let count = self.count(&tag);
            tracing::trace!(tag = %tag, count, "Tag count crossed zero");

            for (_, observer) in self.any_observers.iter_mut() {
                observer(&tag, count);
            }
            if let Some(observers) = self.tag_observers.get_mut(&tag) {
                for (_, observer) in observers.iter_mut() {
                    observer(&tag, count);
                }
            }
        }
    }
}

impl TagSnapshot for TagCounter {
    fn has_tag(&self, tag: &Tag, policy: MatchPolicy) -> bool {
        match policy {
            MatchPolicy::Explicit => self.count(tag) > 0,
            MatchPolicy::IncludeParents => tag.with_ancestors().any(|t| self.count(t) > 0),
        }
    }
}

impl fmt::Debug for TagCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active: Vec<(&str, i32)> = self
            .active_tags()
            .map(|(tag, count)| (tag.name(), count))
            .collect();
        let tag_observers: usize = self.tag_observers.values().map(Vec::len).sum();

        f.debug_struct("TagCounter")
            .field("active", &active)
            .field("any_observers", &self.any_observers.len())
            .field("tag_observers", &tag_observers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tagsense_domain::TagRegistry;

    type Log = Arc<Mutex<Vec<(String, i32)>>>;

    fn recorder(log: &Log) -> impl FnMut(&Tag, i32) + Send + 'static {
        let log = Arc::clone(log);
        move |tag, count| log.lock().unwrap().push((tag.name().to_string(), count))
    }

    fn events(log: &Log) -> Vec<(String, i32)> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn test_explicit_add_and_remove() {
        let mut registry = TagRegistry::new();
        let tags = registry.request_all(["A.B"]).unwrap();
        let ab = registry.find("A.B").unwrap();
        let a = registry.find("A").unwrap();

        let mut counter = TagCounter::new();
        counter.add_tags(&tags, MatchPolicy::Explicit);
        assert_eq!(counter.count(&ab), 1);
        assert_eq!(counter.count(&a), 0);

        counter.remove_tags(&tags, MatchPolicy::Explicit);
        assert_eq!(counter.count(&ab), 0);
        assert!(counter.is_empty());
    }

    #[test]
    fn test_include_parents_is_symmetric() {
        let mut registry = TagRegistry::new();
        let tags = registry.request_all(["A.B.C"]).unwrap();

        let mut counter = TagCounter::new();
        counter.add_tags(&tags, MatchPolicy::IncludeParents);
        for name in ["A.B.C", "A.B", "A"] {
            assert_eq!(counter.count(&registry.find(name).unwrap()), 1, "{}", name);
        }

        counter.remove_tags(&tags, MatchPolicy::IncludeParents);
        for name in ["A.B.C", "A.B", "A"] {
            assert_eq!(counter.count(&registry.find(name).unwrap()), 0, "{}", name);
        }
    }

    #[test]
    fn test_asymmetric_policies_leave_parent_counted() {
        let mut registry = TagRegistry::new();
        let tags = registry.request_all(["A.B"]).unwrap();

        let mut counter = TagCounter::new();
        counter.add_tags(&tags, MatchPolicy::IncludeParents);
        counter.remove_tags(&tags, MatchPolicy::Explicit);

        assert_eq!(counter.count(&registry.find("A").unwrap()), 1);
        assert_eq!(counter.count(&registry.find("A.B").unwrap()), 0);
    }

    #[test]
    fn test_over_removal_is_clamped_without_error() {
        let mut registry = TagRegistry::new();
        let tags = registry.request_all(["A"]).unwrap();
        let a = registry.find("A").unwrap();

        let mut counter = TagCounter::new();
        counter.add_tags(&tags, MatchPolicy::Explicit);
        counter.remove_tags(&tags, MatchPolicy::Explicit);
        counter.remove_tags(&tags, MatchPolicy::Explicit);
        counter.remove_tags(&tags, MatchPolicy::Explicit);
        assert_eq!(counter.count(&a), 0);

        // A clamped count starts from zero again rather than paying off a debt
        counter.add_tags(&tags, MatchPolicy::Explicit);
        assert_eq!(counter.count(&a), 1);
    }

    #[test]
    fn test_removing_unknown_tag_does_not_fire() {
        let mut registry = TagRegistry::new();
        let tags = registry.request_all(["Ghost"]).unwrap();
        let log = Log::default();

        let mut counter = TagCounter::new();
        counter.on_any_tag_changed(recorder(&log));
        counter.remove_tags(&tags, MatchPolicy::Explicit);

        assert!(events(&log).is_empty());
        assert_eq!(counter.active_tags().count(), 0);
    }

    #[test]
    fn test_callbacks_fire_only_on_zero_crossings() {
        let mut registry = TagRegistry::new();
        let tags = registry.request_all(["A"]).unwrap();
        let log = Log::default();

        let mut counter = TagCounter::new();
        counter.on_any_tag_changed(recorder(&log));

        counter.add_tags(&tags, MatchPolicy::Explicit); // 0 -> 1
        counter.add_tags(&tags, MatchPolicy::Explicit); // 1 -> 2
        counter.remove_tags(&tags, MatchPolicy::Explicit); // 2 -> 1
        counter.remove_tags(&tags, MatchPolicy::Explicit); // 1 -> 0
        counter.remove_tags(&tags, MatchPolicy::Explicit); // 0 -> 0

        assert_eq!(
            events(&log),
            vec![("A".to_string(), 1), ("A".to_string(), 0)]
        );
    }

    #[test]
    fn test_large_delta_crosses_once() {
        let mut registry = TagRegistry::new();
        let a = registry.request("A").unwrap();
        let log = Log::default();

        let mut counter = TagCounter::new();
        counter.on_tag_changed(&a, recorder(&log));

        counter.update_tag(&a, 5, MatchPolicy::Explicit);
        counter.update_tag(&a, -3, MatchPolicy::Explicit);
        counter.update_tag(&a, -10, MatchPolicy::Explicit);
        counter.update_tag(&a, 0, MatchPolicy::Explicit);

        assert_eq!(
            events(&log),
            vec![("A".to_string(), 5), ("A".to_string(), 0)]
        );
    }

    #[test]
    fn test_batch_notifies_with_final_counts() {
        let mut registry = TagRegistry::new();
        let tags = registry.request_all(["A.B", "A.C"]).unwrap();
        let log = Log::default();

        let mut counter = TagCounter::new();
        counter.on_any_tag_changed(recorder(&log));
        counter.add_tags(&tags, MatchPolicy::IncludeParents);

        assert_eq!(
            events(&log),
            vec![
                ("A.B".to_string(), 1),
                ("A".to_string(), 2),
                ("A.C".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_per_tag_observer_only_sees_its_tag() {
        let mut registry = TagRegistry::new();
        let tags = registry.request_all(["A", "B"]).unwrap();
        let b = registry.find("B").unwrap();
        let log = Log::default();

        let mut counter = TagCounter::new();
        counter.on_tag_changed(&b, recorder(&log));
        counter.add_tags(&tags, MatchPolicy::Explicit);

        assert_eq!(events(&log), vec![("B".to_string(), 1)]);
    }

    #[test]
    fn test_any_observer_fires_before_tag_observer() {
        let mut registry = TagRegistry::new();
        let a = registry.request("A").unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut counter = TagCounter::new();
        let tag_order = Arc::clone(&order);
        counter.on_tag_changed(&a, move |_, _| tag_order.lock().unwrap().push("tag"));
        let any_order = Arc::clone(&order);
        counter.on_any_tag_changed(move |_, _| any_order.lock().unwrap().push("any"));

        counter.update_tag(&a, 1, MatchPolicy::Explicit);
        assert_eq!(*order.lock().unwrap(), vec!["any", "tag"]);
    }

    #[test]
    fn test_remove_observer() {
        let mut registry = TagRegistry::new();
        let a = registry.request("A").unwrap();
        let log = Log::default();

        let mut counter = TagCounter::new();
        let any = counter.on_any_tag_changed(recorder(&log));
        let specific = counter.on_tag_changed(&a, recorder(&log));

        assert!(counter.remove_observer(any));
        assert!(counter.remove_observer(specific));
        assert!(!counter.remove_observer(specific));

        counter.update_tag(&a, 1, MatchPolicy::Explicit);
        assert!(events(&log).is_empty());
    }

    #[test]
    fn test_queries() {
        let mut registry = TagRegistry::new();
        let present = registry.request_all(["Status.Burning"]).unwrap();
        let severe = registry.request("Status.Burning.Severe").unwrap();
        let frozen = registry.request("Status.Frozen").unwrap();
        let burning = registry.find("Status.Burning").unwrap();

        let mut counter = TagCounter::new();
        counter.add_tags(&present, MatchPolicy::Explicit);

        assert!(counter.has_tag(&burning, MatchPolicy::Explicit));
        assert!(!counter.has_tag(&severe, MatchPolicy::Explicit));
        assert!(counter.has_tag(&severe, MatchPolicy::IncludeParents));
        assert!(!counter.has_tag(&frozen, MatchPolicy::IncludeParents));

        let both: TagSet = [burning.clone(), frozen.clone()].into_iter().collect();
        assert!(!counter.has_all_tags(&both, MatchPolicy::Explicit, true));
        assert!(counter.has_any_tags(&both, MatchPolicy::Explicit, false));
        assert!(counter.has_all_tags(&TagSet::from(burning), MatchPolicy::Explicit, false));

        assert!(counter.has_all_tags(&TagSet::new(), MatchPolicy::Explicit, true));
        assert!(!counter.has_all_tags(&TagSet::new(), MatchPolicy::Explicit, false));
        assert!(counter.has_any_tags(&TagSet::new(), MatchPolicy::Explicit, true));
    }

    #[test]
    fn test_snapshot_keeps_first_added_order() {
        let mut registry = TagRegistry::new();
        let b = registry.request("B").unwrap();
        let a = registry.request("A").unwrap();

        let mut counter = TagCounter::new();
        counter.update_tag(&b, 1, MatchPolicy::Explicit);
        counter.update_tag(&a, 1, MatchPolicy::Explicit);
        counter.update_tag(&b, -1, MatchPolicy::Explicit);
        counter.update_tag(&b, 1, MatchPolicy::Explicit);

        assert_eq!(counter.snapshot().to_string(), "B, A");
        assert_eq!(counter.len(), 2);
    }

    #[test]
    fn test_debug_lists_active_tags() {
        let mut registry = TagRegistry::new();
        let a = registry.request("A").unwrap();
        let mut counter = TagCounter::new();
        counter.update_tag(&a, 2, MatchPolicy::Explicit);

        let debug = format!("{:?}", counter);
        assert!(debug.contains("(\"A\", 2)"));
    }
}
