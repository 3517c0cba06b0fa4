//! Integration tests for tagsense-tags
//!
//! These tests exercise the counter and requirement evaluator together, the
//! way gameplay code uses them: effects add and remove tags, abilities check
//! requirements against the live counter.

use std::sync::{Arc, Mutex};
use tagsense_domain::{MatchPolicy, TagRegistry, TagSet};
use tagsense_tags::{TagCounter, TagRequirements, TagSnapshot};

#[test]
fn test_include_parents_supports_ancestor_queries() {
    let mut registry = TagRegistry::new();
    let severe = registry.request_all(["Status.Burning.Severe"]).unwrap();
    let mild = registry.request_all(["Status.Burning.Mild"]).unwrap();
    let burning = registry.find("Status.Burning").unwrap();

    let mut counter = TagCounter::new();
    counter.add_tags(&severe, MatchPolicy::IncludeParents);
    counter.add_tags(&mild, MatchPolicy::IncludeParents);

    // "Is any Status.Burning.* active" is a single ancestor lookup
    assert_eq!(counter.count(&burning), 2);
    assert!(counter.has_tag(&burning, MatchPolicy::Explicit));

    counter.remove_tags(&severe, MatchPolicy::IncludeParents);
    assert!(counter.has_tag(&burning, MatchPolicy::Explicit));

    counter.remove_tags(&mild, MatchPolicy::IncludeParents);
    assert!(!counter.has_tag(&burning, MatchPolicy::Explicit));
}

#[test]
fn test_has_all_tags_on_fully_present_set() {
    let mut registry = TagRegistry::new();
    let tags = registry.request_all(["A", "B.C", "D"]).unwrap();

    let mut counter = TagCounter::new();
    counter.add_tags(&tags, MatchPolicy::Explicit);

    assert!(counter.has_all_tags(&tags, MatchPolicy::Explicit, false));
    assert!(counter.has_any_tags(&tags, MatchPolicy::Explicit, false));
}

#[test]
fn test_empty_query_returns_caller_default() {
    let counter = TagCounter::new();
    let empty = TagSet::new();

    assert!(counter.has_all_tags(&empty, MatchPolicy::Explicit, true));
    assert!(!counter.has_all_tags(&empty, MatchPolicy::IncludeParents, false));
    assert!(counter.has_any_tags(&empty, MatchPolicy::Explicit, true));
    assert!(!counter.has_any_tags(&empty, MatchPolicy::IncludeParents, false));
}

#[test]
fn test_unknown_tag_is_absent() {
    let mut registry = TagRegistry::new();
    let unknown = registry.request("Never.Added").unwrap();
    let counter = TagCounter::new();

    assert_eq!(counter.count(&unknown), 0);
    assert!(!counter.has_tag(&unknown, MatchPolicy::IncludeParents));
}

#[test]
fn test_requirements_track_counter_changes() {
    let mut registry = TagRegistry::new();
    let alert = registry.request_all(["State.Alert"]).unwrap();
    let stunned = registry.request_all(["State.Stunned"]).unwrap();
    let requirements = TagRequirements::new(alert.clone(), stunned.clone());

    let mut counter = TagCounter::new();
    assert!(!requirements.matches(&counter));

    counter.add_tags(&alert, MatchPolicy::Explicit);
    assert!(requirements.matches(&counter));

    counter.add_tags(&stunned, MatchPolicy::Explicit);
    assert!(!requirements.matches(&counter));

    counter.remove_tags(&stunned, MatchPolicy::Explicit);
    assert!(requirements.matches(&counter));

    // The snapshot answers the same as the live counter
    assert!(requirements.matches(&counter.snapshot()));
}

#[test]
fn test_observer_reevaluates_requirements_from_notifications() {
    let mut registry = TagRegistry::new();
    let tags = registry.request_all(["Buff.Haste"]).unwrap();
    let haste = registry.find("Buff.Haste").unwrap();
    let active = Arc::new(Mutex::new(Vec::new()));

    let mut counter = TagCounter::new();
    let sink = Arc::clone(&active);
    counter.on_tag_changed(&haste, move |_, count| sink.lock().unwrap().push(count > 0));

    // Two overlapping sources of the same buff
    counter.add_tags(&tags, MatchPolicy::Explicit);
    counter.add_tags(&tags, MatchPolicy::Explicit);
    counter.remove_tags(&tags, MatchPolicy::Explicit);
    counter.remove_tags(&tags, MatchPolicy::Explicit);

    assert_eq!(*active.lock().unwrap(), vec![true, false]);
}
