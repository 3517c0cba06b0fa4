//! tagsense Tags
//!
//! Reference-counted tag tracking and tag requirement evaluation.
//!
//! - [`TagCounter`] tracks how many independent reasons currently keep each tag
//!   active and notifies observers only when a count crosses zero.
//! - [`TagRequirements`] is a stateless "all of these, none of those" predicate
//!   evaluated against any [`TagSnapshot`].
//!
//! # Examples
//!
//! ```
//! use tagsense_domain::{MatchPolicy, TagRegistry, TagSet};
//! use tagsense_tags::{TagCounter, TagRequirements, TagSnapshot};
//!
//! let mut registry = TagRegistry::new();
//! let burning = registry.request_all(["Status.Burning.Severe"]).unwrap();
//! let status = registry.request("Status").unwrap();
//!
//! let mut counter = TagCounter::new();
//! counter.add_tags(&burning, MatchPolicy::IncludeParents);
//! assert_eq!(counter.count(&status), 1);
//!
//! let requirements = TagRequirements::new(TagSet::from(status), TagSet::new());
//! assert!(requirements.matches(&counter));
//! ```

#![warn(missing_docs)]

mod counter;
mod requirements;

pub use counter::{ObserverHandle, TagCounter};
pub use requirements::TagRequirements;
pub use tagsense_domain::TagSnapshot;
