//! Trait definitions for the seams between components
//!
//! `TagSnapshot` is implemented by anything that can answer "is this tag
//! present"; `PollScheduler` is implemented by whatever drives a sense's
//! update loop.

use crate::{MatchPolicy, Tag, TagSet};
use std::time::Duration;

/// Read-only view of which tags are currently present
pub trait TagSnapshot {
    /// Check a single tag
    ///
    /// Under [`MatchPolicy::IncludeParents`] the query also succeeds when any
    /// ancestor of `tag` is present.
    fn has_tag(&self, tag: &Tag, policy: MatchPolicy) -> bool;

    /// Check that every tag in `tags` is present
    ///
    /// An empty query returns `empty_set_matches`.
    fn has_all_tags(&self, tags: &TagSet, policy: MatchPolicy, empty_set_matches: bool) -> bool {
        if tags.is_empty() {
            return empty_set_matches;
        }
        tags.iter().all(|tag| self.has_tag(tag, policy))
    }

    /// Check that at least one tag in `tags` is present
    ///
    /// An empty query returns `empty_set_matches`.
    fn has_any_tags(&self, tags: &TagSet, policy: MatchPolicy, empty_set_matches: bool) -> bool {
        if tags.is_empty() {
            return empty_set_matches;
        }
        tags.iter().any(|tag| self.has_tag(tag, policy))
    }
}

/// What a sense wants from its scheduler after an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextUpdate {
    /// Do not poll again until an immediate update is requested
    Suspend,

    /// Poll again after the given delay
    After(Duration),
}

/// Scheduler collaborator that drives a sense's `update`
///
/// Implemented by the perception drivers (a manual request counter and a
/// tokio-backed wake handle).
pub trait PollScheduler: Send + Sync {
    /// Schedule an update as soon as possible, bypassing any interval
    ///
    /// Legal at any time, including while the sense is suspended.
    fn request_immediate_update(&self);
}
