//! tagsense Domain Layer
//!
//! Value types and trait seams shared by the tag counting and perception crates.
//! Apart from UUID generation and error derives it has no external dependencies
//! and holds no process-wide state: every registry or scheduler is an explicit
//! object handed to the code that needs it.
//!
//! ## Key Concepts
//!
//! - **Tag**: an interned, hierarchical label such as `Status.Burning.Severe`
//! - **TagRegistry**: the context object that interns tags and their ancestors
//! - **TagSet**: an ordered, de-duplicated group of tags (also a tag snapshot)
//! - **MatchPolicy**: whether a query or mutation also touches ancestor tags
//! - **Stimulus events**: team broadcasts and the stimuli derived from them
//! - **PollScheduler**: the pull-based contract a sense uses to ask for updates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod actor;
pub mod error;
pub mod location;
pub mod sense;
pub mod stimulus;
pub mod tag;
pub mod tag_set;
pub mod traits;

// Re-exports for convenience
pub use actor::{ActorId, TeamId};
pub use error::TagError;
pub use location::Location;
pub use sense::{SenseId, SenseSet};
pub use stimulus::{SensingResult, Stimulus, TeamStimulusEvent};
pub use tag::{MatchPolicy, Tag, TagRegistry};
pub use tag_set::TagSet;
pub use traits::{NextUpdate, PollScheduler, TagSnapshot};
