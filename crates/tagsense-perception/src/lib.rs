//! Tagsense Perception
//!
//! Proximity-filtered team broadcasts and the schedulers that drive them.
//!
//! # Overview
//!
//! A [`TeamSense`] buffers [`TeamStimulusEvent`](tagsense_domain::TeamStimulusEvent)s
//! and, on each update, delivers a [`Stimulus`](tagsense_domain::Stimulus) to every
//! registered listener that:
//! - is interested in the sense,
//! - has a known location,
//! - belongs to the broadcasting team, and
//! - stands within the event's squared range of the broadcast location.
//!
//! The buffer is emptied by every update, so each event is delivered at most
//! once per listener.
//!
//! # Scheduling
//!
//! Registering an event calls
//! [`PollScheduler::request_immediate_update`](tagsense_domain::PollScheduler) on
//! the scheduler the sense was built with. Two schedulers are provided:
//!
//! | Scheduler | Driver |
//! |-----------|--------|
//! | [`ManualScheduler`] | Caller polls `is_requested` / `take_pending` and calls `update` |
//! | [`WakeHandle`] | [`SenseWorker`] waits on it inside a tokio task |
//!
//! # Usage
//!
//! ## Synchronous
//!
//! ```
//! use std::sync::Arc;
//! use tagsense_domain::{ActorId, Location, SenseSet, TeamId, TeamStimulusEvent};
//! use tagsense_perception::{ManualScheduler, SenseConfig, TeamSense};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let scheduler = Arc::new(ManualScheduler::new());
//! let mut sense = TeamSense::new(SenseConfig::default(), scheduler.clone())?;
//! let senses = SenseSet::of(sense.sense_id());
//! let guard = sense.add_listener(ActorId::new(), TeamId::new(1), Some(Location::ORIGIN), senses);
//!
//! sense.register_event(TeamStimulusEvent::new(
//!     ActorId::new(),
//!     TeamId::new(1),
//!     ActorId::new(),
//!     Location::new(3.0, 4.0, 0.0),
//!     10.0,
//! ));
//!
//! if scheduler.take_pending() > 0 {
//!     sense.update();
//! }
//! assert_eq!(sense.drain_stimuli(guard)?.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Background Worker
//!
//! ```no_run
//! use tagsense_perception::{SenseConfig, SenseWorker};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut worker = SenseWorker::new(SenseConfig::bounded(256))?;
//!     let _events = worker.sender();
//!
//!     // Run until Ctrl+C
//!     worker.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! sense_index = 0
//! stimulus_strength = 1.0
//! max_pending_events = 0
//! log_deliveries = false
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod listener;
mod metrics;
mod scheduler;
mod team_sense;
mod worker;

pub use config::SenseConfig;
pub use error::PerceptionError;
pub use listener::{ListenerId, PerceptionListener};
pub use metrics::SenseMetrics;
pub use scheduler::{ManualScheduler, WakeHandle};
pub use team_sense::{SenseState, TeamSense};
pub use worker::{EventSender, SenseWorker};
