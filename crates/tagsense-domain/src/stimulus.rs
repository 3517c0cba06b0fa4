//! Team broadcast events and the stimuli derived from them

use crate::{ActorId, Location, SenseId, TeamId};

/// An event one actor broadcasts to nearby teammates
///
/// Typical use: a guard that spotted an intruder tells everyone on its team
/// within `range` where the intruder was last seen. Events live for at most
/// one update cycle of the sense they are registered with.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamStimulusEvent {
    /// Actor that broadcast the event
    pub broadcaster: ActorId,

    /// Actor the event is about
    pub enemy: ActorId,

    /// Team of the broadcaster; only listeners of the same team receive it
    pub team: TeamId,

    /// Where the enemy was last seen
    pub last_known_location: Location,

    /// Where the broadcast originated
    pub broadcast_location: Location,

    /// Squared delivery range around `broadcast_location`
    pub range_sq: f32,

    /// Seconds between the event happening and it being broadcast
    pub information_age: f32,
}

impl TeamStimulusEvent {
    /// Create an event with a plain (unsquared) range
    ///
    /// The last known location defaults to the broadcast location and the
    /// information age to zero.
    pub fn new(
        broadcaster: ActorId,
        team: TeamId,
        enemy: ActorId,
        broadcast_location: Location,
        range: f32,
    ) -> Self {
        Self {
            broadcaster,
            enemy,
            team,
            last_known_location: broadcast_location,
            broadcast_location,
            range_sq: range * range,
            information_age: 0.0,
        }
    }

    /// Set where the enemy was last seen
    pub fn with_last_known_location(mut self, location: Location) -> Self {
        self.last_known_location = location;
        self
    }

    /// Replace the delivery range with an already squared threshold
    pub fn with_range_squared(mut self, range_sq: f32) -> Self {
        self.range_sq = range_sq;
        self
    }

    /// Set how old the information already is
    pub fn with_information_age(mut self, age: f32) -> Self {
        self.information_age = age;
        self
    }

    /// Whether a listener at `location` is inside the delivery range
    pub fn reaches(&self, location: &Location) -> bool {
        self.broadcast_location.dist_squared(location) <= self.range_sq
    }
}

/// Outcome carried by a delivered stimulus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensingResult {
    /// The sense picked the target up
    Succeeded,

    /// The sense lost the target
    Failed,
}

/// A listener-specific notification derived from a broadcast event
#[derive(Debug, Clone, PartialEq)]
pub struct Stimulus {
    /// Sense that produced the stimulus
    pub sense: SenseId,

    /// Stimulus strength
    pub strength: f32,

    /// Where the target is believed to be
    pub stimulus_location: Location,

    /// Where the broadcast that produced this stimulus came from
    pub broadcast_location: Location,

    /// Sensing outcome
    pub result: SensingResult,

    /// Seconds since the underlying event happened
    pub age: f32,

    /// Actor the stimulus is about
    pub target: ActorId,

    /// Actor whose broadcast produced the stimulus
    pub broadcaster: ActorId,
}

impl Stimulus {
    /// Derive a successful stimulus from a team event
    pub fn from_event(sense: SenseId, strength: f32, event: &TeamStimulusEvent) -> Self {
        Self {
            sense,
            strength,
            stimulus_location: event.last_known_location,
            broadcast_location: event.broadcast_location,
            result: SensingResult::Succeeded,
            age: event.information_age,
            target: event.enemy,
            broadcaster: event.broadcaster,
        }
    }

    /// Whether the sense succeeded
    pub fn is_successful(&self) -> bool {
        self.result == SensingResult::Succeeded
    }
}
