//! Scenario files replayed by `tagsense run`.
//!
//! A scenario declares a sense configuration, a set of named actors (each one
//! both a tag holder and a team-sense listener) and an ordered list of steps.
//!
//! ```toml
//! [sense]
//! max_pending_events = 16
//!
//! [[listeners]]
//! name = "guard"
//! team = 1
//! location = [0.0, 0.0, 0.0]
//!
//! [[steps]]
//! op = "add_tags"
//! actor = "guard"
//! tags = ["Status.Alert"]
//! policy = "include-parents"
//!
//! [[steps]]
//! op = "event"
//! from = "guard"
//! enemy = "intruder"
//! range = 10.0
//!
//! [[steps]]
//! op = "update"
//! ```

use crate::cli::PolicyArg;
use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tagsense_perception::SenseConfig;

/// A complete scenario file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    /// Team sense configuration
    #[serde(default)]
    pub sense: SenseConfig,

    /// Actors taking part in the scenario
    #[serde(default)]
    pub listeners: Vec<ListenerSpec>,

    /// Steps replayed in order
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// An actor declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerSpec {
    /// Unique actor name
    pub name: String,

    /// Team id; omitted means no team
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<u8>,

    /// Starting location; omitted means unknown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<[f32; 3]>,

    /// Whether the actor listens to the scenario's sense
    #[serde(default = "default_true")]
    pub interested: bool,
}

/// One replay step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Add tags to an actor's counter
    AddTags {
        /// Actor name
        actor: String,
        /// Tag names
        tags: Vec<String>,
        /// Whether ancestors are counted too
        #[serde(default)]
        policy: PolicyArg,
    },

    /// Remove tags from an actor's counter
    RemoveTags {
        /// Actor name
        actor: String,
        /// Tag names
        tags: Vec<String>,
        /// Whether ancestors are decremented too
        #[serde(default)]
        policy: PolicyArg,
    },

    /// Broadcast a team event
    Event {
        /// Broadcasting actor
        from: String,
        /// Actor the event is about; need not be declared
        enemy: String,
        /// Team override; defaults to the broadcaster's team
        #[serde(default, skip_serializing_if = "Option::is_none")]
        team: Option<u8>,
        /// Broadcast origin; defaults to the broadcaster's location
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at: Option<[f32; 3]>,
        /// Where the enemy was last seen; defaults to the origin of the broadcast
        #[serde(default, skip_serializing_if = "Option::is_none")]
        last_known: Option<[f32; 3]>,
        /// Plain delivery range
        #[serde(default, skip_serializing_if = "Option::is_none")]
        range: Option<f32>,
        /// Squared delivery range, takes precedence over `range`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        range_sq: Option<f32>,
        /// Age of the information in seconds
        #[serde(default)]
        age: f32,
    },

    /// Run the sense if an update was requested
    Update,

    /// Change an actor's cached location; omitting `location` makes it unknown
    MoveListener {
        /// Actor name
        actor: String,
        /// New location
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<[f32; 3]>,
    },

    /// Evaluate a requirement against an actor's tags
    Check {
        /// Actor name
        actor: String,
        /// Tags that must all be present
        #[serde(default)]
        require: Vec<String>,
        /// Tags of which none may be present
        #[serde(default)]
        ignore: Vec<String>,
        /// Query policy
        #[serde(default)]
        policy: PolicyArg,
        /// Expected outcome; a mismatch fails the run
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expect: Option<bool>,
    },
}

impl Step {
    /// Step kind as written in the scenario file
    pub fn op(&self) -> &'static str {
        match self {
            Step::AddTags { .. } => "add_tags",
            Step::RemoveTags { .. } => "remove_tags",
            Step::Event { .. } => "event",
            Step::Update => "update",
            Step::MoveListener { .. } => "move_listener",
            Step::Check { .. } => "check",
        }
    }
}

fn default_true() -> bool {
    true
}

impl Scenario {
    /// Load and validate a scenario file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate a scenario from TOML.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(toml_str)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check that names are unique, steps reference declared actors and
    /// every event has a range.
    pub fn validate(&self) -> Result<()> {
        self.sense.validate()?;

        let mut names = HashSet::new();
        for listener in &self.listeners {
            if !names.insert(listener.name.as_str()) {
                return Err(CliError::Scenario(format!(
                    "Actor '{}' is declared twice",
                    listener.name
                )));
            }
        }

        for (index, step) in self.steps.iter().enumerate() {
            let number = index + 1;
            let actor = match step {
                Step::AddTags { actor, .. }
                | Step::RemoveTags { actor, .. }
                | Step::MoveListener { actor, .. }
                | Step::Check { actor, .. } => Some(actor),
                Step::Event { from, .. } => Some(from),
                Step::Update => None,
            };
            if let Some(actor) = actor {
                if !names.contains(actor.as_str()) {
                    return Err(CliError::Scenario(format!(
                        "Step {} ({}) references unknown actor '{}'",
                        number,
                        step.op(),
                        actor
                    )));
                }
            }

            if let Step::Event { range, range_sq, .. } = step {
                let threshold = range_sq.or(range.map(|r| r * r));
                match threshold {
                    None => {
                        return Err(CliError::Scenario(format!(
                            "Step {} (event) needs `range` or `range_sq`",
                            number
                        )))
                    }
                    Some(value) if !value.is_finite() || value < 0.0 => {
                        return Err(CliError::Scenario(format!(
                            "Step {} (event) has an invalid range",
                            number
                        )))
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(())
    }
}
