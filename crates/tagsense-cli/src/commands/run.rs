//! Run command implementation: replays a scenario file.

use crate::cli::{PolicyArg, RunArgs};
use crate::config::{Scenario, Step};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::mpsc;
use std::sync::Arc;
use tagsense_domain::{
    ActorId, Location, MatchPolicy, SenseSet, TagRegistry, TeamId, TeamStimulusEvent,
};
use tagsense_perception::{ListenerId, ManualScheduler, SenseMetrics, TeamSense};
use tagsense_tags::{TagCounter, TagRequirements};

/// Everything observed while replaying a scenario.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScenarioReport {
    /// Tag zero crossings, in the order observers saw them
    pub transitions: Vec<TagTransition>,
    /// Update steps and whether they ran
    pub updates: Vec<UpdateRecord>,
    /// Stimuli delivered to listeners
    pub deliveries: Vec<Delivery>,
    /// Requirement checks
    pub checks: Vec<CheckRecord>,
    /// Active tags per actor once the replay finished
    pub final_tags: BTreeMap<String, BTreeMap<String, i32>>,
    /// Sense counters
    pub metrics: MetricsRecord,
}

impl ScenarioReport {
    /// Checks whose outcome differs from their `expect`
    pub fn failed_checks(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed()).count()
    }
}

/// A tag crossing zero on one actor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagTransition {
    /// Step number (1-based)
    pub step: usize,
    /// Actor name
    pub actor: String,
    /// Tag name
    pub tag: String,
    /// Count after the step
    pub count: i32,
}

/// Outcome of an `update` step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateRecord {
    /// Step number (1-based)
    pub step: usize,
    /// Update requests pending when the step ran
    pub requests: usize,
    /// Events consumed, zero when the sense was not run
    pub events: usize,
    /// Whether the sense was run
    pub ran: bool,
}

/// A stimulus delivered to an actor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delivery {
    /// Step number (1-based)
    pub step: usize,
    /// Receiving actor
    pub listener: String,
    /// Actor the stimulus is about
    pub target: String,
    /// Broadcasting actor
    pub broadcaster: String,
    /// Where the target was last seen
    pub location: [f32; 3],
    /// Information age in seconds
    pub age: f32,
    /// Stimulus strength
    pub strength: f32,
}

/// Outcome of a `check` step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckRecord {
    /// Step number (1-based)
    pub step: usize,
    /// Actor name
    pub actor: String,
    /// Required tags
    pub require: String,
    /// Ignored tags
    pub ignore: String,
    /// Query policy
    pub policy: PolicyArg,
    /// Whether the requirement matched
    pub matched: bool,
    /// Expected outcome, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<bool>,
}

impl CheckRecord {
    /// Whether the outcome agrees with the expectation (always true without one)
    pub fn passed(&self) -> bool {
        self.expected.map_or(true, |expected| expected == self.matched)
    }
}

/// Serializable subset of [`SenseMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsRecord {
    /// Update cycles run
    pub update_count: usize,
    /// Events registered
    pub events_registered: usize,
    /// Events processed
    pub events_processed: usize,
    /// Events that reached nobody
    pub events_unmatched: usize,
    /// Events dropped from a full buffer
    pub events_dropped: usize,
    /// Stimuli delivered
    pub stimuli_delivered: usize,
    /// Stimuli evicted from full listener inboxes
    pub stimuli_dropped: usize,
    /// Listeners skipped
    pub listeners_skipped: usize,
    /// Human readable summary
    #[serde(skip)]
    pub summary: String,
}

impl From<&SenseMetrics> for MetricsRecord {
    fn from(metrics: &SenseMetrics) -> Self {
        Self {
            update_count: metrics.update_count,
            events_registered: metrics.events_registered,
            events_processed: metrics.events_processed,
            events_unmatched: metrics.events_unmatched,
            events_dropped: metrics.events_dropped,
            stimuli_delivered: metrics.total_delivered(),
            stimuli_dropped: metrics.stimuli_dropped,
            listeners_skipped: metrics.total_skipped(),
            summary: metrics.summary(),
        }
    }
}

struct Actor {
    name: String,
    id: ActorId,
    team: TeamId,
    location: Option<Location>,
    listener: ListenerId,
    tags: TagCounter,
}

struct Crossing {
    actor: String,
    tag: String,
    count: i32,
}

/// Replays scenario steps against one tag counter per actor and a shared team sense.
pub struct Replay {
    registry: TagRegistry,
    scheduler: Arc<ManualScheduler>,
    sense: TeamSense,
    actors: Vec<Actor>,
    by_name: HashMap<String, usize>,
    names: HashMap<ActorId, String>,
    crossings: mpsc::Receiver<Crossing>,
    report: ScenarioReport,
}

impl Replay {
    /// Build the registry, sense and actors a scenario declares.
    pub fn new(scenario: &Scenario) -> Result<Self> {
        let scheduler = Arc::new(ManualScheduler::new());
        let mut sense = TeamSense::new(scenario.sense.clone(), scheduler.clone())?;
        let interested = SenseSet::of(sense.sense_id());
        let (sender, crossings) = mpsc::channel();

        let mut actors = Vec::with_capacity(scenario.listeners.len());
        let mut by_name = HashMap::new();
        let mut names = HashMap::new();

        for spec in &scenario.listeners {
            let id = ActorId::new();
            let team = spec.team.map(TeamId::new).unwrap_or(TeamId::NO_TEAM);
            let location = spec.location.map(Location::from);
            let senses = if spec.interested { interested } else { SenseSet::empty() };
            let listener = sense.add_listener(id, team, location, senses);

            let mut tags = TagCounter::new();
            let sink = sender.clone();
            let actor_name = spec.name.clone();
            tags.on_any_tag_changed(move |tag, count| {
                let _ = sink.send(Crossing {
                    actor: actor_name.clone(),
                    tag: tag.name().to_string(),
                    count,
                });
            });

            by_name.insert(spec.name.clone(), actors.len());
            names.insert(id, spec.name.clone());
            actors.push(Actor {
                name: spec.name.clone(),
                id,
                team,
                location,
                listener,
                tags,
            });
        }

        Ok(Self {
            registry: TagRegistry::new(),
            scheduler,
            sense,
            actors,
            by_name,
            names,
            crossings,
            report: ScenarioReport::default(),
        })
    }

    /// Replay every step and return the report.
    pub fn run(mut self, steps: &[Step]) -> Result<ScenarioReport> {
        tracing::info!(
            actors = self.actors.len(),
            steps = steps.len(),
            "Replaying scenario"
        );

        for (index, step) in steps.iter().enumerate() {
            let number = index + 1;
            tracing::debug!(step = number, op = step.op(), "Replaying step");
            self.apply(number, step)?;
            self.collect_crossings(number);
        }

        for actor in &self.actors {
            let tags = actor
                .tags
                .active_tags()
                .map(|(tag, count)| (tag.name().to_string(), count))
                .collect();
            self.report.final_tags.insert(actor.name.clone(), tags);
        }
        self.report.metrics = MetricsRecord::from(self.sense.metrics());

        Ok(self.report)
    }

    fn apply(&mut self, step: usize, op: &Step) -> Result<()> {
        match op {
            Step::AddTags { actor, tags, policy } => {
                let set = self.registry.request_all(tags.iter().map(String::as_str))?;
                let index = self.actor_index(actor)?;
                self.actors[index].tags.add_tags(&set, (*policy).into());
            }
            Step::RemoveTags { actor, tags, policy } => {
                let set = self.registry.request_all(tags.iter().map(String::as_str))?;
                let index = self.actor_index(actor)?;
                self.actors[index].tags.remove_tags(&set, (*policy).into());
            }
            Step::Event {
                from,
                enemy,
                team,
                at,
                last_known,
                range,
                range_sq,
                age,
            } => {
                let broadcaster = &self.actors[self.actor_index(from)?];
                let team = team.map(TeamId::new).unwrap_or(broadcaster.team);
                let origin = at.map(Location::from).or(broadcaster.location).ok_or_else(|| {
                    CliError::Scenario(format!(
                        "Step {}: '{}' has no location and the event gives no `at`",
                        step, from
                    ))
                })?;
                let threshold = range_sq.or(range.map(|r| r * r)).ok_or_else(|| {
                    CliError::Scenario(format!("Step {}: event needs `range` or `range_sq`", step))
                })?;
                let broadcaster_id = broadcaster.id;

                let enemy = self.actor_id(enemy);
                let mut event = TeamStimulusEvent::new(broadcaster_id, team, enemy, origin, 0.0)
                    .with_range_squared(threshold)
                    .with_information_age(*age);
                if let Some(last_known) = last_known {
                    event = event.with_last_known_location(Location::from(*last_known));
                }
                self.sense.register_event(event);
            }
            Step::Update => self.update(step)?,
            Step::MoveListener { actor, location } => {
                let index = self.actor_index(actor)?;
                let location = location.map(Location::from);
                self.actors[index].location = location;
                self.sense
                    .update_listener_location(self.actors[index].listener, location)?;
            }
            Step::Check {
                actor,
                require,
                ignore,
                policy,
                expect,
            } => {
                let required = self.registry.request_all(require.iter().map(String::as_str))?;
                let ignored = self.registry.request_all(ignore.iter().map(String::as_str))?;
                let requirements =
                    TagRequirements::new(required, ignored).with_policy(MatchPolicy::from(*policy));

                let index = self.actor_index(actor)?;
                let matched = requirements.matches(&self.actors[index].tags);
                let record = CheckRecord {
                    step,
                    actor: actor.clone(),
                    require: requirements.required().to_string(),
                    ignore: requirements.ignored().to_string(),
                    policy: *policy,
                    matched,
                    expected: *expect,
                };
                if !record.passed() {
                    tracing::warn!(step, actor = %actor, matched, "Check did not match expectation");
                }
                self.report.checks.push(record);
            }
        }
        Ok(())
    }

    fn update(&mut self, step: usize) -> Result<()> {
        let requests = self.scheduler.take_pending();
        if requests == 0 {
            self.report.updates.push(UpdateRecord {
                step,
                requests,
                events: 0,
                ran: false,
            });
            return Ok(());
        }

        let events = self.sense.pending_events();
        self.sense.update();
        self.report.updates.push(UpdateRecord {
            step,
            requests,
            events,
            ran: true,
        });

        let mut deliveries = Vec::new();
        for actor in &self.actors {
            for stimulus in self.sense.drain_stimuli(actor.listener)? {
                deliveries.push(Delivery {
                    step,
                    listener: actor.name.clone(),
                    target: self.name_of(stimulus.target),
                    broadcaster: self.name_of(stimulus.broadcaster),
                    location: stimulus.stimulus_location.into(),
                    age: stimulus.age,
                    strength: stimulus.strength,
                });
            }
        }
        self.report.deliveries.extend(deliveries);
        Ok(())
    }

    fn collect_crossings(&mut self, step: usize) {
        for crossing in self.crossings.try_iter() {
            self.report.transitions.push(TagTransition {
                step,
                actor: crossing.actor,
                tag: crossing.tag,
                count: crossing.count,
            });
        }
    }

    fn actor_index(&self, name: &str) -> Result<usize> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| CliError::Scenario(format!("Unknown actor '{}'", name)))
    }

    /// Id of a declared actor, or a stable id for an undeclared one
    fn actor_id(&mut self, name: &str) -> ActorId {
        if let Some(index) = self.by_name.get(name) {
            return self.actors[*index].id;
        }
        if let Some((id, _)) = self.names.iter().find(|(_, n)| n.as_str() == name) {
            return *id;
        }
        let id = ActorId::new();
        self.names.insert(id, name.to_string());
        id
    }

    fn name_of(&self, id: ActorId) -> String {
        self.names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }
}

/// Replay a parsed scenario.
pub fn replay(scenario: &Scenario) -> Result<ScenarioReport> {
    Replay::new(scenario)?.run(&scenario.steps)
}

/// Execute the run command, returning whether every expectation held.
pub fn execute_run(args: RunArgs, formatter: &Formatter) -> Result<bool> {
    let scenario = Scenario::load(&args.scenario)?;
    let report = replay(&scenario)?;

    println!("{}", formatter.format_report(&report)?);

    let failed = report.failed_checks();
    if failed > 0 {
        eprintln!(
            "{}",
            formatter.error(&format!("{} check(s) did not match expectations", failed))
        );
    }
    Ok(failed == 0)
}
