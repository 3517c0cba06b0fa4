//! Team sense: proximity-filtered broadcast of stimulus events

use crate::listener::ListenerMap;
use crate::{ListenerId, PerceptionError, PerceptionListener, SenseConfig, SenseMetrics};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tagsense_domain::{
    ActorId, Location, NextUpdate, PollScheduler, SenseId, SenseSet, Stimulus, TeamId,
    TeamStimulusEvent,
};

type StimulusObserver = Box<dyn FnMut(ListenerId, &Stimulus) + Send>;

/// Whether a sense has events waiting for the next update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenseState {
    /// No events buffered
    Idle,

    /// Events buffered, an update has been requested
    Pending,
}

/// Delivers team broadcasts to listeners of the same team within range
///
/// Events are buffered by [`register_event`](Self::register_event), which also
/// asks the scheduler for an immediate update. [`update`](Self::update) matches
/// every buffered event against every interested listener, delivers the
/// resulting stimuli, empties the buffer and asks to stay suspended until the
/// next registration.
///
/// Delivered stimuli go to every [`on_stimulus`](Self::on_stimulus) observer
/// and into the listener's inbox. Inboxes hold at most
/// [`SenseConfig::max_inbox`] stimuli, evicting the oldest; a limit of 0 keeps
/// no inbox at all.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use tagsense_domain::{ActorId, Location, NextUpdate, SenseSet, TeamId, TeamStimulusEvent};
/// use tagsense_perception::{ManualScheduler, SenseConfig, TeamSense};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let scheduler = Arc::new(ManualScheduler::new());
/// let mut sense = TeamSense::new(SenseConfig::default(), scheduler.clone())?;
///
/// let guard = sense.add_listener(
///     ActorId::new(),
///     TeamId::new(1),
///     Some(Location::ORIGIN),
///     SenseSet::of(sense.sense_id()),
/// );
///
/// let event = TeamStimulusEvent::new(
///     ActorId::new(),
///     TeamId::new(1),
///     ActorId::new(),
///     Location::new(5.0, 0.0, 0.0),
///     6.0,
/// );
/// sense.register_event(event);
/// assert!(scheduler.is_requested());
///
/// assert_eq!(sense.update(), NextUpdate::Suspend);
/// assert_eq!(sense.drain_stimuli(guard)?.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct TeamSense {
    config: SenseConfig,
    sense: SenseId,
    scheduler: Arc<dyn PollScheduler>,
    listeners: ListenerMap,
    registered_events: VecDeque<TeamStimulusEvent>,
    observers: Vec<StimulusObserver>,
    metrics: SenseMetrics,
}

impl TeamSense {
    /// Create a sense driven by `scheduler`
    ///
    /// # Errors
    /// Returns error if the configuration does not validate
    pub fn new(
        config: SenseConfig,
        scheduler: Arc<dyn PollScheduler>,
    ) -> Result<Self, PerceptionError> {
        config.validate()?;
        let sense = config.sense_id()?;

        Ok(Self {
            config,
            sense,
            scheduler,
            listeners: ListenerMap::default(),
            registered_events: VecDeque::new(),
            observers: Vec::new(),
            metrics: SenseMetrics::new(),
        })
    }

    /// Sense id listeners must be interested in
    pub fn sense_id(&self) -> SenseId {
        self.sense
    }

    /// Active configuration
    pub fn config(&self) -> &SenseConfig {
        &self.config
    }

    /// Buffer an event and request an immediate update
    pub fn register_event(&mut self, event: TeamStimulusEvent) {
        self.push_event(event);
        self.scheduler.request_immediate_update();
    }

    /// Buffer an event without waking the scheduler
    ///
    /// Used by drivers that are about to run an update anyway.
    pub(crate) fn push_event(&mut self, event: TeamStimulusEvent) {
        let limit = self.config.max_pending_events;
        if limit > 0 && self.registered_events.len() >= limit {
            if let Some(dropped) = self.registered_events.pop_front() {
                tracing::warn!(
                    broadcaster = %dropped.broadcaster,
                    limit,
                    "Event buffer full, dropping oldest event"
                );
                self.metrics.record_drop();
            }
        }

        self.registered_events.push_back(event);
        self.metrics.record_registration();
    }

    /// Number of buffered events
    pub fn pending_events(&self) -> usize {
        self.registered_events.len()
    }

    /// Current buffering state
    pub fn state(&self) -> SenseState {
        if self.registered_events.is_empty() {
            SenseState::Idle
        } else {
            SenseState::Pending
        }
    }

    /// Match buffered events against listeners and deliver stimuli
    ///
    /// Only events buffered when the call starts are processed. Always returns
    /// [`NextUpdate::Suspend`]: this sense is purely event driven.
    pub fn update(&mut self) -> NextUpdate {
        let events: Vec<TeamStimulusEvent> = std::mem::take(&mut self.registered_events).into();
        self.metrics.record_update();

        if events.is_empty() {
            tracing::debug!(sense = %self.sense, "Update with no pending events");
            return NextUpdate::Suspend;
        }

        let mut matched = vec![false; events.len()];
        let mut delivered = 0usize;

        for listener in self.listeners.iter_mut() {
            if !listener.has_sense(self.sense) {
                self.metrics.skipped_uninterested += 1;
                continue;
            }
            let Some(location) = listener.location() else {
                self.metrics.skipped_no_location += 1;
                continue;
            };

            for (index, event) in events.iter().enumerate() {
                if listener.team() != event.team || !event.reaches(&location) {
                    continue;
                }

                let stimulus = Stimulus::from_event(self.sense, self.config.stimulus_strength, event);
                if self.config.log_deliveries {
                    tracing::debug!(
                        listener = %listener.id(),
                        target = %stimulus.target,
                        team = %event.team,
                        "Delivering team stimulus"
                    );
                }
                for observer in self.observers.iter_mut() {
                    observer(listener.id(), &stimulus);
                }
                if let Some(evicted) = listener.register_stimulus(stimulus, self.config.max_inbox) {
                    tracing::warn!(
                        listener = %listener.id(),
                        target = %evicted.target,
                        limit = self.config.max_inbox,
                        "Listener inbox full, dropping oldest stimulus"
                    );
                    self.metrics.record_inbox_drop();
                }

                matched[index] = true;
                delivered += 1;
                self.metrics.record_delivery(event.team);
            }
        }

        let unmatched = matched.iter().filter(|m| !**m).count();
        self.metrics.record_processed(events.len(), unmatched);

        tracing::debug!(
            sense = %self.sense,
            events = events.len(),
            delivered,
            unmatched,
            "Update cycle completed"
        );

        NextUpdate::Suspend
    }

    /// Register a listener
    ///
    /// A listener without a location is kept but skipped by updates until
    /// [`update_listener_location`](Self::update_listener_location) gives it one.
    pub fn add_listener(
        &mut self,
        owner: ActorId,
        team: TeamId,
        location: Option<Location>,
        senses: SenseSet,
    ) -> ListenerId {
        let id = self.listeners.insert(owner, team, location, senses);
        tracing::debug!(listener = %id, owner = %owner, team = %team, "Listener registered");
        id
    }

    /// Unregister a listener, returning it with any undrained stimuli
    pub fn remove_listener(&mut self, id: ListenerId) -> Result<PerceptionListener, PerceptionError> {
        self.listeners
            .remove(id)
            .ok_or(PerceptionError::UnknownListener(id))
    }

    /// Update the cached location of a listener
    pub fn update_listener_location(
        &mut self,
        id: ListenerId,
        location: Option<Location>,
    ) -> Result<(), PerceptionError> {
        self.listener_mut(id)?.set_location(location);
        Ok(())
    }

    /// Move a listener to another team
    pub fn update_listener_team(&mut self, id: ListenerId, team: TeamId) -> Result<(), PerceptionError> {
        self.listener_mut(id)?.set_team(team);
        Ok(())
    }

    /// Replace the senses a listener is interested in
    pub fn set_listener_senses(&mut self, id: ListenerId, senses: SenseSet) -> Result<(), PerceptionError> {
        self.listener_mut(id)?.set_senses(senses);
        Ok(())
    }

    /// Look up a listener
    pub fn listener(&self, id: ListenerId) -> Option<&PerceptionListener> {
        self.listeners.get(id)
    }

    /// Iterate over listeners in registration order
    pub fn listeners(&self) -> impl Iterator<Item = &PerceptionListener> {
        self.listeners.iter()
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Take the stimuli delivered to a listener since the last drain
    pub fn drain_stimuli(&mut self, id: ListenerId) -> Result<Vec<Stimulus>, PerceptionError> {
        Ok(self.listener_mut(id)?.drain_stimuli())
    }

    /// Register an observer called for every delivered stimulus
    pub fn on_stimulus<F>(&mut self, observer: F)
    where
        F: FnMut(ListenerId, &Stimulus) + Send + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Metrics collected so far
    pub fn metrics(&self) -> &SenseMetrics {
        &self.metrics
    }

    /// Reset metrics counters
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    fn listener_mut(&mut self, id: ListenerId) -> Result<&mut PerceptionListener, PerceptionError> {
        self.listeners
            .get_mut(id)
            .ok_or(PerceptionError::UnknownListener(id))
    }
}

impl fmt::Debug for TeamSense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TeamSense")
            .field("sense", &self.sense)
            .field("config", &self.config)
            .field("listeners", &self.listeners.len())
            .field("pending_events", &self.registered_events.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualScheduler;
    use std::sync::Mutex;

    fn sense_with(config: SenseConfig) -> (TeamSense, Arc<ManualScheduler>) {
        let scheduler = Arc::new(ManualScheduler::new());
        let sense = TeamSense::new(config, scheduler.clone()).unwrap();
        (sense, scheduler)
    }

    fn event(team: u8, at: Location, range_sq: f32) -> TeamStimulusEvent {
        TeamStimulusEvent::new(ActorId::new(), TeamId::new(team), ActorId::new(), at, 0.0)
            .with_range_squared(range_sq)
    }

    fn interested(sense: &TeamSense) -> SenseSet {
        SenseSet::of(sense.sense_id())
    }

    #[test]
    fn test_register_event_requests_update() {
        let (mut sense, scheduler) = sense_with(SenseConfig::default());
        assert_eq!(sense.state(), SenseState::Idle);

        sense.register_event(event(1, Location::ORIGIN, 1.0));
        assert_eq!(sense.state(), SenseState::Pending);
        assert_eq!(scheduler.take_pending(), 1);

        sense.update();
        assert_eq!(sense.state(), SenseState::Idle);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_delivery_within_range_and_team() {
        let (mut sense, _) = sense_with(SenseConfig::default());
        let senses = interested(&sense);
        let listener = sense.add_listener(ActorId::new(), TeamId::new(1), Some(Location::ORIGIN), senses);

        sense.register_event(event(1, Location::new(5.0, 0.0, 0.0), 36.0));
        assert_eq!(sense.update(), NextUpdate::Suspend);

        let stimuli = sense.drain_stimuli(listener).unwrap();
        assert_eq!(stimuli.len(), 1);
        assert!(stimuli[0].is_successful());
        assert_eq!(stimuli[0].strength, 1.0);
        assert_eq!(stimuli[0].sense, sense.sense_id());
    }

    #[test]
    fn test_other_team_is_not_delivered() {
        let (mut sense, _) = sense_with(SenseConfig::default());
        let senses = interested(&sense);
        let listener = sense.add_listener(ActorId::new(), TeamId::new(1), Some(Location::ORIGIN), senses);

        sense.register_event(event(2, Location::new(5.0, 0.0, 0.0), 36.0));
        sense.update();

        assert!(sense.drain_stimuli(listener).unwrap().is_empty());
        assert_eq!(sense.metrics().events_unmatched, 1);
    }

    #[test]
    fn test_out_of_range_is_not_delivered() {
        let (mut sense, _) = sense_with(SenseConfig::default());
        let senses = interested(&sense);
        let listener = sense.add_listener(ActorId::new(), TeamId::new(1), Some(Location::ORIGIN), senses);

        sense.register_event(event(1, Location::new(5.0, 0.0, 0.0), 16.0));
        sense.update();

        assert!(sense.drain_stimuli(listener).unwrap().is_empty());
    }

    #[test]
    fn test_second_update_delivers_nothing() {
        let (mut sense, _) = sense_with(SenseConfig::default());
        let senses = interested(&sense);
        let listener = sense.add_listener(ActorId::new(), TeamId::new(1), Some(Location::ORIGIN), senses);

        sense.register_event(event(1, Location::ORIGIN, 1.0));
        sense.update();
        assert_eq!(sense.drain_stimuli(listener).unwrap().len(), 1);

        sense.update();
        assert!(sense.drain_stimuli(listener).unwrap().is_empty());
        assert_eq!(sense.metrics().update_count, 2);
        assert_eq!(sense.metrics().events_processed, 1);
    }

    #[test]
    fn test_uninterested_listener_is_skipped() {
        let (mut sense, _) = sense_with(SenseConfig::default());
        let other = SenseSet::of(SenseId::new(9).unwrap());
        let listener = sense.add_listener(ActorId::new(), TeamId::new(1), Some(Location::ORIGIN), other);

        sense.register_event(event(1, Location::ORIGIN, 1.0));
        sense.update();

        assert!(sense.drain_stimuli(listener).unwrap().is_empty());
        assert_eq!(sense.metrics().skipped_uninterested, 1);
    }

    #[test]
    fn test_listener_without_location_is_skipped() {
        let (mut sense, _) = sense_with(SenseConfig::default());
        let senses = interested(&sense);
        let listener = sense.add_listener(ActorId::new(), TeamId::new(1), None, senses);

        sense.register_event(event(1, Location::ORIGIN, 1.0));
        sense.update();
        assert!(sense.drain_stimuli(listener).unwrap().is_empty());
        assert_eq!(sense.metrics().skipped_no_location, 1);

        sense.update_listener_location(listener, Some(Location::ORIGIN)).unwrap();
        sense.register_event(event(1, Location::ORIGIN, 1.0));
        sense.update();
        assert_eq!(sense.drain_stimuli(listener).unwrap().len(), 1);
    }

    #[test]
    fn test_event_without_listeners_is_discarded() {
        let (mut sense, _) = sense_with(SenseConfig::default());
        sense.register_event(event(1, Location::ORIGIN, 1.0));

        sense.update();
        assert_eq!(sense.pending_events(), 0);
        assert_eq!(sense.metrics().events_unmatched, 1);
        assert_eq!(sense.metrics().total_delivered(), 0);
    }

    #[test]
    fn test_one_listener_can_receive_several_events() {
        let (mut sense, _) = sense_with(SenseConfig::default());
        let senses = interested(&sense);
        let listener = sense.add_listener(ActorId::new(), TeamId::new(4), Some(Location::ORIGIN), senses);

        sense.register_event(event(4, Location::ORIGIN, 1.0));
        sense.register_event(event(4, Location::new(1.0, 0.0, 0.0), 1.0));
        sense.register_event(event(4, Location::new(3.0, 0.0, 0.0), 1.0));
        sense.update();

        assert_eq!(sense.drain_stimuli(listener).unwrap().len(), 2);
        assert_eq!(sense.metrics().delivered[&TeamId::new(4)], 2);
    }

    #[test]
    fn test_observer_sees_every_delivery() {
        let (mut sense, _) = sense_with(SenseConfig::default());
        let senses = interested(&sense);
        let first = sense.add_listener(ActorId::new(), TeamId::new(1), Some(Location::ORIGIN), senses);
        let second = sense.add_listener(ActorId::new(), TeamId::new(1), Some(Location::ORIGIN), senses);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        sense.on_stimulus(move |id, _| sink.lock().unwrap().push(id));

        sense.register_event(event(1, Location::ORIGIN, 1.0));
        sense.update();

        assert_eq!(*seen.lock().unwrap(), vec![first, second]);
    }

    #[test]
    fn test_bounded_buffer_drops_oldest() {
        let (mut sense, _) = sense_with(SenseConfig::bounded(2));
        let senses = interested(&sense);
        let listener = sense.add_listener(ActorId::new(), TeamId::new(1), Some(Location::ORIGIN), senses);

        let oldest = event(1, Location::ORIGIN, 1.0);
        let oldest_enemy = oldest.enemy;
        sense.register_event(oldest);
        sense.register_event(event(1, Location::ORIGIN, 1.0));
        sense.register_event(event(1, Location::ORIGIN, 1.0));
        assert_eq!(sense.pending_events(), 2);
        assert_eq!(sense.metrics().events_dropped, 1);

        sense.update();
        let stimuli = sense.drain_stimuli(listener).unwrap();
        assert_eq!(stimuli.len(), 2);
        assert!(stimuli.iter().all(|s| s.target != oldest_enemy));
    }

    #[test]
    fn test_bounded_buffer_keeps_newest_events() {
        let (mut sense, _) = sense_with(SenseConfig::bounded(2));
        let senses = interested(&sense);
        let listener = sense.add_listener(ActorId::new(), TeamId::new(1), Some(Location::ORIGIN), senses);

        let events: Vec<TeamStimulusEvent> = (0..5).map(|_| event(1, Location::ORIGIN, 1.0)).collect();
        let newest: Vec<ActorId> = events[3..].iter().map(|e| e.enemy).collect();
        for e in events {
            sense.register_event(e);
        }
        assert_eq!(sense.pending_events(), 2);
        assert_eq!(sense.metrics().events_dropped, 3);

        sense.update();
        let targets: Vec<ActorId> = sense
            .drain_stimuli(listener)
            .unwrap()
            .iter()
            .map(|s| s.target)
            .collect();
        assert_eq!(targets, newest);
    }

    #[test]
    fn test_inbox_is_bounded() {
        let config = SenseConfig {
            max_inbox: 3,
            ..Default::default()
        };
        let (mut sense, _) = sense_with(config);
        let senses = interested(&sense);
        let listener = sense.add_listener(ActorId::new(), TeamId::new(1), Some(Location::ORIGIN), senses);

        let events: Vec<TeamStimulusEvent> = (0..5).map(|_| event(1, Location::ORIGIN, 1.0)).collect();
        let newest: Vec<ActorId> = events[2..].iter().map(|e| e.enemy).collect();
        for e in events {
            sense.register_event(e);
            sense.update();
        }

        assert_eq!(sense.listener(listener).unwrap().pending_stimuli().len(), 3);
        assert_eq!(sense.metrics().stimuli_dropped, 2);
        assert_eq!(sense.metrics().total_delivered(), 5);

        let targets: Vec<ActorId> = sense
            .drain_stimuli(listener)
            .unwrap()
            .iter()
            .map(|s| s.target)
            .collect();
        assert_eq!(targets, newest);
    }

    #[test]
    fn test_observers_only_keeps_no_inbox() {
        let (mut sense, _) = sense_with(SenseConfig::observers_only());
        let senses = interested(&sense);
        let listener = sense.add_listener(ActorId::new(), TeamId::new(1), Some(Location::ORIGIN), senses);

        let seen = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&seen);
        sense.on_stimulus(move |_, _| *sink.lock().unwrap() += 1);

        for _ in 0..4 {
            sense.register_event(event(1, Location::ORIGIN, 1.0));
        }
        sense.update();

        assert_eq!(*seen.lock().unwrap(), 4);
        assert!(sense.drain_stimuli(listener).unwrap().is_empty());
        assert_eq!(sense.metrics().stimuli_dropped, 0);
    }

    #[test]
    fn test_listener_management() {
        let (mut sense, _) = sense_with(SenseConfig::default());
        let senses = interested(&sense);
        let id = sense.add_listener(ActorId::new(), TeamId::new(1), Some(Location::ORIGIN), senses);
        assert_eq!(sense.listener_count(), 1);

        sense.update_listener_team(id, TeamId::new(2)).unwrap();
        assert_eq!(sense.listener(id).unwrap().team(), TeamId::new(2));

        sense.set_listener_senses(id, SenseSet::empty()).unwrap();
        assert!(!sense.listener(id).unwrap().has_sense(sense.sense_id()));

        let removed = sense.remove_listener(id).unwrap();
        assert_eq!(removed.id(), id);
        assert_eq!(
            sense.remove_listener(id).unwrap_err(),
            PerceptionError::UnknownListener(id)
        );
        assert!(sense.drain_stimuli(id).is_err());
        assert!(sense.update_listener_location(id, None).is_err());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let scheduler = Arc::new(ManualScheduler::new());
        let config = SenseConfig {
            sense_index: 100,
            ..Default::default()
        };
        assert!(TeamSense::new(config, scheduler).is_err());
    }
}
