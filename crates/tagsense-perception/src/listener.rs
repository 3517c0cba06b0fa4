//! Perception listeners and the map that holds them

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use tagsense_domain::{ActorId, Location, SenseId, SenseSet, Stimulus, TeamId};

/// Identifier of a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Get the raw value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// An actor's registration with a sense
///
/// The sense does not own the actor; it only keeps the data it needs for
/// matching (team, cached location, interests) plus an inbox of stimuli
/// delivered since the owner last drained it, bounded by the sense's
/// `max_inbox`.
#[derive(Debug, Clone)]
pub struct PerceptionListener {
    id: ListenerId,
    owner: ActorId,
    team: TeamId,
    location: Option<Location>,
    senses: SenseSet,
    inbox: VecDeque<Stimulus>,
}

impl PerceptionListener {
    /// Listener id
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Actor this listener belongs to
    pub fn owner(&self) -> ActorId {
        self.owner
    }

    /// Team used to match events
    pub fn team(&self) -> TeamId {
        self.team
    }

    /// Cached location, `None` until the owner reports one
    pub fn location(&self) -> Option<Location> {
        self.location
    }

    /// Senses this listener is interested in
    pub fn senses(&self) -> SenseSet {
        self.senses
    }

    /// Whether this listener wants stimuli from `sense`
    pub fn has_sense(&self, sense: SenseId) -> bool {
        self.senses.contains(sense)
    }

    /// Stimuli delivered and not yet drained
    pub fn pending_stimuli(&self) -> &VecDeque<Stimulus> {
        &self.inbox
    }

    pub(crate) fn set_location(&mut self, location: Option<Location>) {
        self.location = location;
    }

    pub(crate) fn set_team(&mut self, team: TeamId) {
        self.team = team;
    }

    pub(crate) fn set_senses(&mut self, senses: SenseSet) {
        self.senses = senses;
    }

    /// Queue a stimulus, returning the one evicted to stay within `limit`
    ///
    /// A `limit` of 0 keeps no inbox: nothing is stored and nothing is evicted.
    pub(crate) fn register_stimulus(&mut self, stimulus: Stimulus, limit: usize) -> Option<Stimulus> {
        if limit == 0 {
            return None;
        }
        let evicted = if self.inbox.len() >= limit {
            self.inbox.pop_front()
        } else {
            None
        };
        self.inbox.push_back(stimulus);
        evicted
    }

    pub(crate) fn drain_stimuli(&mut self) -> Vec<Stimulus> {
        self.inbox.drain(..).collect()
    }
}

/// Listeners keyed by id, iterated in registration order
#[derive(Debug, Clone, Default)]
pub(crate) struct ListenerMap {
    listeners: BTreeMap<ListenerId, PerceptionListener>,
    next_id: u64,
}

impl ListenerMap {
    pub(crate) fn insert(
        &mut self,
        owner: ActorId,
        team: TeamId,
        location: Option<Location>,
        senses: SenseSet,
    ) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.insert(
            id,
            PerceptionListener {
                id,
                owner,
                team,
                location,
                senses,
                inbox: VecDeque::new(),
            },
        );
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> Option<PerceptionListener> {
        self.listeners.remove(&id)
    }

    pub(crate) fn get(&self, id: ListenerId) -> Option<&PerceptionListener> {
        self.listeners.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: ListenerId) -> Option<&mut PerceptionListener> {
        self.listeners.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &PerceptionListener> {
        self.listeners.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut PerceptionListener> {
        self.listeners.values_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }
}
