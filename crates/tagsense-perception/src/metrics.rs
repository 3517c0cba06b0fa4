//! Metrics collection for sense updates

use std::collections::BTreeMap;
use tagsense_domain::TeamId;

/// Counters collected while registering events and running updates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SenseMetrics {
    /// Update cycles run
    pub update_count: usize,

    /// Events accepted by `register_event`
    pub events_registered: usize,

    /// Events consumed by update cycles
    pub events_processed: usize,

    /// Events dropped because the buffer was full
    pub events_dropped: usize,

    /// Processed events that reached no listener
    pub events_unmatched: usize,

    /// Stimuli dropped from full listener inboxes
    pub stimuli_dropped: usize,

    /// Stimuli delivered per team
    pub delivered: BTreeMap<TeamId, usize>,

    /// Listeners skipped because they are not interested in the sense
    pub skipped_uninterested: usize,

    /// Listeners skipped because they have no cached location
    pub skipped_no_location: usize,
}

impl SenseMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed update cycle
    pub fn record_update(&mut self) {
        self.update_count += 1;
    }

    /// Record an accepted event
    pub fn record_registration(&mut self) {
        self.events_registered += 1;
    }

    /// Record an event dropped from a full buffer
    pub fn record_drop(&mut self) {
        self.events_dropped += 1;
    }

    /// Record events consumed by an update, `unmatched` of which reached nobody
    pub fn record_processed(&mut self, processed: usize, unmatched: usize) {
        self.events_processed += processed;
        self.events_unmatched += unmatched;
    }

    /// Record a stimulus evicted from a full inbox
    pub fn record_inbox_drop(&mut self) {
        self.stimuli_dropped += 1;
    }

    /// Record a delivered stimulus
    pub fn record_delivery(&mut self, team: TeamId) {
        *self.delivered.entry(team).or_insert(0) += 1;
    }

    /// Total stimuli delivered across all teams
    pub fn total_delivered(&self) -> usize {
        self.delivered.values().sum()
    }

    /// Total listeners skipped for any reason
    pub fn total_skipped(&self) -> usize {
        self.skipped_uninterested + self.skipped_no_location
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Sense Metrics Summary".to_string(),
            "=====================".to_string(),
            format!("Update cycles: {}", self.update_count),
            format!(
                "Events: {} registered, {} processed, {} unmatched, {} dropped",
                self.events_registered,
                self.events_processed,
                self.events_unmatched,
                self.events_dropped
            ),
            format!(
                "Listeners skipped: {} uninterested, {} without location",
                self.skipped_uninterested, self.skipped_no_location
            ),
            format!("Stimuli dropped from inboxes: {}", self.stimuli_dropped),
        ];

        if !self.delivered.is_empty() {
            lines.push(String::new());
            lines.push("Stimuli delivered by team:".to_string());
            for (team, count) in &self.delivered {
                lines.push(format!("  {}: {}", team, count));
            }
            lines.push(format!("  Total: {}", self.total_delivered()));
        }

        lines.join("\n")
    }
}
