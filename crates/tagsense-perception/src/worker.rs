//! Background worker that drives a team sense on a tokio runtime

use crate::{PerceptionError, SenseConfig, SenseMetrics, TeamSense, WakeHandle};
use std::future::Future;
use std::sync::Arc;
use tagsense_domain::{NextUpdate, PollScheduler, TeamStimulusEvent};
use tokio::sync::mpsc;

/// Cloneable handle for submitting events to a [`SenseWorker`]
///
/// Events are queued and picked up at the start of the worker's next cycle,
/// so sending from inside a stimulus observer never re-enters an update.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::UnboundedSender<TeamStimulusEvent>,
    wake: WakeHandle,
}

impl EventSender {
    /// Queue an event and wake the worker
    ///
    /// # Errors
    /// Returns [`PerceptionError::QueueClosed`] if the worker has been dropped
    pub fn send(&self, event: TeamStimulusEvent) -> Result<(), PerceptionError> {
        self.sender
            .send(event)
            .map_err(|_| PerceptionError::QueueClosed)?;
        self.wake.request_immediate_update();
        Ok(())
    }
}

/// Owns a [`TeamSense`] and runs an update whenever one is requested
///
/// # Examples
///
/// ```no_run
/// use tagsense_perception::{SenseConfig, SenseWorker};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut worker = SenseWorker::new(SenseConfig::default())?;
///     let events = worker.sender();
///
///     // Hand `events` to producers, then run until Ctrl+C
///     # drop(events);
///     worker.run().await?;
///     Ok(())
/// }
/// ```
pub struct SenseWorker {
    sense: TeamSense,
    wake: WakeHandle,
    sender: mpsc::UnboundedSender<TeamStimulusEvent>,
    receiver: mpsc::UnboundedReceiver<TeamStimulusEvent>,
}

impl SenseWorker {
    /// Create a worker around a new sense
    ///
    /// # Errors
    /// Returns error if the configuration does not validate
    pub fn new(config: SenseConfig) -> Result<Self, PerceptionError> {
        let wake = WakeHandle::new();
        let sense = TeamSense::new(config, Arc::new(wake.clone()))?;
        let (sender, receiver) = mpsc::unbounded_channel();

        Ok(Self {
            sense,
            wake,
            sender,
            receiver,
        })
    }

    /// Handle for submitting events from other tasks
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
            wake: self.wake.clone(),
        }
    }

    /// The driven sense
    pub fn sense(&self) -> &TeamSense {
        &self.sense
    }

    /// Mutable access to the driven sense, for listener management
    pub fn sense_mut(&mut self) -> &mut TeamSense {
        &mut self.sense
    }

    /// Metrics of the driven sense
    pub fn metrics(&self) -> &SenseMetrics {
        self.sense.metrics()
    }

    /// Move queued events into the sense and run one update
    pub fn cycle(&mut self) -> NextUpdate {
        let mut queued = 0usize;
        while let Ok(event) = self.receiver.try_recv() {
            self.sense.push_event(event);
            queued += 1;
        }
        if queued > 0 {
            tracing::debug!(queued, "Drained event queue");
        }

        self.sense.update()
    }

    /// Run until Ctrl+C is received
    ///
    /// # Errors
    /// Returns [`PerceptionError::Worker`] if the signal handler cannot be installed
    pub async fn run(&mut self) -> Result<(), PerceptionError> {
        self.run_until(tokio::signal::ctrl_c())
            .await
            .map_err(|e| PerceptionError::Worker(format!("Failed to listen for shutdown: {}", e)))
    }

    /// Run until `shutdown` completes, returning its output
    pub async fn run_until<F: Future>(&mut self, shutdown: F) -> F::Output {
        tokio::pin!(shutdown);
        tracing::info!(sense = %self.sense.sense_id(), "Sense worker started");

        let mut next = NextUpdate::Suspend;
        let output = loop {
            let wake = self.wake.clone();
            tokio::select! {
                biased;
                output = &mut shutdown => break output,
                _ = wait_for_update(&wake, next) => {
                    next = self.cycle();
                }
            }
        };

        tracing::info!(
            "Sense worker stopped. Final metrics:\n{}",
            self.sense.metrics().summary()
        );
        output
    }

    /// Wait for `cycles` update requests, running a cycle after each
    pub async fn run_cycles(&mut self, cycles: usize) {
        tracing::info!(cycles, "Sense worker started for {} cycles", cycles);

        let mut next = NextUpdate::Suspend;
        for cycle in 0..cycles {
            let wake = self.wake.clone();
            wait_for_update(&wake, next).await;
            tracing::debug!("Starting update cycle {}/{}", cycle + 1, cycles);
            next = self.cycle();
        }

        tracing::info!(
            "Sense worker finished {} cycles. Final metrics:\n{}",
            cycles,
            self.sense.metrics().summary()
        );
    }
}

async fn wait_for_update(wake: &WakeHandle, next: NextUpdate) {
    match next {
        NextUpdate::Suspend => wake.wait().await,
        NextUpdate::After(delay) => {
            tokio::select! {
                _ = wake.wait() => {}
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
