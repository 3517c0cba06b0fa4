//! Scheduler collaborators for driving sense updates
//!
//! [`ManualScheduler`] counts wake requests for synchronous drivers and tests;
//! [`WakeHandle`] wakes a tokio task.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tagsense_domain::PollScheduler;
use tokio::sync::Notify;

/// Scheduler that records update requests for the caller to act on
///
/// # Examples
///
/// ```
/// use tagsense_domain::PollScheduler;
/// use tagsense_perception::ManualScheduler;
///
/// let scheduler = ManualScheduler::new();
/// scheduler.request_immediate_update();
/// scheduler.request_immediate_update();
/// assert_eq!(scheduler.take_pending(), 2);
/// assert_eq!(scheduler.take_pending(), 0);
/// ```
#[derive(Debug, Default)]
pub struct ManualScheduler {
    pending: AtomicUsize,
}

impl ManualScheduler {
    /// Create a scheduler with no pending requests
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests made since the last [`take_pending`](Self::take_pending)
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Whether an update has been requested
    pub fn is_requested(&self) -> bool {
        self.pending() > 0
    }

    /// Return and clear the number of pending requests
    pub fn take_pending(&self) -> usize {
        self.pending.swap(0, Ordering::AcqRel)
    }
}

impl PollScheduler for ManualScheduler {
    fn request_immediate_update(&self) {
        self.pending.fetch_add(1, Ordering::AcqRel);
    }
}

/// Wakes a task waiting in [`WakeHandle::wait`]
///
/// A request made while nobody is waiting is kept and completes the next
/// wait immediately; several such requests collapse into one wake-up.
#[derive(Debug, Clone, Default)]
pub struct WakeHandle {
    notify: Arc<Notify>,
}

impl WakeHandle {
    /// Create a new handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until an update is requested
    pub async fn wait(&self) {
        self.notify.notified().await;
    }
}

impl PollScheduler for WakeHandle {
    fn request_immediate_update(&self) {
        self.notify.notify_one();
    }
}
