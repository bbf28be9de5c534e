use rustc_hash::FxHashMap;
use tracing::debug;

use super::event::EventKind;
use super::state::{JobId, Ticks};
use super::timeline::{TimerId, Timeline};
use crate::config::DeadlinePolicy;

/// Tracks one expiry timer per waiting job and applies the configured
/// policy when a deadline fires or the channel reconnects.
///
/// The registry maps job identity to timer handle; the reverse direction is
/// the `JobId` carried in the timer's event payload. Neither side holds a
/// raw reference to the other, so releasing either out of order cannot
/// dangle.
#[derive(Debug)]
pub struct DeadlineManager {
    policy: DeadlinePolicy,
    timers: FxHashMap<JobId, TimerId>,
}

impl DeadlineManager {
    pub fn new(policy: DeadlinePolicy) -> Self {
        Self {
            policy,
            timers: FxHashMap::default(),
        }
    }

    pub fn policy(&self) -> DeadlinePolicy {
        self.policy
    }

    /// Registers a deadline of `length` for a job entering the waiting
    /// store while the channel is down. Returns the absolute fire time.
    pub fn register(&mut self, timeline: &mut Timeline, job: JobId, length: Ticks) -> Ticks {
        let fire_at = timeline.now() + length;
        let timer = timeline.schedule(fire_at, EventKind::DeadlineFired(job));
        let prev = self.timers.insert(job, timer);
        debug_assert!(prev.is_none(), "job already has a pending deadline");
        debug!(?job, fire_at, "deadline registered");
        fire_at
    }

    pub fn fire_time(&self, timeline: &Timeline, job: JobId) -> Option<Ticks> {
        self.timers
            .get(&job)
            .and_then(|&timer| timeline.fire_time(timer))
    }

    pub fn has_deadline(&self, job: JobId) -> bool {
        self.timers.contains_key(&job)
    }

    /// Cancels a job's pending deadline, releasing the timer slot.
    /// Idempotent: jobs without one are left alone.
    pub fn cancel(&mut self, timeline: &mut Timeline, job: JobId) -> bool {
        match self.timers.remove(&job) {
            Some(timer) => {
                timeline.cancel(timer);
                true
            }
            None => false,
        }
    }

    /// Service start extinguishes the deadline, except under
    /// immediate-drop where the deadline is independent of server state.
    pub fn on_service_start(&mut self, timeline: &mut Timeline, job: JobId) {
        if self.policy != DeadlinePolicy::ImmediateDrop {
            self.cancel(timeline, job);
        }
    }

    pub fn on_service_end(&mut self, timeline: &mut Timeline, job: JobId) {
        self.cancel(timeline, job);
    }

    /// Called when a registered timer is dispatched; drops the registry
    /// entry so the firing is accounted exactly once.
    pub fn fired(&mut self, job: JobId) {
        let removed = self.timers.remove(&job);
        assert!(removed.is_some(), "deadline fired for unregistered job");
    }

    /// Reconnect reaction. `up_sojourn` is the drawn length of the
    /// up-window that is just starting.
    pub fn on_channel_up(&mut self, timeline: &mut Timeline, up_sojourn: Ticks) {
        match self.policy {
            DeadlinePolicy::ImmediateDrop => {}
            DeadlinePolicy::DeleteOnReconnect => {
                debug!(count = self.timers.len(), "discarding deadlines on reconnect");
                for (_, timer) in self.timers.drain() {
                    timeline.cancel(timer);
                }
            }
            DeadlinePolicy::ShiftOnReconnect => {
                debug!(
                    count = self.timers.len(),
                    up_sojourn, "shifting deadlines on reconnect"
                );
                for &timer in self.timers.values() {
                    let postponed = timeline.postpone(timer, up_sojourn);
                    debug_assert!(postponed, "registered deadline not pending");
                }
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (JobId, TimerId)> + '_ {
        self.timers.iter().map(|(&job, &timer)| (job, timer))
    }
}
