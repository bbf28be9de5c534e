use slotmap::{new_key_type, SlotMap};

use super::store::WaitingStore;
use super::timeline::TimerId;
use crate::config::Discipline;

pub type Ticks = u64;

new_key_type! {
    pub struct JobId;
}

/// The unit of work. Accumulators are updated incrementally at every state
/// transition by adding `now - stamp`; `stamp` is reset on each transition.
#[derive(Debug)]
pub struct Job {
    pub created_at: Ticks,
    pub stamp: Ticks,
    pub queueing_time: Ticks,
    pub service_time: Ticks,
    pub queue_count: u32,
}

impl Job {
    pub fn new(now: Ticks) -> Self {
        Self {
            created_at: now,
            stamp: now,
            queueing_time: 0,
            service_time: 0,
            queue_count: 0,
        }
    }

    /// Time since the last state transition. The scheduler clock is
    /// monotonic, so a stamp in the future is a defect.
    pub fn take_delta(&mut self, now: Ticks) -> Ticks {
        assert!(
            now >= self.stamp,
            "negative time delta: now={now}, stamp={}",
            self.stamp
        );
        let delta = now - self.stamp;
        self.stamp = now;
        delta
    }

    pub fn finish(self, now: Ticks) -> FinishedJob {
        FinishedJob {
            created_at: self.created_at,
            finished_at: now,
            queueing_time: self.queueing_time,
            service_time: self.service_time,
            queue_count: self.queue_count,
        }
    }
}

/// A job as emitted on the completed or dropped output. The engine no
/// longer owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishedJob {
    pub created_at: Ticks,
    pub finished_at: Ticks,
    pub queueing_time: Ticks,
    pub service_time: Ticks,
    pub queue_count: u32,
}

impl FinishedJob {
    pub fn lifetime(&self) -> Ticks {
        self.finished_at - self.created_at
    }
}

/// The alternating on/off renewal process gating service. Exactly one
/// toggle timer is pending at all times after initialization.
#[derive(Debug)]
pub struct ChannelState {
    pub up: bool,
    pub next_toggle_at: Ticks,
    pub toggle_timer: TimerId,
}

/// The single server slot. `cur_service` is drawn once at service start and
/// never redrawn; `remaining` is decremented at each suspension so that no
/// time is gained or lost across suspend/resume cycles.
#[derive(Debug)]
pub struct ServiceSlot {
    pub job: JobId,
    pub cur_service: Ticks,
    pub remaining: Ticks,
    pub completion: TimerId,
}

#[derive(Debug)]
pub enum ServerState {
    Idle,
    Serving(ServiceSlot),
    Suspended(ServiceSlot),
}

impl ServerState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn occupant(&self) -> Option<JobId> {
        match self {
            Self::Idle => None,
            Self::Serving(slot) | Self::Suspended(slot) => Some(slot.job),
        }
    }
}

/// Mutable engine state shared by the dispatch handlers. Every live job is
/// owned by exactly one of: the waiting store or the server slot.
#[derive(Debug)]
pub struct EngineCtx {
    pub jobs: SlotMap<JobId, Job>,
    pub store: WaitingStore,
    pub server: ServerState,
    pub channel: ChannelState,
    pub capacity: Option<usize>,
    pub dropped: u64,
}

impl EngineCtx {
    pub fn new(discipline: Discipline, capacity: Option<usize>, channel: ChannelState) -> Self {
        Self {
            jobs: SlotMap::with_key(),
            store: WaitingStore::new(discipline),
            server: ServerState::Idle,
            channel,
            capacity,
            dropped: 0,
        }
    }

    pub fn job(&self, id: JobId) -> &Job {
        self.jobs.get(id).expect("job missing from job table")
    }

    pub fn job_mut(&mut self, id: JobId) -> &mut Job {
        self.jobs.get_mut(id).expect("job missing from job table")
    }

    pub fn release(&mut self, id: JobId) -> Job {
        self.jobs.remove(id).expect("releasing unknown job")
    }

    pub fn at_capacity(&self) -> bool {
        match self.capacity {
            Some(cap) => self.store.len() >= cap,
            None => false,
        }
    }

    pub fn live_jobs(&self) -> usize {
        self.jobs.len()
    }
}
