use average::{Estimate, Mean};

use crate::core::event::{DropReason, EngineEvent};
use crate::core::state::FinishedJob;

/// Terminal consumer: collects completed and dropped jobs and aggregates
/// the engine's point-in-time observations.
#[derive(Debug, Default)]
pub struct Sink {
    pub completed: Vec<FinishedJob>,
    pub dropped: Vec<(FinishedJob, DropReason)>,
    pub max_queue_len: usize,
}

impl Sink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Completed(job) => self.completed.push(job),
            EngineEvent::Dropped { job, reason } => self.dropped.push((job, reason)),
            EngineEvent::QueueLength(len) => self.max_queue_len = self.max_queue_len.max(len),
            _ => {}
        }
    }

    pub fn emitted(&self) -> usize {
        self.completed.len() + self.dropped.len()
    }

    pub fn deadline_drops(&self) -> usize {
        self.dropped
            .iter()
            .filter(|(_, reason)| *reason == DropReason::Deadline)
            .count()
    }

    pub fn capacity_drops(&self) -> usize {
        self.dropped
            .iter()
            .filter(|(_, reason)| *reason == DropReason::Capacity)
            .count()
    }

    pub fn mean_queueing_time(&self) -> f64 {
        mean(self.completed.iter().map(|job| job.queueing_time as f64))
    }

    pub fn mean_service_time(&self) -> f64 {
        mean(self.completed.iter().map(|job| job.service_time as f64))
    }

    pub fn mean_lifetime(&self) -> f64 {
        mean(self.completed.iter().map(|job| job.lifetime() as f64))
    }

    pub fn mean_queue_visits(&self) -> f64 {
        mean(self.completed.iter().map(|job| job.queue_count as f64))
    }
}

fn mean(iter: impl Iterator<Item = f64>) -> f64 {
    iter.collect::<Mean>().estimate()
}
