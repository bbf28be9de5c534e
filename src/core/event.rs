use super::state::{FinishedJob, JobId, Ticks};

/// Internal event kinds dispatched by the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    ChannelToggle,
    EndService,
    DeadlineFired(JobId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Capacity,
    Deadline,
}

/// Outputs and point-in-time telemetry observations, emitted at the instant
/// the underlying event occurs. Aggregation is the consumer's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    Completed(FinishedJob),
    Dropped {
        job: FinishedJob,
        reason: DropReason,
    },
    QueueLength(usize),
    Busy(bool),
    Channel {
        up: bool,
    },
    UpSojourn(Ticks),
    DownSojourn(Ticks),
    DeadlineLength(Ticks),
}
