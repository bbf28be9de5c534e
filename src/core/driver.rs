use std::mem;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, trace};

use super::deadline::DeadlineManager;
use super::event::{DropReason, EngineEvent, EventKind};
use super::observer::Observer;
use super::state::{
    ChannelState, EngineCtx, FinishedJob, Job, JobId, ServerState, ServiceSlot, Ticks,
};
use super::store::Urgency;
use super::timeline::Timeline;
use crate::config::{ConfigError, DeadlinePolicy, EngineConfig, Samplers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted(JobId),
    Rejected,
}

/// The channel-aware preemptive queueing engine: admission control, the
/// ordered waiting store, the deadline manager, the single-server service
/// controller and the channel availability process, all driven by one
/// timeline.
///
/// The host advances simulated time with [`advance_to`](Self::advance_to)
/// or [`step`](Self::step), injects arrivals with [`offer`](Self::offer) at
/// the current time, and drains outputs and telemetry with
/// [`take_events`](Self::take_events).
pub struct QueueEngine {
    pub ctx: EngineCtx,
    timeline: Timeline,
    deadlines: DeadlineManager,
    samplers: Samplers,
    rng: StdRng,
    observer: Observer,
    out: Vec<EngineEvent>,
}

impl QueueEngine {
    pub fn new(config: EngineConfig, mut samplers: Samplers) -> Result<Self, ConfigError> {
        let capacity = config.capacity_bound()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut timeline = Timeline::new();
        let mut out = Vec::new();

        let up = config.channel_initially_up;
        let sojourn = if up {
            samplers.up_sojourn.sample(&mut rng)
        } else {
            samplers.down_sojourn.sample(&mut rng)
        };
        out.push(if up {
            EngineEvent::UpSojourn(sojourn)
        } else {
            EngineEvent::DownSojourn(sojourn)
        });
        let toggle_timer = timeline.schedule(sojourn, EventKind::ChannelToggle);
        let channel = ChannelState {
            up,
            next_toggle_at: sojourn,
            toggle_timer,
        };

        out.push(EngineEvent::QueueLength(0));
        out.push(EngineEvent::Busy(false));

        Ok(Self {
            ctx: EngineCtx::new(config.discipline, capacity, channel),
            timeline,
            deadlines: DeadlineManager::new(config.deadline_policy),
            samplers,
            rng,
            observer: Observer::new(),
            out,
        })
    }

    pub fn now(&self) -> Ticks {
        self.timeline.now()
    }

    pub fn channel_up(&self) -> bool {
        self.ctx.channel.up
    }

    pub fn queue_len(&self) -> usize {
        self.ctx.store.len()
    }

    pub fn is_busy(&self) -> bool {
        !self.ctx.server.is_idle()
    }

    pub fn dropped(&self) -> u64 {
        self.ctx.dropped
    }

    pub fn live_jobs(&self) -> usize {
        self.ctx.live_jobs()
    }

    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        mem::take(&mut self.out)
    }

    /// Offers a new arrival at the engine's current time.
    ///
    /// Rejected when the job would have to wait (server busy or channel
    /// down) and the waiting store is at capacity. Accepted jobs are never
    /// capacity-dropped later.
    pub fn offer(&mut self) -> Admission {
        let now = self.timeline.now();
        let must_wait = !self.ctx.server.is_idle() || !self.ctx.channel.up;
        if must_wait && self.ctx.at_capacity() {
            debug!(now, "capacity full, job dropped");
            self.emit_drop(Job::new(now).finish(now), DropReason::Capacity);
            return Admission::Rejected;
        }

        let job = self.ctx.jobs.insert(Job::new(now));
        if must_wait {
            self.enqueue(job);
        } else {
            self.out.push(EngineEvent::Busy(true));
            self.start_service(job);
        }
        Admission::Accepted(job)
    }

    /// Earliest pending internal event, if any.
    pub fn next_event_at(&mut self) -> Option<Ticks> {
        self.timeline.peek()
    }

    /// Dispatches the single earliest pending event.
    pub fn step(&mut self) -> bool {
        match self.timeline.pop() {
            Some((now, kind)) => {
                self.dispatch(now, kind);
                true
            }
            None => false,
        }
    }

    /// Dispatches every event scheduled at or before `to`, then advances
    /// the clock to `to`. Events falling exactly on `to` run before any
    /// subsequent `offer` at that time.
    pub fn advance_to(&mut self, to: Ticks) {
        while let Some(at) = self.timeline.peek() {
            if at > to {
                break;
            }
            let (now, kind) = self.timeline.pop().expect("peeked event vanished");
            self.dispatch(now, kind);
        }
        self.timeline.fast_forward(to);
    }

    fn dispatch(&mut self, now: Ticks, kind: EventKind) {
        match kind {
            EventKind::ChannelToggle => self.on_toggle(now),
            EventKind::EndService => self.on_end_service(now),
            EventKind::DeadlineFired(job) => self.on_deadline(now, job),
        }
        self.observer
            .observe(now, &self.ctx, &self.deadlines, &self.timeline);
    }

    fn on_toggle(&mut self, now: Ticks) {
        let up = !self.ctx.channel.up;
        self.ctx.channel.up = up;
        self.out.push(EngineEvent::Channel { up });
        debug!(now, up, "channel toggled");

        // Draw the sojourn for the new state and schedule the next flip
        // before reacting: suspension computes its resume time from
        // `next_toggle_at`.
        let sojourn = if up {
            self.samplers.up_sojourn.sample(&mut self.rng)
        } else {
            self.samplers.down_sojourn.sample(&mut self.rng)
        };
        self.out.push(if up {
            EngineEvent::UpSojourn(sojourn)
        } else {
            EngineEvent::DownSojourn(sojourn)
        });
        self.ctx.channel.next_toggle_at = now + sojourn;
        self.ctx.channel.toggle_timer = self
            .timeline
            .schedule(self.ctx.channel.next_toggle_at, EventKind::ChannelToggle);

        if up {
            self.deadlines.on_channel_up(&mut self.timeline, sojourn);
            match mem::replace(&mut self.ctx.server, ServerState::Idle) {
                ServerState::Suspended(slot) => self.resume(now, slot),
                ServerState::Idle => self.pull_next(now),
                ServerState::Serving(_) => unreachable!("serving while channel was down"),
            }
        } else {
            match mem::replace(&mut self.ctx.server, ServerState::Idle) {
                ServerState::Serving(slot) => self.suspend(now, slot),
                ServerState::Idle => {}
                ServerState::Suspended(_) => unreachable!("suspended while channel was up"),
            }
        }
    }

    fn on_end_service(&mut self, now: Ticks) {
        let slot = match mem::replace(&mut self.ctx.server, ServerState::Idle) {
            ServerState::Serving(slot) => slot,
            other => panic!("completion fired while server was {other:?}"),
        };
        assert!(
            self.ctx.channel.up,
            "completion fired while channel was down"
        );

        self.deadlines.on_service_end(&mut self.timeline, slot.job);
        let mut job = self.ctx.release(slot.job);
        let delta = job.take_delta(now);
        debug_assert_eq!(delta, slot.remaining, "completion fired off schedule");
        job.service_time += delta;
        debug!(
            now,
            job = ?slot.job,
            queueing = job.queueing_time,
            service = job.service_time,
            "service finished"
        );
        self.out.push(EngineEvent::Completed(job.finish(now)));
        self.pull_next(now);
    }

    fn on_deadline(&mut self, now: Ticks, job: JobId) {
        self.deadlines.fired(job);
        debug!(now, ?job, "deadline fired");

        if self.ctx.server.occupant() == Some(job) {
            // Only immediate-drop leaves a timer alive past service start.
            assert_eq!(
                self.deadlines.policy(),
                DeadlinePolicy::ImmediateDrop,
                "deadline fired for an in-service job"
            );
            let was_serving = matches!(self.ctx.server, ServerState::Serving(_));
            let slot = match mem::replace(&mut self.ctx.server, ServerState::Idle) {
                ServerState::Serving(slot) | ServerState::Suspended(slot) => slot,
                ServerState::Idle => unreachable!(),
            };
            self.timeline.cancel(slot.completion);
            let mut entry = self.ctx.release(job);
            let delta = entry.take_delta(now);
            if was_serving {
                entry.service_time += delta;
            } else {
                entry.queueing_time += delta;
            }
            self.emit_drop(entry.finish(now), DropReason::Deadline);
            if was_serving {
                self.pull_next(now);
            } else {
                self.out.push(EngineEvent::Busy(false));
            }
            return;
        }

        let removed = self.ctx.store.remove(job);
        assert!(removed, "deadline fired for a job the engine does not hold");
        self.out.push(EngineEvent::QueueLength(self.ctx.store.len()));
        let mut entry = self.ctx.release(job);
        let waited = entry.take_delta(now);
        entry.queueing_time += waited;
        self.emit_drop(entry.finish(now), DropReason::Deadline);
    }

    fn enqueue(&mut self, job: JobId) {
        if !self.ctx.channel.up {
            let length = self.samplers.deadline.sample(&mut self.rng);
            self.out.push(EngineEvent::DeadlineLength(length));
            self.deadlines.register(&mut self.timeline, job, length);
        }
        let urgency = Urgency {
            deadline_at: self.deadlines.fire_time(&self.timeline, job),
            created_at: self.ctx.job(job).created_at,
        };
        self.ctx.job_mut(job).queue_count += 1;
        self.ctx.store.insert(job, urgency);
        self.out.push(EngineEvent::QueueLength(self.ctx.store.len()));
        trace!(?job, len = self.ctx.store.len(), "job enqueued");
    }

    fn start_service(&mut self, job: JobId) {
        let now = self.timeline.now();
        debug_assert!(self.ctx.channel.up, "service start while channel is down");
        self.deadlines.on_service_start(&mut self.timeline, job);

        let entry = self.ctx.job_mut(job);
        let waited = entry.take_delta(now);
        entry.queueing_time += waited;

        let duration = self.samplers.service.sample(&mut self.rng);
        let completion = self
            .timeline
            .schedule(now + duration, EventKind::EndService);
        debug!(now, ?job, waited, duration, "service started");
        self.ctx.server = ServerState::Serving(ServiceSlot {
            job,
            cur_service: duration,
            remaining: duration,
            completion,
        });
    }

    /// Serves the head of the store, or goes idle.
    fn pull_next(&mut self, _now: Ticks) {
        debug_assert!(self.ctx.server.is_idle());
        debug_assert!(self.ctx.channel.up, "pulling work while channel is down");
        match self.ctx.store.pop() {
            Some(job) => {
                self.out.push(EngineEvent::QueueLength(self.ctx.store.len()));
                self.start_service(job);
            }
            None => self.out.push(EngineEvent::Busy(false)),
        }
    }

    fn suspend(&mut self, now: Ticks, mut slot: ServiceSlot) {
        self.timeline.cancel(slot.completion);
        let resume_at = self.ctx.channel.next_toggle_at;
        let job = self.ctx.job_mut(slot.job);
        let elapsed = job.take_delta(now);
        assert!(
            elapsed <= slot.remaining,
            "service accounting overran the drawn duration"
        );
        slot.remaining -= elapsed;
        job.service_time += elapsed;
        slot.completion = self
            .timeline
            .schedule(resume_at + slot.remaining, EventKind::EndService);
        debug!(
            now,
            job = ?slot.job,
            elapsed,
            remaining = slot.remaining,
            resume_at,
            "service suspended"
        );
        self.ctx.server = ServerState::Suspended(slot);
    }

    fn resume(&mut self, now: Ticks, slot: ServiceSlot) {
        let job = self.ctx.job_mut(slot.job);
        let suspended = job.take_delta(now);
        // Time spent suspended counts toward queueing, not service.
        job.queueing_time += suspended;
        debug!(now, job = ?slot.job, suspended, "service resumed");
        self.ctx.server = ServerState::Serving(slot);
    }

    fn emit_drop(&mut self, job: FinishedJob, reason: DropReason) {
        self.ctx.dropped += 1;
        self.out.push(EngineEvent::Dropped { job, reason });
    }
}
