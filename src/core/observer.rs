use super::deadline::DeadlineManager;
use super::state::{EngineCtx, ServerState, ServiceSlot, Ticks};
use super::timeline::Timeline;
use crate::config::DeadlinePolicy;

/// Cross-structure invariant checks, run after every dispatched event.
/// Violations indicate an engine defect, never bad input, so they assert.
#[derive(Debug)]
pub struct Observer {
    step: u64,
}

impl Observer {
    pub fn new() -> Self {
        Self { step: 0 }
    }

    pub fn observe(
        &mut self,
        now: Ticks,
        ctx: &EngineCtx,
        deadlines: &DeadlineManager,
        timeline: &Timeline,
    ) {
        self.step += 1;

        if let Some(cap) = ctx.capacity {
            debug_assert!(
                ctx.store.len() <= cap,
                "waiting store exceeded capacity {cap}"
            );
        }

        match &ctx.server {
            ServerState::Idle => {}
            ServerState::Serving(slot) => {
                debug_assert!(ctx.channel.up, "serving while channel is down");
                self.check_slot(now, ctx, timeline, slot);
            }
            ServerState::Suspended(slot) => {
                debug_assert!(!ctx.channel.up, "suspended while channel is up");
                self.check_slot(now, ctx, timeline, slot);
            }
        }

        // Ownership conservation: every live job is held by exactly one of
        // the waiting store or the server slot.
        let occupied = usize::from(ctx.server.occupant().is_some());
        debug_assert_eq!(
            ctx.jobs.len(),
            ctx.store.len() + occupied,
            "job owned by zero or two places"
        );

        for job in ctx.store.iter() {
            debug_assert!(ctx.jobs.contains_key(job), "store holds a released job");
            debug_assert_ne!(
                Some(job),
                ctx.server.occupant(),
                "job both waiting and in service"
            );
            debug_assert!(ctx.jobs[job].stamp <= now, "job stamp ahead of the clock");
        }

        for (job, timer) in deadlines.iter() {
            debug_assert!(
                ctx.jobs.contains_key(job),
                "deadline registered for a released job"
            );
            debug_assert!(
                timeline.is_scheduled(timer),
                "deadline registry points at a dead timer"
            );
            if ctx.server.occupant() == Some(job) {
                debug_assert_eq!(
                    deadlines.policy(),
                    DeadlinePolicy::ImmediateDrop,
                    "in-service job still holds a deadline"
                );
            }
        }

        debug_assert!(
            timeline.is_scheduled(ctx.channel.toggle_timer),
            "channel toggle timer not pending"
        );
    }

    fn check_slot(&self, now: Ticks, ctx: &EngineCtx, timeline: &Timeline, slot: &ServiceSlot) {
        debug_assert!(
            ctx.jobs.contains_key(slot.job),
            "server slot holds a released job"
        );
        debug_assert!(
            !ctx.store.contains(slot.job),
            "in-service job still in the waiting store"
        );
        debug_assert!(
            timeline.is_scheduled(slot.completion),
            "occupied server has no pending completion"
        );
        debug_assert!(
            slot.remaining <= slot.cur_service,
            "remaining service exceeds the drawn duration"
        );
        debug_assert!(
            ctx.jobs[slot.job].stamp <= now,
            "in-service job stamp ahead of the clock"
        );
    }
}

impl Default for Observer {
    fn default() -> Self {
        Self::new()
    }
}
