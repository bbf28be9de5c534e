use offload_model::{
    Admission, DeadlinePolicy, Discipline, Dist, DropReason, EngineConfig, EngineEvent,
    FinishedJob, QueueEngine, Sampler, Samplers, Ticks,
};
use rand::rngs::StdRng;

const FAR: Ticks = 1_000_000;

/// Replays a fixed list of draws, then repeats the last one.
struct Seq {
    values: Vec<Ticks>,
    at: usize,
}

impl Sampler for Seq {
    fn sample(&mut self, _rng: &mut StdRng) -> Ticks {
        let value = self.values[self.at.min(self.values.len() - 1)];
        self.at += 1;
        value
    }
}

fn seq(values: &[Ticks]) -> Box<dyn Sampler> {
    Box::new(Seq {
        values: values.to_vec(),
        at: 0,
    })
}

fn constant(value: Ticks) -> Box<dyn Sampler> {
    Dist::Constant(value).boxed().unwrap()
}

fn config(
    discipline: Discipline,
    capacity: i64,
    policy: DeadlinePolicy,
    up: bool,
) -> EngineConfig {
    EngineConfig {
        discipline,
        capacity,
        deadline_policy: policy,
        channel_initially_up: up,
        seed: 0,
    }
}

fn outputs(events: &[EngineEvent]) -> (Vec<FinishedJob>, Vec<(FinishedJob, DropReason)>) {
    let mut completed = Vec::new();
    let mut dropped = Vec::new();
    for event in events {
        match *event {
            EngineEvent::Completed(job) => completed.push(job),
            EngineEvent::Dropped { job, reason } => dropped.push((job, reason)),
            _ => {}
        }
    }
    (completed, dropped)
}

// Capacity bounds the waiting store only: with capacity 2, one job serves
// and two queue, so three back-to-back arrivals all fit and a fourth is
// rejected.
#[test]
fn capacity_counts_waiting_jobs_only() {
    let samplers = Samplers {
        service: constant(10),
        deadline: constant(FAR),
        up_sojourn: constant(FAR),
        down_sojourn: constant(1),
    };
    let mut engine = QueueEngine::new(
        config(Discipline::Fifo, 2, DeadlinePolicy::DeleteOnReconnect, true),
        samplers,
    )
    .unwrap();

    assert!(matches!(engine.offer(), Admission::Accepted(_)));
    assert!(matches!(engine.offer(), Admission::Accepted(_)));
    assert!(matches!(engine.offer(), Admission::Accepted(_)));
    assert_eq!(engine.queue_len(), 2);
    assert!(matches!(engine.offer(), Admission::Rejected));

    engine.advance_to(100);
    let (completed, dropped) = outputs(&engine.take_events());
    assert_eq!(completed.len(), 3);
    let finish_times: Vec<Ticks> = completed.iter().map(|job| job.finished_at).collect();
    assert_eq!(finish_times, vec![10, 20, 30]);
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0].1, DropReason::Capacity);
    assert_eq!(engine.live_jobs(), 0);
}

// Channel drops at t=5 while a 10-tick job started at t=2 (elapsed 3,
// remaining 7); the channel returns at t=12, so completion lands at t=19
// with exactly 10 ticks of service accumulated.
#[test]
fn suspension_preserves_remaining_service_time() {
    let samplers = Samplers {
        service: constant(10),
        deadline: constant(FAR),
        up_sojourn: seq(&[5, FAR]),
        down_sojourn: constant(7),
    };
    let mut engine = QueueEngine::new(
        config(Discipline::Fifo, -1, DeadlinePolicy::DeleteOnReconnect, true),
        samplers,
    )
    .unwrap();

    engine.advance_to(2);
    assert!(matches!(engine.offer(), Admission::Accepted(_)));
    engine.advance_to(30);

    let (completed, dropped) = outputs(&engine.take_events());
    assert!(dropped.is_empty());
    assert_eq!(completed.len(), 1);
    let job = completed[0];
    assert_eq!(job.created_at, 2);
    assert_eq!(job.finished_at, 19);
    assert_eq!(job.service_time, 10);
    // The 7-tick outage counts as queueing.
    assert_eq!(job.queueing_time, 7);
}

// No service time is gained or lost across repeated suspend/resume cycles:
// a 20-tick job over up=5/down=3 alternation finishes at t=29 with exactly
// 20 ticks of service and 9 ticks of suspension counted as queueing.
#[test]
fn repeated_suspension_conserves_service_time() {
    let samplers = Samplers {
        service: constant(20),
        deadline: constant(FAR),
        up_sojourn: constant(5),
        down_sojourn: constant(3),
    };
    let mut engine = QueueEngine::new(
        config(Discipline::Fifo, -1, DeadlinePolicy::DeleteOnReconnect, true),
        samplers,
    )
    .unwrap();

    assert!(matches!(engine.offer(), Admission::Accepted(_)));
    engine.advance_to(100);

    let (completed, _) = outputs(&engine.take_events());
    assert_eq!(completed.len(), 1);
    let job = completed[0];
    assert_eq!(job.finished_at, 29);
    assert_eq!(job.service_time, 20);
    assert_eq!(job.queueing_time, 9);
}

// Deadline-priority discipline: a later arrival with a tighter deadline is
// served first.
#[test]
fn tighter_deadline_jumps_the_queue() {
    let samplers = Samplers {
        service: constant(1),
        deadline: seq(&[20, 4]),
        up_sojourn: constant(FAR),
        down_sojourn: constant(2),
    };
    let mut engine = QueueEngine::new(
        config(
            Discipline::DeadlinePriority,
            -1,
            DeadlinePolicy::ImmediateDrop,
            false,
        ),
        samplers,
    )
    .unwrap();

    assert!(matches!(engine.offer(), Admission::Accepted(_))); // deadline at 20
    engine.advance_to(1);
    assert!(matches!(engine.offer(), Admission::Accepted(_))); // deadline at 5
    engine.advance_to(10);

    let (completed, dropped) = outputs(&engine.take_events());
    assert!(dropped.is_empty());
    assert_eq!(completed.len(), 2);
    // Channel comes up at t=2; the t=1 arrival goes first.
    assert_eq!(completed[0].created_at, 1);
    assert_eq!(completed[0].finished_at, 3);
    assert_eq!(completed[1].created_at, 0);
    assert_eq!(completed[1].finished_at, 4);
}

// Immediate-drop: a waiting job whose deadline fires before the channel
// ever comes up is emitted on the dropped output and the queue-length
// telemetry reflects its removal.
#[test]
fn waiting_job_dropped_when_deadline_fires() {
    let samplers = Samplers {
        service: constant(1),
        deadline: constant(5),
        up_sojourn: constant(FAR),
        down_sojourn: constant(FAR),
    };
    let mut engine = QueueEngine::new(
        config(Discipline::Fifo, -1, DeadlinePolicy::ImmediateDrop, false),
        samplers,
    )
    .unwrap();

    assert!(matches!(engine.offer(), Admission::Accepted(_)));
    engine.advance_to(10);

    let events = engine.take_events();
    let (completed, dropped) = outputs(&events);
    assert!(completed.is_empty());
    assert_eq!(dropped.len(), 1);
    let (job, reason) = dropped[0];
    assert_eq!(reason, DropReason::Deadline);
    assert_eq!(job.finished_at, 5);
    assert_eq!(job.queueing_time, 5);
    assert_eq!(job.service_time, 0);
    assert_eq!(job.queue_count, 1);

    let lengths: Vec<usize> = events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::QueueLength(len) => Some(*len),
            _ => None,
        })
        .collect();
    assert_eq!(lengths, vec![0, 1, 0]);
    assert_eq!(engine.live_jobs(), 0);
}

// A deadline and the reconnect that would serve the job land on the same
// tick: the toggle dispatches first (scheduled earlier), service start
// extinguishes the timer, and the job completes.
#[test]
fn service_start_wins_same_instant_deadline() {
    let samplers = Samplers {
        service: constant(3),
        deadline: constant(5),
        up_sojourn: constant(FAR),
        down_sojourn: constant(5),
    };
    let mut engine = QueueEngine::new(
        config(Discipline::Fifo, -1, DeadlinePolicy::DeleteOnReconnect, false),
        samplers,
    )
    .unwrap();

    assert!(matches!(engine.offer(), Admission::Accepted(_)));
    engine.advance_to(20);

    let (completed, dropped) = outputs(&engine.take_events());
    assert!(dropped.is_empty());
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].finished_at, 8);
}

// Same timing under immediate-drop: the deadline is independent of server
// state, so it fires the instant after service starts and drops the job.
#[test]
fn immediate_drop_fires_even_after_service_start() {
    let samplers = Samplers {
        service: constant(3),
        deadline: constant(5),
        up_sojourn: constant(FAR),
        down_sojourn: constant(5),
    };
    let mut engine = QueueEngine::new(
        config(Discipline::Fifo, -1, DeadlinePolicy::ImmediateDrop, false),
        samplers,
    )
    .unwrap();

    assert!(matches!(engine.offer(), Admission::Accepted(_)));
    engine.advance_to(20);

    let (completed, dropped) = outputs(&engine.take_events());
    assert!(completed.is_empty());
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0].0.finished_at, 5);
    assert_eq!(dropped[0].1, DropReason::Deadline);
}

// Shift-on-reconnect pushes every outstanding deadline out by the length of
// the new up-window, so jobs that would have expired while waiting for the
// server survive to completion.
#[test]
fn shift_on_reconnect_rescues_waiting_jobs() {
    let samplers = Samplers {
        service: constant(10),
        deadline: seq(&[15, 6]),
        up_sojourn: constant(100),
        down_sojourn: constant(3),
    };
    let mut engine = QueueEngine::new(
        config(Discipline::Fifo, -1, DeadlinePolicy::ShiftOnReconnect, false),
        samplers,
    )
    .unwrap();

    assert!(matches!(engine.offer(), Admission::Accepted(_)));
    assert!(matches!(engine.offer(), Admission::Accepted(_)));
    engine.advance_to(50);

    let (completed, dropped) = outputs(&engine.take_events());
    assert!(dropped.is_empty());
    assert_eq!(completed.len(), 2);
    assert_eq!(completed[0].finished_at, 13);
    assert_eq!(completed[1].finished_at, 23);
}

// Identical timing under immediate-drop: the second job's deadline fires at
// t=6 while it is still waiting behind the first.
#[test]
fn immediate_drop_expires_the_waiting_job() {
    let samplers = Samplers {
        service: constant(10),
        deadline: seq(&[15, 6]),
        up_sojourn: constant(100),
        down_sojourn: constant(3),
    };
    let mut engine = QueueEngine::new(
        config(Discipline::Fifo, -1, DeadlinePolicy::ImmediateDrop, false),
        samplers,
    )
    .unwrap();

    assert!(matches!(engine.offer(), Admission::Accepted(_)));
    assert!(matches!(engine.offer(), Admission::Accepted(_)));
    engine.advance_to(50);

    let (completed, dropped) = outputs(&engine.take_events());
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].finished_at, 13);
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0].0.finished_at, 6);
    assert_eq!(dropped[0].1, DropReason::Deadline);
}

// Delete-on-reconnect leaves reconnected jobs waiting with no deadline at
// all: nothing expires even though service takes far longer than the drawn
// deadline lengths.
#[test]
fn delete_on_reconnect_clears_outstanding_deadlines() {
    let samplers = Samplers {
        service: constant(10),
        deadline: seq(&[15, 6]),
        up_sojourn: constant(100),
        down_sojourn: constant(3),
    };
    let mut engine = QueueEngine::new(
        config(Discipline::Fifo, -1, DeadlinePolicy::DeleteOnReconnect, false),
        samplers,
    )
    .unwrap();

    assert!(matches!(engine.offer(), Admission::Accepted(_)));
    assert!(matches!(engine.offer(), Admission::Accepted(_)));
    engine.advance_to(50);

    let (completed, dropped) = outputs(&engine.take_events());
    assert!(dropped.is_empty());
    assert_eq!(completed.len(), 2);
}

// Immediate-drop reaches a suspended job too: the rescheduled completion is
// cancelled and the job leaves on the dropped output.
#[test]
fn immediate_drop_cancels_suspended_service() {
    let samplers = Samplers {
        service: constant(10),
        deadline: constant(9),
        up_sojourn: seq(&[2, FAR]),
        down_sojourn: seq(&[4, 20]),
    };
    let mut engine = QueueEngine::new(
        config(Discipline::Fifo, -1, DeadlinePolicy::ImmediateDrop, false),
        samplers,
    )
    .unwrap();

    // Arrives during the initial outage, deadline at t=9. Service runs
    // t=4..6, suspends at t=6 (remaining 8), deadline fires at t=9.
    assert!(matches!(engine.offer(), Admission::Accepted(_)));
    engine.advance_to(40);

    let (completed, dropped) = outputs(&engine.take_events());
    assert!(completed.is_empty());
    assert_eq!(dropped.len(), 1);
    let (job, reason) = dropped[0];
    assert_eq!(reason, DropReason::Deadline);
    assert_eq!(job.finished_at, 9);
    assert_eq!(job.service_time, 2);
    assert_eq!(job.queueing_time, 7);
    assert_eq!(engine.live_jobs(), 0);
    assert!(!engine.is_busy());
}

// LIFO pops the most recent arrival first once the first job has seized the
// server.
#[test]
fn lifo_serves_newest_waiting_job_first() {
    let samplers = Samplers {
        service: constant(10),
        deadline: constant(FAR),
        up_sojourn: constant(FAR),
        down_sojourn: constant(1),
    };
    let mut engine = QueueEngine::new(
        config(Discipline::Lifo, -1, DeadlinePolicy::DeleteOnReconnect, true),
        samplers,
    )
    .unwrap();

    assert!(matches!(engine.offer(), Admission::Accepted(_)));
    engine.advance_to(1);
    assert!(matches!(engine.offer(), Admission::Accepted(_)));
    engine.advance_to(2);
    assert!(matches!(engine.offer(), Admission::Accepted(_)));
    engine.advance_to(100);

    let (completed, _) = outputs(&engine.take_events());
    let order: Vec<Ticks> = completed.iter().map(|job| job.created_at).collect();
    assert_eq!(order, vec![0, 2, 1]);
}
