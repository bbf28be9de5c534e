use super::sink::Sink;
use super::source::Source;
use crate::core::driver::{Admission, QueueEngine};

/// Host harness: interleaves arrivals from a [`Source`] with the engine's
/// internal events in time order and feeds everything the engine emits to
/// a [`Sink`].
pub struct Sim {
    pub engine: QueueEngine,
    pub sink: Sink,
    source: Source,
    pub offered: u64,
    pub accepted: u64,
}

impl Sim {
    pub fn new(engine: QueueEngine, source: Source) -> Self {
        Self {
            engine,
            sink: Sink::new(),
            source,
            offered: 0,
            accepted: 0,
        }
    }

    /// Feeds every arrival, then drains the engine until it holds no jobs.
    /// Internal events scheduled at an arrival's timestamp dispatch first.
    pub fn run(&mut self) {
        while let Some(at) = self.source.peek() {
            self.engine.advance_to(at);
            self.source.pop();
            self.offered += 1;
            if let Admission::Accepted(_) = self.engine.offer() {
                self.accepted += 1;
            }
            self.pump();
        }
        while self.engine.live_jobs() > 0 {
            assert!(self.engine.step(), "jobs outstanding but timeline empty");
            self.pump();
        }
    }

    fn pump(&mut self) {
        for event in self.engine.take_events() {
            self.sink.accept(event);
        }
    }
}
