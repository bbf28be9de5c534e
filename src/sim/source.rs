use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::Sampler;
use crate::core::state::Ticks;

/// Bounded arrival generator: emits up to `num_jobs` arrival times starting
/// at `start_at`, spaced by draws from the inter-arrival sampler.
pub struct Source {
    interarrival: Box<dyn Sampler>,
    rng: StdRng,
    next_at: Ticks,
    remaining: u64,
}

impl Source {
    pub fn new(start_at: Ticks, num_jobs: u64, interarrival: Box<dyn Sampler>, seed: u64) -> Self {
        Self {
            interarrival,
            rng: StdRng::seed_from_u64(seed),
            next_at: start_at,
            remaining: num_jobs,
        }
    }

    /// Time of the next arrival, if any remain.
    pub fn peek(&self) -> Option<Ticks> {
        (self.remaining > 0).then_some(self.next_at)
    }

    pub fn pop(&mut self) -> Option<Ticks> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let at = self.next_at;
        self.next_at = at + self.interarrival.sample(&mut self.rng);
        Some(at)
    }
}
