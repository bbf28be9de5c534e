use std::cmp::Ordering;
use std::collections::VecDeque;

use keyed_priority_queue::KeyedPriorityQueue;

use super::state::{JobId, Ticks};
use crate::config::Discipline;

/// Sort key for the deadline-priority discipline: ascending
/// remaining-time-to-deadline, deadline-carrying jobs ahead of deadline-less
/// ones, ties broken by ascending creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Urgency {
    pub deadline_at: Option<Ticks>,
    pub created_at: Ticks,
}

// KeyedPriorityQueue is a max-heap, so Urgency's Ord is flipped: the most
// urgent entry must compare greatest.
impl Ord for Urgency {
    fn cmp(&self, other: &Self) -> Ordering {
        let natural = match (self.deadline_at, other.deadline_at) {
            (Some(a), Some(b)) => a.cmp(&b).then(self.created_at.cmp(&other.created_at)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.created_at.cmp(&other.created_at),
        };
        natural.reverse()
    }
}

impl PartialOrd for Urgency {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Admitted-but-not-yet-serviced jobs under the configured discipline.
#[derive(Debug)]
pub enum WaitingStore {
    Fifo(VecDeque<JobId>),
    Lifo(VecDeque<JobId>),
    ByDeadline(KeyedPriorityQueue<JobId, Urgency>),
}

impl WaitingStore {
    pub fn new(discipline: Discipline) -> Self {
        match discipline {
            Discipline::Fifo => Self::Fifo(VecDeque::new()),
            Discipline::Lifo => Self::Lifo(VecDeque::new()),
            Discipline::DeadlinePriority => Self::ByDeadline(KeyedPriorityQueue::new()),
        }
    }

    pub fn insert(&mut self, job: JobId, urgency: Urgency) {
        debug_assert!(!self.contains(job), "job already waiting");
        match self {
            Self::Fifo(jobs) | Self::Lifo(jobs) => jobs.push_back(job),
            Self::ByDeadline(jobs) => {
                jobs.push(job, urgency);
            }
        }
    }

    /// Head of the store per the discipline.
    pub fn pop(&mut self) -> Option<JobId> {
        match self {
            Self::Fifo(jobs) => jobs.pop_front(),
            Self::Lifo(jobs) => jobs.pop_back(),
            Self::ByDeadline(jobs) => jobs.pop().map(|(job, _)| job),
        }
    }

    /// Arbitrary removal, used for deadline-driven extraction.
    pub fn remove(&mut self, job: JobId) -> bool {
        match self {
            Self::Fifo(jobs) | Self::Lifo(jobs) => match jobs.iter().position(|&j| j == job) {
                Some(at) => {
                    jobs.remove(at);
                    true
                }
                None => false,
            },
            Self::ByDeadline(jobs) => jobs.remove(&job).is_some(),
        }
    }

    pub fn contains(&self, job: JobId) -> bool {
        match self {
            Self::Fifo(jobs) | Self::Lifo(jobs) => jobs.contains(&job),
            Self::ByDeadline(jobs) => jobs.get_priority(&job).is_some(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Fifo(jobs) | Self::Lifo(jobs) => jobs.len(),
            Self::ByDeadline(jobs) => jobs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = JobId> + '_> {
        match self {
            Self::Fifo(jobs) | Self::Lifo(jobs) => Box::new(jobs.iter().copied()),
            Self::ByDeadline(jobs) => Box::new(jobs.iter().map(|(&job, _)| job)),
        }
    }
}
