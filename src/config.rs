use std::str::FromStr;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::state::Ticks;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown queue discipline `{0}`")]
    UnknownDiscipline(String),
    #[error("unknown deadline policy `{0}`")]
    UnknownPolicy(String),
    #[error("capacity must be -1 (unbounded) or non-negative, got {0}")]
    InvalidCapacity(i64),
    #[error("invalid distribution: {0}")]
    Distribution(String),
}

/// Ordering rule applied to the waiting store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Discipline {
    Fifo,
    Lifo,
    DeadlinePriority,
}

impl FromStr for Discipline {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fifo" => Ok(Self::Fifo),
            "lifo" => Ok(Self::Lifo),
            "deadline-priority" => Ok(Self::DeadlinePriority),
            other => Err(ConfigError::UnknownDiscipline(other.to_string())),
        }
    }
}

/// What happens to a registered deadline over the job's lifetime.
///
/// `ImmediateDrop` fires regardless of where the job currently is. The other
/// two only ever fire for jobs still in the waiting store: service start
/// cancels their timer, and a reconnect either discards or postpones the
/// timers of everything still waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeadlinePolicy {
    ImmediateDrop,
    DeleteOnReconnect,
    ShiftOnReconnect,
}

impl FromStr for DeadlinePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "immediate-drop" => Ok(Self::ImmediateDrop),
            "delete-on-reconnect" => Ok(Self::DeleteOnReconnect),
            "shift-on-reconnect" => Ok(Self::ShiftOnReconnect),
            other => Err(ConfigError::UnknownPolicy(other.to_string())),
        }
    }
}

/// Start-up configuration, constant for the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub discipline: Discipline,
    /// Waiting-store bound; `-1` means unbounded. The in-service job does
    /// not occupy a slot.
    pub capacity: i64,
    pub deadline_policy: DeadlinePolicy,
    pub channel_initially_up: bool,
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            discipline: Discipline::Fifo,
            capacity: -1,
            deadline_policy: DeadlinePolicy::ImmediateDrop,
            channel_initially_up: false,
            seed: 0,
        }
    }
}

impl EngineConfig {
    pub fn capacity_bound(&self) -> Result<Option<usize>, ConfigError> {
        match self.capacity {
            -1 => Ok(None),
            n if n >= 0 => Ok(Some(n as usize)),
            n => Err(ConfigError::InvalidCapacity(n)),
        }
    }
}

/// Draws durations for the engine. Implemented by `sim::dist::Dist`; hosts
/// may supply their own.
pub trait Sampler {
    fn sample(&mut self, rng: &mut StdRng) -> Ticks;
}

/// The four duration sources the engine consumes.
pub struct Samplers {
    pub service: Box<dyn Sampler>,
    pub deadline: Box<dyn Sampler>,
    pub up_sojourn: Box<dyn Sampler>,
    pub down_sojourn: Box<dyn Sampler>,
}
