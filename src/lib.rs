//! Discrete-event model of a single-server job queue drained over an
//! intermittently available delivery channel.
//!
//! The engine ([`QueueEngine`]) admits jobs against a waiting-store
//! capacity bound, orders them under a configurable discipline (FIFO, LIFO
//! or deadline-priority), suspends and resumes in-progress service across
//! channel-down windows, and applies a configurable policy to the deadlines
//! of waiting jobs when one fires or when the channel reconnects. The
//! `sim` module holds the surrounding harness: arrival source, statistics
//! sink and the run loop.

pub mod config;
pub mod core;
pub mod sim;

pub use self::config::{ConfigError, DeadlinePolicy, Discipline, EngineConfig, Sampler, Samplers};
pub use self::core::{Admission, DropReason, EngineEvent, FinishedJob, QueueEngine, Ticks};
pub use self::sim::{Dist, Sim, Sink, Source};
