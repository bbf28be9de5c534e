pub mod deadline;
pub mod driver;
pub mod event;
pub mod observer;
pub mod state;
pub mod store;
pub mod timeline;

pub use deadline::DeadlineManager;
pub use driver::{Admission, QueueEngine};
pub use event::{DropReason, EngineEvent, EventKind};
pub use state::{FinishedJob, Job, JobId, ServerState, Ticks};
pub use store::{Urgency, WaitingStore};
pub use timeline::{TimerId, Timeline};
