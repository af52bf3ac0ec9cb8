//! Domain types for the push-notification job worker.
//!
//! Everything in this crate is deterministic and infrastructure-free:
//! identifiers, the job record, the event-log record, and the explicit
//! job state machine. Persistence and caching live in `pushline-infra`.

pub mod event;
pub mod id;
pub mod job;
pub mod state;

pub use event::{event_types, EventLog};
pub use id::{EventId, IdParseError, JobId};
pub use job::Job;
pub use state::{JobSignal, JobStatus, TransitionError, UnknownStatus};
