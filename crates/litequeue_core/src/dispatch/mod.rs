//! Background dispatch.
//!
//! A [`Supervisor`] owns the single dispatch worker of a queue. The worker
//! repeatedly peeks the oldest item, hands it to the registered handler, and
//! settles the returned [`Disposition`](crate::Disposition). When the worker
//! dies from a handler panic the supervisor logs it and spawns a fresh one,
//! throttled by the queue's [`RestartPolicy`](crate::RestartPolicy).

mod supervisor;
mod worker;

pub use supervisor::RestartTracker;
pub(crate) use supervisor::Supervisor;
pub(crate) use worker::Worker;
