//! Off-thread execution of LOD, culling, error and simplification batches.
//!
//! Requests and responses are plain messages (see [`protocol`]); a
//! [`TaskDispatcher`] fans them out to a pool of [`Worker`] threads and
//! hands completions back without blocking the caller.

mod dispatcher;
pub mod protocol;
mod worker;

pub use dispatcher::{Completion, DispatchError, DispatchSettings, TaskDispatcher, TaskTicket};
pub use protocol::{Request, Response, TaskKind};
pub use worker::{Worker, WorkerStats};
