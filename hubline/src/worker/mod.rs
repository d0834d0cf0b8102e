//! Worker side of the protocol.
//!
//! - **WorkerHost**: decodes inbound request envelopes and dispatches them
//! - **CommandRegistry / CommandHandler**: the worker's command table
//! - **Responder**: per-request reply channel (status, response, error)

mod host;
mod registry;
mod responder;

pub use host::WorkerHost;
pub use registry::{CommandHandler, CommandRegistry};
pub use responder::Responder;
