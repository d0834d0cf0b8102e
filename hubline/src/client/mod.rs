//! Client side of the correlation layer.
//!
//! - **WorkerClient**: facade issuing commands and tracking their replies
//! - **Dispatcher**: single push-feed subscription settling pending requests
//! - **ReplyHandle / ProgressReceiver**: per-request outcome and progress
//! - **ClientConfig**: control-device selector and pending bound
//!
//! Bootstrap, correlation ids and the pending table are internal; they are
//! exercised through `WorkerClient` and the dispatcher.

mod bootstrap;
mod config;
mod core;
mod correlation;
mod dispatch;
mod reply;

pub use config::ClientConfig;
pub use dispatch::Dispatcher;
pub use reply::{ProgressReceiver, ReplyHandle};
pub use self::core::WorkerClient;
