//! # Hubline
//!
//! Request correlation for command/reply traffic over a one-way
//! home-automation push channel.
//!
//! A plugin-manager worker is reachable only through a virtual device on a
//! hub: the client writes JSON request envelopes into the device's data
//! slot, and the hub broadcasts every device update, the worker's reply
//! envelopes included, to all subscribers. Nothing on the channel
//! pairs requests with responses, so this crate supplies the correlation
//! layer both sides share.
//!
//! ## Crate Architecture
//!
//! ```text
//! ┌──────────────────────────────┐      ┌──────────────────────────────┐
//! │        client module         │      │        worker module         │
//! │  • WorkerClient (bootstrap,  │      │  • WorkerHost + registry     │
//! │    correlation ids, pending  │      │  • Responder (status /       │
//! │    table)                    │      │    response / error)         │
//! │  • Dispatcher (push feed)    │      │                              │
//! └──────────────┬───────────────┘      └──────────────┬───────────────┘
//!                │        wire module (Envelope)       │
//! ┌──────────────┴──────────────────────────────────────┴──────────────┐
//! │                            hub module                              │
//! │   HubTransport trait: query_devices / send_command / subscribe     │
//! │   MemoryHub: deterministic in-memory hub for tests and demos       │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use hubline::prelude::*;
//!
//! let (client, mut dispatcher) = WorkerClient::new(hub);
//! tokio::task::spawn_local(dispatcher.run());
//!
//! client.initialize().await?;
//! let catalog = client.list().await?;
//! ```
//!
//! The crate is single-threaded by design: shared state lives in `Rc` and
//! `Cell`/`RefCell`, traits are `#[async_trait(?Send)]`, and everything is
//! meant to run on a current-thread runtime.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

pub mod client;
pub mod commands;
pub mod error;
pub mod hub;
pub mod prelude;
pub mod wire;
pub mod worker;

// Re-exports
pub use client::{ClientConfig, Dispatcher, ProgressReceiver, ReplyHandle, WorkerClient};
pub use commands::PluginRecord;
pub use error::{ClientError, HubError};
pub use hub::{
    DeviceCommand, DeviceEntity, DeviceFilter, DeviceIdx, DeviceSelector, DeviceUpdate,
    HubTransport, MemoryHub,
};
pub use wire::{Envelope, RequestId};
pub use worker::{CommandHandler, CommandRegistry, Responder, WorkerHost};
