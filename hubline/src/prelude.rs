//! Common imports for working with the correlation layer.
//!
//! Pulls in the client and worker surfaces, the device model and the wire
//! types in one `use hubline::prelude::*;`.

// Re-export crate types
pub use crate::client::{ClientConfig, Dispatcher, ProgressReceiver, ReplyHandle, WorkerClient};
pub use crate::commands::{PluginRecord, INSTALL, LIST, UNINSTALL, UPDATE};
pub use crate::error::{ClientError, HubError};
pub use crate::hub::{
    DeviceCommand, DeviceEntity, DeviceFilter, DeviceIdx, DeviceSelector, DeviceUpdate,
    HubTransport, MemoryHub, CONTROL_UNIT, MANAGER_HARDWARE,
};
pub use crate::wire::{Envelope, RequestId};
pub use crate::worker::{CommandHandler, CommandRegistry, Responder, WorkerHost};

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use serde_json::{json, Value};

/// Result type for client-facing operations.
pub type Result<T> = std::result::Result<T, ClientError>;
