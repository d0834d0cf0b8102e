//! Hub transport abstraction.
//!
//! The hub is the external collaborator the correlation layer runs on top
//! of:
//!
//! - **HubTransport**: trait covering the three primitives the client needs
//!   (bulk device query, fire-and-forget command, broadcast update feed)
//! - **Device model**: entities, selectors, filters, commands and updates
//! - **MemoryHub**: deterministic in-memory implementation for tests and
//!   demos

pub mod device;
pub mod memory;
pub mod traits;

// Re-exports
pub use device::{
    DeviceCommand, DeviceEntity, DeviceFilter, DeviceIdx, DeviceSelector, DeviceUpdate,
    CONTROL_UNIT, MANAGER_HARDWARE,
};
pub use memory::MemoryHub;
pub use traits::HubTransport;
