//! Device-level data model for the hub transport.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Hardware category tag the plugin-manager worker advertises on its
/// control device.
pub const MANAGER_HARDWARE: &str = "Plugin Manager";

/// Unit number reserved for the worker's control device.
pub const CONTROL_UNIT: u16 = 255;

/// Index of a device inside the hub's registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceIdx(pub u32);

impl DeviceIdx {
    /// Creates a device index from a raw value.
    pub fn new(idx: u32) -> Self {
        Self(idx)
    }

    /// Returns the raw numeric value.
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for DeviceIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One device as reported by the hub's bulk query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEntity {
    /// Registry index, used to address commands at the device.
    pub idx: DeviceIdx,
    /// Human-readable device name.
    pub name: String,
    /// Hardware category the device belongs to.
    pub hardware: String,
    /// Sub-index within its hardware; the worker reserves [`CONTROL_UNIT`].
    pub unit: u16,
    /// Whether the hub hides the device from normal listings.
    pub hidden: bool,
}

impl DeviceEntity {
    /// Creates a visible device entity.
    pub fn new(
        idx: DeviceIdx,
        name: impl Into<String>,
        hardware: impl Into<String>,
        unit: u16,
    ) -> Self {
        Self {
            idx,
            name: name.into(),
            hardware: hardware.into(),
            unit,
            hidden: false,
        }
    }

    /// Marks the device as hidden from normal listings.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// Type/role marker used to locate the control device during bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSelector {
    /// Hardware category the control device must belong to.
    pub hardware: String,
    /// Unit number the control device must carry.
    pub unit: u16,
}

impl DeviceSelector {
    /// Creates a selector for an arbitrary hardware/unit pair.
    pub fn new(hardware: impl Into<String>, unit: u16) -> Self {
        Self {
            hardware: hardware.into(),
            unit,
        }
    }

    /// Returns true when the entity carries this selector's marker.
    pub fn matches(&self, entity: &DeviceEntity) -> bool {
        entity.hardware == self.hardware && entity.unit == self.unit
    }
}

impl Default for DeviceSelector {
    /// The plugin-manager marker: [`MANAGER_HARDWARE`] at [`CONTROL_UNIT`].
    fn default() -> Self {
        Self::new(MANAGER_HARDWARE, CONTROL_UNIT)
    }
}

/// Scope of a bulk device query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceFilter {
    /// Include devices the hub hides from normal listings.
    pub include_hidden: bool,
    /// Include devices not referenced by any room or plan.
    pub include_unused: bool,
}

impl DeviceFilter {
    /// The widest scope: every device, hidden and unused ones included.
    ///
    /// Bootstrap queries with this filter because control devices are
    /// usually hidden.
    pub fn everything() -> Self {
        Self {
            include_hidden: true,
            include_unused: true,
        }
    }
}

/// One inbound push event: a device's data slot changed.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceUpdate {
    /// Device whose data slot changed.
    pub device: DeviceIdx,
    /// New raw contents of the data slot.
    pub data: String,
}

/// Outbound command addressed at a single device.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    /// Drop the device's stored history. Bootstrap issues this once,
    /// best-effort, to shed stale envelopes.
    ClearHistory {
        /// Target device.
        device: DeviceIdx,
    },
    /// Write a raw payload into the device's data slot.
    PushData {
        /// Target device.
        device: DeviceIdx,
        /// Payload to store; here always an encoded [`Envelope`].
        ///
        /// [`Envelope`]: crate::wire::Envelope
        data: String,
    },
}

impl DeviceCommand {
    /// Returns the device the command is addressed at.
    pub fn device(&self) -> DeviceIdx {
        match self {
            DeviceCommand::ClearHistory { device } | DeviceCommand::PushData { device, .. } => {
                *device
            }
        }
    }
}
