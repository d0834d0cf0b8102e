//! Transport contract between the correlation layer and a hub.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::HubError;
use crate::hub::device::{DeviceCommand, DeviceEntity, DeviceFilter, DeviceUpdate};

/// Primitive operations a hub must expose for the client to run on top
/// of it.
///
/// Implementations are single-threaded collaborators (`?Send`); the client
/// never calls them concurrently from multiple threads. The hub carries no
/// request/response pairing of its own: `send_command` is fire-and-forget
/// with synchronous failure only, and replies come back solely through the
/// broadcast feed returned by [`subscribe`](HubTransport::subscribe).
#[async_trait(?Send)]
pub trait HubTransport {
    /// Bulk device discovery.
    ///
    /// Returns `Ok(None)` when the hub produced no usable result set, which
    /// bootstrap treats as a discovery failure distinct from an unreachable
    /// hub.
    async fn query_devices(
        &self,
        filter: &DeviceFilter,
    ) -> Result<Option<Vec<DeviceEntity>>, HubError>;

    /// Sends one fire-and-forget command addressed at a single device.
    ///
    /// A returned error is the only failure signal the hub ever gives;
    /// accepted commands may still be dropped downstream.
    async fn send_command(&self, command: DeviceCommand) -> Result<(), HubError>;

    /// Opens the hub's push feed of device updates.
    ///
    /// The feed carries every device's updates, including echoes of this
    /// client's own writes; the subscriber filters. The client subscribes
    /// exactly once for its lifetime.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<DeviceUpdate>;
}
