//! Error types for the client and for hub transport implementations.
//!
//! Both enums are `Clone` because the memoized bootstrap outcome is handed
//! to every waiter, and `PartialEq` so tests can match on exact failures.

use serde_json::Value;
use thiserror::Error;

use crate::hub::DeviceIdx;

/// Failure reported by a hub transport implementation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HubError {
    /// The hub could not be reached at all.
    #[error("hub unreachable: {0}")]
    Unreachable(String),

    /// The hub answered but refused the command.
    #[error("hub rejected the command: {0}")]
    Rejected(String),

    /// The command was addressed at a device the hub does not know.
    #[error("unknown device idx {0}")]
    UnknownDevice(DeviceIdx),
}

/// Failure surfaced to callers of the client.
///
/// Bootstrap failures (`DiscoveryFailed`, `EndpointNotFound`) are memoized
/// and poison the client for its lifetime; the per-request variants reject
/// only the request that hit them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    /// The bulk device query produced no usable result set.
    #[error("device discovery returned no usable result set")]
    DiscoveryFailed,

    /// No device carries the control-device marker.
    #[error("no control device matching hardware {hardware:?} unit {unit}")]
    EndpointNotFound {
        /// Hardware category the selector was looking for.
        hardware: String,
        /// Unit number the selector was looking for.
        unit: u16,
    },

    /// The hub transport failed while sending.
    #[error("transport: {0}")]
    Transport(#[from] HubError),

    /// The worker answered the request with an error response; the payload
    /// carries its diagnostic detail.
    #[error("worker reported an error: {0}")]
    Remote(Value),

    /// The outbound request envelope could not be serialized.
    #[error("failed to encode request envelope: {0}")]
    Encode(String),

    /// A terminal payload did not have the shape the typed helper expected.
    #[error("unexpected reply payload: {0}")]
    Payload(String),

    /// The client was torn down before the reply arrived.
    #[error("client torn down before the reply arrived")]
    Closed,

    /// The configured pending-request bound was reached.
    #[error("pending request limit reached ({limit})")]
    PendingLimit {
        /// The configured bound.
        limit: usize,
    },
}
