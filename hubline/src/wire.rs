//! Wire envelope shared by the client and the worker.
//!
//! Every message crossing the hub is one JSON object written into the control
//! device's data slot. The `type` field tags the kind; correlation relies on
//! `requestId` being echoed back by the worker.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Correlation identifier carried by every envelope.
///
/// Allocated by the client from a strictly increasing counter starting at 1,
/// never reused within a process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl RequestId {
    /// Creates a request id from a raw value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw numeric value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One message carried inside a single device update.
///
/// Serialized as an internally tagged JSON object:
/// `{"type": "request" | "response" | "status", "requestId": n, ...}`.
/// Fields absent on the wire decode to their defaults (`payload` to JSON
/// null, `isError` to false); unknown `type` tags fail to decode and are
/// treated as foreign traffic by the receiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Envelope {
    /// Client-to-worker command invocation.
    #[serde(rename_all = "camelCase")]
    Request {
        /// Correlation id chosen by the client.
        request_id: RequestId,
        /// Command name understood by the worker.
        command: String,
        /// Optional command arguments; omitted on the wire when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        params: Option<Value>,
    },
    /// Worker-to-client terminal reply.
    #[serde(rename_all = "camelCase")]
    Response {
        /// Correlation id echoed from the originating request.
        request_id: RequestId,
        /// Result payload, or diagnostic detail when `is_error` is set.
        #[serde(default)]
        payload: Value,
        /// Marks the payload as a remote failure.
        #[serde(default)]
        is_error: bool,
    },
    /// Worker-to-client progress notification; zero or more may precede the
    /// terminal response.
    #[serde(rename_all = "camelCase")]
    Status {
        /// Correlation id echoed from the originating request.
        request_id: RequestId,
        /// Progress payload.
        #[serde(default)]
        payload: Value,
    },
}

impl Envelope {
    /// Serializes the envelope for the device data slot.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses one device update as an envelope.
    pub fn decode(raw: &str) -> Result<Envelope, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Returns the correlation id carried by any envelope kind.
    pub fn request_id(&self) -> RequestId {
        match self {
            Envelope::Request { request_id, .. }
            | Envelope::Response { request_id, .. }
            | Envelope::Status { request_id, .. } => *request_id,
        }
    }
}
