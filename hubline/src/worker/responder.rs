//! Per-request reply channel for command handlers.

use std::rc::Rc;

use serde_json::Value;

use crate::hub::DeviceIdx;
use crate::wire::{Envelope, RequestId};

/// Send seam the host injects for writing envelopes into the control
/// device's data slot.
pub(crate) type PublishFn = dyn Fn(DeviceIdx, String);

/// Reply channel handed to a command handler for exactly one request.
///
/// [`send_status`](Responder::send_status) may be called any number of
/// times; [`send`](Responder::send) and [`send_error`](Responder::send_error)
/// deliver the terminal response and consume the responder. Dropping an
/// unfulfilled responder publishes an error response instead, so a handler
/// that bails out early never leaves the client's request hanging.
pub struct Responder {
    device: DeviceIdx,
    request_id: RequestId,
    publish: Rc<PublishFn>,
    fulfilled: bool,
}

impl Responder {
    pub(crate) fn new(device: DeviceIdx, request_id: RequestId, publish: Rc<PublishFn>) -> Self {
        Self {
            device,
            request_id,
            publish,
            fulfilled: false,
        }
    }

    /// Correlation id of the request this responder belongs to.
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Emits one progress notification.
    pub fn send_status(&self, payload: Value) {
        self.publish_envelope(Envelope::Status {
            request_id: self.request_id,
            payload,
        });
    }

    /// Delivers the successful terminal response.
    pub fn send(mut self, payload: Value) {
        self.fulfilled = true;
        self.publish_envelope(Envelope::Response {
            request_id: self.request_id,
            payload,
            is_error: false,
        });
    }

    /// Delivers a failed terminal response; `payload` carries the
    /// diagnostic detail shown to the caller.
    pub fn send_error(mut self, payload: Value) {
        self.fulfilled = true;
        self.publish_envelope(Envelope::Response {
            request_id: self.request_id,
            payload,
            is_error: true,
        });
    }

    fn publish_envelope(&self, envelope: Envelope) {
        match envelope.encode() {
            Ok(data) => (self.publish)(self.device, data),
            Err(error) => {
                tracing::error!(request = %self.request_id, %error, "could not encode reply envelope");
            }
        }
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        if !self.fulfilled {
            self.fulfilled = true;
            self.publish_envelope(Envelope::Response {
                request_id: self.request_id,
                payload: Value::String("command handler dropped without replying".to_string()),
                is_error: true,
            });
        }
    }
}
