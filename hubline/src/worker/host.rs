//! Worker-side host: decodes inbound requests and runs command handlers.

use std::rc::Rc;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::hub::DeviceIdx;
use crate::wire::Envelope;
use crate::worker::registry::CommandRegistry;
use crate::worker::responder::{PublishFn, Responder};

/// The remote side of the protocol.
///
/// Owns the control device, decodes request envelopes written into it and
/// dispatches them to registered command handlers. Replies go out through
/// the publish closure given at construction, which writes into the control
/// device's data slot; over a [`MemoryHub`](crate::hub::MemoryHub) that is
/// `push_update`.
pub struct WorkerHost {
    control: DeviceIdx,
    commands: CommandRegistry,
    publish: Rc<PublishFn>,
}

impl WorkerHost {
    /// Creates a host answering on `control` with the given command table.
    pub fn new(
        control: DeviceIdx,
        commands: CommandRegistry,
        publish: impl Fn(DeviceIdx, String) + 'static,
    ) -> Self {
        Self {
            control,
            commands,
            publish: Rc::new(publish),
        }
    }

    /// The control device this host answers on.
    pub fn control(&self) -> DeviceIdx {
        self.control
    }

    /// Handles one raw write into the control device's data slot.
    ///
    /// Payloads that are not envelopes, and echoes of this host's own
    /// response or status writes, are ignored. A request naming an
    /// unregistered command is answered with an error response.
    pub async fn handle_request(&self, raw: &str) {
        let envelope = match Envelope::decode(raw) {
            Ok(envelope) => envelope,
            Err(_) => {
                tracing::debug!("ignoring foreign payload on the control device");
                return;
            }
        };
        let (request_id, command, params) = match envelope {
            Envelope::Request {
                request_id,
                command,
                params,
            } => (request_id, command, params),
            // Echoes of replies this host published.
            Envelope::Response { .. } | Envelope::Status { .. } => return,
        };

        let reply = Responder::new(self.control, request_id, Rc::clone(&self.publish));
        match self.commands.get(&command) {
            Some(handler) => {
                tracing::debug!(request = %request_id, command = %command, "executing command");
                handler.execute(params, reply).await;
            }
            None => {
                tracing::warn!(request = %request_id, command = %command, "unknown command");
                reply.send_error(Value::String(format!("Unknown command: {command}")));
            }
        }
    }

    /// Consumes a `(device, data)` feed until it closes, handling every
    /// write addressed at the control device.
    pub async fn run(&self, mut feed: mpsc::UnboundedReceiver<(DeviceIdx, String)>) {
        while let Some((device, data)) = feed.recv().await {
            if device != self.control {
                continue;
            }
            self.handle_request(&data).await;
        }
        tracing::debug!("request feed closed, worker host stopping");
    }
}
