//! Standing subscription routing inbound updates to pending requests.

use std::rc::Rc;

use tokio::sync::mpsc;

use crate::client::core::ClientShared;
use crate::error::ClientError;
use crate::hub::{DeviceUpdate, HubTransport};
use crate::wire::Envelope;

impl<H: HubTransport> ClientShared<H> {
    /// Routes one inbound update.
    ///
    /// Updates for other devices, updates arriving before an endpoint is
    /// bound, and payloads that are not envelopes are dropped without
    /// logging: the feed is a shared broadcast channel and foreign traffic
    /// on it is routine, not an error. The same goes for correlation ids
    /// with no pending entry.
    pub(crate) fn dispatch(&self, update: DeviceUpdate) {
        let Some(endpoint) = self.bootstrap.endpoint() else {
            return;
        };
        if update.device != endpoint {
            return;
        }
        let Ok(envelope) = Envelope::decode(&update.data) else {
            return;
        };

        match envelope {
            // Echo of this client's own outbound write.
            Envelope::Request { .. } => {}
            Envelope::Status {
                request_id,
                payload,
            } => {
                // Progress only; the entry stays pending.
                self.pending.notify(request_id, payload);
            }
            Envelope::Response {
                request_id,
                payload,
                is_error,
            } => {
                let outcome = if is_error {
                    Err(ClientError::Remote(payload))
                } else {
                    Ok(payload)
                };
                self.pending.complete(request_id, outcome);
            }
        }
    }
}

/// Consumer of the hub's push feed.
///
/// Created together with its [`WorkerClient`](crate::client::WorkerClient);
/// there is exactly one subscription per client. Drive it with
/// [`run`](Dispatcher::run) on a local task, or step it deterministically
/// with [`drain`](Dispatcher::drain). An undriven dispatcher never settles
/// any reply.
pub struct Dispatcher<H: HubTransport> {
    shared: Rc<ClientShared<H>>,
    updates: mpsc::UnboundedReceiver<DeviceUpdate>,
}

impl<H: HubTransport> Dispatcher<H> {
    pub(crate) fn new(
        shared: Rc<ClientShared<H>>,
        updates: mpsc::UnboundedReceiver<DeviceUpdate>,
    ) -> Self {
        Self { shared, updates }
    }

    /// Processes updates in delivery order until the hub closes the feed.
    pub async fn run(mut self) {
        while let Some(update) = self.updates.recv().await {
            self.shared.dispatch(update);
        }
        tracing::debug!("hub push feed closed, dispatcher stopping");
    }

    /// Processes every update already delivered and returns how many were
    /// handled. Lets single-threaded tests step the feed deterministically.
    pub fn drain(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(update) = self.updates.try_recv() {
            self.shared.dispatch(update);
            handled += 1;
        }
        handled
    }
}
