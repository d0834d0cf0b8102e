//! Client facade over the hub transport.

use std::rc::Rc;

use serde_json::Value;

use crate::client::bootstrap::Bootstrap;
use crate::client::config::ClientConfig;
use crate::client::correlation::{Completion, PendingTable, RequestIdFactory};
use crate::client::dispatch::Dispatcher;
use crate::client::reply::ReplyHandle;
use crate::error::ClientError;
use crate::hub::{DeviceCommand, DeviceIdx, HubTransport};
use crate::wire::Envelope;

/// State shared between the client facade and its dispatcher.
pub(crate) struct ClientShared<H> {
    pub(crate) hub: H,
    pub(crate) bootstrap: Bootstrap,
    pub(crate) ids: RequestIdFactory,
    pub(crate) pending: PendingTable,
    pub(crate) max_pending: Option<usize>,
}

/// Client for issuing commands to the remote worker over a hub.
///
/// Construction yields the client together with its [`Dispatcher`]; the
/// dispatcher owns the single push-feed subscription and must be driven
/// (`run` on a local task, or `drain` in tests) for replies to settle.
///
/// The client is cheap to clone; clones share the bootstrap outcome, the
/// correlation counter and the pending table.
///
/// # Example
///
/// ```ignore
/// let (client, mut dispatcher) = WorkerClient::new(hub);
/// tokio::task::spawn_local(dispatcher.run());
/// let reply = client.send("list", None).await?.await?;
/// ```
pub struct WorkerClient<H: HubTransport> {
    shared: Rc<ClientShared<H>>,
}

impl<H: HubTransport> WorkerClient<H> {
    /// Builds a client with the default configuration.
    pub fn new(hub: H) -> (Self, Dispatcher<H>) {
        Self::with_config(hub, ClientConfig::default())
    }

    /// Builds a client with an explicit configuration.
    pub fn with_config(hub: H, config: ClientConfig) -> (Self, Dispatcher<H>) {
        let updates = hub.subscribe();
        let shared = Rc::new(ClientShared {
            hub,
            bootstrap: Bootstrap::new(config.selector),
            ids: RequestIdFactory::new(),
            pending: PendingTable::new(),
            max_pending: config.max_pending,
        });
        let dispatcher = Dispatcher::new(Rc::clone(&shared), updates);
        (Self { shared }, dispatcher)
    }

    /// Discovers and primes the control device.
    ///
    /// Memoized: the first call runs discovery, every later call awaits or
    /// returns the same outcome. `send` performs this implicitly; calling it
    /// up front only surfaces bootstrap failures earlier.
    ///
    /// # Errors
    ///
    /// [`ClientError::DiscoveryFailed`] when the hub query produced no
    /// usable result set, [`ClientError::EndpointNotFound`] when no device
    /// carries the control marker, [`ClientError::Transport`] when the query
    /// itself failed. A settled failure poisons the client; build a new one
    /// to retry discovery.
    pub async fn initialize(&self) -> Result<DeviceIdx, ClientError> {
        self.shared.bootstrap.ready(&self.shared.hub).await
    }

    /// The bound control device, once bootstrap has settled successfully.
    pub fn endpoint(&self) -> Option<DeviceIdx> {
        self.shared.bootstrap.endpoint()
    }

    /// Number of requests awaiting a terminal response.
    pub fn pending_count(&self) -> usize {
        self.shared.pending.len()
    }

    /// Sends one command to the worker and returns the handle for its reply.
    ///
    /// Suspends until bootstrap settles, allocates the next correlation id,
    /// registers the pending entry, then hands the request envelope to the
    /// hub. The returned [`ReplyHandle`] settles when the dispatcher routes
    /// the matching response; no timeout is applied here, callers layer
    /// their own.
    ///
    /// `command` must be an identifier the worker understands; `params` is
    /// passed through verbatim.
    ///
    /// # Errors
    ///
    /// Any memoized bootstrap failure; [`ClientError::Transport`] when the
    /// hub refused the envelope (the pending entry is removed again);
    /// [`ClientError::PendingLimit`] when a configured bound is reached.
    pub async fn send(
        &self,
        command: &str,
        params: Option<Value>,
    ) -> Result<ReplyHandle, ClientError> {
        let endpoint = self.shared.bootstrap.ready(&self.shared.hub).await?;

        if let Some(limit) = self.shared.max_pending {
            if self.shared.pending.len() >= limit {
                return Err(ClientError::PendingLimit { limit });
            }
        }

        let id = self.shared.ids.next();
        let envelope = Envelope::Request {
            request_id: id,
            command: command.to_string(),
            params,
        };
        let data = envelope
            .encode()
            .map_err(|error| ClientError::Encode(error.to_string()))?;

        // Registered before transmission so a reply racing the send's
        // completion still finds its entry.
        let (completion, handle) = Completion::new(id);
        self.shared.pending.register(id, completion);

        if let Err(error) = self
            .shared
            .hub
            .send_command(DeviceCommand::PushData {
                device: endpoint,
                data,
            })
            .await
        {
            self.shared.pending.discard(id);
            tracing::debug!(request = %id, %error, "request transmission failed");
            return Err(ClientError::Transport(error));
        }

        tracing::debug!(request = %id, command, "request sent");
        Ok(handle)
    }
}

impl<H: HubTransport> Clone for WorkerClient<H> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}
