//! In-memory hub implementation for tests and demos.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};

use crate::error::HubError;
use crate::hub::device::{DeviceCommand, DeviceEntity, DeviceFilter, DeviceIdx, DeviceUpdate};
use crate::hub::traits::HubTransport;

/// Deterministic [`HubTransport`] backed by plain in-process state.
///
/// Behaves like the real hub as far as the correlation layer can tell: bulk
/// queries over a device table, fire-and-forget commands with synchronous
/// failure, and a broadcast feed that echoes every data write back to all
/// subscribers. On top of that it records every `send_command` invocation,
/// counts queries, and offers failure injection plus a query gate so tests
/// can order events deterministically.
///
/// The hub is cheaply cloneable; clones share state, letting a test keep a
/// handle while the client owns another.
#[derive(Clone, Default)]
pub struct MemoryHub {
    inner: Rc<Inner>,
}

#[derive(Default)]
struct Inner {
    devices: RefCell<Vec<DeviceEntity>>,
    subscribers: RefCell<Vec<mpsc::UnboundedSender<DeviceUpdate>>>,
    journal: RefCell<Vec<DeviceCommand>>,
    worker_feed: RefCell<Option<mpsc::UnboundedSender<(DeviceIdx, String)>>>,
    query_count: Cell<u32>,
    fail_queries: Cell<bool>,
    omit_query_result: Cell<bool>,
    fail_sends: Cell<bool>,
    hold_queries: Cell<bool>,
    query_gate: Notify,
}

impl MemoryHub {
    /// Creates an empty hub with no devices and no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a device in the hub's table.
    pub fn add_device(&self, device: DeviceEntity) {
        self.inner.devices.borrow_mut().push(device);
    }

    /// Emits an inbound update for `device`, as the hub does when the worker
    /// writes into a data slot.
    pub fn push_update(&self, device: DeviceIdx, data: impl Into<String>) {
        self.broadcast(DeviceUpdate {
            device,
            data: data.into(),
        });
    }

    /// Every `send_command` invocation so far, in call order, including
    /// failed ones.
    pub fn commands(&self) -> Vec<DeviceCommand> {
        self.inner.journal.borrow().clone()
    }

    /// The `PushData` subset of [`commands`](MemoryHub::commands).
    pub fn pushed_data(&self) -> Vec<(DeviceIdx, String)> {
        self.inner
            .journal
            .borrow()
            .iter()
            .filter_map(|command| match command {
                DeviceCommand::PushData { device, data } => Some((*device, data.clone())),
                DeviceCommand::ClearHistory { .. } => None,
            })
            .collect()
    }

    /// Number of `query_devices` calls that ran to the query itself.
    pub fn query_count(&self) -> u32 {
        self.inner.query_count.get()
    }

    /// Makes subsequent queries fail as unreachable.
    pub fn fail_queries(&self, fail: bool) {
        self.inner.fail_queries.set(fail);
    }

    /// Makes subsequent queries succeed with no result set.
    pub fn omit_query_result(&self, omit: bool) {
        self.inner.omit_query_result.set(omit);
    }

    /// Makes subsequent sends fail as unreachable. Invocations are still
    /// journaled.
    pub fn fail_sends(&self, fail: bool) {
        self.inner.fail_sends.set(fail);
    }

    /// Parks subsequent queries until [`release_queries`] is called.
    ///
    /// [`release_queries`]: MemoryHub::release_queries
    pub fn hold_queries(&self) {
        self.inner.hold_queries.set(true);
    }

    /// Releases queries parked by [`hold_queries`](MemoryHub::hold_queries).
    pub fn release_queries(&self) {
        self.inner.hold_queries.set(false);
        self.inner.query_gate.notify_waiters();
    }

    /// Opens the worker-side feed of `(device, data)` pairs carried by
    /// `PushData` commands. A later call replaces the previous feed.
    pub fn request_feed(&self) -> mpsc::UnboundedReceiver<(DeviceIdx, String)> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.inner.worker_feed.borrow_mut() = Some(tx);
        rx
    }

    fn broadcast(&self, update: DeviceUpdate) {
        self.inner
            .subscribers
            .borrow_mut()
            .retain(|subscriber| subscriber.send(update.clone()).is_ok());
    }
}

#[async_trait(?Send)]
impl HubTransport for MemoryHub {
    async fn query_devices(
        &self,
        filter: &DeviceFilter,
    ) -> Result<Option<Vec<DeviceEntity>>, HubError> {
        while self.inner.hold_queries.get() {
            self.inner.query_gate.notified().await;
        }
        self.inner.query_count.set(self.inner.query_count.get() + 1);

        if self.inner.fail_queries.get() {
            return Err(HubError::Unreachable("injected query failure".to_string()));
        }
        if self.inner.omit_query_result.get() {
            return Ok(None);
        }

        let devices = self
            .inner
            .devices
            .borrow()
            .iter()
            .filter(|device| filter.include_hidden || !device.hidden)
            .cloned()
            .collect();
        Ok(Some(devices))
    }

    async fn send_command(&self, command: DeviceCommand) -> Result<(), HubError> {
        self.inner.journal.borrow_mut().push(command.clone());

        if self.inner.fail_sends.get() {
            return Err(HubError::Unreachable("injected send failure".to_string()));
        }
        let known = self
            .inner
            .devices
            .borrow()
            .iter()
            .any(|device| device.idx == command.device());
        if !known {
            return Err(HubError::UnknownDevice(command.device()));
        }

        if let DeviceCommand::PushData { device, data } = &command {
            if let Some(feed) = self.inner.worker_feed.borrow().as_ref() {
                let _ = feed.send((*device, data.clone()));
            }
            // The real hub broadcasts every data write, the writer's own
            // included.
            self.broadcast(DeviceUpdate {
                device: *device,
                data: data.clone(),
            });
        }
        Ok(())
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<DeviceUpdate> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.subscribers.borrow_mut().push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::device::{CONTROL_UNIT, MANAGER_HARDWARE};

    fn control_device(idx: u32) -> DeviceEntity {
        DeviceEntity::new(DeviceIdx::new(idx), "Manager", MANAGER_HARDWARE, CONTROL_UNIT).hidden()
    }

    #[tokio::test]
    async fn query_respects_the_hidden_flag() {
        let hub = MemoryHub::new();
        hub.add_device(control_device(7));
        hub.add_device(DeviceEntity::new(DeviceIdx::new(3), "Lamp", "Hue Bridge", 1));

        let visible = hub
            .query_devices(&DeviceFilter::default())
            .await
            .expect("query")
            .expect("result set");
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].idx, DeviceIdx::new(3));

        let all = hub
            .query_devices(&DeviceFilter::everything())
            .await
            .expect("query")
            .expect("result set");
        assert_eq!(all.len(), 2);
        assert_eq!(hub.query_count(), 2);
    }

    #[tokio::test]
    async fn send_rejects_unknown_devices_but_journals_the_attempt() {
        let hub = MemoryHub::new();

        let result = hub
            .send_command(DeviceCommand::ClearHistory {
                device: DeviceIdx::new(9),
            })
            .await;

        assert_eq!(result, Err(HubError::UnknownDevice(DeviceIdx::new(9))));
        assert_eq!(hub.commands().len(), 1);
    }

    #[tokio::test]
    async fn push_data_reaches_subscribers_and_the_worker_feed() {
        let hub = MemoryHub::new();
        hub.add_device(control_device(7));
        let mut updates = hub.subscribe();
        let mut feed = hub.request_feed();

        hub.send_command(DeviceCommand::PushData {
            device: DeviceIdx::new(7),
            data: "{\"type\":\"request\",\"requestId\":1,\"command\":\"list\"}".to_string(),
        })
        .await
        .expect("send");

        let update = updates.try_recv().expect("echoed update");
        assert_eq!(update.device, DeviceIdx::new(7));

        let (device, data) = feed.try_recv().expect("worker delivery");
        assert_eq!(device, DeviceIdx::new(7));
        assert_eq!(data, update.data);
    }

    #[tokio::test]
    async fn injected_send_failure_skips_delivery() {
        let hub = MemoryHub::new();
        hub.add_device(control_device(7));
        let mut updates = hub.subscribe();
        hub.fail_sends(true);

        let result = hub
            .send_command(DeviceCommand::PushData {
                device: DeviceIdx::new(7),
                data: "{}".to_string(),
            })
            .await;

        assert!(matches!(result, Err(HubError::Unreachable(_))));
        assert!(updates.try_recv().is_err());
        assert_eq!(hub.commands().len(), 1);
    }

    #[tokio::test]
    async fn held_queries_park_until_released() {
        let hub = MemoryHub::new();
        hub.add_device(control_device(7));
        hub.hold_queries();

        let (devices, ()) = tokio::join!(
            async {
                hub.query_devices(&DeviceFilter::everything())
                    .await
                    .expect("query")
            },
            async {
                assert_eq!(hub.query_count(), 0);
                hub.release_queries();
            }
        );

        assert_eq!(devices.expect("result set").len(), 1);
        assert_eq!(hub.query_count(), 1);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let hub = MemoryHub::new();
        let handle = hub.clone();
        handle.add_device(control_device(7));

        let devices = hub
            .query_devices(&DeviceFilter::everything())
            .await
            .expect("query")
            .expect("result set");
        assert_eq!(devices.len(), 1);
    }
}
