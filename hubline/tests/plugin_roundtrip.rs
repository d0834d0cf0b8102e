//! End-to-end tests: a [`WorkerClient`] and a [`WorkerHost`] wired to the
//! same in-memory hub, with a small plugin catalog behind the host's
//! command handlers.
//!
//! The deployment is pumped by hand: requests are pulled off the hub's
//! worker feed into the host, then the client's dispatcher is drained,
//! until no traffic is left in flight.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use hubline::prelude::*;
use tokio::sync::mpsc;

const CONTROL_IDX: u32 = 7;

type Catalog = Rc<RefCell<BTreeMap<String, PluginRecord>>>;

fn catalog_fixture() -> Catalog {
    let mut plugins = BTreeMap::new();
    plugins.insert(
        "domoticz-hue".to_string(),
        PluginRecord {
            key: "domoticz-hue".to_string(),
            name: "Hue Bridge".to_string(),
            author: "someone".to_string(),
            description: "Philips Hue support".to_string(),
            source: "https://example.org/hue/tree/master".to_string(),
            branches: vec!["master".to_string(), "develop".to_string()],
            is_installed: false,
            is_update_available: None,
        },
    );
    plugins.insert(
        "zigbee2mqtt".to_string(),
        PluginRecord {
            key: "zigbee2mqtt".to_string(),
            name: "Zigbee2MQTT".to_string(),
            author: "someone else".to_string(),
            description: "Zigbee gateway".to_string(),
            source: "https://example.org/z2m/tree/master".to_string(),
            branches: vec!["master".to_string()],
            is_installed: true,
            is_update_available: Some(true),
        },
    );
    Rc::new(RefCell::new(plugins))
}

/// Accepts both request shapes the worker sees in the wild: a bare string
/// key, or an object with a `plugin` field and an optional `branch`.
fn plugin_params(params: &Option<Value>) -> Option<(String, Option<String>)> {
    match params {
        Some(Value::String(key)) => Some((key.clone(), None)),
        Some(Value::Object(map)) => {
            let key = map.get("plugin")?.as_str()?.to_string();
            let branch = map
                .get("branch")
                .and_then(Value::as_str)
                .map(str::to_string);
            Some((key, branch))
        }
        _ => None,
    }
}

struct ListHandler {
    catalog: Catalog,
}

#[async_trait(?Send)]
impl CommandHandler for ListHandler {
    async fn execute(&self, _params: Option<Value>, reply: Responder) {
        match serde_json::to_value(&*self.catalog.borrow()) {
            Ok(catalog) => reply.send(catalog),
            Err(error) => reply.send_error(json!(error.to_string())),
        }
    }
}

struct InstallHandler {
    catalog: Catalog,
}

#[async_trait(?Send)]
impl CommandHandler for InstallHandler {
    async fn execute(&self, params: Option<Value>, reply: Responder) {
        let Some((key, branch)) = plugin_params(&params) else {
            reply.send_error(json!("Plugin not found"));
            return;
        };
        let mut catalog = self.catalog.borrow_mut();
        let Some(record) = catalog.get_mut(&key) else {
            reply.send_error(json!("Plugin not found"));
            return;
        };

        reply.send_status(json!("cloning"));
        record.is_installed = true;
        let branch = branch.unwrap_or_else(|| "master".to_string());
        reply.send(json!(format!("Successfully installed {key} ({branch})")));
    }
}

struct UninstallHandler {
    catalog: Catalog,
}

#[async_trait(?Send)]
impl CommandHandler for UninstallHandler {
    async fn execute(&self, params: Option<Value>, reply: Responder) {
        let Some((key, _)) = plugin_params(&params) else {
            reply.send_error(json!("Plugin not found"));
            return;
        };
        match self.catalog.borrow_mut().get_mut(&key) {
            Some(record) if record.is_installed => {
                record.is_installed = false;
                reply.send(json!(format!("Successfully removed {key}")));
            }
            _ => reply.send_error(json!("Plugin not found")),
        }
    }
}

struct UpdateHandler {
    catalog: Catalog,
}

#[async_trait(?Send)]
impl CommandHandler for UpdateHandler {
    async fn execute(&self, params: Option<Value>, reply: Responder) {
        let Some((key, _)) = plugin_params(&params) else {
            reply.send_error(json!("Plugin not found"));
            return;
        };
        match self.catalog.borrow_mut().get_mut(&key) {
            Some(record) if record.is_installed => {
                record.is_update_available = Some(false);
                reply.send(json!(format!("Successfully updated {key}")));
            }
            _ => reply.send_error(json!("Plugin not found")),
        }
    }
}

fn plugin_registry(catalog: &Catalog) -> CommandRegistry {
    let mut commands = CommandRegistry::new();
    commands.register(
        LIST,
        ListHandler {
            catalog: Rc::clone(catalog),
        },
    );
    commands.register(
        INSTALL,
        InstallHandler {
            catalog: Rc::clone(catalog),
        },
    );
    commands.register(
        UNINSTALL,
        UninstallHandler {
            catalog: Rc::clone(catalog),
        },
    );
    commands.register(
        UPDATE,
        UpdateHandler {
            catalog: Rc::clone(catalog),
        },
    );
    commands
}

struct Deployment {
    hub: MemoryHub,
    client: WorkerClient<MemoryHub>,
    dispatcher: Dispatcher<MemoryHub>,
    host: WorkerHost,
    feed: mpsc::UnboundedReceiver<(DeviceIdx, String)>,
}

impl Deployment {
    fn start(commands: CommandRegistry) -> Self {
        let hub = MemoryHub::new();
        hub.add_device(
            DeviceEntity::new(
                DeviceIdx::new(CONTROL_IDX),
                "Plugin Manager",
                MANAGER_HARDWARE,
                CONTROL_UNIT,
            )
            .hidden(),
        );

        let feed = hub.request_feed();
        let publisher = hub.clone();
        let host = WorkerHost::new(
            DeviceIdx::new(CONTROL_IDX),
            commands,
            move |device, data| publisher.push_update(device, data),
        );

        let (client, dispatcher) = WorkerClient::new(hub.clone());
        Self {
            hub,
            client,
            dispatcher,
            host,
            feed,
        }
    }

    /// Pumps worker and dispatcher until no traffic is left in flight.
    async fn settle(&mut self) {
        loop {
            let mut progressed = false;
            while let Ok((device, raw)) = self.feed.try_recv() {
                if device == self.host.control() {
                    self.host.handle_request(&raw).await;
                    progressed = true;
                }
            }
            if self.dispatcher.drain() > 0 {
                progressed = true;
            }
            if !progressed {
                break;
            }
        }
    }
}

fn plugin_deployment(catalog: &Catalog) -> Deployment {
    Deployment::start(plugin_registry(catalog))
}

#[tokio::test]
async fn list_roundtrips_the_typed_catalog() {
    let catalog = catalog_fixture();
    let mut deployment = plugin_deployment(&catalog);
    let client = deployment.client.clone();

    let (listed, ()) = tokio::join!(client.list(), deployment.settle());

    let listed = listed.expect("list");
    assert_eq!(listed.len(), 2);
    assert!(!listed["domoticz-hue"].is_installed);
    assert_eq!(listed["zigbee2mqtt"].is_update_available, Some(true));
}

#[tokio::test]
async fn install_updates_the_worker_catalog() {
    let catalog = catalog_fixture();
    let mut deployment = plugin_deployment(&catalog);
    let client = deployment.client.clone();

    let (message, ()) = tokio::join!(
        client.install("domoticz-hue", Some("develop")),
        deployment.settle()
    );

    assert_eq!(
        message.expect("install"),
        "Successfully installed domoticz-hue (develop)"
    );
    assert!(catalog.borrow()["domoticz-hue"].is_installed);
}

#[tokio::test]
async fn uninstall_accepts_the_bare_key_params() {
    let catalog = catalog_fixture();
    let mut deployment = plugin_deployment(&catalog);
    let client = deployment.client.clone();

    let (message, ()) = tokio::join!(client.uninstall("zigbee2mqtt"), deployment.settle());

    assert_eq!(message.expect("uninstall"), "Successfully removed zigbee2mqtt");
    assert!(!catalog.borrow()["zigbee2mqtt"].is_installed);
}

#[tokio::test]
async fn concurrent_commands_keep_their_own_replies() {
    let catalog = catalog_fixture();
    let mut deployment = plugin_deployment(&catalog);
    let client = deployment.client.clone();
    let sibling = client.clone();

    let (install, update, ()) = tokio::join!(
        client.install("domoticz-hue", None),
        sibling.update("zigbee2mqtt"),
        deployment.settle(),
    );

    assert_eq!(
        install.expect("install"),
        "Successfully installed domoticz-hue (master)"
    );
    assert_eq!(update.expect("update"), "Successfully updated zigbee2mqtt");
}

#[tokio::test]
async fn unknown_plugin_rejects_with_the_worker_diagnostic() {
    let catalog = catalog_fixture();
    let mut deployment = plugin_deployment(&catalog);
    let client = deployment.client.clone();

    let (message, ()) = tokio::join!(client.install("no-such-plugin", None), deployment.settle());

    assert_eq!(message, Err(ClientError::Remote(json!("Plugin not found"))));
}

#[tokio::test]
async fn uninstalling_an_absent_plugin_rejects() {
    let catalog = catalog_fixture();
    let mut deployment = plugin_deployment(&catalog);
    let client = deployment.client.clone();

    // Known key, but nothing installed under it.
    let (message, ()) = tokio::join!(client.uninstall("domoticz-hue"), deployment.settle());

    assert_eq!(message, Err(ClientError::Remote(json!("Plugin not found"))));
}

#[tokio::test]
async fn unknown_command_rejects_with_the_worker_diagnostic() {
    let catalog = catalog_fixture();
    let mut deployment = plugin_deployment(&catalog);
    let client = deployment.client.clone();

    let handle = client.send("frobnicate", None).await.expect("send");
    deployment.settle().await;

    assert_eq!(
        handle.await,
        Err(ClientError::Remote(json!("Unknown command: frobnicate")))
    );
}

#[tokio::test]
async fn progress_flows_from_handler_to_client() {
    let catalog = catalog_fixture();
    let mut deployment = plugin_deployment(&catalog);
    let client = deployment.client.clone();

    let mut handle = client
        .send(INSTALL, Some(json!({"plugin": "domoticz-hue"})))
        .await
        .expect("send");
    let mut progress = handle.take_progress().expect("progress receiver");
    deployment.settle().await;

    assert_eq!(progress.try_recv(), Some(json!("cloning")));
    assert_eq!(progress.try_recv(), None);
    assert_eq!(
        handle.await,
        Ok(json!("Successfully installed domoticz-hue (master)"))
    );

    // Only the request itself crossed the command channel; replies ride
    // the update feed.
    assert_eq!(deployment.hub.pushed_data().len(), 1);
}

#[tokio::test]
async fn a_handler_that_bails_out_still_answers() {
    struct Bailing;

    #[async_trait(?Send)]
    impl CommandHandler for Bailing {
        async fn execute(&self, _params: Option<Value>, _reply: Responder) {}
    }

    let mut commands = CommandRegistry::new();
    commands.register("flaky", Bailing);
    let mut deployment = Deployment::start(commands);
    let client = deployment.client.clone();

    let handle = client.send("flaky", None).await.expect("send");
    deployment.settle().await;

    assert_eq!(
        handle.await,
        Err(ClientError::Remote(json!(
            "command handler dropped without replying"
        )))
    );
}
