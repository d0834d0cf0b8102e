//! Plugin-manager demo: a client and a worker sharing one in-memory hub.
//!
//! The worker registers handlers for the `list` and `install` commands and
//! answers on a hidden control device. The client discovers that device,
//! fetches the catalog, installs a plugin while printing its progress
//! notifications, then lists again.
//!
//! ```bash
//! cargo run --example plugin_manager
//! ```
//!
//! Everything runs on one thread: both endpoints are spawned on a
//! `LocalSet`, and all traffic flows through the in-memory hub.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use hubline::prelude::*;

// ============================================================================
// Configuration
// ============================================================================

const CONTROL_IDX: u32 = 42;

// ============================================================================
// Worker Side
// ============================================================================

type Catalog = Rc<RefCell<BTreeMap<String, PluginRecord>>>;

fn seed_catalog() -> Catalog {
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
            is_update_available: Some(false),
        },
    );
    Rc::new(RefCell::new(plugins))
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
        let key = params
            .as_ref()
            .and_then(|params| params.get("plugin"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let Some(key) = key else {
            reply.send_error(json!("Plugin not found"));
            return;
        };
        if !self.catalog.borrow().contains_key(&key) {
            reply.send_error(json!("Plugin not found"));
            return;
        }

        reply.send_status(json!("cloning repository"));
        tokio::time::sleep(Duration::from_millis(25)).await;
        reply.send_status(json!("checking out master"));
        tokio::time::sleep(Duration::from_millis(25)).await;

        if let Some(record) = self.catalog.borrow_mut().get_mut(&key) {
            record.is_installed = true;
        }
        reply.send(json!(format!("Successfully installed {key}")));
    }
}

fn demo_registry(catalog: &Catalog) -> CommandRegistry {
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
    commands
}

// ============================================================================
// Client Flow
// ============================================================================

fn print_catalog(catalog: &BTreeMap<String, PluginRecord>) {
    for (key, record) in catalog {
        println!(
            "  {key}: {} by {} (installed: {})",
            record.name, record.author, record.is_installed
        );
    }
    println!();
}

async fn run() -> Result<()> {
    println!("=== Plugin Manager Demo ===\n");

    // One hub, one hidden control device.
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

    // Worker: command handlers over a seeded catalog, replies written back
    // into the control device's data slot.
    let catalog = seed_catalog();
    let feed = hub.request_feed();
    let publisher = hub.clone();
    let host = WorkerHost::new(
        DeviceIdx::new(CONTROL_IDX),
        demo_registry(&catalog),
        move |device, data| publisher.push_update(device, data),
    );
    tokio::task::spawn_local(async move { host.run(feed).await });

    // Client: dispatcher on its own local task.
    let (client, dispatcher) = WorkerClient::new(hub);
    tokio::task::spawn_local(dispatcher.run());

    let endpoint = client.initialize().await?;
    println!("Bound control device {endpoint}\n");

    println!("Catalog before:");
    print_catalog(&client.list().await?);

    println!("Installing domoticz-hue...");
    let mut handle = client
        .send(INSTALL, Some(json!({ "plugin": "domoticz-hue" })))
        .await?;
    let mut progress = handle.take_progress().expect("progress receiver");
    let progress_task = tokio::task::spawn_local(async move {
        while let Some(step) = progress.recv().await {
            println!("  progress: {step}");
        }
    });

    let message = handle.await?;
    let _ = progress_task.await;
    println!("Worker replied: {message}\n");

    println!("Catalog after:");
    print_catalog(&client.list().await?);

    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("Failed to create Tokio runtime");
    let local = tokio::task::LocalSet::new();

    local.block_on(&runtime, async {
        if let Err(error) = run().await {
            eprintln!("Demo error: {error}");
            std::process::exit(1);
        }
    });
}
