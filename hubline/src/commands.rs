//! Typed plugin-manager command surface.
//!
//! The worker understands four commands; these helpers wrap
//! [`WorkerClient::send`] with the params each command expects and decode
//! the terminal payload. Flows that want progress notifications keep using
//! `send` directly and take the handle's progress receiver.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::client::WorkerClient;
use crate::error::ClientError;
use crate::hub::HubTransport;

/// Command name: fetch the plugin catalog.
pub const LIST: &str = "list";
/// Command name: install a plugin.
pub const INSTALL: &str = "install";
/// Command name: remove an installed plugin.
pub const UNINSTALL: &str = "uninstall";
/// Command name: pull the latest version of an installed plugin.
pub const UPDATE: &str = "update";

/// One catalog entry as reported by the worker's `list` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginRecord {
    /// Stable key identifying the plugin in every other command.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Plugin author.
    pub author: String,
    /// Short description.
    pub description: String,
    /// Browse URL of the plugin's source tree.
    pub source: String,
    /// Branches the plugin repository offers.
    pub branches: Vec<String>,
    /// Whether the plugin is present on the worker's disk.
    pub is_installed: bool,
    /// Whether an update is available; `None` when the worker could not
    /// compare the installed tree against upstream.
    #[serde(default)]
    pub is_update_available: Option<bool>,
}

impl<H: HubTransport> WorkerClient<H> {
    /// Fetches the catalog of known plugins, keyed by plugin key.
    ///
    /// # Errors
    ///
    /// Everything [`send`](WorkerClient::send) can return, plus
    /// [`ClientError::Remote`] when the worker failed to build the catalog
    /// and [`ClientError::Payload`] when the reply is not a catalog.
    pub async fn list(&self) -> Result<BTreeMap<String, PluginRecord>, ClientError> {
        let payload = self.send(LIST, None).await?.await?;
        decode_payload(payload)
    }

    /// Installs the plugin `key`, from `branch` when given and the
    /// repository's default branch otherwise. Resolves with the worker's
    /// confirmation message.
    pub async fn install(&self, key: &str, branch: Option<&str>) -> Result<String, ClientError> {
        let mut params = json!({ "plugin": key });
        if let Some(branch) = branch {
            params["branch"] = json!(branch);
        }
        let payload = self.send(INSTALL, Some(params)).await?.await?;
        decode_payload(payload)
    }

    /// Removes the installed plugin `key`. Resolves with the worker's
    /// confirmation message.
    pub async fn uninstall(&self, key: &str) -> Result<String, ClientError> {
        let payload = self.send(UNINSTALL, Some(json!(key))).await?.await?;
        decode_payload(payload)
    }

    /// Updates the installed plugin `key` to the latest upstream state.
    /// Resolves with the worker's confirmation message.
    pub async fn update(&self, key: &str) -> Result<String, ClientError> {
        let payload = self.send(UPDATE, Some(json!(key))).await?.await?;
        decode_payload(payload)
    }
}

fn decode_payload<T: DeserializeOwned>(payload: Value) -> Result<T, ClientError> {
    serde_json::from_value(payload).map_err(|error| ClientError::Payload(error.to_string()))
}
