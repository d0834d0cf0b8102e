//! Client configuration.

use crate::hub::DeviceSelector;

/// Knobs for a [`WorkerClient`](crate::client::WorkerClient).
///
/// The defaults reproduce the original panel's behavior: discover the
/// plugin-manager control device and keep no bound on pending requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Marker used to locate the control device during bootstrap.
    pub selector: DeviceSelector,
    /// Upper bound on simultaneously pending requests.
    ///
    /// `None` (the default) matches the source behavior: pending entries
    /// accumulate without limit while the worker stays silent. Setting a
    /// bound makes `send` refuse further requests with
    /// [`ClientError::PendingLimit`](crate::error::ClientError::PendingLimit)
    /// until replies drain the table.
    pub max_pending: Option<usize>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            selector: DeviceSelector::default(),
            max_pending: None,
        }
    }
}

impl ClientConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the control-device selector.
    pub fn with_selector(mut self, selector: DeviceSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Sets an upper bound on pending requests.
    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = Some(max_pending);
        self
    }
}
