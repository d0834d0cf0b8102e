//! Correlation id allocation and the pending-request table.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::client::reply::ReplyHandle;
use crate::error::ClientError;
use crate::wire::RequestId;

/// Table-side half of one pending request.
///
/// Holds the terminal sender and the progress sender for the caller's
/// [`ReplyHandle`]. Terminal completion is idempotent: the first
/// resolve/reject wins, anything later is dropped, and progress stops
/// flowing once a terminal outcome was delivered.
pub(crate) struct Completion {
    reply: Cell<Option<oneshot::Sender<Result<Value, ClientError>>>>,
    progress: mpsc::UnboundedSender<Value>,
    completed: Cell<bool>,
}

impl Completion {
    /// Creates the completion and the caller-facing handle for `id`.
    pub(crate) fn new(id: RequestId) -> (Self, ReplyHandle) {
        let (reply_tx, reply_rx) = oneshot::channel();
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        let completion = Self {
            reply: Cell::new(Some(reply_tx)),
            progress: progress_tx,
            completed: Cell::new(false),
        };
        (completion, ReplyHandle::new(id, reply_rx, progress_rx))
    }

    /// Delivers the terminal outcome. Later calls are no-ops.
    pub(crate) fn complete(&self, outcome: Result<Value, ClientError>) {
        if self.completed.replace(true) {
            return;
        }
        if let Some(sender) = self.reply.take() {
            if sender.send(outcome).is_err() {
                tracing::debug!("reply handle dropped before its outcome arrived");
            }
        }
    }

    /// Delivers one progress payload, unless already completed.
    pub(crate) fn notify(&self, payload: Value) {
        if self.completed.get() {
            return;
        }
        // The caller may have dropped its progress receiver; progress is
        // best-effort.
        let _ = self.progress.send(payload);
    }
}

/// Live requests keyed by correlation id.
///
/// Entries stay until a terminal outcome removes them; progress
/// notifications leave them in place. Unknown ids are reported as plain
/// misses because stale and foreign ids are routine on a shared channel.
#[derive(Default)]
pub(crate) struct PendingTable {
    entries: RefCell<HashMap<RequestId, Completion>>,
}

impl PendingTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Tracks a new request. Must happen before the envelope is handed to
    /// the transport.
    pub(crate) fn register(&self, id: RequestId, completion: Completion) {
        self.entries.borrow_mut().insert(id, completion);
    }

    /// Routes a progress payload to the matching entry, keeping it pending.
    /// Returns false on an unknown id.
    pub(crate) fn notify(&self, id: RequestId, payload: Value) -> bool {
        match self.entries.borrow().get(&id) {
            Some(completion) => {
                completion.notify(payload);
                true
            }
            None => false,
        }
    }

    /// Removes the matching entry and delivers its terminal outcome.
    /// Returns false on an unknown id.
    pub(crate) fn complete(&self, id: RequestId, outcome: Result<Value, ClientError>) -> bool {
        let entry = self.entries.borrow_mut().remove(&id);
        match entry {
            Some(completion) => {
                completion.complete(outcome);
                true
            }
            None => false,
        }
    }

    /// Drops the matching entry without delivering anything. Used when the
    /// caller still owns the handle and gets the error synchronously.
    pub(crate) fn discard(&self, id: RequestId) {
        self.entries.borrow_mut().remove(&id);
    }

    /// Number of live requests.
    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

/// Allocates correlation ids: strictly increasing, starting at 1, never
/// reset for the owning client's lifetime.
#[derive(Debug)]
pub(crate) struct RequestIdFactory {
    next: Cell<u64>,
}

impl RequestIdFactory {
    pub(crate) fn new() -> Self {
        Self { next: Cell::new(1) }
    }

    pub(crate) fn next(&self) -> RequestId {
        let id = self.next.get();
        self.next.set(id + 1);
        RequestId::new(id)
    }
}
