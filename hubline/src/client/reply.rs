//! Caller-facing handle for one in-flight request.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::error::ClientError;
use crate::wire::RequestId;

/// Future for the terminal outcome of one request, plus its progress feed.
///
/// Awaiting the handle yields the worker's payload, or
/// [`ClientError::Remote`] when the worker answered with an error response.
/// No timeout is applied by this layer; a request the worker never answers
/// keeps the handle pending until the client itself is torn down, at which
/// point it settles with [`ClientError::Closed`].
#[derive(Debug)]
pub struct ReplyHandle {
    request_id: RequestId,
    reply: oneshot::Receiver<Result<Value, ClientError>>,
    progress: Option<ProgressReceiver>,
}

impl ReplyHandle {
    pub(crate) fn new(
        request_id: RequestId,
        reply: oneshot::Receiver<Result<Value, ClientError>>,
        progress: mpsc::UnboundedReceiver<Value>,
    ) -> Self {
        Self {
            request_id,
            reply,
            progress: Some(ProgressReceiver { inner: progress }),
        }
    }

    /// Correlation id assigned to this request.
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Detaches the progress feed so it can be consumed independently of
    /// awaiting the terminal outcome. Returns `None` once taken.
    pub fn take_progress(&mut self) -> Option<ProgressReceiver> {
        self.progress.take()
    }
}

impl Future for ReplyHandle {
    type Output = Result<Value, ClientError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.reply).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            // Sender gone without an outcome: the pending table was dropped.
            Poll::Ready(Err(_)) => Poll::Ready(Err(ClientError::Closed)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Stream of progress payloads for one request.
///
/// Carries every `status` payload the worker emitted for the request, in
/// delivery order. The feed ends when the request completes or the client
/// is torn down.
#[derive(Debug)]
pub struct ProgressReceiver {
    inner: mpsc::UnboundedReceiver<Value>,
}

impl ProgressReceiver {
    /// Waits for the next progress payload. `None` once the feed ended.
    pub async fn recv(&mut self) -> Option<Value> {
        self.inner.recv().await
    }

    /// Returns a progress payload if one is already buffered.
    pub fn try_recv(&mut self) -> Option<Value> {
        self.inner.try_recv().ok()
    }
}
