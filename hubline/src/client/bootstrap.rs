//! One-time endpoint discovery and priming.
//!
//! The first caller becomes the leader and runs discovery; concurrent
//! callers park until the outcome settles. The settled outcome, success or
//! failure, is memoized for the client's lifetime: there is no automatic
//! retry and no re-clear, and a failed bootstrap poisons every later send.

use std::cell::RefCell;
use std::mem;

use tokio::sync::oneshot;

use crate::error::ClientError;
use crate::hub::{DeviceCommand, DeviceFilter, DeviceIdx, DeviceSelector, HubTransport};

type Outcome = Result<DeviceIdx, ClientError>;

#[derive(Debug)]
enum State {
    Idle,
    Running(Vec<oneshot::Sender<Outcome>>),
    Settled(Outcome),
}

/// Memoized discovery of the control device.
#[derive(Debug)]
pub(crate) struct Bootstrap {
    selector: DeviceSelector,
    state: RefCell<State>,
}

impl Bootstrap {
    pub(crate) fn new(selector: DeviceSelector) -> Self {
        Self {
            selector,
            state: RefCell::new(State::Idle),
        }
    }

    /// The bound endpoint, once discovery has settled successfully.
    pub(crate) fn endpoint(&self) -> Option<DeviceIdx> {
        match &*self.state.borrow() {
            State::Settled(Ok(endpoint)) => Some(*endpoint),
            _ => None,
        }
    }

    /// Resolves the endpoint, running discovery at most once.
    ///
    /// Callers arriving while discovery is in flight park on a channel and
    /// all resume with the same outcome when it settles. If the leading
    /// future is dropped before settling, its guard reverts the state and
    /// the parked callers re-enter to elect a new leader.
    pub(crate) async fn ready<H: HubTransport>(&self, hub: &H) -> Outcome {
        loop {
            let waiter = {
                let mut state = self.state.borrow_mut();
                match &mut *state {
                    State::Settled(outcome) => return outcome.clone(),
                    State::Running(waiters) => {
                        let (tx, rx) = oneshot::channel();
                        waiters.push(tx);
                        Some(rx)
                    }
                    State::Idle => {
                        *state = State::Running(Vec::new());
                        None
                    }
                }
            };

            match waiter {
                Some(rx) => match rx.await {
                    Ok(outcome) => return outcome,
                    // Leader dropped mid-discovery; go around and elect a
                    // new one.
                    Err(_) => continue,
                },
                None => return self.lead(hub).await,
            }
        }
    }

    async fn lead<H: HubTransport>(&self, hub: &H) -> Outcome {
        let mut reset = ResetOnDrop {
            state: &self.state,
            armed: true,
        };
        let outcome = self.discover(hub).await;
        reset.disarm();

        let waiters = match mem::replace(
            &mut *self.state.borrow_mut(),
            State::Settled(outcome.clone()),
        ) {
            State::Running(waiters) => waiters,
            _ => Vec::new(),
        };
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
        outcome
    }

    async fn discover<H: HubTransport>(&self, hub: &H) -> Outcome {
        let devices = hub
            .query_devices(&DeviceFilter::everything())
            .await?
            .ok_or(ClientError::DiscoveryFailed)?;

        // First match wins, even when several devices carry the marker.
        let device = devices
            .iter()
            .find(|device| self.selector.matches(device))
            .ok_or_else(|| ClientError::EndpointNotFound {
                hardware: self.selector.hardware.clone(),
                unit: self.selector.unit,
            })?;
        let endpoint = device.idx;
        tracing::debug!(device = %endpoint, name = %device.name, "control device bound");

        // Stale envelopes from an earlier session may still sit in the
        // device history; clearing is best-effort and never fails bootstrap.
        if let Err(error) = hub
            .send_command(DeviceCommand::ClearHistory { device: endpoint })
            .await
        {
            tracing::warn!(device = %endpoint, %error, "could not clear control device history");
        }

        Ok(endpoint)
    }
}

struct ResetOnDrop<'a> {
    state: &'a RefCell<State>,
    armed: bool,
}

impl ResetOnDrop<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            // Dropping the parked senders wakes every waiter.
            let _ = mem::replace(&mut *self.state.borrow_mut(), State::Idle);
        }
    }
}
