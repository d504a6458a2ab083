//! # Pending Calls
//!
//! File: cli/src/wrapper/call.rs
//! Author: Christi Mahu
//!
//! Every dispatch produces a `PendingCall` for the caller and a `CallReply`
//! for whoever ends up settling it (an exec task, a process notification, a
//! later call superseding a start call, or teardown). The work behind a call
//! is queued the moment it is dispatched; awaiting the `PendingCall` only
//! observes the result.
//!
use super::state::CallStatus;
use crate::core::error::{CallResult, ClapiError};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::{oneshot, watch};

/// The settling half of a call.
#[derive(Debug)]
pub(crate) struct CallReply {
    result: oneshot::Sender<CallResult>,
    status: watch::Sender<CallStatus>,
    settled: Option<oneshot::Sender<()>>,
}

impl CallReply {
    /// Creates a linked reply/pending pair.
    pub(crate) fn channel() -> (CallReply, PendingCall) {
        let (result_tx, result_rx) = oneshot::channel();
        let (status_tx, status_rx) = watch::channel(CallStatus::Pending);
        (
            CallReply {
                result: result_tx,
                status: status_tx,
                settled: None,
            },
            PendingCall {
                result: Some(result_rx),
                status: status_rx,
            },
        )
    }

    /// Fires `settled` once this reply has been settled (or dropped).
    pub(crate) fn notify_on_settle(mut self, settled: oneshot::Sender<()>) -> Self {
        self.settled = Some(settled);
        self
    }

    pub(crate) fn settle(self, result: CallResult) {
        let status = if result.is_ok() {
            CallStatus::Resolved
        } else {
            CallStatus::Rejected
        };
        self.status.send_replace(status);
        // The caller may have dropped its PendingCall; the status above still records the outcome.
        let _ = self.result.send(result);
        if let Some(settled) = self.settled {
            let _ = settled.send(());
        }
    }

    pub(crate) fn resolve(self, lines: Vec<String>) {
        self.settle(Ok(lines));
    }

    pub(crate) fn reject(self, lines: Vec<String>) {
        self.settle(Err(ClapiError::Rejected { lines }));
    }
}

/// The result of one dispatched call, available by awaiting it.
///
/// Resolves to the captured lines, or fails with
/// [`ClapiError::Rejected`] carrying everything captured for the call.
#[derive(Debug)]
#[must_use = "the call runs regardless, but its result is only observable by awaiting this"]
pub struct PendingCall {
    result: Option<oneshot::Receiver<CallResult>>,
    status: watch::Receiver<CallStatus>,
}

impl PendingCall {
    /// An already-failed call, for dispatches that could not be queued.
    pub(crate) fn failed(error: ClapiError) -> Self {
        let (reply, pending) = CallReply::channel();
        reply.settle(Err(error));
        pending
    }

    /// Current settlement status, without waiting.
    pub fn status(&self) -> CallStatus {
        *self.status.borrow()
    }

    pub(crate) fn status_receiver(&self) -> watch::Receiver<CallStatus> {
        self.status.clone()
    }
}

impl Future for PendingCall {
    type Output = CallResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let Some(receiver) = this.result.as_mut() else {
            return Poll::Ready(Err(ClapiError::DispatcherGone));
        };
        match Pin::new(receiver).poll(cx) {
            Poll::Ready(result) => {
                this.result = None;
                Poll::Ready(result.unwrap_or(Err(ClapiError::DispatcherGone)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
