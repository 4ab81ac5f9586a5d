//! Per-message dispatch watcher.
//!
//! Each registered message gets one watcher task. It waits for whichever
//! comes first: a [`Handoff`] from the packet that completed the message, or
//! the message's expiry deadline. Either way it ends by passing the message
//! to the consumer on a blocking-pool thread, without holding the registry
//! lock.

use std::sync::Arc;

use log::{debug, warn};
use tokio::{
    sync::oneshot,
    task,
    time::{self, Instant},
};

use super::{Shared, Termination};
use crate::{hooks::Severity, message::Message, metrics, panic::HandlerPanic};

/// A completed message passed from the lock holder to its watcher.
pub(super) struct Handoff {
    pub(super) message: Message,
    pub(super) termination: Termination,
    /// Signalled once the watcher owns the message.
    pub(super) ack: oneshot::Sender<()>,
}

impl Shared {
    pub(super) async fn watch(
        self: Arc<Self>,
        key: String,
        deadline: Instant,
        mut handoff: oneshot::Receiver<Handoff>,
    ) {
        let claimed = tokio::select! {
            biased;
            received = &mut handoff => claim(received),
            () = time::sleep_until(deadline) => {
                // A producer may hold the lock while waiting for this watcher
                // to acknowledge, so keep listening while queueing for it.
                tokio::select! {
                    biased;
                    received = &mut handoff => claim(received),
                    mut flows = self.flows.lock() => flows.remove(&key).map(|flow| {
                        let mut message = flow.message;
                        message.mark_timed_out();
                        (message, Termination::TimedOut)
                    }),
                }
            }
        };

        let Some((message, termination)) = claimed else {
            debug!("dispatch watcher for {key} found nothing to dispatch");
            return;
        };
        if termination == Termination::TimedOut {
            self.say(
                Severity::Low,
                format!(
                    "message {key} timed out after {:?} with {} bytes",
                    self.config.message_expiry,
                    message.len()
                ),
            );
        }
        self.dispatch(&key, message, termination).await;
    }

    /// Run the consumer on the blocking pool so a slow handler cannot stall
    /// intake or other watchers on the same runtime.
    async fn dispatch(&self, key: &str, message: Message, termination: Termination) {
        metrics::dec_flows();
        metrics::inc_dispatched(termination);
        debug!(
            "dispatching message {key} ({}, {} bytes, {} packets)",
            termination.as_str(),
            message.len(),
            message.packets().len()
        );
        let handler = Arc::clone(&self.handler);
        match task::spawn_blocking(move || handler.handle(message)).await {
            Ok(()) => {}
            Err(err) if err.is_panic() => {
                let panic = HandlerPanic::new(err.into_panic());
                tracing::error!(panic = %panic, key, "message handler panicked");
            }
            Err(err) => warn!("message handler for {key} did not run: {err}"),
        }
    }
}

/// Acknowledge a hand-off and take ownership of its message.
fn claim(received: Result<Handoff, oneshot::error::RecvError>) -> Option<(Message, Termination)> {
    let Handoff {
        message,
        termination,
        ack,
    } = received.ok()?;
    if ack.send(()).is_err() {
        debug!("hand-off acknowledged after the producer stopped waiting");
    }
    Some((message, termination))
}
