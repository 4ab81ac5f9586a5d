#![cfg(any(test, feature = "test-helpers"))]
//! Channel-backed stand-ins for the pool's consumer and debugger.
//!
//! Shared by the crate's unit tests and, through the `test-helpers`
//! feature, by `tcpstitch_testing`.

use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

use crate::{hooks::Severity, message::Message};

/// A diagnostic captured by [`debug_collector`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DebugRecord {
    pub severity: Severity,
    pub message: String,
}

/// A message handler forwarding every dispatched message to a channel.
pub fn collector() -> (
    impl Fn(Message) + Send + Sync + 'static,
    UnboundedReceiver<Message>,
) {
    let (tx, rx) = unbounded_channel();
    let handler = move |message: Message| {
        let _ = tx.send(message);
    };
    (handler, rx)
}

/// A debugger forwarding every diagnostic to a channel.
pub fn debug_collector() -> (
    impl Fn(Severity, &str) + Send + Sync + 'static,
    UnboundedReceiver<DebugRecord>,
) {
    let (tx, rx) = unbounded_channel();
    let debugger = move |severity: Severity, message: &str| {
        let _ = tx.send(DebugRecord {
            severity,
            message: message.to_owned(),
        });
    };
    (debugger, rx)
}
