//! Fluent construction of [`MessagePool`].

use std::{sync::Arc, time::Duration};

use super::MessagePool;
use crate::{
    config::PoolConfig,
    hooks::{Debugger, EndDetector, MessageHandler, PoolHooks, StartDetector},
};

/// Builder for [`MessagePool`]; obtain one with [`MessagePool::builder`].
///
/// ```
/// use std::time::Duration;
///
/// use tcpstitch::{Message, MessagePool};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let pool = MessagePool::builder()
///     .max_message_size(64 * 1024)
///     .message_expiry(Duration::from_secs(1))
///     .end_detector(|message: &Message| message.data().ends_with(b"\r\n\r\n"))
///     .build(|message: Message| println!("{} bytes", message.len()));
/// assert_eq!(pool.config().max_message_size, 64 * 1024);
/// # }
/// ```
#[derive(Debug, Default)]
#[must_use]
pub struct MessagePoolBuilder {
    config: PoolConfig,
    hooks: PoolHooks,
}

impl MessagePoolBuilder {
    pub fn new() -> Self { Self::default() }

    /// Replace the limits wholesale.
    pub fn config(mut self, config: PoolConfig) -> Self {
        self.config = config;
        self
    }

    /// Maximum payload bytes per message; `0` selects the default.
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.config.max_message_size = size;
        self
    }

    /// Time a message may wait for its final packet.
    pub fn message_expiry(mut self, expiry: Duration) -> Self {
        self.config.message_expiry = expiry;
        self
    }

    /// Replace the SYN rule for opening messages.
    pub fn start_detector(mut self, detector: impl StartDetector) -> Self {
        self.hooks.start = Some(Arc::new(detector));
        self
    }

    /// Add a completion condition checked before FIN.
    pub fn end_detector(mut self, detector: impl EndDetector) -> Self {
        self.hooks.end = Some(Arc::new(detector));
        self
    }

    /// Receive diagnostics.
    pub fn debugger(mut self, debugger: impl Debugger) -> Self {
        self.hooks.debug = Some(Arc::new(debugger));
        self
    }

    /// Finish the pool, sending every finished message to `handler`.
    #[must_use]
    pub fn build(self, handler: impl MessageHandler) -> MessagePool {
        MessagePool::with_hooks(self.config, self.hooks, Arc::new(handler))
    }
}
