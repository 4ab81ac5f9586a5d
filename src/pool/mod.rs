//! Concurrent registry of in-flight messages.
//!
//! [`MessagePool`] maps session keys to the message currently being
//! assembled for them. Incoming flows are keyed by the client's
//! `address:port`; outgoing flows by `server=client`, so a lookup by the
//! sender's address, then by `sender=receiver`, finds the flow from either
//! direction.
//!
//! Every packet is processed under one lock. When a packet completes a
//! message the pool removes it from the map, hands it to the message's
//! dispatch watcher and waits for the watcher to acknowledge before
//! releasing the lock, so no later packet can reach a retiring message. The
//! watcher then calls the consumer outside the lock. Messages that never
//! complete are expired by their own watcher.

mod builder;
mod watcher;

use std::{collections::HashMap, sync::Arc};

use log::warn;
use tokio::{
    sync::{Mutex, oneshot},
    time::Instant,
};

pub use builder::MessagePoolBuilder;
use watcher::Handoff;

use crate::{
    config::PoolConfig,
    hooks::{MessageHandler, PoolHooks, Severity},
    message::{Direction, Message},
    metrics,
    packet::{Packet, RawPacket},
};

/// The condition that ended a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Termination {
    /// Size cap, end detector, or FIN.
    Completed,
    /// An RST retired the flow.
    Reset,
    /// The expiry elapsed first.
    TimedOut,
}

impl Termination {
    /// Return a string representation of the termination.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Termination::Completed => "completed",
            Termination::Reset => "reset",
            Termination::TimedOut => "timed_out",
        }
    }
}

/// A message being assembled plus the sender half of its hand-off channel.
struct Flow {
    message: Message,
    done: oneshot::Sender<Handoff>,
}

type Flows = HashMap<String, Flow>;

struct Shared {
    flows: Mutex<Flows>,
    config: PoolConfig,
    hooks: PoolHooks,
    handler: Arc<dyn MessageHandler>,
}

/// Reassembles TCP packets into messages and dispatches them to a handler.
///
/// Cloning is cheap; clones share one registry. All methods must run inside
/// a tokio runtime because every message gets its own watcher task.
#[derive(Clone)]
pub struct MessagePool {
    shared: Arc<Shared>,
}

impl MessagePool {
    /// Create a pool with the given limits and no optional hooks.
    #[must_use]
    pub fn new(config: PoolConfig, handler: impl MessageHandler) -> Self {
        Self::with_hooks(config, PoolHooks::default(), Arc::new(handler))
    }

    /// Start configuring a pool.
    #[must_use]
    pub fn builder() -> MessagePoolBuilder { MessagePoolBuilder::new() }

    fn with_hooks(config: PoolConfig, hooks: PoolHooks, handler: Arc<dyn MessageHandler>) -> Self {
        Self {
            shared: Arc::new(Shared {
                flows: Mutex::new(HashMap::new()),
                config: config.effective(),
                hooks,
                handler,
            }),
        }
    }

    /// Limits in force, with defaults and floors applied.
    #[must_use]
    pub fn config(&self) -> PoolConfig { self.shared.config }

    /// Number of messages currently being assembled.
    pub async fn active_flows(&self) -> usize { self.shared.flows.lock().await.len() }

    /// Whether a message is registered under `key`.
    pub async fn is_tracking(&self, key: &str) -> bool {
        self.shared.flows.lock().await.contains_key(key)
    }

    /// Decode a captured packet and feed it to the pool.
    ///
    /// Packets that fail to decode are reported to the debugger and dropped.
    pub async fn intake(&self, raw: RawPacket) {
        match Packet::decode(&raw) {
            Ok(packet) => self.intake_decoded(packet).await,
            Err(err) => {
                metrics::inc_decode_errors();
                self.shared.say(
                    Severity::High,
                    format!("error decoding packet({}Bytes):{err}", raw.data.len()),
                );
            }
        }
    }

    /// Feed an already decoded packet to the pool.
    pub async fn intake_decoded(&self, packet: Packet) {
        let shared = &self.shared;
        let mut flows = shared.flows.lock().await;

        let src_key = packet.src.to_string();
        let dst_key = format!("{src_key}={}", packet.dst);
        let found = lookup(&flows, [&src_key, &dst_key]);

        if packet.flags.rst {
            if let Some(key) = found {
                shared.hand_off(&mut flows, &key, Termination::Reset).await;
            }
            let reverse_src = packet.dst.to_string();
            let reverse_dst = format!("{reverse_src}={src_key}");
            if let Some(key) = lookup(&flows, [&reverse_src, &reverse_dst]) {
                shared.hand_off(&mut flows, &key, Termination::Reset).await;
            }
            shared.say(
                Severity::High,
                format!(
                    "RST flag from {} to {} at {:?}",
                    packet.src, packet.dst, packet.timestamp
                ),
            );
            return;
        }

        if let Some(key) = found {
            shared.append_and_check(&mut flows, &key, packet).await;
            return;
        }

        let Some(direction) = shared.hooks.start(&packet) else {
            return;
        };
        let key = match direction {
            Direction::Incoming => src_key,
            Direction::Outgoing => dst_key,
        };

        let mut message = Message::new(packet.src, packet.dst, packet.version);
        message.set_direction(direction);
        message.set_start(packet.timestamp);

        let (done, handoff) = oneshot::channel();
        flows.insert(key.clone(), Flow { message, done });
        metrics::inc_flows();
        let deadline = Instant::now() + shared.config.message_expiry;
        tokio::spawn(Arc::clone(shared).watch(key.clone(), deadline, handoff));

        shared.append_and_check(&mut flows, &key, packet).await;
    }
}

impl std::fmt::Debug for MessagePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessagePool")
            .field("config", &self.shared.config)
            .field("hooks", &self.shared.hooks)
            .finish_non_exhaustive()
    }
}

fn lookup(flows: &Flows, keys: [&String; 2]) -> Option<String> {
    keys.into_iter().find(|key| flows.contains_key(*key)).cloned()
}

impl Shared {
    async fn append_and_check(&self, flows: &mut Flows, key: &str, mut packet: Packet) {
        let Some(flow) = flows.get_mut(key) else {
            return;
        };
        let message = &mut flow.message;
        let max_size = self.config.max_message_size;
        let total = message.len() + packet.payload.len();

        if total > max_size {
            message.mark_truncated();
            packet.payload.truncate(max_size - message.len());
            metrics::inc_truncated();
            self.say(
                Severity::Medium,
                format!("message {key} truncated at {max_size} bytes"),
            );
        }

        let fin = packet.flags.fin;
        message.append(packet);

        if total >= max_size || self.hooks.end(message) || fin {
            self.hand_off(flows, key, Termination::Completed).await;
        }
    }

    /// Unregister the message under `key` and wait for its watcher to
    /// claim it.
    async fn hand_off(&self, flows: &mut Flows, key: &str, termination: Termination) {
        let Some(Flow { message, done }) = flows.remove(key) else {
            return;
        };
        let (ack, acked) = oneshot::channel();
        let handoff = Handoff {
            message,
            termination,
            ack,
        };
        if done.send(handoff).is_err() {
            warn!("dispatch watcher for {key} exited before hand-off; message dropped");
            metrics::dec_flows();
            return;
        }
        if acked.await.is_err() {
            warn!("dispatch watcher for {key} did not acknowledge hand-off");
        }
    }

    fn say(&self, severity: Severity, message: String) {
        log::log!(severity.log_level(), "{message}");
        self.hooks.debug(severity, message);
    }
}
