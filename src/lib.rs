//! Reassembly of captured TCP traffic into application messages.
//!
//! Feed captured datagrams or decoded [`Packet`]s to a [`MessagePool`]. The
//! pool groups them by direction-aware session key, concatenates their
//! payloads into a [`Message`], and hands each message to a consumer once a
//! FIN, an RST, the size cap, a custom end detector, or the expiry ends it.

pub mod config;
pub mod error;
pub mod hooks;
pub mod message;
pub mod metrics;
pub mod packet;
pub mod panic;
pub mod pool;
pub mod test_helpers;

pub use config::{DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_MESSAGE_EXPIRY, MIN_MESSAGE_EXPIRY, PoolConfig};
pub use error::PacketError;
pub use hooks::{Debugger, EndDetector, MessageHandler, Severity, StartDetector};
pub use message::{Direction, Message, Stats};
pub use packet::{Packet, RawPacket, TcpFlags};
pub use pool::{MessagePool, MessagePoolBuilder, Termination};
