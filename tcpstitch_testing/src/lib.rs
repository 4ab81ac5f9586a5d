//! Fixtures for exercising a [`MessagePool`](tcpstitch::MessagePool) in
//! tests.
//!
//! [`Conversation`] builds decoded packets for one client/server pair,
//! [`raw_ipv4`] and [`raw_ipv6`] produce captured datagrams for the decoding
//! path, and [`collector`] / [`debug_collector`] turn the pool's callbacks
//! into channels that tests can await.
//!
//! ```rust
//! use tcpstitch::MessagePool;
//! use tcpstitch_testing::{Conversation, collector};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (handler, mut messages) = collector();
//! let pool = MessagePool::builder().build(handler);
//! let http = Conversation::new("10.0.0.1:40000", "10.0.0.2:80");
//!
//! pool.intake_decoded(http.request_syn(b"GET / HTTP/1.1\r\n\r\n")).await;
//! pool.intake_decoded(http.request_fin(b"")).await;
//! assert!(messages.recv().await.is_some());
//! # }
//! ```

mod conversation;
mod logging;
mod raw;

pub use conversation::Conversation;
pub use logging::{LoggerHandle, logger};
pub use raw::{raw_ipv4, raw_ipv6};
pub use tcpstitch::test_helpers::{DebugRecord, collector, debug_collector};
