//! Decoded packets for one client/server socket pair.

use std::net::SocketAddr;

use bytes::Bytes;
use tcpstitch::{Packet, TcpFlags};

/// Builds packets travelling either way between a client and a server.
#[derive(Clone, Copy, Debug)]
pub struct Conversation {
    client: SocketAddr,
    server: SocketAddr,
}

impl Conversation {
    /// # Panics
    ///
    /// Panics if either address does not parse as `ip:port`.
    #[expect(
        clippy::expect_used,
        reason = "fixture addresses are literals; a typo should fail the test immediately"
    )]
    #[must_use]
    pub fn new(client: &str, server: &str) -> Self {
        Self {
            client: client.parse().expect("client address"),
            server: server.parse().expect("server address"),
        }
    }

    #[must_use]
    pub fn client(&self) -> SocketAddr { self.client }

    #[must_use]
    pub fn server(&self) -> SocketAddr { self.server }

    /// Registry key of the client-to-server message.
    #[must_use]
    pub fn request_key(&self) -> String { self.client.to_string() }

    /// Registry key of the server-to-client message.
    #[must_use]
    pub fn response_key(&self) -> String { format!("{}={}", self.server, self.client) }

    /// Client-to-server packet.
    #[must_use]
    pub fn request(&self, flags: TcpFlags, seq: u32, payload: &[u8]) -> Packet {
        Packet::new(self.client, self.server)
            .with_flags(flags)
            .with_seq(seq)
            .with_payload(Bytes::copy_from_slice(payload))
    }

    /// Server-to-client packet.
    #[must_use]
    pub fn response(&self, flags: TcpFlags, seq: u32, payload: &[u8]) -> Packet {
        Packet::new(self.server, self.client)
            .with_flags(flags)
            .with_seq(seq)
            .with_payload(Bytes::copy_from_slice(payload))
    }

    /// Client SYN opening a request.
    #[must_use]
    pub fn request_syn(&self, payload: &[u8]) -> Packet { self.request(TcpFlags::SYN, 0, payload) }

    /// Client FIN closing a request.
    #[must_use]
    pub fn request_fin(&self, payload: &[u8]) -> Packet { self.request(TcpFlags::FIN_ACK, 0, payload) }

    /// Server SYN-ACK opening a response.
    #[must_use]
    pub fn response_syn(&self, payload: &[u8]) -> Packet {
        self.response(TcpFlags::SYN_ACK, 0, payload)
    }

    /// Server FIN closing a response.
    #[must_use]
    pub fn response_fin(&self, payload: &[u8]) -> Packet { self.response(TcpFlags::FIN_ACK, 0, payload) }
}
