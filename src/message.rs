//! Reassembled application-level messages.
//!
//! A [`Message`] collects the packets of one request or response in the
//! order the pool received them, along with their concatenated payload and
//! running [`Stats`]. The pool owns a message while it accumulates; once
//! dispatched the consumer owns it outright.

use std::{net::SocketAddr, time::SystemTime};

use serde::Serialize;
use sha1::{Digest, Sha1};

use crate::packet::Packet;

/// Which side of the connection a message travels from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    /// Client to server. Keyed by the client's `address:port`.
    Incoming,
    /// Server to client. Keyed by `server=client`.
    Outgoing,
}

impl Direction {
    /// Return a string representation of the direction.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Incoming => "incoming",
            Direction::Outgoing => "outgoing",
        }
    }
}

/// Aggregate statistics carried by every message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Bytes the capture layer reported lost across all packets.
    pub lost_data: u64,
    /// Payload bytes held by the message.
    pub length: usize,
    /// Timestamp of the packet that opened the message.
    pub start: Option<SystemTime>,
    /// Timestamp of the most recently appended packet.
    pub end: Option<SystemTime>,
    pub src_addr: SocketAddr,
    pub dst_addr: SocketAddr,
    pub is_incoming: bool,
    /// Expired before a completion condition was seen.
    pub timed_out: bool,
    /// The last packet was cut to respect the size cap.
    pub truncated: bool,
    pub ip_version: u8,
}

/// Packets and payload of one logical TCP exchange.
#[derive(Clone, Debug)]
pub struct Message {
    packets: Vec<Packet>,
    data: Vec<u8>,
    stats: Stats,
}

impl Message {
    /// Create an empty message between two endpoints.
    #[must_use]
    pub fn new(src_addr: SocketAddr, dst_addr: SocketAddr, ip_version: u8) -> Self {
        Self {
            packets: Vec::new(),
            data: Vec::new(),
            stats: Stats {
                lost_data: 0,
                length: 0,
                start: None,
                end: None,
                src_addr,
                dst_addr,
                is_incoming: false,
                timed_out: false,
                truncated: false,
                ip_version,
            },
        }
    }

    /// Identifier shared by both directions of a socket pair.
    ///
    /// The hex-encoded SHA-1 of the client address followed by the server
    /// address. It is not unique over time: a later session between the same
    /// endpoints yields the same identifier.
    #[must_use]
    pub fn session_id(&self) -> String {
        let (client, server) = if self.stats.is_incoming {
            (self.stats.src_addr, self.stats.dst_addr)
        } else {
            (self.stats.dst_addr, self.stats.src_addr)
        };
        let mut hasher = Sha1::new();
        hasher.update(client.to_string().as_bytes());
        hasher.update(server.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Append a packet, growing the payload buffer and statistics.
    pub fn append(&mut self, packet: Packet) {
        self.stats.length += packet.payload.len();
        self.stats.lost_data += u64::from(packet.lost);
        self.stats.end = Some(packet.timestamp);
        self.data.extend_from_slice(&packet.payload);
        self.packets.push(packet);
    }

    /// Stable sort of the packets by ascending sequence number.
    ///
    /// The payload buffer keeps arrival order; callers wanting in-order
    /// bytes should rebuild them from [`packets`](Self::packets).
    pub fn sort_by_sequence(&mut self) { self.packets.sort_by_key(|packet| packet.seq); }

    /// Packets in arrival order, or sequence order after
    /// [`sort_by_sequence`](Self::sort_by_sequence).
    #[must_use]
    pub fn packets(&self) -> &[Packet] { &self.packets }

    /// Concatenated payload bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] { &self.data }

    #[must_use]
    pub fn stats(&self) -> &Stats { &self.stats }

    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize { self.stats.length }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.stats.length == 0 }

    #[must_use]
    pub fn direction(&self) -> Direction {
        if self.stats.is_incoming {
            Direction::Incoming
        } else {
            Direction::Outgoing
        }
    }

    pub(crate) fn set_direction(&mut self, direction: Direction) {
        self.stats.is_incoming = direction == Direction::Incoming;
    }

    pub(crate) fn set_start(&mut self, start: SystemTime) { self.stats.start = Some(start); }

    pub(crate) fn mark_truncated(&mut self) { self.stats.truncated = true; }

    pub(crate) fn mark_timed_out(&mut self) { self.stats.timed_out = true; }
}
