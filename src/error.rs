//! Error types raised while decoding captured packets.
//!
//! Decoding failures never escape the pool: [`MessagePool::intake`]
//! reports them through the debug sink and drops the packet. The enum is
//! public so callers decoding packets themselves get precise diagnostics.
//!
//! [`MessagePool::intake`]: crate::pool::MessagePool::intake

use thiserror::Error;

/// Reasons a [`RawPacket`](crate::packet::RawPacket) could not be turned
/// into a [`Packet`](crate::packet::Packet).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PacketError {
    /// The capture buffer held no bytes.
    #[error("empty packet")]
    Empty,
    /// The leading nibble named neither IPv4 nor IPv6.
    #[error("unsupported IP version {0}")]
    UnsupportedVersion(u8),
    /// The IP header could not be sliced.
    #[error("malformed IP header: {0}")]
    MalformedIp(String),
    /// The IP payload carries a protocol other than TCP.
    #[error("not a TCP segment (IP protocol {protocol})")]
    NotTcp {
        /// IP protocol number found in the header.
        protocol: u8,
    },
    /// The TCP header could not be sliced.
    #[error("malformed TCP header: {0}")]
    MalformedTcp(String),
    /// The IP header claims more bytes than the capture holds.
    #[error("truncated packet: header needs {needed} bytes, capture has {have}")]
    Truncated {
        /// Offset the header points past.
        needed: usize,
        /// Bytes actually captured.
        have: usize,
    },
}

/// Result alias for packet decoding.
pub type Result<T> = std::result::Result<T, PacketError>;
