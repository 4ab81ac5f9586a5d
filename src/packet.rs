//! Decoded TCP packet records.
//!
//! A [`Packet`] is the unit the pool consumes: one TCP segment with the
//! fields needed for flow keying and completion detection. [`RawPacket`]
//! carries an undecoded capture starting at the IP header; the decoder
//! slices the IPv4/IPv6 and TCP headers with `etherparse` and keeps the
//! payload as a zero-copy view into the capture buffer.

use std::{
    net::{IpAddr, SocketAddr},
    time::SystemTime,
};

use bytes::Bytes;
use etherparse::{IpNumber, Ipv4HeaderSlice, Ipv6HeaderSlice, TcpHeaderSlice};

use crate::error::{PacketError, Result};

/// Control flags relevant to message boundaries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TcpFlags {
    pub syn: bool,
    pub ack: bool,
    pub fin: bool,
    pub rst: bool,
}

impl TcpFlags {
    pub const SYN: Self = Self::new(true, false, false, false);
    pub const SYN_ACK: Self = Self::new(true, true, false, false);
    pub const ACK: Self = Self::new(false, true, false, false);
    /// FIN as sent on an established connection, with ACK set.
    pub const FIN_ACK: Self = Self::new(false, true, true, false);
    pub const RST: Self = Self::new(false, false, false, true);

    const fn new(syn: bool, ack: bool, fin: bool, rst: bool) -> Self {
        Self { syn, ack, fin, rst }
    }
}

/// Captured bytes awaiting decoding.
///
/// `data` must begin at the IP header; link-layer framing is stripped by the
/// capture layer.
#[derive(Clone, Debug)]
pub struct RawPacket {
    pub data: Bytes,
    pub timestamp: SystemTime,
    /// Bytes the capture layer reported as lost before this packet.
    pub lost: u32,
}

impl RawPacket {
    /// Wrap captured bytes stamped with the current time.
    #[must_use]
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            timestamp: SystemTime::now(),
            lost: 0,
        }
    }
}

/// A decoded TCP segment.
#[derive(Clone, Debug)]
pub struct Packet {
    pub seq: u32,
    pub flags: TcpFlags,
    pub payload: Bytes,
    pub timestamp: SystemTime,
    pub lost: u32,
    pub src: SocketAddr,
    pub dst: SocketAddr,
    /// IP version, `4` or `6`.
    pub version: u8,
}

impl Packet {
    /// Build an empty segment between two endpoints.
    ///
    /// Sequence number, flags and payload start zeroed; fill them in with the
    /// `with_*` helpers or by assigning the public fields.
    #[must_use]
    pub fn new(src: SocketAddr, dst: SocketAddr) -> Self {
        let version = if src.is_ipv4() { 4 } else { 6 };
        Self {
            seq: 0,
            flags: TcpFlags::default(),
            payload: Bytes::new(),
            timestamp: SystemTime::now(),
            lost: 0,
            src,
            dst,
            version,
        }
    }

    /// Set the sequence number.
    #[must_use]
    pub fn with_seq(mut self, seq: u32) -> Self {
        self.seq = seq;
        self
    }

    /// Set the control flags.
    #[must_use]
    pub fn with_flags(mut self, flags: TcpFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the payload.
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Decode a captured IP datagram carrying a TCP segment.
    ///
    /// # Errors
    ///
    /// Returns [`PacketError`] when the buffer is empty, is not IPv4/IPv6,
    /// carries something other than TCP, or has malformed headers.
    pub fn decode(raw: &RawPacket) -> Result<Self> {
        let data = raw.data.as_ref();
        let version = data.first().map(|b| b >> 4).ok_or(PacketError::Empty)?;
        let (src_ip, dst_ip, header_len, end) = match version {
            4 => {
                let ip = Ipv4HeaderSlice::from_slice(data)
                    .map_err(|e| PacketError::MalformedIp(e.to_string()))?;
                if ip.protocol() != IpNumber::TCP {
                    return Err(PacketError::NotTcp {
                        protocol: ip.protocol().0,
                    });
                }
                // Segmentation offload leaves total_len zeroed.
                let end = match usize::from(ip.total_len()) {
                    0 => data.len(),
                    n => n,
                };
                (
                    IpAddr::V4(ip.source_addr()),
                    IpAddr::V4(ip.destination_addr()),
                    ip.slice().len(),
                    end,
                )
            }
            6 => {
                let ip = Ipv6HeaderSlice::from_slice(data)
                    .map_err(|e| PacketError::MalformedIp(e.to_string()))?;
                if ip.next_header() != IpNumber::TCP {
                    return Err(PacketError::NotTcp {
                        protocol: ip.next_header().0,
                    });
                }
                let header_len = ip.slice().len();
                (
                    IpAddr::V6(ip.source_addr()),
                    IpAddr::V6(ip.destination_addr()),
                    header_len,
                    header_len + usize::from(ip.payload_length()),
                )
            }
            other => return Err(PacketError::UnsupportedVersion(other)),
        };

        if end < header_len {
            return Err(PacketError::Truncated {
                needed: header_len,
                have: end,
            });
        }
        let end = end.min(data.len());

        let tcp = TcpHeaderSlice::from_slice(&data[header_len..end])
            .map_err(|e| PacketError::MalformedTcp(e.to_string()))?;
        let payload_start = header_len + tcp.slice().len();

        Ok(Self {
            seq: tcp.sequence_number(),
            flags: TcpFlags {
                syn: tcp.syn(),
                ack: tcp.ack(),
                fin: tcp.fin(),
                rst: tcp.rst(),
            },
            payload: raw.data.slice(payload_start..end),
            timestamp: raw.timestamp,
            lost: raw.lost,
            src: SocketAddr::new(src_ip, tcp.source_port()),
            dst: SocketAddr::new(dst_ip, tcp.destination_port()),
            version,
        })
    }
}

impl TryFrom<&RawPacket> for Packet {
    type Error = PacketError;

    fn try_from(raw: &RawPacket) -> Result<Self> { Self::decode(raw) }
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, Ipv6Addr};

    use etherparse::PacketBuilder;
    use rstest::rstest;

    use super::*;

    fn ipv4_segment(payload: &[u8]) -> Vec<u8> {
        let builder = PacketBuilder::ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64)
            .tcp(40000, 80, 1000, 4096)
            .syn();
        let mut out = Vec::with_capacity(builder.size(payload.len()));
        builder.write(&mut out, payload).expect("write ipv4 segment");
        out
    }

    #[test]
    fn decodes_ipv4_tcp_segment() {
        let raw = RawPacket::new(ipv4_segment(b"hello"));
        let packet = Packet::decode(&raw).expect("valid segment");

        assert_eq!(packet.version, 4);
        assert_eq!(
            packet.src,
            SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 40000)
        );
        assert_eq!(packet.dst.port(), 80);
        assert_eq!(packet.seq, 1000);
        assert!(packet.flags.syn);
        assert!(!packet.flags.ack);
        assert_eq!(packet.payload.as_ref(), b"hello");
    }

    #[test]
    fn decodes_ipv6_tcp_segment() {
        let src = Ipv6Addr::LOCALHOST.octets();
        let builder = PacketBuilder::ipv6(src, src, 64)
            .tcp(5000, 443, 7, 1024)
            .fin()
            .ack(1);
        let mut data = Vec::with_capacity(builder.size(3));
        builder.write(&mut data, b"bye").expect("write ipv6 segment");

        let packet = Packet::decode(&RawPacket::new(data)).expect("valid segment");
        assert_eq!(packet.version, 6);
        assert_eq!(packet.src.to_string(), "[::1]:5000");
        assert!(packet.flags.fin && packet.flags.ack);
        assert_eq!(packet.payload.as_ref(), b"bye");
    }

    #[test]
    fn ignores_trailing_link_padding() {
        let mut data = ipv4_segment(b"ab");
        data.extend_from_slice(&[0; 6]);
        let packet = Packet::decode(&RawPacket::new(data)).expect("valid segment");
        assert_eq!(packet.payload.as_ref(), b"ab");
    }

    #[test]
    fn rejects_udp() {
        let builder = PacketBuilder::ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64).udp(53, 53);
        let mut data = Vec::with_capacity(builder.size(0));
        builder.write(&mut data, &[]).expect("write udp datagram");

        assert_eq!(
            Packet::decode(&RawPacket::new(data)).unwrap_err(),
            PacketError::NotTcp { protocol: 17 }
        );
    }

    #[rstest]
    #[case::empty(Vec::new(), PacketError::Empty)]
    #[case::version(vec![0x20, 0, 0, 0], PacketError::UnsupportedVersion(2))]
    fn rejects_garbage(#[case] data: Vec<u8>, #[case] expected: PacketError) {
        assert_eq!(Packet::decode(&RawPacket::new(data)).unwrap_err(), expected);
    }

    #[test]
    fn rejects_short_ipv4_header() {
        let err = Packet::decode(&RawPacket::new(vec![0x45, 0, 0])).unwrap_err();
        assert!(matches!(err, PacketError::MalformedIp(_)), "got {err:?}");
    }

    #[test]
    fn rejects_cut_tcp_header() {
        let mut data = ipv4_segment(&[]);
        data.truncate(30);
        let err = Packet::decode(&RawPacket::new(data)).unwrap_err();
        assert!(matches!(err, PacketError::MalformedTcp(_)), "got {err:?}");
    }
}
