//! Captured IP datagrams built with `etherparse`.

use std::net::SocketAddr;

use etherparse::{PacketBuilder, PacketBuilderStep, TcpHeader};
use tcpstitch::{RawPacket, TcpFlags};

/// Encode an IPv4 TCP segment from `src` to `dst`.
///
/// # Panics
///
/// Panics if either address is not IPv4.
#[must_use]
pub fn raw_ipv4(src: SocketAddr, dst: SocketAddr, flags: TcpFlags, seq: u32, payload: &[u8]) -> RawPacket {
    let (SocketAddr::V4(src), SocketAddr::V4(dst)) = (src, dst) else {
        panic!("raw_ipv4 needs IPv4 endpoints, got {src} -> {dst}");
    };
    let builder = PacketBuilder::ipv4(src.ip().octets(), dst.ip().octets(), 64)
        .tcp(src.port(), dst.port(), seq, 65535);
    encode(builder, flags, payload)
}

/// Encode an IPv6 TCP segment from `src` to `dst`.
///
/// # Panics
///
/// Panics if either address is not IPv6.
#[must_use]
pub fn raw_ipv6(src: SocketAddr, dst: SocketAddr, flags: TcpFlags, seq: u32, payload: &[u8]) -> RawPacket {
    let (SocketAddr::V6(src), SocketAddr::V6(dst)) = (src, dst) else {
        panic!("raw_ipv6 needs IPv6 endpoints, got {src} -> {dst}");
    };
    let builder = PacketBuilder::ipv6(src.ip().octets(), dst.ip().octets(), 64)
        .tcp(src.port(), dst.port(), seq, 65535);
    encode(builder, flags, payload)
}

#[expect(
    clippy::expect_used,
    reason = "writing into a Vec cannot fail for well-formed builders"
)]
fn encode(mut builder: PacketBuilderStep<TcpHeader>, flags: TcpFlags, payload: &[u8]) -> RawPacket {
    if flags.syn {
        builder = builder.syn();
    }
    if flags.ack {
        builder = builder.ack(1);
    }
    if flags.fin {
        builder = builder.fin();
    }
    if flags.rst {
        builder = builder.rst();
    }
    let mut data = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut data, payload).expect("encode TCP segment");
    RawPacket::new(data)
}
