//! End-to-end reassembly through the decoding entry point.

use std::time::Duration;

use futures::future::join_all;
use rstest::rstest;
use tcpstitch::{Direction, MessagePool, PoolConfig, RawPacket, Severity, TcpFlags};
use tcpstitch_testing::{Conversation, collector, debug_collector, raw_ipv4, raw_ipv6};

#[tokio::test(start_paused = true)]
async fn captured_request_and_response_become_two_messages() {
    let (handler, mut messages) = collector();
    let pool = MessagePool::new(PoolConfig::default(), handler);
    let http = Conversation::new("192.168.1.10:51000", "93.184.216.34:80");
    let (client, server) = (http.client(), http.server());

    pool.intake(raw_ipv4(client, server, TcpFlags::SYN, 1, b"GET /index.html ")).await;
    pool.intake(raw_ipv4(client, server, TcpFlags::FIN_ACK, 17, b"HTTP/1.1\r\n\r\n")).await;
    let request = messages.recv().await.expect("request dispatched");

    pool.intake(raw_ipv4(server, client, TcpFlags::SYN_ACK, 1, b"HTTP/1.1 200 OK\r\n")).await;
    pool.intake(raw_ipv4(server, client, TcpFlags::FIN_ACK, 18, b"\r\nhello")).await;
    let response = messages.recv().await.expect("response dispatched");

    assert_eq!(request.direction(), Direction::Incoming);
    assert_eq!(request.data(), b"GET /index.html HTTP/1.1\r\n\r\n");
    assert_eq!(request.stats().ip_version, 4);
    assert_eq!(request.stats().src_addr, client);
    assert!(request.stats().start.is_some() && request.stats().end.is_some());

    assert_eq!(response.direction(), Direction::Outgoing);
    assert_eq!(response.data(), b"HTTP/1.1 200 OK\r\n\r\nhello");
    assert_eq!(request.session_id(), response.session_id());
    assert_eq!(pool.active_flows().await, 0);
}

#[tokio::test(start_paused = true)]
async fn ipv6_flows_use_bracketed_keys() {
    let (handler, mut messages) = collector();
    let pool = MessagePool::new(PoolConfig::default(), handler);
    let conv = Conversation::new("[2001:db8::1]:40000", "[2001:db8::2]:443");

    pool.intake(raw_ipv6(conv.server(), conv.client(), TcpFlags::SYN_ACK, 7, b"hello")).await;
    assert!(pool.is_tracking(&conv.response_key()).await);
    assert_eq!(conv.response_key(), "[2001:db8::2]:443=[2001:db8::1]:40000");

    pool.intake(raw_ipv6(conv.server(), conv.client(), TcpFlags::FIN_ACK, 12, b"")).await;
    let message = messages.recv().await.expect("message dispatched");
    assert_eq!(message.stats().ip_version, 6);
    assert_eq!(message.data(), b"hello");
}

#[rstest]
#[case::empty(Vec::new())]
#[case::garbage(vec![0xff; 40])]
#[tokio::test(start_paused = true)]
async fn undecodable_input_is_reported(#[case] data: Vec<u8>) {
    let (handler, mut messages) = collector();
    let (debugger, mut diagnostics) = debug_collector();
    let pool = MessagePool::builder().debugger(debugger).build(handler);
    let len = data.len();

    pool.intake(RawPacket::new(data)).await;

    let record = diagnostics.recv().await.expect("diagnostic emitted");
    assert_eq!(record.severity, Severity::High);
    assert!(record.message.starts_with(&format!("error decoding packet({len}Bytes):")));
    assert!(messages.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn timed_out_message_keeps_partial_payload() {
    let (handler, mut messages) = collector();
    let (debugger, mut diagnostics) = debug_collector();
    let pool = MessagePool::builder()
        .message_expiry(Duration::from_millis(250))
        .debugger(debugger)
        .build(handler);
    let conv = Conversation::new("10.1.1.1:5000", "10.1.1.2:6379");

    pool.intake_decoded(conv.request_syn(b"*1\r\n")).await;
    pool.intake_decoded(conv.request(TcpFlags::ACK, 5, b"$4\r\nPING")).await;

    let message = messages.recv().await.expect("message dispatched");
    assert!(message.stats().timed_out);
    assert_eq!(message.data(), b"*1\r\n$4\r\nPING");

    let record = diagnostics.recv().await.expect("expiry reported");
    assert_eq!(record.severity, Severity::Low);
    assert!(!pool.is_tracking(&conv.request_key()).await);
}

#[tokio::test(start_paused = true)]
async fn late_packet_after_completion_is_not_appended() {
    let (handler, mut messages) = collector();
    let pool = MessagePool::new(PoolConfig::default(), handler);
    let conv = Conversation::new("10.1.1.1:5000", "10.1.1.2:80");

    pool.intake_decoded(conv.request_syn(b"one")).await;
    pool.intake_decoded(conv.request_fin(b"")).await;
    pool.intake_decoded(conv.request(TcpFlags::ACK, 9, b"straggler")).await;

    let message = messages.recv().await.expect("message dispatched");
    assert_eq!(message.data(), b"one");
    assert_eq!(pool.active_flows().await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_producers_keep_flows_apart() {
    const CLIENTS: u16 = 32;
    let (handler, mut messages) = collector();
    let pool = MessagePool::builder()
        .message_expiry(Duration::from_secs(30))
        .build(handler);

    let producers = (0..CLIENTS).map(|n| {
        let pool = pool.clone();
        tokio::spawn(async move {
            let conv = Conversation::new(&format!("10.2.0.{n}:{}", 40_000 + n), "10.2.255.1:80");
            pool.intake_decoded(conv.request_syn(format!("client-{n}:").as_bytes())).await;
            for chunk in 0..4_u32 {
                pool.intake_decoded(conv.request(TcpFlags::ACK, chunk + 1, b"xx")).await;
            }
            pool.intake_decoded(conv.request_fin(b"end")).await;
        })
    });
    for joined in join_all(producers).await {
        joined.expect("producer task");
    }

    let mut seen = Vec::new();
    for _ in 0..CLIENTS {
        let message = messages.recv().await.expect("message dispatched");
        assert!(!message.stats().timed_out);
        assert_eq!(message.packets().len(), 6);
        seen.push(String::from_utf8(message.data().to_vec()).expect("ascii payload"));
    }
    seen.sort();
    let mut expected = (0..CLIENTS)
        .map(|n| format!("client-{n}:xxxxxxxxend"))
        .collect::<Vec<_>>();
    expected.sort();
    assert_eq!(seen, expected);
    assert_eq!(pool.active_flows().await, 0);
}
