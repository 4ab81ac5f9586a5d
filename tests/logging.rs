//! Diagnostics are mirrored to the `log` facade.

use std::time::Duration;

use rstest::rstest;
use serial_test::serial;
use tcpstitch::{MessagePool, PoolConfig, TcpFlags};
use tcpstitch_testing::{Conversation, LoggerHandle, collector, logger};

#[rstest]
#[tokio::test(start_paused = true)]
#[serial]
async fn reset_is_logged_as_warning(mut logger: LoggerHandle) {
    logger.clear();
    let (handler, _messages) = collector();
    let pool = MessagePool::new(PoolConfig::default(), handler);
    let conv = Conversation::new("10.0.0.1:40000", "10.0.0.2:80");

    pool.intake_decoded(conv.request(TcpFlags::RST, 0, b"")).await;

    let records = logger.drain();
    assert!(
        records
            .iter()
            .any(|(level, msg)| *level == log::Level::Warn
                && msg.starts_with("RST flag from 10.0.0.1:40000 to 10.0.0.2:80")),
        "missing RST warning in {records:?}"
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
#[serial]
async fn truncation_is_logged_at_debug(mut logger: LoggerHandle) {
    logger.clear();
    let (handler, mut messages) = collector();
    let pool = MessagePool::builder().max_message_size(4).build(handler);
    let conv = Conversation::new("10.0.0.1:40000", "10.0.0.2:80");

    pool.intake_decoded(conv.request_syn(b"too long")).await;
    let message = messages.recv().await.expect("message dispatched");
    assert_eq!(message.data(), b"too ");

    let records = logger.drain();
    assert!(
        records
            .iter()
            .any(|(level, msg)| *level == log::Level::Debug
                && msg.contains("truncated at 4 bytes")),
        "missing truncation record in {records:?}"
    );
}

#[rstest]
#[tokio::test]
#[serial]
async fn handler_panic_is_logged(mut logger: LoggerHandle) {
    logger.clear();
    let pool = MessagePool::new(PoolConfig::default(), |message: tcpstitch::Message| {
        assert!(message.is_empty(), "consumer exploded");
    });
    let conv = Conversation::new("10.0.0.1:40000", "10.0.0.2:80");

    pool.intake_decoded(conv.request_syn(b"x")).await;
    pool.intake_decoded(conv.request_fin(b"")).await;

    // The handler runs on the blocking pool; poll until its report lands.
    let mut records = Vec::new();
    for _ in 0..100 {
        records.extend(logger.drain());
        if records.iter().any(|(level, msg)| {
            *level == log::Level::Error && msg.contains("message handler panicked")
        }) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("missing panic record in {records:?}");
}
