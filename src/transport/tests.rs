//! 传输层测试
//! Transport layer tests

use super::session::SESSION_HEADER_SIZE;
use super::*;
use crate::error::Error;
use bytes::BytesMut;
use std::time::Duration;

#[test]
fn test_session_header_roundtrip() {
    let header = SessionHeader {
        session_key: 0xDEAD_BEEF_0123_4567,
        sequence_number: 42,
        throwaway_window: 10,
        time_to_next: 500,
        timestamp: 123_456,
        timestamp_reply: u32::MAX,
    };
    let mut buf = BytesMut::new();
    header.encode(&mut buf);
    assert_eq!(buf.len(), SESSION_HEADER_SIZE);
    // 网络字节序：密钥的最高字节在前
    // Network byte order: the key's most significant byte comes first.
    assert_eq!(buf[0], 0xDE);

    let decoded = SessionHeader::decode(&mut buf.freeze()).unwrap();
    assert_eq!(decoded, header);
}

#[test]
fn test_session_header_too_short() {
    let mut short = Bytes::from_static(&[0u8; SESSION_HEADER_SIZE - 1]);
    assert!(SessionHeader::decode(&mut short).is_none());
}

#[test]
fn test_session_key_parsing() {
    assert_eq!(parse_session_key("ff").unwrap(), 255);
    assert_eq!(parse_session_key("0x10").unwrap(), 16);
    assert_eq!(parse_session_key(" 0123456789abcdef ").unwrap(), 0x0123_4567_89ab_cdef);
    assert!(matches!(parse_session_key(""), Err(Error::InvalidSessionKey(_))));
    assert!(matches!(parse_session_key("zz"), Err(Error::InvalidSessionKey(_))));
    // 17位十六进制数超出u64
    // Seventeen hex digits overflow a u64.
    assert!(parse_session_key("1ffffffffffffffff").is_err());

    let key = 0x00ab_cdef_0000_0001;
    assert_eq!(format_session_key(key), "00abcdef00000001");
    assert_eq!(parse_session_key(&format_session_key(key)).unwrap(), key);
}

#[tokio::test(start_paused = true)]
async fn test_seal_open_assigns_sequence_numbers() {
    let mut a = Session::new(7, 3);
    let mut b = Session::new(7, 3);
    assert_eq!(a.next_seq(), 0);

    for expected in 0..3u64 {
        let datagram = a.seal(b"hello", 20);
        assert_eq!(datagram.len(), SESSION_HEADER_SIZE + 5);
        let delivery = b.open(datagram).unwrap().unwrap();
        assert_eq!(delivery.sequence_number, expected);
        assert_eq!(delivery.throwaway_window, 3);
        assert_eq!(delivery.time_to_next, 20);
        assert_eq!(&delivery.payload[..], b"hello");
    }
    assert_eq!(a.next_seq(), 3);
    assert_eq!(b.next_seq(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_open_filters_foreign_and_short_datagrams() {
    let mut ours = Session::new(1, 0);
    let mut theirs = Session::new(2, 0);

    let foreign = theirs.seal(b"x", 0);
    assert!(ours.open(foreign).unwrap().is_none());

    let short = Bytes::from_static(&[1, 2, 3]);
    assert!(matches!(ours.open(short), Err(Error::MalformedDatagram)));
}

#[tokio::test(start_paused = true)]
async fn test_timestamp_echo_yields_rtt_sample() {
    let mut a = Session::new(9, 0);
    let mut b = Session::new(9, 0);
    assert!(a.srtt().is_none());

    let ping = a.seal(b"", 0);
    tokio::time::advance(Duration::from_millis(30)).await;
    b.open(ping).unwrap().unwrap();

    // b 持有时间戳20ms后回复，回显会扣除这段时间
    // b holds the timestamp for 20ms before replying; the echo accounts for it.
    tokio::time::advance(Duration::from_millis(20)).await;
    let pong = b.seal(b"", 0);
    tokio::time::advance(Duration::from_millis(30)).await;
    a.open(pong).unwrap().unwrap();

    let srtt = a.srtt().unwrap();
    assert!((srtt.as_secs_f64() - 0.060).abs() < 1e-6, "srtt was {srtt:?}");
    // b 从未收到回显，因此没有样本
    // b never received an echo, so it has no sample.
    assert!(b.srtt().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_channel_pair_exchange() {
    let (mut left, mut right) = ChannelTransport::pair(0xABCD, 5);
    assert!(left.is_attached());

    left.send(Bytes::from_static(b"ping"), 100).await.unwrap();
    left.send(Bytes::from_static(b"again"), 0).await.unwrap();
    assert_eq!(left.next_seq(), 2);

    let first = right.recv().await.unwrap();
    assert_eq!(first.sequence_number, 0);
    assert_eq!(first.time_to_next, 100);
    assert_eq!(first.throwaway_window, 5);
    assert_eq!(&first.payload[..], b"ping");
    let second = right.recv().await.unwrap();
    assert_eq!(second.sequence_number, 1);

    right.send(Bytes::from_static(b"pong"), 0).await.unwrap();
    let reply = left.recv().await.unwrap();
    assert_eq!(&reply.payload[..], b"pong");
    assert!(left.srtt().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_channel_closed_peer() {
    let (mut left, right) = ChannelTransport::pair(1, 0);
    drop(right);
    assert!(matches!(
        left.send(Bytes::from_static(b"x"), 0).await,
        Err(Error::ChannelClosed)
    ));
    assert!(matches!(left.recv().await, Err(Error::ChannelClosed)));
}

#[tokio::test]
async fn test_udp_listener_is_detached_until_first_datagram() {
    let mut listener = UdpTransport::listen("127.0.0.1:0".parse().unwrap(), 10)
        .await
        .unwrap();
    assert!(!listener.is_attached());
    assert!(matches!(
        listener.send(Bytes::new(), 0).await,
        Err(Error::NotAttached)
    ));

    let server_addr = listener.local_addr().unwrap();
    let mut client = UdpTransport::connect(listener.session_key(), server_addr, 10)
        .await
        .unwrap();
    assert!(client.is_attached());
    client.send(Bytes::from_static(b"hi"), 0).await.unwrap();

    let delivery = tokio::time::timeout(Duration::from_secs(5), listener.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&delivery.payload[..], b"hi");
    assert!(listener.is_attached());
    assert_eq!(listener.remote_addr().map(|a| a.port()), Some(client.local_addr().unwrap().port()));
}
