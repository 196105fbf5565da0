//! 数据报会话头与会话状态：序列号、时间戳回显和会话密钥过滤。
//! Datagram session header and per-session state: sequence numbering,
//! timestamp echo and session key filtering.

use super::Delivery;
use super::rtt::RttEstimator;
use crate::clock::Clock;
use crate::error::{Error, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::time::Duration;

pub const SESSION_HEADER_SIZE: usize = 8 + 8 + 2 + 2 + 4 + 4;

/// Marks an absent timestamp reply.
const NO_TIMESTAMP: u32 = u32::MAX;

/// Echoes held longer than this are not turned into RTT samples.
const MAX_RTT_SAMPLE_MS: u32 = 5_000;

/// The header prepended to every datagram.
///
/// 每个数据报前附加的头部。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHeader {
    /// Shared secret identifying the session.
    /// 标识会话的共享密钥。
    pub session_key: u64,
    pub sequence_number: u64,
    /// Reordering tolerance for the receiver's loss counter.
    /// 接收端丢包计数器的乱序容忍度。
    pub throwaway_window: u16,
    /// Milliseconds until the sender expects to transmit again.
    /// 发送方预计再次发送前的毫秒数。
    pub time_to_next: u16,
    /// Sender's clock, in milliseconds, modulo `u32::MAX`.
    pub timestamp: u32,
    /// The peer's last timestamp, advanced by how long it was held.
    pub timestamp_reply: u32,
}

impl SessionHeader {
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_u64(self.session_key);
        buf.put_u64(self.sequence_number);
        buf.put_u16(self.throwaway_window);
        buf.put_u16(self.time_to_next);
        buf.put_u32(self.timestamp);
        buf.put_u32(self.timestamp_reply);
    }

    pub fn decode<B: Buf>(buf: &mut B) -> Option<Self> {
        if buf.remaining() < SESSION_HEADER_SIZE {
            return None;
        }
        Some(SessionHeader {
            session_key: buf.get_u64(),
            sequence_number: buf.get_u64(),
            throwaway_window: buf.get_u16(),
            time_to_next: buf.get_u16(),
            timestamp: buf.get_u32(),
            timestamp_reply: buf.get_u32(),
        })
    }
}

/// Formats a session key the way it is typed on the command line.
pub fn format_session_key(key: u64) -> String {
    format!("{key:016x}")
}

/// Parses a hexadecimal session key, with or without a `0x` prefix.
///
/// 解析十六进制会话密钥，可带或不带 `0x` 前缀。
pub fn parse_session_key(text: &str) -> Result<u64> {
    let digits = text.trim().trim_start_matches("0x");
    if digits.is_empty() {
        return Err(Error::InvalidSessionKey(text.to_string()));
    }
    u64::from_str_radix(digits, 16).map_err(|_| Error::InvalidSessionKey(text.to_string()))
}

/// State for one end of a session.
///
/// 会话一端的状态。
#[derive(Debug)]
pub struct Session {
    key: u64,
    throwaway_window: u16,
    clock: Clock,
    next_seq: u64,
    /// Last peer timestamp and the local instant it arrived.
    pending_reply: Option<(u32, u64)>,
    rtt: RttEstimator,
}

impl Session {
    pub fn new(key: u64, throwaway_window: u16) -> Self {
        Self {
            key,
            throwaway_window,
            clock: Clock::new(),
            next_seq: 0,
            pending_reply: None,
            rtt: RttEstimator::new(),
        }
    }

    pub fn key(&self) -> u64 {
        self.key
    }

    /// The sequence number the next sealed datagram will carry.
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    pub fn srtt(&self) -> Option<Duration> {
        self.rtt.srtt()
    }

    fn timestamp(&self) -> u32 {
        (self.clock.now_ms() % u64::from(NO_TIMESTAMP)) as u32
    }

    /// Wraps `payload` in a session header and consumes a sequence number.
    ///
    /// 用会话头包装 `payload` 并消耗一个序列号。
    pub fn seal(&mut self, payload: &[u8], time_to_next: u16) -> Bytes {
        let now = self.clock.now_ms();
        let timestamp_reply = match self.pending_reply.take() {
            Some((peer_timestamp, received_at)) => {
                let held = now.saturating_sub(received_at);
                ((u64::from(peer_timestamp) + held) % u64::from(NO_TIMESTAMP)) as u32
            }
            None => NO_TIMESTAMP,
        };

        let header = SessionHeader {
            session_key: self.key,
            sequence_number: self.next_seq,
            throwaway_window: self.throwaway_window,
            time_to_next,
            timestamp: self.timestamp(),
            timestamp_reply,
        };
        self.next_seq += 1;

        let mut buf = BytesMut::with_capacity(SESSION_HEADER_SIZE + payload.len());
        header.encode(&mut buf);
        buf.put_slice(payload);
        buf.freeze()
    }

    /// Strips and checks the session header. Returns `Ok(None)` for a datagram
    /// belonging to some other session.
    ///
    /// 剥离并检查会话头。若数据报属于其他会话，返回 `Ok(None)`。
    pub fn open(&mut self, mut datagram: Bytes) -> Result<Option<Delivery>> {
        let header = SessionHeader::decode(&mut datagram).ok_or(Error::MalformedDatagram)?;
        if header.session_key != self.key {
            return Ok(None);
        }

        let now = self.clock.now_ms();
        if header.timestamp_reply != NO_TIMESTAMP {
            let modulus = u64::from(NO_TIMESTAMP);
            let local = now % modulus;
            let sample = (local + modulus - u64::from(header.timestamp_reply)) % modulus;
            if sample < u64::from(MAX_RTT_SAMPLE_MS) {
                self.rtt.update(Duration::from_millis(sample));
            }
        }
        self.pending_reply = Some((header.timestamp, now));

        Ok(Some(Delivery {
            sequence_number: header.sequence_number,
            throwaway_window: header.throwaway_window,
            time_to_next: header.time_to_next,
            payload: datagram,
        }))
    }
}
