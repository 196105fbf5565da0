//! Transport layer abstraction for the datagram link.
//!
//! The core only needs to send a payload with a `time_to_next` hint, receive
//! the next payload along with its sequence metadata, and know the next
//! sequence number it will assign. Everything else (addressing, session
//! filtering, timestamps) stays behind this trait.
//!
//! 数据报链路的传输层抽象。
//!
//! 核心逻辑只需要发送带有 `time_to_next` 提示的载荷、接收下一个载荷及其序列元数据，
//! 并知道下一个将分配的序列号。其余一切（寻址、会话过滤、时间戳）都隐藏在此 trait 之后。

pub mod channel;
pub mod rtt;
pub mod session;
pub mod udp;

#[cfg(test)]
mod tests;

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt::Debug;
use std::time::Duration;

pub use channel::ChannelTransport;
pub use session::{Session, SessionHeader, format_session_key, parse_session_key};
pub use udp::UdpTransport;

/// A payload delivered by the transport, with the sender's metadata.
///
/// 传输层交付的载荷及发送方的元数据。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub sequence_number: u64,
    pub throwaway_window: u16,
    pub time_to_next: u16,
    pub payload: Bytes,
}

/// Unreliable, mostly-in-order datagram transport.
///
/// `recv` must be cancel-safe: it is raced against a timer.
///
/// 不可靠、基本有序的数据报传输。`recv` 必须是取消安全的，因为它会与定时器竞争。
#[async_trait]
pub trait Transport: Send + Debug + 'static {
    /// Sends one payload. `time_to_next` tells the peer when to expect more.
    ///
    /// 发送一个载荷。`time_to_next` 告诉对端何时会有更多数据。
    async fn send(&mut self, payload: Bytes, time_to_next: u16) -> Result<()>;

    /// Waits for the next payload addressed to this session.
    ///
    /// 等待下一个发往本会话的载荷。
    async fn recv(&mut self) -> Result<Delivery>;

    /// The sequence number the next `send` will use.
    fn next_seq(&self) -> u64;

    /// Smoothed round-trip time, once measured.
    fn srtt(&self) -> Option<Duration>;

    /// Whether a peer is known. A listener is detached until its first valid
    /// datagram arrives.
    fn is_attached(&self) -> bool;
}
