//! The delivery forecast exchanged between peers, and its binary codec.
//!
//! 对端之间交换的交付预测及其二进制编解码。

use crate::error::{Error, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Fixed prefix: timestamp, received-or-lost count, number of counts.
const FORECAST_PREFIX_SIZE: usize = 8 + 8 + 2;

/// Largest encoding that fits a wire frame's 16-bit length prefix.
pub const MAX_ENCODED_FORECAST: usize = u16::MAX as usize;

/// Longest horizon whose encoding still fits `MAX_ENCODED_FORECAST`.
pub const MAX_FORECAST_HORIZON: usize = (MAX_ENCODED_FORECAST - FORECAST_PREFIX_SIZE) / 4;

/// A snapshot of the receiver's view of its incoming link.
///
/// `counts[i]` is the number of packets the receiver expects, pessimistically,
/// to have arrived `i + 1` ticks after `timestamp`. It never decreases with `i`.
///
/// 接收端对其入向链路的快照。
///
/// `counts[i]` 是接收端保守预期在 `timestamp` 之后 `i + 1` 个节拍内到达的包数，
/// 随 `i` 单调不减。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Forecast {
    /// Tick-aligned instant the forecast was computed at, in milliseconds.
    /// 预测计算时刻（与节拍对齐，毫秒）。
    pub timestamp: u64,
    /// Packets received or written off as lost at `timestamp`.
    /// 截至 `timestamp` 已接收或已判定丢失的包数。
    pub received_or_lost_count: u64,
    /// Cumulative deliverable packets per future tick.
    /// 每个未来节拍的累计可交付包数。
    pub counts: Vec<u32>,
}

impl Forecast {
    /// A forecast with no horizon. A sender holding it admits nothing beyond
    /// keep-alives.
    ///
    /// 没有预测范围的预测。持有它的发送方只会发送保活帧。
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn horizon(&self) -> usize {
        self.counts.len()
    }

    pub fn encoded_len(&self) -> usize {
        FORECAST_PREFIX_SIZE + 4 * self.counts.len()
    }

    /// Serializes the forecast, refusing encodings that would not fit a frame.
    ///
    /// 序列化预测，拒绝无法放入帧的编码。
    pub fn to_bytes(&self) -> Result<Bytes> {
        let len = self.encoded_len();
        if len > MAX_ENCODED_FORECAST {
            return Err(Error::ForecastTooLarge(len));
        }
        let mut buf = BytesMut::with_capacity(len);
        buf.put_u64(self.timestamp);
        buf.put_u64(self.received_or_lost_count);
        buf.put_u16(self.counts.len() as u16);
        for count in &self.counts {
            buf.put_u32(*count);
        }
        Ok(buf.freeze())
    }

    /// Parses a forecast that must occupy the whole of `buf`.
    ///
    /// 解析一个必须占满整个 `buf` 的预测。
    pub fn from_bytes(mut buf: &[u8]) -> Result<Self> {
        if buf.remaining() < FORECAST_PREFIX_SIZE {
            return Err(Error::MalformedForecast("truncated header"));
        }
        let timestamp = buf.get_u64();
        let received_or_lost_count = buf.get_u64();
        let n = buf.get_u16() as usize;
        if buf.remaining() < 4 * n {
            return Err(Error::MalformedForecast("truncated counts"));
        }
        let counts = (0..n).map(|_| buf.get_u32()).collect();
        if buf.has_remaining() {
            return Err(Error::MalformedForecast("trailing bytes"));
        }
        Ok(Self {
            timestamp,
            received_or_lost_count,
            counts,
        })
    }
}
