//! Counts packets received or written off, tolerating reordering.
//!
//! 统计已接收或已放弃的包数，容忍乱序。

use std::collections::BTreeSet;

/// A cumulative count of packets that have either arrived or been written off
/// as lost.
///
/// Any sequence number more than `window` below the highest one seen is
/// considered gone for good. The count never decreases and a sequence number is
/// never counted twice.
///
/// 已到达或已判定丢失的包的累计计数。
///
/// 任何比已见最高序列号低 `window` 以上的序列号都被视为永久丢失。计数永不减少，
/// 同一序列号不会被重复计数。
#[derive(Debug, Clone, Default)]
pub struct LossTolerantCounter {
    /// Received sequence numbers at or above `threshold`.
    outstanding: BTreeSet<u64>,
    /// Every sequence number below this is accounted for.
    threshold: u64,
}

impl LossTolerantCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the arrival of `seq` with the sender's reordering tolerance.
    ///
    /// 记录 `seq` 的到达以及发送方的乱序容忍度。
    pub fn recv(&mut self, seq: u64, window: u16) {
        self.threshold = self.threshold.max(seq.saturating_sub(u64::from(window)));
        if seq >= self.threshold {
            self.outstanding.insert(seq);
        }
    }

    /// Packets received or written off so far.
    ///
    /// 迄今为止已接收或已放弃的包数。
    pub fn packet_count(&mut self) -> u64 {
        if self
            .outstanding
            .first()
            .is_some_and(|&lowest| lowest < self.threshold)
        {
            self.outstanding = self.outstanding.split_off(&self.threshold);
        }
        self.threshold + self.outstanding.len() as u64
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }
}
