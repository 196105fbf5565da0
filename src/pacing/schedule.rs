//! 决定何时发送、发送多少帧，以及哪些帧携带预测。
//! Decides when to transmit, how many frames, and which of them carry a forecast.

use crate::config::PacingConfig;
use std::time::Duration;

/// A run of frames to emit back to back.
///
/// 一组需要连续发送的帧。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Burst {
    pub frames: u64,
    pacing_hint_ms: u16,
}

impl Burst {
    /// The `time_to_next` hint for the frame at `index`. Only the final frame
    /// announces a pause; the others promise more data right away.
    ///
    /// 第 `index` 帧的 `time_to_next` 提示。只有最后一帧宣告停顿，
    /// 其他帧表示紧接着还有数据。
    pub fn time_to_next(&self, index: u64) -> u16 {
        if self.frames.saturating_sub(index) <= 1 {
            self.pacing_hint_ms
        } else {
            0
        }
    }
}

/// Transmission timing state for one sender.
///
/// 单个发送方的发送时序状态。
#[derive(Debug, Clone)]
pub struct TransmissionSchedule {
    fallback_interval_ms: u64,
    pacing_hint_ms: u16,
    /// Latest instant by which something must be sent.
    next_transmission: u64,
    /// Timestamp of the last forecast actually put on the wire.
    last_forecast_sent: Option<u64>,
}

impl TransmissionSchedule {
    pub fn new(config: &PacingConfig, now: u64) -> Self {
        let fallback_interval_ms = config.fallback_interval.as_millis() as u64;
        Self {
            fallback_interval_ms,
            pacing_hint_ms: config.pacing_hint_ms,
            next_transmission: now.saturating_add(fallback_interval_ms),
            last_forecast_sent: None,
        }
    }

    /// Turns an admission decision into a burst. With nothing admitted, a
    /// single keep-alive frame still goes out once the fallback interval has
    /// elapsed, so the peer keeps receiving fresh forecasts.
    ///
    /// 将准入决策转换为一次突发。即使没有准许发送的包，回退间隔到期后仍会发送
    /// 一个保活帧，使对端持续收到新的预测。
    pub fn plan_burst(&mut self, now: u64, packets_to_send: u64) -> Option<Burst> {
        if packets_to_send == 0 && self.next_transmission > now {
            return None;
        }
        self.next_transmission = self
            .next_transmission
            .max(now.saturating_add(self.fallback_interval_ms));
        Some(Burst {
            frames: packets_to_send.max(1),
            pacing_hint_ms: self.pacing_hint_ms,
        })
    }

    /// Whether a forecast stamped `timestamp` should be piggybacked on the next
    /// frame. Each distinct forecast is sent once.
    ///
    /// 是否应在下一帧上捎带时间戳为 `timestamp` 的预测。每个不同的预测只发送一次。
    pub fn should_attach_forecast(&mut self, timestamp: u64) -> bool {
        if self.last_forecast_sent == Some(timestamp) {
            return false;
        }
        self.last_forecast_sent = Some(timestamp);
        true
    }

    /// Makes a keep-alive due at `now` at the latest.
    ///
    /// 使保活帧最迟在 `now` 时到期。
    pub fn expedite(&mut self, now: u64) {
        self.next_transmission = self.next_transmission.min(now);
    }

    /// Time left before a keep-alive becomes due.
    pub fn time_until_due(&self, now: u64) -> Duration {
        Duration::from_millis(self.next_transmission.saturating_sub(now))
    }

    pub fn next_transmission(&self) -> u64 {
        self.next_transmission
    }
}
