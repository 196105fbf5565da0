//! Sender-side admission control driven by the peer's delivery forecast.
//!
//! Instead of clocking transmissions off acknowledgments, the sender injects only
//! as many packets as the forecast says the link will clear within the target
//! delay, net of what it believes is already queued.
//!
//! 由对端交付预测驱动的发送端准入控制。
//!
//! 发送方不依赖确认来驱动发送，而是只注入预测表明链路能在目标时延内清空的包数，
//! 并扣除其认为已在排队的部分。

pub mod schedule;

#[cfg(test)]
mod tests;

use crate::config::Config;
use crate::forecast::Forecast;
use std::time::Duration;

pub use schedule::{Burst, TransmissionSchedule};

/// The outcome of one pacing cycle, with the intermediate estimates kept for
/// logging.
///
/// 单次调速周期的结果，保留中间估计值以便记录日志。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PacingDecision {
    /// Forecast tick that `now` falls into.
    /// `now` 所处的预测节拍。
    pub current_tick: usize,
    /// Packets sent but not yet counted by the peer when it made the forecast.
    /// 已发送但在对端生成预测时尚未计入的包数。
    pub delayed_queue_estimate: u64,
    /// The delayed estimate less what should have drained since.
    /// 延迟估计减去此后应已排空的部分。
    pub current_queue_estimate: u64,
    /// Forecast tick the target delay lands on.
    /// 目标时延所落在的预测节拍。
    pub delivery_tick: usize,
    /// Packets the link should clear between `current_tick` and `delivery_tick`.
    /// 链路在 `current_tick` 与 `delivery_tick` 之间应能清空的包数。
    pub cumulative_delivery_forecast: u64,
    /// Packets admitted now.
    /// 当前准许发送的包数。
    pub packets_to_send: u64,
}

/// Computes how many packets may be injected now.
///
/// The controller holds only configuration; `decide` is a pure function of its
/// arguments.
///
/// 计算当前可注入的包数。控制器只持有配置，`decide` 是其参数的纯函数。
#[derive(Debug, Clone)]
pub struct PacingController {
    target_delay_ticks: usize,
    tick_ms: u64,
}

impl PacingController {
    pub fn new(target_delay_ticks: usize, tick_length: Duration) -> Self {
        Self {
            target_delay_ticks,
            tick_ms: (tick_length.as_millis() as u64).max(1),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.pacing.target_delay_ticks, config.receiver.tick_length)
    }

    /// Decides how many packets to send at `now`, given the next sequence
    /// number to be assigned and the operative forecast. `forecast.timestamp`
    /// must be expressed on the same clock as `now`.
    ///
    /// 根据下一个待分配的序列号和当前有效的预测，决定在 `now` 时刻发送多少包。
    /// `forecast.timestamp` 必须与 `now` 使用同一时钟。
    pub fn decide(&self, now: u64, next_seq: u64, forecast: &Forecast) -> PacingDecision {
        let counts = &forecast.counts;
        let Some(last_tick) = counts.len().checked_sub(1) else {
            return PacingDecision {
                delayed_queue_estimate: next_seq.saturating_sub(forecast.received_or_lost_count),
                ..Default::default()
            };
        };

        let elapsed_ticks = now.saturating_sub(forecast.timestamp) / self.tick_ms;
        let current_tick = usize::try_from(elapsed_ticks)
            .unwrap_or(usize::MAX)
            .min(last_tick);

        let delayed_queue_estimate = next_seq.saturating_sub(forecast.received_or_lost_count);
        let drained = u64::from(counts[current_tick]);
        let current_queue_estimate = delayed_queue_estimate.saturating_sub(drained);

        let delivery_tick = current_tick
            .saturating_add(self.target_delay_ticks)
            .min(last_tick);
        let cumulative_delivery_forecast = u64::from(counts[delivery_tick]).saturating_sub(drained);

        PacingDecision {
            current_tick,
            delayed_queue_estimate,
            current_queue_estimate,
            delivery_tick,
            cumulative_delivery_forecast,
            packets_to_send: cumulative_delivery_forecast.saturating_sub(current_queue_estimate),
        }
    }
}
