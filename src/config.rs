//! 定义了估计器、接收端和调速器的可配置参数。
//! Defines configurable parameters for the estimator, the receiver and the pacer.

use crate::error::{Error, Result};
use crate::forecast::MAX_FORECAST_HORIZON;
use std::time::Duration;

/// Ceiling on `max_arrivals_per_tick`. The emission model keeps a table of
/// this many log-factorials and the forecasters walk up to it per tick.
pub const MAX_ARRIVALS_PER_TICK_LIMIT: u32 = 10_000;

/// A structure containing all configurable parameters for one endpoint.
///
/// 包含单个端点所有可配置参数的结构体。
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parameters of the stochastic link model.
    /// 随机链路模型的参数。
    pub estimator: EstimatorConfig,

    /// Tick cadence and forecast shape.
    /// 节拍周期与预测形状。
    pub receiver: ReceiverConfig,

    /// Sender-side admission control and scheduling.
    /// 发送端准入控制与调度。
    pub pacing: PacingConfig,
}

/// Parameters of the link capacity model. These are fixed for the lifetime of
/// an estimator.
///
/// 链路容量模型的参数。在估计器的生命周期内保持不变。
#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    /// The highest capacity state, in packets per second.
    /// 最高容量状态（每秒包数）。
    pub max_arrival_rate: f64,
    /// Standard deviation of the rate drift over one second, in packets per second.
    /// 一秒内速率漂移的标准差（每秒包数）。
    pub diffusion_rate: f64,
    /// Rate at which the link leaves an outage, per second.
    /// 链路离开中断状态的速率（每秒）。
    pub outage_escape_rate: f64,
    /// Number of discrete capacity states.
    /// 离散容量状态的数量。
    pub bin_count: usize,
}

/// Receiver-side parameters.
///
/// 接收端参数。
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Length of one virtual-time tick.
    /// 单个虚拟时间节拍的长度。
    pub tick_length: Duration,
    /// Number of future ticks in a forecast.
    /// 预测中包含的未来节拍数。
    pub horizon_ticks: usize,
    /// Arrivals per tick beyond which the emission model saturates.
    /// 每个节拍到达数的上限，超过后发射模型饱和。
    pub max_arrivals_per_tick: u32,
    /// Quantile reported by the forecasters. Small values are pessimistic.
    /// 预测器报告的分位数。值越小越保守。
    pub forecast_quantile: f64,
}

/// Sender-side parameters.
///
/// 发送端参数。
#[derive(Debug, Clone)]
pub struct PacingConfig {
    /// How many ticks ahead the sender aims to have its packets delivered.
    /// 发送方期望数据包送达的提前节拍数。
    pub target_delay_ticks: usize,
    /// `time_to_next` hint attached to the last frame of a burst, in milliseconds.
    /// 附加在突发最后一帧上的 `time_to_next` 提示（毫秒）。
    pub pacing_hint_ms: u16,
    /// Longest silence before a keep-alive frame is sent.
    /// 发送保活帧之前的最长静默时间。
    pub fallback_interval: Duration,
    /// Upper bound on a single readiness wait while attached.
    /// 已连接时单次就绪等待的上限。
    pub max_poll_wait: Duration,
    /// Reordering tolerance advertised to the peer's counter.
    /// 通告给对端计数器的乱序容忍度。
    pub throwaway_window: u16,
    /// Size of the opaque payload carried by each frame.
    /// 每帧携带的不透明载荷大小。
    pub payload_size: usize,
}

impl Config {
    /// Checks that every parameter is usable.
    ///
    /// 检查所有参数是否可用。
    pub fn validate(&self) -> Result<()> {
        self.estimator.validate()?;
        self.receiver.validate()?;
        if self.pacing.max_poll_wait.is_zero() {
            return Err(Error::InvalidConfig("max_poll_wait must be positive"));
        }
        Ok(())
    }
}

impl EstimatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.bin_count < 2 {
            return Err(Error::InvalidConfig("bin_count must be at least 2"));
        }
        if !(self.max_arrival_rate.is_finite() && self.max_arrival_rate > 0.0) {
            return Err(Error::InvalidConfig("max_arrival_rate must be positive"));
        }
        if !(self.diffusion_rate.is_finite() && self.diffusion_rate >= 0.0) {
            return Err(Error::InvalidConfig("diffusion_rate must be non-negative"));
        }
        if !(self.outage_escape_rate.is_finite() && self.outage_escape_rate >= 0.0) {
            return Err(Error::InvalidConfig(
                "outage_escape_rate must be non-negative",
            ));
        }
        Ok(())
    }
}

impl ReceiverConfig {
    /// The tick length in whole milliseconds, the unit of the virtual clock.
    ///
    /// 以整毫秒表示的节拍长度，即虚拟时钟的单位。
    pub fn tick_millis(&self) -> u64 {
        self.tick_length.as_millis() as u64
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_millis() == 0 {
            return Err(Error::InvalidConfig("tick_length must be at least 1ms"));
        }
        // The virtual clock counts whole milliseconds.
        if self.tick_length.subsec_nanos() % 1_000_000 != 0 {
            return Err(Error::InvalidConfig(
                "tick_length must be a whole number of milliseconds",
            ));
        }
        if self.horizon_ticks == 0 {
            return Err(Error::InvalidConfig("horizon_ticks must be positive"));
        }
        if self.horizon_ticks > MAX_FORECAST_HORIZON {
            return Err(Error::InvalidConfig(
                "horizon_ticks is too long for a forecast to fit a wire frame",
            ));
        }
        if self.max_arrivals_per_tick == 0 {
            return Err(Error::InvalidConfig(
                "max_arrivals_per_tick must be positive",
            ));
        }
        if self.max_arrivals_per_tick > MAX_ARRIVALS_PER_TICK_LIMIT {
            return Err(Error::InvalidConfig(
                "max_arrivals_per_tick exceeds 10000",
            ));
        }
        if !(self.forecast_quantile > 0.0 && self.forecast_quantile < 1.0) {
            return Err(Error::InvalidConfig(
                "forecast_quantile must lie strictly between 0 and 1",
            ));
        }
        Ok(())
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            max_arrival_rate: 1000.0,
            diffusion_rate: 100.0,
            outage_escape_rate: 2.0,
            bin_count: 100,
        }
    }
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            tick_length: Duration::from_millis(20),
            horizon_ticks: 20,
            max_arrivals_per_tick: 30,
            forecast_quantile: 0.05,
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            target_delay_ticks: 5,
            pacing_hint_ms: 500,
            fallback_interval: Duration::from_millis(5000),
            max_poll_wait: Duration::from_millis(10),
            throwaway_window: 10,
            payload_size: 1400,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_single_bin() {
        let mut config = Config::default();
        config.estimator.bin_count = 1;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_sub_millisecond_tick() {
        let mut config = Config::default();
        config.receiver.tick_length = Duration::from_micros(500);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_degenerate_quantile() {
        let mut config = Config::default();
        config.receiver.forecast_quantile = 1.0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_unencodable_horizon() {
        let mut config = Config::default();
        config.estimator.bin_count = 4;
        config.receiver.horizon_ticks = MAX_FORECAST_HORIZON;
        assert!(config.validate().is_ok());

        config.receiver.horizon_ticks = 17_000;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        assert!(crate::receiver::Receiver::new(&config).is_err());
    }

    #[test]
    fn test_rejects_unbounded_arrivals_per_tick() {
        let mut config = Config::default();
        config.receiver.max_arrivals_per_tick = MAX_ARRIVALS_PER_TICK_LIMIT;
        assert!(config.validate().is_ok());

        config.receiver.max_arrivals_per_tick = u32::MAX;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        // Rejected before the estimator sizes its tables.
        assert!(crate::receiver::Receiver::new(&config).is_err());
    }

    #[test]
    fn test_rejects_fractional_millisecond_tick() {
        let mut config = Config::default();
        config.receiver.tick_length = Duration::from_micros(20_500);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        config.receiver.tick_length = Duration::from_millis(25);
        assert!(config.validate().is_ok());
    }
}
