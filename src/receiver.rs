//! Receiver-side orchestration: drives the estimator on a fixed tick cadence
//! and produces delivery forecasts for the peer.
//!
//! 接收端编排：按固定节拍驱动估计器，并为对端生成交付预测。

pub mod loss_counter;


use crate::config::Config;
use crate::error::Result;
use crate::estimator::{LinkStateEstimator, TickForecaster};
use crate::forecast::Forecast;
use std::time::Duration;
use tracing::trace;

pub use loss_counter::LossTolerantCounter;

/// The receiving half of a forecast-paced link.
///
/// Virtual time advances in whole ticks. A tick with arrivals is always
/// evidence. An idle tick only counts once `score_deadline` has passed, that is
/// once the sender said it would have sent something by then.
///
/// 预测调速链路的接收半部。
///
/// 虚拟时间以整节拍推进。有到达的节拍总是证据；空闲节拍只有在 `score_deadline`
/// 之后才计入，即发送方声明在此之前会发送数据之后。
#[derive(Debug, Clone)]
pub struct Receiver {
    estimator: LinkStateEstimator,
    forecasters: Vec<TickForecaster>,
    counter: LossTolerantCounter,
    tick_length: Duration,
    tick_ms: u64,
    quantile: f64,
    /// Virtual clock, in milliseconds.
    time: u64,
    /// Idle ticks at or after this instant are scored.
    score_deadline: u64,
    count_this_tick: u32,
    cached_forecast: Option<Forecast>,
}

impl Receiver {
    /// Creates a receiver whose virtual clock starts at zero.
    ///
    /// 创建一个虚拟时钟从零开始的接收端。
    pub fn new(config: &Config) -> Result<Self> {
        config.estimator.validate()?;
        config.receiver.validate()?;

        let cfg = &config.receiver;
        let estimator =
            LinkStateEstimator::new(config.estimator.clone(), cfg.max_arrivals_per_tick);
        let forecasters = (1..=cfg.horizon_ticks as u32)
            .map(|offset| {
                TickForecaster::new(
                    cfg.tick_length,
                    &estimator,
                    cfg.max_arrivals_per_tick,
                    offset,
                )
            })
            .collect();

        Ok(Self {
            estimator,
            forecasters,
            counter: LossTolerantCounter::new(),
            tick_length: cfg.tick_length,
            tick_ms: cfg.tick_millis(),
            quantile: cfg.forecast_quantile,
            time: 0,
            // Nothing is expected before the first packet.
            score_deadline: u64::MAX,
            count_this_tick: 0,
            cached_forecast: None,
        })
    }

    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn score_deadline(&self) -> u64 {
        self.score_deadline
    }

    pub fn estimator(&self) -> &LinkStateEstimator {
        &self.estimator
    }

    /// Jumps the virtual clock to `time` without stepping the estimator, and
    /// starts scoring idle ticks from there.
    ///
    /// 将虚拟时钟跳至 `time` 而不推进估计器，并从该时刻起对空闲节拍计分。
    pub fn warp_to(&mut self, time: u64) {
        self.time = time;
        self.score_deadline = time;
    }

    /// Steps the estimator one tick at a time until the virtual clock is within
    /// one tick of `time`.
    ///
    /// 逐节拍推进估计器，直到虚拟时钟与 `time` 相差不足一个节拍。
    pub fn advance_to(&mut self, time: u64) {
        while self.time + self.tick_ms < time {
            self.estimator.evolve(self.tick_length);
            if self.count_this_tick > 0 || self.time >= self.score_deadline {
                self.estimator
                    .observe(self.tick_length, self.count_this_tick);
                trace!(time = self.time, count = self.count_this_tick, "tick");
            } else {
                trace!(time = self.time, "idle tick skipped");
            }
            self.count_this_tick = 0;
            self.time += self.tick_ms;
        }
    }

    /// Records one arriving packet.
    ///
    /// `time_to_next` is the sender's hint, in milliseconds, of when it expects
    /// to send again.
    ///
    /// 记录一个到达的包。`time_to_next` 是发送方对下次发送时间的提示（毫秒）。
    pub fn recv(&mut self, seq: u64, throwaway_window: u16, time_to_next: u16) {
        self.count_this_tick += 1;
        self.counter.recv(seq, throwaway_window);
        self.score_deadline = self
            .score_deadline
            .max(self.time.saturating_add(u64::from(time_to_next)));
    }

    /// The forecast for the current virtual time. It is computed at most once
    /// per tick; later calls in the same tick return the cached snapshot.
    ///
    /// 当前虚拟时间的预测。每个节拍最多计算一次，同一节拍内的后续调用返回缓存快照。
    pub fn forecast(&mut self) -> Forecast {
        if let Some(cached) = self
            .cached_forecast
            .as_ref()
            .filter(|f| f.timestamp == self.time)
        {
            return cached.clone();
        }
        let forecast = self.compute_forecast();
        self.cached_forecast = Some(forecast.clone());
        forecast
    }

    fn compute_forecast(&mut self) -> Forecast {
        self.estimator.normalize();

        let estimator = &self.estimator;
        let quantile = self.quantile;
        let mut floor = 0;
        let counts = self
            .forecasters
            .iter()
            .map(|forecaster| {
                // Keeps the series non-decreasing even under rounding noise.
                floor = floor.max(forecaster.lower_quantile(estimator, quantile));
                floor
            })
            .collect();

        Forecast {
            timestamp: self.time,
            received_or_lost_count: self.counter.packet_count(),
            counts,
        }
    }
}
