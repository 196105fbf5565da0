//! A smoothed round-trip time estimator.
//! 平滑 RTT 估算器。

use std::time::Duration;

const ALPHA: f64 = 1.0 / 8.0;
const BETA: f64 = 1.0 / 4.0;

/// Smoothed RTT and its variation, per the RFC 6298 filter. Diagnostic only:
/// pacing never consults it.
///
/// 按 RFC 6298 滤波器计算的平滑 RTT 及其变化量。仅用于诊断，调速从不参考它。
#[derive(Debug, Clone, Default)]
pub struct RttEstimator {
    /// Seconds; `None` until the first sample.
    srtt: Option<f64>,
    rttvar: f64,
}

impl RttEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn srtt(&self) -> Option<Duration> {
        self.srtt.map(Duration::from_secs_f64)
    }

    /// Folds in a new sample.
    ///
    /// 合并一个新的样本。
    pub fn update(&mut self, rtt_sample: Duration) {
        let sample = rtt_sample.as_secs_f64();
        match self.srtt {
            None => {
                self.srtt = Some(sample);
                self.rttvar = sample / 2.0;
            }
            Some(srtt) => {
                let delta = (srtt - sample).abs();
                self.rttvar = (1.0 - BETA) * self.rttvar + BETA * delta;
                self.srtt = Some((1.0 - ALPHA) * srtt + ALPHA * sample);
            }
        }
    }
}
