//! 将信念投射到未来某个节拍的累计到达数分位数。
//! Projects the belief onto a quantile of cumulative arrivals at a future tick.

use super::LinkStateEstimator;
use std::time::Duration;

/// Bins lighter than this contribute nothing measurable to a quantile.
const MIN_BIN_WEIGHT: f64 = 1e-12;

/// Forecaster for one tick offset.
///
/// Over `tick_offset` ticks a link sitting in a given capacity state delivers a
/// Poisson number of packets, truncated at `tick_offset * max_arrivals_per_tick`.
/// The forecaster mixes these per-state distributions by belief weight and reads
/// off a lower quantile.
///
/// 单个节拍偏移的预测器。
///
/// 在 `tick_offset` 个节拍内，处于某容量状态的链路交付的包数服从泊松分布，并在
/// `tick_offset * max_arrivals_per_tick` 处截断。预测器按信念权重混合这些分布，
/// 并读出一个下分位数。
#[derive(Debug, Clone)]
pub struct TickForecaster {
    arrival_cap: u32,
    /// Expected arrivals over the whole interval, per capacity state.
    means: Vec<f64>,
}

/// Per-bin cursor while walking the mixture CDF.
struct BinCursor {
    weight: f64,
    ln_mean: f64,
    ln_pmf: f64,
}

impl TickForecaster {
    pub fn new(
        tick_length: Duration,
        estimator: &LinkStateEstimator,
        max_arrivals_per_tick: u32,
        tick_offset: u32,
    ) -> Self {
        let interval = tick_length.as_secs_f64() * tick_offset as f64;
        Self {
            arrival_cap: max_arrivals_per_tick.saturating_mul(tick_offset),
            means: estimator.rates().iter().map(|r| r * interval).collect(),
        }
    }

    /// Returns the smallest cumulative count `c` such that, under the current
    /// belief, `P(arrivals <= c) >= quantile`.
    ///
    /// The belief does not need to be normalized; the quantile is taken
    /// relative to its total mass.
    ///
    /// 返回满足当前信念下 `P(到达数 <= c) >= quantile` 的最小累计计数 `c`。
    pub fn lower_quantile(&self, estimator: &LinkStateEstimator, quantile: f64) -> u32 {
        let belief = estimator.belief();
        debug_assert_eq!(belief.len(), self.means.len());

        let total: f64 = belief.iter().sum();
        if total.is_nan() || total <= 0.0 {
            return 0;
        }
        let target = quantile * total;

        let mut cursors: Vec<BinCursor> = belief
            .iter()
            .zip(&self.means)
            .filter(|(weight, _)| **weight > MIN_BIN_WEIGHT * total)
            .map(|(&weight, &mean)| BinCursor {
                weight,
                ln_mean: mean.ln(),
                ln_pmf: -mean,
            })
            .collect();

        let mut cdf = 0.0;
        for count in 0..self.arrival_cap {
            let next_ln = ((count + 1) as f64).ln();
            for bin in cursors.iter_mut() {
                cdf += bin.weight * bin.ln_pmf.exp();
                // ln P(k+1) = ln P(k) + ln(mean) - ln(k+1); a zero mean stays at -inf.
                bin.ln_pmf += bin.ln_mean - next_ln;
            }
            if cdf >= target {
                return count;
            }
        }
        // All remaining mass sits at the truncation point.
        self.arrival_cap
    }
}
