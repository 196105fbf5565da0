//! A stochastic model of link capacity.
//!
//! The estimator keeps a belief distribution over discretized capacity states
//! (packets per second). Between observations the belief drifts under a
//! continuous-time Markov transition; each tick's arrival count reweights it
//! through a Poisson emission model.
//!
//! 链路容量的随机模型。
//!
//! 估计器维护一个离散容量状态（每秒包数）上的信念分布。在两次观测之间，信念按
//! 连续时间马尔可夫转移漂移；每个节拍的到达数通过泊松发射模型对其重新加权。

pub mod forecaster;


use crate::config::EstimatorConfig;
use std::time::Duration;
use tracing::{trace, warn};

pub use forecaster::TickForecaster;

/// Index of the outage state. Its rate is zero.
/// 中断状态的索引，其速率为零。
pub(crate) const OUTAGE_BIN: usize = 0;

/// Smallest likelihood a bin may receive from one observation.
/// 单次观测中一个状态可获得的最小似然。
const LIKELIHOOD_FLOOR: f64 = 1e-150;

/// Below this total mass the belief is considered lost and is reset.
/// 总质量低于此值时，信念被视为丢失并重置。
const MIN_TOTAL_MASS: f64 = 1e-280;

/// A row-stochastic transition matrix for one step length.
#[derive(Debug, Clone)]
struct TransitionKernel {
    dt: Duration,
    /// Row-major, `matrix[from * n + to]`.
    matrix: Vec<f64>,
}

/// Bayesian estimator of the instantaneous link capacity.
///
/// 链路瞬时容量的贝叶斯估计器。
#[derive(Debug, Clone)]
pub struct LinkStateEstimator {
    config: EstimatorConfig,
    /// Capacity of each bin in packets per second, evenly spaced from zero.
    /// 每个状态的容量（每秒包数），从零开始均匀分布。
    rates: Vec<f64>,
    belief: Vec<f64>,
    /// Counts at or above this are treated as a saturated tick.
    max_arrivals_per_tick: u32,
    /// `ln(k!)` for `k` in `0..=max_arrivals_per_tick`.
    ln_factorials: Vec<f64>,
    kernel: Option<TransitionKernel>,
}

impl LinkStateEstimator {
    /// Creates an estimator with a uniform prior over all capacity states.
    ///
    /// 创建一个在所有容量状态上具有均匀先验的估计器。
    pub fn new(config: EstimatorConfig, max_arrivals_per_tick: u32) -> Self {
        let bins = config.bin_count.max(2);
        let step = config.max_arrival_rate / (bins - 1) as f64;
        let rates = (0..bins).map(|i| i as f64 * step).collect();

        let mut ln_factorials = Vec::with_capacity(max_arrivals_per_tick as usize + 1);
        let mut acc = 0.0;
        ln_factorials.push(acc);
        for k in 1..=max_arrivals_per_tick {
            acc += (k as f64).ln();
            ln_factorials.push(acc);
        }

        Self {
            config,
            rates,
            belief: vec![1.0 / bins as f64; bins],
            max_arrivals_per_tick,
            ln_factorials,
            kernel: None,
        }
    }

    /// The current belief, one probability per capacity state.
    ///
    /// 当前信念，每个容量状态一个概率。
    pub fn belief(&self) -> &[f64] {
        &self.belief
    }

    /// Capacity of each state, in packets per second.
    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    pub fn bin_count(&self) -> usize {
        self.rates.len()
    }

    pub fn max_arrivals_per_tick(&self) -> u32 {
        self.max_arrivals_per_tick
    }

    /// Posterior mean capacity in packets per second.
    ///
    /// 后验平均容量（每秒包数）。
    pub fn expected_rate(&self) -> f64 {
        let total: f64 = self.belief.iter().sum();
        if total <= 0.0 {
            return 0.0;
        }
        self.belief
            .iter()
            .zip(&self.rates)
            .map(|(p, r)| p * r)
            .sum::<f64>()
            / total
    }

    /// Advances the belief over `dt`.
    ///
    /// Non-outage states diffuse towards their neighbours with a Gaussian
    /// kernel whose spread grows with `sqrt(dt)`; diffusion may carry mass into
    /// the outage state. The outage state does not diffuse but leaks mass
    /// uniformly to every other state at `outage_escape_rate`. Each row of the
    /// resulting matrix sums to one, so total mass is preserved.
    ///
    /// 将信念推进 `dt`。
    ///
    /// 非中断状态以高斯核向相邻状态扩散，其宽度随 `sqrt(dt)` 增长；扩散可能把质量
    /// 带入中断状态。中断状态本身不扩散，而是以 `outage_escape_rate` 均匀地把质量
    /// 泄漏到其他所有状态。所得矩阵每行之和为一，因此总质量守恒。
    pub fn evolve(&mut self, dt: Duration) {
        if dt.is_zero() {
            return;
        }
        if self.kernel.as_ref().is_none_or(|k| k.dt != dt) {
            self.kernel = Some(self.build_kernel(dt));
        }
        let Some(kernel) = self.kernel.as_ref() else {
            return;
        };

        let n = self.rates.len();
        let mut next = vec![0.0; n];
        for (from, &mass) in self.belief.iter().enumerate() {
            if mass == 0.0 {
                continue;
            }
            let row = &kernel.matrix[from * n..(from + 1) * n];
            for (slot, weight) in next.iter_mut().zip(row) {
                *slot += mass * weight;
            }
        }
        self.belief = next;
    }

    fn build_kernel(&self, dt: Duration) -> TransitionKernel {
        let n = self.rates.len();
        let secs = dt.as_secs_f64();
        let mut matrix = vec![0.0; n * n];

        let stay = (-self.config.outage_escape_rate * secs).exp();
        let leak = (1.0 - stay) / (n - 1) as f64;
        for (to, slot) in matrix[..n].iter_mut().enumerate() {
            *slot = if to == OUTAGE_BIN { stay } else { leak };
        }

        let sigma = self.config.diffusion_rate * secs.sqrt();
        for from in 1..n {
            let row = &mut matrix[from * n..(from + 1) * n];
            if sigma <= 0.0 {
                row[from] = 1.0;
                continue;
            }
            let origin = self.rates[from];
            for (slot, rate) in row.iter_mut().zip(&self.rates) {
                let z = (rate - origin) / sigma;
                *slot = (-0.5 * z * z).exp();
            }
            // The diagonal is exactly 1.0, so the total is never zero.
            let total: f64 = row.iter().sum();
            for slot in row.iter_mut() {
                *slot /= total;
            }
        }

        trace!(bins = n, dt_ms = dt.as_millis() as u64, sigma, "Built transition kernel");
        TransitionKernel { dt, matrix }
    }

    /// Reweights the belief by the likelihood of seeing `count` arrivals in `dt`,
    /// then renormalizes.
    ///
    /// 按在 `dt` 内观察到 `count` 次到达的似然重新加权信念，然后重新归一化。
    pub fn observe(&mut self, dt: Duration, count: u32) {
        let count = count.min(self.max_arrivals_per_tick);
        let secs = dt.as_secs_f64();
        for i in 0..self.belief.len() {
            let likelihood = self.emission(self.rates[i] * secs, count);
            self.belief[i] *= likelihood.max(LIKELIHOOD_FLOOR);
        }
        self.normalize();
    }

    /// Probability of `count` arrivals given an expected `mean`. A count at the
    /// cap stands for "the cap or more".
    fn emission(&self, mean: f64, count: u32) -> f64 {
        if count < self.max_arrivals_per_tick {
            return self.poisson_pmf(mean, count);
        }
        let below: f64 = (0..self.max_arrivals_per_tick)
            .map(|k| self.poisson_pmf(mean, k))
            .sum();
        (1.0 - below).clamp(0.0, 1.0)
    }

    fn poisson_pmf(&self, mean: f64, k: u32) -> f64 {
        if mean <= 0.0 {
            return if k == 0 { 1.0 } else { 0.0 };
        }
        let ln_pmf = k as f64 * mean.ln() - mean - self.ln_factorials[k as usize];
        ln_pmf.exp()
    }

    /// Rescales the belief to sum to one. If the mass has underflowed or become
    /// non-finite, the belief is reset to uniform.
    ///
    /// 将信念重新缩放为总和为一。若质量下溢或变为非有限值，则将信念重置为均匀分布。
    pub fn normalize(&mut self) {
        for p in self.belief.iter_mut() {
            if !p.is_finite() || *p < 0.0 {
                *p = 0.0;
            }
        }
        let total: f64 = self.belief.iter().sum();
        if !total.is_finite() || total < MIN_TOTAL_MASS {
            warn!(total, "Belief mass degenerated, resetting to uniform prior");
            let uniform = 1.0 / self.belief.len() as f64;
            self.belief.iter_mut().for_each(|p| *p = uniform);
            return;
        }
        self.belief.iter_mut().for_each(|p| *p /= total);
    }
}
