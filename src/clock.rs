//! A monotonic millisecond clock.
//! 单调毫秒时钟。

use tokio::time::Instant;

/// Milliseconds elapsed since an origin. Built on tokio's clock so paused-time
/// tests advance it deterministically.
///
/// 自原点以来经过的毫秒数。基于 tokio 时钟，暂停时间的测试可以确定性地推进它。
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    origin: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
