//! PacingController 与发送调度的测试
//! Tests for the pacing controller and the transmission schedule

use super::{PacingController, TransmissionSchedule};
use crate::config::PacingConfig;
use crate::forecast::Forecast;
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::time::Duration;

const TICK: Duration = Duration::from_millis(20);

fn forecast(timestamp: u64, received_or_lost_count: u64) -> Forecast {
    Forecast {
        timestamp,
        received_or_lost_count,
        counts: (1..=20).map(|i| i * 3).collect(),
    }
}

/// 空队列时，按目标节拍的预测增量发送
#[test]
fn test_empty_queue_sends_forecast_delta() {
    let controller = PacingController::new(5, TICK);
    let decision = controller.decide(1000, 100, &forecast(1000, 100));

    assert_eq!(decision.current_tick, 0);
    assert_eq!(decision.delayed_queue_estimate, 0);
    assert_eq!(decision.current_queue_estimate, 0);
    assert_eq!(decision.delivery_tick, 5);
    // counts[5] - counts[0] = 18 - 3
    assert_eq!(decision.cumulative_delivery_forecast, 15);
    assert_eq!(decision.packets_to_send, 15);
}

/// 已有排队时扣除积压
#[test]
fn test_backlog_is_subtracted() {
    let controller = PacingController::new(5, TICK);
    // 40ms after the snapshot: tick 2, counts[2] = 9 already drained.
    let decision = controller.decide(1040, 120, &forecast(1000, 100));

    assert_eq!(decision.current_tick, 2);
    assert_eq!(decision.delayed_queue_estimate, 20);
    assert_eq!(decision.current_queue_estimate, 11);
    assert_eq!(decision.delivery_tick, 7);
    assert_eq!(decision.cumulative_delivery_forecast, 24 - 9);
    assert_eq!(decision.packets_to_send, 4);
}

/// 积压超过预测时不发送
#[test]
fn test_large_backlog_sends_nothing() {
    let controller = PacingController::new(5, TICK);
    let decision = controller.decide(1000, 500, &forecast(1000, 100));
    assert_eq!(decision.packets_to_send, 0);
}

/// 过期预测钳制到最后一个节拍
#[test]
fn test_stale_forecast_clamps_to_last_tick() {
    let controller = PacingController::new(5, TICK);
    let stale = forecast(1000, 100);
    let decision = controller.decide(1000 + 20 * 20, 100, &stale);

    assert_eq!(decision.current_tick, 19);
    assert_eq!(decision.delivery_tick, 19);
    assert_eq!(decision.cumulative_delivery_forecast, 0);
    assert_eq!(decision.packets_to_send, 0);

    let ancient = controller.decide(u64::MAX, 100, &stale);
    assert_eq!(ancient.current_tick, 19);
}

/// 预测时间戳晚于当前时刻时视为第 0 个节拍
#[test]
fn test_future_forecast_clamps_to_first_tick() {
    let controller = PacingController::new(5, TICK);
    let decision = controller.decide(900, 100, &forecast(1000, 100));
    assert_eq!(decision.current_tick, 0);
}

#[test]
fn test_target_delay_clamps_to_horizon() {
    let controller = PacingController::new(50, TICK);
    let decision = controller.decide(1000, 100, &forecast(1000, 100));
    assert_eq!(decision.delivery_tick, 19);
    assert_eq!(decision.packets_to_send, 60 - 3);
}

#[test]
fn test_empty_forecast_admits_nothing() {
    let controller = PacingController::new(5, TICK);
    let decision = controller.decide(1000, 7, &Forecast::empty());
    assert_eq!(decision.packets_to_send, 0);
    assert_eq!(decision.delayed_queue_estimate, 7);
}

/// 决策是纯函数且从不为负
#[test]
fn test_decide_is_pure_and_bounded() {
    let controller = PacingController::new(5, TICK);
    let mut rng = StdRng::seed_from_u64(5);

    for _ in 0..500 {
        let mut counts: Vec<u32> = (0..20).map(|_| rng.random_range(0..50)).collect();
        counts.sort_unstable();
        let f = Forecast {
            timestamp: rng.random_range(0..10_000),
            received_or_lost_count: rng.random_range(0..1_000),
            counts,
        };
        let now = rng.random_range(0..12_000);
        let next_seq = rng.random_range(0..1_200);

        let first = controller.decide(now, next_seq, &f);
        let second = controller.decide(now, next_seq, &f);
        assert_eq!(first, second);
        assert!(first.current_tick < 20 && first.delivery_tick < 20);
        assert!(first.packets_to_send <= first.cumulative_delivery_forecast);
    }
}

fn schedule() -> TransmissionSchedule {
    TransmissionSchedule::new(&PacingConfig::default(), 0)
}

/// 突发中只有最后一帧带有调速提示
#[test]
fn test_burst_hint_on_last_frame_only() {
    let mut schedule = schedule();
    let burst = schedule.plan_burst(10, 3).expect("packets admitted");
    assert_eq!(burst.frames, 3);
    assert_eq!(burst.time_to_next(0), 0);
    assert_eq!(burst.time_to_next(1), 0);
    assert_eq!(burst.time_to_next(2), 500);
}

/// 空闲时在回退间隔后发送一个保活帧
#[test]
fn test_keepalive_after_fallback_interval() {
    let mut schedule = schedule();
    assert!(schedule.plan_burst(10, 0).is_none());
    assert!(schedule.plan_burst(4999, 0).is_none());

    let keepalive = schedule.plan_burst(5000, 0).expect("keep-alive due");
    assert_eq!(keepalive.frames, 1);
    assert_eq!(keepalive.time_to_next(0), 500);

    assert_eq!(schedule.next_transmission(), 10_000);
    assert!(schedule.plan_burst(5010, 0).is_none());
}

#[test]
fn test_sending_postpones_keepalive() {
    let mut schedule = schedule();
    schedule.plan_burst(3000, 2).expect("packets admitted");
    assert_eq!(schedule.next_transmission(), 8000);
    assert_eq!(schedule.time_until_due(7990), Duration::from_millis(10));
    assert_eq!(schedule.time_until_due(9000), Duration::ZERO);
}

/// 同一预测只捎带一次
#[test]
fn test_forecast_piggyback_is_deduplicated() {
    let mut schedule = schedule();
    assert!(schedule.should_attach_forecast(20));
    assert!(!schedule.should_attach_forecast(20));
    assert!(schedule.should_attach_forecast(40));
    assert!(!schedule.should_attach_forecast(40));
}

#[test]
fn test_expedite_only_pulls_deadline_forward() {
    let mut schedule = schedule();
    schedule.expedite(100);
    assert_eq!(schedule.next_transmission(), 100);
    assert!(schedule.plan_burst(100, 0).is_some());
    assert_eq!(schedule.next_transmission(), 5100);

    // 已更早到期时不推迟
    // An earlier deadline is left alone.
    schedule.expedite(6000);
    assert_eq!(schedule.next_transmission(), 5100);
}
