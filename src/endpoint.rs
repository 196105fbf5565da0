//! The endpoint event loop tying the receiver, the pacer and a transport
//! together. Each endpoint is both a sender and a receiver.
//!
//! 将接收端、调速器和传输层连接在一起的端点事件循环。每个端点既是发送方也是接收方。


use crate::clock::Clock;
use crate::config::Config;
use crate::error::Result;
use crate::forecast::Forecast;
use crate::pacing::{PacingController, PacingDecision, TransmissionSchedule};
use crate::packet::frame::WireFrame;
use crate::receiver::Receiver;
use crate::transport::{Delivery, Transport};
use bytes::Bytes;
use std::time::Duration;
use tracing::{debug, info, trace};

/// Running totals kept by an endpoint.
///
/// 端点维护的累计统计。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EndpointStats {
    pub frames_sent: u64,
    pub forecasts_sent: u64,
    pub frames_received: u64,
    pub forecasts_received: u64,
    pub payload_bytes_received: u64,
}

/// One end of a forecast-paced link.
///
/// The endpoint owns all of its state; the only thing it shares with the peer
/// is the wire.
///
/// 预测调速链路的一端。端点独占其全部状态，与对端唯一共享的是线路。
#[derive(Debug)]
pub struct Endpoint<T: Transport> {
    transport: T,
    receiver: Receiver,
    controller: PacingController,
    schedule: TransmissionSchedule,
    /// The peer's latest forecast, rebased onto the local clock.
    operative: Forecast,
    clock: Clock,
    payload: Bytes,
    max_poll_wait: Duration,
    warped: bool,
    stats: EndpointStats,
}

impl<T: Transport> Endpoint<T> {
    pub fn new(transport: T, config: Config) -> Result<Self> {
        config.validate()?;

        let clock = Clock::new();
        let now = clock.now_ms();
        let mut schedule = TransmissionSchedule::new(&config.pacing, now);
        // The first frame goes out as soon as a peer is known, so the other end
        // gets a forecast to pace against.
        schedule.expedite(now);

        Ok(Self {
            receiver: Receiver::new(&config)?,
            controller: PacingController::from_config(&config),
            schedule,
            operative: Forecast::empty(),
            clock,
            payload: Bytes::from(vec![b' '; config.pacing.payload_size]),
            max_poll_wait: config.pacing.max_poll_wait,
            warped: false,
            stats: EndpointStats::default(),
            transport,
        })
    }

    pub fn stats(&self) -> EndpointStats {
        self.stats
    }

    pub fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    /// The forecast currently driving admission.
    pub fn operative_forecast(&self) -> &Forecast {
        &self.operative
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Runs `step` until an error occurs.
    ///
    /// 持续运行 `step` 直到出错。
    pub async fn run(&mut self) -> Result<()> {
        info!("Looping...");
        loop {
            self.step().await?;
        }
    }

    /// Performs one cycle: advance the receiver, maybe transmit, then wait a
    /// bounded time for one delivery.
    ///
    /// 执行一个周期：推进接收端，可能发送，然后在有限时间内等待一次交付。
    pub async fn step(&mut self) -> Result<()> {
        if !self.transport.is_attached() {
            trace!("Waiting for a peer to attach");
            let delivery = self.transport.recv().await?;
            return self.on_delivery(delivery);
        }

        let now = self.clock.now_ms();
        self.receiver.advance_to(now);

        let decision = self
            .controller
            .decide(now, self.transport.next_seq(), &self.operative);
        self.log_decision(&decision);

        if let Some(burst) = self.schedule.plan_burst(now, decision.packets_to_send) {
            let forecast = self.receiver.forecast();
            for index in 0..burst.frames {
                let mut frame = WireFrame::new(self.payload.clone());
                if self.schedule.should_attach_forecast(forecast.timestamp) {
                    frame = frame.with_forecast(&forecast)?;
                    self.stats.forecasts_sent += 1;
                }
                self.transport
                    .send(frame.to_bytes(), burst.time_to_next(index))
                    .await?;
                self.stats.frames_sent += 1;
            }
        }

        let wait = self
            .schedule
            .time_until_due(self.clock.now_ms())
            .min(self.max_poll_wait);

        let mut delivery = None;
        tokio::select! {
            result = self.transport.recv() => delivery = Some(result?),
            _ = tokio::time::sleep(wait) => {}
        }
        match delivery {
            Some(delivery) => self.on_delivery(delivery),
            None => Ok(()),
        }
    }

    fn on_delivery(&mut self, delivery: Delivery) -> Result<()> {
        let now = self.clock.now_ms();
        if self.warped {
            self.receiver.advance_to(now);
        } else {
            self.receiver.warp_to(now);
            self.warped = true;
        }
        self.receiver.recv(
            delivery.sequence_number,
            delivery.throwaway_window,
            delivery.time_to_next,
        );

        let frame = WireFrame::decode(delivery.payload)?;
        self.stats.frames_received += 1;
        self.stats.payload_bytes_received += frame.payload().len() as u64;

        if let Some(mut forecast) = frame.forecast()? {
            debug!(counts = ?forecast.counts, "Received counts");
            // The peer's timestamp is on its own clock; measure elapsed ticks
            // from when the forecast reached us instead.
            forecast.timestamp = now;
            self.operative = forecast;
            self.stats.forecasts_received += 1;
        }
        Ok(())
    }

    fn log_decision(&self, decision: &PacingDecision) {
        debug!(
            delayed_queue_estimate = decision.delayed_queue_estimate,
            current_queue_estimate = decision.current_queue_estimate,
            srtt = ?self.transport.srtt(),
            current_tick = decision.current_tick,
            target_tick = decision.delivery_tick,
            cumulative_delivery_forecast = decision.cumulative_delivery_forecast,
            sending = decision.packets_to_send,
            "pacing decision"
        );
    }
}
