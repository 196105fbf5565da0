#![deny(clippy::expect_used, clippy::unwrap_used)]

//! The root of the forecast-paced datagram link library.
//!
//! A receiver tracks a probabilistic belief about the link's delivery capacity
//! and turns it into a cautious forecast of cumulative deliveries. The forecast
//! travels back to the sender piggybacked on ordinary traffic, and the sender
//! injects only what the link is forecast to clear within a target delay.
//!
//! 预测调速数据报链路库的根。
//!
//! 接收端维护关于链路交付能力的概率信念，并将其转化为保守的累计交付预测。
//! 预测随普通流量捎带回发送端，发送端只注入预测表明链路能在目标时延内清空的数据。

pub mod clock;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod estimator;
pub mod forecast;
pub mod packet;
pub mod pacing;
pub mod receiver;
pub mod transport;

pub use config::Config;
pub use endpoint::{Endpoint, EndpointStats};
pub use error::{Error, Result};
pub use forecast::Forecast;
