//! tests/common/harness.rs
use forecast_link::transport::{ChannelTransport, Transport};
use forecast_link::{Config, Endpoint};
use std::sync::Once;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Initializes tracing for tests, ensuring it's only done once.
pub fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        let filter =
            std::env::var("RUST_LOG").unwrap_or_else(|_| "forecast_link=info".to_string());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}

/// A configuration small enough to keep debug-build tests quick.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.estimator.bin_count = 40;
    config.receiver.horizon_ticks = 10;
    config.pacing.payload_size = 64;
    config
}

/// Two endpoints joined by an in-memory link.
pub fn linked_pair(config: Config) -> (Endpoint<ChannelTransport>, Endpoint<ChannelTransport>) {
    let (left, right) = ChannelTransport::pair(0xC0FFEE, config.pacing.throwaway_window);
    (
        Endpoint::new(left, config.clone()).unwrap(),
        Endpoint::new(right, config).unwrap(),
    )
}

/// Runs an endpoint on its own task for `duration`, then hands it back.
/// The endpoint must still be running when the time is up.
pub fn run_for<T: Transport>(
    mut endpoint: Endpoint<T>,
    duration: Duration,
) -> JoinHandle<Endpoint<T>> {
    tokio::spawn(async move {
        let outcome = tokio::time::timeout(duration, endpoint.run()).await;
        assert!(outcome.is_err(), "endpoint stopped early: {outcome:?}");
        endpoint
    })
}
