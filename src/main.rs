use clap::{Parser, Subcommand};
use forecast_link::transport::{UdpTransport, format_session_key, parse_session_key};
use forecast_link::{Config, Endpoint, Error, Result};
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Bulk transfer over a forecast-paced UDP link.
#[derive(Parser)]
#[command(name = "forecast-link", version)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Bind a socket and wait for a peer presenting the printed key.
    Listen {
        #[arg(long, default_value = "0.0.0.0:0")]
        bind: SocketAddr,
    },
    /// Connect to a listener.
    Connect {
        /// Session key printed by the listener, in hex.
        key: String,
        host: String,
        port: u16,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("forecast_link=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::default();
    let throwaway_window = config.pacing.throwaway_window;

    let transport = match cli.mode {
        Mode::Listen { bind } => {
            let transport = UdpTransport::listen(bind, throwaway_window).await?;
            eprintln!(
                "Port bound is {}, key is {}",
                transport.local_addr()?.port(),
                format_session_key(transport.session_key())
            );
            transport
        }
        Mode::Connect { key, host, port } => {
            let key = parse_session_key(&key)?;
            let remote = tokio::net::lookup_host((host.as_str(), port))
                .await?
                .next()
                .ok_or_else(|| {
                    Error::Io(std::io::Error::new(
                        ErrorKind::NotFound,
                        format!("no address found for {host}"),
                    ))
                })?;
            UdpTransport::connect(key, remote, throwaway_window).await?
        }
    };

    Endpoint::new(transport, config)?.run().await
}
