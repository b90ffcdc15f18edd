//! `httpfromtcp` demo server.
//!
//! # Startup Sequence
//! ```text
//! CLI → config file (or defaults) → port override → logging → metrics
//!     → bind and serve → wait for SIGINT/SIGTERM → close listener
//!     → drain in-flight connections → exit
//! ```

mod routes;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpStream;

use httpfromtcp::config::{load_config, ListenerConfig, ServerConfig};
use httpfromtcp::http::{HttpServer, Request, ResponseWriter};
use httpfromtcp::lifecycle::wait_for_signal;
use httpfromtcp::observability::{init_logging, metrics};

use crate::routes::Routes;

#[derive(Parser, Debug)]
#[command(name = "httpfromtcp", version, about = "HTTP/1.1 server built directly on TCP")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on, overriding the configured bind address
    #[arg(short, long)]
    port: Option<u16>,

    /// Video file served at /video
    #[arg(long, default_value = "assets/vim.mp4")]
    video: PathBuf,

    /// Upstream relayed by /httpbin/*
    #[arg(long, default_value = "https://httpbin.org")]
    upstream: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(port) = cli.port {
        config.listener = ListenerConfig {
            max_connections: config.listener.max_connections,
            ..ListenerConfig::with_port(port)
        };
    }

    init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "httpfromtcp starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        initial_buffer_size = config.parser.initial_buffer_size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let routes = Routes::new(cli.video, &cli.upstream);
    let mut server = HttpServer::serve_with_config(
        &config,
        move |writer: ResponseWriter<TcpStream>, request: Request| {
            let routes = routes.clone();
            async move { routes.handle(writer, request).await }
        },
    )
    .await?;

    let signal = wait_for_signal().await?;
    tracing::info!(signal, "Shutdown signal received");

    server.close().await?;

    let grace = Duration::from_secs(config.shutdown.grace_secs);
    if !server.wait_idle(grace).await {
        tracing::warn!(
            remaining = server.active_connections(),
            grace_secs = config.shutdown.grace_secs,
            "Connections still in flight after grace period"
        );
    }

    tracing::info!("Server gracefully stopped");
    Ok(())
}
