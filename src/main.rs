//! dnsrelay DNS server - Entry point.
//!
//! This binary listens for DNS queries over UDP, caches answers, and
//! forwards non-cached questions to an upstream resolver when one is set.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::UdpSocket;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use dnsrelay::cache::MokaCache;
use dnsrelay::config::Config;
use dnsrelay::dns::UpstreamResolver;
use dnsrelay::server::{QueryHandler, ServerConfig, run_server};

#[derive(Parser)]
#[command(name = "dnsrelay")]
#[command(version)]
#[command(about = "Caching DNS forwarder over UDP")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Address to bind the listener to
    #[arg(long)]
    host: Option<IpAddr>,

    /// Port to listen on
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Upstream resolver to forward queries to (e.g. 8.8.8.8:53)
    #[arg(short = 'r', long, value_name = "ADDR")]
    resolver: Option<SocketAddr>,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration.
    fn apply(&self, config: &mut Config) {
        if let Some(host) = self.host {
            config.listen.set_ip(host);
        }
        if let Some(port) = self.port {
            config.listen.set_port(port);
        }
        if let Some(resolver) = self.resolver {
            config.upstream_resolver = Some(resolver);
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    cli.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    // Initialize metrics (must be done early, before any metrics are recorded)
    dnsrelay::metrics::init(&config.metrics).context("Failed to initialize metrics")?;
    if config.metrics.enabled {
        info!("Metrics enabled on {}", config.metrics.listen);
    }

    info!("Starting dnsrelay v{}", env!("CARGO_PKG_VERSION"));
    match config.upstream_resolver {
        Some(addr) => info!(
            "Upstream resolver: {} (timeout {}ms)",
            addr, config.upstream_timeout_ms
        ),
        None => info!("No upstream resolver configured, answers will be empty"),
    }
    info!("Cache capacity: {} names", config.cache_capacity);

    let cache = MokaCache::new(config.cache_capacity);
    let resolver = config
        .upstream_resolver
        .map(|addr| UpstreamResolver::new(addr).with_timeout(config.upstream_timeout()));
    let handler = QueryHandler::new(cache, resolver);

    let socket = UdpSocket::bind(config.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen))?;

    let server_config = ServerConfig::from(&config);
    let mut server_handle = tokio::spawn(run_server(socket, handler, server_config));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down...");
            server_handle.abort();
        }
        result = &mut server_handle => {
            match result {
                Ok(Err(err)) => error!("Server error: {err:?}"),
                Err(err) => error!("Server task failed: {err}"),
                Ok(Ok(())) => {}
            }
        }
    }

    info!("Shutdown complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    run(cli).await
}
