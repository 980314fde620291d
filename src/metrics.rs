//! Metrics initialization for Prometheus exporter.

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::config::MetricsConfig;
use crate::error::{Error, Result};

/// Datagrams that decoded into a query.
pub const QUERIES_TOTAL: &str = "dns_queries_total";
/// Questions answered from the cache.
pub const CACHE_HITS_TOTAL: &str = "dns_cache_hits_total";
/// Questions that had to be forwarded.
pub const CACHE_MISSES_TOTAL: &str = "dns_cache_misses_total";
/// Forwarded queries that failed or timed out.
pub const UPSTREAM_ERRORS_TOTAL: &str = "dns_upstream_errors_total";
/// Datagrams answered with FORMERR or dropped as undecodable.
pub const MALFORMED_REQUESTS_TOTAL: &str = "dns_malformed_requests_total";

/// Initialize the metrics system based on configuration.
///
/// When metrics are enabled, this starts an HTTP server that exposes
/// a `/metrics` endpoint for Prometheus to scrape.
///
/// When metrics are disabled, this is a no-op. The `metrics` crate
/// handles unregistered metrics gracefully (they become no-ops).
pub fn init(config: &MetricsConfig) -> Result<()> {
    if !config.enabled {
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(config.listen)
        .install()
        .map_err(|err| Error::Metrics(err.to_string()))?;

    Ok(())
}
