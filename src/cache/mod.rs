//! Answer caching with per-entry TTL.

pub mod dns_cache;

pub use dns_cache::{CachedAnswer, DEFAULT_CACHE_CAPACITY, DnsCache, MokaCache};
