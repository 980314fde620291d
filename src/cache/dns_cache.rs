//! DNS cache trait and implementations.
//!
//! Provides a trait-based abstraction over caching to enable:
//! - Easy testing with mock implementations
//! - Swappable cache backends
//! - Clear interface boundaries

use std::future::Future;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;

use crate::dns::{Name, RData, Record, RecordClass, RecordType};

/// Default maximum number of cached names.
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// A cache hit: the stored answer and how long it stays valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedAnswer {
    pub rtype: RecordType,
    pub class: RecordClass,
    pub rdata: RData,
    /// Remaining lifetime in seconds.
    pub ttl: u32,
}

/// Trait for DNS answer caching.
///
/// Entries are keyed by domain name, compared without regard to ASCII case.
/// A missing or expired entry is a miss, never an error, and expiry is left
/// to the backing store.
pub trait DnsCache: Send + Sync + Clone + 'static {
    /// Get the cached answer for the given domain name.
    fn lookup(&self, name: &Name) -> impl Future<Output = Option<CachedAnswer>> + Send;

    /// Insert or overwrite the answer for the record's owner name, expiring
    /// after the record's TTL.
    fn store(&self, record: &Record) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone)]
struct Entry {
    rtype: RecordType,
    class: RecordClass,
    rdata: RData,
    ttl: Duration,
    stored_at: Instant,
}

impl Entry {
    /// Whole seconds left, rounded up so a fresh entry reports its full TTL.
    fn remaining(&self, now: Instant) -> u32 {
        let left = self
            .ttl
            .saturating_sub(now.saturating_duration_since(self.stored_at));
        let secs = left.as_secs() + u64::from(left.subsec_nanos() > 0);
        u32::try_from(secs).unwrap_or(u32::MAX)
    }
}

/// Expires every entry after its own TTL; overwrites restart the clock.
struct PerEntryTtl;

impl Expiry<Name, Entry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _name: &Name,
        entry: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _name: &Name,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// Production cache implementation using Moka.
///
/// Moka provides a high-performance, concurrent cache with:
/// - Per-entry expiration driven by each record's TTL
/// - Bounded size
/// - Thread-safe operations
#[derive(Clone)]
pub struct MokaCache {
    inner: Cache<Name, Entry>,
}

impl MokaCache {
    /// Create a new cache holding at most `max_capacity` names.
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        Self { inner: cache }
    }
}

impl Default for MokaCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl DnsCache for MokaCache {
    async fn lookup(&self, name: &Name) -> Option<CachedAnswer> {
        let entry = self.inner.get(&name.to_lowercase()).await?;
        let ttl = entry.remaining(Instant::now());
        if ttl == 0 {
            return None;
        }
        Some(CachedAnswer {
            rtype: entry.rtype,
            class: entry.class,
            rdata: entry.rdata,
            ttl,
        })
    }

    async fn store(&self, record: &Record) {
        let entry = Entry {
            rtype: record.rtype,
            class: record.class,
            rdata: record.rdata.clone(),
            ttl: Duration::from_secs(u64::from(record.ttl)),
            stored_at: Instant::now(),
        };
        self.inner.insert(record.name.to_lowercase(), entry).await;
    }
}
