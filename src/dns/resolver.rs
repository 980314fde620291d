//! DNS resolver trait and implementations.
//!
//! Provides abstraction over upstream resolution to enable:
//! - Testing with mock resolvers
//! - Swapping the transport without touching the query handler

use std::future::Future;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use tokio::net::UdpSocket;
use tracing::debug;

use super::message::{MAX_UDP_DNS_SIZE, Message};
use crate::error::{Error, Result};

/// Default time to wait for an upstream reply.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(2);

/// Trait for DNS resolution.
///
/// Implementations receive a single-question query and return the upstream
/// server's full response.
pub trait DnsResolver: Send + Sync + Clone + 'static {
    /// Resolve a DNS query and return the response.
    fn resolve(&self, query: &Message) -> impl Future<Output = Result<Message>> + Send;
}

/// Upstream DNS resolver using UDP.
///
/// Each query gets its own ephemeral socket and waits at most `timeout`
/// for one reply.
#[derive(Clone)]
pub struct UpstreamResolver {
    upstream_addr: SocketAddr,
    timeout: Duration,
}

impl UpstreamResolver {
    /// Create a new upstream resolver.
    pub const fn new(upstream_addr: SocketAddr) -> Self {
        Self {
            upstream_addr,
            timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn exchange(&self, query: &[u8]) -> Result<Vec<u8>> {
        let bind_addr = if self.upstream_addr.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(self.upstream_addr).await?;
        socket.send(query).await?;

        let mut response_buf = vec![0u8; MAX_UDP_DNS_SIZE];
        let len = socket.recv(&mut response_buf).await?;
        response_buf.truncate(len);
        Ok(response_buf)
    }
}

impl DnsResolver for UpstreamResolver {
    async fn resolve(&self, query: &Message) -> Result<Message> {
        let query_bytes = query.to_bytes()?;

        let response_bytes = tokio::time::timeout(self.timeout, self.exchange(&query_bytes))
            .await
            .map_err(|_| Error::UpstreamTimeout {
                upstream: self.upstream_addr,
                timeout: self.timeout,
            })??;
        debug!(
            upstream = %self.upstream_addr,
            bytes = response_bytes.len(),
            "received upstream reply"
        );

        let response = Message::from_bytes(&response_bytes)?;
        if response.id() != query.id() {
            return Err(Error::Resolver(format!(
                "upstream replied with id {} to query {}",
                response.id(),
                query.id()
            )));
        }
        Ok(response)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::dns::{Header, Name, Question, RecordClass, RecordType, ResponseCode};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::sync::RwLock;

    /// Mock resolver for testing.
    ///
    /// Allows pre-configuring responses and tracking resolve calls.
    #[derive(Clone, Default)]
    pub struct MockResolver {
        /// Pre-configured responses by domain name.
        pub responses: Arc<RwLock<HashMap<Name, Message>>>,
        /// Count of resolve calls.
        pub resolve_count: Arc<AtomicU64>,
        /// Queries received, in order.
        pub queries: Arc<RwLock<Vec<Message>>>,
        /// If set, resolve will return this error.
        pub error: Arc<RwLock<Option<String>>>,
    }

    impl MockResolver {
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a pre-configured response for a domain.
        pub async fn add_response(&self, name: impl Into<Name>, response: Message) {
            self.responses.write().await.insert(name.into(), response);
        }

        /// Configure the resolver to return an error.
        pub async fn set_error(&self, error: &str) {
            *self.error.write().await = Some(error.to_string());
        }

        /// Get the number of resolve calls.
        pub fn resolve_count(&self) -> u64 {
            self.resolve_count.load(Ordering::SeqCst)
        }
    }

    impl DnsResolver for MockResolver {
        async fn resolve(&self, query: &Message) -> Result<Message> {
            self.resolve_count.fetch_add(1, Ordering::SeqCst);
            self.queries.write().await.push(query.clone());

            if let Some(error) = self.error.read().await.as_ref() {
                return Err(Error::Resolver(error.clone()));
            }

            if let Some(q) = query.questions().first()
                && let Some(response) = self.responses.read().await.get(&q.name)
            {
                let mut resp = response.clone();
                resp.set_id(query.id());
                return Ok(resp);
            }

            // NXDOMAIN if no response configured
            let mut response = Message::response_to(query);
            response.set_response_code(ResponseCode::NameError);
            Ok(response)
        }
    }

    fn create_query(domain: &str) -> Message {
        let mut message = Message::new(Header::new(1234));
        message.add_question(Question::new(domain, RecordType::A, RecordClass::IN));
        message
    }

    #[tokio::test]
    async fn should_return_nxdomain_when_no_response_configured() {
        let resolver = MockResolver::new();
        let query = create_query("example.com");

        let response = resolver.resolve(&query).await.unwrap();

        assert_eq!(response.id(), query.id());
        assert_eq!(response.response_code(), ResponseCode::NameError);
        assert_eq!(resolver.resolve_count(), 1);
    }

    #[tokio::test]
    async fn should_return_error_when_resolver_configured_to_fail() {
        let resolver = MockResolver::new();
        resolver.set_error("connection refused").await;

        let result = resolver.resolve(&create_query("example.com")).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn should_forward_query_and_decode_reply_over_udp() {
        let upstream = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let upstream_addr = upstream.local_addr().unwrap();
        tokio::spawn(async move {
            let mut buf = [0u8; MAX_UDP_DNS_SIZE];
            let (len, peer) = upstream.recv_from(&mut buf).await.unwrap();
            let query = Message::from_bytes(&buf[..len]).unwrap();
            let mut reply = Message::response_to(&query);
            reply.add_answer(crate::dns::Record::a(
                "example.com",
                300,
                Ipv4Addr::new(93, 184, 216, 34),
            ));
            upstream
                .send_to(&reply.to_bytes().unwrap(), peer)
                .await
                .unwrap();
        });

        let resolver = UpstreamResolver::new(upstream_addr);
        let response = resolver.resolve(&create_query("example.com")).await.unwrap();

        assert_eq!(response.id(), 1234);
        assert_eq!(response.answers().len(), 1);
        assert_eq!(response.answers()[0].ttl, 300);
    }

    #[tokio::test]
    async fn should_time_out_when_upstream_stays_silent() {
        // bound but never read, so the query goes unanswered
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let resolver = UpstreamResolver::new(silent.local_addr().unwrap())
            .with_timeout(Duration::from_millis(50));

        let err = resolver
            .resolve(&create_query("example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UpstreamTimeout { .. }));
    }

    #[tokio::test]
    async fn should_reject_reply_with_foreign_id() {
        let upstream = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let upstream_addr = upstream.local_addr().unwrap();
        tokio::spawn(async move {
            let mut buf = [0u8; MAX_UDP_DNS_SIZE];
            let (len, peer) = upstream.recv_from(&mut buf).await.unwrap();
            let query = Message::from_bytes(&buf[..len]).unwrap();
            let mut reply = Message::response_to(&query);
            reply.set_id(query.id().wrapping_add(1));
            upstream
                .send_to(&reply.to_bytes().unwrap(), peer)
                .await
                .unwrap();
        });

        let resolver = UpstreamResolver::new(upstream_addr);
        let err = resolver
            .resolve(&create_query("example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Resolver(_)));
    }
}
