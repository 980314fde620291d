//! DNS server orchestration.
//!
//! Coordinates datagram reception, cache lookups, upstream forwarding, and
//! response sending. Designed with trait-based dependencies for testability.

use std::sync::Arc;

use bytes::Bytes;
use metrics::counter;
use tokio::net::UdpSocket;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::buffer::BufferPool;
use crate::cache::DnsCache;
use crate::config::Config;
use crate::dns::{DnsResolver, MAX_UDP_DNS_SIZE, Message, Record, ResponseCode};
use crate::error::Result;
use crate::metrics::{
    CACHE_HITS_TOTAL, CACHE_MISSES_TOTAL, MALFORMED_REQUESTS_TOTAL, QUERIES_TOTAL,
    UPSTREAM_ERRORS_TOTAL,
};

/// DNS query handler that processes queries using the provided dependencies.
///
/// This struct encapsulates the core DNS handling logic, separated from
/// the socket loop for easier testing. Without a resolver every query is
/// answered with its questions echoed and no records.
#[derive(Clone)]
pub struct QueryHandler<C, R>
where
    C: DnsCache,
    R: DnsResolver,
{
    cache: C,
    resolver: Option<R>,
}

impl<C, R> QueryHandler<C, R>
where
    C: DnsCache,
    R: DnsResolver,
{
    /// Create a new query handler.
    pub const fn new(cache: C, resolver: Option<R>) -> Self {
        Self { cache, resolver }
    }

    /// Collects the answer records for every question of `request`.
    ///
    /// Cached names are answered locally; every other question is forwarded
    /// upstream on its own and its answers are cached. Any upstream failure
    /// fails the whole request.
    pub async fn resolve(&self, request: &Message) -> Result<Vec<Record>> {
        let Some(resolver) = &self.resolver else {
            debug!("No upstream resolver configured, answering without records");
            return Ok(Vec::new());
        };

        let mut answers = Vec::new();
        for question in request.questions() {
            if let Some(hit) = self.cache.lookup(&question.name).await
                && hit.rtype == question.qtype
                && hit.class == question.qclass
            {
                debug!("Cache hit for {} ({}s left)", question.name, hit.ttl);
                counter!(CACHE_HITS_TOTAL).increment(1);
                answers.push(Record::new(
                    question.name.clone(),
                    question.qtype,
                    question.qclass,
                    hit.ttl,
                    hit.rdata,
                ));
                continue;
            }

            info!("Cache miss for {}, forwarding to upstream", question.name);
            counter!(CACHE_MISSES_TOTAL).increment(1);

            let mut forward = Message::new(request.header().clone());
            forward.add_question(question.clone());
            let response = resolver.resolve(&forward).await?;

            // negative answers are not cached
            if response.response_code() == ResponseCode::NoError {
                for answer in response.answers() {
                    self.cache.store(answer).await;
                }
            }
            answers.extend_from_slice(response.answers());
        }

        Ok(answers)
    }

    /// Handle a DNS query and return the response.
    ///
    /// Non-standard opcodes get `NOTIMP` and resolution failures `SERVFAIL`;
    /// the questions are echoed either way.
    #[instrument(skip(self, query), fields(id = query.id(), domain))]
    pub async fn handle_query(&self, query: &Message) -> Message {
        counter!(QUERIES_TOTAL).increment(1);
        if let Some(question) = query.questions().first() {
            tracing::Span::current().record("domain", tracing::field::display(&question.name));
        }

        let mut response = Message::response_to(query);
        if response.response_code() == ResponseCode::NotImplemented {
            info!("Unsupported opcode {}", query.header().opcode);
            return response;
        }

        match self.resolve(query).await {
            Ok(answers) => {
                for answer in answers {
                    response.add_answer(answer);
                }
            }
            Err(e) => {
                warn!("Failed to resolve query: {}", e);
                counter!(UPSTREAM_ERRORS_TOTAL).increment(1);
                response.set_response_code(ResponseCode::ServerFailure);
            }
        }

        response
    }

    /// Turns one inbound datagram into the bytes of its reply.
    ///
    /// A request that fails to decode is answered with `FORMERR` when its
    /// header is readable and dropped otherwise.
    pub async fn handle_datagram(&self, payload: &[u8]) -> Option<Bytes> {
        let response = match Message::from_bytes(payload) {
            Ok(query) => self.handle_query(&query).await,
            Err(e) => {
                counter!(MALFORMED_REQUESTS_TOTAL).increment(1);
                let Ok(header) = Message::peek_header(payload) else {
                    debug!("Dropping undecodable {}-byte datagram: {}", payload.len(), e);
                    return None;
                };
                warn!(kind = ?e.kind(), "Failed to parse DNS message {}: {}", header.id, e);
                let mut response = Message::new(header.to_response());
                response.set_response_code(ResponseCode::FormatError);
                response
            }
        };

        match response.to_bytes() {
            Ok(bytes) => {
                if bytes.len() > MAX_UDP_DNS_SIZE {
                    warn!(
                        "Response {} is {} bytes, over the {}-byte UDP limit",
                        response.id(),
                        bytes.len(),
                        MAX_UDP_DNS_SIZE
                    );
                }
                Some(bytes)
            }
            Err(e) => {
                warn!("Failed to encode response {}: {}", response.id(), e);
                None
            }
        }
    }
}

/// Configuration for the DNS server loop.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub max_inflight: usize,
    pub buffer_pool_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_inflight: 256,
            buffer_pool_size: 64,
        }
    }
}

impl From<&Config> for ServerConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_inflight: config.max_inflight,
            buffer_pool_size: config.buffer_pool_size,
        }
    }
}

/// Run the DNS server event loop.
///
/// This function coordinates:
/// 1. Receiving datagrams into pooled buffers
/// 2. Handling each one on its own task, at most `max_inflight` at a time
/// 3. Sending the responses back to the originating peer
///
/// Per-datagram failures are logged and never end the loop.
pub async fn run_server<C, R>(
    socket: UdpSocket,
    handler: QueryHandler<C, R>,
    config: ServerConfig,
) -> Result<()>
where
    C: DnsCache,
    R: DnsResolver,
{
    let socket = Arc::new(socket);
    let buffer_pool = BufferPool::new(config.buffer_pool_size);
    let inflight = Arc::new(Semaphore::new(config.max_inflight));
    info!("Listening on {}", socket.local_addr()?);

    loop {
        let Ok(permit) = Arc::clone(&inflight).acquire_owned().await else {
            break;
        };

        let mut buffer = buffer_pool.checkout();
        let (len, peer) = match socket.recv_from(buffer.space()).await {
            Ok(received) => received,
            Err(e) => {
                warn!("Failed to receive datagram: {}", e);
                continue;
            }
        };
        buffer.set_filled(len);

        let handler = handler.clone();
        let socket = Arc::clone(&socket);
        tokio::spawn(async move {
            let _permit = permit;
            let Some(response) = handler.handle_datagram(buffer.datagram()).await else {
                return;
            };
            if let Err(e) = socket.send_to(&response, peer).await {
                warn!("Failed to send response to {}: {}", peer, e);
            }
        });
    }

    Ok(())
}
