//! dnsrelay - A small caching DNS forwarder.
//!
//! dnsrelay listens for DNS queries over UDP, answers what it has cached,
//! and forwards everything else to an upstream resolver, one question at
//! a time. It carries its own wire codec for the subset of DNS it needs.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`config`]: Configuration loading and validation
//! - [`dns`]: Wire codec and upstream resolution
//! - [`cache`]: Answer caching with per-record TTLs
//! - [`buffer`]: Receive buffer pooling
//! - [`server`]: Query handling and the UDP event loop
//! - [`error`]: Error types
//!
//! # Testing
//!
//! The cache and the resolver sit behind traits so the query path can be
//! exercised without network access:
//!
//! ```rust
//! use dnsrelay::dns::{Header, Message, Question, RecordClass, RecordType};
//!
//! let mut query = Message::new(Header::new(1234));
//! query.add_question(Question::new("codecrafters.io", RecordType::A, RecordClass::IN));
//!
//! let bytes = query.to_bytes().unwrap();
//! assert_eq!(Message::from_bytes(&bytes).unwrap(), query);
//! ```

pub mod buffer;
pub mod cache;
pub mod config;
pub mod dns;
pub mod error;
pub mod metrics;
pub mod server;

pub use config::Config;
pub use error::{Error, Result};
