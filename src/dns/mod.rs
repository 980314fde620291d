//! DNS wire-format codec and upstream resolution.

pub mod header;
pub mod message;
pub mod name;
pub mod question;
pub mod record;
pub mod resolver;
pub mod wire;

pub use header::{Header, ResponseCode};
pub use message::{MAX_UDP_DNS_SIZE, Message};
pub use name::Name;
pub use question::{Question, RecordClass, RecordType};
pub use record::{RData, Record};
pub use resolver::{DnsResolver, UpstreamResolver};
