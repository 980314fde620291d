//! Error types for the dnsrelay server.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

/// Main error type for dnsrelay operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("DNS protocol error: {0}")]
    Protocol(#[from] ProtoError),

    #[error("resolver error: {0}")]
    Resolver(String),

    #[error("upstream {upstream} did not answer within {timeout:?}")]
    UpstreamTimeout {
        upstream: SocketAddr,
        timeout: Duration,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("metrics error: {0}")]
    Metrics(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFile(#[source] io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// Validation errors for configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("upstream_timeout_ms must be greater than 0")]
    ZeroUpstreamTimeout,

    #[error("cache_capacity must be greater than 0")]
    ZeroCacheCapacity,

    #[error("max_inflight must be greater than 0")]
    ZeroMaxInflight,

    #[error("buffer_pool_size must be greater than 0")]
    ZeroBufferPoolSize,
}

/// Broad classes of wire-format failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtoErrorKind {
    /// A name, label or RDATA violates a length rule.
    Format,
    /// The input ended before a declared field or section.
    Truncated,
    /// A compression pointer or label type is malformed.
    Protocol,
    /// A TYPE, CLASS or RCODE value is outside the recognized set.
    UnknownEnumValue,
}

/// DNS wire-format errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtoError {
    #[error("label too long: {length} bytes exceeds maximum of 63")]
    LabelTooLong { length: usize },

    #[error("empty label in name {name:?}")]
    EmptyLabel { name: String },

    #[error("label at offset {offset} contains a '.' byte")]
    DotInLabel { offset: usize },

    #[error("name too long: {length} bytes exceeds maximum of 255")]
    NameTooLong { length: usize },

    #[error("RDATA length mismatch for {rtype}: expected {expected}, got {actual}")]
    RDataLength {
        rtype: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("RDATA does not match record type {rtype}")]
    RDataTypeMismatch { rtype: u16 },

    #[error("message truncated: needed {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("invalid compression pointer at offset {offset}: points to {target}")]
    InvalidPointer { offset: usize, target: usize },

    #[error("too many compression pointer jumps at offset {offset}")]
    PointerLoop { offset: usize },

    #[error("unsupported label type {label:#04x} at offset {offset}")]
    InvalidLabelType { label: u8, offset: usize },

    #[error("unknown {field} value: {value}")]
    UnknownEnumValue { field: &'static str, value: u16 },
}

impl ProtoError {
    /// Returns the broad class this error belongs to.
    pub const fn kind(&self) -> ProtoErrorKind {
        match self {
            Self::LabelTooLong { .. }
            | Self::EmptyLabel { .. }
            | Self::DotInLabel { .. }
            | Self::NameTooLong { .. }
            | Self::RDataLength { .. }
            | Self::RDataTypeMismatch { .. } => ProtoErrorKind::Format,
            Self::Truncated { .. } => ProtoErrorKind::Truncated,
            Self::InvalidPointer { .. }
            | Self::PointerLoop { .. }
            | Self::InvalidLabelType { .. } => ProtoErrorKind::Protocol,
            Self::UnknownEnumValue { .. } => ProtoErrorKind::UnknownEnumValue,
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;
