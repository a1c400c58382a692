//! Crate-wide error taxonomy.
//!
//! Each component boundary gets its own error enum rather than one giant
//! error type, following the same small-per-module-error shape the codec
//! value types use (`DataNumberError`, `FieldValueError` in the teacher
//! this crate grew out of). `thiserror` derives `Display`/`std::error::Error`
//! so callers get `?`-friendly conversions without writing them by hand.

use thiserror::Error;

/// Faults in the wire codec (§4.2): never partial, always attributable to
/// one element or record.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
    #[error("value does not match the information element's declared type")]
    TypeMismatch,
    #[error("value of {actual} octets exceeds information element length {max}")]
    LengthOverflow { actual: usize, max: usize },
    #[error("no information element registered for id {element_id} / enterprise {enterprise_id}")]
    UnknownElement { element_id: u16, enterprise_id: u32 },
    #[error("input truncated: needed {needed} more octet(s)")]
    TruncatedInput { needed: usize },
}

/// Registry lookup failures (§4.1). Distinct from [`CodecError`] because the
/// registry treats "not found" as a plain negative result, not a fault.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no information element named {0:?}")]
    NotFoundByName(String),
    #[error("no information element with id {element_id} / enterprise {enterprise_id}")]
    NotFoundById { element_id: u16, enterprise_id: u32 },
}

/// Faults raised while constructing a component (`Init`). These halt
/// construction; they never occur on the data path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("address could not be parsed or bound: {0}")]
    InvalidAddress(String),
    #[error("TLS certificate material is invalid: {0}")]
    InvalidTls(String),
    #[error("worker count must be greater than zero")]
    InvalidWorkerCount,
}

/// Data-path faults in the Collecting Process (§4.3, §7). All are recovered
/// locally by the collector and counted; none halt the process.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CollectorError {
    #[error("malformed IPFIX message: {0}")]
    Protocol(String),
    #[error("data set references template {template_id} which is not live for this observation domain")]
    UnknownTemplate { template_id: u16 },
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Faults raised while constructing or running the Aggregation Process
/// (§4.4). `WorkerCount` halts construction; the rest never halt a running
/// aggregator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AggregatorError {
    #[error("worker count must be greater than zero")]
    InvalidWorkerCount,
    #[error("no aggregation record for the given flow key")]
    NotFound,
    #[error("aggregator is shutting down")]
    Shutdown,
}

/// Errors surfaced by blocking operations on a stopped component.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("component is shutting down")]
pub struct ShutdownError;
