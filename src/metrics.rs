//! Pipeline metrics: the data-path fault counters named in §4.3/§4.4/§7
//! (protocol errors, unknown template, unknown element, type mismatch).
//! None of these counters ever halt the pipeline; they exist purely for
//! observability.

use std::sync::atomic::{AtomicU64, Ordering};

/// Data-path fault counters for the Collecting and Aggregation processes
/// (§7). All faults here are recovered locally; nothing here represents a
/// halted component.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// `ProtocolError`: bad version or truncated message (§4.3).
    pub protocol_errors: AtomicU64,
    /// Data set referenced a template not yet (or no longer) live (§4.3).
    pub unknown_template: AtomicU64,
    /// A field's element id wasn't found in the registry (§4.2, §4.3).
    pub unknown_element: AtomicU64,
    /// A decoded value didn't match its information element's data type.
    pub type_mismatch: AtomicU64,
    /// Records successfully decoded and handed to the output channel.
    pub records_decoded: AtomicU64,
    /// Incoming records the aggregator could not key (missing 5-tuple field).
    pub unkeyable_records: AtomicU64,
    /// Records folded into the aggregation map.
    pub records_aggregated: AtomicU64,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_protocol_error(&self) {
        self.protocol_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_unknown_template(&self) {
        self.unknown_template.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_unknown_element(&self) {
        self.unknown_element.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_type_mismatch(&self) {
        self.type_mismatch.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_decoded(&self) {
        self.records_decoded.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_unkeyable(&self) {
        self.unkeyable_records.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_aggregated(&self) {
        self.records_aggregated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PipelineMetricsSnapshot {
        PipelineMetricsSnapshot {
            protocol_errors: self.protocol_errors.load(Ordering::Relaxed),
            unknown_template: self.unknown_template.load(Ordering::Relaxed),
            unknown_element: self.unknown_element.load(Ordering::Relaxed),
            type_mismatch: self.type_mismatch.load(Ordering::Relaxed),
            records_decoded: self.records_decoded.load(Ordering::Relaxed),
            unkeyable_records: self.unkeyable_records.load(Ordering::Relaxed),
            records_aggregated: self.records_aggregated.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of [`PipelineMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineMetricsSnapshot {
    pub protocol_errors: u64,
    pub unknown_template: u64,
    pub unknown_element: u64,
    pub type_mismatch: u64,
    pub records_decoded: u64,
    pub unkeyable_records: u64,
    pub records_aggregated: u64,
}
