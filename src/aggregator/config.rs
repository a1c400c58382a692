//! Aggregation Process construction input (§4.4 `Init(input)`), mirroring
//! the collector's consuming-builder shape.

use crate::error::AggregatorError;

use super::correlate::{AggregateElements, CorrelateField};

/// Default number of worker tasks draining the input channel concurrently
/// (§4.4 "the aggregator may run several worker tasks pulling from one
/// shared input channel").
const DEFAULT_WORKER_COUNT: usize = 4;

/// Resolved, immutable configuration for one [`crate::aggregator::AggregationProcess`].
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub correlate_fields: Vec<CorrelateField>,
    pub elements: AggregateElements,
    pub worker_count: usize,
}

/// Builder for [`AggregatorConfig`].
///
/// # Examples
///
/// ```rust
/// use ipfix_pipeline::aggregator::{AggregatorConfigBuilder, CorrelateField};
///
/// let config = AggregatorConfigBuilder::default()
///     .with_correlate_field(CorrelateField::new("sourcePodName", "destinationPodName"))
///     .with_non_stats_elements(["flowEndSeconds"])
///     .with_stats_elements(["packetTotalCount", "packetDeltaCount"])
///     .build()
///     .expect("valid aggregator config");
/// ```
#[derive(Debug, Clone)]
pub struct AggregatorConfigBuilder {
    correlate_fields: Vec<CorrelateField>,
    elements: AggregateElements,
    worker_count: usize,
}

impl Default for AggregatorConfigBuilder {
    fn default() -> Self {
        Self {
            correlate_fields: Vec::new(),
            elements: AggregateElements::default(),
            worker_count: DEFAULT_WORKER_COUNT,
        }
    }
}

impl AggregatorConfigBuilder {
    #[must_use = "builder methods consume self and return a new builder; the return value must be used"]
    pub fn with_correlate_field(mut self, field: CorrelateField) -> Self {
        self.correlate_fields.push(field);
        self
    }

    #[must_use = "builder methods consume self and return a new builder; the return value must be used"]
    pub fn with_non_stats_elements<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.elements.non_stats_elements.extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use = "builder methods consume self and return a new builder; the return value must be used"]
    pub fn with_stats_elements<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.elements.stats_elements.extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use = "builder methods consume self and return a new builder; the return value must be used"]
    pub fn with_source_side_stats_elements<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.elements
            .source_side_stats_elements
            .extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use = "builder methods consume self and return a new builder; the return value must be used"]
    pub fn with_destination_side_stats_elements<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.elements
            .destination_side_stats_elements
            .extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use = "builder methods consume self and return a new builder; the return value must be used"]
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn build(self) -> Result<AggregatorConfig, AggregatorError> {
        if self.worker_count == 0 {
            return Err(AggregatorError::InvalidWorkerCount);
        }
        Ok(AggregatorConfig {
            correlate_fields: self.correlate_fields,
            elements: self.elements,
            worker_count: self.worker_count,
        })
    }
}
