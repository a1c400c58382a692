#![doc = include_str!("../README.md")]

pub mod aggregator;
pub mod codec;
pub mod collector;
pub mod error;
pub mod metrics;
pub mod registry;

pub use aggregator::{
    AggregateElements, AggregationProcess, AggregationRecord, AggregatorConfig,
    AggregatorConfigBuilder, AggregatorHandle, CorrelateField, FlowKey, RecordState,
};
pub use codec::{
    DecodedFrame, FieldValue, Header, Message, Record, HEADER_LENGTH, IPFIX_VERSION,
};
pub use collector::{
    CollectingProcess, CollectorConfig, CollectorConfigBuilder, CollectorHandle, DecodedDataSet,
    DecodedMessage, Transport, DEFAULT_PORT, DEFAULT_TLS_PORT,
};
pub use error::{AggregatorError, CodecError, CollectorError, ConfigError, RegistryError, ShutdownError};
pub use metrics::{PipelineMetrics, PipelineMetricsSnapshot};
pub use registry::{EnterpriseFieldDef, Registry};
