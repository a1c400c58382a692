//! The Aggregation Process (§4.4): bidirectional flow correlation over a
//! pool of worker tasks sharing one input channel and one flow-record map.
//!
//! Concurrency mirrors the collector's shape — a [`CancellationToken`] for
//! shutdown, a [`JoinSet`] for tracked worker lifetimes — except here
//! several workers race to drain a single `mpsc::Receiver`, so the
//! receiver itself lives behind a `tokio::sync::Mutex` (§4.4 "several
//! worker tasks pulling from one shared input channel").

mod config;
mod correlate;
mod key;
mod record;

pub use config::{AggregatorConfig, AggregatorConfigBuilder};
pub use correlate::{AggregateElements, CorrelateField};
pub use key::FlowKey;
pub use record::{AggregationRecord, RecordState};

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::collector::DecodedMessage;
use crate::metrics::PipelineMetrics;

type FlowTable = Arc<Mutex<HashMap<FlowKey, AggregationRecord>>>;

/// The Aggregation Process (§4.4 `Init`/`Start`/`Stop`/`ForAllRecordsDo`/
/// `GetRecord`/`DeleteRecord`).
pub struct AggregationProcess {
    config: AggregatorConfig,
}

impl AggregationProcess {
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    /// `Start(input)` (§4.4): spawns `worker_count` tasks that each pull
    /// the next [`DecodedMessage`] off `input` and fold its records into
    /// the shared flow table. Returns immediately with a handle.
    pub fn start(
        self,
        input: mpsc::Receiver<DecodedMessage>,
        metrics: Arc<PipelineMetrics>,
    ) -> AggregatorHandle {
        let flows: FlowTable = Arc::new(Mutex::new(HashMap::new()));
        let input = Arc::new(Mutex::new(input));
        let cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();

        info!("aggregation process starting {} worker(s)", self.config.worker_count);

        for worker_id in 0..self.config.worker_count {
            let input = input.clone();
            let flows = flows.clone();
            let metrics = metrics.clone();
            let cancel = cancel.clone();
            let correlate_fields = self.config.correlate_fields.clone();
            let elements = self.config.elements.clone();
            tasks.spawn(async move {
                worker_loop(worker_id, input, flows, metrics, cancel, correlate_fields, elements).await;
            });
        }

        AggregatorHandle { flows, cancel, tasks }
    }
}

async fn worker_loop(
    worker_id: usize,
    input: Arc<Mutex<mpsc::Receiver<DecodedMessage>>>,
    flows: FlowTable,
    metrics: Arc<PipelineMetrics>,
    cancel: CancellationToken,
    correlate_fields: Vec<CorrelateField>,
    elements: AggregateElements,
) {
    loop {
        let message = {
            let mut input = input.lock().await;
            tokio::select! {
                _ = cancel.cancelled() => None,
                message = input.recv() => message,
            }
        };
        let Some(message) = message else {
            debug!("aggregator worker {worker_id} stopping");
            break;
        };

        let mut flows = flows.lock().await;
        for record in message.records() {
            let Some(key) = FlowKey::derive(record) else {
                metrics.record_unkeyable();
                continue;
            };
            let stored = flows.entry(key).or_default();
            correlate::merge(stored, record, &correlate_fields, &elements);
            metrics.record_aggregated();
        }
    }
}

/// Handle to a running [`AggregationProcess`] (§4.4).
pub struct AggregatorHandle {
    flows: FlowTable,
    cancel: CancellationToken,
    tasks: JoinSet<()>,
}

impl AggregatorHandle {
    /// `GetRecord(key)` (§4.4): a point-in-time clone of the stored
    /// aggregation record, or `None` if the key has never been seen.
    pub async fn get_record(&self, key: &FlowKey) -> Option<AggregationRecord> {
        self.flows.lock().await.get(key).cloned()
    }

    /// `DeleteRecord(key)` (§4.4): removes a record, e.g. once a consumer
    /// has read it and set `ready_to_send`.
    pub async fn delete_record(&self, key: &FlowKey) -> Option<AggregationRecord> {
        self.flows.lock().await.remove(key)
    }

    /// `ForAllRecordsDo(callback)` (§4.4): invokes `callback` once per
    /// stored `(key, record)` pair under a single lock acquisition. The
    /// callback must not reenter the aggregator.
    pub async fn for_all_records_do(&self, mut callback: impl FnMut(&FlowKey, &AggregationRecord)) {
        let flows = self.flows.lock().await;
        for (key, record) in flows.iter() {
            callback(key, record);
        }
    }

    pub async fn len(&self) -> usize {
        self.flows.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.flows.lock().await.is_empty()
    }

    /// `Stop()`: signals every worker to stop pulling new messages and
    /// awaits them all.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        while self.tasks.join_next().await.is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::element::IeValue;
    use crate::codec::value::FieldValue;
    use crate::codec::Record;
    use crate::collector::DecodedDataSet;
    use crate::registry::Registry;
    use std::net::{Ipv4Addr, SocketAddr};

    fn field(registry: &Registry, name: &str, value: FieldValue) -> IeValue {
        IeValue::new(registry.get_info_element(name, 0).unwrap().into(), value).unwrap()
    }

    fn five_tuple_record(registry: &Registry, src: u8, dst: u8) -> Record {
        Record::new()
            .with_field(field(registry, "sourceIPv4Address", FieldValue::Ipv4Address(Ipv4Addr::new(10, 0, 0, src))))
            .with_field(field(
                registry,
                "destinationIPv4Address",
                FieldValue::Ipv4Address(Ipv4Addr::new(10, 0, 0, dst)),
            ))
            .with_field(field(registry, "sourceTransportPort", FieldValue::Unsigned(1234)))
            .with_field(field(registry, "destinationTransportPort", FieldValue::Unsigned(80)))
            .with_field(field(registry, "protocolIdentifier", FieldValue::Unsigned(6)))
    }

    #[tokio::test]
    async fn aggregates_records_from_the_input_channel_by_flow_key() {
        let registry = Registry::new();
        let config = AggregatorConfigBuilder::default().with_worker_count(1).build().unwrap();
        let metrics = Arc::new(PipelineMetrics::new());
        let (tx, rx) = mpsc::channel(16);
        let handle = AggregationProcess::new(config).start(rx, metrics.clone());

        let message = DecodedMessage {
            remote: "127.0.0.1:9999".parse::<SocketAddr>().unwrap(),
            export_time: 0,
            sequence_number: 1,
            observation_domain_id: 0,
            sets: vec![DecodedDataSet {
                set_id: 256,
                records: vec![five_tuple_record(&registry, 1, 2)],
            }],
        };
        tx.send(message).await.unwrap();
        drop(tx);

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(handle.len().await, 1);
        assert_eq!(metrics.snapshot().records_aggregated, 1);

        handle.stop().await;
    }

    #[tokio::test]
    async fn unkeyable_records_are_counted_and_dropped() {
        let registry = Registry::new();
        let config = AggregatorConfigBuilder::default().with_worker_count(1).build().unwrap();
        let metrics = Arc::new(PipelineMetrics::new());
        let (tx, rx) = mpsc::channel(16);
        let handle = AggregationProcess::new(config).start(rx, metrics.clone());

        let incomplete = Record::new().with_field(field(
            &registry,
            "sourceIPv4Address",
            FieldValue::Ipv4Address(Ipv4Addr::new(10, 0, 0, 1)),
        ));
        let message = DecodedMessage {
            remote: "127.0.0.1:9999".parse::<SocketAddr>().unwrap(),
            export_time: 0,
            sequence_number: 1,
            observation_domain_id: 0,
            sets: vec![DecodedDataSet { set_id: 256, records: vec![incomplete] }],
        };
        tx.send(message).await.unwrap();
        drop(tx);

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(handle.is_empty().await);
        assert_eq!(metrics.snapshot().unkeyable_records, 1);

        handle.stop().await;
    }
}
