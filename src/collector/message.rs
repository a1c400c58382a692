//! The decoded message shape handed out over the collector's output
//! channel (§4.3 "`GetMsgChan` → receive-only channel of decoded
//! Message"). Template and options-template sets are consumed internally
//! to update the per-exporter cache; only resolved data sets cross the
//! channel boundary, since those are what the Aggregation Process and any
//! other consumer actually need (§9's move-semantics ownership rule: the
//! collector must not retain or mutate a message after handing it off).

use std::net::SocketAddr;

use crate::codec::Record;

/// One data set's worth of resolved records, tagged with the set-id
/// (= template-id) they were decoded against.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DecodedDataSet {
    pub set_id: u16,
    pub records: Vec<crate::codec::Record>,
}

/// A fully decoded IPFIX message (§3), ready for the aggregator or any
/// other consumer of [`crate::collector::CollectorHandle::messages`].
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DecodedMessage {
    pub remote: SocketAddr,
    pub export_time: u32,
    pub sequence_number: u32,
    pub observation_domain_id: u32,
    pub sets: Vec<DecodedDataSet>,
}

impl DecodedMessage {
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.sets.iter().flat_map(|s| s.records.iter())
    }
}
