// Run with: cargo run --example collect_and_aggregate
//
// Starts a TCP collector on 127.0.0.1:4739, wires its decoded-message
// channel straight into an aggregator, and periodically prints how many
// flows are correlated.

use std::sync::Arc;
use std::time::Duration;

use ipfix_pipeline::{
    AggregationProcess, AggregatorConfigBuilder, CollectingProcess, CollectorConfigBuilder,
    CorrelateField, PipelineMetrics, RecordState, Transport,
};
use tokio::time::interval;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let collector_config = CollectorConfigBuilder::default()
        .with_address("127.0.0.1:4739".parse()?)
        .with_transport(Transport::Tcp)
        .build()?;
    let collector = CollectingProcess::new(collector_config).start().await?;
    println!("collecting on {}", collector.local_addr());

    let aggregator_config = AggregatorConfigBuilder::default()
        .with_correlate_field(CorrelateField::new("sourcePodName", "destinationPodName"))
        .with_non_stats_elements(["flowEndSeconds"])
        .with_stats_elements(["packetTotalCount", "packetDeltaCount"])
        .with_source_side_stats_elements(["packetTotalCount", "packetDeltaCount"])
        .with_destination_side_stats_elements(["packetTotalCount", "packetDeltaCount"])
        .build()?;
    let metrics = Arc::new(PipelineMetrics::new());
    let aggregator = AggregationProcess::new(aggregator_config).start(collector.messages, metrics);

    let mut ticker = interval(Duration::from_secs(5));
    loop {
        ticker.tick().await;
        let mut correlated = 0;
        let mut partial = 0;
        aggregator
            .for_all_records_do(|_key, record| match record.state() {
                RecordState::Correlated => correlated += 1,
                RecordState::Partial => partial += 1,
                RecordState::New => {}
            })
            .await;
        println!("[aggregator] correlated={correlated} partial={partial}");
    }
}
