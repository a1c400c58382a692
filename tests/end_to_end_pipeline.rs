//! End-to-end tests wiring the Collecting Process into the Aggregation
//! Process over a real TCP socket, covering scenarios 1 and 2 of the
//! worked examples: a basic single-record round trip, and bidirectional
//! flow correlation across two arrivals carrying complementary halves of
//! the same flow.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use ipfix_pipeline::codec::element::IeValue;
use ipfix_pipeline::codec::set::{Set, Template, TemplateField};
use ipfix_pipeline::registry::{DataType, EnterpriseFieldDef, VARIABLE_LENGTH};
use ipfix_pipeline::{
    AggregationProcess, AggregatorConfigBuilder, CollectingProcess, CollectorConfigBuilder,
    CorrelateField, FieldValue, Message, PipelineMetrics, Record, RecordState, Registry, Transport,
};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

fn field(registry: &Registry, name: &str, value: FieldValue) -> IeValue {
    let element = registry
        .get_info_element(name, 0)
        .or_else(|_| registry.get_info_element(name, 55555))
        .unwrap();
    IeValue::new(element.into(), value).unwrap()
}

#[tokio::test]
async fn basic_round_trip_decodes_a_single_data_record() {
    let config = CollectorConfigBuilder::default()
        .with_address("127.0.0.1:0".parse().unwrap())
        .with_transport(Transport::Tcp)
        .build()
        .unwrap();
    let mut handle = CollectingProcess::new(config).start().await.unwrap();
    let addr = handle.local_addr();

    let registry = Registry::new();
    let record = Record::new()
        .with_field(field(&registry, "sourceIPv4Address", FieldValue::Ipv4Address(Ipv4Addr::new(10, 0, 0, 1))))
        .with_field(field(
            &registry,
            "destinationIPv4Address",
            FieldValue::Ipv4Address(Ipv4Addr::new(10, 0, 0, 2)),
        ))
        .with_field(field(&registry, "sourceTransportPort", FieldValue::Unsigned(1234)))
        .with_field(field(&registry, "destinationTransportPort", FieldValue::Unsigned(443)))
        .with_field(field(&registry, "protocolIdentifier", FieldValue::Unsigned(6)));

    let fields = vec![
        TemplateField { enterprise_id: 0, element_id: 8, length: 4 },
        TemplateField { enterprise_id: 0, element_id: 12, length: 4 },
        TemplateField { enterprise_id: 0, element_id: 7, length: 2 },
        TemplateField { enterprise_id: 0, element_id: 11, length: 2 },
        TemplateField { enterprise_id: 0, element_id: 4, length: 1 },
    ];
    let message = Message::new(1, 0)
        .with_set(Set::Template(vec![Template::new(256, fields)]))
        .with_set(Set::Data { set_id: 256, records: vec![record.clone()] });

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(&message.encode().unwrap()).await.unwrap();

    let decoded = tokio::time::timeout(Duration::from_secs(2), handle.messages.recv())
        .await
        .expect("did not time out")
        .expect("channel open");
    assert_eq!(decoded.sets.len(), 1);
    assert_eq!(decoded.sets[0].records, vec![record]);

    handle.stop().await;
}

#[tokio::test]
async fn bidirectional_flows_correlate_across_two_arrivals() {
    let mut registry = Registry::new();
    registry.register_enterprise(EnterpriseFieldDef::new("sourcePodName", 1, 55555, DataType::String, VARIABLE_LENGTH));
    registry.register_enterprise(EnterpriseFieldDef::new(
        "destinationPodName",
        2,
        55555,
        DataType::String,
        VARIABLE_LENGTH,
    ));

    let collector_config = CollectorConfigBuilder::default()
        .with_address("127.0.0.1:0".parse().unwrap())
        .with_transport(Transport::Tcp)
        .with_registry(registry.clone())
        .build()
        .unwrap();
    let collector = CollectingProcess::new(collector_config).start().await.unwrap();
    let addr = collector.local_addr();

    let aggregator_config = AggregatorConfigBuilder::default()
        .with_worker_count(1)
        .with_correlate_field(CorrelateField::new("sourcePodName", "destinationPodName"))
        .with_non_stats_elements(["flowEndSeconds"])
        .with_stats_elements(["packetTotalCount", "packetDeltaCount"])
        .with_source_side_stats_elements(["packetTotalCount", "packetDeltaCount"])
        .with_destination_side_stats_elements(["packetTotalCount", "packetDeltaCount"])
        .build()
        .unwrap();
    let aggregator_metrics = Arc::new(PipelineMetrics::new());
    let aggregator = AggregationProcess::new(aggregator_config).start(collector.messages, aggregator_metrics);

    let fields = vec![
        TemplateField { enterprise_id: 0, element_id: 8, length: 4 },
        TemplateField { enterprise_id: 0, element_id: 12, length: 4 },
        TemplateField { enterprise_id: 0, element_id: 7, length: 2 },
        TemplateField { enterprise_id: 0, element_id: 11, length: 2 },
        TemplateField { enterprise_id: 0, element_id: 4, length: 1 },
        TemplateField { enterprise_id: 55555, element_id: 1, length: VARIABLE_LENGTH },
        TemplateField { enterprise_id: 55555, element_id: 2, length: VARIABLE_LENGTH },
        TemplateField { enterprise_id: 0, element_id: 86, length: 8 },
        TemplateField { enterprise_id: 0, element_id: 2, length: 8 },
        TemplateField { enterprise_id: 0, element_id: 151, length: 4 },
    ];

    let five_tuple = |extra: Vec<IeValue>| {
        let mut record = Record::new()
            .with_field(field(&registry, "sourceIPv4Address", FieldValue::Ipv4Address(Ipv4Addr::new(10, 0, 0, 1))))
            .with_field(field(
                &registry,
                "destinationIPv4Address",
                FieldValue::Ipv4Address(Ipv4Addr::new(10, 0, 0, 2)),
            ))
            .with_field(field(&registry, "sourceTransportPort", FieldValue::Unsigned(1234)))
            .with_field(field(&registry, "destinationTransportPort", FieldValue::Unsigned(443)))
            .with_field(field(&registry, "protocolIdentifier", FieldValue::Unsigned(6)));
        for ie in extra {
            record = record.with_field(ie);
        }
        record
    };

    // Every record must carry a value for every field in the template,
    // positionally; the side not being reported on fills its pod-name
    // field with an empty string, matching correlate's "empty means not
    // yet observed" convention.
    let record1 = five_tuple(vec![
        field(&registry, "sourcePodName", FieldValue::String(String::new())),
        field(&registry, "destinationPodName", FieldValue::String("pod2".into())),
        field(&registry, "packetTotalCount", FieldValue::Unsigned(1000)),
        field(&registry, "packetDeltaCount", FieldValue::Unsigned(500)),
        field(&registry, "flowEndSeconds", FieldValue::DateTime(1257894000)),
    ]);
    let record2 = five_tuple(vec![
        field(&registry, "sourcePodName", FieldValue::String("pod1".into())),
        field(&registry, "destinationPodName", FieldValue::String(String::new())),
        field(&registry, "packetTotalCount", FieldValue::Unsigned(400)),
        field(&registry, "packetDeltaCount", FieldValue::Unsigned(200)),
        field(&registry, "flowEndSeconds", FieldValue::DateTime(1257895000)),
    ]);

    let message1 = Message::new(1, 0)
        .with_set(Set::Template(vec![Template::new(256, fields.clone())]))
        .with_set(Set::Data { set_id: 256, records: vec![record1] });
    let message2 = Message::new(2, 0).with_set(Set::Data { set_id: 256, records: vec![record2] });

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(&message1.encode().unwrap()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    stream.write_all(&message2.encode().unwrap()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(aggregator.len().await, 1);
    let mut saw_correlated = false;
    aggregator
        .for_all_records_do(|_key, record| {
            if record.state() == RecordState::Correlated {
                saw_correlated = true;
                assert_eq!(record.record.get("sourcePodName"), Some(&FieldValue::String("pod1".into())));
                assert_eq!(record.record.get("destinationPodName"), Some(&FieldValue::String("pod2".into())));
                assert_eq!(record.record.get("packetTotalCount"), Some(&FieldValue::Unsigned(1000)));
                assert_eq!(record.record.get("packetDeltaCount"), Some(&FieldValue::Unsigned(700)));
            }
        })
        .await;
    assert!(saw_correlated, "flow should have reached the correlated state");

    aggregator.stop().await;
}
