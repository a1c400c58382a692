//! Scenario 5 (TCP back-pressure survives a burst without dropping or
//! reordering messages) and scenario 6 (a malformed message closes only
//! the offending connection, leaving other exporters unaffected).

use std::net::Ipv4Addr;
use std::time::Duration;

use ipfix_pipeline::codec::element::IeValue;
use ipfix_pipeline::codec::set::{Set, Template, TemplateField};
use ipfix_pipeline::{CollectingProcess, CollectorConfigBuilder, FieldValue, Message, Record, Registry, Transport};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

fn field(registry: &Registry, name: &str, value: FieldValue) -> IeValue {
    IeValue::new(registry.get_info_element(name, 0).unwrap().into(), value).unwrap()
}

#[tokio::test]
async fn tcp_backpressure_delivers_every_message_in_order() {
    let config = CollectorConfigBuilder::default()
        .with_address("127.0.0.1:0".parse().unwrap())
        .with_transport(Transport::Tcp)
        .with_max_buffer_size(4)
        .build()
        .unwrap();
    let mut handle = CollectingProcess::new(config).start().await.unwrap();
    let addr = handle.local_addr();

    let registry = Registry::new();
    let record = Record::new().with_field(field(
        &registry,
        "sourceIPv4Address",
        FieldValue::Ipv4Address(Ipv4Addr::new(10, 0, 0, 1)),
    ));
    let template_fields = vec![TemplateField { enterprise_id: 0, element_id: 8, length: 4 }];
    let template = Message::new(0, 0).with_set(Set::Template(vec![Template::new(256, template_fields)]));

    const COUNT: u32 = 1000;
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(&template.encode().unwrap()).await.unwrap();

    let writer = tokio::spawn(async move {
        for sequence_number in 1..=COUNT {
            let message = Message::new(sequence_number, 0)
                .with_set(Set::Data { set_id: 256, records: vec![record.clone()] });
            stream.write_all(&message.encode().unwrap()).await.unwrap();
        }
        stream
    });

    let mut received = Vec::with_capacity(COUNT as usize);
    while received.len() < COUNT as usize {
        let decoded = tokio::time::timeout(Duration::from_secs(10), handle.messages.recv())
            .await
            .expect("did not time out")
            .expect("channel open");
        received.push(decoded.sequence_number);
    }
    writer.await.unwrap();

    let expected: Vec<u32> = (1..=COUNT).collect();
    assert_eq!(received, expected, "messages must arrive in send order under back-pressure");

    handle.stop().await;
}

#[tokio::test]
async fn malformed_version_closes_only_the_offending_connection() {
    let config = CollectorConfigBuilder::default()
        .with_address("127.0.0.1:0".parse().unwrap())
        .with_transport(Transport::Tcp)
        .build()
        .unwrap();
    let mut handle = CollectingProcess::new(config).start().await.unwrap();
    let addr = handle.local_addr();

    let mut bad_stream = TcpStream::connect(addr).await.unwrap();
    let mut good_stream = TcpStream::connect(addr).await.unwrap();

    // A 16-octet header claiming version 9 (not IPFIX's 10) and a length
    // equal to the header itself, i.e. an empty body.
    let mut bad_header = vec![0u8; 16];
    bad_header[0..2].copy_from_slice(&9u16.to_be_bytes());
    bad_header[2..4].copy_from_slice(&16u16.to_be_bytes());
    bad_stream.write_all(&bad_header).await.unwrap();

    let mut probe = [0u8; 1];
    let eof = tokio::time::timeout(Duration::from_secs(2), bad_stream.read(&mut probe))
        .await
        .expect("did not time out")
        .expect("read should not error");
    assert_eq!(eof, 0, "the collector should close the connection on an unsupported version");

    let registry = Registry::new();
    let record = Record::new().with_field(field(
        &registry,
        "sourceIPv4Address",
        FieldValue::Ipv4Address(Ipv4Addr::new(10, 0, 0, 9)),
    ));
    let template_fields = vec![TemplateField { enterprise_id: 0, element_id: 8, length: 4 }];
    let good_message = Message::new(1, 0)
        .with_set(Set::Template(vec![Template::new(256, template_fields)]))
        .with_set(Set::Data { set_id: 256, records: vec![record.clone()] });
    good_stream.write_all(&good_message.encode().unwrap()).await.unwrap();

    let decoded = tokio::time::timeout(Duration::from_secs(2), handle.messages.recv())
        .await
        .expect("did not time out")
        .expect("channel open");
    assert_eq!(decoded.sets[0].records, vec![record]);
    assert_eq!(handle.metrics().snapshot().protocol_errors, 1);

    handle.stop().await;
}
