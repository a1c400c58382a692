//! Flow key derivation (§3, §4.4).

use crate::codec::value::FieldValue;
use crate::codec::Record;

/// The directional 5-tuple identifying a flow (§3, §9 "The source clearly
/// uses directional keys (source before destination) — preserve that").
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct FlowKey {
    pub source: String,
    pub destination: String,
    pub protocol: u8,
    pub source_port: u16,
    pub destination_port: u16,
}

impl FlowKey {
    /// Derives a key from an incoming data record. Returns `None` if any
    /// required field is absent (§4.4 "Absent any required field ->
    /// record skipped").
    pub fn derive(record: &Record) -> Option<FlowKey> {
        let source = record
            .get("sourceIPv4Address")
            .or_else(|| record.get("sourceIPv6Address"))?;
        let destination = record
            .get("destinationIPv4Address")
            .or_else(|| record.get("destinationIPv6Address"))?;
        let protocol = as_u8(record.get("protocolIdentifier")?)?;
        let source_port = as_u16(record.get("sourceTransportPort")?)?;
        let destination_port = as_u16(record.get("destinationTransportPort")?)?;

        Some(FlowKey {
            source: source.as_display_string(),
            destination: destination.as_display_string(),
            protocol,
            source_port,
            destination_port,
        })
    }
}

fn as_u8(value: &FieldValue) -> Option<u8> {
    match value {
        FieldValue::Unsigned(v) => u8::try_from(*v).ok(),
        _ => None,
    }
}

fn as_u16(value: &FieldValue) -> Option<u16> {
    match value {
        FieldValue::Unsigned(v) => u16::try_from(*v).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::element::IeValue;
    use crate::registry::Registry;
    use std::net::Ipv4Addr;

    fn field(registry: &Registry, name: &str, value: FieldValue) -> IeValue {
        IeValue::new(registry.get_info_element(name, 0).unwrap().into(), value).unwrap()
    }

    #[test]
    fn derives_key_from_a_complete_five_tuple_record() {
        let registry = Registry::new();
        let record = Record::new()
            .with_field(field(&registry, "sourceIPv4Address", FieldValue::Ipv4Address(Ipv4Addr::new(10, 0, 0, 1))))
            .with_field(field(&registry, "destinationIPv4Address", FieldValue::Ipv4Address(Ipv4Addr::new(10, 0, 0, 2))))
            .with_field(field(&registry, "sourceTransportPort", FieldValue::Unsigned(1234)))
            .with_field(field(&registry, "destinationTransportPort", FieldValue::Unsigned(5678)))
            .with_field(field(&registry, "protocolIdentifier", FieldValue::Unsigned(6)));

        let key = FlowKey::derive(&record).unwrap();
        assert_eq!(key.source, "10.0.0.1");
        assert_eq!(key.destination, "10.0.0.2");
        assert_eq!(key.protocol, 6);
        assert_eq!(key.source_port, 1234);
        assert_eq!(key.destination_port, 5678);
    }

    #[test]
    fn missing_required_field_yields_no_key() {
        let registry = Registry::new();
        let record = Record::new().with_field(field(
            &registry,
            "sourceIPv4Address",
            FieldValue::Ipv4Address(Ipv4Addr::new(10, 0, 0, 1)),
        ));
        assert_eq!(FlowKey::derive(&record), None);
    }
}
