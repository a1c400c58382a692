//! Data records (§3): an ordered sequence of IE-with-values.

use crate::error::CodecError;
use crate::registry::Registry;

use super::element::{IeValue, OwnedInfoElement};
use super::set::TemplateField;
use super::value::FieldValue;

/// An ordered sequence of IE-with-values (§3). Order is insertion order;
/// wire serialization follows it exactly.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
pub struct Record {
    fields: Vec<IeValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field, preserving the builder-style construction the
    /// encode path and tests use to assemble synthetic records (§3
    /// supplement: records support programmatic construction, not just
    /// wire decode).
    pub fn push(&mut self, field: IeValue) -> &mut Self {
        self.fields.push(field);
        self
    }

    pub fn with_field(mut self, field: IeValue) -> Self {
        self.push(field);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &IeValue> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Looks up a field by element name, first match wins (a record is not
    /// expected to repeat an element, but nothing in §3 forbids it).
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name() == name).map(|f| &f.value)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FieldValue> {
        self.fields.iter_mut().find(|f| f.name() == name).map(|f| &mut f.value)
    }

    /// Encodes the record's fields in insertion order (§4.2).
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::new();
        for field in &self.fields {
            out.extend(field.encode()?);
        }
        Ok(out)
    }

    /// Decodes a single record from `input` against `fields`, resolving
    /// each field's data type through `registry`. Never partial: on any
    /// field fault the whole record is rejected (spec §4.2).
    pub fn decode<'a>(
        input: &'a [u8],
        fields: &[TemplateField],
        registry: &Registry,
    ) -> Result<(&'a [u8], Record), CodecError> {
        let mut record = Record::new();
        let mut rest = input;
        for field in fields {
            let ie = registry
                .get_info_element_from_id(field.element_id, field.enterprise_id)
                .map_err(|_| CodecError::UnknownElement {
                    element_id: field.element_id,
                    enterprise_id: field.enterprise_id,
                })?;
            let (next, value) = FieldValue::decode(rest, ie.data_type, field.length)?;
            let owned: OwnedInfoElement = ie.into();
            record.push(IeValue::new(owned, value)?);
            rest = next;
        }
        Ok((rest, record))
    }

    /// Decodes as many records as fit `input` using a fixed-length
    /// template, skipping (and counting) any record that fails to decode
    /// rather than aborting the whole set (spec §4.2, §4.3 "set skipped"
    /// vs. "record dropped").
    pub fn decode_fixed_width_many(
        input: &[u8],
        fields: &[TemplateField],
        record_length: usize,
        registry: &Registry,
    ) -> (Vec<Record>, usize) {
        let mut records = Vec::new();
        let mut faults = 0usize;
        let mut offset = 0;
        while offset + record_length <= input.len() {
            let chunk = &input[offset..offset + record_length];
            match Record::decode(chunk, fields, registry) {
                Ok((_, record)) => records.push(record),
                Err(_) => faults += 1,
            }
            offset += record_length;
        }
        (records, faults)
    }

    /// Decodes consecutive variable-length records until `input` is
    /// exhausted or a record fails — at that point the remainder of the
    /// set cannot be reliably re-synchronized (no way to know where the
    /// faulty record ends) so decoding stops, per the open question in
    /// spec §9 about options-template scope semantics being the only
    /// documented passthrough limitation; this is the sibling limitation
    /// for variable-length data sets.
    pub fn decode_variable_width_many(
        input: &[u8],
        fields: &[TemplateField],
        registry: &Registry,
    ) -> (Vec<Record>, usize) {
        let mut records = Vec::new();
        let mut faults = 0usize;
        let mut rest = input;
        while !rest.is_empty() {
            match Record::decode(rest, fields, registry) {
                Ok((next, record)) => {
                    records.push(record);
                    rest = next;
                }
                Err(_) => {
                    faults += 1;
                    break;
                }
            }
        }
        (records, faults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use std::net::Ipv4Addr;

    fn basic_fields() -> Vec<TemplateField> {
        vec![
            TemplateField { enterprise_id: 0, element_id: 8, length: 4 },  // sourceIPv4Address
            TemplateField { enterprise_id: 0, element_id: 12, length: 4 }, // destinationIPv4Address
            TemplateField { enterprise_id: 0, element_id: 7, length: 2 },  // sourceTransportPort
            TemplateField { enterprise_id: 0, element_id: 11, length: 2 }, // destinationTransportPort
            TemplateField { enterprise_id: 0, element_id: 4, length: 1 },  // protocolIdentifier
        ]
    }

    #[test]
    fn round_trips_basic_five_tuple_record() {
        let registry = Registry::new();
        let fields = basic_fields();

        let mut record = Record::new();
        record.push(IeValue::new(
            registry.get_info_element_from_id(8, 0).unwrap().into(),
            FieldValue::Ipv4Address(Ipv4Addr::new(10, 0, 0, 1)),
        ).unwrap());
        record.push(IeValue::new(
            registry.get_info_element_from_id(12, 0).unwrap().into(),
            FieldValue::Ipv4Address(Ipv4Addr::new(10, 0, 0, 2)),
        ).unwrap());
        record.push(IeValue::new(
            registry.get_info_element_from_id(7, 0).unwrap().into(),
            FieldValue::Unsigned(1234),
        ).unwrap());
        record.push(IeValue::new(
            registry.get_info_element_from_id(11, 0).unwrap().into(),
            FieldValue::Unsigned(5678),
        ).unwrap());
        record.push(IeValue::new(
            registry.get_info_element_from_id(4, 0).unwrap().into(),
            FieldValue::Unsigned(6),
        ).unwrap());

        let bytes = record.encode().unwrap();
        let (rest, decoded) = Record::decode(&bytes, &fields, &registry).unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, record);
        assert_eq!(
            decoded.get("sourceIPv4Address"),
            Some(&FieldValue::Ipv4Address(Ipv4Addr::new(10, 0, 0, 1)))
        );
    }

    #[test]
    fn unknown_element_rejects_whole_record_but_skips_to_next() {
        let registry = Registry::new();
        let fields = vec![
            TemplateField { enterprise_id: 99, element_id: 9999, length: 4 },
            TemplateField { enterprise_id: 0, element_id: 4, length: 1 },
        ];
        let record_len = 5;
        let input = vec![0u8; record_len * 3];
        let (records, faults) = Record::decode_fixed_width_many(&input, &fields, record_len, &registry);
        assert!(records.is_empty());
        assert_eq!(faults, 3);
    }
}
