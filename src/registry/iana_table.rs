//! Embedded IANA element-definitions table (spec §6: "the static element
//! table is loaded from an embedded resource at init"). This is the "opaque
//! resource loaded at startup" the spec treats as an external collaborator;
//! it is kept to the elements this pipeline actually touches (flow-key
//! fields, the correlation-law fixture fields, and a representative spread
//! of the other IANA data types) rather than a full mirror of the IANA
//! IPFIX entities registry, which the teacher's own
//! (unretrieved-in-this-pack) `ipfix_lookup` module would otherwise carry
//! in full.
//!
//! `reversePacketTotalCount`/`reversePacketDeltaCount` follow RFC 5103: the
//! reverse half of a bidirectional element shares the forward element's id
//! under the reverse-information-element enterprise number 29305.

use super::{DataType, InfoElement};

/// RFC 5103 Reverse Information Element enterprise number.
pub const REVERSE_ENTERPRISE_ID: u32 = 29305;

pub static IANA_ELEMENTS: &[InfoElement] = &[
    InfoElement::new("octetDeltaCount", 1, 0, DataType::Unsigned64, 8),
    InfoElement::new("packetDeltaCount", 2, 0, DataType::Unsigned64, 8),
    InfoElement::new("deltaFlowCount", 3, 0, DataType::Unsigned64, 8),
    InfoElement::new("protocolIdentifier", 4, 0, DataType::Unsigned8, 1),
    InfoElement::new("ipClassOfService", 5, 0, DataType::Unsigned8, 1),
    InfoElement::new("tcpControlBits", 6, 0, DataType::Unsigned8, 1),
    InfoElement::new("sourceTransportPort", 7, 0, DataType::Unsigned16, 2),
    InfoElement::new("sourceIPv4Address", 8, 0, DataType::Ipv4Address, 4),
    InfoElement::new("sourceIPv4PrefixLength", 9, 0, DataType::Unsigned8, 1),
    InfoElement::new("ingressInterface", 10, 0, DataType::Unsigned32, 4),
    InfoElement::new("destinationTransportPort", 11, 0, DataType::Unsigned16, 2),
    InfoElement::new("destinationIPv4Address", 12, 0, DataType::Ipv4Address, 4),
    InfoElement::new("destinationIPv4PrefixLength", 13, 0, DataType::Unsigned8, 1),
    InfoElement::new("egressInterface", 14, 0, DataType::Unsigned32, 4),
    InfoElement::new("ipNextHopIPv4Address", 15, 0, DataType::Ipv4Address, 4),
    InfoElement::new("bgpSourceAsNumber", 16, 0, DataType::Unsigned32, 4),
    InfoElement::new("bgpDestinationAsNumber", 17, 0, DataType::Unsigned32, 4),
    InfoElement::new("postOctetDeltaCount", 23, 0, DataType::Unsigned64, 8),
    InfoElement::new("postPacketDeltaCount", 24, 0, DataType::Unsigned64, 8),
    InfoElement::new("sourceIPv6Address", 27, 0, DataType::Ipv6Address, 16),
    InfoElement::new("destinationIPv6Address", 28, 0, DataType::Ipv6Address, 16),
    InfoElement::new("icmpTypeCodeIPv4", 32, 0, DataType::Unsigned16, 2),
    InfoElement::new("minimumTTL", 52, 0, DataType::Unsigned8, 1),
    InfoElement::new("maximumTTL", 53, 0, DataType::Unsigned8, 1),
    InfoElement::new("sourceMacAddress", 56, 0, DataType::MacAddress, 6),
    InfoElement::new("vlanId", 58, 0, DataType::Unsigned16, 2),
    InfoElement::new("ipVersion", 60, 0, DataType::Unsigned8, 1),
    InfoElement::new("flowDirection", 61, 0, DataType::Unsigned8, 1),
    InfoElement::new("ipNextHopIPv6Address", 62, 0, DataType::Ipv6Address, 16),
    InfoElement::new("destinationMacAddress", 80, 0, DataType::MacAddress, 6),
    InfoElement::new("octetTotalCount", 85, 0, DataType::Unsigned64, 8),
    InfoElement::new("packetTotalCount", 86, 0, DataType::Unsigned64, 8),
    InfoElement::new("fragmentFlags", 88, 0, DataType::Unsigned8, 1),
    InfoElement::new(
        "applicationDescription",
        94,
        0,
        DataType::String,
        super::VARIABLE_LENGTH,
    ),
    InfoElement::new(
        "applicationId",
        95,
        0,
        DataType::OctetArray,
        super::VARIABLE_LENGTH,
    ),
    InfoElement::new("flowEndReason", 136, 0, DataType::Unsigned8, 1),
    InfoElement::new("observationPointId", 138, 0, DataType::Unsigned64, 8),
    InfoElement::new("flowStartSeconds", 150, 0, DataType::DateTimeSeconds, 4),
    InfoElement::new("flowEndSeconds", 151, 0, DataType::DateTimeSeconds, 4),
    InfoElement::new(
        "flowStartMilliseconds",
        152,
        0,
        DataType::DateTimeMilliseconds,
        8,
    ),
    InfoElement::new(
        "flowEndMilliseconds",
        153,
        0,
        DataType::DateTimeMilliseconds,
        8,
    ),
    InfoElement::new(
        "flowStartMicroseconds",
        154,
        0,
        DataType::DateTimeMicroseconds,
        8,
    ),
    InfoElement::new(
        "flowEndMicroseconds",
        155,
        0,
        DataType::DateTimeMicroseconds,
        8,
    ),
    InfoElement::new(
        "flowStartNanoseconds",
        156,
        0,
        DataType::DateTimeNanoseconds,
        8,
    ),
    InfoElement::new(
        "flowEndNanoseconds",
        157,
        0,
        DataType::DateTimeNanoseconds,
        8,
    ),
    InfoElement::new(
        "postNATSourceIPv4Address",
        225,
        0,
        DataType::Ipv4Address,
        4,
    ),
    InfoElement::new(
        "postNATDestinationIPv4Address",
        226,
        0,
        DataType::Ipv4Address,
        4,
    ),
    InfoElement::new("firewallEvent", 233, 0, DataType::Unsigned8, 1),
    InfoElement::new("biflowDirection", 239, 0, DataType::Unsigned8, 1),
    InfoElement::new("paddingOctets", 210, 0, DataType::OctetArray, super::VARIABLE_LENGTH),
    InfoElement::new("basicList", 291, 0, DataType::BasicList, super::VARIABLE_LENGTH),
    InfoElement::new(
        "subTemplateList",
        292,
        0,
        DataType::SubTemplateList,
        super::VARIABLE_LENGTH,
    ),
    InfoElement::new(
        "subTemplateMultiList",
        293,
        0,
        DataType::SubTemplateMultiList,
        super::VARIABLE_LENGTH,
    ),
    // RFC 5103 reverse counterparts of the flow statistics used by the
    // aggregator's Total/Delta merge law (spec §4.4, §8 scenario 2).
    InfoElement::new(
        "reversePacketTotalCount",
        86,
        REVERSE_ENTERPRISE_ID,
        DataType::Unsigned64,
        8,
    ),
    InfoElement::new(
        "reversePacketDeltaCount",
        2,
        REVERSE_ENTERPRISE_ID,
        DataType::Unsigned64,
        8,
    ),
    InfoElement::new(
        "reverseOctetTotalCount",
        85,
        REVERSE_ENTERPRISE_ID,
        DataType::Unsigned64,
        8,
    ),
    InfoElement::new(
        "reverseOctetDeltaCount",
        1,
        REVERSE_ENTERPRISE_ID,
        DataType::Unsigned64,
        8,
    ),
];
