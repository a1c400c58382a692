//! Typed values and the element encode/decode rules of spec §4.2.
//!
//! One enum variant per [`DataType`], matching the teacher's preference
//! (spec §9 design note, echoed from the teacher's own `FieldValue`/
//! `DataNumber` split) for a tagged variant over runtime reflection. Unlike
//! the teacher, a single variant here can back several [`DataType`]s of the
//! same wire width (e.g. `Unsigned` backs `Unsigned8/16/32/64`), since the
//! element's declared length — not the Rust type — determines wire width.

use crate::error::CodecError;
use crate::registry::{BorrowedElement, DataType, VARIABLE_LENGTH};

use nom::bytes::complete::take;
use nom::number::complete::{
    be_f32, be_f64, be_i16, be_i32, be_i64, be_i8, be_u16, be_u32, be_u64, be_u8,
};
use std::net::{Ipv4Addr, Ipv6Addr};

/// A decoded or to-be-encoded information element value (§3's
/// "IE-with-value", minus the element definition itself — see
/// [`crate::codec::element::IeValue`] for the pairing).
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum FieldValue {
    Unsigned(u64),
    Signed(i64),
    Float32(f32),
    Float64(f64),
    Boolean(bool),
    MacAddress([u8; 6]),
    OctetArray(Vec<u8>),
    String(String),
    /// Octets since the Unix epoch, in the unit named by the element's
    /// `DateTime*` data type.
    DateTime(u64),
    Ipv4Address(Ipv4Addr),
    Ipv6Address(Ipv6Addr),
    /// RFC 6313 lists are carried opaquely (spec §4.2): the nested
    /// sub-records are not interpreted, only their raw bytes preserved.
    BasicList(Vec<u8>),
    SubTemplateList(Vec<u8>),
    SubTemplateMultiList(Vec<u8>),
}

impl FieldValue {
    /// The [`DataType`] this value's variant is allowed to pair with.
    /// `IeValue::new` uses this to reject mismatched constructions (§3).
    pub fn matches(&self, data_type: DataType) -> bool {
        use DataType::*;
        matches!(
            (self, data_type),
            (FieldValue::Unsigned(_), Unsigned8 | Unsigned16 | Unsigned32 | Unsigned64)
                | (FieldValue::Signed(_), Signed8 | Signed16 | Signed32 | Signed64)
                | (FieldValue::Float32(_), Float32)
                | (FieldValue::Float64(_), Float64)
                | (FieldValue::Boolean(_), Boolean)
                | (FieldValue::MacAddress(_), MacAddress)
                | (FieldValue::OctetArray(_), OctetArray)
                | (FieldValue::String(_), String)
                | (
                    FieldValue::DateTime(_),
                    DateTimeSeconds | DateTimeMilliseconds | DateTimeMicroseconds | DateTimeNanoseconds
                )
                | (FieldValue::Ipv4Address(_), Ipv4Address)
                | (FieldValue::Ipv6Address(_), Ipv6Address)
                | (FieldValue::BasicList(_), BasicList)
                | (FieldValue::SubTemplateList(_), SubTemplateList)
                | (FieldValue::SubTemplateMultiList(_), SubTemplateMultiList)
        )
    }

    /// Treats the value as a display string, used for flow-key and
    /// correlate-field extraction (spec §3, §4.4) where fields are
    /// compared/copied by value regardless of their underlying wire type.
    pub fn as_display_string(&self) -> String {
        match self {
            FieldValue::Unsigned(v) => v.to_string(),
            FieldValue::Signed(v) => v.to_string(),
            FieldValue::Float32(v) => v.to_string(),
            FieldValue::Float64(v) => v.to_string(),
            FieldValue::Boolean(v) => v.to_string(),
            FieldValue::MacAddress(m) => format_mac(m),
            FieldValue::OctetArray(v) => hex_string(v),
            FieldValue::String(s) => s.clone(),
            FieldValue::DateTime(v) => v.to_string(),
            FieldValue::Ipv4Address(ip) => ip.to_string(),
            FieldValue::Ipv6Address(ip) => ip.to_string(),
            FieldValue::BasicList(v) | FieldValue::SubTemplateList(v) | FieldValue::SubTemplateMultiList(v) => {
                hex_string(v)
            }
        }
    }

    /// `true` for the zero/empty value of this variant's type — used by
    /// the aggregator to decide whether a correlate field is "non-empty"
    /// (spec §4.4 step 2).
    pub fn is_empty_value(&self) -> bool {
        match self {
            FieldValue::Unsigned(0) | FieldValue::Signed(0) => true,
            FieldValue::String(s) => s.is_empty(),
            FieldValue::OctetArray(v)
            | FieldValue::BasicList(v)
            | FieldValue::SubTemplateList(v)
            | FieldValue::SubTemplateMultiList(v) => v.is_empty(),
            _ => false,
        }
    }

    /// Decodes a value of `data_type` from `input`, consuming exactly
    /// `length` octets for fixed-length elements, or the prefix-governed
    /// span for variable-length ones (§4.2).
    pub fn decode(input: &[u8], data_type: DataType, length: u16) -> Result<(&[u8], FieldValue), CodecError> {
        if length == VARIABLE_LENGTH {
            return decode_variable(input, data_type);
        }
        let (rest, payload) = take_n(input, length as usize)?;
        let value = decode_fixed(payload, data_type, length)?;
        Ok((rest, value))
    }

    /// Encodes this value for `ie`, failing with [`CodecError::LengthOverflow`]
    /// if it cannot fit the element's declared length.
    pub fn encode(&self, ie: &BorrowedElement<'_>) -> Result<Vec<u8>, CodecError> {
        if !self.matches(ie.data_type) {
            return Err(CodecError::TypeMismatch);
        }
        if ie.length == VARIABLE_LENGTH {
            return encode_variable(self);
        }
        let bytes = encode_fixed(self, ie.length)?;
        if bytes.len() != ie.length as usize {
            return Err(CodecError::LengthOverflow {
                actual: bytes.len(),
                max: ie.length as usize,
            });
        }
        Ok(bytes)
    }
}

fn take_n(input: &[u8], n: usize) -> Result<(&[u8], &[u8]), CodecError> {
    if input.len() < n {
        return Err(CodecError::TruncatedInput {
            needed: n - input.len(),
        });
    }
    Ok((&input[n..], &input[..n]))
}

fn decode_fixed(payload: &[u8], data_type: DataType, length: u16) -> Result<FieldValue, CodecError> {
    use DataType::*;
    let trunc = |_| CodecError::TruncatedInput { needed: 0 };
    match data_type {
        Unsigned8 | Unsigned16 | Unsigned32 | Unsigned64 => {
            Ok(FieldValue::Unsigned(decode_unsigned(payload, length)?))
        }
        Signed8 | Signed16 | Signed32 | Signed64 => {
            Ok(FieldValue::Signed(decode_signed(payload, length)?))
        }
        Float32 => {
            let (_, v) = be_f32::<_, nom::error::Error<&[u8]>>(payload).map_err(trunc)?;
            Ok(FieldValue::Float32(v))
        }
        Float64 => {
            let (_, v) = be_f64::<_, nom::error::Error<&[u8]>>(payload).map_err(trunc)?;
            Ok(FieldValue::Float64(v))
        }
        Boolean => {
            let (_, v) = be_u8::<_, nom::error::Error<&[u8]>>(payload).map_err(trunc)?;
            // RFC 7011 §6.1.5: 1 = true, 2 = false.
            Ok(FieldValue::Boolean(v == 1))
        }
        MacAddress => {
            if payload.len() < 6 {
                return Err(CodecError::TruncatedInput { needed: 6 - payload.len() });
            }
            let mut mac = [0u8; 6];
            mac.copy_from_slice(&payload[..6]);
            Ok(FieldValue::MacAddress(mac))
        }
        OctetArray => Ok(FieldValue::OctetArray(payload.to_vec())),
        String => {
            let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
            Ok(FieldValue::String(String::from_utf8_lossy(&payload[..end]).into_owned()))
        }
        DateTimeSeconds | DateTimeMilliseconds | DateTimeMicroseconds | DateTimeNanoseconds => {
            Ok(FieldValue::DateTime(decode_unsigned(payload, length)?))
        }
        Ipv4Address => {
            let (_, v) = be_u32::<_, nom::error::Error<&[u8]>>(payload).map_err(trunc)?;
            Ok(FieldValue::Ipv4Address(Ipv4Addr::from(v)))
        }
        Ipv6Address => {
            if payload.len() < 16 {
                return Err(CodecError::TruncatedInput { needed: 16 - payload.len() });
            }
            let mut octets = [0u8; 16];
            octets.copy_from_slice(&payload[..16]);
            Ok(FieldValue::Ipv6Address(Ipv6Addr::from(octets)))
        }
        BasicList => Ok(FieldValue::BasicList(payload.to_vec())),
        SubTemplateList => Ok(FieldValue::SubTemplateList(payload.to_vec())),
        SubTemplateMultiList => Ok(FieldValue::SubTemplateMultiList(payload.to_vec())),
    }
}

fn decode_unsigned(payload: &[u8], length: u16) -> Result<u64, CodecError> {
    let trunc = |_| CodecError::TruncatedInput { needed: 0 };
    Ok(match length {
        1 => be_u8::<_, nom::error::Error<&[u8]>>(payload).map_err(trunc)?.1 as u64,
        2 => be_u16::<_, nom::error::Error<&[u8]>>(payload).map_err(trunc)?.1 as u64,
        4 => be_u32::<_, nom::error::Error<&[u8]>>(payload).map_err(trunc)?.1 as u64,
        8 => be_u64::<_, nom::error::Error<&[u8]>>(payload).map_err(trunc)?.1,
        _ => return Err(CodecError::TypeMismatch),
    })
}

fn decode_signed(payload: &[u8], length: u16) -> Result<i64, CodecError> {
    let trunc = |_| CodecError::TruncatedInput { needed: 0 };
    Ok(match length {
        1 => be_i8::<_, nom::error::Error<&[u8]>>(payload).map_err(trunc)?.1 as i64,
        2 => be_i16::<_, nom::error::Error<&[u8]>>(payload).map_err(trunc)?.1 as i64,
        4 => be_i32::<_, nom::error::Error<&[u8]>>(payload).map_err(trunc)?.1 as i64,
        8 => be_i64::<_, nom::error::Error<&[u8]>>(payload).map_err(trunc)?.1,
        _ => return Err(CodecError::TypeMismatch),
    })
}

fn decode_variable(input: &[u8], data_type: DataType) -> Result<(&[u8], FieldValue), CodecError> {
    let (rest, len) = take_n(input, 1)?;
    let first = len[0];
    let (rest, length) = if first == 0xFF {
        let (rest, len_bytes) = take_n(rest, 2)?;
        (rest, u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize)
    } else {
        (rest, first as usize)
    };
    let (rest, payload) = take_n(rest, length)?;
    let value = decode_fixed(payload, data_type, length.min(u16::MAX as usize) as u16)?;
    Ok((rest, value))
}

fn encode_fixed(value: &FieldValue, length: u16) -> Result<Vec<u8>, CodecError> {
    Ok(match value {
        FieldValue::Unsigned(v) | FieldValue::DateTime(v) => encode_unsigned(*v, length)?,
        FieldValue::Signed(v) => encode_signed(*v, length)?,
        FieldValue::Float32(v) => v.to_be_bytes().to_vec(),
        FieldValue::Float64(v) => v.to_be_bytes().to_vec(),
        FieldValue::Boolean(v) => vec![if *v { 1 } else { 2 }],
        FieldValue::MacAddress(m) => m.to_vec(),
        FieldValue::OctetArray(v) => pad_to(v, length as usize),
        FieldValue::String(s) => pad_to(s.as_bytes(), length as usize),
        FieldValue::Ipv4Address(ip) => ip.octets().to_vec(),
        FieldValue::Ipv6Address(ip) => ip.octets().to_vec(),
        FieldValue::BasicList(v) | FieldValue::SubTemplateList(v) | FieldValue::SubTemplateMultiList(v) => {
            v.clone()
        }
    })
}

fn encode_variable(value: &FieldValue) -> Result<Vec<u8>, CodecError> {
    let payload = match value {
        FieldValue::String(s) => s.as_bytes().to_vec(),
        FieldValue::OctetArray(v)
        | FieldValue::BasicList(v)
        | FieldValue::SubTemplateList(v)
        | FieldValue::SubTemplateMultiList(v) => v.clone(),
        _ => return Err(CodecError::TypeMismatch),
    };
    let mut out = Vec::with_capacity(payload.len() + 3);
    if payload.len() < 255 {
        out.push(payload.len() as u8);
    } else {
        out.push(0xFF);
        out.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    }
    out.extend(payload);
    Ok(out)
}

fn encode_unsigned(v: u64, length: u16) -> Result<Vec<u8>, CodecError> {
    let overflow = || CodecError::LengthOverflow {
        actual: (64 - v.leading_zeros()).div_ceil(8) as usize,
        max: length as usize,
    };
    Ok(match length {
        1 => vec![u8::try_from(v).map_err(|_| overflow())?],
        2 => u16::try_from(v).map_err(|_| overflow())?.to_be_bytes().to_vec(),
        4 => u32::try_from(v).map_err(|_| overflow())?.to_be_bytes().to_vec(),
        8 => v.to_be_bytes().to_vec(),
        _ => return Err(CodecError::TypeMismatch),
    })
}

fn encode_signed(v: i64, length: u16) -> Result<Vec<u8>, CodecError> {
    let overflow = || CodecError::LengthOverflow {
        actual: length as usize + 1,
        max: length as usize,
    };
    Ok(match length {
        1 => vec![i8::try_from(v).map_err(|_| overflow())? as u8],
        2 => i16::try_from(v).map_err(|_| overflow())?.to_be_bytes().to_vec(),
        4 => i32::try_from(v).map_err(|_| overflow())?.to_be_bytes().to_vec(),
        8 => v.to_be_bytes().to_vec(),
        _ => return Err(CodecError::TypeMismatch),
    })
}

fn pad_to(bytes: &[u8], length: usize) -> Vec<u8> {
    let mut out = bytes.to_vec();
    out.resize(length, 0);
    out
}

fn format_mac(mac: &[u8; 6]) -> String {
    mac.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    #[test]
    fn round_trips_fixed_width_unsigned() {
        let registry = Registry::new();
        let ie = registry.get_info_element("packetTotalCount", 0).unwrap();
        let value = FieldValue::Unsigned(1000);
        let bytes = value.encode(&ie).unwrap();
        assert_eq!(bytes.len(), 8);
        let (rest, decoded) = FieldValue::decode(&bytes, ie.data_type, ie.length).unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, value);
    }

    #[test]
    fn round_trips_ipv4() {
        let registry = Registry::new();
        let ie = registry.get_info_element("sourceIPv4Address", 0).unwrap();
        let value = FieldValue::Ipv4Address(Ipv4Addr::new(10, 0, 0, 1));
        let bytes = value.encode(&ie).unwrap();
        let (_, decoded) = FieldValue::decode(&bytes, ie.data_type, ie.length).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn variable_length_short_form_round_trips() {
        let value = FieldValue::String("pod1".to_string());
        let bytes = encode_variable(&value).unwrap();
        assert_eq!(bytes[0], 4);
        let (rest, decoded) = decode_variable(&bytes, DataType::String).unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, value);
    }

    #[test]
    fn variable_length_long_form_used_past_254_octets() {
        let value = FieldValue::OctetArray(vec![7u8; 300]);
        let bytes = encode_variable(&value).unwrap();
        assert_eq!(bytes[0], 0xFF);
        assert_eq!(u16::from_be_bytes([bytes[1], bytes[2]]), 300);
        let (rest, decoded) = decode_variable(&bytes, DataType::OctetArray).unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, value);
    }

    #[test]
    fn length_overflow_is_rejected() {
        let registry = Registry::new();
        let ie = registry.get_info_element("protocolIdentifier", 0).unwrap();
        let value = FieldValue::Unsigned(9999);
        assert_eq!(
            value.encode(&ie),
            Err(CodecError::LengthOverflow { actual: 2, max: 1 })
        );
        let value = FieldValue::Unsigned(6);
        assert!(value.encode(&ie).is_ok());
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let registry = Registry::new();
        let ie = registry.get_info_element("sourceIPv4Address", 0).unwrap();
        let value = FieldValue::Unsigned(42);
        assert_eq!(value.encode(&ie), Err(CodecError::TypeMismatch));
    }

    #[test]
    fn boolean_uses_rfc_1_2_encoding() {
        let bytes = encode_fixed(&FieldValue::Boolean(true), 1).unwrap();
        assert_eq!(bytes, vec![1]);
        let bytes = encode_fixed(&FieldValue::Boolean(false), 1).unwrap();
        assert_eq!(bytes, vec![2]);
    }
}
