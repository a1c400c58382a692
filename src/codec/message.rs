//! IPFIX message framing (§3): a 16-octet header wrapping one or more sets.

use crate::error::CodecError;

use super::set::{RawSet, Set};

pub const IPFIX_VERSION: u16 = 10;
pub const HEADER_LENGTH: usize = 16;

/// The 16-octet message header (§3). All multi-octet fields are
/// big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u16,
    pub length: u16,
    pub export_time: u32,
    pub sequence_number: u32,
    pub observation_domain_id: u32,
}

impl Header {
    pub fn decode(input: &[u8]) -> Result<(&[u8], Header), CodecError> {
        if input.len() < HEADER_LENGTH {
            return Err(CodecError::TruncatedInput {
                needed: HEADER_LENGTH - input.len(),
            });
        }
        let version = u16::from_be_bytes([input[0], input[1]]);
        let length = u16::from_be_bytes([input[2], input[3]]);
        let export_time = u32::from_be_bytes([input[4], input[5], input[6], input[7]]);
        let sequence_number = u32::from_be_bytes([input[8], input[9], input[10], input[11]]);
        let observation_domain_id = u32::from_be_bytes([input[12], input[13], input[14], input[15]]);
        Ok((
            &input[HEADER_LENGTH..],
            Header {
                version,
                length,
                export_time,
                sequence_number,
                observation_domain_id,
            },
        ))
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LENGTH);
        out.extend(self.version.to_be_bytes());
        out.extend(self.length.to_be_bytes());
        out.extend(self.export_time.to_be_bytes());
        out.extend(self.sequence_number.to_be_bytes());
        out.extend(self.observation_domain_id.to_be_bytes());
        out
    }
}

/// A message ready for wire encoding: a header plus the sets it carries
/// (§3). Producers (tests, the exporting-process test helper) build these;
/// the collector never constructs one.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub export_time: u32,
    pub sequence_number: u32,
    pub observation_domain_id: u32,
    pub sets: Vec<Set>,
}

impl Message {
    pub fn new(sequence_number: u32, observation_domain_id: u32) -> Self {
        Self {
            export_time: 0,
            sequence_number,
            observation_domain_id,
            sets: Vec::new(),
        }
    }

    pub fn with_set(mut self, set: Set) -> Self {
        self.sets.push(set);
        self
    }

    /// Serializes the message, rewriting the header's total-length field
    /// on finalization (§4.2).
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut body = Vec::new();
        for set in &self.sets {
            body.extend(set.encode(false)?);
        }
        let header = Header {
            version: IPFIX_VERSION,
            length: (HEADER_LENGTH + body.len()) as u16,
            export_time: self.export_time,
            sequence_number: self.sequence_number,
            observation_domain_id: self.observation_domain_id,
        };
        let mut out = header.encode();
        out.extend(body);
        Ok(out)
    }
}

/// The result of decoding a message's header and set framing (§4.3). Data
/// sets remain [`RawSet::RawData`] until the collector resolves them
/// against its template cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub header: Header,
    pub sets: Vec<RawSet>,
}

impl DecodedFrame {
    /// Parses header + sets from a complete message buffer. Returns
    /// [`CodecError::TruncatedInput`] if fewer bytes are present than the
    /// header's length field promises; callers (the TCP connection task)
    /// use that to decide how many more bytes to read (spec §4.3).
    pub fn decode(input: &[u8]) -> Result<DecodedFrame, CodecError> {
        let (rest, header) = Header::decode(input)?;
        let body_len = (header.length as usize).saturating_sub(HEADER_LENGTH);
        if rest.len() < body_len {
            return Err(CodecError::TruncatedInput {
                needed: body_len - rest.len(),
            });
        }
        let mut body = &rest[..body_len];
        let mut sets = Vec::new();
        while !body.is_empty() {
            match RawSet::decode(body) {
                Ok((next, set)) => {
                    sets.push(set);
                    body = next;
                }
                Err(_) => break,
            }
        }
        Ok(DecodedFrame { header, sets })
    }
}
