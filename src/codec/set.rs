//! Sets (§3): template, options-template, and data.

use crate::error::CodecError;
use crate::registry::{Registry, VARIABLE_LENGTH};

use super::record::Record;

pub const TEMPLATE_SET_ID: u16 = 2;
pub const OPTIONS_TEMPLATE_SET_ID: u16 = 3;
pub const MIN_DATA_SET_ID: u16 = 256;

const ENTERPRISE_BIT: u16 = 0x8000;

/// One (enterprise-id, element-id, length) tuple from a template record
/// (§3). `length == 0xFFFF` marks the element variable-length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateField {
    pub enterprise_id: u32,
    pub element_id: u16,
    pub length: u16,
}

impl TemplateField {
    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(8);
        if self.enterprise_id != 0 {
            out.extend((self.element_id | ENTERPRISE_BIT).to_be_bytes());
            out.extend(self.length.to_be_bytes());
            out.extend(self.enterprise_id.to_be_bytes());
        } else {
            out.extend(self.element_id.to_be_bytes());
            out.extend(self.length.to_be_bytes());
        }
        out
    }

    fn decode(input: &[u8]) -> Result<(&[u8], TemplateField), CodecError> {
        let (rest, raw_id) = take_u16(input)?;
        let (rest, length) = take_u16(rest)?;
        if raw_id & ENTERPRISE_BIT != 0 {
            let (rest, enterprise_id) = take_u32(rest)?;
            Ok((
                rest,
                TemplateField {
                    enterprise_id,
                    element_id: raw_id & !ENTERPRISE_BIT,
                    length,
                },
            ))
        } else {
            Ok((
                rest,
                TemplateField {
                    enterprise_id: 0,
                    element_id: raw_id,
                    length,
                },
            ))
        }
    }
}

fn take_u16(input: &[u8]) -> Result<(&[u8], u16), CodecError> {
    if input.len() < 2 {
        return Err(CodecError::TruncatedInput { needed: 2 - input.len() });
    }
    Ok((&input[2..], u16::from_be_bytes([input[0], input[1]])))
}

fn take_u32(input: &[u8]) -> Result<(&[u8], u32), CodecError> {
    if input.len() < 4 {
        return Err(CodecError::TruncatedInput { needed: 4 - input.len() });
    }
    Ok((&input[4..], u32::from_be_bytes([input[0], input[1], input[2], input[3]])))
}

/// A template-set record: a schema for a family of data records (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub template_id: u16,
    pub fields: Vec<TemplateField>,
}

impl Template {
    pub fn new(template_id: u16, fields: Vec<TemplateField>) -> Self {
        Self { template_id, fields }
    }

    /// Sum of fixed field lengths, or `None` if any field is variable
    /// length (spec §4.2's per-record length-prefix rule then applies
    /// per element, so records can't be skipped by a fixed stride).
    pub fn fixed_record_length(&self) -> Option<usize> {
        self.fields
            .iter()
            .try_fold(0usize, |acc, f| {
                if f.length == VARIABLE_LENGTH {
                    None
                } else {
                    Some(acc + f.length as usize)
                }
            })
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend(self.template_id.to_be_bytes());
        out.extend((self.fields.len() as u16).to_be_bytes());
        for field in &self.fields {
            out.extend(field.encode());
        }
        out
    }

    fn decode(input: &[u8]) -> Result<(&[u8], Template), CodecError> {
        let (rest, template_id) = take_u16(input)?;
        let (mut rest, field_count) = take_u16(rest)?;
        let mut fields = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            let (next, field) = TemplateField::decode(rest)?;
            fields.push(field);
            rest = next;
        }
        Ok((rest, Template { template_id, fields }))
    }
}

/// An options-template-set record: like [`Template`], with a leading scope
/// field list (§3). Scope semantics beyond the field count are treated as
/// transparent passthrough (spec §9 open question).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionsTemplate {
    pub template_id: u16,
    pub scope_fields: Vec<TemplateField>,
    pub fields: Vec<TemplateField>,
}

impl OptionsTemplate {
    /// All fields in wire order: scope fields first, then the rest. This
    /// is what a data set record under this template is actually laid out
    /// as.
    pub fn all_fields(&self) -> Vec<TemplateField> {
        let mut all = self.scope_fields.clone();
        all.extend(self.fields.clone());
        all
    }

    pub fn fixed_record_length(&self) -> Option<usize> {
        self.all_fields().iter().try_fold(0usize, |acc, f| {
            if f.length == VARIABLE_LENGTH {
                None
            } else {
                Some(acc + f.length as usize)
            }
        })
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend(self.template_id.to_be_bytes());
        let field_count = (self.scope_fields.len() + self.fields.len()) as u16;
        out.extend(field_count.to_be_bytes());
        out.extend((self.scope_fields.len() as u16).to_be_bytes());
        for field in &self.scope_fields {
            out.extend(field.encode());
        }
        for field in &self.fields {
            out.extend(field.encode());
        }
        out
    }

    fn decode(input: &[u8]) -> Result<(&[u8], OptionsTemplate), CodecError> {
        let (rest, template_id) = take_u16(input)?;
        let (rest, field_count) = take_u16(rest)?;
        let (mut rest, scope_field_count) = take_u16(rest)?;
        let mut scope_fields = Vec::with_capacity(scope_field_count as usize);
        for _ in 0..scope_field_count {
            let (next, field) = TemplateField::decode(rest)?;
            scope_fields.push(field);
            rest = next;
        }
        let remaining_count = field_count.saturating_sub(scope_field_count);
        let mut fields = Vec::with_capacity(remaining_count as usize);
        for _ in 0..remaining_count {
            let (next, field) = TemplateField::decode(rest)?;
            fields.push(field);
            rest = next;
        }
        Ok((
            rest,
            OptionsTemplate {
                template_id,
                scope_fields,
                fields,
            },
        ))
    }
}

/// A set ready for wire encoding (§3). The producer supplies already-built
/// [`Record`]s for data sets; there is no cache involved on the encode
/// path.
#[derive(Debug, Clone, PartialEq)]
pub enum Set {
    Template(Vec<Template>),
    OptionsTemplate(Vec<OptionsTemplate>),
    Data { set_id: u16, records: Vec<Record> },
}

impl Set {
    pub fn set_id(&self) -> u16 {
        match self {
            Set::Template(_) => TEMPLATE_SET_ID,
            Set::OptionsTemplate(_) => OPTIONS_TEMPLATE_SET_ID,
            Set::Data { set_id, .. } => *set_id,
        }
    }

    /// Serializes the set including its 4-octet header. Padding to a
    /// 4-octet boundary only happens when `pad` is `true` (spec §4.2).
    pub fn encode(&self, pad: bool) -> Result<Vec<u8>, CodecError> {
        let mut body = Vec::new();
        match self {
            Set::Template(templates) => {
                for t in templates {
                    body.extend(t.encode());
                }
            }
            Set::OptionsTemplate(templates) => {
                for t in templates {
                    body.extend(t.encode());
                }
            }
            Set::Data { records, .. } => {
                for r in records {
                    body.extend(r.encode()?);
                }
            }
        }
        let mut length = 4 + body.len();
        if pad && length % 4 != 0 {
            let padding = 4 - (length % 4);
            body.resize(body.len() + padding, 0);
            length += padding;
        }
        let mut out = Vec::with_capacity(length);
        out.extend(self.set_id().to_be_bytes());
        out.extend((length as u16).to_be_bytes());
        out.extend(body);
        Ok(out)
    }
}

/// The result of decoding one set from the wire (§4.3). Data sets are left
/// as raw bytes here: resolving them into [`Record`]s requires the
/// collector's per-exporter template cache, which the codec does not own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSet {
    Template(Vec<Template>),
    OptionsTemplate(Vec<OptionsTemplate>),
    RawData { set_id: u16, body: Vec<u8> },
}

impl RawSet {
    /// Decodes one set's header and body from `input`, returning the
    /// unconsumed remainder of the message.
    pub fn decode(input: &[u8]) -> Result<(&[u8], RawSet), CodecError> {
        let (rest, set_id) = take_u16(input)?;
        let (rest, length) = take_u16(rest)?;
        let body_len = (length as usize).checked_sub(4).ok_or(CodecError::TruncatedInput { needed: 4 })?;
        if rest.len() < body_len {
            return Err(CodecError::TruncatedInput {
                needed: body_len - rest.len(),
            });
        }
        let (body, tail) = rest.split_at(body_len);
        let set = match set_id {
            TEMPLATE_SET_ID => RawSet::Template(decode_many(body, Template::decode)),
            OPTIONS_TEMPLATE_SET_ID => {
                RawSet::OptionsTemplate(decode_many(body, OptionsTemplate::decode))
            }
            _ => RawSet::RawData {
                set_id,
                body: body.to_vec(),
            },
        };
        Ok((tail, set))
    }
}

/// Decodes as many template/options-template records as fit the set body,
/// stopping (not erroring) once fewer than 4 octets remain — the
/// remainder is padding (spec §4.2 allows callers to pad sets to a 4-octet
/// boundary).
fn decode_many<'a, T>(
    mut body: &'a [u8],
    decode_one: impl Fn(&'a [u8]) -> Result<(&'a [u8], T), CodecError>,
) -> Vec<T> {
    let mut out = Vec::new();
    while body.len() >= 4 {
        match decode_one(body) {
            Ok((rest, item)) => {
                out.push(item);
                body = rest;
            }
            Err(_) => break,
        }
    }
    out
}

/// Resolves a raw data set's body into decoded [`Record`]s given the live
/// template for its set-id (spec §4.3's decoding algorithm).
pub fn decode_data_records(
    body: &[u8],
    template_fields: &[TemplateField],
    fixed_record_length: Option<usize>,
    registry: &Registry,
) -> (Vec<Record>, usize) {
    match fixed_record_length {
        Some(len) if len > 0 => Record::decode_fixed_width_many(body, template_fields, len, registry),
        _ => Record::decode_variable_width_many(body, template_fields, registry),
    }
}
