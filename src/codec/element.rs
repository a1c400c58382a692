//! IE-with-value pairing (§3).

use crate::error::CodecError;
use crate::registry::{BorrowedElement, DataType};

use super::value::FieldValue;

/// An owned snapshot of an [`InfoElement`](crate::registry::InfoElement)'s
/// definition, carried alongside a value so a [`Record`](super::record::Record)
/// can move across the collector→aggregator channel boundary (spec §9)
/// without borrowing from the [`Registry`](crate::registry::Registry).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct OwnedInfoElement {
    pub name: String,
    pub element_id: u16,
    pub enterprise_id: u32,
    pub data_type: DataType,
    pub length: u16,
}

impl From<BorrowedElement<'_>> for OwnedInfoElement {
    fn from(ie: BorrowedElement<'_>) -> Self {
        Self {
            name: ie.name.to_string(),
            element_id: ie.element_id,
            enterprise_id: ie.enterprise_id,
            data_type: ie.data_type,
            length: ie.length,
        }
    }
}

impl OwnedInfoElement {
    pub fn as_borrowed(&self) -> BorrowedElement<'_> {
        BorrowedElement {
            name: &self.name,
            element_id: self.element_id,
            enterprise_id: self.enterprise_id,
            data_type: self.data_type,
            length: self.length,
        }
    }
}

/// A single information element paired with its value (§3). The
/// constructor fails with [`CodecError::TypeMismatch`] if the value's
/// variant doesn't match the element's declared data type.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct IeValue {
    pub element: OwnedInfoElement,
    pub value: FieldValue,
}

impl IeValue {
    pub fn new(element: OwnedInfoElement, value: FieldValue) -> Result<Self, CodecError> {
        if !value.matches(element.data_type) {
            return Err(CodecError::TypeMismatch);
        }
        Ok(Self { element, value })
    }

    pub fn name(&self) -> &str {
        &self.element.name
    }

    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        self.value.encode(&self.element.as_borrowed())
    }
}
