//! Information Element Registry (§4.1).
//!
//! Loads the IANA element table at construction and accepts additional
//! enterprise definitions registered before the collector/aggregator start.
//! Lookups are read-only after that: no locking on the fast path, matching
//! spec §4.1 ("no locking is required on the fast path").
//!
//! The shape mirrors the teacher crate's split between a compiled-in lookup
//! table (`ipfix_lookup`-style modules) and a programmatic
//! `EnterpriseFieldRegistry` for vendor extensions, except here an element's
//! identity is *data* (an [`InfoElement`] value) rather than a Rust enum
//! variant, since the spec requires name/id/enterprise/type/length to be
//! resolved at runtime.

mod enterprise;
mod iana_table;

pub use enterprise::EnterpriseFieldDef;

use crate::error::RegistryError;
use std::collections::HashMap;

/// The wire data type carried by an information element (§3, §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum DataType {
    Unsigned8,
    Unsigned16,
    Unsigned32,
    Unsigned64,
    Signed8,
    Signed16,
    Signed32,
    Signed64,
    Float32,
    Float64,
    Boolean,
    MacAddress,
    OctetArray,
    String,
    DateTimeSeconds,
    DateTimeMilliseconds,
    DateTimeMicroseconds,
    DateTimeNanoseconds,
    Ipv4Address,
    Ipv6Address,
    BasicList,
    SubTemplateList,
    SubTemplateMultiList,
}

/// Sentinel IE length meaning "variable", decoded with the length-prefix
/// rule in spec §4.2.
pub const VARIABLE_LENGTH: u16 = 0xFFFF;

/// An immutable information element definition (§3). Once registered, a
/// definition never changes; the registry only ever adds new ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoElement {
    pub name: &'static str,
    pub element_id: u16,
    pub enterprise_id: u32,
    pub data_type: DataType,
    pub length: u16,
}

impl InfoElement {
    pub const fn new(
        name: &'static str,
        element_id: u16,
        enterprise_id: u32,
        data_type: DataType,
        length: u16,
    ) -> Self {
        Self {
            name,
            element_id,
            enterprise_id,
            data_type,
            length,
        }
    }

    pub fn is_variable_length(&self) -> bool {
        self.length == VARIABLE_LENGTH
    }
}

/// An owned, runtime-registrable counterpart to the `const` IANA entries,
/// used for enterprise extensions supplied at init (see [`EnterpriseFieldDef`]).
#[derive(Debug, Clone, PartialEq, Eq)]
struct OwnedElement {
    name: String,
    element_id: u16,
    enterprise_id: u32,
    data_type: DataType,
    length: u16,
}

impl OwnedElement {
    fn as_borrowed(&self) -> BorrowedElement<'_> {
        BorrowedElement {
            name: &self.name,
            element_id: self.element_id,
            enterprise_id: self.enterprise_id,
            data_type: self.data_type,
            length: self.length,
        }
    }
}

/// A resolved element, either a `'static` IANA entry or an owned enterprise
/// one. Lookups return this rather than `&InfoElement` so both sources can
/// be returned uniformly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowedElement<'a> {
    pub name: &'a str,
    pub element_id: u16,
    pub enterprise_id: u32,
    pub data_type: DataType,
    pub length: u16,
}

impl<'a> From<&'a InfoElement> for BorrowedElement<'a> {
    fn from(ie: &'a InfoElement) -> Self {
        Self {
            name: ie.name,
            element_id: ie.element_id,
            enterprise_id: ie.enterprise_id,
            data_type: ie.data_type,
            length: ie.length,
        }
    }
}

/// Read-only-after-init information element registry (§4.1, §6).
#[derive(Debug, Clone)]
pub struct Registry {
    by_id: HashMap<(u16, u32), &'static InfoElement>,
    by_name: HashMap<(&'static str, u32), &'static InfoElement>,
    enterprise_by_id: HashMap<(u16, u32), OwnedElement>,
    enterprise_by_name: HashMap<(String, u32), OwnedElement>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Loads the embedded IANA element table. Enterprise extensions can
    /// still be registered afterward with [`Registry::register_enterprise`].
    pub fn new() -> Self {
        let mut by_id = HashMap::with_capacity(iana_table::IANA_ELEMENTS.len());
        let mut by_name = HashMap::with_capacity(iana_table::IANA_ELEMENTS.len());
        for ie in iana_table::IANA_ELEMENTS.iter() {
            by_id.insert((ie.element_id, ie.enterprise_id), ie);
            by_name.insert((ie.name, ie.enterprise_id), ie);
        }
        Self {
            by_id,
            by_name,
            enterprise_by_id: HashMap::new(),
            enterprise_by_name: HashMap::new(),
        }
    }

    /// Registers an enterprise (vendor) extension. Intended to be called
    /// before `Start()` on the owning component (spec §6).
    pub fn register_enterprise(&mut self, def: EnterpriseFieldDef) {
        let owned = OwnedElement {
            name: def.name.clone(),
            element_id: def.element_id,
            enterprise_id: def.enterprise_id,
            data_type: def.data_type,
            length: def.length,
        };
        self.enterprise_by_id
            .insert((owned.element_id, owned.enterprise_id), owned.clone());
        self.enterprise_by_name
            .insert((owned.name.clone(), owned.enterprise_id), owned);
    }

    pub fn register_many_enterprise(&mut self, defs: impl IntoIterator<Item = EnterpriseFieldDef>) {
        for def in defs {
            self.register_enterprise(def);
        }
    }

    /// `GetInfoElement(name, enterpriseID)` (§4.1).
    pub fn get_info_element(
        &self,
        name: &str,
        enterprise_id: u32,
    ) -> Result<BorrowedElement<'_>, RegistryError> {
        if let Some(ie) = self.by_name.get(&(name, enterprise_id)) {
            return Ok((*ie).into());
        }
        if let Some(owned) = self.enterprise_by_name.get(&(name.to_string(), enterprise_id)) {
            return Ok(owned.as_borrowed());
        }
        Err(RegistryError::NotFoundByName(name.to_string()))
    }

    /// `GetInfoElementFromID(elementID, enterpriseID)` (§4.1).
    pub fn get_info_element_from_id(
        &self,
        element_id: u16,
        enterprise_id: u32,
    ) -> Result<BorrowedElement<'_>, RegistryError> {
        if let Some(ie) = self.by_id.get(&(element_id, enterprise_id)) {
            return Ok((*ie).into());
        }
        if let Some(owned) = self.enterprise_by_id.get(&(element_id, enterprise_id)) {
            return Ok(owned.as_borrowed());
        }
        Err(RegistryError::NotFoundById {
            element_id,
            enterprise_id,
        })
    }

    pub fn len(&self) -> usize {
        self.by_id.len() + self.enterprise_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
