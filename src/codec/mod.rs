//! The wire codec (§3, §4.2, §4.3): information elements, values, records,
//! sets, and message framing. Stateless — it never touches a template
//! cache. The collecting process resolves [`set::RawSet::RawData`] bodies
//! against its own cache and this module's [`set::decode_data_records`].

pub mod element;
pub mod message;
pub mod record;
pub mod set;
pub mod value;

pub use element::{IeValue, OwnedInfoElement};
pub use message::{DecodedFrame, Header, Message, HEADER_LENGTH, IPFIX_VERSION};
pub use record::Record;
pub use set::{
    decode_data_records, OptionsTemplate, RawSet, Set, Template, TemplateField,
    MIN_DATA_SET_ID, OPTIONS_TEMPLATE_SET_ID, TEMPLATE_SET_ID,
};
pub use value::FieldValue;
