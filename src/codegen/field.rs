//! FieldInfo structure and serialization

use super::attribute::{read_attributes, write_attributes, AttributeInfo};
use super::error::ClassFormatResult;
use super::reader::ByteReader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<AttributeInfo>,
}

impl FieldInfo {
    pub fn new(access_flags: u16, name_index: u16, descriptor_index: u16) -> Self {
        Self { access_flags, name_index, descriptor_index, attributes: Vec::new() }
    }

    pub fn write_to(&self, bytes: &mut Vec<u8>) {
        bytes.extend_from_slice(&self.access_flags.to_be_bytes());
        bytes.extend_from_slice(&self.name_index.to_be_bytes());
        bytes.extend_from_slice(&self.descriptor_index.to_be_bytes());
        write_attributes(&self.attributes, bytes);
    }

    pub(crate) fn read(reader: &mut ByteReader<'_>) -> ClassFormatResult<Self> {
        Ok(Self {
            access_flags: reader.u16()?,
            name_index: reader.u16()?,
            descriptor_index: reader.u16()?,
            attributes: read_attributes(reader)?,
        })
    }
}
