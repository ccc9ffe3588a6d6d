//! MethodInfo structure, serialization and Code attribute access

use super::attribute::{read_attributes, write_attributes, AttributeInfo, CodeAttribute};
use super::constpool::ConstantPool;
use super::defs::attribute_names;
use super::error::ClassFormatResult;
use super::reader::ByteReader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    pub access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<AttributeInfo>,
}

impl MethodInfo {
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

    fn code_position(&self, cp: &ConstantPool) -> Option<usize> {
        self.attributes
            .iter()
            .position(|a| cp.utf8(a.name_index).map(|n| n == attribute_names::CODE).unwrap_or(false))
    }

    /// Decoded Code attribute; `None` for abstract and native methods
    pub fn code(&self, cp: &ConstantPool) -> ClassFormatResult<Option<CodeAttribute>> {
        match self.code_position(cp) {
            Some(position) => CodeAttribute::parse(&self.attributes[position].info).map(Some),
            None => Ok(None),
        }
    }

    /// Replace (or add) the Code attribute
    pub fn set_code(&mut self, cp: &mut ConstantPool, code: &CodeAttribute) {
        let info = code.to_bytes();
        match self.code_position(cp) {
            Some(position) => self.attributes[position].info = info,
            None => {
                let name_index = cp.add_utf8(attribute_names::CODE);
                self.attributes.push(AttributeInfo::new(name_index, info));
            }
        }
    }
}
