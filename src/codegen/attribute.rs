//! Attributes and exception table structures for Java class files

use super::error::ClassFormatResult;
use super::reader::ByteReader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInfo {
    pub name_index: u16,
    pub info: Vec<u8>,
}

impl AttributeInfo {
    pub fn new(name_index: u16, info: Vec<u8>) -> Self {
        Self { name_index, info }
    }

    pub fn write_to(&self, bytes: &mut Vec<u8>) {
        bytes.extend_from_slice(&self.name_index.to_be_bytes());
        bytes.extend_from_slice(&(self.info.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&self.info);
    }

    pub(crate) fn read(reader: &mut ByteReader<'_>) -> ClassFormatResult<Self> {
        let name_index = reader.u16()?;
        let length = reader.u32()? as usize;
        let info = reader.bytes(length)?.to_vec();
        Ok(Self { name_index, info })
    }
}

pub(crate) fn read_attributes(reader: &mut ByteReader<'_>) -> ClassFormatResult<Vec<AttributeInfo>> {
    let count = reader.u16()?;
    (0..count).map(|_| AttributeInfo::read(reader)).collect()
}

pub(crate) fn write_attributes(attributes: &[AttributeInfo], bytes: &mut Vec<u8>) {
    bytes.extend_from_slice(&(attributes.len() as u16).to_be_bytes());
    for attribute in attributes {
        attribute.write_to(bytes);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub attributes: Vec<AttributeInfo>,
}

impl CodeAttribute {
    pub fn new(max_stack: u16, max_locals: u16, code: Vec<u8>) -> Self {
        Self {
            max_stack,
            max_locals,
            code,
            exception_table: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn parse(info: &[u8]) -> ClassFormatResult<Self> {
        let mut reader = ByteReader::new(info);
        let max_stack = reader.u16()?;
        let max_locals = reader.u16()?;
        let length = reader.u32()? as usize;
        let code = reader.bytes(length)?.to_vec();
        let handlers = reader.u16()?;
        let mut exception_table = Vec::with_capacity(handlers as usize);
        for _ in 0..handlers {
            exception_table.push(ExceptionTableEntry {
                start_pc: reader.u16()?,
                end_pc: reader.u16()?,
                handler_pc: reader.u16()?,
                catch_type: reader.u16()?,
            });
        }
        let attributes = read_attributes(&mut reader)?;
        Ok(Self { max_stack, max_locals, code, exception_table, attributes })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.max_stack.to_be_bytes());
        bytes.extend_from_slice(&self.max_locals.to_be_bytes());
        bytes.extend_from_slice(&(self.code.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&self.code);
        bytes.extend_from_slice(&(self.exception_table.len() as u16).to_be_bytes());
        for entry in &self.exception_table {
            entry.write_to(&mut bytes);
        }
        write_attributes(&self.attributes, &mut bytes);
        bytes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: u16,
}

impl ExceptionTableEntry {
    pub fn new(start_pc: u16, end_pc: u16, handler_pc: u16, catch_type: u16) -> Self {
        Self { start_pc, end_pc, handler_pc, catch_type }
    }

    fn write_to(&self, bytes: &mut Vec<u8>) {
        bytes.extend_from_slice(&self.start_pc.to_be_bytes());
        bytes.extend_from_slice(&self.end_pc.to_be_bytes());
        bytes.extend_from_slice(&self.handler_pc.to_be_bytes());
        bytes.extend_from_slice(&self.catch_type.to_be_bytes());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineNumberEntry {
    pub start_pc: u16,
    pub line_number: u16,
}

pub fn parse_line_numbers(info: &[u8]) -> ClassFormatResult<Vec<LineNumberEntry>> {
    let mut reader = ByteReader::new(info);
    let count = reader.u16()?;
    (0..count)
        .map(|_| Ok(LineNumberEntry { start_pc: reader.u16()?, line_number: reader.u16()? }))
        .collect()
}

pub fn line_numbers_to_bytes(entries: &[LineNumberEntry]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(2 + entries.len() * 4);
    bytes.extend_from_slice(&(entries.len() as u16).to_be_bytes());
    for entry in entries {
        bytes.extend_from_slice(&entry.start_pc.to_be_bytes());
        bytes.extend_from_slice(&entry.line_number.to_be_bytes());
    }
    bytes
}

/// Entry of LocalVariableTable or LocalVariableTypeTable; the layouts are identical,
/// `descriptor_index` holds the signature for the type table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalVariableEntry {
    pub start_pc: u16,
    pub length: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub index: u16,
}

pub fn parse_local_variables(info: &[u8]) -> ClassFormatResult<Vec<LocalVariableEntry>> {
    let mut reader = ByteReader::new(info);
    let count = reader.u16()?;
    (0..count)
        .map(|_| {
            Ok(LocalVariableEntry {
                start_pc: reader.u16()?,
                length: reader.u16()?,
                name_index: reader.u16()?,
                descriptor_index: reader.u16()?,
                index: reader.u16()?,
            })
        })
        .collect()
}

pub fn local_variables_to_bytes(entries: &[LocalVariableEntry]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(2 + entries.len() * 10);
    bytes.extend_from_slice(&(entries.len() as u16).to_be_bytes());
    for entry in entries {
        bytes.extend_from_slice(&entry.start_pc.to_be_bytes());
        bytes.extend_from_slice(&entry.length.to_be_bytes());
        bytes.extend_from_slice(&entry.name_index.to_be_bytes());
        bytes.extend_from_slice(&entry.descriptor_index.to_be_bytes());
        bytes.extend_from_slice(&entry.index.to_be_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_attribute_reparse() {
        let mut code = CodeAttribute::new(2, 1, vec![0x2a, 0xb0]);
        code.exception_table.push(ExceptionTableEntry::new(0, 1, 1, 0));
        code.attributes.push(AttributeInfo::new(7, vec![0, 0]));
        let parsed = CodeAttribute::parse(&code.to_bytes()).unwrap();
        assert_eq!(parsed, code);
    }

    #[test]
    fn test_line_number_table_bytes() {
        let entries = vec![LineNumberEntry { start_pc: 0, line_number: 12 }];
        let bytes = line_numbers_to_bytes(&entries);
        assert_eq!(bytes, vec![0, 1, 0, 0, 0, 12]);
        assert_eq!(parse_line_numbers(&bytes).unwrap(), entries);
    }
}
