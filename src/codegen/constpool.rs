//! Constant pool and constants for Java class files

use std::collections::HashMap;

use super::error::{ClassFormatError, ClassFormatResult};

/// A single constant pool entry.
///
/// Floating point values are kept as raw bits so that constants can be
/// hashed and deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    Utf8(String),
    Integer(i32),
    Float(u32),
    Long(i64),
    Double(u64),
    Class(u16),
    String(u16),
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    InterfaceMethodRef(u16, u16),
    NameAndType(u16, u16),
    MethodHandle(u8, u16),
    MethodType(u16),
    Dynamic(u16, u16),
    InvokeDynamic(u16, u16),
    Module(u16),
    Package(u16),
    /// Second slot occupied by a preceding Long or Double entry
    Unusable,
}

pub(crate) mod constant_tags {
    pub const CONSTANT_UTF8: u8 = 1;
    pub const CONSTANT_INTEGER: u8 = 3;
    pub const CONSTANT_FLOAT: u8 = 4;
    pub const CONSTANT_LONG: u8 = 5;
    pub const CONSTANT_DOUBLE: u8 = 6;
    pub const CONSTANT_CLASS: u8 = 7;
    pub const CONSTANT_STRING: u8 = 8;
    pub const CONSTANT_FIELDREF: u8 = 9;
    pub const CONSTANT_METHODREF: u8 = 10;
    pub const CONSTANT_INTERFACEMETHODREF: u8 = 11;
    pub const CONSTANT_NAMEANDTYPE: u8 = 12;
    pub const CONSTANT_METHODHANDLE: u8 = 15;
    pub const CONSTANT_METHODTYPE: u8 = 16;
    pub const CONSTANT_DYNAMIC: u8 = 17;
    pub const CONSTANT_INVOKEDYNAMIC: u8 = 18;
    pub const CONSTANT_MODULE: u8 = 19;
    pub const CONSTANT_PACKAGE: u8 = 20;
}

impl Constant {
    /// Long and Double occupy two pool slots
    pub fn is_wide(&self) -> bool {
        matches!(self, Constant::Long(_) | Constant::Double(_))
    }

    pub fn write_to(&self, bytes: &mut Vec<u8>) {
        use constant_tags::*;
        match self {
            Constant::Utf8(value) => {
                let encoded = encode_modified_utf8(value);
                bytes.push(CONSTANT_UTF8);
                bytes.extend_from_slice(&(encoded.len() as u16).to_be_bytes());
                bytes.extend_from_slice(&encoded);
            }
            Constant::Integer(value) => {
                bytes.push(CONSTANT_INTEGER);
                bytes.extend_from_slice(&value.to_be_bytes());
            }
            Constant::Float(bits) => {
                bytes.push(CONSTANT_FLOAT);
                bytes.extend_from_slice(&bits.to_be_bytes());
            }
            Constant::Long(value) => {
                bytes.push(CONSTANT_LONG);
                bytes.extend_from_slice(&value.to_be_bytes());
            }
            Constant::Double(bits) => {
                bytes.push(CONSTANT_DOUBLE);
                bytes.extend_from_slice(&bits.to_be_bytes());
            }
            Constant::Class(index) => push_u16(bytes, CONSTANT_CLASS, *index),
            Constant::String(index) => push_u16(bytes, CONSTANT_STRING, *index),
            Constant::FieldRef(class, nat) => push_pair(bytes, CONSTANT_FIELDREF, *class, *nat),
            Constant::MethodRef(class, nat) => push_pair(bytes, CONSTANT_METHODREF, *class, *nat),
            Constant::InterfaceMethodRef(class, nat) => {
                push_pair(bytes, CONSTANT_INTERFACEMETHODREF, *class, *nat)
            }
            Constant::NameAndType(name, descriptor) => {
                push_pair(bytes, CONSTANT_NAMEANDTYPE, *name, *descriptor)
            }
            Constant::MethodHandle(kind, index) => {
                bytes.push(CONSTANT_METHODHANDLE);
                bytes.push(*kind);
                bytes.extend_from_slice(&index.to_be_bytes());
            }
            Constant::MethodType(index) => push_u16(bytes, CONSTANT_METHODTYPE, *index),
            Constant::Dynamic(bootstrap, nat) => push_pair(bytes, CONSTANT_DYNAMIC, *bootstrap, *nat),
            Constant::InvokeDynamic(bootstrap, nat) => {
                push_pair(bytes, CONSTANT_INVOKEDYNAMIC, *bootstrap, *nat)
            }
            Constant::Module(index) => push_u16(bytes, CONSTANT_MODULE, *index),
            Constant::Package(index) => push_u16(bytes, CONSTANT_PACKAGE, *index),
            Constant::Unusable => {}
        }
    }
}

fn push_u16(bytes: &mut Vec<u8>, tag: u8, value: u16) {
    bytes.push(tag);
    bytes.extend_from_slice(&value.to_be_bytes());
}

fn push_pair(bytes: &mut Vec<u8>, tag: u8, first: u16, second: u16) {
    bytes.push(tag);
    bytes.extend_from_slice(&first.to_be_bytes());
    bytes.extend_from_slice(&second.to_be_bytes());
}

/// A resolved field or method reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRef<'a> {
    pub owner: &'a str,
    pub name: &'a str,
    pub descriptor: &'a str,
    pub interface: bool,
}

/// Constant pool with 1-based indexing and structural deduplication
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    constants: Vec<Constant>,
    lookup: HashMap<Constant, u16>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `constant_pool_count` value written to the class file
    pub fn count(&self) -> usize {
        self.constants.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }

    pub fn get(&self, index: u16) -> Option<&Constant> {
        if index == 0 {
            return None;
        }
        self.constants.get(index as usize - 1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> {
        self.constants
            .iter()
            .enumerate()
            .filter(|(_, c)| !matches!(c, Constant::Unusable))
            .map(|(i, c)| ((i + 1) as u16, c))
    }

    /// Insert a constant, returning the index of an equal existing entry if one exists
    pub fn add(&mut self, constant: Constant) -> u16 {
        if let Some(&index) = self.lookup.get(&constant) {
            return index;
        }
        self.push(constant)
    }

    /// Append a constant as read from a class file, keeping its position
    pub(crate) fn push(&mut self, constant: Constant) -> u16 {
        let index = (self.constants.len() + 1) as u16;
        let wide = constant.is_wide();
        self.lookup.entry(constant.clone()).or_insert(index);
        self.constants.push(constant);
        if wide {
            self.constants.push(Constant::Unusable);
        }
        index
    }

    pub fn add_utf8(&mut self, value: &str) -> u16 {
        self.add(Constant::Utf8(value.to_owned()))
    }

    /// Add a class reference by internal name (`java/lang/Object`, `[I`)
    pub fn add_class(&mut self, internal_name: &str) -> u16 {
        let name = self.add_utf8(internal_name);
        self.add(Constant::Class(name))
    }

    pub fn add_string(&mut self, value: &str) -> u16 {
        let utf8 = self.add_utf8(value);
        self.add(Constant::String(utf8))
    }

    pub fn add_integer(&mut self, value: i32) -> u16 {
        self.add(Constant::Integer(value))
    }

    pub fn add_float(&mut self, value: f32) -> u16 {
        self.add(Constant::Float(value.to_bits()))
    }

    pub fn add_long(&mut self, value: i64) -> u16 {
        self.add(Constant::Long(value))
    }

    pub fn add_double(&mut self, value: f64) -> u16 {
        self.add(Constant::Double(value.to_bits()))
    }

    pub fn add_name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name = self.add_utf8(name);
        let descriptor = self.add_utf8(descriptor);
        self.add(Constant::NameAndType(name, descriptor))
    }

    pub fn add_field_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class = self.add_class(owner);
        let nat = self.add_name_and_type(name, descriptor);
        self.add(Constant::FieldRef(class, nat))
    }

    pub fn add_method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class = self.add_class(owner);
        let nat = self.add_name_and_type(name, descriptor);
        self.add(Constant::MethodRef(class, nat))
    }

    pub fn add_interface_method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class = self.add_class(owner);
        let nat = self.add_name_and_type(name, descriptor);
        self.add(Constant::InterfaceMethodRef(class, nat))
    }

    pub fn utf8(&self, index: u16) -> ClassFormatResult<&str> {
        match self.get(index) {
            Some(Constant::Utf8(value)) => Ok(value),
            _ => Err(ClassFormatError::InvalidIndex(index)),
        }
    }

    /// Internal name of the class referenced by a Class entry
    pub fn class_name(&self, index: u16) -> ClassFormatResult<&str> {
        match self.get(index) {
            Some(Constant::Class(name)) => self.utf8(*name),
            _ => Err(ClassFormatError::InvalidIndex(index)),
        }
    }

    pub fn name_and_type(&self, index: u16) -> ClassFormatResult<(&str, &str)> {
        match self.get(index) {
            Some(Constant::NameAndType(name, descriptor)) => {
                Ok((self.utf8(*name)?, self.utf8(*descriptor)?))
            }
            _ => Err(ClassFormatError::InvalidIndex(index)),
        }
    }

    pub fn member_ref(&self, index: u16) -> ClassFormatResult<MemberRef<'_>> {
        let (class, nat, interface) = match self.get(index) {
            Some(Constant::FieldRef(class, nat)) | Some(Constant::MethodRef(class, nat)) => {
                (*class, *nat, false)
            }
            Some(Constant::InterfaceMethodRef(class, nat)) => (*class, *nat, true),
            _ => return Err(ClassFormatError::InvalidIndex(index)),
        };
        let (name, descriptor) = self.name_and_type(nat)?;
        Ok(MemberRef { owner: self.class_name(class)?, name, descriptor, interface })
    }

    /// Short human readable rendering used by the disassembler
    pub fn describe(&self, index: u16) -> String {
        match self.get(index) {
            Some(Constant::Utf8(value)) => value.clone(),
            Some(Constant::Integer(value)) => value.to_string(),
            Some(Constant::Float(bits)) => format!("{}f", f32::from_bits(*bits)),
            Some(Constant::Long(value)) => format!("{value}l"),
            Some(Constant::Double(bits)) => format!("{}d", f64::from_bits(*bits)),
            Some(Constant::Class(_)) => self.class_name(index).unwrap_or("?").to_owned(),
            Some(Constant::String(utf8)) => format!("{:?}", self.utf8(*utf8).unwrap_or("?")),
            Some(Constant::FieldRef(..))
            | Some(Constant::MethodRef(..))
            | Some(Constant::InterfaceMethodRef(..)) => match self.member_ref(index) {
                Ok(member) => format!("{}.{}:{}", member.owner, member.name, member.descriptor),
                Err(_) => format!("#{index}"),
            },
            _ => format!("#{index}"),
        }
    }

    pub fn write_to(&self, bytes: &mut Vec<u8>) -> ClassFormatResult<()> {
        if self.count() > u16::MAX as usize {
            return Err(ClassFormatError::OutOfSpace);
        }
        bytes.extend_from_slice(&(self.count() as u16).to_be_bytes());
        for constant in &self.constants {
            constant.write_to(bytes);
        }
        Ok(())
    }
}

/// Encode a string in the JVM's modified UTF-8
pub fn encode_modified_utf8(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | ((unit >> 6) & 0x1F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | ((unit >> 12) & 0x0F) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

/// Decode modified UTF-8; `None` on malformed input
pub fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i] as u16;
        if b & 0x80 == 0 {
            units.push(b);
            i += 1;
        } else if b & 0xE0 == 0xC0 {
            let b2 = *bytes.get(i + 1)? as u16;
            units.push(((b & 0x1F) << 6) | (b2 & 0x3F));
            i += 2;
        } else if b & 0xF0 == 0xE0 {
            let b2 = *bytes.get(i + 1)? as u16;
            let b3 = *bytes.get(i + 2)? as u16;
            units.push(((b & 0x0F) << 12) | ((b2 & 0x3F) << 6) | (b3 & 0x3F));
            i += 3;
        } else {
            return None;
        }
    }
    String::from_utf16(&units).ok()
}
