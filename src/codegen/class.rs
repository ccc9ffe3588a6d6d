//! Core classfile structure

use super::attribute::AttributeInfo;
use super::constpool::ConstantPool;
use super::defs::MAGIC;
use super::error::ClassFormatResult;
use super::field::FieldInfo;
use super::method::MethodInfo;

#[derive(Debug, Clone)]
pub struct ClassFile {
    pub magic: u32,
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool: ConstantPool,
    pub access_flags: u16,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub attributes: Vec<AttributeInfo>,
}

impl ClassFile {
    /// An empty class with the given name and superclass (internal names)
    pub fn new(major_version: u16, access_flags: u16, this_name: &str, super_name: Option<&str>) -> Self {
        let mut constant_pool = ConstantPool::new();
        let this_class = constant_pool.add_class(this_name);
        let super_class = super_name.map(|name| constant_pool.add_class(name)).unwrap_or(0);
        Self {
            magic: MAGIC,
            minor_version: 0,
            major_version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn this_name(&self) -> ClassFormatResult<&str> {
        self.constant_pool.class_name(self.this_class)
    }

    /// `None` only for java/lang/Object
    pub fn super_name(&self) -> ClassFormatResult<Option<&str>> {
        if self.super_class == 0 {
            return Ok(None);
        }
        self.constant_pool.class_name(self.super_class).map(Some)
    }

    pub fn interface_names(&self) -> ClassFormatResult<Vec<&str>> {
        self.interfaces.iter().map(|&i| self.constant_pool.class_name(i)).collect()
    }

    pub fn find_method(&self, name: &str, descriptor: &str) -> Option<usize> {
        self.methods.iter().position(|m| {
            self.constant_pool.utf8(m.name_index).map(|n| n == name).unwrap_or(false)
                && self.constant_pool.utf8(m.descriptor_index).map(|d| d == descriptor).unwrap_or(false)
        })
    }

    pub fn find_field(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| self.constant_pool.utf8(f.name_index).map(|n| n == name).unwrap_or(false))
    }
}
