//! Trait-based serialization for classfile structures

use super::class::ClassFile;
use super::error::{ClassFormatError, ClassFormatResult};

/// An object which can be written into a classfile.
pub trait ClassfileWritable {
    /// Writes the bytes of this object into the given buffer.
    fn write_to_classfile(&self, buffer: &mut Vec<u8>) -> ClassFormatResult<()>;

    /// Writes the bytes of this object into a newly created buffer.
    fn to_classfile_bytes(&self) -> ClassFormatResult<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write_to_classfile(&mut buffer)?;
        Ok(buffer)
    }
}

impl ClassfileWritable for ClassFile {
    fn write_to_classfile(&self, buffer: &mut Vec<u8>) -> ClassFormatResult<()> {
        buffer.extend_from_slice(&self.magic.to_be_bytes());
        buffer.extend_from_slice(&self.minor_version.to_be_bytes());
        buffer.extend_from_slice(&self.major_version.to_be_bytes());

        self.constant_pool.write_to(buffer)?;

        buffer.extend_from_slice(&self.access_flags.to_be_bytes());
        buffer.extend_from_slice(&self.this_class.to_be_bytes());
        buffer.extend_from_slice(&self.super_class.to_be_bytes());

        buffer.extend_from_slice(&(self.interfaces.len() as u16).to_be_bytes());
        for interface in &self.interfaces {
            buffer.extend_from_slice(&interface.to_be_bytes());
        }

        buffer.extend_from_slice(&(self.fields.len() as u16).to_be_bytes());
        for field in &self.fields {
            field.write_to(buffer);
        }

        buffer.extend_from_slice(&(self.methods.len() as u16).to_be_bytes());
        for method in &self.methods {
            method.write_to(buffer);
        }

        if self.attributes.len() > u16::MAX as usize {
            return Err(ClassFormatError::OutOfSpace);
        }
        super::attribute::write_attributes(&self.attributes, buffer);
        Ok(())
    }
}

/// Serialize a class file to bytes
pub fn class_file_to_bytes(class_file: &ClassFile) -> ClassFormatResult<Vec<u8>> {
    class_file.to_classfile_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::flag::access_flags::*;
    use crate::codegen::reader::read_class;

    #[test]
    fn test_written_class_reads_back() {
        let mut class = ClassFile::new(52, ACC_PUBLIC | ACC_SUPER, "demo/Person", Some("java/lang/Object"));
        let name = class.constant_pool.add_utf8("name");
        let descriptor = class.constant_pool.add_utf8("Ljava/lang/String;");
        class.fields.push(crate::codegen::field::FieldInfo::new(ACC_PRIVATE, name, descriptor));

        let bytes = class_file_to_bytes(&class).unwrap();
        assert_eq!(&bytes[..4], &[0xCA, 0xFE, 0xBA, 0xBE]);

        let parsed = read_class(&bytes).unwrap();
        assert_eq!(parsed.this_name().unwrap(), "demo/Person");
        assert_eq!(parsed.super_name().unwrap(), Some("java/lang/Object"));
        assert_eq!(parsed.find_field("name"), Some(0));
        assert_eq!(parsed.major_version, 52);
    }
}
