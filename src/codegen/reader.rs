//! Class file parsing

use super::attribute::read_attributes;
use super::class::ClassFile;
use super::constpool::{constant_tags::*, decode_modified_utf8, Constant, ConstantPool};
use super::defs::MAGIC;
use super::error::{ClassFormatError, ClassFormatResult};
use super::field::FieldInfo;
use super::method::MethodInfo;

/// Big-endian cursor over a byte slice
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn bytes(&mut self, n: usize) -> ClassFormatResult<&'a [u8]> {
        if self.pos + n > self.data.len() {
            return Err(ClassFormatError::Truncated { offset: self.pos, needed: n });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn skip(&mut self, n: usize) -> ClassFormatResult<()> {
        self.bytes(n).map(|_| ())
    }

    pub fn u8(&mut self) -> ClassFormatResult<u8> {
        Ok(self.bytes(1)?[0])
    }

    pub fn u16(&mut self) -> ClassFormatResult<u16> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn i16(&mut self) -> ClassFormatResult<i16> {
        Ok(self.u16()? as i16)
    }

    pub fn u32(&mut self) -> ClassFormatResult<u32> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn i32(&mut self) -> ClassFormatResult<i32> {
        Ok(self.u32()? as i32)
    }

    pub fn u64(&mut self) -> ClassFormatResult<u64> {
        let high = self.u32()? as u64;
        let low = self.u32()? as u64;
        Ok((high << 32) | low)
    }
}

/// Parse a complete class file
pub fn read_class(bytes: &[u8]) -> ClassFormatResult<ClassFile> {
    let mut reader = ByteReader::new(bytes);
    let magic = reader.u32()?;
    if magic != MAGIC {
        return Err(ClassFormatError::BadMagic(magic));
    }
    let minor_version = reader.u16()?;
    let major_version = reader.u16()?;
    let constant_pool = read_constant_pool(&mut reader)?;
    let access_flags = reader.u16()?;
    let this_class = reader.u16()?;
    let super_class = reader.u16()?;
    let interface_count = reader.u16()?;
    let interfaces = (0..interface_count).map(|_| reader.u16()).collect::<ClassFormatResult<_>>()?;
    let field_count = reader.u16()?;
    let fields = (0..field_count).map(|_| FieldInfo::read(&mut reader)).collect::<ClassFormatResult<_>>()?;
    let method_count = reader.u16()?;
    let methods = (0..method_count).map(|_| MethodInfo::read(&mut reader)).collect::<ClassFormatResult<_>>()?;
    let attributes = read_attributes(&mut reader)?;
    Ok(ClassFile {
        magic,
        minor_version,
        major_version,
        constant_pool,
        access_flags,
        this_class,
        super_class,
        interfaces,
        fields,
        methods,
        attributes,
    })
}

fn read_constant_pool(reader: &mut ByteReader<'_>) -> ClassFormatResult<ConstantPool> {
    let count = reader.u16()?;
    let mut pool = ConstantPool::new();
    let mut index: u16 = 1;
    while index < count {
        let tag = reader.u8()?;
        let constant = match tag {
            CONSTANT_UTF8 => {
                let length = reader.u16()? as usize;
                let raw = reader.bytes(length)?;
                let text = match std::str::from_utf8(raw) {
                    Ok(text) if !raw.contains(&0) => text.to_owned(),
                    _ => decode_modified_utf8(raw).ok_or(ClassFormatError::InvalidUtf8(index))?,
                };
                Constant::Utf8(text)
            }
            CONSTANT_INTEGER => Constant::Integer(reader.i32()?),
            CONSTANT_FLOAT => Constant::Float(reader.u32()?),
            CONSTANT_LONG => Constant::Long(reader.u64()? as i64),
            CONSTANT_DOUBLE => Constant::Double(reader.u64()?),
            CONSTANT_CLASS => Constant::Class(reader.u16()?),
            CONSTANT_STRING => Constant::String(reader.u16()?),
            CONSTANT_FIELDREF => Constant::FieldRef(reader.u16()?, reader.u16()?),
            CONSTANT_METHODREF => Constant::MethodRef(reader.u16()?, reader.u16()?),
            CONSTANT_INTERFACEMETHODREF => Constant::InterfaceMethodRef(reader.u16()?, reader.u16()?),
            CONSTANT_NAMEANDTYPE => Constant::NameAndType(reader.u16()?, reader.u16()?),
            CONSTANT_METHODHANDLE => Constant::MethodHandle(reader.u8()?, reader.u16()?),
            CONSTANT_METHODTYPE => Constant::MethodType(reader.u16()?),
            CONSTANT_DYNAMIC => Constant::Dynamic(reader.u16()?, reader.u16()?),
            CONSTANT_INVOKEDYNAMIC => Constant::InvokeDynamic(reader.u16()?, reader.u16()?),
            CONSTANT_MODULE => Constant::Module(reader.u16()?),
            CONSTANT_PACKAGE => Constant::Package(reader.u16()?),
            other => return Err(ClassFormatError::UnknownConstantTag { tag: other, index }),
        };
        index += if constant.is_wide() { 2 } else { 1 };
        pool.push(constant);
    }
    Ok(pool)
}
