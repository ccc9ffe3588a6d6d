//! Specific error types for class file reading, writing and patching

use thiserror::Error;

/// Errors raised while decoding, building or re-encoding class file structures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassFormatError {
    #[error("Truncated class file: needed {needed} bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },
    #[error("Bad magic number: {0:#010x}")]
    BadMagic(u32),
    #[error("Unknown constant pool tag {tag} at index {index}")]
    UnknownConstantTag { tag: u8, index: u16 },
    #[error("Invalid constant pool index: {0}")]
    InvalidIndex(u16),
    #[error("Constant pool is out of space")]
    OutOfSpace,
    #[error("Invalid modified UTF-8 in constant {0}")]
    InvalidUtf8(u16),
    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),
    #[error("Unknown opcode {opcode:#04x} at pc {pc}")]
    UnknownOpcode { opcode: u8, pc: usize },
    #[error("Branch target {target} is not an instruction boundary")]
    InvalidBranchTarget { target: i64 },
    #[error("Branch target too far: {offset}")]
    BranchTooFar { offset: i64 },
    #[error("Invalid stack map frame type {0}")]
    InvalidFrameType(u8),
    #[error("Invalid verification type tag {0}")]
    InvalidVerificationType(u8),
    #[error("Code too large: {0} bytes")]
    CodeTooLarge(usize),
}

/// Generic result type for class file operations
pub type ClassFormatResult<T> = Result<T, ClassFormatError>;
