//! Class file model, reader/writer and bytecode generation
//!
//! Everything below works on the raw JVM class format: a deduplicating
//! constant pool, attributes, verifier frames and an instruction codec.
//! [`tree`] and [`gen`] lower synthesized bodies to bytecode and [`patch`]
//! splices code into existing method bodies.

pub mod attribute;
pub mod class;
pub mod constpool;
pub mod defs;
pub mod descriptor;
pub mod error;
pub mod field;
pub mod flag;
pub mod frame;
pub mod gen;
pub mod insn;
pub mod method;
pub mod opcodes;
pub mod patch;
pub mod reader;
pub mod tree;
pub mod writer;

pub use attribute::{AttributeInfo, CodeAttribute, ExceptionTableEntry};
pub use class::ClassFile;
pub use constpool::{Constant, ConstantPool};
pub use error::{ClassFormatError, ClassFormatResult};
pub use field::FieldInfo;
pub use gen::{emit_fragment, emit_method, EmittedCode, MethodContext};
pub use method::MethodInfo;
pub use patch::Fragment;
pub use reader::read_class;
pub use tree::{Expr, FieldRef, MethodRef, Stmt};
pub use writer::{class_file_to_bytes, ClassfileWritable};
