//! Implementation generator for annotated JVM types (implgen)
//!
//! Given interfaces and abstract classes carrying generation directives,
//! implgen synthesizes concrete implementation classes as binary class
//! files: fields, constructors, accessors and mutators, `equals`,
//! `hashCode`, `toString`, factory methods and null-check guards.
//!
//! ## Architecture
//!
//! - **ast**: the serialized type model and its directives
//! - **parser**: invocation and wrap template parsing
//! - **codegen**: class file model, reader/writer, body lowering and patching
//! - **pool**: class pool over a layered classpath with on-demand compilation
//! - **stack**: per-run session, action queues and the class result set
//! - **generation**: one synthesizer per generated member kind
//! - **processor**: analysis and realization of annotated types
//! - **compiler**: front end wiring the pool and the processors together
//!
//! ## Generation Flow
//!
//! ```text
//! TypeModel → Compiler → analysis (queues per type) → realization → ClassResults
//!                              ↑                           ↓
//!                          ClassPool  ←──────────── patched classes
//! ```

pub mod ast;
pub mod codegen;
pub mod compiler;
pub mod config;
pub mod consts;
pub mod error;
pub mod generation;
pub mod parser;
pub mod pool;
pub mod processor;
pub mod result;
pub mod stack;

pub use ast::{TypeDecl, TypeModel, TypeName};
pub use compiler::{Compiler, JsonModelBuilder, ModelBuilder};
pub use config::Config;
pub use error::{Error, Result};
pub use result::{ClassResult, WriteMode};
pub use stack::Session;

/// Generate every class for `model` without writing anything
pub fn generate(model: TypeModel, config: &Config) -> Result<Vec<ClassResult>> {
    let session = Compiler::new(config.clone()).compile(model)?;
    Ok(session.into_results())
}

/// Generate every class for `model` and write the results below `output`
pub fn generate_to_dir(
    model: TypeModel,
    config: &Config,
    output: &std::path::Path,
    mode: WriteMode,
) -> Result<Vec<std::path::PathBuf>> {
    generate(model, config)?.iter().map(|result| result.write_to_file(output, mode)).collect()
}
