use thiserror::Error;

use crate::codegen::error::ClassFormatError;

/// Result type for implgen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the implementation generator
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Class format error: {0}")]
    ClassFormat(#[from] ClassFormatError),

    #[error("Invalid type model: {0}")]
    Model(#[from] serde_json::Error),

    #[error("Jar error: {0}")]
    Jar(#[from] zip::result::ZipError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid language level: {level}")]
    InvalidLanguageLevel { level: u16 },

    #[error("Missing symbol: {name}")]
    MissingSymbol { name: String },

    #[error("Malformed class name: {name}")]
    MalformedName { name: String },

    #[error("Duplicate member {name}{descriptor} in class {class}")]
    DuplicateMember { class: String, name: String, descriptor: String },

    #[error("Template error in `{template}`: {message}")]
    Template { template: String, message: String },

    #[error("Code generation error: {message}")]
    CodeGen { message: String },

    #[error("Source compilation failed: {message}")]
    Compile { message: String },

    #[error("Handler {handler} was unable to process type {type_name}")]
    Processor { handler: String, type_name: String },

    #[error("Unable to finish generation in handler {handler}: {source}")]
    Realization {
        handler: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    /// Create a missing symbol error
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingSymbol { name: name.into() }
    }

    /// Create a code generation error
    pub fn codegen(message: impl Into<String>) -> Self {
        Self::CodeGen { message: message.into() }
    }

    pub fn template(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Template { template: template.into(), message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// The innermost error, looking through realization wrappers
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Realization { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
