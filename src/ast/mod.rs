//! Type model consumed by the processors
//!
//! Declarations arrive ready-made (serialized with serde); this module only
//! defines their shape, the generation directives they carry and the
//! semantic [`TypeName`] used throughout the crate.

mod directives;
mod model;
mod nodes;
mod types;

pub use directives::*;
pub use model::TypeModel;
pub use nodes::*;
pub use types::TypeName;
