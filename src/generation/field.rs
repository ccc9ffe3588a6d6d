use tracing::debug;

use crate::ast::TypeName;
use crate::codegen::flag::access_flags::ACC_PRIVATE;
use crate::error::Result;
use crate::stack::Session;

use super::Generator;

/// Declares the private backing field of a member
#[derive(Debug, Clone)]
pub struct FieldGenerator {
    storage_name: String,
    ty: TypeName,
}

impl FieldGenerator {
    pub fn new(storage_name: impl Into<String>, ty: TypeName) -> Self {
        Self { storage_name: storage_name.into(), ty }
    }

    pub fn storage_name(&self) -> &str {
        &self.storage_name
    }
}

impl Generator for FieldGenerator {
    fn apply_to(&self, session: &mut Session) -> Result<()> {
        let class = session.current_class_mut()?;
        if class.has_field(&self.storage_name) {
            debug!(class = %class.name(), field = %self.storage_name, "field already declared");
            return Ok(());
        }
        class.add_field(ACC_PRIVATE, &self.storage_name, &self.ty)
    }

    fn describe(&self) -> String {
        format!("field {} {}", self.ty, self.storage_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TypeModel;
    use crate::codegen::defs::major_versions::JAVA_8;
    use crate::config::Config;
    use crate::pool::{ClassHandle, ClassPool};

    #[test]
    fn test_field_is_declared_once() {
        let mut session = Session::new(Config::new(), TypeModel::new(), ClassPool::with_system(JAVA_8, false));
        session.set_current_class(ClassHandle::new(TypeName::new("demo.PersonImpl"), JAVA_8));
        let field = FieldGenerator::new("name", TypeName::string());
        field.apply_to(&mut session).unwrap();
        field.apply_to(&mut session).unwrap();
        let fields = session.current_class().unwrap().fields().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].ty, TypeName::string());
        assert_eq!(field.describe(), "field java.lang.String name");
    }
}
