//! Compiled class artifacts produced by a generation run

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace an existing file
    #[default]
    Overwrite,
    /// Fail if the file already exists
    CreateNew,
}

/// One emitted class: where it goes and its bytes
#[derive(Clone, PartialEq, Eq)]
pub struct ClassResult {
    package: String,
    simple_name: String,
    output_path: PathBuf,
    bytecode: Vec<u8>,
}

impl ClassResult {
    pub fn builder() -> ClassResultBuilder {
        ClassResultBuilder::default()
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn simple_name(&self) -> &str {
        &self.simple_name
    }

    pub fn qualified_name(&self) -> String {
        if self.package.is_empty() {
            self.simple_name.clone()
        } else {
            format!("{}.{}", self.package, self.simple_name)
        }
    }

    /// Path relative to an output root: `pkg/path/Name.class`
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }

    /// Identity used for replace-or-push
    pub fn same_class(&self, other: &ClassResult) -> bool {
        self.package == other.package && self.simple_name == other.simple_name
    }

    /// Write below `root` at [`ClassResult::output_path`]
    pub fn write_to_file(&self, root: &Path, mode: WriteMode) -> Result<PathBuf> {
        let target = root.join(&self.output_path);
        self.write_to(&target, mode)?;
        Ok(target)
    }

    /// Write to an explicit path, creating parent directories
    pub fn write_to(&self, path: &Path, mode: WriteMode) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut options = OpenOptions::new();
        options.write(true);
        match mode {
            WriteMode::Overwrite => options.create(true).truncate(true),
            WriteMode::CreateNew => options.create_new(true),
        };
        let mut file = options.open(path)?;
        file.write_all(&self.bytecode)?;
        debug!(class = %self.qualified_name(), path = %path.display(), bytes = self.bytecode.len(), "wrote class");
        Ok(())
    }
}

impl fmt::Debug for ClassResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassResult")
            .field("package", &self.package)
            .field("simple_name", &self.simple_name)
            .field("output_path", &self.output_path)
            .field("bytecode", &format_args!("{} bytes", self.bytecode.len()))
            .finish()
    }
}

impl fmt::Display for ClassResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.qualified_name(), self.output_path.display())
    }
}

#[derive(Debug, Default)]
pub struct ClassResultBuilder {
    package: Option<String>,
    simple_name: Option<String>,
    bytecode: Option<Vec<u8>>,
}

impl ClassResultBuilder {
    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn simple_name(mut self, simple_name: impl Into<String>) -> Self {
        self.simple_name = Some(simple_name.into());
        self
    }

    /// Split `a.b.Name` into package and simple name
    pub fn package_class_name(self, qualified_name: &str) -> Result<Self> {
        if qualified_name.is_empty() || qualified_name.ends_with('.') {
            return Err(Error::MalformedName { name: qualified_name.to_string() });
        }
        Ok(match qualified_name.rfind('.') {
            Some(i) => self.package(&qualified_name[..i]).simple_name(&qualified_name[i + 1..]),
            None => self.package("").simple_name(qualified_name),
        })
    }

    pub fn bytecode(mut self, bytecode: Vec<u8>) -> Self {
        self.bytecode = Some(bytecode);
        self
    }

    pub fn build(self) -> Result<ClassResult> {
        let package = self.package.ok_or_else(|| Error::internal("class result is missing its package"))?;
        let simple_name = self.simple_name.ok_or_else(|| Error::internal("class result is missing its name"))?;
        let bytecode = self.bytecode.ok_or_else(|| Error::internal("class result is missing its bytecode"))?;
        let mut output_path: PathBuf = package.split('.').filter(|p| !p.is_empty()).collect();
        output_path.push(format!("{simple_name}.class"));
        Ok(ClassResult { package, simple_name, output_path, bytecode })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_splits_qualified_name() {
        let result = ClassResult::builder()
            .package_class_name("demo.model.PersonImpl")
            .unwrap()
            .bytecode(vec![0xCA, 0xFE])
            .build()
            .unwrap();
        assert_eq!(result.package(), "demo.model");
        assert_eq!(result.simple_name(), "PersonImpl");
        assert_eq!(result.output_path(), Path::new("demo/model/PersonImpl.class"));

        let default_package = ClassResult::builder().package_class_name("Top").unwrap().bytecode(vec![]).build().unwrap();
        assert_eq!(default_package.output_path(), Path::new("Top.class"));
    }

    #[test]
    fn test_builder_errors() {
        assert!(matches!(ClassResult::builder().package_class_name("demo."), Err(Error::MalformedName { .. })));
        assert!(matches!(ClassResult::builder().simple_name("A").build(), Err(Error::Internal { .. })));
    }

    #[test]
    fn test_write_modes() {
        let dir = tempfile::tempdir().unwrap();
        let result = ClassResult::builder().package_class_name("demo.A").unwrap().bytecode(vec![1, 2]).build().unwrap();
        let path = result.write_to_file(dir.path(), WriteMode::CreateNew).unwrap();
        assert_eq!(fs::read(&path).unwrap(), vec![1, 2]);
        assert!(matches!(result.write_to_file(dir.path(), WriteMode::CreateNew), Err(Error::Io(_))));
        assert!(result.write_to_file(dir.path(), WriteMode::Overwrite).is_ok());
    }
}
