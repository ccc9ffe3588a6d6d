use std::path::PathBuf;

use crate::codegen::defs::{major_version_for_release, FIRST_STACK_MAP_VERSION};
use crate::error::{Error, Result};
use crate::pool::parse_class_path;

/// Environment variable holding extra classpath entries
pub const CLASSPATH_ENV: &str = "IMPLGEN_CLASSPATH";

const MAX_LANGUAGE_LEVEL: u16 = 30;

/// Settings for one generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Java release the generated classes target
    pub language_level: u16,
    /// Treat unresolvable supertypes as errors instead of skipping them
    pub validate: bool,
    /// Roots searched for `pkg/Name.java` when a class must be compiled on demand
    pub source_roots: Vec<PathBuf>,
    /// Binary classpath: directories and jars
    pub class_path: Vec<PathBuf>,
    /// Single-parameter methods become setters and other methods getters without a prefix
    pub fluent_naming: bool,
    /// Compile missing classes from the source roots
    pub compile_sources: bool,
    pub javac: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language_level: 8,
            validate: false,
            source_roots: Vec::new(),
            class_path: Vec::new(),
            fluent_naming: true,
            compile_sources: true,
            javac: PathBuf::from("javac"),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults plus classpath entries from `IMPLGEN_CLASSPATH`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(class_path) = std::env::var(CLASSPATH_ENV) {
            config.class_path.extend(parse_class_path(&class_path));
        }
        config
    }

    pub fn with_language_level(mut self, level: u16) -> Self {
        self.language_level = level;
        self
    }

    pub fn with_validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_roots.push(root.into());
        self
    }

    pub fn with_class_path_entry(mut self, entry: impl Into<PathBuf>) -> Self {
        self.class_path.push(entry.into());
        self
    }

    /// Append every entry of a platform classpath string
    pub fn with_class_path(mut self, class_path: &str) -> Self {
        self.class_path.extend(parse_class_path(class_path));
        self
    }

    pub fn with_fluent_naming(mut self, fluent: bool) -> Self {
        self.fluent_naming = fluent;
        self
    }

    pub fn with_compile_sources(mut self, compile: bool) -> Self {
        self.compile_sources = compile;
        self
    }

    pub fn with_javac(mut self, javac: impl Into<PathBuf>) -> Self {
        self.javac = javac.into();
        self
    }

    /// Class file major version for the language level
    pub fn major_version(&self) -> Result<u16> {
        if self.language_level == 0 || self.language_level > MAX_LANGUAGE_LEVEL {
            return Err(Error::InvalidLanguageLevel { level: self.language_level });
        }
        Ok(major_version_for_release(self.language_level))
    }

    /// Whether generated methods carry StackMapTable frames
    pub fn emits_frames(&self) -> Result<bool> {
        Ok(self.major_version()? >= FIRST_STACK_MAP_VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.language_level, 8);
        assert!(config.fluent_naming && config.compile_sources && !config.validate);
        assert_eq!(config.major_version().unwrap(), 52);
        assert!(config.emits_frames().unwrap());
    }

    #[test]
    fn test_language_levels() {
        assert_eq!(Config::new().with_language_level(17).major_version().unwrap(), 61);
        assert!(!Config::new().with_language_level(5).emits_frames().unwrap());
        assert!(matches!(
            Config::new().with_language_level(0).major_version(),
            Err(Error::InvalidLanguageLevel { level: 0 })
        ));
        assert!(Config::new().with_language_level(31).major_version().is_err());
    }

    #[test]
    fn test_class_path_string() {
        let separator = if cfg!(windows) { ";" } else { ":" };
        let config = Config::new().with_class_path(&format!("a.jar{separator}classes")).with_class_path_entry("b.jar");
        assert_eq!(config.class_path, vec![PathBuf::from("a.jar"), PathBuf::from("classes"), PathBuf::from("b.jar")]);
    }
}
