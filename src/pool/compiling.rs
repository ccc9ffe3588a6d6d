//! On-demand compilation of model sources into a private output directory

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use once_cell::unsync::OnceCell;
use tempfile::TempDir;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::error::{Error, Result};

use super::classpath::{class_file_path, join_class_path, ClassPath};

/// External Java source compiler
pub trait SourceCompiler: Send + Sync {
    fn compile(&self, sources: &[PathBuf], class_path: &[PathBuf], output: &Path, language_level: u16) -> Result<()>;
}

/// Runs a `javac` executable
#[derive(Debug, Clone)]
pub struct JavacCompiler {
    executable: PathBuf,
}

impl JavacCompiler {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self { executable: executable.into() }
    }

    fn arguments(sources: &[PathBuf], class_path: &[PathBuf], output: &Path, language_level: u16) -> Vec<String> {
        let mut args = vec!["-d".to_string(), output.display().to_string(), "-proc:none".to_string()];
        if !class_path.is_empty() {
            args.push("-cp".to_string());
            args.push(join_class_path(class_path));
        }
        if language_level >= 9 {
            args.push("--release".to_string());
            args.push(language_level.to_string());
        } else {
            let level = format!("1.{language_level}");
            args.extend(["-source".to_string(), level.clone(), "-target".to_string(), level]);
        }
        args.extend(sources.iter().map(|s| s.display().to_string()));
        args
    }
}

impl Default for JavacCompiler {
    fn default() -> Self {
        Self::new("javac")
    }
}

impl SourceCompiler for JavacCompiler {
    fn compile(&self, sources: &[PathBuf], class_path: &[PathBuf], output: &Path, language_level: u16) -> Result<()> {
        let args = Self::arguments(sources, class_path, output, language_level);
        debug!(javac = %self.executable.display(), sources = sources.len(), "compiling sources");
        let result = Command::new(&self.executable).args(&args).output().map_err(|err| Error::Compile {
            message: format!("unable to run {}: {err}", self.executable.display()),
        })?;
        if !result.status.success() {
            return Err(Error::Compile { message: String::from_utf8_lossy(&result.stderr).trim().to_string() });
        }
        Ok(())
    }
}

/// Classpath layer that compiles `pkg/Name.java` from the source roots when asked for `pkg.Name`
pub struct CompilingClassPath {
    source_roots: Vec<PathBuf>,
    class_path: Vec<PathBuf>,
    language_level: u16,
    compiler: Arc<dyn SourceCompiler>,
    output: OnceCell<TempDir>,
}

impl CompilingClassPath {
    pub fn new(
        source_roots: Vec<PathBuf>,
        class_path: Vec<PathBuf>,
        language_level: u16,
        compiler: Arc<dyn SourceCompiler>,
    ) -> Self {
        Self { source_roots, class_path, language_level, compiler, output: OnceCell::new() }
    }

    /// Source file for a class name; nested classes map to their outermost type
    pub fn find_source(&self, name: &str) -> Option<PathBuf> {
        let outer = name.split('$').next().unwrap_or(name);
        let relative = format!("{}.java", outer.replace('.', "/"));
        self.source_roots.iter().map(|root| root.join(&relative)).find(|path| path.is_file())
    }

    fn all_sources(&self) -> Vec<PathBuf> {
        let mut sources: Vec<PathBuf> = self
            .source_roots
            .iter()
            .flat_map(|root| WalkDir::new(root).into_iter().filter_map(|entry| entry.ok()))
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| path.extension().map(|e| e == "java").unwrap_or(false))
            .collect();
        sources.sort();
        sources
    }

    fn output_dir(&self) -> Result<&Path> {
        let dir = self.output.get_or_try_init(|| tempfile::Builder::new().prefix("implgen-").tempdir())?;
        Ok(dir.path())
    }
}

impl ClassPath for CompilingClassPath {
    fn open_class(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        if self.find_source(name).is_none() {
            return Ok(None);
        }
        let output = self.output_dir()?.to_path_buf();
        let target = output.join(class_file_path(name));
        if !target.is_file() {
            let sources = self.all_sources();
            self.compiler.compile(&sources, &self.class_path, &output, self.language_level)?;
        } else {
            trace!(class = name, "reusing compiled class");
        }
        if !target.is_file() {
            return Err(Error::Compile { message: format!("compiling sources did not produce {}", target.display()) });
        }
        Ok(Some(std::fs::read(target)?))
    }

    fn describe(&self) -> String {
        let roots: Vec<String> = self.source_roots.iter().map(|r| r.display().to_string()).collect();
        format!("sources:{}", roots.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Writes a placeholder class for every source instead of running javac
    #[derive(Default)]
    struct FakeCompiler {
        calls: Mutex<Vec<usize>>,
    }

    impl SourceCompiler for FakeCompiler {
        fn compile(&self, sources: &[PathBuf], _: &[PathBuf], output: &Path, _: u16) -> Result<()> {
            self.calls.lock().push(sources.len());
            for source in sources {
                let name = source.file_stem().unwrap().to_string_lossy().to_string();
                let package = source.parent().unwrap().file_name().unwrap().to_string_lossy().to_string();
                std::fs::create_dir_all(output.join(&package))?;
                std::fs::write(output.join(package).join(format!("{name}.class")), name.as_bytes())?;
            }
            Ok(())
        }
    }

    fn source_tree() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("demo")).unwrap();
        std::fs::write(dir.path().join("demo/Person.java"), "package demo; public interface Person {}").unwrap();
        std::fs::write(dir.path().join("demo/Service.java"), "package demo; public class Service {}").unwrap();
        dir
    }

    #[test]
    fn test_compiles_all_sources_once() {
        let sources = source_tree();
        let compiler = Arc::new(FakeCompiler::default());
        let mut layer = CompilingClassPath::new(vec![sources.path().to_path_buf()], vec![], 8, compiler.clone());

        assert_eq!(layer.open_class("demo.Person").unwrap(), Some(b"Person".to_vec()));
        assert_eq!(layer.open_class("demo.Service").unwrap(), Some(b"Service".to_vec()));
        assert_eq!(*compiler.calls.lock(), vec![2]);
        assert_eq!(layer.open_class("demo.Missing").unwrap(), None);
    }

    #[test]
    fn test_missing_output_is_an_error() {
        struct Silent;
        impl SourceCompiler for Silent {
            fn compile(&self, _: &[PathBuf], _: &[PathBuf], _: &Path, _: u16) -> Result<()> {
                Ok(())
            }
        }
        let sources = source_tree();
        let mut layer = CompilingClassPath::new(vec![sources.path().to_path_buf()], vec![], 8, Arc::new(Silent));
        assert!(matches!(layer.open_class("demo.Person"), Err(Error::Compile { .. })));
    }

    #[test]
    fn test_javac_arguments() {
        let args = JavacCompiler::arguments(&[PathBuf::from("A.java")], &[], Path::new("out"), 8);
        assert_eq!(args, vec!["-d", "out", "-proc:none", "-source", "1.8", "-target", "1.8", "A.java"]);
        let args = JavacCompiler::arguments(&[], &[PathBuf::from("lib.jar")], Path::new("out"), 17);
        assert_eq!(args, vec!["-d", "out", "-proc:none", "-cp", "lib.jar", "--release", "17"]);
    }
}
