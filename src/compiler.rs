//! Compilation front end: builds the class pool and runs the processors
//!
//! ```text
//! TypeModel ─┐
//!            ├─► Session ─► analysis (every processor, every type)
//! Config ────┘                 └─► realization (every processor) ─► ClassResults
//! ```
//!
//! The pool layers, in lookup order: built-in system declarations, the
//! binary classpath, on-demand compilation of the source roots and finally
//! declaration stubs for model types nothing else provides.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::ast::TypeModel;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::pool::{open_entries, ClassPool, CompilingClassPath, JavacCompiler, ModelClassPath, SourceCompiler};
use crate::processor::{GenerationProcessor, NonNullProcessor, TypeProcessor};
use crate::stack::Session;

/// Source of the type model
pub trait ModelBuilder {
    fn build(&self) -> Result<TypeModel>;
}

/// Reads and merges serialized models; later files override earlier declarations
#[derive(Debug, Clone, Default)]
pub struct JsonModelBuilder {
    files: Vec<PathBuf>,
}

impl JsonModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.files.push(file.into());
        self
    }
}

impl ModelBuilder for JsonModelBuilder {
    fn build(&self) -> Result<TypeModel> {
        let mut model = TypeModel::new();
        for file in &self.files {
            debug!(model = %file.display(), "loading type model");
            model.extend(TypeModel::from_json_file(file)?);
        }
        Ok(model)
    }
}

pub struct Compiler {
    config: Config,
    processors: Vec<Box<dyn TypeProcessor>>,
    source_compiler: Arc<dyn SourceCompiler>,
}

impl Compiler {
    /// A compiler running the default generation and non-null processors
    pub fn new(config: Config) -> Self {
        let processors: Vec<Box<dyn TypeProcessor>> =
            vec![Box::new(GenerationProcessor::new(config.fluent_naming)), Box::new(NonNullProcessor::new())];
        let source_compiler = Arc::new(JavacCompiler::new(config.javac.clone()));
        Self { config, processors, source_compiler }
    }

    /// Register an extra processor, run after the ones already present
    pub fn with_processor(mut self, processor: Box<dyn TypeProcessor>) -> Self {
        self.processors.push(processor);
        self
    }

    pub fn with_source_compiler(mut self, compiler: Arc<dyn SourceCompiler>) -> Self {
        self.source_compiler = compiler;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn class_pool(&self, model: &TypeModel) -> Result<ClassPool> {
        let major_version = self.config.major_version()?;
        let mut pool = ClassPool::with_system(major_version, self.config.validate);
        for layer in open_entries(&self.config.class_path) {
            pool.push_layer(layer);
        }
        if self.config.compile_sources && !self.config.source_roots.is_empty() {
            pool.push_layer(Box::new(CompilingClassPath::new(
                self.config.source_roots.clone(),
                self.config.class_path.clone(),
                self.config.language_level,
                Arc::clone(&self.source_compiler),
            )));
        }
        pool.push_layer(Box::new(ModelClassPath::new(model.clone(), major_version)));
        Ok(pool)
    }

    pub fn compile_with(&mut self, builder: &dyn ModelBuilder) -> Result<Session> {
        let model = builder.build()?;
        self.compile(model)
    }

    /// Analyze every source type with every processor, then realize
    pub fn compile(&mut self, model: TypeModel) -> Result<Session> {
        let pool = self.class_pool(&model)?;
        let types: Vec<_> = model.source_types().cloned().collect();
        let mut session = Session::new(self.config.clone(), model, pool);
        info!(types = types.len(), processors = self.processors.len(), "generation started");

        for decl in &types {
            for processor in self.processors.iter_mut() {
                if !processor.should_process(decl) {
                    continue;
                }
                debug!(handler = processor.name(), source = %decl.qualified_name, "analyzing");
                if !processor.process(decl, &mut session)? {
                    return Err(Error::Processor {
                        handler: processor.name().to_string(),
                        type_name: decl.qualified_name.clone(),
                    });
                }
            }
        }

        for processor in self.processors.iter_mut() {
            debug!(handler = processor.name(), "realizing");
            processor.post_process(&mut session).map_err(|source| Error::Realization {
                handler: processor.name().to_string(),
                source: Box::new(source),
            })?;
        }
        info!(classes = session.classes().len(), "generation finished");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Generate, MethodDecl, TypeDecl, TypeKind};

    fn person_model() -> TypeModel {
        let mut person = TypeDecl::new("demo.Person", TypeKind::Interface);
        person.directives.generate = Some(Generate::default());
        person.methods.push(MethodDecl::new("getName", "java.lang.String", vec![]));
        let mut model = TypeModel::new();
        model.insert(person);
        model
    }

    struct Refusing;

    impl TypeProcessor for Refusing {
        fn name(&self) -> &str {
            "refusing"
        }

        fn should_process(&self, _: &TypeDecl) -> bool {
            true
        }

        fn process(&mut self, _: &Arc<TypeDecl>, _: &mut Session) -> Result<bool> {
            Ok(false)
        }

        fn post_process(&mut self, _: &mut Session) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_compile_generates_implementation() {
        let mut compiler = Compiler::new(Config::new());
        let session = compiler.compile(person_model()).unwrap();
        let names: Vec<String> = session.results().iter().map(|r| r.qualified_name()).collect();
        assert_eq!(names, vec!["demo.PersonImpl"]);
    }

    #[test]
    fn test_refused_type_names_handler() {
        let mut compiler = Compiler::new(Config::new()).with_processor(Box::new(Refusing));
        match compiler.compile(person_model()) {
            Err(Error::Processor { handler, type_name }) => {
                assert_eq!(handler, "refusing");
                assert_eq!(type_name, "demo.Person");
            }
            Err(other) => panic!("expected processor error, got {other}"),
            Ok(_) => panic!("refused type was generated"),
        }
    }

    #[test]
    fn test_invalid_language_level() {
        let mut compiler = Compiler::new(Config::new().with_language_level(0));
        assert!(matches!(compiler.compile(TypeModel::new()), Err(Error::InvalidLanguageLevel { level: 0 })));
    }

    #[test]
    fn test_json_builder_merges_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.json");
        let second = dir.path().join("b.json");
        std::fs::write(&first, r#"{"types":[{"qualified_name":"demo.A","kind":"interface"}]}"#).unwrap();
        std::fs::write(&second, r#"{"types":[{"qualified_name":"demo.B","kind":"class"}]}"#).unwrap();
        let model = JsonModelBuilder::new().with_file(&first).with_file(&second).build().unwrap();
        assert_eq!(model.len(), 2);
        assert!(model.contains("demo.B"));
    }
}
