// Common test utilities
#![allow(dead_code)]

use std::path::Path;

use implgen::codegen::defs::major_versions::JAVA_8;
use implgen::codegen::insn::disassemble;
use implgen::pool::ClassHandle;
use implgen::result::WriteMode;
use implgen::{ClassResult, Compiler, Config, Session, TypeModel};

/// Configuration used by the integration tests: no on-demand compilation
pub fn test_config() -> Config {
    Config::new().with_compile_sources(false)
}

pub fn model(json: &str) -> TypeModel {
    TypeModel::from_json_str(json).unwrap()
}

pub fn compile(json: &str) -> Session {
    Compiler::new(test_config()).compile(model(json)).unwrap()
}

pub fn compile_with(config: Config, json: &str) -> implgen::Result<Session> {
    Compiler::new(config).compile(model(json))
}

pub fn result_names(session: &Session) -> Vec<String> {
    session.results().iter().map(|r| r.qualified_name()).collect()
}

/// Generated class read back from its emitted bytes
pub fn class(session: &Session, qualified_name: &str) -> ClassHandle {
    let result = session
        .classes()
        .get(qualified_name)
        .unwrap_or_else(|| panic!("{qualified_name} was not generated"));
    ClassHandle::from_bytes(result.bytecode()).unwrap()
}

/// Instructions of one method, without offsets
pub fn listing(handle: &ClassHandle, name: &str, descriptor: &str) -> Vec<String> {
    let file = handle.class_file();
    let index = file
        .find_method(name, descriptor)
        .unwrap_or_else(|| panic!("{}.{name}{descriptor} not found", handle.name()));
    let code = file.methods[index].code(&file.constant_pool).unwrap().unwrap();
    disassemble(&code.code, &file.constant_pool).unwrap().into_iter().map(|(_, text)| text).collect()
}

pub fn field_names(handle: &ClassHandle) -> Vec<String> {
    handle.fields().unwrap().into_iter().map(|f| f.name).collect()
}

pub fn constructor_descriptors(handle: &ClassHandle) -> Vec<String> {
    handle.constructors().unwrap().iter().map(|c| c.descriptor()).collect()
}

/// Write a prepared class below a classpath directory
pub fn write_class(root: &Path, handle: &ClassHandle) {
    let result = ClassResult::builder()
        .package_class_name(handle.name().as_str())
        .unwrap()
        .bytecode(handle.to_bytecode().unwrap())
        .build()
        .unwrap();
    result.write_to_file(root, WriteMode::Overwrite).unwrap();
}

pub fn new_class(name: &str) -> ClassHandle {
    ClassHandle::new(implgen::TypeName::new(name), JAVA_8)
}
