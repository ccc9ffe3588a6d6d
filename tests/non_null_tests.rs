//! Null-check guards on generated mutators and on concrete methods of compiled classes

mod common;

use common::*;
use implgen::codegen::flag::access_flags::ACC_PUBLIC;
use implgen::codegen::tree::Stmt;
use implgen::{Error, TypeName};
use pretty_assertions::assert_eq;

fn setter_model(handler: &str, param_type: &str) -> String {
    format!(
        r#"{{
        "types": [{{
            "qualified_name": "demo.Person",
            "methods": [
                {{ "name": "setName", "is_abstract": true,
                   "params": [ {{ "name": "name", "type": "{param_type}", "non_null": {{ "handler": "{handler}" }} }} ] }}
            ],
            "directives": {{ "generate": {{}} }}
        }}]
    }}"#
    )
}

#[test]
fn test_default_guard_throws_with_formatted_message() {
    let session = compile(&setter_model("custom", "java.lang.String"));
    let person = class(&session, "demo.PersonImpl");
    let lines = listing(&person, "setName", "(Ljava/lang/String;)V");
    assert_eq!(lines[0], "aload_1");
    assert!(lines[1].starts_with("ifnonnull"), "{lines:?}");
    assert_eq!(
        &lines[2..7],
        [
            "new java/lang/NullPointerException",
            "dup",
            r#"ldc "Argument index 1 must not be null""#,
            "invokespecial java/lang/NullPointerException.<init>:(Ljava/lang/String;)V",
            "athrow"
        ]
    );
    assert_eq!(&lines[lines.len() - 4..], ["aload_0", "aload_1", "putfield demo/PersonImpl.name:Ljava/lang/String;", "return"]);
}

#[test]
fn test_guava_guard() {
    let session = compile(&setter_model("guava_preconditions", "java.lang.String"));
    let person = class(&session, "demo.PersonImpl");
    let lines = listing(&person, "setName", "(Ljava/lang/String;)V");
    assert!(lines.iter().any(|l| l.starts_with("invokestatic com/google/common/base/Preconditions.checkNotNull")));
}

#[test]
fn test_primitive_parameters_are_not_guarded() {
    let session = compile(&setter_model("custom", "int"));
    let person = class(&session, "demo.PersonImpl");
    assert_eq!(
        listing(&person, "setName", "(I)V"),
        vec!["aload_0", "iload_1", "putfield demo/PersonImpl.name:I", "return"]
    );
}

const SERVICE: &str = r#"{
    "types": [{
        "qualified_name": "demo.Service",
        "kind": "class",
        "methods": [
            { "name": "greet", "is_abstract": false,
              "params": [
                { "name": "count", "type": "int" },
                { "name": "name", "type": "java.lang.String",
                  "non_null": { "message": "parameter {0} is required", "exception": "java.lang.IllegalArgumentException" } }
              ] }
        ]
    }]
}"#;

#[test]
fn test_concrete_method_of_compiled_class_is_guarded() {
    let classes = tempfile::tempdir().unwrap();
    let mut service = new_class("demo.Service");
    service
        .add_method(ACC_PUBLIC, "greet", &[TypeName::int(), TypeName::string()], &TypeName::void(), &[Stmt::Return(None)])
        .unwrap();
    write_class(classes.path(), &service);

    let config = test_config().with_class_path_entry(classes.path());
    let session = compile_with(config, SERVICE).unwrap();
    assert_eq!(result_names(&session), vec!["demo.Service"]);

    let guarded = class(&session, "demo.Service");
    let lines = listing(&guarded, "greet", "(ILjava/lang/String;)V");
    assert_eq!(lines[0], "aload_2");
    assert!(lines.contains(&r#"ldc "parameter 2 is required""#.to_string()), "{lines:?}");
    assert!(lines.contains(&"new java/lang/IllegalArgumentException".to_string()));
    assert_eq!(lines.last().map(String::as_str), Some("return"));
}

#[test]
fn test_uncompiled_class_fails_realization() {
    match compile_with(test_config(), SERVICE) {
        Err(Error::Realization { handler, source }) => {
            assert_eq!(handler, "non-null");
            assert!(matches!(*source, Error::MissingSymbol { ref name } if name == "compiled class demo.Service"), "{source}");
        }
        other => panic!("expected a realization error, got {:?}", other.map(|s| s.results().len())),
    }
}
