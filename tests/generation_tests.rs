//! End-to-end generation of implementation classes from a type model

mod common;

use std::sync::Arc;

use common::*;
use implgen::ast::MethodDecl;
use implgen::codegen::tree::render_body;
use implgen::generation::{EqualsGenerator, MemberDescriptor, ToStringGenerator};
use implgen::pool::ClassPool;
use implgen::processor::{GenerationProcessor, TypeProcessor};
use implgen::{Error, Session, TypeName};
use pretty_assertions::assert_eq;

const PERSON: &str = r#"{
    "types": [
        {
            "qualified_name": "demo.Person",
            "methods": [
                { "name": "getName", "return_type": "java.lang.String", "is_abstract": true },
                { "name": "getAge", "return_type": "int", "is_abstract": true },
                { "name": "setName", "return_type": "void", "is_abstract": true,
                  "params": [ { "name": "name", "type": "java.lang.String" } ] }
            ],
            "directives": {
                "generate": {},
                "constructor": { "kinds": ["no_args", "all_args"] },
                "to_string": {},
                "equals": {},
                "hash_code": {}
            }
        }
    ]
}"#;

#[test]
fn test_person_implementation() {
    let session = compile(PERSON);
    assert_eq!(result_names(&session), vec!["demo.PersonImpl"]);

    let person = class(&session, "demo.PersonImpl");
    assert_eq!(person.interfaces().unwrap(), vec![TypeName::new("demo.Person")]);
    assert_eq!(person.superclass().unwrap(), Some(TypeName::object()));

    let mut fields = field_names(&person);
    fields.sort();
    assert_eq!(fields, vec!["age", "name"]);

    assert_eq!(
        listing(&person, "getName", "()Ljava/lang/String;"),
        vec!["aload_0", "getfield demo/PersonImpl.name:Ljava/lang/String;", "areturn"]
    );
    assert_eq!(
        listing(&person, "setName", "(Ljava/lang/String;)V"),
        vec!["aload_0", "aload_1", "putfield demo/PersonImpl.name:Ljava/lang/String;", "return"]
    );
    assert_eq!(constructor_descriptors(&person), vec!["()V", "(Ljava/lang/String;I)V"]);
    for (name, descriptor) in [
        ("toString", "()Ljava/lang/String;"),
        ("equals", "(Ljava/lang/Object;)Z"),
        ("hashCode", "()I"),
    ] {
        assert!(person.has_method(name, descriptor), "{name} missing");
    }
}

#[test]
fn test_fields_are_queued_before_methods() {
    let model = model(PERSON);
    let decl = Arc::clone(model.get("demo.Person").unwrap());
    let mut session = Session::new(test_config(), model, ClassPool::with_system(52, false));
    let mut processor = GenerationProcessor::new(true);
    assert!(processor.process(&decl, &mut session).unwrap());

    let actions = processor.pending().get("demo.Person").unwrap().describe();
    let last_field = actions.iter().rposition(|a| a.starts_with("field ")).unwrap();
    let first_method = actions.iter().position(|a| !a.starts_with("field ")).unwrap();
    assert!(last_field < first_method, "{actions:?}");
    assert_eq!(actions.iter().filter(|a| a.as_str() == "field java.lang.String name").count(), 1);
    assert_eq!(
        &actions[actions.len() - 3..],
        ["toString (builder) over 2 members", "equals over 2 members", "hashCode over 2 members"]
    );
}

#[test]
fn test_realizing_twice_keeps_single_constructor() {
    let first = compile(PERSON);
    let classes = tempfile::tempdir().unwrap();
    write_class(classes.path(), &class(&first, "demo.PersonImpl"));

    let config = test_config().with_class_path_entry(classes.path());
    let second = compile_with(config, PERSON).unwrap();
    let person = class(&second, "demo.PersonImpl");
    assert_eq!(constructor_descriptors(&person), vec!["()V", "(Ljava/lang/String;I)V"]);
    assert_eq!(field_names(&person).len(), 2);
    assert_eq!(person.interfaces().unwrap().len(), 1);
}

#[test]
fn test_required_args_skip_optional_members() {
    let session = compile(
        r#"{
        "types": [{
            "qualified_name": "demo.Contact",
            "methods": [
                { "name": "getEmail", "return_type": "java.lang.String", "is_abstract": true },
                { "name": "getPhone", "return_type": "java.lang.String", "is_abstract": true,
                  "directives": { "optional_field": true } }
            ],
            "directives": { "generate": {}, "constructor": { "kinds": ["required_args", "all_args"] } }
        }]
    }"#,
    );
    let contact = class(&session, "demo.ContactImpl");
    assert_eq!(
        constructor_descriptors(&contact),
        vec!["(Ljava/lang/String;)V", "(Ljava/lang/String;Ljava/lang/String;)V"]
    );
}

#[test]
fn test_equals_without_fields() {
    let session = compile(
        r#"{ "types": [{ "qualified_name": "demo.Marker", "directives": { "generate": {}, "equals": {} } }] }"#,
    );
    let marker = class(&session, "demo.MarkerImpl");
    let lines = listing(&marker, "equals", "(Ljava/lang/Object;)Z");
    assert!(lines.iter().any(|l| l.contains("java/lang/Object.getClass")));
    assert_eq!(&lines[lines.len() - 2..], ["iconst_1", "ireturn"]);

    let generator = EqualsGenerator::new(Vec::new(), Default::default());
    let body = render_body(&generator.body(&TypeName::new("demo.MarkerImpl"), &TypeName::object()));
    assert!(body.ends_with("return true;"), "{body}");
}

#[test]
fn test_to_string_lists_members_in_order() {
    let session = compile(PERSON);
    let person = class(&session, "demo.PersonImpl");
    let constants: Vec<String> = listing(&person, "toString", "()Ljava/lang/String;")
        .into_iter()
        .filter_map(|line| line.strip_prefix("ldc ").map(str::to_string))
        .collect();
    assert_eq!(constants, vec![r#""PersonImpl{""#, r#""name=""#, r#"", ""#, r#""age=""#, r#""}""#]);

    let owner = TypeName::new("demo.PersonImpl");
    let name = MemberDescriptor::new("name", MethodDecl::new("getName", "java.lang.String", vec![]));
    let generator = ToStringGenerator::new(vec![name], Default::default());
    assert_eq!(
        render_body(&generator.body(&owner, &TypeName::object())),
        "return new java.lang.StringBuilder(\"PersonImpl{\").append(\"name=\").append(this.getName()).append(\"}\").toString();"
    );
}

#[test]
fn test_abstract_class_source_forwards_super_constructor() {
    let session = compile(
        r#"{
        "types": [{
            "qualified_name": "demo.Entity",
            "kind": "class",
            "is_abstract": true,
            "constructors": [ { "params": [ { "name": "id", "type": "long" } ] } ],
            "methods": [ { "name": "getLabel", "return_type": "java.lang.String", "is_abstract": true } ],
            "directives": { "generate": { "target_package": "demo.gen" }, "constructor": { "kinds": ["all_args"] } }
        }]
    }"#,
    );
    assert_eq!(result_names(&session), vec!["demo.gen.EntityImpl"]);
    let entity = class(&session, "demo.gen.EntityImpl");
    assert_eq!(entity.superclass().unwrap(), Some(TypeName::new("demo.Entity")));
    let lines = listing(&entity, "<init>", "(Ljava/lang/String;J)V");
    assert_eq!(&lines[..3], ["aload_0", "lload_2", "invokespecial demo/Entity.<init>:(J)V"]);
}

#[test]
fn test_excluded_methods_are_not_generated() {
    let session = compile(
        r#"{
        "types": [
            { "qualified_name": "demo.Named", "library": true,
              "methods": [ { "name": "getName", "return_type": "java.lang.String", "is_abstract": true } ] },
            { "qualified_name": "demo.Tag", "interfaces": ["demo.Named"],
              "methods": [
                { "name": "getName", "return_type": "java.lang.String", "is_abstract": true,
                  "directives": { "exclude": true } },
                { "name": "getColor", "return_type": "java.lang.String", "is_abstract": true }
              ],
              "directives": { "generate": {} } }
        ]
    }"#,
    );
    let tag = class(&session, "demo.TagImpl");
    assert_eq!(field_names(&tag), vec!["color"]);
    assert!(!tag.has_method("getName", "()Ljava/lang/String;"));
}

#[test]
fn test_implemented_methods_are_left_alone() {
    let session = compile(
        r#"{
        "types": [
            { "qualified_name": "demo.Named", "library": true,
              "methods": [ { "name": "getName", "return_type": "java.lang.String", "is_abstract": true } ] },
            { "qualified_name": "demo.Account", "kind": "class", "is_abstract": true, "interfaces": ["demo.Named"],
              "methods": [
                { "name": "getName", "return_type": "java.lang.String", "is_abstract": false },
                { "name": "getBalance", "return_type": "long", "is_abstract": true }
              ],
              "directives": { "generate": {} } }
        ]
    }"#,
    );
    let account = class(&session, "demo.AccountImpl");
    assert_eq!(field_names(&account), vec!["balance"]);
    assert!(account.has_method("getBalance", "()J"));
    assert!(!account.has_method("getName", "()Ljava/lang/String;"));
}

#[test]
fn test_target_declared_only_in_model_is_missing() {
    let result = compile_with(
        test_config(),
        r#"{
        "types": [
            { "qualified_name": "demo.PersonImpl", "kind": "class" },
            { "qualified_name": "demo.Person",
              "methods": [ { "name": "getName", "return_type": "java.lang.String", "is_abstract": true } ],
              "directives": { "generate": {} } }
        ]
    }"#,
    );
    match result {
        Err(Error::Realization { handler, source }) => {
            assert_eq!(handler, "generation");
            assert!(matches!(*source, Error::MissingSymbol { ref name } if name == "compiled class demo.PersonImpl"), "{source}");
        }
        other => panic!("expected a missing target class, got {:?}", other.map(|s| result_names(&s))),
    }
}
