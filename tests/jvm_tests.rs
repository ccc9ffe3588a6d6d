//! Generated and patched classes loaded and run on a real JVM
//!
//! Skipped when `java` or `javac` is not on the path.

mod common;

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use common::*;
use implgen::pool::{ClassHandle, ClassPath, CompilingClassPath, JavacCompiler};
use implgen::{generate_to_dir, Config, Error, WriteMode};
use pretty_assertions::assert_eq;

fn jdk_available() -> bool {
    ["java", "javac"].iter().all(|tool| {
        Command::new(tool).arg("-version").output().map(|out| out.status.success()).unwrap_or(false)
    })
}

const PERSON_JAVA: &str = r#"package demo;

public interface Person {
    String getName();
    int getAge();
    double getScore();
    void setName(String name);
}
"#;

const FACTORY_JAVA: &str = r#"package demo;

public class Factory {
    public static Person person(String name, int age, double score) {
        if (name.isEmpty()) {
            return null;
        }
        return null;
    }

    public static int helper() {
        return 42;
    }
}
"#;

const SERVICE_JAVA: &str = r#"package demo;

public class Service {
    public String greet(int count, String name) {
        StringBuilder out = new StringBuilder();
        for (int i = 0; i < count; i++) {
            try {
                out.append(name.charAt(i % name.length()));
            } catch (ArithmeticException e) {
                out.append('?');
            }
        }
        return out.toString();
    }
}
"#;

const MAIN_JAVA: &str = r#"import demo.*;

public class Main {
    public static void main(String[] args) {
        Person a = Factory.person("Ada", 36, Double.NaN);
        Person b = Factory.person("Ada", 36, Double.NaN);
        Person c = Factory.person("Bob", 36, Double.NaN);
        Person d = Factory.person("Ada", 36, -0.0);
        Person e = Factory.person("Ada", 36, 0.0);
        System.out.println("type=" + a.getClass().getName());
        System.out.println("string=" + a);
        System.out.println("self=" + a.equals(a));
        System.out.println("same=" + a.equals(b));
        System.out.println("other=" + a.equals(c));
        System.out.println("null=" + a.equals(null));
        System.out.println("foreign=" + a.equals("Ada"));
        System.out.println("zeros=" + d.equals(e));
        System.out.println("hash=" + (a.hashCode() == b.hashCode()));
        a.setName("Grace");
        System.out.println("renamed=" + a.getName());
        try {
            a.setName(null);
            System.out.println("guard=none");
        } catch (NullPointerException ex) {
            System.out.println("guard=" + ex.getMessage());
        }
        Service service = new Service();
        System.out.println("greet=" + service.greet(3, "ab"));
        try {
            service.greet(1, null);
            System.out.println("service=none");
        } catch (IllegalArgumentException ex) {
            System.out.println("service=" + ex.getMessage());
        }
        System.out.println("helper=" + Factory.helper());
    }
}
"#;

const MODEL: &str = r#"{
    "types": [
        {
            "qualified_name": "demo.Person",
            "methods": [
                { "name": "getName", "return_type": "java.lang.String", "is_abstract": true },
                { "name": "getAge", "return_type": "int", "is_abstract": true },
                { "name": "getScore", "return_type": "double", "is_abstract": true },
                { "name": "setName", "return_type": "void", "is_abstract": true,
                  "params": [ { "name": "name", "type": "java.lang.String", "non_null": {} } ] }
            ],
            "directives": {
                "generate": {},
                "constructor": { "kinds": ["all_args"] },
                "to_string": {},
                "equals": {},
                "hash_code": {},
                "factory": { "location": "demo.Factory", "method": "person" }
            }
        },
        {
            "qualified_name": "demo.Service",
            "kind": "class",
            "methods": [
                { "name": "greet", "return_type": "java.lang.String", "is_abstract": false,
                  "params": [
                    { "name": "count", "type": "int" },
                    { "name": "name", "type": "java.lang.String",
                      "non_null": { "message": "parameter {0} is required", "exception": "java.lang.IllegalArgumentException" } }
                  ] }
            ]
        }
    ]
}"#;

fn write_sources(root: &Path, files: &[(&str, &str)]) {
    for (relative, text) in files {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }
}

fn run(command: &mut Command) -> String {
    let output = command.output().unwrap();
    assert!(
        output.status.success(),
        "{command:?} failed\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn java_files(root: &Path) -> Vec<PathBuf> {
    ["demo/Person.java", "demo/Factory.java", "demo/Service.java"].iter().map(|f| root.join(f)).collect()
}

#[test]
fn test_generated_classes_run_on_the_jvm() {
    if !jdk_available() {
        eprintln!("java/javac not found, skipping");
        return;
    }
    let sources = tempfile::tempdir().unwrap();
    write_sources(
        sources.path(),
        &[("demo/Person.java", PERSON_JAVA), ("demo/Factory.java", FACTORY_JAVA), ("demo/Service.java", SERVICE_JAVA)],
    );
    let classes = tempfile::tempdir().unwrap();
    run(Command::new("javac").arg("-d").arg(classes.path()).args(java_files(sources.path())));

    // the pool compiles the same sources itself through javac
    let config = Config::new().with_source_root(sources.path());
    let written = generate_to_dir(model(MODEL), &config, classes.path(), WriteMode::Overwrite).unwrap();
    let mut names: Vec<String> =
        written.iter().map(|p| p.strip_prefix(classes.path()).unwrap().display().to_string()).collect();
    names.sort();
    assert_eq!(names, vec!["demo/Factory.class", "demo/PersonImpl.class", "demo/Service.class"]);

    let harness = tempfile::tempdir().unwrap();
    write_sources(harness.path(), &[("Main.java", MAIN_JAVA)]);
    run(Command::new("javac").arg("-cp").arg(classes.path()).arg("-d").arg(classes.path()).arg(harness.path().join("Main.java")));
    let stdout = run(Command::new("java").arg("-cp").arg(classes.path()).arg("Main"));

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "type=demo.PersonImpl",
            "string=PersonImpl{name=Ada, age=36, score=NaN}",
            "self=true",
            "same=true",
            "other=false",
            "null=false",
            "foreign=false",
            "zeros=false",
            "hash=true",
            "renamed=Grace",
            "guard=Argument index 1 must not be null",
            "greet=aba",
            "service=parameter 2 is required",
            "helper=42",
        ]
    );
}

#[test]
fn test_javac_compiles_sources_on_demand() {
    if !jdk_available() {
        eprintln!("java/javac not found, skipping");
        return;
    }
    let sources = tempfile::tempdir().unwrap();
    write_sources(sources.path(), &[("demo/Person.java", PERSON_JAVA), ("demo/Service.java", SERVICE_JAVA)]);
    let mut layer =
        CompilingClassPath::new(vec![sources.path().to_path_buf()], vec![], 8, Arc::new(JavacCompiler::default()));

    let person = ClassHandle::from_bytes(&layer.open_class("demo.Person").unwrap().unwrap()).unwrap();
    assert!(person.is_interface());
    assert!(!person.is_stub());
    assert!(person.method("getScore", "()D").unwrap().unwrap().is_abstract());

    let service = ClassHandle::from_bytes(&layer.open_class("demo.Service").unwrap().unwrap()).unwrap();
    assert_eq!(service.major_version(), 52);
    assert!(listing(&service, "greet", "(ILjava/lang/String;)Ljava/lang/String;").iter().any(|l| l.starts_with("goto")));
    assert!(layer.open_class("demo.Missing").unwrap().is_none());
}

#[test]
fn test_javac_errors_are_reported() {
    if !jdk_available() {
        eprintln!("java/javac not found, skipping");
        return;
    }
    let sources = tempfile::tempdir().unwrap();
    write_sources(sources.path(), &[("demo/Broken.java", "package demo; public class Broken { int x = ; }")]);
    let mut layer =
        CompilingClassPath::new(vec![sources.path().to_path_buf()], vec![], 8, Arc::new(JavacCompiler::default()));
    match layer.open_class("demo.Broken") {
        Err(Error::Compile { message }) => assert!(message.contains("Broken.java"), "{message}"),
        other => panic!("expected a compile error, got {:?}", other.map(|bytes| bytes.map(|b| b.len()))),
    }
}
