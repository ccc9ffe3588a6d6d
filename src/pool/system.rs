//! Built-in declarations of the platform classes generated code refers to
//!
//! Bodies are never needed for resolution, so every member is declared
//! `native` (or `abstract` on interfaces). The stubs are only consulted
//! when no configured classpath entry provides the class.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::ast::TypeName;
use crate::codegen::defs::major_versions::JAVA_8;
use crate::codegen::descriptor::parse_method_descriptor;
use crate::codegen::flag::access_flags::*;
use crate::error::Result;

use super::classpath::ClassPath;
use super::handle::ClassHandle;

const S: u16 = ACC_STATIC;
const V: u16 = ACC_STATIC | ACC_VARARGS;
const I: u16 = 0;

struct Stub {
    name: &'static str,
    interface: bool,
    superclass: &'static str,
    interfaces: &'static [&'static str],
    methods: &'static [(&'static str, &'static str, u16)],
}

const fn class(
    name: &'static str,
    superclass: &'static str,
    methods: &'static [(&'static str, &'static str, u16)],
) -> Stub {
    Stub { name, interface: false, superclass, interfaces: &[], methods }
}

const fn interface(
    name: &'static str,
    interfaces: &'static [&'static str],
    methods: &'static [(&'static str, &'static str, u16)],
) -> Stub {
    Stub { name, interface: true, superclass: "java/lang/Object", interfaces, methods }
}

const THROWABLE_INITS: &[(&str, &str, u16)] = &[("<init>", "()V", I), ("<init>", "(Ljava/lang/String;)V", I)];

static STUBS: &[Stub] = &[
    Stub {
        name: "java/lang/Object",
        interface: false,
        superclass: "",
        interfaces: &[],
        methods: &[
            ("<init>", "()V", I),
            ("equals", "(Ljava/lang/Object;)Z", I),
            ("hashCode", "()I", I),
            ("toString", "()Ljava/lang/String;", I),
            ("getClass", "()Ljava/lang/Class;", I),
        ],
    },
    class("java/lang/Class", "java/lang/Object", &[
        ("getName", "()Ljava/lang/String;", I),
        ("getSimpleName", "()Ljava/lang/String;", I),
    ]),
    interface("java/lang/CharSequence", &[], &[
        ("length", "()I", I),
        ("charAt", "(I)C", I),
        ("toString", "()Ljava/lang/String;", I),
    ]),
    Stub {
        name: "java/lang/String",
        interface: false,
        superclass: "java/lang/Object",
        interfaces: &["java/lang/CharSequence"],
        methods: &[
            ("<init>", "()V", I),
            ("<init>", "(Ljava/lang/String;)V", I),
            ("length", "()I", I),
            ("charAt", "(I)C", I),
            ("isEmpty", "()Z", I),
            ("concat", "(Ljava/lang/String;)Ljava/lang/String;", I),
            ("trim", "()Ljava/lang/String;", I),
            ("toUpperCase", "()Ljava/lang/String;", I),
            ("toLowerCase", "()Ljava/lang/String;", I),
            ("valueOf", "(Ljava/lang/Object;)Ljava/lang/String;", S),
            ("valueOf", "(I)Ljava/lang/String;", S),
            ("format", "(Ljava/lang/String;[Ljava/lang/Object;)Ljava/lang/String;", V),
        ],
    },
    Stub {
        name: "java/lang/StringBuilder",
        interface: false,
        superclass: "java/lang/Object",
        interfaces: &["java/lang/CharSequence"],
        methods: &[
            ("<init>", "()V", I),
            ("<init>", "(Ljava/lang/String;)V", I),
            ("append", "(Ljava/lang/String;)Ljava/lang/StringBuilder;", I),
            ("append", "(Ljava/lang/Object;)Ljava/lang/StringBuilder;", I),
            ("append", "(Ljava/lang/CharSequence;)Ljava/lang/StringBuilder;", I),
            ("append", "(Z)Ljava/lang/StringBuilder;", I),
            ("append", "(C)Ljava/lang/StringBuilder;", I),
            ("append", "(I)Ljava/lang/StringBuilder;", I),
            ("append", "(J)Ljava/lang/StringBuilder;", I),
            ("append", "(F)Ljava/lang/StringBuilder;", I),
            ("append", "(D)Ljava/lang/StringBuilder;", I),
            ("length", "()I", I),
            ("charAt", "(I)C", I),
        ],
    },
    class("java/lang/Number", "java/lang/Object", &[
        ("<init>", "()V", I),
        ("byteValue", "()B", I),
        ("shortValue", "()S", I),
        ("intValue", "()I", I),
        ("longValue", "()J", I),
        ("floatValue", "()F", I),
        ("doubleValue", "()D", I),
    ]),
    class("java/lang/Boolean", "java/lang/Object", &[
        ("valueOf", "(Z)Ljava/lang/Boolean;", S),
        ("booleanValue", "()Z", I),
        ("hashCode", "(Z)I", S),
    ]),
    class("java/lang/Character", "java/lang/Object", &[
        ("valueOf", "(C)Ljava/lang/Character;", S),
        ("charValue", "()C", I),
        ("hashCode", "(C)I", S),
    ]),
    class("java/lang/Byte", "java/lang/Number", &[("valueOf", "(B)Ljava/lang/Byte;", S)]),
    class("java/lang/Short", "java/lang/Number", &[("valueOf", "(S)Ljava/lang/Short;", S)]),
    class("java/lang/Integer", "java/lang/Number", &[
        ("valueOf", "(I)Ljava/lang/Integer;", S),
        ("hashCode", "(I)I", S),
        ("toString", "(I)Ljava/lang/String;", S),
    ]),
    class("java/lang/Long", "java/lang/Number", &[
        ("valueOf", "(J)Ljava/lang/Long;", S),
        ("hashCode", "(J)I", S),
    ]),
    class("java/lang/Float", "java/lang/Number", &[
        ("valueOf", "(F)Ljava/lang/Float;", S),
        ("compare", "(FF)I", S),
    ]),
    class("java/lang/Double", "java/lang/Number", &[
        ("valueOf", "(D)Ljava/lang/Double;", S),
        ("compare", "(DD)I", S),
    ]),
    class("java/lang/Throwable", "java/lang/Object", &[
        ("<init>", "()V", I),
        ("<init>", "(Ljava/lang/String;)V", I),
        ("getMessage", "()Ljava/lang/String;", I),
    ]),
    class("java/lang/Exception", "java/lang/Throwable", THROWABLE_INITS),
    class("java/lang/RuntimeException", "java/lang/Exception", THROWABLE_INITS),
    class("java/lang/NullPointerException", "java/lang/RuntimeException", THROWABLE_INITS),
    class("java/lang/IllegalArgumentException", "java/lang/RuntimeException", THROWABLE_INITS),
    class("java/lang/IllegalStateException", "java/lang/RuntimeException", THROWABLE_INITS),
    class("java/lang/UnsupportedOperationException", "java/lang/RuntimeException", THROWABLE_INITS),
    class("java/util/Objects", "java/lang/Object", &[
        ("equals", "(Ljava/lang/Object;Ljava/lang/Object;)Z", S),
        ("hash", "([Ljava/lang/Object;)I", V),
        ("hashCode", "(Ljava/lang/Object;)I", S),
        ("isNull", "(Ljava/lang/Object;)Z", S),
        ("nonNull", "(Ljava/lang/Object;)Z", S),
        ("requireNonNull", "(Ljava/lang/Object;)Ljava/lang/Object;", S),
        ("requireNonNull", "(Ljava/lang/Object;Ljava/lang/String;)Ljava/lang/Object;", S),
        ("toString", "(Ljava/lang/Object;)Ljava/lang/String;", S),
    ]),
    class("java/util/Optional", "java/lang/Object", &[
        ("empty", "()Ljava/util/Optional;", S),
        ("of", "(Ljava/lang/Object;)Ljava/util/Optional;", S),
        ("ofNullable", "(Ljava/lang/Object;)Ljava/util/Optional;", S),
        ("get", "()Ljava/lang/Object;", I),
        ("isPresent", "()Z", I),
        ("orElse", "(Ljava/lang/Object;)Ljava/lang/Object;", I),
    ]),
    interface("java/lang/Iterable", &[], &[]),
    interface("java/util/Collection", &["java/lang/Iterable"], &[
        ("size", "()I", I),
        ("isEmpty", "()Z", I),
        ("contains", "(Ljava/lang/Object;)Z", I),
        ("add", "(Ljava/lang/Object;)Z", I),
    ]),
    interface("java/util/List", &["java/util/Collection"], &[("get", "(I)Ljava/lang/Object;", I)]),
    Stub {
        name: "java/util/ArrayList",
        interface: false,
        superclass: "java/lang/Object",
        interfaces: &["java/util/List"],
        methods: &[("<init>", "()V", I), ("<init>", "(Ljava/util/Collection;)V", I)],
    },
    class("java/util/Collections", "java/lang/Object", &[
        ("emptyList", "()Ljava/util/List;", S),
        ("unmodifiableList", "(Ljava/util/List;)Ljava/util/List;", S),
    ]),
    class("java/text/MessageFormat", "java/lang/Object", &[
        ("format", "(Ljava/lang/String;[Ljava/lang/Object;)Ljava/lang/String;", V),
    ]),
    class("com/google/common/base/Preconditions", "java/lang/Object", &[
        ("checkNotNull", "(Ljava/lang/Object;)Ljava/lang/Object;", S),
        ("checkNotNull", "(Ljava/lang/Object;Ljava/lang/Object;)Ljava/lang/Object;", S),
        ("checkNotNull", "(Ljava/lang/Object;Ljava/lang/String;[Ljava/lang/Object;)Ljava/lang/Object;", V),
    ]),
    class("com/google/common/base/MoreObjects", "java/lang/Object", &[
        ("toStringHelper", "(Ljava/lang/Object;)Lcom/google/common/base/MoreObjects$ToStringHelper;", S),
        ("toStringHelper", "(Ljava/lang/String;)Lcom/google/common/base/MoreObjects$ToStringHelper;", S),
    ]),
    class("com/google/common/base/MoreObjects$ToStringHelper", "java/lang/Object", &[
        ("add", "(Ljava/lang/String;Ljava/lang/Object;)Lcom/google/common/base/MoreObjects$ToStringHelper;", I),
        ("add", "(Ljava/lang/String;Z)Lcom/google/common/base/MoreObjects$ToStringHelper;", I),
        ("add", "(Ljava/lang/String;C)Lcom/google/common/base/MoreObjects$ToStringHelper;", I),
        ("add", "(Ljava/lang/String;I)Lcom/google/common/base/MoreObjects$ToStringHelper;", I),
        ("add", "(Ljava/lang/String;J)Lcom/google/common/base/MoreObjects$ToStringHelper;", I),
        ("add", "(Ljava/lang/String;F)Lcom/google/common/base/MoreObjects$ToStringHelper;", I),
        ("add", "(Ljava/lang/String;D)Lcom/google/common/base/MoreObjects$ToStringHelper;", I),
        ("toString", "()Ljava/lang/String;", I),
    ]),
    class("org/apache/commons/lang3/Validate", "java/lang/Object", &[
        ("notNull", "(Ljava/lang/Object;)Ljava/lang/Object;", S),
        ("notNull", "(Ljava/lang/Object;Ljava/lang/String;[Ljava/lang/Object;)Ljava/lang/Object;", V),
    ]),
];

static INDEX: Lazy<HashMap<&'static str, &'static Stub>> = Lazy::new(|| STUBS.iter().map(|s| (s.name, s)).collect());

fn build(stub: &Stub) -> Result<Vec<u8>> {
    let name = TypeName::from_internal(stub.name);
    let mut handle = if stub.interface {
        ClassHandle::new_interface(name, JAVA_8)
    } else {
        ClassHandle::new(name, JAVA_8)
    };
    if stub.superclass.is_empty() {
        handle.clear_superclass();
    } else if stub.superclass != "java/lang/Object" {
        handle.set_superclass(&TypeName::from_internal(stub.superclass));
    }
    for interface in stub.interfaces {
        handle.add_interface(&TypeName::from_internal(interface));
    }
    for &(method, descriptor, flags) in stub.methods {
        let (params, ret) = parse_method_descriptor(descriptor)?;
        let body_flag = if stub.interface && flags & ACC_STATIC == 0 { ACC_ABSTRACT } else { ACC_NATIVE };
        handle.declare_method(ACC_PUBLIC | body_flag | flags, method, &params, &ret)?;
    }
    handle.to_bytecode()
}

/// Classpath layer serving the built-in declarations
#[derive(Debug, Default)]
pub struct SystemClassPath;

impl SystemClassPath {
    pub fn new() -> Self {
        Self
    }

    pub fn knows(name: &str) -> bool {
        INDEX.contains_key(name.replace('.', "/").as_str())
    }
}

impl ClassPath for SystemClassPath {
    fn open_class(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        match INDEX.get(name.replace('.', "/").as_str()) {
            Some(stub) => build(stub).map(Some),
            None => Ok(None),
        }
    }

    fn describe(&self) -> String {
        "<system>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_has_no_superclass() {
        let bytes = SystemClassPath::new().open_class("java.lang.Object").unwrap().unwrap();
        let handle = ClassHandle::from_bytes(&bytes).unwrap();
        assert_eq!(handle.superclass().unwrap(), None);
        assert!(handle.has_method("hashCode", "()I"));
    }

    #[test]
    fn test_varargs_and_interfaces() {
        let mut path = SystemClassPath::new();
        let objects = ClassHandle::from_bytes(&path.open_class("java.util.Objects").unwrap().unwrap()).unwrap();
        let hash = objects.method("hash", "([Ljava/lang/Object;)I").unwrap().unwrap();
        assert!(hash.is_static() && hash.is_varargs());

        let list = ClassHandle::from_bytes(&path.open_class("java.util.List").unwrap().unwrap()).unwrap();
        assert!(list.is_interface());
        assert_eq!(list.interfaces().unwrap(), vec![TypeName::new("java.util.Collection")]);
        assert!(list.method("get", "(I)Ljava/lang/Object;").unwrap().unwrap().is_abstract());
    }

    #[test]
    fn test_unknown_class() {
        assert!(SystemClassPath::new().open_class("demo.Missing").unwrap().is_none());
        assert!(SystemClassPath::knows("com.google.common.base.MoreObjects$ToStringHelper"));
    }
}
