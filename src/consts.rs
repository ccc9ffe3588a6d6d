// Naming defaults for generated classes
pub const DEFAULT_CLASS_SUFFIX: &str = "Impl";

// hashCode accumulation step: result = result * HASH_MULTIPLIER + value
pub const HASH_MULTIPLIER: i32 = 59;
pub const HASH_SEED: i32 = 1;

// Non-null guards; {0} is replaced by the parameter index
pub const DEFAULT_NON_NULL_MESSAGE: &str = "Argument index {0} must not be null";
pub const DEFAULT_NON_NULL_EXCEPTION: &str = "java.lang.NullPointerException";

// Well-known classes referenced by synthesized bodies
pub const JAVA_LANG_OBJECT: &str = "java.lang.Object";
pub const JAVA_LANG_STRING: &str = "java.lang.String";
pub const JAVA_LANG_STRING_BUILDER: &str = "java.lang.StringBuilder";
pub const JAVA_UTIL_OBJECTS: &str = "java.util.Objects";
pub const GUAVA_PRECONDITIONS: &str = "com.google.common.base.Preconditions";
pub const GUAVA_MORE_OBJECTS: &str = "com.google.common.base.MoreObjects";
pub const GUAVA_TO_STRING_HELPER: &str = "com.google.common.base.MoreObjects$ToStringHelper";
pub const APACHE_VALIDATE: &str = "org.apache.commons.lang3.Validate";

// Simple names that resolve against java.lang in invocation templates
pub const JAVA_LANG_SIMPLE_TYPES: &[&str] = &[
    "String", "Object", "Throwable", "Integer", "Long", "Float", "Double", "Boolean", "Character",
    "Short", "Byte", "Math", "System", "StringBuilder",
];
