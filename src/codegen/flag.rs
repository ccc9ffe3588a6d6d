//! Access flags for classes, fields and methods

pub mod access_flags {
    pub const ACC_PUBLIC: u16 = 0x0001;
    pub const ACC_PRIVATE: u16 = 0x0002;
    pub const ACC_PROTECTED: u16 = 0x0004;
    pub const ACC_STATIC: u16 = 0x0008;
    pub const ACC_FINAL: u16 = 0x0010;
    pub const ACC_SUPER: u16 = 0x0020;
    pub const ACC_SYNCHRONIZED: u16 = 0x0020;
    pub const ACC_VOLATILE: u16 = 0x0040;
    pub const ACC_BRIDGE: u16 = 0x0040;
    pub const ACC_TRANSIENT: u16 = 0x0080;
    pub const ACC_VARARGS: u16 = 0x0080;
    pub const ACC_NATIVE: u16 = 0x0100;
    pub const ACC_INTERFACE: u16 = 0x0200;
    pub const ACC_ABSTRACT: u16 = 0x0400;
    pub const ACC_STRICT: u16 = 0x0800;
    pub const ACC_SYNTHETIC: u16 = 0x1000;
    pub const ACC_ANNOTATION: u16 = 0x2000;
    pub const ACC_ENUM: u16 = 0x4000;
}

use access_flags::*;

/// Render method flags the way `javap` prints modifiers
pub fn describe_method_flags(flags: u16) -> String {
    let mut parts = Vec::new();
    if flags & ACC_PUBLIC != 0 { parts.push("public"); }
    if flags & ACC_PRIVATE != 0 { parts.push("private"); }
    if flags & ACC_PROTECTED != 0 { parts.push("protected"); }
    if flags & ACC_STATIC != 0 { parts.push("static"); }
    if flags & ACC_FINAL != 0 { parts.push("final"); }
    if flags & ACC_SYNCHRONIZED != 0 { parts.push("synchronized"); }
    if flags & ACC_NATIVE != 0 { parts.push("native"); }
    if flags & ACC_ABSTRACT != 0 { parts.push("abstract"); }
    parts.join(" ")
}

/// Render class flags the way `javap` prints modifiers
pub fn describe_class_flags(flags: u16) -> String {
    let mut parts = Vec::new();
    if flags & ACC_PUBLIC != 0 { parts.push("public"); }
    if flags & ACC_FINAL != 0 { parts.push("final"); }
    if flags & ACC_INTERFACE != 0 {
        parts.push("interface");
    } else {
        if flags & ACC_ABSTRACT != 0 { parts.push("abstract"); }
        parts.push("class");
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_flags() {
        assert_eq!(describe_method_flags(ACC_PUBLIC | ACC_STATIC), "public static");
        assert_eq!(describe_class_flags(ACC_PUBLIC | ACC_SUPER), "public class");
        assert_eq!(describe_class_flags(ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT), "public interface");
    }
}
