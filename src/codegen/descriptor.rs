//! Utilities to build and parse method/field descriptors

use crate::ast::TypeName;

use super::error::{ClassFormatError, ClassFormatResult};

pub fn type_to_descriptor(ty: &TypeName) -> String {
    let mut desc = String::new();
    let mut base = ty.as_str();
    while let Some(inner) = base.strip_suffix("[]") {
        desc.push('[');
        base = inner;
    }
    let code = match base {
        "int" => "I",
        "long" => "J",
        "float" => "F",
        "double" => "D",
        "boolean" => "Z",
        "char" => "C",
        "byte" => "B",
        "short" => "S",
        "void" => "V",
        _ => return format!("{}L{};", desc, base.replace('.', "/")),
    };
    desc.push_str(code);
    desc
}

pub fn method_descriptor(params: &[TypeName], ret: &TypeName) -> String {
    let mut d = String::from("(");
    for p in params {
        d.push_str(&type_to_descriptor(p));
    }
    d.push(')');
    d.push_str(&type_to_descriptor(ret));
    d
}

fn parse_one(desc: &str, chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> ClassFormatResult<TypeName> {
    let invalid = || ClassFormatError::InvalidDescriptor(desc.to_owned());
    let mut dims = 0;
    while chars.peek() == Some(&'[') {
        chars.next();
        dims += 1;
    }
    let base = match chars.next().ok_or_else(invalid)? {
        'I' => "int".to_owned(),
        'J' => "long".to_owned(),
        'F' => "float".to_owned(),
        'D' => "double".to_owned(),
        'Z' => "boolean".to_owned(),
        'C' => "char".to_owned(),
        'B' => "byte".to_owned(),
        'S' => "short".to_owned(),
        'V' if dims == 0 => "void".to_owned(),
        'L' => {
            let mut name = String::new();
            loop {
                match chars.next().ok_or_else(invalid)? {
                    ';' => break,
                    '/' => name.push('.'),
                    c => name.push(c),
                }
            }
            name
        }
        _ => return Err(invalid()),
    };
    let mut ty = TypeName::new(base);
    for _ in 0..dims {
        ty = ty.array_of();
    }
    Ok(ty)
}

pub fn parse_field_descriptor(desc: &str) -> ClassFormatResult<TypeName> {
    let mut chars = desc.chars().peekable();
    let ty = parse_one(desc, &mut chars)?;
    if chars.next().is_some() {
        return Err(ClassFormatError::InvalidDescriptor(desc.to_owned()));
    }
    Ok(ty)
}

/// Split a method descriptor into parameter types and return type
pub fn parse_method_descriptor(desc: &str) -> ClassFormatResult<(Vec<TypeName>, TypeName)> {
    let mut chars = desc.chars().peekable();
    if chars.next() != Some('(') {
        return Err(ClassFormatError::InvalidDescriptor(desc.to_owned()));
    }
    let mut params = Vec::new();
    while chars.peek() != Some(&')') {
        if chars.peek().is_none() {
            return Err(ClassFormatError::InvalidDescriptor(desc.to_owned()));
        }
        params.push(parse_one(desc, &mut chars)?);
    }
    chars.next();
    let ret = parse_one(desc, &mut chars)?;
    if chars.next().is_some() {
        return Err(ClassFormatError::InvalidDescriptor(desc.to_owned()));
    }
    Ok((params, ret))
}

/// Total slot count of a parameter list
pub fn parameter_slots(params: &[TypeName]) -> u16 {
    params.iter().map(TypeName::slot_size).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_descriptors() {
        let params = vec![TypeName::string(), TypeName::new("long"), TypeName::new("int[][]")];
        assert_eq!(method_descriptor(&params, &TypeName::void()), "(Ljava/lang/String;J[[I)V");
        assert_eq!(type_to_descriptor(&TypeName::new("java.util.Map$Entry")), "Ljava/util/Map$Entry;");
    }

    #[test]
    fn test_parse_method_descriptor() {
        let (params, ret) = parse_method_descriptor("(Ljava/lang/String;J[[I)Ljava/util/Optional;").unwrap();
        assert_eq!(params, vec![TypeName::string(), TypeName::new("long"), TypeName::new("int[][]")]);
        assert_eq!(ret, TypeName::new("java.util.Optional"));
        assert_eq!(parameter_slots(&params), 4);
    }

    #[test]
    fn test_reject_malformed() {
        assert!(parse_method_descriptor("(Ljava/lang/String").is_err());
        assert!(parse_field_descriptor("Q").is_err());
        assert!(parse_field_descriptor("[V").is_err());
    }
}
