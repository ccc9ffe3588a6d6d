//! Invocation and wrap template parsing

pub mod lexer;
pub mod parser;

pub use lexer::Lexer;
pub use parser::{Parser, TemplateExpr};

use crate::error::{Error, Result};

/// Parse an invocation template
pub fn parse_template(source: &str) -> Result<TemplateExpr> {
    parser::parse(source)
}

/// Parse a wrap template, which must contain exactly one `%s`
pub fn parse_wrap(source: &str) -> Result<TemplateExpr> {
    let expr = parser::parse(source)?;
    match expr.placeholder_count() {
        1 => Ok(expr),
        n => Err(Error::template(source, format!("expected exactly one %s but found {n}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wrap() {
        assert!(parse_wrap("java.util.Optional.ofNullable(%s)").is_ok());
        assert!(parse_wrap("java.util.Optional.empty()").is_err());
        assert!(parse_wrap("pick(%s, %s)").is_err());
    }
}
