//! Recursive descent parser for invocation and wrap templates
//!
//! Templates are single Java-like expressions such as `$0.setName($1)`,
//! `java.util.Objects.hash($$)` or `java.util.Optional.ofNullable(%s)`.
//! Names stay unresolved here; the class pool decides later whether a
//! dotted path denotes a class, a static field or a chain of field reads.

use std::fmt;

use super::lexer::{Lexer, LexicalToken, Token};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateExpr {
    /// `%s`
    Placeholder,
    /// `this` or `$0`
    This,
    /// `$1…$n`
    Param(u16),
    /// `$$`, only meaningful as a call argument
    AllParams,
    Null,
    Bool(bool),
    Int(i32),
    Str(String),
    /// Dotted name not followed by a call
    Path(Vec<String>),
    /// `target.name(args)`; no target means a call on `this`
    Call { target: Option<Box<TemplateExpr>>, name: String, args: Vec<TemplateExpr> },
    Field { target: Box<TemplateExpr>, name: String },
    New { class: String, args: Vec<TemplateExpr> },
}

impl TemplateExpr {
    /// Number of `%s` occurrences in the tree
    pub fn placeholder_count(&self) -> usize {
        match self {
            TemplateExpr::Placeholder => 1,
            TemplateExpr::Call { target, args, .. } => {
                target.as_ref().map_or(0, |t| t.placeholder_count())
                    + args.iter().map(TemplateExpr::placeholder_count).sum::<usize>()
            }
            TemplateExpr::Field { target, .. } => target.placeholder_count(),
            TemplateExpr::New { args, .. } => args.iter().map(TemplateExpr::placeholder_count).sum(),
            _ => 0,
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[TemplateExpr]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{arg}")?;
    }
    Ok(())
}

impl fmt::Display for TemplateExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateExpr::Placeholder => f.write_str("%s"),
            TemplateExpr::This => f.write_str("this"),
            TemplateExpr::Param(index) => write!(f, "${index}"),
            TemplateExpr::AllParams => f.write_str("$$"),
            TemplateExpr::Null => f.write_str("null"),
            TemplateExpr::Bool(value) => write!(f, "{value}"),
            TemplateExpr::Int(value) => write!(f, "{value}"),
            TemplateExpr::Str(value) => write!(f, "{value:?}"),
            TemplateExpr::Path(parts) => f.write_str(&parts.join(".")),
            TemplateExpr::Call { target, name, args } => {
                if let Some(target) = target {
                    write!(f, "{target}.")?;
                }
                write!(f, "{name}(")?;
                write_args(f, args)?;
                f.write_str(")")
            }
            TemplateExpr::Field { target, name } => write!(f, "{target}.{name}"),
            TemplateExpr::New { class, args } => {
                write!(f, "new {class}(")?;
                write_args(f, args)?;
                f.write_str(")")
            }
        }
    }
}

pub struct Parser<'s> {
    source: &'s str,
    tokens: Vec<LexicalToken>,
    current: usize,
}

impl<'s> Parser<'s> {
    pub fn new(source: &'s str) -> Result<Self> {
        let tokens = Lexer::new(source).tokenize().map_err(|message| Error::template(source, message))?;
        Ok(Self { source, tokens, current: 0 })
    }

    /// Parse one expression, optionally followed by `;`
    pub fn parse(mut self) -> Result<TemplateExpr> {
        if self.tokens.is_empty() {
            return Err(self.error("empty template"));
        }
        let expr = self.parse_expr()?;
        self.matches(Token::Semicolon);
        if let Some(extra) = self.peek() {
            return Err(self.error(format!("unexpected `{}` after expression", extra.lexeme)));
        }
        Ok(expr)
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::template(self.source, message)
    }

    fn peek(&self) -> Option<&LexicalToken> {
        self.tokens.get(self.current)
    }

    fn peek_is(&self, offset: usize, token: Token) -> bool {
        self.tokens.get(self.current + offset).map(|t| t.token == token).unwrap_or(false)
    }

    fn advance(&mut self) -> Result<LexicalToken> {
        let token = self.tokens.get(self.current).cloned().ok_or_else(|| self.error("unexpected end of template"))?;
        self.current += 1;
        Ok(token)
    }

    fn matches(&mut self, token: Token) -> bool {
        if self.peek_is(0, token) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<LexicalToken> {
        let next = self.advance()?;
        if next.token != token {
            return Err(self.error(format!("expected {what} but found `{}`", next.lexeme)));
        }
        Ok(next)
    }

    fn parse_expr(&mut self) -> Result<TemplateExpr> {
        let mut expr = self.parse_primary()?;
        while self.matches(Token::Dot) {
            let name = self.expect(Token::Identifier, "a member name")?.lexeme;
            if self.peek_is(0, Token::LParen) {
                let args = self.parse_args()?;
                expr = TemplateExpr::Call { target: Some(Box::new(expr)), name, args };
            } else {
                expr = TemplateExpr::Field { target: Box::new(expr), name };
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<TemplateExpr> {
        let token = self.advance()?;
        Ok(match token.token {
            Token::Placeholder => TemplateExpr::Placeholder,
            Token::This => TemplateExpr::This,
            Token::AllParams => TemplateExpr::AllParams,
            Token::Null => TemplateExpr::Null,
            Token::True => TemplateExpr::Bool(true),
            Token::False => TemplateExpr::Bool(false),
            Token::Param => {
                let index: u16 =
                    token.lexeme[1..].parse().map_err(|_| self.error(format!("bad parameter `{}`", token.lexeme)))?;
                if index == 0 {
                    TemplateExpr::This
                } else {
                    TemplateExpr::Param(index)
                }
            }
            Token::IntLiteral => TemplateExpr::Int(
                token.lexeme.parse().map_err(|_| self.error(format!("integer `{}` out of range", token.lexeme)))?,
            ),
            Token::StringLiteral => TemplateExpr::Str(unescape(&token.lexeme[1..token.lexeme.len() - 1])),
            Token::LParen => {
                let inner = self.parse_expr()?;
                self.expect(Token::RParen, "`)`")?;
                inner
            }
            Token::New => {
                let class = self.parse_dotted()?;
                let args = self.parse_args()?;
                TemplateExpr::New { class: class.join("."), args }
            }
            Token::Identifier => {
                self.current -= 1;
                let path = self.parse_dotted()?;
                if self.peek_is(0, Token::LParen) {
                    let args = self.parse_args()?;
                    let (name, qualifier) = path.split_last().ok_or_else(|| self.error("empty name"))?;
                    let target = if qualifier.is_empty() {
                        None
                    } else {
                        Some(Box::new(TemplateExpr::Path(qualifier.to_vec())))
                    };
                    TemplateExpr::Call { target, name: name.clone(), args }
                } else {
                    TemplateExpr::Path(path)
                }
            }
            _ => return Err(self.error(format!("unexpected `{}`", token.lexeme))),
        })
    }

    /// `a.b.c`
    fn parse_dotted(&mut self) -> Result<Vec<String>> {
        let mut parts = vec![self.expect(Token::Identifier, "a name")?.lexeme];
        while self.peek_is(0, Token::Dot) && self.peek_is(1, Token::Identifier) {
            self.current += 1;
            parts.push(self.advance()?.lexeme);
        }
        Ok(parts)
    }

    fn parse_args(&mut self) -> Result<Vec<TemplateExpr>> {
        self.expect(Token::LParen, "`(`")?;
        let mut args = Vec::new();
        if self.matches(Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if self.matches(Token::RParen) {
                return Ok(args);
            }
            self.expect(Token::Comma, "`,` or `)`")?;
        }
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

pub fn parse(source: &str) -> Result<TemplateExpr> {
    Parser::new(source)?.parse()
}
