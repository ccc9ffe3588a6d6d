use logos::Logos;

/// Tokens of invocation and wrap templates
#[derive(Logos, Debug, PartialEq, Clone, Copy)]
pub enum Token {
    #[token("this")]
    This,
    #[token("null")]
    Null,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("new")]
    New,

    /// `$$`, every parameter of the enclosing method in order
    #[token("$$")]
    AllParams,
    /// `$0` is the receiver, `$1…$n` the parameters
    #[regex(r"\$[0-9]+")]
    Param,
    /// `%s`, the wrapped value
    #[token("%s")]
    Placeholder,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(";")]
    Semicolon,

    #[regex(r#""([^"\\]|\\.)*""#)]
    StringLiteral,
    #[regex(r"-?[0-9]+")]
    IntLiteral,
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_$]*")]
    Identifier,

    #[regex(r"[ \t\n\r]+")]
    Whitespace,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LexicalToken {
    pub token: Token,
    pub lexeme: String,
    pub offset: usize,
}

pub struct Lexer<'a> {
    lexer: logos::Lexer<'a, Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { lexer: Token::lexer(source) }
    }

    pub fn next_token(&mut self) -> Option<Result<LexicalToken, String>> {
        let token = self.lexer.next()?;
        let offset = self.lexer.span().start;
        match token {
            Ok(token) => Some(Ok(LexicalToken { token, lexeme: self.lexer.slice().to_string(), offset })),
            Err(_) => Some(Err(format!("unexpected input `{}` at offset {offset}", self.lexer.slice()))),
        }
    }

    /// All tokens except whitespace
    pub fn tokenize(mut self) -> Result<Vec<LexicalToken>, String> {
        let mut tokens = Vec::new();
        while let Some(result) = self.next_token() {
            let token = result?;
            if token.token != Token::Whitespace {
                tokens.push(token);
            }
        }
        Ok(tokens)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<LexicalToken, String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        Lexer::new(source).tokenize().unwrap().into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn test_lexer_invocation() {
        assert_eq!(
            kinds("$0.setName($1, $$);"),
            vec![
                Token::Param,
                Token::Dot,
                Token::Identifier,
                Token::LParen,
                Token::Param,
                Token::Comma,
                Token::AllParams,
                Token::RParen,
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_lexer_wrap_and_literals() {
        assert_eq!(
            kinds(r#"java.util.Optional.ofNullable(%s) "a\"b" -12 nullable"#),
            vec![
                Token::Identifier,
                Token::Dot,
                Token::Identifier,
                Token::Dot,
                Token::Identifier,
                Token::Dot,
                Token::Identifier,
                Token::LParen,
                Token::Placeholder,
                Token::RParen,
                Token::StringLiteral,
                Token::IntLiteral,
                Token::Identifier,
            ]
        );
    }

    #[test]
    fn test_lexer_rejects_unknown_input() {
        let err = Lexer::new("a + b").tokenize().unwrap_err();
        assert!(err.contains("offset 2"));
    }
}
