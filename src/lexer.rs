//! The input tokenizer and token-source adapter.
//!
//! Tokens carry a type tag, the matched lexeme, and a parsed numeric value
//! for the numeric classes. The parser dispatches on the tag and lexeme
//! only; callbacks receive the full token.

use crate::grammar::TokenClass;
use crate::parser::TokenSource;
use logos::Logos;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Int,
    Real,
    Hex,
    Ident,
    Str,
    Delim,
}

impl TokenKind {
    /// The token-class key used as the action-map fallback. Delimiters
    /// have no class key; they only match literal entries.
    pub(crate) fn class(self) -> Option<TokenClass> {
        match self {
            Self::Int => Some(TokenClass::Int),
            Self::Real => Some(TokenClass::Real),
            Self::Hex => Some(TokenClass::Hex),
            Self::Ident => Some(TokenClass::Ident),
            Self::Str => Some(TokenClass::Str),
            Self::Delim => None,
        }
    }

    /// Whether the token should try the literal key `:<lexeme>` before its
    /// class key.
    pub(crate) fn is_literal_class(self) -> bool {
        matches!(self, Self::Delim | Self::Ident | Self::Str)
    }
}

/// The parsed value of a numeric token.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum NumberValue {
    Int(i64),
    Real(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// The matched text; string tokens are stored without their quotes.
    pub lexeme: String,
    pub number: Option<NumberValue>,
}

// 入力のトークン列
#[derive(Debug, Copy, Clone, Logos, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum RawToken {
    #[regex(r"0[xX][0-9a-fA-F]+")]
    Hex,

    #[regex(r"[0-9]+\.[0-9]+")]
    Real,

    #[regex(r"[0-9]+")]
    Int,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r#""[^"]*""#)]
    Str,

    #[regex(r##"[!#$%&'()*+,\-./:;<=>?@\[\\\]^`{|}~]"##)]
    Delim,
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = RawToken::lexer(input);
    let mut tokens = vec![];
    while let Some(result) = lexer.next() {
        let raw = result.map_err(|()| LexError::Unrecognized {
            offset: lexer.span().start,
            fragment: lexer.slice().to_owned(),
        })?;
        tokens.push(convert(raw, lexer.slice())?);
    }
    Ok(tokens)
}

fn convert(raw: RawToken, slice: &str) -> Result<Token, LexError> {
    let out_of_range = || LexError::NumberOutOfRange {
        lexeme: slice.to_owned(),
    };
    let (kind, lexeme, number) = match raw {
        RawToken::Hex => {
            let value = i64::from_str_radix(&slice[2..], 16).map_err(|_| out_of_range())?;
            (
                TokenKind::Hex,
                slice.to_owned(),
                Some(NumberValue::Int(value)),
            )
        }
        RawToken::Real => {
            let value = slice.parse().map_err(|_| out_of_range())?;
            (
                TokenKind::Real,
                slice.to_owned(),
                Some(NumberValue::Real(value)),
            )
        }
        RawToken::Int => {
            let value = slice.parse().map_err(|_| out_of_range())?;
            (
                TokenKind::Int,
                slice.to_owned(),
                Some(NumberValue::Int(value)),
            )
        }
        RawToken::Ident => (TokenKind::Ident, slice.to_owned(), None),
        RawToken::Str => (
            TokenKind::Str,
            slice[1..slice.len() - 1].to_owned(),
            None,
        ),
        RawToken::Delim => (TokenKind::Delim, slice.to_owned(), None),
    };
    Ok(Token {
        kind,
        lexeme,
        number,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum LexError {
    #[error("unrecognized input at byte {offset}: `{fragment}`")]
    Unrecognized { offset: usize, fragment: String },

    #[error("numeric literal out of range: `{lexeme}`")]
    NumberOutOfRange { lexeme: String },
}

/// A [`TokenSource`] over an in-memory token list.
#[derive(Debug)]
pub struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }
}

impl TokenSource for TokenStream {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers() {
        let tokens = tokenize("42 3.14 0xff").unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].kind, TokenKind::Int);
        assert_eq!(tokens[0].number, Some(NumberValue::Int(42)));
        assert_eq!(tokens[1].kind, TokenKind::Real);
        assert_eq!(tokens[1].number, Some(NumberValue::Real(3.14)));
        assert_eq!(tokens[2].kind, TokenKind::Hex);
        assert_eq!(tokens[2].number, Some(NumberValue::Int(255)));
    }

    #[test]
    fn idents_strings_delims() {
        let tokens = tokenize(r#"foo "bar baz" + ( )"#).unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            [
                TokenKind::Ident,
                TokenKind::Str,
                TokenKind::Delim,
                TokenKind::Delim,
                TokenKind::Delim,
            ]
        );
        assert_eq!(tokens[1].lexeme, "bar baz");
        assert_eq!(tokens[2].lexeme, "+");
    }

    #[test]
    fn arithmetic_input() {
        let tokens = tokenize("2 * (3+4)").unwrap();
        let lexemes: Vec<_> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(lexemes, ["2", "*", "(", "3", "+", "4", ")"]);
    }

    #[test]
    fn unrecognized_input() {
        let err = tokenize("1 \u{00a7} 2").unwrap_err();
        assert!(matches!(err, LexError::Unrecognized { offset: 2, .. }));
    }

    #[test]
    fn stream_cursor() {
        let mut stream = TokenStream::new(tokenize("1 2").unwrap());
        assert_eq!(stream.peek().unwrap().lexeme, "1");
        assert_eq!(stream.bump().unwrap().lexeme, "1");
        assert_eq!(stream.peek().unwrap().lexeme, "2");
        assert_eq!(stream.bump().unwrap().lexeme, "2");
        assert!(stream.peek().is_none());
        assert!(stream.at_end());
        assert!(stream.bump().is_none());
    }
}
