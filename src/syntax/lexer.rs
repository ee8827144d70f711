//! Tokenizer for the rule-definition language.

use logos::Logos;

#[derive(Debug, Clone, Logos, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    #[token("=")]
    Eq,

    #[token("|")]
    VertBar,

    #[token(";")]
    Semicolon,

    #[token("->")]
    Arrow,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_owned())]
    Ident(String),

    #[regex(r#""[^"]*""#, |lex| {
        let slice = lex.slice();
        slice[1..slice.len() - 1].to_owned()
    })]
    Str(String),
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = vec![];
    while let Some(result) = lexer.next() {
        let token = result.map_err(|()| LexError::Unrecognized {
            offset: lexer.span().start,
            fragment: lexer.slice().to_owned(),
        })?;
        tokens.push(token);
    }
    Ok(tokens)
}

#[derive(Debug, thiserror::Error)]
pub enum LexError {
    #[error("unrecognized input in rule definition at byte {offset}: `{fragment}`")]
    Unrecognized { offset: usize, fragment: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use Token::*;

    #[test]
    fn smoketest() {
        let input = r#"
            // arithmetic
            add = add "+" mul -> on_add | mul;
        "#;
        let tokens = tokenize(input).unwrap();
        assert_eq!(
            tokens,
            [
                Ident("add".into()),
                Eq,
                Ident("add".into()),
                Str("+".into()),
                Ident("mul".into()),
                Arrow,
                Ident("on_add".into()),
                VertBar,
                Ident("mul".into()),
                Semicolon,
            ]
        );
    }

    #[test]
    fn rejects_stray_input() {
        let err = tokenize("a = $;").unwrap_err();
        assert!(matches!(err, LexError::Unrecognized { .. }));
    }
}
