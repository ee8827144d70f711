//! The rule-definition language.
//!
//! A thin front-end over [`GrammarDef`](crate::grammar::GrammarDef):
//!
//! ```text
//! rules = { rule } ;
//! rule  = ID "=" rhs { "|" rhs } ";" ;
//! rhs   = { item } [ "->" ID ] ;
//! item  = "INT" | "REAL" | "HEX" | "ID" | "STR" | ID | STR ;
//! ```
//!
//! Each alternative produces one rule with the shared left-hand side. A
//! bare identifier is a nonterminal, a quoted string a literal terminal,
//! and the five reserved uppercase names are token-class terminals. The
//! optional `-> name` sets the rule's callback identifier. There is no
//! syntax for an empty alternative.

pub mod lexer;

use self::lexer::Token;
use crate::grammar::{Grammar, GrammarDefError, Symbol, TokenClass};

/// Parse a grammar from its rule-language source.
pub fn parse(source: &str) -> Result<Grammar, SyntaxError> {
    let tokens = lexer::tokenize(source)?;
    let rules = Cursor { tokens: &tokens, pos: 0 }.parse_rules()?;

    let grammar = Grammar::define(|g| {
        for rule in &rules {
            for alternative in &rule.alternatives {
                let id = g.rule(rule.left.clone())?;
                for item in &alternative.items {
                    g.append(id, item.clone())?;
                }
                if let Some(name) = &alternative.callback {
                    g.callback(id, name.clone())?;
                }
            }
        }
        Ok(())
    })?;
    Ok(grammar)
}

struct RuleAst {
    left: String,
    alternatives: Vec<Alternative>,
}

struct Alternative {
    items: Vec<Symbol>,
    callback: Option<String>,
}

struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl Cursor<'_> {
    fn parse_rules(mut self) -> Result<Vec<RuleAst>, SyntaxError> {
        let mut rules = vec![];
        while self.peek().is_some() {
            rules.push(self.parse_rule()?);
        }
        Ok(rules)
    }

    fn parse_rule(&mut self) -> Result<RuleAst, SyntaxError> {
        let left = self.expect_ident("rule name")?;
        self.expect_eq()?;
        let mut alternatives = vec![self.parse_alternative()?];
        while matches!(self.peek(), Some(Token::VertBar)) {
            self.bump();
            alternatives.push(self.parse_alternative()?);
        }
        match self.bump() {
            Some(Token::Semicolon) => Ok(RuleAst { left, alternatives }),
            other => Err(self.unexpected("`;`", other)),
        }
    }

    fn parse_alternative(&mut self) -> Result<Alternative, SyntaxError> {
        let mut items = vec![];
        loop {
            match self.peek() {
                Some(Token::Ident(name)) => {
                    let symbol = match TokenClass::from_name(name) {
                        Some(TokenClass::End) | None => Symbol::nonterminal(name.clone()),
                        Some(class) => Symbol::class(class),
                    };
                    items.push(symbol);
                    self.bump();
                }
                Some(Token::Str(lexeme)) => {
                    items.push(Symbol::literal(lexeme));
                    self.bump();
                }
                _ => break,
            }
        }
        if items.is_empty() {
            let found = self.bump();
            return Err(self.unexpected("rule item", found));
        }

        let callback = if matches!(self.peek(), Some(Token::Arrow)) {
            self.bump();
            Some(self.expect_ident("callback name")?)
        } else {
            None
        };

        Ok(Alternative { items, callback })
    }

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

    fn expect_ident(&mut self, expected: &'static str) -> Result<String, SyntaxError> {
        match self.bump() {
            Some(Token::Ident(name)) => Ok(name),
            other => Err(self.unexpected(expected, other)),
        }
    }

    fn expect_eq(&mut self) -> Result<(), SyntaxError> {
        match self.bump() {
            Some(Token::Eq) => Ok(()),
            other => Err(self.unexpected("`=`", other)),
        }
    }

    fn unexpected(&self, expected: &'static str, found: Option<Token>) -> SyntaxError {
        let found = match found {
            Some(Token::Eq) => "`=`".to_owned(),
            Some(Token::VertBar) => "`|`".to_owned(),
            Some(Token::Semicolon) => "`;`".to_owned(),
            Some(Token::Arrow) => "`->`".to_owned(),
            Some(Token::Ident(name)) => format!("`{}`", name),
            Some(Token::Str(lexeme)) => format!("`\"{}\"`", lexeme),
            None => "end of input".to_owned(),
        };
        SyntaxError::Unexpected { expected, found }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyntaxError {
    #[error(transparent)]
    Lex(#[from] lexer::LexError),

    #[error("unexpected {found}, expected {expected}")]
    Unexpected {
        expected: &'static str,
        found: String,
    },

    #[error(transparent)]
    Grammar(#[from] GrammarDefError),
}
