//! The table-driven parser.
//!
//! The parser walks a [`ParseTable`] against a token source, keeping an
//! interleaved stack of state indices, shifted tokens and reduced
//! nonterminals. On every reduction the terminal tokens covered by the
//! reduced rule are handed to the callback registered under the rule's
//! callback identifier.

use crate::grammar::{RuleId, Terminal};
use crate::lexer::Token;
use crate::lr1::StateId;
use crate::parse_table::{Action, ParseTable, Row};
use crate::IndexMap;

/// The token stream contract the parser pulls from.
pub trait TokenSource {
    /// The token under the cursor, or `None` once the input is exhausted.
    fn peek(&self) -> Option<&Token>;

    /// Advance past the current token, returning it.
    fn bump(&mut self) -> Option<Token>;

    fn at_end(&self) -> bool {
        self.peek().is_none()
    }
}

// パーススタックの要素。状態indexが常に先頭に来るよう交互に積まれる
#[derive(Debug)]
enum StackEntry {
    State(StateId),
    Tok(Token),
    Nt(String),
}

type Callback<'a> = Box<dyn FnMut(&[Token]) + 'a>;

/// A single-use parser over a shared parse table.
///
/// The table itself is immutable; each parser owns its own stack and
/// callback registry, so any number of parsers may run over one table.
pub struct Parser<'a> {
    table: &'a ParseTable<'a>,
    callbacks: IndexMap<String, Callback<'a>>,
}

impl<'a> Parser<'a> {
    pub fn new(table: &'a ParseTable<'a>) -> Self {
        Self {
            table,
            callbacks: IndexMap::new(),
        }
    }

    /// Register the handler dispatched for rules carrying the callback
    /// identifier `name`. The handler receives the terminal tokens covered
    /// by the reduced rule, in right-hand-side order.
    pub fn on<F>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: FnMut(&[Token]) + 'a,
    {
        self.callbacks.insert(name.into(), Box::new(handler));
        self
    }

    /// Run one parse to completion.
    pub fn parse<S>(&mut self, source: &mut S) -> Result<(), ParseError>
    where
        S: TokenSource,
    {
        let mut stack = vec![StackEntry::State(self.table.initial_state())];

        loop {
            let current = top_state(&stack);
            let row = self.table.row(current);

            let action = match lookup(row, source.peek()) {
                Some(action) => *action,
                None => {
                    return Err(match source.peek() {
                        Some(token) => ParseError::UnexpectedToken {
                            lexeme: token.lexeme.clone(),
                            state: current,
                        },
                        None => ParseError::UnexpectedEnd { state: current },
                    });
                }
            };

            match action {
                Action::Shift(next) => {
                    let token = source.bump().expect("shift always has a lookahead token");
                    tracing::trace!("shift `{}` -> {:02}", token.lexeme, next);
                    stack.push(StackEntry::Tok(token));
                    stack.push(StackEntry::State(next));
                }

                Action::Reduce(RuleId::ACCEPT) => {
                    tracing::trace!("accept");
                    return Ok(());
                }

                Action::Reduce(rule_id) => {
                    let rule = self.table.grammar().rule(rule_id);
                    tracing::trace!("reduce {}: {}", rule_id, rule.display());

                    // シンボルと状態indexのペアを丸ごと取り除き、
                    // 終端記号のみを規則の並び順で集める
                    let tail = stack.split_off(stack.len() - 2 * rule.right().len());
                    let tokens: Vec<Token> = tail
                        .into_iter()
                        .filter_map(|entry| match entry {
                            StackEntry::Tok(token) => Some(token),
                            _ => None,
                        })
                        .collect();

                    if let Some(name) = rule.callback() {
                        match self.callbacks.get_mut(name) {
                            Some(handler) => handler(&tokens),
                            None => {
                                return Err(ParseError::UnimplementedCallback {
                                    name: name.to_owned(),
                                });
                            }
                        }
                    }

                    let current = top_state(&stack);
                    let next = self.table.row(current).goto(rule.left()).ok_or_else(|| {
                        ParseError::MissingGoto {
                            state: current,
                            symbol: rule.left().to_owned(),
                        }
                    })?;
                    stack.push(StackEntry::Nt(rule.left().to_owned()));
                    stack.push(StackEntry::State(next));
                }
            }
        }
    }
}

fn top_state(stack: &[StackEntry]) -> StateId {
    match stack.last() {
        Some(StackEntry::State(id)) => *id,
        _ => unreachable!("a state index is always on top of the parse stack"),
    }
}

/// Form the action-map key for the current token: literal-class tokens
/// (delimiters, identifiers, strings) try `:<lexeme>` first and fall back
/// to their token-class key; end of input maps to `END`.
fn lookup<'r>(row: &'r Row, token: Option<&Token>) -> Option<&'r Action> {
    match token {
        None => row.action(&Terminal::end()),
        Some(token) => {
            if token.kind.is_literal_class() {
                if let Some(action) = row.action(&Terminal::literal(&token.lexeme)) {
                    return Some(action);
                }
            }
            token
                .kind
                .class()
                .and_then(|class| row.action(&Terminal::class(class)))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected token `{lexeme}` in state {state}")]
    UnexpectedToken { lexeme: String, state: StateId },

    #[error("unexpected end of input in state {state}")]
    UnexpectedEnd { state: StateId },

    #[error("callback `{name}` is not implemented")]
    UnimplementedCallback { name: String },

    #[error("no goto entry in state {state} for `{symbol}`")]
    MissingGoto { state: StateId, symbol: String },
}
