//! A canonical LR(1) parser generator.
//!
//! The crate turns a context-free grammar into a deterministic
//! shift/reduce/goto table and drives that table against a token stream,
//! invoking user-registered semantic callbacks on each reduction.
//!
//! A grammar is defined either programmatically via [`grammar::Grammar::define`]
//! or from the small rule language understood by [`syntax::parse`]:
//!
//! ```
//! use larix::{lexer, parse_table::ParseTable, parser::Parser, syntax};
//!
//! let grammar = syntax::parse(r#"
//!     list = item | list "," item;
//!     item = INT;
//! "#)?;
//! let table = ParseTable::generate(&grammar)?;
//! let mut parser = Parser::new(&table);
//! let mut tokens = lexer::TokenStream::new(lexer::tokenize("1, 2, 3")?);
//! parser.parse(&mut tokens)?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! Empty (epsilon) productions are not supported: the FIRST computation in
//! [`first_sets`] consults only the leftmost right-hand-side symbol, and
//! [`grammar::GrammarDef`] rejects rules with an empty right-hand side.

pub mod first_sets;
pub mod grammar;
pub mod lexer;
pub mod lr1;
pub mod parse_table;
pub mod parser;
pub mod syntax;

mod util;

pub(crate) use indexmap::{IndexMap, IndexSet};
