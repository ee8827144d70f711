//! Grammar types.
//!
//! Terminal symbols live in a single string namespace: literal lexemes are
//! stored with a leading colon (`:+`), token classes under their reserved
//! uppercase names (`INT`, `REAL`, `HEX`, `ID`, `STR`, `END`). Rules are
//! numbered in registration order; the first registered rule is the root
//! rule and its left-hand side is the start symbol.
//!
//! Empty right-hand sides are rejected: the grammar model (and the FIRST
//! computation built on it) does not support epsilon productions.

use crate::IndexSet;
use std::fmt;

/// The reserved token classes a terminal may refer to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenClass {
    Int,
    Real,
    Hex,
    Ident,
    Str,
    End,
}

impl TokenClass {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Int => "INT",
            Self::Real => "REAL",
            Self::Hex => "HEX",
            Self::Ident => "ID",
            Self::Str => "STR",
            Self::End => "END",
        }
    }

    /// Resolve a reserved class name, `END` included.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "INT" => Some(Self::Int),
            "REAL" => Some(Self::Real),
            "HEX" => Some(Self::Hex),
            "ID" => Some(Self::Ident),
            "STR" => Some(Self::Str),
            "END" => Some(Self::End),
            _ => None,
        }
    }
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A terminal symbol in its namespace encoding.
///
/// `Terminal::literal("+")` stores `:+`, `Terminal::class(TokenClass::Int)`
/// stores `INT`. The encoding is also the action-map key in the parse table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Terminal(String);

impl Terminal {
    pub fn literal(lexeme: impl AsRef<str>) -> Self {
        Self(format!(":{}", lexeme.as_ref()))
    }

    pub fn class(class: TokenClass) -> Self {
        Self(class.as_str().to_owned())
    }

    pub fn end() -> Self {
        Self::class(TokenClass::End)
    }

    pub fn is_literal(&self) -> bool {
        self.0.starts_with(':')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A grammar symbol: terminal or nonterminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    T(Terminal),
    N(String),
}

impl Symbol {
    pub fn literal(lexeme: impl AsRef<str>) -> Self {
        Self::T(Terminal::literal(lexeme))
    }

    pub fn class(class: TokenClass) -> Self {
        Self::T(Terminal::class(class))
    }

    pub fn nonterminal(name: impl Into<String>) -> Self {
        Self::N(name.into())
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::T(..))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::T(t) => fmt::Display::fmt(t, f),
            Self::N(n) => f.write_str(n),
        }
    }
}

/// Identifier of a production rule.
///
/// User rules are numbered positionally from zero; that index is the reduce
/// value emitted into the parse table. `RuleId::ACCEPT` identifies the
/// synthetic top-level rule `$accept : <root-lhs>`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct RuleId(usize);

impl RuleId {
    /// Reserved id of the synthetic accept rule.
    pub const ACCEPT: Self = Self(usize::MAX);

    /// The root rule: the first rule registered.
    pub const ROOT: Self = Self(0);

    pub(crate) const fn new(raw: usize) -> Self {
        Self(raw)
    }

    pub(crate) const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            &Self::ACCEPT => f.write_str("$accept"),
            Self(raw) => fmt::Display::fmt(raw, f),
        }
    }
}

/// A production rule.
#[derive(Debug)]
pub struct Rule {
    left: String,
    right: Vec<Symbol>,
    callback: Option<String>,
}

impl Rule {
    /// The left-hand nonterminal.
    pub fn left(&self) -> &str {
        &self.left
    }

    /// The right-hand symbol sequence.
    pub fn right(&self) -> &[Symbol] {
        &self.right
    }

    /// The callback identifier dispatched when this rule is reduced.
    pub fn callback(&self) -> Option<&str> {
        self.callback.as_deref()
    }

    pub fn display(&self) -> impl fmt::Display + '_ {
        crate::util::display_fn(move |f| {
            write!(f, "{} :", self.left)?;
            for symbol in &self.right {
                write!(f, " {}", symbol)?;
            }
            Ok(())
        })
    }
}

/// The grammar definition used to derive the parse table.
#[derive(Debug)]
pub struct Grammar {
    rules: Vec<Rule>,
    nonterminals: IndexSet<String>,
    accept_rule: Rule,
}

impl Grammar {
    /// Define a grammar using the specified function.
    pub fn define<F>(f: F) -> Result<Self, GrammarDefError>
    where
        F: FnOnce(&mut GrammarDef) -> Result<(), GrammarDefError>,
    {
        let mut def = GrammarDef { rules: vec![] };
        f(&mut def)?;
        def.end()
    }

    /// All rules in registration order, the synthetic accept rule first.
    pub fn rules(&self) -> impl Iterator<Item = (RuleId, &Rule)> + '_ {
        Some((RuleId::ACCEPT, &self.accept_rule))
            .into_iter()
            .chain(
                self.rules
                    .iter()
                    .enumerate()
                    .map(|(i, rule)| (RuleId::new(i), rule)),
            )
    }

    /// User rules only, in registration order.
    pub fn user_rules(&self) -> impl Iterator<Item = (RuleId, &Rule)> + '_ {
        self.rules
            .iter()
            .enumerate()
            .map(|(i, rule)| (RuleId::new(i), rule))
    }

    pub fn rule(&self, id: RuleId) -> &Rule {
        match id {
            RuleId::ACCEPT => &self.accept_rule,
            id => &self.rules[id.index()],
        }
    }

    /// Nonterminals in declaration order (left-hand sides).
    pub fn nonterminals(&self) -> impl Iterator<Item = &str> + '_ {
        self.nonterminals.iter().map(|n| n.as_str())
    }

    pub fn is_nonterminal(&self, name: &str) -> bool {
        self.nonterminals.contains(name)
    }

    /// The start symbol: left-hand side of the root rule.
    pub fn start_symbol(&self) -> &str {
        &self.rules[0].left
    }

    /// Terminals referenced anywhere in the grammar, in first-use order.
    pub fn terminals(&self) -> IndexSet<&Terminal> {
        let mut terminals = IndexSet::new();
        for rule in &self.rules {
            for symbol in &rule.right {
                if let Symbol::T(t) = symbol {
                    terminals.insert(t);
                }
            }
        }
        terminals
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "terminals: ")?;
        for (i, t) in self.terminals().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", t)?;
        }
        write!(f, "\nnonterminals: ")?;
        for (i, n) in self.nonterminals().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", n)?;
        }
        writeln!(f, "\nstart: {}", self.start_symbol())?;
        writeln!(f, "rules:")?;
        for (id, rule) in self.rules() {
            writeln!(f, "  [{:>7}] {}", id, rule.display())?;
        }
        Ok(())
    }
}

/// The contextual values for building a `Grammar`.
#[derive(Debug)]
pub struct GrammarDef {
    rules: Vec<Rule>,
}

impl GrammarDef {
    /// Register a new production rule with the given left-hand side and an
    /// empty right-hand side. The first rule registered becomes the root
    /// rule. Repeated left-hand sides are legal and represent alternation.
    pub fn rule(&mut self, left: impl Into<String>) -> Result<RuleId, GrammarDefError> {
        let left = left.into();
        if !is_ident(&left) {
            return Err(GrammarDefError::BadIdent { name: left });
        }
        let id = RuleId::new(self.rules.len());
        self.rules.push(Rule {
            left,
            right: vec![],
            callback: None,
        });
        Ok(id)
    }

    /// Append one symbol to the right-hand side of a registered rule.
    pub fn append(&mut self, rule: RuleId, symbol: Symbol) -> Result<(), GrammarDefError> {
        if let Symbol::N(name) = &symbol {
            if !is_ident(name) {
                return Err(GrammarDefError::BadIdent { name: name.clone() });
            }
        }
        self.rule_mut(rule)?.right.push(symbol);
        Ok(())
    }

    /// Set the callback identifier dispatched when the rule is reduced.
    pub fn callback(
        &mut self,
        rule: RuleId,
        name: impl Into<String>,
    ) -> Result<(), GrammarDefError> {
        let name = name.into();
        if !is_ident(&name) {
            return Err(GrammarDefError::BadCallback { name });
        }
        self.rule_mut(rule)?.callback = Some(name);
        Ok(())
    }

    fn rule_mut(&mut self, id: RuleId) -> Result<&mut Rule, GrammarDefError> {
        self.rules
            .get_mut(id.index())
            .ok_or(GrammarDefError::UnknownRule { id })
    }

    fn end(self) -> Result<Grammar, GrammarDefError> {
        if self.rules.is_empty() {
            return Err(GrammarDefError::EmptyGrammar);
        }
        for rule in &self.rules {
            if rule.right.is_empty() {
                return Err(GrammarDefError::EmptyRule {
                    left: rule.left.clone(),
                });
            }
        }

        let nonterminals: IndexSet<String> =
            self.rules.iter().map(|rule| rule.left.clone()).collect();
        let accept_rule = Rule {
            left: "$accept".to_owned(),
            right: vec![Symbol::N(self.rules[0].left.clone())],
            callback: None,
        };

        Ok(Grammar {
            rules: self.rules,
            nonterminals,
            accept_rule,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarDefError {
    #[error("the grammar has no rules")]
    EmptyGrammar,

    #[error("rule for `{left}` has an empty right-hand side (epsilon productions are unsupported)")]
    EmptyRule { left: String },

    #[error("incorrect identifier: `{name}`")]
    BadIdent { name: String },

    #[error("incorrect callback identifier: `{name}`")]
    BadCallback { name: String },

    #[error("unknown rule id: {id}")]
    UnknownRule { id: RuleId },
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
