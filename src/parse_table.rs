//! Parse table assembly.
//!
//! Each automaton state becomes one table row: terminal-labelled edges turn
//! into shift entries, nonterminal-labelled edges into goto entries, and
//! completed items into reduce entries on their lookahead symbols. Every
//! entry slot is written at most once; an attempted overwrite is a conflict
//! and aborts the construction with a structured error.

use crate::grammar::{Grammar, RuleId, Symbol, Terminal};
use crate::lr1::{Automaton, StateId};
use crate::IndexMap;
use indexmap::map::Entry;
use std::fmt;

/// One table entry. Reducing the synthetic `$accept` rule is the accept
/// entry: it is only reachable on `END` and terminates a parse.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    Shift(StateId),
    Reduce(RuleId),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shift(next) => write!(f, "shift({:02})", next),
            Self::Reduce(RuleId::ACCEPT) => f.write_str("accept"),
            Self::Reduce(rule) => write!(f, "reduce({})", rule),
        }
    }
}

/// The row of a single state.
#[derive(Debug, Default)]
pub struct Row {
    actions: IndexMap<Terminal, Action>,
    gotos: IndexMap<String, StateId>,
}

impl Row {
    pub fn action(&self, terminal: &Terminal) -> Option<&Action> {
        self.actions.get(terminal)
    }

    pub fn goto(&self, nonterminal: &str) -> Option<StateId> {
        self.gotos.get(nonterminal).copied()
    }

    pub fn actions(&self) -> impl Iterator<Item = (&Terminal, &Action)> + '_ {
        self.actions.iter()
    }

    pub fn gotos(&self) -> impl Iterator<Item = (&str, StateId)> + '_ {
        self.gotos.iter().map(|(n, target)| (n.as_str(), *target))
    }
}

/// The shift/reduce/goto table derived from a grammar.
///
/// The table is immutable once generated and may be shared by reference
/// between any number of concurrent parses.
#[derive(Debug)]
pub struct ParseTable<'g> {
    grammar: &'g Grammar,
    rows: IndexMap<StateId, Row>,
}

impl<'g> ParseTable<'g> {
    /// Build the table for the given grammar, validating the grammar and
    /// detecting conflicts.
    pub fn generate(grammar: &'g Grammar) -> Result<Self, TableError> {
        validate(grammar)?;

        let automaton = Automaton::generate(grammar);
        let mut rows = IndexMap::new();
        for (id, state) in automaton.states() {
            let mut row = Row::default();

            // shift, goto
            for (symbol, target) in state.edges() {
                match symbol {
                    Symbol::T(t) => match row.actions.entry(t.clone()) {
                        Entry::Occupied(..) => {
                            return Err(TableError::DuplicateShift {
                                state: id,
                                symbol: t.clone(),
                            });
                        }
                        Entry::Vacant(entry) => {
                            entry.insert(Action::Shift(target));
                        }
                    },
                    Symbol::N(n) => match row.gotos.entry(n.clone()) {
                        Entry::Occupied(..) => {
                            return Err(TableError::DuplicateGoto {
                                state: id,
                                symbol: n.clone(),
                            });
                        }
                        Entry::Vacant(entry) => {
                            entry.insert(target);
                        }
                    },
                }
            }

            // reduce, accept
            for (core, lookaheads) in state.items() {
                let rule = grammar.rule(core.rule);
                if core.marker < rule.right().len() {
                    continue;
                }
                for t in lookaheads {
                    match row.actions.entry(t.clone()) {
                        Entry::Occupied(entry) => {
                            return Err(conflict(grammar, id, t.clone(), *entry.get(), core.rule));
                        }
                        Entry::Vacant(entry) => {
                            entry.insert(Action::Reduce(core.rule));
                        }
                    }
                }
            }

            rows.insert(id, row);
        }

        Ok(Self { grammar, rows })
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    pub fn row(&self, id: StateId) -> &Row {
        &self.rows[&id]
    }

    pub fn rows(&self) -> impl Iterator<Item = (StateId, &Row)> + '_ {
        self.rows.iter().map(|(id, row)| (*id, row))
    }

    pub fn initial_state(&self) -> StateId {
        StateId::START
    }
}

impl fmt::Display for ParseTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (id, row)) in self.rows().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "#### State {:02}", id)?;
            writeln!(f, "## actions")?;
            for (terminal, action) in row.actions() {
                match action {
                    Action::Reduce(rule) if *rule != RuleId::ACCEPT => {
                        writeln!(
                            f,
                            "- {} => reduce({}: {})",
                            terminal,
                            rule,
                            self.grammar.rule(*rule).display()
                        )?;
                    }
                    action => writeln!(f, "- {} => {}", terminal, action)?,
                }
            }
            writeln!(f, "## gotos")?;
            for (nonterminal, target) in row.gotos() {
                writeln!(f, "- {} => goto({:02})", nonterminal, target)?;
            }
        }
        Ok(())
    }
}

/// The grammar must be non-empty and every nonterminal referenced on a
/// right-hand side must be defined by some rule.
fn validate(grammar: &Grammar) -> Result<(), TableError> {
    if grammar.user_rules().next().is_none() {
        return Err(TableError::EmptyGrammar);
    }
    for (_, rule) in grammar.user_rules() {
        for symbol in rule.right() {
            if let Symbol::N(n) = symbol {
                if !grammar.is_nonterminal(n) {
                    return Err(TableError::UndefinedNonterminal { name: n.clone() });
                }
            }
        }
    }
    Ok(())
}

fn conflict(
    grammar: &Grammar,
    state: StateId,
    symbol: Terminal,
    existing: Action,
    reduce: RuleId,
) -> TableError {
    let display = |rule: RuleId| grammar.rule(rule).display().to_string();
    match existing {
        Action::Shift(next) => TableError::ShiftReduceConflict {
            state,
            symbol,
            next,
            rule: reduce,
            rule_display: display(reduce),
        },
        Action::Reduce(first) => TableError::ReduceReduceConflict {
            state,
            symbol,
            first,
            first_display: display(first),
            second: reduce,
            second_display: display(reduce),
        },
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("the grammar has no rules")]
    EmptyGrammar,

    #[error("nonterminal `{name}` is not defined by any rule")]
    UndefinedNonterminal { name: String },

    #[error(
        "shift/reduce conflict in state {state} on `{symbol}`: \
         shift({next}) vs reduce({rule}: {rule_display})"
    )]
    ShiftReduceConflict {
        state: StateId,
        symbol: Terminal,
        next: StateId,
        rule: RuleId,
        rule_display: String,
    },

    #[error(
        "reduce/reduce conflict in state {state} on `{symbol}`: \
         reduce({first}: {first_display}) vs reduce({second}: {second_display})"
    )]
    ReduceReduceConflict {
        state: StateId,
        symbol: Terminal,
        first: RuleId,
        first_display: String,
        second: RuleId,
        second_display: String,
    },

    #[error("duplicate shift entry in state {state} on `{symbol}`")]
    DuplicateShift { state: StateId, symbol: Terminal },

    #[error("duplicate goto entry in state {state} on `{symbol}`")]
    DuplicateGoto { state: StateId, symbol: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::TokenClass;
    use crate::syntax;

    #[test]
    fn arithmetic_has_no_conflicts() {
        let grammar = syntax::parse(
            r#"
            term = add;
            add = add "+" mul | mul;
            mul = mul "*" unary | unary;
            unary = INT | "(" add ")";
            "#,
        )
        .unwrap();
        let table = ParseTable::generate(&grammar).unwrap();

        // 初期状態から INT と "(" がshiftできること
        let row = table.row(table.initial_state());
        assert!(matches!(
            row.action(&Terminal::class(TokenClass::Int)),
            Some(Action::Shift(..))
        ));
        assert!(matches!(
            row.action(&Terminal::literal("(")),
            Some(Action::Shift(..))
        ));
        assert!(row.goto("add").is_some());
    }

    #[test]
    fn undefined_nonterminal_is_reported() {
        let grammar = syntax::parse("s = t;").unwrap();
        let err = ParseTable::generate(&grammar).unwrap_err();
        assert!(matches!(
            err,
            TableError::UndefinedNonterminal { name } if name == "t"
        ));
    }

    #[test]
    fn degenerate_cycle_is_a_reduce_reduce_conflict() {
        let grammar = syntax::parse(r#"s = s; s = "a";"#).unwrap();
        let err = ParseTable::generate(&grammar).unwrap_err();
        match err {
            TableError::ReduceReduceConflict { symbol, second, .. } => {
                assert_eq!(symbol, Terminal::end());
                assert_eq!(second, RuleId::ACCEPT);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn baseless_left_recursion_builds_a_table() {
        // 基底のない左再帰は表の構築には成功する（全入力は実行時に拒否される）
        let grammar = syntax::parse(r#"x = x "a";"#).unwrap();
        let table = ParseTable::generate(&grammar).unwrap();
        let row = table.row(table.initial_state());
        assert_eq!(row.actions().count(), 0);
        assert!(row.goto("x").is_some());
    }

    #[test]
    fn generation_is_deterministic() {
        let grammar = syntax::parse(
            r#"
            z = s;
            s = s "b";
            s = "b" a "a";
            a = "a" s "c";
            a = "a";
            "#,
        )
        .unwrap();
        let first = ParseTable::generate(&grammar).unwrap().to_string();
        let second = ParseTable::generate(&grammar).unwrap().to_string();
        assert_eq!(first, second);
    }
}
