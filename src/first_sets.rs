//! Calculation of first set function.
//!
//! `FIRST(A)` is the set of terminals that can begin a sentential form
//! derivable from the nonterminal `A`. Only the leftmost right-hand-side
//! symbol of each rule is consulted; this is sound because the grammar
//! model rejects epsilon productions.

use crate::grammar::{Grammar, RuleId, Symbol, Terminal};
use crate::{IndexMap, IndexSet};
use std::fmt;

#[derive(Debug)]
pub struct FirstSets {
    map: IndexMap<String, IndexSet<Terminal>>,
}

impl FirstSets {
    pub fn new(grammar: &Grammar) -> Self {
        // First(A) = {} と初期化する
        let mut map: IndexMap<String, IndexSet<Terminal>> = IndexMap::new();
        for name in grammar.nonterminals() {
            map.insert(name.to_owned(), IndexSet::new());
        }

        // 値が更新されなくなるまで繰り返す
        // A -> X beta に対し X が終端記号なら First(A) に追加し、
        // 非終端記号なら First(X) を First(A) に合併する
        let mut changed = true;
        while changed {
            changed = false;
            for (id, rule) in grammar.rules() {
                if id == RuleId::ACCEPT {
                    continue;
                }
                match &rule.right()[0] {
                    Symbol::T(t) => {
                        let set = map.get_mut(rule.left()).expect("undeclared nonterminal");
                        changed |= set.insert(t.clone());
                    }
                    Symbol::N(n) => {
                        let subset = map.get(n.as_str()).cloned().unwrap_or_default();
                        let set = map.get_mut(rule.left()).expect("undeclared nonterminal");
                        for t in subset {
                            changed |= set.insert(t);
                        }
                    }
                }
            }
        }

        Self { map }
    }

    /// `First(A)` for the nonterminal `A`.
    pub fn get(&self, nonterminal: &str) -> &IndexSet<Terminal> {
        self.map
            .get(nonterminal)
            .expect("unknown nonterminal symbol")
    }
}

impl fmt::Display for FirstSets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, set) in &self.map {
            write!(f, "{} :", name)?;
            for t in set {
                write!(f, " {}", t)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax;

    #[test]
    fn arithmetic() {
        let grammar = syntax::parse(
            r#"
            term = add;
            add = add "+" mul | mul;
            mul = mul "*" unary | unary;
            unary = INT | "(" add ")";
            "#,
        )
        .unwrap();
        let first = FirstSets::new(&grammar);

        let unary: Vec<_> = first.get("unary").iter().map(|t| t.as_str()).collect();
        assert_eq!(unary, ["INT", ":("]);
        for nt in ["term", "add", "mul"] {
            let mut set: Vec<_> = first.get(nt).iter().map(|t| t.as_str()).collect();
            set.sort_unstable();
            assert_eq!(set, [":(", "INT"]);
        }
    }

    // 完全性: 再度走査しても追加が発生しないこと
    #[test]
    fn is_fixed_point() {
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
        let first = FirstSets::new(&grammar);

        for (id, rule) in grammar.rules() {
            if id == RuleId::ACCEPT {
                continue;
            }
            match &rule.right()[0] {
                Symbol::T(t) => assert!(first.get(rule.left()).contains(t)),
                Symbol::N(n) => {
                    assert!(first.get(n).is_subset(first.get(rule.left())));
                }
            }
        }
    }

    #[test]
    fn baseless_recursion_stays_empty() {
        let grammar = syntax::parse(r#"x = x "a";"#).unwrap();
        let first = FirstSets::new(&grammar);
        assert!(first.get("x").is_empty());
    }
}
