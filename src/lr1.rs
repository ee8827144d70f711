//! The canonical LR(1) automaton.
//!
//! States are sets of LR(1) items (a rule, a marker position, and the
//! merged lookahead set per core). Two states are equal only when their
//! item sets match exactly, lookaheads included; no LALR-style merging of
//! same-core states takes place.

use crate::first_sets::FirstSets;
use crate::grammar::{Grammar, RuleId, Symbol, Terminal};
use crate::util::display_fn;
use crate::{IndexMap, IndexSet};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StateId(usize);

impl StateId {
    /// The initial state of the automaton.
    pub const START: Self = Self(0);

    const fn new(raw: usize) -> Self {
        Self(raw)
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// LR(1) item
// X : Y1 Y2 ... Yn という構文規則に対しマーカ位置を付与したもの。
// 先読み記号はcore毎にまとめて保持する
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct LrItemCore {
    pub(crate) rule: RuleId,
    pub(crate) marker: usize,
}

//  - key: core item
//  - value: マージ済みの先読み記号
pub(crate) type LrItemSet = BTreeMap<LrItemCore, BTreeSet<Terminal>>;
type LrItemCores = BTreeSet<LrItemCore>;

/// A state of the automaton: its item set and outgoing edges.
#[derive(Debug)]
pub struct State {
    items: LrItemSet,
    edges: IndexMap<Symbol, StateId>,
}

impl State {
    /// Outgoing edges, one per symbol. Terminal labels become shift
    /// actions, nonterminal labels become goto entries.
    pub fn edges(&self) -> impl Iterator<Item = (&Symbol, StateId)> + '_ {
        self.edges.iter().map(|(symbol, target)| (symbol, *target))
    }

    pub(crate) fn items(&self) -> &LrItemSet {
        &self.items
    }
}

#[derive(Debug)]
pub struct Automaton {
    states: IndexMap<StateId, State>,
}

impl Automaton {
    /// Build the automaton for the given grammar.
    ///
    /// Every nonterminal referenced by the grammar must be defined by some
    /// rule; [`ParseTable::generate`](crate::parse_table::ParseTable::generate)
    /// validates this before construction.
    pub fn generate(grammar: &Grammar) -> Self {
        let first_sets = FirstSets::new(grammar);
        AutomatonGenerator {
            grammar,
            first_sets,
            queue: VecDeque::new(),
            next_id: 0,
            states: IndexMap::new(),
            same_cores: IndexMap::new(),
        }
        .generate()
    }

    /// Admitted states in index order.
    pub fn states(&self) -> impl Iterator<Item = (StateId, &State)> + '_ {
        self.states.iter().map(|(id, state)| (*id, state))
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[&id]
    }

    pub fn display<'a>(&'a self, grammar: &'a Grammar) -> impl fmt::Display + 'a {
        display_fn(move |f| {
            for (i, (id, state)) in self.states().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                writeln!(f, "#### State {:02}", id)?;

                writeln!(f, "## items")?;
                for (core, lookaheads) in &state.items {
                    write!(f, "- {}  [", display_core(grammar, core))?;
                    for (i, t) in lookaheads.iter().enumerate() {
                        if i > 0 {
                            f.write_str(" ")?;
                        }
                        write!(f, "{}", t)?;
                    }
                    f.write_str("]\n")?;
                }

                writeln!(f, "## edges")?;
                for (symbol, target) in state.edges() {
                    writeln!(f, "- {} -> {:02}", symbol, target)?;
                }

                writeln!(f, "## incoming")?;
                for (src, other) in self.states() {
                    for (symbol, target) in other.edges() {
                        if target == id {
                            writeln!(f, "- {:02} -({})", src, symbol)?;
                        }
                    }
                }
            }
            Ok(())
        })
    }
}

fn display_core<'a>(grammar: &'a Grammar, core: &'a LrItemCore) -> impl fmt::Display + 'a {
    display_fn(move |f| {
        let rule = grammar.rule(core.rule);
        write!(f, "({} :", rule.left())?;
        for (i, symbol) in rule.right().iter().enumerate() {
            if i == core.marker {
                f.write_str(" .")?;
            }
            write!(f, " {}", symbol)?;
        }
        if core.marker == rule.right().len() {
            f.write_str(" .")?;
        }
        f.write_str(")")
    })
}

// 遷移先の抽出が未完了な状態。生成元の状態を記憶しておき、
// 既存の状態への併合時にそのエッジを張り替える
#[derive(Debug)]
struct PendingState {
    id: StateId,
    items: LrItemSet,
    prev: Option<StateId>,
}

#[derive(Debug)]
struct AutomatonGenerator<'g> {
    grammar: &'g Grammar,
    first_sets: FirstSets,
    queue: VecDeque<PendingState>,
    next_id: usize,
    states: IndexMap<StateId, State>,
    same_cores: IndexMap<LrItemCores, IndexSet<StateId>>,
}

impl AutomatonGenerator<'_> {
    fn generate(mut self) -> Automaton {
        // 初期状態: [$accept : . <root> , END]
        let mut seed = LrItemSet::new();
        seed.insert(
            LrItemCore {
                rule: RuleId::ACCEPT,
                marker: 0,
            },
            Some(Terminal::end()).into_iter().collect(),
        );
        let start = self.fresh_id();
        self.queue.push_back(PendingState {
            id: start,
            items: seed,
            prev: None,
        });

        // 新規に状態が生成されなくなるまで繰り返す
        while let Some(PendingState { id, mut items, prev }) = self.queue.pop_front() {
            self.expand_closures(&mut items);

            let cores: LrItemCores = items.keys().copied().collect();

            // 同一のitem setを持つ状態が既にあればそちらに併合する
            let merged = self.same_cores.get(&cores).and_then(|candidates| {
                candidates
                    .iter()
                    .copied()
                    .find(|orig| self.states[orig].items == items)
            });
            if let Some(orig) = merged {
                if let Some(prev) = prev {
                    let prev_state = self.states.get_mut(&prev).expect("missing source state");
                    for target in prev_state.edges.values_mut() {
                        if *target == id {
                            *target = orig;
                        }
                    }
                }
                tracing::trace!("fold state {:02} into {:02}", id, orig);
                continue;
            }

            // 遷移先のitem setを生成し、状態生成のキューに登録する
            let mut edges = IndexMap::new();
            for (symbol, successor) in self.extract_transitions(&items) {
                let succ_id = self.fresh_id();
                self.queue.push_back(PendingState {
                    id: succ_id,
                    items: successor,
                    prev: Some(id),
                });
                edges.insert(symbol, succ_id);
            }

            tracing::trace!("admit state {:02} ({} items)", id, items.len());
            self.states.insert(id, State { items, edges });
            self.same_cores.entry(cores).or_default().insert(id);
        }

        self.finalize()
    }

    fn fresh_id(&mut self) -> StateId {
        let id = StateId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// クロージャ展開
    fn expand_closures(&self, items: &mut LrItemSet) {
        let mut changed = true;
        while changed {
            changed = false;

            // 候補の抽出
            let mut added: BTreeMap<LrItemCore, BTreeSet<Terminal>> = BTreeMap::new();
            for (core, lookaheads) in &*items {
                let rule = self.grammar.rule(core.rule);

                // [X : ... . Y beta]
                //  Y: one nonterminal symbol
                let (y, beta) = match &rule.right()[core.marker..] {
                    [Symbol::N(y), beta @ ..] => (y, beta),
                    _ => continue,
                };

                // 先読み記号: betaの先頭が終端記号ならそれ、非終端記号なら
                // そのFIRST集合、betaが空なら現在の先読みを伝播する
                let look: BTreeSet<Terminal> = match beta.first() {
                    Some(Symbol::T(t)) => Some(t.clone()).into_iter().collect(),
                    Some(Symbol::N(n)) => self.first_sets.get(n).iter().cloned().collect(),
                    None => lookaheads.clone(),
                };

                for (rule_id, rule) in self.grammar.rules() {
                    if rule.left() != y {
                        continue;
                    }
                    added
                        .entry(LrItemCore {
                            rule: rule_id,
                            marker: 0,
                        })
                        .or_default()
                        .extend(look.iter().cloned());
                }
            }

            for (core, look) in added {
                let lookaheads = items.entry(core).or_insert_with(|| {
                    changed = true;
                    BTreeSet::new()
                });
                for t in look {
                    changed |= lookaheads.insert(t);
                }
            }
        }
    }

    /// 指定したLRアイテム集合から遷移先のLRアイテム集合（未展開）とラベルを抽出する
    fn extract_transitions(&self, items: &LrItemSet) -> IndexMap<Symbol, LrItemSet> {
        let mut successors: IndexMap<Symbol, LrItemSet> = IndexMap::new();
        for (core, lookaheads) in items {
            let rule = self.grammar.rule(core.rule);

            // markerが終わりまで到達していれば無視する
            if core.marker >= rule.right().len() {
                continue;
            }

            let label = rule.right()[core.marker].clone();
            successors.entry(label).or_default().insert(
                LrItemCore {
                    rule: core.rule,
                    marker: core.marker + 1,
                },
                lookaheads.clone(),
            );
        }
        successors
    }

    /// 状態の併合によってIDが飛び飛びになっているため圧縮する
    fn finalize(self) -> Automaton {
        let remap: IndexMap<StateId, StateId> = self
            .states
            .keys()
            .enumerate()
            .map(|(i, id)| (*id, StateId::new(i)))
            .collect();

        let mut states = IndexMap::new();
        for (id, mut state) in self.states {
            for target in state.edges.values_mut() {
                *target = remap[&*target];
            }
            states.insert(remap[&id], state);
        }

        Automaton { states }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax;

    fn arithmetic() -> Grammar {
        syntax::parse(
            r#"
            term = add;
            add = add "+" mul | mul;
            mul = mul "*" unary | unary;
            unary = INT | "(" add ")";
            "#,
        )
        .unwrap()
    }

    #[test]
    fn start_state_is_zero() {
        let grammar = arithmetic();
        let automaton = Automaton::generate(&grammar);
        let (id, state) = automaton.states().next().unwrap();
        assert_eq!(id, StateId::START);
        assert!(state
            .items()
            .contains_key(&LrItemCore {
                rule: RuleId::ACCEPT,
                marker: 0,
            }));
    }

    // 同一のitem set（先読み記号込み）を持つ状態が重複して admit されないこと
    #[test]
    fn admitted_states_are_unique() {
        let grammar = arithmetic();
        let automaton = Automaton::generate(&grammar);
        let states: Vec<_> = automaton.states().collect();
        for (i, (_, a)) in states.iter().enumerate() {
            for (_, b) in states.iter().skip(i + 1) {
                assert_ne!(a.items(), b.items());
            }
        }
    }

    #[test]
    fn edges_are_wired_to_admitted_states() {
        let grammar = arithmetic();
        let automaton = Automaton::generate(&grammar);
        let ids: Vec<_> = automaton.states().map(|(id, _)| id).collect();
        for (_, state) in automaton.states() {
            for (_, target) in state.edges() {
                assert!(ids.contains(&target));
            }
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let grammar = arithmetic();
        let first = Automaton::generate(&grammar).display(&grammar).to_string();
        let second = Automaton::generate(&grammar).display(&grammar).to_string();
        assert_eq!(first, second);
    }
}
