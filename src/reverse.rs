use std::collections::{BTreeSet, HashMap};
use std::fmt;

use tracing::debug;

use crate::error::GrammarError;
use crate::grammar::Grammar;
use crate::rules::Production;

/// Dense index of a nonterminal, assigned in declaration order
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NtIdx(pub u32);

/// The CNF rules turned inside out: from a body to every head that produces it.
/// Bodies are keyed by a terminal (`A -> word`), a single nonterminal
/// (`A -> B`), or a pair of nonterminals (`A -> B C`).
#[derive(Debug, Clone)]
pub struct ReverseIndex {
  names: Vec<String>,
  ids: HashMap<String, NtIdx>,
  start: NtIdx,
  accepts_empty: bool,
  terminals: HashMap<String, BTreeSet<NtIdx>>,
  units: HashMap<NtIdx, BTreeSet<NtIdx>>,
  pairs: HashMap<(NtIdx, NtIdx), BTreeSet<NtIdx>>,
}

impl ReverseIndex {
  /// Builds the index in one pass over a grammar, which must already be in CNF.
  pub fn new(g: &Grammar) -> Result<Self, GrammarError> {
    g.validate_cnf()?;

    let names = g.nonterminals().to_vec();
    let ids = names
      .iter()
      .enumerate()
      .map(|(idx, name)| (name.clone(), NtIdx(idx as u32)))
      .collect::<HashMap<_, _>>();
    let start = ids
      .get(&g.start)
      .copied()
      .ok_or_else(|| GrammarError::MissingStart(g.start.clone()))?;
    let id = |name: &str| ids[name];

    let mut terminals: HashMap<String, BTreeSet<NtIdx>> = HashMap::new();
    let mut units: HashMap<NtIdx, BTreeSet<NtIdx>> = HashMap::new();
    let mut pairs: HashMap<(NtIdx, NtIdx), BTreeSet<NtIdx>> = HashMap::new();

    for rule in g.rules() {
      let head = id(rule.symbol_str());
      match rule.productions.as_slice() {
        [] => {}
        [Production::Terminal(word)] => {
          terminals.entry(word.clone()).or_default().insert(head);
        }
        [Production::Nonterminal(b)] => {
          units.entry(id(&b.name)).or_default().insert(head);
        }
        [Production::Nonterminal(b), Production::Nonterminal(c)] => {
          pairs
            .entry((id(&b.name), id(&c.name)))
            .or_default()
            .insert(head);
        }
        _ => return Err(GrammarError::NotCnf(rule.to_string())),
      }
    }

    debug!(
      nonterminals = names.len(),
      terminals = terminals.len(),
      units = units.len(),
      pairs = pairs.len(),
      "built reverse index"
    );

    Ok(Self {
      start,
      accepts_empty: g.is_nullable(&g.start),
      names,
      ids,
      terminals,
      units,
      pairs,
    })
  }

  pub fn start(&self) -> NtIdx {
    self.start
  }

  /// Whether the empty sentence is in the language
  pub fn accepts_empty(&self) -> bool {
    self.accepts_empty
  }

  pub fn id(&self, name: &str) -> Option<NtIdx> {
    self.ids.get(name).copied()
  }

  pub fn name(&self, nt: NtIdx) -> &str {
    &self.names[nt.0 as usize]
  }

  /// Number of interned nonterminals
  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Heads of `A -> word`, or None if the word isn't covered by the grammar
  pub fn lexical(&self, word: &str) -> Option<&BTreeSet<NtIdx>> {
    self.terminals.get(word)
  }

  /// Heads of `A -> b`
  pub fn unit(&self, b: NtIdx) -> Option<&BTreeSet<NtIdx>> {
    self.units.get(&b)
  }

  /// Heads of `A -> b c`
  pub fn pair(&self, b: NtIdx, c: NtIdx) -> Option<&BTreeSet<NtIdx>> {
    self.pairs.get(&(b, c))
  }

  /// Grows `cell` with every symbol reachable upward through unit rules.
  pub fn unit_closure(&self, cell: &mut BTreeSet<NtIdx>) {
    if self.units.is_empty() {
      return;
    }
    let mut pending = cell.iter().copied().collect::<Vec<_>>();
    while let Some(b) = pending.pop() {
      for &a in self.unit(b).into_iter().flatten() {
        if cell.insert(a) {
          pending.push(a);
        }
      }
    }
  }
}

impl fmt::Display for ReverseIndex {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let heads = |set: &BTreeSet<NtIdx>| {
      set
        .iter()
        .map(|nt| self.name(*nt))
        .collect::<Vec<_>>()
        .join(" ")
    };

    let mut terminals = self.terminals.iter().collect::<Vec<_>>();
    terminals.sort();
    for (word, set) in terminals {
      writeln!(f, "({}) <- {}", word, heads(set))?;
    }
    let mut units = self.units.iter().collect::<Vec<_>>();
    units.sort();
    for (b, set) in units {
      writeln!(f, "({}) <- {}", self.name(*b), heads(set))?;
    }
    let mut pairs = self.pairs.iter().collect::<Vec<_>>();
    pairs.sort();
    for ((b, c), set) in pairs {
      writeln!(f, "({} {}) <- {}", self.name(*b), self.name(*c), heads(set))?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kitchen() -> ReverseIndex {
    let g: Grammar = include_str!("../grammars/kitchen.cfg").parse().unwrap();
    ReverseIndex::new(&g).unwrap()
  }

  fn names(index: &ReverseIndex, set: Option<&BTreeSet<NtIdx>>) -> Vec<String> {
    set
      .into_iter()
      .flatten()
      .map(|nt| index.name(*nt).to_string())
      .collect()
  }

  #[test]
  fn test_lookups() {
    let index = kitchen();
    let id = |name: &str| index.id(name).unwrap();

    assert_eq!(index.name(index.start()), "S");
    assert_eq!(index.len(), 8);
    assert!(!index.accepts_empty());

    assert_eq!(names(&index, index.lexical("eats")), vec!["VP", "V"]);
    assert_eq!(names(&index, index.lexical("she")), vec!["NP"]);
    assert!(index.lexical("pizza").is_none());

    assert_eq!(names(&index, index.pair(id("NP"), id("VP"))), vec!["S"]);
    assert_eq!(names(&index, index.pair(id("VP"), id("PP"))), vec!["VP"]);
    assert!(index.pair(id("VP"), id("NP")).is_none());
    assert!(index.unit(id("NP")).is_none());
  }

  #[test]
  fn test_producers_are_a_set() {
    let g = Grammar::from_table(
      "S",
      &[("S", &[&["A", "A"], &["a"]]), ("A", &[&["a"]]), ("B", &[&["A", "A"]])],
    )
    .unwrap();
    let index = ReverseIndex::new(&g).unwrap();
    let a = index.id("A").unwrap();

    assert_eq!(names(&index, index.pair(a, a)), vec!["S", "B"]);
    assert_eq!(names(&index, index.lexical("a")), vec!["S", "A"]);
  }

  #[test]
  fn test_unit_closure() {
    let g: Grammar = "S -> A | B B; A -> B; B -> C | b; C -> A | c;".parse().unwrap();
    let index = ReverseIndex::new(&g).unwrap();
    let id = |name: &str| index.id(name).unwrap();

    let mut cell = BTreeSet::new();
    cell.insert(id("C"));
    index.unit_closure(&mut cell);
    assert_eq!(names(&index, Some(&cell)), vec!["S", "A", "B", "C"]);

    let mut cell = BTreeSet::new();
    index.unit_closure(&mut cell);
    assert!(cell.is_empty());
  }

  #[test]
  fn test_rejects_non_cnf() {
    let g: Grammar = "S -> a b;".parse().unwrap();
    assert_eq!(
      ReverseIndex::new(&g).unwrap_err(),
      GrammarError::NotCnf("S -> a b".to_string())
    );
  }

  #[test]
  fn test_start_without_rules() {
    let mut g: Grammar = "S -> A A; A -> a;".parse().unwrap();
    g.start = "Nope".to_string();
    assert_eq!(
      ReverseIndex::new(&g).unwrap_err(),
      GrammarError::MissingStart("Nope".to_string())
    );
  }

  #[test]
  fn test_display() {
    let g: Grammar = "S -> A A | A; A -> a;".parse().unwrap();
    let index = ReverseIndex::new(&g).unwrap();
    assert_eq!(index.to_string(), "(a) <- A\n(A) <- S\n(A A) <- S\n");
  }
}
