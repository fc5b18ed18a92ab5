use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::GrammarError;
use crate::rules::{Production, Rule};
use crate::utils::Err;

/// A context-free grammar: every nonterminal maps to its set of bodies.
/// Frozen once built; `to_cnf` produces a new grammar rather than editing this one.
#[derive(Debug, Clone, PartialEq)]
pub struct Grammar {
  pub start: String,
  rules: HashMap<String, Vec<Rule>>,
  /// nonterminals in declaration order, so iteration (and fresh naming) is stable
  nonterminals: Vec<String>,
  nullables: HashSet<String>,
}

impl fmt::Display for Grammar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "//** start: {}", self.start)?;
    write!(f, "//** nonterminals:")?;
    for nt in self.nonterminals.iter() {
      write!(f, " {}", nt)?;
    }
    writeln!(f)?;

    write!(f, "//** nullables:")?;
    for nt in self.nonterminals.iter().filter(|nt| self.is_nullable(nt)) {
      write!(f, " {}", nt)?;
    }
    writeln!(f)?;

    for rule in self.rules() {
      writeln!(f, "{};", rule)?;
    }

    Ok(())
  }
}

impl Grammar {
  /// Builds a grammar, checking that the start symbol and every nonterminal
  /// used in a body have rules. Identical bodies for the same symbol are merged.
  pub fn new(start: &str, rules: Vec<Rule>) -> Result<Self, GrammarError> {
    if rules.is_empty() {
      return Err(GrammarError::EmptyRuleset);
    }

    let mut nonterminals = Vec::new();
    let mut by_symbol: HashMap<String, Vec<Rule>> = HashMap::new();
    for rule in rules {
      let bodies = by_symbol.entry(rule.symbol.name.clone()).or_insert_with(|| {
        nonterminals.push(rule.symbol.name.clone());
        Vec::new()
      });
      if !bodies.contains(&rule) {
        bodies.push(rule);
      }
    }

    if !by_symbol.contains_key(start) {
      return Err(GrammarError::MissingStart(start.to_string()));
    }

    for rule in nonterminals.iter().flat_map(|nt| &by_symbol[nt]) {
      if let Some(missing) = rule.nonterminals().find(|s| !by_symbol.contains_key(&s.name)) {
        return Err(GrammarError::UndefinedNonterminal {
          symbol: missing.name.clone(),
          rule: rule.to_string(),
        });
      }
    }

    let nullables = Self::find_nullables(&by_symbol);

    Ok(Self {
      start: start.to_string(),
      rules: by_symbol,
      nonterminals,
      nullables,
    })
  }

  /// Builds a grammar from a literal table of `(head, bodies)`. A name is a
  /// nonterminal iff it heads some entry of the table, otherwise it's a terminal.
  ///
  /// ```
  /// use cyktree::grammar::Grammar;
  ///
  /// let g = Grammar::from_table("S", &[
  ///   ("S", &[&["NP", "VP"]]),
  ///   ("NP", &[&["she"]]),
  ///   ("VP", &[&["eats"]]),
  /// ]).unwrap();
  ///
  /// assert_eq!(g.rule_count(), 3);
  /// assert!(g.is_cnf());
  /// ```
  pub fn from_table(start: &str, table: &[(&str, &[&[&str]])]) -> Result<Self, GrammarError> {
    let heads = table.iter().map(|(head, _)| *head).collect::<HashSet<_>>();

    let rules = table
      .iter()
      .flat_map(|(head, bodies)| {
        let heads = &heads;
        bodies.iter().map(move |body| {
          let productions = body
            .iter()
            .map(|name| {
              if heads.contains(name) {
                Production::nonterminal(name)
              } else {
                Production::terminal(name)
              }
            })
            .collect();
          Rule::new(head, productions)
        })
      })
      .collect::<Vec<_>>();

    Self::new(start, rules)
  }

  /// Reads and parses a grammar file in the text format of `parse_grammar`.
  pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Err> {
    let src = fs::read_to_string(path.as_ref())?;
    let g: Self = src.parse()?;
    debug!(
      path = %path.as_ref().display(),
      nonterminals = g.nonterminals.len(),
      rules = g.rule_count(),
      "read grammar"
    );
    Ok(g)
  }

  fn rule_is_nullable(nullables: &HashSet<String>, rule: &Rule) -> bool {
    rule.productions.iter().all(|p| match p {
      Production::Nonterminal(s) => nullables.contains(&s.name),
      Production::Terminal(_) => false,
    })
  }

  fn find_nullables(rules: &HashMap<String, Vec<Rule>>) -> HashSet<String> {
    let mut nullables: HashSet<String> = HashSet::new();

    let mut last_length = 1;
    while last_length != nullables.len() {
      last_length = nullables.len();
      for r in rules.values().flatten() {
        if !nullables.contains(r.symbol_str()) && Self::rule_is_nullable(&nullables, r) {
          nullables.insert(r.symbol.name.clone());
        }
      }
    }

    nullables
  }

  pub fn is_nullable(&self, s: &str) -> bool {
    self.nullables.contains(s)
  }

  pub fn is_nonterminal(&self, s: &str) -> bool {
    self.rules.contains_key(s)
  }

  /// Nonterminals in the order they were first declared
  pub fn nonterminals(&self) -> &[String] {
    &self.nonterminals
  }

  pub fn rules_for(&self, s: &str) -> &[Rule] {
    self.rules.get(s).map(Vec::as_slice).unwrap_or(&[])
  }

  /// All rules, grouped by head in declaration order
  pub fn rules(&self) -> impl Iterator<Item = &Rule> {
    self.nonterminals.iter().flat_map(move |nt| self.rules_for(nt))
  }

  pub fn rule_count(&self) -> usize {
    self.rules.values().map(Vec::len).sum()
  }

  /// Whether the start symbol occurs in any rule body
  pub fn start_in_body(&self) -> bool {
    self
      .rules()
      .any(|r| r.nonterminals().any(|s| s.name == self.start))
  }

  /// Checks an empty body is allowed: only on the start symbol, and only
  /// when the start symbol can't be used inside another derivation.
  pub(crate) fn check_empty(&self, rule: &Rule) -> Result<(), GrammarError> {
    if rule.symbol_str() == self.start && !self.start_in_body() {
      Ok(())
    } else {
      Err(GrammarError::EmptyBody(rule.to_string()))
    }
  }

  /// Fails on the first rule the recognizer couldn't consume directly.
  pub fn validate_cnf(&self) -> Result<(), GrammarError> {
    for rule in self.rules() {
      if rule.is_empty() {
        self.check_empty(rule)?;
      } else if !rule.is_cnf() {
        return Err(GrammarError::NotCnf(rule.to_string()));
      }
    }
    Ok(())
  }

  pub fn is_cnf(&self) -> bool {
    self.validate_cnf().is_ok()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_from_table_classifies_symbols() {
    let g = Grammar::from_table(
      "S",
      &[
        ("S", &[&["NP", "VP"]]),
        ("VP", &[&["V", "NP"], &["eats"]]),
        ("NP", &[&["he"], &["she"]]),
        ("V", &[&["eats"]]),
      ],
    )
    .unwrap();

    assert_eq!(g.nonterminals(), &["S", "VP", "NP", "V"]);
    assert!(g.is_nonterminal("VP"));
    assert!(!g.is_nonterminal("eats"));
    assert_eq!(g.rules_for("VP")[1].productions, vec![Production::terminal("eats")]);
    assert!(g.rules_for("nothing").is_empty());
    assert!(g.is_cnf());
  }

  #[test]
  fn test_duplicate_bodies_merge() {
    let g = Grammar::from_table(
      "S",
      &[("S", &[&["a"], &["a"]]), ("S", &[&["a"], &["b"]])],
    )
    .unwrap();

    assert_eq!(g.rule_count(), 2);
    assert_eq!(g.nonterminals(), &["S"]);
  }

  #[test]
  fn test_dangling_nonterminal() {
    let rules = vec![Rule::new(
      "S",
      vec![Production::nonterminal("NP"), Production::nonterminal("VP")],
    )];
    assert_eq!(
      Grammar::new("S", rules),
      Err(GrammarError::UndefinedNonterminal {
        symbol: "NP".to_string(),
        rule: "S -> NP VP".to_string(),
      })
    );
  }

  #[test]
  fn test_missing_start_and_empty() {
    assert_eq!(Grammar::new("S", Vec::new()), Err(GrammarError::EmptyRuleset));
    assert_eq!(
      Grammar::from_table("S", &[("A", &[&["a"]])]),
      Err(GrammarError::MissingStart("S".to_string()))
    );
  }

  #[test]
  fn test_nullables() {
    let g = Grammar::from_table(
      "S",
      &[
        ("S", &[&["A", "B"], &[]]),
        ("A", &[&[], &["a"]]),
        ("B", &[&["A"], &["b", "A"]]),
        ("C", &[&["c"]]),
      ],
    )
    .unwrap();

    assert!(g.is_nullable("S"));
    assert!(g.is_nullable("A"));
    assert!(g.is_nullable("B"));
    assert!(!g.is_nullable("C"));
  }

  #[test]
  fn test_validate_cnf() {
    let flat = Grammar::from_table(
      "S",
      &[("S", &[&["NP", "eats", "NP"]]), ("NP", &[&["she"]])],
    )
    .unwrap();
    assert_eq!(
      flat.validate_cnf(),
      Err(GrammarError::NotCnf("S -> NP eats NP".to_string()))
    );

    let empty_start = Grammar::from_table("S", &[("S", &[&[], &["a"]])]).unwrap();
    assert!(empty_start.is_cnf());

    let recursive_empty = Grammar::from_table("S", &[("S", &[&[], &["S", "S"], &["a"]])]).unwrap();
    assert_eq!(
      recursive_empty.validate_cnf(),
      Err(GrammarError::EmptyBody("S ->".to_string()))
    );
  }

  #[test]
  fn test_display() {
    let g = Grammar::from_table("S", &[("S", &[&["A", "A"]]), ("A", &[&["a"]])]).unwrap();
    assert_eq!(
      g.to_string(),
      "//** start: S\n//** nonterminals: S A\n//** nullables:\nS -> A A;\nA -> a;\n"
    );
  }
}
