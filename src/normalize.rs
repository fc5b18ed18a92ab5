//! Conversion of an arbitrary context-free grammar into Chomsky Normal Form.
//!
//! Two rewrites are applied to every body of two or more symbols:
//!
//! 1. terminal isolation: each terminal is swapped for a fresh nonterminal
//!    `T<n>` whose only rule is `T<n> -> terminal`. One wrapper is made per
//!    distinct terminal and reused everywhere.
//! 2. binarization: `A -> s1 s2 ... sn` becomes the right-nested chain
//!    `A -> s1 X<i>`, `X<i> -> s2 X<j>`, ..., `X<k> -> s(n-1) sn`.
//!
//! Bodies of length one (lexical rules and unit rules) pass through untouched,
//! the recognizer closes unit rules itself. An already-normal grammar comes
//! back unchanged.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::error::GrammarError;
use crate::grammar::Grammar;
use crate::rules::{Production, Rule};

/// Hands out nonterminal names that don't collide with anything in the
/// grammar or with each other. The counter is shared by all prefixes and only
/// ever goes up.
struct FreshNames {
  taken: HashSet<String>,
  counter: usize,
}

impl FreshNames {
  fn new(g: &Grammar) -> Self {
    let taken = g
      .rules()
      .flat_map(|r| {
        std::iter::once(r.symbol_str()).chain(r.productions.iter().map(Production::symbol_str))
      })
      .map(str::to_string)
      .collect();
    Self { taken, counter: 0 }
  }

  fn next(&mut self, prefix: &str) -> String {
    loop {
      self.counter += 1;
      let name = format!("{}{}", prefix, self.counter);
      if self.taken.insert(name.clone()) {
        return name;
      }
    }
  }
}

/// Per-run normalization state
struct Normalizer {
  fresh: FreshNames,
  /// terminal -> its wrapper nonterminal
  wrappers: HashMap<String, String>,
  wrapper_rules: Vec<Rule>,
  rules: Vec<Rule>,
}

impl Normalizer {
  fn isolate_terminals(&mut self, body: &[Production]) -> Vec<Production> {
    let mut isolated = Vec::with_capacity(body.len());
    for p in body {
      match p {
        Production::Nonterminal(_) => isolated.push(p.clone()),
        Production::Terminal(word) => {
          let wrapper = match self.wrappers.get(word) {
            Some(wrapper) => wrapper.clone(),
            None => {
              let wrapper = self.fresh.next("T");
              trace!(%word, %wrapper, "isolating terminal");
              self
                .wrapper_rules
                .push(Rule::new(&wrapper, vec![Production::terminal(word)]));
              self.wrappers.insert(word.clone(), wrapper.clone());
              wrapper
            }
          };
          isolated.push(Production::nonterminal(&wrapper));
        }
      }
    }
    isolated
  }

  /// Rewrites `head -> body` (all nonterminals, len >= 2) as a chain of binary rules
  fn binarize(&mut self, head: &str, body: Vec<Production>) {
    let mut head = head.to_string();
    let mut rest = body.into_iter();
    while rest.len() > 2 {
      let first = rest.next().expect("len > 2");
      let link = self.fresh.next("X");
      self
        .rules
        .push(Rule::new(&head, vec![first, Production::nonterminal(&link)]));
      head = link;
    }
    self.rules.push(Rule::new(&head, rest.collect()));
  }

  fn normalize(&mut self, g: &Grammar, rule: &Rule) -> Result<(), GrammarError> {
    if rule.is_empty() {
      g.check_empty(rule)?;
      self.rules.push(rule.clone());
    } else if rule.len() == 1 {
      self.rules.push(rule.clone());
    } else {
      let body = self.isolate_terminals(&rule.productions);
      self.binarize(rule.symbol_str(), body);
    }
    Ok(())
  }
}

impl Grammar {
  /// Produces an equivalent grammar in Chomsky Normal Form (allowing unit
  /// rules, and an empty start rule when the start symbol is never used in
  /// a body).
  ///
  /// ```
  /// use cyktree::grammar::Grammar;
  ///
  /// let g: Grammar = "S -> NP eats NP; NP -> she | cake;".parse().unwrap();
  /// let cnf = g.to_cnf().unwrap();
  ///
  /// assert!(!g.is_cnf());
  /// assert!(cnf.is_cnf());
  /// assert_eq!(cnf.rules_for("S")[0].to_string(), "S -> NP X2");
  /// assert_eq!(cnf.rules_for("X2")[0].to_string(), "X2 -> T1 NP");
  /// assert_eq!(cnf.rules_for("T1")[0].to_string(), "T1 -> eats");
  /// ```
  pub fn to_cnf(&self) -> Result<Grammar, GrammarError> {
    let mut n = Normalizer {
      fresh: FreshNames::new(self),
      wrappers: HashMap::new(),
      wrapper_rules: Vec::new(),
      rules: Vec::with_capacity(self.rule_count()),
    };

    for rule in self.rules() {
      n.normalize(self, rule)?;
    }

    let fresh = n.fresh.counter;
    let mut rules = n.rules;
    rules.append(&mut n.wrapper_rules);

    let cnf = Grammar::new(&self.start, rules)?;
    cnf.validate_cnf()?;

    debug!(
      rules_in = self.rule_count(),
      rules_out = cnf.rule_count(),
      fresh,
      "normalized grammar"
    );
    Ok(cnf)
  }
}
