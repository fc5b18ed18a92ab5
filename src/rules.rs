use std::fmt;

/// A nonterminal, named by its grammar category
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
  pub name: String,
}

impl Symbol {
  pub fn new(name: String) -> Self {
    Self { name }
  }
}

impl fmt::Display for Symbol {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name)
  }
}

/// One element of a rule body. Whether a name is a terminal or a nonterminal
/// is decided once, when the grammar is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Production {
  Terminal(String),
  Nonterminal(Symbol),
}

impl Production {
  pub fn nonterminal(name: &str) -> Self {
    Self::Nonterminal(Symbol::new(name.to_string()))
  }

  pub fn terminal(word: &str) -> Self {
    Self::Terminal(word.to_string())
  }

  pub fn symbol_str(&self) -> &str {
    match self {
      Self::Terminal(s) => s,
      Self::Nonterminal(s) => &s.name,
    }
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, Self::Terminal(_))
  }

  pub fn is_nonterminal(&self) -> bool {
    matches!(self, Self::Nonterminal(_))
  }
}

impl fmt::Display for Production {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Terminal(s) => write!(f, "{}", s),
      Self::Nonterminal(s) => write!(f, "{}", s),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
  pub symbol: Symbol,
  pub productions: Vec<Production>,
}

impl Rule {
  pub fn new(symbol: &str, productions: Vec<Production>) -> Self {
    Self {
      symbol: Symbol::new(symbol.to_string()),
      productions,
    }
  }

  pub fn len(&self) -> usize {
    self.productions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn symbol_str(&self) -> &str {
    &self.symbol.name
  }

  /// `A -> word`
  pub fn is_lexical(&self) -> bool {
    self.len() == 1 && self.productions[0].is_terminal()
  }

  /// `A -> B`
  pub fn is_unit(&self) -> bool {
    self.len() == 1 && self.productions[0].is_nonterminal()
  }

  /// `A -> B C`
  pub fn is_binary(&self) -> bool {
    self.len() == 2 && self.productions.iter().all(Production::is_nonterminal)
  }

  /// Whether the recognizer can consume this rule as-is. Empty rules are
  /// checked separately, since they're only allowed on the start symbol.
  pub fn is_cnf(&self) -> bool {
    self.is_lexical() || self.is_unit() || self.is_binary()
  }

  pub fn nonterminals(&self) -> impl Iterator<Item = &Symbol> {
    self.productions.iter().filter_map(|p| match p {
      Production::Nonterminal(s) => Some(s),
      Production::Terminal(_) => None,
    })
  }
}

impl fmt::Display for Rule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ->", self.symbol)?;
    for p in self.productions.iter() {
      write!(f, " {}", p)?;
    }
    Ok(())
  }
}

#[test]
fn test_rule_shapes() {
  let lexical = Rule::new("N", vec![Production::terminal("cake")]);
  let unit = Rule::new("VP", vec![Production::nonterminal("V")]);
  let binary = Rule::new(
    "S",
    vec![Production::nonterminal("NP"), Production::nonterminal("VP")],
  );
  let mixed = Rule::new(
    "VP",
    vec![Production::nonterminal("V"), Production::terminal("with")],
  );
  let empty = Rule::new("S", Vec::new());

  assert!(lexical.is_lexical() && lexical.is_cnf());
  assert!(unit.is_unit() && unit.is_cnf());
  assert!(binary.is_binary() && binary.is_cnf());
  assert!(!mixed.is_cnf());
  assert!(empty.is_empty() && !empty.is_cnf());

  assert_eq!(binary.to_string(), "S -> NP VP");
  assert_eq!(empty.to_string(), "S ->");
  assert_eq!(
    mixed.nonterminals().map(|s| s.name.as_str()).collect::<Vec<_>>(),
    vec!["V"]
  );
}
