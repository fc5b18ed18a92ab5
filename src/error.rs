use std::error::Error;
use std::fmt;

/// A grammar that cannot be used for recognition. These are configuration
/// faults: they are raised while building a `Parser`, never while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
  /// The grammar has no rules at all
  EmptyRuleset,
  /// The start symbol has no rules
  MissingStart(String),
  /// A nonterminal is referenced in `rule` but never defined
  UndefinedNonterminal { symbol: String, rule: String },
  /// An empty body somewhere the CNF start-symbol exception doesn't cover
  EmptyBody(String),
  /// A rule that isn't `A -> B C`, `A -> B`, `A -> word` or `S -> ` survived normalization
  NotCnf(String),
}

impl fmt::Display for GrammarError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::EmptyRuleset => write!(f, "empty ruleset"),
      Self::MissingStart(start) => write!(f, "start symbol {} has no rules", start),
      Self::UndefinedNonterminal { symbol, rule } => {
        write!(f, "nonterminal {} is never defined (used in `{}`)", symbol, rule)
      }
      Self::EmptyBody(rule) => write!(
        f,
        "empty body in `{}`: only a start symbol that never appears in a body may be empty",
        rule
      ),
      Self::NotCnf(rule) => write!(f, "rule `{}` is not in Chomsky Normal Form", rule),
    }
  }
}

impl Error for GrammarError {}

/// A sentence that couldn't be run through the recognizer at all. Rejection
/// of a well-covered sentence is not an error, see `Recognition::accepted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
  /// No terminal production matches this token
  UnknownToken { token: String, position: usize },
}

impl fmt::Display for ParseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::UnknownToken { token, position } => {
        write!(f, "unrecognized token \"{}\" at position {}", token, position)
      }
    }
  }
}

impl Error for ParseError {}

#[test]
fn test_error_messages() {
  let e = ParseError::UnknownToken {
    token: "pizza".to_string(),
    position: 3,
  };
  assert_eq!(e.to_string(), "unrecognized token \"pizza\" at position 3");

  let e = GrammarError::UndefinedNonterminal {
    symbol: "Adj".to_string(),
    rule: "N -> Adj N".to_string(),
  };
  assert!(e.to_string().contains("Adj"));

  // both convert into the boxed error used by the text parser and the cli
  let boxed: crate::Err = e.into();
  assert!(boxed.to_string().contains("N -> Adj N"));
}
