//! Simple recursive-descent parsing of grammar files
//!
//! ```text
//! // comments run to the end of the line
//! S  -> NP VP;
//! VP -> VP PP | V NP | eats;
//! NP -> Det N | "o'neill";
//! ```
//!
//! Names starting with a lower-case letter, and anything in double quotes,
//! are terminals. Every other name is a nonterminal. The first rule's head
//! is the start symbol.

use regex::Regex;
use std::str::FromStr;

use crate::grammar::Grammar;
use crate::rules::{Production, Rule, Symbol};
use crate::Err;

impl FromStr for Grammar {
  type Err = Err;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (rules, rest) = parse_rules(s)?;
    if !rest.is_empty() {
      return Err(format!("trailing input at {}", rest).into());
    }

    let start = match rules.first() {
      Some(rule) => rule.symbol.name.clone(),
      None => return Err("empty ruleset".into()),
    };

    Ok(Grammar::new(&start, rules)?)
  }
}

type Infallible<'a, T> = (T, &'a str);
type ParseResult<'a, T> = Result<(T, &'a str), Err>;

/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: Regex = Regex::new($pattern).unwrap();
    }
  };
}

/// Try to consume a regex, returning None if it doesn't match
fn optional_re<'a>(re: &'static Regex, s: &'a str) -> Infallible<'a, Option<&'a str>> {
  match re.find(s) {
    Some(m) if m.start() == 0 => (Some(m.as_str()), &s[m.end()..]),
    _ => (None, s),
  }
}

/// Try to consume a regex, failing if it doesn't match
fn needed_re<'a>(re: &'static Regex, s: &'a str) -> ParseResult<'a, &'a str> {
  if let (Some(c), rest) = optional_re(re, s) {
    Ok((c, rest))
  } else {
    Err(format!("couldn't match {} at {}", re, s).into())
  }
}

/// Try to consume a char, returning None if it doesn't match
fn optional_char(c: char, s: &str) -> Infallible<'_, Option<char>> {
  match s.strip_prefix(c) {
    Some(rest) => (Some(c), rest),
    None => (None, s),
  }
}

/// Tries to skip whitespace and // comments
fn skip_whitespace(s: &str) -> &str {
  regex_static!(WHITESPACE_OR_COMMENT, r"(?:\s+|//[^\n]*)+");
  optional_re(&WHITESPACE_OR_COMMENT, s).1
}

/// Tries to parse a name made of letters, numbers, - and _
fn parse_name(s: &str) -> ParseResult<'_, &str> {
  regex_static!(NAME, r"[a-zA-Z0-9\-_]+");
  needed_re(&NAME, s).map_err(|err| format!("name: {}", err).into())
}

/// Parses a double-quoted terminal, which may contain anything but a quote or newline
fn parse_quoted(s: &str) -> ParseResult<'_, &str> {
  regex_static!(QUOTED, r#""[^"\n]+""#);
  let (quoted, s) = needed_re(&QUOTED, s).map_err(|e| -> Err { format!("literal: {}", e).into() })?;
  Ok((&quoted[1..quoted.len() - 1], s))
}

fn parse_production(s: &str) -> ParseResult<'_, Production> {
  if s.starts_with('"') {
    let (word, s) = parse_quoted(s)?;
    return Ok((Production::terminal(word), s));
  }

  let (name, s) = parse_name(s).map_err(|e| -> Err { format!("symbol: {}", e).into() })?;
  if name.starts_with(|c: char| c.is_lowercase()) {
    Ok((Production::terminal(name), s))
  } else {
    Ok((Production::nonterminal(name), s))
  }
}

fn parse_symbol(s: &str) -> ParseResult<'_, Symbol> {
  match parse_production(s)? {
    (Production::Nonterminal(symbol), s) => Ok((symbol, s)),
    (Production::Terminal(w), s) => {
      Err(format!("expected symbol, got terminal {}: {}", w, s).into())
    }
  }
}

/// Symbol, arrow, bodies separated by `|`, terminated by `;`
fn parse_rule(s: &str) -> ParseResult<'_, Vec<Rule>> {
  #![allow(clippy::trivial_regex)]
  regex_static!(ARROW, "->");

  let (symbol, s) = parse_symbol(s).map_err(|e| -> Err { format!("rule symbol: {}", e).into() })?;
  let s = skip_whitespace(s);
  let (_, s) = needed_re(&ARROW, s).map_err(|e| -> Err { format!("rule arrow: {}", e).into() })?;

  let mut rules = Vec::new();
  let mut productions = Vec::new();
  let mut rem = s;
  loop {
    rem = skip_whitespace(rem);
    if rem.is_empty() {
      return Err(format!("rule {}: missing ;", symbol).into());
    }
    if let (Some(_), s) = optional_char(';', rem) {
      rules.push(Rule {
        symbol,
        productions,
      });
      return Ok((rules, s));
    }
    if let (Some(_), s) = optional_char('|', rem) {
      rules.push(Rule {
        symbol: symbol.clone(),
        productions: std::mem::take(&mut productions),
      });
      rem = s;
      continue;
    }
    let (prod, s) =
      parse_production(rem).map_err(|e| -> Err { format!("rule production: {}", e).into() })?;
    productions.push(prod);
    rem = s;
  }
}

fn parse_rules(s: &str) -> ParseResult<'_, Vec<Rule>> {
  let mut rules = Vec::new();
  let mut rem = s;
  loop {
    rem = skip_whitespace(rem);
    if rem.is_empty() {
      return Ok((rules, rem));
    }
    let (mut alternatives, s) = parse_rule(rem)?;
    rules.append(&mut alternatives);
    rem = s;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::GrammarError;

  macro_rules! grammar_file {
    ($filename:expr) => {
      (
        $filename,
        include_str!(concat!("../grammars/", $filename)),
      )
    };
  }

  #[test]
  fn smoke_test_grammar_files() {
    let files = [
      grammar_file!("kitchen.cfg"),
      grammar_file!("kitchen-flat.cfg"),
      grammar_file!("ambiguous.cfg"),
    ];

    for (filename, src) in files {
      assert!(src.parse::<Grammar>().is_ok(), "failed to parse {filename}");
    }
  }

  #[test]
  fn test_alternatives_and_comments() {
    let g: Grammar = r#"
      // leading comment
      S -> NP VP; // trailing comment
      NP -> she | Det N;
      VP -> eats | "ice-cream" | ;
      Det -> a;
      N -> cake;
    "#
    .parse()
    .unwrap();

    assert_eq!(g.start, "S");
    assert_eq!(g.rules_for("NP").len(), 2);
    assert_eq!(
      g.rules_for("VP")
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>(),
      vec!["VP -> eats", "VP -> ice-cream", "VP ->"]
    );
    assert!(g.rules_for("VP")[1].productions[0].is_terminal());
    assert!(g.is_nullable("VP"));
  }

  #[test]
  fn test_kitchen_file() {
    let g: Grammar = include_str!("../grammars/kitchen.cfg").parse().unwrap();
    assert_eq!(g.start, "S");
    assert_eq!(g.nonterminals(), &["S", "VP", "PP", "NP", "V", "P", "N", "Det"]);
    assert_eq!(g.rules_for("VP").len(), 6);
    assert!(g.is_cnf());

    let flat: Grammar = include_str!("../grammars/kitchen-flat.cfg").parse().unwrap();
    assert!(!flat.is_cnf());
  }

  #[test]
  fn test_parse_errors() {
    assert!("".parse::<Grammar>().is_err());
    assert!("// nothing but comments\n".parse::<Grammar>().is_err());
    assert!("S -> a".parse::<Grammar>().is_err(), "missing semicolon");
    assert!("s -> a;".parse::<Grammar>().is_err(), "terminal head");
    assert!("S a;".parse::<Grammar>().is_err(), "missing arrow");
    assert!("S -> \"unterminated;".parse::<Grammar>().is_err());
  }

  #[test]
  fn test_undefined_symbol_is_reported() {
    let err = "S -> NP VP; NP -> she;".parse::<Grammar>().unwrap_err();
    let err = err.downcast::<GrammarError>().unwrap();
    assert_eq!(
      *err,
      GrammarError::UndefinedNonterminal {
        symbol: "VP".to_string(),
        rule: "S -> NP VP".to_string(),
      }
    );
  }
}
