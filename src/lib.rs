#[macro_use]
extern crate lazy_static;

pub mod cyk;
pub mod error;
pub mod forest;
pub mod grammar;
pub mod normalize;
pub mod parse_grammar;
pub mod reverse;
pub mod rules;
pub mod syntree;
pub mod utils;

use std::str::FromStr;

use crate::cyk::{recognize, Table};
pub use crate::cyk::Recognition;
pub use crate::error::{GrammarError, ParseError};
use crate::forest::Forest;
pub use crate::forest::Tree;
pub use crate::grammar::Grammar;
use crate::reverse::ReverseIndex;
pub use crate::utils::Err;

/// A grammar in CNF together with its reverse index: everything needed to
/// recognize and parse sentences. Immutable once built, so any number of
/// parsers over different grammars can be used side by side.
#[derive(Debug, Clone)]
pub struct Parser {
  grammar: Grammar,
  index: ReverseIndex,
}

impl Parser {
  /// Normalizes `grammar` into CNF and indexes it.
  pub fn new(grammar: &Grammar) -> Result<Self, GrammarError> {
    let grammar = grammar.to_cnf()?;
    let index = ReverseIndex::new(&grammar)?;
    Ok(Self { grammar, index })
  }

  /// The normalized grammar
  pub fn grammar(&self) -> &Grammar {
    &self.grammar
  }

  pub fn index(&self) -> &ReverseIndex {
    &self.index
  }

  /// Runs CYK over a tokenized sentence. Fails only if a token isn't covered by
  /// the grammar; a sentence outside the language is `accepted: false`.
  pub fn recognize(&self, input: &[&str]) -> Result<Recognition, ParseError> {
    recognize(&self.index, input)
  }

  pub fn accepts(&self, input: &[&str]) -> Result<bool, ParseError> {
    Ok(self.recognize(input)?.accepted)
  }

  /// Tree builder over a table this parser produced for `input`. None if the
  /// table covers a sentence of another length.
  pub fn forest<'a>(&'a self, table: &'a Table, input: &'a [&'a str]) -> Option<Forest<'a>> {
    (table.len() == input.len()).then(|| Forest::new(&self.index, table, input))
  }

  /// Every parse tree of the sentence, empty if it isn't in the language
  pub fn parse(&self, input: &[&str]) -> Result<Vec<Tree>, ParseError> {
    let table = self.recognize(input)?.table;
    Ok(Forest::new(&self.index, &table, input).trees())
  }

  /// One parse tree of the sentence, if there is any
  pub fn parse_first(&self, input: &[&str]) -> Result<Option<Tree>, ParseError> {
    let table = self.recognize(input)?.table;
    Ok(Forest::new(&self.index, &table, input).first_tree())
  }
}

impl FromStr for Parser {
  type Err = Err;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let g: Grammar = s.parse()?;
    Ok(Self::new(&g)?)
  }
}
