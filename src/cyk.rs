use std::collections::BTreeSet;
use std::fmt;

use tracing::{debug, trace, warn};

use crate::error::ParseError;
use crate::reverse::{NtIdx, ReverseIndex};

/// Triangular table over a sentence: the cell at inclusive `(start, end)`
/// holds every nonterminal that derives `input[start..=end]`. Cells only grow.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
  len: usize,
  /// cell (start, end) lives at end * (end + 1) / 2 + start
  cells: Vec<BTreeSet<NtIdx>>,
}

impl Table {
  pub fn new(length: usize) -> Self {
    Self {
      len: length,
      cells: vec![BTreeSet::new(); length * (length + 1) / 2],
    }
  }

  /// Length of the sentence this table covers
  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  fn offset(&self, start: usize, end: usize) -> Option<usize> {
    (start <= end && end < self.len).then(|| end * (end + 1) / 2 + start)
  }

  /// The cell at `start..=end`, or None if that isn't a cell of this table
  pub fn get(&self, start: usize, end: usize) -> Option<&BTreeSet<NtIdx>> {
    self.offset(start, end).map(|offset| &self.cells[offset])
  }

  /// Like `get`, for spans known to be in range.
  ///
  /// # Panics
  ///
  /// If `start > end` or `end` is past the end of the sentence, like slice indexing.
  pub fn cell(&self, start: usize, end: usize) -> &BTreeSet<NtIdx> {
    match self.get(start, end) {
      Some(cell) => cell,
      None => panic!("cell {}..={} outside table of length {}", start, end, self.len),
    }
  }

  pub fn has(&self, start: usize, end: usize, nt: NtIdx) -> bool {
    self.cell(start, end).contains(&nt)
  }

  /// Adds a symbol to a cell, returning whether it was new
  ///
  /// # Panics
  ///
  /// On a span outside the table, as `cell` does.
  pub fn add(&mut self, start: usize, end: usize, nt: NtIdx) -> bool {
    match self.offset(start, end) {
      Some(offset) => self.cells[offset].insert(nt),
      None => panic!("cell {}..={} outside table of length {}", start, end, self.len),
    }
  }

  /// The cell spanning the whole sentence, if there is one
  pub fn top(&self) -> Option<&BTreeSet<NtIdx>> {
    if self.is_empty() {
      None
    } else {
      Some(self.cell(0, self.len - 1))
    }
  }

  /// Display the table with symbol names resolved through `index`
  pub fn display<'a>(&'a self, index: &'a ReverseIndex) -> TableDisplay<'a> {
    TableDisplay { table: self, index }
  }
}

pub struct TableDisplay<'a> {
  table: &'a Table,
  index: &'a ReverseIndex,
}

impl fmt::Display for TableDisplay<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let n = self.table.len();
    for span in 1..=n {
      writeln!(f, "Span {}:", span)?;
      for start in 0..=(n - span) {
        let end = start + span - 1;
        let cell = self.table.cell(start, end);
        if cell.is_empty() {
          continue;
        }
        write!(f, "  {}..={}:", start, end)?;
        for nt in cell {
          write!(f, " {}", self.index.name(*nt))?;
        }
        writeln!(f)?;
      }
    }
    Ok(())
  }
}

/// Outcome of running the recognizer over one sentence
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
  pub accepted: bool,
  pub table: Table,
}

/// Looks every token up before anything else, so an uncovered word fails the
/// whole sentence without a table being built.
fn scan<'i>(
  index: &'i ReverseIndex,
  input: &[&str],
) -> Result<Vec<&'i BTreeSet<NtIdx>>, ParseError> {
  input
    .iter()
    .enumerate()
    .map(|(position, word)| {
      index.lexical(word).ok_or_else(|| {
        warn!(%word, position, "token not covered by grammar");
        ParseError::UnknownToken {
          token: word.to_string(),
          position,
        }
      })
    })
    .collect()
}

/// Every head that derives `start..=end` by splitting it in two somewhere
fn combine(index: &ReverseIndex, table: &Table, start: usize, end: usize) -> BTreeSet<NtIdx> {
  let mut heads = BTreeSet::new();
  for mid in start..end {
    for &b in table.cell(start, mid) {
      for &c in table.cell(mid + 1, end) {
        if let Some(producers) = index.pair(b, c) {
          heads.extend(producers);
        }
      }
    }
  }
  heads
}

/// Fills the CYK table for `input`, shortest spans first.
pub fn parse_table(index: &ReverseIndex, input: &[&str]) -> Result<Table, ParseError> {
  let lexical = scan(index, input)?;
  let n = input.len();
  let mut table = Table::new(n);

  for (i, heads) in lexical.into_iter().enumerate() {
    let mut cell = heads.clone();
    index.unit_closure(&mut cell);
    for nt in cell {
      table.add(i, i, nt);
    }
  }

  // every span of length l only reads spans shorter than l
  for span in 2..=n {
    for start in 0..=(n - span) {
      let end = start + span - 1;
      let mut cell = combine(index, &table, start, end);
      index.unit_closure(&mut cell);
      trace!(start, end, size = cell.len(), "filled cell");
      for nt in cell {
        table.add(start, end, nt);
      }
    }
  }

  Ok(table)
}

/// Runs the recognizer and checks for the start symbol over the whole input.
/// An empty sentence is accepted only if the start symbol has an empty rule.
pub fn recognize(index: &ReverseIndex, input: &[&str]) -> Result<Recognition, ParseError> {
  let table = parse_table(index, input)?;
  let accepted = match table.top() {
    Some(top) => top.contains(&index.start()),
    None => index.accepts_empty(),
  };
  debug!(tokens = input.len(), accepted, "recognized");
  Ok(Recognition { accepted, table })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grammar::Grammar;

  fn kitchen() -> ReverseIndex {
    let g: Grammar = include_str!("../grammars/kitchen.cfg").parse().unwrap();
    ReverseIndex::new(&g).unwrap()
  }

  fn cell_names(index: &ReverseIndex, table: &Table, start: usize, end: usize) -> Vec<String> {
    table
      .cell(start, end)
      .iter()
      .map(|nt| index.name(*nt).to_string())
      .collect()
  }

  #[test]
  fn test_table_cells() {
    let index = kitchen();
    let table = parse_table(&index, &["she", "eats", "a", "cake"]).unwrap();

    assert_eq!(table.len(), 4);
    assert_eq!(cell_names(&index, &table, 0, 0), vec!["NP"]);
    assert_eq!(cell_names(&index, &table, 1, 1), vec!["VP", "V"]);
    assert_eq!(cell_names(&index, &table, 0, 1), vec!["S"]);
    assert_eq!(cell_names(&index, &table, 2, 3), vec!["NP"]);
    assert_eq!(cell_names(&index, &table, 1, 3), vec!["VP"]);
    assert!(table.cell(1, 2).is_empty());
    assert_eq!(cell_names(&index, &table, 0, 3), vec!["S"]);
  }

  #[test]
  fn test_recognize_verdicts() {
    let index = kitchen();
    let accepts = |s: &str| {
      recognize(&index, &s.split(' ').collect::<Vec<_>>())
        .unwrap()
        .accepted
    };

    assert!(accepts("she eats a cake"));
    assert!(accepts("she eats a cake with a fork"));
    assert!(accepts("he cooks"));
    assert!(!accepts("cake eats she"));
    assert!(!accepts("he"));
    assert!(!accepts("she eats a"));
  }

  #[test]
  fn test_rejection_keeps_table() {
    let index = kitchen();
    let r = recognize(&index, &["cake", "eats", "she"]).unwrap();
    assert!(!r.accepted);
    assert_eq!(cell_names(&index, &r.table, 1, 2), vec!["VP"]);
    assert!(r.table.top().unwrap().is_empty());
  }

  #[test]
  fn test_unknown_token() {
    let index = kitchen();
    assert_eq!(
      recognize(&index, &["she", "eats", "a", "pizza"]),
      Err(ParseError::UnknownToken {
        token: "pizza".to_string(),
        position: 3,
      })
    );
  }

  #[test]
  fn test_empty_input() {
    let index = kitchen();
    let r = recognize(&index, &[]).unwrap();
    assert!(!r.accepted);
    assert!(r.table.top().is_none());

    let g: Grammar = "S -> A A | ; A -> a;".parse().unwrap();
    let index = ReverseIndex::new(&g).unwrap();
    assert!(recognize(&index, &[]).unwrap().accepted);
    assert!(recognize(&index, &["a", "a"]).unwrap().accepted);
    assert!(!recognize(&index, &["a"]).unwrap().accepted);
  }

  #[test]
  fn test_unit_rules_close_cells() {
    // S -> A only reachable through a chain of unit rules, at both span lengths
    let g: Grammar = "S -> A | S S; A -> B; B -> b;".parse().unwrap();
    let index = ReverseIndex::new(&g).unwrap();

    let r = recognize(&index, &["b"]).unwrap();
    assert!(r.accepted);
    assert_eq!(cell_names(&index, &r.table, 0, 0), vec!["S", "A", "B"]);
    assert!(recognize(&index, &["b", "b", "b"]).unwrap().accepted);
  }

  #[test]
  fn test_cells_only_grow() {
    let index = kitchen();
    let np = index.id("NP").unwrap();
    let vp = index.id("VP").unwrap();

    let mut table = Table::new(3);
    assert!(table.add(0, 2, np));
    assert!(table.add(0, 2, vp));
    assert!(!table.add(0, 2, np));
    assert!(table.has(0, 2, np) && table.has(0, 2, vp));
    assert!(table.cell(0, 1).is_empty());
  }

  #[test]
  #[should_panic]
  fn test_cell_out_of_range() {
    Table::new(2).cell(1, 0);
  }

  #[test]
  fn test_get_out_of_range() {
    let table = Table::new(2);
    assert!(table.get(0, 1).is_some());
    assert!(table.get(1, 0).is_none());
    assert!(table.get(0, 2).is_none());
    assert!(Table::new(0).get(0, 0).is_none());
  }

  #[test]
  fn test_display() {
    let index = kitchen();
    let table = parse_table(&index, &["she", "eats"]).unwrap();
    assert_eq!(
      table.display(&index).to_string(),
      "Span 1:\n  0..=0: NP\n  1..=1: VP V\nSpan 2:\n  0..=1: S\n"
    );
  }
}
