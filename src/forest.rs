use tracing::debug;

use crate::cyk::Table;
use crate::reverse::{NtIdx, ReverseIndex};
use crate::syntree::{Constituent, SynTree, Word};
use crate::utils::combinations;

pub type Tree = SynTree<String, String>;

/// Reads derivation trees back out of a finished CYK table by replaying the
/// recognizer's split search top-down. The table holds no back-pointers, so
/// every subtree is re-derived from the cells and the reverse index.
pub struct Forest<'a> {
  index: &'a ReverseIndex,
  table: &'a Table,
  input: &'a [&'a str],
}

impl<'a> Forest<'a> {
  /// Callers guarantee `table` was built for `input`; `Parser::forest` checks it.
  pub(crate) fn new(index: &'a ReverseIndex, table: &'a Table, input: &'a [&'a str]) -> Self {
    debug_assert_eq!(table.len(), input.len(), "table was built for another input");
    Self {
      index,
      table,
      input,
    }
  }

  pub fn len(&self) -> usize {
    self.input.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  fn branch(&self, nt: NtIdx, start: usize, end: usize, children: Vec<Tree>) -> Tree {
    SynTree::Branch(
      Constituent {
        value: self.index.name(nt).to_string(),
        span: (start, end + 1),
      },
      children,
    )
  }

  /// `nt -> word` over the single token at `at`
  fn lexical_tree(&self, nt: NtIdx, at: usize) -> Option<Tree> {
    let word = self.input[at];
    let produces = self
      .index
      .lexical(word)
      .is_some_and(|heads| heads.contains(&nt));
    produces.then(|| {
      let leaf = SynTree::Leaf(Word {
        value: word.to_string(),
        span: (at, at + 1),
      });
      self.branch(nt, at, at, vec![leaf])
    })
  }

  /// Splits `start..=end` into `(mid, b, c)` with `nt -> b c`, `b` over
  /// `start..=mid` and `c` over `mid + 1..=end`
  fn splits(&self, nt: NtIdx, start: usize, end: usize) -> Vec<(usize, NtIdx, NtIdx)> {
    let mut splits = Vec::new();
    for mid in start..end {
      for &b in self.table.cell(start, mid) {
        for &c in self.table.cell(mid + 1, end) {
          if self.index.pair(b, c).is_some_and(|heads| heads.contains(&nt)) {
            splits.push((mid, b, c));
          }
        }
      }
    }
    splits
  }

  /// Symbols `b` in the same cell with `nt -> b`, skipping any already on the
  /// current unit chain so that unit cycles can't recurse forever
  fn unit_children(&self, nt: NtIdx, start: usize, end: usize, chain: &[NtIdx]) -> Vec<NtIdx> {
    self
      .table
      .cell(start, end)
      .iter()
      .copied()
      .filter(|b| !chain.contains(b))
      .filter(|b| self.index.unit(*b).is_some_and(|heads| heads.contains(&nt)))
      .collect()
  }

  /// Every tree for `nt` over `start..=end`. `chain` holds the symbols above
  /// this one that were reached through unit rules over the same span.
  fn make_trees(&self, nt: NtIdx, start: usize, end: usize, chain: &mut Vec<NtIdx>) -> Vec<Tree> {
    let mut trees = Vec::new();
    chain.push(nt);

    if start == end {
      trees.extend(self.lexical_tree(nt, start));
    }

    for (mid, b, c) in self.splits(nt, start, end) {
      let halves = [
        self.make_trees(b, start, mid, &mut Vec::new()),
        self.make_trees(c, mid + 1, end, &mut Vec::new()),
      ];
      trees.extend(
        combinations(&halves)
          .into_iter()
          .map(|children| self.branch(nt, start, end, children)),
      );
    }

    for b in self.unit_children(nt, start, end, chain) {
      for child in self.make_trees(b, start, end, chain) {
        trees.push(self.branch(nt, start, end, vec![child]));
      }
    }

    chain.pop();
    trees
  }

  /// The first tree for `nt` over `start..=end` in the order `make_trees` would list them
  fn make_first(
    &self,
    nt: NtIdx,
    start: usize,
    end: usize,
    chain: &mut Vec<NtIdx>,
  ) -> Option<Tree> {
    if start == end {
      if let Some(tree) = self.lexical_tree(nt, start) {
        return Some(tree);
      }
    }

    for (mid, b, c) in self.splits(nt, start, end) {
      let left = self.make_first(b, start, mid, &mut Vec::new());
      let right = self.make_first(c, mid + 1, end, &mut Vec::new());
      if let (Some(left), Some(right)) = (left, right) {
        return Some(self.branch(nt, start, end, vec![left, right]));
      }
    }

    chain.push(nt);
    let mut found = None;
    for b in self.unit_children(nt, start, end, chain) {
      if let Some(child) = self.make_first(b, start, end, chain) {
        found = Some(self.branch(nt, start, end, vec![child]));
        break;
      }
    }
    chain.pop();
    found
  }

  /// Whether the start symbol covers the whole input
  fn has_root(&self) -> bool {
    self
      .table
      .top()
      .is_some_and(|top| top.contains(&self.index.start()))
  }

  /// The tree for an empty sentence, if the start symbol may be empty
  fn empty_tree(&self) -> Option<Tree> {
    self.index.accepts_empty().then(|| {
      SynTree::Branch(
        Constituent {
          value: self.index.name(self.index.start()).to_string(),
          span: (0, 0),
        },
        Vec::new(),
      )
    })
  }

  /// Every derivation of the start symbol over the whole input. Exponential in
  /// the worst case: an ambiguous grammar can have Catalan-many parses.
  pub fn trees(&self) -> Vec<Tree> {
    if self.is_empty() {
      return self.empty_tree().into_iter().collect();
    }
    if !self.has_root() {
      return Vec::new();
    }

    let trees = self.make_trees(self.index.start(), 0, self.len() - 1, &mut Vec::new());
    debug!(tokens = self.len(), trees = trees.len(), "built parse trees");
    trees
  }

  /// A single derivation of the start symbol, without enumerating the rest
  pub fn first_tree(&self) -> Option<Tree> {
    if self.is_empty() {
      return self.empty_tree();
    }
    if !self.has_root() {
      return None;
    }
    self.make_first(self.index.start(), 0, self.len() - 1, &mut Vec::new())
  }
}
