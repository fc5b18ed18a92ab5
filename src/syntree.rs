use std::fmt;

/// A labelled node covering the half-open token range `span.0..span.1`
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Constituent<T> {
  pub value: T,
  pub span: (usize, usize),
}

impl<T> fmt::Display for Constituent<T>
where
  T: fmt::Display,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}..{}: {}", self.span.0, self.span.1, self.value)
  }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Word<U> {
  pub value: U,
  pub span: (usize, usize),
}

impl<U> fmt::Display for Word<U>
where
  U: fmt::Display,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}..{}: {}", self.span.0, self.span.1, self.value)
  }
}

/// A derivation tree. In a CNF derivation a branch has two children
/// (`A -> B C`), one branch child (`A -> B`), one leaf (`A -> word`), or
/// none at all (the empty start rule).
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum SynTree<T, U> {
  Branch(Constituent<T>, Vec<SynTree<T, U>>),
  Leaf(Word<U>),
}

impl<T, U> SynTree<T, U> {
  pub fn is_leaf(&self) -> bool {
    matches!(self, Self::Leaf(_))
  }

  pub fn is_branch(&self) -> bool {
    matches!(self, Self::Branch(_, _))
  }

  pub fn get_leaf(&self) -> Option<&Word<U>> {
    match self {
      Self::Leaf(w) => Some(w),
      _ => None,
    }
  }

  pub fn get_branch(&self) -> Option<(&Constituent<T>, &Vec<SynTree<T, U>>)> {
    match self {
      Self::Branch(c, cs) => Some((c, cs)),
      _ => None,
    }
  }

  pub fn span(&self) -> (usize, usize) {
    match self {
      Self::Branch(c, _) => c.span,
      Self::Leaf(w) => w.span,
    }
  }

  /// The words under this tree, left to right
  pub fn leaves(&self) -> Vec<&U> {
    let mut leaves = Vec::new();
    self.collect_leaves(&mut leaves);
    leaves
  }

  fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a U>) {
    match self {
      Self::Leaf(w) => out.push(&w.value),
      Self::Branch(_, children) => {
        for child in children {
          child.collect_leaves(out);
        }
      }
    }
  }

  /// Number of nodes on the longest root-to-leaf path
  pub fn depth(&self) -> usize {
    match self {
      Self::Leaf(_) => 1,
      Self::Branch(_, children) => 1 + children.iter().map(Self::depth).max().unwrap_or(0),
    }
  }
}

impl<T, U> fmt::Display for SynTree<T, U>
where
  T: fmt::Display,
  U: fmt::Display,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Leaf(t) => write!(f, "{}", t),
      Self::Branch(t, ts) => {
        write!(f, "({}", t)?;
        if ts.len() == 1 && ts[0].is_leaf() {
          write!(f, " ({}))", ts[0])
        } else {
          for t in ts.iter() {
            // TODO: is there a nice way to do this that doesn't allocate a String?
            let fmt = format!("{}", t);
            for line in fmt.lines() {
              write!(f, "\n  {}", line)?;
            }
          }
          write!(f, ")")
        }
      }
    }
  }
}
