use std::error::Error;

/// Boxed static error type
pub type Err = Box<dyn Error + 'static>;

/// Takes a list where each element is a set of choices, and returns all the possible sets
/// generated. Will clone the elements.
///
/// ```
/// let v = vec![
///   vec!['a', 'b'],
///   vec!['x'],
///   vec!['y', 'z'],
/// ];
///
/// assert_eq!(cyktree::utils::combinations(&v), vec![
///   vec!['a', 'x', 'y'],
///   vec!['b', 'x', 'y'],
///   vec!['a', 'x', 'z'],
///   vec!['b', 'x', 'z'],
/// ]);
/// ```
pub fn combinations<T>(list: &[Vec<T>]) -> Vec<Vec<T>>
where
  T: Clone,
{
  if list.is_empty() {
    Vec::new()
  } else if list.len() == 1 {
    list[0].iter().map(|e| vec![e.clone()]).collect()
  } else {
    let (head, tail) = list.split_at(1);
    let head = &head[0];

    combinations(tail)
      .into_iter()
      .flat_map(|subseq| {
        // prepend every element of the head to every possible subseq
        head.iter().map(move |v| {
          let mut newseq = Vec::with_capacity(subseq.len() + 1);
          newseq.push(v.clone());
          newseq.extend(subseq.iter().cloned());
          newseq
        })
      })
      .collect()
  }
}

/// Splits a line into tokens on runs of whitespace.
pub fn tokenize(line: &str) -> Vec<&str> {
  line.split_whitespace().collect()
}

#[test]
fn test_combinations_empty_choice() {
  let v: Vec<Vec<u8>> = vec![vec![1, 2], vec![]];
  assert!(combinations(&v).is_empty());
}

#[test]
fn test_tokenize() {
  assert_eq!(tokenize("  she eats\ta cake \n"), vec!["she", "eats", "a", "cake"]);
  assert!(tokenize("   ").is_empty());
}
