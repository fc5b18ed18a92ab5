use std::env;
use std::io;
use std::io::Write;
use std::process;
use std::time::Instant;

use tracing::info;
use tracing_subscriber::EnvFilter;

use cyktree::utils::tokenize;
use cyktree::{Err, Grammar, Parser};

fn usage(prog_name: &str) -> String {
  format!(
    r"Usage: {} FILE [options]

Reads sentences from stdin, one per line, and parses them with the grammar in FILE.

Options:
  -h, --help     Print this message
  -c, --chart    Print the CYK table (defaults to not printing)
  -1, --first    Print only the first parse tree (defaults to all of them)
  -t, --time     Print how long recognition took
  -g, --grammar  Print the normalized grammar before reading sentences

Set RUST_LOG (e.g. RUST_LOG=cyktree=debug) for diagnostics on stderr.",
    prog_name
  )
}

/// Trims a line read from stdin and folds it to lower case, so that "She"
/// and "ÉCLAIR" match grammar terminals written in lower case
fn fold_line(line: &str) -> String {
  line.trim().to_lowercase()
}

fn parse(p: &Parser, sentence: &str, opts: &Args) -> Result<(), Err> {
  let sentence = tokenize(sentence);

  let started = Instant::now();
  let recognition = match p.recognize(&sentence) {
    Ok(r) => r,
    Err(e) => {
      // not fatal for the session, the next line may be fine
      println!("{}", e);
      return Ok(());
    }
  };
  let elapsed = started.elapsed();

  if recognition.accepted {
    println!("YES, the sentence is in the language.");
  } else {
    println!("NO, the sentence is not in the language.");
  }

  if opts.print_time {
    println!("recognition time: {:.6}s", elapsed.as_secs_f64());
  }

  if opts.print_chart {
    println!("table:\n{}", recognition.table.display(p.index()));
  }

  let forest = p
    .forest(&recognition.table, &sentence)
    .ok_or("table doesn't match the sentence")?;
  let trees = if opts.first_only {
    forest.first_tree().into_iter().collect::<Vec<_>>()
  } else {
    forest.trees()
  };

  println!(
    "Parsed {} tree{}",
    trees.len(),
    if trees.len() == 1 { "" } else { "s" }
  );

  for t in trees {
    println!("{}\n", t);
  }

  Ok(())
}

struct Args {
  filename: String,
  print_chart: bool,
  print_time: bool,
  print_grammar: bool,
  first_only: bool,
}

impl Args {
  fn make_error_message(msg: &str, prog_name: impl AsRef<str>) -> String {
    format!("argument error: {}.\n\n{}", msg, usage(prog_name.as_ref()))
  }

  fn parse(v: Vec<String>) -> Result<Self, String> {
    if v.is_empty() {
      return Err(Self::make_error_message("bad argument vector", "cyktree"));
    }

    let args_len = v.len();
    let mut iter = v.into_iter();
    let prog_name = iter.next().unwrap_or_default();

    if args_len < 2 {
      return Err(Self::make_error_message("not enough arguments", prog_name));
    }

    let mut filename: Option<String> = None;
    let mut print_chart = false;
    let mut print_time = false;
    let mut print_grammar = false;
    let mut first_only = false;

    for o in iter {
      match o.as_str() {
        "-h" | "--help" => {
          println!("{}", usage(&prog_name));
          process::exit(0);
        }
        "-c" | "--chart" => print_chart = true,
        "-t" | "--time" => print_time = true,
        "-g" | "--grammar" => print_grammar = true,
        "-1" | "--first" => first_only = true,
        _ if o.starts_with('-') => {
          return Err(Self::make_error_message(&format!("unknown option {}", o), prog_name));
        }
        _ if filename.is_none() => filename = Some(o),
        _ => return Err(Self::make_error_message("invalid arguments", prog_name)),
      }
    }

    if let Some(filename) = filename {
      Ok(Self {
        filename,
        print_chart,
        print_time,
        print_grammar,
        first_only,
      })
    } else {
      Err(Self::make_error_message("missing filename", prog_name))
    }
  }
}

fn main() -> Result<(), Err> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(io::stderr)
    .init();

  let opts = match Args::parse(env::args().collect()) {
    Ok(opts) => opts,
    Err(msg) => {
      eprintln!("{}", msg);
      process::exit(255);
    }
  };

  let g = Grammar::read_from_file(&opts.filename)?;
  let p = Parser::new(&g)?;
  info!(
    file = %opts.filename,
    rules = p.grammar().rule_count(),
    "grammar ready"
  );

  if opts.print_grammar {
    println!("{}", p.grammar());
  }

  let mut input = String::new();
  loop {
    print!("> ");
    io::stdout().flush()?;

    match io::stdin().read_line(&mut input) {
      Ok(_) => {
        if input.is_empty() {
          // ctrl+d
          return Ok(());
        }
        let line = fold_line(&input);
        if !line.is_empty() {
          parse(&p, &line, &opts)?;
        }
        input.clear();
      }
      Err(error) => return Err(error.into()),
    }
  }
}

#[test]
fn test_fold_line() {
  assert_eq!(fold_line("  She eats a CAKE\n"), "she eats a cake");
  assert_eq!(fold_line("ÉCLAIR Über"), "éclair über");
  assert!(fold_line(" \t\n").is_empty());
}
