use aaqz::{Environment, Symbol};
use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

pub const COMMANDS: &[&str] = &[":help", ":quit", ":exit", ":history", ":load"];

pub struct ReplHelper {
  file_completer: FilenameCompleter,
  names: Vec<Symbol>,
}

impl ReplHelper {
  pub fn new() -> Self {
    let mut names = Environment::top_level().names();
    names.sort();
    names.dedup();

    Self {
      file_completer: FilenameCompleter::new(),
      names,
    }
  }

  fn complete_word(&self, line: &str, pos: usize) -> (usize, Vec<Pair>) {
    let start = line[..pos]
      .rfind(|c: char| c.is_whitespace() || "()[]{},".contains(c))
      .map_or(0, |i| i + 1);
    let word = &line[start..pos];

    if word.is_empty() {
      return (pos, vec![]);
    }

    let candidates = if start == 0 && word.starts_with(':') {
      COMMANDS
        .iter()
        .filter(|cmd| cmd.starts_with(word))
        .map(|cmd| pair(cmd))
        .collect()
    } else {
      self
        .names
        .iter()
        .filter(|name| name.starts_with(word))
        .map(|name| pair(name))
        .collect()
    };

    (start, candidates)
  }
}

/// Start of the path argument of a `:l`/`:load` line, if the cursor is inside it.
fn load_argument_start(line: &str, pos: usize) -> Option<usize> {
  if !(line.starts_with(":l ") || line.starts_with(":load ")) {
    return None;
  }
  let cmd_end = line.find(' ')? + 1;
  (pos >= cmd_end).then_some(cmd_end)
}

fn pair(text: &str) -> Pair {
  Pair {
    display: text.to_string(),
    replacement: text.to_string(),
  }
}

impl Helper for ReplHelper {}

impl Completer for ReplHelper {
  type Candidate = Pair;

  fn complete(
    &self,
    line: &str,
    pos: usize,
    ctx: &Context<'_>,
  ) -> Result<(usize, Vec<Pair>), ReadlineError> {
    match load_argument_start(line, pos) {
      Some(cmd_end) => {
        let path_part = &line[cmd_end..pos];

        let (start, candidates) = self
          .file_completer
          .complete(path_part, path_part.len(), ctx)?;

        Ok((cmd_end + start, candidates))
      }
      None => Ok(self.complete_word(line, pos)),
    }
  }
}

impl Hinter for ReplHelper {
  type Hint = String;

  fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
    None
  }
}

impl Highlighter for ReplHelper {}

impl Validator for ReplHelper {}

#[cfg(test)]
mod tests {
  use super::*;
  use rustyline::history::DefaultHistory;

  fn replacements(helper: &ReplHelper, line: &str) -> (usize, Vec<String>) {
    let (start, pairs) = helper.complete_word(line, line.len());
    (start, pairs.into_iter().map(|p| p.replacement).collect())
  }

  #[test]
  fn test_completes_primitive_names() {
    let helper = ReplHelper::new();
    let (start, found) = replacements(&helper, "(read-");
    assert_eq!(start, 1);
    assert_eq!(found, vec!["read-num".to_string(), "read-str".to_string()]);
  }

  #[test]
  fn test_completes_constants_after_brackets() {
    let helper = ReplHelper::new();
    let (start, found) = replacements(&helper, "{(if tr");
    assert_eq!(start, 5);
    assert_eq!(found, vec!["true".to_string()]);
  }

  #[test]
  fn test_completes_commands_at_line_start() {
    let helper = ReplHelper::new();
    let (_, found) = replacements(&helper, ":h");
    assert_eq!(found, vec![":help".to_string(), ":history".to_string()]);
  }

  #[test]
  fn test_cursor_inside_load_command_completes_the_command() {
    let helper = ReplHelper::new();
    let history = DefaultHistory::new();
    let ctx = Context::new(&history);

    let (start, pairs) = helper
      .complete(":load foo", 2, &ctx)
      .expect("completion");
    assert_eq!(start, 0);
    let found: Vec<String> = pairs.into_iter().map(|p| p.replacement).collect();
    assert_eq!(found, vec![":load".to_string()]);

    assert_eq!(load_argument_start(":load foo", 2), None);
    assert_eq!(load_argument_start(":load foo", 6), Some(6));
    assert_eq!(load_argument_start(":l x", 4), Some(3));
  }

  #[test]
  fn test_nothing_to_complete() {
    let helper = ReplHelper::new();
    assert!(replacements(&helper, "(+ ").1.is_empty());
    assert!(replacements(&helper, "(zzz").1.is_empty());
  }
}
