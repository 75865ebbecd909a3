use aaqz::{Environment, StdioAdapter};
use colored::*;
use rustyline::error::ReadlineError;
use rustyline::history::History;
use rustyline::{Editor, Helper, Result as RustyResult};

use super::eval::{InputError, Outcome, process_input};

pub struct InputHandler {
  buffer: String,
  line_number: usize,
  env: Environment,
  io: StdioAdapter,
}

impl InputHandler {
  pub fn new() -> Self {
    Self {
      buffer: String::new(),
      line_number: 1,
      env: Environment::top_level(),
      io: StdioAdapter::new(),
    }
  }

  pub fn line_number(&self) -> usize {
    self.line_number
  }

  pub fn is_multiline(&self) -> bool {
    !self.buffer.is_empty()
  }

  pub fn clear_buffer(&mut self) {
    self.buffer.clear();
  }

  /// Evaluates a whole source text, such as a loaded file, in the session's environment.
  pub fn evaluate(&mut self, source: &str) -> Result<Vec<Outcome>, InputError> {
    process_input(source, &self.env, &mut self.io)
  }

  pub fn handle_line<H: Helper, I: History>(
    &mut self,
    line: String,
    editor: &mut Editor<H, I>,
  ) -> RustyResult<LineResult> {
    if !self.buffer.is_empty() {
      self.buffer.push('\n');
    }
    self.buffer.push_str(&line);

    match process_input(&self.buffer, &self.env, &mut self.io) {
      Ok(outcomes) => {
        editor.add_history_entry(self.buffer.as_str())?;
        self.buffer.clear();
        self.line_number += 1;
        Ok(LineResult::Complete(outcomes))
      }
      Err(InputError::Incomplete) => Ok(LineResult::NeedMore),
      Err(InputError::Error(msg)) => {
        editor.add_history_entry(self.buffer.as_str())?;
        self.buffer.clear();
        Ok(LineResult::Error(msg))
      }
    }
  }
}

pub enum LineResult {
  Complete(Vec<Outcome>),
  NeedMore,
  Error(String),
}

pub fn handle_interrupt(handler: &mut InputHandler) {
  println!("{}", "^C".yellow());
  handler.clear_buffer();
}

pub fn handle_eof() {
  println!("\n{}", "Goodbye!".bright_cyan().italic());
}

pub fn handle_error(err: ReadlineError) {
  eprintln!("{} {:?}", "Error:".red().bold(), err);
}

#[cfg(test)]
mod tests {
  use super::*;
  use rustyline::history::DefaultHistory;

  fn editor() -> Editor<(), DefaultHistory> {
    Editor::new().expect("editor")
  }

  #[test]
  fn test_multiline_entry_accumulates_until_balanced() {
    let mut handler = InputHandler::new();
    let mut editor = editor();

    let first = handler
      .handle_line("{((x) =>".to_string(), &mut editor)
      .expect("first line");
    assert!(matches!(first, LineResult::NeedMore));
    assert!(handler.is_multiline());

    let second = handler
      .handle_line("  (* x x)) 7}".to_string(), &mut editor)
      .expect("second line");
    match second {
      LineResult::Complete(outcomes) => assert_eq!(outcomes, vec![Ok("49".to_string())]),
      _ => panic!("expected a complete entry"),
    }
    assert!(!handler.is_multiline());
    assert_eq!(handler.line_number(), 2);
  }

  #[test]
  fn test_unreadable_line_resets_buffer() {
    let mut handler = InputHandler::new();
    let mut editor = editor();

    let result = handler
      .handle_line("(+ 1 2]".to_string(), &mut editor)
      .expect("line");
    assert!(matches!(result, LineResult::Error(_)));
    assert!(!handler.is_multiline());
    assert_eq!(handler.line_number(), 1);
  }

  #[test]
  fn test_interrupt_clears_pending_input() {
    let mut handler = InputHandler::new();
    let mut editor = editor();

    handler
      .handle_line("(+ 1".to_string(), &mut editor)
      .expect("line");
    handle_interrupt(&mut handler);
    assert!(!handler.is_multiline());
  }
}
