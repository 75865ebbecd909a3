use aaqz::PRIMITIVES;
use colored::*;
use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::history::{DefaultHistory, History};
use rustyline::{Editor, Result as RustyResult};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::eval::{InputError, Outcome};
use super::helper::ReplHelper;
use super::input::{InputHandler, LineResult, handle_eof, handle_error, handle_interrupt};
use crate::config::Config;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const HISTORY_SHOWN: usize = 20;

pub struct ReplSession {
  editor: Editor<ReplHelper, DefaultHistory>,
  history_file: PathBuf,
  input_handler: InputHandler,
}

impl ReplSession {
  pub fn new(config: &Config) -> RustyResult<Self> {
    let mut editor = Editor::new()?;
    editor.set_helper(Some(ReplHelper::new()));
    editor.set_max_history_size(config.history_size)?;

    // A missing history file is expected on the first run.
    if let Err(e) = editor.load_history(&config.history_file) {
      debug!(path = %config.history_file.display(), error = %e, "no history loaded");
    }

    Ok(Self {
      editor,
      history_file: config.history_file.clone(),
      input_handler: InputHandler::new(),
    })
  }

  pub fn run(&mut self) -> RustyResult<()> {
    print_banner();

    loop {
      let prompt = self.create_prompt();

      match self.editor.readline(&prompt) {
        Ok(line) => {
          if !self.input_handler.is_multiline() {
            if line.trim().is_empty() {
              continue;
            }

            match self.handle_command(&line) {
              CommandResult::Exit => {
                handle_eof();
                break;
              }
              CommandResult::Continue => continue,
              CommandResult::Evaluate => {}
            }
          }

          match self.input_handler.handle_line(line, &mut self.editor)? {
            LineResult::Complete(outcomes) => print_outcomes(&outcomes),
            LineResult::NeedMore => {}
            LineResult::Error(msg) => print_error(&msg),
          }
        }
        Err(ReadlineError::Interrupted) => handle_interrupt(&mut self.input_handler),
        Err(ReadlineError::Eof) => {
          handle_eof();
          break;
        }
        Err(err) => {
          handle_error(err);
          break;
        }
      }
    }

    if let Err(e) = self.editor.save_history(&self.history_file) {
      warn!(path = %self.history_file.display(), error = %e, "could not save history");
      eprintln!("Warning: Could not save history: {}", e);
    }

    Ok(())
  }

  fn create_prompt(&self) -> String {
    if self.input_handler.is_multiline() {
      "  ".to_string()
    } else {
      format!(
        "{}{}❯ ",
        "aaqz".bright_cyan().bold(),
        format!("[{}]", self.input_handler.line_number()).bright_black()
      )
    }
  }

  fn handle_command(&mut self, line: &str) -> CommandResult {
    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or("");

    match command {
      ":l" | ":load" => {
        self.load_file(words.next().unwrap_or(""));
        CommandResult::Continue
      }
      ":quit" | ":exit" => CommandResult::Exit,
      ":help" => {
        print_help();
        CommandResult::Continue
      }
      ":history" => {
        print_history(&self.editor);
        CommandResult::Continue
      }
      _ => CommandResult::Evaluate,
    }
  }

  fn load_file(&mut self, file: &str) {
    if file.is_empty() {
      print_error(&format!(
        "Please provide a file path: {} or {}",
        ":l <path>".bright_green(),
        ":load <path>".bright_green()
      ));
      return;
    }

    let path = Path::new(file);
    if !path.is_file() {
      print_error(&format!(
        "Not a readable file: {}",
        path.display().to_string().bright_yellow()
      ));
      return;
    }

    let contents = match std::fs::read_to_string(path) {
      Ok(contents) => contents,
      Err(e) => {
        print_error(&format!("Failed to read file '{}': {}", path.display(), e));
        return;
      }
    };
    debug!(path = %path.display(), bytes = contents.len(), "loading file");

    match self.input_handler.evaluate(&contents) {
      Ok(outcomes) => {
        let failures = outcomes.iter().filter(|o| o.is_err()).count();
        for err in outcomes.iter().filter_map(|o| o.as_ref().err()) {
          print_error(err);
        }
        println!(
          "{} Loaded {} ({} expressions, {} failed)",
          "✓".bright_green().bold(),
          path.display().to_string().bright_cyan(),
          outcomes.len(),
          failures
        );
      }
      Err(InputError::Incomplete) => print_error(&format!(
        "Incomplete input in file {}",
        path.display().to_string().bright_yellow()
      )),
      Err(InputError::Error(msg)) => print_error(&format!(
        "In file {}: {}",
        path.display().to_string().bright_yellow(),
        msg
      )),
    }
  }
}

#[derive(Debug, PartialEq)]
enum CommandResult {
  Exit,
  Continue,
  Evaluate,
}

fn print_error(msg: &str) {
  eprintln!("{} {}", "Error:".red().bold(), msg);
}

fn print_outcomes(outcomes: &[Outcome]) {
  for outcome in outcomes {
    match outcome {
      Ok(value) => println!("{} {}", "=>".bright_green().bold(), value.bright_white()),
      Err(msg) => print_error(msg),
    }
  }
}

fn print_banner() {
  println!(
    "{} {}",
    "AAQZ".bright_cyan().bold(),
    format!("v{}", VERSION).bright_black()
  );
  println!(
    "  {} {} | {} {}\n",
    "Type".bright_white(),
    ":help".bright_green().bold(),
    ":quit".bright_green().bold(),
    "to exit".bright_white(),
  );
}

fn print_help() {
  let separator = "━".repeat(50).bright_black().to_string();

  println!("\n{}", separator);
  println!("  {}", "AAQZ REPL".bright_cyan().bold());
  println!("{}", separator);

  println!("\n  {}", "Commands".bright_yellow().bold());
  println!("    {:12} Show this help", ":help".bright_green());
  println!("    {:12} Exit the REPL", ":quit".bright_green());
  println!("    {:12} Show history", ":history".bright_green());
  println!("    {:12} Load and evaluate a file", ":l <file>".bright_green());

  println!("\n  {}", "Syntax".bright_yellow().bold());
  println!("    {}", "(if (<= x 0) \"small\" \"big\")".bright_white());
  println!("    {}", "{((x y) => (+ x y)) 1 2}".bright_white());
  println!("    {}", "(seq (println \"hi\") (read-num))".bright_white());

  println!("\n  {}", "Primitives".bright_yellow().bold());
  println!("    {}", PRIMITIVES.join(" ").bright_magenta());
  println!("    {}", "true false".bright_magenta());

  println!("\n  {}", "Navigation".bright_yellow().bold());
  println!("    {:12} Browse history", "↑/↓".bright_magenta());
  println!("    {:12} Search history", "Ctrl+R".bright_magenta());
  println!("    {:12} Complete names and paths", "Tab".bright_magenta());
  println!("    {:12} Interrupt", "Ctrl+C".bright_magenta());
  println!("    {:12} Exit", "Ctrl+D".bright_magenta());

  println!("\n{}\n", separator);
}

fn print_history(editor: &Editor<ReplHelper, DefaultHistory>) {
  let history = editor.history();
  let separator = "─".repeat(60);

  println!("\n{}", separator.bright_black());
  println!("{}", "  REPL History  ".bright_cyan().bold());
  println!("{}", separator.bright_black());

  if history.is_empty() {
    println!("  {}", "No history entries yet".bright_black().italic());
  } else {
    let total = history.len();
    let start = total.saturating_sub(HISTORY_SHOWN);

    if start > 0 {
      println!("  {} {} entries omitted", "...".bright_black(), start);
    }

    for (i, entry) in history.iter().enumerate().skip(start) {
      println!(
        "  {} {}",
        format!("{:>3}:", i + 1).bright_black(),
        entry.bright_white()
      );
    }
  }

  println!("{}\n", separator.bright_black());
}
