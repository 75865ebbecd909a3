mod config;
mod logging;
mod repl;

use aaqz::{Environment, EvalError, Evaluator, IoAdapter, StdioAdapter, parser};
use clap::{Parser, Subcommand};
use colored::*;
use std::thread;
use tracing::debug;

pub use config::Config;
pub use logging::init_tracing;

use crate::repl::ReplSession;

#[derive(Parser)]
#[command(name = "aaqz")]
#[command(about = "AAQZ - an eager, lexically scoped expression language", long_about = None)]
#[command(version)]
pub struct Cli {
  /// Stack size of the evaluation thread, in MiB
  #[arg(long, global = true, env = "AAQZ_STACK_SIZE", default_value_t = config::DEFAULT_STACK_SIZE_MIB)]
  pub stack_size: usize,

  #[command(subcommand)]
  pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
  /// Start an interactive REPL
  Repl,
  /// Run AAQZ code
  Run {
    /// Evaluate expressions from the command line and print their values
    #[arg(short, long)]
    eval: Option<String>,
    /// Run AAQZ files, one after another
    #[arg(value_name = "FILES")]
    files: Vec<String>,
  },
}

/// Runs `job` on a dedicated thread with a `stack_mib` MiB stack.
///
/// Evaluation recurses on the host stack for every nested call, so the main
/// thread's default stack is far too small for recursive programs.
pub fn run_with_stack<F>(stack_mib: usize, job: F) -> Result<(), String>
where
  F: FnOnce() -> Result<(), String> + Send + 'static,
{
  let stack_bytes = stack_mib
    .checked_mul(1024 * 1024)
    .ok_or_else(|| format!("Stack size of {} MiB is too large", stack_mib))?;

  let builder = thread::Builder::new()
    .name("aaqz-eval".to_string())
    .stack_size(stack_bytes);

  let handle = builder
    .spawn(job)
    .map_err(|e| format!("Failed to spawn evaluation thread: {}", e))?;

  handle
    .join()
    .map_err(|_| "Evaluation thread panicked".to_string())?
}

pub fn print_error(message: impl std::fmt::Display) {
  eprintln!("{} {}", "Error:".red().bold(), message);
}

fn report_eval_error(err: &EvalError) {
  debug!(cause = %err.root_cause(), frames = err.frames().len(), "evaluation failed");
  print_error(err);
}

/// Evaluates every top-level expression in `source`, one after another.
///
/// A failing expression is reported and does not stop the ones after it.
/// Returns the number of expressions that failed, or an error if the text
/// cannot be read at all past some point.
pub fn evaluate_source(
  source: &str,
  evaluator: &mut Evaluator<'_>,
  echo: bool,
) -> Result<usize, String> {
  let mut remaining = source;
  let mut failures = 0;

  loop {
    match parser::read(remaining) {
      Ok(Some((datum, rest))) => {
        remaining = rest;

        let expr = match parser::parse_datum_expr(&datum) {
          Ok(expr) => expr,
          Err(e) => {
            failures += 1;
            print_error(format!("Parse error: {}", e));
            continue;
          }
        };

        match evaluator.eval(&expr) {
          Ok(value) => {
            if echo {
              println!("{}", value);
            }
          }
          Err(e) => {
            failures += 1;
            report_eval_error(&e);
          }
        }
      }
      Ok(None) => break,
      Err(e) => return Err(format!("Parse error: {}", e)),
    }
  }

  Ok(failures)
}

fn finish(failures: usize) -> Result<(), String> {
  match failures {
    0 => Ok(()),
    1 => Err("1 expression failed".to_string()),
    n => Err(format!("{} expressions failed", n)),
  }
}

pub fn run_repl(config: Config) -> Result<(), String> {
  let mut session =
    ReplSession::new(&config).map_err(|e| format!("Failed to initialize REPL: {}", e))?;
  session.run().map_err(|e| format!("REPL error: {}", e))
}

pub fn run_eval(expression: &str) -> Result<(), String> {
  let mut io = StdioAdapter::new();
  let mut evaluator = Evaluator::new(&mut io);
  let failures = evaluate_source(expression, &mut evaluator, true)?;
  finish(failures)
}

pub fn run_file(path: &str, io: &mut dyn IoAdapter) -> Result<usize, String> {
  let contents =
    std::fs::read_to_string(path).map_err(|e| format!("Failed to read file '{}': {}", path, e))?;
  debug!(path, bytes = contents.len(), "running file");

  let mut evaluator = Evaluator::with_environment(io, Environment::top_level());
  evaluate_source(&contents, &mut evaluator, false).map_err(|e| format!("In file '{}': {}", path, e))
}

pub fn run_files(paths: &[String]) -> Result<(), String> {
  let mut io = StdioAdapter::new();
  let mut failures = 0;

  for path in paths {
    failures += run_file(path, &mut io)?;
  }

  finish(failures)
}
