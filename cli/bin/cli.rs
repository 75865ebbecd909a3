use clap::Parser;
use cli::{Cli, Commands, Config, init_tracing, print_error, run_eval, run_files, run_repl, run_with_stack};
use std::process;
use tracing::debug;

fn main() {
  init_tracing();

  let cli = Cli::parse();
  let config = Config::from_env(cli.stack_size);
  debug!(?config, "starting");

  let result = match cli.command {
    Some(Commands::Repl) | None => run_with_stack(config.stack_size_mib, move || run_repl(config)),
    Some(Commands::Run { eval, files }) => match (eval, files.is_empty()) {
      (Some(expr), _) => run_with_stack(config.stack_size_mib, move || run_eval(&expr)),
      (None, false) => run_with_stack(config.stack_size_mib, move || run_files(&files)),
      (None, true) => Err("Either --eval or file paths must be provided".to_string()),
    },
  };

  if let Err(e) = result {
    print_error(e);
    process::exit(1);
  }
}
