use std::env;
use std::path::PathBuf;

pub const DEFAULT_STACK_SIZE_MIB: usize = 64;
pub const DEFAULT_HISTORY_SIZE: usize = 1000;

const HISTORY_FILE_VAR: &str = "AAQZ_REPL_HISTORY";
const HISTORY_SIZE_VAR: &str = "AAQZ_REPL_HISTORY_SIZE";
const HISTORY_FILE_NAME: &str = ".aaqz_history";

/// Settings gathered from the command line and the environment.
#[derive(Debug, Clone)]
pub struct Config {
  pub stack_size_mib: usize,
  pub history_file: PathBuf,
  pub history_size: usize,
}

impl Config {
  pub fn from_env(stack_size_mib: usize) -> Self {
    Config {
      stack_size_mib,
      history_file: get_history_file(),
      history_size: get_history_size(),
    }
  }
}

fn get_history_file() -> PathBuf {
  if let Ok(path) = env::var(HISTORY_FILE_VAR) {
    return PathBuf::from(path);
  }

  if let Some(mut home) = dirs::home_dir() {
    home.push(HISTORY_FILE_NAME);
    return home;
  }

  PathBuf::from(HISTORY_FILE_NAME)
}

fn get_history_size() -> usize {
  parse_history_size(env::var(HISTORY_SIZE_VAR).ok().as_deref())
}

fn parse_history_size(raw: Option<&str>) -> usize {
  raw
    .and_then(|s| s.trim().parse().ok())
    .unwrap_or(DEFAULT_HISTORY_SIZE)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_history_size_falls_back_to_default() {
    assert_eq!(parse_history_size(None), DEFAULT_HISTORY_SIZE);
    assert_eq!(parse_history_size(Some("lots")), DEFAULT_HISTORY_SIZE);
    assert_eq!(parse_history_size(Some(" 50 ")), 50);
  }

  #[test]
  fn test_from_env_keeps_stack_size() {
    let config = Config::from_env(8);
    assert_eq!(config.stack_size_mib, 8);
  }
}
