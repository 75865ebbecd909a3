use aaqz::{Environment, Evaluator, IoAdapter, ParseError, parser};

#[derive(Debug, PartialEq)]
pub enum InputError {
  Incomplete,
  Error(String),
}

impl From<ParseError> for InputError {
  fn from(err: ParseError) -> Self {
    match err {
      ParseError::Incomplete => InputError::Incomplete,
      ParseError::UnmatchedClosing => {
        InputError::Error("Unexpected closing bracket".to_string())
      }
      other => InputError::Error(format!("Parse error: {}", other)),
    }
  }
}

/// Rendered value or error message of one top-level expression.
pub type Outcome = Result<String, String>;

/// Reads the whole of `input` and evaluates each expression in `env`.
///
/// Nothing is evaluated unless every form in the input reads, so a half-typed
/// multi-line entry never runs the complete forms that precede it twice.
pub fn process_input(
  input: &str,
  env: &Environment,
  io: &mut dyn IoAdapter,
) -> Result<Vec<Outcome>, InputError> {
  let data = parser::read_all(input)?;
  let mut evaluator = Evaluator::with_environment(io, env.clone());

  Ok(
    data
      .iter()
      .map(|datum| {
        let expr =
          parser::parse_datum_expr(datum).map_err(|e| format!("Parse error: {}", e))?;
        evaluator
          .eval(&expr)
          .map(|value| value.to_string())
          .map_err(|e| e.to_string())
      })
      .collect(),
  )
}
