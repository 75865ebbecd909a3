use ecow::EcoString;
use std::io;
use tracing::debug;

use crate::eval::{Arity, EvalError};
use crate::io::IoAdapter;
use crate::value::Value;

/// Names bound to primitive references in the top-level environment.
pub const PRIMITIVES: &[&str] = &[
  "+", "-", "*", "/", "<=", "error", "equal?", "println", "read-num", "read-str", "++", "seq",
];

const PROMPT: &str = "> ";

/// Performs the built-in operation `op` on already evaluated arguments.
///
/// Arity is always validated before operand types. Names that are not one of
/// the dedicated operations fall through to the binary arithmetic table and
/// are rejected there if unknown.
pub fn apply_prim(op: &str, args: Vec<Value>, io: &mut dyn IoAdapter) -> Result<Value, EvalError> {
  debug!(op, argc = args.len(), "applying primitive");

  match op {
    "println" => {
      expect_arity(Arity::Exactly(1), &args)?;
      match &args[0] {
        Value::String(text) => {
          io.println(text).map_err(io_error)?;
          Ok(Value::Bool(true))
        }
        _ => Err(type_mismatch(op, "a string", args)),
      }
    }

    "read-num" => {
      expect_arity(Arity::Exactly(0), &args)?;
      let line = prompt(io)?;
      line
        .trim()
        .parse::<f64>()
        .map(Value::Number)
        .map_err(|_| EvalError::ParseError(line))
    }

    "read-str" => {
      expect_arity(Arity::Exactly(0), &args)?;
      prompt(io).map(Value::from)
    }

    "seq" => {
      let mut args = args;
      args.pop().ok_or(EvalError::ArityMismatch {
        expected: Arity::AtLeast(1),
        args: Vec::new(),
      })
    }

    "++" => concat(&args).map(Value::String),

    "equal?" => {
      expect_arity(Arity::Exactly(2), &args)?;
      Ok(Value::Bool(values_equal(&args[0], &args[1])))
    }

    "error" => {
      expect_arity(Arity::Exactly(1), &args)?;
      let message = match &args[0] {
        Value::String(text) => text.clone(),
        other => other.to_string().into(),
      };
      Err(EvalError::UserError(message))
    }

    _ => arithmetic(op, args),
  }
}

fn arithmetic(op: &str, args: Vec<Value>) -> Result<Value, EvalError> {
  expect_arity(Arity::Exactly(2), &args)?;

  let (left, right) = match (args[0].as_number(), args[1].as_number()) {
    (Some(left), Some(right)) => (left, right),
    _ => return Err(type_mismatch(op, "two numbers", args)),
  };

  match op {
    "+" => Ok(Value::Number(left + right)),
    "-" => Ok(Value::Number(left - right)),
    "*" => Ok(Value::Number(left * right)),
    "/" if right == 0.0 => Err(EvalError::DivisionByZero(args)),
    "/" => Ok(Value::Number(left / right)),
    "<=" => Ok(Value::Bool(left <= right)),
    _ => Err(EvalError::UnknownOperation {
      name: op.into(),
      args,
    }),
  }
}

/// Same-variant equality on data values. Functions are never equal, and
/// comparing different variants is `false` rather than an error.
fn values_equal(left: &Value, right: &Value) -> bool {
  match (left, right) {
    (Value::Number(a), Value::Number(b)) => a == b,
    (Value::String(a), Value::String(b)) => a == b,
    (Value::Bool(a), Value::Bool(b)) => a == b,
    _ => false,
  }
}

fn concat(args: &[Value]) -> Result<EcoString, EvalError> {
  let mut result = EcoString::new();

  for arg in args {
    match arg {
      Value::Number(n) => result.push_str(&format!("{:.6}", n)),
      Value::String(s) => result.push_str(s),
      Value::Bool(b) => result.push_str(if *b { "true" } else { "false" }),
      other => return Err(EvalError::UnsupportedType(other.clone())),
    }
  }

  Ok(result)
}

fn prompt(io: &mut dyn IoAdapter) -> Result<String, EvalError> {
  io.print(PROMPT).map_err(io_error)?;
  io.read_line().map_err(io_error)
}

fn expect_arity(expected: Arity, args: &[Value]) -> Result<(), EvalError> {
  if expected.accepts(args.len()) {
    Ok(())
  } else {
    Err(EvalError::ArityMismatch {
      expected,
      args: args.to_vec(),
    })
  }
}

fn type_mismatch(op: &str, expected: &'static str, args: Vec<Value>) -> EvalError {
  EvalError::TypeMismatch {
    op: op.into(),
    expected,
    args,
  }
}

fn io_error(err: io::Error) -> EvalError {
  EvalError::Io(err.to_string())
}
