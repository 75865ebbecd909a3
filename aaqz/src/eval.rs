use ecow::EcoString;
use std::fmt;
use thiserror::Error;
use tracing::trace;

use crate::env::Environment;
use crate::expr::{Expr, Symbol};
use crate::io::IoAdapter;
use crate::prim::apply_prim;
use crate::value::{Closure, Value};

/// Number of arguments an operation accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
  Exactly(usize),
  AtLeast(usize),
}

impl Arity {
  pub fn accepts(self, count: usize) -> bool {
    match self {
      Arity::Exactly(n) => count == n,
      Arity::AtLeast(n) => count >= n,
    }
  }
}

impl fmt::Display for Arity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Arity::Exactly(n) => write!(f, "{}", n),
      Arity::AtLeast(n) => write!(f, "at least {}", n),
    }
  }
}

/// Which sub-evaluation an error escaped from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
  Condition,
  Callee,
  /// Zero-based position in the argument list.
  Argument(usize),
  Primitive(Symbol),
}

impl fmt::Display for Frame {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Frame::Condition => write!(f, "error evaluating condition"),
      Frame::Callee => write!(f, "error evaluating function position"),
      Frame::Argument(index) => write!(f, "error evaluating argument {}", index + 1),
      Frame::Primitive(name) => write!(f, "error applying primitive `{}`", name),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
  #[error("name not found: {0}")]
  NameNotFound(Symbol),

  #[error("condition must be a boolean, got: {0}")]
  NotABoolean(Value),

  #[error("value is not callable: {0}")]
  NotCallable(Value),

  #[error(
    "wrong number of arguments: expected {expected}, got {}: {}",
    .args.len(),
    fmt_values(.args)
  )]
  ArityMismatch { expected: Arity, args: Vec<Value> },

  #[error("`{op}` expects {expected}, got: {}", fmt_values(.args))]
  TypeMismatch {
    op: Symbol,
    expected: &'static str,
    args: Vec<Value>,
  },

  #[error("division by zero, got: {}", fmt_values(.0))]
  DivisionByZero(Vec<Value>),

  #[error("unsupported value type for ++: {0}")]
  UnsupportedType(Value),

  #[error("unknown operation `{name}`, got: {}", fmt_values(.args))]
  UnknownOperation { name: Symbol, args: Vec<Value> },

  #[error("user-error: {0}")]
  UserError(EcoString),

  #[error("invalid input, not a real number: {0:?}")]
  ParseError(String),

  #[error("i/o failure: {0}")]
  Io(String),

  #[error("{frame}: {source}")]
  Context {
    frame: Frame,
    source: Box<EvalError>,
  },
}

impl EvalError {
  pub fn context(self, frame: Frame) -> Self {
    EvalError::Context {
      frame,
      source: Box::new(self),
    }
  }

  /// The error with every propagation frame stripped.
  pub fn root_cause(&self) -> &EvalError {
    let mut current = self;
    while let EvalError::Context { source, .. } = current {
      current = source;
    }
    current
  }

  /// Propagation frames from outermost to innermost.
  pub fn frames(&self) -> Vec<&Frame> {
    let mut frames = Vec::new();
    let mut current = self;
    while let EvalError::Context { frame, source } = current {
      frames.push(frame);
      current = source;
    }
    frames
  }
}

fn fmt_values(values: &[Value]) -> String {
  let items: Vec<String> = values.iter().map(Value::to_string).collect();
  format!("[{}]", items.join(", "))
}

/// Eager, environment-passing interpreter.
///
/// The evaluator recurses on the host stack for both nested expressions and
/// closure calls; there is no tail-call elimination, so deeply recursive
/// programs need a thread with a large enough stack.
pub struct Evaluator<'io> {
  io: &'io mut dyn IoAdapter,
  env: Environment,
  depth: usize,
}

impl<'io> Evaluator<'io> {
  pub fn new(io: &'io mut dyn IoAdapter) -> Self {
    Self::with_environment(io, Environment::top_level())
  }

  pub fn with_environment(io: &'io mut dyn IoAdapter, env: Environment) -> Self {
    Self { io, env, depth: 0 }
  }

  /// Evaluates a top-level expression in the evaluator's root environment.
  #[tracing::instrument(level = "debug", skip_all, fields(expr = %expr))]
  pub fn eval(&mut self, expr: &Expr) -> Result<Value, EvalError> {
    let env = self.env.clone();
    self.interp(expr, &env)
  }

  pub fn interp(&mut self, expr: &Expr, env: &Environment) -> Result<Value, EvalError> {
    match expr {
      Expr::Number(n) => Ok(Value::Number(*n)),
      Expr::String(s) => Ok(Value::String(s.clone())),
      Expr::Id(name) => env.lookup(name),

      Expr::If {
        cond,
        then,
        otherwise,
      } => {
        let test = self
          .interp(cond, env)
          .map_err(|e| e.context(Frame::Condition))?;

        match test {
          Value::Bool(true) => self.interp(then, env),
          Value::Bool(false) => self.interp(otherwise, env),
          other => Err(EvalError::NotABoolean(other)),
        }
      }

      Expr::Lambda { params, body } => Ok(Value::closure(params.clone(), body.clone(), env.clone())),

      Expr::App { callee, args } => {
        let callee = self
          .interp(callee, env)
          .map_err(|e| e.context(Frame::Callee))?;

        if !callee.is_callable() {
          return Err(EvalError::NotCallable(callee));
        }

        let mut values = Vec::with_capacity(args.len());
        for (index, arg) in args.iter().enumerate() {
          let value = self
            .interp(arg, env)
            .map_err(|e| e.context(Frame::Argument(index)))?;
          values.push(value);
        }

        self.apply(callee, values)
      }
    }
  }

  /// Applies an already evaluated function value to evaluated arguments.
  pub fn apply(&mut self, callee: Value, args: Vec<Value>) -> Result<Value, EvalError> {
    match callee {
      Value::Primitive(op) => {
        apply_prim(&op, args, &mut *self.io).map_err(|e| e.context(Frame::Primitive(op)))
      }
      Value::Closure(closure) => self.apply_closure(&closure, args),
      other => Err(EvalError::NotCallable(other)),
    }
  }

  fn apply_closure(&mut self, closure: &Closure, args: Vec<Value>) -> Result<Value, EvalError> {
    if closure.params.len() != args.len() {
      return Err(EvalError::ArityMismatch {
        expected: Arity::Exactly(closure.params.len()),
        args,
      });
    }

    let env = closure.env.extend(&closure.params, args);

    self.depth += 1;
    trace!(depth = self.depth, arity = closure.params.len(), "entering closure");
    let result = self.interp(&closure.body, &env);
    self.depth -= 1;

    result
  }
}
