use ecow::EcoString;
use std::{fmt, rc::Rc};

use crate::env::Environment;
use crate::expr::{Expr, Symbol};

/// Runtime value. Immutable once produced; clones share closures.
#[derive(Clone)]
pub enum Value {
  Number(f64),
  String(EcoString),
  Bool(bool),
  Closure(Rc<Closure>),
  /// Built-in operation, resolved by name when applied.
  Primitive(Symbol),
}

/// A lambda paired with the environment it was evaluated in.
pub struct Closure {
  pub params: Rc<[Symbol]>,
  pub body: Rc<Expr>,
  pub env: Environment,
}

impl Value {
  pub fn closure(params: Rc<[Symbol]>, body: Rc<Expr>, env: Environment) -> Self {
    Value::Closure(Rc::new(Closure { params, body, env }))
  }

  pub fn primitive(name: &str) -> Self {
    Value::Primitive(name.into())
  }

  pub fn as_number(&self) -> Option<f64> {
    match self {
      Value::Number(n) => Some(*n),
      _ => None,
    }
  }

  pub fn is_callable(&self) -> bool {
    matches!(self, Value::Closure(_) | Value::Primitive(_))
  }
}

/// Structural for data variants, identity for closures.
impl PartialEq for Value {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Value::Number(a), Value::Number(b)) => a == b,
      (Value::String(a), Value::String(b)) => a == b,
      (Value::Bool(a), Value::Bool(b)) => a == b,
      (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
      (Value::Primitive(a), Value::Primitive(b)) => a == b,
      _ => false,
    }
  }
}

impl From<f64> for Value {
  fn from(value: f64) -> Self {
    Value::Number(value)
  }
}

impl From<&str> for Value {
  fn from(value: &str) -> Self {
    Value::String(value.into())
  }
}

impl From<String> for Value {
  fn from(value: String) -> Self {
    Value::String(value.into())
  }
}

impl From<EcoString> for Value {
  fn from(value: EcoString) -> Self {
    Value::String(value)
  }
}

impl From<bool> for Value {
  fn from(value: bool) -> Self {
    Value::Bool(value)
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Number(n) => write!(f, "{}", n),
      Value::String(s) => write!(f, "\"{}\"", s),
      Value::Bool(b) => write!(f, "{}", b),
      Value::Closure(_) => write!(f, "#<procedure>"),
      Value::Primitive(name) => write!(f, "#<primop:{}>", name),
    }
  }
}

// The captured environment is left out: it can be arbitrarily large and
// usually contains the closure itself through the recursion idiom.
impl fmt::Debug for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
      Value::String(s) => f.debug_tuple("String").field(s).finish(),
      Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
      Value::Closure(closure) => f
        .debug_struct("Closure")
        .field("params", &closure.params)
        .field("body", &format_args!("{}", closure.body))
        .finish_non_exhaustive(),
      Value::Primitive(name) => f.debug_tuple("Primitive").field(name).finish(),
    }
  }
}
