use std::{fmt, rc::Rc};

use crate::eval::EvalError;
use crate::expr::Symbol;
use crate::prim::PRIMITIVES;
use crate::value::Value;

/// Lexical scope chain.
///
/// Every frame is immutable after construction, so an environment is a cheap
/// handle that closures can capture and share. Extending allocates a new frame
/// whose parent is the extended environment; the parent itself never changes.
#[derive(Clone, Default)]
pub struct Environment {
  frame: Option<Rc<Frame>>,
}

struct Frame {
  bindings: Vec<(Symbol, Value)>,
  parent: Environment,
}

impl Environment {
  /// An environment with no bindings at all.
  pub fn new() -> Self {
    Self::default()
  }

  /// The root environment every program starts in: one primitive reference
  /// per built-in operation plus `true` and `false`.
  pub fn top_level() -> Self {
    let mut bindings: Vec<(Symbol, Value)> = PRIMITIVES
      .iter()
      .map(|name| (Symbol::from(*name), Value::primitive(name)))
      .collect();
    bindings.push(("true".into(), Value::Bool(true)));
    bindings.push(("false".into(), Value::Bool(false)));

    Environment::new().with_bindings(bindings)
  }

  /// Finds the newest binding for `name`, scanning innermost frame first and
  /// each frame from its last binding backwards.
  pub fn lookup(&self, name: &str) -> Result<Value, EvalError> {
    let mut current = self.frame.as_deref();

    while let Some(frame) = current {
      if let Some((_, value)) = frame.bindings.iter().rev().find(|(n, _)| n.as_str() == name) {
        return Ok(value.clone());
      }
      current = frame.parent.frame.as_deref();
    }

    Err(EvalError::NameNotFound(name.into()))
  }

  /// Binds `params[i]` to `args[i]` in a new child environment.
  ///
  /// The caller is responsible for checking that both sides have the same
  /// length; arity errors are reported by the evaluator, not here.
  pub fn extend(&self, params: &[Symbol], args: Vec<Value>) -> Environment {
    debug_assert_eq!(params.len(), args.len());
    self.with_bindings(params.iter().cloned().zip(args).collect())
  }

  /// Shorthand for extending with a single binding.
  pub fn bind(&self, name: impl Into<Symbol>, value: Value) -> Environment {
    self.with_bindings(vec![(name.into(), value)])
  }

  fn with_bindings(&self, bindings: Vec<(Symbol, Value)>) -> Environment {
    Environment {
      frame: Some(Rc::new(Frame {
        bindings,
        parent: self.clone(),
      })),
    }
  }

  /// True when both handles point at the same frame.
  pub fn ptr_eq(&self, other: &Environment) -> bool {
    match (&self.frame, &other.frame) {
      (Some(a), Some(b)) => Rc::ptr_eq(a, b),
      (None, None) => true,
      _ => false,
    }
  }

  /// Number of frames between this environment and the root.
  pub fn depth(&self) -> usize {
    let mut depth = 0;
    let mut current = self.frame.as_deref();
    while let Some(frame) = current {
      depth += 1;
      current = frame.parent.frame.as_deref();
    }
    depth
  }

  /// Every visible name once, innermost binding first.
  pub fn names(&self) -> Vec<Symbol> {
    let mut names: Vec<Symbol> = Vec::new();
    let mut current = self.frame.as_deref();

    while let Some(frame) = current {
      for (name, _) in frame.bindings.iter().rev() {
        if !names.contains(name) {
          names.push(name.clone());
        }
      }
      current = frame.parent.frame.as_deref();
    }

    names
  }
}

impl fmt::Debug for Environment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Environment")
      .field("depth", &self.depth())
      .field("names", &self.names())
      .finish()
  }
}
