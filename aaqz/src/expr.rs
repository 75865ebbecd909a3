use ecow::EcoString;
use std::{fmt, rc::Rc};

/// Identifier name. Cheap to clone, shared between the tree and environments.
pub type Symbol = EcoString;

/// Abstract syntax tree produced by the parser and consumed read-only by the evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
  Number(f64),
  String(EcoString),
  Id(Symbol),
  If {
    cond: Box<Expr>,
    then: Box<Expr>,
    otherwise: Box<Expr>,
  },
  /// The parameter list and body are reference counted so every closure
  /// created from this node shares them instead of copying the subtree.
  Lambda { params: Rc<[Symbol]>, body: Rc<Expr> },
  App { callee: Box<Expr>, args: Vec<Expr> },
}

impl Expr {
  pub fn id(name: &str) -> Self {
    Expr::Id(name.into())
  }

  pub fn if_(cond: Expr, then: Expr, otherwise: Expr) -> Self {
    Expr::If {
      cond: Box::new(cond),
      then: Box::new(then),
      otherwise: Box::new(otherwise),
    }
  }

  pub fn lambda<S: Into<Symbol>>(params: impl IntoIterator<Item = S>, body: Expr) -> Self {
    Expr::Lambda {
      params: params.into_iter().map(Into::into).collect(),
      body: Rc::new(body),
    }
  }

  pub fn app(callee: Expr, args: Vec<Expr>) -> Self {
    Expr::App {
      callee: Box::new(callee),
      args,
    }
  }

  /// Application of a named function, the most common shape in tests and benches.
  pub fn call(name: &str, args: Vec<Expr>) -> Self {
    Expr::app(Expr::id(name), args)
  }
}

impl From<f64> for Expr {
  fn from(value: f64) -> Self {
    Expr::Number(value)
  }
}

impl From<&str> for Expr {
  fn from(value: &str) -> Self {
    Expr::String(value.into())
  }
}

impl fmt::Display for Expr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Expr::Number(n) => write!(f, "{}", n),
      Expr::String(s) => write!(f, "{:?}", s.as_str()),
      Expr::Id(name) => write!(f, "{}", name),
      Expr::If {
        cond,
        then,
        otherwise,
      } => write!(f, "(if {} {} {})", cond, then, otherwise),
      Expr::Lambda { params, body } => {
        write!(f, "((")?;
        for (i, param) in params.iter().enumerate() {
          if i > 0 {
            write!(f, " ")?;
          }
          write!(f, "{}", param)?;
        }
        write!(f, ") => {})", body)
      }
      Expr::App { callee, args } => {
        write!(f, "({}", callee)?;
        for arg in args {
          write!(f, " {}", arg)?;
        }
        write!(f, ")")
      }
    }
  }
}
