pub mod env;
pub mod eval;
pub mod expr;
pub mod io;
pub mod parser;
pub mod prim;
pub mod value;

pub use env::Environment;
pub use eval::{Arity, EvalError, Evaluator, Frame};
pub use expr::{Expr, Symbol};
pub use io::{IoAdapter, MockIoAdapter, StdioAdapter, StringIoAdapter};
pub use parser::ParseError;
pub use prim::{PRIMITIVES, apply_prim};
pub use value::Value;
