use ecow::EcoString;
use nom::{
  Err, IResult, Parser,
  branch::alt,
  bytes::complete::{take_while, take_while1},
  character::complete::{char, digit1, multispace1, one_of},
  combinator::{map, map_res, opt, recognize, value},
  multi::many0,
  sequence::{delimited, preceded},
};
use std::fmt;
use thiserror::Error;

use crate::expr::{Expr, Symbol};

/// Words that can never be used as identifiers.
pub const RESERVED: &[&str] = &["if", "=", "bind", "=>"];

const LAMBDA_ARROW: &str = "=>";

/// Surface syntax tree: what the reader produces before any validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
  Number(f64),
  String(EcoString),
  Symbol(Symbol),
  List(Vec<Datum>),
}

impl fmt::Display for Datum {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Datum::Number(n) => write!(f, "{}", n),
      Datum::String(s) => write!(f, "{:?}", s.as_str()),
      Datum::Symbol(s) => write!(f, "{}", s),
      Datum::List(items) => {
        write!(f, "(")?;
        for (i, item) in items.iter().enumerate() {
          if i > 0 {
            write!(f, " ")?;
          }
          write!(f, "{}", item)?;
        }
        write!(f, ")")
      }
    }
  }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
  #[error("incomplete input")]
  Incomplete,

  #[error("unexpected closing bracket")]
  UnmatchedClosing,

  #[error("invalid syntax: {0}")]
  Syntax(String),

  #[error("invalid syntax: empty list")]
  EmptyList,

  #[error("invalid if expression: expected 3 sub-expressions, got {0}")]
  MalformedIf(usize),

  #[error("invalid identifier: {0}")]
  InvalidIdentifier(Symbol),

  #[error("invalid lambda: {0}")]
  MalformedLambda(String),

  #[error("duplicate parameter: {0}")]
  DuplicateParameter(Symbol),
}

#[inline]
fn is_delimiter(c: char) -> bool {
  c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | '{' | '}' | ';' | ',')
}

#[inline]
fn with_delimiter_check<'a, O, F>(mut parser: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
  F: Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>,
{
  move |i: &'a str| {
    let (rest, value) = parser.parse(i)?;
    if let Some(next_char) = rest.chars().next()
      && !is_delimiter(next_char)
    {
      return Err(nom::Err::Failure(nom::error::Error::new(
        i,
        nom::error::ErrorKind::Digit,
      )));
    }
    Ok((rest, value))
  }
}

#[inline]
fn parse_exponent(i: &str) -> IResult<&str, &str> {
  recognize((one_of("eE"), opt(one_of("+-")), digit1)).parse(i)
}

/// Integers, decimals, leading-dot and scientific forms; all read as `f64`.
fn parse_number(i: &str) -> IResult<&str, Datum> {
  with_delimiter_check(map_res(
    recognize((
      opt(char('-')),
      alt((
        recognize((digit1, opt((char('.'), opt(digit1))))),
        recognize((char('.'), digit1)),
      )),
      opt(parse_exponent),
    )),
    |s: &str| s.parse::<f64>().map(Datum::Number),
  ))(i)
}

#[inline]
fn is_symbol_char(c: char) -> bool {
  c.is_alphanumeric()
    || matches!(
      c,
      '-' | '_' | '+' | '*' | '/' | '=' | '<' | '>' | '?' | '!' | '%'
    )
}

fn parse_symbol(i: &str) -> IResult<&str, Datum> {
  if let Some(first_char) = i.chars().next()
    && first_char.is_ascii_digit()
  {
    return Err(nom::Err::Error(nom::error::Error::new(
      i,
      nom::error::ErrorKind::Alpha,
    )));
  }

  map(take_while1(is_symbol_char), |s: &str| Datum::Symbol(s.into())).parse(i)
}

fn parse_string_content(i: &str) -> IResult<&str, String> {
  let mut result = String::with_capacity(i.len().min(256));
  let mut input = i;

  loop {
    let special_pos = input.find(['\\', '"']).unwrap_or(input.len());

    if special_pos > 0 {
      result.push_str(&input[..special_pos]);
      input = &input[special_pos..];
    }

    if input.is_empty() {
      return Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Eof,
      )));
    }

    match input.chars().next() {
      Some('"') => break,
      Some('\\') => {
        input = &input[1..];
        if let Some(c) = input.chars().next() {
          let ch = match c {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '\\' => '\\',
            '"' => '"',
            _ => c,
          };
          result.push(ch);
          input = &input[c.len_utf8()..];
        } else {
          return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Eof,
          )));
        }
      }
      _ => {
        return Err(nom::Err::Error(nom::error::Error::new(
          input,
          nom::error::ErrorKind::Char,
        )));
      }
    }
  }

  Ok((input, result))
}

fn parse_string(i: &str) -> IResult<&str, Datum> {
  map(
    delimited(char('"'), parse_string_content, char('"')),
    |s: String| Datum::String(s.into()),
  )
  .parse(i)
}

#[inline]
fn parse_comment(i: &str) -> IResult<&str, ()> {
  value((), preceded(char(';'), take_while(|c| c != '\n'))).parse(i)
}

#[inline]
fn skip_ws_and_comments(i: &str) -> IResult<&str, ()> {
  value(
    (),
    many0(alt((
      value((), multispace1),
      parse_comment,
      value((), char(',')),
    ))),
  )
  .parse(i)
}

fn list_of(open: char, close: char) -> impl FnMut(&str) -> IResult<&str, Datum> {
  move |i: &str| {
    map(
      delimited(
        char(open),
        many0(parse_datum),
        preceded(skip_ws_and_comments, char(close)),
      ),
      Datum::List,
    )
    .parse(i)
  }
}

fn parse_list(i: &str) -> IResult<&str, Datum> {
  alt((list_of('(', ')'), list_of('[', ']'), list_of('{', '}'))).parse(i)
}

fn parse_datum(i: &str) -> IResult<&str, Datum> {
  preceded(
    skip_ws_and_comments,
    alt((parse_number, parse_string, parse_list, parse_symbol)),
  )
  .parse(i)
}

enum BalanceState {
  Balanced,
  Incomplete,
  UnmatchedClosing,
  Mismatched { expected: char, found: char },
}

fn closer_for(open: char) -> char {
  match open {
    '(' => ')',
    '[' => ']',
    _ => '}',
  }
}

fn check_balanced(input: &str) -> BalanceState {
  let mut open = Vec::new();
  let mut in_string = false;
  let mut in_comment = false;
  let mut escaped = false;

  for c in input.chars() {
    if in_comment {
      in_comment = c != '\n';
    } else if in_string {
      if escaped {
        escaped = false;
      } else if c == '\\' {
        escaped = true;
      } else if c == '"' {
        in_string = false;
      }
    } else {
      match c {
        '"' => in_string = true,
        ';' => in_comment = true,
        '(' | '[' | '{' => open.push(closer_for(c)),
        ')' | ']' | '}' => match open.pop() {
          None => return BalanceState::UnmatchedClosing,
          Some(expected) if expected != c => {
            return BalanceState::Mismatched { expected, found: c };
          }
          Some(_) => {}
        },
        _ => {}
      }
    }
  }

  if in_string || !open.is_empty() {
    BalanceState::Incomplete
  } else {
    BalanceState::Balanced
  }
}

/// Reads the next datum from `input`.
///
/// Returns `Ok(None)` when only whitespace and comments remain, otherwise the
/// datum together with the unconsumed rest of the input.
pub fn read(input: &str) -> Result<Option<(Datum, &str)>, ParseError> {
  let trimmed = match skip_ws_and_comments(input) {
    Ok((rest, _)) => rest,
    Err(_) => input,
  };

  if trimmed.is_empty() {
    return Ok(None);
  }

  match check_balanced(trimmed) {
    BalanceState::Incomplete => return Err(ParseError::Incomplete),
    BalanceState::UnmatchedClosing => return Err(ParseError::UnmatchedClosing),
    BalanceState::Mismatched { expected, found } => {
      return Err(ParseError::Syntax(format!(
        "expected `{}` but found `{}`",
        expected, found
      )));
    }
    BalanceState::Balanced => {}
  }

  match parse_datum(trimmed) {
    Ok((remaining, datum)) => Ok(Some((datum, remaining))),
    Err(Err::Error(_)) | Err(Err::Failure(_)) => Err(ParseError::Syntax(format!(
      "unreadable input at: {}",
      trimmed.get(..20).unwrap_or(trimmed)
    ))),
    Err(Err::Incomplete(_)) => Err(ParseError::Incomplete),
  }
}

/// Reads every datum in `input`.
pub fn read_all(input: &str) -> Result<Vec<Datum>, ParseError> {
  let mut data = Vec::new();
  let mut remaining = input;

  while let Some((datum, rest)) = read(remaining)? {
    data.push(datum);
    remaining = rest;
  }

  Ok(data)
}

pub fn is_valid_identifier(name: &str) -> bool {
  !RESERVED.contains(&name)
}

fn parse_identifier(name: &Symbol) -> Result<Symbol, ParseError> {
  if is_valid_identifier(name) {
    Ok(name.clone())
  } else {
    Err(ParseError::InvalidIdentifier(name.clone()))
  }
}

fn parse_params(datum: &Datum) -> Result<Vec<Symbol>, ParseError> {
  let Datum::List(items) = datum else {
    return Err(ParseError::MalformedLambda(format!(
      "expected a parameter list, got: {}",
      datum
    )));
  };

  let mut params: Vec<Symbol> = Vec::with_capacity(items.len());
  for item in items {
    let Datum::Symbol(name) = item else {
      return Err(ParseError::MalformedLambda(format!(
        "parameters must be identifiers, got: {}",
        item
      )));
    };
    let name = parse_identifier(name)?;
    if params.contains(&name) {
      return Err(ParseError::DuplicateParameter(name));
    }
    params.push(name);
  }

  Ok(params)
}

fn is_symbol(datum: &Datum, expected: &str) -> bool {
  matches!(datum, Datum::Symbol(name) if name.as_str() == expected)
}

/// Turns a datum into an expression, validating special forms and identifiers.
pub fn parse_datum_expr(datum: &Datum) -> Result<Expr, ParseError> {
  match datum {
    Datum::Number(n) => Ok(Expr::Number(*n)),
    Datum::String(s) => Ok(Expr::String(s.clone())),
    Datum::Symbol(name) => parse_identifier(name).map(Expr::Id),
    Datum::List(items) => match items.as_slice() {
      [] => Err(ParseError::EmptyList),

      [head, rest @ ..] if is_symbol(head, "if") => match rest {
        [cond, then, otherwise] => Ok(Expr::if_(
          parse_datum_expr(cond)?,
          parse_datum_expr(then)?,
          parse_datum_expr(otherwise)?,
        )),
        _ => Err(ParseError::MalformedIf(rest.len())),
      },

      [params, arrow, body] if is_symbol(arrow, LAMBDA_ARROW) => {
        let params = parse_params(params)?;
        Ok(Expr::lambda(params, parse_datum_expr(body)?))
      }

      [head, args @ ..] => {
        let callee = parse_datum_expr(head)?;
        let args = args
          .iter()
          .map(parse_datum_expr)
          .collect::<Result<Vec<_>, _>>()?;
        Ok(Expr::app(callee, args))
      }
    },
  }
}

/// Reads and parses the next expression from `input`.
pub fn parse(input: &str) -> Result<Option<(Expr, &str)>, ParseError> {
  match read(input)? {
    Some((datum, rest)) => Ok(Some((parse_datum_expr(&datum)?, rest))),
    None => Ok(None),
  }
}

/// Parses every expression in `input`, stopping at the first error.
pub fn parse_program(input: &str) -> Result<Vec<Expr>, ParseError> {
  read_all(input)?.iter().map(parse_datum_expr).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn read_one(input: &str) -> Datum {
    read(input)
      .expect("Failed to read input")
      .expect("Expected a datum")
      .0
  }

  fn parse_one(input: &str) -> Result<Expr, ParseError> {
    parse(input).map(|parsed| parsed.expect("Expected an expression").0)
  }

  fn sym(name: &str) -> Datum {
    Datum::Symbol(name.into())
  }

  #[test]
  fn test_read_numbers() {
    assert_eq!(read_one("42"), Datum::Number(42.0));
    assert_eq!(read_one("-42"), Datum::Number(-42.0));
    assert_eq!(read_one("42.5"), Datum::Number(42.5));
    assert_eq!(read_one(".5"), Datum::Number(0.5));
    assert_eq!(read_one("-.5"), Datum::Number(-0.5));
    assert_eq!(read_one("42."), Datum::Number(42.0));
    assert_eq!(read_one("1.5e10"), Datum::Number(1.5e10));
    assert_eq!(read_one("1E-3"), Datum::Number(1e-3));
  }

  #[test]
  fn test_read_rejects_number_followed_by_garbage() {
    assert!(matches!(read("12abc"), Err(ParseError::Syntax(_))));
    assert!(matches!(read("1.2.3"), Err(ParseError::Syntax(_))));
  }

  #[test]
  fn test_read_strings() {
    assert_eq!(read_one("\"hello\""), Datum::String("hello".into()));
    assert_eq!(
      read_one("\"hello\\nworld\""),
      Datum::String("hello\nworld".into())
    );
    assert_eq!(
      read_one("\"say \\\"hi\\\"\""),
      Datum::String("say \"hi\"".into())
    );
    assert_eq!(read_one("\"(\""), Datum::String("(".into()));
  }

  #[test]
  fn test_read_symbols() {
    assert_eq!(read_one("+"), sym("+"));
    assert_eq!(read_one("-"), sym("-"));
    assert_eq!(read_one("equal?"), sym("equal?"));
    assert_eq!(read_one("read-num"), sym("read-num"));
    assert_eq!(read_one("=>"), sym("=>"));
    assert_eq!(read_one("<="), sym("<="));
  }

  #[test]
  fn test_read_lists_with_any_bracket() {
    let expected = Datum::List(vec![sym("+"), Datum::Number(1.0), Datum::Number(2.0)]);
    assert_eq!(read_one("(+ 1 2)"), expected);
    assert_eq!(read_one("[+ 1 2]"), expected);
    assert_eq!(read_one("{+ 1, 2}"), expected);
    assert_eq!(read_one("()"), Datum::List(vec![]));
  }

  #[test]
  fn test_read_skips_comments() {
    let (datum, rest) = read("; leading comment\n(f ; inline )\n x) tail")
      .expect("Failed to read")
      .expect("Expected a datum");
    assert_eq!(datum, Datum::List(vec![sym("f"), sym("x")]));
    assert_eq!(rest, " tail");
    assert_eq!(read("   ; only a comment").expect("Failed to read"), None);
  }

  #[test]
  fn test_read_balance_errors() {
    assert_eq!(read("(+ 1 2").unwrap_err(), ParseError::Incomplete);
    assert_eq!(read("\"open").unwrap_err(), ParseError::Incomplete);
    assert_eq!(read(")").unwrap_err(), ParseError::UnmatchedClosing);
    assert_eq!(
      read("(+ 1 2]").unwrap_err(),
      ParseError::Syntax("expected `)` but found `]`".to_string())
    );
  }

  #[test]
  fn test_read_all() {
    let data = read_all("1 \"two\" (three)").expect("Failed to read all");
    assert_eq!(
      data,
      vec![
        Datum::Number(1.0),
        Datum::String("two".into()),
        Datum::List(vec![sym("three")]),
      ]
    );
  }

  #[test]
  fn test_valid_identifiers() {
    for name in ["if", "bind", "=>", "="] {
      assert!(!is_valid_identifier(name), "{} should be reserved", name);
    }
    assert!(is_valid_identifier("validId"));
    assert!(is_valid_identifier("equal?"));
  }

  #[test]
  fn test_parse_leaves() {
    assert_eq!(parse_one("12").unwrap(), Expr::Number(12.0));
    assert_eq!(parse_one("\"hi\"").unwrap(), Expr::from("hi"));
    assert_eq!(parse_one("x").unwrap(), Expr::id("x"));
    assert_eq!(
      parse_one("bind").unwrap_err(),
      ParseError::InvalidIdentifier("bind".into())
    );
  }

  #[test]
  fn test_parse_if() {
    assert_eq!(
      parse_one("(if true 1 2)").unwrap(),
      Expr::if_(Expr::id("true"), Expr::Number(1.0), Expr::Number(2.0))
    );
    assert_eq!(
      parse_one("(if true 1)").unwrap_err(),
      ParseError::MalformedIf(2)
    );
    assert_eq!(
      parse_one("(if a b c d)").unwrap_err(),
      ParseError::MalformedIf(4)
    );
  }

  #[test]
  fn test_parse_empty_list() {
    assert_eq!(parse_one("()").unwrap_err(), ParseError::EmptyList);
    assert_eq!(parse_one("(f ())").unwrap_err(), ParseError::EmptyList);
  }

  #[test]
  fn test_parse_application() {
    assert_eq!(
      parse_one("(+ 1 (* 2 3))").unwrap(),
      Expr::call(
        "+",
        vec![
          Expr::Number(1.0),
          Expr::call("*", vec![Expr::Number(2.0), Expr::Number(3.0)]),
        ]
      )
    );
    assert_eq!(parse_one("(read-num)").unwrap(), Expr::call("read-num", vec![]));
    assert_eq!(
      parse_one("(= 1 2)").unwrap_err(),
      ParseError::InvalidIdentifier("=".into())
    );
  }

  #[test]
  fn test_parse_lambda() {
    assert_eq!(
      parse_one("{(x y) => (+ x y)}").unwrap(),
      Expr::lambda(["x", "y"], Expr::call("+", vec![Expr::id("x"), Expr::id("y")]))
    );
    assert_eq!(
      parse_one("(() => 1)").unwrap(),
      Expr::lambda(Vec::<Symbol>::new(), Expr::Number(1.0))
    );
    assert_eq!(
      parse_one("((x x) => x)").unwrap_err(),
      ParseError::DuplicateParameter("x".into())
    );
    assert_eq!(
      parse_one("((if) => 1)").unwrap_err(),
      ParseError::InvalidIdentifier("if".into())
    );
    assert!(matches!(
      parse_one("(x => x)"),
      Err(ParseError::MalformedLambda(_))
    ));
    assert!(matches!(
      parse_one("((1) => 1)"),
      Err(ParseError::MalformedLambda(_))
    ));
  }

  #[test]
  fn test_parse_arrow_outside_lambda_is_rejected() {
    assert_eq!(
      parse_one("(f => x y)").unwrap_err(),
      ParseError::InvalidIdentifier("=>".into())
    );
  }

  #[test]
  fn test_parse_program() {
    let program = parse_program("(println \"a\")\n; comment\n(+ 1 2)").expect("Failed to parse");
    assert_eq!(program.len(), 2);
    assert!(parse_program("(println \"a\") (if)").is_err());
  }

  #[test]
  fn test_display_matches_source() {
    let source = "((self n) => (if (<= n 0) 1 (* n (self self (- n 1)))))";
    assert_eq!(parse_one(source).unwrap().to_string(), source);
  }
}
