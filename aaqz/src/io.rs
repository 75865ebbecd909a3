use std::io::{self, BufRead, Write};

/// Where the I/O primitives read from and write to.
///
/// The evaluator never touches the process streams itself, so programs can be
/// driven from a terminal, a test script, or anything else that can hand out
/// lines of text.
pub trait IoAdapter {
  /// Read one line of input without its line terminator.
  fn read_line(&mut self) -> io::Result<String>;

  /// Write text as-is.
  fn print(&mut self, text: &str) -> io::Result<()>;

  /// Write text followed by a newline.
  fn println(&mut self, text: &str) -> io::Result<()> {
    self.print(text)?;
    self.print("\n")
  }
}

fn strip_line_ending(mut line: String) -> String {
  if line.ends_with('\n') {
    line.pop();
    if line.ends_with('\r') {
      line.pop();
    }
  }
  line
}

fn end_of_input() -> io::Error {
  io::Error::new(io::ErrorKind::UnexpectedEof, "No more input available")
}

pub struct StdioAdapter {
  stdin: io::Stdin,
  stdout: io::Stdout,
}

impl StdioAdapter {
  pub fn new() -> Self {
    Self {
      stdin: io::stdin(),
      stdout: io::stdout(),
    }
  }
}

impl Default for StdioAdapter {
  fn default() -> Self {
    Self::new()
  }
}

impl IoAdapter for StdioAdapter {
  fn read_line(&mut self) -> io::Result<String> {
    let mut buffer = String::new();
    let mut handle = self.stdin.lock();
    if handle.read_line(&mut buffer)? == 0 {
      return Err(end_of_input());
    }
    Ok(strip_line_ending(buffer))
  }

  fn print(&mut self, text: &str) -> io::Result<()> {
    write!(self.stdout, "{}", text)?;
    self.stdout.flush()
  }
}

/// Scripted input; every `print` call is recorded as its own entry.
pub struct MockIoAdapter {
  input: Vec<String>,
  input_position: usize,
  output: Vec<String>,
}

impl MockIoAdapter {
  pub fn new(input: Vec<String>) -> Self {
    Self {
      input,
      input_position: 0,
      output: Vec::new(),
    }
  }

  pub fn output(&self) -> &[String] {
    &self.output
  }
}

impl IoAdapter for MockIoAdapter {
  fn read_line(&mut self) -> io::Result<String> {
    let line = self
      .input
      .get(self.input_position)
      .cloned()
      .ok_or_else(end_of_input)?;
    self.input_position += 1;
    Ok(line)
  }

  fn print(&mut self, text: &str) -> io::Result<()> {
    self.output.push(text.to_string());
    Ok(())
  }
}

/// Scripted input; output accumulates into a single string.
pub struct StringIoAdapter {
  input: Vec<String>,
  input_position: usize,
  output: String,
}

impl StringIoAdapter {
  pub fn new(input: Vec<String>) -> Self {
    Self {
      input,
      input_position: 0,
      output: String::new(),
    }
  }

  /// Splits `input` into lines, one per read.
  pub fn with_input(input: &str) -> Self {
    Self::new(input.lines().map(str::to_string).collect())
  }

  pub fn output_only() -> Self {
    Self::new(Vec::new())
  }

  pub fn output(&self) -> &str {
    &self.output
  }

  pub fn take_output(&mut self) -> String {
    std::mem::take(&mut self.output)
  }
}

impl IoAdapter for StringIoAdapter {
  fn read_line(&mut self) -> io::Result<String> {
    let line = self
      .input
      .get(self.input_position)
      .cloned()
      .ok_or_else(end_of_input)?;
    self.input_position += 1;
    Ok(line)
  }

  fn print(&mut self, text: &str) -> io::Result<()> {
    self.output.push_str(text);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_string_io_adapter_basic() {
    let mut adapter = StringIoAdapter::new(vec!["test".to_string()]);
    adapter.print("Hello").expect("Failed to print Hello");
    adapter.println("World").expect("Failed to print World");

    assert_eq!(adapter.output(), "HelloWorld\n");
    assert_eq!(adapter.read_line().expect("Failed to read line"), "test");
  }

  #[test]
  fn test_string_io_adapter_take_output() {
    let mut adapter = StringIoAdapter::output_only();
    adapter
      .println("First")
      .expect("Failed to print first line");
    let output = adapter.take_output();
    assert_eq!(output, "First\n");
    assert_eq!(adapter.output(), "");

    adapter
      .println("Second")
      .expect("Failed to print second line");
    assert_eq!(adapter.output(), "Second\n");
  }

  #[test]
  fn test_string_io_adapter_with_input() {
    let mut adapter = StringIoAdapter::with_input("42\nforty-two\n");
    assert_eq!(adapter.read_line().expect("Failed to read first line"), "42");
    assert_eq!(
      adapter.read_line().expect("Failed to read second line"),
      "forty-two"
    );

    let result = adapter.read_line();
    assert!(result.is_err());
    assert_eq!(result.unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
  }

  #[test]
  fn test_mock_io_adapter_records_each_print() {
    let mut adapter = MockIoAdapter::new(vec!["a".to_string()]);
    adapter.println("line").expect("Failed to print line");
    assert_eq!(adapter.output(), &["line".to_string(), "\n".to_string()]);
    assert_eq!(adapter.read_line().expect("Failed to read line"), "a");
    assert!(adapter.read_line().is_err());
  }

  #[test]
  fn test_strip_line_ending() {
    assert_eq!(strip_line_ending("abc\r\n".to_string()), "abc");
    assert_eq!(strip_line_ending("abc\n".to_string()), "abc");
    assert_eq!(strip_line_ending("abc".to_string()), "abc");
  }
}
