//! The Grin interpreter: loads a parsed program into a line-indexed array
//! plus a label table, then executes it against injected I/O.

mod error;
mod io;
mod value;

pub use error::RuntimeError;
pub use io::{BufferInput, BufferOutput, GrinInput, GrinOutput, StdinInput, StdoutOutput};
pub use value::{format_float, Value};

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::lexer::{Token, TokenKind};
use crate::parser::FrontEndError;

type VariableStore = HashMap<String, Value>;

/// A loaded Grin program: a 1-indexed array of per-line token lists plus the
/// label table built from it.
pub struct Program {
    lines: Vec<Vec<Token>>,
    labels: HashMap<String, usize>,
}

impl Program {
    /// Builds a program from the parser's per-line token lists, gathering
    /// labels in a first pass (design note: two-pass load lets duplicate
    /// detection happen once, up front, instead of on every jump).
    pub fn load(lines: Vec<Vec<Token>>) -> Result<Self, RuntimeError> {
        let mut labels = HashMap::new();

        for (index, tokens) in lines.iter().enumerate() {
            let line_number = index + 1;

            if let Some(label) = label_of(tokens) {
                if labels.insert(label.to_string(), line_number).is_some() {
                    return Err(RuntimeError::new(
                        format!("Duplicate label '{label}'"),
                        line_number,
                    ));
                }
            }
        }

        Ok(Self { lines, labels })
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn labels(&self) -> &HashMap<String, usize> {
        &self.labels
    }

    fn line(&self, line_number: usize) -> &[Token] {
        &self.lines[line_number - 1]
    }
}

fn label_of(tokens: &[Token]) -> Option<&str> {
    if tokens.len() >= 2
        && tokens[0].kind() == TokenKind::Identifier
        && tokens[1].kind() == TokenKind::Colon
    {
        tokens[0].value().and_then(|v| v.as_text())
    } else {
        None
    }
}

/// Drops a statement's leading `IDENTIFIER COLON` label prefix, if present.
fn statement_body(tokens: &[Token]) -> &[Token] {
    if tokens.len() >= 2
        && tokens[0].kind() == TokenKind::Identifier
        && tokens[1].kind() == TokenKind::Colon
    {
        &tokens[2..]
    } else {
        tokens
    }
}

enum JumpTarget {
    Offset(i64),
    Label(String),
}

fn op_name(op: TokenKind) -> &'static str {
    match op {
        TokenKind::Add => "ADD",
        TokenKind::Sub => "SUB",
        TokenKind::Mult => "MULT",
        TokenKind::Div => "DIV",
        _ => unreachable!("op_name is only called for arithmetic keywords"),
    }
}

fn apply_arithmetic(op: TokenKind, a: Value, b: Value, line: usize) -> Result<Value, RuntimeError> {
    let type_error = || RuntimeError::new(format!("Type mismatch in {}", op_name(op)), line);

    match (a, b) {
        (Value::String(x), Value::String(y)) => {
            if op == TokenKind::Add {
                Ok(Value::String(x + &y))
            } else {
                Err(type_error())
            }
        }
        (Value::String(_), _) | (_, Value::String(_)) => Err(type_error()),
        (Value::Integer(x), Value::Integer(y)) => match op {
            TokenKind::Add => Ok(Value::Integer(x + y)),
            TokenKind::Sub => Ok(Value::Integer(x - y)),
            TokenKind::Mult => Ok(Value::Integer(x * y)),
            TokenKind::Div => {
                if y == 0 {
                    return Err(RuntimeError::new("Division by zero", line));
                }
                if x % y == 0 {
                    Ok(Value::Integer(x / y))
                } else {
                    Ok(Value::Float(x as f64 / y as f64))
                }
            }
            _ => unreachable!("apply_arithmetic is only called for ADD/SUB/MULT/DIV"),
        },
        (a, b) => {
            let x = a.as_f64().expect("non-string values are numeric");
            let y = b.as_f64().expect("non-string values are numeric");

            match op {
                TokenKind::Add => Ok(Value::Float(x + y)),
                TokenKind::Sub => Ok(Value::Float(x - y)),
                TokenKind::Mult => Ok(Value::Float(x * y)),
                TokenKind::Div => {
                    if y == 0.0 {
                        return Err(RuntimeError::new("Division by zero", line));
                    }
                    Ok(Value::Float(x / y))
                }
                _ => unreachable!("apply_arithmetic is only called for ADD/SUB/MULT/DIV"),
            }
        }
    }
}

fn compare(op: TokenKind, a: &Value, b: &Value, line: usize) -> Result<bool, RuntimeError> {
    let ordering = a
        .partial_compare(b)
        .ok_or_else(|| RuntimeError::new("Type mismatch in comparison", line))?;

    Ok(match op {
        TokenKind::Equal => ordering == Ordering::Equal,
        TokenKind::NotEqual => ordering != Ordering::Equal,
        TokenKind::LessThan => ordering == Ordering::Less,
        TokenKind::LessThanOrEqual => ordering != Ordering::Greater,
        TokenKind::GreaterThan => ordering == Ordering::Greater,
        TokenKind::GreaterThanOrEqual => ordering != Ordering::Less,
        _ => unreachable!("compare is only called with comparison-operator kinds"),
    })
}

fn parse_innum_input(raw: &str, line: usize) -> Result<Value, RuntimeError> {
    let trimmed = raw.trim();

    if trimmed.contains('.') {
        trimmed
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| RuntimeError::new("Invalid numeric input", line))
    } else {
        trimmed
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| RuntimeError::new("Invalid numeric input", line))
    }
}

/// Executes one loaded [`Program`] against injected input/output, owning the
/// variable store, call stack, and program counter for the run's lifetime.
pub struct Interpreter<I, O> {
    program: Program,
    variables: VariableStore,
    call_stack: Vec<usize>,
    pc: usize,
    input: I,
    output: O,
}

impl<I: GrinInput, O: GrinOutput> Interpreter<I, O> {
    pub fn new(program: Program, input: I, output: O) -> Self {
        Self {
            program,
            variables: HashMap::new(),
            call_stack: Vec::new(),
            pc: 1,
            input,
            output,
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn into_output(self) -> O {
        self.output
    }

    /// Reads a variable's current value, with the unbound-reads-as-zero
    /// rule from the data model.
    fn variable(&self, name: &str) -> Value {
        self.variables.get(name).cloned().unwrap_or(Value::Integer(0))
    }

    fn eval_value(&self, token: &Token) -> Result<Value, RuntimeError> {
        match token.kind() {
            TokenKind::LiteralInteger => Ok(Value::Integer(
                token
                    .value()
                    .and_then(|v| v.as_integer())
                    .expect("literal integers carry an integer value"),
            )),
            TokenKind::LiteralFloat => match token.value() {
                Some(crate::lexer::TokenValue::Float(f)) => Ok(Value::Float(*f)),
                _ => unreachable!("literal floats carry a float value"),
            },
            TokenKind::LiteralString => Ok(Value::String(
                token
                    .value()
                    .and_then(|v| v.as_text())
                    .expect("literal strings carry a text value")
                    .to_string(),
            )),
            TokenKind::Identifier => {
                let name = token
                    .value()
                    .and_then(|v| v.as_text())
                    .expect("identifiers carry a text value");
                Ok(self.variable(name))
            }
            _ => unreachable!("eval_value is only called on Value-grammar tokens"),
        }
    }

    fn resolve_jump_target(&self, token: &Token, line: usize) -> Result<JumpTarget, RuntimeError> {
        match token.kind() {
            TokenKind::LiteralInteger => Ok(JumpTarget::Offset(
                token
                    .value()
                    .and_then(|v| v.as_integer())
                    .expect("literal integers carry an integer value"),
            )),
            TokenKind::LiteralString => Ok(JumpTarget::Label(
                token
                    .value()
                    .and_then(|v| v.as_text())
                    .expect("literal strings carry a text value")
                    .to_string(),
            )),
            TokenKind::Identifier => {
                let name = token
                    .value()
                    .and_then(|v| v.as_text())
                    .expect("identifiers carry a text value");
                match self.variable(name) {
                    Value::Integer(k) => Ok(JumpTarget::Offset(k)),
                    Value::String(s) => Ok(JumpTarget::Label(s)),
                    Value::Float(_) => Err(RuntimeError::new(
                        "Type mismatch in jump target",
                        line,
                    )),
                }
            }
            _ => unreachable!("resolve_jump_target is only called on JumpTarget-grammar tokens"),
        }
    }

    fn resolve_line_number(
        &self,
        target: JumpTarget,
        from_line: usize,
        line: usize,
    ) -> Result<usize, RuntimeError> {
        match target {
            JumpTarget::Offset(0) => Err(RuntimeError::new("Relative jump cannot be zero", line)),
            JumpTarget::Offset(offset) => {
                let candidate = from_line as i64 + offset;
                if candidate < 1 || candidate > self.program.len() as i64 {
                    Err(RuntimeError::new("Jump out of range", line))
                } else {
                    Ok(candidate as usize)
                }
            }
            JumpTarget::Label(name) => self
                .program
                .labels
                .get(&name)
                .copied()
                .ok_or_else(|| RuntimeError::new(format!("Unknown label '{name}'"), line)),
        }
    }

    /// Runs the loaded program to completion: either it runs off the end of
    /// the program, or an `END` statement executes, or a [`RuntimeError`] is
    /// raised.
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        let line_count = self.program.len();

        loop {
            if self.pc > line_count {
                return Ok(());
            }

            let line = self.pc;
            let tokens = self.program.line(line).to_vec();
            let body = statement_body(&tokens);
            let keyword = body[0].kind();

            match keyword {
                TokenKind::Let | TokenKind::Add | TokenKind::Sub | TokenKind::Mult | TokenKind::Div => {
                    let name = body[1]
                        .value()
                        .and_then(|v| v.as_text())
                        .expect("parser guarantees an identifier here")
                        .to_string();
                    let rhs = self.eval_value(&body[2])?;

                    let result = if keyword == TokenKind::Let {
                        rhs
                    } else {
                        let current = self.variable(&name);
                        apply_arithmetic(keyword, current, rhs, line)?
                    };

                    self.variables.insert(name, result);
                    self.pc = line + 1;
                }
                TokenKind::Print => {
                    let value = self.eval_value(&body[1])?;
                    self.output.write_line(&value.to_string());
                    self.pc = line + 1;
                }
                TokenKind::Innum => {
                    let name = body[1]
                        .value()
                        .and_then(|v| v.as_text())
                        .expect("parser guarantees an identifier here")
                        .to_string();
                    let raw = self
                        .input
                        .read_line()
                        .ok_or_else(|| RuntimeError::new("Unexpected end of input", line))?;
                    let value = parse_innum_input(&raw, line)?;
                    self.variables.insert(name, value);
                    self.pc = line + 1;
                }
                TokenKind::Instr => {
                    let name = body[1]
                        .value()
                        .and_then(|v| v.as_text())
                        .expect("parser guarantees an identifier here")
                        .to_string();
                    let raw = self
                        .input
                        .read_line()
                        .ok_or_else(|| RuntimeError::new("Unexpected end of input", line))?;
                    self.variables.insert(name, Value::String(raw));
                    self.pc = line + 1;
                }
                TokenKind::Goto | TokenKind::Gosub => {
                    let target_token = &body[1];

                    let should_jump = if body.len() > 2 && body[2].kind() == TokenKind::If {
                        let lhs = self.eval_value(&body[3])?;
                        let op = body[4].kind();
                        let rhs = self.eval_value(&body[5])?;
                        compare(op, &lhs, &rhs, line)?
                    } else {
                        true
                    };

                    if should_jump {
                        let target = self.resolve_jump_target(target_token, line)?;
                        let new_pc = self.resolve_line_number(target, line, line)?;

                        if keyword == TokenKind::Gosub {
                            self.call_stack.push(line + 1);
                        }

                        self.pc = new_pc;
                    } else {
                        self.pc = line + 1;
                    }
                }
                TokenKind::Return => {
                    let target = self
                        .call_stack
                        .pop()
                        .ok_or_else(|| RuntimeError::new("RETURN without GOSUB", line))?;
                    self.pc = target;
                }
                TokenKind::End => return Ok(()),
                _ => unreachable!("the parser guarantees a statement keyword starts the body"),
            }
        }
    }
}

/// Convenience entry point used by the driver and integration tests: parses
/// a program's source lines, loads it, and runs it to completion.
pub fn run_program<S, I, O>(lines: impl IntoIterator<Item = S>, input: I, output: O) -> Result<(), ProgramError>
where
    S: AsRef<str>,
    I: GrinInput,
    O: GrinOutput,
{
    let parsed = crate::parser::parse_program(lines)?;
    let program = Program::load(parsed)?;
    let mut interpreter = Interpreter::new(program, input, output);
    interpreter.run()?;
    Ok(())
}

/// Any of the three error surfaces a Grin program can raise, end to end.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgramError {
    Lex(crate::lexer::LexError),
    Parse(crate::parser::ParseError),
    Runtime(RuntimeError),
}

impl std::fmt::Display for ProgramError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgramError::Lex(e) => write!(f, "{e}"),
            ProgramError::Parse(e) => write!(f, "{e}"),
            ProgramError::Runtime(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ProgramError {}

impl From<FrontEndError> for ProgramError {
    fn from(e: FrontEndError) -> Self {
        match e {
            FrontEndError::Lex(e) => ProgramError::Lex(e),
            FrontEndError::Parse(e) => ProgramError::Parse(e),
        }
    }
}

impl From<RuntimeError> for ProgramError {
    fn from(e: RuntimeError) -> Self {
        ProgramError::Runtime(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;

    fn run(source: &[&str], stdin: &[&str]) -> Result<Vec<String>, ProgramError> {
        let parsed = parse_program(source)?;
        let program = Program::load(parsed)?;
        let input = BufferInput::new(stdin.iter().map(|s| s.to_string()));
        let output = BufferOutput::new();
        let mut interpreter = Interpreter::new(program, input, output);
        interpreter.run()?;
        Ok(interpreter.into_output().lines)
    }

    #[test]
    fn let_then_print() {
        let lines = run(&["LET X 5", "PRINT X", "."], &[]).unwrap();
        assert_eq!(lines, vec!["5"]);
    }

    #[test]
    fn add_promotes_to_float() {
        let lines = run(&["LET X 5", "ADD X 2.0", "PRINT X", "."], &[]).unwrap();
        assert_eq!(lines, vec!["7.0"]);
    }

    #[test]
    fn innum_reads_integer_or_float() {
        let lines = run(&["INNUM N", "PRINT N", "."], &["42"]).unwrap();
        assert_eq!(lines, vec!["42"]);

        let lines = run(&["INNUM N", "PRINT N", "."], &["3.14"]).unwrap();
        assert_eq!(lines, vec!["3.14"]);
    }

    #[test]
    fn labeled_loop_with_conditional_goto() {
        let lines = run(
            &[
                "START: LET I 0",
                "LOOP: ADD I 1",
                "PRINT I",
                "GOTO \"LOOP\" IF I < 3",
                ".",
            ],
            &[],
        )
        .unwrap();
        assert_eq!(lines, vec!["1", "2", "3"]);
    }

    #[test]
    fn gosub_and_return() {
        let lines = run(
            &["GOSUB \"HELPER\"", "END", "HELPER: PRINT \"hi\"", "RETURN", "."],
            &[],
        )
        .unwrap();
        assert_eq!(lines, vec!["hi"]);
    }

    #[test]
    fn string_plus_integer_is_a_type_error() {
        let err = run(&["LET X \"a\"", "ADD X 1", "."], &[]).unwrap_err();
        match err {
            ProgramError::Runtime(e) => {
                assert_eq!(e.line(), 2);
                assert_eq!(e.to_string(), "Error during execution: Line 2: Type mismatch in ADD");
            }
            _ => panic!("expected a runtime error"),
        }
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let err = run(&["LET X 1", "DIV X 0", "."], &[]).unwrap_err();
        assert!(matches!(err, ProgramError::Runtime(_)));
    }

    #[test]
    fn integer_division_promotes_to_float_when_inexact() {
        let lines = run(&["LET X 7", "DIV X 2", "PRINT X", "."], &[]).unwrap();
        assert_eq!(lines, vec!["3.5"]);
    }

    #[test]
    fn integer_division_stays_integer_when_exact() {
        let lines = run(&["LET X 6", "DIV X 2", "PRINT X", "."], &[]).unwrap();
        assert_eq!(lines, vec!["3"]);
    }

    #[test]
    fn string_concatenation_with_add() {
        let lines = run(&["LET X \"foo\"", "ADD X \"bar\"", "PRINT X", "."], &[]).unwrap();
        assert_eq!(lines, vec!["foobar"]);
    }

    #[test]
    fn return_without_gosub_is_an_error() {
        let err = run(&["RETURN", "."], &[]).unwrap_err();
        match err {
            ProgramError::Runtime(e) => assert_eq!(e.to_string(), "Error during execution: Line 1: RETURN without GOSUB"),
            _ => panic!("expected a runtime error"),
        }
    }

    #[test]
    fn duplicate_labels_are_rejected_at_load() {
        let err = run(&["A: END", "A: END", "."], &[]).unwrap_err();
        assert!(matches!(err, ProgramError::Runtime(_)));
    }

    #[test]
    fn unbound_identifier_reads_as_zero() {
        let lines = run(&["PRINT X", "."], &[]).unwrap();
        assert_eq!(lines, vec!["0"]);
    }

    #[test]
    fn relative_goto_offset() {
        let lines = run(&["GOTO 2", "PRINT \"skipped\"", "PRINT \"landed\"", "."], &[]).unwrap();
        assert_eq!(lines, vec!["landed"]);
    }

    #[test]
    fn jump_out_of_range_is_an_error() {
        let err = run(&["GOTO 100", "."], &[]).unwrap_err();
        assert!(matches!(err, ProgramError::Runtime(_)));
    }
}
