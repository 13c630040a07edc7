//! The Grin parser: validates the grammar for one line at a time and
//! streams per-line token lists until the `.` sentinel is reached.

use std::{
    error::Error,
    fmt::{self, Display},
};

use crate::{
    lexer::{tokenize, Token, TokenKind},
    location::Location,
};

/// Raised when a line's tokens do not match the Grin grammar. Like
/// [`crate::lexer::LexError`], the message is already fully formatted for
/// display.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    message: String,
    location: Location,
}

impl ParseError {
    fn new(message: impl Into<String>, location: Location) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error during parsing: {}: {}", self.location, self.message)
    }
}

impl Error for ParseError {}

/// A cursor over a single line's tokens, generalized from the lexer's own
/// `Tokens<T>` iteration helper: peek, advance, and snapshot/restore an
/// index.
struct TokenCursor {
    tokens: Vec<Token>,
    index: usize,
}

impl TokenCursor {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, index: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.index);
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    fn is_at(&self, kinds: &[TokenKind]) -> bool {
        self.peek().map(|t| kinds.contains(&t.kind())).unwrap_or(false)
    }
}

const VALUE_KINDS: [TokenKind; 4] = [
    TokenKind::LiteralInteger,
    TokenKind::LiteralFloat,
    TokenKind::LiteralString,
    TokenKind::Identifier,
];

const JUMP_TARGET_KINDS: [TokenKind; 3] = [
    TokenKind::LiteralInteger,
    TokenKind::LiteralString,
    TokenKind::Identifier,
];

const COMPARISON_KINDS: [TokenKind; 6] = [
    TokenKind::Equal,
    TokenKind::NotEqual,
    TokenKind::LessThan,
    TokenKind::LessThanOrEqual,
    TokenKind::GreaterThan,
    TokenKind::GreaterThanOrEqual,
];

/// Parses a single already-tokenized line, enforcing the per-statement
/// grammar from the language specification. Returns the (unchanged) token
/// list on success.
fn parse_line(line: &str, line_number: usize, tokens: Vec<Token>) -> Result<Vec<Token>, ParseError> {
    let end_of_line = Location::new(line_number, line.len() + 1);

    if tokens.is_empty() {
        return Err(ParseError::new("Program lines cannot be empty", end_of_line));
    }

    if tokens.len() == 1 && tokens[0].kind() == TokenKind::Dot {
        return Ok(tokens);
    }

    let mut cursor = TokenCursor::new(tokens);

    let expect = |cursor: &TokenCursor, kinds: &[TokenKind], what: &str| -> Result<(), ParseError> {
        if cursor.is_at(kinds) {
            return Ok(());
        }
        match cursor.peek() {
            Some(token) => Err(ParseError::new(format!("{what} expected"), token.location())),
            None => Err(ParseError::new(format!("{what} expected"), end_of_line)),
        }
    };

    // Label? := IDENTIFIER COLON
    if cursor.is_at(&[TokenKind::Identifier]) {
        cursor.advance();
        expect(&cursor, &[TokenKind::Colon], "':'")?;
        cursor.advance();
    }

    if cursor.peek().is_none() {
        return Err(ParseError::new("Statement body expected", end_of_line));
    }

    let keyword = cursor.advance().expect("checked above").kind();

    match keyword {
        TokenKind::Let | TokenKind::Add | TokenKind::Sub | TokenKind::Mult | TokenKind::Div => {
            expect(&cursor, &VALUE_KINDS, "Identifier")?;
            cursor.advance();
            expect(&cursor, &VALUE_KINDS, "Value")?;
            cursor.advance();
        }
        TokenKind::Print => {
            expect(&cursor, &VALUE_KINDS, "Value")?;
            cursor.advance();
        }
        TokenKind::Innum | TokenKind::Instr => {
            expect(&cursor, &[TokenKind::Identifier], "Identifier")?;
            cursor.advance();
        }
        TokenKind::Goto | TokenKind::Gosub => {
            expect(&cursor, &JUMP_TARGET_KINDS, "Jump target")?;
            cursor.advance();

            if cursor.is_at(&[TokenKind::If]) {
                cursor.advance();
                expect(&cursor, &VALUE_KINDS, "Value")?;
                cursor.advance();
                expect(&cursor, &COMPARISON_KINDS, "Comparison operator")?;
                cursor.advance();
                expect(&cursor, &VALUE_KINDS, "Value")?;
                cursor.advance();
            }
        }
        TokenKind::Return | TokenKind::End => {}
        _ => {
            let token = &cursor.tokens[cursor.index - 1];
            return Err(ParseError::new("Statement keyword expected", token.location()));
        }
    }

    if let Some(token) = cursor.peek() {
        return Err(ParseError::new(
            "Extra tokens after statement end",
            token.location(),
        ));
    }

    Ok(cursor.tokens)
}

/// Either a lexical or a grammatical failure while parsing a program.
#[derive(Debug, Clone, PartialEq)]
pub enum FrontEndError {
    Lex(crate::lexer::LexError),
    Parse(ParseError),
}

impl Display for FrontEndError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrontEndError::Lex(e) => write!(f, "{e}"),
            FrontEndError::Parse(e) => write!(f, "{e}"),
        }
    }
}

impl Error for FrontEndError {}

impl From<crate::lexer::LexError> for FrontEndError {
    fn from(e: crate::lexer::LexError) -> Self {
        FrontEndError::Lex(e)
    }
}

impl From<ParseError> for FrontEndError {
    fn from(e: ParseError) -> Self {
        FrontEndError::Parse(e)
    }
}

/// Streams per-line token lists over an ordered sequence of source lines,
/// stopping (and returning `None`) as soon as the `.` sentinel line is
/// consumed, or as soon as a lexical/parse error is found.
pub struct Parser<I> {
    lines: I,
    line_number: usize,
    stopped: bool,
}

impl<I> Parser<I>
where
    I: Iterator<Item = String>,
{
    pub fn new(lines: I) -> Self {
        Self {
            lines,
            line_number: 0,
            stopped: false,
        }
    }
}

impl<I> Iterator for Parser<I>
where
    I: Iterator<Item = String>,
{
    type Item = Result<Vec<Token>, FrontEndError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stopped {
            return None;
        }

        let line = self.lines.next()?;
        self.line_number += 1;

        let tokens = match tokenize(&line, self.line_number) {
            Ok(tokens) => tokens,
            Err(e) => {
                self.stopped = true;
                return Some(Err(FrontEndError::from(e)));
            }
        };

        if tokens.len() == 1 && tokens[0].kind() == TokenKind::Dot {
            self.stopped = true;
            return None;
        }

        match parse_line(&line, self.line_number, tokens) {
            Ok(tokens) => Some(Ok(tokens)),
            Err(e) => {
                self.stopped = true;
                Some(Err(FrontEndError::from(e)))
            }
        }
    }
}

/// Parses a whole program: tokenizes and validates each line in order,
/// stopping at the `.` sentinel line (which is not included in the
/// result). Materializes the result eagerly, since the interpreter's load
/// phase needs the whole program as a 1-indexed array regardless.
pub fn parse_program<I, S>(lines: I) -> Result<Vec<Vec<Token>>, FrontEndError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut result = Vec::new();

    for (line_number, line) in lines.into_iter().enumerate() {
        let line_number = line_number + 1;
        let line = line.as_ref();

        let tokens = tokenize(line, line_number)?;

        if tokens.len() == 1 && tokens[0].kind() == TokenKind::Dot {
            return Ok(result);
        }

        let tokens = parse_line(line, line_number, tokens)?;
        result.push(tokens);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(line: &str) -> Result<Vec<Token>, FrontEndError> {
        parse_program([line]).map(|mut lines| lines.pop().expect("non-sentinel line parses to one entry"))
    }

    #[test]
    fn valid_lines_round_trip_their_own_tokens() {
        for line in ["LET AGE 13", "PRINT \"Boo\"", "RETURN", "GOTO 3 IF X < 5"] {
            let expected = tokenize(line, 1).unwrap();
            let parsed = parse_one(line).unwrap();
            assert_eq!(parsed, expected);
        }
    }

    #[test]
    fn empty_line_fails_at_end_of_line() {
        for empty in ["", "    "] {
            let err = parse_one(empty).unwrap_err();
            match err {
                FrontEndError::Parse(e) => {
                    assert_eq!(e.location(), Location::new(1, empty.len() + 1))
                }
                _ => panic!("expected a parse error"),
            }
        }
    }

    #[test]
    fn statement_not_starting_with_keyword_fails_at_column_one() {
        for invalid in ["4 < 5", "\"Boo\""] {
            let err = parse_one(invalid).unwrap_err();
            match err {
                FrontEndError::Parse(e) => assert_eq!(e.location(), Location::new(1, 1)),
                _ => panic!("expected a parse error"),
            }
        }
    }

    #[test]
    fn variable_update_with_extra_tokens_fails_at_extra_token() {
        let err = parse_one("LET X 3 \"Boo\"").unwrap_err();
        match err {
            FrontEndError::Parse(e) => assert_eq!(e.location(), Location::new(1, 9)),
            _ => panic!("expected a parse error"),
        }
    }

    #[test]
    fn label_without_statement_fails_at_end_of_line() {
        let invalid = "LABEL:";
        let err = parse_one(invalid).unwrap_err();
        match err {
            FrontEndError::Parse(e) => {
                assert_eq!(e.location(), Location::new(1, invalid.len() + 1))
            }
            _ => panic!("expected a parse error"),
        }
    }

    #[test]
    fn jump_with_condition_parses() {
        for operator in ["=", "<>", "<", "<=", ">", ">="] {
            let line = format!("GOTO 3 IF X {operator} 5");
            parse_one(&line).unwrap();
        }
    }

    #[test]
    fn parsing_stops_at_dot_sentinel() {
        let lines = parse_program(["RETURN", ".", "RETURN"]).unwrap();
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn label_prefixed_statement_parses() {
        for statement in ["LET AGE 13", "RETURN", "PRINT \"Boo\""] {
            let line = format!("START: {statement}");
            parse_one(&line).unwrap();
        }
    }
}
