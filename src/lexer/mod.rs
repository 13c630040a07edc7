//! The Grin lexer: turns one line of source text into a sequence of tokens.

mod token;

pub use token::*;

use std::{
    error::Error,
    fmt::{self, Display},
    iter::Peekable,
    str::Chars,
};

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::location::Location;

/// Raised when a line cannot be lexed. Carries the fully formatted message
/// (matching the `Error during lexing: Line L Column C: <message>` surface
/// from the language's external interface) so that callers can simply
/// print the error as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    message: String,
    location: Location,
}

impl LexError {
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

impl Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error during lexing: {}: {}", self.location, self.message)
    }
}

impl Error for LexError {}

static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("ADD", TokenKind::Add);
    m.insert("DIV", TokenKind::Div);
    m.insert("END", TokenKind::End);
    m.insert("GOSUB", TokenKind::Gosub);
    m.insert("GOTO", TokenKind::Goto);
    m.insert("IF", TokenKind::If);
    m.insert("INNUM", TokenKind::Innum);
    m.insert("INSTR", TokenKind::Instr);
    m.insert("LET", TokenKind::Let);
    m.insert("MULT", TokenKind::Mult);
    m.insert("PRINT", TokenKind::Print);
    m.insert("RETURN", TokenKind::Return);
    m.insert("SUB", TokenKind::Sub);
    m
});

/// Lexes a single line of Grin source, eagerly collecting every token on it.
///
/// Fails with a [`LexError`] anchored at the offending column as soon as the
/// first malformed lexeme is found.
pub fn tokenize(line: &str, line_number: usize) -> Result<Vec<Token>, LexError> {
    Lexer::new(line, line_number).collect()
}

/// A lazy, single-pass scanner over one line of Grin source. Implements
/// [`Iterator`] so tokens are produced left to right on demand; `tokenize`
/// simply drains it into a `Vec`.
pub struct Lexer<'a> {
    iterator: Peekable<Chars<'a>>,
    line_number: usize,
    col: usize,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(line: &'a str, line_number: usize) -> Self {
        Self {
            iterator: line.chars().peekable(),
            line_number,
            col: 1,
            done: false,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.iterator.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let next = self.iterator.next();
        if next.is_some() {
            self.col += 1;
        }
        next
    }

    fn next_if(&mut self, func: impl FnOnce(&char) -> bool) -> Option<char> {
        let next = self.iterator.next_if(func);
        if next.is_some() {
            self.col += 1;
        }
        next
    }

    fn eat_whitespace(&mut self) {
        while self.next_if(|c| c.is_whitespace()).is_some() {}
    }

    fn error(&self, message: impl Into<String>, column: usize) -> LexError {
        LexError::new(message, Location::new(self.line_number, column))
    }

    fn lex_alphabetic(&mut self) -> Result<Token, LexError> {
        let position = self.col;
        let mut lexeme = String::new();

        lexeme.push(self.advance().expect("caller checked a letter is present"));
        while let Some(c) = self.next_if(|c| c.is_ascii_alphanumeric()) {
            lexeme.push(c);
        }

        let location = Location::new(self.line_number, position);
        let kind = KEYWORDS.get(lexeme.as_str()).copied().unwrap_or(TokenKind::Identifier);
        let token = Token::new(kind, lexeme.clone(), location)
            .with_value(TokenValue::Text(lexeme));

        Ok(token)
    }

    fn lex_string(&mut self) -> Result<Token, LexError> {
        let position = self.col;
        self.advance(); // opening quote

        let mut contents = String::new();
        loop {
            match self.peek() {
                Some('"') => {
                    self.advance();
                    break;
                }
                Some(_) => contents.push(self.advance().expect("peeked")),
                None => return Err(self.error("Newline in string literal", self.col)),
            }
        }

        let location = Location::new(self.line_number, position);
        let text = format!("\"{contents}\"");
        Ok(Token::new(TokenKind::LiteralString, text, location).with_value(TokenValue::Text(contents)))
    }

    fn lex_number(&mut self) -> Result<Token, LexError> {
        let position = self.col;
        let mut lexeme = String::new();

        let negated = self.peek() == Some('-');
        if negated {
            lexeme.push(self.advance().expect("peeked"));
        }

        let mut digits = 0usize;
        while let Some(c) = self.next_if(|c| c.is_ascii_digit()) {
            lexeme.push(c);
            digits += 1;
        }

        if negated && digits == 0 {
            return Err(self.error(
                "Negation must be followed by at least one digit",
                position + 1,
            ));
        }

        let location = Location::new(self.line_number, position);

        if self.peek() == Some('.') {
            lexeme.push(self.advance().expect("peeked"));
            while let Some(c) = self.next_if(|c| c.is_ascii_digit()) {
                lexeme.push(c);
            }

            let value: f64 = lexeme
                .parse()
                .expect("lexeme is a well-formed float by construction");
            return Ok(
                Token::new(TokenKind::LiteralFloat, lexeme, location).with_value(TokenValue::Float(value))
            );
        }

        let value: i64 = lexeme
            .parse()
            .map_err(|_| self.error("Integer literal out of range", position))?;
        Ok(Token::new(TokenKind::LiteralInteger, lexeme, location).with_value(TokenValue::Integer(value)))
    }

    fn lex_angle(&mut self, open: char) -> Result<Token, LexError> {
        let position = self.col;
        self.advance();

        let kind = if open == '<' {
            match self.peek() {
                Some('>') => {
                    self.advance();
                    TokenKind::NotEqual
                }
                Some('=') => {
                    self.advance();
                    TokenKind::LessThanOrEqual
                }
                _ => TokenKind::LessThan,
            }
        } else {
            match self.peek() {
                Some('=') => {
                    self.advance();
                    TokenKind::GreaterThanOrEqual
                }
                _ => TokenKind::GreaterThan,
            }
        };

        let location = Location::new(self.line_number, position);
        let text = match kind {
            TokenKind::NotEqual => "<>",
            TokenKind::LessThanOrEqual => "<=",
            TokenKind::LessThan => "<",
            TokenKind::GreaterThanOrEqual => ">=",
            TokenKind::GreaterThan => ">",
            _ => unreachable!("lex_angle only produces comparison kinds"),
        };
        Ok(Token::new(kind, text, location))
    }

    fn lex_single(&mut self, kind: TokenKind, text: &'static str) -> Result<Token, LexError> {
        let position = self.col;
        self.advance();
        Ok(Token::new(kind, text, Location::new(self.line_number, position)))
    }

    fn lex_one(&mut self) -> Option<Result<Token, LexError>> {
        self.eat_whitespace();

        let next = self.peek()?;

        Some(match next {
            c if c.is_ascii_alphabetic() => self.lex_alphabetic(),
            '"' => self.lex_string(),
            '-' | '0'..='9' => self.lex_number(),
            ':' => self.lex_single(TokenKind::Colon, ":"),
            '.' => self.lex_single(TokenKind::Dot, "."),
            '=' => self.lex_single(TokenKind::Equal, "="),
            '<' => self.lex_angle('<'),
            '>' => self.lex_angle('>'),
            _ => {
                let column = self.col;
                self.advance();
                Err(self.error("Invalid character", column))
            }
        })
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.lex_one() {
            Some(Ok(token)) => Some(Ok(token)),
            Some(Err(e)) => {
                self.done = true;
                Some(Err(e))
            }
            None => None,
        }
    }
}
