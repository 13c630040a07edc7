//! Integration-level checks of the lexer's column accuracy and the
//! "retokenizing reproduces the source" property, run through the public
//! `grin_lang::lexer` API only.

use grin_lang::lexer::{tokenize, TokenKind};
use grin_lang::location::Location;

#[test]
fn token_text_concatenated_with_gaps_reproduces_the_line() {
    let line = "START:   LET NAME \"Boo\"";
    let tokens = tokenize(line, 1).unwrap();

    let mut rebuilt = String::new();
    let mut cursor = 1usize;
    for token in &tokens {
        let column = token.location().column();
        rebuilt.push_str(&" ".repeat(column - cursor));
        rebuilt.push_str(token.text());
        cursor = column + token.text().chars().count();
    }

    assert_eq!(rebuilt, line);
}

#[test]
fn unterminated_string_reports_end_of_line_plus_one() {
    let line = "\"abc";
    let err = tokenize(line, 7).unwrap_err();
    assert_eq!(err.location(), Location::new(7, 5));
}

#[test]
fn bare_negation_reports_column_two() {
    let err = tokenize("-", 1).unwrap_err();
    assert_eq!(err.location(), Location::new(1, 2));
}

#[test]
fn invalid_character_reports_column_one() {
    let err = tokenize("!", 1).unwrap_err();
    assert_eq!(err.location(), Location::new(1, 1));
}

#[test]
fn every_keyword_has_its_own_kind_not_identifier() {
    let keywords = [
        ("ADD", TokenKind::Add),
        ("DIV", TokenKind::Div),
        ("END", TokenKind::End),
        ("GOSUB", TokenKind::Gosub),
        ("GOTO", TokenKind::Goto),
        ("IF", TokenKind::If),
        ("INNUM", TokenKind::Innum),
        ("INSTR", TokenKind::Instr),
        ("LET", TokenKind::Let),
        ("MULT", TokenKind::Mult),
        ("PRINT", TokenKind::Print),
        ("RETURN", TokenKind::Return),
        ("SUB", TokenKind::Sub),
    ];

    for (text, kind) in keywords {
        let tokens = tokenize(text, 1).unwrap();
        assert_eq!(tokens[0].kind(), kind);
    }
}

#[test]
fn stable_integer_tags_are_unique_across_all_kinds() {
    use TokenKind::*;
    let all = [
        Add, Colon, Div, Dot, End, Equal, Gosub, Goto, GreaterThan, GreaterThanOrEqual,
        Identifier, If, Innum, Instr, LessThan, LessThanOrEqual, Let, LiteralFloat,
        LiteralInteger, LiteralString, Mult, NotEqual, Print, Return, Sub,
    ];

    let mut tags: Vec<u8> = all.iter().map(|k| k.index()).collect();
    tags.sort_unstable();
    tags.dedup();
    assert_eq!(tags.len(), all.len(), "every TokenKind must have a unique tag");
}
