//! Checks the three formatted error surfaces the driver is responsible for
//! printing verbatim (spec section: external interfaces), exercised end to
//! end through `run_program` rather than by spawning the `grin` binary.

use grin_lang::interpreter::{run_program, BufferInput, BufferOutput, ProgramError};

fn run(source: &[&str]) -> Result<Vec<String>, ProgramError> {
    let input = BufferInput::new(Vec::<String>::new());
    let mut output = BufferOutput::new();
    run_program(source, input, &mut output)?;
    Ok(output.lines)
}

#[test]
fn lex_error_surface_matches_the_documented_format() {
    let err = run(&["PRINT !"]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error during lexing: Line 1 Column 7: Invalid character"
    );
}

#[test]
fn parse_error_surface_matches_the_documented_format() {
    let err = run(&["LET X 3 \"Boo\""]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error during parsing: Line 1 Column 9: Extra tokens after statement end"
    );
}

#[test]
fn runtime_error_surface_matches_the_documented_format() {
    let err = run(&["LET X \"a\"", "ADD X 1", "."]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error during execution: Line 2: Type mismatch in ADD"
    );
}

#[test]
fn a_clean_run_produces_no_error_at_all() {
    assert_eq!(run(&["LET X 1", "PRINT X", "."]).unwrap(), vec!["1"]);
}
