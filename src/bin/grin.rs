//! The `grin` binary: the driver described as "out of scope" for the core
//! library. Reads program lines from standard input up to the `.`
//! sentinel, runs them, and formats the three error surfaces the core
//! raises.

use std::io::{self, BufRead};

use clap::{Parser, ValueEnum};
use grin_lang::interpreter::{run_program, StdinInput, StdoutOutput};
use log::info;

/// CLI arguments for the Grin interpreter.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Specify the log level of the interpreter's own lifecycle tracing.
    #[arg(value_enum, short, long, default_value_t = LogLevel::default())]
    verbosity: LogLevel,
}

/// Log level for the driver's own lifecycle messages. Never consulted by
/// the lexer, parser or interpreter -- purely ambient observability.
#[derive(ValueEnum, Clone, Default, Debug)]
enum LogLevel {
    #[default]
    #[value(alias("0"))]
    Error,
    #[value(alias("1"))]
    Warn,
    #[value(alias("2"))]
    Info,
    #[value(alias("3"))]
    Debug,
    #[value(alias("4"))]
    Trace,
}

impl From<&LogLevel> for log::Level {
    fn from(value: &LogLevel) -> Self {
        match value {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

/// Reads program lines from standard input up to (but not including) a
/// line that is exactly `.` once surrounding ASCII whitespace is trimmed.
fn read_program_lines() -> io::Result<Vec<String>> {
    let stdin = io::stdin();
    let mut lines = Vec::new();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim() == "." {
            break;
        }
        lines.push(line);
    }

    Ok(lines)
}

fn main() {
    let args = Cli::parse();
    simple_logger::init_with_level((&args.verbosity).into()).unwrap();

    let lines = match read_program_lines() {
        Ok(lines) => lines,
        Err(e) => {
            eprintln!("Error during execution: could not read program: {e}");
            std::process::exit(1);
        }
    };

    info!("read {} program line(s)", lines.len());

    match run_program(lines, StdinInput::new(), StdoutOutput) {
        Ok(()) => {
            info!("program halted normally");
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
