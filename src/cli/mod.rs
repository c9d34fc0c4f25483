//! CLI driver for the Vesna compiler.
//!
//! The default action checks a source file and prints the validated tree;
//! `--lex` and `--parse` stop after the corresponding stage for debugging.
//! Command functions return `CliResult<T>` instead of calling
//! `process::exit`; only the top-level [`run`] handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use thiserror::Error;

use crate::compiler;
use crate::frontend::{lexer, parser};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations. The entry point prints the message and
/// exits with code 1.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Usage(String),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// The Vesna programming language compiler
#[derive(Parser, Debug)]
#[command(name = "vesna")]
#[command(version = VERSION)]
#[command(about = "The Vesna programming language compiler", long_about = None)]
pub struct Cli {
    /// File to check (default action)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    // Debug/development flags
    /// Tokenize only (debug)
    #[arg(long = "lex", value_name = "FILE", conflicts_with = "file")]
    pub lex_file: Option<PathBuf>,

    /// Parse only (debug)
    #[arg(long = "parse", value_name = "FILE", conflicts_with = "file")]
    pub parse_file: Option<PathBuf>,
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(error) => {
            eprintln!("{}", error);
            process::exit(ExitCode::FAILURE.0);
        }
    }
}

fn execute(cli: Cli) -> CliResult<ExitCode> {
    if let Some(path) = &cli.lex_file {
        return lex_command(path);
    }
    if let Some(path) = &cli.parse_file {
        return parse_command(path);
    }
    match &cli.file {
        Some(path) => check_command(path),
        None => Err(CliError::Usage(
            "no input file (try `vesna --help`)".to_string(),
        )),
    }
}

fn read_source(path: &Path) -> CliResult<String> {
    fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Full check: print the validated tree, or the diagnostic on failure.
fn check_command(path: &Path) -> CliResult<ExitCode> {
    let source = read_source(path)?;
    let result = compiler::compile(&source);
    match result.root() {
        Some(root) => {
            println!("{}", root.node);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            if let Some(diagnostic) = result.diagnostic() {
                eprint!("{}", diagnostic);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn lex_command(path: &Path) -> CliResult<ExitCode> {
    let source = read_source(path)?;
    match lexer::lex(&source) {
        Ok(tokens) => {
            for token in &tokens {
                println!("{:?} @ {}..{}", token.kind, token.span.start, token.span.end);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            eprint!("{}", error.render(&source));
            Ok(ExitCode::FAILURE)
        }
    }
}

fn parse_command(path: &Path) -> CliResult<ExitCode> {
    let source = read_source(path)?;
    let result = lexer::lex(&source).and_then(|tokens| parser::parse(&tokens));
    match result {
        Ok(root) => {
            println!("{}", root.node);
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            eprint!("{}", error.render(&source));
            Ok(ExitCode::FAILURE)
        }
    }
}
