#![forbid(unsafe_code)]
//! Vesna Programming Language Compiler
//!
//! Vesna is a small statically-typed language with classes, functions and
//! an importable `io` module. This crate provides the frontend (lexer,
//! parser, semantic analyzer) and a CLI driver around it; compilation is
//! single-shot and fail-fast, producing either a validated tree or one
//! positioned diagnostic.
//!
//! ## Panic Policy
//!
//! Production code threads every failure through `Result` with `?`;
//! `.unwrap()` and `.expect()` are reserved for tests and for genuine
//! invariants (with `unreachable!` naming the invariant).

pub mod cli;
pub mod compiler;
pub mod frontend;

pub use frontend::ast;
pub use frontend::diagnostics;
pub use frontend::lexer;
pub use frontend::parser;
pub use frontend::symbols;
pub use frontend::typechecker;

pub use compiler::{compile, Compilation};
