//! Compiler frontend: lexer, parser and semantic analyzer.

pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod symbols;
pub mod typechecker;
