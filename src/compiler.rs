//! Compiler façade: parse → declare → resolve in one call.
//!
//! [`compile`] never returns `Err`; the outcome of a compile is a
//! [`Compilation`] value holding either the validated tree plus its
//! analysis annotations, or the rendered diagnostic of the first fatal
//! error. Each call is independent: no state survives between compiles.

use crate::frontend::ast::{Module, Spanned, Stmt};
use crate::frontend::diagnostics::CompileError;
use crate::frontend::typechecker::AnalysisInfo;
use crate::frontend::{lexer, parser, typechecker};

/// Result of one compile.
#[derive(Debug, Default)]
pub struct Compilation {
    root: Option<Spanned<Module>>,
    info: Option<AnalysisInfo>,
    diagnostic: Option<String>,
}

impl Compilation {
    /// The validated module tree, absent when the compile failed.
    pub fn root(&self) -> Option<&Spanned<Module>> {
        self.root.as_ref()
    }

    /// The first statement of the validated module, if any.
    pub fn first(&self) -> Option<&Spanned<Stmt>> {
        self.root.as_ref()?.node.stmts.first()
    }

    /// Resolved expression types, absent when the compile failed.
    pub fn info(&self) -> Option<&AnalysisInfo> {
        self.info.as_ref()
    }

    /// Rendered diagnostic (`Error at <line>:<column>: <message>`, with a
    /// trailing newline), absent when the compile succeeded.
    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    pub fn is_ok(&self) -> bool {
        self.diagnostic.is_none()
    }
}

/// Compile a source string.
#[tracing::instrument(skip_all, fields(len = source.len()))]
pub fn compile(source: &str) -> Compilation {
    match run(source) {
        Ok((root, info)) => Compilation {
            root: Some(root),
            info: Some(info),
            diagnostic: None,
        },
        Err(error) => {
            tracing::debug!(message = %error.message, kind = ?error.kind, "compile failed");
            Compilation {
                root: None,
                info: None,
                diagnostic: Some(error.render(source)),
            }
        }
    }
}

fn run(source: &str) -> Result<(Spanned<Module>, AnalysisInfo), CompileError> {
    let tokens = lexer::lex(source)?;
    let root = parser::parse(&tokens)?;
    let info = typechecker::check(&root)?;
    Ok((root, info))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_compile_exposes_the_tree() {
        let result = compile("let a = 5;");
        assert!(result.is_ok());
        assert!(result.diagnostic().is_none());
        assert_eq!(
            result.first().unwrap().node.to_string(),
            "Let(name=a, init=Int(5))"
        );
        assert!(result.info().is_some());
    }

    #[test]
    fn failed_compile_exposes_only_the_diagnostic() {
        let result = compile("x;");
        assert!(!result.is_ok());
        assert!(result.root().is_none());
        assert!(result.first().is_none());
        assert!(result.info().is_none());
        assert_eq!(
            result.diagnostic(),
            Some("Error at 1:1: Identifier 'x' is not found\n")
        );
    }

    #[test]
    fn compiles_are_independent() {
        assert!(!compile("import io; import io;").is_ok());
        // The second compile starts from a fresh symbol table.
        assert!(compile("import io;").is_ok());
    }
}
