//! Semantic analyzer for the Vesna programming language.
//!
//! Runs in two passes over the AST:
//!
//! 1. **Declaration pass** ([`collect`]): registers module-level and
//!    class-level `class`/`func`/`let` names from their signatures alone,
//!    so mutually referencing top-level declarations compile regardless
//!    of textual order. Function bodies are not entered.
//! 2. **Resolution pass** ([`check_stmt`]/[`check_expr`]): walks every
//!    statement and expression in program order, resolves identifiers
//!    against the scope chain, computes and checks types, and enforces
//!    placement rules. Function-local `let` bindings enter scope at their
//!    own statement, never before — the hoisting asymmetry between the
//!    two passes is intentional.
//!
//! Analysis is fail-fast: every check returns `Result` and the first
//! violation aborts the compile with a single positioned diagnostic.

mod check_expr;
mod check_stmt;
mod collect;

#[cfg(test)]
mod tests;

use std::collections::HashMap;

use crate::frontend::ast::{Module, Span, Spanned};
use crate::frontend::diagnostics::CompileError;
use crate::frontend::symbols::{Symbol, SymbolId, SymbolKind, SymbolTable, Type};

/// Analysis output for downstream consumers: resolved expression types
/// keyed by span, so the AST itself stays untouched.
#[derive(Debug, Default, Clone)]
pub struct AnalysisInfo {
    expr_types: HashMap<(usize, usize), Type>,
}

impl AnalysisInfo {
    pub fn expr_type(&self, span: Span) -> Option<&Type> {
        self.expr_types.get(&(span.start, span.end))
    }

    fn record(&mut self, span: Span, ty: Type) {
        self.expr_types.insert((span.start, span.end), ty);
    }
}

/// Analyzer state: the scope arena plus the annotation side table.
pub struct Analyzer {
    pub(crate) symbols: SymbolTable,
    pub(crate) info: AnalysisInfo,
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            symbols: SymbolTable::new(),
            info: AnalysisInfo::default(),
        }
    }

    /// Run both passes over a module.
    pub fn check_module(&mut self, module: &Spanned<Module>) -> Result<(), CompileError> {
        self.collect_module(&module.node)?;
        tracing::debug!("declaration pass complete");
        for stmt in &module.node.stmts {
            self.check_stmt(stmt)?;
        }
        tracing::debug!("resolution pass complete");
        Ok(())
    }

    pub fn into_info(self) -> AnalysisInfo {
        self.info
    }

    // ========================================================================
    // Shared helpers
    // ========================================================================

    /// Declare in the current scope, mapping a clash to the redefinition
    /// diagnostic.
    pub(crate) fn declare_symbol(&mut self, symbol: Symbol) -> Result<SymbolId, CompileError> {
        let name = symbol.name.clone();
        let span = symbol.span;
        self.symbols.declare(symbol).ok_or_else(|| {
            CompileError::new(format!("Identifier '{}' is already in symtab", name), span)
        })
    }

    /// Resolve a type annotation: a primitive name or a class visible
    /// from the current scope chain.
    pub(crate) fn resolve_type_name(&self, name: &str) -> Option<Type> {
        if let Some(ty) = Type::primitive(name) {
            return Some(ty);
        }
        let id = self.symbols.lookup(name)?;
        match &self.symbols.get(id).kind {
            SymbolKind::Class(_) => Some(Type::Class(name.to_string())),
            _ => None,
        }
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience entrypoint: analyze a parsed module.
#[tracing::instrument(skip_all, fields(stmts = module.node.stmts.len()))]
pub fn check(module: &Spanned<Module>) -> Result<AnalysisInfo, CompileError> {
    let mut analyzer = Analyzer::new();
    analyzer.check_module(module)?;
    Ok(analyzer.into_info())
}

pub(crate) fn err(message: String, span: Span) -> CompileError {
    CompileError::new(message, span)
}
