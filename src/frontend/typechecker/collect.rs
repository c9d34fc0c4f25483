//! Declaration pass: hoist module-level and class-level names.
//!
//! Runs in two stages so every class name is known before any signature
//! or annotation is resolved: stage one registers class shells, stage
//! two registers function signatures and hoisted `let` bindings in
//! textual order. Function bodies are never entered here.

use super::{err, Analyzer};
use crate::frontend::ast::{ClassDecl, Expr, FuncDecl, LetStmt, Module, Stmt};
use crate::frontend::diagnostics::CompileError;
use crate::frontend::symbols::{
    ClassInfo, FunctionInfo, ScopeId, ScopeKind, Symbol, SymbolKind, Type, VariableInfo,
};

impl Analyzer {
    pub(crate) fn collect_module(&mut self, module: &Module) -> Result<(), CompileError> {
        for stmt in &module.stmts {
            if let Stmt::Class(class) = &stmt.node {
                self.collect_class_shell(class)?;
            }
        }
        for stmt in &module.stmts {
            match &stmt.node {
                Stmt::Func(func) => {
                    self.collect_function(func)?;
                }
                Stmt::Let(decl) => {
                    self.collect_hoisted_let(decl)?;
                }
                Stmt::Class(class) => self.collect_class_members(class)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Register a class name with an empty member scope.
    pub(crate) fn collect_class_shell(&mut self, class: &ClassDecl) -> Result<ScopeId, CompileError> {
        let name = &class.name.node;
        if name.chars().next().is_some_and(|c| c.is_lowercase()) {
            return Err(err(
                format!("Class name '{}' can not start with an lowercase letter", name),
                class.name.span,
            ));
        }
        let scope = self.symbols.enter_scope(ScopeKind::Class);
        self.symbols.set_class_name(scope, name);
        self.symbols.exit_scope();
        self.declare_symbol(Symbol {
            name: name.clone(),
            kind: SymbolKind::Class(ClassInfo { scope }),
            span: class.name.span,
        })?;
        Ok(scope)
    }

    /// Register the fields and method signatures of an already-shelled
    /// class into its member scope.
    pub(crate) fn collect_class_members(&mut self, class: &ClassDecl) -> Result<(), CompileError> {
        let class_name = &class.name.node;
        let id = self
            .symbols
            .lookup(class_name)
            .unwrap_or_else(|| unreachable!("class shell registered before members"));
        let SymbolKind::Class(info) = &self.symbols.get(id).kind else {
            unreachable!("class shell registered before members");
        };
        let scope = info.scope;

        let outer = self.symbols.current_scope();
        self.symbols.enter_scope_at(scope);
        for stmt in &class.body {
            match &stmt.node {
                Stmt::Let(decl) => {
                    // A member sharing the class's own name shadows the
                    // class inside every method body; reject it.
                    if decl.name.node == *class_name {
                        self.symbols.enter_scope_at(outer);
                        return Err(err(
                            format!("Identifier '{}' is already in symtab", decl.name.node),
                            decl.name.span,
                        ));
                    }
                    if let Err(error) = self.collect_hoisted_let(decl) {
                        self.symbols.enter_scope_at(outer);
                        return Err(error);
                    }
                }
                Stmt::Func(func) => {
                    if func.name.node == *class_name {
                        self.symbols.enter_scope_at(outer);
                        return Err(err(
                            format!("Identifier '{}' is already in symtab", func.name.node),
                            func.name.span,
                        ));
                    }
                    if let Err(error) = self.collect_function(func) {
                        self.symbols.enter_scope_at(outer);
                        return Err(error);
                    }
                }
                // Anything else is a placement error, reported by the
                // resolution pass.
                _ => {}
            }
        }
        self.symbols.enter_scope_at(outer);
        Ok(())
    }

    /// Register a function's signature and build its parameter scope.
    pub(crate) fn collect_function(&mut self, func: &FuncDecl) -> Result<(), CompileError> {
        let func_name = &func.name.node;

        let return_type = self.resolve_type_name(&func.ret.node.name).ok_or_else(|| {
            err(
                format!(
                    "Return type '{}' of function '{}' is not found",
                    func.ret.node.name, func_name
                ),
                func.ret.span,
            )
        })?;

        let mut params = Vec::with_capacity(func.params.len());
        for param in &func.params {
            let ty = self.resolve_type_name(&param.ty.node.name).ok_or_else(|| {
                err(
                    format!(
                        "Identifier '{}' in type of argument '{}' in function '{}' is not found",
                        param.ty.node.name, param.name.node, func_name
                    ),
                    param.ty.span,
                )
            })?;
            params.push((param.name.node.clone(), ty));
        }

        let scope = self.symbols.enter_scope(ScopeKind::Function);
        self.symbols.set_return_type(scope, return_type.clone());
        for (param, (name, ty)) in func.params.iter().zip(&params) {
            // A parameter may neither repeat another parameter nor reuse
            // the function's own name.
            let duplicate = *name == *func_name
                || self
                    .symbols
                    .declare(Symbol {
                        name: name.clone(),
                        kind: SymbolKind::Variable(VariableInfo { ty: Some(ty.clone()) }),
                        span: param.name.span,
                    })
                    .is_none();
            if duplicate {
                self.symbols.exit_scope();
                return Err(err(
                    format!(
                        "Identifier '{}' in argument list of function '{}' is already in symtab",
                        name, func_name
                    ),
                    param.name.span,
                ));
            }
        }
        self.symbols.exit_scope();

        self.declare_symbol(Symbol {
            name: func_name.clone(),
            kind: SymbolKind::Function(FunctionInfo {
                params,
                return_type,
                scope,
            }),
            span: func.name.span,
        })?;
        Ok(())
    }

    /// Register a hoisted `let` in the current (module or class) scope.
    ///
    /// The type comes from the explicit annotation, or from a literal
    /// initializer; otherwise it stays pending until the resolution pass
    /// reaches the statement.
    fn collect_hoisted_let(&mut self, decl: &LetStmt) -> Result<(), CompileError> {
        let ty = match &decl.ty {
            Some(annot) => Some(self.resolve_type_name(&annot.node.name).ok_or_else(|| {
                err(
                    format!(
                        "Type '{}' of variable '{}' is not found",
                        annot.node.name, decl.name.node
                    ),
                    annot.span,
                )
            })?),
            None => decl.init.as_ref().and_then(|init| literal_type(&init.node)),
        };
        self.declare_symbol(Symbol {
            name: decl.name.node.clone(),
            kind: SymbolKind::Variable(VariableInfo { ty }),
            span: decl.name.span,
        })?;
        Ok(())
    }
}

/// Type of a bare literal initializer, usable before the resolution pass.
fn literal_type(expr: &Expr) -> Option<Type> {
    match expr {
        Expr::Integer(_) => Some(Type::Integer64),
        Expr::Str(_) => Some(Type::String),
        Expr::Boolean(_) => Some(Type::Boolean),
        _ => None,
    }
}
