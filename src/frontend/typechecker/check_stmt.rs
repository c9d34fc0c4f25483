//! Resolution pass over statements.
//!
//! Enforces placement rules, declares function-local bindings at their
//! own statement, and type-checks assignments, control flow and returns.

use super::{err, Analyzer};
use crate::frontend::ast::{
    AssignStmt, Block, ClassDecl, Expr, FuncDecl, IfStmt, ImportStmt, LetStmt, Span, Spanned,
    Stmt, WhileStmt,
};
use crate::frontend::diagnostics::CompileError;
use crate::frontend::symbols::{
    ScopeKind, Symbol, SymbolKind, Type, VariableInfo, ROOT_SCOPE,
};

impl Analyzer {
    pub(crate) fn check_stmt(&mut self, stmt: &Spanned<Stmt>) -> Result<(), CompileError> {
        if self.symbols.current_scope_kind() == ScopeKind::Class
            && !matches!(stmt.node, Stmt::Let(_) | Stmt::Func(_))
        {
            return Err(err(
                "Only 'let' and 'func' declarations are allowed in a class body".to_string(),
                stmt.span,
            ));
        }
        match &stmt.node {
            Stmt::Let(decl) => self.check_let(decl),
            Stmt::Func(func) => self.check_func(func),
            Stmt::Class(class) => self.check_class(class),
            Stmt::Import(import) => self.check_import(import, stmt.span),
            Stmt::If(if_stmt) => {
                self.require_function_body(stmt)?;
                self.check_if(if_stmt)
            }
            Stmt::While(while_stmt) => {
                self.require_function_body(stmt)?;
                self.check_while(while_stmt)
            }
            Stmt::Return(expr) => {
                self.require_function_body(stmt)?;
                self.check_return(expr.as_ref(), stmt.span)
            }
            Stmt::Block(block) => self.check_block(block),
            Stmt::Assign(assign) => {
                self.require_function_body(stmt)?;
                self.check_assign(assign, stmt.span)
            }
            Stmt::Expr(expr) => {
                if matches!(expr.node, Expr::Binary { .. }) {
                    self.require_function_body(stmt)?;
                }
                self.check_expr(expr).map(|_| ())
            }
        }
    }

    fn require_function_body(&self, stmt: &Spanned<Stmt>) -> Result<(), CompileError> {
        if self.symbols.in_function() {
            Ok(())
        } else {
            Err(err(
                format!(
                    "Statement '{}' is only allowed inside a function body",
                    stmt.node.describe()
                ),
                stmt.span,
            ))
        }
    }

    /// Check a `let`. Module- and class-level bindings were hoisted by the
    /// declaration pass and only need their initializer verified; bindings
    /// inside function and block scopes are declared here, after their
    /// initializer is checked, so they are not visible to it.
    fn check_let(&mut self, decl: &LetStmt) -> Result<(), CompileError> {
        match self.symbols.current_scope_kind() {
            ScopeKind::Module | ScopeKind::Class => self.check_hoisted_let(decl),
            ScopeKind::Function | ScopeKind::Block => self.check_local_let(decl),
        }
    }

    fn check_hoisted_let(&mut self, decl: &LetStmt) -> Result<(), CompileError> {
        let id = self
            .symbols
            .lookup_member(self.symbols.current_scope(), &decl.name.node)
            .unwrap_or_else(|| unreachable!("hoisted binding registered by declaration pass"));
        let declared = match &self.symbols.get(id).kind {
            SymbolKind::Variable(info) => info.ty.clone(),
            _ => unreachable!("hoisted let resolves to a variable"),
        };
        let Some(init) = &decl.init else {
            return Ok(());
        };
        let init_ty = self.check_expr(init)?;
        match (&decl.ty, declared) {
            (Some(_), Some(declared)) => {
                if init_ty != declared {
                    return Err(err(
                        format!(
                            "Initializer type '{}' does not match explicit type '{}'",
                            init_ty, declared
                        ),
                        init.span,
                    ));
                }
            }
            _ => {
                let SymbolKind::Variable(info) = &mut self.symbols.get_mut(id).kind else {
                    unreachable!("hoisted let resolves to a variable");
                };
                info.ty = Some(init_ty);
            }
        }
        Ok(())
    }

    fn check_local_let(&mut self, decl: &LetStmt) -> Result<(), CompileError> {
        let init_ty = match &decl.init {
            Some(init) => Some(self.check_expr(init)?),
            None => None,
        };
        let declared = match &decl.ty {
            Some(annot) => Some(self.resolve_type_name(&annot.node.name).ok_or_else(|| {
                err(
                    format!(
                        "Type '{}' of variable '{}' is not found",
                        annot.node.name, decl.name.node
                    ),
                    annot.span,
                )
            })?),
            None => None,
        };
        if let (Some(declared), Some(init_ty)) = (&declared, &init_ty) {
            if declared != init_ty {
                return Err(err(
                    format!(
                        "Initializer type '{}' does not match explicit type '{}'",
                        init_ty, declared
                    ),
                    decl.init.as_ref().map(|i| i.span).unwrap_or(decl.name.span),
                ));
            }
        }
        let ty = declared.or(init_ty);
        self.declare_symbol(Symbol {
            name: decl.name.node.clone(),
            kind: SymbolKind::Variable(VariableInfo { ty }),
            span: decl.name.span,
        })?;
        Ok(())
    }

    /// Check a function body. Signatures of module- and class-level
    /// functions were hoisted; a function nested in another body is
    /// registered here, at its own statement.
    fn check_func(&mut self, func: &FuncDecl) -> Result<(), CompileError> {
        let hoisted = self
            .symbols
            .lookup_member(self.symbols.current_scope(), &func.name.node);
        if hoisted.is_none() {
            self.collect_function(func)?;
        }
        let id = self
            .symbols
            .lookup_member(self.symbols.current_scope(), &func.name.node)
            .unwrap_or_else(|| unreachable!("function signature registered"));
        let SymbolKind::Function(info) = &self.symbols.get(id).kind else {
            unreachable!("func statement resolves to a function symbol");
        };
        let scope = info.scope;
        let return_type = info.return_type.clone();

        let outer = self.symbols.current_scope();
        self.symbols.enter_scope_at(scope);
        let result = func
            .body
            .stmts
            .iter()
            .try_for_each(|stmt| self.check_stmt(stmt));
        self.symbols.enter_scope_at(outer);
        result?;

        if return_type != Type::Null && !block_returns(&func.body) {
            return Err(err(
                "Function is missing return value".to_string(),
                func.name.span,
            ));
        }
        Ok(())
    }

    fn check_class(&mut self, class: &ClassDecl) -> Result<(), CompileError> {
        let hoisted = self
            .symbols
            .lookup_member(self.symbols.current_scope(), &class.name.node);
        if hoisted.is_none() {
            // Class nested in a function body: register it on the spot.
            self.collect_class_shell(class)?;
            self.collect_class_members(class)?;
        }
        let id = self
            .symbols
            .lookup_member(self.symbols.current_scope(), &class.name.node)
            .unwrap_or_else(|| unreachable!("class shell registered"));
        let SymbolKind::Class(info) = &self.symbols.get(id).kind else {
            unreachable!("class statement resolves to a class symbol");
        };
        let scope = info.scope;

        let outer = self.symbols.current_scope();
        self.symbols.enter_scope_at(scope);
        let result = class.body.iter().try_for_each(|stmt| self.check_stmt(stmt));
        self.symbols.enter_scope_at(outer);
        result
    }

    fn check_import(&mut self, import: &ImportStmt, span: Span) -> Result<(), CompileError> {
        if self.symbols.current_scope() != ROOT_SCOPE {
            return Err(err(
                "Statement 'import' is only allowed at module scope".to_string(),
                span,
            ));
        }
        match self.symbols.import_module(&import.name.node, import.name.span) {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(err(
                format!("Imported module '{}' is not found", import.name.node),
                import.name.span,
            )),
            Err(()) => Err(err(
                format!("Identifier '{}' is already in symtab", import.name.node),
                import.name.span,
            )),
        }
    }

    fn check_if(&mut self, if_stmt: &IfStmt) -> Result<(), CompileError> {
        let test_ty = self.check_expr(&if_stmt.test)?;
        if test_ty != Type::Boolean {
            return Err(err(
                "If only accepts tests of type 'Boolean'".to_string(),
                if_stmt.test.span,
            ));
        }
        self.check_block(&if_stmt.then_block)?;
        if let Some(else_block) = &if_stmt.else_block {
            self.check_block(else_block)?;
        }
        Ok(())
    }

    fn check_while(&mut self, while_stmt: &WhileStmt) -> Result<(), CompileError> {
        let test_ty = self.check_expr(&while_stmt.test)?;
        if test_ty != Type::Boolean {
            return Err(err(
                "While only accepts tests of type 'Boolean'".to_string(),
                while_stmt.test.span,
            ));
        }
        self.check_block(&while_stmt.body)
    }

    fn check_return(
        &mut self,
        expr: Option<&Spanned<Expr>>,
        span: Span,
    ) -> Result<(), CompileError> {
        let value_ty = match expr {
            Some(expr) => self.check_expr(expr)?,
            None => Type::Null,
        };
        let expected = self
            .symbols
            .current_return_type()
            .cloned()
            .unwrap_or_else(|| unreachable!("return checked inside a function body"));
        if value_ty != expected {
            return Err(err(
                format!(
                    "Return statement type '{}' does not match function return type '{}'",
                    value_ty, expected
                ),
                expr.map(|e| e.span).unwrap_or(span),
            ));
        }
        Ok(())
    }

    fn check_block(&mut self, block: &Block) -> Result<(), CompileError> {
        self.symbols.enter_scope(ScopeKind::Block);
        let result = block.stmts.iter().try_for_each(|stmt| self.check_stmt(stmt));
        self.symbols.exit_scope();
        result
    }

    fn check_assign(&mut self, assign: &AssignStmt, span: Span) -> Result<(), CompileError> {
        let id = match &assign.target.node {
            Expr::Ident(name) => self.symbols.lookup(name).ok_or_else(|| {
                err(
                    format!("Identifier '{}' is not found", name),
                    assign.target.span,
                )
            })?,
            Expr::Member { base, member } => {
                self.resolve_member(base, member, assign.target.span)?
            }
            _ => {
                return Err(err(
                    "Left side of assignment is not assignable".to_string(),
                    assign.target.span,
                ));
            }
        };
        let target_name = self.symbols.get(id).name.clone();
        match self.symbols.get(id).kind.clone() {
            SymbolKind::Builtin(_) => Err(err(
                format!("Overriding builtin '{}' is not allowed", target_name),
                span,
            )),
            SymbolKind::Module(_) => {
                let value_ty = self.check_expr(&assign.value)?;
                if value_ty == Type::Module {
                    Err(err(
                        format!("Overriding imported module '{}' is not allowed", target_name),
                        span,
                    ))
                } else {
                    Err(err(
                        format!(
                            "Left type 'Module' of assignment does not match the right type '{}'",
                            value_ty
                        ),
                        span,
                    ))
                }
            }
            SymbolKind::Variable(info) => {
                let target_ty = info.ty.ok_or_else(|| {
                    err(
                        format!("Identifier '{}' is used before its type is known", target_name),
                        assign.target.span,
                    )
                })?;
                self.info.record(assign.target.span, target_ty.clone());
                let value_ty = self.check_expr(&assign.value)?;
                if target_ty != value_ty {
                    return Err(err(
                        format!(
                            "Left type '{}' of assignment does not match the right type '{}'",
                            target_ty, value_ty
                        ),
                        span,
                    ));
                }
                Ok(())
            }
            SymbolKind::Function(_) | SymbolKind::Class(_) | SymbolKind::Overloaded(_) => Err(err(
                "Left side of assignment is not assignable".to_string(),
                assign.target.span,
            )),
        }
    }
}

/// Whether a block is guaranteed to execute a `return`: any statement that
/// always returns suffices. `if` needs both branches; loops never count.
pub(crate) fn block_returns(block: &Block) -> bool {
    block.stmts.iter().any(|stmt| stmt_returns(&stmt.node))
}

fn stmt_returns(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Return(_) => true,
        Stmt::Block(block) => block_returns(block),
        Stmt::If(if_stmt) => if_stmt
            .else_block
            .as_ref()
            .is_some_and(|else_block| {
                block_returns(&if_stmt.then_block) && block_returns(else_block)
            }),
        _ => false,
    }
}
