//! Resolution pass over expressions.
//!
//! Computes the type of every expression, resolving identifiers through
//! the scope chain and member accesses strictly within the owner's
//! scope. Each successfully typed expression is recorded in the
//! analysis side table.

use super::{err, Analyzer};
use crate::frontend::ast::{BinOp, Expr, Ident, Span, Spanned};
use crate::frontend::diagnostics::CompileError;
use crate::frontend::symbols::{ScopeId, Signature, SymbolId, SymbolKind, Type};

impl Analyzer {
    pub(crate) fn check_expr(&mut self, expr: &Spanned<Expr>) -> Result<Type, CompileError> {
        let ty = match &expr.node {
            Expr::Integer(_) => Type::Integer64,
            Expr::Str(_) => Type::String,
            Expr::Boolean(_) => Type::Boolean,
            Expr::This => {
                let class = self.symbols.enclosing_class().ok_or_else(|| {
                    err("Identifier 'this' is not found".to_string(), expr.span)
                })?;
                Type::Class(class.to_string())
            }
            Expr::Ident(name) => {
                let id = self.symbols.lookup(name).ok_or_else(|| {
                    err(format!("Identifier '{}' is not found", name), expr.span)
                })?;
                self.symbol_type(id, expr.span)?
            }
            Expr::Member { base, member } => {
                let id = self.resolve_member(base, member, expr.span)?;
                self.symbol_type(id, expr.span)?
            }
            Expr::Call { callee, args } => self.check_call(callee, args, expr.span)?,
            Expr::Binary { op, lhs, rhs } => {
                let lhs_ty = self.check_expr(lhs)?;
                let rhs_ty = self.check_expr(rhs)?;
                binary_result(*op, &lhs_ty, &rhs_ty).ok_or_else(|| {
                    err(
                        format!(
                            "Operator '{}' not defined for types '{}' and '{}'",
                            op, lhs_ty, rhs_ty
                        ),
                        expr.span,
                    )
                })?
            }
        };
        self.info.record(expr.span, ty.clone());
        Ok(ty)
    }

    /// Type of a symbol used as a value.
    fn symbol_type(&self, id: SymbolId, span: Span) -> Result<Type, CompileError> {
        let symbol = self.symbols.get(id);
        match &symbol.kind {
            SymbolKind::Variable(info) => info.ty.clone().ok_or_else(|| {
                err(
                    format!("Identifier '{}' is used before its type is known", symbol.name),
                    span,
                )
            }),
            SymbolKind::Module(_) => Ok(Type::Module),
            SymbolKind::Class(_) => Ok(Type::Class(symbol.name.clone())),
            SymbolKind::Builtin(builtin) => match builtin.signature() {
                None => Ok(Type::Boolean),
                Some(_) => Err(err(
                    format!("Builtin '{}' can only be called", symbol.name),
                    span,
                )),
            },
            SymbolKind::Function(_) | SymbolKind::Overloaded(_) => Err(err(
                format!("Function '{}' can only be called", symbol.name),
                span,
            )),
        }
    }

    /// Resolve `base.member` to a symbol, looking only inside the owner's
    /// scope. The diagnostic shape depends on the owner: an owner with no
    /// members at all (or no member scope) reports "has no subsymbol",
    /// otherwise the full path is reported as not found.
    pub(crate) fn resolve_member(
        &mut self,
        base: &Spanned<Expr>,
        member: &Spanned<Ident>,
        span: Span,
    ) -> Result<SymbolId, CompileError> {
        let owner = self.owner_scope(base)?;
        let base_text = base
            .node
            .path_text()
            .unwrap_or_else(|| base.node.to_string());
        let scope = owner.ok_or_else(|| {
            err(
                format!(
                    "Identifier '{}' has no subsymbol '{}'",
                    base_text, member.node
                ),
                span,
            )
        })?;
        match self.symbols.lookup_member(scope, &member.node) {
            Some(id) => Ok(id),
            None if self.symbols.scope_is_empty(scope) => Err(err(
                format!(
                    "Identifier '{}' has no subsymbol '{}'",
                    base_text, member.node
                ),
                span,
            )),
            None => Err(err(
                format!("Identifier '{}.{}' is not found", base_text, member.node),
                span,
            )),
        }
    }

    /// Scope whose members a dotted access on `base` may name, if the
    /// base has one: a module's scope, a class's member scope, or the
    /// member scope of a variable's class type.
    fn owner_scope(&mut self, base: &Spanned<Expr>) -> Result<Option<ScopeId>, CompileError> {
        match &base.node {
            Expr::Ident(name) => {
                let id = self.symbols.lookup(name).ok_or_else(|| {
                    err(format!("Identifier '{}' is not found", name), base.span)
                })?;
                self.symbol_owner_scope(id, base.span)
            }
            Expr::This => {
                let class = self
                    .symbols
                    .enclosing_class()
                    .ok_or_else(|| {
                        err("Identifier 'this' is not found".to_string(), base.span)
                    })?
                    .to_string();
                Ok(self.class_scope(&class))
            }
            Expr::Member {
                base: inner_base,
                member,
            } => {
                let id = self.resolve_member(inner_base, member, base.span)?;
                self.symbol_owner_scope(id, base.span)
            }
            _ => {
                let ty = self.check_expr(base)?;
                match ty {
                    Type::Class(name) => Ok(self.class_scope(&name)),
                    _ => Ok(None),
                }
            }
        }
    }

    fn symbol_owner_scope(
        &self,
        id: SymbolId,
        span: Span,
    ) -> Result<Option<ScopeId>, CompileError> {
        let symbol = self.symbols.get(id);
        match &symbol.kind {
            SymbolKind::Module(info) => Ok(Some(info.scope)),
            SymbolKind::Class(info) => Ok(Some(info.scope)),
            SymbolKind::Variable(info) => match &info.ty {
                Some(Type::Class(name)) => Ok(self.class_scope(name)),
                Some(_) => Ok(None),
                None => Err(err(
                    format!("Identifier '{}' is used before its type is known", symbol.name),
                    span,
                )),
            },
            SymbolKind::Function(_) | SymbolKind::Builtin(_) | SymbolKind::Overloaded(_) => {
                Ok(None)
            }
        }
    }

    /// Member scope of the class named `name`, resolved through the
    /// current scope chain.
    fn class_scope(&self, name: &str) -> Option<ScopeId> {
        let id = self.symbols.lookup(name)?;
        match &self.symbols.get(id).kind {
            SymbolKind::Class(info) => Some(info.scope),
            _ => None,
        }
    }

    fn check_call(
        &mut self,
        callee: &Spanned<Expr>,
        args: &[Spanned<Expr>],
        span: Span,
    ) -> Result<Type, CompileError> {
        let id = match &callee.node {
            Expr::Ident(name) => self.symbols.lookup(name).ok_or_else(|| {
                err(format!("Identifier '{}' is not found", name), callee.span)
            })?,
            Expr::Member { base, member } => self.resolve_member(base, member, callee.span)?,
            _ => {
                return Err(err(
                    "Called expression is not a function".to_string(),
                    callee.span,
                ));
            }
        };
        let name = callee
            .node
            .path_text()
            .unwrap_or_else(|| self.symbols.get(id).name.clone());
        match self.symbols.get(id).kind.clone() {
            SymbolKind::Function(info) => {
                let signature = Signature::new(
                    info.params.iter().map(|(_, ty)| ty.clone()).collect(),
                    info.return_type,
                );
                self.check_signature_call(&name, &signature, args, span)
            }
            SymbolKind::Builtin(builtin) => match builtin.signature() {
                Some(signature) => self.check_signature_call(&name, &signature, args, span),
                None => Err(err(
                    format!("Called symbol '{}' is not a function", name),
                    span,
                )),
            },
            SymbolKind::Overloaded(set) => {
                if !set.accepts_arity(args.len()) {
                    return Err(err(
                        format!("Call to function '{}' has wrong number of arguments", name),
                        span,
                    ));
                }
                let arg_types = args
                    .iter()
                    .map(|arg| self.check_expr(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                match set.resolve(&arg_types) {
                    Some(signature) => Ok(signature.ret.clone()),
                    None => {
                        let rendered = arg_types
                            .iter()
                            .map(Type::to_string)
                            .collect::<Vec<_>>()
                            .join(", ");
                        Err(err(
                            format!(
                                "No matching overload of function '{}' for argument type '{}'",
                                name, rendered
                            ),
                            span,
                        ))
                    }
                }
            }
            SymbolKind::Variable(_) | SymbolKind::Class(_) | SymbolKind::Module(_) => Err(err(
                format!("Called symbol '{}' is not a function", name),
                span,
            )),
        }
    }

    /// Check a call against a single fixed signature.
    fn check_signature_call(
        &mut self,
        name: &str,
        signature: &Signature,
        args: &[Spanned<Expr>],
        span: Span,
    ) -> Result<Type, CompileError> {
        if args.len() != signature.params.len() {
            return Err(err(
                format!("Call to function '{}' has wrong number of arguments", name),
                span,
            ));
        }
        for (index, (arg, param)) in args.iter().zip(&signature.params).enumerate() {
            let arg_ty = self.check_expr(arg)?;
            if arg_ty != *param {
                return Err(err(
                    format!(
                        "Argument {} in call to function '{}' has type '{}' which does not \
                         match definition type '{}'",
                        index + 1,
                        name,
                        arg_ty,
                        param
                    ),
                    arg.span,
                ));
            }
        }
        Ok(signature.ret.clone())
    }
}

/// Result type of a binary operator, or `None` when undefined for the
/// operand pair. Arithmetic is Integer64-only except `+`, which also
/// concatenates strings; comparisons are Integer64-only and yield
/// Boolean.
fn binary_result(op: BinOp, lhs: &Type, rhs: &Type) -> Option<Type> {
    if op.is_comparison() {
        return match (lhs, rhs) {
            (Type::Integer64, Type::Integer64) => Some(Type::Boolean),
            _ => None,
        };
    }
    match (op, lhs, rhs) {
        (_, Type::Integer64, Type::Integer64) => Some(Type::Integer64),
        (BinOp::Add, Type::String, Type::String) => Some(Type::String),
        _ => None,
    }
}
