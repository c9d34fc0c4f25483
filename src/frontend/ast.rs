//! Abstract syntax tree definitions for Vesna
//!
//! The parser produces this tree; the analyzer walks it and records
//! resolved types in a side table keyed by span, without restructuring
//! any node.

use std::fmt;

/// Source location span (byte offsets)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

pub type Ident = String;

/// A module is the root of every compile: a sequence of statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub stmts: Vec<Spanned<Stmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Let(LetStmt),
    Func(FuncDecl),
    Class(ClassDecl),
    Import(ImportStmt),
    If(IfStmt),
    While(WhileStmt),
    Return(Option<Spanned<Expr>>),
    Block(Block),
    Assign(AssignStmt),
    Expr(Spanned<Expr>),
}

impl Stmt {
    /// Short statement name used in placement diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            Stmt::Let(_) => "let",
            Stmt::Func(_) => "func",
            Stmt::Class(_) => "class",
            Stmt::Import(_) => "import",
            Stmt::If(_) => "if",
            Stmt::While(_) => "while",
            Stmt::Return(_) => "return",
            Stmt::Block(_) => "block",
            Stmt::Assign(_) => "assignment",
            Stmt::Expr(_) => "expression",
        }
    }
}

/// `let name [: Type] [= expr];` — the parser guarantees at least one of
/// the type annotation and the initializer is present.
#[derive(Debug, Clone, PartialEq)]
pub struct LetStmt {
    pub name: Spanned<Ident>,
    pub ty: Option<Spanned<TypeExpr>>,
    pub init: Option<Spanned<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub name: Spanned<Ident>,
    pub params: Vec<Param>,
    pub ret: Spanned<TypeExpr>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Spanned<Ident>,
    pub ty: Spanned<TypeExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: Spanned<Ident>,
    pub body: Vec<Spanned<Stmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportStmt {
    pub name: Spanned<Ident>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub test: Spanned<Expr>,
    pub then_block: Block,
    pub else_block: Option<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub test: Spanned<Expr>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Spanned<Stmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignStmt {
    pub target: Spanned<Expr>,
    pub value: Spanned<Expr>,
}

/// A type annotation in source. Vesna types are simple names.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    pub name: Ident,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Integer(i64),
    Str(String),
    Boolean(bool),
    This,
    Ident(Ident),
    Member {
        base: Box<Spanned<Expr>>,
        member: Spanned<Ident>,
    },
    Call {
        callee: Box<Spanned<Expr>>,
        args: Vec<Spanned<Expr>>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Spanned<Expr>>,
        rhs: Box<Spanned<Expr>>,
    },
}

impl Expr {
    /// Dotted source path of an identifier/member chain (`a`, `io.print`,
    /// `this.x`), if the expression is one.
    pub fn path_text(&self) -> Option<String> {
        match self {
            Expr::Ident(name) => Some(name.clone()),
            Expr::This => Some("this".to_string()),
            Expr::Member { base, member } => {
                let base = base.node.path_text()?;
                Some(format!("{}.{}", base, member.node))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
        }
    }

    /// Comparison operators yield Boolean; the arithmetic ones yield their
    /// operand type.
    pub fn is_comparison(self) -> bool {
        matches!(self, BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge)
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Textual tree form
// ----------------------------------------------------------------------------
// A stable, deterministic rendering of the tree, used by the compiler
// façade accessors and the round-trip tests.
// ============================================================================

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Module([")?;
        write_stmt_list(f, &self.stmts)?;
        write!(f, "])")
    }
}

fn write_stmt_list(f: &mut fmt::Formatter<'_>, stmts: &[Spanned<Stmt>]) -> fmt::Result {
    for (i, stmt) in stmts.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", stmt.node)?;
    }
    Ok(())
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Let(l) => {
                write!(f, "Let(name={}", l.name.node)?;
                if let Some(ty) = &l.ty {
                    write!(f, ", type={}", ty.node.name)?;
                }
                if let Some(init) = &l.init {
                    write!(f, ", init={}", init.node)?;
                }
                write!(f, ")")
            }
            Stmt::Func(func) => write!(f, "{}", func),
            Stmt::Class(class) => {
                write!(f, "Class(name={}, body=[", class.name.node)?;
                write_stmt_list(f, &class.body)?;
                write!(f, "])")
            }
            Stmt::Import(import) => write!(f, "Import({})", import.name.node),
            Stmt::If(stmt) => {
                write!(f, "If(test={}, then={}", stmt.test.node, stmt.then_block)?;
                if let Some(else_block) = &stmt.else_block {
                    write!(f, ", else={}", else_block)?;
                }
                write!(f, ")")
            }
            Stmt::While(stmt) => {
                write!(f, "While(test={}, body={})", stmt.test.node, stmt.body)
            }
            Stmt::Return(expr) => match expr {
                Some(expr) => write!(f, "Return({})", expr.node),
                None => write!(f, "Return()"),
            },
            Stmt::Block(block) => write!(f, "{}", block),
            Stmt::Assign(assign) => {
                write!(f, "Assign(target={}, value={})", assign.target.node, assign.value.node)
            }
            Stmt::Expr(expr) => write!(f, "{}", expr.node),
        }
    }
}

impl fmt::Display for FuncDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Func(name={}, params=[", self.name.node)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", p.name.node, p.ty.node.name)?;
        }
        write!(f, "], ret={}, body={})", self.ret.node.name, self.body)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block([")?;
        write_stmt_list(f, &self.stmts)?;
        write!(f, "])")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Integer(value) => write!(f, "Int({})", value),
            Expr::Str(value) => write!(f, "Str({:?})", value),
            Expr::Boolean(value) => write!(f, "Bool({})", value),
            Expr::This => write!(f, "This"),
            Expr::Ident(name) => write!(f, "Id({})", name),
            Expr::Member { base, member } => {
                write!(f, "Member({}.{})", base.node, member.node)
            }
            Expr::Call { callee, args } => {
                write!(f, "Call({}, [", callee.node)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg.node)?;
                }
                write!(f, "])")
            }
            Expr::Binary { op, lhs, rhs } => {
                write!(f, "Op({} {} {})", lhs.node, op, rhs.node)
            }
        }
    }
}
