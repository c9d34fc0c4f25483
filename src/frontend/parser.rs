//! Recursive-descent parser for Vesna.
//!
//! Consumes the token stream from [`crate::frontend::lexer`] and produces
//! the raw AST. Parsing is single-shot: the first syntax error aborts the
//! compile, matching the fail-fast contract of the analyzer.

use crate::frontend::ast::*;
use crate::frontend::diagnostics::CompileError;
use crate::frontend::lexer::{Token, TokenKind};

/// Parse a token stream into a module.
#[tracing::instrument(skip_all, fields(tokens = tokens.len()))]
pub fn parse(tokens: &[Token]) -> Result<Spanned<Module>, CompileError> {
    Parser::new(tokens).parse()
}

pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parse the entire token stream into a [`Module`].
    pub fn parse(mut self) -> Result<Spanned<Module>, CompileError> {
        let start = self.peek().span;
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::Eof) {
            stmts.push(self.statement()?);
        }
        let span = stmts
            .first()
            .map(|s: &Spanned<Stmt>| s.span)
            .unwrap_or(start)
            .merge(self.peek().span);
        Ok(Spanned::new(Module { stmts }, span))
    }

    // ========================================================================
    // Token helpers
    // ========================================================================

    fn peek(&self) -> &Token {
        // The stream always ends with Eof, which is never consumed.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> &Token {
        let token = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Span, CompileError> {
        if self.check(&kind) {
            Ok(self.advance().span)
        } else {
            Err(self.unexpected(&format!("Expected {}", kind.describe())))
        }
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        let found = self.peek();
        CompileError::syntax(
            format!("{}, found {}", expected, found.kind.describe()),
            found.span,
        )
    }

    fn ident(&mut self) -> Result<Spanned<Ident>, CompileError> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                let span = self.advance().span;
                Ok(Spanned::new(name, span))
            }
            _ => Err(self.unexpected("Expected identifier")),
        }
    }

    fn type_expr(&mut self) -> Result<Spanned<TypeExpr>, CompileError> {
        let name = self.ident()?;
        Ok(Spanned::new(TypeExpr { name: name.node }, name.span))
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn statement(&mut self) -> Result<Spanned<Stmt>, CompileError> {
        let start = self.peek().span;
        let stmt = match self.peek().kind {
            TokenKind::Let => self.let_stmt()?,
            TokenKind::Func => self.func_decl()?,
            TokenKind::Class => self.class_decl()?,
            TokenKind::Import => self.import_stmt()?,
            TokenKind::If => self.if_stmt()?,
            TokenKind::While => self.while_stmt()?,
            TokenKind::Return => self.return_stmt()?,
            TokenKind::LBrace => Stmt::Block(self.block()?),
            _ => self.expr_or_assign()?,
        };
        let end = self.expect(TokenKind::Semi)?;
        Ok(Spanned::new(stmt, start.merge(end)))
    }

    fn let_stmt(&mut self) -> Result<Stmt, CompileError> {
        self.advance(); // let
        let name = self.ident()?;
        let ty = if self.matches(&TokenKind::Colon) {
            Some(self.type_expr()?)
        } else {
            None
        };
        let init = if self.matches(&TokenKind::Assign) {
            Some(self.expression()?)
        } else {
            None
        };
        if ty.is_none() && init.is_none() {
            return Err(CompileError::syntax(
                format!("Variable '{}' needs a type or an initializer", name.node),
                name.span,
            ));
        }
        Ok(Stmt::Let(LetStmt { name, ty, init }))
    }

    fn func_decl(&mut self) -> Result<Stmt, CompileError> {
        self.advance(); // func
        let name = self.ident()?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                let pname = self.ident()?;
                self.expect(TokenKind::Colon)?;
                let ty = self.type_expr()?;
                params.push(Param { name: pname, ty });
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Colon)?;
        let ret = self.type_expr()?;
        let body = self.block()?;
        Ok(Stmt::Func(FuncDecl { name, params, ret, body }))
    }

    fn class_decl(&mut self) -> Result<Stmt, CompileError> {
        self.advance(); // class
        let name = self.ident()?;
        self.expect(TokenKind::LBrace)?;
        let mut body = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.check(&TokenKind::Eof) {
            body.push(self.statement()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Stmt::Class(ClassDecl { name, body }))
    }

    fn import_stmt(&mut self) -> Result<Stmt, CompileError> {
        self.advance(); // import
        let name = self.ident()?;
        Ok(Stmt::Import(ImportStmt { name }))
    }

    fn if_stmt(&mut self) -> Result<Stmt, CompileError> {
        self.advance(); // if
        self.expect(TokenKind::LParen)?;
        let test = self.expression()?;
        self.expect(TokenKind::RParen)?;
        let then_block = self.block()?;
        let else_block = if self.matches(&TokenKind::Else) {
            Some(self.block()?)
        } else {
            None
        };
        Ok(Stmt::If(IfStmt {
            test,
            then_block,
            else_block,
        }))
    }

    fn while_stmt(&mut self) -> Result<Stmt, CompileError> {
        self.advance(); // while
        self.expect(TokenKind::LParen)?;
        let test = self.expression()?;
        self.expect(TokenKind::RParen)?;
        let body = self.block()?;
        Ok(Stmt::While(WhileStmt { test, body }))
    }

    fn return_stmt(&mut self) -> Result<Stmt, CompileError> {
        self.advance(); // return
        let expr = if self.check(&TokenKind::Semi) {
            None
        } else {
            Some(self.expression()?)
        };
        Ok(Stmt::Return(expr))
    }

    fn block(&mut self) -> Result<Block, CompileError> {
        self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.check(&TokenKind::Eof) {
            stmts.push(self.statement()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Block { stmts })
    }

    fn expr_or_assign(&mut self) -> Result<Stmt, CompileError> {
        let expr = self.expression()?;
        if self.matches(&TokenKind::Assign) {
            let value = self.expression()?;
            Ok(Stmt::Assign(AssignStmt {
                target: expr,
                value,
            }))
        } else {
            Ok(Stmt::Expr(expr))
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn expression(&mut self) -> Result<Spanned<Expr>, CompileError> {
        self.comparison()
    }

    /// Comparison is non-associative: `a < b < c` is a syntax-level chain
    /// the grammar does not admit.
    fn comparison(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let lhs = self.additive()?;
        let op = match self.peek().kind {
            TokenKind::Lt => Some(BinOp::Lt),
            TokenKind::Le => Some(BinOp::Le),
            TokenKind::Gt => Some(BinOp::Gt),
            TokenKind::Ge => Some(BinOp::Ge),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let rhs = self.additive()?;
            let span = lhs.span.merge(rhs.span);
            return Ok(Spanned::new(
                Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            ));
        }
        Ok(lhs)
    }

    fn additive(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.term()?;
            let span = lhs.span.merge(rhs.span);
            lhs = Spanned::new(
                Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut lhs = self.postfix()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.postfix()?;
            let span = lhs.span.merge(rhs.span);
            lhs = Spanned::new(
                Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Ok(lhs)
    }

    fn postfix(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut expr = self.primary()?;
        loop {
            if self.matches(&TokenKind::Dot) {
                let member = self.ident()?;
                let span = expr.span.merge(member.span);
                expr = Spanned::new(
                    Expr::Member {
                        base: Box::new(expr),
                        member,
                    },
                    span,
                );
            } else if self.check(&TokenKind::LParen) {
                self.advance();
                let mut args = Vec::new();
                if !self.check(&TokenKind::RParen) {
                    loop {
                        args.push(self.expression()?);
                        if !self.matches(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                let end = self.expect(TokenKind::RParen)?;
                let span = expr.span.merge(end);
                expr = Spanned::new(
                    Expr::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    span,
                );
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Integer(value) => {
                self.advance();
                Ok(Spanned::new(Expr::Integer(value), token.span))
            }
            TokenKind::Str(value) => {
                self.advance();
                Ok(Spanned::new(Expr::Str(value), token.span))
            }
            TokenKind::True => {
                self.advance();
                Ok(Spanned::new(Expr::Boolean(true), token.span))
            }
            TokenKind::False => {
                self.advance();
                Ok(Spanned::new(Expr::Boolean(false), token.span))
            }
            TokenKind::This => {
                self.advance();
                Ok(Spanned::new(Expr::This, token.span))
            }
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Spanned::new(Expr::Ident(name), token.span))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            _ => Err(self.unexpected("Expected expression")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer;

    fn parse_src(source: &str) -> Result<Spanned<Module>, CompileError> {
        parse(&lexer::lex(source)?)
    }

    #[test]
    fn parses_let_forms() {
        let module = parse_src("let a = 5; let b: Integer64; let c: String = \"x\";").unwrap();
        assert_eq!(module.node.stmts.len(), 3);
        assert_eq!(
            module.node.stmts[0].node.to_string(),
            "Let(name=a, init=Int(5))"
        );
        assert_eq!(
            module.node.stmts[1].node.to_string(),
            "Let(name=b, type=Integer64)"
        );
    }

    #[test]
    fn rejects_bare_let() {
        assert!(parse_src("let a;").is_err());
    }

    #[test]
    fn parses_func_with_params() {
        let module = parse_src("func f(a: Integer64, b: String) : Null { return; };").unwrap();
        assert_eq!(
            module.node.stmts[0].node.to_string(),
            "Func(name=f, params=[a:Integer64, b:String], ret=Null, body=Block([Return()]))"
        );
    }

    #[test]
    fn parses_class_body() {
        let module = parse_src("class C { let i = 0; func f() : Null { }; };").unwrap();
        match &module.node.stmts[0].node {
            Stmt::Class(class) => {
                assert_eq!(class.name.node, "C");
                assert_eq!(class.body.len(), 2);
            }
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn parses_precedence() {
        let module = parse_src("let x = a + b * c < d;").unwrap();
        assert_eq!(
            module.node.stmts[0].node.to_string(),
            "Let(name=x, init=Op(Op(Id(a) + Op(Id(b) * Id(c))) < Id(d)))"
        );
    }

    #[test]
    fn parses_member_call_chain() {
        let module = parse_src("io.print(42);").unwrap();
        assert_eq!(
            module.node.stmts[0].node.to_string(),
            "Call(Member(Id(io).print), [Int(42)])"
        );
    }

    #[test]
    fn parses_if_else_and_while() {
        let module = parse_src("func f() : Null { if (true) {} else {}; while (false) {}; };").unwrap();
        match &module.node.stmts[0].node {
            Stmt::Func(func) => assert_eq!(func.body.stmts.len(), 2),
            other => panic!("expected func, got {:?}", other),
        }
    }

    #[test]
    fn parses_assignment_statement() {
        let module = parse_src("a = b + 1;").unwrap();
        assert_eq!(
            module.node.stmts[0].node.to_string(),
            "Assign(target=Id(a), value=Op(Id(b) + Int(1)))"
        );
    }

    #[test]
    fn requires_semicolon_after_compound_statements() {
        assert!(parse_src("class C { }").is_err());
        assert!(parse_src("func f() : Null { }").is_err());
        assert!(parse_src("class C { };").is_ok());
    }

    #[test]
    fn control_flow_is_not_an_expression() {
        assert!(parse_src("let a = while(true) {};").is_err());
        assert!(parse_src("let a = if(true) {};").is_err());
    }
}
