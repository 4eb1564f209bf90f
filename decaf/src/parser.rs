//! Hand-written recursive-descent statement parser and precedence-climbing
//! expression parser. Builds the AST directly, with the scope side-effects
//! (`declare`/`lookup`) happening as each node is constructed, matching the
//! data flow "lexer -> parser -> AST (with scope side-effects)". Kept thin
//! relative to the AST/visitor core, per the out-of-scope framing this
//! parser sits under.
//!
//! Function/class/interface lowering and the builtin I/O/allocation forms
//! (`Print`, `ReadInteger`, `ReadLine`, `new`, `NewArray`) have no AST
//! variant in this crate (see DESIGN.md) — their tokens are recognized so
//! the lexer doesn't choke on the reserved words, but the parser rejects
//! them as syntax errors, the same way class/interface already are.

use crate::ast::{Ast, NodeId, NodeKind};
use crate::error::{Diagnostics, ParseError, Warning};
use crate::scope::{MemKind, ScopeTree};
use crate::tables::op_priority;
use crate::token::{Token, TokenKind};

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    ast: &'a mut Ast,
    scope: &'a mut ScopeTree,
    diag: &'a mut Diagnostics,
}

const UNIMPLEMENTED_KEYWORDS: &[TokenKind] = &[
    TokenKind::Class,
    TokenKind::Interface,
    TokenKind::Extends,
    TokenKind::Implements,
    TokenKind::This,
    TokenKind::New,
    TokenKind::NewArray,
    TokenKind::Print,
    TokenKind::ReadInteger,
    TokenKind::ReadLine,
];

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, ast: &'a mut Ast, scope: &'a mut ScopeTree, diag: &'a mut Diagnostics) -> Parser<'a> {
        Parser {
            tokens,
            pos: 0,
            ast,
            scope,
            diag,
        }
    }

    fn cur(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.cur().kind == kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.cur().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    /// Consumes `kind` or reports an error and recovers to the next `;`,
    /// tracking brace depth the same way the original's `panicModeFwd`
    /// does.
    fn expect(&mut self, kind: TokenKind) -> Token {
        if self.at(kind) {
            self.advance()
        } else {
            let found = self.cur().clone();
            self.diag.parse_error(ParseError::UnexpectedToken {
                found: found.lexeme.clone(),
                expected: kind.to_string(),
                line: found.line,
                col: found.col,
            });
            self.panic_mode_recover();
            found
        }
    }

    /// Skips tokens up to and including the next `;`, or to EOF, tracking
    /// `{`/`}` nesting so block depth stays consistent for the caller.
    fn panic_mode_recover(&mut self) -> i32 {
        let mut depth = 0;
        while !self.at(TokenKind::Eof) && !self.at(TokenKind::Semicolon) {
            match self.cur().kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => depth -= 1,
                _ => {}
            }
            self.advance();
        }
        if self.at(TokenKind::Semicolon) {
            self.advance();
        }
        depth
    }

    pub fn parse_program(&mut self) -> NodeId {
        let mut stmts = Vec::new();
        while !self.at(TokenKind::Eof) {
            stmts.push(self.parse_statement());
        }
        let (line, col) = (self.cur().line, self.cur().col);
        let frame = self.scope.current();
        stmts.push(self.ast.make_eob(line, col, frame));
        self.ast.make_block(stmts, line, col, frame)
    }

    fn parse_statement(&mut self) -> NodeId {
        match self.cur().kind {
            TokenKind::IntType | TokenKind::DoubleType | TokenKind::BoolType => self.parse_var_decl(),
            TokenKind::If => self.parse_if(false),
            TokenKind::For => self.parse_for(),
            TokenKind::While => self.parse_while(),
            TokenKind::Break => self.parse_break(),
            TokenKind::Continue => self.parse_continue(),
            TokenKind::LBrace => self.parse_block(),
            TokenKind::Semicolon => {
                self.advance();
                let frame = self.scope.current();
                self.ast.make_nop(self.cur().line, self.cur().col, frame)
            }
            ref k if UNIMPLEMENTED_KEYWORDS.contains(k) => {
                let tok = self.advance();
                self.diag.parse_error(ParseError::UnexpectedToken {
                    found: tok.lexeme.clone(),
                    expected: "a supported statement".to_owned(),
                    line: tok.line,
                    col: tok.col,
                });
                self.panic_mode_recover();
                let frame = self.scope.current();
                self.ast.make_nop(tok.line, tok.col, frame)
            }
            _ => self.parse_expr_statement(),
        }
    }

    fn parse_block(&mut self) -> NodeId {
        let open = self.expect(TokenKind::LBrace);
        self.scope.open_scope();
        let mut stmts = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            stmts.push(self.parse_statement());
        }
        let close = self.expect(TokenKind::RBrace);
        let frame = self.scope.current();
        stmts.push(self.ast.make_eob(close.line, close.col, frame));
        self.scope.close_scope();
        self.ast.make_block(stmts, open.line, open.col, frame)
    }

    fn type_name(&self, kind: TokenKind) -> &'static str {
        match kind {
            TokenKind::IntType => "int",
            TokenKind::DoubleType => "double",
            TokenKind::BoolType => "bool",
            _ => "int",
        }
    }

    fn parse_var_decl(&mut self) -> NodeId {
        let ty_tok = self.advance();
        let ty = self.type_name(ty_tok.kind);
        let name_tok = self.expect(TokenKind::Identifier);
        let name = name_tok.lexeme.clone();
        let frame = self.scope.current();

        if !self.at(TokenKind::LBracket) {
            self.expect(TokenKind::Semicolon);
            let width = crate::tables::type_width(ty);
            let decl = self.ast.make_var_decl(&name, ty, width, ty_tok.line, ty_tok.col, frame);
            if self.scope.lookup(frame, &name).is_some() {
                self.diag.warn(Warning::Shadowed {
                    name: name.clone(),
                    line: name_tok.line,
                    col: name_tok.col,
                });
            }
            if !self.scope.declare(&name, decl, ty, MemKind::Stack, width) {
                self.diag.parse_error(ParseError::Redefined {
                    name,
                    line: name_tok.line,
                    col: name_tok.col,
                });
            }
            return decl;
        }

        let mut dims = Vec::new();
        let mut all_literal = true;
        while self.at(TokenKind::LBracket) {
            self.advance();
            let dim = self.parse_expr();
            if !matches!(self.ast.get(dim).kind, crate::ast::NodeKind::IntLit(_)) {
                all_literal = false;
            }
            dims.push(dim);
            self.expect(TokenKind::RBracket);
        }
        self.expect(TokenKind::Semicolon);

        let elem_width = crate::tables::type_width(ty);
        let width = if all_literal {
            dims.iter().fold(elem_width, |acc, &d| {
                if let crate::ast::NodeKind::IntLit(n) = self.ast.get(d).kind {
                    acc * (n as i32)
                } else {
                    acc
                }
            })
        } else {
            elem_width
        };

        let decl = self
            .ast
            .make_array_var_decl(&name, ty, dims, elem_width, ty_tok.line, ty_tok.col, frame);
        if self.scope.lookup(frame, &name).is_some() {
            self.diag.warn(Warning::Shadowed {
                name: name.clone(),
                line: name_tok.line,
                col: name_tok.col,
            });
        }
        // a runtime-sized array's footprint isn't known until its dimension
        // expressions are evaluated, so it lives on the heap rather than at
        // a fixed stack offset.
        let mem_kind = if all_literal { MemKind::Stack } else { MemKind::Heap };
        if !self.scope.declare(&name, decl, ty, mem_kind, width) {
            self.diag.parse_error(ParseError::Redefined {
                name,
                line: name_tok.line,
                col: name_tok.col,
            });
        }
        decl
    }

    fn parse_if(&mut self, is_else_if: bool) -> NodeId {
        let tok = self.expect(TokenKind::If);
        self.expect(TokenKind::LParen);
        let cond = self.parse_expr();
        self.expect(TokenKind::RParen);
        let then_branch = self.parse_statement();
        let else_branch = if self.at(TokenKind::Else) {
            let else_tok = self.advance();
            Some(if self.at(TokenKind::If) {
                self.parse_if(true)
            } else {
                let body = self.parse_statement();
                let frame = self.scope.current();
                self.ast.make_else(body, else_tok.line, else_tok.col, frame)
            })
        } else {
            None
        };
        let frame = self.scope.current();
        self.ast
            .make_if(cond, then_branch, else_branch, is_else_if, tok.line, tok.col, frame)
    }

    fn parse_for(&mut self) -> NodeId {
        let tok = self.expect(TokenKind::For);
        self.expect(TokenKind::LParen);
        let init = if !self.at(TokenKind::Semicolon) { Some(self.parse_expr()) } else { None };
        self.expect(TokenKind::Semicolon);
        let cond = if !self.at(TokenKind::Semicolon) { Some(self.parse_expr()) } else { None };
        self.expect(TokenKind::Semicolon);
        let step = if !self.at(TokenKind::RParen) { Some(self.parse_expr()) } else { None };
        self.expect(TokenKind::RParen);
        let body = self.parse_statement();
        let frame = self.scope.current();
        self.ast.make_for(init, cond, step, body, tok.line, tok.col, frame)
    }

    fn parse_while(&mut self) -> NodeId {
        let tok = self.expect(TokenKind::While);
        self.expect(TokenKind::LParen);
        let cond = self.parse_expr();
        self.expect(TokenKind::RParen);
        let body = self.parse_statement();
        let frame = self.scope.current();
        self.ast.make_for(None, Some(cond), None, body, tok.line, tok.col, frame)
    }

    fn parse_break(&mut self) -> NodeId {
        let tok = self.expect(TokenKind::Break);
        self.expect(TokenKind::Semicolon);
        let frame = self.scope.current();
        self.ast.make_break(tok.line, tok.col, frame)
    }

    fn parse_continue(&mut self) -> NodeId {
        let tok = self.expect(TokenKind::Continue);
        self.expect(TokenKind::Semicolon);
        let frame = self.scope.current();
        self.ast.make_cont(tok.line, tok.col, frame)
    }

    fn parse_expr_statement(&mut self) -> NodeId {
        let expr = self.parse_expr();
        self.expect(TokenKind::Semicolon);
        expr
    }

    // --- expressions ---

    fn parse_expr(&mut self) -> NodeId {
        self.parse_assign()
    }

    fn parse_assign(&mut self) -> NodeId {
        let lhs = self.parse_binary(0);
        if self.at(TokenKind::Assign) {
            let tok = self.advance();
            let rhs = self.parse_assign();
            // `parse_primary` already reported `Undeclared` for `lhs` if it
            // isn't bound in scope; only mark it initialized here, never
            // report it a second time.
            if let crate::ast::NodeKind::Id { name, initialized, .. } = &self.ast.get(lhs).kind {
                if self.scope.lookup(self.scope.current(), name).is_some() {
                    initialized.set(true);
                }
            }
            let frame = self.scope.current();
            return self.ast.make_assign(lhs, Some(rhs), None, tok.line, tok.col, frame);
        }
        lhs
    }

    /// Precedence-climbing over the shared `op_priority` table (§3 Tables):
    /// the same bands the expression grammar has always used.
    fn parse_binary(&mut self, min_prec: i32) -> NodeId {
        let mut lhs = self.parse_unary();
        loop {
            let op = self.cur().kind;
            let prec = op_priority(op);
            if prec < 0 || prec < min_prec {
                break;
            }
            let tok = self.advance();
            let rhs = self.parse_binary(prec + 1);
            let frame = self.scope.current();
            lhs = match op {
                TokenKind::OrOr => self.ast.make_or(lhs, rhs, tok.line, tok.col, frame),
                TokenKind::AndAnd => self.ast.make_and(lhs, rhs, tok.line, tok.col, frame),
                TokenKind::EqualEqual | TokenKind::NotEqual | TokenKind::Less | TokenKind::LessEqual | TokenKind::Greater | TokenKind::GreaterEqual => {
                    self.ast.make_rel(op, lhs, rhs, tok.line, tok.col, frame)
                }
                _ => self.ast.make_arith(op, lhs, rhs, tok.line, tok.col, frame),
            };
        }
        lhs
    }

    fn parse_unary(&mut self) -> NodeId {
        let frame = self.scope.current();
        match self.cur().kind {
            TokenKind::Bang => {
                let tok = self.advance();
                let operand = self.parse_unary();
                self.ast.make_not(operand, tok.line, tok.col, frame)
            }
            TokenKind::Minus => {
                let tok = self.advance();
                let operand = self.parse_unary();
                self.ast.make_unary_arith(TokenKind::Minus, operand, tok.line, tok.col, frame)
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> NodeId {
        if self.at(TokenKind::Plus) && self.peek_is_double_plus() {
            return self.parse_pre_incr(1);
        }
        if self.at(TokenKind::Minus) && self.peek_is_double_minus() {
            return self.parse_pre_incr(-1);
        }
        let mut node = self.parse_primary();
        loop {
            if self.at(TokenKind::Plus) && self.peek_is_double_plus() {
                let tok = self.advance();
                self.advance();
                let frame = self.scope.current();
                node = self.make_post_incr(node, 1, tok.line, tok.col, frame);
            } else if self.at(TokenKind::Minus) && self.peek_is_double_minus() {
                let tok = self.advance();
                self.advance();
                let frame = self.scope.current();
                node = self.make_post_incr(node, -1, tok.line, tok.col, frame);
            } else {
                break;
            }
        }
        node
    }

    /// Dispatches to the array-subscript or plain-identifier increment
    /// variant depending on what `parse_primary` actually produced.
    fn make_post_incr(&mut self, base: NodeId, delta: i64, line: u32, col: u32, frame: crate::scope::FrameId) -> NodeId {
        if matches!(self.ast.get(base).kind, NodeKind::ArrayId { .. }) {
            self.ast.make_post_incr_array_id(base, delta, line, col, frame)
        } else {
            self.ast.make_post_incr_id(base, delta, line, col, frame)
        }
    }

    fn make_pre_incr(&mut self, base: NodeId, delta: i64, line: u32, col: u32, frame: crate::scope::FrameId) -> NodeId {
        if matches!(self.ast.get(base).kind, NodeKind::ArrayId { .. }) {
            self.ast.make_pre_incr_array_id(base, delta, line, col, frame)
        } else {
            self.ast.make_pre_incr_id(base, delta, line, col, frame)
        }
    }

    fn peek_is_double_plus(&self) -> bool {
        self.tokens.get(self.pos + 1).map_or(false, |t| t.kind == TokenKind::Plus)
    }

    fn peek_is_double_minus(&self) -> bool {
        self.tokens.get(self.pos + 1).map_or(false, |t| t.kind == TokenKind::Minus)
    }

    fn parse_pre_incr(&mut self, delta: i64) -> NodeId {
        let tok = self.advance();
        self.advance();
        let base = self.parse_postfix();
        let frame = self.scope.current();
        self.make_pre_incr(base, delta, tok.line, tok.col, frame)
    }

    fn parse_primary(&mut self) -> NodeId {
        let tok = self.cur().clone();
        let frame = self.scope.current();
        match tok.kind {
            TokenKind::IntConstant => {
                self.advance();
                let v = match tok.value {
                    Some(crate::token::LiteralValue::Int(v)) => v,
                    _ => 0,
                };
                self.ast.make_int_lit(v, tok.line, tok.col, frame)
            }
            TokenKind::DoubleConstant => {
                self.advance();
                let v = match tok.value {
                    Some(crate::token::LiteralValue::Double(v)) => v,
                    _ => 0.0,
                };
                self.ast.make_flt_lit(v, tok.line, tok.col, frame)
            }
            TokenKind::True => {
                self.advance();
                self.ast.make_int_lit(1, tok.line, tok.col, frame)
            }
            TokenKind::False => {
                self.advance();
                self.ast.make_int_lit(0, tok.line, tok.col, frame)
            }
            TokenKind::StringConstant => {
                self.advance();
                self.ast.make_str_lit(&tok.lexeme, tok.line, tok.col, frame)
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr();
                self.expect(TokenKind::RParen);
                inner
            }
            TokenKind::Identifier => {
                self.advance();
                let decl = self.scope.lookup(frame, &tok.lexeme);
                if decl.is_none() {
                    self.diag.parse_error(ParseError::Undeclared {
                        name: tok.lexeme.clone(),
                        line: tok.line,
                        col: tok.col,
                    });
                }
                let id = self.ast.make_id(&tok.lexeme, tok.line, tok.col, frame);
                if self.at(TokenKind::LBracket) {
                    let mut dims = Vec::new();
                    let mut all_literal = true;
                    while self.at(TokenKind::LBracket) {
                        self.advance();
                        let dim = self.parse_expr();
                        if !matches!(self.ast.get(dim).kind, crate::ast::NodeKind::IntLit(_)) {
                            all_literal = false;
                        }
                        dims.push(dim);
                        self.expect(TokenKind::RBracket);
                    }
                    let base_decl = decl.map(|(n, _)| n).unwrap_or(id);
                    self.ast.make_array_id(base_decl, dims, all_literal, tok.line, tok.col, frame)
                } else {
                    id
                }
            }
            _ => {
                self.diag.parse_error(ParseError::UnexpectedToken {
                    found: tok.lexeme.clone(),
                    expected: "an expression".to_owned(),
                    line: tok.line,
                    col: tok.col,
                });
                self.advance();
                self.ast.make_nop(tok.line, tok.col, frame)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Diagnostics;
    use crate::lexer::Lexer;

    fn parse(src: &str) -> (Ast, ScopeTree, Diagnostics, NodeId) {
        let mut diag = Diagnostics::new();
        let tokens = Lexer::new(src).tokenize(&mut diag);
        let mut ast = Ast::new();
        let mut scope = ScopeTree::new();
        let root = {
            let mut parser = Parser::new(tokens, &mut ast, &mut scope, &mut diag);
            parser.parse_program()
        };
        (ast, scope, diag, root)
    }

    #[test]
    fn declares_and_assigns_without_errors() {
        let (_, _, diag, _) = parse("int a; a = 3 + 4;");
        assert_eq!(diag.parse_error_count(), 0);
    }

    #[test]
    fn undeclared_identifier_is_reported() {
        let (_, _, diag, _) = parse("a = 1;");
        assert_eq!(diag.parse_error_count(), 1);
    }

    #[test]
    fn redeclaration_in_same_scope_is_reported() {
        let (_, _, diag, _) = parse("int a; int a;");
        assert_eq!(diag.parse_error_count(), 1);
    }

    #[test]
    fn if_else_parses_to_an_if_node() {
        let (ast, _, diag, root) = parse("int a; if (a < 5) a = 0; else a = 1;");
        assert_eq!(diag.parse_error_count(), 0);
        if let crate::ast::NodeKind::Block { stmts } = &ast.get(root).kind {
            assert!(matches!(ast.get(stmts[1]).kind, crate::ast::NodeKind::If { .. }));
        } else {
            panic!("expected a block");
        }
    }
}
