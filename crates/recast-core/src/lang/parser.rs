//! Recursive-descent parser for the reference frontend

use super::lexer::{lex, Token, TokenKind};
use super::SourceParser;
use crate::tree::{NodeId, NodeKind, SyntaxTree};
use crate::{RecastError, Result};

/// Stateless parser for `.rcs` source
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptParser;

impl SourceParser for ScriptParser {
    fn parse(&self, text: &str) -> Result<SyntaxTree> {
        let tokens = lex(text)?;
        let mut state = ParserState {
            tokens,
            pos: 0,
            tree: SyntaxTree::new(),
        };
        state.parse_module()?;
        Ok(state.tree)
    }
}

struct ParserState {
    tokens: Vec<Token>,
    pos: usize,
    tree: SyntaxTree,
}

impl ParserState {
    fn parse_module(&mut self) -> Result<()> {
        let module = self.tree.add(NodeKind::Module);
        self.tree.set_root(module);

        while self.peek().is_some() {
            let item = match self.peek_kind() {
                Some(TokenKind::KwClass) => self.parse_class()?,
                Some(TokenKind::KwFn) => self.parse_fn()?,
                _ => self.parse_stmt()?,
            };
            self.tree.attach(module, item)?;
        }
        Ok(())
    }

    fn parse_class(&mut self) -> Result<NodeId> {
        self.expect(TokenKind::KwClass)?;
        let name = self.expect(TokenKind::Ident)?.text;
        let class = self.tree.add_with_text(NodeKind::ClassDecl, name);
        self.expect(TokenKind::LBrace)?;
        while self.peek_kind() != Some(TokenKind::RBrace) {
            let member = self.parse_const_decl()?;
            self.tree.attach(class, member)?;
        }
        self.expect(TokenKind::RBrace)?;
        Ok(class)
    }

    fn parse_const_decl(&mut self) -> Result<NodeId> {
        self.expect(TokenKind::KwConst)?;
        let name = self.expect(TokenKind::Ident)?.text;
        let decl = self.tree.add_with_text(NodeKind::ConstDecl, name);
        self.expect(TokenKind::Eq)?;
        let value = self.parse_expr()?;
        self.tree.attach(decl, value)?;
        self.expect(TokenKind::Semi)?;
        Ok(decl)
    }

    fn parse_fn(&mut self) -> Result<NodeId> {
        self.expect(TokenKind::KwFn)?;
        let name = self.expect(TokenKind::Ident)?.text;
        let func = self.tree.add_with_text(NodeKind::FnDecl, name);

        let params = self.tree.add(NodeKind::ParamList);
        self.expect(TokenKind::LParen)?;
        if self.peek_kind() != Some(TokenKind::RParen) {
            loop {
                let param = self.expect(TokenKind::Ident)?.text;
                let ident = self.tree.add_with_text(NodeKind::Ident, param);
                self.tree.attach(params, ident)?;
                if self.peek_kind() == Some(TokenKind::Comma) {
                    self.bump();
                    continue;
                }
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        self.tree.attach(func, params)?;

        let body = self.parse_block()?;
        self.tree.attach(func, body)?;
        Ok(func)
    }

    fn parse_block(&mut self) -> Result<NodeId> {
        let block = self.tree.add(NodeKind::Block);
        self.expect(TokenKind::LBrace)?;
        while self.peek_kind() != Some(TokenKind::RBrace) {
            let stmt = self.parse_stmt()?;
            self.tree.attach(block, stmt)?;
        }
        self.expect(TokenKind::RBrace)?;
        Ok(block)
    }

    fn parse_stmt(&mut self) -> Result<NodeId> {
        match self.peek_kind() {
            Some(TokenKind::Semi) => {
                self.bump();
                Ok(self.tree.add(NodeKind::EmptyStmt))
            }
            Some(TokenKind::KwLet) => {
                self.bump();
                let name = self.expect(TokenKind::Ident)?.text;
                let stmt = self.tree.add_with_text(NodeKind::LetStmt, name);
                self.expect(TokenKind::Eq)?;
                let value = self.parse_expr()?;
                self.tree.attach(stmt, value)?;
                self.expect(TokenKind::Semi)?;
                Ok(stmt)
            }
            Some(TokenKind::KwReturn) => {
                self.bump();
                let stmt = self.tree.add(NodeKind::ReturnStmt);
                let value = self.parse_expr()?;
                self.tree.attach(stmt, value)?;
                self.expect(TokenKind::Semi)?;
                Ok(stmt)
            }
            _ => {
                let stmt = self.tree.add(NodeKind::ExprStmt);
                let value = self.parse_expr()?;
                self.tree.attach(stmt, value)?;
                self.expect(TokenKind::Semi)?;
                Ok(stmt)
            }
        }
    }

    /// `term ('+' term)*`
    fn parse_expr(&mut self) -> Result<NodeId> {
        let mut lhs = self.parse_term()?;
        while self.peek_kind() == Some(TokenKind::Plus) {
            self.bump();
            let rhs = self.parse_term()?;
            let binary = self.tree.add_with_text(NodeKind::Binary, "+");
            self.tree.attach(binary, lhs)?;
            self.tree.attach(binary, rhs)?;
            lhs = binary;
        }
        Ok(lhs)
    }

    /// `factor ('*' factor)*`
    fn parse_term(&mut self) -> Result<NodeId> {
        let mut lhs = self.parse_factor()?;
        while self.peek_kind() == Some(TokenKind::Star) {
            self.bump();
            let rhs = self.parse_factor()?;
            let binary = self.tree.add_with_text(NodeKind::Binary, "*");
            self.tree.attach(binary, lhs)?;
            self.tree.attach(binary, rhs)?;
            lhs = binary;
        }
        Ok(lhs)
    }

    fn parse_factor(&mut self) -> Result<NodeId> {
        match self.peek_kind() {
            Some(TokenKind::Int) => {
                let token = self.bump();
                Ok(self.tree.add_with_text(NodeKind::IntLit, token.text))
            }
            Some(TokenKind::Str) => {
                let token = self.bump();
                Ok(self.tree.add_with_text(NodeKind::StringLit, token.text))
            }
            Some(TokenKind::LParen) => {
                self.bump();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            Some(TokenKind::Ident) => {
                let name = self.bump().text;
                match self.peek_kind() {
                    Some(TokenKind::ColonColon) => {
                        self.bump();
                        let member = self.expect(TokenKind::Ident)?.text;
                        let fetch = self.tree.add(NodeKind::ClassConstFetch);
                        let class = self.tree.add_with_text(NodeKind::Ident, name);
                        let member = self.tree.add_with_text(NodeKind::Ident, member);
                        self.tree.attach(fetch, class)?;
                        self.tree.attach(fetch, member)?;
                        Ok(fetch)
                    }
                    Some(TokenKind::LParen) => {
                        self.bump();
                        let call = self.tree.add_with_text(NodeKind::Call, name);
                        if self.peek_kind() != Some(TokenKind::RParen) {
                            loop {
                                let arg = self.parse_expr()?;
                                self.tree.attach(call, arg)?;
                                if self.peek_kind() == Some(TokenKind::Comma) {
                                    self.bump();
                                    continue;
                                }
                                break;
                            }
                        }
                        self.expect(TokenKind::RParen)?;
                        Ok(call)
                    }
                    _ => Ok(self.tree.add_with_text(NodeKind::Ident, name)),
                }
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        self.pos += 1;
        token
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        match self.peek_kind() {
            Some(found) if found == kind => Ok(self.bump()),
            _ => Err(self.unexpected(&format!("{kind:?}"))),
        }
    }

    fn unexpected(&self, wanted: &str) -> RecastError {
        match self.peek() {
            Some(token) => RecastError::parse_error(
                format!("expected {wanted}, found '{}'", token.text),
                token.line,
                token.col,
            ),
            None => {
                let (line, col) = self
                    .tokens
                    .last()
                    .map(|t| (t.line, t.col))
                    .unwrap_or((1, 1));
                RecastError::parse_error(format!("expected {wanted}, found end of input"), line, col)
            }
        }
    }
}
