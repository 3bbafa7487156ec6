//! Recursive descent parser for Covenant.
//!
//! Transforms the flat token stream from the lexer into an immutable AST.
//! Hand-written for clear diagnostics — the first error aborts with a
//! located message; there is no recovery.
//!
//! Grammar reference (simplified EBNF):
//!
//! ```text
//! program        ::= file_header? (contract_def | type_def | shared_decl)*
//! file_header    ::= intent_block? scope_decl? risk_decl? requires_decl?
//! contract_def   ::= 'contract' NAME '(' params ')' '->' type_expr NEWLINE
//!                    INDENT sections DEDENT
//! sections       ::= (precondition | postcondition | effects | permissions
//!                    | body | on_failure)*      -- any order, each at most once
//! ```

mod contract;
mod decl;
mod expr;

#[cfg(test)]
mod tests;

pub use contract::ContractParsing;
pub use decl::DeclParsing;
pub use expr::ExprParsing;

use crate::ast::{FileHeader, IntentBlock, Program, RequiresDecl, RiskDecl, RiskLevel, ScopeDecl};
use crate::error::ParseError;
use crate::token::{SourceLocation, Token, TokenKind};

pub type ParseResult<T> = Result<T, ParseError>;

/// Recursive descent parser over a lexed token stream.
///
/// ```
/// use covenant::lexer::Lexer;
/// use covenant::parser::Parser;
///
/// let tokens = Lexer::new("risk: low\n", "example.cov").tokenize().unwrap();
/// let program = Parser::new(tokens).parse().unwrap();
/// assert!(program.header.is_some());
/// ```
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// The token stream must be non-empty and EOF-terminated, which the
    /// lexer guarantees.
    pub fn new(tokens: Vec<Token>) -> Self {
        debug_assert!(!tokens.is_empty(), "token stream must end with EOF");
        Parser { tokens, pos: 0 }
    }

    /// Parse the entire token stream into a [`Program`].
    pub fn parse(&mut self) -> ParseResult<Program> {
        let header = self.parse_file_header()?;
        let mut contracts = Vec::new();
        let mut type_defs = Vec::new();
        let mut shared_decls = Vec::new();

        while !self.at_end() {
            self.skip_newlines();
            if self.at_end() {
                break;
            }

            if self.check(TokenKind::Contract) {
                contracts.push(self.parse_contract_def()?);
            } else if self.check(TokenKind::Type) {
                type_defs.push(self.parse_type_def()?);
            } else if self.check(TokenKind::Shared) {
                shared_decls.push(self.parse_shared_decl()?);
            } else if self.check(TokenKind::Eof) {
                break;
            } else {
                return Err(self.error(format!(
                    "Expected 'contract', 'type', or 'shared' at top level, got {}",
                    self.current().kind.name()
                )));
            }
        }

        Ok(Program {
            loc: self.loc(),
            header,
            contracts,
            type_defs,
            shared_decls,
        })
    }

    // ========================================================================
    // File header
    // ========================================================================

    /// Parse the optional file header: `intent`, `scope`, `risk`, `requires`
    /// — in that order, each optional.
    fn parse_file_header(&mut self) -> ParseResult<Option<FileHeader>> {
        self.skip_newlines();
        let loc = self.loc();

        let mut intent = None;
        let mut scope = None;
        let mut risk = None;
        let mut requires = None;

        if self.check(TokenKind::Intent) {
            intent = Some(self.parse_intent_block()?);
            self.skip_newlines();
        }

        if self.check(TokenKind::Scope) {
            scope = Some(self.parse_scope_decl()?);
            self.skip_newlines();
        }

        if self.check(TokenKind::Risk) {
            risk = Some(self.parse_risk_decl()?);
            self.skip_newlines();
        }

        if self.check(TokenKind::Requires) {
            requires = Some(self.parse_requires_decl()?);
            self.skip_newlines();
        }

        if intent.is_none() && scope.is_none() && risk.is_none() && requires.is_none() {
            return Ok(None);
        }

        Ok(Some(FileHeader {
            loc,
            intent,
            scope,
            risk,
            requires,
        }))
    }

    fn parse_intent_block(&mut self) -> ParseResult<IntentBlock> {
        let loc = self.loc();
        self.expect(TokenKind::Intent)?;
        self.expect(TokenKind::Colon)?;
        let text_token = self.expect(TokenKind::Str)?;
        Ok(IntentBlock {
            loc,
            text: text_token.value,
        })
    }

    fn parse_scope_decl(&mut self) -> ParseResult<ScopeDecl> {
        let loc = self.loc();
        self.expect(TokenKind::Scope)?;
        self.expect(TokenKind::Colon)?;
        let path = self.parse_dotted_name()?;
        Ok(ScopeDecl { loc, path })
    }

    fn parse_risk_decl(&mut self) -> ParseResult<RiskDecl> {
        let loc = self.loc();
        self.expect(TokenKind::Risk)?;
        self.expect(TokenKind::Colon)?;

        let level = match self.current().kind {
            TokenKind::Low => RiskLevel::Low,
            TokenKind::Medium => RiskLevel::Medium,
            TokenKind::High => RiskLevel::High,
            TokenKind::Critical => RiskLevel::Critical,
            _ => {
                return Err(self.error(format!(
                    "Expected risk level (low, medium, high, critical), got '{}'",
                    self.current().value
                )));
            }
        };
        self.advance();
        Ok(RiskDecl { loc, level })
    }

    fn parse_requires_decl(&mut self) -> ParseResult<RequiresDecl> {
        let loc = self.loc();
        self.expect(TokenKind::Requires)?;
        self.expect(TokenKind::Colon)?;
        let capabilities = self.parse_bracketed_list(Parser::parse_dotted_name)?;
        Ok(RequiresDecl { loc, capabilities })
    }

    // ========================================================================
    // Shared low-level parsers
    // ========================================================================

    /// Parse a dotted identifier path like `finance.transfers`.
    ///
    /// Keywords are allowed in identifier positions: names like
    /// `ledger.access` or `auth.grants` use words that are also keywords.
    fn parse_dotted_name(&mut self) -> ParseResult<String> {
        let mut parts = vec![self.expect_name()?.value];
        while self.check(TokenKind::Dot) {
            self.advance();
            parts.push(self.expect_name()?.value);
        }
        Ok(parts.join("."))
    }

    /// Parse `[item, item, ...]` with the given item parser. Allows a
    /// trailing comma.
    fn parse_bracketed_list<T>(
        &mut self,
        mut item: impl FnMut(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<Vec<T>> {
        self.expect(TokenKind::LBracket)?;
        let mut items = Vec::new();
        if !self.check(TokenKind::RBracket) {
            items.push(item(self)?);
            while self.check(TokenKind::Comma) {
                self.advance();
                if self.check(TokenKind::RBracket) {
                    break;
                }
                items.push(item(self)?);
            }
        }
        self.expect(TokenKind::RBracket)?;
        Ok(items)
    }

    // ========================================================================
    // Token stream helpers
    // ========================================================================

    fn current(&self) -> &Token {
        // Clamp to the trailing EOF token
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        self.pos += 1;
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        let tok = self.current();
        if tok.kind != kind {
            return Err(self.error(format!(
                "Expected {}, got {} ('{}')",
                kind.name(),
                tok.kind.name(),
                tok.value
            )));
        }
        Ok(self.advance())
    }

    /// Consume an IDENTIFIER or a soft keyword used in identifier position.
    fn expect_name(&mut self) -> ParseResult<Token> {
        let tok = self.current();
        if tok.kind == TokenKind::Identifier || tok.kind.is_soft_keyword() {
            return Ok(self.advance());
        }
        Err(self.error(format!(
            "Expected identifier, got {} ('{}')",
            tok.kind.name(),
            tok.value
        )))
    }

    fn peek_kind(&self, offset: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| t.kind)
    }

    fn at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    /// Build a [`SourceLocation`] from the current token.
    fn loc(&self) -> SourceLocation {
        self.current().location()
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.current().clone())
    }
}
