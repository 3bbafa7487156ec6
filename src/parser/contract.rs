//! Contract definitions, their sections, and statements.

use super::{ExprParsing, ParseResult, Parser};
use crate::ast::{
    Body, ContractDef, DeniesPermission, EffectDecl, Effects, EscalationPolicy, Expr,
    GrantsPermission, OnFailure, Param, PermissionsBlock, Postcondition, Precondition, Statement,
};
use crate::error::ParseError;
use crate::token::{Token, TokenKind};

pub trait ContractParsing {
    fn parse_contract_def(&mut self) -> ParseResult<ContractDef>;
    fn parse_precondition(&mut self) -> ParseResult<Precondition>;
    fn parse_postcondition(&mut self) -> ParseResult<Postcondition>;
    fn parse_effects(&mut self) -> ParseResult<Effects>;
    fn parse_permissions(&mut self) -> ParseResult<PermissionsBlock>;
    fn parse_body(&mut self) -> ParseResult<Body>;
    fn parse_on_failure(&mut self) -> ParseResult<OnFailure>;
    fn parse_statement_block(&mut self) -> ParseResult<Vec<Statement>>;
    fn parse_statement(&mut self) -> ParseResult<Statement>;
    fn parse_if_stmt(&mut self) -> ParseResult<Statement>;
    fn parse_for_stmt(&mut self) -> ParseResult<Statement>;
    fn parse_while_stmt(&mut self) -> ParseResult<Statement>;
    fn parse_param_list(&mut self) -> ParseResult<Vec<Param>>;
    fn parse_param(&mut self) -> ParseResult<Param>;
    fn parse_expression_list_block(&mut self) -> ParseResult<Vec<Expr>>;
    fn parse_permission_expr(&mut self) -> ParseResult<String>;
}

impl ContractParsing for Parser {
    fn parse_contract_def(&mut self) -> ParseResult<ContractDef> {
        use super::DeclParsing;

        let loc = self.loc();
        self.expect(TokenKind::Contract)?;
        let name_token = self.expect(TokenKind::Identifier)?;

        self.expect(TokenKind::LParen)?;
        let params = self.parse_param_list()?;
        self.expect(TokenKind::RParen)?;

        self.expect(TokenKind::Arrow)?;
        let return_type = self.parse_type_expr()?;

        self.expect(TokenKind::Newline)?;
        self.expect(TokenKind::Indent)?;

        let mut precondition = None;
        let mut postcondition = None;
        let mut effects = None;
        let mut permissions = None;
        let mut body = None;
        let mut on_failure = None;

        while !self.check(TokenKind::Dedent) && !self.at_end() {
            self.skip_newlines();
            if self.check(TokenKind::Dedent) || self.at_end() {
                break;
            }

            // Sections may appear in any order, but each at most once.
            match self.current().kind {
                TokenKind::Precondition => {
                    check_duplicate(self, precondition.is_some(), "precondition")?;
                    precondition = Some(self.parse_precondition()?);
                }
                TokenKind::Postcondition => {
                    check_duplicate(self, postcondition.is_some(), "postcondition")?;
                    postcondition = Some(self.parse_postcondition()?);
                }
                TokenKind::Effects => {
                    check_duplicate(self, effects.is_some(), "effects")?;
                    effects = Some(self.parse_effects()?);
                }
                TokenKind::Permissions => {
                    check_duplicate(self, permissions.is_some(), "permissions")?;
                    permissions = Some(self.parse_permissions()?);
                }
                TokenKind::Body => {
                    check_duplicate(self, body.is_some(), "body")?;
                    body = Some(self.parse_body()?);
                }
                TokenKind::OnFailure => {
                    check_duplicate(self, on_failure.is_some(), "on_failure")?;
                    on_failure = Some(self.parse_on_failure()?);
                }
                _ => {
                    return Err(self.error(format!(
                        "Expected contract section (precondition, postcondition, effects, \
                         permissions, body, on_failure), got {}",
                        self.current().kind.name()
                    )));
                }
            }
            self.skip_newlines();
        }

        self.expect(TokenKind::Dedent)?;

        Ok(ContractDef {
            loc,
            name: name_token.value,
            params,
            return_type,
            precondition,
            postcondition,
            effects,
            permissions,
            body,
            on_failure,
        })
    }

    // ========================================================================
    // Sections
    // ========================================================================

    fn parse_precondition(&mut self) -> ParseResult<Precondition> {
        let loc = self.loc();
        self.expect(TokenKind::Precondition)?;
        self.expect(TokenKind::Colon)?;
        self.expect(TokenKind::Newline)?;
        self.expect(TokenKind::Indent)?;
        let conditions = self.parse_expression_list_block()?;
        self.expect(TokenKind::Dedent)?;
        Ok(Precondition { loc, conditions })
    }

    fn parse_postcondition(&mut self) -> ParseResult<Postcondition> {
        let loc = self.loc();
        self.expect(TokenKind::Postcondition)?;
        self.expect(TokenKind::Colon)?;
        self.expect(TokenKind::Newline)?;
        self.expect(TokenKind::Indent)?;
        let conditions = self.parse_expression_list_block()?;
        self.expect(TokenKind::Dedent)?;
        Ok(Postcondition { loc, conditions })
    }

    fn parse_effects(&mut self) -> ParseResult<Effects> {
        let loc = self.loc();
        self.expect(TokenKind::Effects)?;
        self.expect(TokenKind::Colon)?;
        self.expect(TokenKind::Newline)?;
        self.expect(TokenKind::Indent)?;

        let mut declarations = Vec::new();
        while !self.check(TokenKind::Dedent) && !self.at_end() {
            self.skip_newlines();
            if self.check(TokenKind::Dedent) {
                break;
            }

            let decl_loc = self.loc();
            match self.current().kind {
                TokenKind::Modifies => {
                    self.advance();
                    let targets = self.parse_bracketed_list(Parser::parse_dotted_name)?;
                    declarations.push(EffectDecl::Modifies {
                        loc: decl_loc,
                        targets,
                    });
                }
                TokenKind::Reads => {
                    self.advance();
                    let targets = self.parse_bracketed_list(Parser::parse_dotted_name)?;
                    declarations.push(EffectDecl::Reads {
                        loc: decl_loc,
                        targets,
                    });
                }
                TokenKind::Emits => {
                    self.advance();
                    let event_name = self.expect(TokenKind::Identifier)?;
                    declarations.push(EffectDecl::Emits {
                        loc: decl_loc,
                        event: event_name.value,
                    });
                }
                TokenKind::TouchesNothingElse => {
                    self.advance();
                    declarations.push(EffectDecl::TouchesNothingElse { loc: decl_loc });
                }
                _ => {
                    return Err(self.error(format!(
                        "Expected effect declaration (modifies, reads, emits, \
                         touches_nothing_else), got {}",
                        self.current().kind.name()
                    )));
                }
            }
            self.skip_newlines();
        }

        self.expect(TokenKind::Dedent)?;
        Ok(Effects { loc, declarations })
    }

    fn parse_permissions(&mut self) -> ParseResult<PermissionsBlock> {
        let loc = self.loc();
        self.expect(TokenKind::Permissions)?;
        self.expect(TokenKind::Colon)?;
        self.expect(TokenKind::Newline)?;
        self.expect(TokenKind::Indent)?;

        let mut grants = None;
        let mut denies = None;
        let mut escalation = None;

        while !self.check(TokenKind::Dedent) && !self.at_end() {
            self.skip_newlines();
            if self.check(TokenKind::Dedent) {
                break;
            }

            let entry_loc = self.loc();
            match self.current().kind {
                TokenKind::Grants => {
                    self.advance();
                    self.expect(TokenKind::Colon)?;
                    let permissions = self.parse_bracketed_list(Parser::parse_permission_expr)?;
                    grants = Some(GrantsPermission {
                        loc: entry_loc,
                        permissions,
                    });
                }
                TokenKind::Denies => {
                    self.advance();
                    self.expect(TokenKind::Colon)?;
                    let permissions = self.parse_bracketed_list(Parser::parse_permission_expr)?;
                    denies = Some(DeniesPermission {
                        loc: entry_loc,
                        permissions,
                    });
                }
                TokenKind::Escalation => {
                    self.advance();
                    self.expect(TokenKind::Colon)?;
                    // Swallow the rest of the line as whitespace-joined words
                    let mut parts = Vec::new();
                    while !self.check(TokenKind::Newline)
                        && !self.check(TokenKind::Dedent)
                        && !self.at_end()
                    {
                        parts.push(self.advance().value);
                    }
                    escalation = Some(EscalationPolicy {
                        loc: entry_loc,
                        policy: parts.join(" "),
                    });
                }
                _ => {
                    return Err(self.error(format!(
                        "Expected permission declaration (grants, denies, escalation), got {}",
                        self.current().kind.name()
                    )));
                }
            }
            self.skip_newlines();
        }

        self.expect(TokenKind::Dedent)?;
        Ok(PermissionsBlock {
            loc,
            grants,
            denies,
            escalation,
        })
    }

    fn parse_body(&mut self) -> ParseResult<Body> {
        let loc = self.loc();
        self.expect(TokenKind::Body)?;
        self.expect(TokenKind::Colon)?;
        self.expect(TokenKind::Newline)?;
        self.expect(TokenKind::Indent)?;
        let statements = self.parse_statement_block()?;
        self.expect(TokenKind::Dedent)?;
        Ok(Body { loc, statements })
    }

    fn parse_on_failure(&mut self) -> ParseResult<OnFailure> {
        let loc = self.loc();
        self.expect(TokenKind::OnFailure)?;
        self.expect(TokenKind::Colon)?;
        self.expect(TokenKind::Newline)?;
        self.expect(TokenKind::Indent)?;
        let statements = self.parse_statement_block()?;
        self.expect(TokenKind::Dedent)?;
        Ok(OnFailure { loc, statements })
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn parse_statement_block(&mut self) -> ParseResult<Vec<Statement>> {
        let mut stmts = Vec::new();
        while !self.check(TokenKind::Dedent) && !self.at_end() {
            self.skip_newlines();
            if self.check(TokenKind::Dedent) || self.at_end() {
                break;
            }
            stmts.push(self.parse_statement()?);
            self.skip_newlines();
        }
        Ok(stmts)
    }

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        let loc = self.loc();

        match self.current().kind {
            TokenKind::Return => {
                self.advance();
                let value = self.parse_expression()?;
                return Ok(Statement::Return { loc, value });
            }
            TokenKind::Emit => {
                self.advance();
                let event = self.parse_expression()?;
                return Ok(Statement::Emit { loc, event });
            }
            TokenKind::If => return self.parse_if_stmt(),
            TokenKind::For => return self.parse_for_stmt(),
            TokenKind::While => return self.parse_while_stmt(),
            _ => {}
        }

        // Parse an expression first, then decide if it's an assignment
        let expr = self.parse_expression()?;

        if self.check(TokenKind::Assign) {
            self.advance();
            let target = assignment_target(&expr).ok_or_else(|| {
                let at = expr.loc();
                ParseError::new(
                    "Invalid assignment target",
                    Token::new(TokenKind::Assign, "=", at.line, at.column, at.file.clone()),
                )
            })?;
            let value = self.parse_expression()?;
            return Ok(Statement::Assignment { loc, target, value });
        }

        Ok(Statement::Expr { loc, expr })
    }

    fn parse_if_stmt(&mut self) -> ParseResult<Statement> {
        let loc = self.loc();
        self.expect(TokenKind::If)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::Colon)?;
        self.expect(TokenKind::Newline)?;
        self.expect(TokenKind::Indent)?;
        let then_body = self.parse_statement_block()?;
        self.expect(TokenKind::Dedent)?;

        let mut else_body = Vec::new();
        self.skip_newlines();
        if self.check(TokenKind::Else) {
            self.advance();
            self.expect(TokenKind::Colon)?;
            self.expect(TokenKind::Newline)?;
            self.expect(TokenKind::Indent)?;
            else_body = self.parse_statement_block()?;
            self.expect(TokenKind::Dedent)?;
        }

        Ok(Statement::If {
            loc,
            condition,
            then_body,
            else_body,
        })
    }

    fn parse_for_stmt(&mut self) -> ParseResult<Statement> {
        let loc = self.loc();
        self.expect(TokenKind::For)?;
        let var = self.expect(TokenKind::Identifier)?.value;
        self.expect(TokenKind::In)?;
        let iterable = self.parse_expression()?;
        self.expect(TokenKind::Colon)?;
        self.expect(TokenKind::Newline)?;
        self.expect(TokenKind::Indent)?;
        let body = self.parse_statement_block()?;
        self.expect(TokenKind::Dedent)?;
        Ok(Statement::For {
            loc,
            var,
            iterable,
            body,
        })
    }

    fn parse_while_stmt(&mut self) -> ParseResult<Statement> {
        let loc = self.loc();
        self.expect(TokenKind::While)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::Colon)?;
        self.expect(TokenKind::Newline)?;
        self.expect(TokenKind::Indent)?;
        let body = self.parse_statement_block()?;
        self.expect(TokenKind::Dedent)?;
        Ok(Statement::While {
            loc,
            condition,
            body,
        })
    }

    // ========================================================================
    // Parameters and misc
    // ========================================================================

    fn parse_param_list(&mut self) -> ParseResult<Vec<Param>> {
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            params.push(self.parse_param()?);
            while self.check(TokenKind::Comma) {
                self.advance();
                if self.check(TokenKind::RParen) {
                    break;
                }
                params.push(self.parse_param()?);
            }
        }
        Ok(params)
    }

    fn parse_param(&mut self) -> ParseResult<Param> {
        use super::DeclParsing;

        let loc = self.loc();
        let name = self.expect(TokenKind::Identifier)?.value;
        self.expect(TokenKind::Colon)?;
        let type_expr = self.parse_type_expr()?;
        Ok(Param {
            loc,
            name,
            type_expr,
        })
    }

    /// A block of expressions, one per line, until DEDENT.
    fn parse_expression_list_block(&mut self) -> ParseResult<Vec<Expr>> {
        let mut exprs = Vec::new();
        while !self.check(TokenKind::Dedent) && !self.at_end() {
            self.skip_newlines();
            if self.check(TokenKind::Dedent) || self.at_end() {
                break;
            }
            exprs.push(self.parse_expression()?);
            self.skip_newlines();
        }
        Ok(exprs)
    }

    /// A permission expression like `read(record.name)` or `network_access`,
    /// captured as opaque text. Consumes tokens until a top-level comma or
    /// closing bracket, tracking paren depth.
    fn parse_permission_expr(&mut self) -> ParseResult<String> {
        let mut parts = Vec::new();
        let mut depth = 0u32;
        while !self.at_end() {
            match self.current().kind {
                TokenKind::LParen => {
                    depth += 1;
                    parts.push(self.advance().value);
                }
                TokenKind::RParen => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    parts.push(self.advance().value);
                }
                TokenKind::Comma if depth == 0 => break,
                TokenKind::RBracket if depth == 0 => break,
                _ => {
                    parts.push(self.advance().value);
                }
            }
        }
        Ok(parts.concat())
    }
}

/// Convert a parsed expression to an assignment target string: a bare
/// identifier, or a chain of field accesses rooted in an identifier,
/// flattened to a dotted name.
fn assignment_target(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier { name, .. } => Some(name.clone()),
        Expr::FieldAccess { .. } => {
            let mut parts = Vec::new();
            let mut current = expr;
            while let Expr::FieldAccess { object, field, .. } = current {
                parts.push(field.as_str());
                current = object;
            }
            if let Expr::Identifier { name, .. } = current {
                parts.push(name.as_str());
                parts.reverse();
                Some(parts.join("."))
            } else {
                None
            }
        }
        _ => None,
    }
}

fn check_duplicate(p: &Parser, already: bool, section: &str) -> ParseResult<()> {
    if already {
        return Err(p.error(format!("Duplicate '{}' section in contract", section)));
    }
    Ok(())
}
