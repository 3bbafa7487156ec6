//! Type definitions, shared state declarations, and type expressions.

use super::{ParseResult, Parser};
use crate::ast::{FieldDef, FlowConstraint, SharedDecl, TypeDef, TypeExpr};
use crate::token::TokenKind;

pub trait DeclParsing {
    fn parse_type_def(&mut self) -> ParseResult<TypeDef>;
    fn parse_field_def(&mut self) -> ParseResult<FieldDef>;
    fn parse_flow_constraint(&mut self) -> ParseResult<FlowConstraint>;
    fn parse_shared_decl(&mut self) -> ParseResult<SharedDecl>;
    fn parse_type_expr(&mut self) -> ParseResult<TypeExpr>;
}

impl DeclParsing for Parser {
    fn parse_type_def(&mut self) -> ParseResult<TypeDef> {
        let loc = self.loc();
        self.expect(TokenKind::Type)?;
        let name = self.expect(TokenKind::Identifier)?.value;
        self.expect(TokenKind::Assign)?;
        let base_type = self.expect(TokenKind::Identifier)?.value;
        self.expect(TokenKind::Newline)?;
        self.expect(TokenKind::Indent)?;

        let mut fields = Vec::new();
        let mut flow_constraints = Vec::new();

        while !self.check(TokenKind::Dedent) && !self.at_end() {
            self.skip_newlines();
            if self.check(TokenKind::Dedent) {
                break;
            }

            if self.check(TokenKind::Fields) {
                self.advance();
                self.expect(TokenKind::Colon)?;
                self.expect(TokenKind::Newline)?;
                self.expect(TokenKind::Indent)?;
                while !self.check(TokenKind::Dedent) && !self.at_end() {
                    self.skip_newlines();
                    if self.check(TokenKind::Dedent) {
                        break;
                    }
                    fields.push(self.parse_field_def()?);
                    self.skip_newlines();
                }
                self.expect(TokenKind::Dedent)?;
            } else if self.check(TokenKind::FlowConstraints) {
                self.advance();
                self.expect(TokenKind::Colon)?;
                self.expect(TokenKind::Newline)?;
                self.expect(TokenKind::Indent)?;
                while !self.check(TokenKind::Dedent) && !self.at_end() {
                    self.skip_newlines();
                    if self.check(TokenKind::Dedent) {
                        break;
                    }
                    flow_constraints.push(self.parse_flow_constraint()?);
                    self.skip_newlines();
                }
                self.expect(TokenKind::Dedent)?;
            } else {
                return Err(self.error(format!(
                    "Expected 'fields' or 'flow_constraints' in type definition, got {}",
                    self.current().kind.name()
                )));
            }
            self.skip_newlines();
        }

        self.expect(TokenKind::Dedent)?;
        Ok(TypeDef {
            loc,
            name,
            base_type,
            fields,
            flow_constraints,
        })
    }

    fn parse_field_def(&mut self) -> ParseResult<FieldDef> {
        let loc = self.loc();
        let name = self.expect(TokenKind::Identifier)?.value;
        self.expect(TokenKind::Colon)?;
        let type_expr = self.parse_type_expr()?;
        Ok(FieldDef {
            loc,
            name,
            type_expr,
        })
    }

    fn parse_flow_constraint(&mut self) -> ParseResult<FlowConstraint> {
        let loc = self.loc();
        if self.check(TokenKind::NeverFlowsTo) {
            self.advance();
            self.expect(TokenKind::Colon)?;
            let destinations = self.parse_bracketed_list(Parser::parse_dotted_name)?;
            return Ok(FlowConstraint::NeverFlowsTo { loc, destinations });
        }
        if self.check(TokenKind::RequiresContext) {
            self.advance();
            self.expect(TokenKind::Colon)?;
            let context = self.expect(TokenKind::Identifier)?.value;
            return Ok(FlowConstraint::RequiresContext { loc, context });
        }
        Err(self.error(format!(
            "Expected flow constraint (never_flows_to, requires_context), got {}",
            self.current().kind.name()
        )))
    }

    fn parse_shared_decl(&mut self) -> ParseResult<SharedDecl> {
        let loc = self.loc();
        self.expect(TokenKind::Shared)?;
        let name = self.expect(TokenKind::Identifier)?.value;
        self.expect(TokenKind::Colon)?;
        let type_name = self.expect(TokenKind::Identifier)?.value;
        self.expect(TokenKind::Newline)?;
        self.expect(TokenKind::Indent)?;

        let mut access = String::new();
        let mut isolation = String::new();
        let mut audit = String::new();

        while !self.check(TokenKind::Dedent) && !self.at_end() {
            self.skip_newlines();
            if self.check(TokenKind::Dedent) {
                break;
            }

            match self.current().kind {
                TokenKind::Access => {
                    self.advance();
                    self.expect(TokenKind::Colon)?;
                    access = self.expect(TokenKind::Identifier)?.value;
                }
                TokenKind::Isolation => {
                    self.advance();
                    self.expect(TokenKind::Colon)?;
                    isolation = self.expect(TokenKind::Identifier)?.value;
                }
                TokenKind::Audit => {
                    self.advance();
                    self.expect(TokenKind::Colon)?;
                    audit = self.expect(TokenKind::Identifier)?.value;
                }
                _ => {
                    return Err(self.error(format!(
                        "Expected shared declaration property (access, isolation, audit), got {}",
                        self.current().kind.name()
                    )));
                }
            }
            self.skip_newlines();
        }

        self.expect(TokenKind::Dedent)?;
        Ok(SharedDecl {
            loc,
            name,
            type_name,
            access,
            isolation,
            audit,
        })
    }

    /// A type expression, possibly with annotations: `Type [ann1, ann2]`.
    fn parse_type_expr(&mut self) -> ParseResult<TypeExpr> {
        let loc = self.loc();
        let name = self.expect(TokenKind::Identifier)?.value;
        let base = TypeExpr::Simple {
            loc: loc.clone(),
            name,
        };

        if self.check(TokenKind::LBracket) {
            self.advance();
            let mut annotations = vec![self.expect(TokenKind::Identifier)?.value];
            while self.check(TokenKind::Comma) {
                self.advance();
                annotations.push(self.expect(TokenKind::Identifier)?.value);
            }
            self.expect(TokenKind::RBracket)?;
            return Ok(TypeExpr::Annotated {
                loc,
                base: Box::new(base),
                annotations,
            });
        }

        Ok(base)
    }
}
