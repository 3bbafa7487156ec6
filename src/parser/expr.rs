//! Expression grammar: precedence climbing from `or` down to primaries.
//!
//! Precedence, lowest to highest: `or`, `and`, prefix `not`, comparison,
//! `has`, additive, multiplicative, prefix `-`, postfix (field access and
//! calls), primary.

use super::{ParseResult, Parser};
use crate::ast::{BinaryOpKind, Expr, NumberValue, UnaryOpKind};
use crate::token::TokenKind;

pub trait ExprParsing {
    fn parse_expression(&mut self) -> ParseResult<Expr>;
    fn parse_or_expr(&mut self) -> ParseResult<Expr>;
    fn parse_and_expr(&mut self) -> ParseResult<Expr>;
    fn parse_not_expr(&mut self) -> ParseResult<Expr>;
    fn parse_comparison(&mut self) -> ParseResult<Expr>;
    fn parse_has_expr(&mut self) -> ParseResult<Expr>;
    fn parse_additive(&mut self) -> ParseResult<Expr>;
    fn parse_multiplicative(&mut self) -> ParseResult<Expr>;
    fn parse_unary(&mut self) -> ParseResult<Expr>;
    fn parse_postfix(&mut self) -> ParseResult<Expr>;
    fn parse_primary(&mut self) -> ParseResult<Expr>;
    fn parse_list_literal(&mut self) -> ParseResult<Expr>;
    fn parse_argument_list(&mut self) -> ParseResult<(Vec<Expr>, Vec<(String, Expr)>)>;
}

impl ExprParsing for Parser {
    fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_or_expr()
    }

    fn parse_or_expr(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_and_expr()?;
        while self.check(TokenKind::Or) {
            self.advance();
            let right = self.parse_and_expr()?;
            left = binary(left, BinaryOpKind::Or, right);
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_not_expr()?;
        while self.check(TokenKind::And) {
            self.advance();
            let right = self.parse_not_expr()?;
            left = binary(left, BinaryOpKind::And, right);
        }
        Ok(left)
    }

    fn parse_not_expr(&mut self) -> ParseResult<Expr> {
        if self.check(TokenKind::Not) {
            let loc = self.loc();
            self.advance();
            let operand = self.parse_not_expr()?;
            return Ok(Expr::Unary {
                loc,
                op: UnaryOpKind::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    /// Chained comparisons are accepted and group left-associatively:
    /// `a < b < c` parses as `(a < b) < c`.
    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_has_expr()?;
        loop {
            let op = match self.current().kind {
                TokenKind::EqEq => BinaryOpKind::Eq,
                TokenKind::NotEq => BinaryOpKind::NotEq,
                TokenKind::Lt => BinaryOpKind::Lt,
                TokenKind::LtEq => BinaryOpKind::LtEq,
                TokenKind::Gt => BinaryOpKind::Gt,
                TokenKind::GtEq => BinaryOpKind::GtEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_has_expr()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    /// `subject has capability` — binary, non-associative.
    fn parse_has_expr(&mut self) -> ParseResult<Expr> {
        let left = self.parse_additive()?;
        if self.check(TokenKind::Has) {
            self.advance();
            let right = self.parse_additive()?;
            let loc = left.loc().clone();
            return Ok(Expr::Has {
                loc,
                subject: Box::new(left),
                capability: Box::new(right),
            });
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinaryOpKind::Add,
                TokenKind::Minus => BinaryOpKind::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinaryOpKind::Multiply,
                TokenKind::Slash => BinaryOpKind::Divide,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        if self.check(TokenKind::Minus) {
            let loc = self.loc();
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                loc,
                op: UnaryOpKind::Neg,
                operand: Box::new(operand),
            });
        }
        self.parse_postfix()
    }

    /// Postfix operations: field access, function calls, method calls.
    /// Left-associative and chainable.
    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.check(TokenKind::Dot) {
                self.advance();
                let field = self.expect_name()?.value;
                if self.check(TokenKind::LParen) {
                    self.advance();
                    let (args, kwargs) = self.parse_argument_list()?;
                    self.expect(TokenKind::RParen)?;
                    let loc = expr.loc().clone();
                    expr = Expr::MethodCall {
                        loc,
                        object: Box::new(expr),
                        method: field,
                        args,
                        kwargs,
                    };
                } else {
                    let loc = expr.loc().clone();
                    expr = Expr::FieldAccess {
                        loc,
                        object: Box::new(expr),
                        field,
                    };
                }
            } else if self.check(TokenKind::LParen) {
                self.advance();
                let (args, kwargs) = self.parse_argument_list()?;
                self.expect(TokenKind::RParen)?;
                let loc = expr.loc().clone();
                expr = Expr::Call {
                    loc,
                    callee: Box::new(expr),
                    args,
                    kwargs,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let loc = self.loc();
        let tok = self.current().clone();

        match tok.kind {
            TokenKind::Old => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(Expr::Old {
                    loc,
                    inner: Box::new(inner),
                })
            }
            TokenKind::Str => {
                self.advance();
                Ok(Expr::StringLit {
                    loc,
                    value: tok.value,
                })
            }
            TokenKind::Integer => {
                self.advance();
                let value = tok.value.parse::<i64>().map_err(|_| {
                    self.error(format!("Integer literal out of range: '{}'", tok.value))
                })?;
                Ok(Expr::Number {
                    loc,
                    value: NumberValue::Int(value),
                })
            }
            TokenKind::Float => {
                self.advance();
                let value = tok.value.parse::<f64>().map_err(|_| {
                    self.error(format!("Invalid number literal: '{}'", tok.value))
                })?;
                Ok(Expr::Number {
                    loc,
                    value: NumberValue::Float(value),
                })
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Bool { loc, value: true })
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Bool { loc, value: false })
            }
            TokenKind::Identifier => {
                self.advance();
                Ok(Expr::Identifier {
                    loc,
                    name: tok.value,
                })
            }
            TokenKind::LBracket => self.parse_list_literal(),
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            _ => Err(self.error(format!(
                "Expected expression, got {} ('{}')",
                tok.kind.name(),
                tok.value
            ))),
        }
    }

    fn parse_list_literal(&mut self) -> ParseResult<Expr> {
        let loc = self.loc();
        self.expect(TokenKind::LBracket)?;
        let mut elements = Vec::new();
        if !self.check(TokenKind::RBracket) {
            elements.push(self.parse_expression()?);
            while self.check(TokenKind::Comma) {
                self.advance();
                if self.check(TokenKind::RBracket) {
                    break;
                }
                elements.push(self.parse_expression()?);
            }
        }
        self.expect(TokenKind::RBracket)?;
        Ok(Expr::List { loc, elements })
    }

    /// Comma-separated arguments inside parens. An argument is a keyword
    /// argument iff the next two tokens are a name followed by `:`;
    /// positional and keyword arguments may coexist.
    fn parse_argument_list(&mut self) -> ParseResult<(Vec<Expr>, Vec<(String, Expr)>)> {
        let mut args = Vec::new();
        let mut kwargs = Vec::new();

        if !self.check(TokenKind::RParen) {
            parse_argument(self, &mut args, &mut kwargs)?;
            while self.check(TokenKind::Comma) {
                self.advance();
                if self.check(TokenKind::RParen) {
                    break;
                }
                parse_argument(self, &mut args, &mut kwargs)?;
            }
        }

        Ok((args, kwargs))
    }
}

fn parse_argument(
    p: &mut Parser,
    args: &mut Vec<Expr>,
    kwargs: &mut Vec<(String, Expr)>,
) -> ParseResult<()> {
    let is_name = p.check(TokenKind::Identifier) || p.current().kind.is_soft_keyword();
    if is_name && p.peek_kind(1) == Some(TokenKind::Colon) {
        let name = p.advance().value;
        p.advance(); // consume colon
        let value = p.parse_expression()?;
        kwargs.push((name, value));
    } else {
        args.push(p.parse_expression()?);
    }
    Ok(())
}

fn binary(left: Expr, op: BinaryOpKind, right: Expr) -> Expr {
    let loc = left.loc().clone();
    Expr::Binary {
        loc,
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}
