//! Shared helpers for the integration suites: lex, parse, fingerprint,
//! and verify small Covenant sources.

#![allow(dead_code)]

use covenant::ast::{ContractDef, Program};
use covenant::error::{LexError, ParseError};
use covenant::lexer::Lexer;
use covenant::parser::Parser;
use covenant::token::{Token, TokenKind};
use covenant::verify::{
    fingerprint_contract, verify_program, BehavioralFingerprint, VerificationResult,
};

pub fn lex(source: &str) -> Vec<Token> {
    Lexer::new(source, "test.cov").tokenize().expect("lex should succeed")
}

pub fn lex_err(source: &str) -> LexError {
    Lexer::new(source, "test.cov").tokenize().expect_err("lex should fail")
}

pub fn parse(source: &str) -> Program {
    Parser::new(lex(source)).parse().expect("parse should succeed")
}

pub fn parse_err(source: &str) -> ParseError {
    Parser::new(lex(source)).parse().expect_err("parse should fail")
}

/// Parse a source with exactly one contract and return it.
pub fn contract(source: &str) -> ContractDef {
    let mut program = parse(source);
    assert!(!program.contracts.is_empty(), "source should contain a contract");
    program.contracts.remove(0)
}

pub fn fingerprint(source: &str) -> BehavioralFingerprint {
    fingerprint_contract(&contract(source))
}

pub fn verify(source: &str) -> Vec<VerificationResult> {
    verify_program(&parse(source), "test.cov")
}

pub fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
    tokens.iter().map(|t| t.kind).collect()
}

pub fn codes(results: &[VerificationResult]) -> Vec<&'static str> {
    results.iter().map(|r| r.code).collect()
}
