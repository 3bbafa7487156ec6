//! Covenant — a contract-oriented specification language front-end.
//!
//! The pipeline is a straight chain of pure passes over immutable data:
//!
//! ```text
//! source text -> Lexer -> tokens -> Parser -> AST -> Fingerprinter
//!                                              |          |
//!                                              +--> Checker / Hasher
//! ```
//!
//! Each contract declares what it intends to do (intent, preconditions,
//! postconditions, effects); the verification engine extracts what the
//! body actually does, cross-checks the two, and emits a SHA-256 binding
//! (`IntentHash`) so later drift between intent and behavior is detectable
//! by hash comparison.
//!
//! Everything here is synchronous and allocation-local: callers may run
//! the pipeline from parallel workers without any locking.

pub mod ast;
pub mod cli;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod verify;

pub use ast::{
    BinaryOpKind, Body, ContractDef, EffectDecl, Effects, Expr, FileHeader, NumberValue,
    OnFailure, Param, Program, RiskLevel, SharedDecl, Statement, TypeDef, TypeExpr, UnaryOpKind,
};
pub use error::{LexError, ParseError};
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{SourceLocation, Token, TokenKind};
pub use verify::{
    compute_intent_hash, fingerprint_contract, verify_contract, verify_program,
    BehavioralFingerprint, IntentHash, IntentHashComparison, Severity, VerificationResult,
};
