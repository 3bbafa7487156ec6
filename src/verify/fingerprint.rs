//! Behavioral fingerprinting for Covenant contracts.
//!
//! Walks the AST of a contract's `body` and `on_failure` sections and
//! extracts what the code reads, mutates, calls, and emits, plus its
//! control-flow shape. Preconditions and postconditions are declarations,
//! not behavior — they never contribute here.
//!
//! The fingerprint is computed entirely from the AST. When a contract is
//! modified, the fingerprint changes if and only if the behavioral profile
//! changes.

use std::collections::BTreeSet;

use serde_json::{json, Value};

use crate::ast::{ContractDef, Expr, Statement};

/// Captures the abstract behavior of a contract body.
///
/// Set-valued fields use `BTreeSet` so canonical (sorted) order falls out
/// of iteration; `operators` and `literals` keep encounter order and are
/// sorted only in the canonical projection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BehavioralFingerprint {
    /// State the body reads: identifiers and dotted paths.
    pub reads: BTreeSet<String>,
    /// Assignment targets.
    pub mutations: BTreeSet<String>,
    /// Calls made, as `"function"` or `"object.method"`.
    pub calls: BTreeSet<String>,
    /// Events emitted via `emit` statements.
    pub emitted_events: BTreeSet<String>,
    /// Pre-execution state references: `old(expr)` paths.
    pub old_references: BTreeSet<String>,
    /// Capability checks, as `"subject has capability"`.
    pub capability_checks: BTreeSet<String>,
    /// Operator symbols, in encounter order.
    pub operators: Vec<String>,
    /// Canonicalized literal values, in encounter order.
    pub literals: Vec<String>,
    pub has_branching: bool,
    pub has_looping: bool,
    /// Set when the body calls the enclosing contract by name.
    pub has_recursion: bool,
    pub return_count: u32,
    /// Depth of the deepest nested scope; the root body is depth 0.
    pub max_nesting_depth: u32,
}

impl BehavioralFingerprint {
    /// Project into the canonical dictionary used for hashing: every
    /// set sorted, `operators`/`literals` sorted, sorted keys.
    pub fn to_canonical_value(&self) -> Value {
        let mut operators: Vec<&str> = self.operators.iter().map(String::as_str).collect();
        operators.sort_unstable();
        let mut literals: Vec<&str> = self.literals.iter().map(String::as_str).collect();
        literals.sort_unstable();

        json!({
            "reads": self.reads,
            "mutations": self.mutations,
            "calls": self.calls,
            "emitted_events": self.emitted_events,
            "old_references": self.old_references,
            "capability_checks": self.capability_checks,
            "operators": operators,
            "literals": literals,
            "has_branching": self.has_branching,
            "has_looping": self.has_looping,
            "has_recursion": self.has_recursion,
            "return_count": self.return_count,
            "max_nesting_depth": self.max_nesting_depth,
        })
    }

    /// Byte-stable serialization of the canonical dictionary: sorted keys,
    /// `,`/`:` separators, no whitespace.
    pub fn canonical_json(&self) -> String {
        serde_json::to_string(&self.to_canonical_value())
            .expect("canonical fingerprint serializes to JSON")
    }
}

/// Compute the behavioral fingerprint for a contract.
///
/// Only the `body` and `on_failure` sections are fingerprinted — these
/// represent what the code actually does. Precondition and postcondition
/// expressions are analyzed separately by the checker.
pub fn fingerprint_contract(contract: &ContractDef) -> BehavioralFingerprint {
    let mut walker = Walker::new(&contract.name);

    if let Some(body) = &contract.body {
        walker.walk_statements(&body.statements, 0);
    }
    if let Some(on_failure) = &contract.on_failure {
        walker.walk_statements(&on_failure.statements, 0);
    }

    walker.fp
}

/// Build a mini-fingerprint over a bare expression list. The checker uses
/// this to analyze precondition/postcondition expressions without mixing
/// them into the body fingerprint.
pub(crate) fn fingerprint_expressions(exprs: &[Expr]) -> BehavioralFingerprint {
    let mut walker = Walker::new("");
    for expr in exprs {
        walker.walk_expr(expr);
    }
    walker.fp
}

/// Walks statements and expressions to populate a fingerprint.
struct Walker<'a> {
    fp: BehavioralFingerprint,
    contract_name: &'a str,
}

impl<'a> Walker<'a> {
    fn new(contract_name: &'a str) -> Self {
        Walker {
            fp: BehavioralFingerprint::default(),
            contract_name,
        }
    }

    fn walk_statements(&mut self, stmts: &[Statement], depth: u32) {
        self.fp.max_nesting_depth = self.fp.max_nesting_depth.max(depth);
        for stmt in stmts {
            self.walk_statement(stmt, depth);
        }
    }

    fn walk_statement(&mut self, stmt: &Statement, depth: u32) {
        match stmt {
            Statement::Assignment { target, value, .. } => {
                self.fp.mutations.insert(target.clone());
                self.walk_expr(value);
            }

            Statement::Return { value, .. } => {
                self.fp.return_count += 1;
                self.walk_expr(value);
            }

            Statement::Emit { event, .. } => {
                if let Some(name) = event_name(event) {
                    self.fp.emitted_events.insert(name);
                }
                self.walk_expr(event);
            }

            Statement::Expr { expr, .. } => {
                self.walk_expr(expr);
            }

            Statement::If {
                condition,
                then_body,
                else_body,
                ..
            } => {
                self.fp.has_branching = true;
                self.walk_expr(condition);
                self.walk_statements(then_body, depth + 1);
                if !else_body.is_empty() {
                    self.walk_statements(else_body, depth + 1);
                }
            }

            Statement::For { iterable, body, .. } => {
                self.fp.has_looping = true;
                self.walk_expr(iterable);
                self.walk_statements(body, depth + 1);
            }

            Statement::While { condition, body, .. } => {
                self.fp.has_looping = true;
                self.walk_expr(condition);
                self.walk_statements(body, depth + 1);
            }
        }
    }

    fn walk_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Identifier { name, .. } => {
                self.fp.reads.insert(name.clone());
            }

            // The whole access chain becomes one dotted read
            Expr::FieldAccess { .. } => {
                self.fp.reads.insert(dotted_path(expr));
            }

            Expr::Call {
                callee, args, kwargs, ..
            } => {
                let name = call_name(callee);
                if name == self.contract_name {
                    self.fp.has_recursion = true;
                }
                self.fp.calls.insert(name);
                self.walk_expr(callee);
                for arg in args {
                    self.walk_expr(arg);
                }
                for (_, value) in kwargs {
                    self.walk_expr(value);
                }
            }

            Expr::MethodCall {
                object,
                method,
                args,
                kwargs,
                ..
            } => {
                self.fp.calls.insert(format!("{}.{}", call_name(object), method));
                self.walk_expr(object);
                for arg in args {
                    self.walk_expr(arg);
                }
                for (_, value) in kwargs {
                    self.walk_expr(value);
                }
            }

            Expr::Binary { left, op, right, .. } => {
                self.fp.operators.push(op.symbol().to_string());
                self.walk_expr(left);
                self.walk_expr(right);
            }

            Expr::Unary { op, operand, .. } => {
                self.fp.operators.push(op.symbol().to_string());
                self.walk_expr(operand);
            }

            Expr::Old { inner, .. } => {
                self.fp.old_references.insert(path_of_expr(inner));
                self.walk_expr(inner);
            }

            Expr::Has {
                subject, capability, ..
            } => {
                self.fp
                    .capability_checks
                    .insert(format!("{} has {}", path_of_expr(subject), path_of_expr(capability)));
            }

            Expr::List { elements, .. } => {
                for elem in elements {
                    self.walk_expr(elem);
                }
            }

            Expr::Number { value, .. } => {
                self.fp.literals.push(value.canonical());
            }

            Expr::StringLit { value, .. } => {
                self.fp.literals.push(string_repr(value));
            }

            Expr::Bool { value, .. } => {
                self.fp
                    .literals
                    .push(if *value { "True" } else { "False" }.to_string());
            }
        }
    }
}

/// Flatten a chain of field accesses to a dotted string. If the chain is
/// not rooted in an identifier, the left-most resolvable prefix is used.
fn dotted_path(expr: &Expr) -> String {
    let mut parts: Vec<&str> = Vec::new();
    let mut current = expr;
    while let Expr::FieldAccess { object, field, .. } = current {
        parts.push(field.as_str());
        current = object;
    }
    if let Expr::Identifier { name, .. } = current {
        parts.push(name.as_str());
    }
    parts.reverse();
    parts.join(".")
}

/// Extract a dotted path from any expression.
fn path_of_expr(expr: &Expr) -> String {
    match expr {
        Expr::Identifier { name, .. } => name.clone(),
        Expr::FieldAccess { .. } => dotted_path(expr),
        Expr::MethodCall { object, method, .. } => {
            format!("{}.{}()", call_name(object), method)
        }
        Expr::Call { callee, .. } => format!("{}()", call_name(callee)),
        _ => "<complex>".to_string(),
    }
}

/// Name a call target: identifier name, dotted path, or `<indirect>`.
fn call_name(expr: &Expr) -> String {
    match expr {
        Expr::Identifier { name, .. } => name.clone(),
        Expr::FieldAccess { .. } => dotted_path(expr),
        _ => "<indirect>".to_string(),
    }
}

/// Event type name from an `emit` expression, when extractable.
fn event_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Call { callee, .. } => Some(call_name(callee)),
        Expr::Identifier { name, .. } => Some(name.clone()),
        _ => None,
    }
}

/// Canonical quoted form of a string literal.
///
/// Single quotes by default; a value containing a single quote but no
/// double quote is double-quoted instead, with the apostrophe left
/// unescaped. Only the active delimiter is escaped.
fn string_repr(value: &str) -> String {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            ch if ch == quote => {
                out.push('\\');
                out.push(ch);
            }
            other => out.push(other),
        }
    }
    out.push(quote);
    out
}
