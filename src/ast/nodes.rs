//! Immutable AST node definitions for Covenant.
//!
//! Every node carries a source location. Nothing mutates a node after
//! construction — later compiler phases (fingerprinting, verification)
//! produce independently owned values instead of annotating the tree.

use std::fmt;

use crate::token::SourceLocation;

// ============================================================================
// Top-level program
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub loc: SourceLocation,
    pub header: Option<FileHeader>,
    pub contracts: Vec<ContractDef>,
    pub type_defs: Vec<TypeDef>,
    pub shared_decls: Vec<SharedDecl>,
}

// ============================================================================
// File header blocks
// ============================================================================

/// The intent declaration — the compiler hashes this text and binds it to
/// the behavioral profile of the code.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentBlock {
    pub loc: SourceLocation,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScopeDecl {
    pub loc: SourceLocation,
    /// Dotted path, e.g. `finance.transfers`.
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// True when several warning diagnostics escalate to errors.
    pub fn is_elevated(self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Critical)
    }

    pub fn name(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskDecl {
    pub loc: SourceLocation,
    pub level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequiresDecl {
    pub loc: SourceLocation,
    pub capabilities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileHeader {
    pub loc: SourceLocation,
    pub intent: Option<IntentBlock>,
    pub scope: Option<ScopeDecl>,
    pub risk: Option<RiskDecl>,
    pub requires: Option<RequiresDecl>,
}

// ============================================================================
// Type expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Simple {
        loc: SourceLocation,
        name: String,
    },
    Generic {
        loc: SourceLocation,
        name: String,
        params: Vec<TypeExpr>,
    },
    List {
        loc: SourceLocation,
        element: Box<TypeExpr>,
    },
    /// A type with security/flow annotations, e.g. `String [pii, no_log]`.
    Annotated {
        loc: SourceLocation,
        base: Box<TypeExpr>,
        annotations: Vec<String>,
    },
}

impl TypeExpr {
    pub fn loc(&self) -> &SourceLocation {
        match self {
            TypeExpr::Simple { loc, .. }
            | TypeExpr::Generic { loc, .. }
            | TypeExpr::List { loc, .. }
            | TypeExpr::Annotated { loc, .. } => loc,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Simple { name, .. } => f.write_str(name),
            TypeExpr::Generic { name, params, .. } => {
                write!(f, "{}<", name)?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                f.write_str(">")
            }
            TypeExpr::List { element, .. } => write!(f, "List[{}]", element),
            TypeExpr::Annotated { base, annotations, .. } => {
                write!(f, "{} [{}]", base, annotations.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub loc: SourceLocation,
    pub name: String,
    pub type_expr: TypeExpr,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberValue {
    Int(i64),
    Float(f64),
}

impl NumberValue {
    /// Canonical literal form used by fingerprinting: decimal for integers,
    /// shortest round-trip display for floats with `.0` kept on whole values.
    pub fn canonical(&self) -> String {
        match self {
            NumberValue::Int(n) => n.to_string(),
            NumberValue::Float(v) => {
                let s = v.to_string();
                if s.contains('.') || s.contains('e') || s.contains("inf") || s.contains("NaN") {
                    s
                } else {
                    format!("{}.0", s)
                }
            }
        }
    }
}

/// Binary operator kinds, lowest-precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOpKind {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOpKind {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOpKind::Or => "or",
            BinaryOpKind::And => "and",
            BinaryOpKind::Eq => "==",
            BinaryOpKind::NotEq => "!=",
            BinaryOpKind::Lt => "<",
            BinaryOpKind::LtEq => "<=",
            BinaryOpKind::Gt => ">",
            BinaryOpKind::GtEq => ">=",
            BinaryOpKind::Add => "+",
            BinaryOpKind::Subtract => "-",
            BinaryOpKind::Multiply => "*",
            BinaryOpKind::Divide => "/",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOpKind {
    Not,
    Neg,
}

impl UnaryOpKind {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOpKind::Not => "not",
            UnaryOpKind::Neg => "-",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Identifier {
        loc: SourceLocation,
        name: String,
    },
    StringLit {
        loc: SourceLocation,
        value: String,
    },
    Number {
        loc: SourceLocation,
        value: NumberValue,
    },
    Bool {
        loc: SourceLocation,
        value: bool,
    },
    List {
        loc: SourceLocation,
        elements: Vec<Expr>,
    },
    Binary {
        loc: SourceLocation,
        left: Box<Expr>,
        op: BinaryOpKind,
        right: Box<Expr>,
    },
    Unary {
        loc: SourceLocation,
        op: UnaryOpKind,
        operand: Box<Expr>,
    },
    FieldAccess {
        loc: SourceLocation,
        object: Box<Expr>,
        field: String,
    },
    /// Function call: `func(args)`. Keyword arguments keep source order.
    Call {
        loc: SourceLocation,
        callee: Box<Expr>,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
    },
    /// Method call: `obj.method(args)`.
    MethodCall {
        loc: SourceLocation,
        object: Box<Expr>,
        method: String,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
    },
    /// Pre-execution state reference: `old(expr)`.
    Old {
        loc: SourceLocation,
        inner: Box<Expr>,
    },
    /// Capability check: `subject has capability`.
    Has {
        loc: SourceLocation,
        subject: Box<Expr>,
        capability: Box<Expr>,
    },
}

impl Expr {
    pub fn loc(&self) -> &SourceLocation {
        match self {
            Expr::Identifier { loc, .. }
            | Expr::StringLit { loc, .. }
            | Expr::Number { loc, .. }
            | Expr::Bool { loc, .. }
            | Expr::List { loc, .. }
            | Expr::Binary { loc, .. }
            | Expr::Unary { loc, .. }
            | Expr::FieldAccess { loc, .. }
            | Expr::Call { loc, .. }
            | Expr::MethodCall { loc, .. }
            | Expr::Old { loc, .. }
            | Expr::Has { loc, .. } => loc,
        }
    }
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `x = expr` or `obj.field = expr`. The target is a flattened
    /// dotted name.
    Assignment {
        loc: SourceLocation,
        target: String,
        value: Expr,
    },
    Return {
        loc: SourceLocation,
        value: Expr,
    },
    Emit {
        loc: SourceLocation,
        event: Expr,
    },
    Expr {
        loc: SourceLocation,
        expr: Expr,
    },
    If {
        loc: SourceLocation,
        condition: Expr,
        then_body: Vec<Statement>,
        else_body: Vec<Statement>,
    },
    For {
        loc: SourceLocation,
        var: String,
        iterable: Expr,
        body: Vec<Statement>,
    },
    While {
        loc: SourceLocation,
        condition: Expr,
        body: Vec<Statement>,
    },
}

impl Statement {
    pub fn loc(&self) -> &SourceLocation {
        match self {
            Statement::Assignment { loc, .. }
            | Statement::Return { loc, .. }
            | Statement::Emit { loc, .. }
            | Statement::Expr { loc, .. }
            | Statement::If { loc, .. }
            | Statement::For { loc, .. }
            | Statement::While { loc, .. } => loc,
        }
    }
}

// ============================================================================
// Contract sections
// ============================================================================

/// Ordered conditions, one per source line.
#[derive(Debug, Clone, PartialEq)]
pub struct Precondition {
    pub loc: SourceLocation,
    pub conditions: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Postcondition {
    pub loc: SourceLocation,
    pub conditions: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EffectDecl {
    Modifies {
        loc: SourceLocation,
        targets: Vec<String>,
    },
    Reads {
        loc: SourceLocation,
        targets: Vec<String>,
    },
    Emits {
        loc: SourceLocation,
        event: String,
    },
    /// A promise that the body touches no state beyond its declarations.
    TouchesNothingElse { loc: SourceLocation },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Effects {
    pub loc: SourceLocation,
    pub declarations: Vec<EffectDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub loc: SourceLocation,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OnFailure {
    pub loc: SourceLocation,
    pub statements: Vec<Statement>,
}

// ============================================================================
// Permissions block
// ============================================================================

/// Permission expressions are opaque strings, e.g. `read(record.name)`.
#[derive(Debug, Clone, PartialEq)]
pub struct GrantsPermission {
    pub loc: SourceLocation,
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeniesPermission {
    pub loc: SourceLocation,
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EscalationPolicy {
    pub loc: SourceLocation,
    /// Whitespace-joined remainder of the `escalation:` line.
    pub policy: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PermissionsBlock {
    pub loc: SourceLocation,
    pub grants: Option<GrantsPermission>,
    pub denies: Option<DeniesPermission>,
    pub escalation: Option<EscalationPolicy>,
}

// ============================================================================
// Contract definition
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ContractDef {
    pub loc: SourceLocation,
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: TypeExpr,
    pub precondition: Option<Precondition>,
    pub postcondition: Option<Postcondition>,
    pub effects: Option<Effects>,
    pub permissions: Option<PermissionsBlock>,
    pub body: Option<Body>,
    pub on_failure: Option<OnFailure>,
}

// ============================================================================
// Type definitions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub loc: SourceLocation,
    pub name: String,
    pub type_expr: TypeExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlowConstraint {
    NeverFlowsTo {
        loc: SourceLocation,
        destinations: Vec<String>,
    },
    RequiresContext {
        loc: SourceLocation,
        context: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub loc: SourceLocation,
    pub name: String,
    pub base_type: String,
    pub fields: Vec<FieldDef>,
    pub flow_constraints: Vec<FlowConstraint>,
}

// ============================================================================
// Shared state declarations
// ============================================================================

/// Shared mutable state with transactional/isolation/audit policy words.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedDecl {
    pub loc: SourceLocation,
    pub name: String,
    pub type_name: String,
    pub access: String,
    pub isolation: String,
    pub audit: String,
}
