use std::fmt;

use serde::Serialize;

/// Pinpoints a position in a source file. Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Every distinct token the Covenant lexer can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Structure
    Indent,
    Dedent,
    Newline,
    Eof,

    // Literals
    Str,
    Integer,
    Float,
    True,
    False,

    // Identifiers & punctuation
    Identifier,
    Dot,
    Comma,
    Colon,
    Arrow, // ->
    LParen,
    RParen,
    LBracket,
    RBracket,

    // Comparison / arithmetic
    EqEq,  // ==
    NotEq, // !=
    Lt,
    LtEq,
    Gt,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,
    Assign, // =

    // Keywords — language structure
    Intent,
    Scope,
    Risk,
    Requires,
    Contract,
    Precondition,
    Postcondition,
    Effects,
    Body,
    OnFailure,

    // Keywords — effects
    Modifies,
    Reads,
    Emits,
    TouchesNothingElse,

    // Keywords — control flow / expressions
    Return,
    Emit,
    If,
    Else,
    For,
    In,
    While,
    And,
    Or,
    Not,
    Has,

    // Keywords — type system
    Type,
    Fields,
    FlowConstraints,
    NeverFlowsTo,
    RequiresContext,
    Shared,
    Access,
    Isolation,
    Audit,

    // Keywords — permissions
    Permissions,
    Grants,
    Denies,
    Escalation,

    // Keywords — risk levels
    Low,
    Medium,
    High,
    Critical,

    // Pre-execution state reference: old(expr)
    Old,

    // Reserved for the audit-query sublanguage; no grammar consumes them yet
    Show,
    All,
    Where,
    Since,
}

/// Map a scanned word to its keyword kind, if it is one.
pub fn keyword(word: &str) -> Option<TokenKind> {
    let kind = match word {
        "intent" => TokenKind::Intent,
        "scope" => TokenKind::Scope,
        "risk" => TokenKind::Risk,
        "requires" => TokenKind::Requires,
        "contract" => TokenKind::Contract,
        "precondition" => TokenKind::Precondition,
        "postcondition" => TokenKind::Postcondition,
        "effects" => TokenKind::Effects,
        "body" => TokenKind::Body,
        "on_failure" => TokenKind::OnFailure,
        "modifies" => TokenKind::Modifies,
        "reads" => TokenKind::Reads,
        "emits" => TokenKind::Emits,
        "touches_nothing_else" => TokenKind::TouchesNothingElse,
        "return" => TokenKind::Return,
        "emit" => TokenKind::Emit,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "for" => TokenKind::For,
        "in" => TokenKind::In,
        "while" => TokenKind::While,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "not" => TokenKind::Not,
        "has" => TokenKind::Has,
        "type" => TokenKind::Type,
        "fields" => TokenKind::Fields,
        "flow_constraints" => TokenKind::FlowConstraints,
        "never_flows_to" => TokenKind::NeverFlowsTo,
        "requires_context" => TokenKind::RequiresContext,
        "shared" => TokenKind::Shared,
        "access" => TokenKind::Access,
        "isolation" => TokenKind::Isolation,
        "audit" => TokenKind::Audit,
        "permissions" => TokenKind::Permissions,
        "grants" => TokenKind::Grants,
        "denies" => TokenKind::Denies,
        "escalation" => TokenKind::Escalation,
        "low" => TokenKind::Low,
        "medium" => TokenKind::Medium,
        "high" => TokenKind::High,
        "critical" => TokenKind::Critical,
        "old" => TokenKind::Old,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "show" => TokenKind::Show,
        "all" => TokenKind::All,
        "where" => TokenKind::Where,
        "since" => TokenKind::Since,
        _ => return None,
    };
    Some(kind)
}

impl TokenKind {
    /// Keywords also accepted wherever a plain identifier is expected —
    /// inside dotted names, field accesses, and keyword-argument names.
    /// Words like `access` or `grants` are keywords at statement-leading
    /// position but remain valid as parts of qualified names.
    ///
    /// Control-flow keywords (`if`, `return`, `has`, ...) are deliberately
    /// absent from this set.
    pub const SOFT_KEYWORDS: &'static [TokenKind] = &[
        TokenKind::Access,
        TokenKind::Audit,
        TokenKind::Grants,
        TokenKind::Denies,
        TokenKind::Escalation,
        TokenKind::Isolation,
        TokenKind::Scope,
        TokenKind::Risk,
        TokenKind::Low,
        TokenKind::Medium,
        TokenKind::High,
        TokenKind::Critical,
        TokenKind::Fields,
        TokenKind::Show,
        TokenKind::All,
        TokenKind::Where,
        TokenKind::Since,
        TokenKind::Reads,
        TokenKind::Emits,
        TokenKind::Modifies,
        TokenKind::Shared,
        TokenKind::Type,
        TokenKind::Requires,
        TokenKind::Intent,
        TokenKind::Old,
        TokenKind::Body,
        TokenKind::Effects,
        TokenKind::Precondition,
        TokenKind::Postcondition,
        TokenKind::Permissions,
    ];

    pub fn is_soft_keyword(self) -> bool {
        Self::SOFT_KEYWORDS.contains(&self)
    }

    /// True for tokens that carry no source text of their own.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            TokenKind::Indent | TokenKind::Dedent | TokenKind::Newline | TokenKind::Eof
        )
    }

    /// Diagnostic name, e.g. `IDENTIFIER` or `TOUCHES_NOTHING_ELSE`.
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Indent => "INDENT",
            TokenKind::Dedent => "DEDENT",
            TokenKind::Newline => "NEWLINE",
            TokenKind::Eof => "EOF",
            TokenKind::Str => "STRING",
            TokenKind::Integer => "INTEGER",
            TokenKind::Float => "FLOAT",
            TokenKind::True => "TRUE",
            TokenKind::False => "FALSE",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Dot => "DOT",
            TokenKind::Comma => "COMMA",
            TokenKind::Colon => "COLON",
            TokenKind::Arrow => "ARROW",
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::LBracket => "LBRACKET",
            TokenKind::RBracket => "RBRACKET",
            TokenKind::EqEq => "EQUALS",
            TokenKind::NotEq => "NOT_EQUALS",
            TokenKind::Lt => "LESS_THAN",
            TokenKind::LtEq => "LESS_EQUAL",
            TokenKind::Gt => "GREATER_THAN",
            TokenKind::GtEq => "GREATER_EQUAL",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Star => "STAR",
            TokenKind::Slash => "SLASH",
            TokenKind::Assign => "ASSIGN",
            TokenKind::Intent => "INTENT",
            TokenKind::Scope => "SCOPE",
            TokenKind::Risk => "RISK",
            TokenKind::Requires => "REQUIRES",
            TokenKind::Contract => "CONTRACT",
            TokenKind::Precondition => "PRECONDITION",
            TokenKind::Postcondition => "POSTCONDITION",
            TokenKind::Effects => "EFFECTS",
            TokenKind::Body => "BODY",
            TokenKind::OnFailure => "ON_FAILURE",
            TokenKind::Modifies => "MODIFIES",
            TokenKind::Reads => "READS",
            TokenKind::Emits => "EMITS",
            TokenKind::TouchesNothingElse => "TOUCHES_NOTHING_ELSE",
            TokenKind::Return => "RETURN",
            TokenKind::Emit => "EMIT",
            TokenKind::If => "IF",
            TokenKind::Else => "ELSE",
            TokenKind::For => "FOR",
            TokenKind::In => "IN",
            TokenKind::While => "WHILE",
            TokenKind::And => "AND",
            TokenKind::Or => "OR",
            TokenKind::Not => "NOT",
            TokenKind::Has => "HAS",
            TokenKind::Type => "TYPE",
            TokenKind::Fields => "FIELDS",
            TokenKind::FlowConstraints => "FLOW_CONSTRAINTS",
            TokenKind::NeverFlowsTo => "NEVER_FLOWS_TO",
            TokenKind::RequiresContext => "REQUIRES_CONTEXT",
            TokenKind::Shared => "SHARED",
            TokenKind::Access => "ACCESS",
            TokenKind::Isolation => "ISOLATION",
            TokenKind::Audit => "AUDIT",
            TokenKind::Permissions => "PERMISSIONS",
            TokenKind::Grants => "GRANTS",
            TokenKind::Denies => "DENIES",
            TokenKind::Escalation => "ESCALATION",
            TokenKind::Low => "LOW",
            TokenKind::Medium => "MEDIUM",
            TokenKind::High => "HIGH",
            TokenKind::Critical => "CRITICAL",
            TokenKind::Old => "OLD",
            TokenKind::Show => "SHOW",
            TokenKind::All => "ALL",
            TokenKind::Where => "WHERE",
            TokenKind::Since => "SINCE",
        }
    }
}

/// A single token produced by the lexer.
///
/// Tokens are immutable and carry full source location information for
/// diagnostics and audit provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub line: u32,
    pub column: u32,
    pub file: String,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        value: impl Into<String>,
        line: u32,
        column: u32,
        file: impl Into<String>,
    ) -> Self {
        Token {
            kind,
            value: value.into(),
            line,
            column,
            file: file.into(),
        }
    }

    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.file.clone(), self.line, self.column)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind.is_structural() {
            write!(f, "Token({}, {}:{})", self.kind.name(), self.line, self.column)
        } else {
            write!(
                f,
                "Token({}, '{}', {}:{})",
                self.kind.name(),
                self.value,
                self.line,
                self.column
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_table_maps_structure_words() {
        assert_eq!(keyword("contract"), Some(TokenKind::Contract));
        assert_eq!(keyword("on_failure"), Some(TokenKind::OnFailure));
        assert_eq!(keyword("touches_nothing_else"), Some(TokenKind::TouchesNothingElse));
        assert_eq!(keyword("transfer"), None);
    }

    #[test]
    fn reserved_audit_words_are_keywords() {
        assert_eq!(keyword("show"), Some(TokenKind::Show));
        assert_eq!(keyword("all"), Some(TokenKind::All));
        assert_eq!(keyword("where"), Some(TokenKind::Where));
        assert_eq!(keyword("since"), Some(TokenKind::Since));
    }

    #[test]
    fn soft_keywords_exclude_control_flow() {
        assert!(TokenKind::Access.is_soft_keyword());
        assert!(TokenKind::Grants.is_soft_keyword());
        assert!(!TokenKind::If.is_soft_keyword());
        assert!(!TokenKind::Return.is_soft_keyword());
        assert!(!TokenKind::Has.is_soft_keyword());
        assert!(!TokenKind::Contract.is_soft_keyword());
    }

    #[test]
    fn structural_tokens_display_without_value() {
        let tok = Token::new(TokenKind::Indent, "", 3, 1, "a.cov");
        assert_eq!(tok.to_string(), "Token(INDENT, 3:1)");
    }

    #[test]
    fn value_tokens_display_with_value() {
        let tok = Token::new(TokenKind::Identifier, "ledger", 2, 5, "a.cov");
        assert_eq!(tok.to_string(), "Token(IDENTIFIER, 'ledger', 2:5)");
    }
}
