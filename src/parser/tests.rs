use super::Parser;
use crate::ast::{
    BinaryOpKind, EffectDecl, Expr, FlowConstraint, NumberValue, Program, RiskLevel, Statement,
    TypeExpr,
};
use crate::error::ParseError;
use crate::lexer::Lexer;

fn parse(source: &str) -> Program {
    let tokens = Lexer::new(source, "test.cov").tokenize().expect("lex should succeed");
    Parser::new(tokens).parse().expect("parse should succeed")
}

fn parse_err(source: &str) -> ParseError {
    let tokens = Lexer::new(source, "test.cov").tokenize().expect("lex should succeed");
    Parser::new(tokens).parse().expect_err("parse should fail")
}

fn body_statements(program: &Program) -> &[Statement] {
    &program.contracts[0].body.as_ref().expect("contract body").statements
}

// ---------------------------------------------------------------------------
// File header
// ---------------------------------------------------------------------------

#[test]
fn intent_only_header() {
    let program = parse("intent: \"Manage the ledger\"\n");
    let header = program.header.expect("header");
    assert_eq!(header.intent.unwrap().text, "Manage the ledger");
    assert!(header.scope.is_none());
    assert!(header.risk.is_none());
}

#[test]
fn full_header() {
    let source = "intent: \"Transfer funds\"\n\
                  scope: finance.transfers\n\
                  risk: high\n\
                  requires: [auth.verified, ledger.write_access]\n";
    let program = parse(source);
    let header = program.header.expect("header");
    assert_eq!(header.scope.unwrap().path, "finance.transfers");
    assert_eq!(header.risk.unwrap().level, RiskLevel::High);
    assert_eq!(
        header.requires.unwrap().capabilities,
        vec!["auth.verified", "ledger.write_access"]
    );
}

#[test]
fn no_header_means_none() {
    let program = parse("contract f(x: Int) -> Int\n  body:\n    return x\n");
    assert!(program.header.is_none());
    assert_eq!(program.contracts.len(), 1);
}

#[test]
fn all_risk_levels_parse() {
    for (word, level) in [
        ("low", RiskLevel::Low),
        ("medium", RiskLevel::Medium),
        ("high", RiskLevel::High),
        ("critical", RiskLevel::Critical),
    ] {
        let program = parse(&format!("risk: {}\n", word));
        assert_eq!(program.header.unwrap().risk.unwrap().level, level);
    }
}

// ---------------------------------------------------------------------------
// Contracts
// ---------------------------------------------------------------------------

#[test]
fn minimal_contract() {
    let program = parse("contract noop(x: Int) -> Unit\n  body:\n    return x\n");
    let c = &program.contracts[0];
    assert_eq!(c.name, "noop");
    assert_eq!(c.params.len(), 1);
    assert_eq!(c.params[0].name, "x");
    assert!(matches!(&c.return_type, TypeExpr::Simple { name, .. } if name == "Unit"));
    assert!(c.precondition.is_none());
    assert!(c.on_failure.is_none());
}

#[test]
fn contract_without_body_parses() {
    let program = parse("contract ghost() -> Unit\n  precondition:\n    true\n");
    assert!(program.contracts[0].body.is_none());
}

#[test]
fn precondition_and_postcondition_collect_one_expr_per_line() {
    let source = "contract f(x: Int) -> Int\n\
                  \x20\x20precondition:\n\
                  \x20\x20\x20\x20x > 0\n\
                  \x20\x20\x20\x20x < 100\n\
                  \x20\x20postcondition:\n\
                  \x20\x20\x20\x20result == x + 1\n\
                  \x20\x20body:\n\
                  \x20\x20\x20\x20return x + 1\n";
    let program = parse(source);
    let c = &program.contracts[0];
    assert_eq!(c.precondition.as_ref().unwrap().conditions.len(), 2);
    assert_eq!(c.postcondition.as_ref().unwrap().conditions.len(), 1);
}

#[test]
fn effects_declarations_parse_in_order() {
    let source = "contract f(a: Account) -> Unit\n\
                  \x20\x20effects:\n\
                  \x20\x20\x20\x20modifies [a.balance, ledger.entries]\n\
                  \x20\x20\x20\x20reads [rates]\n\
                  \x20\x20\x20\x20emits AuditEvent\n\
                  \x20\x20\x20\x20touches_nothing_else\n\
                  \x20\x20body:\n\
                  \x20\x20\x20\x20a.balance = 0\n";
    let program = parse(source);
    let decls = &program.contracts[0].effects.as_ref().unwrap().declarations;
    assert_eq!(decls.len(), 4);
    assert!(matches!(&decls[0], EffectDecl::Modifies { targets, .. }
        if targets == &["a.balance".to_string(), "ledger.entries".to_string()]));
    assert!(matches!(&decls[1], EffectDecl::Reads { targets, .. }
        if targets == &["rates".to_string()]));
    assert!(matches!(&decls[2], EffectDecl::Emits { event, .. } if event == "AuditEvent"));
    assert!(matches!(&decls[3], EffectDecl::TouchesNothingElse { .. }));
}

#[test]
fn permissions_block_with_escalation_tail() {
    let source = "contract f() -> Unit\n\
                  \x20\x20permissions:\n\
                  \x20\x20\x20\x20grants: [read(record.name), network_access]\n\
                  \x20\x20\x20\x20denies: [delete_record]\n\
                  \x20\x20\x20\x20escalation: notify security team\n\
                  \x20\x20body:\n\
                  \x20\x20\x20\x20return true\n";
    let program = parse(source);
    let perms = program.contracts[0].permissions.as_ref().unwrap();
    assert_eq!(
        perms.grants.as_ref().unwrap().permissions,
        vec!["read(record.name)", "network_access"]
    );
    assert_eq!(perms.denies.as_ref().unwrap().permissions, vec!["delete_record"]);
    assert_eq!(perms.escalation.as_ref().unwrap().policy, "notify security team");
}

#[test]
fn duplicate_section_is_rejected() {
    let source = "contract f() -> Unit\n\
                  \x20\x20body:\n\
                  \x20\x20\x20\x20return true\n\
                  \x20\x20body:\n\
                  \x20\x20\x20\x20return false\n";
    let err = parse_err(source);
    assert!(err.message.contains("Duplicate 'body'"), "got: {}", err.message);
}

#[test]
fn invalid_top_level_token_is_rejected() {
    let err = parse_err("banana\n");
    assert!(err.message.contains("Expected 'contract', 'type', or 'shared'"));
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

#[test]
fn assignment_flattens_field_chain_to_dotted_target() {
    let program = parse("contract f(a: Account) -> Unit\n  body:\n    a.owner.name = \"new\"\n");
    match &body_statements(&program)[0] {
        Statement::Assignment { target, .. } => assert_eq!(target, "a.owner.name"),
        other => panic!("expected assignment, got {:?}", other),
    }
}

#[test]
fn assignment_to_call_result_is_rejected() {
    let err = parse_err("contract f() -> Unit\n  body:\n    g() = 1\n");
    assert!(err.message.contains("Invalid assignment target"));
}

#[test]
fn emit_statement_wraps_event_expr() {
    let program = parse("contract f(x: Int) -> Unit\n  body:\n    emit Transfer(x)\n");
    assert!(matches!(&body_statements(&program)[0], Statement::Emit { .. }));
}

#[test]
fn if_else_blocks_parse() {
    let source = "contract f(x: Int) -> Int\n\
                  \x20\x20body:\n\
                  \x20\x20\x20\x20if x > 0:\n\
                  \x20\x20\x20\x20\x20\x20return x\n\
                  \x20\x20\x20\x20else:\n\
                  \x20\x20\x20\x20\x20\x20return 0\n";
    let program = parse(source);
    match &body_statements(&program)[0] {
        Statement::If { then_body, else_body, .. } => {
            assert_eq!(then_body.len(), 1);
            assert_eq!(else_body.len(), 1);
        }
        other => panic!("expected if, got {:?}", other),
    }
}

#[test]
fn for_and_while_loops_parse() {
    let source = "contract f(items: List) -> Unit\n\
                  \x20\x20body:\n\
                  \x20\x20\x20\x20for item in items:\n\
                  \x20\x20\x20\x20\x20\x20process(item)\n\
                  \x20\x20\x20\x20while pending > 0:\n\
                  \x20\x20\x20\x20\x20\x20drain()\n";
    let program = parse(source);
    let stmts = body_statements(&program);
    assert!(matches!(&stmts[0], Statement::For { var, .. } if var == "item"));
    assert!(matches!(&stmts[1], Statement::While { .. }));
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

#[test]
fn multiplication_binds_tighter_than_addition() {
    let program = parse("contract f(x: Int) -> Int\n  body:\n    return 2 + 3 * 4\n");
    match &body_statements(&program)[0] {
        Statement::Return { value, .. } => match value {
            Expr::Binary { op, right, .. } => {
                assert_eq!(*op, BinaryOpKind::Add);
                assert!(matches!(**right, Expr::Binary { op: BinaryOpKind::Multiply, .. }));
            }
            other => panic!("expected binary, got {:?}", other),
        },
        other => panic!("expected return, got {:?}", other),
    }
}

#[test]
fn chained_comparison_groups_left() {
    let program = parse("contract f(a: Int, b: Int, c: Int) -> Bool\n  body:\n    return a < b < c\n");
    match &body_statements(&program)[0] {
        Statement::Return { value, .. } => match value {
            Expr::Binary { op, left, .. } => {
                assert_eq!(*op, BinaryOpKind::Lt);
                assert!(matches!(**left, Expr::Binary { op: BinaryOpKind::Lt, .. }));
            }
            other => panic!("expected binary, got {:?}", other),
        },
        other => panic!("expected return, got {:?}", other),
    }
}

#[test]
fn has_expression_parses_subject_and_capability() {
    let program = parse("contract f(user: User) -> Bool\n  body:\n    return user has admin.rights\n");
    match &body_statements(&program)[0] {
        Statement::Return { value, .. } => assert!(matches!(value, Expr::Has { .. })),
        other => panic!("expected return, got {:?}", other),
    }
}

#[test]
fn old_expression_wraps_inner() {
    let program = parse("contract f(x: Int) -> Int\n  body:\n    return old(x) + 1\n");
    match &body_statements(&program)[0] {
        Statement::Return { value, .. } => match value {
            Expr::Binary { left, .. } => assert!(matches!(**left, Expr::Old { .. })),
            other => panic!("expected binary, got {:?}", other),
        },
        other => panic!("expected return, got {:?}", other),
    }
}

#[test]
fn call_collects_positional_and_keyword_args() {
    let program = parse("contract f(x: Int) -> Unit\n  body:\n    log(x, 1, level: \"info\")\n");
    match &body_statements(&program)[0] {
        Statement::Expr { expr, .. } => match expr {
            Expr::Call { args, kwargs, .. } => {
                assert_eq!(args.len(), 2);
                assert_eq!(kwargs.len(), 1);
                assert_eq!(kwargs[0].0, "level");
            }
            other => panic!("expected call, got {:?}", other),
        },
        other => panic!("expected expr stmt, got {:?}", other),
    }
}

#[test]
fn method_call_chains_parse() {
    let program = parse("contract f(a: Account) -> Unit\n  body:\n    a.history.latest().undo()\n");
    match &body_statements(&program)[0] {
        Statement::Expr { expr, .. } => {
            assert!(matches!(expr, Expr::MethodCall { method, .. } if method == "undo"));
        }
        other => panic!("expected expr stmt, got {:?}", other),
    }
}

#[test]
fn soft_keywords_allowed_in_dotted_names() {
    // `access` and `audit` are keywords, yet valid as path segments
    let program = parse("contract f(l: Ledger) -> Unit\n  body:\n    l.access.audit = \"on\"\n");
    match &body_statements(&program)[0] {
        Statement::Assignment { target, .. } => assert_eq!(target, "l.access.audit"),
        other => panic!("expected assignment, got {:?}", other),
    }
}

#[test]
fn control_flow_keywords_are_not_names() {
    let err = parse_err("contract f(x: Int) -> Unit\n  body:\n    x.if = 1\n");
    assert!(err.message.contains("Expected identifier"));
}

#[test]
fn number_literals_parse_as_int_and_float() {
    let program = parse("contract f() -> Unit\n  body:\n    x = 42\n    y = 3.25\n");
    let stmts = body_statements(&program);
    match (&stmts[0], &stmts[1]) {
        (
            Statement::Assignment { value: Expr::Number { value: a, .. }, .. },
            Statement::Assignment { value: Expr::Number { value: b, .. }, .. },
        ) => {
            assert_eq!(*a, NumberValue::Int(42));
            assert_eq!(*b, NumberValue::Float(3.25));
        }
        other => panic!("expected two number assignments, got {:?}", other),
    }
}

#[test]
fn list_literal_collects_elements() {
    let program = parse("contract f() -> Unit\n  body:\n    x = [1, 2, 3]\n");
    match &body_statements(&program)[0] {
        Statement::Assignment { value: Expr::List { elements, .. }, .. } => {
            assert_eq!(elements.len(), 3);
        }
        other => panic!("expected list assignment, got {:?}", other),
    }
}

// ---------------------------------------------------------------------------
// Type definitions and shared declarations
// ---------------------------------------------------------------------------

#[test]
fn type_def_with_annotated_fields_and_flow_constraints() {
    let source = "type Patient = Record\n\
                  \x20\x20fields:\n\
                  \x20\x20\x20\x20name: String [pii]\n\
                  \x20\x20\x20\x20age: Int\n\
                  \x20\x20flow_constraints:\n\
                  \x20\x20\x20\x20never_flows_to: [logs, network]\n\
                  \x20\x20\x20\x20requires_context: medical\n";
    let program = parse(source);
    let td = &program.type_defs[0];
    assert_eq!(td.name, "Patient");
    assert_eq!(td.base_type, "Record");
    assert_eq!(td.fields.len(), 2);
    assert!(matches!(&td.fields[0].type_expr,
        TypeExpr::Annotated { annotations, .. } if annotations == &["pii".to_string()]));
    assert_eq!(td.flow_constraints.len(), 2);
    assert!(matches!(&td.flow_constraints[0],
        FlowConstraint::NeverFlowsTo { destinations, .. } if destinations.len() == 2));
    assert!(matches!(&td.flow_constraints[1],
        FlowConstraint::RequiresContext { context, .. } if context == "medical"));
}

#[test]
fn shared_decl_captures_policy_words() {
    let source = "shared ledger: Ledger\n\
                  \x20\x20access: transactional\n\
                  \x20\x20isolation: serializable\n\
                  \x20\x20audit: full_history\n";
    let program = parse(source);
    let sd = &program.shared_decls[0];
    assert_eq!(sd.name, "ledger");
    assert_eq!(sd.type_name, "Ledger");
    assert_eq!(sd.access, "transactional");
    assert_eq!(sd.isolation, "serializable");
    assert_eq!(sd.audit, "full_history");
}

#[test]
fn two_contracts_parse_in_order() {
    let source = "contract a() -> Unit\n\
                  \x20\x20body:\n\
                  \x20\x20\x20\x20return 1\n\
                  contract b() -> Unit\n\
                  \x20\x20body:\n\
                  \x20\x20\x20\x20return 2\n";
    let program = parse(source);
    assert_eq!(program.contracts.len(), 2);
    assert_eq!(program.contracts[0].name, "a");
    assert_eq!(program.contracts[1].name, "b");
}

#[test]
fn node_locations_point_at_real_tokens() {
    let source = "contract f(x: Int) -> Int\n  body:\n    return x\n";
    let program = parse(source);
    let c = &program.contracts[0];
    assert_eq!(c.loc.line, 1);
    assert_eq!(c.loc.column, 1);
    let stmt = &c.body.as_ref().unwrap().statements[0];
    assert_eq!(stmt.loc().line, 3);
    assert_eq!(stmt.loc().column, 5);
}
