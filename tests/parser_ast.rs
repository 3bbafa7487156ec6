//! Parser integration tests over complete source files.

mod common;

use common::{parse, parse_err};
use covenant::ast::{RiskLevel, Statement};

const TRANSFER_EXAMPLE: &str = concat!(
    "intent: \"Transfer funds between two accounts\"\n",
    "scope: finance.transfers\n",
    "risk: high\n",
    "requires: [auth.verified, ledger.write_access]\n",
    "\n",
    "contract transfer(from: Account, to: Account, amount: Currency) -> TransferResult\n",
    "  precondition:\n",
    "    from.balance >= amount\n",
    "    amount > Currency(0)\n",
    "\n",
    "  postcondition:\n",
    "    from.balance == old(from.balance) - amount\n",
    "    to.balance == old(to.balance) + amount\n",
    "\n",
    "  effects:\n",
    "    modifies [from.balance, to.balance]\n",
    "    emits TransferEvent\n",
    "    touches_nothing_else\n",
    "\n",
    "  body:\n",
    "    hold = ledger.escrow(from, amount)\n",
    "    ledger.deposit(to, hold)\n",
    "    emit TransferEvent(from, to, amount)\n",
    "    return TransferResult.success()\n",
    "\n",
    "  on_failure:\n",
    "    ledger.rollback(hold)\n",
    "    return TransferResult.insufficient_funds()\n",
);

#[test]
fn transfer_example_parses_completely() {
    let program = parse(TRANSFER_EXAMPLE);

    let header = program.header.as_ref().expect("header");
    assert_eq!(
        header.intent.as_ref().unwrap().text,
        "Transfer funds between two accounts"
    );
    assert_eq!(header.risk.as_ref().unwrap().level, RiskLevel::High);

    let c = &program.contracts[0];
    assert_eq!(c.name, "transfer");
    assert_eq!(c.params.len(), 3);
    assert_eq!(c.precondition.as_ref().unwrap().conditions.len(), 2);
    assert_eq!(c.postcondition.as_ref().unwrap().conditions.len(), 2);
    assert_eq!(c.effects.as_ref().unwrap().declarations.len(), 3);
    assert_eq!(c.body.as_ref().unwrap().statements.len(), 4);
    assert_eq!(c.on_failure.as_ref().unwrap().statements.len(), 2);
}

#[test]
fn transfer_body_statement_shapes() {
    let program = parse(TRANSFER_EXAMPLE);
    let stmts = &program.contracts[0].body.as_ref().unwrap().statements;
    assert!(matches!(&stmts[0], Statement::Assignment { target, .. } if target == "hold"));
    assert!(matches!(&stmts[1], Statement::Expr { .. }));
    assert!(matches!(&stmts[2], Statement::Emit { .. }));
    assert!(matches!(&stmts[3], Statement::Return { .. }));
}

#[test]
fn body_is_structurally_optional() {
    // The checker reports missing bodies; the grammar allows them
    let program = parse("contract bad() -> Void\n  precondition:\n    true\n");
    assert!(program.contracts[0].body.is_none());
}

#[test]
fn statement_at_top_level_is_rejected() {
    let err = parse_err("return 42\n");
    assert!(err.message.contains("Expected 'contract', 'type', or 'shared'"));
    assert_eq!(err.token.line, 1);
}

#[test]
fn parse_error_cites_offending_token_location() {
    let err = parse_err("contract f() -> Unit\n  nonsense:\n    1\n");
    assert_eq!(err.token.line, 2);
    assert_eq!(err.token.column, 3);
    assert_eq!(err.token.file, "test.cov");
}

#[test]
fn every_node_location_points_into_the_source() {
    let program = parse(TRANSFER_EXAMPLE);
    let line_count = TRANSFER_EXAMPLE.lines().count() as u32;

    let c = &program.contracts[0];
    let mut locations = vec![c.loc.clone(), c.return_type.loc().clone()];
    locations.extend(c.params.iter().map(|p| p.loc.clone()));
    locations.extend(
        c.body
            .as_ref()
            .unwrap()
            .statements
            .iter()
            .map(|s| s.loc().clone()),
    );

    for loc in locations {
        assert!(loc.line >= 1 && loc.line <= line_count, "line {} out of range", loc.line);
        assert!(loc.column >= 1, "columns are 1-based");
        assert_eq!(loc.file, "test.cov");
    }
}

#[test]
fn mixed_top_level_items_parse_in_source_order() {
    let source = concat!(
        "type Account = Record\n",
        "  fields:\n",
        "    balance: Currency\n",
        "\n",
        "shared ledger: Ledger\n",
        "  access: transactional\n",
        "\n",
        "contract read_balance(a: Account) -> Currency\n",
        "  body:\n",
        "    return a.balance\n",
    );
    let program = parse(source);
    assert_eq!(program.type_defs.len(), 1);
    assert_eq!(program.shared_decls.len(), 1);
    assert_eq!(program.contracts.len(), 1);
}
