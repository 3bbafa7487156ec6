//! Lexer integration tests: token kinds, indentation handling, locations.

mod common;

use common::{kinds, lex, lex_err};
use covenant::token::TokenKind;

#[test]
fn empty_source_yields_only_eof() {
    let tokens = lex("");
    assert_eq!(kinds(&tokens), vec![TokenKind::Eof]);
}

#[test]
fn blank_lines_yield_only_eof() {
    let tokens = lex("\n\n   \n\n");
    assert_eq!(kinds(&tokens), vec![TokenKind::Eof]);
}

#[test]
fn keywords_are_recognized() {
    let tokens = lex("contract precondition effects body on_failure\n");
    assert_eq!(
        kinds(&tokens),
        vec![
            TokenKind::Contract,
            TokenKind::Precondition,
            TokenKind::Effects,
            TokenKind::Body,
            TokenKind::OnFailure,
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn non_keyword_words_are_identifiers() {
    let tokens = lex("transfer ledger _private x2\n");
    assert!(tokens[..4].iter().all(|t| t.kind == TokenKind::Identifier));
    assert_eq!(tokens[2].value, "_private");
}

#[test]
fn string_literal_value_is_unquoted() {
    let tokens = lex("\"hello world\"\n");
    assert_eq!(tokens[0].kind, TokenKind::Str);
    assert_eq!(tokens[0].value, "hello world");
}

#[test]
fn string_escapes_are_decoded() {
    let tokens = lex(r#""line\nbreak \t tab \\ slash \" quote \x literal""#);
    assert_eq!(tokens[0].value, "line\nbreak \t tab \\ slash \" quote x literal");
}

#[test]
fn integer_and_float_literals_keep_source_text() {
    let tokens = lex("42 007 3.25\n");
    assert_eq!(tokens[0].kind, TokenKind::Integer);
    assert_eq!(tokens[0].value, "42");
    assert_eq!(tokens[1].value, "007");
    assert_eq!(tokens[2].kind, TokenKind::Float);
    assert_eq!(tokens[2].value, "3.25");
}

#[test]
fn boolean_literals_have_their_own_kinds() {
    let tokens = lex("true false\n");
    assert_eq!(tokens[0].kind, TokenKind::True);
    assert_eq!(tokens[1].kind, TokenKind::False);
}

#[test]
fn comparison_operators_scan_as_two_char_tokens() {
    let tokens = lex("== != <= >= < >\n");
    assert_eq!(
        kinds(&tokens)[..6],
        [
            TokenKind::EqEq,
            TokenKind::NotEq,
            TokenKind::LtEq,
            TokenKind::GtEq,
            TokenKind::Lt,
            TokenKind::Gt,
        ]
    );
}

#[test]
fn arithmetic_and_punctuation() {
    let tokens = lex("+ - * / ( ) [ ] . , :\n");
    assert_eq!(
        kinds(&tokens)[..11],
        [
            TokenKind::Plus,
            TokenKind::Minus,
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::LBracket,
            TokenKind::RBracket,
            TokenKind::Dot,
            TokenKind::Comma,
            TokenKind::Colon,
        ]
    );
}

#[test]
fn assign_is_distinct_from_equals() {
    let tokens = lex("x = y == z\n");
    assert_eq!(tokens[1].kind, TokenKind::Assign);
    assert_eq!(tokens[3].kind, TokenKind::EqEq);
}

#[test]
fn single_indent_emits_one_indent_token() {
    let tokens = lex("a\n  b\n");
    let ks = kinds(&tokens);
    assert_eq!(ks.iter().filter(|k| **k == TokenKind::Indent).count(), 1);
    assert_eq!(ks.iter().filter(|k| **k == TokenKind::Dedent).count(), 1);
}

#[test]
fn dedent_across_multiple_levels_emits_one_per_level() {
    let tokens = lex("a\n  b\n    c\nd\n");
    // c (level 2) back to d (level 0) crosses two levels
    let mut dedents_before_d = 0;
    for tok in &tokens {
        if tok.kind == TokenKind::Dedent {
            dedents_before_d += 1;
        }
        if tok.kind == TokenKind::Identifier && tok.value == "d" {
            break;
        }
    }
    assert_eq!(dedents_before_d, 2);
}

#[test]
fn eof_drains_the_indent_stack() {
    let tokens = lex("a\n  b\n    c\n");
    let ks = kinds(&tokens);
    assert_eq!(
        &ks[ks.len() - 3..],
        &[TokenKind::Dedent, TokenKind::Dedent, TokenKind::Eof]
    );
}

#[test]
fn comment_only_lines_are_invisible() {
    let tokens = lex("-- a comment\n  -- indented comment\nx\n");
    assert_eq!(
        kinds(&tokens),
        vec![TokenKind::Identifier, TokenKind::Newline, TokenKind::Eof]
    );
}

#[test]
fn inline_comment_discards_rest_of_line() {
    let tokens = lex("x = 1 -- set it\n");
    assert_eq!(
        kinds(&tokens),
        vec![
            TokenKind::Identifier,
            TokenKind::Assign,
            TokenKind::Integer,
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn line_and_column_numbers_are_one_based() {
    let tokens = lex("abc\n  def\n");
    assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
    let def = tokens.iter().find(|t| t.value == "def").unwrap();
    assert_eq!((def.line, def.column), (2, 3));
}

#[test]
fn filename_is_propagated_to_every_token() {
    let tokens = covenant::lexer::Lexer::new("x\n", "ledger.cov")
        .tokenize()
        .unwrap();
    assert!(tokens.iter().all(|t| t.file == "ledger.cov"));
}

#[test]
fn contract_signature_scans_in_order() {
    let tokens = lex("contract transfer(from: Account) -> TransferResult\n");
    assert_eq!(
        kinds(&tokens)[..9],
        [
            TokenKind::Contract,
            TokenKind::Identifier,
            TokenKind::LParen,
            TokenKind::Identifier,
            TokenKind::Colon,
            TokenKind::Identifier,
            TokenKind::RParen,
            TokenKind::Arrow,
            TokenKind::Identifier,
        ]
    );
}

#[test]
fn effects_keywords_scan() {
    let tokens = lex("modifies reads emits touches_nothing_else\n");
    assert_eq!(
        kinds(&tokens)[..4],
        [
            TokenKind::Modifies,
            TokenKind::Reads,
            TokenKind::Emits,
            TokenKind::TouchesNothingElse,
        ]
    );
}

#[test]
fn old_and_has_scan_as_keywords() {
    let tokens = lex("old(x) has\n");
    assert_eq!(tokens[0].kind, TokenKind::Old);
    assert_eq!(tokens[4].kind, TokenKind::Has);
}

#[test]
fn unterminated_string_is_an_error() {
    let err = lex_err("\"no closing quote\n");
    assert!(err.message.contains("Unterminated string"));
    assert_eq!(err.line, 1);
}

#[test]
fn newline_inside_string_reports_string_start() {
    let err = lex_err("x = \"broken\nstring\"\n");
    assert!(err.message.contains("Unterminated string"));
    assert_eq!((err.line, err.column), (1, 5));
}

#[test]
fn unexpected_character_is_an_error() {
    let err = lex_err("x = @\n");
    assert!(err.message.contains("Unexpected character"));
}

#[test]
fn lexing_is_deterministic_across_runs() {
    let source = "intent: \"Audit\"\ncontract f(x: Int) -> Int\n  body:\n    return x * 2\n";
    assert_eq!(lex(source), lex(source));
}
