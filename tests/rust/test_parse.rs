//! Directive grammar tests — pass 1 of the assembler

use replica_lang::asm::{compile, CompileError};
use replica_lang::tape::Delimiters;

// ── Helpers ──────────────────────────────────────────────────────

fn tape(source: &str) -> String {
    compile(source)
        .unwrap()
        .program
        .serialize(&Delimiters::default())
}

fn err(source: &str) -> CompileError {
    compile(source).unwrap_err()
}

fn syntax_line(source: &str) -> usize {
    match err(source) {
        CompileError::Syntax { line, .. } => line,
        other => panic!("expected a syntax error, got {:?}", other),
    }
}

// ── Single directives ────────────────────────────────────────────

#[test]
fn find_compiles_to_self_replace() {
    assert_eq!(tape("{FIND}\nabc"), "abc`abc`1`1");
}

#[test]
fn replace_takes_two_operand_lines() {
    assert_eq!(tape("{REPLACE}\nfoo\nbar"), "foo`bar`1`1");
}

#[test]
fn replace_once_compiles_like_replace() {
    assert_eq!(tape("{REPLACE ONCE}\nfoo\nbar"), tape("{REPLACE}\nfoo\nbar"));
}

#[test]
fn blank_line_sentinel_becomes_empty_replacement() {
    assert_eq!(tape("{REPLACE}\nfoo\n{BLANK LINE}"), "foo``1`1");
}

#[test]
fn blank_line_sentinel_works_in_search_position() {
    assert_eq!(tape("{REPLACE}\n{BLANK LINE}\nxyz"), "`xyz`1`1");
}

// ── Ignored lines ────────────────────────────────────────────────

#[test]
fn comments_and_blank_lines_are_skipped() {
    assert_eq!(tape("// header comment\n\n   \n{FIND}\nz\n  // trailing"), "z`z`1`1");
}

#[test]
fn empty_source_compiles_to_empty_tape() {
    assert_eq!(tape(""), "");
}

#[test]
fn crlf_line_endings_are_normalized() {
    assert_eq!(tape("{FIND}\r\nabc"), "abc`abc`1`1");
}

// ── Syntax errors ────────────────────────────────────────────────

#[test]
fn unrecognized_line_is_a_syntax_error() {
    let e = err("HELLO");
    match e {
        CompileError::Syntax { line, text, .. } => {
            assert_eq!(line, 1);
            assert_eq!(text, "HELLO");
        }
        other => panic!("expected a syntax error, got {:?}", other),
    }
}

#[test]
fn syntax_error_reports_the_offending_line_number() {
    assert_eq!(syntax_line("{FIND}\na\nwhat is this"), 3);
}

#[test]
fn label_missing_closing_brace() {
    assert_eq!(syntax_line("{LABEL foo"), 1);
}

#[test]
fn jump_missing_closing_brace() {
    assert_eq!(syntax_line("{JUMP foo"), 1);
}

#[test]
fn conditional_jump_missing_closing_brace() {
    assert_eq!(syntax_line("{IF SUCCESSFUL JUMP foo"), 1);
}

#[test]
fn find_with_trailing_junk_is_rejected() {
    assert_eq!(syntax_line("{FIND} extra"), 1);
}

#[test]
fn truncated_find_is_a_syntax_error() {
    assert!(matches!(err("{FIND}"), CompileError::Syntax { .. }));
}

#[test]
fn truncated_replace_is_a_syntax_error() {
    assert!(matches!(err("{REPLACE}\nfoo"), CompileError::Syntax { .. }));
}

#[test]
fn truncated_replace_forever_is_a_syntax_error() {
    assert!(matches!(
        err("{REPLACE FOREVER}\naa"),
        CompileError::Syntax { .. }
    ));
}

#[test]
fn no_partial_program_on_error() {
    // The bad line comes after a valid directive; compilation still
    // yields nothing at all.
    assert!(compile("{FIND}\na\ngarbage here").is_err());
}
