//! Resolution pass tests — folding, lowering, label and jump fixups

use replica_lang::asm::{compile, CompileError, Severity};
use replica_lang::tape::{Delimiters, Program};

// ── Helpers ──────────────────────────────────────────────────────

fn tape(source: &str) -> String {
    compile(source)
        .unwrap()
        .program
        .serialize(&Delimiters::default())
}

fn warnings(source: &str) -> Vec<String> {
    compile(source)
        .unwrap()
        .diagnostics
        .into_iter()
        .filter(|d| d.severity == Severity::Warning)
        .map(|d| d.message)
        .collect()
}

// ── Fall-through defaults ────────────────────────────────────────

#[test]
fn replace_without_branch_falls_through_both_ways() {
    assert_eq!(tape("{REPLACE}\na\nb\n{FIND}\nc"), "a`b`1`1;c`c`10`10");
}

// ── Conditional jump folding ─────────────────────────────────────

#[test]
fn conditional_jump_folds_into_preceding_find() {
    assert_eq!(tape("{LABEL start}\n{FIND}\na\n{IF SUCCESSFUL JUMP start}"), "a`a`0`1");
}

#[test]
fn conditional_jump_failure_path_skips_the_directive() {
    let t = tape(
        "{FIND}\na\n{IF SUCCESSFUL JUMP done}\n{FIND}\nb\n{LABEL done}\n{FIND}\nc",
    );
    assert_eq!(t, "a`a`10`1;b`b`10`10;c`c`11`11");
}

#[test]
fn orphaned_conditional_jump_is_dropped_with_a_warning() {
    let source = "{IF SUCCESSFUL JUMP nowhere}\n{FIND}\na";
    assert_eq!(tape(source), "a`a`1`1");
    let w = warnings(source);
    assert_eq!(w.len(), 1);
    assert!(w[0].contains("orphaned conditional jump"));
}

// ── Unconditional jump lowering ──────────────────────────────────

#[test]
fn jump_lowers_to_empty_search_replace() {
    assert_eq!(tape("{JUMP end}\n{LABEL end}\n{FIND}\nz"), "``1`1;z`z`10`10");
}

#[test]
fn jump_to_itself_warns_but_compiles() {
    let source = "{LABEL me}\n{JUMP me}";
    assert_eq!(tape(source), "``0`0");
    let w = warnings(source);
    assert!(w.iter().any(|m| m.contains("jumps to itself")));
}

// ── Label resolution ─────────────────────────────────────────────

#[test]
fn label_resolution_is_deterministic_across_renames() {
    let a = tape("{LABEL top}\n{FIND}\nq\n{IF SUCCESSFUL JUMP top}");
    let b = tape("{LABEL elsewhere}\n{FIND}\nq\n{IF SUCCESSFUL JUMP elsewhere}");
    assert_eq!(a, b);
}

#[test]
fn consecutive_labels_resolve_to_the_same_instruction() {
    assert_eq!(
        tape("{JUMP a}\n{LABEL a}\n{LABEL b}\n{FIND}\nz"),
        tape("{JUMP b}\n{LABEL a}\n{LABEL b}\n{FIND}\nz")
    );
}

#[test]
fn unknown_label_is_a_label_error() {
    let e = compile("{JUMP nowhere}\n{FIND}\na").unwrap_err();
    match e {
        CompileError::Label { message } => assert!(message.contains("nowhere")),
        other => panic!("expected a label error, got {:?}", other),
    }
}

#[test]
fn label_at_the_end_only_warns() {
    let source = "{FIND}\na\n{LABEL tail}";
    assert_eq!(tape(source), "a`a`1`1");
    let w = warnings(source);
    assert!(w.iter().any(|m| m.contains("tail")));
}

#[test]
fn jumping_to_an_end_label_is_a_label_error() {
    let e = compile("{JUMP tail}\n{FIND}\na\n{LABEL tail}").unwrap_err();
    assert!(matches!(e, CompileError::Label { .. }));
}

#[test]
fn redeclared_label_keeps_the_last_declaration() {
    let t = tape("{JUMP x}\n{LABEL x}\n{FIND}\na\n{LABEL x}\n{FIND}\nb");
    assert_eq!(t, "``10`10;a`a`10`10;b`b`11`11");
}

// ── REPLACE FOREVER lowering ─────────────────────────────────────

#[test]
fn replace_forever_compiles_to_a_two_node_loop() {
    assert_eq!(tape("{REPLACE FOREVER}\naa\na"), "aa`a`1`1;aa`a`0`10");
}

#[test]
fn replace_forever_exits_through_a_trailing_conditional_jump() {
    let t = tape(
        "{REPLACE FOREVER}\naa\na\n{IF SUCCESSFUL JUMP done}\n{FIND}\nx\n{LABEL done}\n{FIND}\ny",
    );
    assert_eq!(t, "aa`a`1`1;aa`a`0`11;x`x`11`11;y`y`100`100");
}

// ── Round trip ───────────────────────────────────────────────────

#[test]
fn closed_program_round_trips_with_targets_in_range() {
    let source = "{LABEL loop}\n{REPLACE}\na\nb\n{JUMP loop}";
    let compiled = compile(source).unwrap().program;
    let delims = Delimiters::default();
    let text = compiled.serialize(&delims);
    assert_eq!(text, "a`b`1`1;``0`0");

    let decoded = Program::parse(&text, &delims).unwrap();
    assert_eq!(decoded, compiled);
    for inst in &decoded.instructions {
        assert!(inst.on_match < decoded.len());
        assert!(inst.on_no_match < decoded.len());
    }
}
