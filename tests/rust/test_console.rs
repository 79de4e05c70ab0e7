//! Console command parsing tests

use replica_lang::console::{parse_command, Command};

#[test]
fn break_ends_the_session() {
    assert_eq!(parse_command("break"), Some(Command::Break));
}

#[test]
fn bare_number_steps_loudly() {
    assert_eq!(
        parse_command("5"),
        Some(Command::Step {
            cycles: 5,
            quietly: false
        })
    );
}

#[test]
fn quietly_suffix_suppresses_per_cycle_printing() {
    assert_eq!(
        parse_command("12 quietly"),
        Some(Command::Step {
            cycles: 12,
            quietly: true
        })
    );
}

#[test]
fn zero_steps_is_a_valid_command() {
    assert_eq!(
        parse_command("0"),
        Some(Command::Step {
            cycles: 0,
            quietly: false
        })
    );
}

#[test]
fn empty_input_is_unrecognized() {
    assert_eq!(parse_command(""), None);
}

#[test]
fn quietly_alone_is_unrecognized() {
    assert_eq!(parse_command("quietly"), None);
}

#[test]
fn junk_is_unrecognized() {
    assert_eq!(parse_command("onwards"), None);
}

#[test]
fn trailing_words_other_than_quietly_are_tolerated() {
    // Only the first word and the "quietly" suffix matter; anything
    // between is ignored.
    assert_eq!(
        parse_command("3 steps please"),
        Some(Command::Step {
            cycles: 3,
            quietly: false
        })
    );
}
