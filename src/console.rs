//! Interactive stepping console
//!
//! A thin collaborator around the machine: per user command it runs N
//! cycles (optionally without per-cycle printing) or ends the session.
//! It reads the location, the addressed instruction, and the data store
//! for display only; all mutation goes through [`Machine::step`].

use std::io::{self, BufRead, Write};

use crate::tape::{format_line, Delimiters};
use crate::vm::Machine;

const PROMPT: &str = "[<steps>[ quietly]|break] >->->";

/// A parsed console command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Step { cycles: usize, quietly: bool },
    Break,
}

/// Parse one input line. `None` means unrecognized.
pub fn parse_command(input: &str) -> Option<Command> {
    if input == "break" {
        return Some(Command::Break);
    }
    let cycles: usize = input.split(' ').next()?.parse().ok()?;
    Some(Command::Step {
        cycles,
        quietly: input.ends_with("quietly"),
    })
}

/// The console session. Holds the "repeat last command on empty input"
/// cache; the machine itself stays outside.
#[derive(Default)]
pub struct Console {
    last_input: String,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive the machine from stdin until `break` or EOF.
    pub fn run(&mut self, machine: &mut Machine, delims: &Delimiters) -> io::Result<()> {
        print_state(machine, delims);
        let stdin = io::stdin();
        loop {
            print!("{}", PROMPT);
            io::stdout().flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                break;
            }
            let mut input = line.trim().to_string();
            if input.is_empty() {
                if self.last_input.is_empty() {
                    continue;
                }
                input = self.last_input.clone();
            }
            self.last_input = input.clone();

            match parse_command(&input) {
                Some(Command::Break) => break,
                Some(Command::Step { cycles, quietly }) => {
                    for _ in 0..cycles {
                        if !quietly {
                            print_state(machine, delims);
                        }
                        if let Err(e) = machine.step() {
                            eprintln!("fault: {}", e);
                            break;
                        }
                    }
                    print_state(machine, delims);
                }
                None => eprintln!("unrecognized command: {:?}", input),
            }
        }
        Ok(())
    }
}

/// The state box printed between commands: the addressed instruction
/// and the data store.
pub fn print_state(machine: &Machine, delims: &Delimiters) {
    let current = match machine.current_instruction() {
        Ok(inst) => format_line(machine.location(), &inst.render(delims)),
        Err(_) => format!("{:.>4}: <out of range>", machine.location()),
    };
    println!(
        "  /--------------------------------\n  |\n  |{}\n  |\n  |{}\n  |\n  \\-",
        current,
        machine.data()
    );
}
