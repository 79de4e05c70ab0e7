//! The Replica rewrite machine
//!
//! One instruction shape, one memory cell. Each cycle tests whether the
//! current instruction's search string occurs in the data store,
//! replaces all occurrences at once if it does, and branches. The
//! machine has no halt instruction; termination is a property of the
//! program, and a non-terminating loop is legitimate behavior.

use std::fmt;

use crate::tape::{Delimiters, Instruction, Program, TapeError};

/// Execution and load failures.
#[derive(Debug, Clone)]
pub enum MachineError {
    /// The current location or a taken branch target falls outside the
    /// program.
    CounterOutOfRange { location: usize, len: usize },
    /// The serialized tape could not be decoded.
    Tape(TapeError),
}

impl fmt::Display for MachineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineError::CounterOutOfRange { location, len } => write!(
                f,
                "program counter out of range: location {} in a {}-instruction program",
                location, len
            ),
            MachineError::Tape(e) => write!(f, "bad tape: {}", e),
        }
    }
}

impl std::error::Error for MachineError {}

impl From<TapeError> for MachineError {
    fn from(e: TapeError) -> Self {
        MachineError::Tape(e)
    }
}

/// A running machine: the program, the data store, and the location.
///
/// The data store and location are the only mutable state, and only
/// [`Machine::step`] touches them.
pub struct Machine {
    program: Program,
    data: String,
    location: usize,
}

impl Machine {
    /// Decode a serialized tape and start a machine over `data`.
    ///
    /// Branch targets are not range-checked here: a tape whose last
    /// instruction falls through past the end is legitimate assembler
    /// output and only faults if that branch is actually taken. The
    /// initial location is checked, so an empty program cannot load.
    pub fn load(tape: &str, data: &str, delims: &Delimiters) -> Result<Self, MachineError> {
        let program = Program::parse(tape, delims)?;
        Self::new(program, data)
    }

    pub fn new(program: Program, data: &str) -> Result<Self, MachineError> {
        if program.is_empty() {
            return Err(MachineError::CounterOutOfRange {
                location: 0,
                len: 0,
            });
        }
        Ok(Self {
            program,
            data: data.to_string(),
            location: 0,
        })
    }

    pub fn location(&self) -> usize {
        self.location
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// The instruction the location currently addresses.
    pub fn current_instruction(&self) -> Result<&Instruction, MachineError> {
        self.program
            .get(self.location)
            .ok_or(MachineError::CounterOutOfRange {
                location: self.location,
                len: self.program.len(),
            })
    }

    /// Execute one cycle. Returns whether the search matched.
    ///
    /// A fault leaves the data store and the location exactly as they
    /// were: the branch target is validated before any replacement
    /// happens.
    pub fn step(&mut self) -> Result<bool, MachineError> {
        // Field borrow, not the accessor: the replacement below needs
        // the data store while the instruction is still held.
        let inst = self
            .program
            .get(self.location)
            .ok_or(MachineError::CounterOutOfRange {
                location: self.location,
                len: self.program.len(),
            })?;

        // The empty search string vacuously occurs in any store,
        // including the empty one.
        let found = self.data.contains(&inst.search);
        let target = if found { inst.on_match } else { inst.on_no_match };

        if target >= self.program.len() {
            return Err(MachineError::CounterOutOfRange {
                location: target,
                len: self.program.len(),
            });
        }

        if found {
            // All non-overlapping occurrences, in one atomic step.
            self.data = self.data.replace(&inst.search, &inst.replacement);
        }
        self.location = target;
        Ok(found)
    }

    /// Execute up to `cycles` cycles, stopping on the first fault.
    pub fn run(&mut self, cycles: usize) -> Result<(), MachineError> {
        for _ in 0..cycles {
            self.step()?;
        }
        Ok(())
    }
}
