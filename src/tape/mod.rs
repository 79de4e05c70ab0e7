//! Replica tape format — the serialized program the machine executes
//!
//! A compiled tape is a flat text string: instructions joined by the
//! instruction delimiter, and within each instruction its four fields
//! joined by the argument delimiter. Jump targets are unsigned base-2
//! digit strings with no prefix and no fixed width.

use std::fmt;

use serde::Serialize;

/// Delimiters used by the tape text format.
///
/// Threaded explicitly through serialization and loading rather than
/// held as globals; `;` and `` ` `` are the defaults every existing
/// Replica program uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    pub instruction: char,
    pub argument: char,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            instruction: ';',
            argument: '`',
        }
    }
}

/// The only instruction the machine knows: search the data store,
/// replace all occurrences on a hit, then branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instruction {
    pub search: String,
    pub replacement: String,
    /// Next location when `search` occurred in the data store.
    pub on_match: usize,
    /// Next location when it did not.
    pub on_no_match: usize,
}

impl Instruction {
    /// Render the instruction as one tape word.
    pub fn render(&self, delims: &Delimiters) -> String {
        format!(
            "{}{d}{}{d}{:b}{d}{:b}",
            self.search,
            self.replacement,
            self.on_match,
            self.on_no_match,
            d = delims.argument
        )
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(&Delimiters::default()))
    }
}

/// Error decoding a tape: wrong field count or a non-binary jump target.
#[derive(Debug, Clone)]
pub struct TapeError {
    pub message: String,
    /// Index of the offending instruction word, when known.
    pub index: Option<usize>,
}

impl fmt::Display for TapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "instruction {}: {}", i, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for TapeError {}

/// An ordered, immutable sequence of instructions, 0-indexed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    pub instructions: Vec<Instruction>,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    /// Decode a serialized tape. The empty string is the empty program.
    pub fn parse(text: &str, delims: &Delimiters) -> Result<Self, TapeError> {
        if text.is_empty() {
            return Ok(Self::default());
        }
        let mut instructions = Vec::new();
        for (i, word) in text.split(delims.instruction).enumerate() {
            let fields: Vec<&str> = word.split(delims.argument).collect();
            if fields.len() != 4 {
                return Err(TapeError {
                    message: format!(
                        "expected 4 fields separated by '{}', got {}: {:?}",
                        delims.argument,
                        fields.len(),
                        word
                    ),
                    index: Some(i),
                });
            }
            let on_match = parse_target(fields[2], i)?;
            let on_no_match = parse_target(fields[3], i)?;
            instructions.push(Instruction {
                search: fields[0].to_string(),
                replacement: fields[1].to_string(),
                on_match,
                on_no_match,
            });
        }
        Ok(Self { instructions })
    }

    /// Serialize back to tape text.
    pub fn serialize(&self, delims: &Delimiters) -> String {
        let words: Vec<String> = self
            .instructions
            .iter()
            .map(|inst| inst.render(delims))
            .collect();
        words.join(&delims.instruction.to_string())
    }

    /// A numbered human-readable listing of the whole program.
    pub fn listing(&self, delims: &Delimiters) -> String {
        self.instructions
            .iter()
            .enumerate()
            .map(|(i, inst)| format_line(i, &inst.render(delims)))
            .collect::<Vec<String>>()
            .join(&format!("{}\n", delims.instruction))
    }
}

fn parse_target(field: &str, index: usize) -> Result<usize, TapeError> {
    usize::from_str_radix(field, 2).map_err(|_| TapeError {
        message: format!("jump target is not a base-2 integer: {:?}", field),
        index: Some(index),
    })
}

/// One listing line: decimal location, its binary form, then the
/// instruction text, with dot padding.
pub fn format_line(location: usize, text: &str) -> String {
    format!("{:.>4}: {:.>10}: {}", location, format!("{:b}", location), text)
}
