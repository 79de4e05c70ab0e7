//! The Replica assembler
//!
//! `compile` turns directive source into a finalized [`Program`]
//! through a fixed pass pipeline:
//!
//! 1. parse directives into the instruction graph
//! 2. fold conditional jumps into adjacent replace nodes
//! 3. lower unconditional jumps to empty-search replaces
//! 4. resolve labels to node ids and delete label nodes
//! 5. resolve all symbolic jumps to instruction indices
//!
//! followed by sentinel stripping and a structural validation. All
//! compile-time failures abort immediately; no partial program is ever
//! returned. Non-fatal findings come back as [`Diagnostic`]s.

pub mod graph;
pub mod parse;
pub mod passes;

use std::fmt;

use crate::tape::Program;

/// Fatal compile-time errors.
#[derive(Debug, Clone)]
pub enum CompileError {
    /// A source line matches no directive, or a bracketed directive is
    /// malformed or truncated.
    Syntax {
        line: usize,
        text: String,
        message: String,
    },
    /// A jump references a label that never resolves to an instruction.
    Label { message: String },
    /// An assembler invariant broke: something other than a finalized
    /// replace survived the passes.
    Structural { message: String },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Syntax {
                line,
                text,
                message,
            } => write!(f, "syntax error on line {}: {} ({:?})", line, message, text),
            CompileError::Label { message } => write!(f, "label error: {}", message),
            CompileError::Structural { message } => {
                write!(f, "structural error: {}", message)
            }
        }
    }
}

impl std::error::Error for CompileError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
}

/// A non-fatal finding surfaced to the caller rather than printed.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    fn info(message: String) -> Self {
        Self {
            severity: Severity::Info,
            message,
        }
    }

    fn warning(message: String) -> Self {
        Self {
            severity: Severity::Warning,
            message,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sev = match self.severity {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
        };
        write!(f, "[{}] {}", sev, self.message)
    }
}

/// A successfully compiled program plus everything worth telling the
/// user about it.
#[derive(Debug, Clone)]
pub struct Compiled {
    pub program: Program,
    pub diagnostics: Vec<Diagnostic>,
}

/// Compile directive source into a finalized program.
pub fn compile(source: &str) -> Result<Compiled, CompileError> {
    // Normalize line endings here so the loader stays a plain read and
    // the assembler itself stays I/O-free.
    let source = source.replace("\r\n", "\n");

    let mut diagnostics = Vec::new();
    let mut nodes = parse::parse_directives(&source)?;

    passes::fold_conditional_jumps(&mut nodes, &mut diagnostics);
    passes::lower_unconditional_jumps(&mut nodes);
    passes::resolve_labels(&mut nodes, &mut diagnostics)?;
    let program = passes::resolve_jumps(nodes, &mut diagnostics)?;

    Ok(Compiled {
        program,
        diagnostics,
    })
}
