//! Pass 1 — directive parsing
//!
//! Scans source lines sequentially, consuming one to three lines per
//! directive, and produces the initial instruction graph. FIND and the
//! REPLACE forms leave their branch slots as placeholders for the fold
//! pass; REPLACE FOREVER is lowered to its two-node loop form here.

use regex::Regex;

use super::graph::{GraphNode, JumpRef, Node, NodeId, Slot};
use super::CompileError;

/// Operand-line sentinel meaning "the empty string". Stripped back out
/// after all resolution so a blank source line never has to carry
/// meaning.
pub const BLANK_LINE_SENTINEL: &str = "{BLANK LINE}";

struct Parser {
    label_re: Regex,
    jump_re: Regex,
    cond_jump_re: Regex,
    next_id: NodeId,
    nodes: Vec<GraphNode>,
}

impl Parser {
    fn new() -> Self {
        Self {
            // Anchored: directives never share a line with anything else.
            label_re: Regex::new(r"^\{LABEL (.+)\}$").unwrap(),
            jump_re: Regex::new(r"^\{JUMP (.+)\}$").unwrap(),
            cond_jump_re: Regex::new(r"^\{IF SUCCESSFUL JUMP (.+)\}$").unwrap(),
            next_id: 0,
            nodes: Vec::new(),
        }
    }

    fn alloc(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn push(&mut self, node: Node, line: usize, source: &str) {
        let id = self.alloc();
        self.push_with_id(id, node, line, source);
    }

    fn push_with_id(&mut self, id: NodeId, node: Node, line: usize, source: &str) {
        self.nodes.push(GraphNode {
            id,
            line,
            source: source.to_string(),
            node,
        });
    }
}

fn syntax_error(line: usize, text: &str, message: &str) -> CompileError {
    CompileError::Syntax {
        line,
        text: text.to_string(),
        message: message.to_string(),
    }
}

/// Fetch the operand `ahead` lines below the directive on line index `i`.
fn operand<'a>(
    lines: &[&'a str],
    i: usize,
    ahead: usize,
    directive: &str,
) -> Result<&'a str, CompileError> {
    lines.get(i + ahead).copied().ok_or_else(|| {
        syntax_error(
            i + 1,
            directive,
            "directive runs past the end of the source",
        )
    })
}

/// Scan the source into the initial instruction graph.
pub fn parse_directives(source: &str) -> Result<Vec<GraphNode>, CompileError> {
    let lines: Vec<&str> = source.split('\n').collect();
    let mut p = Parser::new();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let lineno = i + 1;

        if line.starts_with("{LABEL ") {
            let caps = p.label_re.captures(line).ok_or_else(|| {
                syntax_error(lineno, line, "missing closing brace")
            })?;
            let name = caps[1].to_string();
            p.push(Node::Label { name }, lineno, line);
            i += 1;
        } else if line.starts_with("{JUMP ") {
            let caps = p.jump_re.captures(line).ok_or_else(|| {
                syntax_error(lineno, line, "missing closing brace")
            })?;
            p.push(
                Node::UncondJump {
                    target: JumpRef::to_label(&caps[1]),
                },
                lineno,
                line,
            );
            i += 1;
        } else if line.starts_with("{IF SUCCESSFUL JUMP ") {
            let caps = p.cond_jump_re.captures(line).ok_or_else(|| {
                syntax_error(lineno, line, "missing closing brace")
            })?;
            p.push(
                Node::CondJump {
                    on_match: JumpRef::to_label(&caps[1]),
                    // "Skip this directive": rebound to whichever replace
                    // node absorbs it during the fold pass.
                    skip: JumpRef::own_site(1),
                },
                lineno,
                line,
            );
            i += 1;
        } else if line == "{FIND}" {
            // A self-replace: tests presence without changing the store.
            let pattern = operand(&lines, i, 1, line)?;
            p.push(
                Node::Replace {
                    search: pattern.to_string(),
                    replacement: pattern.to_string(),
                    on_match: Slot::PendingCondJump,
                    on_no_match: Slot::PendingCondJump,
                },
                lineno,
                line,
            );
            i += 2;
        } else if line == "{REPLACE}" || line == "{REPLACE ONCE}" {
            let search = operand(&lines, i, 1, line)?;
            let replacement = operand(&lines, i, 2, line)?;
            p.push(
                Node::Replace {
                    search: search.to_string(),
                    replacement: replacement.to_string(),
                    on_match: Slot::PendingCondJump,
                    on_no_match: Slot::PendingCondJump,
                },
                lineno,
                line,
            );
            i += 3;
        } else if line == "{REPLACE FOREVER}" {
            let search = operand(&lines, i, 1, line)?;
            let replacement = operand(&lines, i, 2, line)?;
            // Two-node saturating loop. The probe enters the loop on a
            // hit; the loop re-runs through the probe until the search
            // stops matching. Exits stay pending: they depend on
            // whether a conditional jump follows the whole construct.
            let probe_id = p.alloc();
            let loop_id = p.alloc();
            p.push_with_id(
                probe_id,
                Node::Replace {
                    search: search.to_string(),
                    replacement: replacement.to_string(),
                    on_match: Slot::Jump(JumpRef::to_node(loop_id, 0)),
                    on_no_match: Slot::PendingProbeExit,
                },
                lineno,
                line,
            );
            p.push_with_id(
                loop_id,
                Node::Replace {
                    search: search.to_string(),
                    replacement: replacement.to_string(),
                    on_match: Slot::Jump(JumpRef::to_node(probe_id, 0)),
                    on_no_match: Slot::PendingLoopExit,
                },
                lineno,
                line,
            );
            i += 3;
        } else {
            let squeezed: String = line.chars().filter(|c| *c != ' ').collect();
            if squeezed.is_empty() || squeezed.starts_with("//") {
                i += 1;
            } else {
                return Err(syntax_error(lineno, line, "not a recognized directive"));
            }
        }
    }

    Ok(p.nodes)
}
