//! Passes 2–5 — fold, lower, resolve
//!
//! Each pass rewrites the instruction graph in place; the final pass
//! converts it into the immutable runtime program. Positions are always
//! looked up through an id→index map built from the current sequence,
//! never by scanning for an equal node.

use std::collections::{HashMap, HashSet};

use super::graph::{GraphNode, JumpRef, Node, NodeId, RefTarget, Slot};
use super::parse::BLANK_LINE_SENTINEL;
use super::{CompileError, Diagnostic};
use crate::tape::{Instruction, Program};

/// Clone out the branch refs of a conditional jump at `index`, if one
/// is there.
fn cond_jump_at(nodes: &[GraphNode], index: usize) -> Option<(NodeId, JumpRef, JumpRef)> {
    match nodes.get(index) {
        Some(GraphNode {
            id,
            node: Node::CondJump { on_match, skip },
            ..
        }) => Some((*id, on_match.clone(), skip.clone())),
        _ => None,
    }
}

/// Pass 2: fill the pending branch slots of replace nodes from any
/// directly following conditional jump, then delete all conditional
/// jump nodes. Ones that never got absorbed are dropped with a warning,
/// not rejected.
pub fn fold_conditional_jumps(nodes: &mut Vec<GraphNode>, diags: &mut Vec<Diagnostic>) {
    enum Pending {
        /// FIND / REPLACE with both slots open.
        Both,
        /// Failure exit of a loop probe.
        ProbeExit,
        /// No-match exit of a loop body.
        LoopExit,
    }

    let mut absorbed: HashSet<NodeId> = HashSet::new();

    for i in 0..nodes.len() {
        let own_id = nodes[i].id;
        let line = nodes[i].line;
        let pending = match &nodes[i].node {
            Node::Replace {
                on_match: Slot::PendingCondJump,
                on_no_match: Slot::PendingCondJump,
                ..
            } => Pending::Both,
            Node::Replace {
                on_no_match: Slot::PendingProbeExit,
                ..
            } => Pending::ProbeExit,
            Node::Replace {
                on_no_match: Slot::PendingLoopExit,
                ..
            } => Pending::LoopExit,
            _ => continue,
        };

        let fall_through = || Slot::Jump(JumpRef::to_node(own_id, 1));

        match pending {
            Pending::Both => {
                let (on_match, on_no_match) = match cond_jump_at(nodes, i + 1) {
                    Some((cid, target, skip)) => {
                        absorbed.insert(cid);
                        (Slot::Jump(target), Slot::Jump(skip))
                    }
                    // No branch requested: fall through either way.
                    None => (fall_through(), fall_through()),
                };
                if let Node::Replace {
                    on_match: m,
                    on_no_match: n,
                    ..
                } = &mut nodes[i].node
                {
                    *m = on_match;
                    *n = on_no_match;
                }
            }
            Pending::ProbeExit => {
                // The probe sits two positions before whatever follows
                // the loop construct.
                let slot = match cond_jump_at(nodes, i + 2) {
                    Some((cid, _, skip)) => {
                        absorbed.insert(cid);
                        Slot::Jump(skip)
                    }
                    None => {
                        diags.push(Diagnostic::info(format!(
                            "loop at line {} has no trailing conditional jump; its probe falls through",
                            line
                        )));
                        fall_through()
                    }
                };
                if let Node::Replace { on_no_match: n, .. } = &mut nodes[i].node {
                    *n = slot;
                }
            }
            Pending::LoopExit => {
                // On saturation the loop exits through the conditional
                // jump's success target, treating "loop finished" as
                // the successful outcome.
                let slot = match cond_jump_at(nodes, i + 1) {
                    Some((cid, target, _)) => {
                        absorbed.insert(cid);
                        Slot::Jump(target)
                    }
                    None => fall_through(),
                };
                if let Node::Replace { on_no_match: n, .. } = &mut nodes[i].node {
                    *n = slot;
                }
            }
        }
    }

    nodes.retain(|gn| {
        if let Node::CondJump { .. } = gn.node {
            if !absorbed.contains(&gn.id) {
                diags.push(Diagnostic::warning(format!(
                    "orphaned conditional jump on line {} has nothing to attach to and was dropped",
                    gn.line
                )));
            }
            false
        } else {
            true
        }
    });
}

/// Pass 3: an unconditional jump becomes a replace with an empty
/// search. The machine defines the empty string as always matching, so
/// this is a guaranteed branch that leaves the store untouched. Both
/// branch slots carry the same reference.
pub fn lower_unconditional_jumps(nodes: &mut [GraphNode]) {
    for gn in nodes.iter_mut() {
        if let Node::UncondJump { target } = &gn.node {
            let target = target.clone();
            gn.node = Node::Replace {
                search: String::new(),
                replacement: String::new(),
                on_match: Slot::Jump(target.clone()),
                on_no_match: Slot::Jump(target),
            };
        }
    }
}

/// Pass 4: record, for every label, the nearest following non-label
/// node; delete the label nodes; rebind every label reference. A label
/// at the end of the program resolves to nothing, which only becomes an
/// error if something actually jumps to it.
pub fn resolve_labels(
    nodes: &mut Vec<GraphNode>,
    diags: &mut Vec<Diagnostic>,
) -> Result<(), CompileError> {
    let mut table: HashMap<String, Option<NodeId>> = HashMap::new();

    for i in 0..nodes.len() {
        if let Node::Label { name } = &nodes[i].node {
            let target = nodes[i + 1..]
                .iter()
                .find(|gn| !matches!(gn.node, Node::Label { .. }))
                .map(|gn| gn.id);
            if target.is_none() {
                diags.push(Diagnostic::warning(format!(
                    "label '{}' has nothing below it and resolves to nothing",
                    name
                )));
            }
            // Redeclaration keeps the last one.
            table.insert(name.clone(), target);
        }
    }

    nodes.retain(|gn| !matches!(gn.node, Node::Label { .. }));

    for gn in nodes.iter_mut() {
        if let Node::Replace {
            on_match,
            on_no_match,
            ..
        } = &mut gn.node
        {
            rebind_label(on_match, &table)?;
            rebind_label(on_no_match, &table)?;
        }
    }
    Ok(())
}

fn rebind_label(
    slot: &mut Slot,
    table: &HashMap<String, Option<NodeId>>,
) -> Result<(), CompileError> {
    if let Slot::Jump(jump) = slot {
        if let RefTarget::Label(name) = &jump.target {
            match table.get(name) {
                Some(Some(id)) => jump.target = RefTarget::Node(*id),
                Some(None) => {
                    return Err(CompileError::Label {
                        message: format!("label '{}' resolves to nothing", name),
                    })
                }
                None => {
                    return Err(CompileError::Label {
                        message: format!("unknown label: {}", name),
                    })
                }
            }
        }
    }
    Ok(())
}

/// Pass 5: turn every symbolic reference into a final instruction
/// index, strip operand sentinels, and validate that only finalized
/// replace nodes remain.
pub fn resolve_jumps(
    nodes: Vec<GraphNode>,
    diags: &mut Vec<Diagnostic>,
) -> Result<Program, CompileError> {
    let index_of: HashMap<NodeId, usize> =
        nodes.iter().enumerate().map(|(i, gn)| (gn.id, i)).collect();

    let mut instructions = Vec::with_capacity(nodes.len());
    for (i, gn) in nodes.iter().enumerate() {
        let (search, replacement, on_match, on_no_match) = match &gn.node {
            Node::Replace {
                search,
                replacement,
                on_match,
                on_no_match,
            } => (search, replacement, on_match, on_no_match),
            _ => {
                return Err(CompileError::Structural {
                    message: format!("{} survived to finalization", gn),
                })
            }
        };

        let on_match = resolve_slot(on_match, gn, &index_of, diags)?;
        let on_no_match = resolve_slot(on_no_match, gn, &index_of, diags)?;

        if on_match == i && on_no_match == i {
            diags.push(Diagnostic::warning(format!(
                "instruction {} jumps to itself no matter what",
                i
            )));
        }

        instructions.push(Instruction {
            search: search.replace(BLANK_LINE_SENTINEL, ""),
            replacement: replacement.replace(BLANK_LINE_SENTINEL, ""),
            on_match,
            on_no_match,
        });
    }

    Ok(Program::new(instructions))
}

fn resolve_slot(
    slot: &Slot,
    owner: &GraphNode,
    index_of: &HashMap<NodeId, usize>,
    diags: &mut Vec<Diagnostic>,
) -> Result<usize, CompileError> {
    let jump = match slot {
        Slot::Index(index) => return Ok(*index),
        Slot::Jump(jump) => jump,
        pending => {
            return Err(CompileError::Structural {
                message: format!("unresolved {:?} slot on {}", pending, owner),
            })
        }
    };

    let id = match &jump.target {
        RefTarget::Node(id) => *id,
        RefTarget::OwnSite => {
            // "Jump to wherever I end up": the reference rebinds to the
            // node that carries it, now that its position is stable.
            diags.push(Diagnostic::info(format!(
                "self-referential jump on {} rebound to its own instruction",
                owner
            )));
            owner.id
        }
        RefTarget::Label(name) => {
            return Err(CompileError::Structural {
                message: format!("label '{}' was never rebound on {}", name, owner),
            })
        }
    };

    let position = *index_of.get(&id).ok_or_else(|| CompileError::Structural {
        message: format!("jump on {} references a node that no longer exists", owner),
    })?;

    let index = position as isize + jump.offset;
    if index < 0 {
        return Err(CompileError::Structural {
            message: format!("jump on {} resolves to a negative index", owner),
        });
    }
    Ok(index as usize)
}
