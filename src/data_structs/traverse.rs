//! The one recursive walk over a feature tree.
//!
//! [`execute`] visits a node and its descendants down to a stop level,
//! parents before children, children in unique-id order. The enter callback
//! decides per node whether to continue, skip the node's children or abort
//! the whole walk; the optional exit callback runs after a node's children
//! have been visited. Dump, XML export, level queries, feature paths and
//! the merge engine's counting are all expressed through it.
use thiserror::Error;

use crate::data_structs::arena::FeatureArena;
use crate::data_structs::enums::StructType;
use crate::data_structs::node::{
    FeatureAny,
    Ownership,
};
use crate::data_structs::typedef::NodeId;

/// Callback verdict for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visit {
    Continue,
    /// Do not visit this node's children. The exit callback still runs.
    DontDescend,
    Abort(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("traversal aborted: {0}")]
pub struct Aborted(pub String);

/// A visited node with the way it was reached.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    pub id:        NodeId,
    pub node:      &'a FeatureAny,
    /// How the parent links this node; the start node counts as owned.
    pub ownership: Ownership,
    /// Levels below the start node.
    pub depth:     usize,
}

/// Walks from `start` down to and including `stop`.
pub fn execute<E>(
    arena: &FeatureArena,
    start: NodeId,
    stop: StructType,
    enter: E,
) -> Result<(), Aborted>
where
    E: FnMut(NodeRef<'_>) -> Visit, {
    execute_with_exit(arena, start, stop, enter, |_| Visit::Continue)
}

/// Like [`execute`], also calling `exit` once a node's children are done.
/// `exit` may abort but cannot skip anything.
pub fn execute_with_exit<E, X>(
    arena: &FeatureArena,
    start: NodeId,
    stop: StructType,
    mut enter: E,
    mut exit: X,
) -> Result<(), Aborted>
where
    E: FnMut(NodeRef<'_>) -> Visit,
    X: FnMut(NodeRef<'_>) -> Visit, {
    walk(
        arena,
        start,
        Ownership::Owned,
        0,
        stop,
        &mut enter,
        &mut exit,
    )
}

fn walk<E, X>(
    arena: &FeatureArena,
    id: NodeId,
    ownership: Ownership,
    depth: usize,
    stop: StructType,
    enter: &mut E,
    exit: &mut X,
) -> Result<(), Aborted>
where
    E: FnMut(NodeRef<'_>) -> Visit,
    X: FnMut(NodeRef<'_>) -> Visit, {
    let Some(node) = arena.get(id)
    else {
        return Ok(());
    };
    if node.struct_type() > stop {
        return Ok(());
    }
    let node_ref = NodeRef {
        id,
        node,
        ownership,
        depth,
    };

    match enter(node_ref) {
        Visit::Abort(msg) => return Err(Aborted(msg)),
        Visit::DontDescend => {},
        Visit::Continue => {
            if node.struct_type() < stop {
                for link in arena.sorted_children(id) {
                    walk(
                        arena,
                        link.id,
                        link.ownership,
                        depth + 1,
                        stop,
                        enter,
                        exit,
                    )?;
                }
            }
        },
    }

    match exit(node_ref) {
        Visit::Abort(msg) => Err(Aborted(msg)),
        _ => Ok(()),
    }
}
