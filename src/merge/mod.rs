//! Merging feature trees into a master context and erasing them again.
//!
//! Both operations walk two trees in lock step, matching children by unique
//! id level by level, and record what changed in a [`ContextDiff`] that
//! lives in the master's arena:
//!
//! - [`merge_context`] moves every subtree present only in the incoming
//!   tree into the master. The diff borrows the adopted nodes; it owns only
//!   the container shells leading to them.
//! - [`erase_context`] detaches every feature of the master that the other
//!   tree also has. The diff takes ownership of the detached features, and
//!   containers left empty are removed from the master.
//!
//! Leaves are compared by unique id only. A feature present in both trees
//! is left alone even when its other fields differ.
mod erase;

use hashbrown::HashSet;
use log::{
    debug,
    info,
};

pub use self::erase::{
    erase_context,
    erase_diff,
};
use crate::data_structs::arena::FeatureArena;
use crate::data_structs::typedef::NodeId;
use crate::data_structs::{
    ContextDiff,
    FeatureAny,
    FeatureContext,
    FeaturePath,
    Link,
    Ownership,
    StructType,
    StructureError,
};

/// Running totals for one merge or erase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct DiffCounts {
    pub features:   usize,
    pub containers: usize,
    pub paths:      HashSet<FeaturePath>,
}

impl DiffCounts {
    pub(crate) fn into_diff(
        self,
        root: NodeId,
    ) -> ContextDiff {
        ContextDiff {
            root,
            features: self.features,
            containers: self.containers,
            paths: self.paths,
        }
    }
}

/// Returns the diff node standing for the master node at the end of
/// `path`, creating container shells along the way.
pub(crate) fn diff_node_for(
    context: &mut FeatureContext,
    diff_root: NodeId,
    path: &[NodeId],
) -> Result<NodeId, StructureError> {
    let mut diff_node = diff_root;
    for id in path {
        let node = context.get(*id).ok_or(StructureError::MissingNode)?;
        let key = node.unique_id();
        let shell = node.shell().ok_or(StructureError::TypeMismatch {
            expected: StructType::FeatureSet,
            found:    StructType::Feature,
        })?;
        diff_node = context.get_or_add(diff_node, key, || shell)?;
    }
    Ok(diff_node)
}

/// Merges `new` into `current` and returns what was added.
///
/// `current` keeps its context metadata; `new`'s is used only when
/// `current` has none yet. Nodes of `new` that `current` already has are
/// dropped with it.
pub fn merge_context(
    current: &mut FeatureContext,
    new: FeatureContext,
) -> Result<ContextDiff, StructureError> {
    adopt_metadata(current, &new)?;

    let new_master = new.master_alignment();
    let (mut source, source_root) = new.into_arena();
    let diff_root = current.new_diff_root();
    let mut counts = DiffCounts::default();
    let mut path = Vec::with_capacity(4);
    let root = current.root();

    merge_children(
        current,
        &mut source,
        root,
        source_root,
        new_master,
        diff_root,
        &mut path,
        &mut counts,
    )?;

    info!(
        "Merged into {}: {} features, {} containers added",
        current.sequence_name(),
        counts.features,
        counts.containers
    );
    Ok(counts.into_diff(diff_root))
}

fn adopt_metadata(
    current: &mut FeatureContext,
    new: &FeatureContext,
) -> Result<(), StructureError> {
    let incoming = new.context();
    let context = current.context_mut();
    if context.is_unset() {
        if incoming.is_unset() {
            return Ok(());
        }
        debug!("Taking context metadata of {}", incoming.sequence_name);
        context.header.unique_id = incoming.sequence_name;
        context.header.original_id = incoming.sequence_name;
        context.sequence_name = incoming.sequence_name;
        context.parent_name = incoming.parent_name;
        context.length = incoming.length;
        context.parent_span = incoming.parent_span;
        context.sequence_to_parent = incoming.sequence_to_parent;
        context.feature_set_names = incoming.feature_set_names.clone();
        context.styles = incoming.styles.clone();
        return Ok(());
    }
    if !incoming.is_unset() && incoming.sequence_name != context.sequence_name {
        return Err(StructureError::SequenceMismatch {
            current: context.sequence_name,
            new:     incoming.sequence_name,
        });
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn merge_children(
    current: &mut FeatureContext,
    source: &mut FeatureArena,
    current_node: NodeId,
    source_node: NodeId,
    source_master: Option<NodeId>,
    diff_root: NodeId,
    path: &mut Vec<NodeId>,
    counts: &mut DiffCounts,
) -> Result<(), StructureError> {
    for Link { id, ownership } in source.sorted_children(source_node) {
        if ownership != Ownership::Owned {
            continue;
        }
        let node = source.get(id).ok_or(StructureError::MissingNode)?;
        let (key, struct_type) = (node.unique_id(), node.struct_type());

        match current.child(current_node, key) {
            Some(_) if struct_type == StructType::Feature => {},
            Some(existing) => {
                if struct_type == StructType::Block {
                    complete_block(current, source, existing, id);
                }
                path.push(existing);
                merge_children(
                    current,
                    source,
                    existing,
                    id,
                    source_master,
                    diff_root,
                    path,
                    counts,
                )?;
                path.pop();
            },
            None => {
                let was_master = source_master == Some(id);
                let adopted = current.arena_mut().transfer_from(source, id)?;
                current
                    .arena_mut()
                    .link(current_node, adopted, Ownership::Owned)?;
                if was_master && current.master_alignment().is_none() {
                    current.context_mut().master_align = Some(adopted);
                }

                let diff_parent = diff_node_for(current, diff_root, path)?;
                current
                    .arena_mut()
                    .link(diff_parent, adopted, Ownership::Borrowed)?;

                let prefix = path
                    .iter()
                    .filter_map(|id| current.get(*id).map(FeatureAny::unique_id))
                    .collect::<Vec<_>>();
                let paths = current.paths_below(adopted, &prefix);
                let features = paths.len();
                counts.features += features;
                counts.paths.extend(paths);
                if struct_type != StructType::Feature {
                    counts.containers += 1;
                    debug!("Adopted {} {} with {} features", struct_type, key, features);
                }
            },
        }
    }
    Ok(())
}

/// A block that exists in both trees takes the incoming DNA and sequence
/// mapping when it has none of its own.
fn complete_block(
    current: &mut FeatureContext,
    source: &mut FeatureArena,
    existing: NodeId,
    incoming: NodeId,
) {
    let Some(theirs) = source
        .get_mut(incoming)
        .and_then(FeatureAny::as_block_mut)
    else {
        return;
    };
    let (dna, mapping) = (theirs.dna.take(), theirs.block_to_sequence);
    let Some(ours) = current
        .arena_mut()
        .get_mut(existing)
        .and_then(FeatureAny::as_block_mut)
    else {
        return;
    };
    if !ours.block_to_sequence.is_set() {
        ours.block_to_sequence = mapping;
    }
    if ours.dna.is_none() {
        ours.dna = dna;
    }
}

#[cfg(test)]
mod tests;
