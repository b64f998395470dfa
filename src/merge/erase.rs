use hashbrown::HashSet;
use itertools::Itertools;
use log::{
    debug,
    info,
};

use crate::data_structs::typedef::NodeId;
use crate::data_structs::{
    ContextDiff,
    FeatureContext,
    FeaturePath,
    Ownership,
    StructureError,
};
use crate::merge::{
    diff_node_for,
    DiffCounts,
};

/// Removes from `current` every feature that `remove` also has.
///
/// Features are matched by their unique-id path; anything in `remove` that
/// `current` lacks is ignored. The detached features move into the returned
/// diff, and alignments, blocks and feature sets left empty are removed.
pub fn erase_context(
    current: &mut FeatureContext,
    remove: &FeatureContext,
) -> Result<ContextDiff, StructureError> {
    let paths = remove.feature_paths();
    erase_paths(current, paths)
}

/// Undoes a merge: removes from `current` the features recorded in `diff`,
/// a diff `current` produced earlier. The old diff is released.
///
/// Only the features the merge itself added are removed, even when later
/// merges put more features into containers it adopted.
pub fn erase_diff(
    current: &mut FeatureContext,
    mut diff: ContextDiff,
) -> Result<ContextDiff, StructureError> {
    let paths = std::mem::take(&mut diff.paths);
    current.release_diff(diff);
    erase_paths(current, paths)
}

fn resolve(
    current: &FeatureContext,
    path: &FeaturePath,
) -> Option<[NodeId; 4]> {
    let align = current.child(current.root(), path[0])?;
    let block = current.child(align, path[1])?;
    let set = current.child(block, path[2])?;
    let feature = current.child(set, path[3])?;
    Some([align, block, set, feature])
}

fn erase_paths(
    current: &mut FeatureContext,
    paths: impl IntoIterator<Item = FeaturePath>,
) -> Result<ContextDiff, StructureError> {
    let diff_root = current.new_diff_root();
    let mut counts = DiffCounts::default();
    let mut touched = HashSet::new();

    for path in paths.into_iter().sorted() {
        let Some([align, block, set, feature]) = resolve(current, &path)
        else {
            continue;
        };
        // Shells first, while the containers are still reachable.
        let diff_set = diff_node_for(current, diff_root, &[align, block, set])?;
        current.arena_mut().unlink(set, path[3]);
        current
            .arena_mut()
            .link(diff_set, feature, Ownership::Owned)?;
        counts.features += 1;
        counts.paths.insert(path);
        touched.insert([align, block, set]);
    }

    // A block empties with its last set, an alignment with its last block.
    for [align, block, set] in touched {
        if remove_if_empty(current, block, set) {
            counts.containers += 1;
            if remove_if_empty(current, align, block) {
                counts.containers += 1;
                let root = current.root();
                if remove_if_empty(current, root, align) {
                    counts.containers += 1;
                    if current.master_alignment() == Some(align) {
                        current.context_mut().master_align = None;
                    }
                }
            }
        }
    }

    info!(
        "Erased from {}: {} features, {} containers removed",
        current.sequence_name(),
        counts.features,
        counts.containers
    );
    Ok(counts.into_diff(diff_root))
}

/// Unlinks and frees `child` of `parent` if it has no children left.
fn remove_if_empty(
    current: &mut FeatureContext,
    parent: NodeId,
    child: NodeId,
) -> bool {
    let Some(node) = current.get(child)
    else {
        return false;
    };
    if !node.children().is_empty() {
        return false;
    }
    let key = node.unique_id();
    debug!("Removing empty {} {}", node.struct_type(), key);
    current.arena_mut().unlink(parent, key);
    current.arena_mut().free(child);
    true
}
