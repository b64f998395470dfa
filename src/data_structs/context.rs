//! [`FeatureContext`], the owning handle of one annotation tree, and
//! [`ContextDiff`], the record of what a merge or erase changed.
use std::sync::Arc;

use hashbrown::HashSet;
use itertools::Itertools;
use log::debug;

use crate::data_structs::arena::FeatureArena;
use crate::data_structs::enums::StructType;
use crate::data_structs::error::StructureError;
use crate::data_structs::feature::Feature;
use crate::data_structs::node::{
    Alignment,
    Block,
    Context,
    FeatureAny,
    FeatureSet,
    Ownership,
};
use crate::data_structs::styles::StyleTable;
use crate::data_structs::traverse::{
    execute,
    Visit,
};
use crate::data_structs::typedef::NodeId;
use crate::quark::Quark;

/// Unique-id path of a feature: alignment, block, feature set, feature.
pub type FeaturePath = [Quark; 4];

/// An annotation tree rooted at a [`Context`] together with the arena its
/// nodes live in.
///
/// Diff contexts produced by [`merge_context`](crate::merge::merge_context)
/// and [`erase_context`](crate::merge::erase_context) are further roots in
/// the same arena; they stay valid until handed back to
/// [`FeatureContext::release_diff`].
#[derive(Debug, Clone)]
pub struct FeatureContext {
    arena: FeatureArena,
    root:  NodeId,
}

impl FeatureContext {
    pub fn new(sequence_name: Quark) -> Self { Self::from_context(Context::new(sequence_name)) }

    pub fn from_context(context: Context) -> Self {
        let mut arena = FeatureArena::new();
        let root = arena.insert_root(context);
        Self { arena, root }
    }

    pub fn with_styles(
        mut self,
        styles: Arc<StyleTable>,
    ) -> Self {
        self.context_mut().styles = styles;
        self
    }

    pub fn root(&self) -> NodeId { self.root }

    pub fn arena(&self) -> &FeatureArena { &self.arena }

    pub(crate) fn arena_mut(&mut self) -> &mut FeatureArena { &mut self.arena }

    pub(crate) fn into_arena(self) -> (FeatureArena, NodeId) { (self.arena, self.root) }

    pub fn context(&self) -> &Context {
        match self.arena.get(self.root) {
            Some(FeatureAny::Context(context)) => context,
            _ => unreachable!("context root is never freed or replaced"),
        }
    }

    pub fn context_mut(&mut self) -> &mut Context {
        match self.arena.get_mut(self.root) {
            Some(FeatureAny::Context(context)) => context,
            _ => unreachable!("context root is never freed or replaced"),
        }
    }

    pub fn sequence_name(&self) -> Quark { self.context().sequence_name }

    pub fn get(
        &self,
        id: NodeId,
    ) -> Option<&FeatureAny> {
        self.arena.get(id)
    }

    pub fn feature(
        &self,
        id: NodeId,
    ) -> Option<&Feature> {
        self.arena.get(id).and_then(FeatureAny::as_feature)
    }

    pub fn child(
        &self,
        parent: NodeId,
        key: Quark,
    ) -> Option<NodeId> {
        self.arena.child(parent, key)
    }

    /// Inserts `child` below `parent`, checking that its level fits.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        child: impl Into<FeatureAny>,
    ) -> Result<NodeId, StructureError> {
        self.arena.add_child(parent, child)
    }

    /// Adds an alignment below the root. The first alignment added, or any
    /// added with `master` set, becomes the master alignment.
    pub fn add_alignment(
        &mut self,
        alignment: Alignment,
        master: bool,
    ) -> Result<NodeId, StructureError> {
        let root = self.root;
        let id = self.arena.add_child(root, alignment)?;
        let context = self.context_mut();
        if master || context.master_align.is_none() {
            context.master_align = Some(id);
        }
        Ok(id)
    }

    pub fn master_alignment(&self) -> Option<NodeId> { self.context().master_align }

    /// Returns the child of `parent` keyed `key`, creating it with `make`
    /// when absent.
    pub(crate) fn get_or_add(
        &mut self,
        parent: NodeId,
        key: Quark,
        make: impl FnOnce() -> FeatureAny,
    ) -> Result<NodeId, StructureError> {
        match self.arena.child(parent, key) {
            Some(id) => Ok(id),
            None => self.arena.add_child(parent, make()),
        }
    }

    /// Handles of every node of `level` reachable from the root through
    /// owned links.
    pub fn nodes_at(
        &self,
        level: StructType,
    ) -> Vec<NodeId> {
        let mut nodes = Vec::new();
        let _ = execute(&self.arena, self.root, level, |n| {
            if n.ownership != Ownership::Owned {
                return Visit::DontDescend;
            }
            if n.node.struct_type() == level {
                nodes.push(n.id);
            }
            Visit::Continue
        });
        nodes
    }

    pub fn count(
        &self,
        level: StructType,
    ) -> usize {
        self.nodes_at(level).len()
    }

    pub fn feature_count(&self) -> usize { self.count(StructType::Feature) }

    /// Distinct feature-set ids present in the tree, sorted.
    pub fn feature_set_ids(&self) -> Vec<Quark> {
        self.nodes_at(StructType::FeatureSet)
            .into_iter()
            .filter_map(|id| self.arena.get(id).map(FeatureAny::unique_id))
            .unique()
            .sorted_by_cached_key(|id| id.as_str())
            .collect()
    }

    /// First feature set with `set_id`, searching the master alignment
    /// first.
    pub fn find_feature_set(
        &self,
        set_id: Quark,
    ) -> Option<NodeId> {
        let master = self.master_alignment();
        self.nodes_at(StructType::FeatureSet)
            .into_iter()
            .filter(|id| {
                self.arena
                    .get(*id)
                    .is_some_and(|n| n.unique_id() == set_id)
            })
            .sorted_by_key(|id| self.alignment_of(*id) != master)
            .next()
    }

    /// Looks a feature up by set id and feature id across all blocks.
    pub fn find_feature(
        &self,
        set_id: Quark,
        feature_id: Quark,
    ) -> Option<NodeId> {
        self.nodes_at(StructType::FeatureSet)
            .into_iter()
            .filter(|id| {
                self.arena
                    .get(*id)
                    .is_some_and(|n| n.unique_id() == set_id)
            })
            .find_map(|set| self.arena.child(set, feature_id))
    }

    /// Looks a node up by its full unique-id path below the root.
    pub fn lookup_path(
        &self,
        path: &[Quark],
    ) -> Option<NodeId> {
        path.iter()
            .try_fold(self.root, |node, key| self.arena.child(node, *key))
    }

    fn ancestor_at(
        &self,
        id: NodeId,
        level: StructType,
    ) -> Option<NodeId> {
        let mut current = id;
        loop {
            let node = self.arena.get(current)?;
            if node.struct_type() == level {
                return Some(current);
            }
            current = node.parent()?;
        }
    }

    /// Block containing `id`, which may be a feature or a feature set.
    pub fn block_of(
        &self,
        id: NodeId,
    ) -> Option<NodeId> {
        self.ancestor_at(id, StructType::Block)
    }

    pub fn alignment_of(
        &self,
        id: NodeId,
    ) -> Option<NodeId> {
        self.ancestor_at(id, StructType::Alignment)
    }

    /// Attaches DNA to a block. Returns `false` when `block` is not one.
    pub fn set_block_dna(
        &mut self,
        block: NodeId,
        dna: String,
    ) -> bool {
        match self.arena.get_mut(block).and_then(FeatureAny::as_block_mut) {
            Some(block) => {
                block.dna = Some(dna);
                true
            },
            None => false,
        }
    }

    /// Unique-id paths of every feature in the tree.
    pub fn feature_paths(&self) -> HashSet<FeaturePath> {
        self.paths_below(self.root, &[]).into_iter().collect()
    }

    /// Unique-id paths of the features owned below `start`. `prefix` names
    /// the containers above `start`, outermost first.
    pub(crate) fn paths_below(
        &self,
        start: NodeId,
        prefix: &[Quark],
    ) -> Vec<FeaturePath> {
        let mut chain = prefix.to_vec();
        let mut paths = Vec::new();
        let _ = execute(&self.arena, start, StructType::Feature, |n| {
            if n.ownership != Ownership::Owned {
                return Visit::DontDescend;
            }
            chain.truncate(prefix.len() + n.depth);
            chain.push(n.node.unique_id());
            if n.node.struct_type() == StructType::Feature {
                let tail = &chain[chain.len().saturating_sub(4)..];
                if let Ok(path) = FeaturePath::try_from(tail) {
                    paths.push(path);
                }
            }
            Visit::Continue
        });
        paths
    }

    /// Builds a new diff root sharing this context's metadata.
    pub(crate) fn new_diff_root(&mut self) -> NodeId {
        let shell = self.context().shell();
        self.arena.insert_root(shell)
    }

    /// Nodes that releasing `diff` would free: the diff root, its container
    /// shells and, after an erase, the detached features. Nodes the diff
    /// merely borrows from this context are not included.
    pub fn elements_to_destroy(
        &self,
        diff: &ContextDiff,
    ) -> Vec<NodeId> {
        self.arena.owned_subtree(diff.root)
    }

    /// Frees everything `diff` owns. Returns the number of nodes freed.
    pub fn release_diff(
        &mut self,
        diff: ContextDiff,
    ) -> usize {
        let freed = self.arena.free(diff.root);
        debug!("Released diff context: {} nodes freed", freed);
        freed
    }

    /// Context metadata of a diff.
    pub fn diff_context(
        &self,
        diff: &ContextDiff,
    ) -> Option<&Context> {
        self.arena.get(diff.root).and_then(FeatureAny::as_context)
    }

    /// Convenience for building trees by hand: ensures the path
    /// alignment/block/feature set exists and returns the feature set.
    pub fn ensure_feature_set(
        &mut self,
        alignment_id: Quark,
        block: Block,
        feature_set: FeatureSet,
    ) -> Result<NodeId, StructureError> {
        let align = match self.arena.child(self.root, alignment_id) {
            Some(id) => id,
            None => self.add_alignment(Alignment::new(alignment_id), false)?,
        };
        let block_id = block.header.unique_id;
        let block = self.get_or_add(align, block_id, || block.into())?;
        let set_id = feature_set.header.unique_id;
        self.get_or_add(block, set_id, || feature_set.into())
    }
}

/// Changes produced by one merge or erase.
///
/// The diff is a separate root in the master context's arena. After a
/// merge it borrows the adopted subtrees from the master; after an erase it
/// owns the detached features. Either way it must be returned to
/// [`FeatureContext::release_diff`] of the context that produced it.
#[derive(Debug)]
#[must_use]
pub struct ContextDiff {
    pub(crate) root:       NodeId,
    pub(crate) features:   usize,
    pub(crate) containers: usize,
    /// Paths of the features added or removed, taken when the diff was
    /// made. Later merges into adopted containers do not show up here.
    pub(crate) paths:      HashSet<FeaturePath>,
}

impl ContextDiff {
    pub fn root(&self) -> NodeId { self.root }

    /// Unique-id paths of the features this diff added or removed.
    pub fn feature_paths(&self) -> &HashSet<FeaturePath> { &self.paths }

    /// Features added (merge) or removed (erase).
    pub fn feature_count(&self) -> usize { self.features }

    /// Alignments, blocks and feature sets that were adopted whole or
    /// removed because they became empty.
    pub fn container_count(&self) -> usize { self.containers }

    pub fn is_empty(&self) -> bool { self.features == 0 && self.containers == 0 }
}
