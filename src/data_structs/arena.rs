//! Node storage for the feature hierarchy.
//!
//! Every node of a [`FeatureContext`](crate::data_structs::FeatureContext)
//! lives in one [`FeatureArena`]. Parent/child relations are expressed with
//! [`NodeId`] handles: the parent keeps a [`Link`] per child, the child keeps
//! a plain back-reference to its owning parent. A link is either owned or
//! borrowed, and only owned links are followed when a subtree is freed or
//! moved, so a node reachable from two roots (a context and its diff) is
//! released exactly once.
use itertools::Itertools;
use slotmap::SlotMap;

use crate::data_structs::enums::StructType;
use crate::data_structs::error::StructureError;
use crate::data_structs::node::{
    Context,
    FeatureAny,
    Link,
    Ownership,
};
use crate::data_structs::typedef::NodeId;
use crate::quark::Quark;

#[derive(Debug, Clone, Default)]
pub struct FeatureArena {
    nodes: SlotMap<NodeId, FeatureAny>,
}

impl FeatureArena {
    pub fn new() -> Self { Self::default() }

    /// Number of live nodes, diff shells included.
    pub fn len(&self) -> usize { self.nodes.len() }

    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    pub fn contains(
        &self,
        id: NodeId,
    ) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(
        &self,
        id: NodeId,
    ) -> Option<&FeatureAny> {
        self.nodes.get(id)
    }

    pub(crate) fn get_mut(
        &mut self,
        id: NodeId,
    ) -> Option<&mut FeatureAny> {
        self.nodes.get_mut(id)
    }

    pub fn struct_type(
        &self,
        id: NodeId,
    ) -> Option<StructType> {
        self.nodes.get(id).map(FeatureAny::struct_type)
    }

    pub(crate) fn insert_root(
        &mut self,
        context: Context,
    ) -> NodeId {
        self.nodes.insert(FeatureAny::Context(context))
    }

    fn check_child(
        parent: &FeatureAny,
        child_type: StructType,
        child_id: Quark,
    ) -> Result<(), StructureError> {
        let parent_type = parent.struct_type();
        if parent_type.child_type() != Some(child_type) {
            return Err(StructureError::WrongChildType {
                parent: parent_type,
                child:  child_type,
            });
        }
        if child_id.is_null() {
            return Err(StructureError::NullId(child_type));
        }
        if parent.children().contains_key(&child_id) {
            return Err(StructureError::DuplicateChild {
                parent: parent.unique_id(),
                child:  child_id,
            });
        }
        Ok(())
    }

    /// Inserts `child` as an owned child of `parent`.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        child: impl Into<FeatureAny>,
    ) -> Result<NodeId, StructureError> {
        let mut child = child.into();
        let parent_node = self
            .nodes
            .get(parent)
            .ok_or(StructureError::MissingNode)?;
        Self::check_child(parent_node, child.struct_type(), child.unique_id())?;
        if let FeatureAny::Feature(feature) = &child {
            if !feature.kind().is_valid() {
                return Err(StructureError::InvalidFeature(feature.unique_id()));
            }
        }

        let key = child.unique_id();
        child.header_mut().parent = Some(parent);
        let id = self.nodes.insert(child);
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node
                .header_mut()
                .children
                .insert(key, Link::owned(id));
        }
        Ok(id)
    }

    /// Links an existing node below `parent`. An owned link also moves the
    /// child's back-reference; a borrowed one leaves it pointing at the
    /// real owner.
    pub(crate) fn link(
        &mut self,
        parent: NodeId,
        child: NodeId,
        ownership: Ownership,
    ) -> Result<(), StructureError> {
        let child_node = self.nodes.get(child).ok_or(StructureError::MissingNode)?;
        let (child_type, key) = (child_node.struct_type(), child_node.unique_id());
        let parent_node = self
            .nodes
            .get(parent)
            .ok_or(StructureError::MissingNode)?;
        Self::check_child(parent_node, child_type, key)?;

        if ownership == Ownership::Owned {
            if let Some(child_node) = self.nodes.get_mut(child) {
                child_node.header_mut().parent = Some(parent);
            }
        }
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node
                .header_mut()
                .children
                .insert(key, Link { id: child, ownership });
        }
        Ok(())
    }

    /// Removes the link to `key` from `parent` without freeing the child.
    pub(crate) fn unlink(
        &mut self,
        parent: NodeId,
        key: Quark,
    ) -> Option<Link> {
        let link = self
            .nodes
            .get_mut(parent)?
            .header_mut()
            .children
            .remove(&key)?;
        if link.is_owned() {
            if let Some(child) = self.nodes.get_mut(link.id) {
                child.header_mut().parent = None;
            }
        }
        Some(link)
    }

    pub fn child(
        &self,
        parent: NodeId,
        key: Quark,
    ) -> Option<NodeId> {
        self.nodes
            .get(parent)?
            .children()
            .get(&key)
            .map(|link| link.id)
    }

    /// Child links of `id` ordered by child id string, so that walks are
    /// reproducible between runs.
    pub fn sorted_children(
        &self,
        id: NodeId,
    ) -> Vec<Link> {
        self.nodes
            .get(id)
            .map(|node| {
                node.children()
                    .iter()
                    .sorted_by_cached_key(|(key, _)| key.as_str())
                    .map(|(_, link)| *link)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Handles of `id` and every node it owns, parents first.
    pub fn owned_subtree(
        &self,
        id: NodeId,
    ) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.get(next) {
                out.push(next);
                stack.extend(
                    node.children()
                        .values()
                        .filter(|link| link.is_owned())
                        .map(|link| link.id),
                );
            }
        }
        out
    }

    /// Frees `id` and everything it owns. Borrowed links are dropped
    /// without touching their targets. Returns the number of nodes freed.
    pub(crate) fn free(
        &mut self,
        id: NodeId,
    ) -> usize {
        let mut freed = 0;
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(next) {
                stack.extend(
                    node.children()
                        .values()
                        .filter(|link| link.is_owned())
                        .map(|link| link.id),
                );
                freed += 1;
            }
        }
        freed
    }

    /// Moves the subtree rooted at `id` out of `source` into this arena and
    /// returns the new handle of its root, which comes back detached.
    /// Handles into `source` for the moved nodes stop resolving.
    pub(crate) fn transfer_from(
        &mut self,
        source: &mut FeatureArena,
        id: NodeId,
    ) -> Result<NodeId, StructureError> {
        let mut node = source
            .nodes
            .remove(id)
            .ok_or(StructureError::MissingNode)?;
        let children = std::mem::take(&mut node.header_mut().children);
        node.header_mut().parent = None;
        let new_id = self.nodes.insert(node);

        for (key, link) in children {
            if !link.is_owned() {
                continue;
            }
            let child = self.transfer_from(source, link.id)?;
            if let Some(child_node) = self.nodes.get_mut(child) {
                child_node.header_mut().parent = Some(new_id);
            }
            if let Some(parent_node) = self.nodes.get_mut(new_id) {
                parent_node
                    .header_mut()
                    .children
                    .insert(key, Link::owned(child));
            }
        }
        Ok(new_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structs::coords::{
        Span,
        SpanMapping,
    };
    use crate::data_structs::node::{
        Alignment,
        Block,
        FeatureSet,
    };

    fn arena_with_block() -> (FeatureArena, NodeId, NodeId) {
        let mut arena = FeatureArena::new();
        let root = arena.insert_root(Context::new(Quark::intern("chr1")));
        let align = arena
            .add_child(root, Alignment::new(Quark::intern("chr1")))
            .unwrap();
        let block = arena
            .add_child(
                align,
                Block::new(
                    Block::create_id(Quark::intern("chr1"), Span::new(1, 100)),
                    SpanMapping::identity(Span::new(1, 100)),
                ),
            )
            .unwrap();
        (arena, root, block)
    }

    #[test]
    fn test_rejects_wrong_level() {
        let (mut arena, root, _) = arena_with_block();
        let err = arena
            .add_child(root, FeatureSet::new(Quark::intern("genes"), Quark::NULL))
            .unwrap_err();
        assert_eq!(err, StructureError::WrongChildType {
            parent: StructType::Context,
            child:  StructType::FeatureSet,
        });
    }

    #[test]
    fn test_rejects_duplicate_and_null() {
        let (mut arena, _, block) = arena_with_block();
        arena
            .add_child(block, FeatureSet::new(Quark::intern("genes"), Quark::NULL))
            .unwrap();
        assert!(matches!(
            arena.add_child(block, FeatureSet::new(Quark::intern("genes"), Quark::NULL)),
            Err(StructureError::DuplicateChild { .. })
        ));
        assert_eq!(
            arena.add_child(block, FeatureSet::new(Quark::NULL, Quark::NULL)),
            Err(StructureError::NullId(StructType::FeatureSet))
        );
    }

    #[test]
    fn test_free_skips_borrowed() {
        let (mut arena, _, block) = arena_with_block();
        let set = arena
            .add_child(block, FeatureSet::new(Quark::intern("genes"), Quark::NULL))
            .unwrap();

        let mut other_block = Block::new(Quark::intern("shell"), SpanMapping::default());
        other_block.header.children.insert(
            Quark::intern("genes"),
            Link::borrowed(set),
        );
        let detached_root = arena.insert_root(Context::new(Quark::intern("diff")));
        let align = arena
            .add_child(detached_root, Alignment::new(Quark::intern("a")))
            .unwrap();
        let shell = arena.add_child(align, other_block).unwrap();

        assert_eq!(arena.owned_subtree(detached_root).len(), 3);
        assert_eq!(arena.free(detached_root), 3);
        assert!(!arena.contains(shell));
        assert!(arena.contains(set));
        assert_eq!(arena.get(set).unwrap().parent(), Some(block));
    }

    #[test]
    fn test_transfer_moves_subtree() {
        let (mut source, _, block) = arena_with_block();
        source
            .add_child(block, FeatureSet::new(Quark::intern("genes"), Quark::NULL))
            .unwrap();
        let mut target = FeatureArena::new();
        let moved = target.transfer_from(&mut source, block).unwrap();

        assert!(!source.contains(block));
        assert_eq!(target.len(), 2);
        let set = target.child(moved, Quark::intern("genes")).unwrap();
        assert_eq!(target.get(set).unwrap().parent(), Some(moved));
        assert_eq!(target.get(moved).unwrap().parent(), None);
    }
}
