//! Container levels of the feature hierarchy and the [`FeatureAny`] sum type
//! stored in the arena.
use std::sync::Arc;

use hashbrown::HashMap;
use indexmap::IndexSet;

use crate::data_structs::coords::{
    Span,
    SpanMapping,
};
use crate::data_structs::enums::StructType;
use crate::data_structs::feature::Feature;
use crate::data_structs::styles::StyleTable;
use crate::data_structs::typedef::{
    Coord,
    NodeId,
};
use crate::quark::Quark;

/// Whether a parent link owns its child.
///
/// A node has exactly one owning link. A diff context links nodes adopted
/// by a merge as [`Ownership::Borrowed`]: the master context frees them,
/// the diff never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ownership {
    Owned,
    Borrowed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    pub id:        NodeId,
    pub ownership: Ownership,
}

impl Link {
    pub fn owned(id: NodeId) -> Self {
        Self {
            id,
            ownership: Ownership::Owned,
        }
    }

    pub fn borrowed(id: NodeId) -> Self {
        Self {
            id,
            ownership: Ownership::Borrowed,
        }
    }

    pub fn is_owned(&self) -> bool { self.ownership == Ownership::Owned }
}

/// Fields shared by every level of the hierarchy.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnyHeader {
    /// Owning container; `None` for a context and for detached nodes.
    pub(crate) parent:      Option<NodeId>,
    pub(crate) unique_id:   Quark,
    pub(crate) original_id: Quark,
    /// Lookup by child unique id. Not an ordering.
    pub(crate) children:    HashMap<Quark, Link>,
}

impl AnyHeader {
    pub fn new(
        unique_id: Quark,
        original_id: Quark,
    ) -> Self {
        Self {
            parent: None,
            unique_id,
            original_id,
            children: HashMap::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> { self.parent }

    pub fn unique_id(&self) -> Quark { self.unique_id }

    pub fn original_id(&self) -> Quark { self.original_id }

    pub fn children(&self) -> &HashMap<Quark, Link> { &self.children }
}

/// Root of one view of a sequence's annotation.
#[derive(Debug, Clone)]
pub struct Context {
    pub(crate) header:      AnyHeader,
    pub sequence_name:      Quark,
    /// Assembly this sequence is a sub-part of, if any.
    pub parent_name:        Quark,
    pub length:             Coord,
    /// Coordinates of this sequence within its parent.
    pub parent_span:        Option<Span>,
    pub sequence_to_parent: SpanMapping,
    /// Feature sets wanted in this context, in display order. Empty means
    /// every set is wanted.
    pub feature_set_names:  IndexSet<Quark>,
    pub(crate) styles:      Arc<StyleTable>,
    pub(crate) master_align: Option<NodeId>,
    pub(crate) diff_context: bool,
}

impl Context {
    pub fn new(sequence_name: Quark) -> Self {
        Self {
            header:             AnyHeader::new(sequence_name, sequence_name),
            sequence_name,
            parent_name:        Quark::NULL,
            length:             0,
            parent_span:        None,
            sequence_to_parent: SpanMapping::default(),
            feature_set_names:  IndexSet::new(),
            styles:             Arc::new(StyleTable::default()),
            master_align:       None,
            diff_context:       false,
        }
    }

    pub fn styles(&self) -> &Arc<StyleTable> { &self.styles }

    pub fn master_alignment(&self) -> Option<NodeId> { self.master_align }

    pub fn is_diff(&self) -> bool { self.diff_context }

    /// Whether features of `set_id` belong in this context.
    pub fn wants_feature_set(
        &self,
        set_id: Quark,
    ) -> bool {
        self.feature_set_names.is_empty()
            || self.feature_set_names.contains(&set_id)
    }

    /// Context metadata carries no sequence yet.
    pub fn is_unset(&self) -> bool { self.sequence_name.is_null() }

    /// Copy of the metadata without children, used for diff shells.
    pub(crate) fn shell(&self) -> Self {
        Self {
            header: AnyHeader::new(self.header.unique_id, self.header.original_id),
            master_align: None,
            diff_context: true,
            ..self.clone()
        }
    }
}

/// Top-level assembly grouping below a context.
#[derive(Debug, Clone)]
pub struct Alignment {
    pub(crate) header: AnyHeader,
}

impl Alignment {
    pub fn new(id: Quark) -> Self {
        Self {
            header: AnyHeader::new(id, id),
        }
    }
}

/// Contiguous mapped region of sequence within an alignment.
#[derive(Debug, Clone)]
pub struct Block {
    pub(crate) header:     AnyHeader,
    pub block_to_sequence: SpanMapping,
    /// `None` is the normal "no DNA loaded" state.
    pub dna:               Option<String>,
}

impl Block {
    pub fn new(
        id: Quark,
        block_to_sequence: SpanMapping,
    ) -> Self {
        Self {
            header: AnyHeader::new(id, id),
            block_to_sequence,
            dna: None,
        }
    }

    /// Canonical block id for `sequence` over `span`.
    pub fn create_id(
        sequence: Quark,
        span: Span,
    ) -> Quark {
        Quark::intern(&format!("{}_{}.{}", sequence, span.x1, span.x2))
    }
}

/// Named group of features sharing a source and a style.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub(crate) header: AnyHeader,
    /// Style reference; the style itself lives in the context's table.
    pub style_id:      Quark,
    pub description:   Option<String>,
}

impl FeatureSet {
    pub fn new(
        id: Quark,
        style_id: Quark,
    ) -> Self {
        Self {
            header: AnyHeader::new(id, id),
            style_id,
            description: None,
        }
    }

    /// Feature-set ids are the lower-cased set name.
    pub fn create_id(name: &str) -> Quark { Quark::intern(&name.to_lowercase()) }
}

/// Any node of the hierarchy.
#[derive(Debug, Clone)]
pub enum FeatureAny {
    Context(Context),
    Alignment(Alignment),
    Block(Block),
    FeatureSet(FeatureSet),
    Feature(Feature),
}

impl FeatureAny {
    pub fn struct_type(&self) -> StructType {
        match self {
            FeatureAny::Context(_) => StructType::Context,
            FeatureAny::Alignment(_) => StructType::Alignment,
            FeatureAny::Block(_) => StructType::Block,
            FeatureAny::FeatureSet(_) => StructType::FeatureSet,
            FeatureAny::Feature(_) => StructType::Feature,
        }
    }

    pub fn header(&self) -> &AnyHeader {
        match self {
            FeatureAny::Context(n) => &n.header,
            FeatureAny::Alignment(n) => &n.header,
            FeatureAny::Block(n) => &n.header,
            FeatureAny::FeatureSet(n) => &n.header,
            FeatureAny::Feature(n) => &n.header,
        }
    }

    pub(crate) fn header_mut(&mut self) -> &mut AnyHeader {
        match self {
            FeatureAny::Context(n) => &mut n.header,
            FeatureAny::Alignment(n) => &mut n.header,
            FeatureAny::Block(n) => &mut n.header,
            FeatureAny::FeatureSet(n) => &mut n.header,
            FeatureAny::Feature(n) => &mut n.header,
        }
    }

    pub fn unique_id(&self) -> Quark { self.header().unique_id }

    pub fn original_id(&self) -> Quark { self.header().original_id }

    pub fn parent(&self) -> Option<NodeId> { self.header().parent }

    pub fn children(&self) -> &HashMap<Quark, Link> { &self.header().children }

    /// Copy of a container without its children, used when a diff needs a
    /// node of its own at a level where both trees already had one.
    pub(crate) fn shell(&self) -> Option<FeatureAny> {
        let shell = match self {
            FeatureAny::Context(c) => FeatureAny::Context(c.shell()),
            FeatureAny::Alignment(a) => FeatureAny::Alignment(Alignment {
                header: AnyHeader::new(a.header.unique_id, a.header.original_id),
            }),
            FeatureAny::Block(b) => FeatureAny::Block(Block {
                header:            AnyHeader::new(
                    b.header.unique_id,
                    b.header.original_id,
                ),
                block_to_sequence: b.block_to_sequence,
                dna:               None,
            }),
            FeatureAny::FeatureSet(s) => FeatureAny::FeatureSet(FeatureSet {
                header:      AnyHeader::new(s.header.unique_id, s.header.original_id),
                style_id:    s.style_id,
                description: s.description.clone(),
            }),
            FeatureAny::Feature(_) => return None,
        };
        Some(shell)
    }

    pub fn as_context(&self) -> Option<&Context> {
        match self {
            FeatureAny::Context(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_alignment(&self) -> Option<&Alignment> {
        match self {
            FeatureAny::Alignment(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&Block> {
        match self {
            FeatureAny::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_feature_set(&self) -> Option<&FeatureSet> {
        match self {
            FeatureAny::FeatureSet(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_feature(&self) -> Option<&Feature> {
        match self {
            FeatureAny::Feature(f) => Some(f),
            _ => None,
        }
    }

    pub(crate) fn as_context_mut(&mut self) -> Option<&mut Context> {
        match self {
            FeatureAny::Context(c) => Some(c),
            _ => None,
        }
    }

    pub(crate) fn as_block_mut(&mut self) -> Option<&mut Block> {
        match self {
            FeatureAny::Block(b) => Some(b),
            _ => None,
        }
    }
}

impl From<Context> for FeatureAny {
    fn from(value: Context) -> Self { FeatureAny::Context(value) }
}

impl From<Alignment> for FeatureAny {
    fn from(value: Alignment) -> Self { FeatureAny::Alignment(value) }
}

impl From<Block> for FeatureAny {
    fn from(value: Block) -> Self { FeatureAny::Block(value) }
}

impl From<FeatureSet> for FeatureAny {
    fn from(value: FeatureSet) -> Self { FeatureAny::FeatureSet(value) }
}

impl From<Feature> for FeatureAny {
    fn from(value: Feature) -> Self { FeatureAny::Feature(value) }
}
