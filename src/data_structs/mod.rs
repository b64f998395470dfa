//! The feature data model: a five-level hierarchy of annotation nodes and
//! the storage that holds it.
//!
//! - [`node`]: the container levels ([`Context`], [`Alignment`], [`Block`],
//!   [`FeatureSet`]) and the [`FeatureAny`] sum type every node is stored
//!   as.
//! - [`feature`]: the leaf [`Feature`] with its homology and transcript
//!   payloads, and the construction API that populates it.
//! - [`arena`] and [`context`]: node storage with explicit ownership tags,
//!   and [`FeatureContext`], the handle owning one tree and the diffs
//!   derived from it.
//! - [`traverse`]: the generic walk used by every consumer of a tree.
//! - [`styles`]: style and feature-source lookup tables consumed by the
//!   parser.
//! - [`dna`]: sequence lookups for blocks and features.
//! - [`coords`] and [`typedef`]: coordinate primitives and type aliases.

pub mod arena;
pub mod context;
pub mod coords;
pub mod dna;
mod enums;
mod error;
pub mod feature;
pub mod node;
pub mod styles;
pub mod traverse;
pub mod typedef;


pub use arena::FeatureArena;
pub use context::{
    ContextDiff,
    FeatureContext,
    FeaturePath,
};
pub use coords::{
    Span,
    SpanMapping,
};
pub use enums::{
    BoundaryType,
    FeatureType,
    HomolType,
    Phase,
    Strand,
    StructType,
};
pub use error::StructureError;
pub use feature::{
    AlignBlock,
    Feature,
    FeatureDetail,
    HomologyData,
    StandardData,
    TranscriptData,
};
pub use node::{
    Alignment,
    AnyHeader,
    Block,
    Context,
    FeatureAny,
    FeatureSet,
    Link,
    Ownership,
};
pub use styles::{
    ColumnMap,
    FeatureSource,
    FeatureSourceTable,
    FeatureStyle,
    StyleTable,
};
pub use traverse::{
    execute,
    execute_with_exit,
    Aborted,
    NodeRef,
    Visit,
};
