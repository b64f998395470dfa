//! Commonly used types, re-exported for `use annotree::prelude::*`.
pub use crate::data_structs::typedef::{
    Coord,
    NodeId,
    ScoreType,
};
pub use crate::data_structs::{
    execute,
    ContextDiff,
    Feature,
    FeatureAny,
    FeatureContext,
    FeatureType,
    Span,
    SpanMapping,
    Strand,
    StructType,
    StructureError,
    Visit,
};
pub use crate::io::gff::{
    ClipPolicy,
    GffError,
    GffParser,
    GffVersion,
    ParseOutput,
    ParserConfig,
    ParserStats,
    SequenceRegion,
};
pub use crate::io::loader::spawn_loader;
pub use crate::merge::{
    erase_context,
    erase_diff,
    merge_context,
};
pub use crate::quark::Quark;
