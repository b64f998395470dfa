//! DNA lookups over loaded blocks.
//!
//! A block's DNA string starts at the first base of the block's span on the
//! sequence (`block_to_sequence.parent`, or base 1 when the block carries
//! no mapping). Missing DNA is a normal state and yields `None`.
use bio::alphabets::dna::revcomp;

use crate::data_structs::context::FeatureContext;
use crate::data_structs::coords::Span;
use crate::data_structs::enums::{
    FeatureType,
    Strand,
};
use crate::data_structs::node::{
    Block,
    FeatureAny,
};
use crate::data_structs::typedef::NodeId;

fn block_offset(block: &Block) -> u32 {
    block
        .block_to_sequence
        .parent
        .map(|span| span.x1)
        .unwrap_or(1)
}

/// Sequence of `span` (sequence coordinates) within `block`, forward strand.
pub fn block_dna(
    block: &Block,
    span: Span,
) -> Option<&str> {
    let dna = block.dna.as_deref()?;
    let offset = block_offset(block);
    if span.x1 < offset {
        return None;
    }
    let start = (span.x1 - offset) as usize;
    let end = (span.x2 - offset) as usize + 1;
    dna.get(start..end)
}

/// DNA of a feature as read on its own strand. Transcripts are spliced
/// over their exons.
pub fn feature_dna(
    context: &FeatureContext,
    feature_id: NodeId,
) -> Option<String> {
    let feature = context.feature(feature_id)?;
    let block_id = context.block_of(feature_id)?;
    let block = context.get(block_id).and_then(FeatureAny::as_block)?;

    let forward = match (feature.kind(), feature.transcript()) {
        (FeatureType::Transcript, Some(tr)) if !tr.exons.is_empty() => tr
            .exons
            .iter()
            .map(|exon| block_dna(block, *exon))
            .collect::<Option<String>>()?,
        _ => block_dna(block, feature.span())?.to_string(),
    };

    if feature.strand() == Strand::Reverse {
        String::from_utf8(revcomp(forward.as_bytes())).ok()
    }
    else {
        Some(forward)
    }
}
