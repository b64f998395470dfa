//! Plain-text tree dump.
//!
//! One line per node, indented by two spaces per level, with the fields of
//! each level separated by tabs in a fixed order:
//!
//! | level       | fields                                                              |
//! |-------------|---------------------------------------------------------------------|
//! | Context     | `Context` sequence parent length parent-span diff                   |
//! | Alignment   | `Alignment` unique-id original-id master                            |
//! | Block       | `Block` unique-id block-span sequence-span dna-length               |
//! | FeatureSet  | `FeatureSet` unique-id original-id style description                |
//! | Feature     | `Feature` unique-id original-id type ontology start end strand phase score detail |
//!
//! Missing values print as `.`. The feature detail column holds the exons
//! and CDS of a transcript or the target and blocks of an alignment. The
//! format is meant for regression fixtures, so the field order is part of
//! its contract.
use std::io::Write;

use anyhow::anyhow;
use itertools::Itertools;

use crate::data_structs::typedef::NodeId;
use crate::data_structs::{
    execute,
    FeatureAny,
    FeatureArena,
    FeatureContext,
    FeatureDetail,
    Span,
    StructType,
    Visit,
};

fn span_text(span: Option<Span>) -> String {
    span.map(|s| format!("{}-{}", s.x1, s.x2))
        .unwrap_or_else(|| ".".to_string())
}

fn text_or_dot(text: Option<&str>) -> &str { text.unwrap_or(".") }

/// Formats the fields of one node, without indentation.
pub fn node_line(
    node: &FeatureAny,
    master: Option<NodeId>,
    id: NodeId,
) -> String {
    match node {
        FeatureAny::Context(c) => {
            format!(
                "Context\t{}\t{}\t{}\t{}\t{}",
                c.sequence_name,
                c.parent_name,
                c.length,
                span_text(c.parent_span),
                c.is_diff()
            )
        },
        FeatureAny::Alignment(a) => {
            format!(
                "Alignment\t{}\t{}\t{}",
                a.header.unique_id,
                a.header.original_id,
                master == Some(id)
            )
        },
        FeatureAny::Block(b) => {
            format!(
                "Block\t{}\t{}\t{}\t{}",
                b.header.unique_id,
                span_text(b.block_to_sequence.child),
                span_text(b.block_to_sequence.parent),
                b.dna.as_ref().map(String::len).unwrap_or(0)
            )
        },
        FeatureAny::FeatureSet(s) => {
            format!(
                "FeatureSet\t{}\t{}\t{}\t{}",
                s.header.unique_id,
                s.header.original_id,
                s.style_id,
                text_or_dot(s.description.as_deref())
            )
        },
        FeatureAny::Feature(f) => {
            let score = if f.has_score() {
                f.score().to_string()
            }
            else {
                ".".to_string()
            };
            let detail = match f.detail() {
                FeatureDetail::Transcript(tr) => {
                    format!(
                        "exons={};cds={}",
                        tr.exons
                            .iter()
                            .map(|e| span_text(Some(*e)))
                            .join(","),
                        span_text(tr.cds)
                    )
                },
                FeatureDetail::Homology(h) => {
                    format!(
                        "target={}:{};blocks={}",
                        h.query_name,
                        span_text(h.query),
                        h.gaps
                            .iter()
                            .map(|b| {
                                format!(
                                    "{}>{}",
                                    span_text(Some(b.query)),
                                    span_text(Some(b.target))
                                )
                            })
                            .join(",")
                    )
                },
                FeatureDetail::None => ".".to_string(),
            };
            format!(
                "Feature\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                f.unique_id(),
                f.original_id(),
                f.kind(),
                f.ontology(),
                f.x1(),
                f.x2(),
                f.strand(),
                f.phase(),
                score,
                detail
            )
        },
    }
}

/// Dumps the subtree under `start` down to `stop`.
pub fn dump_tree<W: Write>(
    arena: &FeatureArena,
    start: NodeId,
    stop: StructType,
    master: Option<NodeId>,
    writer: &mut W,
) -> anyhow::Result<()> {
    execute(arena, start, stop, |node| {
        let line = node_line(node.node, master, node.id);
        match writeln!(writer, "{}{}", "  ".repeat(node.depth), line) {
            Ok(()) => Visit::Continue,
            Err(e) => Visit::Abort(e.to_string()),
        }
    })
    .map_err(|e| anyhow!(e))
}

/// Dumps a whole context.
pub fn dump_context<W: Write>(
    context: &FeatureContext,
    writer: &mut W,
) -> anyhow::Result<()> {
    dump_tree(
        context.arena(),
        context.root(),
        StructType::Feature,
        context.master_alignment(),
        writer,
    )
}

/// Renders a context to a string.
pub fn dump_to_string(context: &FeatureContext) -> anyhow::Result<String> {
    let mut buf = Vec::new();
    dump_context(context, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}
