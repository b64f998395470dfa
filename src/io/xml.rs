//! Mapping of tree nodes onto XML events.
//!
//! Every node becomes an element named after its level, with the node's
//! fields as attributes. Transcript exons and CDS and alignment blocks are
//! nested below their feature. [`tree_events`] only produces the ordered
//! event list; [`write_events`] renders it with `quick-xml` for callers
//! that want text.
use std::cell::RefCell;
use std::io::Write;

use anyhow::anyhow;
use quick_xml::events::{
    BytesEnd,
    BytesStart,
    BytesText,
    Event,
};
use quick_xml::Writer;

use crate::data_structs::typedef::NodeId;
use crate::data_structs::{
    execute_with_exit,
    FeatureAny,
    FeatureArena,
    FeatureContext,
    FeatureDetail,
    Span,
    StructType,
    Visit,
};

#[derive(Debug, Clone, PartialEq)]
pub enum XmlEvent {
    Start {
        name:       &'static str,
        attributes: Vec<(&'static str, String)>,
    },
    End {
        name: &'static str,
    },
    Characters(String),
}

impl XmlEvent {
    fn start(
        name: &'static str,
        attributes: Vec<(&'static str, String)>,
    ) -> Self {
        XmlEvent::Start { name, attributes }
    }

    /// An element without content.
    fn empty(
        name: &'static str,
        attributes: Vec<(&'static str, String)>,
    ) -> [Self; 2] {
        [XmlEvent::start(name, attributes), XmlEvent::End { name }]
    }
}

/// Element name of a level.
pub fn element_name(struct_type: StructType) -> &'static str {
    match struct_type {
        StructType::Context => "context",
        StructType::Alignment => "align",
        StructType::Block => "block",
        StructType::FeatureSet => "featureset",
        StructType::Feature => "feature",
    }
}

fn span_attrs(span: Span) -> [(&'static str, String); 2] {
    [("start", span.x1.to_string()), ("end", span.x2.to_string())]
}

/// Events opening `node`, including any content nested below a feature
/// that is not itself a node.
pub fn open_events(node: &FeatureAny) -> Vec<XmlEvent> {
    let name = element_name(node.struct_type());
    let mut attrs = vec![("id", node.unique_id().to_string())];
    if node.original_id() != node.unique_id() && !node.original_id().is_null() {
        attrs.push(("name", node.original_id().to_string()));
    }

    let mut events = Vec::new();
    match node {
        FeatureAny::Context(c) => {
            attrs.push(("sequence", c.sequence_name.to_string()));
            if let Some(span) = c.parent_span {
                attrs.extend(span_attrs(span));
            }
            events.push(XmlEvent::start(name, attrs));
        },
        FeatureAny::Alignment(_) => events.push(XmlEvent::start(name, attrs)),
        FeatureAny::Block(b) => {
            if let Some(span) = b.block_to_sequence.child {
                attrs.extend(span_attrs(span));
            }
            events.push(XmlEvent::start(name, attrs));
            if let Some(dna) = &b.dna {
                events.push(XmlEvent::start("dna", Vec::new()));
                events.push(XmlEvent::Characters(dna.clone()));
                events.push(XmlEvent::End { name: "dna" });
            }
        },
        FeatureAny::FeatureSet(s) => {
            attrs.push(("style", s.style_id.to_string()));
            if let Some(text) = &s.description {
                attrs.push(("description", text.clone()));
            }
            events.push(XmlEvent::start(name, attrs));
        },
        FeatureAny::Feature(f) => {
            attrs.push(("type", f.kind().to_string()));
            attrs.push(("ontology", f.ontology().to_string()));
            attrs.extend(span_attrs(f.span()));
            attrs.push(("strand", f.strand().to_string()));
            if f.has_score() {
                attrs.push(("score", f.score().to_string()));
            }
            if !f.locus_id().is_null() {
                attrs.push(("locus", f.locus_id().to_string()));
            }
            if let Some(url) = f.url() {
                attrs.push(("url", url.to_string()));
            }
            events.push(XmlEvent::start(name, attrs));

            match f.detail() {
                FeatureDetail::Transcript(tr) => {
                    for exon in &tr.exons {
                        let mut a = vec![("ontology", "exon".to_string())];
                        a.extend(span_attrs(*exon));
                        events.extend(XmlEvent::empty("subfeature", a));
                    }
                    if let Some(cds) = tr.cds {
                        let mut a = vec![("ontology", "CDS".to_string())];
                        a.extend(span_attrs(cds));
                        events.extend(XmlEvent::empty("subfeature", a));
                    }
                },
                FeatureDetail::Homology(h) => {
                    let mut a = vec![
                        ("target", h.query_name.to_string()),
                        ("type", h.homol_type.to_string()),
                    ];
                    if let Some(q) = h.query {
                        a.push(("target_start", q.x1.to_string()));
                        a.push(("target_end", q.x2.to_string()));
                    }
                    events.push(XmlEvent::start("homol", a));
                    for block in &h.gaps {
                        events.extend(XmlEvent::empty("gap", vec![
                            ("target_start", block.query.x1.to_string()),
                            ("target_end", block.query.x2.to_string()),
                            ("start", block.target.x1.to_string()),
                            ("end", block.target.x2.to_string()),
                        ]));
                    }
                    events.push(XmlEvent::End { name: "homol" });
                },
                FeatureDetail::None => {},
            }
            if let Some(text) = f.description() {
                events.push(XmlEvent::start("description", Vec::new()));
                events.push(XmlEvent::Characters(text.to_string()));
                events.push(XmlEvent::End {
                    name: "description",
                });
            }
        },
    }
    events
}

/// Event list for the subtree under `start`, down to `stop`.
pub fn tree_events(
    arena: &FeatureArena,
    start: NodeId,
    stop: StructType,
) -> Vec<XmlEvent> {
    let events = RefCell::new(Vec::new());
    // Neither callback aborts.
    let _ = execute_with_exit(
        arena,
        start,
        stop,
        |node| {
            events.borrow_mut().extend(open_events(node.node));
            Visit::Continue
        },
        |node| {
            events.borrow_mut().push(XmlEvent::End {
                name: element_name(node.node.struct_type()),
            });
            Visit::Continue
        },
    );
    events.into_inner()
}

pub fn context_events(context: &FeatureContext) -> Vec<XmlEvent> {
    tree_events(context.arena(), context.root(), StructType::Feature)
}

/// Renders `events` as indented XML text.
pub fn write_events<W: Write>(
    events: &[XmlEvent],
    writer: W,
) -> anyhow::Result<()> {
    let mut xml = Writer::new_with_indent(writer, b' ', 2);
    for event in events {
        match event {
            XmlEvent::Start { name, attributes } => {
                let mut start = BytesStart::new(*name);
                for (key, value) in attributes {
                    start.push_attribute((*key, value.as_str()));
                }
                xml.write_event(Event::Start(start))
            },
            XmlEvent::End { name } => xml.write_event(Event::End(BytesEnd::new(*name))),
            XmlEvent::Characters(text) => xml.write_event(Event::Text(BytesText::new(text))),
        }
        .map_err(|e| anyhow!("Could not write XML event: {}", e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structs::{
        Alignment,
        Block,
        Feature,
        FeatureSet,
        FeatureType,
        Phase,
        SpanMapping,
        StandardData,
        Strand,
    };
    use crate::quark::Quark;

    fn small_context() -> FeatureContext {
        let mut ctx = FeatureContext::new(Quark::intern("chrX"));
        let align = ctx
            .add_alignment(Alignment::new(Quark::intern("chrX")), true)
            .unwrap();
        let block = ctx
            .add_child(align, Block::new(Quark::intern("chrX"), SpanMapping::default()))
            .unwrap();
        let set = ctx
            .add_child(block, FeatureSet::new(Quark::intern("est"), Quark::intern("est")))
            .unwrap();
        let mut tx = Feature::create_empty();
        tx.add_standard_data(StandardData {
            unique_id:   Quark::intern("t1_10.40"),
            original_id: Quark::intern("t1"),
            ontology:    Quark::intern("mRNA"),
            kind:        FeatureType::Transcript,
            start:       10,
            end:         40,
            score:       Some(2.5),
            strand:      Strand::Reverse,
            phase:       Phase::None,
        });
        tx.add_transcript_exon(Span::new(10, 20));
        tx.add_transcript_exon(Span::new(30, 40));
        ctx.add_child(set, tx).unwrap();
        ctx
    }

    #[test]
    fn test_events_balanced() {
        let events = context_events(&small_context());
        let mut depth = 0i32;
        for e in &events {
            match e {
                XmlEvent::Start { .. } => depth += 1,
                XmlEvent::End { .. } => depth -= 1,
                XmlEvent::Characters(_) => {},
            }
            assert!(depth >= 0);
        }
        assert_eq!(depth, 0);
        let subfeatures = events
            .iter()
            .filter(|e| matches!(e, XmlEvent::Start { name: "subfeature", .. }))
            .count();
        assert_eq!(subfeatures, 2);
    }

    #[test]
    fn test_feature_attributes() {
        let events = context_events(&small_context());
        let attrs = events
            .iter()
            .find_map(|e| match e {
                XmlEvent::Start {
                    name: "feature",
                    attributes,
                } => Some(attributes.clone()),
                _ => None,
            })
            .unwrap();
        assert!(attrs.contains(&("id", "t1_10.40".to_string())));
        assert!(attrs.contains(&("name", "t1".to_string())));
        assert!(attrs.contains(&("score", "2.5".to_string())));
    }

    #[test]
    fn test_write_events() {
        let mut out = Vec::new();
        write_events(&context_events(&small_context()), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("<context id=\"chrX\""));
        assert!(text.contains("<featureset id=\"est\" style=\"est\">"));
        assert!(text.trim_end().ends_with("</context>"));
    }
}
