//! Multi-line feature reconstruction and assembly of the parsed tree.
//!
//! Records are gathered per feature set. Transcript parts (summary, exon,
//! intron, CDS, UTR lines) that share a key are folded into one pending
//! feature, as are GFF3 alignment lines sharing an `ID`. Everything else
//! becomes a standalone feature. Nothing enters a [`FeatureContext`] until
//! [`TreeBuilder::finish`], because the unique id of a multi-line feature
//! depends on its final extent.
use std::sync::Arc;

use indexmap::IndexMap;
use log::{
    debug,
    warn,
};

use crate::data_structs::styles::ResolvedSource;
use crate::data_structs::{
    AlignBlock,
    Alignment,
    Block,
    Context,
    Feature,
    FeatureContext,
    FeatureDetail,
    FeatureSet,
    FeatureType,
    HomologyData,
    Phase,
    Span,
    SpanMapping,
    StandardData,
    Strand,
    StyleTable,
};
use crate::io::gff::classify::{
    Part,
    TypeClass,
};
use crate::io::gff::dialect::LineAttributes;
use crate::io::gff::error::GffError;
use crate::io::gff::fields::GffRecord;
use crate::io::gff::stats::ParserStats;
use crate::io::gff::ClipPolicy;
use crate::quark::Quark;

/// One classified, interpreted record.
pub(crate) struct FeatureLine<'a> {
    pub record: &'a GffRecord,
    pub class:  TypeClass,
    pub attrs:  LineAttributes,
    pub line:   usize,
}

impl FeatureLine<'_> {
    fn span(&self) -> Span { Span::new(self.record.start, self.record.end) }

    fn ontology(&self) -> Quark { Quark::intern(&self.record.term) }

    fn standard(
        &self,
        kind: FeatureType,
        name: Quark,
    ) -> StandardData {
        let span = self.span();
        StandardData {
            unique_id: name,
            original_id: name,
            ontology: self.ontology(),
            kind,
            start: span.x1,
            end: span.x2,
            score: self.record.score,
            strand: self.record.strand,
            phase: self.record.phase,
        }
    }

    fn rejected(
        &self,
        name: Quark,
        reason: &str,
    ) -> GffError {
        GffError::Rejected {
            line:   self.line,
            name:   name.to_string(),
            reason: reason.to_string(),
        }
    }

    fn homology(&self) -> HomologyData {
        let target = self.attrs.target.as_ref();
        let query = target.map(|t| Span::new(t.start, t.end));
        HomologyData {
            homol_type:   target
                .and_then(|t| t.homol_type())
                .unwrap_or(self.class.homol),
            query_name:   target
                .map(|t| Quark::intern(&t.name))
                .unwrap_or_default(),
            query,
            query_length: self.attrs.query_length,
            query_strand: target.map(|t| t.strand).unwrap_or_default(),
            query_phase:  Phase::None,
            gaps:         self.attrs.gaps.clone(),
        }
    }

    /// Blocks this line contributes to an alignment built over many lines.
    fn blocks(&self) -> Vec<AlignBlock> {
        if !self.attrs.gaps.is_empty() {
            return self.attrs.gaps.clone();
        }
        match &self.attrs.target {
            Some(t) => vec![AlignBlock {
                query:  Span::new(t.start, t.end),
                target: self.span(),
            }],
            None => Vec::new(),
        }
    }
}

fn apply_annotations(
    feature: &mut Feature,
    attrs: &LineAttributes,
) {
    if let Some(locus) = &attrs.locus {
        feature.add_locus(Quark::intern(locus));
    }
    if let Some(url) = &attrs.url {
        feature.add_url(url);
    }
    if let Some(text) = &attrs.description {
        feature.add_description(text);
    }
}

fn standard_of(
    feature: &Feature,
    kind: FeatureType,
) -> StandardData {
    StandardData {
        unique_id: feature.unique_id(),
        original_id: feature.original_id(),
        ontology: feature.ontology(),
        kind,
        start: feature.x1(),
        end: feature.x2(),
        score: feature.has_score().then(|| feature.score()),
        strand: feature.strand(),
        phase: feature.phase(),
    }
}

#[derive(Debug, Clone)]
struct Pending {
    feature:         Feature,
    /// Span of a single exon that has not yet been joined by another part.
    lone_exon:       Option<Span>,
    start_not_found: bool,
    end_not_found:   bool,
}

impl Pending {
    fn new(feature: Feature) -> Self {
        Self {
            feature,
            lone_exon: None,
            start_not_found: false,
            end_not_found: false,
        }
    }

    /// Turns a lone exon into a transcript holding that exon.
    fn promote(
        &mut self,
        line: &FeatureLine,
    ) -> Result<(), GffError> {
        if self.feature.kind() == FeatureType::Transcript {
            return Ok(());
        }
        let data = standard_of(&self.feature, FeatureType::Transcript);
        if !self.feature.add_standard_data(data) {
            return Err(line.rejected(
                self.feature.original_id(),
                "cannot become a transcript",
            ));
        }
        if let Some(exon) = self.lone_exon.take() {
            self.feature.add_transcript_exon(exon);
        }
        Ok(())
    }

    fn add_part(
        &mut self,
        line: &FeatureLine,
    ) -> Result<(), GffError> {
        let span = line.span();
        match line.class.part {
            Part::Transcript => {
                self.promote(line)?;
                let mut data = line.standard(FeatureType::Transcript, self.feature.unique_id());
                let covered = self.feature.span().union(&span);
                data.start = covered.x1;
                data.end = covered.x2;
                if let Some(name) = &line.attrs.name {
                    data.original_id = Quark::intern(name);
                }
                if !self.feature.add_standard_data(data) {
                    return Err(line.rejected(self.feature.original_id(), "type clash"));
                }
            },
            Part::Exon | Part::Utr => {
                self.promote(line)?;
                self.feature.add_transcript_exon(span);
            },
            Part::Intron => {
                self.promote(line)?;
                self.feature.add_transcript_intron(span);
            },
            Part::Cds => {
                self.promote(line)?;
                self.feature.add_transcript_cds(span, line.record.phase);
            },
            Part::Whole | Part::MatchPart => {
                return Err(line.rejected(self.feature.original_id(), "not a transcript part"))
            },
        }
        self.feature.extend_span(span);
        self.start_not_found |= line.attrs.start_not_found;
        self.end_not_found |= line.attrs.end_not_found;
        apply_annotations(&mut self.feature, &line.attrs);
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct PendingSet {
    source:     ResolvedSource,
    compound:   IndexMap<Quark, Pending>,
    alignments: IndexMap<Quark, Pending>,
    closed:     Vec<Pending>,
}

impl PendingSet {
    fn new(source: ResolvedSource) -> Self {
        Self {
            source,
            compound: IndexMap::new(),
            alignments: IndexMap::new(),
            closed: Vec::new(),
        }
    }

    fn add_compound(
        &mut self,
        key: Quark,
        line: &FeatureLine,
    ) -> Result<(), GffError> {
        if let Some(pending) = self.compound.get_mut(&key) {
            return pending.add_part(line);
        }

        let mut feature = Feature::create_empty();
        let pending = match line.class.part {
            Part::Exon | Part::Utr => {
                feature.add_standard_data(line.standard(FeatureType::Basic, key));
                let mut pending = Pending::new(feature);
                pending.lone_exon = Some(line.span());
                pending.start_not_found = line.attrs.start_not_found;
                pending.end_not_found = line.attrs.end_not_found;
                apply_annotations(&mut pending.feature, &line.attrs);
                pending
            },
            _ => {
                feature.add_standard_data(line.standard(FeatureType::Transcript, key));
                let mut pending = Pending::new(feature);
                pending.add_part(line)?;
                pending
            },
        };
        self.compound.insert(key, pending);
        Ok(())
    }

    fn add_alignment_part(
        &mut self,
        key: Quark,
        line: &FeatureLine,
    ) -> Result<(), GffError> {
        if let Some(pending) = self.alignments.get_mut(&key) {
            let feature = &mut pending.feature;
            for block in line.blocks() {
                if !feature.add_alignment_block(block) {
                    return Err(line.rejected(key, "not an alignment"));
                }
            }
            feature.extend_span(line.span());
            apply_annotations(feature, &line.attrs);
            return Ok(());
        }

        let mut feature = Feature::create_empty();
        feature.add_standard_data(line.standard(FeatureType::Alignment, key));
        let mut homology = line.homology();
        homology.gaps = line.blocks();
        feature.add_alignment_data(homology);
        apply_annotations(&mut feature, &line.attrs);
        self.alignments.insert(key, Pending::new(feature));
        Ok(())
    }

    fn add_single(
        &mut self,
        line: &FeatureLine,
    ) -> Result<(), GffError> {
        let kind = match line.class.kind {
            FeatureType::Transcript => FeatureType::Basic,
            kind => kind,
        };
        let name = line
            .attrs
            .name
            .as_deref()
            .unwrap_or(&line.record.term);
        let name = Quark::intern(name);

        let mut feature = Feature::create_empty();
        if !feature.add_standard_data(line.standard(kind, name)) {
            return Err(line.rejected(name, "incomplete standard data"));
        }
        if kind == FeatureType::Alignment {
            feature.add_alignment_data(line.homology());
        }
        if let Some(boundary) = line.class.boundary {
            feature.add_splice(boundary);
        }
        apply_annotations(&mut feature, &line.attrs);
        self.closed.push(Pending::new(feature));
        Ok(())
    }

    fn close_open(&mut self) {
        self.closed.extend(self.compound.drain(..).map(|(_, p)| p));
        self.closed.extend(self.alignments.drain(..).map(|(_, p)| p));
    }
}

/// Clip window and the way it applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Clip {
    pub window: Span,
    pub policy: ClipPolicy,
}

/// Shape of the context the builder assembles.
#[derive(Debug, Clone)]
pub(crate) struct ContextShape {
    pub sequence:     Quark,
    /// Extent of the sequence, declared or configured.
    pub region:       Option<Span>,
    /// Part of the sequence the caller asked for. Only this enters the
    /// block id, so files with and without a region directive share blocks.
    pub window:       Option<Span>,
    pub styles:       Option<Arc<StyleTable>>,
    pub feature_sets: indexmap::IndexSet<Quark>,
    pub clip:         Option<Clip>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct TreeBuilder {
    sets: IndexMap<Quark, PendingSet>,
    dna:  Option<String>,
}

impl TreeBuilder {
    pub fn add_line(
        &mut self,
        source: &ResolvedSource,
        line: FeatureLine,
    ) -> Result<(), GffError> {
        let set = self
            .sets
            .entry(source.feature_set_id)
            .or_insert_with(|| PendingSet::new(source.clone()));

        let keys = line
            .attrs
            .keys
            .iter()
            .map(|k| Quark::intern(k))
            .collect::<Vec<_>>();

        if line.class.part.is_compound() && !keys.is_empty() {
            for key in keys {
                set.add_compound(key, &line)?;
            }
            Ok(())
        }
        else if line.class.kind == FeatureType::Alignment && !keys.is_empty() {
            for key in keys {
                set.add_alignment_part(key, &line)?;
            }
            Ok(())
        }
        else {
            set.add_single(&line)
        }
    }

    pub fn set_dna(
        &mut self,
        dna: String,
    ) {
        self.dna = Some(dna);
    }

    pub fn has_dna(&self) -> bool { self.dna.is_some() }

    /// Closes every multi-line feature; later lines with the same key start
    /// new features.
    pub fn resolve_forward(&mut self) {
        self.sets
            .values_mut()
            .for_each(PendingSet::close_open);
    }

    /// Normalises, clips and identifies every gathered feature and builds
    /// the context.
    pub fn finish(
        mut self,
        shape: ContextShape,
        stats: &mut ParserStats,
    ) -> Result<FeatureContext, GffError> {
        self.resolve_forward();

        let mut context = Context::new(shape.sequence);
        if let Some(region) = shape.region {
            context.length = region.x2;
            context.parent_span = Some(region);
            context.sequence_to_parent = SpanMapping::identity(region);
        }
        context.feature_set_names = shape.feature_sets;
        let mut ctx = FeatureContext::from_context(context);
        if let Some(styles) = shape.styles {
            ctx = ctx.with_styles(styles);
        }

        let mut sets = Vec::with_capacity(self.sets.len());
        for (set_id, pending) in self.sets {
            let mut features: IndexMap<Quark, Feature> = IndexMap::new();
            for p in pending.closed {
                let Some(feature) = finalise(p, shape.clip, stats)
                else {
                    continue;
                };
                if features.contains_key(&feature.unique_id()) {
                    warn!(
                        "Duplicate feature {} in set {}, keeping the first",
                        feature.unique_id(),
                        set_id
                    );
                    stats.duplicates += 1;
                    continue;
                }
                features.insert(feature.unique_id(), feature);
            }
            if features.is_empty() {
                debug!("Feature set {} has no features left", set_id);
                continue;
            }
            sets.push((pending.source, features));
        }

        if sets.is_empty() && self.dna.is_none() {
            return Ok(ctx);
        }

        let align = ctx.add_alignment(Alignment::new(shape.sequence), true)?;
        let block_id = match shape.window {
            Some(window) => Block::create_id(shape.sequence, window),
            None => shape.sequence,
        };
        let mapping = shape
            .region
            .map(SpanMapping::identity)
            .unwrap_or_default();
        let mut block = Block::new(block_id, mapping);
        block.dna = self.dna;
        let block = ctx.add_child(align, block)?;

        for (source, features) in sets {
            let mut set = FeatureSet::new(source.feature_set_id, source.style_id);
            set.header.original_id = source.feature_set_name;
            set.description = source.description;
            let set = ctx.add_child(block, set)?;
            for feature in features.into_values() {
                ctx.add_child(set, feature)?;
                stats.features += 1;
            }
        }
        Ok(ctx)
    }
}

/// Completes one feature: normalises transcripts, clips, and computes the
/// final unique id. `None` means the feature is dropped.
fn finalise(
    pending: Pending,
    clip: Option<Clip>,
    stats: &mut ParserStats,
) -> Option<Feature> {
    let Pending {
        mut feature,
        start_not_found,
        end_not_found,
        ..
    } = pending;

    match feature.kind() {
        FeatureType::Transcript => {
            feature.add_transcript_data(None, Phase::None, start_not_found, end_not_found);
            if !feature.transcript_normalise() {
                warn!(
                    "Dropping transcript {} without exons",
                    feature.original_id()
                );
                stats.dropped_transcripts += 1;
                return None;
            }
        },
        FeatureType::Alignment => collapse_single_block(&mut feature),
        _ => {},
    }

    if let Some(clip) = clip {
        let span = feature.span();
        let keep = match clip.policy {
            ClipPolicy::Overlap => span.overlaps(&clip.window),
            ClipPolicy::Exclude => clip.window.contains_span(&span),
            ClipPolicy::Trim => {
                if clip.window.contains_span(&span) {
                    true
                }
                else if trim_to(&mut feature, clip.window) {
                    stats.trimmed += 1;
                    true
                }
                else {
                    false
                }
            },
        };
        if !keep {
            stats.clipped += 1;
            return None;
        }
    }

    let (qs, qe) = feature
        .homology()
        .and_then(|h| h.query)
        .map(|q| (q.x1, q.x2))
        .unwrap_or((0, 0));
    let id = Feature::create_id(
        feature.kind(),
        &feature.original_id().as_str(),
        feature.strand(),
        feature.x1(),
        feature.x2(),
        qs,
        qe,
    );
    feature.set_unique_id(id);
    Some(feature)
}

/// A gap list holding one block that covers the whole alignment carries no
/// information and is cleared.
fn collapse_single_block(feature: &mut Feature) {
    let span = feature.span();
    if let FeatureDetail::Homology(h) = feature.detail_mut() {
        h.gaps.sort_by_key(|b| b.target);
        if let [only] = h.gaps.as_slice() {
            if only.target == span && Some(only.query) == h.query {
                h.gaps.clear();
            }
        }
    }
}

/// Cuts a feature down to `window`. Returns `false` when nothing is left.
fn trim_to(
    feature: &mut Feature,
    window: Span,
) -> bool {
    let span = feature.span();
    let Some(kept) = span.intersect(&window)
    else {
        return false;
    };
    let strand = feature.strand();
    let (cut_left, cut_right) = (kept.x1 > span.x1, kept.x2 < span.x2);

    let kept = match feature.detail_mut() {
        FeatureDetail::Transcript(tr) => {
            tr.exons = tr
                .exons
                .iter()
                .filter_map(|e| e.intersect(&window))
                .collect();
            tr.cds = tr.cds.and_then(|c| c.intersect(&window));
            let (five, three) = match strand {
                Strand::Reverse => (cut_right, cut_left),
                _ => (cut_left, cut_right),
            };
            tr.start_not_found |= five;
            tr.end_not_found |= three;
            Some(kept)
        },
        FeatureDetail::Homology(h) => trim_alignment(h, span, window, strand),
        FeatureDetail::None => Some(kept),
    };
    let Some(kept) = kept
    else {
        return false;
    };
    feature.set_span(kept);
    feature.transcript_normalise()
}

/// Trims the blocks of an alignment to `window`, moving the query ends by
/// the number of residues cut. Returns the new reference span.
fn trim_alignment(
    h: &mut HomologyData,
    span: Span,
    window: Span,
    strand: Strand,
) -> Option<Span> {
    let width = h.homol_type.residue_width();
    let reverse = (strand == Strand::Reverse) != (h.query_strand == Strand::Reverse);
    let mut blocks = if h.gaps.is_empty() {
        vec![AlignBlock {
            query:  h.query?,
            target: span,
        }]
    }
    else {
        std::mem::take(&mut h.gaps)
    };

    blocks = blocks
        .into_iter()
        .filter_map(|block| {
            let target = block.target.intersect(&window)?;
            let left = (target.x1 - block.target.x1) / width;
            let right = (block.target.x2 - target.x2) / width;
            let (lo, hi) = if reverse { (right, left) } else { (left, right) };
            let q1 = block.query.x1.checked_add(lo)?;
            let q2 = block.query.x2.checked_sub(hi)?;
            (q1 <= q2).then(|| AlignBlock {
                query: Span::new(q1, q2),
                target,
            })
        })
        .collect();

    let first = blocks.first()?;
    let (mut query, mut target) = (first.query, first.target);
    for block in &blocks[1..] {
        query = query.union(&block.query);
        target = target.union(&block.target);
    }
    h.query = Some(query);
    h.gaps = if blocks.len() > 1 { blocks } else { Vec::new() };
    Some(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structs::styles::FeatureSourceTable;
    use crate::data_structs::{
        HomolType,
        StructType,
    };
    use crate::io::gff::classify::Classifier;
    use crate::io::gff::dialect::Dialect;
    use crate::io::gff::fields::parse_record;
    use crate::io::gff::gff3::Gff3Dialect;

    fn feed(
        builder: &mut TreeBuilder,
        text: &str,
    ) -> Result<(), GffError> {
        let record = parse_record(text, 1)?;
        let class = Classifier::new(false, false)
            .classify(&record.term)
            .unwrap();
        let attrs = Gff3Dialect.interpret(&record, &class, 1)?;
        let source = FeatureSourceTable::default().resolve(&record.source);
        builder.add_line(&source, FeatureLine {
            record: &record,
            class,
            attrs,
            line: 1,
        })
    }

    fn shape(clip: Option<Clip>) -> ContextShape {
        ContextShape {
            sequence: Quark::intern("seq1"),
            region: Some(Span::new(1, 1000)),
            window: None,
            styles: None,
            feature_sets: Default::default(),
            clip,
        }
    }

    fn only_feature(ctx: &FeatureContext) -> Feature {
        let ids = ctx.nodes_at(StructType::Feature);
        assert_eq!(ids.len(), 1);
        ctx.feature(ids[0]).unwrap().clone()
    }

    #[test]
    fn test_two_exons_make_one_transcript() {
        let mut b = TreeBuilder::default();
        feed(&mut b, "seq1\tsrcX\texon\t10\t20\t.\t+\t.\tID=foo").unwrap();
        feed(&mut b, "seq1\tsrcX\texon\t30\t40\t.\t+\t.\tID=foo").unwrap();
        let mut stats = ParserStats::default();
        let ctx = b.finish(shape(None), &mut stats).unwrap();
        let f = only_feature(&ctx);
        assert_eq!(f.kind(), FeatureType::Transcript);
        let tr = f.transcript().unwrap();
        assert_eq!(tr.exons, vec![Span::new(10, 20), Span::new(30, 40)]);
        assert_eq!(tr.introns, vec![Span::new(21, 29)]);
        assert_eq!(&*f.unique_id().as_str(), "foo_10.40");
        assert_eq!(stats.features, 1);
    }

    #[test]
    fn test_lone_exon_stays_basic() {
        let mut b = TreeBuilder::default();
        feed(&mut b, "seq1\tsrcX\texon\t10\t20\t.\t-\t.\tID=solo").unwrap();
        let ctx = b.finish(shape(None), &mut ParserStats::default()).unwrap();
        let f = only_feature(&ctx);
        assert_eq!(f.kind(), FeatureType::Basic);
        assert_eq!(&*f.ontology().as_str(), "exon");
    }

    #[test]
    fn test_intron_only_transcript_dropped() {
        let mut b = TreeBuilder::default();
        feed(&mut b, "seq1\tsrcX\tintron\t21\t29\t.\t+\t.\tParent=tx9").unwrap();
        feed(&mut b, "seq1\tsrcX\tCDS\t10\t20\t.\t+\t0\tParent=tx9").unwrap();
        let mut stats = ParserStats::default();
        let ctx = b.finish(shape(None), &mut stats).unwrap();
        assert_eq!(ctx.feature_count(), 0);
        assert_eq!(stats.dropped_transcripts, 1);
    }

    #[test]
    fn test_summary_names_transcript() {
        let mut b = TreeBuilder::default();
        feed(&mut b, "seq1\tsrcX\texon\t100\t150\t.\t+\t.\tParent=tx1").unwrap();
        feed(&mut b, "seq1\tsrcX\tmRNA\t100\t300\t5\t+\t.\tID=tx1;Name=ABC1").unwrap();
        feed(&mut b, "seq1\tsrcX\texon\t200\t300\t.\t+\t.\tParent=tx1").unwrap();
        feed(&mut b, "seq1\tsrcX\tCDS\t120\t150\t.\t+\t2\tParent=tx1").unwrap();
        feed(&mut b, "seq1\tsrcX\tCDS\t200\t250\t.\t+\t0\tParent=tx1").unwrap();
        let ctx = b.finish(shape(None), &mut ParserStats::default()).unwrap();
        let f = only_feature(&ctx);
        assert_eq!(&*f.original_id().as_str(), "ABC1");
        assert_eq!(&*f.unique_id().as_str(), "ABC1_100.300");
        assert!(f.has_score());
        let tr = f.transcript().unwrap();
        assert_eq!(tr.exons.len(), 2);
        assert_eq!(tr.cds, Some(Span::new(120, 250)));
        assert_eq!(tr.start_phase, Phase::Two);
    }

    #[test]
    fn test_unnamed_exon_is_standalone() {
        let mut b = TreeBuilder::default();
        feed(&mut b, "seq1\tsrcX\texon\t10\t20\t.\t+\t.\tNote=x").unwrap();
        feed(&mut b, "seq1\tsrcX\texon\t30\t40\t.\t+\t.\tNote=y").unwrap();
        let ctx = b.finish(shape(None), &mut ParserStats::default()).unwrap();
        assert_eq!(ctx.feature_count(), 2);
    }

    #[test]
    fn test_duplicates_counted() {
        let mut b = TreeBuilder::default();
        feed(&mut b, "seq1\tsrcX\tgene\t10\t20\t.\t+\t.\tName=g").unwrap();
        feed(&mut b, "seq1\tsrcX\tgene\t10\t20\t.\t+\t.\tName=g").unwrap();
        let mut stats = ParserStats::default();
        let ctx = b.finish(shape(None), &mut stats).unwrap();
        assert_eq!(ctx.feature_count(), 1);
        assert_eq!(stats.duplicates, 1);
    }

    #[test]
    fn test_match_lines_accumulate() {
        let mut b = TreeBuilder::default();
        feed(&mut b, "seq1\test\tcDNA_match\t100\t150\t.\t+\t.\tID=m1;Target=EST9 1 51 +").unwrap();
        feed(&mut b, "seq1\test\tcDNA_match\t300\t340\t.\t+\t.\tID=m1;Target=EST9 52 92 +").unwrap();
        let ctx = b.finish(shape(None), &mut ParserStats::default()).unwrap();
        let f = only_feature(&ctx);
        let h = f.homology().unwrap();
        assert_eq!(h.gaps.len(), 2);
        assert_eq!(h.query, Some(Span::new(1, 92)));
        assert_eq!(f.span(), Span::new(100, 340));
        assert_eq!(&*f.unique_id().as_str(), "m1_100.340_1.92");
    }

    #[test]
    fn test_single_match_is_ungapped() {
        let mut b = TreeBuilder::default();
        feed(&mut b, "seq1\test\tcDNA_match\t100\t150\t.\t+\t.\tID=m2;Target=EST9 1 51 +").unwrap();
        let ctx = b.finish(shape(None), &mut ParserStats::default()).unwrap();
        assert!(only_feature(&ctx).homology().unwrap().gaps.is_empty());
    }

    #[test]
    fn test_clip_policies() {
        let lines = [
            "seq1\tsrcX\texon\t10\t20\t.\t+\t.\tID=tx",
            "seq1\tsrcX\texon\t30\t40\t.\t+\t.\tID=tx",
            "seq1\tsrcX\tgene\t500\t600\t.\t+\t.\tName=far",
        ];
        let run = |policy| {
            let mut b = TreeBuilder::default();
            for l in lines {
                feed(&mut b, l).unwrap();
            }
            let mut stats = ParserStats::default();
            let ctx = b
                .finish(
                    shape(Some(Clip {
                        window: Span::new(15, 100),
                        policy,
                    })),
                    &mut stats,
                )
                .unwrap();
            (ctx, stats)
        };

        let (ctx, stats) = run(ClipPolicy::Exclude);
        assert_eq!(ctx.feature_count(), 0);
        assert_eq!(stats.clipped, 2);

        let (ctx, _) = run(ClipPolicy::Overlap);
        assert_eq!(only_feature(&ctx).span(), Span::new(10, 40));

        let (ctx, stats) = run(ClipPolicy::Trim);
        let f = only_feature(&ctx);
        assert_eq!(f.span(), Span::new(15, 40));
        let tr = f.transcript().unwrap();
        assert_eq!(tr.exons, vec![Span::new(15, 20), Span::new(30, 40)]);
        assert!(tr.start_not_found);
        assert_eq!(stats.trimmed, 1);
        assert_eq!(&*f.unique_id().as_str(), "tx_15.40");
    }

    #[test]
    fn test_trim_alignment_moves_query() {
        let mut h = HomologyData {
            query: Some(Span::new(1, 100)),
            query_strand: Strand::Forward,
            ..Default::default()
        };
        let target = trim_alignment(
            &mut h,
            Span::new(1001, 1100),
            Span::new(1011, 1090),
            Strand::Forward,
        );
        assert_eq!(target, Some(Span::new(1011, 1090)));
        assert_eq!(h.query, Some(Span::new(11, 90)));
    }

    #[test]
    fn test_trim_protein_alignment_by_codons() {
        let mut h = HomologyData {
            homol_type: HomolType::Protein,
            query: Some(Span::new(1, 10)),
            query_strand: Strand::Forward,
            ..Default::default()
        };
        let target = trim_alignment(
            &mut h,
            Span::new(1001, 1030),
            Span::new(1004, 1024),
            Strand::Forward,
        );
        assert_eq!(target, Some(Span::new(1004, 1024)));
        assert_eq!(h.query, Some(Span::new(2, 8)));
    }
}
