//! Leaf records of the feature hierarchy and the construction API that is
//! the only sanctioned way to populate them.
//!
//! A feature is allocated with [`Feature::create_empty`], which yields a
//! record of type [`FeatureType::Invalid`]. The parser then fills in the
//! common fields with [`Feature::add_standard_data`] and the type-specific
//! payload with [`Feature::add_transcript_data`],
//! [`Feature::add_transcript_exon`], [`Feature::add_transcript_intron`] or
//! [`Feature::add_alignment_data`]. Every `add_*` call returns `false` on a
//! caller logic error (type mismatch); malformed input never reaches this
//! layer.
use log::debug;

use crate::data_structs::coords::Span;
use crate::data_structs::enums::{
    BoundaryType,
    FeatureType,
    HomolType,
    Phase,
    Strand,
};
use crate::data_structs::node::AnyHeader;
use crate::data_structs::typedef::{
    Coord,
    ScoreType,
};
use crate::quark::Quark;

/// One gapless block of a gapped alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignBlock {
    /// Span on the matched (query) sequence.
    pub query:  Span,
    /// Span on the reference sequence.
    pub target: Span,
}

/// Payload of an alignment (homology) feature.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HomologyData {
    /// Target type: nucleotide, protein or translated nucleotide.
    pub homol_type:   HomolType,
    /// Name of the matched sequence, e.g. `Sequence:AB000123`.
    pub query_name:   Quark,
    /// Aligned part of the matched sequence.
    pub query:        Option<Span>,
    pub query_length: Option<Coord>,
    /// Strand of the matched sequence.
    pub query_strand: Strand,
    pub query_phase:  Phase,
    /// Gapless blocks ordered by reference position. Empty means the
    /// alignment is a single ungapped block.
    pub gaps:         Vec<AlignBlock>,
}

impl HomologyData {
    pub fn is_gapped(&self) -> bool { self.gaps.len() > 1 }
}

/// Payload of a transcript feature.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TranscriptData {
    pub cds:             Option<Span>,
    pub start_phase:     Phase,
    pub start_not_found: bool,
    pub end_not_found:   bool,
    pub exons:           Vec<Span>,
    pub introns:         Vec<Span>,
}

impl TranscriptData {
    pub fn cds_present(&self) -> bool { self.cds.is_some() }

    /// Sorts and deduplicates the exons and rebuilds the introns as the
    /// gaps between them. Exons that touch or overlap are kept as given.
    /// Returns the span covered by the exons, or `None` when there are none.
    pub fn normalise(&mut self) -> Option<Span> {
        if self.exons.is_empty() {
            self.introns.clear();
            return None;
        }

        self.exons.sort();
        self.exons.dedup();

        self.introns.clear();
        let mut end = self.exons[0].x2;
        for exon in &self.exons[1..] {
            if exon.x1 > end.saturating_add(1) {
                self.introns.push(Span::new(end + 1, exon.x1 - 1));
            }
            end = end.max(exon.x2);
        }

        let span = Span::new(self.exons[0].x1, end);
        if let Some(cds) = self.cds {
            self.cds = cds.intersect(&span);
        }
        Some(span)
    }
}

/// Type-specific payload of a feature.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FeatureDetail {
    #[default]
    None,
    Homology(HomologyData),
    Transcript(TranscriptData),
}

/// Common fields accepted by [`Feature::add_standard_data`].
#[derive(Debug, Clone, PartialEq)]
pub struct StandardData {
    pub unique_id:   Quark,
    pub original_id: Quark,
    /// Detailed type tag, ideally a Sequence Ontology term.
    pub ontology:    Quark,
    pub kind:        FeatureType,
    pub start:       Coord,
    pub end:         Coord,
    pub score:       Option<ScoreType>,
    pub strand:      Strand,
    pub phase:       Phase,
}

/// A single annotation record.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub(crate) header: AnyHeader,
    kind:              FeatureType,
    span:              Span,
    strand:            Strand,
    phase:             Phase,
    score:             Option<ScoreType>,
    ontology:          Quark,
    boundary:          Option<BoundaryType>,
    locus_id:          Quark,
    url:               Option<String>,
    description:       Option<String>,
    detail:            FeatureDetail,
}

impl Default for Feature {
    fn default() -> Self { Self::create_empty() }
}

impl Feature {
    /// Builds the canonical name from which a feature's unique id is
    /// derived.
    ///
    /// When `strand` is reverse and `start > end` the coordinates (and the
    /// query coordinates) are swapped before they are embedded. Alignment
    /// names embed the query coordinates so that matches of different
    /// targets over the same reference span stay distinct.
    pub fn create_feature_name(
        kind: FeatureType,
        name: &str,
        strand: Strand,
        start: Coord,
        end: Coord,
        query_start: Coord,
        query_end: Coord,
    ) -> String {
        let (start, end, query_start, query_end) =
            if strand == Strand::Reverse && start > end {
                (end, start, query_end, query_start)
            }
            else {
                (start, end, query_start, query_end)
            };

        match kind {
            FeatureType::Alignment => {
                format!(
                    "{}_{}.{}_{}.{}",
                    name, start, end, query_start, query_end
                )
            },
            _ => format!("{}_{}.{}", name, start, end),
        }
    }

    /// Interned [`Feature::create_feature_name`].
    pub fn create_id(
        kind: FeatureType,
        name: &str,
        strand: Strand,
        start: Coord,
        end: Coord,
        query_start: Coord,
        query_end: Coord,
    ) -> Quark {
        Quark::intern(&Self::create_feature_name(
            kind,
            name,
            strand,
            start,
            end,
            query_start,
            query_end,
        ))
    }

    /// An unpopulated feature of type [`FeatureType::Invalid`].
    pub fn create_empty() -> Feature {
        Feature {
            header:      AnyHeader::default(),
            kind:        FeatureType::Invalid,
            span:        Span { x1: 0, x2: 0 },
            strand:      Strand::None,
            phase:       Phase::None,
            score:       None,
            ontology:    Quark::NULL,
            boundary:    None,
            locus_id:    Quark::NULL,
            url:         None,
            description: None,
            detail:      FeatureDetail::None,
        }
    }

    /// Populates the common fields.
    ///
    /// Fails when the feature already carries a type that cannot become
    /// `data.kind` (only a basic feature may be promoted to a transcript),
    /// or when `data.unique_id` is null.
    pub fn add_standard_data(
        &mut self,
        data: StandardData,
    ) -> bool {
        if data.unique_id.is_null() || !data.kind.is_valid() {
            return false;
        }
        if self.kind.is_valid() && !Self::type_compatible(self.kind, data.kind)
        {
            debug!(
                "Refusing to change feature {} from {} to {}",
                self.header.unique_id, self.kind, data.kind
            );
            return false;
        }

        self.header.unique_id = data.unique_id;
        self.header.original_id = data.original_id;
        self.ontology = data.ontology;
        self.span = Span::new(data.start, data.end);
        self.score = data.score;
        self.strand = data.strand;
        self.phase = data.phase;

        if self.kind != data.kind {
            self.kind = data.kind;
            self.detail = match data.kind {
                FeatureType::Transcript => {
                    FeatureDetail::Transcript(TranscriptData::default())
                },
                FeatureType::Alignment => {
                    FeatureDetail::Homology(HomologyData::default())
                },
                _ => FeatureDetail::None,
            };
        }
        true
    }

    fn type_compatible(
        old: FeatureType,
        new: FeatureType,
    ) -> bool {
        old == new || (old == FeatureType::Basic && new == FeatureType::Transcript)
    }

    /// Sets the transcript-level fields. Exons and introns are appended
    /// separately.
    pub fn add_transcript_data(
        &mut self,
        cds: Option<Span>,
        start_phase: Phase,
        start_not_found: bool,
        end_not_found: bool,
    ) -> bool {
        match &mut self.detail {
            FeatureDetail::Transcript(tr) => {
                if cds.is_some() {
                    tr.cds = cds;
                    tr.start_phase = start_phase;
                }
                tr.start_not_found |= start_not_found;
                tr.end_not_found |= end_not_found;
                true
            },
            _ => false,
        }
    }

    pub fn add_transcript_exon(
        &mut self,
        exon: Span,
    ) -> bool {
        match &mut self.detail {
            FeatureDetail::Transcript(tr) => {
                tr.exons.push(exon);
                true
            },
            _ => false,
        }
    }

    pub fn add_transcript_intron(
        &mut self,
        intron: Span,
    ) -> bool {
        match &mut self.detail {
            FeatureDetail::Transcript(tr) => {
                tr.introns.push(intron);
                true
            },
            _ => false,
        }
    }

    /// Extends the CDS of a transcript to also cover `cds`. The first CDS
    /// segment seen sets the start phase.
    pub fn add_transcript_cds(
        &mut self,
        cds: Span,
        phase: Phase,
    ) -> bool {
        match &mut self.detail {
            FeatureDetail::Transcript(tr) => {
                tr.cds = Some(match tr.cds {
                    Some(existing) => existing.union(&cds),
                    None => {
                        tr.start_phase = phase;
                        cds
                    },
                });
                true
            },
            _ => false,
        }
    }

    pub fn add_alignment_data(
        &mut self,
        homology: HomologyData,
    ) -> bool {
        match &mut self.detail {
            FeatureDetail::Homology(h) => {
                *h = homology;
                true
            },
            _ => false,
        }
    }

    /// Appends one gapless block to an alignment, widening the query span
    /// to cover it.
    pub fn add_alignment_block(
        &mut self,
        block: AlignBlock,
    ) -> bool {
        match &mut self.detail {
            FeatureDetail::Homology(h) => {
                h.query = Some(match h.query {
                    Some(q) => q.union(&block.query),
                    None => block.query,
                });
                h.gaps.push(block);
                true
            },
            _ => false,
        }
    }

    /// Marks a basic feature as a boundary (clone end or splice site).
    pub fn add_splice(
        &mut self,
        boundary: BoundaryType,
    ) -> bool {
        if self.kind != FeatureType::Basic {
            return false;
        }
        self.boundary = Some(boundary);
        true
    }

    pub fn add_locus(
        &mut self,
        locus_id: Quark,
    ) -> bool {
        if !self.kind.is_valid() {
            return false;
        }
        self.locus_id = locus_id;
        true
    }

    pub fn add_url(
        &mut self,
        url: &str,
    ) -> bool {
        if !self.kind.is_valid() {
            return false;
        }
        self.url = Some(url.to_string());
        true
    }

    pub fn add_description(
        &mut self,
        text: &str,
    ) -> bool {
        if !self.kind.is_valid() {
            return false;
        }
        self.description = Some(text.to_string());
        true
    }

    /// Widens the feature span to also cover `span`.
    pub(crate) fn extend_span(
        &mut self,
        span: Span,
    ) {
        self.span = self.span.union(&span);
    }

    pub(crate) fn set_span(
        &mut self,
        span: Span,
    ) {
        self.span = span;
    }

    pub(crate) fn set_unique_id(
        &mut self,
        id: Quark,
    ) {
        self.header.unique_id = id;
    }

    pub(crate) fn detail_mut(&mut self) -> &mut FeatureDetail {
        &mut self.detail
    }

    /// Normalises a transcript: exons are sorted and deduplicated, introns are
    /// rebuilt from the exons and the span is set to the exon extent.
    /// Returns `false` for a transcript without exons, which callers drop.
    /// Non-transcripts are left untouched and return `true`.
    pub fn transcript_normalise(&mut self) -> bool {
        match &mut self.detail {
            FeatureDetail::Transcript(tr) => match tr.normalise() {
                Some(span) => {
                    self.span = span;
                    true
                },
                None => false,
            },
            _ => true,
        }
    }

    pub fn unique_id(&self) -> Quark { self.header.unique_id }

    pub fn original_id(&self) -> Quark { self.header.original_id }

    pub fn kind(&self) -> FeatureType { self.kind }

    pub fn span(&self) -> Span { self.span }

    pub fn x1(&self) -> Coord { self.span.x1 }

    pub fn x2(&self) -> Coord { self.span.x2 }

    pub fn strand(&self) -> Strand { self.strand }

    pub fn phase(&self) -> Phase { self.phase }

    pub fn has_score(&self) -> bool { self.score.is_some() }

    /// Numeric score, `0.0` when the feature has none.
    pub fn score(&self) -> ScoreType { self.score.unwrap_or(0.0) }

    pub fn ontology(&self) -> Quark { self.ontology }

    pub fn boundary(&self) -> Option<BoundaryType> { self.boundary }

    pub fn locus_id(&self) -> Quark { self.locus_id }

    pub fn url(&self) -> Option<&str> { self.url.as_deref() }

    pub fn description(&self) -> Option<&str> { self.description.as_deref() }

    pub fn detail(&self) -> &FeatureDetail { &self.detail }

    pub fn transcript(&self) -> Option<&TranscriptData> {
        match &self.detail {
            FeatureDetail::Transcript(tr) => Some(tr),
            _ => None,
        }
    }

    pub fn homology(&self) -> Option<&HomologyData> {
        match &self.detail {
            FeatureDetail::Homology(h) => Some(h),
            _ => None,
        }
    }
}
