//! Mapping of the GFF type column onto feature types.
//!
//! Sequence Ontology terms are always accepted. Unless the parser runs in
//! SO-only mode a table of older ad-hoc terms is accepted as well; some of
//! its mappings are debatable (`Pseudogene` becomes a transcript, `Clone`
//! a basic feature) but downstream consumers rely on them, so they are kept
//! as they are.
use hashbrown::HashMap;
use once_cell::sync::Lazy;

use crate::data_structs::{
    BoundaryType,
    FeatureType,
    HomolType,
};

/// Role a line plays in the logical feature it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Part {
    /// A complete feature on its own line.
    Whole,
    /// Summary line of a transcript.
    Transcript,
    Exon,
    Intron,
    Cds,
    Utr,
    /// One block of a gapped alignment (GFF3 `match_part`).
    MatchPart,
}

impl Part {
    /// Parts that may be spread over several lines sharing a name.
    pub fn is_compound(&self) -> bool {
        matches!(
            self,
            Part::Transcript | Part::Exon | Part::Intron | Part::Cds | Part::Utr
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeClass {
    pub kind:     FeatureType,
    pub part:     Part,
    pub boundary: Option<BoundaryType>,
    /// Only meaningful for alignments.
    pub homol:    HomolType,
}

impl TypeClass {
    const fn new(
        kind: FeatureType,
        part: Part,
    ) -> Self {
        Self {
            kind,
            part,
            boundary: None,
            homol: HomolType::Nucleotide,
        }
    }

    const fn whole(kind: FeatureType) -> Self { Self::new(kind, Part::Whole) }

    const fn transcript(part: Part) -> Self { Self::new(FeatureType::Transcript, part) }

    const fn boundary(boundary: BoundaryType) -> Self {
        Self {
            kind:     FeatureType::Basic,
            part:     Part::Whole,
            boundary: Some(boundary),
            homol:    HomolType::Nucleotide,
        }
    }

    const fn homology(homol: HomolType) -> Self {
        Self {
            kind: FeatureType::Alignment,
            part: Part::Whole,
            boundary: None,
            homol,
        }
    }

    /// Applies a style's mode. Transcript parts survive a transcript mode;
    /// any other forced type turns the line into a whole feature.
    pub fn with_mode(
        self,
        mode: FeatureType,
    ) -> Self {
        if mode == self.kind || (mode == FeatureType::Transcript && self.part.is_compound()) {
            return self;
        }
        match mode {
            FeatureType::Alignment => Self::homology(self.homol),
            FeatureType::Transcript => Self::transcript(Part::Transcript),
            other => Self::whole(other),
        }
    }
}

static SO_TERMS: Lazy<HashMap<&'static str, TypeClass>> = Lazy::new(|| {
    use BoundaryType::*;
    use FeatureType::*;

    let mut terms = HashMap::new();
    for term in [
        "gene",
        "region",
        "biological_region",
        "chromosome",
        "contig",
        "supercontig",
        "repeat_region",
        "tandem_repeat",
        "inverted_repeat",
        "dispersed_repeat",
        "transposable_element",
        "TF_binding_site",
        "promoter",
        "enhancer",
        "polyA_site",
        "polyA_signal_sequence",
        "TSS",
        "SNP",
        "SNV",
        "sequence_variant",
        "insertion",
        "deletion",
        "CpG_island",
        "operon",
        "pseudogene",
    ] {
        terms.insert(term, TypeClass::whole(Basic));
    }
    for term in [
        "transcript",
        "mRNA",
        "ncRNA",
        "tRNA",
        "rRNA",
        "snRNA",
        "snoRNA",
        "miRNA",
        "lnc_RNA",
        "primary_transcript",
        "processed_transcript",
        "pseudogenic_transcript",
    ] {
        terms.insert(term, TypeClass::transcript(Part::Transcript));
    }
    for term in ["exon", "coding_exon", "noncoding_exon", "pseudogenic_exon"] {
        terms.insert(term, TypeClass::transcript(Part::Exon));
    }
    terms.insert("intron", TypeClass::transcript(Part::Intron));
    terms.insert("CDS", TypeClass::transcript(Part::Cds));
    for term in ["UTR", "five_prime_UTR", "three_prime_UTR"] {
        terms.insert(term, TypeClass::transcript(Part::Utr));
    }
    for term in [
        "match",
        "nucleotide_match",
        "expressed_sequence_match",
        "EST_match",
        "cDNA_match",
        "nucleotide_to_protein_match",
    ] {
        terms.insert(term, TypeClass::homology(HomolType::Nucleotide));
    }
    terms.insert("protein_match", TypeClass::homology(HomolType::Protein));
    terms.insert(
        "translated_nucleotide_match",
        TypeClass::homology(HomolType::Translated),
    );
    terms.insert("match_part", TypeClass {
        part: Part::MatchPart,
        ..TypeClass::homology(HomolType::Nucleotide)
    });
    terms.insert(
        "five_prime_cis_splice_site",
        TypeClass::boundary(FivePrimeSplice),
    );
    terms.insert(
        "three_prime_cis_splice_site",
        TypeClass::boundary(ThreePrimeSplice),
    );
    terms.insert("polypeptide", TypeClass::whole(PeptideSequence));
    terms.insert("assembly", TypeClass::whole(RawSequence));
    terms
});

static LEGACY_TERMS: Lazy<HashMap<&'static str, TypeClass>> = Lazy::new(|| {
    use BoundaryType::*;
    use FeatureType::*;

    HashMap::from([
        ("Clone", TypeClass::whole(Basic)),
        ("Clone_left_end", TypeClass::boundary(CloneEnd)),
        ("Clone_right_end", TypeClass::boundary(CloneEnd)),
        ("Pseudogene", TypeClass::transcript(Part::Transcript)),
        ("Sequence", TypeClass::transcript(Part::Transcript)),
        ("Transcript", TypeClass::transcript(Part::Transcript)),
        ("Coding_transcript", TypeClass::transcript(Part::Transcript)),
        ("similarity", TypeClass::homology(HomolType::Nucleotide)),
        ("BLASTX", TypeClass::homology(HomolType::Translated)),
        ("BLASTP", TypeClass::homology(HomolType::Protein)),
        ("splice5", TypeClass::boundary(FivePrimeSplice)),
        ("splice3", TypeClass::boundary(ThreePrimeSplice)),
        ("repeat", TypeClass::whole(Basic)),
        ("misc_feature", TypeClass::whole(Basic)),
        ("TSL_site", TypeClass::whole(Basic)),
        ("DNA", TypeClass::whole(RawSequence)),
        ("Peptide", TypeClass::whole(PeptideSequence)),
    ])
});

/// Type-column classifier configured once per parser.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    so_only:          bool,
    default_to_basic: bool,
}

impl Classifier {
    pub fn new(
        so_only: bool,
        default_to_basic: bool,
    ) -> Self {
        Self {
            so_only,
            default_to_basic,
        }
    }

    /// Classifies `term`; `None` means the line must be rejected.
    pub fn classify(
        &self,
        term: &str,
    ) -> Option<TypeClass> {
        SO_TERMS
            .get(term)
            .or_else(|| {
                if self.so_only {
                    None
                }
                else {
                    LEGACY_TERMS.get(term)
                }
            })
            .copied()
            .or_else(|| {
                self.default_to_basic
                    .then(|| TypeClass::whole(FeatureType::Basic))
            })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::so_term_strict("exon", true, false, Some(Part::Exon))]
    #[case::legacy_strict("Clone", true, false, None)]
    #[case::legacy_lenient("Clone", false, false, Some(Part::Whole))]
    #[case::unknown_strict("my_thing", false, false, None)]
    #[case::unknown_default("my_thing", true, true, Some(Part::Whole))]
    fn test_classify(
        #[case] term: &str,
        #[case] so_only: bool,
        #[case] default_to_basic: bool,
        #[case] part: Option<Part>,
    ) {
        let class = Classifier::new(so_only, default_to_basic).classify(term);
        assert_eq!(class.map(|c| c.part), part);
    }

    #[test]
    fn test_legacy_mappings() {
        let c = Classifier::new(false, false);
        assert_eq!(c.classify("Clone").unwrap().kind, FeatureType::Basic);
        assert_eq!(c.classify("Pseudogene").unwrap().kind, FeatureType::Transcript);
        assert_eq!(c.classify("similarity").unwrap().kind, FeatureType::Alignment);
        assert_eq!(
            c.classify("Clone_left_end").unwrap().boundary,
            Some(BoundaryType::CloneEnd)
        );
        assert_eq!(c.classify("protein_match").unwrap().homol, HomolType::Protein);
    }

    #[test]
    fn test_style_mode_override() {
        let exon = Classifier::new(false, false).classify("exon").unwrap();
        assert_eq!(exon.with_mode(FeatureType::Transcript), exon);
        let basic = exon.with_mode(FeatureType::Basic);
        assert_eq!(basic.kind, FeatureType::Basic);
        assert_eq!(basic.part, Part::Whole);
        let gene = Classifier::new(false, false).classify("gene").unwrap();
        assert_eq!(gene.with_mode(FeatureType::Transcript).part, Part::Transcript);
    }
}
