//! GFF version 2 grammar.
//!
//! Attributes follow the acedb convention, `Tag value ; Tag "value"`. The
//! feature a line belongs to is named by its `Sequence`, `Transcript`,
//! `Name` or `Locus` tag, and homologies carry
//! `Target "class:name" start end` with optional
//! `Gaps "qstart qend tstart tend, ..."` blocks.
use crate::data_structs::typedef::Coord;
use crate::data_structs::{
    AlignBlock,
    FeatureType,
    Span,
    Strand,
};
use crate::io::gff::attributes::Attributes;
use crate::io::gff::classify::TypeClass;
use crate::io::gff::dialect::{
    parse_coord,
    Dialect,
    LineAttributes,
    SectionDirective,
    Target,
};
use crate::io::gff::error::GffError;
use crate::io::gff::fields::GffRecord;
use crate::io::gff::GffVersion;

const NAME_TAGS: [&str; 4] = ["Sequence", "Transcript", "Name", "Locus"];

#[derive(Debug, Clone, Copy, Default)]
pub struct Gff2Dialect;

impl Gff2Dialect {
    fn target(
        attrs: &Attributes,
        line: usize,
    ) -> Result<Option<Target>, GffError> {
        let Some(values) = attrs.get_all("Target")
        else {
            return Ok(None);
        };
        let [full, start, end, rest @ ..] = values
        else {
            return Err(GffError::BadAttribute {
                line,
                reason: format!(
                    "Target needs a name, a start and an end, got {} values",
                    values.len()
                ),
            });
        };
        if rest.len() > 1 {
            return Err(GffError::BadAttribute {
                line,
                reason: "too many Target values".to_string(),
            });
        }
        let (class, name) = match full.split_once(':') {
            Some((class, name)) if !name.is_empty() => {
                (Some(class.to_string()), name.to_string())
            },
            Some(_) => {
                return Err(GffError::BadAttribute {
                    line,
                    reason: format!("Target '{}' has an empty name", full),
                })
            },
            None => {
                (
                    attrs.get("Class").map(str::to_string),
                    full.to_string(),
                )
            },
        };
        let strand = match rest.first() {
            Some(s) => s.parse::<Strand>().map_err(|_| {
                GffError::BadAttribute {
                    line,
                    reason: format!("Target strand '{}'", s),
                }
            })?,
            None => Strand::None,
        };
        Ok(Some(Target {
            class,
            name,
            start: parse_coord(start, "Target start", line)?,
            end: parse_coord(end, "Target end", line)?,
            strand,
        }))
    }

    fn gaps(
        attrs: &Attributes,
        line: usize,
    ) -> Result<Vec<AlignBlock>, GffError> {
        let text = attrs
            .values_of("Gaps")
            .collect::<Vec<_>>()
            .join(" ");
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        text.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|block| {
                let coords = block
                    .split_whitespace()
                    .map(|v| parse_coord(v, "gap coordinate", line))
                    .collect::<Result<Vec<Coord>, _>>()?;
                match coords.as_slice() {
                    [qs, qe, ts, te] => Ok(AlignBlock {
                        query:  Span::new(*qs, *qe),
                        target: Span::new(*ts, *te),
                    }),
                    _ => Err(GffError::BadAttribute {
                        line,
                        reason: format!("gap block '{}' needs four coordinates", block),
                    }),
                }
            })
            .collect()
    }
}

impl Dialect for Gff2Dialect {
    fn version(&self) -> GffVersion { GffVersion::Gff2 }

    fn requires_region(&self) -> bool { true }

    fn interpret(
        &self,
        record: &GffRecord,
        class: &TypeClass,
        line: usize,
    ) -> Result<LineAttributes, GffError> {
        let attrs = match record.attributes.as_deref() {
            Some(text) => Attributes::parse_gff2(text, line)?,
            None => Attributes::default(),
        };

        let target = Self::target(&attrs, line)?;
        if class.kind == FeatureType::Alignment && target.is_none() {
            return Err(GffError::BadAttribute {
                line,
                reason: "alignment without a Target".to_string(),
            });
        }

        let name = NAME_TAGS
            .iter()
            .find_map(|tag| attrs.get(tag))
            .map(str::to_string);
        let query_length = attrs
            .get("Length")
            .map(|v| parse_coord(v, "Length", line))
            .transpose()?;

        Ok(LineAttributes {
            keys: name.iter().cloned().collect(),
            name: name.or_else(|| target.as_ref().map(|t| t.name.clone())),
            gaps: Self::gaps(&attrs, line)?,
            target,
            description: attrs.get("Note").map(str::to_string),
            url: attrs.get("URL").map(str::to_string),
            locus: attrs.get("Locus").map(str::to_string),
            start_not_found: attrs.flag("Start_not_found"),
            end_not_found: attrs.flag("End_not_found"),
            query_length,
        })
    }

    fn section(
        &self,
        directive: &str,
        args: &[&str],
    ) -> SectionDirective {
        match directive {
            "DNA" => SectionDirective::DnaStart(args.first().copied().unwrap_or_default().to_string()),
            "end-DNA" => SectionDirective::DnaEnd,
            _ => SectionDirective::NotSection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structs::{
        HomolType,
        Phase,
    };
    use crate::io::gff::classify::Classifier;

    fn record(
        term: &str,
        attributes: &str,
    ) -> GffRecord {
        GffRecord {
            seqid:      "chr1".to_string(),
            source:     "src".to_string(),
            term:       term.to_string(),
            start:      100,
            end:        200,
            score:      None,
            strand:     Strand::Forward,
            phase:      Phase::None,
            attributes: Some(attributes.to_string()),
        }
    }

    fn classify(term: &str) -> TypeClass {
        Classifier::new(false, false).classify(term).unwrap()
    }

    #[test]
    fn test_similarity_target_and_gaps() {
        let rec = record(
            "similarity",
            r#"Target "Protein:Q9XYZ1" 1 34 ; Gaps "1 10 100 129, 12 34 140 208""#,
        );
        let attrs = Gff2Dialect.interpret(&rec, &classify("similarity"), 5).unwrap();
        let target = attrs.target.unwrap();
        assert_eq!(target.class.as_deref(), Some("Protein"));
        assert_eq!(target.name, "Q9XYZ1");
        assert_eq!(target.homol_type(), Some(HomolType::Protein));
        assert_eq!((target.start, target.end), (1, 34));
        assert_eq!(attrs.gaps.len(), 2);
        assert_eq!(attrs.gaps[1].target, Span::new(140, 208));
        assert!(attrs.keys.is_empty());
        assert_eq!(attrs.name.as_deref(), Some("Q9XYZ1"));
    }

    #[test]
    fn test_malformed_target_fails_line() {
        let rec = record("similarity", r#"Target "Sequence:AB1" 10"#);
        assert!(matches!(
            Gff2Dialect.interpret(&rec, &classify("similarity"), 8),
            Err(GffError::BadAttribute { line: 8, .. })
        ));
        let rec = record("similarity", r#"Target "Sequence:AB1" ten 20"#);
        assert!(Gff2Dialect.interpret(&rec, &classify("similarity"), 8).is_err());
        let rec = record("similarity", r#"Note "no target""#);
        assert!(Gff2Dialect.interpret(&rec, &classify("similarity"), 8).is_err());
    }

    #[test]
    fn test_transcript_names() {
        let rec = record(
            "exon",
            r#"Sequence "B0250.1" ; Locus "unc-1" ; Note "muscle""#,
        );
        let attrs = Gff2Dialect.interpret(&rec, &classify("exon"), 1).unwrap();
        assert_eq!(attrs.keys, vec!["B0250.1".to_string()]);
        assert_eq!(attrs.locus.as_deref(), Some("unc-1"));
        assert_eq!(attrs.description.as_deref(), Some("muscle"));
    }

    #[test]
    fn test_dna_sections() {
        assert_eq!(
            Gff2Dialect.section("DNA", &["chr1"]),
            SectionDirective::DnaStart("chr1".to_string())
        );
        assert_eq!(Gff2Dialect.section("end-DNA", &[]), SectionDirective::DnaEnd);
        assert_eq!(Gff2Dialect.section("FASTA", &[]), SectionDirective::NotSection);
    }
}
