//! GFF version 3 grammar.
//!
//! Attributes are `key=value` pairs with percent-encoding. Lines of one
//! transcript share an `ID` (summary line) or `Parent` (parts); lines of
//! one gapped alignment share an `ID`. `Target=name start end [strand]`
//! names the matched sequence and `Gap` holds a CIGAR-style edit string
//! (`M8 D3 M6 I1 M6`).
use crate::data_structs::typedef::Coord;
use crate::data_structs::{
    AlignBlock,
    FeatureType,
    Span,
    Strand,
};
use crate::io::gff::attributes::Attributes;
use crate::io::gff::classify::{
    Part,
    TypeClass,
};
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

#[derive(Debug, Clone, Copy, Default)]
pub struct Gff3Dialect;

impl Gff3Dialect {
    fn target(
        attrs: &Attributes,
        line: usize,
    ) -> Result<Option<Target>, GffError> {
        let Some(value) = attrs.get("Target")
        else {
            return Ok(None);
        };
        let parts = value.split_whitespace().collect::<Vec<_>>();
        let (name, start, end, strand) = match parts.as_slice() {
            [name, start, end] => (*name, *start, *end, None),
            [name, start, end, strand] => (*name, *start, *end, Some(*strand)),
            _ => {
                return Err(GffError::BadAttribute {
                    line,
                    reason: format!("Target '{}' is not 'name start end [strand]'", value),
                })
            },
        };
        let strand = match strand {
            Some(s) => s.parse::<Strand>().map_err(|_| {
                GffError::BadAttribute {
                    line,
                    reason: format!("Target strand '{}'", s),
                }
            })?,
            None => Strand::None,
        };
        Ok(Some(Target {
            class: None,
            name: name.to_string(),
            start: parse_coord(start, "Target start", line)?,
            end: parse_coord(end, "Target end", line)?,
            strand,
        }))
    }
}

/// Expands a `Gap` edit string into gapless blocks.
///
/// The reference is walked upwards from `reference.x1`; the matched
/// sequence upwards from `query.x1`, or downwards from `query.x2` when the
/// two run in opposite directions. Each residue of the matched sequence
/// spans `width` reference bases.
pub fn cigar_blocks(
    cigar: &str,
    reference: Span,
    query: Span,
    reverse: bool,
    width: Coord,
    line: usize,
) -> Result<Vec<AlignBlock>, GffError> {
    let mut blocks = Vec::new();
    // Walked in u64 so that long operations cannot wrap.
    let mut r = u64::from(reference.x1);
    let mut consumed: u64 = 0;
    let width = u64::from(width);

    for op in cigar.split_whitespace() {
        let bad = |reason: &str| {
            GffError::BadAttribute {
                line,
                reason: format!("Gap operation '{}' {}", op, reason),
            }
        };
        let coord = |value: u64| {
            Coord::try_from(value).map_err(|_| bad("runs past the coordinate range"))
        };
        let code = op.chars().next().ok_or_else(|| bad("is empty"))?;
        let len = op[code.len_utf8()..]
            .parse::<u64>()
            .map_err(|_| bad("has no valid length"))?;
        if len == 0 {
            return Err(bad("has zero length"));
        }
        match code {
            'M' => {
                let q = if reverse {
                    let x2 = u64::from(query.x2);
                    Span::new(
                        coord(x2.saturating_sub(consumed + len - 1))?,
                        coord(x2.saturating_sub(consumed))?,
                    )
                }
                else {
                    let x1 = u64::from(query.x1) + consumed;
                    Span::new(coord(x1)?, coord(x1 + len - 1)?)
                };
                blocks.push(AlignBlock {
                    query:  q,
                    target: Span::new(coord(r)?, coord(r + len * width - 1)?),
                });
                r += len * width;
                consumed += len;
            },
            'I' => consumed += len,
            'D' => r += len * width,
            'F' => r += len,
            'R' => r = r.saturating_sub(len),
            _ => return Err(bad("is unknown")),
        }
    }
    Ok(blocks)
}

impl Dialect for Gff3Dialect {
    fn version(&self) -> GffVersion { GffVersion::Gff3 }

    fn requires_region(&self) -> bool { false }

    fn interpret(
        &self,
        record: &GffRecord,
        class: &TypeClass,
        line: usize,
    ) -> Result<LineAttributes, GffError> {
        let attrs = match record.attributes.as_deref() {
            Some(text) => Attributes::parse_gff3(text, line)?,
            None => Attributes::default(),
        };

        let target = Self::target(&attrs, line)?;
        if class.kind == FeatureType::Alignment && target.is_none() {
            return Err(GffError::BadAttribute {
                line,
                reason: "alignment without a Target".to_string(),
            });
        }

        let id = attrs.get("ID").map(str::to_string);
        let display = attrs.get("Name").map(str::to_string);
        let parents = attrs
            .get_all("Parent")
            .map(|p| p.to_vec())
            .unwrap_or_default();

        let keys = match class.part {
            Part::Exon | Part::Intron | Part::Cds | Part::Utr | Part::MatchPart
                if !parents.is_empty() =>
            {
                parents
            },
            _ => id.clone().or_else(|| display.clone()).into_iter().collect(),
        };
        let name = match class.part {
            Part::Exon | Part::Intron | Part::Cds | Part::Utr => None,
            _ => display
                .or(id)
                .or_else(|| target.as_ref().map(|t| t.name.clone())),
        };

        let gaps = match (attrs.get("Gap"), &target) {
            (Some(cigar), Some(target)) => {
                let reverse = (record.strand == Strand::Reverse)
                    != (target.strand == Strand::Reverse);
                cigar_blocks(
                    cigar,
                    Span::new(record.start, record.end),
                    Span::new(target.start, target.end),
                    reverse,
                    class.homol.residue_width(),
                    line,
                )?
            },
            _ => Vec::new(),
        };
        let query_length = attrs
            .get("Length")
            .map(|v| parse_coord(v, "Length", line))
            .transpose()?;

        Ok(LineAttributes {
            keys,
            name,
            target,
            gaps,
            description: attrs.get("Note").map(str::to_string),
            url: attrs.get("URL").map(str::to_string),
            locus: attrs.get("locus").map(str::to_string),
            start_not_found: attrs.flag("start_not_found"),
            end_not_found: attrs.flag("end_not_found"),
            query_length,
        })
    }

    fn section(
        &self,
        directive: &str,
        _args: &[&str],
    ) -> SectionDirective {
        match directive {
            "FASTA" => SectionDirective::Fasta,
            "#" => SectionDirective::ResolveForward,
            _ => SectionDirective::NotSection,
        }
    }
}
