//! Version-specific parts of the GFF grammar.
//!
//! Everything that differs between GFF2 and GFF3 (attribute syntax, how a
//! line names its feature, the `Target` and gap syntax, section
//! directives) sits behind [`Dialect`]. The line loop, classification,
//! multi-line reconstruction and normalisation are shared.
use std::fmt::Debug;

use crate::data_structs::typedef::Coord;
use crate::data_structs::{
    AlignBlock,
    HomolType,
    Strand,
};
use crate::io::gff::classify::TypeClass;
use crate::io::gff::error::GffError;
use crate::io::gff::fields::GffRecord;
use crate::io::gff::GffVersion;

/// The matched sequence named by a `Target` attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// Class prefix of `class:name` targets, e.g. `Protein`.
    pub class:  Option<String>,
    pub name:   String,
    pub start:  Coord,
    pub end:    Coord,
    pub strand: Strand,
}

impl Target {
    /// Homology type implied by the target class, if any.
    pub fn homol_type(&self) -> Option<HomolType> {
        match self.class.as_deref()?.to_ascii_lowercase().as_str() {
            "protein" => Some(HomolType::Protein),
            "sequence" | "dna" | "est" | "motif" => Some(HomolType::Nucleotide),
            _ => None,
        }
    }
}

/// What a dialect read from a line's attribute column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineAttributes {
    /// Keys grouping this line with the other lines of the same logical
    /// feature. Empty for lines that carry no explicit name.
    pub keys:            Vec<String>,
    /// Display name, when the line states one.
    pub name:            Option<String>,
    pub target:          Option<Target>,
    pub gaps:            Vec<AlignBlock>,
    pub description:     Option<String>,
    pub url:             Option<String>,
    pub locus:           Option<String>,
    pub start_not_found: bool,
    pub end_not_found:   bool,
    pub query_length:    Option<Coord>,
}

/// Dialect-specific directives.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionDirective {
    /// GFF2 `##DNA name`.
    DnaStart(String),
    /// GFF2 `##end-DNA`.
    DnaEnd,
    /// GFF3 `##FASTA`.
    Fasta,
    /// GFF3 `###`: no later line refers back to an earlier one.
    ResolveForward,
    NotSection,
}

pub trait Dialect: Debug + Send + Sync {
    fn version(&self) -> GffVersion;

    /// Whether a sequence region must be declared before the first record.
    fn requires_region(&self) -> bool;

    fn interpret(
        &self,
        record: &GffRecord,
        class: &TypeClass,
        line: usize,
    ) -> Result<LineAttributes, GffError>;

    fn section(
        &self,
        directive: &str,
        args: &[&str],
    ) -> SectionDirective;
}

pub(crate) fn parse_coord(
    value: &str,
    what: &str,
    line: usize,
) -> Result<Coord, GffError> {
    match value.parse::<Coord>() {
        Ok(pos) if pos > 0 => Ok(pos),
        _ => {
            Err(GffError::BadAttribute {
                line,
                reason: format!("{} '{}' is not a coordinate", what, value),
            })
        },
    }
}
