use serde::Serialize;

use crate::io::gff::error::{
    GffError,
    LineCategory,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LineCounts {
    pub processed: usize,
    pub errors:    usize,
}

/// Diagnostics gathered over one parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParserStats {
    pub header:              LineCounts,
    pub body:                LineCounts,
    pub directive:           LineCounts,
    pub sequence:            LineCounts,
    pub fasta:               LineCounts,
    /// The first error messages, up to the configured cap.
    pub messages:            Vec<String>,
    /// Features placed in the output tree.
    pub features:            usize,
    /// Transcripts dropped for having no exons.
    pub dropped_transcripts: usize,
    /// Features skipped because their set already held the same id.
    pub duplicates:          usize,
    /// Records for a sequence other than the one being parsed.
    pub foreign_lines:       usize,
    /// Records of feature sets the caller did not ask for.
    pub unwanted_lines:      usize,
    /// Records of feature sets without a style.
    pub unstyled_lines:      usize,
    /// Features removed by the clip window.
    pub clipped:             usize,
    /// Features shortened by the clip window.
    pub trimmed:             usize,
    /// DNA records for other sequences.
    pub skipped_sequences:   usize,
}

impl ParserStats {
    pub fn category(
        &self,
        category: LineCategory,
    ) -> &LineCounts {
        match category {
            LineCategory::Header => &self.header,
            LineCategory::Body => &self.body,
            LineCategory::Directive => &self.directive,
            LineCategory::Sequence => &self.sequence,
            LineCategory::Fasta => &self.fasta,
        }
    }

    fn category_mut(
        &mut self,
        category: LineCategory,
    ) -> &mut LineCounts {
        match category {
            LineCategory::Header => &mut self.header,
            LineCategory::Body => &mut self.body,
            LineCategory::Directive => &mut self.directive,
            LineCategory::Sequence => &mut self.sequence,
            LineCategory::Fasta => &mut self.fasta,
        }
    }

    pub(crate) fn count_line(
        &mut self,
        category: LineCategory,
    ) {
        self.category_mut(category).processed += 1;
    }

    pub(crate) fn count_error(
        &mut self,
        category: LineCategory,
        error: &GffError,
        max_messages: usize,
    ) {
        self.category_mut(category).errors += 1;
        if self.messages.len() < max_messages {
            self.messages.push(error.to_string());
        }
    }

    pub fn total_errors(&self) -> usize {
        LineCategory::ALL
            .iter()
            .map(|c| self.category(*c).errors)
            .sum()
    }

    pub fn total_lines(&self) -> usize {
        LineCategory::ALL
            .iter()
            .map(|c| self.category(*c).processed)
            .sum()
    }
}
