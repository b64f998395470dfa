use std::fmt::Display;

use serde::Serialize;
use thiserror::Error;

use crate::data_structs::StructureError;

/// Kind of input line an error or a counter refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCategory {
    /// Directives before the first feature record.
    Header,
    /// Feature records.
    Body,
    /// Directives after the first feature record.
    Directive,
    /// GFF2 `##DNA` section lines.
    Sequence,
    /// GFF3 `##FASTA` section lines.
    Fasta,
}

impl LineCategory {
    pub const ALL: [LineCategory; 5] = [
        LineCategory::Header,
        LineCategory::Body,
        LineCategory::Directive,
        LineCategory::Sequence,
        LineCategory::Fasta,
    ];
}

impl Display for LineCategory {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", match self {
            LineCategory::Header => "header",
            LineCategory::Body => "body",
            LineCategory::Directive => "directive",
            LineCategory::Sequence => "sequence",
            LineCategory::Fasta => "fasta",
        })
    }
}

/// Errors raised while parsing GFF. Every input error carries the 1-based
/// line number it was raised on.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GffError {
    #[error("line {line}: expected 8 mandatory fields, found {found}")]
    FieldCount { line: usize, found: usize },

    #[error("line {line}: invalid {field} '{value}'")]
    BadField {
        line:  usize,
        field: &'static str,
        value: String,
    },

    #[error("line {line}: unrecognised feature type '{term}'")]
    UnknownType { line: usize, term: String },

    #[error("line {line}: malformed attributes: {reason}")]
    BadAttribute { line: usize, reason: String },

    #[error("line {line}: malformed directive '{text}'")]
    BadDirective { line: usize, text: String },

    #[error("line {line}: feature record before the required header ({missing})")]
    HeaderIncomplete { line: usize, missing: String },

    #[error("line {line}: unsupported GFF version '{version}'")]
    UnsupportedVersion { line: usize, version: String },

    #[error("line {line}: stream declares GFF version {found}, parser expects {expected}")]
    VersionMismatch {
        line:     usize,
        expected: u8,
        found:    u8,
    },

    #[error("line {line}: bad sequence data: {reason}")]
    BadSequence { line: usize, reason: String },

    #[error("line {line}: feature '{name}' rejected: {reason}")]
    Rejected {
        line:   usize,
        name:   String,
        reason: String,
    },

    #[error("parse cancelled after line {line}")]
    Cancelled { line: usize },

    #[error("parser is in a terminal state")]
    Finished,

    #[error("read failed after line {line}: {message}")]
    Io { line: usize, message: String },

    #[error(transparent)]
    Structure(#[from] StructureError),
}

impl GffError {
    pub fn line(&self) -> Option<usize> {
        match self {
            GffError::FieldCount { line, .. }
            | GffError::BadField { line, .. }
            | GffError::UnknownType { line, .. }
            | GffError::BadAttribute { line, .. }
            | GffError::BadDirective { line, .. }
            | GffError::HeaderIncomplete { line, .. }
            | GffError::UnsupportedVersion { line, .. }
            | GffError::VersionMismatch { line, .. }
            | GffError::BadSequence { line, .. }
            | GffError::Rejected { line, .. }
            | GffError::Cancelled { line }
            | GffError::Io { line, .. } => Some(*line),
            GffError::Finished | GffError::Structure(_) => None,
        }
    }

    /// Errors that end the parse whatever `stop_on_error` says: without a
    /// usable header no later coordinate can be interpreted.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GffError::HeaderIncomplete { .. }
                | GffError::UnsupportedVersion { .. }
                | GffError::VersionMismatch { .. }
                | GffError::Cancelled { .. }
                | GffError::Io { .. }
                | GffError::Structure(_)
        )
    }
}
