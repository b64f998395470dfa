//! Splitting of feature records into their mandatory columns.
use crate::data_structs::typedef::{
    Coord,
    ScoreType,
};
use crate::data_structs::{
    Phase,
    Strand,
};
use crate::io::gff::error::GffError;

/// The eight mandatory columns of a feature record plus the raw attribute
/// text.
#[derive(Debug, Clone, PartialEq)]
pub struct GffRecord {
    pub seqid:      String,
    pub source:     String,
    pub term:       String,
    /// As written; reversed coordinates are normalised later.
    pub start:      Coord,
    pub end:        Coord,
    pub score:      Option<ScoreType>,
    pub strand:     Strand,
    pub phase:      Phase,
    pub attributes: Option<String>,
}

/// Cuts `line` at the first `#` that is neither backslash-escaped nor inside
/// a double-quoted string.
pub fn strip_comment(line: &str) -> &str {
    let mut in_quotes = false;
    let mut escaped = false;
    for (idx, ch) in line.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => in_quotes = !in_quotes,
            '#' if !in_quotes => return &line[..idx],
            _ => {},
        }
    }
    line
}

/// Splits off the eight mandatory columns and returns them with whatever
/// follows. Tab separated lines are split on tabs only, so that columns may
/// contain spaces; other lines on runs of whitespace.
fn split_columns(line: &str) -> (Vec<&str>, Option<&str>) {
    if line.contains('\t') {
        let mut parts = line.splitn(9, '\t').collect::<Vec<_>>();
        let rest = if parts.len() == 9 { parts.pop() } else { None };
        return (parts, rest);
    }

    let mut columns = Vec::with_capacity(8);
    let mut rest = line.trim_start();
    while columns.len() < 8 && !rest.is_empty() {
        let end = rest
            .find(char::is_whitespace)
            .unwrap_or(rest.len());
        columns.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }
    (columns, (!rest.is_empty()).then_some(rest))
}

/// Coordinates are 1-based; zero is rejected with the unparsable values.
fn coord(
    value: &str,
    field: &'static str,
    line: usize,
) -> Result<Coord, GffError> {
    match value.parse::<Coord>() {
        Ok(pos) if pos > 0 => Ok(pos),
        _ => {
            Err(GffError::BadField {
                line,
                field,
                value: value.to_string(),
            })
        },
    }
}

/// Parses one feature record. The comment must already be stripped.
pub fn parse_record(
    text: &str,
    line: usize,
) -> Result<GffRecord, GffError> {
    let (columns, rest) = split_columns(text.trim_end());
    if columns.len() < 8 {
        return Err(GffError::FieldCount {
            line,
            found: columns.len(),
        });
    }

    let bad = |field: &'static str, value: &str| {
        GffError::BadField {
            line,
            field,
            value: value.to_string(),
        }
    };

    let score = match columns[5] {
        "." => None,
        s => Some(s.parse::<ScoreType>().map_err(|_| bad("score", s))?),
    };
    let strand = columns[6]
        .parse::<Strand>()
        .map_err(|_| bad("strand", columns[6]))?;
    let phase = columns[7]
        .parse::<Phase>()
        .map_err(|_| bad("phase", columns[7]))?;

    Ok(GffRecord {
        seqid: columns[0].to_string(),
        source: columns[1].to_string(),
        term: columns[2].to_string(),
        start: coord(columns[3], "start", line)?,
        end: coord(columns[4], "end", line)?,
        score,
        strand,
        phase,
        attributes: rest
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    })
}
