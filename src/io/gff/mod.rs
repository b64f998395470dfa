//! Streaming GFF2/GFF3 parser producing a [`FeatureContext`].
//!
//! The parser is fed one line at a time, either directly through
//! [`GffParser::parse_line`] or from any [`BufRead`] through
//! [`GffParser::parse_reader`]. Records are classified, interpreted by the
//! version's [`Dialect`] and gathered per feature set; the tree itself is
//! assembled by [`GffParser::finish`].
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! use annotree::io::gff::{GffParser, ParserConfig};
//!
//! let mut parser = GffParser::new(ParserConfig::default());
//! parser.parse_reader(BufReader::new(File::open("genes.gff3")?))?;
//! let output = parser.finish()?;
//! println!("{} features", output.context.feature_count());
//! # Ok::<(), anyhow::Error>(())
//! ```
pub mod attributes;
pub(crate) mod builder;
pub mod classify;
pub mod dialect;
pub mod error;
pub mod fields;
pub mod gff2;
pub mod gff3;
pub mod stats;

use std::fmt::Display;
use std::io::BufRead;
use std::sync::atomic::{
    AtomicBool,
    Ordering,
};
use std::sync::Arc;

use hashbrown::HashSet;
use indexmap::IndexSet;
use log::{
    debug,
    info,
    warn,
};
use serde::{
    Deserialize,
    Serialize,
};

pub use self::error::{
    GffError,
    LineCategory,
};
pub use self::stats::ParserStats;
use self::builder::{
    Clip,
    ContextShape,
    FeatureLine,
    TreeBuilder,
};
use self::classify::Classifier;
use self::dialect::{
    Dialect,
    SectionDirective,
};
use self::gff2::Gff2Dialect;
use self::gff3::Gff3Dialect;
use crate::data_structs::styles::{
    ColumnMap,
    FeatureSourceTable,
};
use crate::data_structs::typedef::Coord;
use crate::data_structs::{
    FeatureContext,
    Span,
    StyleTable,
};
use crate::quark::Quark;
use crate::with_field_fn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GffVersion {
    Gff2,
    Gff3,
}

impl GffVersion {
    pub fn number(&self) -> u8 {
        match self {
            GffVersion::Gff2 => 2,
            GffVersion::Gff3 => 3,
        }
    }

    fn from_declared(
        text: &str,
        line: usize,
    ) -> Result<Self, GffError> {
        // GFF3 allows a minor version, e.g. 3.1.26
        match text.split('.').next() {
            Some("2") => Ok(GffVersion::Gff2),
            Some("3") => Ok(GffVersion::Gff3),
            _ => {
                Err(GffError::UnsupportedVersion {
                    line,
                    version: text.to_string(),
                })
            },
        }
    }

    fn dialect(&self) -> Box<dyn Dialect> {
        match self {
            GffVersion::Gff2 => Box::new(Gff2Dialect),
            GffVersion::Gff3 => Box::new(Gff3Dialect),
        }
    }
}

impl Display for GffVersion {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "GFF{}", self.number())
    }
}

/// What happens to features reaching outside the clip window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClipPolicy {
    /// Keep any feature that overlaps the window, unchanged.
    #[default]
    Overlap,
    /// Keep overlapping features cut down to the window.
    Trim,
    /// Keep only features lying wholly inside the window.
    Exclude,
}

/// Sequence the parsed features belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceRegion {
    pub name: Quark,
    pub span: Option<Span>,
}

impl SequenceRegion {
    pub fn new(
        name: &str,
        span: Option<Span>,
    ) -> Self {
        Self {
            name: Quark::intern(name),
            span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Expected version. `None` takes whatever the stream declares.
    version:          Option<GffVersion>,
    /// Accept Sequence Ontology terms only.
    so_only:          bool,
    /// Parse unknown types as basic features instead of rejecting them.
    default_to_basic: bool,
    stop_on_error:    bool,
    clip:             Option<Span>,
    clip_policy:      ClipPolicy,
    /// Sequence to parse. `None` takes the first one declared or seen.
    sequence:         Option<SequenceRegion>,
    /// Feature sets (or display columns) to keep; empty keeps all.
    feature_sets:     IndexSet<Quark>,
    max_messages:     usize,
    /// When set, feature sets without a style are skipped.
    styles:           Option<Arc<StyleTable>>,
    sources:          Arc<FeatureSourceTable>,
    columns:          Option<Arc<ColumnMap>>,
    parse_dna:        bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            version:          None,
            so_only:          false,
            default_to_basic: false,
            stop_on_error:    false,
            clip:             None,
            clip_policy:      ClipPolicy::default(),
            sequence:         None,
            feature_sets:     IndexSet::new(),
            max_messages:     20,
            styles:           None,
            sources:          Arc::new(FeatureSourceTable::default()),
            columns:          None,
            parse_dna:        true,
        }
    }
}

impl ParserConfig {
    with_field_fn!(version, Option<GffVersion>);

    with_field_fn!(so_only, bool);

    with_field_fn!(default_to_basic, bool);

    with_field_fn!(stop_on_error, bool);

    with_field_fn!(clip, Option<Span>);

    with_field_fn!(clip_policy, ClipPolicy);

    with_field_fn!(sequence, Option<SequenceRegion>);

    with_field_fn!(max_messages, usize);

    with_field_fn!(styles, Option<Arc<StyleTable>>);

    with_field_fn!(sources, Arc<FeatureSourceTable>);

    with_field_fn!(columns, Option<Arc<ColumnMap>>);

    with_field_fn!(parse_dna, bool);

    /// Restricts parsing to the named feature sets or display columns.
    pub fn with_feature_sets<S: AsRef<str>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.feature_sets = names
            .into_iter()
            .map(|n| Quark::intern(&n.as_ref().to_lowercase()))
            .collect();
        self
    }

    pub fn stop_on_error(&self) -> bool { self.stop_on_error }

    fn wants(
        &self,
        set_id: Quark,
    ) -> bool {
        if self.feature_sets.is_empty() || self.feature_sets.contains(&set_id) {
            return true;
        }
        self.columns
            .as_ref()
            .and_then(|c| c.column_for(set_id))
            .is_some_and(|column| self.feature_sets.contains(&column))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    ParsingHeader,
    ParsingBody,
    Done,
    Error,
}

/// Open DNA or FASTA section.
#[derive(Debug, Clone, Default)]
enum Section {
    #[default]
    None,
    /// GFF2 `##DNA`; `keep` when the record names the parsed sequence.
    Dna { keep: bool, seq: String },
    /// GFF3 `##FASTA`; runs to the end of input.
    Fasta { record: Option<(String, String)> },
}

/// Result of a completed parse.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub context: FeatureContext,
    pub stats:   ParserStats,
}

pub struct GffParser {
    config:         ParserConfig,
    classifier:     Classifier,
    dialect:        Option<Box<dyn Dialect>>,
    state:          ParserState,
    line:           usize,
    sequence:       Option<Quark>,
    region:         Option<Span>,
    source_version: Option<(String, String)>,
    section:        Section,
    builder:        TreeBuilder,
    stats:          ParserStats,
    /// Feature sets already reported as lacking a style.
    unstyled_sets:  HashSet<Quark>,
    cancel:         Option<Arc<AtomicBool>>,
}

impl GffParser {
    pub fn new(config: ParserConfig) -> Self {
        let (sequence, region) = match config.sequence {
            Some(r) => (Some(r.name), r.span),
            None => (None, None),
        };
        Self {
            classifier: Classifier::new(config.so_only, config.default_to_basic),
            dialect: config.version.map(|v| v.dialect()),
            state: ParserState::ParsingHeader,
            line: 0,
            sequence,
            region,
            source_version: None,
            section: Section::None,
            builder: TreeBuilder::default(),
            stats: ParserStats::default(),
            unstyled_sets: HashSet::new(),
            cancel: None,
            config,
        }
    }

    /// Flag checked before every line; setting it cancels the parse.
    pub fn with_cancel_flag(
        mut self,
        flag: Arc<AtomicBool>,
    ) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn state(&self) -> ParserState { self.state }

    pub fn stats(&self) -> &ParserStats { &self.stats }

    pub fn version(&self) -> Option<GffVersion> { self.dialect.as_ref().map(|d| d.version()) }

    /// `##source-version` as declared, if any.
    pub fn source_version(&self) -> Option<(&str, &str)> {
        self.source_version
            .as_ref()
            .map(|(s, v)| (s.as_str(), v.as_str()))
    }

    /// Number of lines seen so far.
    pub fn line_number(&self) -> usize { self.line }

    /// Feeds one line, without its line terminator.
    ///
    /// Errors are counted in the parser statistics before being returned.
    /// A fatal error, or any error when `stop_on_error` is set, moves the
    /// parser to [`ParserState::Error`] and every later call fails.
    pub fn parse_line(
        &mut self,
        text: &str,
    ) -> Result<(), GffError> {
        if matches!(self.state, ParserState::Done | ParserState::Error) {
            return Err(GffError::Finished);
        }
        if self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            self.state = ParserState::Error;
            return Err(GffError::Cancelled { line: self.line });
        }
        self.line += 1;

        let text = text.trim_end_matches(['\r', '\n']);
        let category = self.categorise(text);
        let Some(category) = category
        else {
            return Ok(());
        };
        self.stats.count_line(category);

        let result = match category {
            LineCategory::Sequence | LineCategory::Fasta => self.sequence_line(text),
            LineCategory::Header | LineCategory::Directive => self.directive(text),
            LineCategory::Body => self.body_line(text),
        };
        if let Err(err) = &result {
            self.stats
                .count_error(category, err, self.config.max_messages);
            if err.is_fatal() || self.config.stop_on_error {
                self.state = ParserState::Error;
            }
        }
        result
    }

    /// Parses every line of `reader`. Non-fatal errors are skipped unless
    /// `stop_on_error` is set; they remain visible in [`Self::stats`].
    pub fn parse_reader<R: BufRead>(
        &mut self,
        reader: R,
    ) -> Result<(), GffError> {
        for line in reader.lines() {
            let line = line.map_err(|e| {
                self.state = ParserState::Error;
                GffError::Io {
                    line:    self.line,
                    message: e.to_string(),
                }
            })?;
            if let Err(err) = self.parse_line(&line) {
                if self.state == ParserState::Error {
                    return Err(err);
                }
                debug!("Skipping line: {}", err);
            }
        }
        Ok(())
    }

    /// Assembles the parsed features into a context and moves the parser
    /// to [`ParserState::Done`].
    pub fn finish(&mut self) -> Result<ParseOutput, GffError> {
        if matches!(self.state, ParserState::Done | ParserState::Error) {
            return Err(GffError::Finished);
        }
        self.close_section();

        let sequence = self.sequence.unwrap_or(Quark::NULL);
        let clip = self.config.clip.map(|window| {
            Clip {
                window,
                policy: self.config.clip_policy,
            }
        });
        let shape = ContextShape {
            sequence,
            region: self.region,
            window: self.config.sequence.and_then(|r| r.span),
            styles: self.config.styles.clone(),
            feature_sets: self.config.feature_sets.clone(),
            clip,
        };
        let builder = std::mem::take(&mut self.builder);
        let context = builder.finish(shape, &mut self.stats).map_err(|e| {
            self.state = ParserState::Error;
            e
        })?;
        self.state = ParserState::Done;

        info!(
            "Parsed {} lines of {}: {} features, {} errors",
            self.stats.total_lines(),
            sequence,
            self.stats.features,
            self.stats.total_errors()
        );
        Ok(ParseOutput {
            context,
            stats: self.stats.clone(),
        })
    }

    /// Decides what kind of line `text` is; `None` for blank lines and
    /// comments.
    fn categorise(
        &self,
        text: &str,
    ) -> Option<LineCategory> {
        match &self.section {
            Section::Fasta { .. } => return Some(LineCategory::Fasta),
            Section::Dna { .. } => return Some(LineCategory::Sequence),
            Section::None => {},
        }
        if text.trim().is_empty() {
            None
        }
        else if text.starts_with("##") {
            Some(match self.state {
                ParserState::ParsingHeader => LineCategory::Header,
                _ => LineCategory::Directive,
            })
        }
        else if text.starts_with('#') {
            None
        }
        else {
            Some(LineCategory::Body)
        }
    }

    fn directive(
        &mut self,
        text: &str,
    ) -> Result<(), GffError> {
        let line = self.line;
        let mut words = text[2..].split_whitespace();
        let name = words.next().unwrap_or_default();
        let args = words.collect::<Vec<_>>();
        let bad = || {
            GffError::BadDirective {
                line,
                text: text.to_string(),
            }
        };

        match name {
            "gff-version" => {
                let declared = GffVersion::from_declared(args.first().ok_or_else(bad)?, line)?;
                match self.version() {
                    Some(version) if version != declared => {
                        return Err(GffError::VersionMismatch {
                            line,
                            expected: version.number(),
                            found: declared.number(),
                        })
                    },
                    Some(_) => {},
                    None => self.dialect = Some(declared.dialect()),
                }
            },
            "source-version" => {
                let [source, version, ..] = args.as_slice()
                else {
                    return Err(bad());
                };
                self.source_version = Some((source.to_string(), version.to_string()));
            },
            "sequence-region" => {
                let [name, start, end] = args.as_slice()
                else {
                    return Err(bad());
                };
                let (start, end) = match (start.parse::<Coord>(), end.parse::<Coord>()) {
                    (Ok(s), Ok(e)) if s > 0 && e > 0 => (s, e),
                    _ => return Err(bad()),
                };
                self.declare_region(name, Span::new(start, end));
            },
            _ => {
                let Some(dialect) = self.dialect.as_ref()
                else {
                    return Ok(());
                };
                match dialect.section(name, &args) {
                    SectionDirective::DnaStart(seq) => {
                        let keep = self.config.parse_dna
                            && Quark::try_from_str(&seq).is_some_and(|q| Some(q) == self.sequence);
                        if !keep {
                            self.stats.skipped_sequences += 1;
                        }
                        self.section = Section::Dna {
                            keep,
                            seq: String::new(),
                        };
                    },
                    SectionDirective::Fasta => {
                        self.section = Section::Fasta { record: None };
                    },
                    SectionDirective::ResolveForward => self.builder.resolve_forward(),
                    SectionDirective::DnaEnd | SectionDirective::NotSection => {
                        debug!("Ignoring directive '{}' on line {}", name, line);
                    },
                }
            },
        }
        Ok(())
    }

    fn declare_region(
        &mut self,
        name: &str,
        span: Span,
    ) {
        match self.sequence {
            Some(seq) if *seq.as_str() != *name => {
                debug!("Ignoring region of other sequence {}", name);
            },
            Some(_) => {
                if self.region.is_none() {
                    self.region = Some(span);
                }
            },
            None => {
                self.sequence = Some(Quark::intern(name));
                self.region = Some(span);
            },
        }
    }

    /// Checks the header before the first record and leaves header state.
    fn end_header(&mut self) -> Result<(), GffError> {
        let line = self.line;
        let Some(dialect) = self.dialect.as_ref()
        else {
            return Err(GffError::HeaderIncomplete {
                line,
                missing: "##gff-version".to_string(),
            });
        };
        if dialect.requires_region() && self.region.is_none() {
            return Err(GffError::HeaderIncomplete {
                line,
                missing: "##sequence-region".to_string(),
            });
        }
        self.state = ParserState::ParsingBody;
        Ok(())
    }

    fn body_line(
        &mut self,
        text: &str,
    ) -> Result<(), GffError> {
        if self.state == ParserState::ParsingHeader {
            self.end_header()?;
        }
        let line = self.line;
        let record = fields::parse_record(fields::strip_comment(text), line)?;

        match self.sequence {
            Some(seq) if *seq.as_str() != *record.seqid => {
                self.stats.foreign_lines += 1;
                return Ok(());
            },
            Some(_) => {},
            None => self.sequence = Some(Quark::intern(&record.seqid)),
        }

        let source = self.config.sources.resolve(&record.source);
        if !self.config.wants(source.feature_set_id) {
            self.stats.unwanted_lines += 1;
            return Ok(());
        }

        let mode = match &self.config.styles {
            Some(styles) => {
                let Some(style) = styles.get(source.style_id)
                else {
                    if self.unstyled_sets.insert(source.feature_set_id) {
                        warn!(
                            "Feature set {} has no style {}, skipping its lines",
                            source.feature_set_name, source.style_id
                        );
                    }
                    self.stats.unstyled_lines += 1;
                    return Ok(());
                };
                style.mode
            },
            None => None,
        };

        let mut class = self
            .classifier
            .classify(&record.term)
            .ok_or_else(|| {
                GffError::UnknownType {
                    line,
                    term: record.term.clone(),
                }
            })?;
        if let Some(mode) = mode {
            class = class.with_mode(mode);
        }

        let Some(dialect) = self.dialect.as_ref()
        else {
            return Err(GffError::Finished);
        };
        let attrs = dialect.interpret(&record, &class, line)?;
        self.builder.add_line(&source, FeatureLine {
            record: &record,
            class,
            attrs,
            line,
        })
    }

    fn sequence_line(
        &mut self,
        text: &str,
    ) -> Result<(), GffError> {
        let line = self.line;
        match &mut self.section {
            Section::Dna { keep, seq } => {
                let Some(body) = text.strip_prefix("##")
                else {
                    return Err(GffError::BadSequence {
                        line,
                        reason: "DNA line without '##' prefix".to_string(),
                    });
                };
                if body.trim_start().starts_with("end-DNA") {
                    self.close_section();
                    return Ok(());
                }
                if *keep {
                    push_residues(seq, body, line)?;
                }
                Ok(())
            },
            Section::Fasta { record } => {
                if let Some(name) = text.strip_prefix('>') {
                    let name = name
                        .split_whitespace()
                        .next()
                        .unwrap_or_default()
                        .to_string();
                    let previous = record.replace((name, String::new()));
                    self.accept_dna(previous, line)?;
                    return Ok(());
                }
                match record {
                    Some((_, seq)) => push_residues(seq, text, line),
                    None => {
                        Err(GffError::BadSequence {
                            line,
                            reason: "sequence before a '>' header".to_string(),
                        })
                    },
                }
            },
            Section::None => Ok(()),
        }
    }

    fn close_section(&mut self) {
        let line = self.line;
        let result = match std::mem::take(&mut self.section) {
            Section::Dna { keep: true, seq } => {
                let name = self.sequence.map(|q| q.to_string()).unwrap_or_default();
                self.accept_dna(Some((name, seq)), line)
            },
            Section::Fasta { record } => self.accept_dna(record, line),
            _ => Ok(()),
        };
        if let Err(err) = result {
            self.stats
                .count_error(LineCategory::Sequence, &err, self.config.max_messages);
        }
    }

    /// Attaches a finished sequence record when it names the parsed
    /// sequence and matches the region length.
    fn accept_dna(
        &mut self,
        record: Option<(String, String)>,
        line: usize,
    ) -> Result<(), GffError> {
        let Some((name, seq)) = record
        else {
            return Ok(());
        };
        let ours = self
            .sequence
            .is_some_and(|q| *q.as_str() == *name);
        if !ours || !self.config.parse_dna {
            self.stats.skipped_sequences += 1;
            return Ok(());
        }
        if let Some(region) = self.region {
            if seq.len() != region.len() as usize {
                return Err(GffError::BadSequence {
                    line,
                    reason: format!(
                        "{} residues for a region of {}",
                        seq.len(),
                        region.len()
                    ),
                });
            }
        }
        if self.builder.has_dna() {
            warn!("Sequence {} given twice, keeping the first", name);
            return Ok(());
        }
        self.builder.set_dna(seq);
        Ok(())
    }
}

fn push_residues(
    seq: &mut String,
    text: &str,
    line: usize,
) -> Result<(), GffError> {
    for ch in text.chars().filter(|c| !c.is_whitespace()) {
        if !ch.is_ascii_alphabetic() && ch != '*' && ch != '-' {
            return Err(GffError::BadSequence {
                line,
                reason: format!("unexpected character '{}'", ch),
            });
        }
        seq.push(ch.to_ascii_lowercase());
    }
    Ok(())
}
