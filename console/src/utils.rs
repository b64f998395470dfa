use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

use annotree::data_structs::{
    FeatureSourceTable,
    StyleTable,
};
use annotree::prelude::*;
use anyhow::{
    anyhow,
    Context,
};
use clap::{
    Args,
    ValueEnum,
};
use console::style;
use log::debug;

#[derive(Args, Debug, Clone)]
pub(crate) struct UtilsArgs {
    #[arg(short, long, action = clap::ArgAction::Count, help = "Verbose logging, repeat for more.")]
    pub verbose: u8,
}

impl UtilsArgs {
    pub fn setup(&self) -> anyhow::Result<()> {
        let mut builder = pretty_env_logger::formatted_builder();
        if self.verbose > 0 {
            builder.filter_level(match self.verbose {
                1 => log::LevelFilter::Info,
                _ => log::LevelFilter::Debug,
            });
        }
        else if let Ok(filters) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filters);
        }
        else {
            builder.filter_level(log::LevelFilter::Warn);
        }
        builder
            .try_init()
            .map_err(|e| anyhow!("Could not set up logging: {}", e))
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub(crate) enum ClipArg {
    #[default]
    Overlap,
    Trim,
    Exclude,
}

impl From<ClipArg> for ClipPolicy {
    fn from(value: ClipArg) -> Self {
        match value {
            ClipArg::Overlap => ClipPolicy::Overlap,
            ClipArg::Trim => ClipPolicy::Trim,
            ClipArg::Exclude => ClipPolicy::Exclude,
        }
    }
}

/// Parser options shared by every command that reads GFF.
#[derive(Args, Debug, Clone)]
pub(crate) struct ParseArgs {
    #[arg(
        value_parser,
        num_args = 1..,
        required = true,
        help = "Paths to GFF files. Wildcards are expanded."
    )]
    pub files: Vec<String>,

    #[arg(long = "gff-version", value_parser = ["2", "3"], help = "Expected GFF version.")]
    pub version: Option<String>,

    #[arg(long, default_value_t = false, help = "Accept Sequence Ontology terms only.")]
    pub so_only: bool,

    #[arg(long, default_value_t = false, help = "Parse unknown types as basic features.")]
    pub default_basic: bool,

    #[arg(long, default_value_t = false, help = "Stop at the first bad line.")]
    pub strict: bool,

    #[arg(long, help = "Clip window as START-END.")]
    pub clip: Option<String>,

    #[arg(long, value_enum, default_value_t = ClipArg::Overlap)]
    pub clip_policy: ClipArg,

    #[arg(long, short = 's', help = "Feature sets to keep. All by default.")]
    pub sets: Vec<String>,

    #[arg(long, help = "JSON source table mapping sources to feature sets.")]
    pub sources: Option<PathBuf>,

    #[arg(long, help = "JSON style table. Sets without a style are skipped.")]
    pub styles: Option<PathBuf>,

    #[arg(long, default_value_t = false, help = "Ignore DNA and FASTA sections.")]
    pub no_dna: bool,
}

impl ParseArgs {
    pub fn paths(&self) -> anyhow::Result<Vec<PathBuf>> {
        let paths = self
            .files
            .iter()
            .map(|p| expand_wildcards_single(p))
            .collect::<anyhow::Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();
        for path in paths.iter() {
            if !path.is_file() {
                anyhow::bail!("Path {} is not a file", style(path.display()).red());
            }
        }
        Ok(paths)
    }

    pub fn config(&self) -> anyhow::Result<ParserConfig> {
        let version = match self.version.as_deref() {
            Some("2") => Some(GffVersion::Gff2),
            Some("3") => Some(GffVersion::Gff3),
            _ => None,
        };
        let clip = self
            .clip
            .as_deref()
            .map(parse_window)
            .transpose()?;

        let mut config = ParserConfig::default()
            .with_version(version)
            .with_so_only(self.so_only)
            .with_default_to_basic(self.default_basic)
            .with_stop_on_error(self.strict)
            .with_clip(clip)
            .with_clip_policy(self.clip_policy.into())
            .with_parse_dna(!self.no_dna)
            .with_feature_sets(&self.sets);

        if let Some(path) = &self.sources {
            let table = FeatureSourceTable::from_json(open(path)?)?;
            debug!("Loaded {} feature sources", table.len());
            config = config.with_sources(Arc::new(table));
        }
        if let Some(path) = &self.styles {
            let table = StyleTable::from_json(open(path)?)?;
            debug!("Loaded {} styles", table.len());
            config = config.with_styles(Some(Arc::new(table)));
        }
        Ok(config)
    }
}

fn open(path: &PathBuf) -> anyhow::Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .with_context(|| format!("Could not open {}", path.display()))
}

fn parse_window(text: &str) -> anyhow::Result<Span> {
    let (start, end) = text
        .split_once('-')
        .ok_or_else(|| anyhow!("Clip window '{}' is not START-END", text))?;
    Ok(Span::new(
        start.trim().parse().context("Bad clip start")?,
        end.trim().parse().context("Bad clip end")?,
    ))
}

pub fn expand_wildcards_single(path: &str) -> anyhow::Result<Vec<PathBuf>> {
    if !path.contains('*') && !path.contains('?') {
        return Ok(vec![PathBuf::from(path)]);
    }
    let paths = glob::glob(path)
        .with_context(|| format!("Bad pattern {}", path))?
        .collect::<Result<Vec<_>, _>>()?;
    if paths.is_empty() {
        anyhow::bail!("Pattern {} matched no files", path);
    }
    Ok(paths)
}
