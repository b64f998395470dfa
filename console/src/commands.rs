use std::fs::File;
use std::io::{
    BufWriter,
    Write,
};
use std::path::PathBuf;

use annotree::io::dump::dump_context;
use annotree::io::loader::spawn_file_loader;
use annotree::io::xml::{
    context_events,
    write_events,
};
use annotree::prelude::*;
use anyhow::Context;
use clap::Args;
use console::style;
use itertools::Itertools;
use log::info;
use serde::Serialize;

use crate::utils::{
    ParseArgs,
    UtilsArgs,
};

fn output(path: &Option<PathBuf>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => {
            Box::new(BufWriter::new(File::create(path).with_context(|| {
                format!("Could not create {}", path.display())
            })?))
        },
        None => Box::new(BufWriter::new(std::io::stdout())),
    })
}

/// Parses every file on a worker thread, in order.
fn load_all(args: &ParseArgs) -> anyhow::Result<Vec<(PathBuf, ParseOutput)>> {
    let config = args.config()?;
    args.paths()?
        .into_iter()
        .map(|path| {
            let output = spawn_file_loader(&path, config.clone())?
                .wait()?
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            info!(
                "{}: {} features, {} errors",
                path.display(),
                output.stats.features,
                output.stats.total_errors()
            );
            Ok((path, output))
        })
        .collect()
}

/// Merges every file into one context, reporting each merge on stderr.
fn merge_all(args: &ParseArgs) -> anyhow::Result<FeatureContext> {
    let mut master = FeatureContext::new(Quark::NULL);
    for (path, output) in load_all(args)? {
        let diff = merge_context(&mut master, output.context)
            .with_context(|| format!("Could not merge {}", path.display()))?;
        eprintln!(
            "{}: +{} features, +{} containers",
            style(path.display()).green(),
            diff.feature_count(),
            diff.container_count()
        );
        master.release_diff(diff);
    }
    Ok(master)
}

#[derive(Serialize)]
struct MergeReport {
    sequence:     String,
    features:     usize,
    feature_sets: Vec<String>,
    alignments:   usize,
    blocks:       usize,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct MergeArgs {
    #[clap(flatten)]
    parse: ParseArgs,
}

impl MergeArgs {
    pub fn run(
        &self,
        _utils: &UtilsArgs,
    ) -> anyhow::Result<()> {
        let master = merge_all(&self.parse)?;
        let report = MergeReport {
            sequence:     master.sequence_name().as_str().to_string(),
            features:     master.feature_count(),
            feature_sets: master
                .feature_set_ids()
                .iter()
                .map(|q| q.as_str().to_string())
                .collect_vec(),
            alignments:   master.count(StructType::Alignment),
            blocks:       master.count(StructType::Block),
        };
        serde_json::to_writer_pretty(std::io::stdout(), &report)?;
        println!();
        Ok(())
    }
}

#[derive(Args, Debug, Clone)]
pub(crate) struct DumpArgs {
    #[clap(flatten)]
    parse: ParseArgs,

    #[arg(short, long, help = "Output file. Standard output by default.")]
    output: Option<PathBuf>,
}

impl DumpArgs {
    pub fn run(
        &self,
        _utils: &UtilsArgs,
    ) -> anyhow::Result<()> {
        let master = merge_all(&self.parse)?;
        let mut writer = output(&self.output)?;
        dump_context(&master, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[derive(Args, Debug, Clone)]
pub(crate) struct XmlArgs {
    #[clap(flatten)]
    parse: ParseArgs,

    #[arg(short, long, help = "Output file. Standard output by default.")]
    output: Option<PathBuf>,
}

impl XmlArgs {
    pub fn run(
        &self,
        _utils: &UtilsArgs,
    ) -> anyhow::Result<()> {
        let master = merge_all(&self.parse)?;
        let mut writer = output(&self.output)?;
        write_events(&context_events(&master), &mut writer)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[derive(Args, Debug, Clone)]
pub(crate) struct EraseArgs {
    #[clap(flatten)]
    parse: ParseArgs,

    #[arg(
        long,
        short = 'r',
        num_args = 1..,
        required = true,
        help = "Files whose features are removed from the merged context."
    )]
    remove: Vec<PathBuf>,

    #[arg(short, long, help = "Output file. Standard output by default.")]
    output: Option<PathBuf>,
}

impl EraseArgs {
    pub fn run(
        &self,
        _utils: &UtilsArgs,
    ) -> anyhow::Result<()> {
        let mut master = merge_all(&self.parse)?;
        let config = self.parse.config()?;
        for path in self.remove.iter() {
            let remove = spawn_file_loader(path, config.clone())?
                .wait()?
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            let diff = erase_context(&mut master, &remove.context)?;
            eprintln!(
                "{}: -{} features, -{} containers",
                style(path.display()).red(),
                diff.feature_count(),
                diff.container_count()
            );
            master.release_diff(diff);
        }
        let mut writer = output(&self.output)?;
        dump_context(&master, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct FileReport<'a> {
    path:         String,
    version:      Option<u8>,
    feature_sets: Vec<String>,
    stats:        &'a ParserStats,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct StatsArgs {
    #[clap(flatten)]
    parse: ParseArgs,
}

impl StatsArgs {
    pub fn run(
        &self,
        _utils: &UtilsArgs,
    ) -> anyhow::Result<()> {
        let config = self.parse.config()?;
        let mut reports = Vec::new();
        for path in self.parse.paths()? {
            let file = File::open(&path)
                .with_context(|| format!("Could not open {}", path.display()))?;
            let mut parser = GffParser::new(config.clone());
            // Bad lines are already counted; only fatal errors end the run.
            if let Err(e) = parser.parse_reader(std::io::BufReader::new(file)) {
                eprintln!("{}: {}", style(path.display()).red(), e);
            }
            let version = parser.version().map(|v| v.number());
            let output = parser.finish();
            let stats = match &output {
                Ok(out) => out.stats.clone(),
                Err(_) => parser.stats().clone(),
            };
            let sets = output
                .map(|out| out.context.feature_set_ids())
                .unwrap_or_default();
            reports.push((path, version, sets, stats));
        }

        let reports = reports
            .iter()
            .map(|(path, version, sets, stats)| FileReport {
                path: path.display().to_string(),
                version: *version,
                feature_sets: sets.iter().map(|q| q.as_str().to_string()).collect_vec(),
                stats,
            })
            .collect_vec();
        serde_json::to_writer_pretty(std::io::stdout(), &reports)?;
        println!();
        Ok(())
    }
}
