#![allow(dead_code)]
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use annotree::prelude::*;
use anyhow::Context;

pub fn data_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

pub fn parse_file(
    name: &str,
    config: ParserConfig,
) -> anyhow::Result<ParseOutput> {
    let path = data_path(name);
    let file = File::open(&path).with_context(|| format!("Could not open {}", path.display()))?;
    let mut parser = GffParser::new(config);
    parser.parse_reader(BufReader::new(file))?;
    Ok(parser.finish()?)
}

pub fn parse_text(
    text: &str,
    config: ParserConfig,
) -> anyhow::Result<ParseOutput> {
    let mut parser = GffParser::new(config);
    parser.parse_reader(text.as_bytes())?;
    Ok(parser.finish()?)
}

/// The feature `set/name` with its unique id, if present.
pub fn feature<'a>(
    context: &'a FeatureContext,
    set: &str,
    id: &str,
) -> Option<&'a Feature> {
    let node = context.find_feature(Quark::intern(set), Quark::intern(id))?;
    context.feature(node)
}

pub fn init_logger() { let _ = pretty_env_logger::try_init(); }
