use std::io::Write;
use std::time::{
    Duration,
    Instant,
};

use annotree::io::loader::spawn_file_loader;
use annotree::prelude::*;
use tempfile::NamedTempFile;

mod common;
use common::data_path;

#[test]
fn test_loader_delivers_context() -> anyhow::Result<()> {
    let handle = spawn_file_loader(data_path("genes.gff3"), ParserConfig::default())?;
    let output = handle.wait()??;
    assert_eq!(output.context.feature_count(), 6);
    assert_eq!(output.stats.total_errors(), 0);
    Ok(())
}

#[test]
fn test_loader_can_be_polled() -> anyhow::Result<()> {
    let handle = spawn_file_loader(data_path("ests.gff3"), ParserConfig::default())?;
    let deadline = Instant::now() + Duration::from_secs(30);
    let output = loop {
        if let Some(result) = handle.try_result()? {
            break result?;
        }
        anyhow::ensure!(Instant::now() < deadline, "loader did not finish");
        std::thread::sleep(Duration::from_millis(5));
    };
    assert_eq!(output.context.feature_count(), 3);
    Ok(())
}

#[test]
fn test_loader_reports_parse_error() -> anyhow::Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "##gff-version 2")?;
    writeln!(file, "chr1\tsrc\tClone\t1\t10\t.\t+\t.\tSequence \"x\"")?;
    file.flush()?;

    let handle = spawn_file_loader(file.path(), ParserConfig::default())?;
    let result = handle.wait()?;
    assert!(matches!(result, Err(GffError::HeaderIncomplete { .. })));
    Ok(())
}

#[test]
fn test_cancelled_loader() -> anyhow::Result<()> {
    let mut text = String::from("##gff-version 3\n##sequence-region chr1 1 100000000\n");
    for i in 0..200_000u32 {
        let start = i * 10 + 1;
        text.push_str(&format!(
            "chr1\tsrc\tgene\t{}\t{}\t.\t+\t.\tID=g{}\n",
            start,
            start + 5,
            i
        ));
    }
    let handle = spawn_loader(std::io::Cursor::new(text.into_bytes()), ParserConfig::default());
    handle.cancel();
    assert!(handle.is_cancelled());
    match handle.wait()? {
        Err(GffError::Cancelled { .. }) => {},
        // the worker may have finished before the flag was seen
        Ok(output) => assert_eq!(output.context.feature_count(), 200_000),
        Err(e) => anyhow::bail!("unexpected error: {}", e),
    }
    Ok(())
}

#[test]
fn test_missing_file() {
    assert!(spawn_file_loader(data_path("absent.gff3"), ParserConfig::default()).is_err());
}
