use annotree::prelude::*;
use rstest::*;

mod common;
use common::{
    feature,
    init_logger,
    parse_file,
    parse_text,
};

fn parsed(name: &str) -> FeatureContext {
    parse_file(name, ParserConfig::default()).unwrap().context
}

#[fixture]
fn master() -> FeatureContext {
    init_logger();
    FeatureContext::new(Quark::NULL)
}

#[rstest]
fn test_sequential_merges(mut master: FeatureContext) -> anyhow::Result<()> {
    let first = merge_context(&mut master, parsed("genes.gff3"))?;
    assert_eq!(first.feature_count(), 6);
    assert_eq!(master.sequence_name(), Quark::intern("chr1"));
    master.release_diff(first);

    let ests = parsed("ests.gff3");
    let expected = ests.feature_paths();
    let second = merge_context(&mut master, ests)?;
    assert_eq!(second.feature_count(), 3);
    assert_eq!(master.feature_count(), 9);
    assert_eq!(second.feature_paths(), &expected);

    // Both sets are new, so the diff holds them whole.
    assert_eq!(second.container_count(), 2);
    assert_eq!(
        master.diff_context(&second).map(|c| c.sequence_name),
        Some(Quark::intern("chr1"))
    );

    assert!(feature(&master, "rnaseq", "est1_1400.1450_1.51").is_some());
    assert!(feature(&master, "ensembl", "ABC1_100.900").is_some());
    master.release_diff(second);
    Ok(())
}

#[rstest]
fn test_remerge_adds_nothing(mut master: FeatureContext) -> anyhow::Result<()> {
    let diff = merge_context(&mut master, parsed("genes.gff3"))?;
    master.release_diff(diff);
    let before = master.feature_paths();

    let again = merge_context(&mut master, parsed("genes.gff3"))?;
    assert!(again.is_empty());
    assert_eq!(master.feature_paths(), before);
    master.release_diff(again);
    Ok(())
}

#[rstest]
fn test_erase_restores_previous(mut master: FeatureContext) -> anyhow::Result<()> {
    let diff = merge_context(&mut master, parsed("genes.gff3"))?;
    master.release_diff(diff);
    let before = master.feature_paths();

    let diff = merge_context(&mut master, parsed("ests.gff3"))?;
    let erased = erase_diff(&mut master, diff)?;
    assert_eq!(erased.feature_count(), 3);
    assert_eq!(master.feature_paths(), before);
    assert!(master.find_feature_set(Quark::intern("rnaseq")).is_none());
    master.release_diff(erased);
    Ok(())
}

#[rstest]
fn test_erase_by_context(mut master: FeatureContext) -> anyhow::Result<()> {
    for name in ["genes.gff3", "ests.gff3"] {
        let diff = merge_context(&mut master, parsed(name))?;
        master.release_diff(diff);
    }
    let erased = erase_context(&mut master, &parsed("genes.gff3"))?;
    assert_eq!(erased.feature_count(), 6);
    assert_eq!(master.feature_count(), 3);
    assert_eq!(master.feature_set_ids(), vec![
        Quark::intern("repeatmasker"),
        Quark::intern("rnaseq")
    ]);
    master.release_diff(erased);
    Ok(())
}

#[test]
fn test_gff2_and_gff3_share_a_sequence() -> anyhow::Result<()> {
    let mut master = parsed("genes.gff3");
    let diff = merge_context(&mut master, parsed("clones.gff"))?;
    assert_eq!(diff.feature_count(), 4);
    assert_eq!(master.feature_count(), 10);
    master.release_diff(diff);
    Ok(())
}

#[rstest]
fn test_region_directive_does_not_split_blocks(mut master: FeatureContext) -> anyhow::Result<()> {
    let plain = "##gff-version 3\nchr1\tensembl\texon\t950\t990\t.\t+\t.\tID=extra\n";
    let diff = merge_context(&mut master, parse_text(plain, ParserConfig::default())?.context)?;
    master.release_diff(diff);

    let diff = merge_context(&mut master, parsed("genes.gff3"))?;
    master.release_diff(diff);

    let blocks = master.nodes_at(StructType::Block);
    assert_eq!(blocks.len(), 1);
    assert_eq!(master.get(blocks[0]).map(|b| b.unique_id()), Some(Quark::intern("chr1")));
    assert_eq!(master.feature_set_ids().len(), 2);
    assert_eq!(master.feature_count(), 7);

    // The block picks up the declared extent from the second file.
    let block = master.get(blocks[0]).and_then(FeatureAny::as_block);
    assert_eq!(
        block.map(|b| b.block_to_sequence),
        Some(SpanMapping::identity(Span::new(1, 2000)))
    );
    Ok(())
}
