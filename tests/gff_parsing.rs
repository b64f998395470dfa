use std::sync::Arc;

use annotree::data_structs::{
    BoundaryType,
    ColumnMap,
    FeatureSource,
    FeatureSourceTable,
    FeatureStyle,
    HomolType,
    Phase,
    StyleTable,
};
use annotree::io::gff::ParserState;
use annotree::prelude::*;
use assert_approx_eq::assert_approx_eq;
use rstest::*;

mod common;
use common::{
    feature,
    init_logger,
    parse_file,
    parse_text,
};

const GFF3_HEADER: &str = "##gff-version 3\n##sequence-region seq1 1 1000\n";

#[fixture]
fn genes() -> ParseOutput {
    init_logger();
    parse_file("genes.gff3", ParserConfig::default()).unwrap()
}

#[rstest]
fn test_gene_model(genes: ParseOutput) {
    let ctx = &genes.context;
    assert_eq!(ctx.sequence_name(), Quark::intern("chr1"));
    assert_eq!(ctx.feature_set_ids(), vec![
        Quark::intern("ensembl"),
        Quark::intern("est")
    ]);
    assert_eq!(ctx.feature_count(), 6);
    assert_eq!(genes.stats.features, 6);
    assert_eq!(genes.stats.total_errors(), 0);

    let gene = feature(ctx, "ensembl", "ABC1_100.900").unwrap();
    assert_eq!(gene.kind(), FeatureType::Basic);

    let tx = feature(ctx, "ensembl", "ABC1-201_100.900").unwrap();
    assert_eq!(tx.kind(), FeatureType::Transcript);
    let data = tx.transcript().unwrap();
    assert_eq!(data.exons, vec![Span::new(100, 300), Span::new(500, 900)]);
    assert_eq!(data.introns, vec![Span::new(301, 499)]);
    assert_eq!(data.cds, Some(Span::new(150, 800)));
    assert_eq!(data.start_phase, Phase::Zero);

    let lone = feature(ctx, "ensembl", "lone1_1200.1300").unwrap();
    assert_eq!(lone.kind(), FeatureType::Basic);
    assert_eq!(lone.strand(), Strand::Reverse);

    let splice = feature(ctx, "ensembl", "ss1_301.302").unwrap();
    assert_eq!(splice.boundary(), Some(BoundaryType::FivePrimeSplice));
}

#[rstest]
fn test_alignments(genes: ParseOutput) {
    let ctx = &genes.context;
    let m1 = feature(ctx, "est", "m1_1000.1149_1.101").unwrap();
    let h = m1.homology().unwrap();
    assert!(h.is_gapped());
    assert_eq!(h.query_name, Quark::intern("EST7"));

    let p1 = feature(ctx, "est", "p1_400.429_1.10").unwrap();
    assert_approx_eq!(p1.score(), 12.5);
    assert!(!p1.homology().unwrap().is_gapped());
}

#[test]
fn test_gff2_file() -> anyhow::Result<()> {
    let out = parse_file("clones.gff", ParserConfig::default())?;
    let ctx = &out.context;
    assert_eq!(ctx.feature_count(), 4);

    let tx = feature(ctx, "curated", "B0250.1_100.900").unwrap();
    assert_eq!(tx.transcript().unwrap().exons.len(), 2);
    assert_eq!(tx.locus_id(), Quark::intern("unc-1"));

    let clone_end = feature(ctx, "curated", "Clone_left_end_1.1").unwrap();
    assert_eq!(clone_end.boundary(), Some(BoundaryType::CloneEnd));

    let hit = feature(ctx, "blastx", "Q9XYZ1_1500.1529_1.10").unwrap();
    let h = hit.homology().unwrap();
    assert_eq!(h.homol_type, HomolType::Protein);
    assert_eq!(h.gaps.len(), 2);
    assert_approx_eq!(hit.score(), 55.0);
    Ok(())
}

#[test]
fn test_two_exons_make_transcript() -> anyhow::Result<()> {
    let text = format!(
        "{}seq1\tsrcX\texon\t10\t20\t.\t+\t.\tID=foo\n\
         seq1\tsrcX\texon\t30\t40\t.\t+\t.\tID=foo\n",
        GFF3_HEADER
    );
    let out = parse_text(&text, ParserConfig::default())?;
    assert_eq!(out.context.feature_count(), 1);
    let f = feature(&out.context, "srcx", "foo_10.40").unwrap();
    assert_eq!(f.kind(), FeatureType::Transcript);
    let tr = f.transcript().unwrap();
    assert_eq!(tr.exons, vec![Span::new(10, 20), Span::new(30, 40)]);
    assert_eq!(tr.introns, vec![Span::new(21, 29)]);
    Ok(())
}

#[test]
fn test_abutting_exons_stay_separate() -> anyhow::Result<()> {
    let text = format!(
        "{}seq1\tsrcX\texon\t10\t20\t.\t+\t.\tID=foo\n\
         seq1\tsrcX\texon\t21\t30\t.\t+\t.\tID=foo\n",
        GFF3_HEADER
    );
    let out = parse_text(&text, ParserConfig::default())?;
    let tr = feature(&out.context, "srcx", "foo_10.30")
        .and_then(|f| f.transcript().cloned())
        .unwrap();
    assert_eq!(tr.exons, vec![Span::new(10, 20), Span::new(21, 30)]);
    assert!(tr.introns.is_empty());
    Ok(())
}

#[test]
fn test_missing_score() -> anyhow::Result<()> {
    let text = format!("{}seq1\tsrc\tgene\t5\t50\t.\t-\t.\tName=g\n", GFF3_HEADER);
    let out = parse_text(&text, ParserConfig::default())?;
    let f = feature(&out.context, "src", "g_5.50").unwrap();
    assert!(!f.has_score());
    assert_eq!(f.score(), 0.0);
    Ok(())
}

#[rstest]
#[case::strict(true, 0, 1)]
#[case::lenient(false, 1, 0)]
fn test_legacy_clone_term(
    #[case] so_only: bool,
    #[case] features: usize,
    #[case] errors: usize,
) -> anyhow::Result<()> {
    let text = format!("{}seq1\tsrc\tClone\t1\t500\t.\t+\t.\tName=AC1\n", GFF3_HEADER);
    let out = parse_text(&text, ParserConfig::default().with_so_only(so_only))?;
    assert_eq!(out.context.feature_count(), features);
    assert_eq!(out.stats.body.errors, errors);
    if features == 1 {
        let f = feature(&out.context, "src", "AC1_1.500").unwrap();
        assert_eq!(f.kind(), FeatureType::Basic);
    }
    Ok(())
}

#[test]
fn test_reversed_coordinates_normalised() -> anyhow::Result<()> {
    let text = format!("{}seq1\tsrc\tgene\t90\t10\t.\t-\t.\tName=r\n", GFF3_HEADER);
    let out = parse_text(&text, ParserConfig::default())?;
    let f = feature(&out.context, "src", "r_10.90").unwrap();
    assert_eq!(f.span(), Span::new(10, 90));
    Ok(())
}

#[test]
fn test_gff2_strict_header() {
    let text = "##gff-version 2\nchr1\tsrc\tClone\t1\t10\t.\t+\t.\tSequence \"x\"\n";
    let mut parser = GffParser::new(ParserConfig::default());
    let err = parser.parse_reader(text.as_bytes()).unwrap_err();
    assert!(matches!(err, GffError::HeaderIncomplete { line: 2, .. }));
    assert_eq!(parser.state(), ParserState::Error);
    assert_eq!(parser.stats().body.errors, 1);
}

#[test]
fn test_configured_version_needs_no_directive() -> anyhow::Result<()> {
    let text = "seq9\tsrc\tgene\t1\t10\t.\t+\t.\tID=g\n";
    let out = parse_text(
        text,
        ParserConfig::default().with_version(Some(GffVersion::Gff3)),
    )?;
    assert_eq!(out.context.sequence_name(), Quark::intern("seq9"));
    assert_eq!(out.context.feature_count(), 1);
    Ok(())
}

#[rstest]
#[case::field_count("seq1\tsrc\tgene\t1\t10\t.\t+\n")]
#[case::bad_strand("seq1\tsrc\tgene\t1\t10\t.\tx\t.\tID=a\n")]
#[case::bad_phase("seq1\tsrc\tCDS\t1\t10\t.\t+\t3\tParent=a\n")]
#[case::bad_score("seq1\tsrc\tgene\t1\t10\thigh\t+\t.\tID=a\n")]
#[case::bad_target("seq1\tsrc\tcDNA_match\t1\t10\t.\t+\t.\tID=a;Target=x 1\n")]
fn test_bad_lines_are_counted(#[case] line: &str) -> anyhow::Result<()> {
    let text = format!(
        "{}{}seq1\tsrc\tgene\t100\t200\t.\t+\t.\tID=ok\n",
        GFF3_HEADER, line
    );
    let out = parse_text(&text, ParserConfig::default())?;
    assert_eq!(out.stats.body.errors, 1);
    assert!(out.stats.messages[0].starts_with("line 3:"));
    assert_eq!(out.context.feature_count(), 1);

    let mut strict = GffParser::new(ParserConfig::default().with_stop_on_error(true));
    let err = strict.parse_reader(text.as_bytes()).unwrap_err();
    assert_eq!(err.line(), Some(3));
    Ok(())
}

#[rstest]
#[case::overlap(ClipPolicy::Overlap, 2)]
#[case::trim(ClipPolicy::Trim, 2)]
#[case::exclude(ClipPolicy::Exclude, 1)]
fn test_clip_window(
    #[case] policy: ClipPolicy,
    #[case] kept: usize,
) -> anyhow::Result<()> {
    let text = format!(
        "{}seq1\tsrc\tgene\t100\t200\t.\t+\t.\tName=inside\n\
         seq1\tsrc\tgene\t250\t400\t.\t+\t.\tName=edge\n\
         seq1\tsrc\tgene\t600\t700\t.\t+\t.\tName=outside\n",
        GFF3_HEADER
    );
    let config = ParserConfig::default()
        .with_clip(Some(Span::new(50, 300)))
        .with_clip_policy(policy);
    let out = parse_text(&text, config)?;
    assert_eq!(out.context.feature_count(), kept);
    if policy == ClipPolicy::Trim {
        assert!(feature(&out.context, "src", "edge_250.300").is_some());
        assert_eq!(out.stats.trimmed, 1);
    }
    Ok(())
}

#[test]
fn test_zero_exon_transcript_dropped() -> anyhow::Result<()> {
    let text = format!(
        "{}seq1\tsrc\tmRNA\t100\t500\t.\t+\t.\tID=t1\n\
         seq1\tsrc\tCDS\t120\t300\t.\t+\t0\tParent=t1\n",
        GFF3_HEADER
    );
    let out = parse_text(&text, ParserConfig::default())?;
    assert_eq!(out.context.feature_count(), 0);
    assert_eq!(out.stats.dropped_transcripts, 1);
    Ok(())
}

#[test]
fn test_resolve_forward_splits_features() -> anyhow::Result<()> {
    let text = format!(
        "{}seq1\tsrc\texon\t10\t20\t.\t+\t.\tID=x\n\
         ###\n\
         seq1\tsrc\texon\t30\t40\t.\t+\t.\tID=x\n",
        GFF3_HEADER
    );
    let out = parse_text(&text, ParserConfig::default())?;
    assert_eq!(out.context.feature_count(), 2);
    assert!(feature(&out.context, "src", "x_10.20").is_some());
    assert!(feature(&out.context, "src", "x_30.40").is_some());
    Ok(())
}

#[rstest]
fn test_dump_is_stable(genes: ParseOutput) {
    let first = annotree::io::dump::dump_to_string(&genes.context).unwrap();
    let again = parse_file("genes.gff3", ParserConfig::default()).unwrap();
    let second = annotree::io::dump::dump_to_string(&again.context).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.lines().count(), 1 + 1 + 1 + 2 + 6);
}

fn source(
    name: &str,
    set: &str,
    style: &str,
) -> FeatureSource {
    FeatureSource {
        source:      name.to_string(),
        feature_set: Some(set.to_string()),
        style:       Some(style.to_string()),
        description: None,
    }
}

const TWO_SOURCES: &str = "seq1\tens\tgene\t1\t10\t.\t+\t.\tID=g1\n\
                           seq1\trm\trepeat_region\t20\t30\t.\t+\t.\tID=r1\n\
                           seq1\trm\trepeat_region\t40\t50\t.\t+\t.\tID=r2\n";

#[test]
fn test_sources_and_styles() -> anyhow::Result<()> {
    let sources = FeatureSourceTable::from(vec![source("ens", "Curated_Genes", "gene_style")]);
    let styles = StyleTable::from(vec![FeatureStyle::new("Gene_Style")]);
    let config = ParserConfig::default()
        .with_sources(Arc::new(sources))
        .with_styles(Some(Arc::new(styles)));

    let out = parse_text(&format!("{}{}", GFF3_HEADER, TWO_SOURCES), config)?;
    let ctx = &out.context;
    assert_eq!(ctx.feature_set_ids(), vec![Quark::intern("curated_genes")]);
    assert_eq!(out.stats.unstyled_lines, 2);
    assert!(feature(ctx, "curated_genes", "g1_1.10").is_some());

    let set = ctx
        .find_feature_set(Quark::intern("curated_genes"))
        .and_then(|id| ctx.get(id))
        .and_then(FeatureAny::as_feature_set)
        .unwrap();
    assert_eq!(set.style_id, Quark::intern("gene_style"));
    Ok(())
}

#[test]
fn test_style_mode_overrides_term() -> anyhow::Result<()> {
    let styles = StyleTable::from(vec![FeatureStyle::new("srcx").with_mode(FeatureType::Basic)]);
    let text = format!(
        "{}seq1\tsrcX\texon\t10\t20\t.\t+\t.\tID=foo\n\
         seq1\tsrcX\texon\t30\t40\t.\t+\t.\tID=foo\n",
        GFF3_HEADER
    );
    let out = parse_text(
        &text,
        ParserConfig::default().with_styles(Some(Arc::new(styles))),
    )?;
    assert_eq!(out.context.feature_count(), 2);
    for id in ["foo_10.20", "foo_30.40"] {
        let f = feature(&out.context, "srcx", id).unwrap();
        assert_eq!(f.kind(), FeatureType::Basic);
    }
    Ok(())
}

#[test]
fn test_feature_sets_selected_by_column() -> anyhow::Result<()> {
    let mut columns = ColumnMap::default();
    columns.insert("rm", "Repeats");
    let config = ParserConfig::default()
        .with_columns(Some(Arc::new(columns)))
        .with_feature_sets(["repeats"]);

    let out = parse_text(&format!("{}{}", GFF3_HEADER, TWO_SOURCES), config)?;
    assert_eq!(out.context.feature_set_ids(), vec![Quark::intern("rm")]);
    assert_eq!(out.context.feature_count(), 2);
    assert_eq!(out.stats.unwanted_lines, 1);
    Ok(())
}
