use rstest::{
    fixture,
    rstest,
};

use super::*;
use crate::data_structs::{
    Block,
    Feature,
    FeatureSet,
    FeatureType,
    Phase,
    Span,
    SpanMapping,
    StandardData,
    Strand,
};
use crate::quark::Quark;

fn q(s: &str) -> Quark { Quark::intern(s) }

fn basic(
    name: &str,
    start: u32,
    end: u32,
) -> Feature {
    let mut f = Feature::create_empty();
    f.add_standard_data(StandardData {
        unique_id:   Feature::create_id(
            FeatureType::Basic,
            name,
            Strand::Forward,
            start,
            end,
            0,
            0,
        ),
        original_id: q(name),
        ontology:    q("gene"),
        kind:        FeatureType::Basic,
        start,
        end,
        score:       None,
        strand:      Strand::Forward,
        phase:       Phase::None,
    });
    f
}

/// Context of `chrM` holding `features` as (set, name, start, end).
fn context_with(features: &[(&str, &str, u32, u32)]) -> FeatureContext {
    let mut ctx = FeatureContext::new(q("chrM"));
    for (set, name, start, end) in features {
        let set = ctx
            .ensure_feature_set(
                q("chrM"),
                Block::new(q("chrM_1.1000"), SpanMapping::identity(Span::new(1, 1000))),
                FeatureSet::new(q(set), q(set)),
            )
            .unwrap();
        ctx.add_child(set, basic(name, *start, *end)).unwrap();
    }
    ctx
}

#[fixture]
fn left() -> FeatureContext { context_with(&[("genes", "a", 1, 10), ("genes", "b", 20, 30)]) }

#[fixture]
fn right() -> FeatureContext {
    context_with(&[("genes", "b", 20, 30), ("genes", "c", 40, 50), ("repeats", "r", 5, 9)])
}

#[rstest]
fn test_merge_adds_only_new(
    mut left: FeatureContext,
    right: FeatureContext,
) {
    let diff = merge_context(&mut left, right).unwrap();
    assert_eq!(diff.feature_count(), 2);
    // the repeats set arrives whole
    assert_eq!(diff.container_count(), 1);
    assert_eq!(left.feature_count(), 4);
    assert_eq!(diff.feature_paths().len(), 2);

    let freed = left.release_diff(diff);
    // diff root, alignment, block and the genes set shell
    assert_eq!(freed, 4);
    assert_eq!(left.feature_count(), 4);
}

#[rstest]
fn test_merge_idempotent(
    mut left: FeatureContext,
    right: FeatureContext,
) {
    let first = merge_context(&mut left, right.clone()).unwrap();
    left.release_diff(first);
    let before = left.feature_paths();
    let again = merge_context(&mut left, right).unwrap();
    assert!(again.is_empty());
    assert_eq!(left.feature_paths(), before);
    left.release_diff(again);
}

#[rstest]
fn test_merge_associative(
    left: FeatureContext,
    right: FeatureContext,
) {
    let third = context_with(&[("est", "e1", 100, 200), ("genes", "a", 1, 10)]);

    let mut ab_c = left.clone();
    let d = merge_context(&mut ab_c, right.clone()).unwrap();
    ab_c.release_diff(d);
    let d = merge_context(&mut ab_c, third.clone()).unwrap();
    ab_c.release_diff(d);

    let mut bc = right;
    let d = merge_context(&mut bc, third).unwrap();
    bc.release_diff(d);
    let mut a_bc = left;
    let d = merge_context(&mut a_bc, bc).unwrap();
    a_bc.release_diff(d);

    assert_eq!(ab_c.feature_paths(), a_bc.feature_paths());
}

#[rstest]
fn test_erase_inverts_merge(
    mut left: FeatureContext,
    right: FeatureContext,
) {
    let original = left.feature_paths();
    let diff = merge_context(&mut left, right).unwrap();
    let erased = erase_diff(&mut left, diff).unwrap();
    assert_eq!(erased.feature_count(), 2);
    // only the repeats set became empty
    assert_eq!(erased.container_count(), 1);
    assert_eq!(left.feature_paths(), original);
    assert!(left.find_feature_set(q("repeats")).is_none());

    let doomed = left.elements_to_destroy(&erased);
    assert_eq!(doomed.len(), left.release_diff(erased));
}

#[rstest]
fn test_erase_diff_keeps_later_additions(mut left: FeatureContext) {
    let first = merge_context(&mut left, context_with(&[("est", "e1", 100, 200)])).unwrap();
    assert_eq!(first.container_count(), 1);
    let second = merge_context(&mut left, context_with(&[("est", "e2", 300, 400)])).unwrap();
    assert_eq!(second.feature_count(), 1);
    left.release_diff(second);

    let erased = erase_diff(&mut left, first).unwrap();
    assert_eq!(erased.feature_count(), 1);
    assert_eq!(erased.container_count(), 0);
    let set = left.find_feature_set(q("est")).unwrap();
    assert_eq!(left.get(set).map(|s| s.children().len()), Some(1));
    assert!(left.find_feature(q("est"), q("e2_300.400")).is_some());
    assert!(left.find_feature(q("est"), q("e1_100.200")).is_none());
    left.release_diff(erased);
}

#[rstest]
fn test_erase_ignores_absent(mut left: FeatureContext) {
    let other = context_with(&[("genes", "zzz", 1, 2), ("other", "b", 20, 30)]);
    let diff = erase_context(&mut left, &other).unwrap();
    assert!(diff.is_empty());
    assert_eq!(left.feature_count(), 2);
    left.release_diff(diff);
}

#[rstest]
fn test_erase_everything_clears_master(mut left: FeatureContext) {
    let copy = left.clone();
    let diff = erase_context(&mut left, &copy).unwrap();
    assert_eq!(diff.feature_count(), 2);
    assert_eq!(diff.container_count(), 3);
    assert_eq!(left.feature_count(), 0);
    assert!(left.master_alignment().is_none());
    assert_eq!(diff.feature_paths().len(), 2);
    left.release_diff(diff);
}

#[test]
fn test_merge_into_unset_takes_metadata() {
    let mut empty = FeatureContext::new(Quark::NULL);
    let mut incoming = context_with(&[("genes", "a", 1, 10)]);
    incoming.context_mut().length = 1000;
    let diff = merge_context(&mut empty, incoming).unwrap();
    assert_eq!(empty.sequence_name(), q("chrM"));
    assert_eq!(empty.context().length, 1000);
    assert!(empty.master_alignment().is_some());
    assert_eq!(diff.container_count(), 1);
    empty.release_diff(diff);
}

#[test]
fn test_merge_other_sequence_fails() {
    let mut ctx = context_with(&[("genes", "a", 1, 10)]);
    let other = FeatureContext::new(q("chrOther"));
    assert!(matches!(
        merge_context(&mut ctx, other),
        Err(StructureError::SequenceMismatch { .. })
    ));
}

#[test]
fn test_merge_fills_missing_dna() {
    let mut ctx = context_with(&[("genes", "a", 1, 10)]);
    let mut incoming = context_with(&[("genes", "a", 1, 10)]);
    let block = incoming.nodes_at(StructType::Block)[0];
    assert!(incoming.set_block_dna(block, "a".repeat(1000)));
    let diff = merge_context(&mut ctx, incoming).unwrap();
    assert!(diff.is_empty());
    let block = ctx.nodes_at(StructType::Block)[0];
    let dna = ctx.get(block).and_then(FeatureAny::as_block).unwrap();
    assert_eq!(dna.dna.as_ref().map(String::len), Some(1000));
    ctx.release_diff(diff);
}
