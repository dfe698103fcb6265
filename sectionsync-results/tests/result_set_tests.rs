mod common;

use common::{ids, row, section_ids, sectioned, Row};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use sectionsync_batch::{ChangeBatch, Digest};
use sectionsync_results::{ApplyStats, Configuration, SectionInfo, SectionedResultSet};
use sectionsync_types::IndexPath;
use std::collections::HashSet;

fn inserting(rows: Vec<Row>) -> Digest<Row> {
    Digest::inserting(rows)
}

fn deleting(rows: Vec<Row>) -> Digest<Row> {
    Digest {
        deleted: rows,
        ..Digest::empty()
    }
}

fn updating(rows: Vec<Row>) -> Digest<Row> {
    Digest {
        updated: rows,
        ..Digest::empty()
    }
}

// ── Defaults ─────────────────────────────────────────────────────

#[test]
fn default_configuration_keeps_insertion_order_in_one_unnamed_section() {
    let mut set = SectionedResultSet::new(Configuration::new());
    set.apply(&inserting(vec![row(3, "x", 9), row(1, "y", 1), row(2, "z", 5)]), 0);

    assert_eq!(ids(&set), vec![3, 1, 2]);
    assert_eq!(set.sections().len(), 1);
    assert_eq!(set.sections()[0].key(), "");
}

#[test]
fn empty_set_has_no_sections() {
    let set = SectionedResultSet::<Row>::new(sectioned());
    assert!(set.is_empty());
    assert!(set.sections().is_empty());
    assert_eq!(set.object(IndexPath::new(0, 0)), None);
}

// ── Sectioning & ordering ────────────────────────────────────────

#[test]
fn three_a_and_two_b_make_two_sections_in_key_order() {
    let mut batch = ChangeBatch::new();
    batch.insert(row(1, "B", 2));
    batch.insert(row(2, "A", 3));
    batch.insert(row(3, "A", 1));
    batch.insert(row(4, "B", 1));
    batch.insert(row(5, "A", 2));

    let mut set = SectionedResultSet::new(sectioned());
    set.apply(&batch.flush(), 0);

    assert_eq!(
        set.section_infos(),
        vec![
            SectionInfo {
                name: "A".into(),
                number_of_objects: 3
            },
            SectionInfo {
                name: "B".into(),
                number_of_objects: 2
            },
        ]
    );
    assert_eq!(ids(&set), vec![3, 5, 2, 4, 1]);
}

#[test]
fn equal_ranks_keep_insertion_order() {
    let mut set = SectionedResultSet::new(sectioned());
    set.apply(&inserting(vec![row(1, "A", 5), row(2, "A", 5)]), 0);
    set.apply(&inserting(vec![row(3, "A", 5)]), 0);

    assert_eq!(ids(&set), vec![1, 2, 3]);
}

#[test]
fn flat_order_is_section_order_then_record_order() {
    let config = sectioned();
    assert!(config.flat_precedes(&row(1, "A", 9), &row(2, "B", 0)));
    assert!(config.flat_precedes(&row(1, "B", 1), &row(2, "B", 2)));
    assert!(!config.flat_precedes(&row(1, "B", 2), &row(2, "B", 2)));
    assert!(!config.flat_precedes(&row(1, "C", 0), &row(2, "B", 5)));
}

#[test]
fn custom_section_order() {
    let config = sectioned().with_section_order(|a, b| a > b);
    let mut set = SectionedResultSet::new(config);
    set.apply(&inserting(vec![row(1, "A", 1), row(2, "C", 1), row(3, "B", 1)]), 0);

    assert_eq!(set.section_keys(), vec!["C", "B", "A"]);
    assert_eq!(ids(&set), vec![2, 3, 1]);
}

#[test]
fn filter_rejects_records() {
    let config = sectioned().with_filter(|r: &Row| r.rank >= 0);
    let mut set = SectionedResultSet::new(config);
    let stats = set.apply(&inserting(vec![row(1, "A", 1), row(2, "A", -1)]), 0);

    assert_eq!(ids(&set), vec![1]);
    assert_eq!(stats.filtered, 1);
    assert_eq!(stats.inserted, 1);
}

// ── Replace semantics ────────────────────────────────────────────

#[test]
fn inserting_same_identity_twice_keeps_later_value() {
    let mut set = SectionedResultSet::new(sectioned());
    set.apply(&inserting(vec![row(1, "A", 1)]), 0);
    set.apply(&inserting(vec![row(1, "B", 7)]), 0);

    assert_eq!(set.len(), 1);
    assert_eq!(set.flat()[0], row(1, "B", 7));
    assert_eq!(set.section_keys(), vec!["B"]);
}

#[test]
fn update_can_move_record_to_another_section() {
    let mut set = SectionedResultSet::from_records(
        sectioned(),
        vec![row(1, "A", 1), row(2, "A", 2), row(3, "B", 1)],
    );
    let stats = set.apply(&updating(vec![row(2, "B", 2)]), 0);

    assert_eq!(
        stats,
        ApplyStats {
            inserted: 1,
            removed: 1,
            filtered: 0,
            truncated: 0
        }
    );
    assert_eq!(
        section_ids(&set),
        vec![("A".into(), vec![1]), ("B".into(), vec![3, 2])]
    );
}

#[test]
fn update_that_fails_filter_removes_record() {
    let config = sectioned().with_filter(|r: &Row| r.rank >= 0);
    let mut set = SectionedResultSet::from_records(config, vec![row(1, "A", 1)]);
    set.apply(&updating(vec![row(1, "A", -5)]), 0);

    assert!(set.is_empty());
}

#[test]
fn delete_drops_empty_section() {
    let mut set =
        SectionedResultSet::from_records(sectioned(), vec![row(1, "A", 1), row(2, "B", 1)]);
    let stats = set.apply(&deleting(vec![row(1, "A", 1)]), 0);

    assert_eq!(stats.removed, 1);
    assert_eq!(set.section_keys(), vec!["B"]);
}

#[test]
fn delete_of_unknown_record_is_noop() {
    let mut set = SectionedResultSet::from_records(sectioned(), vec![row(1, "A", 1)]);
    let stats = set.apply(&deleting(vec![row(99, "A", 1)]), 0);

    assert_eq!(stats.removed, 0);
    assert_eq!(ids(&set), vec![1]);
}

#[test]
fn delete_matches_by_identity_not_content() {
    let mut set = SectionedResultSet::from_records(sectioned(), vec![row(1, "A", 1)]);
    set.apply(&deleting(vec![row(1, "Z", 100)]), 0);

    assert!(set.is_empty());
}

// ── Limit ────────────────────────────────────────────────────────

#[test]
fn limit_keeps_first_records_in_global_order() {
    let mut set = SectionedResultSet::new(sectioned());
    let stats = set.apply(
        &inserting(vec![
            row(1, "B", 1),
            row(2, "A", 2),
            row(3, "A", 1),
            row(4, "C", 1),
        ]),
        2,
    );

    assert_eq!(ids(&set), vec![3, 2]);
    assert_eq!(stats.truncated, 2);
    assert_eq!(set.section_keys(), vec!["A"]);
}

#[test]
fn limit_boundary_is_exact() {
    let mut set = SectionedResultSet::new(sectioned());
    set.apply(&inserting(vec![row(1, "A", 1), row(2, "A", 2), row(3, "A", 3)]), 3);
    assert_eq!(set.len(), 3);

    set.apply(&inserting(vec![row(4, "A", 0)]), 3);
    assert_eq!(ids(&set), vec![4, 1, 2]);
}

#[test]
fn zero_limit_means_unlimited() {
    let mut set = SectionedResultSet::new(sectioned());
    let rows = (0..50).map(|i| row(i, "A", i as i32)).collect();
    let stats = set.apply(&inserting(rows), 0);

    assert_eq!(set.len(), 50);
    assert_eq!(stats.truncated, 0);
}

// ── Lookups ──────────────────────────────────────────────────────

#[test]
fn section_index_and_offset() {
    let set = SectionedResultSet::from_records(
        sectioned(),
        vec![row(1, "A", 1), row(2, "A", 2), row(3, "B", 1), row(4, "C", 1)],
    );

    let b = row(3, "B", 1);
    assert_eq!(set.section_index(&b), Some(1));
    assert_eq!(set.section_offset(&b), Some(2));
    assert_eq!(set.section_offset(&row(4, "C", 1)), Some(3));
    assert_eq!(set.section_index(&row(99, "Q", 0)), None);
}

#[test]
fn caches_follow_mutation() {
    let mut set =
        SectionedResultSet::from_records(sectioned(), vec![row(1, "B", 1), row(2, "C", 1)]);
    assert_eq!(set.section_offset(&row(2, "C", 1)), Some(1));

    set.apply(&inserting(vec![row(3, "A", 1), row(4, "A", 2)]), 0);
    assert_eq!(set.section_index(&row(2, "C", 1)), Some(2));
    assert_eq!(set.section_offset(&row(2, "C", 1)), Some(3));
}

#[test]
fn index_path_and_object_agree() {
    let set = SectionedResultSet::from_records(
        sectioned(),
        vec![row(1, "A", 1), row(2, "B", 2), row(3, "B", 1)],
    );

    let path = set.index_path(&row(2, "ignored", 0)).unwrap();
    assert_eq!(path, IndexPath::new(1, 1));
    assert_eq!(set.object(path).map(|r| r.id), Some(2));
    assert_eq!(set.index_path_at(2), Some(path));
    assert_eq!(set.index_path(&row(42, "A", 0)), None);
    assert_eq!(set.object(IndexPath::new(1, 5)), None);
}

#[test]
fn clone_is_independent() {
    let original = SectionedResultSet::from_records(sectioned(), vec![row(1, "A", 1)]);
    let mut copy = original.clone();
    copy.apply(&inserting(vec![row(2, "A", 2)]), 0);

    assert_eq!(ids(&original), vec![1]);
    assert_eq!(ids(&copy), vec![1, 2]);
    assert!(copy.empty_like().is_empty());
}

// ── Properties ───────────────────────────────────────────────────

fn row_strategy() -> impl Strategy<Value = Row> {
    (0u32..20, prop::sample::select(vec!["a", "b", "c", "d"]), -5i32..20)
        .prop_map(|(id, section, rank)| row(id, section, rank))
}

fn digest_strategy() -> impl Strategy<Value = Digest<Row>> {
    prop::collection::vec((row_strategy(), 0u8..3), 0..15).prop_map(|ops| {
        let mut batch = ChangeBatch::new();
        for (r, kind) in ops {
            match kind {
                0 => batch.insert(r),
                1 => batch.update(r),
                _ => batch.delete(r),
            }
        }
        batch.flush()
    })
}

fn assert_invariants(set: &SectionedResultSet<Row>) -> Result<(), TestCaseError> {
    let mut seen = HashSet::new();
    for r in set.flat() {
        prop_assert!(seen.insert(r.id), "duplicate id {}", r.id);
        prop_assert!(r.rank != 13, "filtered record present");
    }

    let keys = set.section_keys();
    for pair in keys.windows(2) {
        prop_assert!(pair[0] < pair[1]);
    }

    let mut concatenated = Vec::new();
    for section in set.sections() {
        prop_assert!(!section.is_empty());
        for pair in section.objects().windows(2) {
            prop_assert!(pair[0].rank <= pair[1].rank);
        }
        for r in section.objects() {
            prop_assert_eq!(&r.section, section.key());
            concatenated.push(r.clone());
        }
    }
    prop_assert_eq!(concatenated.as_slice(), set.flat());

    let config = set.configuration();
    for pair in set.flat().windows(2) {
        prop_assert!(
            !config.flat_precedes(&pair[1], &pair[0]),
            "{:?} sorts before {:?}",
            pair[1],
            pair[0]
        );
    }
    Ok(())
}

proptest! {
    #[test]
    fn ordering_invariants_hold_after_any_digests(
        digests in prop::collection::vec(digest_strategy(), 1..6)
    ) {
        let config = sectioned().with_filter(|r: &Row| r.rank != 13);
        let mut set = SectionedResultSet::new(config);
        for digest in &digests {
            set.apply(digest, 0);
            assert_invariants(&set)?;
        }
    }

    #[test]
    fn limit_truncates_to_global_prefix(
        rows in prop::collection::vec(row_strategy(), 0..30),
        limit in 1usize..12,
    ) {
        let mut unlimited = SectionedResultSet::new(sectioned());
        unlimited.apply(&inserting(rows.clone()), 0);

        let mut limited = SectionedResultSet::new(sectioned());
        limited.apply(&inserting(rows), limit);

        let expected = unlimited.len().min(limit);
        prop_assert_eq!(limited.len(), expected);
        prop_assert_eq!(limited.flat(), &unlimited.flat()[..expected]);
    }
}
