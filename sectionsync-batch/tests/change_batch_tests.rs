use pretty_assertions::assert_eq;
use proptest::prelude::*;
use sectionsync_batch::{ChangeBatch, Digest};
use sectionsync_types::{Operation, OperationKind, Record};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq)]
struct Item {
    id: u32,
    rev: u32,
}

impl Record for Item {
    type Id = u32;

    fn id(&self) -> u32 {
        self.id
    }
}

fn item(id: u32, rev: u32) -> Item {
    Item { id, rev }
}

// ── Latest wins per kind ─────────────────────────────────────────

#[test]
fn repeated_insert_keeps_latest_value() {
    let mut batch = ChangeBatch::new();
    batch.insert(item(1, 0));
    batch.insert(item(1, 1));

    let digest = batch.flush();
    assert_eq!(digest.inserted, vec![item(1, 1)]);
}

#[test]
fn repeated_update_keeps_latest_value() {
    let mut batch = ChangeBatch::new();
    batch.update(item(1, 0));
    batch.update(item(1, 5));

    assert_eq!(batch.flush().updated, vec![item(1, 5)]);
}

#[test]
fn output_keeps_first_enqueue_order() {
    let mut batch = ChangeBatch::new();
    batch.insert(item(3, 0));
    batch.insert(item(1, 0));
    batch.insert(item(2, 0));
    batch.insert(item(3, 1));

    let ids: Vec<u32> = batch.flush().inserted.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![3, 1, 2]);
}

// ── Resolution laws ──────────────────────────────────────────────

#[test]
fn insert_then_delete_cancels_out() {
    let mut batch = ChangeBatch::new();
    batch.insert(item(1, 0));
    batch.delete(item(1, 0));

    let digest = batch.flush();
    assert!(digest.is_empty());
}

#[test]
fn delete_then_insert_also_cancels_out() {
    let mut batch = ChangeBatch::new();
    batch.delete(item(1, 0));
    batch.insert(item(1, 1));

    assert!(batch.flush().is_empty());
}

#[test]
fn insert_update_delete_cancels_all_three() {
    let mut batch = ChangeBatch::new();
    batch.insert(item(1, 0));
    batch.update(item(1, 1));
    batch.delete(item(1, 1));

    assert_eq!(batch.flush(), Digest::empty());
}

#[test]
fn insert_then_update_becomes_single_insert_of_newest() {
    let mut batch = ChangeBatch::new();
    batch.insert(item(1, 0));
    batch.update(item(1, 7));

    let digest = batch.flush();
    assert_eq!(digest.inserted, vec![item(1, 7)]);
    assert!(digest.updated.is_empty());
    assert!(digest.deleted.is_empty());
}

#[test]
fn update_then_delete_reports_only_delete() {
    let mut batch = ChangeBatch::new();
    batch.update(item(1, 1));
    batch.delete(item(1, 1));

    let digest = batch.flush();
    assert!(digest.inserted.is_empty());
    assert!(digest.updated.is_empty());
    assert_eq!(digest.deleted, vec![item(1, 1)]);
}

#[test]
fn unrelated_records_are_untouched() {
    let mut batch = ChangeBatch::new();
    batch.insert(item(1, 0));
    batch.update(item(2, 0));
    batch.delete(item(3, 0));

    let digest = batch.flush();
    assert_eq!(digest.inserted, vec![item(1, 0)]);
    assert_eq!(digest.updated, vec![item(2, 0)]);
    assert_eq!(digest.deleted, vec![item(3, 0)]);
    assert_eq!(digest.len(), 3);
}

// ── Lifecycle ────────────────────────────────────────────────────

#[test]
fn flush_empties_the_batch() {
    let mut batch = ChangeBatch::new();
    batch.insert(item(1, 0));
    assert_eq!(batch.pending_len(), 1);

    let _ = batch.flush();
    assert!(batch.is_empty());
    assert!(batch.flush().is_empty());
}

#[test]
fn reset_discards_pending_state() {
    let mut batch = ChangeBatch::new();
    batch.insert(item(1, 0));
    batch.update(item(2, 0));
    batch.reset();

    assert!(batch.is_empty());
    assert!(batch.flush().is_empty());
}

#[test]
fn extend_and_push_route_by_kind() {
    let mut batch = ChangeBatch::new();
    batch.extend(vec![item(1, 0), item(2, 0)], OperationKind::Insert);
    batch.push(Operation::Delete(item(9, 0)));

    let digest = batch.flush();
    assert_eq!(digest.inserted.len(), 2);
    assert_eq!(digest.deleted, vec![item(9, 0)]);
}

#[test]
fn digest_inserting_helper() {
    let digest = Digest::inserting(vec![item(1, 0)]);
    assert_eq!(digest.len(), 1);
    assert!(!digest.is_empty());
    assert!(Digest::<Item>::default().is_empty());
}

// ── Properties ───────────────────────────────────────────────────

fn op_strategy() -> impl Strategy<Value = Operation<Item>> {
    (0u32..6, 0u32..100, 0u8..3).prop_map(|(id, rev, kind)| match kind {
        0 => Operation::Insert(item(id, rev)),
        1 => Operation::Update(item(id, rev)),
        _ => Operation::Delete(item(id, rev)),
    })
}

/// Expected net effect for one identity, from the resolution rules.
fn expected(ops: &[Operation<Item>]) -> HashMap<u32, (OperationKind, u32)> {
    let mut latest: HashMap<(u32, OperationKind), u32> = HashMap::new();
    let mut ids = HashSet::new();
    for op in ops {
        ids.insert(op.id());
        latest.insert((op.id(), op.kind()), op.record().rev);
    }

    let mut out = HashMap::new();
    for id in ids {
        let ins = latest.get(&(id, OperationKind::Insert));
        let upd = latest.get(&(id, OperationKind::Update));
        let del = latest.get(&(id, OperationKind::Delete));
        match (ins, upd, del) {
            (Some(_), _, Some(_)) => {}
            (Some(i), u, None) => {
                out.insert(id, (OperationKind::Insert, *u.unwrap_or(i)));
            }
            (None, _, Some(d)) => {
                out.insert(id, (OperationKind::Delete, *d));
            }
            (None, Some(u), None) => {
                out.insert(id, (OperationKind::Update, *u));
            }
            (None, None, None) => {}
        }
    }
    out
}

proptest! {
    #[test]
    fn flush_matches_resolution_rules(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut batch = ChangeBatch::new();
        for op in ops.clone() {
            batch.push(op);
        }
        let digest = batch.flush();

        let mut actual = HashMap::new();
        for r in &digest.inserted {
            prop_assert!(actual.insert(r.id, (OperationKind::Insert, r.rev)).is_none());
        }
        for r in &digest.updated {
            prop_assert!(actual.insert(r.id, (OperationKind::Update, r.rev)).is_none());
        }
        for r in &digest.deleted {
            prop_assert!(actual.insert(r.id, (OperationKind::Delete, r.rev)).is_none());
        }

        prop_assert_eq!(actual, expected(&ops));
    }
}
