use sectionsync_types::{RecordId, SubscriptionId};
use std::collections::HashSet;
use std::str::FromStr;

// ── RecordId ──────────────────────────────────────────────────────

#[test]
fn record_id_new_is_unique() {
    let a = RecordId::new();
    let b = RecordId::new();
    assert_ne!(a, b);
}

#[test]
fn record_id_from_uuid_roundtrip() {
    let uuid = uuid::Uuid::now_v7();
    let id = RecordId::from_uuid(uuid);
    assert_eq!(id.as_uuid(), uuid);
}

#[test]
fn record_id_display_and_parse() {
    let id = RecordId::new();
    let parsed = RecordId::parse(&id.to_string()).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn record_id_from_str() {
    let id = RecordId::new();
    let parsed = RecordId::from_str(&id.to_string()).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn record_id_parse_invalid() {
    let err = RecordId::parse("not-a-uuid").unwrap_err();
    assert!(err.to_string().starts_with("invalid UUID"));
}

#[test]
fn record_id_is_time_ordered() {
    let a = RecordId::new();
    std::thread::sleep(std::time::Duration::from_millis(2));
    let b = RecordId::new();
    assert!(a < b);
}

#[test]
fn minted_ids_carry_their_creation_time() {
    let before = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64;
    let minted = RecordId::new().minted_at_millis().unwrap();
    assert!(minted + 1 >= before);
    assert!(minted <= before + 60_000);
}

#[test]
fn adopted_v4_ids_have_no_mint_time() {
    let id = RecordId::from_uuid(uuid::Uuid::new_v4());
    assert_eq!(id.minted_at_millis(), None);
}

#[test]
fn from_str_reports_crate_error() {
    let err = "nope".parse::<RecordId>().unwrap_err();
    assert!(matches!(err, sectionsync_types::Error::InvalidUuid(_)));
}

#[test]
fn record_id_hash_and_eq() {
    let id = RecordId::new();
    let mut set = HashSet::new();
    set.insert(id);
    set.insert(id);
    assert_eq!(set.len(), 1);
}

#[test]
fn record_id_serde_is_transparent() {
    let id = RecordId::new();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{id}\""));
}

// ── SubscriptionId ────────────────────────────────────────────────

#[test]
fn subscription_id_next_increments() {
    let id = SubscriptionId::new(7);
    assert_eq!(id.next().get(), 8);
    assert!(id < id.next());
}

#[test]
fn subscription_id_display() {
    assert_eq!(SubscriptionId::from(3).to_string(), "sub#3");
}

#[test]
fn subscription_id_next_wraps() {
    assert_eq!(SubscriptionId::new(u64::MAX).next().get(), 0);
}

// ── Properties ───────────────────────────────────────────────────

mod properties {
    use proptest::prelude::*;
    use sectionsync_types::{IndexPath, SubscriptionId};

    proptest! {
        #[test]
        fn subscription_next_is_strictly_greater(raw in 0u64..u64::MAX) {
            let id = SubscriptionId::new(raw);
            prop_assert!(id.next() > id);
            prop_assert_eq!(id.next().get(), raw + 1);
        }

        #[test]
        fn index_paths_order_by_section_then_row(
            a in (0usize..50, 0usize..50),
            b in (0usize..50, 0usize..50),
        ) {
            let (pa, pb) = (IndexPath::from(a), IndexPath::from(b));
            prop_assert_eq!(pa.cmp(&pb), a.cmp(&b));
        }
    }
}
