use super::*;
use std::str::FromStr;
use uuid::Uuid;

#[test]
fn test_typed_id_creation() {
    let id = WorkItemId::new();
    assert!(!id.to_string().is_empty());
}

#[test]
fn test_typed_id_from_uuid() {
    let uuid = Uuid::new_v4();
    let id = WorkItemId::from_uuid(uuid);
    assert_eq!(id.into_inner(), uuid);
}

#[test]
fn test_typed_id_default_is_unique() {
    assert_ne!(BudgetSourceId::default(), BudgetSourceId::default());
}

#[test]
fn test_typed_id_display() {
    let uuid = Uuid::new_v4();
    let id = BudgetSourceId::from_uuid(uuid);
    assert_eq!(format!("{id}"), uuid.to_string());
}

#[test]
fn test_typed_id_from_str() {
    let uuid = Uuid::new_v4();
    let id = WorkItemId::from_str(&uuid.to_string()).unwrap();
    assert_eq!(id.into_inner(), uuid);
}

#[test]
fn test_typed_id_from_str_error() {
    assert!(WorkItemId::from_str("invalid").is_err());
}

#[test]
fn test_typed_id_order_matches_string_order() {
    let mut ids: Vec<WorkItemId> = (0..20).map(|_| WorkItemId::from_uuid(Uuid::new_v4())).collect();
    let mut as_strings: Vec<String> = ids.iter().map(ToString::to_string).collect();

    ids.sort();
    as_strings.sort();

    let sorted: Vec<String> = ids.iter().map(ToString::to_string).collect();
    assert_eq!(sorted, as_strings);
}
