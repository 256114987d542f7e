use super::*;
use serde_json::json;

fn sample() -> ResultSet {
    let mut rs = ResultSet::new();
    rs.insert("alice", AttributeValue::Flag(true));
    rs.insert("bob", AttributeValue::error("user bob not found"));
    rs.insert("carol", AttributeValue::Flag(false));
    rs.insert("dave", AttributeValue::Text("Succeeded".into()));
    rs
}

#[test]
fn result_set_keeps_insertion_order() {
    let rs = sample();
    assert_eq!(rs.keys().collect::<Vec<_>>(), vec!["alice", "bob", "carol", "dave"]);
    assert_eq!(rs.len(), 4);
    assert_eq!(rs.error_count(), 1);
}

#[test]
fn duplicate_key_overwrites_in_place() {
    let mut rs = sample();
    rs.insert("alice", AttributeValue::Flag(false));
    assert_eq!(rs.len(), 4);
    assert_eq!(rs.keys().next(), Some("alice"));
    assert_eq!(rs.get("alice"), Some(&AttributeValue::Flag(false)));
}

#[test]
fn retain_rebuilds_lookup() {
    let mut rs = sample();
    rs.retain(|k, _| k != "alice");
    assert_eq!(rs.get("carol"), Some(&AttributeValue::Flag(false)));
    assert!(rs.get("alice").is_none());
    rs.insert("erin", AttributeValue::Flag(true));
    assert_eq!(rs.keys().last(), Some("erin"));
}

#[test]
fn serializes_raw_values_in_order() {
    let mut rs = sample();
    rs.insert("erin", AttributeValue::List(vec!["Chemistry".into(), "Physics".into()]));
    rs.insert(
        "frank",
        AttributeValue::Reset(ResetOutcome { success_message: None, description: Some("d".into()), error: Some("failed".into()) }),
    );
    let text = serde_json::to_string(&rs).unwrap();
    assert!(text.starts_with("{\"alice\":true,\"bob\":{\"error\":\"user bob not found\"}"));
    let v: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(v["erin"], json!(["Chemistry", "Physics"]));
    assert_eq!(v["frank"], json!({"SuccessMessage": null, "description": "d", "error": "failed"}));
}

#[test]
fn filter_all_is_noop() {
    let rs = sample();
    assert_eq!(apply(rs.clone(), Filter::All), rs);
}

#[test]
fn non_all_filters_keep_only_matching_flags() {
    let active = apply(sample(), Filter::Is(true));
    assert_eq!(active.keys().collect::<Vec<_>>(), vec!["alice"]);
    let inactive = apply(sample(), Filter::Is(false));
    assert_eq!(inactive.keys().collect::<Vec<_>>(), vec!["carol"]);
    for f in [Filter::Is(true), Filter::Is(false)] {
        assert!(apply(sample(), f).iter().all(|(_, v)| v.as_flag().is_some()));
    }
}

#[test]
fn filter_labels_per_operation() {
    let active = Operation::Active { lockout_aware: false };
    assert_eq!(Filter::from_label(active, "all").unwrap(), Filter::All);
    assert_eq!(Filter::from_label(active, "Active").unwrap(), Filter::Is(true));
    assert_eq!(Filter::from_label(active, "inactive").unwrap(), Filter::Is(false));
    assert_eq!(Filter::from_label(Operation::Lockout, "locked").unwrap(), Filter::Is(true));
    assert_eq!(Filter::from_label(Operation::Abroad, "local").unwrap(), Filter::Is(false));
    assert!(Filter::from_label(Operation::Abroad, "locked").is_err());
    assert!(Filter::from_label(Operation::Department, "active").is_err());
    assert_eq!(Filter::from_label(Operation::Department, "all").unwrap(), Filter::All);
}
