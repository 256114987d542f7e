use super::*;
use crate::gateway::{FieldSpec, ModuleItem};
use crate::pipeline::ResetOutcome;
use serde_json::json;

fn flags() -> ResultSet {
    let mut rs = ResultSet::new();
    rs.insert("alice", AttributeValue::Flag(true));
    rs.insert("bob", AttributeValue::error("user bob not found"));
    rs.insert("carol", AttributeValue::Flag(false));
    rs
}

#[test]
fn generic_uses_operation_labels() {
    let f = formatter_for(Operation::Active { lockout_aware: false });
    assert_eq!(f.format(&flags()), "alice: Active\nbob: error: user bob not found\ncarol: Inactive");
    let f = formatter_for(Operation::Abroad);
    assert!(f.format(&flags()).starts_with("alice: Abroad\n"));
}

#[test]
fn list_formatter_joins_with_semicolons() {
    let mut rs = ResultSet::new();
    rs.insert("alice", AttributeValue::List(vec!["Chemistry".into(), "Physics".into()]));
    rs.insert("bob", AttributeValue::List(Vec::new()));
    assert_eq!(ListFormatter.format(&rs), "alice:Chemistry;Physics\nbob:None");
}

#[test]
fn reset_formatter_extracts_password() {
    let msg = "Reset done<br><br><b>first</b><br><br><b>Tiger-Lamp-42</b> please copy";
    assert_eq!(reset_password_value(msg), "Tiger-Lamp-42");

    let mut rs = ResultSet::new();
    rs.insert(
        "alice",
        AttributeValue::Reset(ResetOutcome { success_message: Some(msg.into()), description: None, error: None }),
    );
    rs.insert(
        "bob",
        AttributeValue::Reset(ResetOutcome { success_message: None, description: None, error: Some("denied".into()) }),
    );
    rs.insert("carol", AttributeValue::Reset(ResetOutcome::default()));
    assert_eq!(
        ResetFormatter.format(&rs),
        "alice: Password reset to 'Tiger-Lamp-42'\nbob: denied\ncarol: Unknown error occurred"
    );
}

#[test]
fn search_formatter_one_line_per_record() {
    let mut rs = ResultSet::new();
    rs.insert(
        "alice",
        AttributeValue::Records(vec![
            json!({"firstName": "Alice", "lastName": "Smith", "userNames": ["alice", "asmith"], "XID": ""}),
            json!({"firstName": "Alicia", "CUID": "C1"}),
        ]),
    );
    rs.insert("zed", AttributeValue::Records(Vec::new()));
    let text = SearchFormatter.format(&rs);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "alice | firstName: Alice | lastName: Smith | userNames: alice, asmith");
    assert_eq!(lines[1], "alice | firstName: Alicia | CUID: C1");
    assert_eq!(lines[2], "zed | No results");
}

#[test]
fn module_and_history_rendering() {
    assert_eq!(format_module(&ModuleResult::default()), "No data found.");
    let mut item = ModuleItem::default();
    item.data.insert("label".into(), json!("alice"));
    item.data.insert("empty".into(), json!(""));
    item.properties.fields = vec![
        FieldSpec { id: "label".into(), label: Some("Username".into()) },
        FieldSpec { id: "empty".into(), label: None },
    ];
    assert_eq!(format_module(&ModuleResult { items: vec![item] }), "Username: alice");

    assert_eq!(format_history(&[]), "No vault history found.");
    let entries: Vec<HistoryEntry> = (0..12)
        .map(|i| HistoryEntry { datetime: Some(format!("t{i}")), operation: Some("modify".into()), name: None, reason: None })
        .collect();
    let text = format_history(&entries);
    assert!(text.starts_with("[t0] modify N/A\n  Reason: N/A"));
    assert_eq!(text.matches("Reason:").count(), HISTORY_LIMIT);
}

#[test]
fn sink_selection() {
    assert_eq!(select_sinks(None, None), vec![Sink::Console(PrintMode::Plain)]);
    let file = FileTarget::Structured(PathBuf::from("out.json"));
    assert_eq!(select_sinks(None, Some(file.clone())), vec![Sink::File(file.clone())]);
    assert_eq!(
        select_sinks(Some(PrintMode::Raw), Some(file.clone())),
        vec![Sink::File(file), Sink::Console(PrintMode::Raw)]
    );
}

#[test]
fn console_structured_is_indented_json() {
    let mut out = Vec::new();
    let f = formatter_for(Operation::Lockout);
    emit_to(&flags(), &[Sink::Console(PrintMode::Structured)], f.as_ref(), &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("{\n  \"alice\": true,"));
    let v: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(v["bob"], json!({"error": "user bob not found"}));
}

#[test]
fn table_fits_width_and_counts_rows() {
    let cols = vec!["name".to_string(), "value".to_string()];
    let rows = vec![vec!["alice".to_string(), "x".repeat(200)]];
    let text = render_table(&cols, &rows, 40);
    assert!(text.lines().all(|l| visible_len(l) <= 40));
    assert!(text.ends_with("rows: 1"));
    assert_eq!(visible_len("\x1b[32mhead\x1b[0m"), 4);
}
