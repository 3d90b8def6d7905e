//! End-to-end traversal tests against in-memory trees.
//!
//! These cover the document-level guarantees: blank defaults, child order,
//! handle release balance, extras sanitization, action naming and version
//! gating.

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use a11y_snapshot::fixture::{FixtureNode, FixtureSpec};
use a11y_snapshot::node::{HostAction, NodeFlag, NumericAttribute, TextAttribute};
use a11y_snapshot::types::Bounds;
use a11y_snapshot::{
    serialize_tree, CapabilitySet, NodeError, NodeExtractor, NodeHandle, NodeRecord,
    SnapshotConfig, TreeSerializer,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn fixture(json: Value) -> FixtureNode {
    let spec: FixtureSpec = serde_json::from_value(json).unwrap();
    FixtureNode::root(spec)
}

fn three_node_tree() -> FixtureNode {
    fixture(json!({
        "strings": {"className": "android.widget.LinearLayout"},
        "children": [
            {
                "strings": {"text": "Hello"},
                "numbers": {"textSelectionStart": 2, "textSelectionEnd": 4}
            },
            {
                "strings": {"contentDescription": "icon"},
                "numbers": {"textSelectionStart": 2, "textSelectionEnd": 4}
            }
        ]
    }))
}

fn strip_gated(mut json: Value, keys: &[&str]) -> Value {
    fn strip(value: &mut Value, keys: &[&str]) {
        if let Value::Object(map) = value {
            for key in keys {
                map.remove(*key);
            }
            if let Some(Value::Array(children)) = map.get_mut("children") {
                children.iter_mut().for_each(|child| strip(child, keys));
            }
        }
    }
    strip(&mut json, keys);
    json
}

#[test]
fn test_three_node_round_trip() {
    let root = three_node_tree();
    let record = serialize_tree(&root, 34);
    let json = record.to_json().unwrap();

    assert_eq!(json["children"].as_array().unwrap().len(), 2);

    let textful = &json["children"][0];
    assert_eq!(textful["text"], "Hello");
    assert_eq!(textful["textSelectionStart"], 2);
    assert_eq!(textful["textSelectionEnd"], 4);

    let other = &json["children"][1];
    assert!(other.get("textSelectionStart").is_none());
    assert!(other.get("textSelectionEnd").is_none());
    assert_eq!(other["text"], "");

    assert!(root.ledger().is_balanced());
    assert_eq!(root.ledger().released(), 2);
}

#[test]
fn test_every_node_has_blank_strings_and_children() {
    let root = fixture(json!({"children": [{}, {"children": [{}]}]}));
    let record = serialize_tree(&root, 34);

    fn check(record: &Value) {
        for key in ["resourceId", "className", "packageName", "text", "contentDescription"] {
            assert_eq!(record[key], Value::String(String::new()), "{}", key);
        }
        let children = record["children"].as_array().expect("children always present");
        children.iter().for_each(check);
    }
    check(&record.to_json().unwrap());
}

#[test]
fn test_release_balance_with_null_children() {
    let root = fixture(json!({
        "children": [
            null,
            {"children": [{}, null, {}]},
            null,
            {"children": [null]}
        ]
    }));

    let record = serialize_tree(&root, 34);
    let ledger = root.ledger();

    assert_eq!(record.node_count(), 5);
    assert_eq!(ledger.acquired(), 4);
    assert_eq!(ledger.released(), 4);
    assert_eq!(ledger.outstanding(), 0);
}

#[test]
fn test_extras_keep_supported_and_skip_unconvertible() {
    let root = fixture(json!({
        "strings": {"text": "Compose"},
        "flags": ["isEditable"],
        "extras": {
            "AccessibilityNodeInfo.chipText": "Draft",
            "parcel": {"$opaque": "android.os.Parcel"}
        }
    }));

    let record = serialize_tree(&root, 34);
    let extras = record.extras.as_ref().unwrap();

    assert_eq!(extras.len(), 1);
    assert_eq!(extras["AccessibilityNodeInfo.chipText"], json!("Draft"));
    assert_eq!(record.text, "Compose");
    assert!(record.is_editable);
}

#[test]
fn test_action_names_in_document() {
    let root = fixture(json!({"actions": [{"id": 1}, {"id": 9999}, {"id": 9998}]}));
    let json = serialize_tree(&root, 34).to_json().unwrap();

    let actions = json["actionList"].as_array().unwrap();
    assert_eq!(actions[0], json!({"id": 1, "label": null, "name": "CLICK"}));

    let unknown = actions[1]["name"].as_str().unwrap();
    assert!(unknown.contains("9999"));
    assert_ne!(actions[1]["name"], actions[2]["name"]);
}

#[test]
fn test_version_gating_only_changes_gated_keys() {
    let spec = json!({
        "strings": {
            "text": "Messages",
            "containerTitle": "Inbox",
            "hintText": "Search mail"
        },
        "flags": ["isClickable", "isHeading"],
        "numbers": {"windowId": 4, "drawingOrder": 2}
    });

    let old = serialize_tree(&fixture(spec.clone()), 33).to_json().unwrap();
    let new = serialize_tree(&fixture(spec), 34).to_json().unwrap();

    assert!(old.get("containerTitle").is_none());
    assert_eq!(new["containerTitle"], "Inbox");

    assert_eq!(
        strip_gated(old, &["containerTitle"]),
        strip_gated(new, &["containerTitle"])
    );
}

#[test]
fn test_oldest_platform_reads_only_ungated_attributes() {
    let root = fixture(json!({
        "strings": {"hintText": "Search", "text": "q"},
        "flags": ["isHeading", "isFocusable"],
        "numbers": {"drawingOrder": 3, "windowId": 1},
        "relations": ["labelFor"],
        "touchDelegateRegions": 1
    }));

    let record = serialize_tree(&root, 16);

    assert_eq!(record.hint_text, None);
    assert!(!record.is_heading);
    assert!(record.is_focusable);
    assert_eq!(record.drawing_order, 0);
    assert_eq!(record.window_id, 1);
    assert_eq!(record.has_label_for, None);
    assert_eq!(record.has_touch_delegate, None);
}

#[test]
fn test_failing_reads_degrade_to_minimal_record() {
    let root = fixture(json!({
        "strings": {"text": "x", "className": "Button"},
        "actions": [{"id": 1}],
        "rangeInfo": {"type": 0, "min": 0, "max": 1, "current": 1},
        "extras": {"a": 1},
        "failing": ["text", "actionList", "rangeInfo", "extras", "boundsInScreen", "isClickable"],
        "flags": ["isClickable"],
        "boundsInScreen": {"left": 1, "top": 1, "right": 2, "bottom": 2},
        "children": [{"strings": {"text": "child"}}]
    }));

    let record = serialize_tree(&root, 34);

    assert_eq!(record.text, "");
    assert_eq!(record.class_name, "Button");
    assert!(record.action_list.is_empty());
    assert_eq!(record.range_info, None);
    assert_eq!(record.extras, None);
    assert_eq!(record.bounds_in_screen, Bounds::default());
    assert!(!record.is_clickable);
    assert_eq!(record.children[0].text, "child");
}

#[test]
fn test_capture_sample_fixture() {
    let spec = FixtureSpec::from_json(include_str!("fixtures/sample_tree.json")).unwrap();
    let root = FixtureNode::root(spec);
    let config = SnapshotConfig::default().with_platform_version(34);
    let caps = config.capabilities();

    let doc = TreeSerializer::new(&caps, &config)
        .capture(Some(&root))
        .unwrap();

    assert_eq!(doc.node_count, 3);
    assert_eq!(doc.root.child_count, 3);
    assert_eq!(doc.root.pane_title.as_deref(), Some("Inbox"));

    let slider = &doc.root.children[1];
    let range = slider.range_info.unwrap();
    assert_eq!(range.current, 30.0);
    assert_eq!(slider.has_labeled_by, Some(true));
    assert_eq!(slider.state_description.as_deref(), Some("30 percent"));

    assert!(root.ledger().is_balanced());
}

// ============================================================================
// Release on unwind
// ============================================================================

/// Hand-rolled host whose extraction panics on one chosen node.
struct Exploding {
    id: usize,
    children: usize,
    explode_at: usize,
    acquired: Rc<Cell<usize>>,
    released: Rc<Cell<usize>>,
}

impl NodeHandle for Exploding {
    fn text(&self, attr: TextAttribute) -> Result<Option<String>, NodeError> {
        if self.id == self.explode_at && attr == TextAttribute::Text {
            panic!("host crashed reading node {}", self.id);
        }
        Ok(Some(format!("node {}", self.id)))
    }
    fn flag(&self, _flag: NodeFlag) -> Result<bool, NodeError> {
        Ok(true)
    }
    fn number(&self, attr: NumericAttribute) -> Result<i32, NodeError> {
        Err(NodeError::Unsupported(attr.key().to_string()))
    }
    fn bounds_in_screen(&self) -> Result<Bounds, NodeError> {
        Err(NodeError::Stale)
    }
    fn bounds_in_parent(&self) -> Result<Bounds, NodeError> {
        Err(NodeError::Stale)
    }
    fn actions(&self) -> Result<Vec<HostAction>, NodeError> {
        Ok(vec![HostAction { id: 1, label: None }])
    }
    fn child_count(&self) -> usize {
        self.children
    }
    fn child(&self, index: usize) -> Option<Self> {
        self.acquired.set(self.acquired.get() + 1);
        Some(Exploding {
            id: self.id * 10 + index + 1,
            children: if self.id == 0 { 2 } else { 0 },
            explode_at: self.explode_at,
            acquired: Rc::clone(&self.acquired),
            released: Rc::clone(&self.released),
        })
    }
    fn release(self) {
        self.released.set(self.released.get() + 1);
    }
}

fn exploding_root(explode_at: usize) -> Exploding {
    Exploding {
        id: 0,
        children: 3,
        explode_at,
        acquired: Rc::new(Cell::new(0)),
        released: Rc::new(Cell::new(0)),
    }
}

#[test]
fn test_custom_host_with_failing_reads() {
    let root = exploding_root(usize::MAX);
    let caps = CapabilitySet::resolve(34);
    let config = SnapshotConfig::default();

    let record: NodeRecord = TreeSerializer::new(&caps, &config).serialize(&root);

    assert_eq!(record.node_count(), 10);
    assert_eq!(record.children[1].text, "node 2");
    assert_eq!(record.children[1].children[0].text, "node 21");
    assert_eq!(record.window_id, 0);
    assert!(record.is_heading);
    assert_eq!(root.acquired.get(), 9);
    assert_eq!(root.released.get(), 9);
}

#[test]
fn test_handles_released_when_traversal_unwinds() {
    let root = exploding_root(21);
    let caps = CapabilitySet::resolve(34);
    let config = SnapshotConfig::default();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        TreeSerializer::new(&caps, &config).serialize(&root)
    }));

    assert!(result.is_err());
    assert!(root.acquired.get() > 0);
    assert_eq!(root.acquired.get(), root.released.get());
}

#[test]
fn test_extractor_leaves_node_unreleased() {
    let root = exploding_root(usize::MAX);
    let caps = CapabilitySet::all();

    let record = NodeExtractor::new(&caps).extract(&root);

    assert_eq!(record.text, "node 0");
    assert!(record.children.is_empty());
    assert_eq!(root.acquired.get(), 0);
    assert_eq!(root.released.get(), 0);
}
