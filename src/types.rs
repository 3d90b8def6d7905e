//! Core data types for the a11y-snapshot crate.
//!
//! This module defines the output side of a traversal:
//! - `NodeRecord`: one node of the snapshot document, nested under `children`
//! - `SnapshotDocument`: the envelope around a captured tree
//! - `Bounds`, `RangeInfoRecord`, `CollectionInfo`, `CollectionItemInfo`, `ActionDescriptor`
//! - `SnapshotError` / `NodeError`: error types for callers and host implementations

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

/// A rectangle given by its four integer edges.
///
/// Values are passed through from the host unchanged, so zero-area and
/// inverted rectangles are representable.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Bounds {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// Progress/slider range, normalized to `f64`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RangeInfoRecord {
    #[serde(rename = "type")]
    pub range_type: i32,
    pub min: f64,
    pub max: f64,
    pub current: f64,
}

/// Collection (list/grid) metadata.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionInfo {
    pub row_count: i32,
    pub column_count: i32,
    #[serde(rename = "isHierarchical")]
    pub hierarchical: bool,
    pub selection_mode: i32,
}

/// Position of an item inside its collection.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionItemInfo {
    pub row_index: i32,
    pub row_span: i32,
    pub column_index: i32,
    pub column_span: i32,
    #[serde(rename = "isHeading")]
    pub heading: bool,
    #[serde(rename = "isSelected")]
    pub selected: bool,
}

/// One action a node supports.
///
/// `name` is derived from the action table in [`crate::actions`]; unknown ids
/// still get a stable name built from the id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionDescriptor {
    pub id: i32,
    pub label: Option<String>,
    pub name: String,
}

/// One node of a snapshot document.
///
/// Always-present fields are plain values. Fields gated by platform version
/// or by node content are `Option`s and are left out of the JSON when `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    // Identification and text
    pub resource_id: String,
    pub class_name: String,
    pub package_name: String,
    pub text: String,
    pub content_description: String,
    pub error: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pane_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_title: Option<String>,

    // Geometry
    pub bounds_in_screen: Bounds,
    pub bounds_in_parent: Bounds,

    // States
    pub is_clickable: bool,
    pub is_long_clickable: bool,
    pub is_context_clickable: bool,
    pub is_focusable: bool,
    pub is_focused: bool,
    pub is_accessibility_focused: bool,
    pub is_selected: bool,
    pub is_checkable: bool,
    pub is_checked: bool,
    pub is_enabled: bool,
    pub is_visible_to_user: bool,
    pub is_editable: bool,
    pub is_password: bool,
    pub is_showing_hint_text: bool,
    pub is_scrollable: bool,
    pub is_dismissable: bool,
    pub is_multi_line: bool,
    pub is_important_for_accessibility: bool,
    pub is_screen_reader_focusable: bool,
    pub is_heading: bool,
    pub is_text_selectable: bool,

    // Numbers
    pub input_type: i32,
    pub live_region: i32,
    pub window_id: i32,
    pub drawing_order: i32,
    pub max_text_length: i32,
    pub movement_granularities: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_selection_start: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_selection_end: Option<i32>,
    pub child_count: usize,

    pub action_list: Vec<ActionDescriptor>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_info: Option<RangeInfoRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_info: Option<CollectionInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_item_info: Option<CollectionItemInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_touch_delegate: Option<bool>,

    // Relation presence only, never the related node
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_label_for: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_labeled_by: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_traversal_before: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_traversal_after: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Map<String, Value>>,

    /// Set when the depth or fan-out ceiling cut this node's children short.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,

    #[serde(default)]
    pub children: Vec<NodeRecord>,
}

impl NodeRecord {
    /// Number of records in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(NodeRecord::node_count).sum::<usize>()
    }

    /// Number of records in this subtree marked as truncated.
    pub fn truncated_count(&self) -> usize {
        usize::from(self.truncated)
            + self
                .children
                .iter()
                .map(NodeRecord::truncated_count)
                .sum::<usize>()
    }

    /// Convert the record into a `serde_json::Value` tree.
    pub fn to_json(&self) -> Result<Value, SnapshotError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// A captured tree plus the metadata needed to store or ship it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDocument {
    /// Unique snapshot identifier (UUID v4)
    pub snapshot_id: String,

    /// Unix timestamp of the capture
    pub captured_at: i64,

    /// Platform version the capability set was resolved for, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_version: Option<u32>,

    pub node_count: usize,
    pub truncated_count: usize,

    /// SHA-256 of the serialized root record
    pub content_hash: String,

    pub root: NodeRecord,
}

impl SnapshotDocument {
    /// Wrap a serialized tree in a new envelope stamped with the current time.
    pub fn new(root: NodeRecord, platform_version: Option<u32>) -> Result<Self, SnapshotError> {
        let json = serde_json::to_string(&root)?;

        Ok(SnapshotDocument {
            snapshot_id: generate_snapshot_id(),
            captured_at: chrono::Utc::now().timestamp(),
            platform_version,
            node_count: root.node_count(),
            truncated_count: root.truncated_count(),
            content_hash: generate_content_hash(&json),
            root,
        })
    }
}

/// Generate a unique snapshot identifier using UUID v4.
///
/// # Example
///
/// ```
/// use a11y_snapshot::types::generate_snapshot_id;
///
/// let id = generate_snapshot_id();
/// assert_eq!(id.len(), 36);
/// assert_ne!(id, generate_snapshot_id());
/// ```
pub fn generate_snapshot_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a SHA-256 hash of the given content as lowercase hex.
///
/// Two captures of an unchanged tree hash identically, which lets storage
/// layers dedupe snapshots without comparing whole documents.
///
/// # Example
///
/// ```
/// use a11y_snapshot::types::generate_content_hash;
///
/// let hash = generate_content_hash("{}");
/// assert_eq!(hash.len(), 64);
/// assert_eq!(hash, generate_content_hash("{}"));
/// ```
pub fn generate_content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    format!("{:x}", result)
}

/// Errors visible to callers of the serializer.
///
/// Per-node problems never surface here: they degrade to defaults or omitted
/// keys inside the record.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The host could not supply a root node
    #[error("Root node unavailable")]
    RootUnavailable,

    /// The finished document could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors a host returns when reading one attribute of a node.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NodeError {
    /// The attribute does not exist for this node kind
    #[error("Attribute not supported: {0}")]
    Unsupported(String),

    /// The underlying handle is no longer valid
    #[error("Node handle is stale")]
    Stale,

    /// Any other host-side failure
    #[error("Host error: {0}")]
    Host(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn leaf(text: &str) -> NodeRecord {
        NodeRecord {
            text: text.to_string(),
            ..NodeRecord::default()
        }
    }

    // ============================================================================
    // NodeRecord serialization
    // ============================================================================

    #[test]
    fn test_default_record_emits_blank_strings_and_empty_children() {
        let json = leaf("").to_json().unwrap();

        for key in [
            "resourceId",
            "className",
            "packageName",
            "text",
            "contentDescription",
            "error",
        ] {
            assert_eq!(json[key], Value::String(String::new()), "key {}", key);
        }
        assert_eq!(json["children"], Value::Array(vec![]));
        assert_eq!(json["actionList"], Value::Array(vec![]));
    }

    #[test]
    fn test_none_fields_are_omitted() {
        let json = serde_json::to_string(&leaf("x")).unwrap();

        assert!(!json.contains("\"hintText\""));
        assert!(!json.contains("\"containerTitle\""));
        assert!(!json.contains("\"rangeInfo\""));
        assert!(!json.contains("\"extras\""));
        assert!(!json.contains("\"textSelectionStart\""));
        assert!(!json.contains("\"hasLabelFor\""));
        assert!(!json.contains("\"truncated\""));
    }

    #[test]
    fn test_structured_field_names() {
        let record = NodeRecord {
            bounds_in_screen: Bounds::new(1, 2, 3, 4),
            range_info: Some(RangeInfoRecord {
                range_type: 1,
                min: 0.0,
                max: 1.0,
                current: 0.5,
            }),
            collection_info: Some(CollectionInfo {
                row_count: 3,
                column_count: 1,
                hierarchical: false,
                selection_mode: 0,
            }),
            collection_item_info: Some(CollectionItemInfo {
                row_index: 2,
                row_span: 1,
                column_index: 0,
                column_span: 1,
                heading: true,
                selected: false,
            }),
            truncated: true,
            ..NodeRecord::default()
        };

        let json = record.to_json().unwrap();

        assert_eq!(
            json["boundsInScreen"],
            serde_json::json!({"left": 1, "top": 2, "right": 3, "bottom": 4})
        );
        assert_eq!(
            json["rangeInfo"],
            serde_json::json!({"type": 1, "min": 0.0, "max": 1.0, "current": 0.5})
        );
        assert_eq!(
            json["collectionInfo"],
            serde_json::json!({
                "rowCount": 3, "columnCount": 1, "isHierarchical": false, "selectionMode": 0
            })
        );
        assert_eq!(
            json["collectionItemInfo"],
            serde_json::json!({
                "rowIndex": 2, "rowSpan": 1, "columnIndex": 0, "columnSpan": 1,
                "isHeading": true, "isSelected": false
            })
        );
        assert_eq!(json["truncated"], Value::Bool(true));
        assert_eq!(json["isClickable"], Value::Bool(false));
    }

    #[test]
    fn test_record_roundtrip() {
        let mut root = leaf("root");
        root.children = vec![leaf("a"), leaf("b")];
        root.hint_text = Some("hint".to_string());

        let json = serde_json::to_string(&root).unwrap();
        let back: NodeRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(root, back);
    }

    #[test]
    fn test_node_and_truncated_counts() {
        let mut child = leaf("child");
        child.truncated = true;
        child.children = vec![leaf("grandchild")];
        let mut root = leaf("root");
        root.children = vec![child, leaf("other")];

        assert_eq!(root.node_count(), 4);
        assert_eq!(root.truncated_count(), 1);
    }

    // ============================================================================
    // SnapshotDocument
    // ============================================================================

    #[test]
    fn test_snapshot_document_envelope() {
        let mut root = leaf("root");
        root.children = vec![leaf("a")];

        let doc = SnapshotDocument::new(root.clone(), Some(34)).unwrap();

        assert_eq!(doc.node_count, 2);
        assert_eq!(doc.truncated_count, 0);
        assert_eq!(doc.platform_version, Some(34));
        assert_eq!(doc.snapshot_id.len(), 36);
        assert_eq!(
            doc.content_hash,
            generate_content_hash(&serde_json::to_string(&root).unwrap())
        );

        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("snapshotId").is_some());
        assert!(json.get("capturedAt").is_some());
        assert!(json.get("contentHash").is_some());
        assert_eq!(json["root"]["children"][0]["text"], "a");
    }

    #[test]
    fn test_identical_trees_hash_identically() {
        let a = SnapshotDocument::new(leaf("same"), None).unwrap();
        let b = SnapshotDocument::new(leaf("same"), None).unwrap();

        assert_eq!(a.content_hash, b.content_hash);
        assert_ne!(a.snapshot_id, b.snapshot_id);
    }

    // ============================================================================
    // Errors
    // ============================================================================

    #[test]
    fn test_error_display() {
        assert_eq!(
            SnapshotError::RootUnavailable.to_string(),
            "Root node unavailable"
        );
        assert_eq!(
            NodeError::Unsupported("hintText".into()).to_string(),
            "Attribute not supported: hintText"
        );
        assert_eq!(NodeError::Stale.to_string(), "Node handle is stale");
    }

    proptest! {
        #[test]
        fn prop_content_hash_is_hex_sha256(content in ".*") {
            let hash = generate_content_hash(&content);
            prop_assert_eq!(hash.len(), 64);
            prop_assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        }

        #[test]
        fn prop_bounds_pass_through(l in any::<i32>(), t in any::<i32>(), r in any::<i32>(), b in any::<i32>()) {
            let bounds = Bounds::new(l, t, r, b);
            let json = serde_json::to_value(bounds).unwrap();
            let back: Bounds = serde_json::from_value(json).unwrap();
            prop_assert_eq!(bounds, back);
        }
    }
}
