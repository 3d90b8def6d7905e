//! Per-node attribute extraction.
//!
//! [`NodeExtractor`] turns one live node into a flat [`NodeRecord`]. It never
//! fails: each attribute is read in isolation, and a failed read only affects
//! its own key.
//!
//! - Always-present strings default to `""`, always-present numbers and flags
//!   to zero/`false`, whether the read failed or the gate is closed.
//! - Gated strings and structured sub-records are omitted when the gate is
//!   closed or the read fails.
//! - Extras are sanitized entry by entry; unconvertible entries are dropped.
//!
//! # Example
//!
//! ```
//! use a11y_snapshot::capabilities::CapabilitySet;
//! use a11y_snapshot::extractor::NodeExtractor;
//! use a11y_snapshot::fixture::{FixtureNode, FixtureSpec};
//!
//! let spec: FixtureSpec = serde_json::from_str(r#"{"strings": {"text": "OK"}}"#).unwrap();
//! let node = FixtureNode::root(spec);
//!
//! let caps = CapabilitySet::resolve(34);
//! let record = NodeExtractor::new(&caps).extract(&node);
//! assert_eq!(record.text, "OK");
//! assert_eq!(record.resource_id, "");
//! ```

use serde_json::{Map, Number, Value};

use crate::actions;
use crate::capabilities::{Capability, CapabilitySet};
use crate::node::{ExtraValue, NodeFlag, NodeHandle, NumericAttribute, Relation, TextAttribute};
use crate::types::{NodeError, NodeRecord, RangeInfoRecord};

/// Extracts node records under a fixed capability set.
#[derive(Debug, Clone, Copy)]
pub struct NodeExtractor<'a> {
    capabilities: &'a CapabilitySet,
}

impl<'a> NodeExtractor<'a> {
    pub fn new(capabilities: &'a CapabilitySet) -> Self {
        NodeExtractor { capabilities }
    }

    /// Build the record for `node`, without its children.
    ///
    /// The node is only read; releasing it stays the caller's job.
    pub fn extract<N: NodeHandle>(&self, node: &N) -> NodeRecord {
        let text = self.string(node, TextAttribute::Text);

        // Selection indices mean nothing without text
        let (text_selection_start, text_selection_end) = if text.is_empty() {
            (None, None)
        } else {
            (
                self.optional_number(node, NumericAttribute::TextSelectionStart),
                self.optional_number(node, NumericAttribute::TextSelectionEnd),
            )
        };

        NodeRecord {
            resource_id: self.string(node, TextAttribute::ResourceId),
            class_name: self.string(node, TextAttribute::ClassName),
            package_name: self.string(node, TextAttribute::PackageName),
            text,
            content_description: self.string(node, TextAttribute::ContentDescription),
            error: self.string(node, TextAttribute::Error),

            hint_text: self.gated_string(node, TextAttribute::HintText),
            state_description: self.gated_string(node, TextAttribute::StateDescription),
            tooltip_text: self.gated_string(node, TextAttribute::TooltipText),
            pane_title: self.gated_string(node, TextAttribute::PaneTitle),
            unique_id: self.gated_string(node, TextAttribute::UniqueId),
            container_title: self.gated_string(node, TextAttribute::ContainerTitle),

            bounds_in_screen: read_or_log("boundsInScreen", node.bounds_in_screen())
                .unwrap_or_default(),
            bounds_in_parent: read_or_log("boundsInParent", node.bounds_in_parent())
                .unwrap_or_default(),

            is_clickable: self.flag(node, NodeFlag::Clickable),
            is_long_clickable: self.flag(node, NodeFlag::LongClickable),
            is_context_clickable: self.flag(node, NodeFlag::ContextClickable),
            is_focusable: self.flag(node, NodeFlag::Focusable),
            is_focused: self.flag(node, NodeFlag::Focused),
            is_accessibility_focused: self.flag(node, NodeFlag::AccessibilityFocused),
            is_selected: self.flag(node, NodeFlag::Selected),
            is_checkable: self.flag(node, NodeFlag::Checkable),
            is_checked: self.flag(node, NodeFlag::Checked),
            is_enabled: self.flag(node, NodeFlag::Enabled),
            is_visible_to_user: self.flag(node, NodeFlag::VisibleToUser),
            is_editable: self.flag(node, NodeFlag::Editable),
            is_password: self.flag(node, NodeFlag::Password),
            is_showing_hint_text: self.flag(node, NodeFlag::ShowingHintText),
            is_scrollable: self.flag(node, NodeFlag::Scrollable),
            is_dismissable: self.flag(node, NodeFlag::Dismissable),
            is_multi_line: self.flag(node, NodeFlag::MultiLine),
            is_important_for_accessibility: self
                .flag(node, NodeFlag::ImportantForAccessibility),
            is_screen_reader_focusable: self.flag(node, NodeFlag::ScreenReaderFocusable),
            is_heading: self.flag(node, NodeFlag::Heading),
            is_text_selectable: self.flag(node, NodeFlag::TextSelectable),

            input_type: self.number(node, NumericAttribute::InputType),
            live_region: self.number(node, NumericAttribute::LiveRegion),
            window_id: self.number(node, NumericAttribute::WindowId),
            drawing_order: self.number(node, NumericAttribute::DrawingOrder),
            max_text_length: self.number(node, NumericAttribute::MaxTextLength),
            movement_granularities: self.number(node, NumericAttribute::MovementGranularities),
            text_selection_start,
            text_selection_end,
            child_count: node.child_count(),

            action_list: read_or_log("actionList", node.actions())
                .map(|list| list.iter().map(actions::describe).collect())
                .unwrap_or_default(),

            range_info: read_or_log("rangeInfo", node.range_info())
                .flatten()
                .map(|range| RangeInfoRecord {
                    range_type: range.range_type,
                    min: range.min.as_f64(),
                    max: range.max.as_f64(),
                    current: range.current.as_f64(),
                }),
            collection_info: read_or_log("collectionInfo", node.collection_info()).flatten(),
            collection_item_info: read_or_log("collectionItemInfo", node.collection_item_info())
                .flatten(),
            has_touch_delegate: self.touch_delegate(node),

            has_label_for: self.relation(node, Relation::LabelFor),
            has_labeled_by: self.relation(node, Relation::LabeledBy),
            has_traversal_before: self.relation(node, Relation::TraversalBefore),
            has_traversal_after: self.relation(node, Relation::TraversalAfter),

            extras: extract_extras(node),

            truncated: false,
            children: Vec::new(),
        }
    }

    fn string<N: NodeHandle>(&self, node: &N, attr: TextAttribute) -> String {
        if !self.capabilities.allows(attr.capability()) {
            return String::new();
        }
        read_or_log(attr.key(), node.text(attr))
            .flatten()
            .unwrap_or_default()
    }

    /// Present (possibly blank) when the gate is open, omitted otherwise.
    fn gated_string<N: NodeHandle>(&self, node: &N, attr: TextAttribute) -> Option<String> {
        if !self.capabilities.allows(attr.capability()) {
            return None;
        }
        read_or_log(attr.key(), node.text(attr)).map(Option::unwrap_or_default)
    }

    fn flag<N: NodeHandle>(&self, node: &N, flag: NodeFlag) -> bool {
        self.capabilities.allows(flag.capability())
            && read_or_log(flag.key(), node.flag(flag)).unwrap_or(false)
    }

    fn number<N: NodeHandle>(&self, node: &N, attr: NumericAttribute) -> i32 {
        self.optional_number(node, attr).unwrap_or(0)
    }

    fn optional_number<N: NodeHandle>(&self, node: &N, attr: NumericAttribute) -> Option<i32> {
        if !self.capabilities.allows(attr.capability()) {
            return None;
        }
        read_or_log(attr.key(), node.number(attr))
    }

    fn touch_delegate<N: NodeHandle>(&self, node: &N) -> Option<bool> {
        if !self.capabilities.is_available(Capability::TouchDelegate) {
            return None;
        }
        read_or_log("hasTouchDelegate", node.touch_delegate_info()).map(|info| info.is_some())
    }

    fn relation<N: NodeHandle>(&self, node: &N, relation: Relation) -> Option<bool> {
        if !self.capabilities.is_available(relation.capability()) {
            return None;
        }
        read_or_log(relation.key(), node.has_relation(relation))
    }
}

/// Turn a failed read into `None`, noting it in the debug log.
fn read_or_log<T>(key: &str, result: Result<T, NodeError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::debug!("Skipping attribute {}: {}", key, e);
            None
        }
    }
}

/// Sanitize the node's extras bag. `None` when nothing survives.
fn extract_extras<N: NodeHandle>(node: &N) -> Option<Map<String, Value>> {
    let keys = read_or_log("extras", node.extra_keys())?;

    let mut extras = Map::new();
    for key in keys {
        let Some(value) = node.extra(&key).ok().and_then(sanitize_extra) else {
            log::debug!("Dropping unconvertible extra {:?}", key);
            continue;
        };
        extras.insert(key, value);
    }

    if extras.is_empty() {
        None
    } else {
        Some(extras)
    }
}

/// Convert one extras value into a JSON primitive.
///
/// Primitive kinds keep their type; other kinds fall back to their text form.
/// Returns `None` when the value has no JSON representation: nulls,
/// non-finite floats, and opaque values without text.
///
/// # Examples
///
/// ```
/// use a11y_snapshot::extractor::sanitize_extra;
/// use a11y_snapshot::node::ExtraValue;
/// use serde_json::json;
///
/// assert_eq!(sanitize_extra(ExtraValue::Long(1 << 40)), Some(json!(1_i64 << 40)));
/// assert_eq!(sanitize_extra(ExtraValue::Double(f64::NAN)), None);
/// ```
pub fn sanitize_extra(value: ExtraValue) -> Option<Value> {
    match value {
        ExtraValue::Text(s) => Some(Value::String(s)),
        ExtraValue::Int(v) => Some(Value::from(v)),
        ExtraValue::Long(v) => Some(Value::from(v)),
        ExtraValue::Bool(v) => Some(Value::Bool(v)),
        ExtraValue::Float(v) => Number::from_f64(f64::from(v)).map(Value::Number),
        ExtraValue::Double(v) => Number::from_f64(v).map(Value::Number),
        ExtraValue::Other { repr, .. } => repr.map(Value::String),
        ExtraValue::Null => None,
    }
}
