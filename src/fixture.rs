//! In-memory node trees described in JSON.
//!
//! A [`FixtureSpec`] is a recorded (or hand-written) accessibility tree. A
//! [`FixtureNode`] wraps it as a [`NodeHandle`] and keeps a shared
//! [`ReleaseLedger`] counting every child acquisition and release, so callers
//! can check that a traversal returned every handle it borrowed.
//!
//! Fixture JSON shape (every field optional):
//!
//! ```json
//! {
//!   "strings": {"text": "Hello", "className": "android.widget.TextView"},
//!   "flags": ["isClickable", "isEnabled"],
//!   "numbers": {"windowId": 3, "textSelectionStart": 0},
//!   "boundsInScreen": {"left": 0, "top": 0, "right": 100, "bottom": 40},
//!   "actions": [{"id": 1, "label": "Open"}],
//!   "rangeInfo": {"type": 0, "min": 0, "max": 100, "current": 30},
//!   "relations": ["labelFor"],
//!   "extras": {"vendor.flag": true, "blob": {"$opaque": "android.os.Binder"}},
//!   "failing": ["hintText", "extras.vendor.flag"],
//!   "children": [{...}, null]
//! }
//! ```
//!
//! Keys listed in `failing` make the matching read return an error. A `null`
//! child is a slot the host reports but cannot produce a handle for.

use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::node::{
    ExtraValue, HostAction, NodeFlag, NodeHandle, NumericAttribute, RangeInfo, RangeValue,
    Relation, TextAttribute, TouchDelegateInfo,
};
use crate::types::{Bounds, CollectionInfo, CollectionItemInfo, NodeError};

/// Marker key for an extras value with no text representation.
const OPAQUE_MARKER: &str = "$opaque";
/// Optional text form next to [`OPAQUE_MARKER`].
const REPR_MARKER: &str = "$repr";

/// Description of one fixture node and its subtree.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FixtureSpec {
    pub strings: HashMap<String, String>,
    pub flags: BTreeSet<String>,
    pub numbers: HashMap<String, i32>,
    pub bounds_in_screen: Bounds,
    pub bounds_in_parent: Bounds,
    pub actions: Vec<FixtureAction>,
    pub range_info: Option<FixtureRange>,
    pub collection_info: Option<CollectionInfo>,
    pub collection_item_info: Option<CollectionItemInfo>,
    pub touch_delegate_regions: Option<usize>,
    pub relations: BTreeSet<String>,
    pub extras: Option<Map<String, Value>>,
    pub failing: BTreeSet<String>,
    pub children: Vec<Option<Rc<FixtureSpec>>>,
}

impl FixtureSpec {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Total number of non-null nodes in this subtree.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .flatten()
            .map(|child| child.node_count())
            .sum::<usize>()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureAction {
    pub id: i32,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureRange {
    #[serde(rename = "type")]
    pub range_type: i32,
    pub min: FixtureNumber,
    pub max: FixtureNumber,
    pub current: FixtureNumber,
}

/// JSON integers stay integers so normalization is exercised.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum FixtureNumber {
    Int(i64),
    Double(f64),
}

impl From<FixtureNumber> for RangeValue {
    fn from(number: FixtureNumber) -> Self {
        match number {
            FixtureNumber::Int(v) => RangeValue::Int(v),
            FixtureNumber::Double(v) => RangeValue::Double(v),
        }
    }
}

/// Acquire/release counters shared by every handle of one fixture tree.
#[derive(Debug, Default)]
pub struct ReleaseLedger {
    acquired: Cell<usize>,
    released: Cell<usize>,
}

impl ReleaseLedger {
    pub fn acquired(&self) -> usize {
        self.acquired.get()
    }

    pub fn released(&self) -> usize {
        self.released.get()
    }

    /// Handles acquired but not yet released.
    pub fn outstanding(&self) -> usize {
        self.acquired().saturating_sub(self.released())
    }

    pub fn is_balanced(&self) -> bool {
        self.acquired() == self.released()
    }
}

/// A [`NodeHandle`] over a [`FixtureSpec`].
#[derive(Debug)]
pub struct FixtureNode {
    spec: Rc<FixtureSpec>,
    ledger: Rc<ReleaseLedger>,
}

impl FixtureNode {
    /// Wrap a tree as its root handle. The root itself is not counted in the
    /// ledger since it belongs to the caller.
    pub fn root(spec: FixtureSpec) -> Self {
        FixtureNode {
            spec: Rc::new(spec),
            ledger: Rc::new(ReleaseLedger::default()),
        }
    }

    pub fn ledger(&self) -> Rc<ReleaseLedger> {
        Rc::clone(&self.ledger)
    }

    pub fn spec(&self) -> &FixtureSpec {
        &self.spec
    }

    fn check(&self, key: &str) -> Result<(), NodeError> {
        if self.spec.failing.contains(key) {
            Err(NodeError::Host(format!("injected failure reading {}", key)))
        } else {
            Ok(())
        }
    }
}

fn relation_name(relation: Relation) -> &'static str {
    match relation {
        Relation::LabelFor => "labelFor",
        Relation::LabeledBy => "labeledBy",
        Relation::TraversalBefore => "traversalBefore",
        Relation::TraversalAfter => "traversalAfter",
    }
}

/// Map a JSON extras value onto the host's value kinds.
fn to_extra_value(value: &Value) -> ExtraValue {
    match value {
        Value::Null => ExtraValue::Null,
        Value::Bool(b) => ExtraValue::Bool(*b),
        Value::String(s) => ExtraValue::Text(s.clone()),
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                match i32::try_from(v) {
                    Ok(small) => ExtraValue::Int(small),
                    Err(_) => ExtraValue::Long(v),
                }
            } else if let Some(v) = n.as_f64().filter(|_| n.is_f64()) {
                ExtraValue::Double(v)
            } else {
                ExtraValue::Other {
                    type_name: "u64".to_string(),
                    repr: Some(n.to_string()),
                }
            }
        }
        Value::Object(map) => match map.get(OPAQUE_MARKER).and_then(Value::as_str) {
            Some(type_name) => ExtraValue::Other {
                type_name: type_name.to_string(),
                repr: map
                    .get(REPR_MARKER)
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
            None => ExtraValue::Other {
                type_name: "object".to_string(),
                repr: Some(value.to_string()),
            },
        },
        Value::Array(_) => ExtraValue::Other {
            type_name: "array".to_string(),
            repr: Some(value.to_string()),
        },
    }
}

impl NodeHandle for FixtureNode {
    fn text(&self, attr: TextAttribute) -> Result<Option<String>, NodeError> {
        self.check(attr.key())?;
        Ok(self.spec.strings.get(attr.key()).cloned())
    }

    fn flag(&self, flag: NodeFlag) -> Result<bool, NodeError> {
        self.check(flag.key())?;
        Ok(self.spec.flags.contains(flag.key()))
    }

    fn number(&self, attr: NumericAttribute) -> Result<i32, NodeError> {
        self.check(attr.key())?;
        self.spec
            .numbers
            .get(attr.key())
            .copied()
            .ok_or_else(|| NodeError::Unsupported(attr.key().to_string()))
    }

    fn bounds_in_screen(&self) -> Result<Bounds, NodeError> {
        self.check("boundsInScreen")?;
        Ok(self.spec.bounds_in_screen)
    }

    fn bounds_in_parent(&self) -> Result<Bounds, NodeError> {
        self.check("boundsInParent")?;
        Ok(self.spec.bounds_in_parent)
    }

    fn actions(&self) -> Result<Vec<HostAction>, NodeError> {
        self.check("actionList")?;
        Ok(self
            .spec
            .actions
            .iter()
            .map(|action| HostAction {
                id: action.id,
                label: action.label.clone(),
            })
            .collect())
    }

    fn range_info(&self) -> Result<Option<RangeInfo>, NodeError> {
        self.check("rangeInfo")?;
        Ok(self.spec.range_info.as_ref().map(|range| RangeInfo {
            range_type: range.range_type,
            min: range.min.into(),
            max: range.max.into(),
            current: range.current.into(),
        }))
    }

    fn collection_info(&self) -> Result<Option<CollectionInfo>, NodeError> {
        self.check("collectionInfo")?;
        Ok(self.spec.collection_info)
    }

    fn collection_item_info(&self) -> Result<Option<CollectionItemInfo>, NodeError> {
        self.check("collectionItemInfo")?;
        Ok(self.spec.collection_item_info)
    }

    fn touch_delegate_info(&self) -> Result<Option<TouchDelegateInfo>, NodeError> {
        self.check("hasTouchDelegate")?;
        Ok(self
            .spec
            .touch_delegate_regions
            .map(|region_count| TouchDelegateInfo { region_count }))
    }

    fn has_relation(&self, relation: Relation) -> Result<bool, NodeError> {
        self.check(relation.key())?;
        Ok(self.spec.relations.contains(relation_name(relation)))
    }

    fn extra_keys(&self) -> Result<Vec<String>, NodeError> {
        self.check("extras")?;
        Ok(self
            .spec
            .extras
            .as_ref()
            .map(|extras| extras.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn extra(&self, key: &str) -> Result<ExtraValue, NodeError> {
        self.check(&format!("extras.{}", key))?;
        self.spec
            .extras
            .as_ref()
            .and_then(|extras| extras.get(key))
            .map(to_extra_value)
            .ok_or_else(|| NodeError::Unsupported(format!("extras.{}", key)))
    }

    fn child_count(&self) -> usize {
        self.spec.children.len()
    }

    fn child(&self, index: usize) -> Option<Self> {
        let spec = self.spec.children.get(index)?.as_ref()?;
        self.ledger.acquired.set(self.ledger.acquired.get() + 1);
        Some(FixtureNode {
            spec: Rc::clone(spec),
            ledger: Rc::clone(&self.ledger),
        })
    }

    fn release(self) {
        self.ledger.released.set(self.ledger.released.get() + 1);
    }
}
