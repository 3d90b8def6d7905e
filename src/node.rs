//! Host node abstraction.
//!
//! A host platform exposes its accessibility tree through [`NodeHandle`]. Every
//! read returns a `Result` so one failing attribute cannot take the rest of the
//! node down with it. Child handles are borrowed resources: the serializer
//! holds each one in a [`ChildGuard`], which hands it back through
//! [`NodeHandle::release`] exactly once.

use std::mem::ManuallyDrop;
use std::ops::Deref;

use crate::capabilities::Capability;
use crate::types::{Bounds, CollectionInfo, CollectionItemInfo, NodeError};

/// String attributes of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextAttribute {
    ResourceId,
    ClassName,
    PackageName,
    Text,
    ContentDescription,
    Error,
    HintText,
    StateDescription,
    TooltipText,
    PaneTitle,
    UniqueId,
    ContainerTitle,
}

impl TextAttribute {
    /// JSON key in the node record.
    pub fn key(self) -> &'static str {
        match self {
            TextAttribute::ResourceId => "resourceId",
            TextAttribute::ClassName => "className",
            TextAttribute::PackageName => "packageName",
            TextAttribute::Text => "text",
            TextAttribute::ContentDescription => "contentDescription",
            TextAttribute::Error => "error",
            TextAttribute::HintText => "hintText",
            TextAttribute::StateDescription => "stateDescription",
            TextAttribute::TooltipText => "tooltipText",
            TextAttribute::PaneTitle => "paneTitle",
            TextAttribute::UniqueId => "uniqueId",
            TextAttribute::ContainerTitle => "containerTitle",
        }
    }

    /// Gate for the attribute; `None` means it is always readable.
    pub fn capability(self) -> Option<Capability> {
        match self {
            TextAttribute::HintText => Some(Capability::HintText),
            TextAttribute::StateDescription => Some(Capability::StateDescription),
            TextAttribute::TooltipText => Some(Capability::TooltipText),
            TextAttribute::PaneTitle => Some(Capability::PaneTitle),
            TextAttribute::UniqueId => Some(Capability::UniqueId),
            TextAttribute::ContainerTitle => Some(Capability::ContainerTitle),
            _ => None,
        }
    }
}

/// Boolean states of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeFlag {
    Clickable,
    LongClickable,
    ContextClickable,
    Focusable,
    Focused,
    AccessibilityFocused,
    Selected,
    Checkable,
    Checked,
    Enabled,
    VisibleToUser,
    Editable,
    Password,
    ShowingHintText,
    Scrollable,
    Dismissable,
    MultiLine,
    ImportantForAccessibility,
    ScreenReaderFocusable,
    Heading,
    TextSelectable,
}

impl NodeFlag {
    pub const ALL: [NodeFlag; 21] = [
        NodeFlag::Clickable,
        NodeFlag::LongClickable,
        NodeFlag::ContextClickable,
        NodeFlag::Focusable,
        NodeFlag::Focused,
        NodeFlag::AccessibilityFocused,
        NodeFlag::Selected,
        NodeFlag::Checkable,
        NodeFlag::Checked,
        NodeFlag::Enabled,
        NodeFlag::VisibleToUser,
        NodeFlag::Editable,
        NodeFlag::Password,
        NodeFlag::ShowingHintText,
        NodeFlag::Scrollable,
        NodeFlag::Dismissable,
        NodeFlag::MultiLine,
        NodeFlag::ImportantForAccessibility,
        NodeFlag::ScreenReaderFocusable,
        NodeFlag::Heading,
        NodeFlag::TextSelectable,
    ];

    pub fn key(self) -> &'static str {
        match self {
            NodeFlag::Clickable => "isClickable",
            NodeFlag::LongClickable => "isLongClickable",
            NodeFlag::ContextClickable => "isContextClickable",
            NodeFlag::Focusable => "isFocusable",
            NodeFlag::Focused => "isFocused",
            NodeFlag::AccessibilityFocused => "isAccessibilityFocused",
            NodeFlag::Selected => "isSelected",
            NodeFlag::Checkable => "isCheckable",
            NodeFlag::Checked => "isChecked",
            NodeFlag::Enabled => "isEnabled",
            NodeFlag::VisibleToUser => "isVisibleToUser",
            NodeFlag::Editable => "isEditable",
            NodeFlag::Password => "isPassword",
            NodeFlag::ShowingHintText => "isShowingHintText",
            NodeFlag::Scrollable => "isScrollable",
            NodeFlag::Dismissable => "isDismissable",
            NodeFlag::MultiLine => "isMultiLine",
            NodeFlag::ImportantForAccessibility => "isImportantForAccessibility",
            NodeFlag::ScreenReaderFocusable => "isScreenReaderFocusable",
            NodeFlag::Heading => "isHeading",
            NodeFlag::TextSelectable => "isTextSelectable",
        }
    }

    pub fn capability(self) -> Option<Capability> {
        match self {
            NodeFlag::ContextClickable => Some(Capability::ContextClickable),
            NodeFlag::ImportantForAccessibility => Some(Capability::ImportantForAccessibility),
            NodeFlag::ShowingHintText => Some(Capability::ShowingHintText),
            NodeFlag::ScreenReaderFocusable => Some(Capability::ScreenReaderFocusable),
            NodeFlag::Heading => Some(Capability::Heading),
            NodeFlag::TextSelectable => Some(Capability::TextSelectable),
            _ => None,
        }
    }

    /// Look a flag up by its JSON key.
    pub fn from_key(key: &str) -> Option<NodeFlag> {
        NodeFlag::ALL.iter().copied().find(|flag| flag.key() == key)
    }
}

/// Integer attributes of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericAttribute {
    InputType,
    LiveRegion,
    WindowId,
    DrawingOrder,
    MaxTextLength,
    MovementGranularities,
    TextSelectionStart,
    TextSelectionEnd,
}

impl NumericAttribute {
    pub fn key(self) -> &'static str {
        match self {
            NumericAttribute::InputType => "inputType",
            NumericAttribute::LiveRegion => "liveRegion",
            NumericAttribute::WindowId => "windowId",
            NumericAttribute::DrawingOrder => "drawingOrder",
            NumericAttribute::MaxTextLength => "maxTextLength",
            NumericAttribute::MovementGranularities => "movementGranularities",
            NumericAttribute::TextSelectionStart => "textSelectionStart",
            NumericAttribute::TextSelectionEnd => "textSelectionEnd",
        }
    }

    pub fn capability(self) -> Option<Capability> {
        match self {
            NumericAttribute::DrawingOrder => Some(Capability::DrawingOrder),
            NumericAttribute::MaxTextLength => Some(Capability::MaxTextLength),
            _ => None,
        }
    }
}

/// Pointers from a node to another node of the same tree.
///
/// Only whether a relation is set is ever recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    LabelFor,
    LabeledBy,
    TraversalBefore,
    TraversalAfter,
}

impl Relation {
    pub fn key(self) -> &'static str {
        match self {
            Relation::LabelFor => "hasLabelFor",
            Relation::LabeledBy => "hasLabeledBy",
            Relation::TraversalBefore => "hasTraversalBefore",
            Relation::TraversalAfter => "hasTraversalAfter",
        }
    }

    pub fn capability(self) -> Capability {
        match self {
            Relation::LabelFor | Relation::LabeledBy => Capability::LabelRelations,
            Relation::TraversalBefore | Relation::TraversalAfter => Capability::TraversalRelations,
        }
    }
}

/// A number as the host stores it inside range info.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeValue {
    Int(i64),
    Float(f32),
    Double(f64),
}

impl RangeValue {
    pub fn as_f64(self) -> f64 {
        match self {
            RangeValue::Int(v) => v as f64,
            RangeValue::Float(v) => f64::from(v),
            RangeValue::Double(v) => v,
        }
    }
}

/// Range info as read from the host, before normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeInfo {
    pub range_type: i32,
    pub min: RangeValue,
    pub max: RangeValue,
    pub current: RangeValue,
}

/// Touch delegate regions attached to a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TouchDelegateInfo {
    pub region_count: usize,
}

/// One supported action as read from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostAction {
    pub id: i32,
    pub label: Option<String>,
}

/// An untyped value from a node's extras bag.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtraValue {
    Text(String),
    Int(i32),
    Long(i64),
    Bool(bool),
    Float(f32),
    Double(f64),
    /// Any other kind. `repr` is its text form when the host can produce one.
    Other {
        type_name: String,
        repr: Option<String>,
    },
    Null,
}

/// A node of a host accessibility tree.
///
/// Implementations wrap one platform handle. The root is owned by the caller;
/// every handle returned from [`child`](NodeHandle::child) is owned by the
/// serializer and released through [`release`](NodeHandle::release).
///
/// Structured and relation reads default to "absent" so a host only has to
/// implement what its platform exposes.
pub trait NodeHandle: Sized {
    fn text(&self, attr: TextAttribute) -> Result<Option<String>, NodeError>;

    fn flag(&self, flag: NodeFlag) -> Result<bool, NodeError>;

    fn number(&self, attr: NumericAttribute) -> Result<i32, NodeError>;

    fn bounds_in_screen(&self) -> Result<Bounds, NodeError>;

    fn bounds_in_parent(&self) -> Result<Bounds, NodeError>;

    /// Supported actions in host order.
    fn actions(&self) -> Result<Vec<HostAction>, NodeError>;

    fn range_info(&self) -> Result<Option<RangeInfo>, NodeError> {
        Ok(None)
    }

    fn collection_info(&self) -> Result<Option<CollectionInfo>, NodeError> {
        Ok(None)
    }

    fn collection_item_info(&self) -> Result<Option<CollectionItemInfo>, NodeError> {
        Ok(None)
    }

    fn touch_delegate_info(&self) -> Result<Option<TouchDelegateInfo>, NodeError> {
        Ok(None)
    }

    fn has_relation(&self, _relation: Relation) -> Result<bool, NodeError> {
        Ok(false)
    }

    /// Keys of the extras bag; empty when the node has none.
    fn extra_keys(&self) -> Result<Vec<String>, NodeError> {
        Ok(Vec::new())
    }

    fn extra(&self, key: &str) -> Result<ExtraValue, NodeError> {
        Err(NodeError::Unsupported(format!("extras.{}", key)))
    }

    /// Number of children the host reports. Some indices may still yield no handle.
    fn child_count(&self) -> usize;

    /// Borrow the child at `index`. The returned handle must be released.
    fn child(&self, index: usize) -> Option<Self>;

    /// Hand the handle back to the host. Consumes it, so it cannot be used again.
    fn release(self);
}

/// Scoped ownership of a child handle.
///
/// Dropping the guard releases the handle, on normal exit as well as during
/// unwinding.
pub struct ChildGuard<N: NodeHandle> {
    node: ManuallyDrop<N>,
}

impl<N: NodeHandle> ChildGuard<N> {
    /// Acquire the child of `parent` at `index`, or `None` for a null slot.
    pub fn acquire(parent: &N, index: usize) -> Option<Self> {
        parent.child(index).map(|node| ChildGuard {
            node: ManuallyDrop::new(node),
        })
    }
}

impl<N: NodeHandle> Deref for ChildGuard<N> {
    type Target = N;

    fn deref(&self) -> &N {
        &self.node
    }
}

impl<N: NodeHandle> Drop for ChildGuard<N> {
    fn drop(&mut self) {
        // SAFETY: `node` is taken exactly once, here, and the guard is never
        // touched again after drop.
        let node = unsafe { ManuallyDrop::take(&mut self.node) };
        node.release();
    }
}
