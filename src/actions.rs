//! Action id to symbolic name mapping.
//!
//! Well-known action ids resolve through [`ACTION_NAMES`]. Any other id gets a
//! name built from the id itself, so unknown actions stay distinguishable and
//! stable across snapshots.

use std::borrow::Cow;

use crate::node::HostAction;
use crate::types::ActionDescriptor;

/// Prefix of the generated name for ids missing from [`ACTION_NAMES`].
pub const UNKNOWN_ACTION_PREFIX: &str = "ACTION_UNKNOWN_";

/// Well-known action ids and their symbolic names.
pub const ACTION_NAMES: &[(i32, &str)] = &[
    (1, "CLICK"),
    (2, "LONG_CLICK"),
    (3, "FOCUS"),
    (4, "CLEAR_FOCUS"),
    (5, "SELECT"),
    (6, "CLEAR_SELECTION"),
    (7, "ACCESSIBILITY_FOCUS"),
    (8, "CLEAR_ACCESSIBILITY_FOCUS"),
    (9, "NEXT_AT_MOVEMENT_GRANULARITY"),
    (10, "PREVIOUS_AT_MOVEMENT_GRANULARITY"),
    (11, "NEXT_HTML_ELEMENT"),
    (12, "PREVIOUS_HTML_ELEMENT"),
    (13, "SCROLL_FORWARD"),
    (14, "SCROLL_BACKWARD"),
    (15, "COPY"),
    (16, "PASTE"),
    (17, "CUT"),
    (18, "SET_SELECTION"),
    (19, "EXPAND"),
    (20, "COLLAPSE"),
    (21, "DISMISS"),
    (22, "SET_TEXT"),
    (23, "SHOW_ON_SCREEN"),
    (24, "SCROLL_TO_POSITION"),
    (25, "SCROLL_UP"),
    (26, "SCROLL_LEFT"),
    (27, "SCROLL_DOWN"),
    (28, "SCROLL_RIGHT"),
    (29, "CONTEXT_CLICK"),
    (30, "SET_PROGRESS"),
    (31, "MOVE_WINDOW"),
    (32, "SHOW_TOOLTIP"),
    (33, "HIDE_TOOLTIP"),
    (34, "PAGE_UP"),
    (35, "PAGE_DOWN"),
    (36, "PAGE_LEFT"),
    (37, "PAGE_RIGHT"),
    (38, "PRESS_AND_HOLD"),
    (39, "IME_ENTER"),
    (40, "DRAG_START"),
    (41, "DRAG_DROP"),
    (42, "DRAG_CANCEL"),
    (43, "SHOW_TEXT_SUGGESTIONS"),
    (44, "SCROLL_IN_DIRECTION"),
];

/// Symbolic name for an action id.
///
/// # Examples
///
/// ```
/// use a11y_snapshot::actions::action_name;
///
/// assert_eq!(action_name(1), "CLICK");
/// assert_eq!(action_name(9999), "ACTION_UNKNOWN_9999");
/// ```
pub fn action_name(id: i32) -> Cow<'static, str> {
    match ACTION_NAMES.iter().find(|(known, _)| *known == id) {
        Some((_, name)) => Cow::Borrowed(*name),
        None => Cow::Owned(format!("{}{}", UNKNOWN_ACTION_PREFIX, id)),
    }
}

/// Build the output descriptor for one host action.
pub fn describe(action: &HostAction) -> ActionDescriptor {
    ActionDescriptor {
        id: action.id,
        label: action.label.clone(),
        name: action_name(action.id).into_owned(),
    }
}
