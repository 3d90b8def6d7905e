//! Capability resolution for version-gated node attributes.
//!
//! Each optional attribute that only exists from some platform version onward
//! is guarded by a [`Capability`]. The minimum versions live in a single
//! table, [`CAPABILITY_TABLE`], so gating a new attribute is one added row.

use std::fmt;

/// A named gate for an attribute that is only legal to read on newer platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    LabelRelations,
    MaxTextLength,
    TraversalRelations,
    ContextClickable,
    DrawingOrder,
    ImportantForAccessibility,
    HintText,
    ShowingHintText,
    PaneTitle,
    TooltipText,
    Heading,
    ScreenReaderFocusable,
    TouchDelegate,
    StateDescription,
    UniqueId,
    TextSelectable,
    ContainerTitle,
}

/// Minimum platform version for every capability.
///
/// Gates are monotonic: a capability available at version V stays available
/// at every later version.
pub const CAPABILITY_TABLE: &[(Capability, u32)] = &[
    (Capability::LabelRelations, 17),
    (Capability::MaxTextLength, 21),
    (Capability::TraversalRelations, 22),
    (Capability::ContextClickable, 23),
    (Capability::DrawingOrder, 24),
    (Capability::ImportantForAccessibility, 24),
    (Capability::HintText, 26),
    (Capability::ShowingHintText, 26),
    (Capability::PaneTitle, 28),
    (Capability::TooltipText, 28),
    (Capability::Heading, 28),
    (Capability::ScreenReaderFocusable, 28),
    (Capability::TouchDelegate, 29),
    (Capability::StateDescription, 30),
    (Capability::UniqueId, 33),
    (Capability::TextSelectable, 33),
    (Capability::ContainerTitle, 34),
];

impl Capability {
    /// Minimum platform version at which this capability is available.
    pub fn min_version(self) -> u32 {
        CAPABILITY_TABLE
            .iter()
            .find(|(cap, _)| *cap == self)
            .map(|(_, version)| *version)
            .unwrap_or(u32::MAX)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::LabelRelations => "label_relations",
            Capability::MaxTextLength => "max_text_length",
            Capability::TraversalRelations => "traversal_relations",
            Capability::ContextClickable => "context_clickable",
            Capability::DrawingOrder => "drawing_order",
            Capability::ImportantForAccessibility => "important_for_accessibility",
            Capability::HintText => "hint_text",
            Capability::ShowingHintText => "showing_hint_text",
            Capability::PaneTitle => "pane_title",
            Capability::TooltipText => "tooltip_text",
            Capability::Heading => "heading",
            Capability::ScreenReaderFocusable => "screen_reader_focusable",
            Capability::TouchDelegate => "touch_delegate",
            Capability::StateDescription => "state_description",
            Capability::UniqueId => "unique_id",
            Capability::TextSelectable => "text_selectable",
            Capability::ContainerTitle => "container_title",
        }
    }

    fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of capabilities legal to read on the current platform.
///
/// Cheap to copy; resolved once per traversal and shared by every node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilitySet {
    bits: u32,
    platform_version: Option<u32>,
}

impl CapabilitySet {
    /// Resolve the capabilities available at `platform_version`.
    ///
    /// # Example
    ///
    /// ```
    /// use a11y_snapshot::capabilities::{Capability, CapabilitySet};
    ///
    /// let old = CapabilitySet::resolve(26);
    /// assert!(old.is_available(Capability::HintText));
    /// assert!(!old.is_available(Capability::ContainerTitle));
    ///
    /// let new = CapabilitySet::resolve(34);
    /// assert!(new.is_available(Capability::ContainerTitle));
    /// ```
    pub fn resolve(platform_version: u32) -> Self {
        let bits = CAPABILITY_TABLE
            .iter()
            .filter(|(_, min)| platform_version >= *min)
            .fold(0, |bits, (cap, _)| bits | cap.bit());

        CapabilitySet {
            bits,
            platform_version: Some(platform_version),
        }
    }

    /// Every capability, for hosts that cannot report a version.
    pub fn all() -> Self {
        CapabilitySet {
            bits: CAPABILITY_TABLE.iter().fold(0, |bits, (cap, _)| bits | cap.bit()),
            platform_version: None,
        }
    }

    /// No capability at all; only ungated attributes are read.
    pub fn none() -> Self {
        CapabilitySet::default()
    }

    pub fn is_available(&self, capability: Capability) -> bool {
        self.bits & capability.bit() != 0
    }

    /// Convenience for attributes whose gate is optional: ungated attributes
    /// are always allowed.
    pub fn allows(&self, gate: Option<Capability>) -> bool {
        gate.map_or(true, |cap| self.is_available(cap))
    }

    pub fn platform_version(&self) -> Option<u32> {
        self.platform_version
    }

    /// Available capabilities in table order.
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        CAPABILITY_TABLE
            .iter()
            .map(|(cap, _)| *cap)
            .filter(move |cap| self.is_available(*cap))
    }
}
