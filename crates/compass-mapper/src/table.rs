//! Typed lookup from logical properties to physical host names
//!
//! The host's property names are free-form strings with punctuation
//! suffixes (`Action Text#12254:9`). Instead of scattering substring
//! heuristics through the engine, this table resolves each logical
//! property to its candidate physical names once per target shape, and
//! owns the fuzzy-match rules used as a last-resort pass.

use crate::target::{IconSlot, TargetSize};

/// Logical properties the migration engine needs to set on a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalProperty {
    /// Style variant property
    Style,
    /// State variant property
    State,
    /// Size variant property
    Size,
    /// Label text
    Label,
    /// Left-icon visibility toggle
    ShowLeftIcon,
    /// Right-icon visibility toggle
    ShowRightIcon,
    /// Left icon instance slot
    LeftIconSlot,
    /// Right icon instance slot
    RightIconSlot,
    /// Icon-only slot, small size
    IconOnlySlotSmall,
    /// Icon-only slot, medium size
    IconOnlySlotMedium,
    /// Icon-only slot, large size
    IconOnlySlotLarge,
}

impl LogicalProperty {
    /// The logical property backing an icon slot
    #[inline]
    #[must_use]
    pub fn for_slot(slot: IconSlot) -> Self {
        match slot {
            IconSlot::Left => Self::LeftIconSlot,
            IconSlot::Right => Self::RightIconSlot,
            IconSlot::IconOnly(TargetSize::Small) => Self::IconOnlySlotSmall,
            IconSlot::IconOnly(TargetSize::Medium) => Self::IconOnlySlotMedium,
            IconSlot::IconOnly(TargetSize::Large) => Self::IconOnlySlotLarge,
        }
    }

    /// Last-resort fuzzy match against a physical property name
    ///
    /// Used only after every exact candidate failed to appear on any
    /// sub-instance. Variant properties never fuzzy-match; setting the
    /// wrong variant axis is worse than a warning.
    #[must_use]
    pub fn fuzzy_matches(self, physical_name: &str) -> bool {
        let name = physical_name.to_lowercase();
        match self {
            Self::Style | Self::State | Self::Size => false,
            Self::Label => name.contains("text") || name.contains("label"),
            Self::ShowLeftIcon => {
                name.contains("show") && name.contains("left") && name.contains("icon")
            }
            Self::ShowRightIcon => {
                name.contains("show") && name.contains("right") && name.contains("icon")
            }
            Self::LeftIconSlot => {
                name.contains("left") && name.contains("icon") && !name.contains("show")
            }
            Self::RightIconSlot => {
                name.contains("right") && name.contains("icon") && !name.contains("show")
            }
            Self::IconOnlySlotSmall | Self::IconOnlySlotMedium | Self::IconOnlySlotLarge => {
                name.contains("select") && name.contains("icon")
            }
        }
    }
}

/// Candidate physical names per logical property for one target shape
#[derive(Debug, Clone)]
pub struct PropertyTable {
    entries: Vec<(LogicalProperty, Vec<String>)>,
}

impl PropertyTable {
    /// Build a table from `(logical, candidates)` pairs
    #[must_use]
    pub fn new(entries: Vec<(LogicalProperty, Vec<String>)>) -> Self {
        Self { entries }
    }

    /// The table for the Action target shape
    ///
    /// Physical names come from offline analysis of the published
    /// component's structure; the suffixes are part of the host contract.
    #[must_use]
    pub fn action() -> Self {
        let entry = |logical, names: &[&str]| {
            (logical, names.iter().map(|s| (*s).to_string()).collect())
        };
        Self::new(vec![
            entry(LogicalProperty::Style, &["Style"]),
            entry(LogicalProperty::State, &["State"]),
            entry(LogicalProperty::Size, &["Size"]),
            entry(LogicalProperty::Label, &["Action Text#12254:9"]),
            entry(
                LogicalProperty::ShowLeftIcon,
                &["Show 'Left icon'#12254:10"],
            ),
            entry(
                LogicalProperty::ShowRightIcon,
                &["Show 'Right icon'#12254:11"],
            ),
            entry(
                LogicalProperty::LeftIconSlot,
                &["Select 'Left' Icon#12538:1"],
            ),
            entry(
                LogicalProperty::RightIconSlot,
                &["Select 'Right' Icon#12538:5"],
            ),
            entry(LogicalProperty::IconOnlySlotSmall, &["Select Icon#12307:2"]),
            entry(
                LogicalProperty::IconOnlySlotMedium,
                &["Select Icon#12307:3"],
            ),
            entry(LogicalProperty::IconOnlySlotLarge, &["Select Icon#12307:1"]),
        ])
    }

    /// Exact-name candidates for a logical property, in preference order
    #[must_use]
    pub fn candidates(&self, logical: LogicalProperty) -> &[String] {
        self.entries
            .iter()
            .find(|(l, _)| *l == logical)
            .map_or(&[], |(_, names)| names.as_slice())
    }
}

impl Default for PropertyTable {
    fn default() -> Self {
        Self::action()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_only_slot_is_size_keyed() {
        let table = PropertyTable::action();
        let small = table.candidates(LogicalProperty::for_slot(IconSlot::IconOnly(
            TargetSize::Small,
        )));
        let medium = table.candidates(LogicalProperty::for_slot(IconSlot::IconOnly(
            TargetSize::Medium,
        )));
        let large = table.candidates(LogicalProperty::for_slot(IconSlot::IconOnly(
            TargetSize::Large,
        )));

        assert_eq!(small, ["Select Icon#12307:2"]);
        assert_eq!(medium, ["Select Icon#12307:3"]);
        assert_eq!(large, ["Select Icon#12307:1"]);
    }

    #[test]
    fn fuzzy_rules() {
        assert!(LogicalProperty::Label.fuzzy_matches("Button Text#99:1"));
        assert!(LogicalProperty::ShowLeftIcon.fuzzy_matches("Show 'Left icon'#1:2"));
        assert!(!LogicalProperty::ShowLeftIcon.fuzzy_matches("Select 'Left' Icon#1:3"));
        assert!(LogicalProperty::LeftIconSlot.fuzzy_matches("Select 'Left' Icon#1:3"));
        // variant axes never fuzzy-match
        assert!(!LogicalProperty::Size.fuzzy_matches("Sizing"));
    }

    #[test]
    fn unknown_logical_has_no_candidates() {
        let table = PropertyTable::new(vec![]);
        assert!(table.candidates(LogicalProperty::Label).is_empty());
    }
}
