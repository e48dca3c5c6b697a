//! Derived target (Action) properties

use serde::{Deserialize, Serialize};

use crate::source::IconRef;

/// Target variant within the replacement component set
///
/// Selection happens by case-insensitive substring match against variant
/// names, so each variant carries the label to search for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetVariant {
    /// Label only, no icons
    Text,
    /// Label plus one icon
    TextAndIcons,
    /// Single icon, no label
    IconOnly,
}

impl TargetVariant {
    /// The variant-name fragment to match against the target set
    #[inline]
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::TextAndIcons => "Text and Icons",
            Self::IconOnly => "Icon Only",
        }
    }
}

/// Target style enum (distinct from the source's variant enum)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetStyle {
    /// Solid fill
    Filled,
    /// Outline only
    Outline,
    /// Text-style, no chrome
    Text,
}

impl TargetStyle {
    /// Physical enum value expected by the target component
    #[inline]
    #[must_use]
    pub fn physical(self) -> &'static str {
        match self {
            Self::Filled => "Filled",
            Self::Outline => "Outline",
            Self::Text => "Text",
        }
    }
}

/// Target state enum (distinct from the source's state enum)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetState {
    /// Interactive, at rest
    Enabled,
    /// Pointer over
    Hover,
    /// Pointer down
    Pressed,
    /// Not interactive
    Disabled,
}

impl TargetState {
    /// Physical enum value expected by the target component
    #[inline]
    #[must_use]
    pub fn physical(self) -> &'static str {
        match self {
            Self::Enabled => "Enabled",
            Self::Hover => "Hover",
            Self::Pressed => "Pressed",
            Self::Disabled => "Disabled",
        }
    }
}

/// Target size enum (distinct from the source's size enum)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetSize {
    /// Small
    Small,
    /// Medium (the target's default)
    Medium,
    /// Large
    Large,
}

impl TargetSize {
    /// Physical enum value expected by the target component
    #[inline]
    #[must_use]
    pub fn physical(self) -> &'static str {
        match self {
            Self::Small => "Small (S)",
            Self::Medium => "Medium (Default)",
            Self::Large => "Large (L)",
        }
    }
}

/// The translated property bag for the target component
///
/// Icon visibility and label presence are derived from the variant
/// decision, never carried over verbatim: icon-only targets have no text
/// slot and use a single icon slot instead of the left/right flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetProperties {
    /// Style variant property
    pub style: TargetStyle,
    /// State variant property
    pub state: TargetState,
    /// Size variant property
    pub size: TargetSize,
    /// Label text; `None` for icon-only targets
    pub label: Option<String>,
    /// Left-icon visibility; `None` for icon-only targets
    pub show_left_icon: Option<bool>,
    /// Right-icon visibility; `None` for icon-only targets
    pub show_right_icon: Option<bool>,
}

/// Which target slot should receive the source icon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IconSlot {
    /// The single icon slot of an icon-only variant, sized to match
    IconOnly(TargetSize),
    /// Left icon slot
    Left,
    /// Right icon slot
    Right,
}

/// Transfer plan for the source icon instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconPlan {
    /// The captured source icon reference
    pub source: IconRef,
    /// Destination slot on the target
    pub slot: IconSlot,
}

/// Named theme modes selectable by source color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThemeMode {
    /// Brand palette, light surfaces
    BrandLight,
    /// Brand palette, dark surfaces
    BrandDark,
    /// De-branded partner palette, light surfaces
    PartnerLight,
}

impl ThemeMode {
    /// The mode name as it appears in the theme variable collection
    #[inline]
    #[must_use]
    pub fn mode_name(self) -> &'static str {
        match self {
            Self::BrandLight => "Brand - Light",
            Self::BrandDark => "Brand - Dark",
            Self::PartnerLight => "Partner - Light",
        }
    }
}
