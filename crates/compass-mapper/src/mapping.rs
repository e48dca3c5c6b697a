//! The Button-to-Action mapping function

use crate::source::{normalize, parse_icon, IconKind, SourceProperties};
use crate::target::{
    IconPlan, IconSlot, TargetProperties, TargetSize, TargetState, TargetStyle, TargetVariant,
    ThemeMode,
};
use serde::{Deserialize, Serialize};

/// Policy for a source carrying an icon reference while its icon enum is
/// explicitly `None`
///
/// Product has not confirmed which reading is intended, so both are
/// implemented and the default keeps the explicit enum value in charge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IconNonePolicy {
    /// `Icon = None` always wins; a stray icon reference is dropped
    #[default]
    ExplicitNoneWins,
    /// A present icon reference wins; the instance migrates with the icon
    IconReferenceWins,
}

/// Knobs that change mapping behavior
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperPolicy {
    /// How to treat `Icon = None` alongside a non-null icon reference
    #[serde(default)]
    pub icon_none_policy: IconNonePolicy,
}

/// Everything the migration engine needs to configure the target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingResult {
    /// Which target variant to select
    pub target_variant: TargetVariant,
    /// Translated property bag
    pub props: TargetProperties,
    /// Human-readable fallback notices; never empty silently
    pub warnings: Vec<String>,
    /// Icon transfer plan, if the source carries a usable icon
    pub icon_plan: Option<IconPlan>,
    /// Theme mode selected by the source color, if recognized
    pub theme_mode: Option<ThemeMode>,
}

/// Translate a captured Button property bag into an Action configuration
///
/// Pure and deterministic. Unknown enum values never fail the mapping:
/// each falls back to a documented default and appends exactly one
/// warning naming the unrecognized value.
#[must_use]
pub fn map_properties(source: &SourceProperties, policy: &MapperPolicy) -> MappingResult {
    let mut warnings = Vec::new();

    let icon_kind = parse_icon(&source.icon);
    let has_icon_ref = source.icon_instance.is_some();
    let none_wins = policy.icon_none_policy == IconNonePolicy::ExplicitNoneWins;

    // Variant decision table (see the icon-none policy for the one
    // configurable cell).
    let (target_variant, icon_slot_side) = match icon_kind {
        Some(IconKind::IconOnly) => (TargetVariant::IconOnly, None),
        Some(IconKind::Left) => (TargetVariant::TextAndIcons, Some(IconSlot::Left)),
        Some(IconKind::Right) => (TargetVariant::TextAndIcons, Some(IconSlot::Right)),
        Some(IconKind::None) => {
            if has_icon_ref && !none_wins {
                (TargetVariant::TextAndIcons, Some(IconSlot::Left))
            } else {
                (TargetVariant::Text, None)
            }
        }
        // Unrecognized icon value: a present reference implies an icon,
        // defaulting to left placement; otherwise text.
        None => {
            if has_icon_ref {
                (TargetVariant::TextAndIcons, Some(IconSlot::Left))
            } else {
                (TargetVariant::Text, None)
            }
        }
    };

    let style = match normalize(&source.variant).as_str() {
        "filled" => TargetStyle::Filled,
        "outlined" | "outline" => TargetStyle::Outline,
        "flat" => TargetStyle::Text,
        _ => {
            warnings.push(format!(
                "unknown source variant \"{}\", defaulting to Filled",
                source.variant
            ));
            TargetStyle::Filled
        }
    };

    let state = match normalize(&source.state).as_str() {
        "default" => TargetState::Enabled,
        "hover" => TargetState::Hover,
        "pressed" => TargetState::Pressed,
        "disabled" => TargetState::Disabled,
        _ => {
            warnings.push(format!(
                "unknown source state \"{}\", defaulting to Enabled",
                source.state
            ));
            TargetState::Enabled
        }
    };

    let size = match normalize(&source.size).as_str() {
        "small" => TargetSize::Small,
        "medium" | "medium default" => TargetSize::Medium,
        "large" => TargetSize::Large,
        _ => {
            warnings.push(format!(
                "unknown source size \"{}\", defaulting to Medium",
                source.size
            ));
            TargetSize::Medium
        }
    };

    // Icon visibility and label presence derive strictly from the variant
    // decision. Icon-only targets have no text slot and use a single
    // size-keyed icon slot instead of the left/right flags.
    let (label, show_left_icon, show_right_icon) = match target_variant {
        TargetVariant::IconOnly => (None, None, None),
        TargetVariant::Text => (Some(source.label.clone()), Some(false), Some(false)),
        TargetVariant::TextAndIcons => (
            Some(source.label.clone()),
            Some(icon_slot_side == Some(IconSlot::Left)),
            Some(icon_slot_side == Some(IconSlot::Right)),
        ),
    };

    let icon_plan = source.icon_instance.as_ref().and_then(|icon_ref| {
        if icon_kind == Some(IconKind::None) && none_wins {
            return None;
        }
        let slot = match target_variant {
            TargetVariant::IconOnly => IconSlot::IconOnly(size),
            TargetVariant::TextAndIcons => icon_slot_side.unwrap_or(IconSlot::Left),
            TargetVariant::Text => return None,
        };
        Some(IconPlan {
            source: icon_ref.clone(),
            slot,
        })
    });

    // Color selects a theme mode instead of being copied as a visual
    // property. Unrecognized colors leave the theme untouched.
    let theme_mode = match normalize(&source.color).as_str() {
        "brand" | "purple" | "brand purple" => Some(ThemeMode::BrandLight),
        "white" => Some(ThemeMode::BrandDark),
        "black" => Some(ThemeMode::PartnerLight),
        _ => {
            warnings.push(format!(
                "unknown source color \"{}\", theme not changed",
                source.color
            ));
            None
        }
    };

    MappingResult {
        target_variant,
        props: TargetProperties {
            style,
            state,
            size,
            label,
            show_left_icon,
            show_right_icon,
        },
        warnings,
        icon_plan,
        theme_mode,
    }
}
