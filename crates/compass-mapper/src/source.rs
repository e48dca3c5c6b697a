//! Captured source (Button) properties
//!
//! Values arrive as raw host strings. Published component libraries
//! decorate enum values with marker glyphs (`● Filled`, `❖ Left`), so
//! parsing normalizes away everything that is not plain text before
//! matching.

use serde::{Deserialize, Serialize};

/// Opaque reference to an icon sub-component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconRef(pub String);

impl IconRef {
    /// Create a reference from any string-like value
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw reference value
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The fixed attribute set of a deprecated Button instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceProperties {
    /// Visual variant: filled / outlined / flat equivalents
    pub variant: String,
    /// Small / medium / large
    pub size: String,
    /// Default / hover / pressed / disabled
    pub state: String,
    /// Icon placement: none / left / right / icon-only, in several spellings
    pub icon: String,
    /// Brand or neutral color name
    pub color: String,
    /// Free-text label
    pub label: String,
    /// Icon sub-component reference, if one is placed
    pub icon_instance: Option<IconRef>,
}

/// Recognized icon placements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconKind {
    /// Explicitly no icon
    None,
    /// Icon left of the label
    Left,
    /// Icon right of the label
    Right,
    /// Icon with no label
    IconOnly,
}

/// Strip marker glyphs and collapse whitespace, lowercased
pub(crate) fn normalize(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_ascii_whitespace())
        .collect();
    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Parse an icon placement value; `None` for unrecognized spellings
#[must_use]
pub(crate) fn parse_icon(raw: &str) -> Option<IconKind> {
    match normalize(raw).as_str() {
        "none" => Some(IconKind::None),
        "left" => Some(IconKind::Left),
        "right" => Some(IconKind::Right),
        "icon only" => Some(IconKind::IconOnly),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_glyphs() {
        assert_eq!(normalize("● Filled"), "filled");
        assert_eq!(normalize("❖ Left"), "left");
        assert_eq!(normalize("Icon ❖ only"), "icon only");
        assert_eq!(normalize("Medium (Default)"), "medium default");
    }

    #[test]
    fn icon_spellings_all_parse() {
        for raw in ["Left", "Left ❖", "❖ Left"] {
            assert_eq!(parse_icon(raw), Some(IconKind::Left), "spelling {raw:?}");
        }
        for raw in ["Right", "Right ❖", "❖ Right"] {
            assert_eq!(parse_icon(raw), Some(IconKind::Right), "spelling {raw:?}");
        }
        for raw in ["Icon only", "Icon ❖ only"] {
            assert_eq!(parse_icon(raw), Some(IconKind::IconOnly), "spelling {raw:?}");
        }
        assert_eq!(parse_icon("None"), Some(IconKind::None));
        assert_eq!(parse_icon("Floating"), None);
    }
}
