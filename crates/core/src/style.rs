//! Resolved styling carried by components.

use crate::color::DEFAULT_COLOR;
use crate::units::DEFAULT_FONT_SIZE_PT;
use serde::Serialize;

/// Font family used when a run names none.
pub const DEFAULT_FONT_FAMILY: &str = "Arial";

/// Fill colour used when a shape declares no fill.
pub const DEFAULT_FILL_COLOR: &str = "#FFFFFF";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDecoration {
    #[default]
    None,
    Underline,
}

/// Font of a text run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Font {
    pub family: String,
    /// Points.
    pub size: f64,
    pub weight: FontWeight,
    pub style: FontStyle,
    pub decoration: TextDecoration,
    pub color: String,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            family: DEFAULT_FONT_FAMILY.to_string(),
            size: DEFAULT_FONT_SIZE_PT,
            weight: FontWeight::Normal,
            style: FontStyle::Normal,
            decoration: TextDecoration::None,
            color: DEFAULT_COLOR.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    /// Map `a:pPr@algn`.
    pub fn from_ooxml(value: &str) -> Option<Self> {
        match value {
            "l" => Some(Self::Left),
            "ctr" => Some(Self::Center),
            "r" => Some(Self::Right),
            "just" | "dist" | "justLow" | "thaiDist" => Some(Self::Justify),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

impl VerticalAlign {
    /// Map `a:bodyPr@anchor`.
    pub fn from_ooxml(value: &str) -> Option<Self> {
        match value {
            "t" => Some(Self::Top),
            "ctr" => Some(Self::Middle),
            "b" => Some(Self::Bottom),
            _ => None,
        }
    }
}

/// Shape fill.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Fill {
    Solid {
        color: String,
    },
    /// Rendered with the first stop's colour.
    Gradient {
        color: String,
        stops: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        angle: Option<f64>,
    },
    Pattern {
        color: String,
        background: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        preset: Option<String>,
    },
    /// The fill is a picture, emitted as a separate background image.
    Image {
        #[serde(skip_serializing_if = "Option::is_none")]
        relationship_id: Option<String>,
    },
    None,
}

impl Default for Fill {
    fn default() -> Self {
        Fill::Solid {
            color: DEFAULT_FILL_COLOR.to_string(),
        }
    }
}

impl Fill {
    /// Representative colour, or `None` for no fill.
    pub fn color(&self) -> Option<&str> {
        match self {
            Fill::Solid { color } | Fill::Gradient { color, .. } | Fill::Pattern { color, .. } => {
                Some(color)
            }
            Fill::Image { .. } | Fill::None => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    #[default]
    None,
    Solid,
    Dashed,
    Dotted,
}

impl BorderStyle {
    /// Bucket an `a:prstDash@val` into the coarse styles.
    pub fn from_preset_dash(value: &str) -> Self {
        match value {
            "solid" => Self::Solid,
            "dot" | "sysDot" => Self::Dotted,
            "dash" | "sysDash" | "lgDash" | "dashDot" | "sysDashDot" | "lgDashDot"
            | "lgDashDotDot" | "sysDashDotDot" => Self::Dashed,
            _ => Self::Solid,
        }
    }
}

/// Outline of a shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Border {
    pub style: BorderStyle,
    /// `#RRGGBB` or `transparent`.
    pub color: String,
    /// Pixels.
    pub width: f64,
}

impl Default for Border {
    fn default() -> Self {
        Self::none()
    }
}

impl Border {
    pub fn none() -> Self {
        Self {
            style: BorderStyle::None,
            color: "transparent".to_string(),
            width: 0.0,
        }
    }
}

/// Outer shadow resolved to pixel offsets.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shadow {
    pub offset_x: f64,
    pub offset_y: f64,
    pub blur: f64,
    pub color: String,
}

impl Shadow {
    /// CSS `box-shadow`-style composite.
    pub fn css(&self) -> String {
        format!(
            "{}px {}px {}px {}",
            round2(self.offset_x),
            round2(self.offset_y),
            round2(self.blur),
            self.color
        )
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Effects {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow: Option<Shadow>,
    /// Glow parameters are not extracted, only its presence.
    pub glow: bool,
}

impl Effects {
    pub fn is_empty(&self) -> bool {
        self.shadow.is_none() && !self.glow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dash_buckets() {
        assert_eq!(BorderStyle::from_preset_dash("solid"), BorderStyle::Solid);
        assert_eq!(BorderStyle::from_preset_dash("dot"), BorderStyle::Dotted);
        assert_eq!(BorderStyle::from_preset_dash("sysDot"), BorderStyle::Dotted);
        assert_eq!(BorderStyle::from_preset_dash("lgDashDotDot"), BorderStyle::Dashed);
        assert_eq!(BorderStyle::from_preset_dash("dashDot"), BorderStyle::Dashed);
        assert_eq!(BorderStyle::from_preset_dash("weird"), BorderStyle::Solid);
    }

    #[test]
    fn test_defaults() {
        let font = Font::default();
        assert_eq!(font.family, "Arial");
        assert_eq!(font.size, 12.0);
        assert_eq!(font.color, "#000000");
        assert_eq!(Fill::default().color(), Some("#FFFFFF"));
        assert_eq!(Border::default().color, "transparent");
    }

    #[test]
    fn test_shadow_css() {
        let shadow = Shadow {
            offset_x: 2.828_427,
            offset_y: 2.828_427,
            blur: 4.0,
            color: "#000000".into(),
        };
        assert_eq!(shadow.css(), "2.83px 2.83px 4px #000000");
    }

    #[test]
    fn test_fill_serializes_with_tag() {
        let json = serde_json::to_value(Fill::Solid {
            color: "#4472C4".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "solid");
        assert_eq!(json["color"], "#4472C4");
    }
}
