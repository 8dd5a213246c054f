//! Canonical, renderer-agnostic visual components.

use crate::geometry::Geometry;
use crate::richtext::RichText;
use crate::style::{Border, Effects, Fill, Font, TextAlign, VerticalAlign};
use serde::Serialize;
use std::collections::BTreeMap;

/// Free-form diagnostics and provenance attached to a component.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Component kind discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Text,
    Shape,
    Image,
    Table,
    Diagram,
    Unknown,
}

impl ComponentKind {
    /// Prefix used in component identifiers.
    pub fn prefix(&self) -> &'static str {
        match self {
            ComponentKind::Text => "text",
            ComponentKind::Shape => "shape",
            ComponentKind::Image => "image",
            ComponentKind::Table => "table",
            ComponentKind::Diagram => "diagram",
            ComponentKind::Unknown => "unknown",
        }
    }
}

/// Fields shared by every component.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseFields {
    pub id: String,
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    /// Clockwise degrees.
    pub rotation: f64,
    pub slide_index: usize,
    pub z_index: i64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
}

impl BaseFields {
    pub fn new(id: impl Into<String>, geometry: Geometry, slide_index: usize, z_index: i64) -> Self {
        Self {
            id: id.into(),
            x: geometry.x,
            y: geometry.y,
            width: geometry.width,
            height: geometry.height,
            rotation: geometry.rotation,
            slide_index,
            z_index,
            metadata: Metadata::new(),
        }
    }

    pub fn geometry(&self) -> Geometry {
        Geometry {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            rotation: self.rotation,
            ..Geometry::default()
        }
    }

    pub fn set_geometry(&mut self, g: Geometry) {
        self.x = g.x;
        self.y = g.y;
        self.width = g.width;
        self.height = g.height;
        self.rotation = g.rotation;
    }

    /// Insert a metadata entry.
    pub fn meta(&mut self, key: &str, value: impl Into<serde_json::Value>) {
        self.metadata.insert(key.to_string(), value.into());
    }
}

/// Shape drawn behind a text component (diagram nodes).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundShape {
    pub shape_type: String,
    pub fill: Fill,
    pub border: Border,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextComponent {
    #[serde(flatten)]
    pub base: BaseFields,
    /// Plain text, paragraphs separated by newlines.
    pub content: String,
    pub rich_text: RichText,
    pub font: Font,
    pub alignment: TextAlign,
    pub vertical_align: VerticalAlign,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_shape: Option<BackgroundShape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder_type: Option<String>,
    pub is_title: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeComponent {
    #[serde(flatten)]
    pub base: BaseFields,
    /// Human-readable description, e.g. `ellipse shape`.
    pub content: String,
    pub shape_type: String,
    /// Vector paths of custom geometry; not extracted yet.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
    pub fill: Fill,
    pub border: Border,
    #[serde(skip_serializing_if = "Effects::is_empty")]
    pub effects: Effects,
}

/// Cropping, in percent of the source image per side.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Crop {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Crop {
    pub fn is_empty(&self) -> bool {
        self.left == 0.0 && self.top == 0.0 && self.right == 0.0 && self.bottom == 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageEffects {
    /// Linear opacity, 0..=1.
    pub opacity: f64,
    pub grayscale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bilevel_threshold: Option<f64>,
    /// CSS filter hint combining the flags above.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl Default for ImageEffects {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            grayscale: false,
            bilevel_threshold: None,
            filter: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageComponent {
    #[serde(flatten)]
    pub base: BaseFields,
    /// Directly displayable payload (data URL), empty when unresolved.
    pub content: String,
    pub image_url: Option<String>,
    /// Lower-case format name, `unknown` when unresolved.
    pub image_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub natural_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub natural_height: Option<u32>,
    #[serde(skip_serializing_if = "Crop::is_empty")]
    pub crop: Crop,
    pub effects: ImageEffects,
    pub is_background: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    pub text: String,
    pub row_span: u32,
    pub col_span: u32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub merged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    /// Pixels.
    pub height: i64,
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableComponent {
    #[serde(flatten)]
    pub base: BaseFields,
    /// Cell text, tab-separated columns and newline-separated rows.
    pub content: String,
    /// Pixels.
    pub column_widths: Vec<i64>,
    pub rows: Vec<TableRow>,
    pub header_row: bool,
}

/// Connection between two diagram data points.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramConnection {
    pub model_id: String,
    pub source_id: String,
    pub destination_id: String,
    pub source_order: u32,
    pub destination_order: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramComponent {
    #[serde(flatten)]
    pub base: BaseFields,
    pub content: String,
    /// Layout category (list, process, cycle, ...).
    pub layout: String,
    pub components: Vec<Component>,
    pub connections: Vec<DiagramConnection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnknownComponent {
    #[serde(flatten)]
    pub base: BaseFields,
    pub content: String,
}

/// A visual component.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Component {
    Text(TextComponent),
    Shape(ShapeComponent),
    Image(ImageComponent),
    Table(TableComponent),
    Diagram(DiagramComponent),
    Unknown(UnknownComponent),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Text(_) => ComponentKind::Text,
            Component::Shape(_) => ComponentKind::Shape,
            Component::Image(_) => ComponentKind::Image,
            Component::Table(_) => ComponentKind::Table,
            Component::Diagram(_) => ComponentKind::Diagram,
            Component::Unknown(_) => ComponentKind::Unknown,
        }
    }

    pub fn base(&self) -> &BaseFields {
        match self {
            Component::Text(c) => &c.base,
            Component::Shape(c) => &c.base,
            Component::Image(c) => &c.base,
            Component::Table(c) => &c.base,
            Component::Diagram(c) => &c.base,
            Component::Unknown(c) => &c.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut BaseFields {
        match self {
            Component::Text(c) => &mut c.base,
            Component::Shape(c) => &mut c.base,
            Component::Image(c) => &mut c.base,
            Component::Table(c) => &mut c.base,
            Component::Diagram(c) => &mut c.base,
            Component::Unknown(c) => &mut c.base,
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    /// The kind-specific `content` field.
    pub fn content(&self) -> &str {
        match self {
            Component::Text(c) => &c.content,
            Component::Shape(c) => &c.content,
            Component::Image(c) => &c.content,
            Component::Table(c) => &c.content,
            Component::Diagram(c) => &c.content,
            Component::Unknown(c) => &c.content,
        }
    }

    pub fn as_text(&self) -> Option<&TextComponent> {
        match self {
            Component::Text(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_shape(&self) -> Option<&ShapeComponent> {
        match self {
            Component::Shape(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageComponent> {
        match self {
            Component::Image(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&TableComponent> {
        match self {
            Component::Table(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_diagram(&self) -> Option<&DiagramComponent> {
        match self {
            Component::Diagram(c) => Some(c),
            _ => None,
        }
    }

    /// Zero width and height: never rendered.
    pub fn is_degenerate(&self) -> bool {
        let b = self.base();
        b.width == 0 && b.height == 0
    }
}
