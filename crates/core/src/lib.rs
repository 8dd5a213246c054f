//! Core types for turning PowerPoint document trees into canonical visual
//! components: the tree accessor, unit and colour utilities, geometry, and
//! the component data model.

pub mod color;
pub mod component;
pub mod error;
pub mod geometry;
pub mod options;
pub mod richtext;
pub mod style;
pub mod tree;
pub mod units;

pub use color::{parse_color, parse_color_with, ColorScheme};
pub use component::{
    BackgroundShape, BaseFields, Component, ComponentKind, Crop, DiagramComponent,
    DiagramConnection, ImageComponent, ImageEffects, Metadata, ShapeComponent, TableCell,
    TableComponent, TableRow, TextComponent, UnknownComponent,
};
pub use error::{Error, Result};
pub use geometry::{ComposedTransform, Geometry, GroupTransform};
pub use options::ExtractOptions;
pub use richtext::{Block, ListKind, Mark, Paragraph, RichText, TextRun};
pub use style::{
    Border, BorderStyle, Effects, Fill, Font, FontStyle, FontWeight, Shadow, TextAlign,
    TextDecoration, VerticalAlign,
};
pub use tree::{local_name, Element, Node};
