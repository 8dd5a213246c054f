//! PowerPoint (Office Open XML) component extraction.
//!
//! Loads a package (a `.pptx` archive, a clipboard fragment or a bare tree),
//! resolves relationships and media, and turns every slide's shapes into
//! positioned, styled [`deckparse_core::Component`]s.

pub mod context;
pub mod diagram;
pub mod extract;
pub mod image;
pub mod media;
pub mod nodes;
pub mod package;
pub mod rels;
pub mod shape;
pub mod table;
pub mod text;
pub mod xml;

#[cfg(test)]
mod testing;

pub use context::SlideContext;
pub use extract::{extract, extract_tree, Diagnostic, Extraction, Extractor};
pub use package::{Package, PackageFlavor, Part};
pub use rels::{Relationship, RelationshipTable};
pub use xml::parse_xml;
