//! Fixtures shared by the parser tests.

use crate::context::SlideContext;
use crate::package::Package;
use crate::rels::RelationshipTable;
use crate::xml::parse_xml;
use deckparse_core::{ColorScheme, ExtractOptions, Node};

pub const SLIDE_PART: &str = "ppt/slides/slide1.xml";

pub struct Fixture {
    pub package: Package,
    pub rels: RelationshipTable,
    pub scheme: ColorScheme,
    pub options: ExtractOptions,
}

impl Fixture {
    pub fn ctx(&self) -> SlideContext<'_> {
        SlideContext {
            package: &self.package,
            rels: &self.rels,
            scheme: &self.scheme,
            options: &self.options,
            part: SLIDE_PART,
            slide_index: 0,
        }
    }
}

/// A fixture over an empty one-slide deck.
pub fn fixture() -> Fixture {
    fixture_with(Package::new())
}

/// A fixture over `package`, with relationship tables built from it.
pub fn fixture_with(mut package: Package) -> Fixture {
    if !package.contains(SLIDE_PART) {
        package.insert_xml(SLIDE_PART, xml("<p:sld/>"));
    }
    bare_fixture(package)
}

/// A fixture over `package` exactly as given (no slide part is added).
pub fn bare_fixture(package: Package) -> Fixture {
    let rels = RelationshipTable::build(&package);
    Fixture {
        package,
        rels,
        scheme: ColorScheme::default(),
        options: ExtractOptions::default(),
    }
}

pub fn xml(s: &str) -> Node {
    parse_xml(s).unwrap()
}

/// A `p:sp` element with the given shape-properties content and trailing body.
pub fn shape_xml(sp_pr: &str, body: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="5" name="Shape 4"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr>{}</p:spPr>{}</p:sp>"#,
        sp_pr, body
    )
}

/// Relationship part XML listing `(id, type suffix, target)` entries.
pub fn rels_xml(entries: &[(&str, &str, &str)]) -> String {
    let mut out = String::from("<Relationships>");
    for (id, kind, target) in entries {
        out.push_str(&format!(
            r#"<Relationship Id="{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/{}" Target="{}"/>"#,
            id, kind, target
        ));
    }
    out.push_str("</Relationships>");
    out
}

/// A minimal valid PNG header for a `width` x `height` image.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
    bytes
}
