//! Package file table: normalized part paths mapped to parsed trees or bytes.

use crate::xml::parse_xml;
use deckparse_core::{ColorScheme, Error, Node, Result};
use std::collections::BTreeMap;
use std::io::{Read, Seek};
use zip::ZipArchive;

/// Default slide size (10in x 7.5in) in EMU.
pub const DEFAULT_SLIDE_SIZE_EMU: (f64, f64) = (9_144_000.0, 6_858_000.0);

/// One part of a package.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    /// An XML part, already converted to a tree.
    Xml(Node),
    /// Raw bytes (media, embedded objects, unparseable XML).
    Binary(Vec<u8>),
}

/// Which path conventions a package follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageFlavor {
    /// A normally authored deck (`ppt/slides/slideN.xml`).
    Deck,
    /// A clipboard paste (`clipboard/drawings/...`).
    Clipboard,
    /// Anything else: bare trees, partial packages.
    Fragment,
}

impl PackageFlavor {
    /// Directory holding this flavor's media parts.
    pub fn media_root(&self) -> &'static str {
        match self {
            PackageFlavor::Deck => "ppt/media",
            PackageFlavor::Clipboard => "clipboard/media",
            PackageFlavor::Fragment => "media",
        }
    }
}

/// The package file table handed to extraction.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: BTreeMap<String, Part>,
}

impl Package {
    /// Create an empty package.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a single bare tree as a one-part fragment package.
    pub fn from_tree(tree: Node) -> Self {
        let mut package = Self::new();
        package.insert_xml("fragment.xml", tree);
        package
    }

    /// Load a package from a ZIP archive.
    ///
    /// `.xml` and `.rels` parts are converted to trees; a part that fails to
    /// parse is kept as bytes so extraction can still report it.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut package = Self::new();
        for index in 0..archive.len() {
            let mut file = archive
                .by_index(index)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", index, e)))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut bytes = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut bytes)
                .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", name, e)))?;

            if is_xml_path(&name) {
                let parsed = std::str::from_utf8(strip_bom(&bytes))
                    .map_err(|e| Error::XmlError(e.to_string()))
                    .and_then(parse_xml);
                match parsed {
                    Ok(tree) => package.insert_xml(&name, tree),
                    Err(e) => {
                        log::warn!("Keeping unparseable XML part '{}' as bytes: {}", name, e);
                        package.insert_binary(&name, bytes);
                    }
                }
            } else {
                package.insert_binary(&name, bytes);
            }
        }
        log::debug!("Loaded package with {} parts", package.parts.len());
        Ok(package)
    }

    pub fn insert_xml(&mut self, path: &str, tree: Node) {
        self.parts.insert(normalize_path(path), Part::Xml(tree));
    }

    pub fn insert_binary(&mut self, path: &str, bytes: Vec<u8>) {
        self.parts.insert(normalize_path(path), Part::Binary(bytes));
    }

    pub fn part(&self, path: &str) -> Option<&Part> {
        self.parts.get(&normalize_path(path))
    }

    /// Parsed tree of an XML part.
    pub fn xml(&self, path: &str) -> Option<&Node> {
        match self.part(path)? {
            Part::Xml(node) => Some(node),
            Part::Binary(_) => None,
        }
    }

    /// Bytes of a binary part.
    pub fn bytes(&self, path: &str) -> Option<&[u8]> {
        match self.part(path)? {
            Part::Binary(bytes) => Some(bytes),
            Part::Xml(_) => None,
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.parts.contains_key(&normalize_path(path))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    pub fn xml_parts(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.parts.iter().filter_map(|(path, part)| match part {
            Part::Xml(node) => Some((path.as_str(), node)),
            Part::Binary(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Detect the path conventions this package follows.
    pub fn flavor(&self) -> PackageFlavor {
        if self
            .paths()
            .any(|p| p.starts_with("ppt/slides/") && !p.contains("/_rels/"))
        {
            PackageFlavor::Deck
        } else if self
            .paths()
            .any(|p| p.contains("clipboard/") && p.contains("drawings/"))
        {
            PackageFlavor::Clipboard
        } else {
            PackageFlavor::Fragment
        }
    }

    /// Media parts (images and other binaries under a `media/` directory).
    pub fn media_paths(&self) -> Vec<&str> {
        self.parts
            .iter()
            .filter(|(path, part)| {
                matches!(part, Part::Binary(_))
                    && (path.contains("/media/") || path.starts_with("media/"))
            })
            .map(|(path, _)| path.as_str())
            .collect()
    }

    /// Slide-bearing parts in presentation order.
    ///
    /// Parts are listed by name whether or not they parsed, so an unreadable
    /// slide keeps its position and is reported by extraction.
    pub fn slide_paths(&self) -> Vec<String> {
        match self.flavor() {
            PackageFlavor::Deck => self.deck_slide_paths(),
            PackageFlavor::Clipboard => {
                let mut paths: Vec<String> = self
                    .paths()
                    .filter(|p| {
                        p.contains("drawings/") && is_xml_path(p) && !is_relationship_path(p)
                    })
                    .map(str::to_string)
                    .collect();
                sort_by_number(&mut paths);
                paths
            }
            PackageFlavor::Fragment => self
                .paths()
                .filter(|p| {
                    is_xml_path(p)
                        && !is_relationship_path(p)
                        && !p.ends_with("[Content_Types].xml")
                        && !is_support_part(p)
                })
                .map(str::to_string)
                .collect(),
        }
    }

    fn deck_slide_paths(&self) -> Vec<String> {
        let mut from_rels: Vec<String> = Vec::new();
        if let Some(list) = self.xml("ppt/presentation.xml").and_then(|p| {
            p.path("p:presentation.p:sldIdLst")
        }) {
            let targets = self.relationship_targets("ppt/_rels/presentation.xml.rels");
            for entry in list.children("p:sldId") {
                let Some(rid) = entry.attr("r:id") else {
                    continue;
                };
                if let Some(target) = targets.get(rid) {
                    let path = crate::rels::resolve_target("ppt/presentation.xml", target);
                    if self.contains(&path) {
                        from_rels.push(path);
                    }
                }
            }
        }
        if !from_rels.is_empty() {
            return from_rels;
        }

        let mut paths: Vec<String> = self
            .paths()
            .filter(|p| {
                p.starts_with("ppt/slides/")
                    && !is_relationship_path(p)
                    && p.ends_with(".xml")
                    && p.rsplit('/').next().is_some_and(|f| f.starts_with("slide"))
            })
            .map(str::to_string)
            .collect();
        sort_by_number(&mut paths);
        paths
    }

    fn relationship_targets(&self, rels_path: &str) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        if let Some(rels) = self.xml(rels_path) {
            for rel in rels.path("Relationships").map(|r| r.children("Relationship")).unwrap_or_default() {
                if let (Some(id), Some(target)) = (rel.attr("Id"), rel.attr("Target")) {
                    out.insert(id.to_string(), target.to_string());
                }
            }
        }
        out
    }

    /// Slide size in EMU from `p:sldSz`, or the 4:3 default.
    pub fn slide_size_emu(&self) -> (f64, f64) {
        let size = self
            .xml("ppt/presentation.xml")
            .and_then(|p| p.path("p:presentation.p:sldSz"));
        match size {
            Some(node) => (
                node.attr_f64("cx").unwrap_or(DEFAULT_SLIDE_SIZE_EMU.0),
                node.attr_f64("cy").unwrap_or(DEFAULT_SLIDE_SIZE_EMU.1),
            ),
            None => DEFAULT_SLIDE_SIZE_EMU,
        }
    }

    /// Colour scheme from the first theme part, or the stock scheme.
    pub fn color_scheme(&self) -> ColorScheme {
        self.xml_parts()
            .filter(|(p, _)| p.contains("theme/theme") && p.ends_with(".xml"))
            .find_map(|(_, tree)| tree.path("a:theme.a:themeElements.a:clrScheme"))
            .map(ColorScheme::from_theme)
            .unwrap_or_default()
    }
}

/// Strip a leading slash and backslashes from a package path.
pub fn normalize_path(path: &str) -> String {
    path.trim_start_matches('/').replace('\\', "/")
}

/// Whether a path names a relationship part (`*_rels*.xml.rels`).
pub fn is_relationship_path(path: &str) -> bool {
    path.contains("_rels") && path.ends_with(".rels")
}

fn is_xml_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.ends_with(".xml") || lower.ends_with(".rels")
}

/// Parts that style or describe slides rather than carry shapes.
fn is_support_part(path: &str) -> bool {
    const SUPPORT_DIRS: &[&str] = &["theme/", "docProps/", "slideLayouts/", "slideMasters/"];
    const DIAGRAM_PARTS: &[&str] = &["data", "layout", "quickStyle", "colors", "drawing"];
    if SUPPORT_DIRS.iter().any(|dir| path.starts_with(dir) || path.contains(&format!("/{}", dir))) {
        return true;
    }
    let file = path.rsplit('/').next().unwrap_or(path);
    path.contains("diagrams/") && DIAGRAM_PARTS.iter().any(|prefix| file.starts_with(prefix))
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes)
}

fn sort_by_number(paths: &mut [String]) {
    paths.sort_by(|a, b| match (extract_number(a), extract_number(b)) {
        (Some(na), Some(nb)) => na.cmp(&nb).then_with(|| a.cmp(b)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.cmp(b),
    });
}

/// Extract a trailing number from a string like "rId2" or "slide3.xml".
pub fn extract_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".rels").trim_end_matches(".xml");
    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn xml(s: &str) -> Node {
        parse_xml(s).unwrap()
    }

    #[test]
    fn test_extract_number() {
        assert_eq!(extract_number("rId1"), Some(1));
        assert_eq!(extract_number("rId12"), Some(12));
        assert_eq!(extract_number("ppt/slides/slide1.xml"), Some(1));
        assert_eq!(extract_number("slide123.xml"), Some(123));
        assert_eq!(extract_number("nodigits"), None);
    }

    #[test]
    fn test_flavor_detection() {
        let mut deck = Package::new();
        deck.insert_xml("ppt/slides/slide1.xml", xml("<p:sld/>"));
        assert_eq!(deck.flavor(), PackageFlavor::Deck);

        let mut clip = Package::new();
        clip.insert_xml("clipboard/drawings/drawing1.xml", xml("<a:graphic/>"));
        assert_eq!(clip.flavor(), PackageFlavor::Clipboard);
        assert_eq!(clip.flavor().media_root(), "clipboard/media");

        let bare = Package::from_tree(Node::Empty);
        assert_eq!(bare.flavor(), PackageFlavor::Fragment);
        assert_eq!(bare.slide_paths(), vec!["fragment.xml".to_string()]);
    }

    #[test]
    fn test_slides_sorted_numerically_without_presentation() {
        let mut deck = Package::new();
        for n in [10, 2, 1] {
            deck.insert_xml(&format!("ppt/slides/slide{}.xml", n), xml("<p:sld/>"));
        }
        deck.insert_xml(
            "ppt/slides/_rels/slide1.xml.rels",
            xml("<Relationships/>"),
        );
        assert_eq!(
            deck.slide_paths(),
            vec![
                "ppt/slides/slide1.xml",
                "ppt/slides/slide2.xml",
                "ppt/slides/slide10.xml"
            ]
        );
    }

    #[test]
    fn test_unparsed_slides_stay_listed() {
        let mut deck = Package::new();
        deck.insert_binary("ppt/slides/slide1.xml", b"<p:sld".to_vec());
        deck.insert_xml("ppt/slides/slide2.xml", xml("<p:sld/>"));
        deck.insert_binary("ppt/slides/notes.bin", vec![0]);
        assert_eq!(
            deck.slide_paths(),
            vec!["ppt/slides/slide1.xml", "ppt/slides/slide2.xml"]
        );
    }

    #[test]
    fn test_fragment_skips_support_parts() {
        let mut fragment = Package::new();
        fragment.insert_xml("drawing.xml", xml("<a:graphic/>"));
        fragment.insert_xml(
            "theme/theme1.xml",
            xml(r#"<a:theme><a:themeElements><a:fontScheme><a:majorFont><a:latin typeface="Calibri Light"/></a:majorFont></a:fontScheme></a:themeElements></a:theme>"#),
        );
        fragment.insert_xml("docProps/app.xml", xml("<Properties/>"));
        fragment.insert_xml("ppt/slideLayouts/slideLayout1.xml", xml("<p:sldLayout/>"));
        fragment.insert_xml("ppt/diagrams/quickStyle1.xml", xml("<dgm:styleDef/>"));
        fragment.insert_xml("ppt/diagrams/colors1.xml", xml("<dgm:colorsDef/>"));
        fragment.insert_binary("broken.xml", b"<a:sp".to_vec());
        assert_eq!(fragment.flavor(), PackageFlavor::Fragment);
        assert_eq!(fragment.slide_paths(), vec!["broken.xml", "drawing.xml"]);
    }

    #[test]
    fn test_slides_follow_presentation_order() {
        let mut deck = Package::new();
        deck.insert_xml("ppt/slides/slide1.xml", xml("<p:sld/>"));
        deck.insert_xml("ppt/slides/slide2.xml", xml("<p:sld/>"));
        deck.insert_xml(
            "ppt/presentation.xml",
            xml(r#"<p:presentation><p:sldIdLst><p:sldId id="256" r:id="rId3"/><p:sldId id="257" r:id="rId2"/></p:sldIdLst><p:sldSz cx="12192000" cy="6858000"/></p:presentation>"#),
        );
        deck.insert_xml(
            "ppt/_rels/presentation.xml.rels",
            xml(r#"<Relationships><Relationship Id="rId2" Target="slides/slide1.xml"/><Relationship Id="rId3" Target="slides/slide2.xml"/></Relationships>"#),
        );
        assert_eq!(
            deck.slide_paths(),
            vec!["ppt/slides/slide2.xml", "ppt/slides/slide1.xml"]
        );
        assert_eq!(deck.slide_size_emu(), (12_192_000.0, 6_858_000.0));
    }

    #[test]
    fn test_color_scheme_from_theme() {
        let mut deck = Package::new();
        deck.insert_xml(
            "ppt/theme/theme1.xml",
            xml(r#"<a:theme><a:themeElements><a:clrScheme name="x"><a:accent1><a:srgbClr val="112233"/></a:accent1></a:clrScheme></a:themeElements></a:theme>"#),
        );
        assert_eq!(deck.color_scheme().accent1, "#112233");
        assert_eq!(Package::new().color_scheme(), ColorScheme::default());
    }

    #[test]
    fn test_from_reader_splits_xml_and_media() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            let options = zip::write::FileOptions::default();
            writer.start_file("ppt/slides/slide1.xml", options).unwrap();
            writer.write_all(b"<p:sld><p:cSld/></p:sld>").unwrap();
            writer.start_file("ppt/media/image1.png", options).unwrap();
            writer.write_all(&[0x89, b'P', b'N', b'G']).unwrap();
            writer.start_file("ppt/slides/slide2.xml", options).unwrap();
            writer.write_all(b"<p:sld><broken").unwrap();
            writer.finish().unwrap();
        }
        buf.set_position(0);
        let package = Package::from_reader(buf).unwrap();
        assert!(package.xml("ppt/slides/slide1.xml").is_some());
        assert_eq!(package.bytes("ppt/media/image1.png").map(|b| b.len()), Some(4));
        assert!(package.bytes("ppt/slides/slide2.xml").is_some());
        assert_eq!(package.media_paths(), vec!["ppt/media/image1.png"]);
    }

    #[test]
    fn test_from_reader_rejects_non_zip() {
        assert!(Package::from_reader(Cursor::new(b"not a zip".to_vec())).is_err());
    }
}
