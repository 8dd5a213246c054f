//! Relationship resolution: short identifiers to concrete part paths.

use crate::package::{is_relationship_path, normalize_path, Package, PackageFlavor};
use std::collections::BTreeMap;

/// One `Relationship` record with its target already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    /// Normalized package path, or the verbatim URL for external targets.
    pub target: String,
    pub rel_type: String,
    pub external: bool,
    /// The relationship part this record came from.
    pub source: String,
}

/// Relationship tables for every relationship part of a package.
#[derive(Debug, Clone, Default)]
pub struct RelationshipTable {
    by_part: BTreeMap<String, BTreeMap<String, Relationship>>,
    flavor: Option<PackageFlavor>,
}

impl RelationshipTable {
    /// Collect every `*_rels*.rels` part of `package`.
    pub fn build(package: &Package) -> Self {
        let mut by_part = BTreeMap::new();
        for (path, tree) in package.xml_parts() {
            if !is_relationship_path(path) {
                continue;
            }
            let owner = owner_part(path);
            let mut records = BTreeMap::new();
            let entries = tree
                .path("Relationships")
                .map(|r| r.children("Relationship"))
                .unwrap_or_default();
            for rel in entries {
                let (Some(id), Some(target)) = (rel.attr("Id"), rel.attr("Target")) else {
                    continue;
                };
                let external = rel.attr("TargetMode") == Some("External");
                let resolved = if external {
                    target.to_string()
                } else {
                    resolve_target(&owner, target)
                };
                records.insert(
                    id.to_string(),
                    Relationship {
                        id: id.to_string(),
                        target: resolved,
                        rel_type: rel.attr("Type").unwrap_or_default().to_string(),
                        external,
                        source: path.to_string(),
                    },
                );
            }
            by_part.insert(path.to_string(), records);
        }
        Self {
            by_part,
            flavor: Some(package.flavor()),
        }
    }

    /// Relationships declared by `part` itself.
    pub fn for_part(&self, part: &str) -> impl Iterator<Item = &Relationship> {
        self.by_part
            .get(&rels_path_for(part))
            .into_iter()
            .flat_map(|records| records.values())
    }

    /// Resolve `id` as seen from `part`.
    ///
    /// Falls back to the flattened slide/drawing relationship tables when the
    /// part's own table does not know the identifier.
    pub fn resolve(&self, part: &str, id: &str) -> Option<&Relationship> {
        if let Some(rel) = self
            .by_part
            .get(&rels_path_for(part))
            .and_then(|records| records.get(id))
        {
            return Some(rel);
        }
        self.flattened_slide_rels().find(|rel| rel.id == id)
    }

    /// Every record from slide-like relationship parts, in path order.
    pub fn flattened_slide_rels(&self) -> impl Iterator<Item = &Relationship> {
        self.by_part
            .iter()
            .filter(|(path, _)| is_slide_rels(path))
            .flat_map(|(_, records)| records.values())
    }

    pub fn flavor(&self) -> Option<PackageFlavor> {
        self.flavor
    }

    pub fn is_empty(&self) -> bool {
        self.by_part.values().all(BTreeMap::is_empty)
    }
}

fn is_slide_rels(path: &str) -> bool {
    path.contains("slides/_rels/") || path.contains("drawings/_rels/") || path.starts_with("_rels/")
}

/// Path of the relationship part describing `part`.
pub fn rels_path_for(part: &str) -> String {
    let part = normalize_path(part);
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// The part a relationship part describes (`ppt/slides/_rels/slide1.xml.rels`
/// describes `ppt/slides/slide1.xml`).
pub fn owner_part(rels_path: &str) -> String {
    let rels_path = normalize_path(rels_path);
    let file = rels_path.rsplit('/').next().unwrap_or_default();
    let file = file.strip_suffix(".rels").unwrap_or(file);
    let dir = rels_path
        .strip_suffix(&format!("_rels/{}.rels", file))
        .unwrap_or_default();
    format!("{}{}", dir, file)
}

/// Resolve a relationship target relative to the directory of `source_part`.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return normalize_path(absolute);
    }
    let source = normalize_path(source_part);
    let mut segments: Vec<&str> = match source.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Locate the bytes for a resolved target, retrying under the flavor's media
/// root by file name when the exact path is absent.
pub fn locate_media<'a>(package: &'a Package, target: &str) -> Option<(String, &'a [u8])> {
    if let Some(bytes) = package.bytes(target) {
        return Some((normalize_path(target), bytes));
    }
    let file = target.rsplit('/').next()?;
    let retry = format!("{}/{}", package.flavor().media_root(), file);
    package.bytes(&retry).map(|bytes| (retry, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_xml;

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "../media/image1.png"),
            "ppt/media/image1.png"
        );
        assert_eq!(
            resolve_target("clipboard/drawings/drawing1.xml", "../media/image1.png"),
            "clipboard/media/image1.png"
        );
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "/ppt/media/image2.jpeg"),
            "ppt/media/image2.jpeg"
        );
        assert_eq!(
            resolve_target("ppt/presentation.xml", "slides/slide1.xml"),
            "ppt/slides/slide1.xml"
        );
    }

    #[test]
    fn test_rels_and_owner_paths() {
        assert_eq!(
            rels_path_for("ppt/slides/slide1.xml"),
            "ppt/slides/_rels/slide1.xml.rels"
        );
        assert_eq!(
            owner_part("ppt/slides/_rels/slide1.xml.rels"),
            "ppt/slides/slide1.xml"
        );
        assert_eq!(owner_part("_rels/.rels"), "");
    }

    fn package() -> Package {
        let mut package = Package::new();
        package.insert_xml("ppt/slides/slide1.xml", parse_xml("<p:sld/>").unwrap());
        package.insert_xml("ppt/slides/slide2.xml", parse_xml("<p:sld/>").unwrap());
        package.insert_xml(
            "ppt/slides/_rels/slide1.xml.rels",
            parse_xml(
                r#"<Relationships>
                    <Relationship Id="rId2" Type="http://x/image" Target="../media/image1.png"/>
                    <Relationship Id="rId3" Type="http://x/hyperlink" Target="https://example.com" TargetMode="External"/>
                </Relationships>"#,
            )
            .unwrap(),
        );
        package.insert_xml(
            "ppt/slides/_rels/slide2.xml.rels",
            parse_xml(r#"<Relationships><Relationship Id="rId2" Target="../media/image2.png"/><Relationship Id="rId9" Target="../media/image9.png"/></Relationships>"#)
                .unwrap(),
        );
        package.insert_binary("ppt/media/image1.png", vec![1, 2, 3]);
        package
    }

    #[test]
    fn test_resolution_is_scoped_to_the_part() {
        let table = RelationshipTable::build(&package());
        assert_eq!(
            table.resolve("ppt/slides/slide1.xml", "rId2").unwrap().target,
            "ppt/media/image1.png"
        );
        assert_eq!(
            table.resolve("ppt/slides/slide2.xml", "rId2").unwrap().target,
            "ppt/media/image2.png"
        );
        let external = table.resolve("ppt/slides/slide1.xml", "rId3").unwrap();
        assert!(external.external);
        assert_eq!(external.target, "https://example.com");
    }

    #[test]
    fn test_resolution_falls_back_to_flattened_table() {
        let table = RelationshipTable::build(&package());
        assert_eq!(
            table.resolve("ppt/slides/slide1.xml", "rId9").unwrap().target,
            "ppt/media/image9.png"
        );
        assert!(table.resolve("ppt/slides/slide1.xml", "rId404").is_none());
        assert_eq!(table.for_part("ppt/slides/slide1.xml").count(), 2);
    }

    #[test]
    fn test_locate_media_retries_under_media_root() {
        let package = package();
        let (path, bytes) = locate_media(&package, "ppt/slides/media/image1.png").unwrap();
        assert_eq!(path, "ppt/media/image1.png");
        assert_eq!(bytes, &[1, 2, 3]);
        assert!(locate_media(&package, "ppt/media/missing.png").is_none());
    }
}
