//! Read-only state shared by the parsers while walking one slide.

use crate::package::Package;
use crate::rels::RelationshipTable;
use deckparse_core::{ColorScheme, ExtractOptions, Geometry, Node};

/// Everything a leaf parser may consult besides the node itself.
#[derive(Debug, Clone, Copy)]
pub struct SlideContext<'a> {
    pub package: &'a Package,
    pub rels: &'a RelationshipTable,
    pub scheme: &'a ColorScheme,
    pub options: &'a ExtractOptions,
    /// Path of the part being walked; relationship ids are scoped to it.
    pub part: &'a str,
    pub slide_index: usize,
}

impl<'a> SlideContext<'a> {
    /// Geometry of a transform node at the configured resolution.
    pub fn geometry(&self, xfrm: Option<&Node>) -> Geometry {
        Geometry::from_transform_at(xfrm, self.options.dpi)
    }

    pub fn color(&self, node: Option<&Node>) -> String {
        deckparse_core::parse_color_with(node, self.scheme)
    }

    /// Component identifier: kind prefix, slide and ordinal.
    pub fn component_id(&self, prefix: &str, ordinal: impl std::fmt::Display) -> String {
        format!("{}-{}-{}", prefix, self.slide_index, ordinal)
    }

    /// The same context walking another part (diagram drawings).
    pub fn for_part(&self, part: &'a str) -> Self {
        Self { part, ..*self }
    }
}

impl<'a> SlideContext<'a> {
    /// Transform inherited by a placeholder from the slide layout, then the
    /// slide master, when the shape itself declares none.
    pub fn placeholder_transform(&self, node: &Node) -> Option<&'a Node> {
        let ph = node.first_path(&["p:nvSpPr.p:nvPr.p:ph", "p:nvPicPr.p:nvPr.p:ph"])?;
        let idx = ph.attr("idx");
        let kind = ph.attr("type");

        let mut part = self.part.to_string();
        for rel_suffix in ["/slideLayout", "/slideMaster"] {
            let next = self
                .rels
                .for_part(&part)
                .find(|rel| rel.rel_type.ends_with(rel_suffix))?
                .target
                .clone();
            let tree = self.package.xml(&next)?;
            let root = tree.first_path(&["p:sldLayout", "p:sldMaster"])?;
            if let Some(xfrm) = root
                .path("p:cSld.p:spTree")
                .and_then(|t| find_placeholder_transform(t, idx, kind))
            {
                return Some(xfrm);
            }
            part = next;
        }
        None
    }
}

fn find_placeholder_transform<'n>(
    tree: &'n Node,
    idx: Option<&str>,
    kind: Option<&str>,
) -> Option<&'n Node> {
    let candidates = tree.children("p:sp");
    let matches = |sp: &&Node, by_idx: bool| {
        let Some(ph) = sp.path("p:nvSpPr.p:nvPr.p:ph") else {
            return false;
        };
        if by_idx {
            idx.is_some() && ph.attr("idx") == idx
        } else {
            let theirs = ph.attr("type").unwrap_or("body");
            let ours = kind.unwrap_or("body");
            theirs == ours || (is_title(theirs) && is_title(ours))
        }
    };
    candidates
        .iter()
        .copied()
        .find(|sp| matches(sp, true))
        .or_else(|| candidates.iter().copied().find(|sp| matches(sp, false)))
        .and_then(|sp| sp.path("p:spPr.a:xfrm"))
}

fn is_title(kind: &str) -> bool {
    matches!(kind, "title" | "ctrTitle")
}
