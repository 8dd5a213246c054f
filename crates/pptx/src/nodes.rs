//! Lookups shared by the shape-level parsers.
//!
//! The same concept sits under different prefixes depending on where a shape
//! comes from (`p:` on slides, `a:` in clipboard fragments, `dsp:` in diagram
//! drawings), so each lookup tries the known spellings in order.

use deckparse_core::{BaseFields, Node};

const SHAPE_PROPERTY_PATHS: &[&str] = &["p:spPr", "a:spPr", "dsp:spPr", "pic:spPr", "spPr"];

const NON_VISUAL_PATHS: &[&str] = &[
    "p:nvSpPr.p:cNvPr",
    "p:nvPicPr.p:cNvPr",
    "p:nvGraphicFramePr.p:cNvPr",
    "p:nvGrpSpPr.p:cNvPr",
    "p:nvCxnSpPr.p:cNvPr",
    "a:nvSpPr.a:cNvPr",
    "a:nvPicPr.a:cNvPr",
    "a:nvGrpSpPr.a:cNvPr",
    "pic:nvPicPr.pic:cNvPr",
    "dsp:nvSpPr.dsp:cNvPr",
];

const PLACEHOLDER_PATHS: &[&str] = &["p:nvSpPr.p:nvPr.p:ph", "p:nvPicPr.p:nvPr.p:ph"];

/// The shape-properties child (`p:spPr` and its variants).
pub fn shape_properties(node: &Node) -> Option<&Node> {
    node.first_path(SHAPE_PROPERTY_PATHS)
}

/// The transform governing a node's placement.
///
/// Shapes and pictures keep it in their shape properties, graphic frames
/// directly under `p:xfrm`, groups under their group-shape properties.
pub fn transform(node: &Node) -> Option<&Node> {
    shape_properties(node)
        .and_then(|sp| sp.first_path(&["a:xfrm", "xfrm"]))
        .or_else(|| node.first_path(&["p:xfrm", "a:xfrm", "dsp:xfrm"]))
        .or_else(|| {
            node.first_path(&["p:grpSpPr.a:xfrm", "a:grpSpPr.a:xfrm"])
        })
}

/// Non-visual drawing properties (`cNvPr`).
pub fn non_visual(node: &Node) -> Option<&Node> {
    node.first_path(NON_VISUAL_PATHS)
}

/// Placeholder type (`title`, `body`, ...). A placeholder without a type is
/// a body placeholder.
pub fn placeholder_type(node: &Node) -> Option<String> {
    let ph = node.first_path(PLACEHOLDER_PATHS)?;
    Some(ph.attr("type").unwrap_or("body").to_string())
}

/// Record the shape's name and id in a component's metadata.
pub fn record_identity(node: &Node, base: &mut BaseFields) {
    if let Some(nv) = non_visual(node) {
        if let Some(name) = nv.attr("name") {
            base.meta("name", name);
        }
        if let Some(id) = nv.attr("id") {
            base.meta("shapeId", id);
        }
        if let Some(descr) = nv.attr("descr").filter(|d| !d.is_empty()) {
            base.meta("description", descr);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_variants() {
        let sp = Node::from_json_str(r#"{"p:spPr": [{"a:xfrm": [{"$": {"rot": "1"}}]}]}"#).unwrap();
        assert_eq!(transform(&sp).unwrap().attr("rot"), Some("1"));

        let frame = Node::from_json_str(r#"{"p:xfrm": [{"$": {"rot": "2"}}]}"#).unwrap();
        assert_eq!(transform(&frame).unwrap().attr("rot"), Some("2"));

        let group = Node::from_json_str(r#"{"p:grpSpPr": [{"a:xfrm": [{"$": {"rot": "3"}}]}]}"#).unwrap();
        assert_eq!(transform(&group).unwrap().attr("rot"), Some("3"));

        assert!(transform(&Node::Empty).is_none());
    }

    #[test]
    fn test_placeholder_type() {
        let title = Node::from_json_str(
            r#"{"p:nvSpPr": [{"p:nvPr": [{"p:ph": [{"$": {"type": "ctrTitle"}}]}]}]}"#,
        )
        .unwrap();
        assert_eq!(placeholder_type(&title).as_deref(), Some("ctrTitle"));
        let body = Node::from_json_str(r#"{"p:nvSpPr": [{"p:nvPr": [{"p:ph": [""]}]}]}"#).unwrap();
        assert_eq!(placeholder_type(&body).as_deref(), Some("body"));
        assert_eq!(placeholder_type(&Node::Empty), None);
    }
}
