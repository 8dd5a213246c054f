//! Text component parser.

use crate::context::SlideContext;
use crate::nodes;
use deckparse_core::units::font_size_to_points;
use deckparse_core::{
    BaseFields, Component, Font, FontStyle, FontWeight, ListKind, Mark, Node, Paragraph, Result,
    RichText, TextAlign, TextComponent, TextDecoration, TextRun, VerticalAlign,
};

const TEXT_BODY_PATHS: &[&str] = &[
    "p:txBody",
    "a:txBody",
    "dsp:txBody",
    "a:txSp.a:txBody",
    "txBody",
];

/// The text-body child of a shape-like node, under any known spelling.
pub fn text_body(node: &Node) -> Option<&Node> {
    node.first_path(TEXT_BODY_PATHS)
}

/// Text of one paragraph: runs and fields concatenated, line breaks as `\n`.
pub fn paragraph_text(paragraph: &Node) -> String {
    let mut out = String::new();
    for (tag, child) in paragraph.child_elements() {
        match tag {
            "a:r" | "a:fld" => {
                if let Some(text) = child.path("a:t").and_then(Node::text) {
                    out.push_str(text);
                }
            }
            "a:br" => out.push('\n'),
            _ => {}
        }
    }
    out
}

/// Plain text of a text body: paragraphs joined by newlines, trimmed.
pub fn body_text(body: &Node) -> String {
    body.children("a:p")
        .into_iter()
        .map(paragraph_text)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Whether `node` carries a text body with non-blank text.
pub fn has_text(node: &Node) -> bool {
    text_body(node).is_some_and(|body| !body_text(body).is_empty())
}

/// Properties of the first run of the first paragraph, falling back to the
/// paragraph's end-of-paragraph properties.
pub fn first_run_properties(body: &Node) -> Option<&Node> {
    let first = body.children("a:p").into_iter().next()?;
    first
        .children("a:r")
        .into_iter()
        .next()
        .and_then(|r| r.get("a:rPr"))
        .or_else(|| first.get("a:endParaRPr"))
}

/// Font described by a run-properties node.
pub fn run_font(rpr: Option<&Node>, ctx: &SlideContext) -> Font {
    let mut font = Font::default();
    let Some(rpr) = rpr else {
        return font;
    };
    font.size = font_size_to_points(rpr.attr_f64("sz"));
    if is_on(rpr.attr("b")) {
        font.weight = FontWeight::Bold;
    }
    if is_on(rpr.attr("i")) {
        font.style = FontStyle::Italic;
    }
    if rpr.attr("u").is_some_and(|u| u != "none") {
        font.decoration = TextDecoration::Underline;
    }
    if let Some(family) = typeface(rpr) {
        font.family = family.to_string();
    }
    if let Some(fill) = rpr.get("a:solidFill") {
        font.color = ctx.color(Some(fill));
    }
    font
}

fn typeface(rpr: &Node) -> Option<&str> {
    rpr.first_path(&["a:latin.$.typeface", "a:ea.$.typeface", "a:cs.$.typeface"])
        .and_then(Node::as_str)
        // `+mj-lt` and friends point into the theme's font scheme.
        .filter(|face| !face.is_empty() && !face.starts_with('+'))
}

fn is_on(value: Option<&str>) -> bool {
    matches!(value, Some("1") | Some("true"))
}

fn run_marks(rpr: Option<&Node>, ctx: &SlideContext) -> Vec<Mark> {
    let mut marks = Vec::new();
    let Some(rpr) = rpr else {
        return marks;
    };
    if is_on(rpr.attr("b")) {
        marks.push(Mark::Bold);
    }
    if is_on(rpr.attr("i")) {
        marks.push(Mark::Italic);
    }
    if rpr.attr("u").is_some_and(|u| u != "none") {
        marks.push(Mark::Underline);
    }
    if rpr.attr("strike").is_some_and(|s| s != "noStrike") {
        marks.push(Mark::Strike);
    }
    if let Some(fill) = rpr.get("a:solidFill") {
        marks.push(Mark::Color {
            color: ctx.color(Some(fill)),
        });
    }
    if let Some(sz) = rpr.attr_f64("sz") {
        marks.push(Mark::FontSize {
            size: font_size_to_points(Some(sz)),
        });
    }
    if let Some(family) = typeface(rpr) {
        marks.push(Mark::FontFamily {
            family: family.to_string(),
        });
    }
    if let Some(rid) = rpr.path("a:hlinkClick.$.r:id").and_then(Node::as_str) {
        if let Some(rel) = ctx.rels.resolve(ctx.part, rid) {
            marks.push(Mark::Link {
                href: rel.target.clone(),
            });
        }
    }
    marks
}

fn list_kind(ppr: Option<&Node>) -> ListKind {
    let Some(ppr) = ppr else {
        return ListKind::None;
    };
    if ppr.get("a:buNone").is_some() {
        ListKind::None
    } else if ppr.get("a:buAutoNum").is_some() {
        ListKind::Ordered
    } else if ppr.get("a:buChar").is_some() || ppr.get("a:buBlip").is_some() {
        ListKind::Bullet
    } else {
        ListKind::None
    }
}

/// Build the rich-text tree of a text body.
pub fn rich_text(body: &Node, ctx: &SlideContext) -> RichText {
    let mut doc = RichText::new();
    for p in body.children("a:p") {
        let ppr = p.get("a:pPr");
        let mut paragraph = Paragraph {
            align: ppr.and_then(|n| n.attr("algn")).and_then(TextAlign::from_ooxml),
            level: ppr
                .and_then(|n| n.attr_f64("lvl"))
                .map(|l| l.max(0.0) as u32)
                .unwrap_or(0),
            content: Vec::new(),
        };
        for (tag, child) in p.child_elements() {
            let run = match tag {
                "a:r" | "a:fld" => {
                    let text = child.path("a:t").and_then(Node::text).unwrap_or_default();
                    if text.is_empty() {
                        continue;
                    }
                    TextRun {
                        text: text.to_string(),
                        marks: run_marks(child.get("a:rPr"), ctx),
                    }
                }
                "a:br" => TextRun::plain("\n"),
                _ => continue,
            };
            paragraph.content.push(run);
        }
        doc.push(paragraph, list_kind(ppr));
    }
    doc
}

/// Parse a shape-like node into a Text component.
///
/// Returns `Ok(None)` when the node has no text body, its text is blank, or
/// its geometry is zero-sized.
pub fn parse_text(node: &Node, ordinal: usize, ctx: &SlideContext) -> Result<Option<Component>> {
    let Some(body) = text_body(node) else {
        return Ok(None);
    };
    let content = body_text(body);
    if content.is_empty() {
        return Ok(None);
    }

    let xfrm = nodes::transform(node).or_else(|| ctx.placeholder_transform(node));
    let geometry = ctx.geometry(xfrm);
    if geometry.is_empty() {
        log::debug!("Dropping zero-size text shape {}", ordinal);
        return Ok(None);
    }

    let first_paragraph = body.children("a:p").into_iter().next();
    let alignment = first_paragraph
        .and_then(|p| p.path("a:pPr.$.algn"))
        .and_then(Node::as_str)
        .and_then(TextAlign::from_ooxml)
        .unwrap_or_default();
    let vertical_align = body
        .path("a:bodyPr.$.anchor")
        .and_then(Node::as_str)
        .and_then(VerticalAlign::from_ooxml)
        .unwrap_or_default();
    let font = run_font(first_run_properties(body), ctx);
    let background_color = nodes::shape_properties(node)
        .and_then(|sp| sp.get("a:solidFill"))
        .map(|fill| ctx.color(Some(fill)));

    let placeholder_type = nodes::placeholder_type(node);
    let is_title = placeholder_type
        .as_deref()
        .is_some_and(|t| matches!(t, "title" | "ctrTitle"))
        || (content.chars().count() < ctx.options.title_max_len
            && font.size > ctx.options.title_min_font_pt);

    let mut base = BaseFields::new(
        ctx.component_id("text", ordinal),
        geometry,
        ctx.slide_index,
        ordinal as i64,
    );
    nodes::record_identity(node, &mut base);

    Ok(Some(Component::Text(TextComponent {
        base,
        rich_text: rich_text(body, ctx),
        content,
        font,
        alignment,
        vertical_align,
        background_color,
        background_shape: None,
        placeholder_type,
        is_title,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture, shape_xml, Fixture};
    use deckparse_core::Block;

    fn parse(fx: &Fixture, xml: &str) -> Option<Component> {
        let node = crate::xml::parse_xml(xml).unwrap();
        let sp = node.path("p:sp").unwrap().clone();
        parse_text(&sp, 3, &fx.ctx()).unwrap()
    }

    #[test]
    fn test_plain_text_shape() {
        let fx = fixture();
        let xml = shape_xml(
            "<a:xfrm><a:off x=\"914400\" y=\"914400\"/><a:ext cx=\"1828800\" cy=\"914400\"/></a:xfrm>",
            "<p:txBody><a:bodyPr/><a:p><a:r><a:t>Hello</a:t></a:r></a:p></p:txBody>",
        );
        let component = parse(&fx, &xml).unwrap();
        let text = component.as_text().unwrap();
        assert_eq!(text.content, "Hello");
        assert_eq!(
            (text.base.x, text.base.y, text.base.width, text.base.height),
            (96, 96, 192, 96)
        );
        assert_eq!(text.base.id, "text-0-3");
        assert_eq!(text.base.z_index, 3);
        assert_eq!(text.font.family, "Arial");
        assert_eq!(text.font.size, 12.0);
        assert!(!text.is_title);
    }

    #[test]
    fn test_paragraphs_join_with_newlines_and_trim() {
        let fx = fixture();
        let xml = shape_xml(
            "<a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"914400\" cy=\"914400\"/></a:xfrm>",
            "<p:txBody><a:p><a:r><a:t>  One</a:t></a:r><a:br/><a:r><a:t>Two</a:t></a:r></a:p><a:p><a:r><a:t>Three  </a:t></a:r></a:p></p:txBody>",
        );
        let component = parse(&fx, &xml).unwrap();
        assert_eq!(component.content(), "One\nTwo\nThree");
    }

    #[test]
    fn test_blank_or_missing_body_is_not_text() {
        let fx = fixture();
        let xfrm = "<a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"914400\" cy=\"914400\"/></a:xfrm>";
        assert!(parse(&fx, &shape_xml(xfrm, "")).is_none());
        assert!(parse(
            &fx,
            &shape_xml(xfrm, "<p:txBody><a:p><a:r><a:t>   </a:t></a:r></a:p></p:txBody>")
        )
        .is_none());
    }

    #[test]
    fn test_zero_geometry_is_dropped() {
        let fx = fixture();
        let xml = shape_xml(
            "",
            "<p:txBody><a:p><a:r><a:t>Floating</a:t></a:r></a:p></p:txBody>",
        );
        assert!(parse(&fx, &xml).is_none());
    }

    #[test]
    fn test_first_run_font_and_alignment() {
        let fx = fixture();
        let xml = shape_xml(
            "<a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"914400\" cy=\"914400\"/></a:xfrm><a:solidFill><a:srgbClr val=\"EEEEEE\"/></a:solidFill>",
            r#"<p:txBody><a:bodyPr anchor="ctr"/><a:p><a:pPr algn="ctr"/><a:r><a:rPr sz="2400" b="1" i="1" u="sng"><a:solidFill><a:schemeClr val="accent2"/></a:solidFill><a:latin typeface="Georgia"/></a:rPr><a:t>Big</a:t></a:r></a:p></p:txBody>"#,
        );
        let component = parse(&fx, &xml).unwrap();
        let text = component.as_text().unwrap();
        assert_eq!(text.font.size, 24.0);
        assert_eq!(text.font.weight, FontWeight::Bold);
        assert_eq!(text.font.style, FontStyle::Italic);
        assert_eq!(text.font.decoration, TextDecoration::Underline);
        assert_eq!(text.font.family, "Georgia");
        assert_eq!(text.font.color, "#ED7D31");
        assert_eq!(text.alignment, TextAlign::Center);
        assert_eq!(text.vertical_align, VerticalAlign::Middle);
        assert_eq!(text.background_color.as_deref(), Some("#EEEEEE"));
        // Short and larger than 18pt.
        assert!(text.is_title);
    }

    #[test]
    fn test_title_placeholder_is_title_regardless_of_size() {
        let fx = fixture();
        let xml = r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="914400" cy="914400"/></a:xfrm></p:spPr><p:txBody><a:p><a:r><a:rPr sz="1000"/><a:t>Agenda</a:t></a:r></a:p></p:txBody></p:sp>"#;
        let component = parse(&fx, xml).unwrap();
        let text = component.as_text().unwrap();
        assert!(text.is_title);
        assert_eq!(text.placeholder_type.as_deref(), Some("title"));
        assert_eq!(text.base.metadata["name"], "Title 1");
    }

    #[test]
    fn test_long_text_is_not_a_heuristic_title() {
        let fx = fixture();
        let long = "word ".repeat(30);
        let xml = shape_xml(
            "<a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"914400\" cy=\"914400\"/></a:xfrm>",
            &format!(
                "<p:txBody><a:p><a:r><a:rPr sz=\"4000\"/><a:t>{}</a:t></a:r></a:p></p:txBody>",
                long
            ),
        );
        let component = parse(&fx, &xml).unwrap();
        assert!(!component.as_text().unwrap().is_title);
    }

    #[test]
    fn test_bullets_become_lists() {
        let fx = fixture();
        let xml = shape_xml(
            "<a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"914400\" cy=\"914400\"/></a:xfrm>",
            r#"<p:txBody>
                <a:p><a:r><a:t>Intro</a:t></a:r></a:p>
                <a:p><a:pPr lvl="1"><a:buChar char="•"/></a:pPr><a:r><a:t>First</a:t></a:r></a:p>
                <a:p><a:pPr><a:buChar char="•"/></a:pPr><a:r><a:rPr strike="sngStrike"/><a:t>Second</a:t></a:r></a:p>
                <a:p><a:pPr><a:buAutoNum type="arabicPeriod"/></a:pPr><a:r><a:t>Step</a:t></a:r></a:p>
            </p:txBody>"#,
        );
        let component = parse(&fx, &xml).unwrap();
        let text = component.as_text().unwrap();
        assert_eq!(text.content, "Intro\nFirst\nSecond\nStep");
        let blocks = &text.rich_text.content;
        assert_eq!(blocks.len(), 3);
        match &blocks[1] {
            Block::BulletList { content } => {
                assert_eq!(content.len(), 2);
                assert_eq!(content[0].level, 1);
                assert_eq!(content[1].content[0].marks, vec![Mark::Strike]);
            }
            other => panic!("expected bullet list, got {:?}", other),
        }
        assert!(matches!(blocks[2], Block::OrderedList { .. }));
        assert_eq!(text.rich_text.to_plain_text(), text.content);
    }

    #[test]
    fn test_alternate_text_body_nesting() {
        let fx = fixture();
        let xml = r#"<p:sp><a:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="914400" cy="914400"/></a:xfrm></a:spPr><a:txSp><a:txBody><a:p><a:r><a:t>Pasted</a:t></a:r></a:p></a:txBody></a:txSp></p:sp>"#;
        let component = parse(&fx, xml).unwrap();
        assert_eq!(component.content(), "Pasted");
    }
}
