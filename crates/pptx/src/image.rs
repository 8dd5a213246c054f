//! Image component parser, including picture-filled shapes and slide backgrounds.

use crate::context::SlideContext;
use crate::media;
use crate::nodes;
use crate::package::PackageFlavor;
use crate::rels::locate_media;
use deckparse_core::units::{fraction_from_hundred_thousandths, thousandths_to_percent};
use deckparse_core::{
    local_name, BaseFields, Component, Crop, Error, Geometry, ImageComponent, ImageEffects, Node,
    Result,
};

const BLIP_FILL_PATHS: &[&str] = &["p:blipFill", "pic:blipFill", "a:blipFill", "blipFill"];

/// Media resolved for one picture.
#[derive(Debug)]
struct ResolvedMedia<'a> {
    path: String,
    bytes: &'a [u8],
    /// Linked by the single-media guess rather than a relationship.
    heuristic: bool,
}

/// The picture fill of a dedicated picture node.
pub fn picture_fill(node: &Node) -> Option<&Node> {
    node.first_path(BLIP_FILL_PATHS)
}

/// The picture fill of a shape's own properties.
pub fn shape_picture_fill(node: &Node) -> Option<&Node> {
    nodes::shape_properties(node).and_then(|sp| sp.get("a:blipFill"))
}

/// Whether `node` carries a picture either way.
pub fn has_picture(node: &Node) -> bool {
    picture_fill(node).is_some() || shape_picture_fill(node).is_some()
}

fn embed_id(blip_fill: &Node) -> Option<&str> {
    blip_fill
        .first_path(&["a:blip.$.r:embed", "a:blip.$.r:link", "blip.$.r:embed"])
        .and_then(Node::as_str)
        .filter(|id| !id.is_empty())
}

/// Parse a picture-bearing node into an Image component.
///
/// A node whose picture fill lives in its shape properties (rather than a
/// dedicated picture child) is emitted as a background image.
pub fn parse_image(node: &Node, ordinal: usize, ctx: &SlideContext) -> Result<Option<Component>> {
    if !node.is_structural() {
        return Err(Error::MalformedTree(format!("picture {} is not an element", ordinal)));
    }
    let (blip_fill, is_background) = match (picture_fill(node), shape_picture_fill(node)) {
        (Some(fill), _) => (fill, false),
        (None, Some(fill)) => (fill, true),
        (None, None) => return Ok(None),
    };

    let xfrm = nodes::transform(node).or_else(|| ctx.placeholder_transform(node));
    let geometry = ctx.geometry(xfrm);
    if geometry.is_empty() {
        log::debug!("Dropping zero-size picture {}", ordinal);
        return Ok(None);
    }

    let z_index = if is_background { -1 } else { ordinal as i64 };
    let mut image = build_image(
        blip_fill,
        BaseFields::new(ctx.component_id("image", ordinal), geometry, ctx.slide_index, z_index),
        is_background,
        ctx,
    );
    nodes::record_identity(node, &mut image.base);
    Ok(Some(Component::Image(image)))
}

/// The slide's own background picture, stretched over the whole slide.
pub fn parse_slide_background(slide: &Node, ctx: &SlideContext) -> Option<Component> {
    let blip_fill = slide.first_path(&["p:cSld.p:bg.p:bgPr.a:blipFill", "p:bg.p:bgPr.a:blipFill"])?;
    let (cx, cy) = ctx.package.slide_size_emu();
    let dpi = ctx.options.dpi;
    let geometry = Geometry {
        width: deckparse_core::units::emu_to_pixels_at(cx, dpi),
        height: deckparse_core::units::emu_to_pixels_at(cy, dpi),
        ..Geometry::default()
    };
    let base = BaseFields::new(ctx.component_id("image", "bg"), geometry, ctx.slide_index, -1);
    let mut image = build_image(blip_fill, base, true, ctx);
    image.base.meta("slideBackground", true);
    Some(Component::Image(image))
}

fn build_image(
    blip_fill: &Node,
    mut base: BaseFields,
    is_background: bool,
    ctx: &SlideContext,
) -> ImageComponent {
    let rid = embed_id(blip_fill);
    if let Some(rid) = rid {
        base.meta("relationshipId", rid);
    }

    let mut image = ImageComponent {
        base,
        content: String::new(),
        image_url: None,
        image_type: "unknown".to_string(),
        natural_width: None,
        natural_height: None,
        crop: parse_crop(blip_fill),
        effects: blip_fill.get("a:blip").map(parse_effects).unwrap_or_default(),
        is_background,
    };

    let Some(resolved) = resolve_media(rid, ctx) else {
        if let Some(rid) = rid {
            log::warn!("Picture relationship '{}' on {} did not resolve", rid, ctx.part);
        }
        return image;
    };

    image.image_type = media::image_type(&resolved.path);
    image.base.meta("mediaPath", resolved.path.as_str());
    if resolved.heuristic {
        image.base.meta("heuristicLink", true);
    }
    if ctx.options.embed_media {
        let url = media::data_url(media::mime_type(&resolved.path), resolved.bytes);
        image.content = url.clone();
        image.image_url = Some(url);
    } else {
        image.image_url = Some(resolved.path.clone());
    }
    if ctx.options.sniff_dimensions {
        match media::dimensions(&image.image_type, resolved.bytes) {
            Ok(Some((width, height))) => {
                image.natural_width = Some(width);
                image.natural_height = Some(height);
            }
            Ok(None) => {}
            Err(e) => {
                log::warn!("Could not read dimensions of '{}': {}", resolved.path, e);
                image.base.meta("dimensionError", e.to_string());
            }
        }
    }
    image
}

fn resolve_media<'a>(rid: Option<&str>, ctx: &SlideContext<'a>) -> Option<ResolvedMedia<'a>> {
    if let Some(rid) = rid {
        if let Some(rel) = ctx.rels.resolve(ctx.part, rid).filter(|rel| !rel.external) {
            if let Some((path, bytes)) = locate_media(ctx.package, &rel.target) {
                return Some(ResolvedMedia {
                    path,
                    bytes,
                    heuristic: false,
                });
            }
        }
    }
    single_media_guess(ctx)
}

/// Pasted fragments often lose their relationship parts; when exactly one
/// media part and exactly one picture exist, assume they belong together.
fn single_media_guess<'a>(ctx: &SlideContext<'a>) -> Option<ResolvedMedia<'a>> {
    if ctx.package.flavor() == PackageFlavor::Deck {
        return None;
    }
    let media = ctx.package.media_paths();
    let [only] = media.as_slice() else {
        return None;
    };
    let pictures = ctx.package.xml(ctx.part).map(count_pictures).unwrap_or(0);
    if pictures != 1 {
        return None;
    }
    let bytes = ctx.package.bytes(only)?;
    log::debug!("Linking lone media part '{}' to lone picture", only);
    Some(ResolvedMedia {
        path: only.to_string(),
        bytes,
        heuristic: true,
    })
}

fn count_pictures(node: &Node) -> usize {
    match node {
        Node::Element(_) => node
            .child_elements()
            .into_iter()
            .map(|(tag, child)| usize::from(local_name(tag) == "pic") + count_pictures(child))
            .sum(),
        Node::List(items) => items.iter().map(count_pictures).sum(),
        _ => 0,
    }
}

fn parse_crop(blip_fill: &Node) -> Crop {
    let Some(rect) = blip_fill.get("a:srcRect") else {
        return Crop::default();
    };
    let side = |name: &str| rect.attr_f64(name).map(thousandths_to_percent).unwrap_or(0.0);
    Crop {
        left: side("l"),
        top: side("t"),
        right: side("r"),
        bottom: side("b"),
    }
}

fn parse_effects(blip: &Node) -> ImageEffects {
    let mut effects = ImageEffects::default();
    if let Some(amt) = blip.path("a:alphaModFix.$.amt").and_then(Node::as_f64) {
        effects.opacity = fraction_from_hundred_thousandths(amt);
    }
    effects.grayscale = blip.get("a:grayscl").is_some();
    effects.bilevel_threshold = blip
        .get("a:biLevel")
        .map(|b| b.attr_f64("thresh").map(fraction_from_hundred_thousandths).unwrap_or(0.5));

    let mut filters = Vec::new();
    if effects.grayscale || effects.bilevel_threshold.is_some() {
        filters.push("grayscale(100%)".to_string());
    }
    if effects.bilevel_threshold.is_some() {
        filters.push("contrast(1000%)".to_string());
    }
    if !filters.is_empty() {
        effects.filter = Some(filters.join(" "));
    }
    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::Package;
    use crate::testing::{bare_fixture, fixture, fixture_with, png_bytes, rels_xml, xml, SLIDE_PART};

    fn pic_xml(rid: &str, extra: &str) -> String {
        format!(
            r#"<p:pic><p:nvPicPr><p:cNvPr id="4" name="Picture 3" descr="Logo"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="{}">{}</a:blip><a:srcRect l="10000" t="5000"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="914400" cy="914400"/></a:xfrm><a:prstGeom prst="rect"/></p:spPr></p:pic>"#,
            rid, extra
        )
    }

    fn deck_with_image() -> Package {
        let mut package = Package::new();
        package.insert_xml(SLIDE_PART, xml("<p:sld/>"));
        package.insert_xml(
            "ppt/slides/_rels/slide1.xml.rels",
            xml(&rels_xml(&[("rId2", "image", "../media/image1.png")])),
        );
        package.insert_binary("ppt/media/image1.png", png_bytes(640, 480));
        package
    }

    #[test]
    fn test_resolved_picture() {
        let fx = fixture_with(deck_with_image());
        let tree = xml(&pic_xml("rId2", r#"<a:alphaModFix amt="50000"/>"#));
        let component = parse_image(tree.path("p:pic").unwrap(), 2, &fx.ctx())
            .unwrap()
            .unwrap();
        let image = component.as_image().unwrap();
        assert_eq!(image.base.id, "image-0-2");
        assert_eq!(image.image_type, "png");
        assert!(image.content.starts_with("data:image/png;base64,"));
        assert_eq!(image.image_url.as_deref(), Some(image.content.as_str()));
        assert_eq!((image.natural_width, image.natural_height), (Some(640), Some(480)));
        assert_eq!(image.crop.left, 10.0);
        assert_eq!(image.crop.top, 5.0);
        assert_eq!(image.effects.opacity, 0.5);
        assert!(!image.is_background);
        assert_eq!(image.base.metadata["relationshipId"], "rId2");
        assert_eq!(image.base.metadata["mediaPath"], "ppt/media/image1.png");
        assert_eq!(image.base.metadata["description"], "Logo");
    }

    #[test]
    fn test_unresolved_relationship_keeps_placeholder_image() {
        let fx = fixture_with(deck_with_image());
        let tree = xml(&pic_xml("rId99", ""));
        let component = parse_image(tree.path("p:pic").unwrap(), 1, &fx.ctx())
            .unwrap()
            .unwrap();
        let image = component.as_image().unwrap();
        assert_eq!(image.image_url, None);
        assert_eq!(image.image_type, "unknown");
        assert_eq!(image.content, "");

        let json = serde_json::to_value(&component).unwrap();
        assert!(json["imageUrl"].is_null());
        assert_eq!(json["imageType"], "unknown");
    }

    #[test]
    fn test_zero_size_picture_is_dropped() {
        let fx = fixture();
        let tree = xml(r#"<p:pic><p:blipFill><a:blip r:embed="rId1"/></p:blipFill><p:spPr/></p:pic>"#);
        assert!(parse_image(tree.path("p:pic").unwrap(), 1, &fx.ctx()).unwrap().is_none());
    }

    #[test]
    fn test_media_options() {
        let mut fx = fixture_with(deck_with_image());
        fx.options = fx.options.clone().with_embed_media(false).with_sniff_dimensions(false);
        let tree = xml(&pic_xml("rId2", ""));
        let component = parse_image(tree.path("p:pic").unwrap(), 1, &fx.ctx())
            .unwrap()
            .unwrap();
        let image = component.as_image().unwrap();
        assert_eq!(image.image_url.as_deref(), Some("ppt/media/image1.png"));
        assert!(image.content.is_empty());
        assert_eq!(image.natural_width, None);
    }

    #[test]
    fn test_bad_header_keeps_image() {
        let mut package = deck_with_image();
        package.insert_binary("ppt/media/image1.png", b"garbage".to_vec());
        let fx = fixture_with(package);
        let tree = xml(&pic_xml("rId2", ""));
        let component = parse_image(tree.path("p:pic").unwrap(), 1, &fx.ctx())
            .unwrap()
            .unwrap();
        let image = component.as_image().unwrap();
        assert_eq!(image.natural_width, None);
        assert!(image.base.metadata.contains_key("dimensionError"));
    }

    #[test]
    fn test_grayscale_and_bilevel_filters() {
        let blip = xml(r#"<a:blip><a:grayscl/><a:biLevel thresh="25000"/></a:blip>"#);
        let effects = parse_effects(blip.get("a:blip").unwrap());
        assert!(effects.grayscale);
        assert_eq!(effects.bilevel_threshold, Some(0.25));
        assert_eq!(effects.filter.as_deref(), Some("grayscale(100%) contrast(1000%)"));
    }

    #[test]
    fn test_shape_with_picture_fill_is_background() {
        let fx = fixture_with(deck_with_image());
        let tree = xml(
            r#"<p:sp><p:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="914400" cy="914400"/></a:xfrm><a:blipFill><a:blip r:embed="rId2"/></a:blipFill></p:spPr></p:sp>"#,
        );
        let component = parse_image(tree.path("p:sp").unwrap(), 4, &fx.ctx())
            .unwrap()
            .unwrap();
        let image = component.as_image().unwrap();
        assert!(image.is_background);
        assert_eq!(image.base.z_index, -1);
        assert_eq!(image.image_type, "png");
    }

    #[test]
    fn test_slide_background_covers_slide() {
        let fx = fixture_with(deck_with_image());
        let slide = xml(
            r#"<p:sld><p:cSld><p:bg><p:bgPr><a:blipFill><a:blip r:embed="rId2"/></a:blipFill></p:bgPr></p:bg></p:cSld></p:sld>"#,
        );
        let component = parse_slide_background(slide.path("p:sld").unwrap(), &fx.ctx()).unwrap();
        let image = component.as_image().unwrap();
        assert_eq!((image.base.width, image.base.height), (960, 720));
        assert_eq!(image.base.z_index, -1);
        assert_eq!(image.base.id, "image-0-bg");
        assert!(image.is_background);
    }

    #[test]
    fn test_clipboard_single_media_guess() {
        let mut package = Package::new();
        let drawing = "clipboard/drawings/drawing1.xml";
        let tree = xml(&format!("<a:graphic>{}</a:graphic>", pic_xml("rId7", "")));
        package.insert_xml(drawing, tree.clone());
        package.insert_binary("clipboard/media/image9.png", png_bytes(4, 4));
        let fx = bare_fixture(package);
        let ctx = SlideContext {
            part: drawing,
            ..fx.ctx()
        };
        let component = parse_image(tree.path("a:graphic.p:pic").unwrap(), 1, &ctx)
            .unwrap()
            .unwrap();
        let image = component.as_image().unwrap();
        assert_eq!(image.image_type, "png");
        assert_eq!(image.base.metadata["heuristicLink"], true);
    }
}
