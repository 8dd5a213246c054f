//! Shape component parser: preset classification, fill, outline and effects.

use crate::context::SlideContext;
use crate::nodes;
use crate::text;
use deckparse_core::units::{angle_to_degrees, emu_to_pixels_at};
use deckparse_core::{
    BaseFields, Border, BorderStyle, Component, Effects, Fill, Node, Result, Shadow,
    ShapeComponent,
};

/// Human-readable label for a DrawingML preset geometry.
pub fn preset_label(preset: &str) -> Option<&'static str> {
    let label = match preset {
        "rect" => "rectangle",
        "roundRect" => "rounded-rectangle",
        "snip1Rect" => "snipped-rectangle",
        "snip2SameRect" => "snipped-rectangle-2",
        "round1Rect" => "rounded-corner-rectangle",
        "round2SameRect" => "rounded-corner-rectangle-2",
        "ellipse" => "ellipse",
        "triangle" => "triangle",
        "rtTriangle" => "right-triangle",
        "diamond" => "diamond",
        "parallelogram" => "parallelogram",
        "trapezoid" => "trapezoid",
        "pentagon" => "pentagon",
        "hexagon" => "hexagon",
        "heptagon" => "heptagon",
        "octagon" => "octagon",
        "decagon" => "decagon",
        "dodecagon" => "dodecagon",
        "star4" => "star-4",
        "star5" => "star-5",
        "star6" => "star-6",
        "star7" => "star-7",
        "star8" => "star-8",
        "star10" => "star-10",
        "star12" => "star-12",
        "star16" => "star-16",
        "star24" => "star-24",
        "star32" => "star-32",
        "rightArrow" => "arrow-right",
        "leftArrow" => "arrow-left",
        "upArrow" => "arrow-up",
        "downArrow" => "arrow-down",
        "leftRightArrow" => "arrow-left-right",
        "upDownArrow" => "arrow-up-down",
        "quadArrow" => "arrow-quad",
        "bentArrow" => "arrow-bent",
        "uturnArrow" => "arrow-u-turn",
        "curvedRightArrow" => "arrow-curved-right",
        "curvedLeftArrow" => "arrow-curved-left",
        "notchedRightArrow" => "arrow-notched-right",
        "stripedRightArrow" => "arrow-striped-right",
        "chevron" => "chevron",
        "homePlate" => "pentagon-arrow",
        "wedgeRectCallout" => "callout-rectangle",
        "wedgeRoundRectCallout" => "callout-rounded-rectangle",
        "wedgeEllipseCallout" => "callout-ellipse",
        "cloudCallout" => "callout-cloud",
        "borderCallout1" => "callout-line",
        "ribbon" => "ribbon-down",
        "ribbon2" => "ribbon-up",
        "ellipseRibbon" => "ribbon-curved-down",
        "ellipseRibbon2" => "ribbon-curved-up",
        "verticalScroll" => "scroll-vertical",
        "horizontalScroll" => "scroll-horizontal",
        "heart" => "heart",
        "lightningBolt" => "lightning-bolt",
        "sun" => "sun",
        "moon" => "moon",
        "cloud" => "cloud",
        "smileyFace" => "smiley-face",
        "donut" => "donut",
        "noSmoking" => "no-symbol",
        "blockArc" => "block-arc",
        "arc" => "arc",
        "pie" => "pie",
        "chord" => "chord",
        "teardrop" => "teardrop",
        "can" => "cylinder",
        "cube" => "cube",
        "bevel" => "bevel",
        "frame" => "frame",
        "halfFrame" => "half-frame",
        "corner" => "corner",
        "plaque" => "plaque",
        "foldedCorner" => "folded-corner",
        "plus" => "plus",
        "mathPlus" => "math-plus",
        "mathMinus" => "math-minus",
        "mathMultiply" => "math-multiply",
        "mathDivide" => "math-divide",
        "mathEqual" => "math-equal",
        "mathNotEqual" => "math-not-equal",
        "flowChartProcess" => "flowchart-process",
        "flowChartAlternateProcess" => "flowchart-alternate-process",
        "flowChartDecision" => "flowchart-decision",
        "flowChartInputOutput" => "flowchart-data",
        "flowChartDocument" => "flowchart-document",
        "flowChartTerminator" => "flowchart-terminator",
        "flowChartConnector" => "flowchart-connector",
        "line" => "line",
        "straightConnector1" => "connector-straight",
        "bentConnector2" => "connector-elbow",
        "bentConnector3" => "connector-elbow",
        "curvedConnector3" => "connector-curved",
        _ => return None,
    };
    Some(label)
}

/// Shape type of a shape-properties node: the preset label, the preset
/// name verbatim when unknown, `custom` for custom geometry.
pub fn shape_type(sp_pr: Option<&Node>) -> String {
    let Some(sp_pr) = sp_pr else {
        return "rectangle".to_string();
    };
    if let Some(preset) = sp_pr.path("a:prstGeom.$.prst").and_then(Node::as_str) {
        return preset_label(preset).unwrap_or(preset).to_string();
    }
    if sp_pr.get("a:custGeom").is_some() {
        return "custom".to_string();
    }
    "rectangle".to_string()
}

/// Resolve the fill of a shape-properties node.
///
/// Order: solid, gradient (first stop), pattern, picture, explicit none,
/// then `style_fill` (the shape style's fill reference), then white.
pub fn parse_fill(sp_pr: Option<&Node>, style_fill: Option<&Node>, ctx: &SlideContext) -> Fill {
    if let Some(sp_pr) = sp_pr {
        if let Some(solid) = sp_pr.get("a:solidFill") {
            return Fill::Solid {
                color: ctx.color(Some(solid)),
            };
        }
        if let Some(grad) = sp_pr.get("a:gradFill") {
            let stops = grad.path("a:gsLst").map(|l| l.children("a:gs")).unwrap_or_default();
            return Fill::Gradient {
                color: ctx.color(stops.first().copied()),
                stops: stops.len(),
                angle: grad
                    .path("a:lin.$.ang")
                    .and_then(Node::as_f64)
                    .map(angle_to_degrees),
            };
        }
        if let Some(pattern) = sp_pr.get("a:pattFill") {
            return Fill::Pattern {
                color: ctx.color(pattern.get("a:fgClr")),
                background: ctx.color(pattern.get("a:bgClr")),
                preset: pattern.attr("prst").map(str::to_string),
            };
        }
        if let Some(blip) = sp_pr.get("a:blipFill") {
            return Fill::Image {
                relationship_id: blip
                    .path("a:blip.$.r:embed")
                    .and_then(Node::as_str)
                    .map(str::to_string),
            };
        }
        if sp_pr.get("a:noFill").is_some() {
            return Fill::None;
        }
    }
    if let Some(fill_ref) = style_fill {
        if fill_ref.attr("idx") != Some("0") && has_color_choice(fill_ref) {
            return Fill::Solid {
                color: ctx.color(Some(fill_ref)),
            };
        }
    }
    Fill::default()
}

fn has_color_choice(node: &Node) -> bool {
    ["a:srgbClr", "a:sysClr", "a:schemeClr"]
        .iter()
        .any(|k| node.get(k).is_some())
}

/// Resolve the outline of a shape-properties node.
pub fn parse_border(sp_pr: Option<&Node>, ctx: &SlideContext) -> Border {
    let Some(ln) = sp_pr.and_then(|sp| sp.get("a:ln")) else {
        return Border::none();
    };
    if ln.get("a:noFill").is_some() {
        return Border::none();
    }
    let style = ln
        .path("a:prstDash.$.val")
        .and_then(Node::as_str)
        .map(BorderStyle::from_preset_dash)
        .unwrap_or(BorderStyle::Solid);
    Border {
        style,
        color: ctx.color(ln.get("a:solidFill")),
        width: emu_to_pixels_at(ln.attr_f64("w").unwrap_or(0.0), ctx.options.dpi) as f64,
    }
}

/// Resolve shadow and glow from a shape-properties node's effect list.
pub fn parse_effects(sp_pr: Option<&Node>, ctx: &SlideContext) -> Effects {
    let Some(effects) = sp_pr.and_then(|sp| sp.get("a:effectLst")) else {
        return Effects::default();
    };
    let px = |emu: f64| emu / deckparse_core::units::EMU_PER_INCH * ctx.options.dpi;
    let shadow = effects.get("a:outerShdw").map(|shdw| {
        let distance = px(shdw.attr_f64("dist").unwrap_or(0.0));
        let direction = angle_to_degrees(shdw.attr_f64("dir").unwrap_or(0.0)).to_radians();
        Shadow {
            offset_x: distance * direction.cos(),
            offset_y: distance * direction.sin(),
            blur: px(shdw.attr_f64("blurRad").unwrap_or(0.0)),
            color: ctx.color(Some(shdw)),
        }
    });
    Effects {
        shadow,
        glow: effects.get("a:glow").is_some(),
    }
}

/// Whether the orchestrator should treat `node` as a plain shape: it has
/// shape properties and no non-blank text.
pub fn is_shape(node: &Node) -> bool {
    nodes::shape_properties(node).is_some() && !text::has_text(node)
}

/// Parse a shape-like node without meaningful text into a Shape component.
pub fn parse_shape(node: &Node, ordinal: usize, ctx: &SlideContext) -> Result<Option<Component>> {
    let sp_pr = nodes::shape_properties(node);
    let xfrm = nodes::transform(node).or_else(|| ctx.placeholder_transform(node));
    let geometry = ctx.geometry(xfrm);
    if geometry.is_empty() {
        log::debug!("Dropping zero-size shape {}", ordinal);
        return Ok(None);
    }

    let shape_type = shape_type(sp_pr);
    let style_fill = node.first_path(&["p:style.a:fillRef", "dsp:style.a:fillRef"]);
    let mut base = BaseFields::new(
        ctx.component_id("shape", ordinal),
        geometry,
        ctx.slide_index,
        ordinal as i64,
    );
    nodes::record_identity(node, &mut base);
    if let Some(preset) = sp_pr
        .and_then(|sp| sp.path("a:prstGeom.$.prst"))
        .and_then(Node::as_str)
    {
        base.meta("preset", preset);
    }

    Ok(Some(Component::Shape(ShapeComponent {
        base,
        content: format!("{} shape", shape_type),
        paths: Vec::new(),
        fill: parse_fill(sp_pr, style_fill, ctx),
        border: parse_border(sp_pr, ctx),
        effects: parse_effects(sp_pr, ctx),
        shape_type,
    })))
}

/// Parse a connector (`p:cxnSp`) as a Shape component.
pub fn parse_connector(node: &Node, ordinal: usize, ctx: &SlideContext) -> Result<Option<Component>> {
    let mut component = parse_shape(node, ordinal, ctx)?;
    if let Some(Component::Shape(shape)) = component.as_mut() {
        shape.base.meta("connector", true);
        if let Some(nv) = node.path("p:nvCxnSpPr.p:cNvCxnSpPr") {
            if let Some(start) = nv.path("a:stCxn.$.id").and_then(Node::as_str) {
                shape.base.meta("startShapeId", start);
            }
            if let Some(end) = nv.path("a:endCxn.$.id").and_then(Node::as_str) {
                shape.base.meta("endShapeId", end);
            }
        }
        // A connector has no interior.
        if shape.fill == Fill::default() {
            shape.fill = Fill::None;
        }
    }
    Ok(component)
}
