//! SmartArt parser.
//!
//! A diagram frame on a slide only carries relationship ids. The abstract
//! point/connection graph lives in a data-model part and the rendered shapes
//! in a separate drawing part; both are resolved first, then the drawing's
//! shapes are turned into ordinary Text and Shape components.

use crate::context::SlideContext;
use crate::shape;
use crate::text;
use deckparse_core::{
    BackgroundShape, BaseFields, Component, DiagramComponent, DiagramConnection, Node, Result,
    RichText, TextRun,
};
use std::collections::HashMap;

/// Graphic-data URI of a SmartArt frame.
pub const DIAGRAM_URI: &str = "http://schemas.openxmlformats.org/drawingml/2006/diagram";

/// Broad SmartArt layout family, from the layout definition's identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutCategory {
    List,
    Process,
    Cycle,
    Hierarchy,
    Relationship,
    Matrix,
    Pyramid,
    Picture,
    Unknown,
}

impl LayoutCategory {
    pub fn from_layout_id(id: &str) -> Self {
        let id = id.to_lowercase();
        if id.contains("list") {
            Self::List
        } else if id.contains("process") {
            Self::Process
        } else if id.contains("cycle") {
            Self::Cycle
        } else if id.contains("hierarchy") || id.contains("orgchart") {
            Self::Hierarchy
        } else if id.contains("relationship") || id.contains("venn") {
            Self::Relationship
        } else if id.contains("matrix") {
            Self::Matrix
        } else if id.contains("pyramid") {
            Self::Pyramid
        } else if id.contains("picture") {
            Self::Picture
        } else {
            Self::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Process => "process",
            Self::Cycle => "cycle",
            Self::Hierarchy => "hierarchy",
            Self::Relationship => "relationship",
            Self::Matrix => "matrix",
            Self::Pyramid => "pyramid",
            Self::Picture => "picture",
            Self::Unknown => "unknown",
        }
    }
}

/// One point of the data model.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    pub model_id: String,
    /// `doc`, `node`, `pres`, ... (`node` when absent).
    pub kind: String,
    pub text: String,
}

/// Result of parsing a diagram frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDiagram {
    /// Either the wrapper or, when flattening, the synthesized components.
    pub components: Vec<Component>,
    /// Ordinals taken by synthesized components beyond the frame's own.
    pub consumed: usize,
}

/// Part paths a diagram frame points at.
#[derive(Debug, Clone, Default, PartialEq)]
struct DiagramParts {
    data: Option<String>,
    layout: Option<String>,
    quick_style: Option<String>,
    colors: Option<String>,
    drawing: Option<String>,
    /// Relationship id and resolved target, in resolution order.
    relationships: Vec<(String, String)>,
}

/// Whether a graphic frame holds SmartArt.
pub fn is_diagram(frame: &Node) -> bool {
    graphic_data(frame).is_some_and(|data| {
        data.attr("uri") == Some(DIAGRAM_URI) || data.get("dgm:relIds").is_some()
    })
}

fn graphic_data(frame: &Node) -> Option<&Node> {
    frame.first_path(&["a:graphic.a:graphicData", "p:graphic.a:graphicData"])
}

/// Parse a SmartArt frame.
///
/// Failure to resolve any of the diagram's parts degrades to a wrapper with
/// no synthesized components.
pub fn parse_diagram(frame: &Node, ordinal: usize, ctx: &SlideContext) -> Result<Option<ParsedDiagram>> {
    let geometry = ctx.geometry(crate::nodes::transform(frame));
    if geometry.is_empty() {
        log::debug!("Dropping zero-size diagram {}", ordinal);
        return Ok(None);
    }

    let parts = resolve_parts(frame, ctx);
    let data_model = parts.data.as_deref().and_then(|p| ctx.package.xml(p));
    let points = data_model.map(data_points).unwrap_or_default();
    let connections = data_model.map(connections).unwrap_or_default();
    let layout_id = parts
        .layout
        .as_deref()
        .and_then(|p| ctx.package.xml(p))
        .and_then(|lo| lo.path("dgm:layoutDef.$.uniqueId"))
        .and_then(Node::as_str);
    let layout = layout_id
        .map(LayoutCategory::from_layout_id)
        .unwrap_or(LayoutCategory::Unknown);

    let synthesized = match parts.drawing.as_deref() {
        Some(drawing) => synthesize(drawing, &points, ordinal, geometry.x, geometry.y, ctx)?,
        None => {
            log::warn!("No SmartArt drawing found for frame {} on {}", ordinal, ctx.part);
            Vec::new()
        }
    };
    let consumed = synthesized.len();

    if ctx.options.flatten_diagrams {
        return Ok(Some(ParsedDiagram {
            components: synthesized,
            consumed,
        }));
    }

    let mut base = BaseFields::new(
        ctx.component_id("diagram", ordinal),
        geometry,
        ctx.slide_index,
        ordinal as i64,
    );
    crate::nodes::record_identity(frame, &mut base);
    let named = [
        ("dataModel", &parts.data),
        ("layoutPart", &parts.layout),
        ("quickStyle", &parts.quick_style),
        ("colors", &parts.colors),
        ("drawing", &parts.drawing),
    ];
    for (key, path) in named {
        if let Some(path) = path {
            base.meta(key, path.as_str());
        }
    }
    let relationships: serde_json::Map<String, serde_json::Value> = parts
        .relationships
        .iter()
        .map(|(id, target)| (id.clone(), target.as_str().into()))
        .collect();
    base.meta("relationships", relationships);
    if let Some(id) = layout_id {
        base.meta("layoutId", id);
    }
    base.meta("pointCount", points.len());

    let wrapper = Component::Diagram(DiagramComponent {
        base,
        content: "SmartArt".to_string(),
        layout: layout.as_str().to_string(),
        components: synthesized,
        connections,
    });
    Ok(Some(ParsedDiagram {
        components: vec![wrapper],
        consumed,
    }))
}

fn resolve_parts(frame: &Node, ctx: &SlideContext) -> DiagramParts {
    let rel_ids = graphic_data(frame).and_then(|d| d.get("dgm:relIds"));
    let mut resolved = Vec::new();
    let mut target = |id: Option<&str>| {
        let rel = ctx.rels.resolve(ctx.part, id?)?;
        resolved.push((rel.id.clone(), rel.target.clone()));
        Some(rel.target.clone())
    };
    let declared = |attr: &str| rel_ids.and_then(|ids| ids.attr(attr));

    let data = target(declared("r:dm"));
    let layout = target(declared("r:lo"));
    let quick_style = target(declared("r:qs"));
    let colors = target(declared("r:cs"));

    // The data model names its drawing through an extension element.
    let drawing_id = data
        .as_deref()
        .and_then(|p| ctx.package.xml(p))
        .and_then(|dm| dm.path("dgm:dataModel.dgm:extLst"))
        .and_then(|ext| {
            ext.children("a:ext")
                .into_iter()
                .find_map(|e| e.path("dsp:dataModelExt.$.relId").and_then(Node::as_str))
        });
    let mut drawing = target(drawing_id).filter(|path| ctx.package.xml(path).is_some());

    if drawing.is_none() {
        if let Some(rel) = ctx
            .rels
            .for_part(ctx.part)
            .find(|rel| rel.target.contains("diagrams/drawing") && ctx.package.xml(&rel.target).is_some())
        {
            resolved.push((rel.id.clone(), rel.target.clone()));
            drawing = Some(rel.target.clone());
        }
    }

    DiagramParts {
        data,
        layout,
        quick_style,
        colors,
        drawing,
        relationships: resolved,
    }
}

/// Points of a data model, in document order.
pub fn data_points(data_model: &Node) -> Vec<DataPoint> {
    data_model
        .path("dgm:dataModel.dgm:ptLst")
        .map(|list| list.children("dgm:pt"))
        .unwrap_or_default()
        .into_iter()
        .filter_map(|pt| {
            Some(DataPoint {
                model_id: pt.attr("modelId")?.to_string(),
                kind: pt.attr("type").unwrap_or("node").to_string(),
                text: pt.get("dgm:t").map(text::body_text).unwrap_or_default(),
            })
        })
        .collect()
}

/// Connections of a data model, in document order.
pub fn connections(data_model: &Node) -> Vec<DiagramConnection> {
    let order = |cxn: &Node, attr: &str| cxn.attr_f64(attr).map(|n| n.max(0.0) as u32).unwrap_or(0);
    data_model
        .path("dgm:dataModel.dgm:cxnLst")
        .map(|list| list.children("dgm:cxn"))
        .unwrap_or_default()
        .into_iter()
        .filter_map(|cxn| {
            Some(DiagramConnection {
                model_id: cxn.attr("modelId")?.to_string(),
                source_id: cxn.attr("srcId")?.to_string(),
                destination_id: cxn.attr("destId")?.to_string(),
                source_order: order(cxn, "srcOrd"),
                destination_order: order(cxn, "destOrd"),
                kind: cxn.attr("type").map(str::to_string),
            })
        })
        .collect()
}

fn synthesize(
    drawing: &str,
    points: &[DataPoint],
    ordinal: usize,
    dx: i64,
    dy: i64,
    ctx: &SlideContext,
) -> Result<Vec<Component>> {
    let Some(tree) = ctx.package.xml(drawing) else {
        return Ok(Vec::new());
    };
    let shapes = tree
        .path("dsp:drawing.dsp:spTree")
        .map(|t| t.children("dsp:sp"))
        .unwrap_or_default();
    let by_model: HashMap<&str, &DataPoint> =
        points.iter().map(|p| (p.model_id.as_str(), p)).collect();
    let sub_ctx = ctx.for_part(drawing);

    let mut out = Vec::new();
    for sp in shapes {
        let sub_ordinal = ordinal + 1 + out.len();
        let component = if text::has_text(sp) {
            diagram_text(sp, sub_ordinal, &sub_ctx)?
        } else {
            shape::parse_shape(sp, sub_ordinal, &sub_ctx)?
        };
        let Some(mut component) = component else {
            continue;
        };

        let base = component.base_mut();
        let moved = base.geometry().offset(dx, dy);
        base.set_geometry(moved);
        base.meta("diagramFrame", ctx.component_id("diagram", ordinal));
        if let Some(model_id) = sp.attr("modelId") {
            base.meta("modelId", model_id);
            if let Some(point) = by_model.get(model_id) {
                base.meta("pointType", point.kind.as_str());
            }
        }
        out.push(component);
    }
    if out.is_empty() {
        log::warn!("SmartArt drawing '{}' produced no components", drawing);
    }
    Ok(out)
}

/// A text-bearing drawing shape: a Text component with a one-run rich text
/// tree and the shape drawn behind it.
fn diagram_text(sp: &Node, ordinal: usize, ctx: &SlideContext) -> Result<Option<Component>> {
    let Some(Component::Text(mut text)) = text::parse_text(sp, ordinal, ctx)? else {
        return Ok(None);
    };
    text.rich_text = RichText::single_run(TextRun::plain(text.content.clone()));
    let sp_pr = crate::nodes::shape_properties(sp);
    if sp_pr.is_some() {
        text.background_shape = Some(BackgroundShape {
            shape_type: shape::shape_type(sp_pr),
            fill: shape::parse_fill(sp_pr, sp.path("dsp:style.a:fillRef"), ctx),
            border: shape::parse_border(sp_pr, ctx),
        });
    }
    Ok(Some(Component::Text(text)))
}
