//! Slide and document orchestration.
//!
//! Walks every slide-bearing part of a package and hands each shape-like
//! node to the matching parser. Every dispatch is isolated: a parser error
//! becomes a [`Diagnostic`] and the walk moves on to the next node.

use crate::context::SlideContext;
use crate::package::{Package, PackageFlavor};
use crate::rels::RelationshipTable;
use crate::{diagram, image, nodes, shape, table, text};
use deckparse_core::units::emu_to_pixels_at;
use deckparse_core::{
    local_name, BaseFields, Component, ComposedTransform, Error, ExtractOptions, Font,
    Geometry, GroupTransform, Node, Result, RichText, TextAlign, TextComponent, TextRun,
    UnknownComponent, VerticalAlign,
};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Quoted JSON strings, with a trailing colon when the string is a key.
static QUOTED_STRING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""((?:[^"\\]|\\.)*)"(\s*:)?"#).unwrap());

static RELATIONSHIP_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^rId\d+$").unwrap());

/// Colour values, GUIDs and similar identifier-looking tokens.
static IDENTIFIER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[0-9A-Fa-f]{6}|\{[0-9A-Fa-f-]+\}|[0-9A-Fa-f-]*[0-9][0-9A-Fa-f-]*)$").unwrap()
});

/// Tags the fallback search treats as shape-like.
const FALLBACK_TAGS: &[&str] = &["sp", "pic", "cxnSp", "graphicFrame"];

/// A recoverable problem met while extracting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub slide_index: usize,
    /// Part and tag of the node that failed.
    pub source: String,
    pub message: String,
}

/// Result of one extraction run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub flavor: PackageFlavor,
    pub slide_count: usize,
    pub components: Vec<Component>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Extraction {
    /// Components of one slide, in paint order.
    pub fn slide(&self, slide_index: usize) -> impl Iterator<Item = &Component> {
        self.components
            .iter()
            .filter(move |c| c.base().slide_index == slide_index)
    }
}

/// Extract every component of `package`.
pub fn extract(package: &Package, options: &ExtractOptions) -> Extraction {
    Extractor::new(options.clone()).extract(package)
}

/// Extract components from a single bare tree (a pasted fragment).
pub fn extract_tree(tree: &Node, options: &ExtractOptions) -> Extraction {
    Extractor::new(options.clone()).extract_tree(tree)
}

/// Component extractor for PowerPoint packages.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    options: ExtractOptions,
}

impl Extractor {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract every slide of `package`. Never fails; problems surface as
    /// diagnostics or, in the worst case, a single unknown component.
    pub fn extract(&self, package: &Package) -> Extraction {
        let flavor = package.flavor();
        let rels = RelationshipTable::build(package);
        let scheme = package.color_scheme();
        let slides = package.slide_paths();
        log::debug!("Extracting {} slide part(s) from a {:?} package", slides.len(), flavor);

        let mut extraction = Extraction {
            flavor,
            slide_count: slides.len(),
            components: Vec::new(),
            diagnostics: Vec::new(),
        };
        for (slide_index, part) in slides.iter().enumerate() {
            let ctx = SlideContext {
                package,
                rels: &rels,
                scheme: &scheme,
                options: &self.options,
                part,
                slide_index,
            };
            let mut walker = SlideWalker::new(ctx);
            walker.run();
            extraction.components.extend(walker.components);
            extraction.diagnostics.extend(walker.diagnostics);
        }
        extraction
    }

    /// Extract from a single bare tree.
    pub fn extract_tree(&self, tree: &Node) -> Extraction {
        self.extract(&Package::from_tree(tree.clone()))
    }
}

/// Per-slide walk state.
struct SlideWalker<'a> {
    ctx: SlideContext<'a>,
    next_ordinal: usize,
    components: Vec<Component>,
    diagnostics: Vec<Diagnostic>,
}

/// Where a node sits: the group transforms above it and its group, if any.
#[derive(Debug, Clone, Default)]
struct Placement {
    transform: ComposedTransform,
    group: Option<String>,
    fallback: Option<&'static str>,
}

impl Placement {
    /// Placement of a group's children.
    fn enter_group(&self, group: &Node, group_id: String, dpi: f64) -> Self {
        let inner = GroupTransform::from_group_transform(nodes::transform(group), dpi);
        Self {
            transform: self.transform.nested(inner),
            group: Some(group_id),
            fallback: self.fallback,
        }
    }
}

fn group_shape_id(group: &Node) -> Option<String> {
    nodes::non_visual(group)
        .and_then(|nv| nv.attr("id"))
        .map(str::to_string)
}

impl<'a> SlideWalker<'a> {
    fn new(ctx: SlideContext<'a>) -> Self {
        Self {
            ctx,
            next_ordinal: 0,
            components: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn run(&mut self) {
        let ctx = self.ctx;
        let Some(tree) = ctx.package.xml(ctx.part) else {
            self.diagnose("part", Error::MissingPart(ctx.part.to_string()).to_string());
            return;
        };

        let slide = tree
            .child_elements()
            .into_iter()
            .map(|(_, root)| root)
            .find(|root| root.path("p:cSld.p:spTree").is_some());
        match slide {
            Some(slide) => {
                if let Some(background) = image::parse_slide_background(slide, &ctx) {
                    self.push(background, &Placement::default());
                }
                if let Some(sp_tree) = slide.path("p:cSld.p:spTree") {
                    self.walk(sp_tree, &Placement::default());
                }
            }
            None => self.run_fallback(tree),
        }
    }

    /// Walk a shape tree's children in document order.
    fn walk(&mut self, tree: &Node, placement: &Placement) {
        for (tag, child) in tree.child_elements() {
            match local_name(tag) {
                "sp" | "pic" | "cxnSp" | "graphicFrame" => self.dispatch(tag, child, placement),
                "grpSp" => self.walk_group(tag, child, placement),
                "AlternateContent" => {
                    if let Some(branch) = child.first_path(&["mc:Choice", "mc:Fallback"]) {
                        self.walk(branch, placement);
                    }
                }
                _ => {}
            }
        }
    }

    fn walk_group(&mut self, tag: &str, group: &Node, placement: &Placement) {
        let ordinal = self.take_ordinal();
        let group_id =
            group_shape_id(group).unwrap_or_else(|| self.ctx.component_id("group", ordinal));
        log::debug!("Descending into {} '{}'", tag, group_id);
        let nested = placement.enter_group(group, group_id, self.ctx.options.dpi);
        self.walk(group, &nested);
    }

    fn dispatch(&mut self, tag: &str, node: &Node, placement: &Placement) {
        let ordinal = self.take_ordinal();
        let ctx = self.ctx;
        let result: Result<Vec<Component>> = match local_name(tag) {
            "sp" | "pic" if placement.fallback.is_some() => {
                parse_permissive(node, ordinal, &ctx).map(one)
            }
            "pic" => image::parse_image(node, ordinal, &ctx).map(one),
            "cxnSp" => shape::parse_connector(node, ordinal, &ctx).map(one),
            "graphicFrame" => self.dispatch_frame(node, ordinal),
            _ => parse_shape_like(node, ordinal, &ctx).map(one),
        };
        match result {
            Ok(components) => {
                for component in components {
                    self.push(component, placement);
                }
            }
            Err(e) => {
                log::warn!("Skipping {} {} on {}: {}", tag, ordinal, ctx.part, e);
                self.diagnose(tag, e.to_string());
            }
        }
    }

    fn dispatch_frame(&mut self, frame: &Node, ordinal: usize) -> Result<Vec<Component>> {
        let ctx = self.ctx;
        if table::table_node(frame).is_some() {
            return table::parse_table(frame, ordinal, &ctx).map(one);
        }
        if diagram::is_diagram(frame) {
            let Some(parsed) = diagram::parse_diagram(frame, ordinal, &ctx)? else {
                return Ok(Vec::new());
            };
            self.next_ordinal += parsed.consumed;
            return Ok(parsed.components);
        }
        Ok(one(unknown_frame(frame, ordinal, &ctx)))
    }

    fn take_ordinal(&mut self) -> usize {
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        ordinal
    }

    fn push(&mut self, mut component: Component, placement: &Placement) {
        self.place(&mut component, placement);
        self.components.push(component);
    }

    /// Map a component into slide space and tag where it came from. Diagram
    /// sub-components sit in the same space as their wrapper.
    fn place(&self, component: &mut Component, placement: &Placement) {
        if let Component::Diagram(diagram) = component {
            for sub in &mut diagram.components {
                self.place(sub, placement);
            }
        }
        let base = component.base_mut();
        if !placement.transform.is_identity() {
            let mapped = placement.transform.apply(base.geometry());
            base.set_geometry(mapped);
        }
        if let Some(group) = &placement.group {
            base.meta("grouped", true);
            base.meta("groupId", group.as_str());
        }
        if let Some(fallback) = placement.fallback {
            base.meta("fallback", fallback);
        }
        base.meta("sourcePart", self.ctx.part);
    }

    fn diagnose(&mut self, tag: &str, message: String) {
        self.diagnostics.push(Diagnostic {
            slide_index: self.ctx.slide_index,
            source: format!("{}#{}", self.ctx.part, tag),
            message,
        });
    }

    /// Graduated recovery for parts without the normal slide envelope.
    fn run_fallback(&mut self, tree: &Node) {
        log::warn!("{} has no shape tree, searching for shapes", self.ctx.part);
        if !tree.is_structural() {
            if let Err(e) = tree.resolve("p:sld") {
                self.diagnose("root", e.to_string());
            }
        } else {
            self.search_and_scrape(tree);
            if !self.components.is_empty() {
                return;
            }
        }

        log::warn!("Nothing recognizable in {}", self.ctx.part);
        let ordinal = self.take_ordinal();
        let component = self.unrecognized(tree, ordinal);
        let placement = Placement {
            fallback: Some("unknown"),
            ..Placement::default()
        };
        self.push(component, &placement);
    }

    /// Fallback steps that need an element root: tag search, then scraping.
    fn search_and_scrape(&mut self, tree: &Node) {
        let placement = Placement {
            fallback: Some("tree-search"),
            ..Placement::default()
        };
        let mut found = Vec::new();
        let mut visited = HashSet::new();
        find_shape_nodes(tree, "", &placement, self.ctx.options.dpi, &mut visited, &mut found);

        for (tag, node, placement) in &found {
            self.dispatch(tag, node, placement);
        }
        if !self.components.is_empty() {
            return;
        }

        let strings = scrape_strings(tree, self.ctx.options);
        if !strings.is_empty() {
            log::warn!("Recovered {} text fragment(s) from {}", strings.len(), self.ctx.part);
            let scraped = Placement {
                fallback: Some("text-scrape"),
                ..Placement::default()
            };
            for (i, text) in strings.into_iter().enumerate() {
                let ordinal = self.take_ordinal();
                let component = self.scraped_text(text, i, ordinal);
                self.push(component, &scraped);
            }
        }
    }

    fn slide_geometry(&self) -> Geometry {
        let (cx, cy) = self.ctx.package.slide_size_emu();
        Geometry {
            width: emu_to_pixels_at(cx, self.ctx.options.dpi),
            height: emu_to_pixels_at(cy, self.ctx.options.dpi),
            ..Geometry::default()
        }
    }

    /// A text placeholder stacked down the left of the slide.
    fn scraped_text(&self, text: String, position: usize, ordinal: usize) -> Component {
        let slide = self.slide_geometry();
        let geometry = Geometry {
            x: 48,
            y: 48 + 64 * position as i64,
            width: (slide.width - 96).max(96),
            height: 48,
            ..Geometry::default()
        };
        Component::Text(TextComponent {
            base: BaseFields::new(
                self.ctx.component_id("text", ordinal),
                geometry,
                self.ctx.slide_index,
                ordinal as i64,
            ),
            rich_text: RichText::single_run(TextRun::plain(text.clone())),
            content: text,
            font: Font::default(),
            alignment: TextAlign::default(),
            vertical_align: VerticalAlign::default(),
            background_color: None,
            background_shape: None,
            placeholder_type: None,
            is_title: false,
        })
    }

    fn unrecognized(&self, tree: &Node, ordinal: usize) -> Component {
        let mut base = BaseFields::new(
            self.ctx.component_id("unknown", ordinal),
            self.slide_geometry(),
            self.ctx.slide_index,
            ordinal as i64,
        );
        base.meta("rootKeys", tree.keys());
        Component::Unknown(UnknownComponent {
            base,
            content: "Unrecognized content".to_string(),
        })
    }
}

fn one(component: Option<Component>) -> Vec<Component> {
    component.into_iter().collect()
}

/// Shape dispatch: a picture fill wins, then text, then plain shape.
fn parse_shape_like(node: &Node, ordinal: usize, ctx: &SlideContext) -> Result<Option<Component>> {
    if image::has_picture(node) {
        return image::parse_image(node, ordinal, ctx);
    }
    if text::has_text(node) {
        return text::parse_text(node, ordinal, ctx);
    }
    if shape::is_shape(node) {
        return shape::parse_shape(node, ordinal, ctx);
    }
    Ok(None)
}

/// Reparse a node found by the fallback search with every parser in turn.
fn parse_permissive(node: &Node, ordinal: usize, ctx: &SlideContext) -> Result<Option<Component>> {
    if image::has_picture(node) {
        if let Some(component) = image::parse_image(node, ordinal, ctx)? {
            return Ok(Some(component));
        }
    }
    if let Some(component) = text::parse_text(node, ordinal, ctx)? {
        return Ok(Some(component));
    }
    shape::parse_shape(node, ordinal, ctx)
}

fn unknown_frame(frame: &Node, ordinal: usize, ctx: &SlideContext) -> Option<Component> {
    let geometry = ctx.geometry(nodes::transform(frame));
    if geometry.is_empty() {
        return None;
    }
    let uri = frame
        .first_path(&["a:graphic.a:graphicData.$.uri", "p:graphic.a:graphicData.$.uri"])
        .and_then(Node::as_str);
    let kind = uri
        .and_then(|u| u.rsplit('/').next())
        .filter(|k| !k.is_empty())
        .unwrap_or("graphic");

    let mut base = BaseFields::new(
        ctx.component_id("unknown", ordinal),
        geometry,
        ctx.slide_index,
        ordinal as i64,
    );
    nodes::record_identity(frame, &mut base);
    if let Some(uri) = uri {
        base.meta("graphicDataUri", uri);
    }
    Some(Component::Unknown(UnknownComponent {
        base,
        content: format!("{} object", kind),
    }))
}

/// Depth-first search for shape-like tags anywhere in `node`, keyed by
/// structural path so nothing is collected twice. Groups met on the way
/// down carry their transform into every match below them.
fn find_shape_nodes<'n>(
    node: &'n Node,
    path: &str,
    placement: &Placement,
    dpi: f64,
    visited: &mut HashSet<String>,
    found: &mut Vec<(String, &'n Node, Placement)>,
) {
    for (index, (tag, child)) in node.child_elements().into_iter().enumerate() {
        let child_path = format!("{}/{}[{}]", path, tag, index);
        let name = local_name(tag);
        if FALLBACK_TAGS.contains(&name) {
            if visited.insert(child_path) {
                found.push((tag.to_string(), child, placement.clone()));
            }
            continue;
        }
        if !child.is_structural() {
            continue;
        }
        if name == "grpSp" {
            let group_id = group_shape_id(child).unwrap_or_else(|| child_path.clone());
            let nested = placement.enter_group(child, group_id, dpi);
            find_shape_nodes(child, &child_path, &nested, dpi, visited, found);
        } else {
            find_shape_nodes(child, &child_path, placement, dpi, visited, found);
        }
    }
}

/// Quoted string values of the serialized tree that look like prose.
fn scrape_strings(tree: &Node, options: &ExtractOptions) -> Vec<String> {
    let Ok(serialized) = serde_json::to_string(tree) else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for caps in QUOTED_STRING_REGEX.captures_iter(&serialized) {
        if caps.get(2).is_some() {
            continue;
        }
        let raw = caps.get(1).map_or("", |m| m.as_str());
        let value = serde_json::from_str::<String>(&format!("\"{}\"", raw))
            .unwrap_or_else(|_| raw.to_string());
        let value = value.trim();
        if value.chars().count() < options.fallback_min_text_len
            || value.contains(':')
            || value.parse::<f64>().is_ok()
            || RELATIONSHIP_ID_REGEX.is_match(value)
            || IDENTIFIER_REGEX.is_match(value)
        {
            continue;
        }
        if seen.insert(value.to_string()) {
            out.push(value.to_string());
            if out.len() >= options.fallback_text_limit {
                break;
            }
        }
    }
    out
}
