//! Table parser for `a:tbl` graphic frames.

use crate::context::SlideContext;
use crate::nodes;
use crate::text;
use deckparse_core::units::emu_to_pixels_at;
use deckparse_core::{BaseFields, Component, Node, Result, TableCell, TableComponent, TableRow};

/// Graphic-data URI of a table frame.
pub const TABLE_URI: &str = "http://schemas.openxmlformats.org/drawingml/2006/table";

/// The `a:tbl` inside a graphic frame, if any.
pub fn table_node(frame: &Node) -> Option<&Node> {
    frame.first_path(&[
        "a:graphic.a:graphicData.a:tbl",
        "p:graphic.a:graphicData.a:tbl",
    ])
}

/// Parse a graphic frame holding a table.
pub fn parse_table(frame: &Node, ordinal: usize, ctx: &SlideContext) -> Result<Option<Component>> {
    let Some(tbl) = table_node(frame) else {
        return Ok(None);
    };
    let geometry = ctx.geometry(nodes::transform(frame));
    if geometry.is_empty() {
        log::debug!("Dropping zero-size table {}", ordinal);
        return Ok(None);
    }
    let dpi = ctx.options.dpi;

    let column_widths: Vec<i64> = tbl
        .path("a:tblGrid")
        .map(|grid| grid.children("a:gridCol"))
        .unwrap_or_default()
        .into_iter()
        .map(|col| emu_to_pixels_at(col.attr_f64("w").unwrap_or(0.0), dpi))
        .collect();

    let rows: Vec<TableRow> = tbl
        .children("a:tr")
        .into_iter()
        .map(|tr| TableRow {
            height: emu_to_pixels_at(tr.attr_f64("h").unwrap_or(0.0), dpi),
            cells: tr.children("a:tc").into_iter().map(|tc| parse_cell(tc, ctx)).collect(),
        })
        .collect();

    let content = rows
        .iter()
        .map(|row| {
            row.cells
                .iter()
                .filter(|c| !c.merged)
                .map(|c| c.text.as_str())
                .collect::<Vec<_>>()
                .join("\t")
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut base = BaseFields::new(
        ctx.component_id("table", ordinal),
        geometry,
        ctx.slide_index,
        ordinal as i64,
    );
    nodes::record_identity(frame, &mut base);
    if let Some(style) = tbl.path("a:tblPr.a:tableStyleId").and_then(Node::text) {
        base.meta("tableStyleId", style);
    }

    Ok(Some(Component::Table(TableComponent {
        base,
        content,
        column_widths,
        header_row: tbl.path("a:tblPr").and_then(|p| p.attr("firstRow")) == Some("1"),
        rows,
    })))
}

fn parse_cell(tc: &Node, ctx: &SlideContext) -> TableCell {
    let body = tc.get("a:txBody");
    let span = |name: &str| tc.attr_f64(name).map(|n| n.max(1.0) as u32).unwrap_or(1);
    TableCell {
        text: body.map(text::body_text).unwrap_or_default(),
        row_span: span("rowSpan"),
        col_span: span("gridSpan"),
        merged: tc.attr("hMerge") == Some("1") || tc.attr("vMerge") == Some("1"),
        fill: tc
            .path("a:tcPr.a:solidFill")
            .map(|fill| ctx.color(Some(fill))),
        font: body
            .and_then(text::first_run_properties)
            .map(|rpr| text::run_font(Some(rpr), ctx)),
    }
}
