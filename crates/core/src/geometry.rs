//! Position, size and rotation of a component.

use crate::tree::Node;
use crate::units::{angle_to_degrees, emu_to_pixels_at, DEFAULT_DPI};
use serde::Serialize;

/// Absolute geometry in pixels and degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Geometry {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    /// Clockwise degrees, 0 = upright.
    pub rotation: f64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub flip_h: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub flip_v: bool,
}

impl Geometry {
    /// Resolve a transform node (`a:xfrm`, `p:xfrm`) at 96 DPI.
    pub fn from_transform(xfrm: Option<&Node>) -> Self {
        Self::from_transform_at(xfrm, DEFAULT_DPI)
    }

    /// Resolve a transform node at `dpi`.
    ///
    /// Offset comes from the `a:off` child, size from `a:ext`, rotation from
    /// the transform's own `rot` attribute. Missing pieces are zero.
    pub fn from_transform_at(xfrm: Option<&Node>, dpi: f64) -> Self {
        let Some(xfrm) = xfrm else {
            return Self::default();
        };
        let emu = |path: &str, attr: &str| {
            xfrm.path(path)
                .and_then(|n| n.attr_f64(attr))
                .unwrap_or(0.0)
        };
        Self {
            x: emu_to_pixels_at(emu("a:off", "x"), dpi),
            y: emu_to_pixels_at(emu("a:off", "y"), dpi),
            width: emu_to_pixels_at(emu("a:ext", "cx"), dpi),
            height: emu_to_pixels_at(emu("a:ext", "cy"), dpi),
            rotation: angle_to_degrees(xfrm.attr_f64("rot").unwrap_or(0.0)),
            flip_h: is_true(xfrm.attr("flipH")),
            flip_v: is_true(xfrm.attr("flipV")),
        }
    }

    /// Zero-area geometry marks a component that must be discarded.
    pub fn is_empty(&self) -> bool {
        self.width == 0 && self.height == 0
    }

    /// Shift by a parent offset (diagram frames).
    pub fn offset(mut self, dx: i64, dy: i64) -> Self {
        self.x += dx;
        self.y += dy;
        self
    }
}

/// Maps child coordinates of a group into its parent's space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupTransform {
    off: (f64, f64),
    scale: (f64, f64),
    child_off: (f64, f64),
}

impl GroupTransform {
    /// Build from a group's `a:xfrm` (with `a:chOff`/`a:chExt`), at `dpi`.
    pub fn from_group_transform(xfrm: Option<&Node>, dpi: f64) -> Self {
        let read = |path: &str, attr: &str| {
            xfrm.and_then(|x| x.path(path))
                .and_then(|n| n.attr_f64(attr))
        };
        let px = |emu: f64| emu / crate::units::EMU_PER_INCH * dpi;
        let off = (read("a:off", "x").unwrap_or(0.0), read("a:off", "y").unwrap_or(0.0));
        let ext = (read("a:ext", "cx"), read("a:ext", "cy"));
        let child_off = (
            read("a:chOff", "x").unwrap_or(off.0),
            read("a:chOff", "y").unwrap_or(off.1),
        );
        let child_ext = (read("a:chExt", "cx"), read("a:chExt", "cy"));
        let ratio = |ext: Option<f64>, child: Option<f64>| match (ext, child) {
            (Some(e), Some(c)) if c > 0.0 => e / c,
            _ => 1.0,
        };
        Self {
            off: (px(off.0), px(off.1)),
            scale: (ratio(ext.0, child_ext.0), ratio(ext.1, child_ext.1)),
            child_off: (px(child_off.0), px(child_off.1)),
        }
    }

    /// Map a child's geometry into parent space.
    pub fn apply(&self, g: Geometry) -> Geometry {
        Geometry {
            x: (self.off.0 + (g.x as f64 - self.child_off.0) * self.scale.0).round() as i64,
            y: (self.off.1 + (g.y as f64 - self.child_off.1) * self.scale.1).round() as i64,
            width: (g.width as f64 * self.scale.0).round() as i64,
            height: (g.height as f64 * self.scale.1).round() as i64,
            ..g
        }
    }
}

/// A chain of group transforms, innermost first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComposedTransform {
    stack: Vec<GroupTransform>,
}

impl ComposedTransform {
    pub fn identity() -> Self {
        Self::default()
    }

    /// Push a nested group's transform; it applies before the existing ones.
    pub fn nested(&self, inner: GroupTransform) -> Self {
        let mut stack = Vec::with_capacity(self.stack.len() + 1);
        stack.push(inner);
        stack.extend(self.stack.iter().copied());
        Self { stack }
    }

    pub fn apply(&self, g: Geometry) -> Geometry {
        self.stack.iter().fold(g, |acc, t| t.apply(acc))
    }

    pub fn is_identity(&self) -> bool {
        self.stack.is_empty()
    }
}

fn is_true(value: Option<&str>) -> bool {
    matches!(value, Some("1") | Some("true"))
}
