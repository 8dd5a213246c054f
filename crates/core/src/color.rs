//! Colour resolution for DrawingML colour choices.
//!
//! A colour-bearing node (`a:solidFill`, `a:fgClr`, a gradient stop, ...)
//! holds one of `a:srgbClr`, `a:sysClr` or `a:schemeClr`. Resolution never
//! fails: anything unrecognised resolves to black.

use crate::tree::Node;

/// Colour used when nothing else resolves.
pub const DEFAULT_COLOR: &str = "#000000";

/// Theme scheme colours, keyed by the names used in `a:schemeClr@val`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorScheme {
    pub dk1: String,
    pub lt1: String,
    pub dk2: String,
    pub lt2: String,
    pub accent1: String,
    pub accent2: String,
    pub accent3: String,
    pub accent4: String,
    pub accent5: String,
    pub accent6: String,
    pub hlink: String,
    pub fol_hlink: String,
}

impl Default for ColorScheme {
    /// The stock Office theme.
    fn default() -> Self {
        Self {
            dk1: "#000000".into(),
            lt1: "#FFFFFF".into(),
            dk2: "#44546A".into(),
            lt2: "#E7E6E6".into(),
            accent1: "#4472C4".into(),
            accent2: "#ED7D31".into(),
            accent3: "#A5A5A5".into(),
            accent4: "#FFC000".into(),
            accent5: "#5B9BD5".into(),
            accent6: "#70AD47".into(),
            hlink: "#0563C1".into(),
            fol_hlink: "#954F72".into(),
        }
    }
}

impl ColorScheme {
    /// Resolve a scheme colour name, including the `tx*`/`bg*` aliases.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let color = match name {
            "dk1" | "tx1" => &self.dk1,
            "lt1" | "bg1" => &self.lt1,
            "dk2" | "tx2" => &self.dk2,
            "lt2" | "bg2" => &self.lt2,
            "accent1" => &self.accent1,
            "accent2" => &self.accent2,
            "accent3" => &self.accent3,
            "accent4" => &self.accent4,
            "accent5" => &self.accent5,
            "accent6" => &self.accent6,
            "hlink" => &self.hlink,
            "folHlink" => &self.fol_hlink,
            _ => return None,
        };
        Some(color.as_str())
    }

    /// Overlay the colours declared in a theme part's `a:clrScheme`.
    ///
    /// `scheme` is the `a:clrScheme` element. Entries that do not resolve to
    /// an explicit colour keep their stock value.
    pub fn from_theme(scheme: &Node) -> Self {
        let mut out = Self::default();
        let slots: [(&str, &mut String); 12] = [
            ("a:dk1", &mut out.dk1),
            ("a:lt1", &mut out.lt1),
            ("a:dk2", &mut out.dk2),
            ("a:lt2", &mut out.lt2),
            ("a:accent1", &mut out.accent1),
            ("a:accent2", &mut out.accent2),
            ("a:accent3", &mut out.accent3),
            ("a:accent4", &mut out.accent4),
            ("a:accent5", &mut out.accent5),
            ("a:accent6", &mut out.accent6),
            ("a:hlink", &mut out.hlink),
            ("a:folHlink", &mut out.fol_hlink),
        ];
        for (key, slot) in slots {
            if let Some(hex) = scheme.get(key).and_then(explicit_color) {
                *slot = hex;
            }
        }
        out
    }
}

/// Resolve a colour-bearing node against the stock theme.
pub fn parse_color(node: Option<&Node>) -> String {
    parse_color_with(node, &ColorScheme::default())
}

/// Resolve a colour-bearing node against `scheme`.
///
/// Order: explicit RGB literal, system colour's last-used value, scheme
/// colour name, black.
pub fn parse_color_with(node: Option<&Node>, scheme: &ColorScheme) -> String {
    let Some(node) = node else {
        return DEFAULT_COLOR.to_string();
    };
    if let Some(hex) = explicit_color(node) {
        return hex;
    }
    if let Some(name) = node.path("a:schemeClr.$.val").and_then(Node::as_str) {
        if let Some(hex) = scheme.resolve(name) {
            return hex.to_string();
        }
    }
    DEFAULT_COLOR.to_string()
}

/// Explicit RGB or system colour held by `node`, if any.
fn explicit_color(node: &Node) -> Option<String> {
    node.path("a:srgbClr.$.val")
        .and_then(Node::as_str)
        .and_then(normalize_hex)
        .or_else(|| {
            node.path("a:sysClr.$.lastClr")
                .and_then(Node::as_str)
                .and_then(normalize_hex)
        })
}

/// Normalise a 6-digit hex literal to `#RRGGBB`.
pub fn normalize_hex(value: &str) -> Option<String> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(format!("#{}", hex.to_ascii_uppercase()))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(json: &str) -> Node {
        Node::from_json_str(json).unwrap()
    }

    #[test]
    fn test_srgb_wins() {
        let node = fill(r#"{"a:srgbClr": [{"$": {"val": "4472c4"}}], "a:schemeClr": [{"$": {"val": "accent2"}}]}"#);
        assert_eq!(parse_color(Some(&node)), "#4472C4");
    }

    #[test]
    fn test_system_color_last_used() {
        let node = fill(r#"{"a:sysClr": [{"$": {"val": "windowText", "lastClr": "1F1F1F"}}]}"#);
        assert_eq!(parse_color(Some(&node)), "#1F1F1F");
    }

    #[test]
    fn test_scheme_color_and_aliases() {
        let node = fill(r#"{"a:schemeClr": [{"$": {"val": "accent1"}}]}"#);
        assert_eq!(parse_color(Some(&node)), "#4472C4");
        let node = fill(r#"{"a:schemeClr": [{"$": {"val": "bg1"}}]}"#);
        assert_eq!(parse_color(Some(&node)), "#FFFFFF");
    }

    #[test]
    fn test_resolution_is_total() {
        assert_eq!(parse_color(None), DEFAULT_COLOR);
        assert_eq!(parse_color(Some(&Node::Empty)), DEFAULT_COLOR);
        assert_eq!(parse_color(Some(&Node::text_node("junk"))), DEFAULT_COLOR);
        let node = fill(r#"{"a:schemeClr": [{"$": {"val": "notAColor"}}]}"#);
        assert_eq!(parse_color(Some(&node)), DEFAULT_COLOR);
        let node = fill(r#"{"a:srgbClr": [{"$": {"val": "XYZ"}}]}"#);
        assert_eq!(parse_color(Some(&node)), DEFAULT_COLOR);
    }

    #[test]
    fn test_theme_overlay() {
        let scheme = fill(
            r#"{"a:accent1": [{"a:srgbClr": [{"$": {"val": "FF0000"}}]}],
                "a:dk1": [{"a:sysClr": [{"$": {"val": "windowText", "lastClr": "000000"}}]}]}"#,
        );
        let colors = ColorScheme::from_theme(&scheme);
        assert_eq!(colors.accent1, "#FF0000");
        assert_eq!(colors.accent2, "#ED7D31");
        let node = fill(r#"{"a:schemeClr": [{"$": {"val": "accent1"}}]}"#);
        assert_eq!(parse_color_with(Some(&node), &colors), "#FF0000");
    }
}
