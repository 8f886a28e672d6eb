//! Vector icon preparation.
//!
//! Turns stored SVG markup into a root `<svg>` element sized to the
//! element's intrinsic box, with the root `fill` / `stroke` replaced when the
//! element overrides them. The vector exporter inlines the result and the
//! raster exporter parses it with usvg, so both draw the same thing.

use std::fmt::Write;

use overlay_core::{Color, IconPaint};

use crate::error::{RenderError, RenderResult};

const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Paint and size applied to an icon's root element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IconStyle {
    /// Root fill.
    pub fill: IconPaint,
    /// Root stroke.
    pub stroke: IconPaint,
    /// Rendered width.
    pub width: f32,
    /// Rendered height.
    pub height: f32,
}

/// Rewrite `markup` for placement.
///
/// Drops any prolog or doctype before the root, removes the root's own
/// `width`, `height`, `x` and `y`, adds a `viewBox` from the authored size
/// when missing, and substitutes overridden paints. `InheritOriginal` leaves
/// the authored attribute untouched.
///
/// # Errors
///
/// Returns [`RenderError::ExportDecodeFailure`] if no `<svg>` root is found
/// or its start tag is malformed.
pub fn prepare_icon(markup: &str, style: &IconStyle) -> RenderResult<String> {
    let start = find_root(markup).ok_or_else(|| RenderError::decode(markup, "no <svg> root element"))?;
    let tag_body_start = start + "<svg".len();
    let tag_end = find_tag_end(markup, tag_body_start)
        .ok_or_else(|| RenderError::decode(markup, "unterminated <svg> start tag"))?;

    let mut body = &markup[tag_body_start..tag_end];
    let self_closing = body.trim_end().ends_with('/');
    if self_closing {
        body = body.trim_end().trim_end_matches('/');
    }
    let attributes =
        parse_attributes(body).ok_or_else(|| RenderError::decode(markup, "malformed attributes on <svg>"))?;

    let authored_size = (
        attribute(&attributes, "width").and_then(parse_length),
        attribute(&attributes, "height").and_then(parse_length),
    );

    let mut out = String::with_capacity(markup.len() + 128);
    out.push_str("<svg");
    for (name, value) in &attributes {
        let dropped = matches!(name.as_str(), "width" | "height" | "x" | "y")
            || (name == "fill" && style.fill.color().is_some())
            || (name == "stroke" && style.stroke.color().is_some());
        if !dropped {
            let _ = write!(out, " {name}=\"{}\"", value.replace('"', "&quot;"));
        }
    }
    if attribute(&attributes, "xmlns").is_none() {
        let _ = write!(out, " xmlns=\"{SVG_NS}\"");
    }
    if attribute(&attributes, "viewBox").is_none() {
        if let (Some(w), Some(h)) = authored_size {
            let _ = write!(out, " viewBox=\"0 0 {w} {h}\"");
        }
    }
    let _ = write!(out, " width=\"{}\" height=\"{}\"", style.width, style.height);
    if let Some(color) = style.fill.color() {
        write_paint(&mut out, "fill", color);
    }
    if let Some(color) = style.stroke.color() {
        write_paint(&mut out, "stroke", color);
    }

    if self_closing {
        out.push_str("/>");
        return Ok(out);
    }
    out.push('>');
    let rest = &markup[tag_end + 1..];
    let close = rest
        .rfind("</svg>")
        .ok_or_else(|| RenderError::decode(markup, "missing </svg>"))?;
    out.push_str(&rest[..close + "</svg>".len()]);
    Ok(out)
}

fn write_paint(out: &mut String, name: &str, color: Color) {
    let _ = write!(out, " {name}=\"{}\"", color.to_hex_rgb());
    if color.a < 255 {
        let _ = write!(out, " {name}-opacity=\"{}\"", color.alpha_f32());
    }
}

/// Byte offset of the root `<svg` tag.
fn find_root(markup: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(pos) = markup[from..].find("<svg") {
        let at = from + pos;
        let next = markup[at + 4..].chars().next();
        if matches!(next, Some(c) if c.is_whitespace() || c == '>' || c == '/') {
            return Some(at);
        }
        from = at + 4;
    }
    None
}

/// Offset of the `>` closing the start tag, skipping quoted values.
fn find_tag_end(markup: &str, from: usize) -> Option<usize> {
    let mut quote = None;
    for (i, c) in markup[from..].char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            (None, '>') => return Some(from + i),
            _ => {}
        }
    }
    None
}

fn parse_attributes(body: &str) -> Option<Vec<(String, String)>> {
    let mut attributes = Vec::new();
    let mut chars = body.char_indices().peekable();
    loop {
        while chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
        let Some(&(name_start, _)) = chars.peek() else {
            return Some(attributes);
        };
        let mut name_end = body.len();
        while let Some(&(i, c)) = chars.peek() {
            if c == '=' || c.is_whitespace() {
                name_end = i;
                break;
            }
            chars.next();
        }
        let name = &body[name_start..name_end];
        while chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
        if chars.next_if(|(_, c)| *c == '=').is_none() {
            // bare attribute
            attributes.push((name.to_string(), String::new()));
            continue;
        }
        while chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
        let (_, quote) = chars.next()?;
        if quote != '"' && quote != '\'' {
            return None;
        }
        let mut value = String::new();
        loop {
            let (_, c) = chars.next()?;
            if c == quote {
                break;
            }
            value.push(c);
        }
        attributes.push((name.to_string(), value));
    }
}

fn attribute<'a>(attributes: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
}

fn parse_length(value: &str) -> Option<f32> {
    let v = value.trim().trim_end_matches("px").trim();
    v.parse::<f32>().ok().filter(|n| n.is_finite() && *n > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAR: &str = r##"<?xml version="1.0"?>
<!DOCTYPE svg>
<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24" fill="#ff0000" stroke='#000'><path d="M0 0L24 24"/></svg>
"##;

    fn style(fill: IconPaint, stroke: IconPaint) -> IconStyle {
        IconStyle {
            fill,
            stroke,
            width: 48.0,
            height: 48.0,
        }
    }

    #[test]
    fn test_inherit_keeps_authored_paint() {
        let out = prepare_icon(STAR, &style(IconPaint::InheritOriginal, IconPaint::InheritOriginal)).unwrap();
        assert!(out.starts_with("<svg"));
        assert!(out.contains("fill=\"#ff0000\""));
        assert!(out.contains("stroke=\"#000\""));
        assert!(out.contains("width=\"48\" height=\"48\""));
        assert!(out.contains("viewBox=\"0 0 24 24\""));
        assert!(!out.contains("<?xml"));
        assert!(out.ends_with("</svg>"));
    }

    #[test]
    fn test_override_replaces_root_paint() {
        let out = prepare_icon(
            STAR,
            &style(
                IconPaint::Override(Color::rgb(0, 0x80, 0xff)),
                IconPaint::Override(Color::rgba(255, 255, 255, 128)),
            ),
        )
        .unwrap();
        assert!(out.contains("fill=\"#0080ff\""));
        assert!(!out.contains("#ff0000"));
        assert!(out.contains("stroke=\"#ffffff\""));
        assert!(out.contains("stroke-opacity="));
        assert_eq!(out.matches("fill=").count(), 1);
    }

    #[test]
    fn test_existing_view_box_kept() {
        let markup = r#"<svg viewBox="0 0 10 20"><rect width="10" height="20"/></svg>"#;
        let out = prepare_icon(markup, &style(IconPaint::InheritOriginal, IconPaint::InheritOriginal)).unwrap();
        assert_eq!(out.matches("viewBox").count(), 1);
        assert!(out.contains("xmlns=\"http://www.w3.org/2000/svg\""));
        // inner rect keeps its own width
        assert!(out.contains("<rect width=\"10\""));
    }

    #[test]
    fn test_self_closing_root() {
        let out = prepare_icon("<svg width='5' height='5'/>", &style(IconPaint::InheritOriginal, IconPaint::InheritOriginal))
            .unwrap();
        assert!(out.ends_with("/>"));
        assert!(out.contains("viewBox=\"0 0 5 5\""));
    }

    #[test]
    fn test_not_svg_rejected() {
        assert!(matches!(
            prepare_icon("<svgfoo/>", &style(IconPaint::InheritOriginal, IconPaint::InheritOriginal)),
            Err(RenderError::ExportDecodeFailure { .. })
        ));
        assert!(prepare_icon("<svg width=\"1\"", &style(IconPaint::InheritOriginal, IconPaint::InheritOriginal)).is_err());
    }
}
